//! Validation and persistence shared by recipe create and update.
//!
//! A recipe row and its tag/ingredient join rows are always written in one
//! transaction. Creating a recipe also allocates its short-link token inside
//! that transaction; a concurrent writer that grabbed the same token trips
//! `recipes_short_link_token_key` and the whole create is retried.

use crate::models::{NewRecipe, NewRecipeIngredient, NewRecipeTag, Recipe, RecipeChanges};
use crate::schema::{ingredients, recipe_ingredients, recipe_tags, recipes, tags};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use potluck_core::{allocate_token, TokenSource};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use utoipa::ToSchema;
use uuid::Uuid;

pub const MAX_NAME_LENGTH: usize = 256;
pub const MAX_CREATE_ATTEMPTS: usize = 3;
pub const SHORT_LINK_CONSTRAINT: &str = "recipes_short_link_token_key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
pub struct IngredientAmount {
    /// Ingredient ID
    pub id: i32,
    /// Quantity in the ingredient's measurement unit (at least 1)
    pub amount: i32,
}

/// Validated recipe content ready to be written.
#[derive(Debug, Clone, Copy)]
pub struct RecipeDraft<'a> {
    pub name: &'a str,
    pub text: &'a str,
    pub cooking_time: i32,
    pub image: Option<&'a str>,
    pub tags: &'a [i32],
    pub ingredients: &'a [IngredientAmount],
}

pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(format!("Name must be at most {MAX_NAME_LENGTH} characters"));
    }
    Ok(())
}

pub fn validate_text(text: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err("Text cannot be empty".to_string());
    }
    Ok(())
}

pub fn validate_cooking_time(minutes: i32) -> Result<(), String> {
    if minutes < 1 {
        return Err("Cooking time must be at least 1 minute".to_string());
    }
    Ok(())
}

pub fn validate_tags(tag_ids: &[i32]) -> Result<(), String> {
    if tag_ids.is_empty() {
        return Err("At least one tag is required".to_string());
    }
    let mut seen = HashSet::new();
    if let Some(dup) = tag_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(format!("Tag {dup} is listed more than once"));
    }
    Ok(())
}

pub fn validate_ingredients(items: &[IngredientAmount]) -> Result<(), String> {
    if items.is_empty() {
        return Err("At least one ingredient is required".to_string());
    }
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.id) {
            return Err(format!("Ingredient {} is listed more than once", item.id));
        }
        if item.amount < 1 {
            return Err(format!(
                "Amount of ingredient {} must be at least 1",
                item.id
            ));
        }
    }
    Ok(())
}

pub fn validate_draft(draft: &RecipeDraft<'_>) -> Result<(), String> {
    validate_name(draft.name)?;
    validate_text(draft.text)?;
    validate_cooking_time(draft.cooking_time)?;
    validate_tags(draft.tags)?;
    validate_ingredients(draft.ingredients)
}

fn missing_ids(requested: impl IntoIterator<Item = i32>, found: Vec<i32>) -> Vec<i32> {
    let found: HashSet<i32> = found.into_iter().collect();
    requested
        .into_iter()
        .filter(|id| !found.contains(id))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn describe(ids: &[i32]) -> String {
    ids.iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check that every referenced tag and ingredient exists.
///
/// The outer `Result` is a storage failure, the inner one a user-facing message.
pub fn check_references(
    conn: &mut PgConnection,
    tag_ids: &[i32],
    items: &[IngredientAmount],
) -> QueryResult<Result<(), String>> {
    let found_tags: Vec<i32> = tags::table
        .filter(tags::id.eq_any(tag_ids))
        .select(tags::id)
        .load(conn)?;
    let missing = missing_ids(tag_ids.iter().copied(), found_tags);
    if !missing.is_empty() {
        return Ok(Err(format!("Unknown tag id(s): {}", describe(&missing))));
    }

    let ingredient_ids: Vec<i32> = items.iter().map(|i| i.id).collect();
    let found_ingredients: Vec<i32> = ingredients::table
        .filter(ingredients::id.eq_any(&ingredient_ids))
        .select(ingredients::id)
        .load(conn)?;
    let missing = missing_ids(ingredient_ids, found_ingredients);
    if !missing.is_empty() {
        return Ok(Err(format!(
            "Unknown ingredient id(s): {}",
            describe(&missing)
        )));
    }

    Ok(Ok(()))
}

pub fn token_taken(conn: &mut PgConnection, token: &str) -> QueryResult<bool> {
    diesel::select(exists(
        recipes::table.filter(recipes::short_link_token.eq(token)),
    ))
    .get_result(conn)
}

fn is_token_conflict(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if info.constraint_name() == Some(SHORT_LINK_CONSTRAINT)
    )
}

pub fn replace_tags(conn: &mut PgConnection, recipe_id: Uuid, tag_ids: &[i32]) -> QueryResult<()> {
    diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe_id))).execute(conn)?;

    let rows: Vec<NewRecipeTag> = tag_ids
        .iter()
        .map(|&tag_id| NewRecipeTag { recipe_id, tag_id })
        .collect();
    diesel::insert_into(recipe_tags::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

pub fn replace_ingredients(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    items: &[IngredientAmount],
) -> QueryResult<()> {
    diesel::delete(
        recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe_id)),
    )
    .execute(conn)?;

    let rows: Vec<NewRecipeIngredient> = items
        .iter()
        .map(|item| NewRecipeIngredient {
            recipe_id,
            ingredient_id: item.id,
            amount: item.amount,
        })
        .collect();
    diesel::insert_into(recipe_ingredients::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

fn insert_once(
    conn: &mut PgConnection,
    author_id: Uuid,
    draft: &RecipeDraft<'_>,
    source: &mut dyn TokenSource,
) -> QueryResult<Recipe> {
    conn.transaction(|conn| {
        let token = allocate_token(source, |candidate| token_taken(conn, candidate))?;

        let recipe: Recipe = diesel::insert_into(recipes::table)
            .values(&NewRecipe {
                author_id,
                name: draft.name.trim(),
                text: draft.text,
                cooking_time: draft.cooking_time,
                image: draft.image,
                short_link_token: &token,
            })
            .returning(Recipe::as_returning())
            .get_result(conn)?;

        replace_tags(conn, recipe.id, draft.tags)?;
        replace_ingredients(conn, recipe.id, draft.ingredients)?;

        Ok(recipe)
    })
}

/// Insert a validated recipe with a fresh short-link token.
pub fn insert_recipe(
    conn: &mut PgConnection,
    author_id: Uuid,
    draft: &RecipeDraft<'_>,
    source: &mut dyn TokenSource,
) -> QueryResult<Recipe> {
    let mut attempt = 1;
    loop {
        match insert_once(conn, author_id, draft, source) {
            Err(e) if is_token_conflict(&e) && attempt < MAX_CREATE_ATTEMPTS => {
                tracing::warn!(attempt, "short link token taken concurrently, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Apply a partial update and replace the tag and ingredient sets.
///
/// A recipe that somehow has no short-link token gets one here. An existing
/// token is never changed.
pub fn update_recipe(
    conn: &mut PgConnection,
    recipe: &Recipe,
    changes: &RecipeChanges<'_>,
    tag_ids: &[i32],
    items: &[IngredientAmount],
    source: &mut dyn TokenSource,
) -> QueryResult<Recipe> {
    conn.transaction(|conn| {
        if !changes.is_empty() {
            diesel::update(recipes::table.find(recipe.id))
                .set(changes)
                .execute(conn)?;
        }

        if recipe.short_link_token.is_none() {
            let token = allocate_token(source, |candidate| token_taken(conn, candidate))?;
            diesel::update(recipes::table.find(recipe.id))
                .filter(recipes::short_link_token.is_null())
                .set(recipes::short_link_token.eq(&token))
                .execute(conn)?;
        }

        replace_tags(conn, recipe.id, tag_ids)?;
        replace_ingredients(conn, recipe.id, items)?;

        recipes::table
            .find(recipe.id)
            .select(Recipe::as_select())
            .first(conn)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(id: i32, amount: i32) -> IngredientAmount {
        IngredientAmount { id, amount }
    }

    fn draft<'a>(tags: &'a [i32], ingredients: &'a [IngredientAmount]) -> RecipeDraft<'a> {
        RecipeDraft {
            name: "Borscht",
            text: "Simmer the beets.",
            cooking_time: 90,
            image: None,
            tags,
            ingredients,
        }
    }

    #[test]
    fn test_valid_draft() {
        let items = [amount(1, 10), amount(2, 20)];
        assert!(validate_draft(&draft(&[1, 2], &items)).is_ok());
    }

    #[test]
    fn test_tags_required_and_unique() {
        let items = [amount(1, 10)];
        assert!(validate_draft(&draft(&[], &items)).is_err());
        let err = validate_draft(&draft(&[3, 4, 3], &items)).unwrap_err();
        assert!(err.contains("Tag 3"), "{err}");
    }

    #[test]
    fn test_ingredients_required_unique_and_positive() {
        assert!(validate_ingredients(&[]).is_err());

        let err = validate_ingredients(&[amount(1, 10), amount(1, 5)]).unwrap_err();
        assert!(err.contains("Ingredient 1"), "{err}");

        let err = validate_ingredients(&[amount(7, 0)]).unwrap_err();
        assert!(err.contains("at least 1"), "{err}");
    }

    #[test]
    fn test_scalar_fields() {
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LENGTH)).is_ok());
        assert!(validate_name(&"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
        assert!(validate_text("").is_err());
        assert!(validate_cooking_time(0).is_err());
        assert!(validate_cooking_time(1).is_ok());
    }

    #[test]
    fn test_missing_ids_sorted_and_deduped() {
        assert_eq!(missing_ids([5, 1, 5, 2, 9], vec![2]), vec![1, 5, 9]);
        assert!(missing_ids([1, 2], vec![2, 1]).is_empty());
    }
}
