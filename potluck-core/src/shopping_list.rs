//! Shopping list aggregation.
//!
//! Every ingredient line of every recipe in a cart is grouped by
//! (ingredient name, measurement unit) and summed. Output order is fixed:
//! recipes by id, items by name then unit.

use crate::error::ShoppingListError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A recipe referenced by a cart entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRecipe<I> {
    pub id: I,
    pub name: String,
}

/// One (recipe, ingredient, amount) row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientLine<I> {
    pub recipe_id: I,
    pub name: String,
    pub unit: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingItem {
    pub name: String,
    pub unit: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingList {
    pub recipes: Vec<String>,
    pub items: Vec<ShoppingItem>,
}

impl ShoppingList {
    /// Number of distinct (name, unit) rows, used for the summary line.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

/// Build the shopping list for a cart.
///
/// Lines belonging to recipes outside the cart are ignored.
pub fn aggregate<I, L>(
    mut recipes: Vec<CartRecipe<I>>,
    lines: L,
) -> Result<ShoppingList, ShoppingListError>
where
    I: Ord,
    L: IntoIterator<Item = IngredientLine<I>>,
{
    if recipes.is_empty() {
        return Err(ShoppingListError::EmptyCart);
    }

    recipes.sort_by(|a, b| a.id.cmp(&b.id));
    recipes.dedup_by(|a, b| a.id == b.id);

    let in_cart: BTreeSet<&I> = recipes.iter().map(|r| &r.id).collect();

    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for line in lines {
        if !in_cart.contains(&line.recipe_id) {
            continue;
        }
        *totals.entry((line.name, line.unit)).or_insert(0) += line.amount;
    }

    let items = totals
        .into_iter()
        .map(|((name, unit), amount)| ShoppingItem { name, unit, amount })
        .collect();

    Ok(ShoppingList {
        recipes: recipes.into_iter().map(|r| r.name).collect(),
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(recipe_id: u32, name: &str, unit: &str, amount: i64) -> IngredientLine<u32> {
        IngredientLine {
            recipe_id,
            name: name.to_string(),
            unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn test_same_name_different_units_stay_separate() {
        let recipes = vec![CartRecipe {
            id: 1,
            name: "Pancakes".to_string(),
        }];
        let list = aggregate(
            recipes,
            vec![line(1, "milk", "ml", 200), line(1, "milk", "cup", 1)],
        )
        .unwrap();

        assert_eq!(list.item_count(), 2);
        assert_eq!(list.items[0].unit, "cup");
        assert_eq!(list.items[1].unit, "ml");
    }

    #[test]
    fn test_lines_outside_cart_are_ignored() {
        let recipes = vec![CartRecipe {
            id: 7,
            name: "Soup".to_string(),
        }];
        let list = aggregate(
            recipes,
            vec![line(7, "onion", "pcs", 1), line(8, "onion", "pcs", 5)],
        )
        .unwrap();

        assert_eq!(list.items[0].amount, 1);
    }

    #[test]
    fn test_recipe_without_ingredients_still_listed() {
        let recipes = vec![CartRecipe {
            id: 3,
            name: "Toast".to_string(),
        }];
        let list = aggregate(recipes, Vec::new()).unwrap();

        assert_eq!(list.recipes, vec!["Toast"]);
        assert_eq!(list.item_count(), 0);
    }
}
