//! Aggregation and rendering of a cart's shopping list.

use potluck_core::document::{layout_shopping_list, Element, PageGeometry, RECIPE_NAME_LIMIT};
use potluck_core::{
    aggregate, render_shopping_list, CartRecipe, IngredientLine, ShoppingItem, ShoppingList,
    ShoppingListError,
};

fn recipe(id: u32, name: &str) -> CartRecipe<u32> {
    CartRecipe {
        id,
        name: name.to_string(),
    }
}

fn line(recipe_id: u32, name: &str, unit: &str, amount: i64) -> IngredientLine<u32> {
    IngredientLine {
        recipe_id,
        name: name.to_string(),
        unit: unit.to_string(),
        amount,
    }
}

fn item(name: &str, unit: &str, amount: i64) -> ShoppingItem {
    ShoppingItem {
        name: name.to_string(),
        unit: unit.to_string(),
        amount,
    }
}

#[test]
fn sums_shared_ingredients_and_sorts_by_name() {
    // Cart order deliberately reversed
    let recipes = vec![recipe(2, "R2"), recipe(1, "R1")];
    let lines = vec![
        line(1, "flour", "g", 200),
        line(1, "salt", "g", 5),
        line(2, "flour", "g", 300),
        line(2, "egg", "pcs", 2),
    ];

    let list = aggregate(recipes, lines).unwrap();

    assert_eq!(list.recipes, vec!["R1", "R2"]);
    assert_eq!(
        list.items,
        vec![
            item("egg", "pcs", 2),
            item("flour", "g", 500),
            item("salt", "g", 5),
        ]
    );
    assert_eq!(list.item_count(), 3);
}

#[test]
fn empty_cart_is_an_error() {
    let result = aggregate::<u32, _>(Vec::new(), vec![line(1, "flour", "g", 200)]);
    assert_eq!(result, Err(ShoppingListError::EmptyCart));
}

#[test]
fn aggregation_is_deterministic() {
    let lines = || {
        vec![
            line(3, "sugar", "g", 10),
            line(1, "butter", "g", 50),
            line(2, "sugar", "g", 15),
            line(1, "sugar", "g", 5),
        ]
    };
    let a = aggregate(vec![recipe(1, "a"), recipe(2, "b"), recipe(3, "c")], lines()).unwrap();
    let b = aggregate(vec![recipe(3, "c"), recipe(1, "a"), recipe(2, "b")], lines()).unwrap();

    assert_eq!(a, b);
    assert_eq!(a.items, vec![item("butter", "g", 50), item("sugar", "g", 30)]);
}

#[test]
fn many_recipes_span_pages_and_each_appears_once() {
    let geometry = PageGeometry::default();
    let count = geometry.lines_per_page() * 2;
    let list = ShoppingList {
        recipes: (0..count).map(|i| format!("Recipe number {i:03}")).collect(),
        items: vec![item("flour", "g", 500)],
    };

    let layout = layout_shopping_list("Shopping list", &list, geometry);

    assert!(layout.page_count() > 1);
    let texts: Vec<&str> = layout.texts().collect();
    for name in &list.recipes {
        let hits = texts.iter().filter(|t| t.ends_with(name.as_str())).count();
        assert_eq!(hits, 1, "{name} appeared {hits} times");
    }
}

#[test]
fn layout_sections_in_order() {
    let list = ShoppingList {
        recipes: vec!["R1".to_string(), "x".repeat(RECIPE_NAME_LIMIT + 10)],
        items: vec![item("egg", "pcs", 2), item("flour", "g", 500)],
    };

    let layout = layout_shopping_list("Shopping list", &list, PageGeometry::default());
    let first = &layout.pages[0].elements;
    let truncated = format!("2. {}...", "x".repeat(RECIPE_NAME_LIMIT - 3));

    assert_eq!(first[0].element, Element::Title("Shopping list".to_string()));
    let texts: Vec<&str> = layout.texts().collect();
    assert_eq!(
        texts,
        vec![
            "Shopping list",
            "Recipes:",
            "1. R1",
            truncated.as_str(),
            "Ingredients:",
            "- egg - 2 pcs",
            "- flour - 500 g",
            "Total items: 2",
            "Happy shopping!",
        ]
    );
    let dividers = first
        .iter()
        .filter(|p| p.element == Element::Divider)
        .count();
    assert_eq!(dividers, 2);
}

#[test]
fn renders_pdf_with_missing_font() {
    let list = aggregate(
        vec![recipe(1, "R1")],
        vec![line(1, "flour", "g", 200)],
    )
    .unwrap();

    let bytes = render_shopping_list(&list, Some(std::path::Path::new("/nonexistent/font.ttf")))
        .unwrap();

    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn shopping_list_serializes_for_clients() {
    let list = aggregate(
        vec![recipe(1, "R1")],
        vec![line(1, "flour", "g", 200), line(1, "flour", "g", 50)],
    )
    .unwrap();

    let json = serde_json::to_value(&list).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "recipes": ["R1"],
            "items": [{"name": "flour", "unit": "g", "amount": 250}],
        })
    );
}
