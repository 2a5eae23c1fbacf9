pub mod document;
pub mod error;
pub mod shopping_list;
pub mod short_link;

pub use document::{
    layout_shopping_list, render_pdf, render_shopping_list, Layout, PageGeometry,
    DOCUMENT_TITLE,
};
pub use error::{DocumentError, ShoppingListError};
pub use shopping_list::{aggregate, CartRecipe, IngredientLine, ShoppingItem, ShoppingList};
pub use short_link::{
    allocate_token, recipe_url, short_link_url, RandomTokenSource, TokenSource,
};
