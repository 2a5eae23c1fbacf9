use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShoppingListError {
    #[error("Shopping cart is empty")]
    EmptyCart,
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Document has no pages")]
    Empty,

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}
