//! Short-link tokens for recipes.
//!
//! A token is three alphanumeric characters. The allocator keeps drawing
//! candidates until it finds one that is not taken, and after
//! [`MAX_ATTEMPTS`] draws it hands out an unchecked four-character token.
//! Nothing is reserved here: the caller persists the token and the storage
//! layer's unique constraint catches concurrent allocations.

use rand::distr::Alphanumeric;
use rand::Rng;
use std::fmt::Display;

pub const TOKEN_LENGTH: usize = 3;
pub const FALLBACK_TOKEN_LENGTH: usize = 4;
pub const MAX_ATTEMPTS: usize = 100;

/// Produces candidate tokens of a requested length.
pub trait TokenSource {
    fn generate(&mut self, length: usize) -> String;
}

/// Alphanumeric tokens from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokenSource;

impl TokenSource for RandomTokenSource {
    fn generate(&mut self, length: usize) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }
}

/// Allocate a token that `is_taken` reports as free.
///
/// `is_taken` is usually an existence query against the recipes table, so
/// its error type is the caller's and is propagated unchanged.
pub fn allocate_token<S, F, E>(source: &mut S, mut is_taken: F) -> Result<String, E>
where
    S: TokenSource + ?Sized,
    F: FnMut(&str) -> Result<bool, E>,
{
    for attempt in 1..=MAX_ATTEMPTS {
        let candidate = source.generate(TOKEN_LENGTH);
        if !is_taken(&candidate)? {
            if attempt > 1 {
                tracing::debug!(attempt, "short link token allocated after collisions");
            }
            return Ok(candidate);
        }
    }

    let fallback = source.generate(FALLBACK_TOKEN_LENGTH);
    tracing::warn!(
        attempts = MAX_ATTEMPTS,
        "short link candidates exhausted, using unchecked {}-character token",
        FALLBACK_TOKEN_LENGTH
    );
    Ok(fallback)
}

/// Whether `token` could have come from the allocator.
pub fn is_valid_token(token: &str) -> bool {
    (TOKEN_LENGTH..=FALLBACK_TOKEN_LENGTH).contains(&token.len())
        && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Public short link: `{host}/s/{token}/`.
pub fn short_link_url(host: &str, token: &str) -> String {
    format!("{}/s/{}/", host.trim_end_matches('/'), token)
}

/// Canonical recipe page a short link redirects to: `{host}/recipes/{id}/`.
pub fn recipe_url(host: &str, recipe_id: impl Display) -> String {
    format!("{}/recipes/{}/", host.trim_end_matches('/'), recipe_id)
}
