//! Allocation behaviour against a pre-populated token set and against
//! generators that only ever produce collisions.

use potluck_core::short_link::{
    allocate_token, is_valid_token, RandomTokenSource, TokenSource, FALLBACK_TOKEN_LENGTH,
    MAX_ATTEMPTS, TOKEN_LENGTH,
};
use std::collections::HashSet;
use std::convert::Infallible;

/// Always returns the same taken token at the short length, and a fixed
/// token at any other length. Counts every draw.
struct AlwaysColliding {
    draws: usize,
}

impl TokenSource for AlwaysColliding {
    fn generate(&mut self, length: usize) -> String {
        self.draws += 1;
        if length == TOKEN_LENGTH {
            "aaa".to_string()
        } else {
            "Zz99".to_string()
        }
    }
}

/// Cycles through a fixed list.
struct Cycle {
    tokens: Vec<String>,
    next: usize,
}

impl TokenSource for Cycle {
    fn generate(&mut self, _length: usize) -> String {
        let token = self.tokens[self.next % self.tokens.len()].clone();
        self.next += 1;
        token
    }
}

#[test]
fn never_returns_an_existing_token() {
    let mut source = RandomTokenSource;
    let mut existing: HashSet<String> = (0..500).map(|_| source.generate(TOKEN_LENGTH)).collect();

    for _ in 0..200 {
        let token = allocate_token(&mut source, |candidate| {
            Ok::<_, Infallible>(existing.contains(candidate))
        })
        .unwrap();

        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(is_valid_token(&token));
        assert!(!existing.contains(&token), "duplicate token {token}");
        existing.insert(token);
    }
}

#[test]
fn skips_taken_candidates_in_order() {
    let taken: HashSet<&str> = ["abc", "def"].into_iter().collect();
    let mut source = Cycle {
        tokens: vec!["abc".into(), "def".into(), "ghi".into()],
        next: 0,
    };

    let token =
        allocate_token(&mut source, |c| Ok::<_, Infallible>(taken.contains(c))).unwrap();

    assert_eq!(token, "ghi");
    assert_eq!(source.next, 3);
}

#[test]
fn falls_back_to_longer_token_after_max_attempts() {
    let mut source = AlwaysColliding { draws: 0 };
    let mut checks = 0;

    let token = allocate_token(&mut source, |_| {
        checks += 1;
        Ok::<_, Infallible>(true)
    })
    .unwrap();

    assert_eq!(token, "Zz99");
    assert_eq!(token.len(), FALLBACK_TOKEN_LENGTH);
    assert_eq!(checks, MAX_ATTEMPTS);
    // 100 checked draws plus the one unchecked fallback
    assert_eq!(source.draws, MAX_ATTEMPTS + 1);
}

#[test]
fn succeeds_on_last_allowed_attempt() {
    let mut tokens: Vec<String> = vec!["aaa".into(); MAX_ATTEMPTS - 1];
    tokens.push("bbb".into());
    let mut source = Cycle { tokens, next: 0 };

    let token =
        allocate_token(&mut source, |c| Ok::<_, Infallible>(c == "aaa")).unwrap();

    assert_eq!(token, "bbb");
}
