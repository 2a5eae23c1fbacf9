use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Default, Clone, Copy, Deserialize, IntoParams)]
pub struct PaginationParams {
    /// Number of items to return (default: 20, max: 1000)
    pub limit: Option<i64>,
    /// Number of items to skip (default: 0)
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Clamped `(limit, offset)`.
    pub fn resolve(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMetadata {
    /// Total number of items available
    pub total: i64,
    /// Number of items requested (limit)
    pub limit: i64,
    /// Number of items skipped (offset)
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(PaginationParams::default().resolve(), (20, 0));
    }

    #[test]
    fn test_clamps_out_of_range_values() {
        let params = PaginationParams {
            limit: Some(5000),
            offset: Some(-3),
        };
        assert_eq!(params.resolve(), (1000, 0));

        let params = PaginationParams {
            limit: Some(0),
            offset: Some(40),
        };
        assert_eq!(params.resolve(), (1, 40));
    }
}
