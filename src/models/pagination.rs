// src/models/pagination.rs
use serde::Serialize;

/// `limit` / `offset` window applied to list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    /// Parses raw query values. Missing or malformed values fall back to the
    /// defaults; `limit` is capped at `max_limit`.
    pub fn parse(limit: Option<&str>, offset: Option<&str>, default_limit: i64, max_limit: i64) -> Self {
        let limit = limit
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|n| *n > 0)
            .map_or(default_limit, |n| n.min(max_limit));
        let offset = offset
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|n| *n >= 0)
            .unwrap_or(0);
        Pagination { limit, offset }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_values_fall_back_to_defaults() {
        assert_eq!(Pagination::parse(None, None, 50, 100), Pagination { limit: 50, offset: 0 });
        assert_eq!(Pagination::parse(Some("abc"), Some("-3"), 50, 100), Pagination { limit: 50, offset: 0 });
        assert_eq!(Pagination::parse(Some("0"), Some("10"), 50, 100), Pagination { limit: 50, offset: 10 });
    }

    #[test]
    fn limit_is_capped() {
        assert_eq!(Pagination::parse(Some("1000"), None, 100, 500).limit, 500);
        assert_eq!(Pagination::parse(Some("20"), None, 100, 500).limit, 20);
    }
}
