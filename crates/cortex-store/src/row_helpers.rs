use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Get a required column value from a row, returning CorruptRow on failure.
pub fn get<T: rusqlite::types::FromSql>(
    row: &rusqlite::Row<'_>,
    idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<T, StoreError> {
    row.get(idx).map_err(|e| StoreError::CorruptRow {
        table,
        column,
        detail: e.to_string(),
    })
}

/// Get an optional column value.
pub fn get_opt<T: rusqlite::types::FromSql>(
    row: &rusqlite::Row<'_>,
    idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<Option<T>, StoreError> {
    row.get(idx).map_err(|e| StoreError::CorruptRow {
        table,
        column,
        detail: e.to_string(),
    })
}

/// Parse a JSON string column into a typed value, returning CorruptRow on failure.
pub fn parse_json<T: DeserializeOwned>(
    raw: &str,
    table: &'static str,
    column: &'static str,
) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::CorruptRow {
        table,
        column,
        detail: format!("invalid JSON: {e}"),
    })
}

/// Parse a string into an enum, returning CorruptRow on failure.
pub fn parse_enum<T: std::str::FromStr>(
    raw: &str,
    table: &'static str,
    column: &'static str,
) -> Result<T, StoreError> {
    raw.parse().map_err(|_| StoreError::CorruptRow {
        table,
        column,
        detail: format!("unknown variant: {raw}"),
    })
}

/// Parse an RFC 3339 timestamp column.
pub fn parse_timestamp(
    raw: &str,
    table: &'static str,
    column: &'static str,
) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::CorruptRow {
            table,
            column,
            detail: format!("invalid timestamp {raw}: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cortex_core::pattern::Outcome;

    #[test]
    fn parse_enum_success() {
        let result: Result<Outcome, _> = parse_enum("wrong_order", "pattern_rounds", "outcome");
        assert_eq!(result.unwrap(), Outcome::WrongOrder);
    }

    #[test]
    fn parse_enum_failure() {
        let result: Result<Outcome, _> = parse_enum("INVALID", "pattern_rounds", "outcome");
        assert!(matches!(
            result,
            Err(StoreError::CorruptRow { table: "pattern_rounds", column: "outcome", .. })
        ));
    }

    #[test]
    fn parse_json_typed() {
        let seq: Vec<u32> = parse_json("[3, 1, 4]", "pattern_sessions", "expected_sequence").unwrap();
        assert_eq!(seq, vec![3, 1, 4]);
    }

    #[test]
    fn parse_json_failure() {
        let result: Result<Vec<u32>, _> = parse_json("not json", "pattern_sessions", "expected_sequence");
        assert!(matches!(result, Err(StoreError::CorruptRow { column: "expected_sequence", .. })));
    }

    #[test]
    fn parse_timestamp_roundtrip() {
        let now = Utc::now();
        let parsed = parse_timestamp(&now.to_rfc3339(), "pattern_sessions", "started_at").unwrap();
        assert_eq!(parsed, now);
        assert!(parse_timestamp("yesterday", "pattern_sessions", "started_at").is_err());
    }
}
