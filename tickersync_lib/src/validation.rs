use chrono::NaiveDate;

use crate::error::TickerSyncError;

/// Maximum page size accepted by the tickers endpoint.
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// Longest table identifier accepted, qualifier included.
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate a SQL table identifier: `name` or `schema.name`, where each part
/// is `[A-Za-z_][A-Za-z0-9_]*`. Identifiers are interpolated into DDL, so
/// anything else is rejected.
pub fn validate_identifier(input: &str) -> Result<String, TickerSyncError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TickerSyncError::InvalidInput(
            "table name is empty".to_string(),
        ));
    }
    if trimmed.len() > MAX_IDENTIFIER_LENGTH {
        return Err(TickerSyncError::InvalidInput(format!(
            "table name exceeds maximum length of {} bytes",
            MAX_IDENTIFIER_LENGTH
        )));
    }
    let parts: Vec<&str> = trimmed.split('.').collect();
    if parts.len() > 2 || !parts.iter().all(|part| is_identifier_part(part)) {
        return Err(TickerSyncError::InvalidInput(format!(
            "invalid table name '{}'. Expected NAME or SCHEMA.NAME using letters, digits and underscores",
            trimmed
        )));
    }
    Ok(trimmed.to_string())
}

fn is_identifier_part(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate page size (must be 1..=1000).
pub fn validate_limit(limit: u32) -> Result<u32, TickerSyncError> {
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(TickerSyncError::InvalidInput(format!(
            "page limit must be between 1 and {}, got {}",
            MAX_PAGE_LIMIT, limit
        )));
    }
    Ok(limit)
}

/// Validate a scheduler interval in seconds (must be >= 1).
pub fn validate_interval_secs(secs: u64) -> Result<u64, TickerSyncError> {
    if secs == 0 {
        return Err(TickerSyncError::InvalidInput(
            "interval must be at least 1 second".to_string(),
        ));
    }
    Ok(secs)
}

/// Validate a YYYY-MM-DD date string.
pub fn validate_date(input: &str) -> Result<NaiveDate, TickerSyncError> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
        TickerSyncError::InvalidInput(format!(
            "invalid date '{}'. Expected format: YYYY-MM-DD (e.g., 2026-02-07)",
            trimmed
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_plain() {
        assert_eq!(validate_identifier("TICKERS").unwrap(), "TICKERS");
    }

    #[test]
    fn identifier_qualified() {
        assert_eq!(
            validate_identifier(" main.raw_tickers ").unwrap(),
            "main.raw_tickers"
        );
    }

    #[test]
    fn identifier_rejects_injection() {
        assert!(validate_identifier("tickers; DROP TABLE x").is_err());
        assert!(validate_identifier("tickers--").is_err());
        assert!(validate_identifier("\"quoted\"").is_err());
    }

    #[test]
    fn identifier_rejects_bad_shapes() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1tickers").is_err());
        assert!(validate_identifier("a.b.c").is_err());
        assert!(validate_identifier("a.").is_err());
        assert!(validate_identifier(&"t".repeat(129)).is_err());
    }

    #[test]
    fn limit_bounds() {
        assert_eq!(validate_limit(1).unwrap(), 1);
        assert_eq!(validate_limit(1000).unwrap(), 1000);
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(1001).is_err());
    }

    #[test]
    fn interval_must_be_positive() {
        assert!(validate_interval_secs(0).is_err());
        assert_eq!(validate_interval_secs(60).unwrap(), 60);
    }

    #[test]
    fn date_valid() {
        assert_eq!(
            validate_date("2026-02-07").unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 7).unwrap()
        );
    }

    #[test]
    fn date_invalid() {
        assert!(validate_date("02/07/2026").is_err());
        assert!(validate_date("2026-13-01").is_err());
    }
}
