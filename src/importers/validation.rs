//! Row validation for uploaded files
//!
//! Collects all issues instead of failing on the first error, so one pass
//! over a large upload reports every bad row at once. Header problems are
//! different: a header mismatch rejects the whole file before any row is
//! parsed.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

/// A validation issue found in one uploaded row
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    /// Line number in the upload file (1-indexed; line 1 is the header)
    pub row: usize,
    /// Column name that has the issue
    pub field: String,
    /// The problematic value
    pub value: String,
    /// Description of why this is an issue
    pub reason: String,
    /// Suggestion for fixing the issue (if available)
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    pub fn new(
        row: usize,
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            row,
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "row {}: {} '{}' {}",
            self.row, self.field, self.value, self.reason
        )?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Check that every expected column is present in the header row, exact case.
///
/// Extra columns are tolerated and order is not checked. Column names are
/// case-sensitive; a column present in the wrong case is called out
/// explicitly since `date` vs `Date` is the most common rejection cause.
pub fn verify_headers(found: &[String], expected: &[String]) -> Result<(), String> {
    let mut missing = Vec::new();
    for want in expected {
        if found.iter().any(|h| h == want) {
            continue;
        }
        match found.iter().find(|h| h.eq_ignore_ascii_case(want)) {
            Some(near) => missing.push(format!(
                "'{}' (found '{}'; column names are case-sensitive)",
                want, near
            )),
            None => missing.push(format!("'{}'", want)),
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "header row is missing required column(s): {}",
            missing.join(", ")
        ))
    }
}

/// Parse a locale-formatted amount: thousands separators stripped first.
///
/// Blank and non-numeric values are rejected, never coerced to zero; a zero
/// in the store must mean the source said zero.
pub fn parse_amount(text: &str) -> Result<Decimal, String> {
    let cleaned = text.trim().replace(',', "");
    if cleaned.is_empty() {
        return Err("is empty where a number was expected".to_string());
    }
    Decimal::from_str(&cleaned).map_err(|_| "is not a number".to_string())
}

/// Strict `YYYY-MM-DD`
pub fn parse_iso_date(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| "is not a YYYY-MM-DD date".to_string())
}

/// Deal feeds arrive with US-style `MM/DD/YYYY` dates; ISO is accepted too
pub fn parse_deal_date(text: &str) -> Result<NaiveDate, String> {
    let trimmed = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%m/%d/%Y") {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    Err("is not a MM/DD/YYYY or YYYY-MM-DD date".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn h(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_verify_headers_exact_match() {
        let expected = h(&["Date", "FII_Gross_Purchase"]);
        assert!(verify_headers(&h(&["Date", "FII_Gross_Purchase"]), &expected).is_ok());
        // Order and extras do not matter
        assert!(verify_headers(
            &h(&["FII_Gross_Purchase", "Remarks", "Date"]),
            &expected
        )
        .is_ok());
    }

    #[test]
    fn test_verify_headers_rejects_wrong_case() {
        let expected = h(&["Date", "FII_Gross_Purchase"]);
        let err = verify_headers(&h(&["date", "FII_Gross_Purchase"]), &expected).unwrap_err();
        assert!(err.contains("'Date'"));
        assert!(err.contains("case-sensitive"));
    }

    #[test]
    fn test_verify_headers_reports_all_missing() {
        let expected = h(&["Date", "FII_Net", "DII_Net"]);
        let err = verify_headers(&h(&["Date"]), &expected).unwrap_err();
        assert!(err.contains("'FII_Net'"));
        assert!(err.contains("'DII_Net'"));
    }

    #[test]
    fn test_parse_amount_strips_thousands_separators() {
        assert_eq!(parse_amount("1,23,456.78").unwrap(), dec!(123456.78));
        assert_eq!(parse_amount(" -842.10 ").unwrap(), dec!(-842.10));
    }

    #[test]
    fn test_parse_amount_rejects_blank_and_text() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("   ").is_err());
        assert!(parse_amount("n/a").is_err());
    }

    #[test]
    fn test_parse_iso_date_strict() {
        assert_eq!(
            parse_iso_date("2024-04-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
        );
        assert!(parse_iso_date("01/04/2024").is_err());
        assert!(parse_iso_date("2024-13-01").is_err());
    }

    #[test]
    fn test_parse_deal_date_formats() {
        assert_eq!(
            parse_deal_date("03/15/2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert_eq!(
            parse_deal_date("2024-03-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert!(parse_deal_date("15-03-2024").is_err());
    }

    #[test]
    fn test_issue_display_includes_suggestion() {
        let issue = ValidationIssue::new(4, "Date", "2024/04/01", "is not a YYYY-MM-DD date")
            .with_suggestion("use 2024-04-01");
        let text = issue.to_string();
        assert!(text.contains("row 4"));
        assert!(text.contains("use 2024-04-01"));
    }
}
