//! Utility functions for formatting and common operations
//!
//! This module provides centralized formatting utilities for consistent
//! display of rupee amounts and percentage changes throughout the
//! application.

use rust_decimal::Decimal;

/// Format a rupee amount with auto-scaled Indian units.
///
/// Values at or above one crore render as `₹x.xx Cr`, above one lakh as
/// `₹x.xx L`, above one thousand as `₹x.xx K`, otherwise plain `₹x.xx`.
/// Negative values carry the sign outside the symbol.
///
/// # Examples
/// ```
/// use instiflow::utils::format_inr;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_inr(dec!(25000000)), "₹2.50 Cr");
/// assert_eq!(format_inr(dec!(450000)), "₹4.50 L");
/// assert_eq!(format_inr(dec!(8200)), "₹8.20 K");
/// assert_eq!(format_inr(dec!(950.5)), "₹950.50");
/// assert_eq!(format_inr(dec!(-25000000)), "-₹2.50 Cr");
/// ```
pub fn format_inr(value: Decimal) -> String {
    let crore = Decimal::from(10_000_000u64);
    let lakh = Decimal::from(100_000u64);
    let thousand = Decimal::from(1_000u64);

    let sign = if value.is_sign_negative() { "-" } else { "" };
    let abs = value.abs();

    if abs >= crore {
        format!("{}₹{:.2} Cr", sign, abs / crore)
    } else if abs >= lakh {
        format!("{}₹{:.2} L", sign, abs / lakh)
    } else if abs >= thousand {
        format!("{}₹{:.2} K", sign, abs / thousand)
    } else {
        format!("{}₹{:.2}", sign, abs)
    }
}

/// Format an amount already denominated in ₹ crore, with Indian digit
/// grouping (3 digits, then groups of 2).
///
/// # Examples
/// ```
/// use instiflow::utils::format_crore;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_crore(dec!(1234.5)), "₹1,234.50 Cr");
/// assert_eq!(format_crore(dec!(12345678.9)), "₹1,23,45,678.90 Cr");
/// assert_eq!(format_crore(dec!(-842.25)), "-₹842.25 Cr");
/// ```
pub fn format_crore(value: Decimal) -> String {
    let sign = if value.is_sign_negative() { "-" } else { "" };
    let formatted = format!("{:.2}", value.abs());
    let (integer_part, decimal_part) = match formatted.split_once('.') {
        Some((i, d)) => (i.to_string(), d.to_string()),
        None => (formatted, "00".to_string()),
    };

    format!(
        "{}₹{}.{} Cr",
        sign,
        group_indian_digits(&integer_part),
        decimal_part
    )
}

/// Insert Indian-style separators: last three digits, then pairs
fn group_indian_digits(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let head_chars: Vec<char> = head.chars().collect();
    let mut groups: Vec<String> = Vec::new();
    let mut end = head_chars.len();
    while end > 2 {
        groups.push(head_chars[end - 2..end].iter().collect());
        end -= 2;
    }
    if end > 0 {
        groups.push(head_chars[..end].iter().collect());
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Percentage change from `previous` to `current`.
///
/// A zero baseline yields 0 rather than a division error, and a negative
/// baseline divides by its magnitude so the sign of the result always
/// follows the direction of the move.
///
/// # Examples
/// ```
/// use instiflow::utils::percentage_change;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(percentage_change(dec!(150), dec!(100)), dec!(50));
/// assert_eq!(percentage_change(dec!(50), dec!(-100)), dec!(150));
/// assert_eq!(percentage_change(dec!(10), dec!(0)), dec!(0));
/// ```
pub fn percentage_change(current: Decimal, previous: Decimal) -> Decimal {
    if previous.is_zero() {
        return Decimal::ZERO;
    }
    ((current - previous) / previous.abs()) * Decimal::ONE_HUNDRED
}

/// Render a percentage with an explicit sign: "+12.5%" / "-3.4%"
pub fn format_signed_pct(value: Decimal) -> String {
    if value.is_sign_negative() {
        format!("{:.1}%", value)
    } else {
        format!("+{:.1}%", value)
    }
}
