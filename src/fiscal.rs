//! Fiscal calendar for Indian markets (April 1 – March 31 fiscal year).
//!
//! Every fiscal-year, quarter, and month label in the system is derived here
//! and nowhere else. The FY boundary rule is the most common source of
//! off-by-one bugs in this domain, so call sites must never re-implement it.
//!
//! All arithmetic works on wall-clock `NaiveDate` components; nothing in this
//! module touches epoch offsets or timezones, so date boundaries are stable
//! near UTC midnight.

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Earliest supported data date for the `All` selector.
pub fn epoch_floor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Today as a wall-clock date.
pub fn today() -> NaiveDate {
    Local::now().naive_local().date()
}

/// Fiscal months in display order, April first.
pub const FISCAL_MONTHS: [&str; 12] = [
    "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec", "Jan", "Feb", "Mar",
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Calendar year in which the fiscal year containing `date` starts.
pub fn fiscal_start_year(date: NaiveDate) -> i32 {
    if date.month() >= 4 {
        date.year()
    } else {
        date.year() - 1
    }
}

/// Fiscal-year label, e.g. `"2024-25"` for Apr 2024 – Mar 2025.
pub fn fiscal_year(date: NaiveDate) -> String {
    let start = fiscal_start_year(date);
    format!("{}-{:02}", start, (start + 1) % 100)
}

/// Short prefixed form used by period selectors, e.g. `"FY24-25"`.
pub fn fiscal_year_short(date: NaiveDate) -> String {
    let start = fiscal_start_year(date);
    format!("FY{:02}-{:02}", start % 100, (start + 1) % 100)
}

/// Fiscal quarter number for a date: Q1 Apr–Jun, Q2 Jul–Sep, Q3 Oct–Dec,
/// Q4 Jan–Mar.
pub fn quarter_number(date: NaiveDate) -> u8 {
    match date.month() {
        4..=6 => 1,
        7..=9 => 2,
        10..=12 => 3,
        _ => 4,
    }
}

/// Quarter label tagged with its fiscal year, e.g. `"Q4 FY2023-24"`.
///
/// Q4 (Jan–Mar) belongs to the fiscal year that started the previous April,
/// so its FY component uses the earlier calendar year.
pub fn quarter(date: NaiveDate) -> String {
    quarter_key(quarter_number(date), fiscal_start_year(date))
}

/// Canonical quarter key, e.g. `"Q1 FY2024-25"`. Doubles as the storage key
/// for quarter-indexed tables.
pub fn quarter_key(qn: u8, fy_start: i32) -> String {
    format!("Q{} FY{}-{:02}", qn, fy_start, (fy_start + 1) % 100)
}

/// Month label, e.g. `"April 2024"`.
pub fn month_name(date: NaiveDate) -> String {
    format!(
        "{} {}",
        MONTH_NAMES[date.month0() as usize],
        date.year()
    )
}

/// Position of a calendar month in the Apr–Mar fiscal ordering (Apr = 0,
/// Mar = 11).
pub fn fiscal_month_index(month: u32) -> usize {
    ((month + 8) % 12) as usize
}

/// Last calendar day of a month, via day 1 of the following month minus one
/// day (leap-safe; never hardcodes 28/30/31).
pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MIN)
}

/// High-level period requested by a caller. Parsing is total: input that
/// matches no grammar still produces a selector, and `resolve_range` falls
/// back to the current calendar month rather than erroring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodSelector {
    Today,
    /// `"YYYY-MM"`
    Month(String),
    /// `"Q1-FY24-25"`
    Quarter(String),
    /// `"FY24-25"` (also accepts `"FY2024-25"`)
    Year(String),
    All,
    RollingDays(i64),
}

impl PeriodSelector {
    /// Parse a CLI period string. Recognized forms: `today`, `all`,
    /// `YYYY-MM`, `Qn-FYyy-yy`, `FYyy-yy`, `Nd` (rolling days). Anything
    /// else resolves to the current-month fallback downstream.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let lower = trimmed.to_ascii_lowercase();

        match lower.as_str() {
            "today" => return PeriodSelector::Today,
            "all" | "alltime" | "all-time" => return PeriodSelector::All,
            _ => {}
        }

        if let Some(days) = lower
            .strip_suffix('d')
            .and_then(|n| n.parse::<i64>().ok())
        {
            if days > 0 {
                return PeriodSelector::RollingDays(days);
            }
        }

        if lower.starts_with('q') && lower.contains("-fy") {
            return PeriodSelector::Quarter(trimmed.to_string());
        }

        if lower.starts_with("fy") {
            return PeriodSelector::Year(trimmed.to_string());
        }

        // YYYY-MM or anything else; malformed month values hit the fallback
        PeriodSelector::Month(trimmed.to_string())
    }
}

/// Concrete date range with a deterministic display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

/// Resolve a `PeriodSelector` into a `[start, end]` range plus label.
///
/// Never fails: malformed selector values fall back to the current calendar
/// month.
pub fn resolve_range(selector: &PeriodSelector) -> DateRange {
    resolve_range_at(selector, today())
}

/// `resolve_range` with an injected "today", for deterministic tests.
pub fn resolve_range_at(selector: &PeriodSelector, today: NaiveDate) -> DateRange {
    match selector {
        PeriodSelector::Today => DateRange {
            start: today,
            end: today,
            label: "Today".to_string(),
        },
        PeriodSelector::Month(value) => match parse_month_value(value) {
            Some((year, month)) => {
                let start = NaiveDate::from_ymd_opt(year, month, 1)
                    .unwrap_or(today);
                DateRange {
                    start,
                    end: last_day_of_month(year, month),
                    label: month_name(start),
                }
            }
            None => current_month_fallback(today),
        },
        PeriodSelector::Quarter(value) => match parse_quarter_value(value) {
            Some((qn, fy_start)) => quarter_range(qn, fy_start),
            None => current_month_fallback(today),
        },
        PeriodSelector::Year(value) => match parse_fiscal_year_start(value) {
            Some(fy_start) => {
                let start = NaiveDate::from_ymd_opt(fy_start, 4, 1).unwrap_or(today);
                let end = NaiveDate::from_ymd_opt(fy_start + 1, 3, 31).unwrap_or(today);
                DateRange {
                    start,
                    end,
                    label: format!("FY {}-{}", fy_start, fy_start + 1),
                }
            }
            None => current_month_fallback(today),
        },
        PeriodSelector::All => DateRange {
            start: epoch_floor(),
            end: today,
            label: "All Time".to_string(),
        },
        PeriodSelector::RollingDays(days) => DateRange {
            start: today - Duration::days(*days),
            end: today,
            label: format!("Last {} Days", days),
        },
    }
}

fn current_month_fallback(today: NaiveDate) -> DateRange {
    let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
    DateRange {
        start,
        end: last_day_of_month(today.year(), today.month()),
        label: "Current Month".to_string(),
    }
}

fn parse_month_value(value: &str) -> Option<(i32, u32)> {
    let (year_str, month_str) = value.trim().split_once('-')?;
    let year: i32 = year_str.parse().ok()?;
    let month: u32 = month_str.parse().ok()?;
    if !(1..=12).contains(&month) || !(1900..=2100).contains(&year) {
        return None;
    }
    Some((year, month))
}

/// Normalize a quarter token (`"Q1-FY24-25"`, `"q1 fy2024-25"`) to the
/// canonical key form, or `None` when the token is malformed.
pub fn normalize_quarter_key(value: &str) -> Option<String> {
    let compact = value.trim().replace(' ', "-");
    let (qn, fy_start) = parse_quarter_value(&compact)?;
    Some(quarter_key(qn, fy_start))
}

/// Parse `"Q1-FY24-25"` into (quarter number, fiscal start year).
fn parse_quarter_value(value: &str) -> Option<(u8, i32)> {
    let upper = value.trim().to_ascii_uppercase();
    let (quarter_part, fy_part) = upper.split_once("-FY")?;
    let qn: u8 = quarter_part.strip_prefix('Q')?.parse().ok()?;
    if !(1..=4).contains(&qn) {
        return None;
    }
    let fy_start = parse_fy_years(fy_part)?;
    Some((qn, fy_start))
}

/// Parse `"FY24-25"` / `"FY2024-25"` / bare `"24-25"` into the fiscal start
/// year. Returns `None` when the years are not consecutive.
pub fn parse_fiscal_year_start(value: &str) -> Option<i32> {
    let upper = value.trim().to_ascii_uppercase();
    let cleaned = upper.strip_prefix("FY").unwrap_or(&upper).trim_start();
    parse_fy_years(cleaned)
}

fn parse_fy_years(years: &str) -> Option<i32> {
    let (start_str, end_str) = years.trim().split_once('-')?;
    let start_raw: i32 = start_str.trim().parse().ok()?;
    let end_raw: i32 = end_str.trim().parse().ok()?;
    let start = if start_raw < 100 { 2000 + start_raw } else { start_raw };
    let end = if end_raw < 100 { 2000 + end_raw } else { end_raw };
    if end != start + 1 {
        return None;
    }
    Some(start)
}

/// Calendar span of a fiscal quarter. Q4's months (Jan–Mar) land in the
/// *later* of the two FY calendar years.
fn quarter_range(qn: u8, fy_start: i32) -> DateRange {
    let (start_month, end_month, year) = match qn {
        1 => (4, 6, fy_start),
        2 => (7, 9, fy_start),
        3 => (10, 12, fy_start),
        _ => (1, 3, fy_start + 1),
    };
    let start = NaiveDate::from_ymd_opt(year, start_month, 1).unwrap_or(NaiveDate::MIN);
    DateRange {
        start,
        end: last_day_of_month(year, end_month),
        label: format!("Q{} FY{}-{}", qn, fy_start, fy_start + 1),
    }
}

/// Labeled option for a period dropdown/listing.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodOption {
    pub value: String,
    pub label: String,
}

/// Current fiscal year in short selector form, e.g. `"FY24-25"`.
pub fn current_fiscal_year() -> String {
    fiscal_year_short(today())
}

/// Last `count` fiscal years, newest first.
pub fn fiscal_year_options(count: usize) -> Vec<PeriodOption> {
    fiscal_year_options_at(count, today())
}

pub fn fiscal_year_options_at(count: usize, today: NaiveDate) -> Vec<PeriodOption> {
    let latest_start = fiscal_start_year(today);
    (0..count as i32)
        .map(|i| {
            let start = latest_start - i;
            PeriodOption {
                value: format!("FY{:02}-{:02}", start % 100, (start + 1) % 100),
                label: format!(
                    "FY {}-{} (Apr {} - Mar {})",
                    start,
                    start + 1,
                    start,
                    start + 1
                ),
            }
        })
        .collect()
}

/// Last `count` completed-or-current fiscal quarters, newest first.
pub fn quarter_options(count: usize) -> Vec<PeriodOption> {
    quarter_options_at(count, today())
}

pub fn quarter_options_at(count: usize, today: NaiveDate) -> Vec<PeriodOption> {
    let mut options = Vec::with_capacity(count);
    let mut qn = quarter_number(today);
    let mut fy_start = fiscal_start_year(today);

    for _ in 0..count {
        let range = quarter_range(qn, fy_start);
        let months = format!(
            "{}-{}",
            &MONTH_NAMES[range.start.month0() as usize][..3],
            &MONTH_NAMES[range.end.month0() as usize][..3]
        );
        options.push(PeriodOption {
            value: format!("Q{}-FY{:02}-{:02}", qn, fy_start % 100, (fy_start + 1) % 100),
            label: format!(
                "Q{} FY{}-{} ({} {})",
                qn,
                fy_start,
                fy_start + 1,
                months,
                range.start.year()
            ),
        });
        if qn == 1 {
            qn = 4;
            fy_start -= 1;
        } else {
            qn -= 1;
        }
    }

    options
}

/// Last `count` calendar months, newest first.
pub fn month_options(count: usize) -> Vec<PeriodOption> {
    month_options_at(count, today())
}

pub fn month_options_at(count: usize, today: NaiveDate) -> Vec<PeriodOption> {
    let mut options = Vec::with_capacity(count);
    let mut year = today.year();
    let mut month = today.month();

    for _ in 0..count {
        let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(today);
        options.push(PeriodOption {
            value: format!("{}-{:02}", year, month),
            label: month_name(first),
        });
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }

    options
}

/// Default reporting period: the latest complete month.
pub fn default_period() -> PeriodSelector {
    let now = today();
    let (year, month) = if now.month() == 1 {
        (now.year() - 1, 12)
    } else {
        (now.year(), now.month() - 1)
    };
    PeriodSelector::Month(format!("{}-{:02}", year, month))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_fiscal_year_boundary() {
        assert_eq!(fiscal_year(d(2024, 3, 15)), "2023-24");
        assert_eq!(fiscal_year(d(2024, 3, 31)), "2023-24");
        assert_eq!(fiscal_year(d(2024, 4, 1)), "2024-25");
        assert_eq!(fiscal_year(d(2024, 12, 31)), "2024-25");
        assert_eq!(fiscal_year(d(2025, 1, 1)), "2024-25");
    }

    #[test]
    fn test_fiscal_year_century_padding() {
        // End-year modulo keeps two digits across the 2099/2100 rollover
        assert_eq!(fiscal_year(d(2099, 5, 1)), "2099-00");
        assert_eq!(fiscal_year(d(2009, 5, 1)), "2009-10");
    }

    #[test]
    fn test_fiscal_year_short_form() {
        assert_eq!(fiscal_year_short(d(2024, 4, 1)), "FY24-25");
        assert_eq!(fiscal_year_short(d(2024, 2, 1)), "FY23-24");
    }

    #[test]
    fn test_quarter_labels() {
        assert_eq!(quarter(d(2024, 4, 1)), "Q1 FY2024-25");
        assert_eq!(quarter(d(2024, 7, 15)), "Q2 FY2024-25");
        assert_eq!(quarter(d(2024, 10, 1)), "Q3 FY2024-25");
        // Jan-Mar closes the FY that started the previous April
        assert_eq!(quarter(d(2025, 2, 28)), "Q4 FY2024-25");
    }

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(d(2024, 4, 10)), "April 2024");
        assert_eq!(month_name(d(2023, 12, 1)), "December 2023");
    }

    #[test]
    fn test_fiscal_month_index_apr_first() {
        assert_eq!(fiscal_month_index(4), 0);
        assert_eq!(fiscal_month_index(12), 8);
        assert_eq!(fiscal_month_index(1), 9);
        assert_eq!(fiscal_month_index(3), 11);
    }

    #[test]
    fn test_last_day_of_month_leap_years() {
        assert_eq!(last_day_of_month(2024, 2), d(2024, 2, 29));
        assert_eq!(last_day_of_month(2023, 2), d(2023, 2, 28));
        assert_eq!(last_day_of_month(2024, 12), d(2024, 12, 31));
        assert_eq!(last_day_of_month(2024, 4), d(2024, 4, 30));
    }

    #[test]
    fn test_resolve_today() {
        let now = d(2024, 6, 5);
        let range = resolve_range_at(&PeriodSelector::Today, now);
        assert_eq!(range.start, now);
        assert_eq!(range.end, now);
        assert_eq!(range.label, "Today");
    }

    #[test]
    fn test_resolve_month() {
        let range = resolve_range_at(
            &PeriodSelector::Month("2024-02".to_string()),
            d(2024, 6, 5),
        );
        assert_eq!(range.start, d(2024, 2, 1));
        assert_eq!(range.end, d(2024, 2, 29));
        assert_eq!(range.label, "February 2024");
    }

    #[test]
    fn test_resolve_quarter_q4_uses_later_calendar_year() {
        let range = resolve_range_at(
            &PeriodSelector::Quarter("Q4-FY23-24".to_string()),
            d(2024, 6, 5),
        );
        assert_eq!(range.start, d(2024, 1, 1));
        assert_eq!(range.end, d(2024, 3, 31));
        assert_eq!(range.label, "Q4 FY2023-2024");
    }

    #[test]
    fn test_resolve_quarter_q1() {
        let range = resolve_range_at(
            &PeriodSelector::Quarter("Q1-FY24-25".to_string()),
            d(2024, 6, 5),
        );
        assert_eq!(range.start, d(2024, 4, 1));
        assert_eq!(range.end, d(2024, 6, 30));
    }

    #[test]
    fn test_resolve_year() {
        let range = resolve_range_at(
            &PeriodSelector::Year("FY24-25".to_string()),
            d(2024, 6, 5),
        );
        assert_eq!(range.start, d(2024, 4, 1));
        assert_eq!(range.end, d(2025, 3, 31));
        assert_eq!(range.label, "FY 2024-2025");
    }

    #[test]
    fn test_resolve_year_accepts_full_years() {
        let range = resolve_range_at(
            &PeriodSelector::Year("FY2023-24".to_string()),
            d(2024, 6, 5),
        );
        assert_eq!(range.start, d(2023, 4, 1));
        assert_eq!(range.end, d(2024, 3, 31));
    }

    #[test]
    fn test_resolve_all_uses_epoch_floor() {
        let now = d(2024, 6, 5);
        let range = resolve_range_at(&PeriodSelector::All, now);
        assert_eq!(range.start, d(2020, 1, 1));
        assert_eq!(range.end, now);
        assert_eq!(range.label, "All Time");
    }

    #[test]
    fn test_resolve_rolling_days() {
        let now = d(2024, 6, 30);
        let range = resolve_range_at(&PeriodSelector::RollingDays(30), now);
        assert_eq!(range.start, d(2024, 5, 31));
        assert_eq!(range.end, now);
        assert_eq!(range.label, "Last 30 Days");
    }

    #[test]
    fn test_malformed_values_fall_back_to_current_month() {
        let now = d(2024, 6, 5);
        for selector in [
            PeriodSelector::Month("garbage".to_string()),
            PeriodSelector::Month("2024-13".to_string()),
            PeriodSelector::Quarter("Q9-FY24-25".to_string()),
            PeriodSelector::Quarter("Q1-FYxx-yy".to_string()),
            PeriodSelector::Year("FY24-26".to_string()),
        ] {
            let range = resolve_range_at(&selector, now);
            assert_eq!(range.start, d(2024, 6, 1), "selector: {:?}", selector);
            assert_eq!(range.end, d(2024, 6, 30), "selector: {:?}", selector);
            assert_eq!(range.label, "Current Month");
        }
    }

    #[test]
    fn test_parse_fiscal_year_start_forms() {
        assert_eq!(parse_fiscal_year_start("FY24-25"), Some(2024));
        assert_eq!(parse_fiscal_year_start("fy2023-24"), Some(2023));
        assert_eq!(parse_fiscal_year_start("2022-23"), Some(2022));
        // Non-consecutive or non-numeric years are rejected
        assert_eq!(parse_fiscal_year_start("FY24-26"), None);
        assert_eq!(parse_fiscal_year_start("banana"), None);
    }

    #[test]
    fn test_normalize_quarter_key_forms() {
        assert_eq!(
            normalize_quarter_key("Q1-FY24-25"),
            Some("Q1 FY2024-25".to_string())
        );
        assert_eq!(
            normalize_quarter_key("q2 fy2024-25"),
            Some("Q2 FY2024-25".to_string())
        );
        assert_eq!(
            normalize_quarter_key("Q4-FY2023-2024"),
            Some("Q4 FY2023-24".to_string())
        );
        assert_eq!(normalize_quarter_key("Q9-FY24-25"), None);
        assert_eq!(normalize_quarter_key("banana"), None);
    }

    #[test]
    fn test_selector_parse_grammars() {
        assert_eq!(PeriodSelector::parse("today"), PeriodSelector::Today);
        assert_eq!(PeriodSelector::parse("ALL"), PeriodSelector::All);
        assert_eq!(
            PeriodSelector::parse("30d"),
            PeriodSelector::RollingDays(30)
        );
        assert_eq!(
            PeriodSelector::parse("Q2-FY24-25"),
            PeriodSelector::Quarter("Q2-FY24-25".to_string())
        );
        assert_eq!(
            PeriodSelector::parse("FY24-25"),
            PeriodSelector::Year("FY24-25".to_string())
        );
        assert_eq!(
            PeriodSelector::parse("2024-05"),
            PeriodSelector::Month("2024-05".to_string())
        );
        // Unrecognized input still produces a selector (fallback downstream)
        assert_eq!(
            PeriodSelector::parse("whatever"),
            PeriodSelector::Month("whatever".to_string())
        );
    }

    #[test]
    fn test_fiscal_year_options_newest_first() {
        let options = fiscal_year_options_at(3, d(2024, 6, 5));
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].value, "FY24-25");
        assert_eq!(options[0].label, "FY 2024-2025 (Apr 2024 - Mar 2025)");
        assert_eq!(options[1].value, "FY23-24");
        assert_eq!(options[2].value, "FY22-23");
    }

    #[test]
    fn test_quarter_options_walk_backwards_across_fy() {
        let options = quarter_options_at(3, d(2024, 5, 10));
        // May 2024 is Q1 FY2024-25; walking back crosses into FY2023-24
        assert_eq!(options[0].value, "Q1-FY24-25");
        assert_eq!(options[1].value, "Q4-FY23-24");
        assert_eq!(options[2].value, "Q3-FY23-24");
    }

    #[test]
    fn test_month_options_wrap_year() {
        let options = month_options_at(3, d(2024, 1, 20));
        assert_eq!(options[0].value, "2024-01");
        assert_eq!(options[1].value, "2023-12");
        assert_eq!(options[2].value, "2023-11");
        assert_eq!(options[1].label, "December 2023");
    }

    #[test]
    fn test_round_trip_selector_through_resolver() {
        // Every option value must resolve without hitting the fallback
        let now = d(2024, 8, 14);
        for option in quarter_options_at(8, now) {
            let range =
                resolve_range_at(&PeriodSelector::parse(&option.value), now);
            assert_ne!(range.label, "Current Month", "value: {}", option.value);
        }
        for option in fiscal_year_options_at(5, now) {
            let range =
                resolve_range_at(&PeriodSelector::parse(&option.value), now);
            assert_ne!(range.label, "Current Month", "value: {}", option.value);
        }
    }
}
