//! Workbook importer for the quarterly city-wise AUM allocation
//!
//! One workbook carries one worksheet per quarter, named "Q1 2024-25",
//! "Q1 FY2024-25" or "Quarter 1 2024-25". Layout per sheet: the first row
//! embeds the quarter-end date, the second row is column headers, then
//! city/percentage pairs, and the last three rows are the Other Cities,
//! NRIs & Overseas and Total metadata.
//!
//! A worksheet that breaks the layout is rejected on its own; the rest of
//! the workbook still parses. Named-city percentages plus the two metadata
//! categories are reconciled against the stated total, and a difference of
//! 0.1 percentage points or more is surfaced as a warning without blocking
//! the import.

use anyhow::{Context, Result};
use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::db::models::{CityAllocation, QuarterAum};
use crate::refdata::cities::lookup_city;

/// Differences below this many percentage points reconcile silently
const RECONCILE_TOLERANCE_PCT: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

static SHEET_NAME_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"(?i)^Q([1-4])\s+(\d{4})-(\d{2})$").unwrap(),
        Regex::new(r"(?i)^Q([1-4])\s+FY(\d{4})-(\d{2})$").unwrap(),
        Regex::new(r"(?i)^Quarter\s+([1-4])\s+(\d{4})-(\d{2})$").unwrap(),
    ]
});

static ISO_DATE_IN_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap()
});

/// Result of parsing one workbook
#[derive(Debug)]
pub struct WorkbookParse {
    /// Accepted quarters, sorted by fiscal year then quarter number
    pub quarters: Vec<QuarterAum>,
    /// Unmapped cities and reconciliation mismatches; never blocking
    pub warnings: Vec<String>,
    /// Per-worksheet rejections; the rest of the workbook still parses
    pub errors: Vec<String>,
}

/// Parse a city allocation workbook from disk
pub fn parse_city_aum_workbook<P: AsRef<Path>>(path: P) -> Result<WorkbookParse> {
    let path = path.as_ref();
    info!("Parsing city AUM workbook: {:?}", path);

    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("failed to open workbook {}", path.display()))?;

    let mut quarters = Vec::new();
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    let sheet_names = workbook.sheet_names();
    for name in &sheet_names {
        let (quarter_number, fy_start) = match parse_sheet_name(name) {
            Some(parsed) => parsed,
            None => {
                errors.push(format!(
                    "worksheet '{}' does not follow the quarter naming patterns \
                     (Q1 2024-25, Q1 FY2024-25, Quarter 1 2024-25)",
                    name
                ));
                continue;
            }
        };

        let range = match workbook.worksheet_range(name) {
            Ok(range) => range,
            Err(e) => {
                errors.push(format!("worksheet '{}' could not be read: {}", name, e));
                continue;
            }
        };
        let rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();

        match parse_worksheet(name, quarter_number, fy_start, &rows, &mut warnings) {
            Ok(quarter) => {
                debug!(
                    "Worksheet '{}' parsed: {} cities as of {}",
                    name,
                    quarter.cities.len(),
                    quarter.as_of_date
                );
                quarters.push(quarter);
            }
            Err(message) => errors.push(format!("worksheet '{}' {}", name, message)),
        }
    }

    drop_duplicate_quarters(&mut quarters, &mut errors);
    quarters.sort_by(|a, b| {
        a.fiscal_year
            .cmp(&b.fiscal_year)
            .then(a.quarter_number.cmp(&b.quarter_number))
    });

    for warning in &warnings {
        warn!("{}", warning);
    }
    info!(
        "Workbook parsed: {} quarter(s), {} warning(s), {} error(s)",
        quarters.len(),
        warnings.len(),
        errors.len()
    );

    Ok(WorkbookParse {
        quarters,
        warnings,
        errors,
    })
}

/// Parse a worksheet name into (quarter number, fiscal start year)
fn parse_sheet_name(name: &str) -> Option<(u8, i32)> {
    for pattern in SHEET_NAME_PATTERNS.iter() {
        let caps = match pattern.captures(name.trim()) {
            Some(caps) => caps,
            None => continue,
        };
        let quarter = caps.get(1)?.as_str().parse::<u8>().ok()?;
        let start = caps.get(2)?.as_str().parse::<i32>().ok()?;
        let end = caps.get(3)?.as_str().parse::<i32>().ok()?;
        // The short year must continue the long one (2024-25, not 2024-27)
        if (start + 1) % 100 != end {
            return None;
        }
        return Some((quarter, start));
    }
    None
}

fn parse_worksheet(
    name: &str,
    quarter_number: u8,
    fy_start: i32,
    rows: &[Vec<Data>],
    warnings: &mut Vec<String>,
) -> Result<QuarterAum, String> {
    // Date row, header row and the three trailing metadata rows at minimum
    if rows.len() < 5 {
        return Err("has too few rows for the expected layout".to_string());
    }

    let as_of_date = match extract_quarter_end_date(&rows[0]) {
        Some(date) => date,
        None => return Err("does not carry a quarter-end date in its first row".to_string()),
    };

    if rows[1].len() < 2 {
        return Err("is missing the city/percentage header row".to_string());
    }

    let mut cities = Vec::new();
    for row in &rows[2..rows.len() - 3] {
        let city = cell_text(row, 0);
        if city.is_empty() {
            continue;
        }
        // Non-numeric percentage cells are trailing junk, not data
        let share_pct = match cell_decimal(row, 1) {
            Some(pct) => pct,
            None => continue,
        };

        let coords = lookup_city(&city);
        if coords.is_none() {
            warnings.push(format!(
                "{}: no coordinates for city '{}'; it will not render on the map",
                name, city
            ));
        }

        cities.push(CityAllocation {
            city,
            share_pct,
            latitude: coords.map(|c| c.latitude),
            longitude: coords.map(|c| c.longitude),
        });
    }

    // Trailing metadata: Other Cities, NRIs & Overseas, Total. Values sit in
    // the percentage column; a blank cell reads as zero.
    let other_cities_pct =
        cell_decimal(&rows[rows.len() - 3], 1).unwrap_or(Decimal::ZERO);
    let nri_overseas_pct =
        cell_decimal(&rows[rows.len() - 2], 1).unwrap_or(Decimal::ZERO);
    let stated_total_pct =
        cell_decimal(&rows[rows.len() - 1], 1).unwrap_or(Decimal::ZERO);

    let fiscal_year = format!("{}-{:02}", fy_start, (fy_start + 1) % 100);
    let quarter = QuarterAum {
        quarter_key: format!("Q{} FY{}", quarter_number, fiscal_year),
        fiscal_year,
        quarter_number,
        as_of_date,
        cities,
        other_cities_pct,
        nri_overseas_pct,
        stated_total_pct,
    };

    let computed = quarter.computed_total();
    let difference = (computed - quarter.stated_total_pct).abs();
    if difference >= RECONCILE_TOLERANCE_PCT {
        warnings.push(format!(
            "{}: city percentages sum to {} but the sheet states {} ({} point difference)",
            name,
            computed.normalize(),
            quarter.stated_total_pct.normalize(),
            difference.normalize()
        ));
    }

    Ok(quarter)
}

/// Scan the first row for the quarter-end date, either as a real date cell
/// or embedded anywhere in a label like "AUM as of 2024-06-30"
fn extract_quarter_end_date(row: &[Data]) -> Option<NaiveDate> {
    for cell in row {
        if let Data::DateTime(dt) = cell {
            let days = dt.as_f64().floor() as i64;
            // Excel serial day 0 is 1899-12-30
            let date = NaiveDate::from_ymd_opt(1899, 12, 30)
                .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(days)));
            if let Some(date) = date {
                return Some(date);
            }
        }

        let text = cell.to_string();
        if let Some(found) = ISO_DATE_IN_CELL.find(&text) {
            if let Ok(date) = NaiveDate::parse_from_str(found.as_str(), "%Y-%m-%d") {
                return Some(date);
            }
        }
    }
    None
}

/// A duplicated quarter key is ambiguous about which worksheet is
/// authoritative; every worksheet carrying it is rejected, the rest of the
/// workbook survives
fn drop_duplicate_quarters(quarters: &mut Vec<QuarterAum>, errors: &mut Vec<String>) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for quarter in quarters.iter() {
        *counts.entry(quarter.quarter_key.clone()).or_insert(0) += 1;
    }

    let mut duplicated: Vec<String> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(key, _)| key)
        .collect();
    duplicated.sort();

    for key in &duplicated {
        errors.push(format!(
            "multiple worksheets resolve to {}; none of them were imported",
            key
        ));
    }
    quarters.retain(|quarter| !duplicated.contains(&quarter.quarter_key));
}

fn cell_text(row: &[Data], idx: usize) -> String {
    row.get(idx)
        .map(|cell| cell.to_string().trim().to_string())
        .unwrap_or_default()
}

fn cell_decimal(row: &[Data], idx: usize) -> Option<Decimal> {
    match row.get(idx)? {
        Data::Int(i) => Some(Decimal::from(*i)),
        // Excel floats carry binary noise; four decimal places is plenty
        // for percentage shares
        Data::Float(f) => Decimal::from_f64_retain(*f).map(|d| d.round_dp(4)),
        other => {
            let text = other.to_string().trim().replace(',', "");
            if text.is_empty() {
                return None;
            }
            Decimal::from_str(&text).ok()
        }
    }
}
