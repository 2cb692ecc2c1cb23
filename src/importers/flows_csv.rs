//! CSV importers for daily institutional flow uploads
//!
//! Two layouts share one grammar: the combined provisional file (one row per
//! date covering FII and DII cash) and the per-collection segment files (one
//! row per date for a single investor/segment pair, two asset-class column
//! triplets). Amounts are ₹ crore with thousands separators tolerated; dates
//! are strict `YYYY-MM-DD`.
//!
//! Net columns must be present in the header but their values are ignored:
//! net is always derived as gross purchase minus gross sales so a stale or
//! hand-edited Net cell can never disagree with the stored grosses.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use super::validation::{parse_amount, parse_iso_date, verify_headers, ValidationIssue};
use crate::db::models::{CashProvisionalRecord, FlowCollection, FlowRecord};
use crate::error::FlowError;

/// Result of parsing one upload: accepted records plus row-indexed issues
#[derive(Debug)]
pub struct CsvParse<T> {
    pub records: Vec<T>,
    pub issues: Vec<ValidationIssue>,
}

/// One named column resolved to its position in the header row
#[derive(Debug, Clone)]
struct Column {
    name: String,
    idx: usize,
}

impl Column {
    fn locate(found: &[String], name: &str) -> Result<Self, String> {
        match found.iter().position(|h| h == name) {
            Some(idx) => Ok(Self {
                name: name.to_string(),
                idx,
            }),
            None => Err(format!("header row is missing column '{}'", name)),
        }
    }

    fn cell<'r>(&self, record: &'r csv::StringRecord) -> &'r str {
        record.get(self.idx).unwrap_or("")
    }
}

/// Both flow layouts are `Date` plus two (purchase, sales, net) triplets;
/// only the date and the four gross columns carry values we keep.
#[derive(Debug)]
struct FlowColumns {
    date: Column,
    first_purchase: Column,
    first_sales: Column,
    second_purchase: Column,
    second_sales: Column,
}

impl FlowColumns {
    fn locate(found: &[String], expected: &[String]) -> Result<Self, String> {
        verify_headers(found, expected)?;
        Ok(Self {
            date: Column::locate(found, &expected[0])?,
            first_purchase: Column::locate(found, &expected[1])?,
            first_sales: Column::locate(found, &expected[2])?,
            second_purchase: Column::locate(found, &expected[4])?,
            second_sales: Column::locate(found, &expected[5])?,
        })
    }
}

/// Date plus the four gross amounts of one accepted row
struct RawFlowRow {
    date: NaiveDate,
    first_purchase: Decimal,
    first_sales: Decimal,
    second_purchase: Decimal,
    second_sales: Decimal,
}

/// Parse the combined FII+DII provisional cash file
pub fn parse_cash_provisional_csv<P: AsRef<Path>>(
    path: P,
) -> Result<CsvParse<CashProvisionalRecord>> {
    let path = path.as_ref();
    info!("Parsing cash provisional CSV: {:?}", path);
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    parse_cash_provisional(file)
}

/// Parse combined provisional rows from any reader
pub fn parse_cash_provisional(input: impl Read) -> Result<CsvParse<CashProvisionalRecord>> {
    let expected = FlowCollection::CashProvisional.expected_headers();
    let (rows, issues) = read_flow_rows(input, &expected)?;

    let records = rows
        .into_iter()
        .map(|row| {
            CashProvisionalRecord::new(
                row.date,
                row.first_purchase,
                row.first_sales,
                row.second_purchase,
                row.second_sales,
            )
        })
        .collect();

    Ok(CsvParse { records, issues })
}

/// Parse a per-segment file into flow records, two per row (one per asset
/// class carried by the collection)
pub fn parse_segment_csv<P: AsRef<Path>>(
    path: P,
    collection: FlowCollection,
) -> Result<CsvParse<FlowRecord>> {
    let path = path.as_ref();
    info!("Parsing {} CSV: {:?}", collection.as_str(), path);
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    parse_segment(file, collection)
}

/// Parse per-segment rows from any reader
pub fn parse_segment(input: impl Read, collection: FlowCollection) -> Result<CsvParse<FlowRecord>> {
    let (investor_type, segment) = match (collection.investor_type(), collection.segment()) {
        (Some(investor), Some(segment)) => (investor, segment),
        _ => bail!(
            "{} is not a per-segment collection",
            collection.display_name()
        ),
    };
    let (first_asset, second_asset) = match collection.asset_classes() {
        Some(pair) => pair,
        None => bail!(
            "{} does not declare asset-class columns",
            collection.display_name()
        ),
    };

    let expected = collection.expected_headers();
    let (rows, issues) = read_flow_rows(input, &expected)?;

    let mut records = Vec::with_capacity(rows.len() * 2);
    for row in rows {
        records.push(FlowRecord::new(
            row.date,
            investor_type,
            segment,
            first_asset,
            row.first_purchase,
            row.first_sales,
        ));
        records.push(FlowRecord::new(
            row.date,
            investor_type,
            segment,
            second_asset,
            row.second_purchase,
            row.second_sales,
        ));
    }

    Ok(CsvParse { records, issues })
}

/// Shared reader: verifies the header, then validates every row, collecting
/// one issue per bad cell instead of stopping at the first
fn read_flow_rows(
    input: impl Read,
    expected: &[String],
) -> Result<(Vec<RawFlowRow>, Vec<ValidationIssue>)> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .context("failed to read CSV header row")?
        .clone();
    let found: Vec<String> = headers.iter().map(str::to_string).collect();
    let columns = FlowColumns::locate(&found, expected).map_err(FlowError::Format)?;

    let mut rows = Vec::new();
    let mut issues = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let record = result.context("failed to read CSV record")?;
        // Header is line 1, first data row is line 2
        let line = idx + 2;

        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let date = check_date(&columns.date, &record, line, &mut issues);
        let first_purchase = check_amount(&columns.first_purchase, &record, line, &mut issues);
        let first_sales = check_amount(&columns.first_sales, &record, line, &mut issues);
        let second_purchase = check_amount(&columns.second_purchase, &record, line, &mut issues);
        let second_sales = check_amount(&columns.second_sales, &record, line, &mut issues);

        match (
            date,
            first_purchase,
            first_sales,
            second_purchase,
            second_sales,
        ) {
            (
                Some(date),
                Some(first_purchase),
                Some(first_sales),
                Some(second_purchase),
                Some(second_sales),
            ) => rows.push(RawFlowRow {
                date,
                first_purchase,
                first_sales,
                second_purchase,
                second_sales,
            }),
            _ => warn!("Rejecting row at line {}", line),
        }
    }

    Ok((rows, issues))
}

fn check_date(
    column: &Column,
    record: &csv::StringRecord,
    line: usize,
    issues: &mut Vec<ValidationIssue>,
) -> Option<NaiveDate> {
    let cell = column.cell(record);
    match parse_iso_date(cell) {
        Ok(date) => Some(date),
        Err(reason) => {
            issues.push(ValidationIssue::new(line, &column.name, cell, reason));
            None
        }
    }
}

fn check_amount(
    column: &Column,
    record: &csv::StringRecord,
    line: usize,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Decimal> {
    let cell = column.cell(record);
    match parse_amount(cell) {
        Ok(amount) => Some(amount),
        Err(reason) => {
            issues.push(ValidationIssue::new(line, &column.name, cell, reason));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{AssetClass, InvestorType, Segment};
    use rust_decimal_macros::dec;

    #[test]
    fn test_cash_provisional_happy_path_derives_net() {
        // Net columns carry deliberately wrong values; derived net must win
        let csv = "\
Date,FII_Gross_Purchase,FII_Gross_Sales,FII_Net,DII_Gross_Purchase,DII_Gross_Sales,DII_Net
2024-04-01,\"12,500.50\",11000.25,999.99,8000.00,7500.00,999.99
2024-04-02,9000.00,9500.00,999.99,6000.00,5800.00,999.99
";
        let parsed = parse_cash_provisional(csv.as_bytes()).unwrap();
        assert!(parsed.issues.is_empty());
        assert_eq!(parsed.records.len(), 2);

        let first = &parsed.records[0];
        assert_eq!(first.fii_gross_purchase, dec!(12500.50));
        assert_eq!(first.fii_net, dec!(1500.25));
        assert_eq!(first.dii_net, dec!(500.00));
        assert_eq!(first.fiscal_year, "2024-25");
        assert_eq!(first.quarter, "Q1 FY2024-25");
        assert_eq!(first.month_name, "April 2024");

        assert_eq!(parsed.records[1].fii_net, dec!(-500.00));
    }

    #[test]
    fn test_lowercase_date_header_rejects_whole_file() {
        let csv = "\
date,FII_Gross_Purchase,FII_Gross_Sales,FII_Net,DII_Gross_Purchase,DII_Gross_Sales,DII_Net
2024-04-01,1,1,0,1,1,0
";
        let err = parse_cash_provisional(csv.as_bytes()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'Date'"));
        assert!(msg.contains("case-sensitive"));
    }

    #[test]
    fn test_bad_rows_reported_good_rows_kept() {
        let csv = "\
Date,FII_Gross_Purchase,FII_Gross_Sales,FII_Net,DII_Gross_Purchase,DII_Gross_Sales,DII_Net
2024-04-01,100,90,10,50,40,10
01/04/2024,100,90,10,50,40,10
2024-04-03,abc,90,10,,40,10
";
        let parsed = parse_cash_provisional(csv.as_bytes()).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.issues.len(), 3);

        assert_eq!(parsed.issues[0].row, 3);
        assert_eq!(parsed.issues[0].field, "Date");
        // Line 4 collects both bad cells in the same pass
        assert_eq!(parsed.issues[1].row, 4);
        assert_eq!(parsed.issues[1].field, "FII_Gross_Purchase");
        assert_eq!(parsed.issues[2].field, "DII_Gross_Purchase");
    }

    #[test]
    fn test_column_order_is_not_checked() {
        let csv = "\
FII_Net,DII_Net,DII_Gross_Sales,DII_Gross_Purchase,FII_Gross_Sales,FII_Gross_Purchase,Date
0,0,40,50,90,100,2024-04-01
";
        let parsed = parse_cash_provisional(csv.as_bytes()).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].fii_gross_purchase, dec!(100));
        assert_eq!(parsed.records[0].dii_gross_sales, dec!(40));
    }

    #[test]
    fn test_segment_row_fans_out_per_asset_class() {
        let csv = "\
Date,FII_EQUITY_Gross_Purchase,FII_EQUITY_Gross_Sales,FII_EQUITY_Net,FII_DEBT_Gross_Purchase,FII_DEBT_Gross_Sales,FII_DEBT_Net
2025-01-15,5000,4200,0,900,1100,0
";
        let parsed = parse_segment(csv.as_bytes(), FlowCollection::FiiCash).unwrap();
        assert!(parsed.issues.is_empty());
        assert_eq!(parsed.records.len(), 2);

        let equity = &parsed.records[0];
        assert_eq!(equity.investor_type, InvestorType::Fii);
        assert_eq!(equity.segment, Segment::Cash);
        assert_eq!(equity.asset_class, AssetClass::Equity);
        assert_eq!(equity.net, dec!(800));
        // January tags to the earlier fiscal year
        assert_eq!(equity.fiscal_year, "2024-25");
        assert_eq!(equity.quarter, "Q4 FY2024-25");

        let debt = &parsed.records[1];
        assert_eq!(debt.asset_class, AssetClass::Debt);
        assert_eq!(debt.net, dec!(-200));
    }

    #[test]
    fn test_indices_collection_requires_suffixed_headers() {
        let csv = "\
Date,FII_FUTURES_Gross_Purchase_Indices,FII_FUTURES_Gross_Sales_Indices,FII_FUTURES_Net_Indices,FII_OPTIONS_Gross_Purchase_Indices,FII_OPTIONS_Gross_Sales_Indices,FII_OPTIONS_Net_Indices
2024-07-10,1500,1200,0,300,450,0
";
        let parsed = parse_segment(csv.as_bytes(), FlowCollection::FiiFoIndices).unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].asset_class, AssetClass::Futures);
        assert_eq!(parsed.records[1].asset_class, AssetClass::Options);

        // Unsuffixed headers do not satisfy the indices layout
        let unsuffixed = "\
Date,FII_FUTURES_Gross_Purchase,FII_FUTURES_Gross_Sales,FII_FUTURES_Net,FII_OPTIONS_Gross_Purchase,FII_OPTIONS_Gross_Sales,FII_OPTIONS_Net
2024-07-10,1500,1200,0,300,450,0
";
        assert!(parse_segment(unsuffixed.as_bytes(), FlowCollection::FiiFoIndices).is_err());
    }

    #[test]
    fn test_blank_trailing_rows_skipped_silently() {
        let csv = "\
Date,FII_Gross_Purchase,FII_Gross_Sales,FII_Net,DII_Gross_Purchase,DII_Gross_Sales,DII_Net
2024-04-01,100,90,10,50,40,10
,,,,,,
";
        let parsed = parse_cash_provisional(csv.as_bytes()).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert!(parsed.issues.is_empty());
    }

    #[test]
    fn test_cash_provisional_is_not_a_segment_collection() {
        let csv = "Date\n";
        assert!(parse_segment(csv.as_bytes(), FlowCollection::CashProvisional).is_err());
    }
}
