//! Report tests over ingested uploads
//!
//! Each test pushes real upload payloads through the importers and then
//! checks the derived reports against hand-computed figures, so parsing,
//! storage and reporting are exercised together: flow KPIs, the monthly
//! roll-up, segment and deal breakdowns, repeat activity, the fiscal-year
//! trend over a file-backed store and the quarter-over-quarter AUM shift.

use anyhow::Result;
use chrono::NaiveDate;
use instiflow::db::{self, init_database, open_db};
use instiflow::db::models::{DealKind, FlowCollection, InvestorType, Segment};
use instiflow::fiscal::DateRange;
use instiflow::importers::{ingest_city_workbook, ingest_deals, ingest_flow};
use instiflow::reports::flows::AverageBasis;
use instiflow::reports::{
    calculate_deals_report, calculate_flow_summary, calculate_repeat_activity,
    calculate_segment_breakdown, compare_latest_quarters, fiscal_year_trend, monthly_flows,
    DealDimension, RepeatBy,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use rust_xlsxwriter::{Workbook, Worksheet};
use tempfile::TempDir;

const PROVISIONAL_HEADER: &str =
    "Date,FII_Gross_Purchase,FII_Gross_Sales,FII_Net,DII_Gross_Purchase,DII_Gross_Sales,DII_Net";

const BULK_HEADER: &str =
    "Date,Symbol,Security Name,Client Name,Buy/Sell,Quantity Traded,Trade Price / Wght. Avg. Price";

const BLOCK_HEADER: &str =
    "Date,Symbol,Security Name,Client Name,Quantity Traded,Trade Price / Wght. Avg. Price";

/// Test helper: temp directory with an initialized store
fn create_test_db() -> Result<(TempDir, Connection)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    init_database(Some(db_path.clone()))?;
    let conn = open_db(Some(db_path))?;
    Ok((temp_dir, conn))
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn range(start: NaiveDate, end: NaiveDate, label: &str) -> DateRange {
    DateRange {
        start,
        end,
        label: label.to_string(),
    }
}

/// Fill one worksheet in the layout the importer expects: date row, header
/// row, city rows, then the three metadata rows
fn fill_quarter_sheet(
    worksheet: &mut Worksheet,
    name: &str,
    as_of: &str,
    cities: &[(&str, f64)],
    other: f64,
    nris: f64,
    total: f64,
) -> Result<()> {
    worksheet.set_name(name)?;
    worksheet.write_string(0, 0, format!("AUM allocation as of {}", as_of))?;
    worksheet.write_string(1, 0, "City")?;
    worksheet.write_string(1, 1, "AUM %")?;

    let mut row: u32 = 2;
    for (city, pct) in cities {
        worksheet.write_string(row, 0, *city)?;
        worksheet.write_number(row, 1, *pct)?;
        row += 1;
    }

    worksheet.write_string(row, 0, "Other Cities")?;
    worksheet.write_number(row, 1, other)?;
    worksheet.write_string(row + 1, 0, "NRIs & Overseas")?;
    worksheet.write_number(row + 1, 1, nris)?;
    worksheet.write_string(row + 2, 0, "Total")?;
    worksheet.write_number(row + 2, 1, total)?;
    Ok(())
}

#[test]
fn test_flow_summary_matches_ingested_rows() -> Result<()> {
    let (_dir, mut conn) = create_test_db()?;
    let csv = format!(
        "{}\n\
         2024-04-01,12000,10000,2000,7000,6500,500\n\
         2024-04-02,9000,9500,-500,6000,5800,200\n\
         2024-04-03,11000,10200,800,8000,7900,100\n",
        PROVISIONAL_HEADER
    );
    ingest_flow(
        &mut conn,
        FlowCollection::CashProvisional,
        csv.as_bytes(),
        "april.csv",
    )?;

    let window = range(d(2024, 4, 1), d(2024, 4, 30), "April 2024");
    let summary = calculate_flow_summary(&conn, &window)?;

    assert_eq!(summary.trading_days, 3);
    assert_eq!(summary.fii.gross_purchase, dec!(32000));
    assert_eq!(summary.fii.gross_sales, dec!(29700));
    assert_eq!(summary.fii.net, dec!(2300));
    assert_eq!(summary.dii.net, dec!(800));
    assert_eq!(summary.combined_net, dec!(3100));
    assert_eq!(summary.fii.positive_days, 2);
    assert_eq!(summary.dii.positive_days, 3);

    // 30-day window averages per trading day
    assert_eq!(summary.average_basis, Some(AverageBasis::PerDay));
    assert_eq!(
        summary.fii.period_average,
        Some(dec!(2300) / Decimal::from(3))
    );

    // Last session vs the one before: FII 800 after -500, DII 100 after 200
    assert_eq!(summary.fii.change_pct, dec!(260));
    assert_eq!(summary.dii.change_pct, dec!(-50));
    assert_eq!(summary.combined_change_pct, dec!(400));

    assert_eq!(summary.dominance_gap, dec!(1500));
    assert_eq!(summary.dominant_side, "FII");
    Ok(())
}

#[test]
fn test_monthly_rollup_groups_calendar_months() -> Result<()> {
    let (_dir, mut conn) = create_test_db()?;
    let csv = format!(
        "{}\n\
         2024-04-28,1000,900,100,200,100,100\n\
         2024-04-29,500,700,-200,300,250,50\n\
         2024-05-02,2000,1800,200,900,1000,-100\n",
        PROVISIONAL_HEADER
    );
    ingest_flow(
        &mut conn,
        FlowCollection::CashProvisional,
        csv.as_bytes(),
        "spring.csv",
    )?;

    let records = db::cash_provisional_range(&conn, d(2024, 4, 1), d(2024, 5, 31))?;
    let months = monthly_flows(&records);

    assert_eq!(months.len(), 2);
    assert_eq!(months[0].label, "April 2024");
    assert_eq!(months[0].fii_net, dec!(-100));
    assert_eq!(months[0].dii_net, dec!(150));
    assert_eq!(months[0].combined_net, dec!(50));
    assert_eq!(months[0].trading_days, 2);
    assert_eq!(months[1].label, "May 2024");
    assert_eq!(months[1].combined_net, dec!(100));
    assert_eq!(months[1].trading_days, 1);
    Ok(())
}

#[test]
fn test_segment_breakdown_ranks_across_collections() -> Result<()> {
    let (_dir, mut conn) = create_test_db()?;

    let fii_cash = "Date,FII_EQUITY_Gross_Purchase,FII_EQUITY_Gross_Sales,FII_EQUITY_Net,\
                    FII_DEBT_Gross_Purchase,FII_DEBT_Gross_Sales,FII_DEBT_Net\n\
                    2024-04-05,5000,4200,800,900,1100,-200\n";
    ingest_flow(
        &mut conn,
        FlowCollection::FiiCash,
        fii_cash.as_bytes(),
        "fii_cash.csv",
    )?;

    let dii_fo = "Date,DII_FUTURES_Gross_Purchase_Indices,DII_FUTURES_Gross_Sales_Indices,\
                  DII_FUTURES_Net_Indices,DII_OPTIONS_Gross_Purchase_Indices,\
                  DII_OPTIONS_Gross_Sales_Indices,DII_OPTIONS_Net_Indices\n\
                  2024-04-05,3000,1500,1500,700,700,0\n";
    ingest_flow(
        &mut conn,
        FlowCollection::DiiFoIndices,
        dii_fo.as_bytes(),
        "dii_fo.csv",
    )?;

    let window = range(d(2024, 4, 1), d(2024, 4, 30), "April 2024");
    let breakdown = calculate_segment_breakdown(&conn, &window, None, None)?;

    // Ranked by absolute net: futures 1500, equity 800, debt -200, options 0
    assert_eq!(breakdown.len(), 4);
    assert_eq!(breakdown[0].investor_type, InvestorType::Dii);
    assert_eq!(breakdown[0].net, dec!(1500));
    assert_eq!(breakdown[1].investor_type, InvestorType::Fii);
    assert_eq!(breakdown[1].net, dec!(800));
    assert_eq!(breakdown[2].net, dec!(-200));
    assert_eq!(breakdown[3].net, dec!(0));

    let net_sum: Decimal = breakdown.iter().map(|e| e.net).sum();
    assert_eq!(net_sum, dec!(2100));

    let fii_only = calculate_segment_breakdown(&conn, &window, Some(InvestorType::Fii), None)?;
    assert_eq!(fii_only.len(), 2);
    assert!(fii_only.iter().all(|e| e.investor_type == InvestorType::Fii));

    let dii_cash =
        calculate_segment_breakdown(&conn, &window, Some(InvestorType::Dii), Some(Segment::Cash))?;
    assert!(dii_cash.is_empty());
    Ok(())
}

#[test]
fn test_deals_report_reconciles_with_breakdown() -> Result<()> {
    let (_dir, mut conn) = create_test_db()?;

    let bulk = format!(
        "{}\n\
         04/01/2024,RELIANCE,Reliance Industries Limited,Morgan Stanley Asia,BUY,100000,2400.00\n\
         04/02/2024,TCS,Tata Consultancy Services Limited,SBI Mutual Fund,SELL,50000,3900.00\n\
         04/03/2024,INFY,Infosys Limited,Morgan Stanley Asia,BUY,80000,1500.00\n",
        BULK_HEADER
    );
    ingest_deals(&mut conn, DealKind::Bulk, bulk.as_bytes(), "bulk.csv")?;

    let block = format!(
        "{}\n04/02/2024,HDFCBANK,HDFC Bank Limited,Quant Desk Alpha,200000,1450.00\n",
        BLOCK_HEADER
    );
    ingest_deals(&mut conn, DealKind::Block, block.as_bytes(), "block.csv")?;

    let window = range(d(2024, 4, 1), d(2024, 4, 30), "April 2024");
    let report = calculate_deals_report(&conn, &window, None, DealDimension::Sector)?;

    assert_eq!(report.total_deals, 4);
    assert_eq!(report.buy_deals, 2);
    assert_eq!(report.sell_deals, 1);
    assert_eq!(report.neutral_deals, 1);
    assert_eq!(report.total_buying, dec!(360000000));
    assert_eq!(report.total_selling, dec!(195000000));
    assert_eq!(report.net_flow, dec!(165000000));

    // All symbols traded once; value breaks the tie
    let stock = report.most_active_stock.as_ref().unwrap();
    assert_eq!(stock.name, "HDFCBANK");
    assert_eq!(stock.total_value, dec!(290000000));
    let client = report.most_active_client.as_ref().unwrap();
    assert_eq!(client.name, "Morgan Stanley Asia");
    assert_eq!(client.deal_count, 2);

    // Sector ranking by absolute net; directionless block deals count in
    // gross but not in net
    assert_eq!(report.breakdown[0].name, "Oil & Gas");
    assert_eq!(report.breakdown[0].net_value, dec!(240000000));
    assert_eq!(report.breakdown[1].name, "IT");
    assert_eq!(report.breakdown[1].net_value, dec!(-75000000));
    assert_eq!(report.breakdown[1].gross_value, dec!(315000000));
    assert_eq!(report.breakdown[1].deal_count, 2);
    assert_eq!(report.breakdown[2].name, "Banking");
    assert_eq!(report.breakdown[2].net_value, dec!(0));
    assert_eq!(report.breakdown[2].gross_value, dec!(290000000));

    let net_sum: Decimal = report.breakdown.iter().map(|e| e.net_value).sum();
    assert_eq!(net_sum, report.net_flow);
    let count_sum: usize = report.breakdown.iter().map(|e| e.deal_count).sum();
    assert_eq!(count_sum, report.total_deals);

    let bulk_only =
        calculate_deals_report(&conn, &window, Some(DealKind::Bulk), DealDimension::Sector)?;
    assert_eq!(bulk_only.total_deals, 3);
    assert_eq!(bulk_only.neutral_deals, 0);

    let by_class = calculate_deals_report(&conn, &window, None, DealDimension::Investor)?;
    let names: Vec<&str> = by_class.breakdown.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["FII", "DII", "Others"]);
    Ok(())
}

#[test]
fn test_repeat_activity_spans_bulk_and_block() -> Result<()> {
    let (_dir, mut conn) = create_test_db()?;

    let bulk = format!(
        "{}\n\
         04/01/2024,TATAMOTORS,Tata Motors Limited,Jhunjhunwala Family Trust,BUY,10000,950.00\n\
         04/05/2024,DLF,DLF Limited,Kedia Securities,SELL,5000,800.00\n",
        BULK_HEADER
    );
    ingest_deals(&mut conn, DealKind::Bulk, bulk.as_bytes(), "bulk.csv")?;

    let block = format!(
        "{}\n04/03/2024,TATAMOTORS,Tata Motors Limited,Jhunjhunwala Family Trust,20000,955.00\n",
        BLOCK_HEADER
    );
    ingest_deals(&mut conn, DealKind::Block, block.as_bytes(), "block.csv")?;

    let window = range(d(2024, 4, 1), d(2024, 4, 30), "April 2024");

    // The trust shows up once in each table; only the combined view repeats
    let repeats = calculate_repeat_activity(&conn, &window, None, RepeatBy::Client)?;
    assert_eq!(repeats.len(), 1);
    assert_eq!(repeats[0].entity, "Jhunjhunwala Family Trust");
    assert_eq!(repeats[0].occurrences, 2);
    assert_eq!(repeats[0].total_value, dec!(28600000));
    assert_eq!(repeats[0].counterparties, 1);
    assert_eq!(repeats[0].first_date, d(2024, 4, 1));
    assert_eq!(repeats[0].last_date, d(2024, 4, 3));

    let bulk_only =
        calculate_repeat_activity(&conn, &window, Some(DealKind::Bulk), RepeatBy::Client)?;
    assert!(bulk_only.is_empty());

    let by_symbol = calculate_repeat_activity(&conn, &window, None, RepeatBy::Symbol)?;
    assert_eq!(by_symbol.len(), 1);
    assert_eq!(by_symbol[0].entity, "TATAMOTORS");
    assert_eq!(by_symbol[0].counterparties, 1);
    Ok(())
}

#[tokio::test]
async fn test_trend_reads_persisted_years_concurrently() -> Result<()> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("trend.db");
    init_database(Some(db_path.clone()))?;
    let mut conn = open_db(Some(db_path.clone()))?;

    let csv = format!(
        "{}\n\
         2023-07-05,2000,1500,500,100,200,-100\n\
         2024-04-15,1000,800,200,500,450,50\n\
         2025-03-10,900,1000,-100,300,250,50\n",
        PROVISIONAL_HEADER
    );
    ingest_flow(
        &mut conn,
        FlowCollection::CashProvisional,
        csv.as_bytes(),
        "history.csv",
    )?;

    let years = vec![
        "FY24-25".to_string(),
        "FY22-23".to_string(),
        "FY23-24".to_string(),
        "junk".to_string(),
    ];
    let trend = fiscal_year_trend(Some(db_path), &years).await?;

    assert_eq!(trend.months.len(), 12);
    assert_eq!(trend.months[0], "Apr");
    assert!(trend
        .warnings
        .iter()
        .any(|w| w.contains("unrecognized fiscal year 'junk'")));

    // Years come back oldest first; the empty year is a 12-point zero series
    assert_eq!(trend.series.len(), 3);
    assert_eq!(trend.series[0].fiscal_year, "FY 2022-2023");
    assert_eq!(trend.series[0].fii_total, Decimal::ZERO);
    assert!(trend.series[0].fii_net.iter().all(|v| v.is_zero()));

    // July 2023 lands at fiscal month index 3
    assert_eq!(trend.series[1].fiscal_year, "FY 2023-2024");
    assert_eq!(trend.series[1].fii_net[3], dec!(500));
    assert_eq!(trend.series[1].fii_total, dec!(500));
    assert_eq!(trend.series[1].dii_total, dec!(-100));
    assert_eq!(trend.series[1].quarter_net, [dec!(0), dec!(400), dec!(0), dec!(0)]);

    // April 2024 at index 0, March 2025 at index 11
    assert_eq!(trend.series[2].fiscal_year, "FY 2024-2025");
    assert_eq!(trend.series[2].fii_net[0], dec!(200));
    assert_eq!(trend.series[2].fii_net[11], dec!(-100));
    assert_eq!(trend.series[2].fii_total, dec!(100));
    assert_eq!(trend.series[2].quarter_net[0], dec!(250));
    assert_eq!(trend.series[2].quarter_net[3], dec!(-50));

    // Growth off an empty year is pinned to zero instead of dividing by it
    assert_eq!(trend.comparisons.len(), 2);
    assert_eq!(trend.comparisons[0].fii_growth_pct, Decimal::ZERO);
    assert_eq!(trend.comparisons[1].from_year, "FY 2023-2024");
    assert_eq!(trend.comparisons[1].fii_growth_pct, dec!(-80));
    Ok(())
}

#[test]
fn test_quarter_comparison_after_two_workbook_imports() -> Result<()> {
    let (dir, mut conn) = create_test_db()?;

    let q1_path = dir.path().join("q1.xlsx");
    let mut q1 = Workbook::new();
    fill_quarter_sheet(
        q1.add_worksheet(),
        "Q1 FY2024-25",
        "2024-06-30",
        &[("Mumbai", 41.52), ("Delhi", 11.33)],
        30.15,
        17.00,
        100.0,
    )?;
    q1.save(&q1_path)?;
    ingest_city_workbook(&mut conn, &q1_path)?;

    let q2_path = dir.path().join("q2.xlsx");
    let mut q2 = Workbook::new();
    fill_quarter_sheet(
        q2.add_worksheet(),
        "Q2 FY2024-25",
        "2024-09-30",
        &[("Mumbai", 40.02), ("Delhi", 12.08), ("Pune", 2.75)],
        28.15,
        17.00,
        100.0,
    )?;
    q2.save(&q2_path)?;
    ingest_city_workbook(&mut conn, &q2_path)?;

    let comparison = compare_latest_quarters(&conn)?.unwrap();
    assert_eq!(comparison.from_quarter, "Q1 FY2024-25");
    assert_eq!(comparison.to_quarter, "Q2 FY2024-25");

    // Largest absolute movement first; a new city moves by its whole share
    assert_eq!(comparison.changes[0].city, "Pune");
    assert_eq!(comparison.changes[0].previous_pct, None);
    assert_eq!(comparison.changes[0].change_points, dec!(2.75));
    assert_eq!(comparison.changes[1].city, "Mumbai");
    assert_eq!(comparison.changes[1].change_points, dec!(-1.50));
    assert_eq!(comparison.changes[2].city, "Delhi");
    assert_eq!(comparison.changes[2].change_points, dec!(0.75));
    Ok(())
}
