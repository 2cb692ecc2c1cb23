mod cli;
mod db;
mod error;
mod fiscal;
mod importers;
mod refdata;
mod reports;
mod utils;

use anyhow::{anyhow, Result};
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::info;

use cli::formatters;
use cli::{Cli, Commands, ImportCommands, ReportCommands, TemplateCommands, UploadsCommands};
use db::models::{DealKind, FlowCollection, InvestorType, Segment};
use fiscal::DateRange;
use importers::ValidationIssue;
use reports::{DealDimension, RepeatBy};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let db_path = cli.db;
    let json = cli.json;

    match cli.command {
        Commands::Import { action } => match action {
            ImportCommands::Flows {
                file,
                collection,
                dry_run,
            } => handle_import_flows(db_path, &file, &collection, dry_run, json).await,
            ImportCommands::Deals {
                file,
                kind,
                dry_run,
            } => handle_import_deals(db_path, &file, &kind, dry_run, json).await,
            ImportCommands::CityAum { file, dry_run } => {
                handle_import_city_aum(db_path, &file, dry_run, json).await
            }
        },

        Commands::Report { action } => match action {
            ReportCommands::Summary {
                period,
                investor,
                segment,
            } => handle_report_summary(db_path, period, investor, segment, json),
            ReportCommands::Trend { years } => handle_report_trend(db_path, &years, json).await,
            ReportCommands::Deals {
                period,
                dimension,
                kind,
                symbol,
                client,
            } => handle_report_deals(db_path, period, &dimension, kind, symbol, client, json),
            ReportCommands::Repeats { period, by, kind } => {
                handle_report_repeats(db_path, period, &by, kind, json)
            }
            ReportCommands::CityAum { quarter, compare } => {
                handle_report_city_aum(db_path, quarter, compare, json)
            }
        },

        Commands::Uploads { action } => match action {
            UploadsCommands::List { limit } => handle_uploads_list(db_path, limit, json),
        },

        Commands::Periods => handle_periods(json),

        Commands::Template { action } => match action {
            TemplateCommands::Flows { out } => handle_template_flows(&out),
            TemplateCommands::Deals { out } => handle_template_deals(&out),
            TemplateCommands::CityAum { out } => handle_template_city_aum(&out),
        },
    }
}

/// Ensure the schema exists, then open a connection
fn open_connection(db_path: Option<PathBuf>) -> Result<rusqlite::Connection> {
    db::init_database(db_path.clone())?;
    db::open_db(db_path)
}

/// Resolve the `--period` flag; omitted means the latest complete month
fn resolve_period(period: Option<&str>) -> DateRange {
    let selector = match period {
        Some(value) => fiscal::PeriodSelector::parse(value),
        None => fiscal::default_period(),
    };
    fiscal::resolve_range(&selector)
}

fn parse_deal_kind(kind: Option<String>) -> Result<Option<DealKind>> {
    match kind {
        Some(value) => value
            .parse::<DealKind>()
            .map(Some)
            .map_err(|_| anyhow!("unknown deal kind '{}'", value)),
        None => Ok(None),
    }
}

fn print_issues(issues: &[ValidationIssue]) {
    if issues.is_empty() {
        return;
    }
    println!(
        "\n{} {} row(s) would be rejected:",
        "⚠".yellow().bold(),
        issues.len()
    );
    for issue in issues {
        println!("  {}", issue);
    }
}

fn print_ingest_report(report: &importers::IngestReport) {
    println!("\n{} Import complete!", "✓".green().bold());
    println!("  Collection: {}", report.collection);
    println!("  Imported: {}", report.inserted.to_string().green());
    if report.skipped_existing > 0 {
        println!(
            "  Skipped (already stored): {}",
            report.skipped_existing.to_string().yellow()
        );
    }
    if !report.issues.is_empty() {
        println!(
            "  Rejected rows: {}",
            report.issues.len().to_string().red()
        );
        for issue in &report.issues {
            eprintln!("    {}", issue);
        }
    }
}

/// Handle `import flows`
async fn handle_import_flows(
    db_path: Option<PathBuf>,
    file: &str,
    collection: &str,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    use tabled::{settings::Style, Table, Tabled};

    let collection = collection.parse::<FlowCollection>().map_err(|_| {
        let known: Vec<&str> = FlowCollection::ALL.iter().map(|c| c.as_str()).collect();
        anyhow!(
            "unknown collection '{}'; expected one of: {}",
            collection,
            known.join(", ")
        )
    })?;

    info!("Importing {} from: {}", collection.display_name(), file);

    if dry_run {
        // Parse and derive without touching the database
        if matches!(collection, FlowCollection::CashProvisional) {
            let parsed = importers::parse_cash_provisional_csv(file)?;
            println!(
                "\n{} Parsed {} daily row(s)\n",
                "✓".green().bold(),
                parsed.records.len()
            );

            #[derive(Tabled)]
            struct FlowPreview {
                #[tabled(rename = "Date")]
                date: String,
                #[tabled(rename = "FII Net")]
                fii_net: String,
                #[tabled(rename = "DII Net")]
                dii_net: String,
                #[tabled(rename = "Fiscal Year")]
                fiscal_year: String,
                #[tabled(rename = "Quarter")]
                quarter: String,
            }

            let preview: Vec<FlowPreview> = parsed
                .records
                .iter()
                .take(10)
                .map(|r| FlowPreview {
                    date: r.date.format("%d/%m/%Y").to_string(),
                    fii_net: utils::format_crore(r.fii_net),
                    dii_net: utils::format_crore(r.dii_net),
                    fiscal_year: r.fiscal_year.clone(),
                    quarter: r.quarter.clone(),
                })
                .collect();
            let table = Table::new(preview).with(Style::rounded()).to_string();
            println!("{}", table);
            if parsed.records.len() > 10 {
                println!("\n... and {} more row(s)", parsed.records.len() - 10);
            }
            print_issues(&parsed.issues);
        } else {
            let parsed = importers::parse_segment_csv(file, collection)?;
            println!(
                "\n{} Parsed {} flow record(s)\n",
                "✓".green().bold(),
                parsed.records.len()
            );

            #[derive(Tabled)]
            struct SegmentPreview {
                #[tabled(rename = "Date")]
                date: String,
                #[tabled(rename = "Asset")]
                asset: String,
                #[tabled(rename = "Purchase")]
                purchase: String,
                #[tabled(rename = "Sales")]
                sales: String,
                #[tabled(rename = "Net")]
                net: String,
            }

            let preview: Vec<SegmentPreview> = parsed
                .records
                .iter()
                .take(10)
                .map(|r| SegmentPreview {
                    date: r.date.format("%d/%m/%Y").to_string(),
                    asset: r.asset_class.label().to_string(),
                    purchase: utils::format_crore(r.gross_purchase),
                    sales: utils::format_crore(r.gross_sales),
                    net: utils::format_crore(r.net),
                })
                .collect();
            let table = Table::new(preview).with(Style::rounded()).to_string();
            println!("{}", table);
            if parsed.records.len() > 10 {
                println!("\n... and {} more record(s)", parsed.records.len() - 10);
            }
            print_issues(&parsed.issues);
        }

        println!("\n{} Dry run - no changes saved", "ℹ".blue().bold());
        return Ok(());
    }

    let mut conn = open_connection(db_path)?;
    let report = importers::ingest_flow_file(&mut conn, collection, file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    print_ingest_report(&report);
    Ok(())
}

/// Handle `import deals`
async fn handle_import_deals(
    db_path: Option<PathBuf>,
    file: &str,
    kind: &str,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    use tabled::{settings::Style, Table, Tabled};

    let kind = kind
        .parse::<DealKind>()
        .map_err(|_| anyhow!("unknown deal kind '{}'", kind))?;

    info!("Importing {} deals from: {}", kind.as_str(), file);

    if dry_run {
        let parsed = importers::parse_deals_csv(file, kind)?;
        println!(
            "\n{} Parsed {} deal(s)\n",
            "✓".green().bold(),
            parsed.records.len()
        );

        #[derive(Tabled)]
        struct DealPreview {
            #[tabled(rename = "Date")]
            date: String,
            #[tabled(rename = "Symbol")]
            symbol: String,
            #[tabled(rename = "Client")]
            client: String,
            #[tabled(rename = "Side")]
            side: String,
            #[tabled(rename = "Quantity")]
            quantity: String,
            #[tabled(rename = "Price")]
            price: String,
            #[tabled(rename = "Value")]
            value: String,
        }

        let preview: Vec<DealPreview> = parsed
            .records
            .iter()
            .take(10)
            .map(|deal| DealPreview {
                date: deal.date.format("%d/%m/%Y").to_string(),
                symbol: deal.symbol.clone(),
                client: deal.client_name.clone(),
                side: deal.side.map(|s| s.as_str().to_string()).unwrap_or_else(|| "-".to_string()),
                quantity: deal.quantity.to_string(),
                price: deal.price.to_string(),
                value: utils::format_inr(deal.value),
            })
            .collect();
        let table = Table::new(preview).with(Style::rounded()).to_string();
        println!("{}", table);
        if parsed.records.len() > 10 {
            println!("\n... and {} more deal(s)", parsed.records.len() - 10);
        }
        if parsed.duplicates_collapsed > 0 {
            println!(
                "\n{} {} exact duplicate row(s) collapsed",
                "ℹ".blue().bold(),
                parsed.duplicates_collapsed
            );
        }
        print_issues(&parsed.issues);

        println!("\n{} Dry run - no changes saved", "ℹ".blue().bold());
        return Ok(());
    }

    let mut conn = open_connection(db_path)?;
    let report = importers::ingest_deals_file(&mut conn, kind, file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    print_ingest_report(&report);
    Ok(())
}

/// Handle `import city-aum`
async fn handle_import_city_aum(
    db_path: Option<PathBuf>,
    file: &str,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    use tabled::{settings::Style, Table, Tabled};

    info!("Importing city-AUM workbook from: {}", file);

    if dry_run {
        let parsed = importers::parse_city_aum_workbook(file)?;
        println!(
            "\n{} Parsed {} quarter(s)\n",
            "✓".green().bold(),
            parsed.quarters.len()
        );

        #[derive(Tabled)]
        struct QuarterPreview {
            #[tabled(rename = "Quarter")]
            quarter: String,
            #[tabled(rename = "As Of")]
            as_of: String,
            #[tabled(rename = "Cities")]
            cities: String,
            #[tabled(rename = "Computed %")]
            computed: String,
            #[tabled(rename = "Stated %")]
            stated: String,
        }

        let preview: Vec<QuarterPreview> = parsed
            .quarters
            .iter()
            .map(|quarter| QuarterPreview {
                quarter: quarter.quarter_key.clone(),
                as_of: quarter.as_of_date.format("%d/%m/%Y").to_string(),
                cities: quarter.cities.len().to_string(),
                computed: format!("{:.2}", quarter.computed_total()),
                stated: format!("{:.2}", quarter.stated_total_pct),
            })
            .collect();
        let table = Table::new(preview).with(Style::rounded()).to_string();
        println!("{}", table);

        for warning in &parsed.warnings {
            println!("  {} {}", "⚠".yellow().bold(), warning);
        }
        for error in &parsed.errors {
            println!("  {} {}", "✗".red().bold(), error);
        }

        println!("\n{} Dry run - no changes saved", "ℹ".blue().bold());
        return Ok(());
    }

    let mut conn = open_connection(db_path)?;
    let report = importers::ingest_city_workbook(&mut conn, file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n{} Workbook import complete!", "✓".green().bold());
    println!(
        "  Quarters: {}",
        report.quarters_imported.to_string().green()
    );
    println!("  City rows: {}", report.cities_imported);
    for warning in &report.warnings {
        println!("  {} {}", "⚠".yellow().bold(), warning);
    }
    for error in &report.errors {
        println!("  {} {}", "✗".red().bold(), error);
    }
    Ok(())
}

/// Handle `report summary`
fn handle_report_summary(
    db_path: Option<PathBuf>,
    period: Option<String>,
    investor: Option<String>,
    segment: Option<String>,
    json: bool,
) -> Result<()> {
    let range = resolve_period(period.as_deref());
    let investor = match investor {
        Some(value) => Some(
            value
                .parse::<InvestorType>()
                .map_err(|_| anyhow!("unknown investor type '{}'", value))?,
        ),
        None => None,
    };
    let segment = match segment {
        Some(value) => Some(
            value
                .parse::<Segment>()
                .map_err(|_| anyhow!("unknown segment '{}'", value))?,
        ),
        None => None,
    };

    let conn = open_connection(db_path)?;
    let summary = reports::calculate_flow_summary(&conn, &range)?;
    let records = db::cash_provisional_range(&conn, range.start, range.end)?;
    let months = reports::monthly_flows(&records);
    let segments = reports::calculate_segment_breakdown(&conn, &range, investor, segment)?;

    if json {
        let payload = serde_json::json!({
            "summary": summary,
            "monthly": months,
            "segments": segments,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("{}", formatters::format_flow_summary(&summary));
    if months.len() > 1 {
        println!("{}", formatters::format_monthly_flows(&months));
    }
    println!("{}", formatters::format_segment_breakdown(&segments));
    Ok(())
}

/// Handle `report trend`
async fn handle_report_trend(
    db_path: Option<PathBuf>,
    years: &[String],
    json: bool,
) -> Result<()> {
    db::init_database(db_path.clone())?;
    let report = reports::fiscal_year_trend(db_path, years).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("{}", formatters::format_trend_report(&report));
    Ok(())
}

/// Handle `report deals`
fn handle_report_deals(
    db_path: Option<PathBuf>,
    period: Option<String>,
    dimension: &str,
    kind: Option<String>,
    symbol: Option<String>,
    client: Option<String>,
    json: bool,
) -> Result<()> {
    let range = resolve_period(period.as_deref());
    let conn = open_connection(db_path)?;

    if let Some(symbol) = symbol {
        match reports::calculate_stock_detail(&conn, &range, &symbol)? {
            Some(detail) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&detail)?);
                } else {
                    println!("{}", formatters::format_stock_detail(&detail));
                }
            }
            None => println!(
                "\n  No deals for {} in {}.\n",
                symbol.to_uppercase(),
                range.label
            ),
        }
        return Ok(());
    }

    if let Some(client) = client {
        match reports::calculate_investor_profile(&conn, &range, &client)? {
            Some(profile) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&profile)?);
                } else {
                    println!("{}", formatters::format_investor_profile(&profile));
                }
            }
            None => println!("\n  No deals for '{}' in {}.\n", client, range.label),
        }
        return Ok(());
    }

    let kind = parse_deal_kind(kind)?;
    let dimension = dimension
        .parse::<DealDimension>()
        .map_err(|_| anyhow!("unknown dimension '{}'", dimension))?;
    let report = reports::calculate_deals_report(&conn, &range, kind, dimension)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("{}", formatters::format_deals_report(&report));
    Ok(())
}

/// Handle `report repeats`
fn handle_report_repeats(
    db_path: Option<PathBuf>,
    period: Option<String>,
    by: &str,
    kind: Option<String>,
    json: bool,
) -> Result<()> {
    let range = resolve_period(period.as_deref());
    let by = by
        .parse::<RepeatBy>()
        .map_err(|_| anyhow!("unknown grouping '{}'", by))?;
    let kind = parse_deal_kind(kind)?;

    let conn = open_connection(db_path)?;
    let entries = reports::calculate_repeat_activity(&conn, &range, kind, by)?;

    if json {
        let payload = serde_json::json!({
            "period": range.label,
            "repeats": entries,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let by_label = match by {
        RepeatBy::Client => "client",
        RepeatBy::Symbol => "symbol",
    };
    println!("{}", formatters::format_repeats(&entries, by_label));
    Ok(())
}

/// Handle `report city-aum`
fn handle_report_city_aum(
    db_path: Option<PathBuf>,
    quarter: Option<String>,
    compare: bool,
    json: bool,
) -> Result<()> {
    let conn = open_connection(db_path)?;

    if compare {
        match reports::compare_latest_quarters(&conn)? {
            Some(comparison) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&comparison)?);
                } else {
                    println!("{}", formatters::format_quarter_comparison(&comparison));
                }
            }
            None => println!("\n  Need at least two stored quarters to compare.\n"),
        }
        return Ok(());
    }

    if let Some(value) = quarter {
        let key = fiscal::normalize_quarter_key(&value).ok_or_else(|| {
            anyhow!(
                "unrecognized quarter '{}'; expected a form like Q1-FY24-25",
                value
            )
        })?;

        match db::get_quarter_aum(&conn, &key)? {
            Some(quarter) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&quarter)?);
                } else {
                    println!("{}", formatters::format_quarter_detail(&quarter));
                }
            }
            None => {
                let stored = reports::list_quarter_summaries(&conn)?;
                if stored.is_empty() {
                    println!("\n  No city-AUM quarters stored yet.\n");
                } else {
                    let keys: Vec<String> =
                        stored.iter().map(|s| s.quarter_key.clone()).collect();
                    println!(
                        "\n  {} is not stored. Available: {}\n",
                        key,
                        keys.join(", ")
                    );
                }
            }
        }
        return Ok(());
    }

    let summaries = reports::list_quarter_summaries(&conn)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }
    println!("{}", formatters::format_quarter_list(&summaries));
    Ok(())
}

/// Handle `uploads list`
fn handle_uploads_list(db_path: Option<PathBuf>, limit: usize, json: bool) -> Result<()> {
    let conn = open_connection(db_path)?;
    let uploads = db::list_uploads(&conn, limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&uploads)?);
        return Ok(());
    }
    println!("{}", formatters::format_uploads(&uploads));
    Ok(())
}

/// Handle `periods`
fn handle_periods(json: bool) -> Result<()> {
    let current = fiscal::current_fiscal_year();
    let years = fiscal::fiscal_year_options(3);
    let quarters = fiscal::quarter_options(8);
    let months = fiscal::month_options(12);

    if json {
        let payload = serde_json::json!({
            "current_fiscal_year": current,
            "years": years,
            "quarters": quarters,
            "months": months,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    println!(
        "{}",
        formatters::format_periods(&current, &years, &quarters, &months)
    );
    Ok(())
}

/// Handle `template flows`: one sample CSV per collection
fn handle_template_flows(out: &Path) -> Result<()> {
    // Net columns are recomputed on import; the samples are consistent anyway
    const SAMPLE_ROWS: &str = "\
2024-04-01,12500.50,11000.25,1500.25,8000.00,7500.00,500.00
2024-04-02,9000.00,9500.00,-500.00,6000.00,5800.00,200.00
";

    std::fs::create_dir_all(out)?;
    for collection in FlowCollection::ALL {
        let path = out.join(format!(
            "{}_template.csv",
            collection.as_str().replace('-', "_")
        ));
        let mut content = collection.expected_headers().join(",");
        content.push('\n');
        content.push_str(SAMPLE_ROWS);
        std::fs::write(&path, content)?;
        println!("{} {}", "✓".green().bold(), path.display());
    }

    println!("\nFill in one row per trading day; amounts are ₹ crore.");
    Ok(())
}

/// Handle `template deals`: sample bulk and block CSVs
fn handle_template_deals(out: &Path) -> Result<()> {
    std::fs::create_dir_all(out)?;

    let bulk = out.join("bulk_deals_template.csv");
    std::fs::write(
        &bulk,
        "\
Date,Symbol,Security Name,Client Name,Buy/Sell,Quantity Traded,Trade Price / Wght. Avg. Price
04/01/2024,RELIANCE,Reliance Industries,GRAVITON RESEARCH CAPITAL LLP,BUY,150000,2450.50
04/01/2024,TCS,Tata Consultancy Services,MORGAN STANLEY ASIA,SELL,80000,3890.00
",
    )?;
    println!("{} {}", "✓".green().bold(), bulk.display());

    let block = out.join("block_deals_template.csv");
    std::fs::write(
        &block,
        "\
Date,Symbol,Security Name,Client Name,Quantity Traded,Trade Price / Wght. Avg. Price
04/02/2024,INFY,Infosys,SOVEREIGN WEALTH PARTNERS,1200000,1505.25
",
    )?;
    println!("{} {}", "✓".green().bold(), block.display());

    println!("\nDates are MM/DD/YYYY as in exchange exports; block files need no Buy/Sell column.");
    Ok(())
}

/// Handle `template city-aum`: sample workbook with one quarter worksheet
fn handle_template_city_aum(out: &Path) -> Result<()> {
    use rust_xlsxwriter::Workbook;

    std::fs::create_dir_all(out)?;
    let path = out.join("city_aum_template.xlsx");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Q1 FY2024-25")?;

    worksheet.write_string(0, 0, "City-wise AUM allocation as of 2024-06-30")?;
    worksheet.write_string(1, 0, "City")?;
    worksheet.write_string(1, 1, "AUM %")?;

    // Shares sum to the stated total so the sample reconciles cleanly
    let cities: [(&str, f64); 6] = [
        ("Mumbai", 41.52),
        ("Delhi", 11.33),
        ("Bengaluru", 7.85),
        ("Kolkata", 5.04),
        ("Chennai", 4.26),
        ("Pune", 3.91),
    ];
    let mut row: u32 = 2;
    for (city, pct) in cities {
        worksheet.write_string(row, 0, city)?;
        worksheet.write_number(row, 1, pct)?;
        row += 1;
    }

    worksheet.write_string(row, 0, "Other Cities")?;
    worksheet.write_number(row, 1, 18.59)?;
    worksheet.write_string(row + 1, 0, "NRIs & Overseas")?;
    worksheet.write_number(row + 1, 1, 7.50)?;
    worksheet.write_string(row + 2, 0, "Total")?;
    worksheet.write_number(row + 2, 1, 100.0)?;

    workbook.save(&path)?;
    println!("{} {}", "✓".green().bold(), path.display());

    println!("\nAdd one worksheet per quarter, named like 'Q1 FY2024-25' or 'Q2 2024-25'.");
    Ok(())
}
