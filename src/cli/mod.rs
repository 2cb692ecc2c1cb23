use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "instiflow")]
#[command(
    version,
    about = "Indian market FII/DII flow tracker with deal analytics"
)]
#[command(
    long_about = "Track institutional (FII/DII) flows across cash and derivative segments, bulk/block deal disclosures, and city-level AUM distribution, with reporting aligned to the Indian April-March fiscal calendar."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Database file (defaults to ~/.instiflow/data.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import flow CSVs, deal disclosures, or city-AUM workbooks
    Import {
        #[command(subcommand)]
        action: ImportCommands,
    },

    /// Flow, deal and geography reports
    Report {
        #[command(subcommand)]
        action: ReportCommands,
    },

    /// Upload audit history
    Uploads {
        #[command(subcommand)]
        action: UploadsCommands,
    },

    /// List selectable reporting periods
    Periods,

    /// Write sample import files with the expected schemas
    Template {
        #[command(subcommand)]
        action: TemplateCommands,
    },
}

#[derive(Subcommand)]
pub enum ImportCommands {
    /// Import one daily-flow CSV into a collection
    Flows {
        /// Path to the CSV file
        file: String,

        /// Target collection (e.g. cash-provisional, fii-cash, dii-fo-indices)
        #[arg(short, long)]
        collection: String,

        /// Preview only, don't save to database
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Import one bulk/block deal disclosure CSV
    Deals {
        /// Path to the CSV file
        file: String,

        /// Deal kind
        #[arg(short, long, value_parser = ["bulk", "block"])]
        kind: String,

        /// Preview only, don't save to database
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Import a quarterly city-AUM workbook (one worksheet per quarter)
    CityAum {
        /// Path to the Excel workbook
        file: String,

        /// Preview only, don't save to database
        #[arg(short, long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Flow KPIs for a period, with monthly and segment breakdowns
    Summary {
        /// Period: today, YYYY-MM, Qn-FYyy-yy, FYyy-yy, all, or Nd (e.g. 30d)
        #[arg(short, long)]
        period: Option<String>,

        /// Restrict the segment breakdown to one investor type
        #[arg(long, value_parser = ["fii", "dii"])]
        investor: Option<String>,

        /// Restrict the segment breakdown to one segment
        #[arg(long, value_parser = ["cash", "fo-indices", "fo-stocks"])]
        segment: Option<String>,
    },

    /// Month-indexed trend across up to three fiscal years
    Trend {
        /// Fiscal years to compare, e.g. FY24-25,FY23-24
        #[arg(short, long, value_delimiter = ',', required = true)]
        years: Vec<String>,
    },

    /// Deal KPIs with a sector/stock/investor breakdown
    Deals {
        /// Period: today, YYYY-MM, Qn-FYyy-yy, FYyy-yy, all, or Nd
        #[arg(short, long)]
        period: Option<String>,

        /// Breakdown dimension
        #[arg(short = 'D', long, default_value = "sector", value_parser = ["sector", "stock", "investor"])]
        dimension: String,

        /// Restrict to one deal kind
        #[arg(short, long, value_parser = ["bulk", "block"], conflicts_with_all = ["symbol", "client"])]
        kind: Option<String>,

        /// Show one stock in detail instead of the breakdown
        #[arg(long, conflicts_with = "client")]
        symbol: Option<String>,

        /// Show one client in detail instead of the breakdown
        #[arg(long)]
        client: Option<String>,
    },

    /// Clients or stocks appearing in more than one deal
    Repeats {
        /// Period: today, YYYY-MM, Qn-FYyy-yy, FYyy-yy, all, or Nd
        #[arg(short, long)]
        period: Option<String>,

        /// Group repeats by client or symbol
        #[arg(long, default_value = "client", value_parser = ["client", "symbol"])]
        by: String,

        /// Restrict to one deal kind
        #[arg(short, long, value_parser = ["bulk", "block"])]
        kind: Option<String>,
    },

    /// Quarterly city-AUM snapshots
    CityAum {
        /// Quarter key, e.g. Q1-FY24-25 (omit to list stored quarters)
        #[arg(short, long)]
        quarter: Option<String>,

        /// Compare the two most recent quarters city by city
        #[arg(long, conflicts_with = "quarter")]
        compare: bool,
    },
}

#[derive(Subcommand)]
pub enum UploadsCommands {
    /// List processed uploads, newest first
    List {
        /// Maximum rows to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// Sample daily-flow CSVs, one per collection
    Flows {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Sample bulk and block deal CSVs
    Deals {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Sample city-AUM workbook
    CityAum {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}
