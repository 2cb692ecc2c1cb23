//! CSV importer for exchange bulk/block deal disclosures
//!
//! Exchange exports vary in exact column wording ("Trade Price / Wght. Avg.
//! Price", "Quantity Traded", ...), so columns are discovered by keyword
//! rather than exact name. Dates arrive US-style `MM/DD/YYYY`.
//!
//! Bulk deals carry a BUY/SELL side and upsert on their natural key. Block
//! deals are privately negotiated crosses reported without a meaningful
//! direction, so the side column is ignored for them and the record is
//! stored direction-neutral.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use super::validation::{parse_amount, parse_deal_date, ValidationIssue};
use crate::db::models::{DealKind, DealRecord, DealSide};
use crate::error::FlowError;

const DEFAULT_EXCHANGE: &str = "NSE";

/// Result of parsing one deal upload
#[derive(Debug)]
pub struct DealParse {
    pub records: Vec<DealRecord>,
    pub issues: Vec<ValidationIssue>,
    /// Exact in-file duplicates collapsed away (first occurrence kept)
    pub duplicates_collapsed: usize,
}

#[derive(Debug)]
struct DealColumns {
    date: usize,
    symbol: usize,
    security_name: Option<usize>,
    client: usize,
    side: Option<usize>,
    quantity: usize,
    price: usize,
    exchange: Option<usize>,
}

impl DealColumns {
    /// Discover columns by keyword, case-insensitive
    fn discover(headers: &csv::StringRecord, kind: DealKind) -> Result<Self, String> {
        let mut date = None;
        let mut symbol = None;
        let mut security_name = None;
        let mut client = None;
        let mut side = None;
        let mut quantity = None;
        let mut price = None;
        let mut exchange = None;

        for (idx, header) in headers.iter().enumerate() {
            let text = header.to_lowercase();

            if date.is_none() && text.contains("date") {
                date = Some(idx);
            }
            if symbol.is_none() && (text.contains("symbol") || text.contains("stock")) {
                symbol = Some(idx);
            }
            if security_name.is_none() && text.contains("security") {
                security_name = Some(idx);
            }
            if client.is_none() && text.contains("client") {
                client = Some(idx);
            }
            if side.is_none() && (text.contains("buy") || text.contains("sell")) {
                side = Some(idx);
            }
            if quantity.is_none() && (text.contains("quantity") || text.contains("qty")) {
                quantity = Some(idx);
            }
            if price.is_none() && text.contains("price") {
                price = Some(idx);
            }
            if exchange.is_none() && text.contains("exchange") {
                exchange = Some(idx);
            }
        }

        let mut missing = Vec::new();
        if date.is_none() {
            missing.push("date");
        }
        if symbol.is_none() {
            missing.push("symbol/stock");
        }
        if client.is_none() {
            missing.push("client name");
        }
        if quantity.is_none() {
            missing.push("quantity");
        }
        if price.is_none() {
            missing.push("price");
        }
        // Block deals are direction-neutral; only bulk files need the column
        if kind == DealKind::Bulk && side.is_none() {
            missing.push("buy/sell");
        }
        if !missing.is_empty() {
            return Err(format!(
                "could not locate required column(s): {}",
                missing.join(", ")
            ));
        }

        match (date, symbol, client, quantity, price) {
            (Some(date), Some(symbol), Some(client), Some(quantity), Some(price)) => Ok(Self {
                date,
                symbol,
                security_name,
                client,
                side,
                quantity,
                price,
                exchange,
            }),
            _ => Err("could not locate required columns".to_string()),
        }
    }
}

/// Parse an exchange deal disclosure file
pub fn parse_deals_csv<P: AsRef<Path>>(path: P, kind: DealKind) -> Result<DealParse> {
    let path = path.as_ref();
    info!("Parsing {} deals CSV: {:?}", kind.as_str(), path);
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    parse_deals(file, kind)
}

/// Parse deal rows from any reader
pub fn parse_deals(input: impl Read, kind: DealKind) -> Result<DealParse> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .context("failed to read CSV header row")?
        .clone();
    let columns = DealColumns::discover(&headers, kind).map_err(FlowError::Format)?;
    debug!("Deal column mapping: {:?}", columns);

    let mut records: Vec<DealRecord> = Vec::new();
    let mut issues = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicates_collapsed = 0;

    for (idx, result) in reader.records().enumerate() {
        let record = result.context("failed to read CSV record")?;
        let line = idx + 2;

        let cell = |col: usize| record.get(col).unwrap_or("").trim();

        // Summary and trailing blank rows come without date or symbol
        if cell(columns.date).is_empty() || cell(columns.symbol).is_empty() {
            debug!("Skipping row at line {} without date/symbol", line);
            continue;
        }

        let date = match parse_deal_date(cell(columns.date)) {
            Ok(date) => date,
            Err(reason) => {
                issues.push(ValidationIssue::new(
                    line,
                    "date",
                    cell(columns.date),
                    reason,
                ));
                continue;
            }
        };

        let symbol = cell(columns.symbol).to_uppercase();
        let client_name = cell(columns.client).to_string();
        if client_name.is_empty() {
            issues.push(ValidationIssue::new(
                line,
                "client name",
                "",
                "is empty".to_string(),
            ));
            continue;
        }

        let side = match kind {
            DealKind::Block => None,
            DealKind::Bulk => {
                let raw = columns.side.map(cell).unwrap_or("");
                match raw.parse::<DealSide>() {
                    Ok(side) => Some(side),
                    Err(()) => {
                        issues.push(ValidationIssue::new(
                            line,
                            "buy/sell",
                            raw,
                            "is not a recognizable BUY or SELL".to_string(),
                        ));
                        continue;
                    }
                }
            }
        };

        let quantity = match parse_amount(cell(columns.quantity)) {
            Ok(quantity) => quantity,
            Err(reason) => {
                issues.push(ValidationIssue::new(
                    line,
                    "quantity",
                    cell(columns.quantity),
                    reason,
                ));
                continue;
            }
        };
        let price = match parse_amount(cell(columns.price)) {
            Ok(price) => price,
            Err(reason) => {
                issues.push(ValidationIssue::new(
                    line,
                    "price",
                    cell(columns.price),
                    reason,
                ));
                continue;
            }
        };

        let security_name = columns
            .security_name
            .map(cell)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let exchange = columns
            .exchange
            .map(cell)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_EXCHANGE)
            .to_string();

        let deal = DealRecord {
            id: None,
            kind,
            date,
            symbol,
            security_name,
            client_name,
            side,
            quantity,
            price,
            value: quantity * price,
            exchange,
        };

        // Exchange files repeat rows across pages; first occurrence wins
        let key = format!(
            "{}|{}|{}|{}|{}|{}|{}",
            deal.date,
            deal.symbol,
            deal.client_name,
            deal.side.map(|s| s.as_str()).unwrap_or("-"),
            deal.quantity,
            deal.price,
            deal.exchange,
        );
        if !seen.insert(key) {
            duplicates_collapsed += 1;
            warn!("Collapsing duplicate deal row at line {}", line);
            continue;
        }

        records.push(deal);
    }

    info!(
        "Parsed {} {} deals, {} issue(s), {} duplicate(s) collapsed",
        records.len(),
        kind.as_str(),
        issues.len(),
        duplicates_collapsed
    );

    Ok(DealParse {
        records,
        issues,
        duplicates_collapsed,
    })
}
