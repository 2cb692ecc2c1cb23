use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use crate::db::{self, DealKind, DealRecord, DealSide};
use crate::fiscal::DateRange;
use crate::refdata::{self, InvestorClass};

/// Dimension a deal breakdown groups by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DealDimension {
    Sector,
    Stock,
    Investor,
}

impl DealDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealDimension::Sector => "sector",
            DealDimension::Stock => "stock",
            DealDimension::Investor => "investor",
        }
    }
}

impl FromStr for DealDimension {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sector" => Ok(DealDimension::Sector),
            "stock" | "symbol" => Ok(DealDimension::Stock),
            "investor" | "client" => Ok(DealDimension::Investor),
            _ => Err(()),
        }
    }
}

/// Which entity repeat detection groups by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RepeatBy {
    Client,
    Symbol,
}

impl FromStr for RepeatBy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" | "investor" => Ok(RepeatBy::Client),
            "symbol" | "stock" => Ok(RepeatBy::Symbol),
            _ => Err(()),
        }
    }
}

/// One group of the deal breakdown. `net_value` is signed (purchases minus
/// sales); `gross_value` counts every deal including direction-neutral
/// block deals.
#[derive(Debug, Clone, Serialize)]
pub struct DealBreakdownEntry {
    pub name: String,
    pub buy_value: Decimal,
    pub sell_value: Decimal,
    pub gross_value: Decimal,
    pub net_value: Decimal,
    pub deal_count: usize,
    /// Share of the window's gross traded value
    pub share_pct: Decimal,
}

/// Entity with the most deals in the window
#[derive(Debug, Clone, Serialize)]
pub struct MostActive {
    pub name: String,
    pub deal_count: usize,
    pub total_value: Decimal,
}

/// Deal-window KPIs plus a dimensional breakdown
#[derive(Debug, Clone, Serialize)]
pub struct DealsReport {
    pub period_label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub kind: Option<DealKind>,
    pub dimension: DealDimension,
    pub total_buying: Decimal,
    pub total_selling: Decimal,
    pub net_flow: Decimal,
    pub total_deals: usize,
    pub buy_deals: usize,
    pub sell_deals: usize,
    /// Block deals are disclosed without a direction
    pub neutral_deals: usize,
    pub most_active_stock: Option<MostActive>,
    pub most_active_client: Option<MostActive>,
    pub breakdown: Vec<DealBreakdownEntry>,
}

/// A client or symbol that showed up in more than one deal
#[derive(Debug, Clone, Serialize)]
pub struct RepeatEntry {
    pub entity: String,
    pub occurrences: usize,
    pub total_value: Decimal,
    /// Distinct symbols for a client, distinct clients for a symbol
    pub counterparties: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

/// Window aggregate for a single stock
#[derive(Debug, Clone, Serialize)]
pub struct StockDetail {
    pub symbol: String,
    pub security_name: Option<String>,
    pub sector: String,
    pub buy_value: Decimal,
    pub sell_value: Decimal,
    pub net_value: Decimal,
    pub deal_count: usize,
    pub buy_deals: usize,
    pub sell_deals: usize,
    pub avg_buy_price: Decimal,
    pub avg_sell_price: Decimal,
    /// Up to five, ranked by value traded
    pub top_buyers: Vec<String>,
    pub top_sellers: Vec<String>,
}

/// Window aggregate for a single client
#[derive(Debug, Clone, Serialize)]
pub struct InvestorProfile {
    pub client_name: String,
    pub investor_class: InvestorClass,
    pub total_value: Decimal,
    pub buy_value: Decimal,
    pub sell_value: Decimal,
    pub net_value: Decimal,
    pub deal_count: usize,
    pub buy_deals: usize,
    pub sell_deals: usize,
    pub stocks_traded: usize,
    pub avg_deal_size: Decimal,
    /// Up to three sectors, ranked by value traded
    pub preferred_sectors: Vec<String>,
}

fn load_deals(
    conn: &Connection,
    range: &DateRange,
    kind: Option<DealKind>,
) -> Result<Vec<DealRecord>> {
    let deals = match kind {
        Some(DealKind::Bulk) => db::bulk_deals_range(conn, range.start, range.end)?,
        Some(DealKind::Block) => db::block_deals_range(conn, range.start, range.end)?,
        None => {
            let mut all = db::bulk_deals_range(conn, range.start, range.end)?;
            all.extend(db::block_deals_range(conn, range.start, range.end)?);
            all.sort_by_key(|d| d.date);
            all
        }
    };
    Ok(deals)
}

fn dimension_key(deal: &DealRecord, dimension: DealDimension) -> String {
    match dimension {
        DealDimension::Sector => refdata::sector_for_symbol(&deal.symbol).to_string(),
        DealDimension::Stock => deal.symbol.clone(),
        DealDimension::Investor => refdata::classify_investor(&deal.client_name)
            .as_str()
            .to_string(),
    }
}

/// KPIs and a grouped breakdown for the deals in a resolved window
pub fn calculate_deals_report(
    conn: &Connection,
    range: &DateRange,
    kind: Option<DealKind>,
    dimension: DealDimension,
) -> Result<DealsReport> {
    let deals = load_deals(conn, range, kind)?;

    let mut total_buying = Decimal::ZERO;
    let mut total_selling = Decimal::ZERO;
    let mut buy_deals = 0;
    let mut sell_deals = 0;
    let mut neutral_deals = 0;
    for deal in &deals {
        match deal.side {
            Some(DealSide::Buy) => {
                total_buying += deal.value;
                buy_deals += 1;
            }
            Some(DealSide::Sell) => {
                total_selling += deal.value;
                sell_deals += 1;
            }
            None => neutral_deals += 1,
        }
    }

    Ok(DealsReport {
        period_label: range.label.clone(),
        start: range.start,
        end: range.end,
        kind,
        dimension,
        total_buying,
        total_selling,
        net_flow: total_buying - total_selling,
        total_deals: deals.len(),
        buy_deals,
        sell_deals,
        neutral_deals,
        most_active_stock: most_active(&deals, |d| d.symbol.clone()),
        most_active_client: most_active(&deals, |d| d.client_name.clone()),
        breakdown: breakdown_deals(&deals, dimension),
    })
}

fn most_active(
    deals: &[DealRecord],
    key: impl Fn(&DealRecord) -> String,
) -> Option<MostActive> {
    let mut counts: HashMap<String, (usize, Decimal)> = HashMap::new();
    for deal in deals {
        let entry = counts.entry(key(deal)).or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += deal.value;
    }

    counts
        .into_iter()
        .map(|(name, (deal_count, total_value))| MostActive {
            name,
            deal_count,
            total_value,
        })
        .max_by(|a, b| {
            a.deal_count
                .cmp(&b.deal_count)
                .then_with(|| a.total_value.cmp(&b.total_value))
                .then_with(|| b.name.cmp(&a.name))
        })
}

/// Group deals by the dimension key and rank by absolute net value, so a
/// heavily sold sector surfaces next to a heavily bought one instead of
/// sinking to the bottom of the list.
pub fn breakdown_deals(deals: &[DealRecord], dimension: DealDimension) -> Vec<DealBreakdownEntry> {
    let mut groups: HashMap<String, (Decimal, Decimal, Decimal, usize)> = HashMap::new();
    for deal in deals {
        let entry = groups
            .entry(dimension_key(deal, dimension))
            .or_insert((Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, 0));
        match deal.side {
            Some(DealSide::Buy) => entry.0 += deal.value,
            Some(DealSide::Sell) => entry.1 += deal.value,
            None => {}
        }
        entry.2 += deal.value;
        entry.3 += 1;
    }

    let total_gross: Decimal = groups.values().map(|(_, _, gross, _)| *gross).sum();
    let mut entries: Vec<DealBreakdownEntry> = groups
        .into_iter()
        .map(|(name, (buy, sell, gross, count))| DealBreakdownEntry {
            name,
            buy_value: buy,
            sell_value: sell,
            gross_value: gross,
            net_value: buy - sell,
            deal_count: count,
            share_pct: if total_gross > Decimal::ZERO {
                gross / total_gross * Decimal::from(100)
            } else {
                Decimal::ZERO
            },
        })
        .collect();
    entries.sort_by(|a, b| {
        b.net_value
            .abs()
            .cmp(&a.net_value.abs())
            .then_with(|| b.gross_value.cmp(&a.gross_value))
            .then_with(|| a.name.cmp(&b.name))
    });
    entries
}

/// Clients or symbols appearing in more than one deal inside the window
pub fn calculate_repeat_activity(
    conn: &Connection,
    range: &DateRange,
    kind: Option<DealKind>,
    by: RepeatBy,
) -> Result<Vec<RepeatEntry>> {
    let deals = load_deals(conn, range, kind)?;
    Ok(detect_repeat_activity(&deals, by))
}

pub fn detect_repeat_activity(deals: &[DealRecord], by: RepeatBy) -> Vec<RepeatEntry> {
    struct Acc {
        occurrences: usize,
        total_value: Decimal,
        counterparties: HashSet<String>,
        first_date: NaiveDate,
        last_date: NaiveDate,
    }

    let mut groups: HashMap<String, Acc> = HashMap::new();
    for deal in deals {
        let (entity, counterpart) = match by {
            RepeatBy::Client => (deal.client_name.clone(), deal.symbol.clone()),
            RepeatBy::Symbol => (deal.symbol.clone(), deal.client_name.clone()),
        };
        let acc = groups.entry(entity).or_insert_with(|| Acc {
            occurrences: 0,
            total_value: Decimal::ZERO,
            counterparties: HashSet::new(),
            first_date: deal.date,
            last_date: deal.date,
        });
        acc.occurrences += 1;
        acc.total_value += deal.value;
        acc.counterparties.insert(counterpart);
        if deal.date < acc.first_date {
            acc.first_date = deal.date;
        }
        if deal.date > acc.last_date {
            acc.last_date = deal.date;
        }
    }

    let mut entries: Vec<RepeatEntry> = groups
        .into_iter()
        .filter(|(_, acc)| acc.occurrences > 1)
        .map(|(entity, acc)| RepeatEntry {
            entity,
            occurrences: acc.occurrences,
            total_value: acc.total_value,
            counterparties: acc.counterparties.len(),
            first_date: acc.first_date,
            last_date: acc.last_date,
        })
        .collect();
    entries.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then_with(|| b.total_value.cmp(&a.total_value))
            .then_with(|| a.entity.cmp(&b.entity))
    });
    entries
}

/// Everything the window says about one symbol, or `None` if it never traded
pub fn calculate_stock_detail(
    conn: &Connection,
    range: &DateRange,
    symbol: &str,
) -> Result<Option<StockDetail>> {
    let deals = load_deals(conn, range, None)?;
    Ok(stock_detail(&deals, symbol))
}

fn stock_detail(deals: &[DealRecord], symbol: &str) -> Option<StockDetail> {
    let wanted = symbol.trim();
    let matching: Vec<&DealRecord> = deals
        .iter()
        .filter(|d| d.symbol.eq_ignore_ascii_case(wanted))
        .collect();
    if matching.is_empty() {
        return None;
    }

    let mut buy_value = Decimal::ZERO;
    let mut sell_value = Decimal::ZERO;
    let mut buy_deals = 0;
    let mut sell_deals = 0;
    let mut buy_price_sum = Decimal::ZERO;
    let mut sell_price_sum = Decimal::ZERO;
    let mut buyers: HashMap<String, Decimal> = HashMap::new();
    let mut sellers: HashMap<String, Decimal> = HashMap::new();
    let mut security_name = None;

    for deal in &matching {
        if security_name.is_none() {
            security_name = deal.security_name.clone();
        }
        match deal.side {
            Some(DealSide::Buy) => {
                buy_value += deal.value;
                buy_deals += 1;
                buy_price_sum += deal.price;
                *buyers.entry(deal.client_name.clone()).or_default() += deal.value;
            }
            Some(DealSide::Sell) => {
                sell_value += deal.value;
                sell_deals += 1;
                sell_price_sum += deal.price;
                *sellers.entry(deal.client_name.clone()).or_default() += deal.value;
            }
            None => {}
        }
    }

    let top_five = |map: HashMap<String, Decimal>| -> Vec<String> {
        let mut pairs: Vec<(String, Decimal)> = map.into_iter().collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pairs.into_iter().take(5).map(|(name, _)| name).collect()
    };

    Some(StockDetail {
        symbol: matching[0].symbol.clone(),
        security_name,
        sector: refdata::sector_for_symbol(wanted).to_string(),
        buy_value,
        sell_value,
        net_value: buy_value - sell_value,
        deal_count: matching.len(),
        buy_deals,
        sell_deals,
        avg_buy_price: if buy_deals > 0 {
            buy_price_sum / Decimal::from(buy_deals)
        } else {
            Decimal::ZERO
        },
        avg_sell_price: if sell_deals > 0 {
            sell_price_sum / Decimal::from(sell_deals)
        } else {
            Decimal::ZERO
        },
        top_buyers: top_five(buyers),
        top_sellers: top_five(sellers),
    })
}

/// Everything the window says about one client, or `None` if they never
/// traded. Lookup is case-insensitive.
pub fn calculate_investor_profile(
    conn: &Connection,
    range: &DateRange,
    client: &str,
) -> Result<Option<InvestorProfile>> {
    let deals = load_deals(conn, range, None)?;
    Ok(investor_profile(&deals, client))
}

fn investor_profile(deals: &[DealRecord], client: &str) -> Option<InvestorProfile> {
    let wanted = client.trim();
    let matching: Vec<&DealRecord> = deals
        .iter()
        .filter(|d| d.client_name.eq_ignore_ascii_case(wanted))
        .collect();
    if matching.is_empty() {
        return None;
    }

    let mut total_value = Decimal::ZERO;
    let mut buy_value = Decimal::ZERO;
    let mut sell_value = Decimal::ZERO;
    let mut buy_deals = 0;
    let mut sell_deals = 0;
    let mut stocks: HashSet<String> = HashSet::new();
    let mut sectors: HashMap<&'static str, Decimal> = HashMap::new();

    for deal in &matching {
        total_value += deal.value;
        stocks.insert(deal.symbol.clone());
        *sectors
            .entry(refdata::sector_for_symbol(&deal.symbol))
            .or_default() += deal.value;
        match deal.side {
            Some(DealSide::Buy) => {
                buy_value += deal.value;
                buy_deals += 1;
            }
            Some(DealSide::Sell) => {
                sell_value += deal.value;
                sell_deals += 1;
            }
            None => {}
        }
    }

    let mut sector_pairs: Vec<(&'static str, Decimal)> = sectors.into_iter().collect();
    sector_pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let deal_count = matching.len();
    Some(InvestorProfile {
        client_name: matching[0].client_name.clone(),
        investor_class: refdata::classify_investor(wanted),
        total_value,
        buy_value,
        sell_value,
        net_value: buy_value - sell_value,
        deal_count,
        buy_deals,
        sell_deals,
        stocks_traded: stocks.len(),
        avg_deal_size: if deal_count > 0 {
            total_value / Decimal::from(deal_count)
        } else {
            Decimal::ZERO
        },
        preferred_sectors: sector_pairs
            .into_iter()
            .take(3)
            .map(|(sector, _)| sector.to_string())
            .collect(),
    })
}
