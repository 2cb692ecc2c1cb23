use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::fiscal;

/// Investor category reported by the exchanges
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum InvestorType {
    Fii, // Foreign institutional investors
    Dii, // Domestic institutional investors
}

impl InvestorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestorType::Fii => "FII",
            InvestorType::Dii => "DII",
        }
    }
}

impl FromStr for InvestorType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FII" | "FPI" => Ok(InvestorType::Fii),
            "DII" => Ok(InvestorType::Dii),
            _ => Err(()),
        }
    }
}

/// Market segment a flow observation belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Segment {
    Cash,
    FoIndices,
    FoStocks,
}

impl Segment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Cash => "CASH",
            Segment::FoIndices => "FO_INDICES",
            Segment::FoStocks => "FO_STOCKS",
        }
    }

    /// Human-readable form for tables and reports
    pub fn label(&self) -> &'static str {
        match self {
            Segment::Cash => "Cash",
            Segment::FoIndices => "F&O Indices",
            Segment::FoStocks => "F&O Stocks",
        }
    }
}

impl FromStr for Segment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "CASH" => Ok(Segment::Cash),
            "FO_INDICES" | "F&O INDICES" => Ok(Segment::FoIndices),
            "FO_STOCKS" | "F&O STOCKS" => Ok(Segment::FoStocks),
            _ => Err(()),
        }
    }
}

/// Asset class within a segment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AssetClass {
    Equity,
    Debt,
    Futures,
    Options,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Equity => "EQUITY",
            AssetClass::Debt => "DEBT",
            AssetClass::Futures => "FUTURES",
            AssetClass::Options => "OPTIONS",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssetClass::Equity => "Equity",
            AssetClass::Debt => "Debt",
            AssetClass::Futures => "Futures",
            AssetClass::Options => "Options",
        }
    }
}

impl FromStr for AssetClass {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EQUITY" => Ok(AssetClass::Equity),
            "DEBT" => Ok(AssetClass::Debt),
            "FUTURES" => Ok(AssetClass::Futures),
            "OPTIONS" => Ok(AssetClass::Options),
            _ => Err(()),
        }
    }
}

/// Deal direction (block deals are reported direction-neutral)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DealSide {
    Buy,
    Sell,
}

impl DealSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealSide::Buy => "BUY",
            DealSide::Sell => "SELL",
        }
    }
}

impl FromStr for DealSide {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        if upper.contains("BUY") || upper.contains("PURCHASE") || upper == "B" {
            Ok(DealSide::Buy)
        } else if upper.contains("SELL") || upper == "S" {
            Ok(DealSide::Sell)
        } else {
            Err(())
        }
    }
}

/// Deal disclosure category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DealKind {
    Bulk,
    Block,
}

impl DealKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealKind::Bulk => "BULK",
            DealKind::Block => "BLOCK",
        }
    }
}

impl FromStr for DealKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BULK" => Ok(DealKind::Bulk),
            "BLOCK" => Ok(DealKind::Block),
            _ => Err(()),
        }
    }
}

/// How re-ingesting dates that already exist is reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Incoming rows for already-stored dates are skipped
    Additive,
    /// Incoming rows replace stored rows for the same natural key
    Replaceable,
}

/// One of the seven flow upload contracts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FlowCollection {
    CashProvisional,
    FiiCash,
    DiiCash,
    FiiFoIndices,
    DiiFoIndices,
    FiiFoStocks,
    DiiFoStocks,
}

impl FlowCollection {
    pub const ALL: [FlowCollection; 7] = [
        FlowCollection::CashProvisional,
        FlowCollection::FiiCash,
        FlowCollection::DiiCash,
        FlowCollection::FiiFoIndices,
        FlowCollection::DiiFoIndices,
        FlowCollection::FiiFoStocks,
        FlowCollection::DiiFoStocks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowCollection::CashProvisional => "cash-provisional",
            FlowCollection::FiiCash => "fii-cash",
            FlowCollection::DiiCash => "dii-cash",
            FlowCollection::FiiFoIndices => "fii-fo-indices",
            FlowCollection::DiiFoIndices => "dii-fo-indices",
            FlowCollection::FiiFoStocks => "fii-fo-stocks",
            FlowCollection::DiiFoStocks => "dii-fo-stocks",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FlowCollection::CashProvisional => "FII/DII Cash Provisional",
            FlowCollection::FiiCash => "FII Cash",
            FlowCollection::DiiCash => "DII Cash",
            FlowCollection::FiiFoIndices => "FII F&O Indices",
            FlowCollection::DiiFoIndices => "DII F&O Indices",
            FlowCollection::FiiFoStocks => "FII F&O Stocks",
            FlowCollection::DiiFoStocks => "DII F&O Stocks",
        }
    }

    /// Combined FII+DII daily file has no per-investor split
    pub fn investor_type(&self) -> Option<InvestorType> {
        match self {
            FlowCollection::CashProvisional => None,
            FlowCollection::FiiCash | FlowCollection::FiiFoIndices | FlowCollection::FiiFoStocks => {
                Some(InvestorType::Fii)
            }
            FlowCollection::DiiCash | FlowCollection::DiiFoIndices | FlowCollection::DiiFoStocks => {
                Some(InvestorType::Dii)
            }
        }
    }

    pub fn segment(&self) -> Option<Segment> {
        match self {
            FlowCollection::CashProvisional => None,
            FlowCollection::FiiCash | FlowCollection::DiiCash => Some(Segment::Cash),
            FlowCollection::FiiFoIndices | FlowCollection::DiiFoIndices => Some(Segment::FoIndices),
            FlowCollection::FiiFoStocks | FlowCollection::DiiFoStocks => Some(Segment::FoStocks),
        }
    }

    /// The two asset classes each per-segment CSV row splits into
    pub fn asset_classes(&self) -> Option<(AssetClass, AssetClass)> {
        match self.segment()? {
            Segment::Cash => Some((AssetClass::Equity, AssetClass::Debt)),
            Segment::FoIndices | Segment::FoStocks => {
                Some((AssetClass::Futures, AssetClass::Options))
            }
        }
    }

    /// Provisional daily numbers are additive; everything else replaces
    pub fn dedup_policy(&self) -> DedupPolicy {
        match self {
            FlowCollection::CashProvisional => DedupPolicy::Additive,
            _ => DedupPolicy::Replaceable,
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            FlowCollection::CashProvisional => "cash_provisional_flows",
            _ => "segment_flows",
        }
    }

    /// Exact header set the collection's CSV must carry. Column order and
    /// extra columns are not checked; casing is.
    pub fn expected_headers(&self) -> Vec<String> {
        let mut headers = vec!["Date".to_string()];
        match self {
            FlowCollection::CashProvisional => {
                for investor in ["FII", "DII"] {
                    for field in ["Gross_Purchase", "Gross_Sales", "Net"] {
                        headers.push(format!("{}_{}", investor, field));
                    }
                }
            }
            _ => {
                // Per-segment files carry two asset-class column triplets;
                // the indices file suffixes every column with _Indices.
                let investor = match self.investor_type() {
                    Some(t) => t.as_str(),
                    None => return headers,
                };
                let (first, second) = match self.asset_classes() {
                    Some(pair) => pair,
                    None => return headers,
                };
                let suffix = match self.segment() {
                    Some(Segment::FoIndices) => "_Indices",
                    _ => "",
                };
                for asset in [first, second] {
                    for field in ["Gross_Purchase", "Gross_Sales", "Net"] {
                        headers.push(format!(
                            "{}_{}_{}{}",
                            investor,
                            asset.as_str(),
                            field,
                            suffix
                        ));
                    }
                }
            }
        }
        headers
    }
}

impl FromStr for FlowCollection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = s.trim().to_ascii_lowercase().replace('_', "-");
        match slug.as_str() {
            "cash-provisional" | "provisional" => Ok(FlowCollection::CashProvisional),
            "fii-cash" => Ok(FlowCollection::FiiCash),
            "dii-cash" => Ok(FlowCollection::DiiCash),
            "fii-fo-indices" => Ok(FlowCollection::FiiFoIndices),
            "dii-fo-indices" => Ok(FlowCollection::DiiFoIndices),
            "fii-fo-stocks" => Ok(FlowCollection::FiiFoStocks),
            "dii-fo-stocks" => Ok(FlowCollection::DiiFoStocks),
            _ => Err(()),
        }
    }
}

/// Normalized flow observation in ₹ crore.
///
/// Fiscal labels are always derived from the date at construction, never
/// taken from the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowRecord {
    pub date: NaiveDate,
    pub investor_type: InvestorType,
    pub segment: Segment,
    pub asset_class: AssetClass,
    pub gross_purchase: Decimal,
    pub gross_sales: Decimal,
    pub net: Decimal,
    pub fiscal_year: String,
    pub quarter: String,
    pub month_name: String,
}

impl FlowRecord {
    pub fn new(
        date: NaiveDate,
        investor_type: InvestorType,
        segment: Segment,
        asset_class: AssetClass,
        gross_purchase: Decimal,
        gross_sales: Decimal,
    ) -> Self {
        FlowRecord {
            date,
            investor_type,
            segment,
            asset_class,
            gross_purchase,
            gross_sales,
            net: gross_purchase - gross_sales,
            fiscal_year: fiscal::fiscal_year(date),
            quarter: fiscal::quarter(date),
            month_name: fiscal::month_name(date),
        }
    }
}

/// Combined FII+DII provisional cash numbers for one trading day (₹ crore)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashProvisionalRecord {
    pub date: NaiveDate,
    pub fii_gross_purchase: Decimal,
    pub fii_gross_sales: Decimal,
    pub fii_net: Decimal,
    pub dii_gross_purchase: Decimal,
    pub dii_gross_sales: Decimal,
    pub dii_net: Decimal,
    pub fiscal_year: String,
    pub quarter: String,
    pub month_name: String,
}

impl CashProvisionalRecord {
    pub fn new(
        date: NaiveDate,
        fii_gross_purchase: Decimal,
        fii_gross_sales: Decimal,
        dii_gross_purchase: Decimal,
        dii_gross_sales: Decimal,
    ) -> Self {
        CashProvisionalRecord {
            date,
            fii_gross_purchase,
            fii_gross_sales,
            fii_net: fii_gross_purchase - fii_gross_sales,
            dii_gross_purchase,
            dii_gross_sales,
            dii_net: dii_gross_purchase - dii_gross_sales,
            fiscal_year: fiscal::fiscal_year(date),
            quarter: fiscal::quarter(date),
            month_name: fiscal::month_name(date),
        }
    }
}

/// One disclosed bulk or block deal (value in rupees)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealRecord {
    pub id: Option<i64>,
    pub kind: DealKind,
    pub date: NaiveDate,
    pub symbol: String,
    pub security_name: Option<String>,
    pub client_name: String,
    pub side: Option<DealSide>,
    pub quantity: Decimal,
    pub price: Decimal,
    pub value: Decimal,
    pub exchange: String,
}

/// A city's share of total AUM inside one quarter snapshot, in percentage
/// points. Coordinates are resolved from the reference table at parse time;
/// unmapped cities keep their data with no coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityAllocation {
    pub city: String,
    pub share_pct: Decimal,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One parsed quarter worksheet: per-city rows plus the three roll-up rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarterAum {
    pub quarter_key: String,
    pub fiscal_year: String,
    pub quarter_number: u8,
    pub as_of_date: NaiveDate,
    pub cities: Vec<CityAllocation>,
    pub other_cities_pct: Decimal,
    pub nri_overseas_pct: Decimal,
    pub stated_total_pct: Decimal,
}

impl QuarterAum {
    /// Sum of city shares plus the two non-city roll-ups, for reconciliation
    /// against the stated total.
    pub fn computed_total(&self) -> Decimal {
        let cities: Decimal = self.cities.iter().map(|c| c.share_pct).sum();
        cities + self.other_cities_pct + self.nri_overseas_pct
    }
}

/// Outcome recorded for one processed upload
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UploadStatus {
    Success,
    Partial,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Success => "SUCCESS",
            UploadStatus::Partial => "PARTIAL",
            UploadStatus::Failed => "FAILED",
        }
    }
}

impl FromStr for UploadStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" => Ok(UploadStatus::Success),
            "PARTIAL" => Ok(UploadStatus::Partial),
            "FAILED" => Ok(UploadStatus::Failed),
            _ => Err(()),
        }
    }
}

/// Audit row for one processed upload file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadAudit {
    pub id: Option<i64>,
    pub collection: String,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub rows_ingested: usize,
    pub rows_skipped: usize,
    pub date_range_start: Option<NaiveDate>,
    pub date_range_end: Option<NaiveDate>,
    pub status: UploadStatus,
    pub message: Option<String>,
}
