//! Static reference data: sector classification for NSE symbols and
//! keyword-based investor classification for deal client names.

pub mod cities;

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

static SECTOR_MAPPING: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    // Banking
    for symbol in [
        "HDFCBANK",
        "ICICIBANK",
        "SBIN",
        "AXISBANK",
        "KOTAKBANK",
        "INDUSINDBK",
        "BANDHANBNK",
        "FEDERALBNK",
        "IDFCFIRSTB",
        "PNB",
    ] {
        map.insert(symbol, "Banking");
    }
    // IT
    for symbol in [
        "TCS", "INFY", "HCLTECH", "WIPRO", "TECHM", "LTI", "MINDTREE", "MPHASIS",
    ] {
        map.insert(symbol, "IT");
    }
    // Oil & Gas
    for symbol in ["RELIANCE", "ONGC", "IOC", "BPCL", "GAIL"] {
        map.insert(symbol, "Oil & Gas");
    }
    // Pharma
    for symbol in [
        "SUNPHARMA",
        "DRREDDY",
        "CIPLA",
        "DIVISLAB",
        "BIOCON",
        "LUPIN",
    ] {
        map.insert(symbol, "Pharma");
    }
    // Auto
    for symbol in [
        "MARUTI",
        "TATAMOTORS",
        "M&M",
        "BAJAJ-AUTO",
        "HEROMOTOCO",
        "EICHERMOT",
    ] {
        map.insert(symbol, "Auto");
    }
    // FMCG
    for symbol in [
        "HINDUNILVR",
        "ITC",
        "NESTLEIND",
        "BRITANNIA",
        "DABUR",
        "GODREJCP",
    ] {
        map.insert(symbol, "FMCG");
    }
    // Metals
    for symbol in [
        "TATASTEEL",
        "JSWSTEEL",
        "HINDALCO",
        "VEDL",
        "COALINDIA",
        "NMDC",
    ] {
        map.insert(symbol, "Metals");
    }
    // Telecom
    for symbol in ["BHARTIARTL", "IDEA"] {
        map.insert(symbol, "Telecom");
    }
    // Cement
    for symbol in ["ULTRACEMCO", "SHREECEM", "ACC", "AMBUJACEMENT"] {
        map.insert(symbol, "Cement");
    }
    // Power
    for symbol in ["NTPC", "POWERGRID", "TATAPOWER"] {
        map.insert(symbol, "Power");
    }
    // Realty
    for symbol in ["DLF", "GODREJPROP", "OBEROIRLTY"] {
        map.insert(symbol, "Realty");
    }
    map
});

/// Sector for an NSE symbol; unmapped symbols fall into "Others"
pub fn sector_for_symbol(symbol: &str) -> &'static str {
    SECTOR_MAPPING
        .get(symbol.trim().to_ascii_uppercase().as_str())
        .copied()
        .unwrap_or("Others")
}

/// Every distinct sector, sorted, without the "Others" catch-all
pub fn all_sectors() -> Vec<&'static str> {
    let mut sectors: Vec<&'static str> = SECTOR_MAPPING.values().copied().collect();
    sectors.sort_unstable();
    sectors.dedup();
    sectors
}

/// Investor bucket inferred from a deal client name
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum InvestorClass {
    Fii,
    Dii,
    Hni,
    Others,
}

impl InvestorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestorClass::Fii => "FII",
            InvestorClass::Dii => "DII",
            InvestorClass::Hni => "HNI",
            InvestorClass::Others => "Others",
        }
    }
}

const FII_KEYWORDS: [&str; 9] = [
    "morgan",
    "goldman",
    "blackrock",
    "vanguard",
    "fidelity",
    "capital",
    "international",
    "global",
    "offshore",
];

const DII_KEYWORDS: [&str; 9] = [
    "mutual fund",
    "insurance",
    "lic",
    "sbi",
    "hdfc",
    "icici",
    "aditya birla",
    "reliance",
    "nippon",
];

const HNI_KEYWORDS: [&str; 5] = ["family", "trust", "holdings", "investments", "enterprises"];

/// Classify a client name into FII / DII / HNI / Others.
///
/// Checks run in that order, so a name matching both foreign and domestic
/// keywords counts as FII.
pub fn classify_investor(client_name: &str) -> InvestorClass {
    let name = client_name.to_lowercase();

    if FII_KEYWORDS.iter().any(|k| name.contains(k)) {
        return InvestorClass::Fii;
    }
    if DII_KEYWORDS.iter().any(|k| name.contains(k)) {
        return InvestorClass::Dii;
    }
    if HNI_KEYWORDS.iter().any(|k| name.contains(k)) {
        return InvestorClass::Hni;
    }

    InvestorClass::Others
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_lookup_is_case_insensitive() {
        assert_eq!(sector_for_symbol("RELIANCE"), "Oil & Gas");
        assert_eq!(sector_for_symbol("reliance"), "Oil & Gas");
        assert_eq!(sector_for_symbol(" tatasteel "), "Metals");
        assert_eq!(sector_for_symbol("M&M"), "Auto");
    }

    #[test]
    fn test_unmapped_symbol_is_others() {
        assert_eq!(sector_for_symbol("ZOMATO"), "Others");
        assert_eq!(sector_for_symbol(""), "Others");
    }

    #[test]
    fn test_all_sectors_distinct_and_sorted() {
        let sectors = all_sectors();
        assert!(sectors.contains(&"Banking"));
        assert!(sectors.contains(&"Realty"));
        assert!(!sectors.contains(&"Others"));
        let mut sorted = sectors.clone();
        sorted.sort_unstable();
        assert_eq!(sectors, sorted);
    }

    #[test]
    fn test_classify_investor_buckets() {
        assert_eq!(
            classify_investor("Goldman Sachs Singapore Pte"),
            InvestorClass::Fii
        );
        assert_eq!(
            classify_investor("Nippon India Mutual Fund"),
            InvestorClass::Dii
        );
        assert_eq!(
            classify_investor("Damani Family Office Trust"),
            InvestorClass::Hni
        );
        assert_eq!(classify_investor("Rakesh Kumar"), InvestorClass::Others);
    }

    #[test]
    fn test_classify_investor_fii_takes_precedence() {
        // Matches both 'morgan' (FII) and 'mutual fund' (DII)
        assert_eq!(
            classify_investor("Morgan Stanley Mutual Fund"),
            InvestorClass::Fii
        );
    }
}
