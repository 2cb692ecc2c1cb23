use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::db::{self, QuarterAum};

/// One row of the stored-quarter listing
#[derive(Debug, Clone, Serialize)]
pub struct QuarterSummary {
    pub quarter_key: String,
    pub as_of_date: NaiveDate,
    pub city_count: usize,
    pub top_city: Option<String>,
    pub top_city_pct: Decimal,
    pub computed_total_pct: Decimal,
    pub stated_total_pct: Decimal,
}

/// Share movement of one city between two stored quarters, in percentage
/// points. A side is `None` when the city appears in only one quarter.
#[derive(Debug, Clone, Serialize)]
pub struct CityShareChange {
    pub city: String,
    pub previous_pct: Option<Decimal>,
    pub current_pct: Option<Decimal>,
    pub change_points: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuarterComparison {
    pub from_quarter: String,
    pub to_quarter: String,
    pub changes: Vec<CityShareChange>,
}

/// All stored quarters, oldest first, condensed to listing rows
pub fn list_quarter_summaries(conn: &Connection) -> Result<Vec<QuarterSummary>> {
    let quarters = db::list_city_quarters(conn)?;
    Ok(quarters.iter().map(summarize_quarter).collect())
}

fn summarize_quarter(quarter: &QuarterAum) -> QuarterSummary {
    // City rows come back sorted by share descending
    let top = quarter.cities.first();
    QuarterSummary {
        quarter_key: quarter.quarter_key.clone(),
        as_of_date: quarter.as_of_date,
        city_count: quarter.cities.len(),
        top_city: top.map(|c| c.city.clone()),
        top_city_pct: top.map(|c| c.share_pct).unwrap_or(Decimal::ZERO),
        computed_total_pct: quarter.computed_total(),
        stated_total_pct: quarter.stated_total_pct,
    }
}

/// Compare the two most recent stored quarters city by city. Returns `None`
/// until at least two quarters are stored.
pub fn compare_latest_quarters(conn: &Connection) -> Result<Option<QuarterComparison>> {
    let quarters = db::list_city_quarters(conn)?;
    if quarters.len() < 2 {
        return Ok(None);
    }
    let current = &quarters[quarters.len() - 1];
    let previous = &quarters[quarters.len() - 2];
    Ok(Some(compare_quarters(previous, current)))
}

/// City-level share deltas between two quarter snapshots, largest absolute
/// movement first. A city absent from one side contributes its whole share
/// as the change.
pub fn compare_quarters(previous: &QuarterAum, current: &QuarterAum) -> QuarterComparison {
    let mut cities: BTreeMap<String, (Option<Decimal>, Option<Decimal>)> = BTreeMap::new();
    for allocation in &previous.cities {
        cities.entry(allocation.city.clone()).or_default().0 = Some(allocation.share_pct);
    }
    for allocation in &current.cities {
        cities.entry(allocation.city.clone()).or_default().1 = Some(allocation.share_pct);
    }

    let mut changes: Vec<CityShareChange> = cities
        .into_iter()
        .map(|(city, (previous_pct, current_pct))| CityShareChange {
            city,
            previous_pct,
            current_pct,
            change_points: current_pct.unwrap_or(Decimal::ZERO)
                - previous_pct.unwrap_or(Decimal::ZERO),
        })
        .collect();
    changes.sort_by(|a, b| {
        b.change_points
            .abs()
            .cmp(&a.change_points.abs())
            .then_with(|| a.city.cmp(&b.city))
    });

    QuarterComparison {
        from_quarter: previous.quarter_key.clone(),
        to_quarter: current.quarter_key.clone(),
        changes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CityAllocation;
    use rust_decimal_macros::dec;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(include_str!("../db/schema.sql")).unwrap();
        conn
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn quarter(
        qn: u8,
        fy_start: i32,
        as_of: NaiveDate,
        cities: &[(&str, Decimal)],
    ) -> QuarterAum {
        let cities: Vec<CityAllocation> = cities
            .iter()
            .map(|(city, share)| CityAllocation {
                city: city.to_string(),
                share_pct: *share,
                latitude: None,
                longitude: None,
            })
            .collect();
        let fiscal_year = format!("{}-{:02}", fy_start, (fy_start + 1) % 100);
        let city_total: Decimal = cities.iter().map(|c| c.share_pct).sum();
        QuarterAum {
            quarter_key: format!("Q{} FY{}", qn, fiscal_year),
            fiscal_year,
            quarter_number: qn,
            as_of_date: as_of,
            cities,
            other_cities_pct: dec!(5),
            nri_overseas_pct: dec!(2),
            stated_total_pct: city_total + dec!(7),
        }
    }

    #[test]
    fn test_quarter_summaries_sorted_with_top_city() {
        let mut conn = memory_db();
        // Stored out of order; the listing sorts by fiscal year then quarter
        let q2 = quarter(2, 2024, d(2024, 9, 30), &[("Mumbai", dec!(41)), ("Delhi", dec!(10))]);
        let q1 = quarter(1, 2024, d(2024, 6, 30), &[("Mumbai", dec!(40))]);
        db::replace_quarter_aum(&mut conn, &q2).unwrap();
        db::replace_quarter_aum(&mut conn, &q1).unwrap();

        let summaries = list_quarter_summaries(&conn).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].quarter_key, "Q1 FY2024-25");
        assert_eq!(summaries[1].quarter_key, "Q2 FY2024-25");
        assert_eq!(summaries[1].city_count, 2);
        assert_eq!(summaries[1].top_city.as_deref(), Some("Mumbai"));
        assert_eq!(summaries[1].top_city_pct, dec!(41));
        assert_eq!(summaries[1].computed_total_pct, dec!(58));
        assert_eq!(summaries[1].stated_total_pct, dec!(58));
    }

    #[test]
    fn test_compare_latest_quarters_ranks_absolute_moves() {
        let mut conn = memory_db();
        let q4 = quarter(
            4,
            2023,
            d(2024, 3, 31),
            &[("Mumbai", dec!(38)), ("Delhi", dec!(12))],
        );
        let q1 = quarter(
            1,
            2024,
            d(2024, 6, 30),
            &[("Mumbai", dec!(40)), ("Delhi", dec!(11)), ("Pune", dec!(5))],
        );
        let q2 = quarter(
            2,
            2024,
            d(2024, 9, 30),
            &[("Mumbai", dec!(42)), ("Delhi", dec!(11)), ("Indore", dec!(3))],
        );
        db::replace_quarter_aum(&mut conn, &q4).unwrap();
        db::replace_quarter_aum(&mut conn, &q1).unwrap();
        db::replace_quarter_aum(&mut conn, &q2).unwrap();

        let comparison = compare_latest_quarters(&conn).unwrap().unwrap();
        assert_eq!(comparison.from_quarter, "Q1 FY2024-25");
        assert_eq!(comparison.to_quarter, "Q2 FY2024-25");

        let cities: Vec<&str> = comparison.changes.iter().map(|c| c.city.as_str()).collect();
        // Pune dropped out entirely (-5), Indore entered (+3), Mumbai grew (+2)
        assert_eq!(cities, vec!["Pune", "Indore", "Mumbai", "Delhi"]);
        assert_eq!(comparison.changes[0].change_points, dec!(-5));
        assert_eq!(comparison.changes[0].current_pct, None);
        assert_eq!(comparison.changes[1].change_points, dec!(3));
        assert_eq!(comparison.changes[1].previous_pct, None);
        assert_eq!(comparison.changes[2].change_points, dec!(2));
        assert_eq!(comparison.changes[3].change_points, dec!(0));
    }

    #[test]
    fn test_compare_needs_two_quarters() {
        let mut conn = memory_db();
        let q1 = quarter(1, 2024, d(2024, 6, 30), &[("Mumbai", dec!(40))]);
        db::replace_quarter_aum(&mut conn, &q1).unwrap();

        assert!(compare_latest_quarters(&conn).unwrap().is_none());
    }
}
