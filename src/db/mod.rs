// Database module - SQLite connection and persistence

pub mod models;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

pub use models::{
    AssetClass, CashProvisionalRecord, CityAllocation, DealKind, DealRecord, DealSide,
    DedupPolicy, FlowCollection, FlowRecord, InvestorType, QuarterAum, Segment, UploadAudit,
    UploadStatus,
};

/// Get the default database path (~/.instiflow/data.db)
pub fn get_default_db_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let data_dir = PathBuf::from(home).join(".instiflow");

    // Create directory if it doesn't exist
    std::fs::create_dir_all(&data_dir).context("Failed to create .instiflow directory")?;

    Ok(data_dir.join("data.db"))
}

/// Open database connection
pub fn open_db(db_path: Option<PathBuf>) -> Result<Connection> {
    let path = db_path.unwrap_or(get_default_db_path()?);
    let conn = Connection::open(&path).context(format!("Failed to open database at {:?}", path))?;

    // Enable foreign keys
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("Failed to enable foreign keys")?;

    Ok(conn)
}

/// Initialize the database with schema
pub fn init_database(db_path: Option<PathBuf>) -> Result<()> {
    let path = db_path.unwrap_or(get_default_db_path()?);

    info!("Initializing database at: {:?}", path);

    let conn = open_db(Some(path))?;

    let schema_sql = include_str!("schema.sql");
    conn.execute_batch(schema_sql)
        .context("Failed to execute schema")?;

    info!("Database initialized successfully");
    Ok(())
}

/// Helper to read Decimal from SQLite (handles INTEGER, REAL and TEXT)
pub fn get_decimal_value(row: &rusqlite::Row, idx: usize) -> Result<Decimal, rusqlite::Error> {
    use rusqlite::types::ValueRef;

    match row.get_ref(idx)? {
        ValueRef::Text(bytes) => {
            let s = std::str::from_utf8(bytes)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            Decimal::from_str(s).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        }
        ValueRef::Integer(i) => Ok(Decimal::from(i)),
        ValueRef::Real(f) => {
            Decimal::try_from(f).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        }
        _ => Err(rusqlite::Error::InvalidColumnType(
            idx,
            "decimal".to_string(),
            rusqlite::types::Type::Null,
        )),
    }
}

// ---------------------------------------------------------------------------
// Flow persistence
// ---------------------------------------------------------------------------

/// Dates already stored for the additive provisional collection
pub fn existing_cash_provisional_dates(conn: &Connection) -> Result<HashSet<NaiveDate>> {
    let mut stmt = conn.prepare("SELECT date FROM cash_provisional_flows")?;
    let dates = stmt
        .query_map([], |row| row.get::<_, NaiveDate>(0))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(dates)
}

/// Insert one chunk of provisional rows inside a single transaction.
///
/// Callers must already have filtered out dates that exist (additive
/// policy); the UNIQUE constraint on date is the backstop.
pub fn insert_cash_provisional_chunk(
    conn: &mut Connection,
    records: &[CashProvisionalRecord],
) -> Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO cash_provisional_flows (
                date, fii_gross_purchase, fii_gross_sales, fii_net,
                dii_gross_purchase, dii_gross_sales, dii_net,
                fiscal_year, quarter, month_name
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        for record in records {
            stmt.execute(params![
                record.date,
                record.fii_gross_purchase.to_string(),
                record.fii_gross_sales.to_string(),
                record.fii_net.to_string(),
                record.dii_gross_purchase.to_string(),
                record.dii_gross_sales.to_string(),
                record.dii_net.to_string(),
                record.fiscal_year,
                record.quarter,
                record.month_name,
            ])?;
        }
    }
    tx.commit()?;
    Ok(records.len())
}

/// Replace one chunk of segment rows inside a single transaction: delete the
/// chunk's natural keys, then insert. Later occurrences of a key within one
/// file therefore win over earlier ones.
pub fn replace_segment_flow_chunk(
    conn: &mut Connection,
    records: &[FlowRecord],
) -> Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut delete = tx.prepare(
            "DELETE FROM segment_flows
             WHERE date = ?1 AND investor_type = ?2 AND segment = ?3 AND asset_class = ?4",
        )?;
        let mut insert = tx.prepare(
            "INSERT INTO segment_flows (
                date, investor_type, segment, asset_class,
                gross_purchase, gross_sales, net,
                fiscal_year, quarter, month_name
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        for record in records {
            delete.execute(params![
                record.date,
                record.investor_type.as_str(),
                record.segment.as_str(),
                record.asset_class.as_str(),
            ])?;
            insert.execute(params![
                record.date,
                record.investor_type.as_str(),
                record.segment.as_str(),
                record.asset_class.as_str(),
                record.gross_purchase.to_string(),
                record.gross_sales.to_string(),
                record.net.to_string(),
                record.fiscal_year,
                record.quarter,
                record.month_name,
            ])?;
        }
    }
    tx.commit()?;
    Ok(records.len())
}

/// Provisional rows within [start, end], ascending by date
pub fn cash_provisional_range(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<CashProvisionalRecord>> {
    let mut stmt = conn.prepare(
        "SELECT date, fii_gross_purchase, fii_gross_sales, fii_net,
                dii_gross_purchase, dii_gross_sales, dii_net,
                fiscal_year, quarter, month_name
         FROM cash_provisional_flows
         WHERE date >= ?1 AND date <= ?2
         ORDER BY date",
    )?;

    let records = stmt
        .query_map(params![start, end], |row| {
            Ok(CashProvisionalRecord {
                date: row.get(0)?,
                fii_gross_purchase: get_decimal_value(row, 1)?,
                fii_gross_sales: get_decimal_value(row, 2)?,
                fii_net: get_decimal_value(row, 3)?,
                dii_gross_purchase: get_decimal_value(row, 4)?,
                dii_gross_sales: get_decimal_value(row, 5)?,
                dii_net: get_decimal_value(row, 6)?,
                fiscal_year: row.get(7)?,
                quarter: row.get(8)?,
                month_name: row.get(9)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Segment rows within [start, end] with optional investor/segment filters,
/// ascending by date
pub fn segment_flows_range(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
    investor: Option<InvestorType>,
    segment: Option<Segment>,
) -> Result<Vec<FlowRecord>> {
    let mut sql = String::from(
        "SELECT date, investor_type, segment, asset_class,
                gross_purchase, gross_sales, net,
                fiscal_year, quarter, month_name
         FROM segment_flows
         WHERE date >= ?1 AND date <= ?2",
    );
    let mut bind: Vec<String> = vec![start.to_string(), end.to_string()];

    if let Some(investor) = investor {
        bind.push(investor.as_str().to_string());
        sql.push_str(&format!(" AND investor_type = ?{}", bind.len()));
    }
    if let Some(segment) = segment {
        bind.push(segment.as_str().to_string());
        sql.push_str(&format!(" AND segment = ?{}", bind.len()));
    }
    sql.push_str(" ORDER BY date");

    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map(params_from_iter(bind.iter()), |row| {
            Ok(FlowRecord {
                date: row.get(0)?,
                investor_type: row
                    .get::<_, String>(1)?
                    .parse::<InvestorType>()
                    .unwrap_or(InvestorType::Fii),
                segment: row
                    .get::<_, String>(2)?
                    .parse::<Segment>()
                    .unwrap_or(Segment::Cash),
                asset_class: row
                    .get::<_, String>(3)?
                    .parse::<AssetClass>()
                    .unwrap_or(AssetClass::Equity),
                gross_purchase: get_decimal_value(row, 4)?,
                gross_sales: get_decimal_value(row, 5)?,
                net: get_decimal_value(row, 6)?,
                fiscal_year: row.get(7)?,
                quarter: row.get(8)?,
                month_name: row.get(9)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

// ---------------------------------------------------------------------------
// Deal persistence
// ---------------------------------------------------------------------------

/// Upsert one chunk of bulk deals on their natural key
/// (date, symbol, client_name, deal_type), inside a single transaction
pub fn upsert_bulk_deal_chunk(conn: &mut Connection, records: &[DealRecord]) -> Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO bulk_deals (
                date, symbol, security_name, client_name, deal_type,
                quantity, price, value, exchange
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT (date, symbol, client_name, deal_type) DO UPDATE SET
                security_name = excluded.security_name,
                quantity = excluded.quantity,
                price = excluded.price,
                value = excluded.value,
                exchange = excluded.exchange,
                updated_at = CURRENT_TIMESTAMP",
        )?;
        for deal in records {
            let deal_type = match deal.side {
                Some(side) => side.as_str(),
                None => return Err(anyhow::anyhow!("bulk deal requires a BUY/SELL side")),
            };
            stmt.execute(params![
                deal.date,
                deal.symbol,
                deal.security_name,
                deal.client_name,
                deal_type,
                deal.quantity.to_string(),
                deal.price.to_string(),
                deal.value.to_string(),
                deal.exchange,
            ])?;
        }
    }
    tx.commit()?;
    Ok(records.len())
}

/// Remove every block deal for the given dates. Runs once per upload, before
/// chunked inserts, so a chunk never wipes rows a previous chunk wrote.
pub fn delete_block_deals_for_dates(conn: &Connection, dates: &[NaiveDate]) -> Result<usize> {
    let mut deleted = 0;
    let mut stmt = conn.prepare("DELETE FROM block_deals WHERE date = ?1")?;
    for date in dates {
        deleted += stmt.execute(params![date])?;
    }
    Ok(deleted)
}

/// Insert one chunk of block deals inside a single transaction
pub fn insert_block_deals_chunk(conn: &mut Connection, records: &[DealRecord]) -> Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO block_deals (
                date, symbol, security_name, client_name,
                quantity, price, value, exchange
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for record in records {
            stmt.execute(params![
                record.date,
                record.symbol,
                record.security_name,
                record.client_name,
                record.quantity.to_string(),
                record.price.to_string(),
                record.value.to_string(),
                record.exchange,
            ])?;
        }
    }
    tx.commit()?;
    Ok(records.len())
}

/// Bulk deals within [start, end], ascending by date
pub fn bulk_deals_range(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DealRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, symbol, security_name, client_name, deal_type,
                quantity, price, value, exchange
         FROM bulk_deals
         WHERE date >= ?1 AND date <= ?2
         ORDER BY date",
    )?;

    let records = stmt
        .query_map(params![start, end], |row| {
            Ok(DealRecord {
                id: Some(row.get(0)?),
                kind: DealKind::Bulk,
                date: row.get(1)?,
                symbol: row.get(2)?,
                security_name: row.get(3)?,
                client_name: row.get(4)?,
                side: row.get::<_, String>(5)?.parse::<DealSide>().ok(),
                quantity: get_decimal_value(row, 6)?,
                price: get_decimal_value(row, 7)?,
                value: get_decimal_value(row, 8)?,
                exchange: row.get(9)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Block deals within [start, end], ascending by date
pub fn block_deals_range(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DealRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, symbol, security_name, client_name,
                quantity, price, value, exchange
         FROM block_deals
         WHERE date >= ?1 AND date <= ?2
         ORDER BY date",
    )?;

    let records = stmt
        .query_map(params![start, end], |row| {
            Ok(DealRecord {
                id: Some(row.get(0)?),
                kind: DealKind::Block,
                date: row.get(1)?,
                symbol: row.get(2)?,
                security_name: row.get(3)?,
                client_name: row.get(4)?,
                side: None,
                quantity: get_decimal_value(row, 5)?,
                price: get_decimal_value(row, 6)?,
                value: get_decimal_value(row, 7)?,
                exchange: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

// ---------------------------------------------------------------------------
// City AUM persistence
// ---------------------------------------------------------------------------

/// Replace a quarter snapshot and all its city rows in one transaction
pub fn replace_quarter_aum(conn: &mut Connection, quarter: &QuarterAum) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute(
        "DELETE FROM city_allocations WHERE quarter_key = ?1",
        params![quarter.quarter_key],
    )?;
    tx.execute(
        "DELETE FROM city_quarters WHERE quarter_key = ?1",
        params![quarter.quarter_key],
    )?;

    tx.execute(
        "INSERT INTO city_quarters (
            quarter_key, fiscal_year, quarter_number, as_of_date,
            other_cities_pct, nri_overseas_pct, stated_total_pct
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            quarter.quarter_key,
            quarter.fiscal_year,
            quarter.quarter_number,
            quarter.as_of_date,
            quarter.other_cities_pct.to_string(),
            quarter.nri_overseas_pct.to_string(),
            quarter.stated_total_pct.to_string(),
        ],
    )?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO city_allocations (quarter_key, city, share_pct, latitude, longitude)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for city in &quarter.cities {
            stmt.execute(params![
                quarter.quarter_key,
                city.city,
                city.share_pct.to_string(),
                city.latitude,
                city.longitude,
            ])?;
        }
    }

    tx.commit()?;
    Ok(())
}

fn city_allocations_for(conn: &Connection, quarter_key: &str) -> Result<Vec<CityAllocation>> {
    let mut stmt = conn.prepare(
        "SELECT city, share_pct, latitude, longitude FROM city_allocations
         WHERE quarter_key = ?1
         ORDER BY CAST(share_pct AS REAL) DESC",
    )?;
    let cities = stmt
        .query_map(params![quarter_key], |row| {
            Ok(CityAllocation {
                city: row.get(0)?,
                share_pct: get_decimal_value(row, 1)?,
                latitude: row.get(2)?,
                longitude: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cities)
}

/// All stored quarter snapshots with their city rows, sorted by fiscal year
/// then quarter number
pub fn list_city_quarters(conn: &Connection) -> Result<Vec<QuarterAum>> {
    let mut stmt = conn.prepare(
        "SELECT quarter_key, fiscal_year, quarter_number, as_of_date,
                other_cities_pct, nri_overseas_pct, stated_total_pct
         FROM city_quarters
         ORDER BY fiscal_year, quarter_number",
    )?;

    let mut quarters = stmt
        .query_map([], |row| {
            Ok(QuarterAum {
                quarter_key: row.get(0)?,
                fiscal_year: row.get(1)?,
                quarter_number: row.get::<_, i64>(2)? as u8,
                as_of_date: row.get(3)?,
                cities: Vec::new(),
                other_cities_pct: get_decimal_value(row, 4)?,
                nri_overseas_pct: get_decimal_value(row, 5)?,
                stated_total_pct: get_decimal_value(row, 6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for quarter in &mut quarters {
        quarter.cities = city_allocations_for(conn, &quarter.quarter_key)?;
    }

    Ok(quarters)
}

/// One stored quarter snapshot by key, with its city rows
pub fn get_quarter_aum(conn: &Connection, quarter_key: &str) -> Result<Option<QuarterAum>> {
    use rusqlite::OptionalExtension;

    let quarter = conn
        .query_row(
            "SELECT quarter_key, fiscal_year, quarter_number, as_of_date,
                    other_cities_pct, nri_overseas_pct, stated_total_pct
             FROM city_quarters
             WHERE quarter_key = ?1",
            params![quarter_key],
            |row| {
                Ok(QuarterAum {
                    quarter_key: row.get(0)?,
                    fiscal_year: row.get(1)?,
                    quarter_number: row.get::<_, i64>(2)? as u8,
                    as_of_date: row.get(3)?,
                    cities: Vec::new(),
                    other_cities_pct: get_decimal_value(row, 4)?,
                    nri_overseas_pct: get_decimal_value(row, 5)?,
                    stated_total_pct: get_decimal_value(row, 6)?,
                })
            },
        )
        .optional()?;

    match quarter {
        Some(mut q) => {
            q.cities = city_allocations_for(conn, &q.quarter_key)?;
            Ok(Some(q))
        }
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Upload audit
// ---------------------------------------------------------------------------

/// Record the outcome of one processed upload file
#[allow(clippy::too_many_arguments)]
pub fn record_upload(
    conn: &Connection,
    collection: &str,
    file_name: &str,
    rows_ingested: usize,
    rows_skipped: usize,
    date_range: Option<(NaiveDate, NaiveDate)>,
    status: UploadStatus,
    message: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO uploads (collection, file_name, rows_ingested, rows_skipped,
                              date_range_start, date_range_end, status, message)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            collection,
            file_name,
            rows_ingested as i64,
            rows_skipped as i64,
            date_range.map(|(start, _)| start),
            date_range.map(|(_, end)| end),
            status.as_str(),
            message,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Most recent uploads, newest first
pub fn list_uploads(conn: &Connection, limit: usize) -> Result<Vec<UploadAudit>> {
    let mut stmt = conn.prepare(
        "SELECT id, collection, file_name, uploaded_at, rows_ingested, rows_skipped,
                date_range_start, date_range_end, status, message
         FROM uploads
         ORDER BY uploaded_at DESC, id DESC
         LIMIT ?1",
    )?;

    let uploads = stmt
        .query_map(params![limit as i64], |row| {
            Ok(UploadAudit {
                id: Some(row.get(0)?),
                collection: row.get(1)?,
                file_name: row.get(2)?,
                uploaded_at: row.get(3)?,
                rows_ingested: row.get::<_, i64>(4)? as usize,
                rows_skipped: row.get::<_, i64>(5)? as usize,
                date_range_start: row.get(6)?,
                date_range_end: row.get(7)?,
                status: row
                    .get::<_, String>(8)?
                    .parse::<UploadStatus>()
                    .unwrap_or(UploadStatus::Failed),
                message: row.get(9)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(uploads)
}
