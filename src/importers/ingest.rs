//! Upload ingestion pipeline
//!
//! One entry point per upload kind. Each follows the same spine: parse and
//! validate, de-duplicate per the target collection's declared policy, then
//! persist sequentially in chunks of [`CHUNK_SIZE`] rows so a mid-batch
//! failure leaves a clean, resumable boundary. Every attempt, successful or
//! not, leaves one append-only audit row.
//!
//! Additive collections skip dates that already exist in the store (history
//! is never overwritten); replaceable collections delete and re-insert the
//! incoming keys so a previously uploaded day can be corrected.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use super::city_aum_excel::{self, WorkbookParse};
use super::deals_csv;
use super::flows_csv;
use super::validation::ValidationIssue;
use crate::db::{self, models::*};
use crate::error::FlowError;

/// Rows per persisted chunk
pub const CHUNK_SIZE: usize = 100;

/// Outcome of one flow or deal upload
#[derive(Debug, Serialize)]
pub struct IngestReport {
    pub collection: String,
    pub file_name: String,
    pub inserted: usize,
    /// Rows withheld by the dedup policy (existing dates on additive
    /// collections, exact in-file duplicates on deal files)
    pub skipped_existing: usize,
    pub issues: Vec<ValidationIssue>,
}

/// Outcome of one city allocation workbook upload
#[derive(Debug, Serialize)]
pub struct CityIngestReport {
    pub file_name: String,
    pub quarters_imported: usize,
    pub cities_imported: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// A chunk write failed; earlier chunks stay committed
struct ChunkFailure {
    chunks_committed: usize,
    rows_committed: usize,
    source: anyhow::Error,
}

/// Write records chunk by chunk, sequentially, reporting how far we got
fn persist_chunked<T>(
    conn: &mut Connection,
    records: &[T],
    mut write_chunk: impl FnMut(&mut Connection, &[T]) -> Result<usize>,
) -> std::result::Result<usize, ChunkFailure> {
    let mut chunks_committed = 0;
    let mut rows_committed = 0;
    for chunk in records.chunks(CHUNK_SIZE) {
        match write_chunk(conn, chunk) {
            Ok(written) => {
                chunks_committed += 1;
                rows_committed += written;
            }
            Err(source) => {
                return Err(ChunkFailure {
                    chunks_committed,
                    rows_committed,
                    source,
                })
            }
        }
    }
    Ok(rows_committed)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn date_span(dates: impl Iterator<Item = NaiveDate>) -> Option<(NaiveDate, NaiveDate)> {
    let mut span: Option<(NaiveDate, NaiveDate)> = None;
    for date in dates {
        span = Some(match span {
            None => (date, date),
            Some((start, end)) => (start.min(date), end.max(date)),
        });
    }
    span
}

fn audit_failed(conn: &Connection, collection: &str, file_name: &str, message: &str) {
    // The audit trail is best-effort on the failure path
    if let Err(e) = db::record_upload(
        conn,
        collection,
        file_name,
        0,
        0,
        None,
        UploadStatus::Failed,
        Some(message),
    ) {
        warn!("Could not record failed upload audit: {}", e);
    }
}

fn chunk_failure_to_error(
    conn: &Connection,
    collection: &str,
    file_name: &str,
    skipped: usize,
    span: Option<(NaiveDate, NaiveDate)>,
    failure: ChunkFailure,
) -> anyhow::Error {
    let status = if failure.chunks_committed > 0 {
        UploadStatus::Partial
    } else {
        UploadStatus::Failed
    };
    let message = format!(
        "store write failed after {} committed chunk(s) ({} rows): {}",
        failure.chunks_committed, failure.rows_committed, failure.source
    );
    if let Err(e) = db::record_upload(
        conn,
        collection,
        file_name,
        failure.rows_committed,
        skipped,
        span,
        status,
        Some(&message),
    ) {
        warn!("Could not record partial upload audit: {}", e);
    }

    FlowError::Persistence {
        chunks_committed: failure.chunks_committed,
        message: failure.source.to_string(),
    }
    .into()
}

// ---------------------------------------------------------------------------
// Flow uploads
// ---------------------------------------------------------------------------

/// Ingest one flow CSV file into its target collection
pub fn ingest_flow_file<P: AsRef<Path>>(
    conn: &mut Connection,
    collection: FlowCollection,
    path: P,
) -> Result<IngestReport> {
    let path = path.as_ref();
    let file_name = file_name_of(path);
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) => {
            let message = format!("could not open {}: {}", path.display(), e);
            audit_failed(conn, collection.as_str(), &file_name, &message);
            return Err(FlowError::Io(e).into());
        }
    };
    ingest_flow(conn, collection, file, &file_name)
}

/// Ingest flow rows from any reader
pub fn ingest_flow(
    conn: &mut Connection,
    collection: FlowCollection,
    input: impl Read,
    file_name: &str,
) -> Result<IngestReport> {
    info!("Ingesting '{}' into {}", file_name, collection.as_str());
    match collection {
        FlowCollection::CashProvisional => ingest_cash_provisional(conn, input, file_name),
        _ => ingest_segment(conn, collection, input, file_name),
    }
}

/// The provisional collection is additive: existing dates are skipped, never
/// overwritten, and within one file the first occurrence of a date wins
fn ingest_cash_provisional(
    conn: &mut Connection,
    input: impl Read,
    file_name: &str,
) -> Result<IngestReport> {
    let collection = FlowCollection::CashProvisional;
    let parse = match flows_csv::parse_cash_provisional(input) {
        Ok(parse) => parse,
        Err(e) => {
            audit_failed(conn, collection.as_str(), file_name, &e.to_string());
            return Err(e);
        }
    };

    let existing = db::existing_cash_provisional_dates(conn)?;
    let mut seen_in_file = std::collections::HashSet::new();
    let mut new_records = Vec::new();
    let mut skipped_existing = 0;
    for record in parse.records {
        if existing.contains(&record.date) || !seen_in_file.insert(record.date) {
            skipped_existing += 1;
            continue;
        }
        new_records.push(record);
    }

    let span = date_span(new_records.iter().map(|r| r.date));
    let skipped_total = skipped_existing + parse.issues.len();
    let inserted = persist_chunked(conn, &new_records, db::insert_cash_provisional_chunk)
        .map_err(|failure| {
            chunk_failure_to_error(
                conn,
                collection.as_str(),
                file_name,
                skipped_total,
                span,
                failure,
            )
        })?;

    finish_report(
        conn,
        collection.as_str().to_string(),
        file_name,
        inserted,
        skipped_existing,
        span,
        parse.issues,
    )
}

/// Segment collections are replaceable: each incoming key is deleted and
/// re-inserted inside the chunk's transaction, so re-uploads correct a day
/// and later in-file occurrences win
fn ingest_segment(
    conn: &mut Connection,
    collection: FlowCollection,
    input: impl Read,
    file_name: &str,
) -> Result<IngestReport> {
    let parse = match flows_csv::parse_segment(input, collection) {
        Ok(parse) => parse,
        Err(e) => {
            audit_failed(conn, collection.as_str(), file_name, &e.to_string());
            return Err(e);
        }
    };

    let span = date_span(parse.records.iter().map(|r| r.date));
    let inserted = persist_chunked(conn, &parse.records, db::replace_segment_flow_chunk)
        .map_err(|failure| {
            chunk_failure_to_error(
                conn,
                collection.as_str(),
                file_name,
                parse.issues.len(),
                span,
                failure,
            )
        })?;

    finish_report(
        conn,
        collection.as_str().to_string(),
        file_name,
        inserted,
        0,
        span,
        parse.issues,
    )
}

// ---------------------------------------------------------------------------
// Deal uploads
// ---------------------------------------------------------------------------

/// Ingest one exchange deal disclosure file
pub fn ingest_deals_file<P: AsRef<Path>>(
    conn: &mut Connection,
    kind: DealKind,
    path: P,
) -> Result<IngestReport> {
    let path = path.as_ref();
    let file_name = file_name_of(path);
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) => {
            let message = format!("could not open {}: {}", path.display(), e);
            audit_failed(conn, deal_collection_key(kind), &file_name, &message);
            return Err(FlowError::Io(e).into());
        }
    };
    ingest_deals(conn, kind, file, &file_name)
}

fn deal_collection_key(kind: DealKind) -> &'static str {
    match kind {
        DealKind::Bulk => "bulk-deals",
        DealKind::Block => "block-deals",
    }
}

/// Ingest deal rows from any reader. Bulk deals upsert on their natural key;
/// block deals replace whole dates (delete once up front, then insert).
pub fn ingest_deals(
    conn: &mut Connection,
    kind: DealKind,
    input: impl Read,
    file_name: &str,
) -> Result<IngestReport> {
    let collection = deal_collection_key(kind);
    info!("Ingesting '{}' into {}", file_name, collection);

    let parse = match deals_csv::parse_deals(input, kind) {
        Ok(parse) => parse,
        Err(e) => {
            audit_failed(conn, collection, file_name, &e.to_string());
            return Err(e);
        }
    };

    let span = date_span(parse.records.iter().map(|r| r.date));
    let skipped = parse.duplicates_collapsed;
    let skipped_total = skipped + parse.issues.len();

    if kind == DealKind::Block {
        // Delete every date carried by the file exactly once, before any
        // chunk writes, so chunk N+1 cannot wipe what chunk N inserted
        let mut dates: Vec<NaiveDate> = parse.records.iter().map(|r| r.date).collect();
        dates.sort_unstable();
        dates.dedup();
        let deleted = match db::delete_block_deals_for_dates(conn, &dates) {
            Ok(deleted) => deleted,
            Err(e) => {
                audit_failed(conn, collection, file_name, &e.to_string());
                return Err(e);
            }
        };
        if deleted > 0 {
            info!("Replaced {} stored block deal(s) for re-uploaded dates", deleted);
        }
    }

    let write_chunk: fn(&mut Connection, &[DealRecord]) -> Result<usize> = match kind {
        DealKind::Bulk => db::upsert_bulk_deal_chunk,
        DealKind::Block => db::insert_block_deals_chunk,
    };
    let inserted = persist_chunked(conn, &parse.records, write_chunk).map_err(|failure| {
        chunk_failure_to_error(conn, collection, file_name, skipped_total, span, failure)
    })?;

    finish_report(
        conn,
        collection.to_string(),
        file_name,
        inserted,
        skipped,
        span,
        parse.issues,
    )
}

// ---------------------------------------------------------------------------
// City allocation workbook
// ---------------------------------------------------------------------------

/// Ingest a city allocation workbook: every parsed quarter replaces its
/// stored counterpart wholesale
pub fn ingest_city_workbook<P: AsRef<Path>>(
    conn: &mut Connection,
    path: P,
) -> Result<CityIngestReport> {
    let path = path.as_ref();
    let file_name = file_name_of(path);

    let parsed: WorkbookParse = match city_aum_excel::parse_city_aum_workbook(path) {
        Ok(parsed) => parsed,
        Err(e) => {
            audit_failed(conn, "city-aum", &file_name, &e.to_string());
            return Err(e);
        }
    };

    let mut quarters_imported = 0;
    let mut cities_imported = 0;
    for quarter in &parsed.quarters {
        if let Err(source) = db::replace_quarter_aum(conn, quarter) {
            // Each quarter commits on its own; earlier ones stay put
            return Err(chunk_failure_to_error(
                conn,
                "city-aum",
                &file_name,
                parsed.errors.len(),
                date_span(parsed.quarters.iter().map(|q| q.as_of_date)),
                ChunkFailure {
                    chunks_committed: quarters_imported,
                    rows_committed: cities_imported,
                    source,
                },
            ));
        }
        quarters_imported += 1;
        cities_imported += quarter.cities.len();
    }

    let status = if parsed.errors.is_empty() {
        UploadStatus::Success
    } else {
        UploadStatus::Partial
    };
    let mut message = format!("{} quarter(s) imported", quarters_imported);
    if !parsed.warnings.is_empty() {
        message.push_str(&format!(", {} warning(s)", parsed.warnings.len()));
    }
    if !parsed.errors.is_empty() {
        message.push_str(&format!(", {} worksheet(s) rejected", parsed.errors.len()));
    }
    db::record_upload(
        conn,
        "city-aum",
        &file_name,
        cities_imported,
        parsed.errors.len(),
        date_span(parsed.quarters.iter().map(|q| q.as_of_date)),
        status,
        Some(&message),
    )?;

    info!(
        "Workbook '{}' ingested: {} quarter(s), {} city row(s)",
        file_name, quarters_imported, cities_imported
    );

    Ok(CityIngestReport {
        file_name,
        quarters_imported,
        cities_imported,
        warnings: parsed.warnings,
        errors: parsed.errors,
    })
}

/// Write the success/partial audit row and assemble the report
fn finish_report(
    conn: &Connection,
    collection: String,
    file_name: &str,
    inserted: usize,
    skipped_existing: usize,
    span: Option<(NaiveDate, NaiveDate)>,
    issues: Vec<ValidationIssue>,
) -> Result<IngestReport> {
    let status = if issues.is_empty() {
        UploadStatus::Success
    } else {
        UploadStatus::Partial
    };
    let message = if issues.is_empty() {
        None
    } else {
        Some(format!("{} row(s) rejected by validation", issues.len()))
    };
    db::record_upload(
        conn,
        &collection,
        file_name,
        inserted,
        skipped_existing + issues.len(),
        span,
        status,
        message.as_deref(),
    )?;

    info!(
        "Ingested {} row(s) into {}, skipped {}, {} issue(s)",
        inserted,
        collection,
        skipped_existing,
        issues.len()
    );

    Ok(IngestReport {
        collection,
        file_name: file_name.to_string(),
        inserted,
        skipped_existing,
        issues,
    })
}
