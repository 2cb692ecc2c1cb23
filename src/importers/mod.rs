// Import module - flow/deal CSV and city allocation workbook parsers

pub mod city_aum_excel;
pub mod deals_csv;
pub mod flows_csv;
pub mod ingest;
pub mod validation;

pub use city_aum_excel::{parse_city_aum_workbook, WorkbookParse};
pub use deals_csv::{parse_deals, parse_deals_csv, DealParse};
pub use flows_csv::{
    parse_cash_provisional, parse_cash_provisional_csv, parse_segment, parse_segment_csv, CsvParse,
};
pub use ingest::{
    ingest_city_workbook, ingest_deals, ingest_deals_file, ingest_flow, ingest_flow_file,
    CityIngestReport, IngestReport, CHUNK_SIZE,
};
pub use validation::ValidationIssue;
