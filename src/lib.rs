//! Instiflow - Indian market institutional flow tracker
//!
//! This library ingests daily FII/DII flow files, exchange bulk/block deal
//! disclosures and quarterly city-AUM workbooks into SQLite, and reports on
//! them across fiscal-year aligned periods (April-March).

pub mod db;
pub mod error;
pub mod fiscal;
pub mod importers;
pub mod refdata;
pub mod reports;
pub mod utils;
