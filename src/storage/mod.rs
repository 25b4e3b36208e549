//! Scan report persistence.
//!
//! Serializes a [`crate::scanner::ScanReport`] into its JSON document form
//! and writes it to disk.

mod json_store;

pub use json_store::{save_report, ReportDocument, ResultRecord, ScanInfo};
