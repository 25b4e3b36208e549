//! JSON output formatting.

use crate::error::StorageResult;
use crate::scanner::{DisplayFilter, ScanReport};
use crate::storage::ReportDocument;

/// Print the report document as pretty JSON.
pub fn print_json(report: &ScanReport, filter: DisplayFilter) -> StorageResult<()> {
    let json = ReportDocument::new(report, filter).to_json_pretty()?;
    println!("{}", json);
    Ok(())
}
