//! Output formatting module.
//!
//! Renders a finished [`ScanReport`] to stdout as plain text, JSON, or CSV.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::print_csv;
pub use json_format::print_json;
pub use plain::{print_error, print_info, print_plain, print_scan_header, print_warning};

use crate::cli::OutputFormat;
use crate::error::CliResult;
use crate::scanner::{DisplayFilter, ScanReport};

/// Format and print a report according to the specified format.
pub fn print_report(report: &ScanReport, format: OutputFormat, filter: DisplayFilter) -> CliResult<()> {
    match format {
        OutputFormat::Plain => print_plain(report, filter)?,
        OutputFormat::Json => print_json(report, filter)?,
        OutputFormat::Csv => print_csv(report, filter)?,
    }
    Ok(())
}
