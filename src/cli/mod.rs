//! Command-line interface definitions for portsweep.
//!
//! Uses `clap` derive macros for declarative argument parsing. Options left
//! unset on the command line fall back to the settings file, then to the
//! built-in defaults.

mod scan;

pub use scan::execute;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// A concurrent TCP connect port scanner.
///
/// Probes each requested port with a full TCP handshake, reads whatever the
/// service volunteers on open ports, and reports the results in port order.
#[derive(Parser, Debug)]
#[command(name = "portsweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A concurrent TCP connect port scanner", long_about = None)]
pub struct Cli {
    /// Target IP address or hostname to scan
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Ports to scan (e.g., "80", "80,443", "1-1000", "22,80,443,8000-9000")
    #[arg(short, long)]
    pub ports: Option<String>,

    /// Connect timeout in seconds (fractions allowed)
    #[arg(short = 't', long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Banner read timeout in seconds (defaults to the connect timeout)
    #[arg(long, value_name = "SECS")]
    pub banner_timeout: Option<f64>,

    /// Maximum number of probes in flight
    #[arg(short = 'c', long, visible_alias = "threads", value_name = "N")]
    pub concurrency: Option<usize>,

    /// Output format for results
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Also write the JSON report to this file
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Show only open ports
    #[arg(long, conflicts_with = "show_closed")]
    pub open_only: bool,

    /// Show closed ports in output
    #[arg(long)]
    pub show_closed: bool,

    /// Skip banner capture; close connections as soon as they open
    #[arg(long)]
    pub no_banner: bool,

    /// Path to custom settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose output (debug logs and a progress bar)
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_minimal_args() {
        let cli = Cli::try_parse_from(["portsweep", "127.0.0.1"]).unwrap();
        assert_eq!(cli.target, "127.0.0.1");
        assert!(cli.ports.is_none());
        assert!(cli.format.is_none());
        assert!(!cli.no_banner);
    }

    #[test]
    fn test_full_args() {
        let cli = Cli::try_parse_from([
            "portsweep",
            "scanme.example",
            "-p",
            "22,80",
            "-t",
            "0.5",
            "--banner-timeout",
            "2",
            "--threads",
            "50",
            "-f",
            "json",
            "-o",
            "out.json",
            "--open-only",
        ])
        .unwrap();

        assert_eq!(cli.ports.as_deref(), Some("22,80"));
        assert_eq!(cli.timeout, Some(0.5));
        assert_eq!(cli.banner_timeout, Some(2.0));
        assert_eq!(cli.concurrency, Some(50));
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.output, Some(PathBuf::from("out.json")));
        assert!(cli.open_only);
    }

    #[test]
    fn test_conflicting_filters() {
        let res = Cli::try_parse_from(["portsweep", "host", "--open-only", "--show-closed"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_format_display() {
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
        assert_eq!(
            OutputFormat::from_str("JSON", true),
            Ok(OutputFormat::Json)
        );
    }
}
