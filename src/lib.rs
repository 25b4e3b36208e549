//! # portsweep - A Concurrent TCP Connect Port Scanner
//!
//! portsweep turns a target, a port set and a timing budget into an ordered,
//! classified list of per-port results.
//!
//! ## Features
//!
//! - **Bounded Concurrency**: never more than `concurrency` probes in flight
//! - **Independent Timeouts**: separate bounds for connect and banner phases
//! - **Consistent Classification**: refused, dropped and unreachable are told apart
//! - **Banner Capture**: sanitised service greetings on open ports
//! - **Cancellation**: Ctrl-C stops dispatch and reports what finished
//! - **Multiple Output Formats**: Plain text, JSON, and CSV
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use portsweep::scanner::{build_request, run_scan, ScanOptions};
//! use portsweep::services::ServiceTable;
//! use portsweep::types::TargetResolver;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), portsweep::ScanError> {
//!     let resolver = TargetResolver::new();
//!     let request = build_request(&resolver, "127.0.0.1", "22,80,8000-8100", ScanOptions::default()).await?;
//!
//!     let report = run_scan(&request, &ServiceTable::default(), CancellationToken::new(), None).await;
//!     for result in report.results.iter().filter(|r| r.is_open()) {
//!         println!("{} {}", result.port, result.service.as_deref().unwrap_or("-"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Ports, port specifications and target resolution
//! - [`scanner`] - Request validation, the TCP probe, scheduler and aggregation
//! - [`banner`] - Banner read and sanitising
//! - [`services`] - Service-name classification
//! - [`storage`] - The JSON report document
//! - [`config`] - Settings file
//! - [`error`] - Error types
//! - [`output`] - Output formatting utilities

pub mod banner;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod services;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ScanError};
pub use scanner::{PortStatus, ProbeResult, ScanReport, ScanRequest};
pub use types::{Port, PortSpec, ScanTarget, TargetResolver};
