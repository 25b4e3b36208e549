//! Scanner module - the concurrent probing engine.
//!
//! The pipeline is resolve, expand, schedule, aggregate:
//!
//! - [`request`] validates the target, ports and timing into a `ScanRequest`
//! - [`tcp`] probes a single port (connect plus optional banner)
//! - [`scheduler`] runs probes with bounded concurrency
//! - [`aggregate`] orders results and attaches service names

pub mod aggregate;
pub mod request;
pub mod scheduler;
pub mod tcp;
pub mod traits;

pub use aggregate::{aggregate, DisplayFilter, PortCounts, ScanReport};
pub use request::{duration_from_secs, ScanOptions, ScanRequest};
pub use scheduler::{RawScan, ScanScheduler};
pub use tcp::{classify_connect_error, probe_port, ConnectFailure, TcpConnectProbe};
pub use traits::{PortStatus, ProbeResult, Prober};

use crate::error::ScanResult;
use crate::services::ServiceClassifier;
use crate::types::{expand, TargetResolver};
use indicatif::ProgressBar;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Build a validated request from raw user input.
///
/// Resolution and port parsing both happen here, so every fatal error is
/// raised before a single packet leaves.
pub async fn build_request(
    resolver: &TargetResolver,
    target: &str,
    ports: &str,
    options: ScanOptions,
) -> ScanResult<ScanRequest> {
    let ports = expand(ports)?;
    let target = resolver.resolve(target).await?;
    ScanRequest::new(target, ports, options)
}

/// Run a TCP connect scan for `request` and aggregate the results.
pub async fn run_scan(
    request: &ScanRequest,
    classifier: &dyn ServiceClassifier,
    cancel: CancellationToken,
    progress: Option<ProgressBar>,
) -> ScanReport {
    let prober = TcpConnectProbe::new(request.options().connect_timeout, request.banner_timeout());
    let mut scheduler = ScanScheduler::new(Arc::new(prober)).with_cancel(cancel);
    if let Some(pb) = progress {
        scheduler = scheduler.with_progress(pb);
    }

    let raw = scheduler.run(request).await;
    let report = aggregate(request, raw, classifier);
    tracing::info!(summary = %report.summary(), "scan complete");
    report
}
