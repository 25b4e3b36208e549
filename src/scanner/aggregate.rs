//! Result aggregation.
//!
//! Turns the scheduler's unordered output into a port-ordered
//! [`ScanReport`], attaching service names to open ports.

use crate::scanner::request::ScanRequest;
use crate::scanner::scheduler::RawScan;
use crate::scanner::traits::{PortStatus, ProbeResult};
use crate::services::ServiceClassifier;
use chrono::{DateTime, Utc};
use std::net::IpAddr;

/// Per-status tallies over the full result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortCounts {
    pub open: usize,
    pub closed: usize,
    pub filtered: usize,
    pub error: usize,
}

impl PortCounts {
    fn tally(results: &[ProbeResult]) -> Self {
        results.iter().fold(Self::default(), |mut counts, r| {
            match r.status {
                PortStatus::Open => counts.open += 1,
                PortStatus::Closed => counts.closed += 1,
                PortStatus::Filtered => counts.filtered += 1,
                PortStatus::Error => counts.error += 1,
            }
            counts
        })
    }
}

/// Which results a renderer should show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayFilter {
    /// Every classified port.
    All,
    /// Everything except closed ports.
    #[default]
    HideClosed,
    /// Open ports only.
    OpenOnly,
}

impl DisplayFilter {
    /// Pick a filter from the two command-line switches.
    pub fn from_flags(open_only: bool, show_closed: bool) -> Self {
        if open_only {
            Self::OpenOnly
        } else if show_closed {
            Self::All
        } else {
            Self::HideClosed
        }
    }

    /// Whether a result passes this filter.
    pub fn accepts(self, result: &ProbeResult) -> bool {
        match self {
            Self::All => true,
            Self::HideClosed => result.status != PortStatus::Closed,
            Self::OpenOnly => result.status == PortStatus::Open,
        }
    }
}

/// The finished, port-ordered report for one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    /// Target as the user gave it.
    pub target: String,
    /// Address that was probed.
    pub resolved_ip: IpAddr,
    /// When dispatch began.
    pub started_at: DateTime<Utc>,
    /// Seconds from scheduler start to the last probe completion.
    pub duration: f64,
    /// Number of ports in the request, regardless of display filtering.
    pub total_ports_scanned: usize,
    /// Per-status tallies.
    pub counts: PortCounts,
    /// True when the scan was interrupted before every port was dispatched.
    pub cancelled: bool,
    /// One entry per probed port, ascending.
    pub results: Vec<ProbeResult>,
}

impl ScanReport {
    /// Results that pass `filter`, still in port order.
    pub fn visible(&self, filter: DisplayFilter) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(move |r| filter.accepts(r))
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}) - {} open, {} closed, {} filtered, {} error [{:.2}s]",
            self.target,
            self.resolved_ip,
            self.counts.open,
            self.counts.closed,
            self.counts.filtered,
            self.counts.error,
            self.duration
        )
    }
}

/// Merge raw probe output into a report.
///
/// Deterministic for a given input: the same `raw` always yields the same
/// report, independent of completion order.
pub fn aggregate(
    request: &ScanRequest,
    raw: RawScan,
    classifier: &dyn ServiceClassifier,
) -> ScanReport {
    let mut results: Vec<ProbeResult> = raw
        .results
        .into_iter()
        .map(|result| {
            if result.is_open() {
                let service = classifier.classify(result.port.as_u16(), result.banner.as_deref());
                result.with_service(service)
            } else {
                result
            }
        })
        .collect();
    results.sort_by_key(|r| r.port);

    let counts = PortCounts::tally(&results);
    tracing::debug!(
        open = counts.open,
        closed = counts.closed,
        filtered = counts.filtered,
        error = counts.error,
        "aggregated results"
    );

    ScanReport {
        target: request.target().original.clone(),
        resolved_ip: request.ip(),
        started_at: raw.started_at,
        duration: raw.elapsed.as_secs_f64(),
        total_ports_scanned: request.ports().len(),
        counts,
        cancelled: raw.cancelled,
        results,
    }
}
