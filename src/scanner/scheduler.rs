//! Bounded-concurrency scan scheduler.
//!
//! Dispatches one probe per port while never holding more than
//! `concurrency` probes in flight. A semaphore permit is taken *before* a
//! probe task is spawned and released only when that probe has closed its
//! socket, so dispatch stalls whenever the pool is saturated.

use crate::scanner::request::ScanRequest;
use crate::scanner::traits::{PortStatus, ProbeResult, Prober};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use indicatif::ProgressBar;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Unordered probe output plus the timing the aggregator needs.
#[derive(Debug, Clone)]
pub struct RawScan {
    /// Wall-clock time the first dispatch happened.
    pub started_at: DateTime<Utc>,
    /// Time from scheduler start to the last probe completion.
    pub elapsed: Duration,
    /// One result per dispatched port, in completion order.
    pub results: Vec<ProbeResult>,
    /// Set when dispatch stopped early because of cancellation.
    pub cancelled: bool,
}

/// Drives a [`Prober`] over every port of a request.
pub struct ScanScheduler {
    prober: Arc<dyn Prober>,
    cancel: CancellationToken,
    progress: Option<ProgressBar>,
}

impl ScanScheduler {
    /// Create a scheduler around a prober.
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self {
            prober,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Use an externally owned cancellation signal.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Report progress on the given bar.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run every port of `request` through the prober.
    ///
    /// Cancellation stops new dispatch; probes already in flight run to
    /// their own timeouts and their results are kept.
    pub async fn run(&self, request: &ScanRequest) -> RawScan {
        let ip = request.ip();
        // More permits than ports would never be used
        let concurrency = request.options().concurrency.min(request.ports().len());
        let semaphore = Arc::new(Semaphore::new(concurrency));

        let started_at = Utc::now();
        let start = Instant::now();
        let mut last_completion = start;

        let mut tasks: JoinSet<(ProbeResult, Instant)> = JoinSet::new();
        let mut results = Vec::with_capacity(request.ports().len());
        let mut cancelled = false;

        tracing::info!(
            host = %request.target(),
            ports = request.ports().len(),
            concurrency,
            "scan started"
        );

        for &port in request.ports() {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    // The semaphore is never closed while we hold it
                    Err(_) => break,
                },
            };

            // Reap whatever finished while we waited for the slot
            while let Some(joined) = tasks.try_join_next() {
                self.collect(joined, &mut results, &mut last_completion);
            }

            let prober = Arc::clone(&self.prober);
            tasks.spawn(async move {
                let result = AssertUnwindSafe(prober.probe(ip, port))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        tracing::error!(%port, "probe panicked");
                        ProbeResult::error(port, "probe_panicked")
                    });
                let finished = Instant::now();
                drop(permit);
                (result, finished)
            });
        }

        if cancelled {
            tracing::warn!(
                dispatched = results.len() + tasks.len(),
                total = request.ports().len(),
                "scan cancelled, waiting for in-flight probes"
            );
        }

        while let Some(joined) = tasks.join_next().await {
            self.collect(joined, &mut results, &mut last_completion);
        }

        let elapsed = last_completion.duration_since(start);
        tracing::info!(
            probed = results.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            cancelled,
            "scan finished"
        );

        RawScan {
            started_at,
            elapsed,
            results,
            cancelled,
        }
    }

    fn collect(
        &self,
        joined: Result<(ProbeResult, Instant), JoinError>,
        results: &mut Vec<ProbeResult>,
        last_completion: &mut Instant,
    ) {
        match joined {
            Ok((result, finished)) => {
                *last_completion = (*last_completion).max(finished);
                if let Some(ref pb) = self.progress {
                    pb.inc(1);
                    if result.status == PortStatus::Open {
                        pb.set_message(format!("Found open port: {}", result.port));
                    }
                }
                results.push(result);
            }
            // Only reachable if the runtime shuts down under us
            Err(e) => tracing::error!(error = %e, "probe task failed"),
        }
    }
}
