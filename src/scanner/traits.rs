//! Probe trait abstraction.
//!
//! Defines the per-port result model and the `Prober` seam the scheduler
//! drives, so the scheduler can be exercised without real sockets.

use crate::types::Port;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Status of a scanned port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortStatus {
    /// Connection established (service listening).
    Open,
    /// Connection actively refused (RST received).
    Closed,
    /// No response within the connect timeout.
    Filtered,
    /// Any other OS-level failure; see `error_detail`.
    Error,
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Filtered => write!(f, "filtered"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Result of probing a single port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// The port number that was probed.
    pub port: Port,
    /// Status determined by the probe.
    pub status: PortStatus,
    /// Greeting captured from the service. Only set for open ports.
    pub banner: Option<String>,
    /// Service name, filled in during aggregation for open ports.
    pub service: Option<String>,
    /// Short machine-readable cause when `status` is `Error`.
    pub error_detail: Option<String>,
}

impl ProbeResult {
    fn with_status(port: Port, status: PortStatus) -> Self {
        Self {
            port,
            status,
            banner: None,
            service: None,
            error_detail: None,
        }
    }

    /// An open port, with whatever banner the service offered.
    pub fn open(port: Port, banner: Option<String>) -> Self {
        Self {
            banner,
            ..Self::with_status(port, PortStatus::Open)
        }
    }

    /// A port whose connection was refused.
    pub fn closed(port: Port) -> Self {
        Self::with_status(port, PortStatus::Closed)
    }

    /// A port that never answered.
    pub fn filtered(port: Port) -> Self {
        Self::with_status(port, PortStatus::Filtered)
    }

    /// A port whose probe failed for another reason.
    pub fn error(port: Port, detail: impl Into<String>) -> Self {
        Self {
            error_detail: Some(detail.into()),
            ..Self::with_status(port, PortStatus::Error)
        }
    }

    /// Set the service name.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Check if the port is open.
    pub fn is_open(&self) -> bool {
        self.status == PortStatus::Open
    }
}

/// A single-port probe implementation.
///
/// Implementations own their timeouts and must release any socket they
/// open before returning. `probe` never fails: every outcome is a
/// [`ProbeResult`].
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe one port on `ip`.
    async fn probe(&self, ip: IpAddr, port: Port) -> ProbeResult;
}
