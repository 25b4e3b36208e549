//! TCP connect probe.
//!
//! Performs one full TCP handshake per port using the operating system's
//! socket API, then optionally reads a greeting. No elevated privileges are
//! needed.

use crate::banner::grab_banner;
use crate::scanner::traits::{ProbeResult, Prober};
use crate::types::Port;
use async_trait::async_trait;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// How a failed connect attempt is classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectFailure {
    /// The peer answered with a reset.
    Refused,
    /// Nothing came back before a timeout (ours or the kernel's).
    TimedOut,
    /// Anything else, with a short machine-readable cause.
    Other(String),
}

/// Map an OS-level connect error onto a port classification.
///
/// This is the only place platform error semantics are interpreted. Anything
/// that is not clearly a refusal or a timeout is reported as `Other` rather
/// than guessed at.
pub fn classify_connect_error(err: &io::Error) -> ConnectFailure {
    match err.kind() {
        // Some stacks surface the handshake RST as a reset instead of a refusal
        io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset => {
            ConnectFailure::Refused
        }
        io::ErrorKind::TimedOut => ConnectFailure::TimedOut,
        io::ErrorKind::NetworkUnreachable => ConnectFailure::Other("network_unreachable".into()),
        io::ErrorKind::HostUnreachable => ConnectFailure::Other("host_unreachable".into()),
        io::ErrorKind::PermissionDenied => ConnectFailure::Other("permission_denied".into()),
        io::ErrorKind::AddrNotAvailable => ConnectFailure::Other("address_not_available".into()),
        io::ErrorKind::AddrInUse => ConnectFailure::Other("address_in_use".into()),
        io::ErrorKind::NetworkDown => ConnectFailure::Other("network_down".into()),
        _ => match err.raw_os_error() {
            Some(code) => ConnectFailure::Other(format!("os_error_{}", code)),
            None => ConnectFailure::Other("io_error".into()),
        },
    }
}

/// Probe a single port: one connect attempt, then an optional banner read.
///
/// The connect is bounded by `connect_timeout`, the banner exchange by
/// `banner_timeout`. When `banner_timeout` is `None` the connection is closed
/// right after the handshake. The socket is dropped on every path.
pub async fn probe_port(
    ip: IpAddr,
    port: Port,
    connect_timeout: Duration,
    banner_timeout: Option<Duration>,
) -> ProbeResult {
    let addr = SocketAddr::new(ip, port.as_u16());

    let mut stream = match timeout(connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            let result = match classify_connect_error(&e) {
                ConnectFailure::Refused => ProbeResult::closed(port),
                ConnectFailure::TimedOut => ProbeResult::filtered(port),
                ConnectFailure::Other(detail) => ProbeResult::error(port, detail),
            };
            tracing::debug!(%addr, status = %result.status, error = %e, "connect failed");
            return result;
        }
        Err(_) => {
            tracing::debug!(%addr, "connect timed out");
            return ProbeResult::filtered(port);
        }
    };

    let banner = match banner_timeout {
        Some(read_timeout) => grab_banner(&mut stream, read_timeout).await,
        None => None,
    };
    drop(stream);

    tracing::debug!(%addr, has_banner = banner.is_some(), "port open");
    ProbeResult::open(port, banner)
}

/// TCP connect prober.
///
/// Holds the per-scan timeouts; each call to [`Prober::probe`] owns its
/// socket from connect to close.
#[derive(Debug, Clone)]
pub struct TcpConnectProbe {
    connect_timeout: Duration,
    banner_timeout: Option<Duration>,
}

impl TcpConnectProbe {
    /// Create a new prober.
    ///
    /// # Arguments
    /// * `connect_timeout` - Bound on the handshake
    /// * `banner_timeout` - Bound on the banner exchange, `None` to skip it
    pub fn new(connect_timeout: Duration, banner_timeout: Option<Duration>) -> Self {
        Self {
            connect_timeout,
            banner_timeout,
        }
    }
}

#[async_trait]
impl Prober for TcpConnectProbe {
    async fn probe(&self, ip: IpAddr, port: Port) -> ProbeResult {
        probe_port(ip, port, self.connect_timeout, self.banner_timeout).await
    }
}
