//! Validated scan request.
//!
//! A `ScanRequest` is built once, checked up front, and never changes while
//! the scan runs. Anything wrong with it is a fatal [`ScanError`].

use crate::error::{ScanError, ScanResult};
use crate::types::{Port, ScanTarget};
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Timing and concurrency knobs for a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    /// Bound on each connect attempt.
    pub connect_timeout: Duration,
    /// Bound on each banner exchange.
    pub banner_timeout: Duration,
    /// Whether to attempt banner capture on open ports.
    pub grab_banners: bool,
    /// Maximum probes in flight at once.
    pub concurrency: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(1),
            banner_timeout: Duration::from_secs(1),
            grab_banners: true,
            concurrency: 100,
        }
    }
}

impl ScanOptions {
    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the banner timeout.
    pub fn with_banner_timeout(mut self, timeout: Duration) -> Self {
        self.banner_timeout = timeout;
        self
    }

    /// Skip the banner phase entirely.
    pub fn without_banners(mut self) -> Self {
        self.grab_banners = false;
        self
    }

    /// Set the concurrency limit.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// Convert a user-supplied seconds value into a `Duration`.
pub fn duration_from_secs(name: &str, secs: f64) -> ScanResult<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        ScanError::InvalidConfig(format!(
            "{} must be a non-negative number of seconds, got {}",
            name, secs
        ))
    })
}

/// An immutable, validated scan request.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    target: ScanTarget,
    ports: Vec<Port>,
    options: ScanOptions,
}

impl ScanRequest {
    /// Build a request, enforcing its invariants.
    ///
    /// `ports` is sorted and deduplicated here so callers holding an
    /// arbitrary list still get the one-probe-per-port guarantee.
    pub fn new(target: ScanTarget, mut ports: Vec<Port>, options: ScanOptions) -> ScanResult<Self> {
        ports.sort_unstable();
        ports.dedup();

        if ports.is_empty() {
            return Err(ScanError::InvalidConfig("no ports to scan".to_string()));
        }
        if options.concurrency == 0 {
            return Err(ScanError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if options.concurrency > Semaphore::MAX_PERMITS {
            return Err(ScanError::InvalidConfig(format!(
                "concurrency must be at most {}, got {}",
                Semaphore::MAX_PERMITS,
                options.concurrency
            )));
        }
        if options.connect_timeout.is_zero() {
            return Err(ScanError::InvalidConfig(
                "connect timeout must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            target,
            ports,
            options,
        })
    }

    /// The target as given plus its resolved address.
    pub fn target(&self) -> &ScanTarget {
        &self.target
    }

    /// The resolved address probes connect to.
    pub fn ip(&self) -> IpAddr {
        self.target.ip
    }

    /// Ports to probe, ascending and unique.
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    /// Timing and concurrency settings.
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Banner bound, or `None` when banner capture is off.
    pub fn banner_timeout(&self) -> Option<Duration> {
        self.options
            .grab_banners
            .then_some(self.options.banner_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn target() -> ScanTarget {
        ScanTarget::new("localhost", IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    fn ports(raw: &[u16]) -> Vec<Port> {
        raw.iter().filter_map(|&p| Port::new(p)).collect()
    }

    #[test]
    fn test_request_normalizes_ports() {
        let request =
            ScanRequest::new(target(), ports(&[443, 22, 80, 22]), ScanOptions::default()).unwrap();
        let raw: Vec<u16> = request.ports().iter().map(|p| p.as_u16()).collect();
        assert_eq!(raw, vec![22, 80, 443]);
        assert_eq!(request.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn test_request_rejects_empty_ports() {
        let err = ScanRequest::new(target(), Vec::new(), ScanOptions::default()).unwrap_err();
        assert!(matches!(err, ScanError::InvalidConfig(_)));
    }

    #[test]
    fn test_request_rejects_zero_concurrency() {
        let options = ScanOptions::default().with_concurrency(0);
        assert!(ScanRequest::new(target(), ports(&[80]), options).is_err());
    }

    #[test]
    fn test_request_rejects_oversized_concurrency() {
        let options = ScanOptions::default().with_concurrency(usize::MAX);
        let err = ScanRequest::new(target(), ports(&[80]), options).unwrap_err();
        assert!(matches!(err, ScanError::InvalidConfig(_)));

        let options = ScanOptions::default().with_concurrency(Semaphore::MAX_PERMITS);
        assert!(ScanRequest::new(target(), ports(&[80]), options).is_ok());
    }

    #[test]
    fn test_request_rejects_zero_connect_timeout() {
        let options = ScanOptions::default().with_connect_timeout(Duration::ZERO);
        assert!(ScanRequest::new(target(), ports(&[80]), options).is_err());
    }

    #[test]
    fn test_banner_timeout_toggle() {
        let options = ScanOptions::default().with_banner_timeout(Duration::from_millis(250));
        let request = ScanRequest::new(target(), ports(&[80]), options.clone()).unwrap();
        assert_eq!(request.banner_timeout(), Some(Duration::from_millis(250)));

        let request = ScanRequest::new(target(), ports(&[80]), options.without_banners()).unwrap();
        assert_eq!(request.banner_timeout(), None);
    }

    #[test]
    fn test_duration_from_secs() {
        assert_eq!(
            duration_from_secs("timeout", 1.5).unwrap(),
            Duration::from_millis(1500)
        );
        assert!(duration_from_secs("timeout", -1.0).is_err());
        assert!(duration_from_secs("timeout", f64::NAN).is_err());
    }
}
