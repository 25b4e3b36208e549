//! Target resolution.
//!
//! A scan runs against exactly one address. The user supplies either an
//! IP literal (used as-is, no network traffic) or a hostname, which is
//! resolved with a single forward lookup. When a name has both IPv4 and
//! IPv6 records the first IPv4 address wins.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use trust_dns_resolver::config::{LookupIpStrategy, ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// A scan target that has been resolved to an IP address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanTarget {
    /// The original input (hostname or IP string).
    pub original: String,
    /// The resolved IP address.
    pub ip: IpAddr,
}

impl ScanTarget {
    /// Create a new scan target.
    pub fn new(original: impl Into<String>, ip: IpAddr) -> Self {
        Self {
            original: original.into(),
            ip,
        }
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.original == self.ip.to_string() {
            write!(f, "{}", self.ip)
        } else {
            write!(f, "{} ({})", self.original, self.ip)
        }
    }
}

/// Error type for target parsing and resolution.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TargetError {
    #[error("invalid target format: '{0}'")]
    InvalidFormat(String),
    #[error("failed to resolve hostname '{0}': {1}")]
    DnsResolutionFailed(String, String),
    #[error("no IP addresses found for hostname '{0}'")]
    NoAddressesFound(String),
}

/// Resolves user input to a single [`ScanTarget`].
pub struct TargetResolver {
    resolver: TokioAsyncResolver,
}

impl TargetResolver {
    /// Create a resolver that asks for IPv4 records before IPv6 ones.
    pub fn new() -> Self {
        let mut opts = ResolverOpts::default();
        opts.ip_strategy = LookupIpStrategy::Ipv4thenIpv6;

        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
        }
    }

    /// Resolve a hostname or IP literal.
    ///
    /// IP literals short-circuit without touching the network. Hostnames get
    /// exactly one lookup; failure is fatal for the scan.
    pub async fn resolve(&self, input: &str) -> Result<ScanTarget, TargetError> {
        let input = input.trim();

        if let Some(ip) = parse_ip_literal(input) {
            return Ok(ScanTarget::new(input, ip));
        }

        if !is_valid_hostname(input) {
            return Err(TargetError::InvalidFormat(input.to_string()));
        }

        let response = self
            .resolver
            .lookup_ip(input)
            .await
            .map_err(|e| TargetError::DnsResolutionFailed(input.to_string(), e.to_string()))?;

        let ip = pick_preferred(response.iter())
            .ok_or_else(|| TargetError::NoAddressesFound(input.to_string()))?;

        tracing::debug!(host = input, %ip, "resolved target");
        Ok(ScanTarget::new(input, ip))
    }
}

impl Default for TargetResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an IP literal, accepting bracketed IPv6 (`[::1]`) as well.
fn parse_ip_literal(input: &str) -> Option<IpAddr> {
    let unbracketed = input
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(input);
    unbracketed.parse().ok()
}

/// Pick the first IPv4 address, falling back to the first address of any family.
fn pick_preferred(addrs: impl IntoIterator<Item = IpAddr>) -> Option<IpAddr> {
    let mut fallback = None;
    for ip in addrs {
        if ip.is_ipv4() {
            return Some(ip);
        }
        fallback.get_or_insert(ip);
    }
    fallback
}

/// Check if a string is a valid hostname.
fn is_valid_hostname(s: &str) -> bool {
    let s = s.strip_suffix('.').unwrap_or(s);
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    // Each label: 1-63 chars, alphanumeric at both ends, hyphens inside
    s.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && label.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
            && label.chars().last().is_some_and(|c| c.is_ascii_alphanumeric())
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
