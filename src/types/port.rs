//! Port types with validation and parsing.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535).
//! `PortRange` and `PortSpec` handle port specifications such as
//! `"22,80,8000-8010"`, and [`expand`] turns one into the ordered,
//! deduplicated port list a scan runs over.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated network port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new Port from a u16, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| PortError::OutOfRange {
            token: value.to_string(),
            value: value.to_string(),
        })
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Error type for port specification parsing.
///
/// Every variant carries the token that caused it so the caller can point
/// at the offending part of the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port {value} in '{token}' is out of valid range (1-65535)")]
    OutOfRange { token: String, value: String },
    #[error("invalid port token: '{0}'")]
    InvalidToken(String),
    #[error("invalid port range '{token}': start ({start}) > end ({end})")]
    ReversedRange { token: String, start: u16, end: u16 },
    #[error("empty port specification")]
    Empty,
}

/// A closed range of ports.
///
/// Serialized in its textual form (`"80"` or `"8000-8010"`) so that
/// deserializing goes through the same checks as parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PortRange {
    start: Port,
    end: Port,
}

impl PortRange {
    /// Create a new port range. `start` must not exceed `end`.
    pub fn new(start: Port, end: Port) -> Result<Self, PortError> {
        if start > end {
            Err(PortError::ReversedRange {
                token: format!("{}-{}", start, end),
                start: start.0,
                end: end.0,
            })
        } else {
            Ok(Self { start, end })
        }
    }

    /// Create a range containing a single port.
    pub const fn single(port: Port) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    /// Get the number of ports in this range.
    pub const fn len(&self) -> usize {
        (self.end.0 - self.start.0) as usize + 1
    }

    /// A valid range always holds at least one port.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over all ports in this range.
    pub fn iter(&self) -> impl Iterator<Item = Port> {
        (self.start.0..=self.end.0).map(Port)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

impl TryFrom<String> for PortRange {
    type Error = PortError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_token(value.trim())
    }
}

impl From<PortRange> for String {
    fn from(range: PortRange) -> Self {
        range.to_string()
    }
}

/// A port specification made of one or more ranges.
///
/// Supports formats like:
/// - Single port: "80"
/// - Comma-separated: "80,443,8080"
/// - Range: "1-1000"
/// - Mixed: "22,80,443,8000-9000"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PortSpec {
    ranges: Vec<PortRange>,
}

impl PortSpec {
    /// Create an empty port specification.
    pub const fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Add a port range to the specification.
    pub fn add_range(&mut self, range: PortRange) {
        self.ranges.push(range);
    }

    /// Get all ports as a sorted, deduplicated vector.
    pub fn to_ports(&self) -> Vec<Port> {
        let mut ports: Vec<Port> = self.ranges.iter().flat_map(|r| r.iter()).collect();
        ports.sort_unstable();
        ports.dedup();
        ports
    }

    /// Get the total number of unique ports.
    pub fn count(&self) -> usize {
        self.to_ports().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl FromStr for PortSpec {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PortError::Empty);
        }

        let mut spec = Self::new();
        for token in s.split(',') {
            spec.add_range(parse_token(token.trim())?);
        }

        Ok(spec)
    }
}

impl TryFrom<String> for PortSpec {
    type Error = PortError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PortSpec> for String {
    fn from(spec: PortSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.ranges.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Parse one comma-separated token: either `N` or `A-B`.
fn parse_token(token: &str) -> Result<PortRange, PortError> {
    match token.split_once('-') {
        Some((start, end)) => {
            let start = parse_bound(token, start)?;
            let end = parse_bound(token, end)?;
            if start > end {
                return Err(PortError::ReversedRange {
                    token: token.to_string(),
                    start: start.0,
                    end: end.0,
                });
            }
            Ok(PortRange { start, end })
        }
        None => parse_bound(token, token).map(PortRange::single),
    }
}

/// Parse one numeric bound, reporting failures against the whole token.
///
/// Any all-digit bound that is not a valid port (`0`, `70000`, or something
/// too long for any integer type) is out of range and keeps its text as typed.
fn parse_bound(token: &str, raw: &str) -> Result<Port, PortError> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PortError::InvalidToken(token.to_string()));
    }

    raw.parse::<u16>()
        .ok()
        .and_then(Port::new)
        .ok_or_else(|| PortError::OutOfRange {
            token: token.to_string(),
            value: raw.to_string(),
        })
}

/// Expand a port specification string into an ascending, deduplicated list.
pub fn expand(spec: &str) -> Result<Vec<Port>, PortError> {
    let ports = spec.parse::<PortSpec>()?.to_ports();
    if ports.is_empty() {
        return Err(PortError::Empty);
    }
    Ok(ports)
}
