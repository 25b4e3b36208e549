//! JSON report document.
//!
//! The on-disk and `--format json` shape of a report:
//!
//! ```json
//! {
//!   "scan_info": {
//!     "target": "scanme.example",
//!     "ip": "192.0.2.10",
//!     "timestamp": "2026-10-19T08:30:00Z",
//!     "total_ports_scanned": 1000,
//!     "duration": 3.412
//!   },
//!   "results": [
//!     { "port": 22, "status": "open", "service": "ssh", "banner": "SSH-2.0-OpenSSH_9.6" }
//!   ]
//! }
//! ```

use crate::error::{StorageError, StorageResult};
use crate::scanner::{DisplayFilter, PortStatus, ProbeResult, ScanReport};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::fs;
use std::net::IpAddr;
use std::path::Path;

/// Top-level JSON document.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub scan_info: ScanInfo<'a>,
    pub results: Vec<ResultRecord<'a>>,
}

/// Scan metadata block.
#[derive(Debug, Serialize)]
pub struct ScanInfo<'a> {
    pub target: &'a str,
    pub ip: IpAddr,
    #[serde(serialize_with = "rfc3339")]
    pub timestamp: DateTime<Utc>,
    pub total_ports_scanned: usize,
    #[serde(serialize_with = "millis_precision")]
    pub duration: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
}

/// One per-port record.
#[derive(Debug, Serialize)]
pub struct ResultRecord<'a> {
    pub port: u16,
    pub status: PortStatus,
    pub service: Option<&'a str>,
    pub banner: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<&'a str>,
}

impl<'a> From<&'a ProbeResult> for ResultRecord<'a> {
    fn from(result: &'a ProbeResult) -> Self {
        Self {
            port: result.port.as_u16(),
            status: result.status,
            service: result.service.as_deref(),
            banner: result.banner.as_deref(),
            error_detail: result.error_detail.as_deref(),
        }
    }
}

impl<'a> ReportDocument<'a> {
    /// Build the document for `report`, keeping only results that pass `filter`.
    pub fn new(report: &'a ScanReport, filter: DisplayFilter) -> Self {
        Self {
            scan_info: ScanInfo {
                target: &report.target,
                ip: report.resolved_ip,
                timestamp: report.started_at,
                total_ports_scanned: report.total_ports_scanned,
                duration: report.duration,
                cancelled: report.cancelled,
            },
            results: report.visible(filter).map(ResultRecord::from).collect(),
        }
    }

    /// Pretty-printed JSON text.
    pub fn to_json_pretty(&self) -> StorageResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn rfc3339<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn millis_precision<S: Serializer>(secs: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((secs * 1000.0).round() / 1000.0)
}

/// Write the JSON document for `report` to `path`.
pub fn save_report(path: &Path, report: &ScanReport, filter: DisplayFilter) -> StorageResult<()> {
    let content = ReportDocument::new(report, filter).to_json_pretty()?;

    fs::write(path, content + "\n").map_err(|e| StorageError::SaveFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    tracing::info!(path = %path.display(), "report written");
    Ok(())
}
