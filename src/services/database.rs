//! Port-to-service database with an on-disk cache.
//!
//! Sources are tried in order:
//!
//! 1. the JSON cache, when it exists and is younger than the expiry age
//! 2. an IANA "Service Name and Transport Protocol Port Number Registry" CSV
//!    export, which also rewrites the cache
//! 3. the built-in well-known table
//!
//! A failing source is logged and skipped; loading itself never fails.

use super::well_known;
use crate::error::{ServiceDbError, ServiceDbResult};
use crate::types::PortRange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Cache lifetime used unless configured otherwise.
pub const DEFAULT_CACHE_DAYS: u64 = 30;

const SECS_PER_DAY: u64 = 24 * 60 * 60;
const IANA_SOURCE: &str = "IANA Service Names and Port Numbers";

/// Where a loaded table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceSource {
    Cache,
    Iana,
    BuiltIn,
}

/// Describes where service names may be loaded from.
#[derive(Debug, Clone)]
pub struct ServiceDatabase {
    cache_file: Option<PathBuf>,
    iana_csv: Option<PathBuf>,
    max_age: Duration,
}

impl Default for ServiceDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceDatabase {
    /// No cache and no CSV: loading yields the built-in table.
    pub fn new() -> Self {
        Self {
            cache_file: None,
            iana_csv: None,
            max_age: Duration::from_secs(DEFAULT_CACHE_DAYS * SECS_PER_DAY),
        }
    }

    /// Read and refresh the JSON cache at `path`.
    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_file = Some(path.into());
        self
    }

    /// Refresh from the IANA CSV export at `path` when the cache is unusable.
    pub fn with_iana_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.iana_csv = Some(path.into());
        self
    }

    /// Treat caches older than `max_age` as expired.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Cache age limit in whole days.
    pub fn with_max_age_days(self, days: u64) -> Self {
        self.with_max_age(Duration::from_secs(days.saturating_mul(SECS_PER_DAY)))
    }

    /// Load the port table from the first source that works.
    pub fn load(&self) -> (HashMap<u16, String>, ServiceSource) {
        if let Some(cache) = self.cache_file.as_deref().filter(|p| self.is_fresh(p)) {
            match read_cache(cache) {
                Ok(ports) => return (ports, ServiceSource::Cache),
                Err(e) => tracing::warn!(error = %e, "ignoring service cache"),
            }
        }

        if let Some(csv_path) = self.iana_csv.as_deref() {
            match read_iana_csv(csv_path) {
                Ok(ports) => {
                    if let Some(cache) = self.cache_file.as_deref() {
                        if let Err(e) = write_cache(cache, &ports, self.max_age) {
                            tracing::warn!(error = %e, "could not refresh service cache");
                        }
                    }
                    return (ports, ServiceSource::Iana);
                }
                Err(e) => tracing::warn!(error = %e, "ignoring IANA service export"),
            }
        }

        (well_known(), ServiceSource::BuiltIn)
    }

    fn is_fresh(&self, path: &Path) -> bool {
        fs::metadata(path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .is_some_and(|age| age < self.max_age)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    metadata: Option<CacheMetadata>,
    ports: BTreeMap<u16, String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheMetadata {
    created: DateTime<Utc>,
    source: String,
    total_services: usize,
    cache_expiry_days: u64,
}

fn read_cache(path: &Path) -> ServiceDbResult<HashMap<u16, String>> {
    let content = fs::read_to_string(path).map_err(|e| ServiceDbError::ReadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let cache: CacheFile =
        serde_json::from_str(&content).map_err(|e| ServiceDbError::InvalidFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if cache.ports.is_empty() {
        return Err(ServiceDbError::Empty(path.to_path_buf()));
    }
    if let Some(meta) = &cache.metadata {
        tracing::debug!(created = %meta.created, source = %meta.source, "using service cache");
    }

    Ok(cache.ports.into_iter().collect())
}

fn write_cache(path: &Path, ports: &HashMap<u16, String>, max_age: Duration) -> ServiceDbResult<()> {
    let write_failed = |e: std::io::Error| ServiceDbError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let cache = CacheFile {
        metadata: Some(CacheMetadata {
            created: Utc::now(),
            source: IANA_SOURCE.to_string(),
            total_services: ports.len(),
            cache_expiry_days: max_age.as_secs() / SECS_PER_DAY,
        }),
        ports: ports.iter().map(|(&port, name)| (port, name.clone())).collect(),
    };
    let content = serde_json::to_string_pretty(&cache).map_err(|e| ServiceDbError::InvalidFormat {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(write_failed)?;
    }
    fs::write(path, content).map_err(write_failed)?;

    tracing::debug!(path = %path.display(), entries = ports.len(), "service cache written");
    Ok(())
}

/// Parse the TCP rows of an IANA registry export.
///
/// Rows without a service name (reserved or unassigned) and non-TCP rows
/// are skipped. Port ranges such as `6000-6063` apply to every port in
/// them. The first name listed for a port wins.
fn read_iana_csv(path: &Path) -> ServiceDbResult<HashMap<u16, String>> {
    let invalid = |reason: String| ServiceDbError::InvalidFormat {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| ServiceDbError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let headers = reader.headers().map_err(|e| invalid(e.to_string()))?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| invalid(format!("missing '{}' column", name)))
    };
    let name_col = column("Service Name")?;
    let port_col = column("Port Number")?;
    let proto_col = column("Transport Protocol")?;

    let mut ports = HashMap::new();
    for record in reader.records() {
        let record = record.map_err(|e| invalid(e.to_string()))?;

        let name = record.get(name_col).unwrap_or_default().trim();
        let proto = record.get(proto_col).unwrap_or_default().trim();
        if name.is_empty() || !proto.eq_ignore_ascii_case("tcp") {
            continue;
        }

        let Some(range) = record
            .get(port_col)
            .and_then(|field| PortRange::try_from(field.to_string()).ok())
        else {
            continue;
        };
        for port in range.iter() {
            ports
                .entry(port.as_u16())
                .or_insert_with(|| name.to_string());
        }
    }

    if ports.is_empty() {
        return Err(ServiceDbError::Empty(path.to_path_buf()));
    }
    Ok(ports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::SystemTime;

    const IANA_SAMPLE: &str = "\
Service Name,Port Number,Transport Protocol,Description,Assignee,Contact,Registration Date,Modification Date,Reference,Service Code,Unauthorized Use Reported,Assignment Notes
,0,tcp,Reserved,,,,,,,,
ssh,22,tcp,The Secure Shell (SSH) Protocol,,,,,,,,
ssh,22,udp,The Secure Shell (SSH) Protocol,,,,,,,,
domain,53,udp,Domain Name Server,,,,,,,,
http,80,tcp,World Wide Web HTTP,,,,,,,,
www,80,tcp,World Wide Web HTTP,,,,,,,,
x11,6000-6002,tcp,X Window System,,,,,,,,
,7777,,Unassigned,,,,,,,,
";

    fn write_sample(dir: &Path) -> PathBuf {
        let path = dir.join("service-names-port-numbers.csv");
        fs::write(&path, IANA_SAMPLE).unwrap();
        path
    }

    fn age(path: &Path, days: u64) {
        let then = SystemTime::now() - Duration::from_secs(days * SECS_PER_DAY);
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(then)
            .unwrap();
    }

    #[test]
    fn test_iana_csv_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let ports = read_iana_csv(&write_sample(dir.path())).unwrap();

        assert_eq!(ports.len(), 5);
        assert_eq!(ports.get(&22).map(String::as_str), Some("ssh"));
        assert_eq!(ports.get(&80).map(String::as_str), Some("http"));
        assert_eq!(ports.get(&6001).map(String::as_str), Some("x11"));
        assert!(!ports.contains_key(&53));
        assert!(!ports.contains_key(&0));
    }

    #[test]
    fn test_iana_csv_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "name,port\nssh,22\n").unwrap();

        let err = read_iana_csv(&path).unwrap_err();
        assert!(matches!(err, ServiceDbError::InvalidFormat { .. }));
    }

    #[test]
    fn test_csv_refreshes_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache").join("services.json");
        let db = ServiceDatabase::new()
            .with_cache_file(&cache)
            .with_iana_csv(write_sample(dir.path()));

        let (ports, source) = db.load();
        assert_eq!(source, ServiceSource::Iana);
        assert_eq!(ports.len(), 5);

        let written: CacheFile =
            serde_json::from_str(&fs::read_to_string(&cache).unwrap()).unwrap();
        let meta = written.metadata.unwrap();
        assert_eq!(meta.source, IANA_SOURCE);
        assert_eq!(meta.total_services, 5);
        assert_eq!(meta.cache_expiry_days, DEFAULT_CACHE_DAYS);

        // Second load is served from the fresh cache
        let (cached, source) = db.load();
        assert_eq!(source, ServiceSource::Cache);
        assert_eq!(cached, ports);
    }

    #[test]
    fn test_fresh_cache_wins_over_csv() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("services.json");
        fs::write(&cache, r#"{ "ports": { "2222": "custom-ssh" } }"#).unwrap();

        let db = ServiceDatabase::new()
            .with_cache_file(&cache)
            .with_iana_csv(write_sample(dir.path()));

        let (ports, source) = db.load();
        assert_eq!(source, ServiceSource::Cache);
        assert_eq!(ports.get(&2222).map(String::as_str), Some("custom-ssh"));
        assert_eq!(ports.len(), 1);
    }

    #[test]
    fn test_expired_cache_is_refreshed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("services.json");
        fs::write(&cache, r#"{ "ports": { "2222": "stale" } }"#).unwrap();
        age(&cache, DEFAULT_CACHE_DAYS + 1);

        let db = ServiceDatabase::new()
            .with_cache_file(&cache)
            .with_iana_csv(write_sample(dir.path()));

        let (ports, source) = db.load();
        assert_eq!(source, ServiceSource::Iana);
        assert!(!ports.contains_key(&2222));
        assert!(db.is_fresh(&cache));
    }

    #[test]
    fn test_expired_cache_without_csv_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("services.json");
        fs::write(&cache, r#"{ "ports": { "2222": "stale" } }"#).unwrap();
        age(&cache, 40);

        let (ports, source) = ServiceDatabase::new().with_cache_file(&cache).load();
        assert_eq!(source, ServiceSource::BuiltIn);
        assert_eq!(ports.get(&22).map(String::as_str), Some("ssh"));
    }

    #[test]
    fn test_broken_sources_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("services.json");
        fs::write(&cache, "{ not json").unwrap();

        let db = ServiceDatabase::new()
            .with_cache_file(&cache)
            .with_iana_csv(dir.path().join("missing.csv"));

        let (ports, source) = db.load();
        assert_eq!(source, ServiceSource::BuiltIn);
        assert_eq!(ports.get(&443).map(String::as_str), Some("https"));
    }

    #[test]
    fn test_max_age_days() {
        let db = ServiceDatabase::new().with_max_age_days(7);
        assert_eq!(db.max_age, Duration::from_secs(7 * SECS_PER_DAY));
        let db = ServiceDatabase::new().with_max_age_days(u64::MAX);
        assert_eq!(db.max_age, Duration::from_secs(u64::MAX));
    }
}
