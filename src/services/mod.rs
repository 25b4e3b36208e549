//! Service identification for open ports.
//!
//! A [`ServiceTable`] is an immutable value built once per run and handed
//! to aggregation; there is no global table. Its port names come from a
//! [`ServiceDatabase`]. Banner heuristics win over the port table.

mod database;

pub use database::{ServiceDatabase, ServiceSource, DEFAULT_CACHE_DAYS};

use std::collections::HashMap;

/// Name reported when neither banner nor port give a hint.
pub const UNKNOWN_SERVICE: &str = "unknown";

/// Maps a port and optional banner to a service name.
pub trait ServiceClassifier: Send + Sync {
    /// Name the service behind `port`, given the greeting it sent (if any).
    fn classify(&self, port: u16, banner: Option<&str>) -> String;
}

/// Well-known TCP ports.
const WELL_KNOWN: &[(u16, &str)] = &[
    (20, "ftp-data"),
    (21, "ftp"),
    (22, "ssh"),
    (23, "telnet"),
    (25, "smtp"),
    (53, "dns"),
    (80, "http"),
    (88, "kerberos"),
    (110, "pop3"),
    (111, "rpcbind"),
    (119, "nntp"),
    (135, "msrpc"),
    (139, "netbios-ssn"),
    (143, "imap"),
    (179, "bgp"),
    (389, "ldap"),
    (443, "https"),
    (445, "microsoft-ds"),
    (465, "smtps"),
    (513, "rlogin"),
    (514, "shell"),
    (515, "printer"),
    (548, "afp"),
    (554, "rtsp"),
    (587, "submission"),
    (631, "ipp"),
    (636, "ldaps"),
    (873, "rsync"),
    (993, "imaps"),
    (995, "pop3s"),
    (1080, "socks"),
    (1194, "openvpn"),
    (1433, "mssql"),
    (1521, "oracle"),
    (1723, "pptp"),
    (1883, "mqtt"),
    (2049, "nfs"),
    (2181, "zookeeper"),
    (2375, "docker"),
    (2376, "docker-ssl"),
    (3000, "grafana"),
    (3128, "squid"),
    (3306, "mysql"),
    (3389, "rdp"),
    (3690, "svn"),
    (4369, "epmd"),
    (5000, "upnp"),
    (5060, "sip"),
    (5222, "xmpp-client"),
    (5432, "postgresql"),
    (5672, "amqp"),
    (5900, "vnc"),
    (5984, "couchdb"),
    (6379, "redis"),
    (6443, "kubernetes-api"),
    (6667, "irc"),
    (7001, "weblogic"),
    (8000, "http-alt"),
    (8008, "http-alt"),
    (8080, "http-proxy"),
    (8443, "https-alt"),
    (8888, "http-alt"),
    (9000, "cslistener"),
    (9042, "cassandra"),
    (9090, "prometheus"),
    (9092, "kafka"),
    (9200, "elasticsearch"),
    (9418, "git"),
    (10000, "webmin"),
    (11211, "memcached"),
    (15672, "rabbitmq-mgmt"),
    (27017, "mongodb"),
];

/// Immutable port-to-service lookup with banner heuristics.
#[derive(Debug, Clone)]
pub struct ServiceTable {
    ports: HashMap<u16, String>,
}

impl ServiceTable {
    /// An empty table: only banner heuristics apply.
    pub fn empty() -> Self {
        Self {
            ports: HashMap::new(),
        }
    }

    /// Build the port table from `database` (cache, IANA export or built-in).
    pub fn load(database: &ServiceDatabase) -> Self {
        let (ports, source) = database.load();
        tracing::debug!(?source, entries = ports.len(), "service table ready");
        Self { ports }
    }

    /// Add `overrides` on top of the current entries; they take precedence.
    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = (u16, String)>) -> Self {
        self.ports.extend(overrides);
        self
    }

    /// Look up the name registered for `port`.
    pub fn lookup(&self, port: u16) -> Option<&str> {
        self.ports.get(&port).map(String::as_str)
    }

    /// Number of registered ports.
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Whether the table has no port entries.
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

impl Default for ServiceTable {
    fn default() -> Self {
        Self {
            ports: well_known(),
        }
    }
}

/// The built-in table as an owned map.
fn well_known() -> HashMap<u16, String> {
    WELL_KNOWN
        .iter()
        .map(|&(port, name)| (port, name.to_string()))
        .collect()
}

impl ServiceClassifier for ServiceTable {
    fn classify(&self, port: u16, banner: Option<&str>) -> String {
        banner
            .and_then(service_from_banner)
            .or_else(|| self.lookup(port))
            .unwrap_or(UNKNOWN_SERVICE)
            .to_string()
    }
}

/// Guess a service from its greeting.
fn service_from_banner(banner: &str) -> Option<&'static str> {
    let upper = banner.to_ascii_uppercase();

    if upper.starts_with("SSH-") {
        Some("ssh")
    } else if upper.starts_with("HTTP/") {
        Some("http")
    } else if upper.starts_with("220") && upper.contains("FTP") {
        Some("ftp")
    } else if upper.starts_with("220") && (upper.contains("SMTP") || upper.contains("MAIL")) {
        Some("smtp")
    } else if upper.starts_with("+OK") {
        Some("pop3")
    } else if upper.starts_with("* OK") {
        Some("imap")
    } else if upper.starts_with("-ERR") || upper.starts_with("-NOAUTH") || upper.starts_with("+PONG")
    {
        Some("redis")
    } else if upper.starts_with("RFB ") {
        Some("vnc")
    } else {
        None
    }
}
