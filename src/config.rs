//! Service configuration
//!
//! Built once at startup from, in increasing precedence: defaults, an
//! optional TOML file, and environment variables (a `.env` file is loaded
//! into the environment by `main`).

use crate::error::{Result, TriageError};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub mailbox: MailboxConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub poller: PollerConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
}

/// IMAP mailbox settings
#[derive(Debug, Clone, Deserialize)]
pub struct MailboxConfig {
    #[serde(default = "default_imap_host")]
    pub host: String,

    #[serde(default = "default_imap_port")]
    pub port: u16,

    /// Mailbox login (the recipient address)
    #[serde(default)]
    pub username: String,

    /// App password
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Only messages from this sender are retrieved
    #[serde(default = "default_sender_filter")]
    pub sender_filter: String,

    #[serde(default = "default_folder")]
    pub folder: String,

    /// Most recent messages taken per cycle
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default = "default_true")]
    pub unread_only: bool,
}

fn default_imap_host() -> String {
    "imap.gmail.com".to_string()
}

fn default_imap_port() -> u16 {
    993
}

fn default_sender_filter() -> String {
    "ccecomp@ecomp.uefs.br".to_string()
}

fn default_folder() -> String {
    "INBOX".to_string()
}

fn default_max_results() -> usize {
    10
}

fn default_true() -> bool {
    true
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            host: default_imap_host(),
            port: default_imap_port(),
            username: String::new(),
            password: None,
            sender_filter: default_sender_filter(),
            folder: default_folder(),
            max_results: default_max_results(),
            unread_only: true,
        }
    }
}

/// Ingestion API settings
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_ingest_url")]
    pub url: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_ingest_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_ingest_url() -> String {
    "http://localhost:8000/api/v1/emails".to_string()
}

fn default_ingest_timeout_ms() -> u64 {
    6000
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            url: default_ingest_url(),
            timeout_ms: default_ingest_timeout_ms(),
        }
    }
}

impl IngestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Polling loop settings
#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Flag delivered messages as read on the server
    #[serde(default = "default_true")]
    pub mark_read: bool,
}

fn default_interval_secs() -> u64 {
    60
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            mark_read: true,
        }
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Health endpoint listener
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Where the category taxonomy comes from
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaxonomyConfig {
    /// Taxonomy file; the built-in taxonomy is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Load defaults, then the file at `path` if it exists, then environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| TriageError::Config(format!("{}: {}", path.display(), e)))?;

        Ok(config.from_env())
    }

    /// Override with environment variables if present
    pub fn from_env(mut self) -> Self {
        if let Ok(val) = std::env::var("IMAP_HOST") {
            self.mailbox.host = val;
        }

        if let Ok(val) = std::env::var("IMAP_PORT") {
            if let Ok(port) = val.parse() {
                self.mailbox.port = port;
            }
        }

        if let Ok(val) = std::env::var("GMAIL_RECIPIENT") {
            self.mailbox.username = val;
        }

        if let Ok(val) = std::env::var("GMAIL_PASSWORD") {
            self.mailbox.password = Some(SecretString::new(val));
        }

        if let Ok(val) = std::env::var("GMAIL_SENDER") {
            self.mailbox.sender_filter = val;
        }

        if let Ok(val) = std::env::var("IMAP_FOLDER") {
            self.mailbox.folder = val;
        }

        if let Ok(val) = std::env::var("IMAP_MAX_RESULTS") {
            if let Ok(max) = val.parse() {
                self.mailbox.max_results = max;
            }
        }

        if let Ok(val) = std::env::var("IMAP_UNREAD_ONLY") {
            self.mailbox.unread_only = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("INGEST_API_URL") {
            self.ingest.url = val;
        }

        if let Ok(val) = std::env::var("INGEST_TIMEOUT_MS") {
            if let Ok(ms) = val.parse() {
                self.ingest.timeout_ms = ms;
            }
        }

        if let Ok(val) = std::env::var("POLL_INTERVAL_SECS") {
            if let Ok(secs) = val.parse() {
                self.poller.interval_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("POLL_MARK_READ") {
            self.poller.mark_read = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("SERVER_HOST") {
            self.server.host = val;
        }

        if let Ok(val) = std::env::var("SERVER_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }

        if let Ok(val) = std::env::var("LOG_LEVEL") {
            self.logging.level = val;
        }

        if let Ok(val) = std::env::var("LOG_JSON") {
            self.logging.json = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("TAXONOMY_PATH") {
            self.taxonomy.path = Some(PathBuf::from(val));
        }

        self
    }
}

fn parse_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}
