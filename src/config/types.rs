use serde::Deserialize;
use std::collections::BTreeMap;

/// Default per-request timeout (milliseconds)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

/// Header set of a desktop Chrome session, sent when `[network.headers]` is absent
///
/// Transport headers (`Host`, `Connection`, `TE`, `Accept-Encoding`) are
/// left to the HTTP client.
pub const DEFAULT_BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "User-Agent",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/83.0.4103.61 Safari/537.36",
    ),
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.5"),
    ("Cache-Control", "max-age=0"),
    ("Referer", "https://www.kinopoisk.ru/top/"),
    ("Upgrade-Insecure-Requests", "1"),
];

/// Main configuration structure for Reelmine
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub target: TargetConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub output: OutputConfig,
}

/// What to fetch
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Page URL pattern; `{}` is replaced by the film identifier
    #[serde(rename = "url-template")]
    pub url_template: String,

    /// Text file with one film identifier per line
    #[serde(rename = "ids-path")]
    pub ids_path: String,
}

/// How to reach the target
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Proxy URL, e.g. `socks5h://127.0.0.1:9050` for a local Tor client.
    /// Without a proxy every circuit is a direct connection.
    #[serde(default)]
    pub proxy: Option<String>,

    /// Give every circuit its own SOCKS credentials so Tor isolates it
    #[serde(rename = "isolate-circuits", default = "default_isolate_circuits")]
    pub isolate_circuits: bool,

    /// Per-request timeout (milliseconds)
    #[serde(
        rename = "request-timeout-ms",
        default = "default_request_timeout_ms"
    )]
    pub request_timeout_ms: u64,

    /// Request headers; replaces the built-in browser header set when present
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
}

impl NetworkConfig {
    /// Returns the headers every request carries
    pub fn effective_headers(&self) -> Vec<(String, String)> {
        match &self.headers {
            Some(headers) => headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            None => DEFAULT_BROWSER_HEADERS
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            isolate_circuits: default_isolate_circuits(),
            request_timeout_ms: default_request_timeout_ms(),
            headers: None,
        }
    }
}

/// Retry policy of the crawl controller
///
/// The defaults retry a blocked film forever, rotating circuits with no
/// pause in between.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetryConfig {
    /// Failed attempts after which a film is skipped for this run (0 = never)
    #[serde(rename = "max-attempts-per-target", default)]
    pub max_attempts_per_target: u32,

    /// Pause before acquiring a new circuit after a failure (milliseconds)
    #[serde(rename = "rotation-delay-ms", default)]
    pub rotation_delay_ms: u64,
}

impl RetryConfig {
    /// Returns the attempt cap, if one is configured
    pub fn attempt_limit(&self) -> Option<u32> {
        (self.max_attempts_per_target > 0).then_some(self.max_attempts_per_target)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the dataset file
    #[serde(rename = "dataset-path")]
    pub dataset_path: String,

    /// Dataset file format
    #[serde(default)]
    pub format: DatasetFormat,
}

/// Supported dataset formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    /// Comma-separated rows with a header line
    #[default]
    Csv,

    /// SQLite database with run bookkeeping
    Sqlite,
}

fn default_isolate_circuits() -> bool {
    true
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}
