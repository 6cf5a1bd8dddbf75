//! Tor-backed circuits over reqwest
//!
//! Every acquisition builds a brand-new HTTP client, so no connection or
//! cookie survives a rotation. With a SOCKS proxy and isolation enabled, each
//! client also authenticates with its own credentials; Tor's
//! `IsolateSOCKSAuth` (on by default) then routes it over a separate circuit
//! with its own exit node.

use crate::circuit::{Circuit, CircuitError, CircuitProvider, FetchError};
use crate::config::{Config, NetworkConfig, TargetConfig, ID_PLACEHOLDER};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Proxy};
use sha2::{Digest, Sha256};
use std::time::Duration;
use url::Url;

/// Hands out isolated circuits through an optional proxy
pub struct TorCircuitManager {
    url_template: String,
    proxy: Option<Url>,
    isolate: bool,
    timeout: Duration,
    headers: HeaderMap,
    nonce: String,
    next_id: u64,
}

impl TorCircuitManager {
    /// Creates a manager from the target and network settings
    ///
    /// # Returns
    ///
    /// * `Ok(TorCircuitManager)` - Ready to acquire circuits
    /// * `Err(CircuitError)` - The proxy URL or a header is invalid
    pub fn new(target: &TargetConfig, network: &NetworkConfig) -> Result<Self, CircuitError> {
        let proxy = network
            .proxy
            .as_deref()
            .map(|proxy| {
                Url::parse(proxy).map_err(|e| CircuitError::Proxy {
                    proxy: proxy.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()?;

        let isolate = network.isolate_circuits
            && proxy
                .as_ref()
                .is_some_and(|url| url.scheme().starts_with("socks"));

        Ok(Self {
            url_template: target.url_template.clone(),
            proxy,
            isolate,
            timeout: Duration::from_millis(network.request_timeout_ms),
            headers: build_header_map(&network.effective_headers())?,
            nonce: process_nonce(),
            next_id: 0,
        })
    }

    /// Creates a manager from a full configuration
    pub fn from_config(config: &Config) -> Result<Self, CircuitError> {
        Self::new(&config.target, &config.network)
    }

    /// Proxy for the next circuit, carrying isolation credentials if enabled
    fn proxy_for(&self, circuit_id: u64) -> Result<Option<Proxy>, CircuitError> {
        let Some(base) = &self.proxy else {
            return Ok(None);
        };

        let mut url = base.clone();
        if self.isolate {
            let (username, password) = isolation_credentials(&self.nonce, circuit_id);
            url.set_username(&username)
                .and_then(|_| url.set_password(Some(&password)))
                .map_err(|_| CircuitError::Proxy {
                    proxy: base.to_string(),
                    message: "cannot carry credentials".to_string(),
                })?;
        }

        let proxy = Proxy::all(url.as_str())?;
        Ok(Some(proxy))
    }
}

#[async_trait]
impl CircuitProvider for TorCircuitManager {
    async fn acquire(&mut self) -> Result<Box<dyn Circuit>, CircuitError> {
        self.next_id += 1;
        let id = self.next_id;

        let proxy = self.proxy_for(id)?;
        let client = build_http_client(&self.headers, self.timeout, proxy)?;

        tracing::debug!(
            circuit = id,
            proxied = self.proxy.is_some(),
            isolated = self.isolate,
            "Acquired circuit"
        );

        Ok(Box::new(HttpCircuit {
            id,
            client,
            url_template: self.url_template.clone(),
        }))
    }
}

/// A circuit backed by its own reqwest client
pub struct HttpCircuit {
    id: u64,
    client: Client,
    url_template: String,
}

impl HttpCircuit {
    /// Page URL for a film identifier
    pub fn url_for(&self, target: &str) -> String {
        self.url_template.replace(ID_PLACEHOLDER, target)
    }
}

#[async_trait]
impl Circuit for HttpCircuit {
    fn id(&self) -> u64 {
        self.id
    }

    async fn fetch(&self, target: &str) -> Result<String, FetchError> {
        let url = self.url_for(target);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify_error(&url, e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| classify_error(&url, e))?;

        if !status.is_success() {
            tracing::debug!(circuit = self.id, status = status.as_u16(), "Non-success status for {}", url);
        }

        Ok(body)
    }
}

impl Drop for HttpCircuit {
    fn drop(&mut self) {
        tracing::debug!(circuit = self.id, "Released circuit");
    }
}

/// Builds an HTTP client for one circuit
///
/// # Arguments
///
/// * `headers` - Headers sent with every request
/// * `timeout` - Per-request timeout, also used as the connect timeout
/// * `proxy` - Proxy to route through; `None` connects directly and ignores
///   proxy environment variables
pub fn build_http_client(
    headers: &HeaderMap,
    timeout: Duration,
    proxy: Option<Proxy>,
) -> Result<Client, reqwest::Error> {
    let builder = Client::builder()
        .default_headers(headers.clone())
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true);

    let builder = match proxy {
        Some(proxy) => builder.proxy(proxy),
        None => builder.no_proxy(),
    };

    builder.build()
}

/// Converts configured header pairs into a header map
pub fn build_header_map(headers: &[(String, String)]) -> Result<HeaderMap, CircuitError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| CircuitError::Header { name: name.clone() })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| CircuitError::Header { name: name.clone() })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// SOCKS credentials that pin a circuit to its own Tor path
///
/// Distinct `(nonce, circuit_id)` pairs give distinct credentials.
pub fn isolation_credentials(nonce: &str, circuit_id: u64) -> (String, String) {
    let mut hasher = Sha256::new();
    hasher.update(nonce.as_bytes());
    hasher.update(circuit_id.to_be_bytes());
    let token = hex::encode(hasher.finalize());
    (format!("circuit-{}", circuit_id), token[..32].to_string())
}

/// Per-process seed for isolation credentials
///
/// Keeps two runs of the crawler from landing on the same circuits.
fn process_nonce() -> String {
    let mut hasher = Sha256::new();
    hasher.update(std::process::id().to_be_bytes());
    hasher.update(
        chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .to_be_bytes(),
    );
    hex::encode(hasher.finalize())
}

/// Maps a reqwest error onto the transient failure kinds
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        FetchError::Other {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
