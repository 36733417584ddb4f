//! Public IP and country discovery.
//!
//! Both lookups are best-effort: a failed or malformed response is
//! replaced with a placeholder and the pipeline continues. Every outbound
//! call carries a bounded timeout so a wedged endpoint cannot stall the
//! launch.

use anyhow::bail;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Substituted when no echo endpoint returned a usable address.
pub const IP_PLACEHOLDER: &str = "<YOUR_SERVER_IP>";
/// Substituted when the country lookup failed or came back empty.
pub const COUNTRY_UNKNOWN: &str = "XX";

/// Transient network identity of this node, recomputed every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeNetworkInfo {
    /// Public IPv4 address, or [`IP_PLACEHOLDER`]
    pub ip: String,
    /// Two-letter country code, or [`COUNTRY_UNKNOWN`]
    pub country: String,
}

/// Endpoints and timeout for the resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// IP echo endpoints, tried in order
    pub ip_endpoints: Vec<String>,
    /// Geo endpoint base; the IP is appended as a path segment
    pub geo_endpoint: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ip_endpoints: vec![
                "https://api.ipify.org".to_string(),
                "https://ipv4.icanhazip.com".to_string(),
            ],
            geo_endpoint: "http://ip-api.com/line".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Resolver for the node's public network identity.
pub struct NetworkInfoResolver {
    config: ResolverConfig,
    client: Client,
}

impl NetworkInfoResolver {
    /// Resolver with the default public endpoints.
    pub fn new(client: Client) -> Self {
        Self::with_config(client, ResolverConfig::default())
    }

    pub fn with_config(client: Client, config: ResolverConfig) -> Self {
        Self { config, client }
    }

    /// Discover public IP and country. Never fails; degraded lookups
    /// yield the placeholder values.
    pub async fn resolve(&self) -> NodeNetworkInfo {
        let ip = match self.fetch_public_ip().await {
            Ok(ip) => ip,
            Err(err) => {
                warn!(%err, "public IP lookup failed, using placeholder");
                return NodeNetworkInfo {
                    ip: IP_PLACEHOLDER.to_string(),
                    country: COUNTRY_UNKNOWN.to_string(),
                };
            }
        };

        let country = match self.fetch_country(&ip).await {
            Ok(country) => country,
            Err(err) => {
                warn!(%err, "country lookup failed, using sentinel");
                COUNTRY_UNKNOWN.to_string()
            }
        };

        NodeNetworkInfo { ip, country }
    }

    async fn fetch_public_ip(&self) -> anyhow::Result<String> {
        let mut last_err = anyhow::anyhow!("no IP echo endpoints configured");
        for endpoint in &self.config.ip_endpoints {
            match self.fetch_ip_from(endpoint).await {
                Ok(ip) => return Ok(ip),
                Err(err) => {
                    debug!(%endpoint, %err, "IP echo attempt failed");
                    last_err = err;
                }
            }
        }
        Err(last_err)
    }

    async fn fetch_ip_from(&self, endpoint: &str) -> anyhow::Result<String> {
        let text = self
            .client
            .get(endpoint)
            .timeout(self.config.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let ip = text.trim();
        if !is_dotted_quad(ip) {
            bail!("response is not a dotted-quad address: {ip:?}");
        }
        Ok(ip.to_string())
    }

    async fn fetch_country(&self, ip: &str) -> anyhow::Result<String> {
        let url = format!("{}/{}?fields=countryCode", self.config.geo_endpoint, ip);
        let text = self
            .client
            .get(&url)
            .timeout(self.config.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let code = text.trim();
        if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
            bail!("unexpected geo response: {code:?}");
        }
        Ok(code.to_ascii_uppercase())
    }
}

/// Four dot-separated groups of 1-3 ASCII digits. Shape check only, no
/// octet range validation.
fn is_dotted_quad(s: &str) -> bool {
    let mut groups = 0;
    for part in s.split('.') {
        groups += 1;
        if groups > 4
            || part.is_empty()
            || part.len() > 3
            || !part.bytes().all(|b| b.is_ascii_digit())
        {
            return false;
        }
    }
    groups == 4
}
