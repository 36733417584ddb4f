//! Relay server configuration synthesis.
//!
//! [`ServerConfig::build`] is deterministic for identical inputs with one
//! exception: the restful endpoint secret is sampled fresh on every build
//! and never persisted, so each rendered document protects the management
//! interface with a different value.

use crate::credentials::{random_hex, Credential, SECRET_BYTES};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// ALPN value for the HTTP/3 camouflage layer.
pub const ALPN_H3: &str = "h3";
/// Congestion controller the relay runs with.
pub const CONGESTION_CONTROLLER: &str = "bbr";
/// Largest UDP payload the relay will carry for a client.
pub const MAX_UDP_RELAY_PACKET_SIZE: u32 = 8192;

const AUTH_TIMEOUT: &str = "10s";
const TASK_NEGOTIATION_TIMEOUT: &str = "5s";
const GC_INTERVAL: &str = "10s";
const GC_LIFETIME: &str = "10s";
const MAX_IDLE_TIME: &str = "20s";
const INITIAL_MTU: u16 = 1500;
const MIN_MTU: u16 = 1200;
const SEND_WINDOW: u64 = 8 * 1024 * 1024;
const RECEIVE_WINDOW: u64 = 4 * 1024 * 1024;
const INITIAL_WINDOW: u64 = 4 * 1024 * 1024;

/// Complete relay server configuration document.
///
/// Field order is the rendered key order; keep it stable, the on-disk JSON
/// is compared byte-for-byte by compatibility tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub log_level: String,
    pub server: SocketAddr,
    pub udp_relay_ipv6: bool,
    pub zero_rtt_handshake: bool,
    pub dual_stack: bool,
    pub auth_timeout: String,
    pub task_negotiation_timeout: String,
    pub gc_interval: String,
    pub gc_lifetime: String,
    pub max_external_packet_size: u32,
    pub alpn: Vec<String>,
    pub users: BTreeMap<String, String>,
    pub certificate: PathBuf,
    pub private_key: PathBuf,
    pub congestion_control: CongestionControl,
    pub restful: RestfulEndpoint,
    pub quic: QuicTuning,
}

/// Congestion controller selection and initial window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CongestionControl {
    pub controller: String,
    pub initial_window: u64,
}

/// Loopback management endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestfulEndpoint {
    pub addr: SocketAddr,
    pub secret: String,
    pub maximum_clients_per_user: u32,
}

/// QUIC transport tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuicTuning {
    pub initial_mtu: u16,
    pub min_mtu: u16,
    pub gso: bool,
    pub pmtu: bool,
    pub send_window: u64,
    pub receive_window: u64,
    pub max_idle_time: String,
}

impl ServerConfig {
    /// Assemble the full document for one node.
    pub fn build(
        port: u16,
        credential: &Credential,
        certificate: PathBuf,
        private_key: PathBuf,
    ) -> Self {
        let mut users = BTreeMap::new();
        users.insert(credential.id.clone(), credential.secret.clone());

        Self {
            log_level: "off".into(),
            server: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
            udp_relay_ipv6: false,
            zero_rtt_handshake: true,
            dual_stack: false,
            auth_timeout: AUTH_TIMEOUT.into(),
            task_negotiation_timeout: TASK_NEGOTIATION_TIMEOUT.into(),
            gc_interval: GC_INTERVAL.into(),
            gc_lifetime: GC_LIFETIME.into(),
            max_external_packet_size: MAX_UDP_RELAY_PACKET_SIZE,
            alpn: vec![ALPN_H3.into()],
            users,
            certificate,
            private_key,
            congestion_control: CongestionControl {
                controller: CONGESTION_CONTROLLER.into(),
                initial_window: INITIAL_WINDOW,
            },
            restful: RestfulEndpoint {
                addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port),
                secret: random_hex(SECRET_BYTES),
                maximum_clients_per_user: u32::MAX,
            },
            quic: QuicTuning {
                initial_mtu: INITIAL_MTU,
                min_mtu: MIN_MTU,
                gso: true,
                pmtu: true,
                send_window: SEND_WINDOW,
                receive_window: RECEIVE_WINDOW,
                max_idle_time: MAX_IDLE_TIME.into(),
            },
        }
    }

    /// Render as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render and write the document to `path`.
    pub async fn write(&self, path: &Path) -> Result<()> {
        let rendered = self.to_json_pretty()?;
        fs::write(path, rendered).await?;
        debug!(path = %path.display(), "wrote server config");
        Ok(())
    }
}
