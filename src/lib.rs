//! # tuic-launcher
//!
//! Provisions and launches a single TUIC relay node on small containerized
//! hosts. Repeated runs converge: the node credential and TLS certificate
//! are created on first launch and reused until removed (or, for the
//! certificate, expired), so the node keeps a stable identity across
//! restarts.
//!
//! Pipeline:
//!
//! ```text
//! masquerade domain → certificate → relay binary → credentials
//!     → server config → public IP / country → share link → exec relay
//! ```
//!
//! Fatal failures (unsupported architecture, failed download, certificate
//! or config errors) abort with distinct exit codes. Network-identity
//! lookups degrade to placeholder values and never block the launch.

/// Relay executable provisioning (arch gate + pinned download)
pub mod binary;
/// Self-signed TLS certificate lifecycle
pub mod cert;
/// Node identity generation and persistence
pub mod credentials;
/// Fatal error kinds with distinct exit codes
pub mod error;
/// Pipeline orchestration and process handoff
pub mod launcher;
/// Share link encoding
pub mod link;
/// Masquerade domain selection
pub mod masquerade;
/// Public IP and country discovery
pub mod net_info;
/// Relay server configuration synthesis
pub mod server_config;

pub use error::{LaunchError, Result};
