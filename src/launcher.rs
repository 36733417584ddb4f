//! Provisioning pipeline orchestration and process handoff.
//!
//! Stages run strictly in sequence: masquerade domain → certificate →
//! relay binary → credentials → server config → network info → share link.
//! Each stage is idempotent on its own; only this module knows the
//! ordering. The final step launches the relay binary against the rendered
//! config and propagates its exit status — no signal interception, no
//! restart loop.

use crate::error::Result;
use crate::net_info::{NetworkInfoResolver, NodeNetworkInfo};
use crate::server_config::ServerConfig;
use crate::{binary, cert, credentials, link, masquerade};
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Listen port when no override is given.
pub const DEFAULT_PORT: u16 = 28888;

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Immutable launch parameters, threaded through every stage.
///
/// All provisioned files live under one working directory so the node can
/// be wiped (or backed up) by handling a single path.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub work_dir: PathBuf,
    pub port: u16,
}

impl LaunchConfig {
    pub fn new(work_dir: PathBuf, port: u16) -> Self {
        Self { work_dir, port }
    }

    pub fn config_path(&self) -> PathBuf {
        self.work_dir.join("config.json")
    }

    pub fn cert_path(&self) -> PathBuf {
        self.work_dir.join("server.crt")
    }

    pub fn key_path(&self) -> PathBuf {
        self.work_dir.join("server.key")
    }

    pub fn binary_path(&self) -> PathBuf {
        self.work_dir.join("tuic-server")
    }

    pub fn credential_path(&self) -> PathBuf {
        self.work_dir.join("credentials.txt")
    }
}

/// Run the full pipeline, then hand control to the relay binary.
///
/// Returns the relay's exit status once it terminates; the caller decides
/// what to do with the process exit code.
pub async fn run(cfg: &LaunchConfig) -> Result<ExitStatus> {
    tokio::fs::create_dir_all(&cfg.work_dir).await?;

    let domain = masquerade::pick_random();
    info!(%domain, "selected masquerade domain");

    let cert_info = cert::ensure(&cfg.cert_path(), &cfg.key_path(), domain).await?;
    debug!(cn = %cert_info.common_name, "certificate ready");

    let client = reqwest::Client::builder()
        .connect_timeout(HTTP_CONNECT_TIMEOUT)
        .build()?;

    binary::ensure(&cfg.binary_path(), &client).await?;

    let credential = credentials::load_or_create(&cfg.credential_path()).await?;

    let server_config = ServerConfig::build(
        cfg.port,
        &credential,
        cfg.cert_path(),
        cfg.key_path(),
    );
    server_config.write(&cfg.config_path()).await?;

    let net = NetworkInfoResolver::new(client).resolve().await;
    let share_link = link::encode(&credential, &net, cfg.port, domain);

    print_summary(domain, &net, cfg.port, &credential, &share_link);

    info!(binary = %cfg.binary_path().display(), "handing off to relay server");
    let status = Command::new(cfg.binary_path())
        .arg("-c")
        .arg(cfg.config_path())
        .status()
        .await?;
    Ok(status)
}

/// Fixed-order status block, printed before handoff.
fn print_summary(
    domain: &str,
    net: &NodeNetworkInfo,
    port: u16,
    credential: &credentials::Credential,
    share_link: &str,
) {
    println!();
    println!("masquerade domain : {domain}");
    println!("endpoint          : {}:{}", net.ip, port);
    println!("node id           : {}", credential.id);
    println!("node secret       : {}", credential.secret);
    println!("share link        : {share_link}");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_rooted_at_work_dir() {
        let cfg = LaunchConfig::new(PathBuf::from("/srv/node"), 443);

        assert_eq!(cfg.config_path(), PathBuf::from("/srv/node/config.json"));
        assert_eq!(cfg.cert_path(), PathBuf::from("/srv/node/server.crt"));
        assert_eq!(cfg.key_path(), PathBuf::from("/srv/node/server.key"));
        assert_eq!(cfg.binary_path(), PathBuf::from("/srv/node/tuic-server"));
        assert_eq!(
            cfg.credential_path(),
            PathBuf::from("/srv/node/credentials.txt")
        );
    }

    #[test]
    fn default_port_is_stable() {
        assert_eq!(DEFAULT_PORT, 28888);
    }
}
