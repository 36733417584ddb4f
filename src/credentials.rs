//! Node identity generation and persistence.
//!
//! The credential pair (UUID id + hex secret) is created on first run and
//! reused forever after; every downstream consumer takes the value returned
//! by [`load_or_create`] rather than re-deriving it. The file holds exactly
//! two lines: the id, then the secret.

use crate::error::Result;
use anyhow::{bail, Context};
use rand::rngs::OsRng;
use rand::RngCore;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Secret length in raw bytes (doubled once hex-encoded).
pub const SECRET_BYTES: usize = 16;

/// Persisted node identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// UUID-shaped node id
    pub id: String,
    /// Random hex secret
    pub secret: String,
}

impl Credential {
    /// Generate a fresh credential pair.
    pub fn generate() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            secret: random_hex(SECRET_BYTES),
        }
    }
}

/// Random hex string from `bytes` bytes of OS entropy.
pub fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Load the persisted credential, or create and persist a fresh one.
///
/// A file that does not parse as two well-formed lines is treated the same
/// as a missing file: a corrupted half-write must not become the node
/// identity.
pub async fn load_or_create(path: &Path) -> Result<Credential> {
    if path.exists() {
        let raw = fs::read_to_string(path).await?;
        match parse(&raw) {
            Ok(cred) => {
                debug!(id = %cred.id, "loaded node credential");
                return Ok(cred);
            }
            Err(err) => {
                warn!(%err, path = %path.display(), "credential file malformed, regenerating");
            }
        }
    }

    let cred = Credential::generate();
    persist(path, &cred).await?;
    info!(id = %cred.id, "generated node credential");
    Ok(cred)
}

fn parse(raw: &str) -> anyhow::Result<Credential> {
    let mut lines = raw.lines();
    let id = lines.next().unwrap_or("").trim();
    let secret = lines.next().unwrap_or("").trim();
    if lines.next().is_some() {
        bail!("expected exactly two lines");
    }
    Uuid::parse_str(id).context("node id is not a UUID")?;
    if secret.is_empty() || !secret.bytes().all(|b| b.is_ascii_hexdigit()) {
        bail!("secret is not a hex string");
    }
    Ok(Credential {
        id: id.to_string(),
        secret: secret.to_string(),
    })
}

/// Write the credential atomically: tmp file first, then rename over the
/// target so a crash mid-write never leaves a truncated identity behind.
async fn persist(path: &Path, cred: &Credential) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, format!("{}\n{}\n", cred.id, cred.secret)).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn create_then_load_returns_same_credential() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.txt");

        let first = load_or_create(&path).await.unwrap();
        let second = load_or_create(&path).await.unwrap();

        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first.id).is_ok());
        assert_eq!(first.secret.len(), SECRET_BYTES * 2);
    }

    #[tokio::test]
    async fn no_tmp_file_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.txt");

        load_or_create(&path).await.unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn malformed_file_is_regenerated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.txt");
        std::fs::write(&path, "not-a-uuid\nzzzz\n").unwrap();

        let cred = load_or_create(&path).await.unwrap();
        assert!(Uuid::parse_str(&cred.id).is_ok());

        // The rewritten file must round-trip.
        let reloaded = load_or_create(&path).await.unwrap();
        assert_eq!(cred, reloaded);
    }

    #[tokio::test]
    async fn extra_lines_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.txt");
        let stale = Credential::generate();
        std::fs::write(
            &path,
            format!("{}\n{}\ngarbage\n", stale.id, stale.secret),
        )
        .unwrap();

        let cred = load_or_create(&path).await.unwrap();
        assert_ne!(cred.id, stale.id);
    }

    #[test]
    fn parse_accepts_two_clean_lines() {
        let cred = parse("11111111-1111-1111-1111-111111111111\ndeadbeefdeadbeefdeadbeefdeadbeef\n")
            .unwrap();
        assert_eq!(cred.id, "11111111-1111-1111-1111-111111111111");
        assert_eq!(cred.secret, "deadbeefdeadbeefdeadbeefdeadbeef");
    }

    #[test]
    fn parse_rejects_missing_secret() {
        assert!(parse("11111111-1111-1111-1111-111111111111\n").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn random_hex_has_expected_length() {
        let s = random_hex(16);
        assert_eq!(s.len(), 32);
        assert!(s.bytes().all(|b| b.is_ascii_hexdigit()));
    }
}
