//! Self-signed TLS certificate lifecycle.
//!
//! [`ensure`] reuses an on-disk PEM pair while its validity window still
//! covers "now" and regenerates it otherwise. A reused certificate keeps
//! whatever common name it was issued with, even when the current run
//! sampled a different masquerade domain; clients connect with
//! `allowInsecure=1` and never validate the name.

use crate::error::{LaunchError, Result};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use ::time::OffsetDateTime;
use tokio::fs;
use tracing::{debug, info, warn};
use x509_parser::prelude::*;

/// Validity window for freshly issued certificates.
pub const VALIDITY_DAYS: i64 = 365;

/// Parsed state of the on-disk certificate pair.
#[derive(Debug, Clone)]
pub struct CertificateInfo {
    /// Certificate file path
    pub cert_path: PathBuf,
    /// Private key file path
    pub key_path: PathBuf,
    /// Subject common name
    pub common_name: String,
    /// Certificate expiration time
    pub expires_at: SystemTime,
}

impl CertificateInfo {
    /// Whether the certificate is expired as of `now`.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at <= now
    }
}

/// Ensure a valid certificate pair exists at the given paths.
///
/// Cache hit (both files present, not expired) performs no writes. Any
/// other state regenerates both files with `common_name` as the subject.
pub async fn ensure(cert_path: &Path, key_path: &Path, common_name: &str) -> Result<CertificateInfo> {
    if cert_path.exists() && key_path.exists() {
        match inspect(cert_path, key_path).await {
            Ok(info) if !info.is_expired(SystemTime::now()) => {
                debug!(cn = %info.common_name, "reusing certificate");
                return Ok(info);
            }
            Ok(info) => {
                info!(cn = %info.common_name, "certificate expired, regenerating");
            }
            Err(err) => {
                warn!(%err, "existing certificate unreadable, regenerating");
            }
        }
    }
    generate(cert_path, key_path, common_name).await
}

/// Read back the on-disk pair and parse expiry and common name.
async fn inspect(cert_path: &Path, key_path: &Path) -> Result<CertificateInfo> {
    let pem = fs::read(cert_path).await?;
    let ders = rustls_pemfile::certs(&mut pem.as_slice())
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let der = ders
        .first()
        .ok_or_else(|| LaunchError::Certificate("no certificate in file".into()))?;

    let (expires_at, common_name) = parse_cert(der.as_ref())?;
    Ok(CertificateInfo {
        cert_path: cert_path.to_path_buf(),
        key_path: key_path.to_path_buf(),
        common_name,
        expires_at,
    })
}

/// Extract not-after and subject CN from certificate DER.
fn parse_cert(der: &[u8]) -> Result<(SystemTime, String)> {
    let (_, x509) = X509Certificate::from_der(der)
        .map_err(|e| LaunchError::Certificate(format!("parsing certificate: {e}")))?;

    let not_after = x509.validity().not_after.timestamp();
    let expires_at = SystemTime::UNIX_EPOCH
        .checked_add(Duration::from_secs(not_after.max(0) as u64))
        .ok_or_else(|| LaunchError::Certificate("expiration time out of range".into()))?;

    let common_name = x509
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or_default()
        .to_string();

    Ok((expires_at, common_name))
}

/// Generate a self-signed ECDSA P-256 pair and overwrite both files.
async fn generate(cert_path: &Path, key_path: &Path, common_name: &str) -> Result<CertificateInfo> {
    let key_pair = KeyPair::generate()?;

    let mut params = CertificateParams::new(vec![common_name.to_string()])?;
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    params.distinguished_name = dn;

    let not_before = OffsetDateTime::now_utc();
    params.not_before = not_before;
    params.not_after = not_before + ::time::Duration::days(VALIDITY_DAYS);

    let cert = params.self_signed(&key_pair)?;

    fs::write(cert_path, cert.pem()).await?;
    fs::write(key_path, key_pair.serialize_pem()).await?;

    // Only the owner may read the private key.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(key_path, std::fs::Permissions::from_mode(0o600)).await?;
    }

    info!(cn = %common_name, "generated self-signed certificate");

    // Read back through the same parser so expiry matches what a later run
    // will observe (ASN.1 truncates to whole seconds).
    inspect(cert_path, key_path).await
}
