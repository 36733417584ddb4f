//! Relay executable provisioning.
//!
//! A present file is trusted as-is; otherwise the host architecture is
//! gated before any network traffic and the pinned release build is
//! downloaded and marked executable. The download is deliberately not
//! checksummed: the release URL is version-pinned and the trust model
//! stops at GitHub.

use crate::error::{LaunchError, Result};
use reqwest::Client;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Only architecture with a published relay build.
pub const SUPPORTED_ARCH: &str = "x86_64";

/// Version-pinned download location for the relay executable.
pub const RELAY_BINARY_URL: &str =
    "https://github.com/Itsusinn/tuic/releases/download/v1.3.5/tuic-server-x86_64-linux";

/// Ensure the relay executable exists at `path`.
pub async fn ensure(path: &Path, client: &Client) -> Result<()> {
    if path.exists() {
        debug!(path = %path.display(), "relay binary already present");
        return Ok(());
    }
    check_arch(std::env::consts::ARCH)?;
    download(path, client, RELAY_BINARY_URL).await
}

/// Reject any architecture without a published build.
pub fn check_arch(arch: &str) -> Result<()> {
    if arch == SUPPORTED_ARCH {
        Ok(())
    } else {
        Err(LaunchError::UnsupportedArch(arch.to_string()))
    }
}

/// Fetch the relay executable from `url` and mark it executable.
pub async fn download(path: &Path, client: &Client, url: &str) -> Result<()> {
    info!(url, "downloading relay binary");

    let bytes = client
        .get(url)
        .send()
        .await
        .and_then(|resp| resp.error_for_status())
        .map_err(LaunchError::Download)?
        .bytes()
        .await
        .map_err(LaunchError::Download)?;

    fs::write(path, &bytes).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await?;
    }

    info!(bytes = bytes.len(), path = %path.display(), "relay binary installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use tempfile::tempdir;

    #[test]
    fn arch_gate_accepts_only_x86_64() {
        assert!(check_arch("x86_64").is_ok());
        for arch in ["aarch64", "arm", "riscv64", "s390x", ""] {
            let err = check_arch(arch).unwrap_err();
            assert!(matches!(err, LaunchError::UnsupportedArch(_)));
            assert_eq!(err.exit_code(), 2);
        }
    }

    #[tokio::test]
    async fn existing_binary_is_left_alone() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tuic-server");
        std::fs::write(&path, b"sentinel").unwrap();

        // No network reachable from here; ensure must return without touching it.
        let client = Client::new();
        ensure(&path, &client).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"sentinel");
    }

    /// One-shot HTTP server returning the given body.
    fn serve_once(body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf);
                let header = format!(
                    "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(header.as_bytes());
                let _ = stream.write_all(body);
            }
        });
        format!("http://{addr}/tuic-server")
    }

    #[tokio::test]
    async fn download_writes_executable_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tuic-server");
        let url = serve_once(b"\x7fELF fake relay");

        let client = Client::new();
        download(&path, &client, &url).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"\x7fELF fake relay");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[tokio::test]
    async fn download_failure_is_distinct() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tuic-server");

        // Nothing listens here.
        let client = Client::new();
        let err = download(&path, &client, "http://127.0.0.1:1/relay")
            .await
            .unwrap_err();

        assert!(matches!(err, LaunchError::Download(_)));
        assert_eq!(err.exit_code(), 3);
        assert!(!path.exists());
    }
}
