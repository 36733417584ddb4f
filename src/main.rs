//! Binary entry point: parse arguments, run the provisioning pipeline,
//! hand off to the relay server, propagate its exit code.

use clap::Parser;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

use tuic_launcher::launcher::{self, LaunchConfig, DEFAULT_PORT};

#[derive(Parser, Debug)]
#[command(name = "tuic-launcher", version, about = "Provision and launch a TUIC relay node")]
struct Args {
    /// Working directory for the certificate, credentials, config and binary
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Listen port for the relay server
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let cfg = LaunchConfig::new(args.dir, args.port);

    match launcher::run(&cfg).await {
        Ok(status) => std::process::exit(status.code().unwrap_or(1)),
        Err(err) => {
            error!(%err, "provisioning failed");
            std::process::exit(err.exit_code());
        }
    }
}
