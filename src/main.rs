//! leno
//!
//! Pipe any log stream into your browser:
//!
//! ```text
//! kubectl logs -f deploy/ingress-nginx | leno --log-format nginx
//! ```
//!
//! # Configuration
//!
//! Settings come from a TOML file (`--config`, or the first of
//! `~/.config/leno/config.toml`, `/etc/leno/config.toml`, `./leno.toml`),
//! then `LENO_*` environment variables, then command line flags.
//! `RUST_LOG` overrides the configured log level.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use leno::config::{generate_default_config, Config, LogOutput, LoggingConfig};
use leno::hub::BroadcastHub;
use leno::ingest;
use leno::normalize::{LogFormat, Normalizer};
use leno::server::{self, AppState};

#[derive(Parser)]
#[command(name = "leno")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Stream stdin lines to every connected browser")]
struct Cli {
    /// Config file path
    #[arg(short, long, env = "LENO_CONFIG")]
    config: Option<PathBuf>,

    /// Structured format of the input lines
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Address to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Serve the UI from this directory
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Print a default config file and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let config = load_config(&cli)?;
    init_logging(&config.logging)?;

    tracing::info!("Starting leno v{}", env!("CARGO_PKG_VERSION"));

    let format = config.input.format;
    let normalizer = Normalizer::new(format).context("Failed to build line normalizer")?;
    let hub = Arc::new(BroadcastHub::new(config.hub.clone()));

    tracing::info!(
        format = %format,
        queue_capacity = config.hub.queue_capacity,
        "Hub ready"
    );

    ingest::spawn_stdin(normalizer, Arc::clone(&hub)).context("Failed to start input reader")?;

    let state = AppState::new(hub, config.server, format);
    server::serve(state).await.context("Server failed")?;

    Ok(())
}

/// Resolve configuration: file, then environment, then flags
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let path = cli.config.clone().or_else(Config::find_default);

    let mut config = match path {
        Some(path) => Config::load_with_env(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::from_env().context("Failed to read configuration from environment")?,
    };

    if let Some(format) = cli.log_format {
        config.input.format = format;
    }
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(dir) = &cli.static_dir {
        config.server.static_dir = Some(dir.clone());
    }

    Ok(config)
}

/// Initialize tracing; logs go to stderr so stdout stays free
fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("leno={0},tower_http={0}", config.level))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.output {
        LogOutput::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
        LogOutput::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
    }

    Ok(())
}
