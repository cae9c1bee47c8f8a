//! Supertonic TTS server: HTTP API plus Wyoming streaming.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use runtime::logging::{LogFormat, init_logging};
use tts_server::{ServerConfig, TtsServer};

/// Supertonic TTS Server
#[derive(Debug, Parser)]
#[command(name = "supertonic-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address both listeners bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// HTTP API port
    #[arg(long, env = "PORT", default_value_t = 8765)]
    port: u16,

    /// Wyoming protocol port
    #[arg(long, env = "WYOMING_PORT", default_value_t = 10200)]
    wyoming_port: u16,

    /// Options document with synthesis defaults
    #[arg(short, long, default_value = tts_core::config::DEFAULT_OPTIONS_PATH)]
    config: PathBuf,

    /// Engine model asset directory
    #[arg(long, default_value = "/opt/supertonic/models/onnx")]
    model_dir: PathBuf,

    /// Directory holding voice style JSON files
    #[arg(long, default_value = "/opt/supertonic/models/voice_styles")]
    voices_dir: PathBuf,

    /// Output sample rate of the built-in engine
    #[arg(long, default_value_t = 44_100)]
    sample_rate: u32,

    /// Serve Prometheus metrics on this port
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Do not advertise the Wyoming service over zeroconf
    #[arg(long)]
    no_discovery: bool,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.log_format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %args.host,
        port = args.port,
        wyoming_port = args.wyoming_port,
        "Starting Supertonic TTS server"
    );

    let config = ServerConfig {
        http_addr: SocketAddr::new(args.host, args.port),
        wyoming_addr: SocketAddr::new(args.host, args.wyoming_port),
        options_path: args.config,
        model_dir: args.model_dir,
        voices_dir: args.voices_dir,
        sample_rate: args.sample_rate,
        metrics_port: args.metrics_port,
        discovery: !args.no_discovery,
        ..ServerConfig::default()
    };

    let server = TtsServer::bootstrap(config).context("Failed to bootstrap TTS server")?;
    server.run().await.context("Server error")?;

    Ok(())
}
