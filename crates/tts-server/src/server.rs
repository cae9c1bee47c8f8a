//! Service bootstrap and listener lifecycle.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use runtime::{SynthesisService, TtsMetrics, load_engine};
use tts_core::{SUPPORTED_VOICES, ServiceConfig, SpeechEngine, TtsError, TtsResult, VoiceTable};

use crate::discovery;
use crate::http;
use crate::wyoming::{self, Info, info::PROGRAM_NAME};

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Request/response API address.
    pub http_addr: SocketAddr,
    /// Streaming protocol address.
    pub wyoming_addr: SocketAddr,
    /// Options document with synthesis defaults.
    pub options_path: PathBuf,
    /// Engine model asset directory.
    pub model_dir: PathBuf,
    /// Directory holding `<voice>.json` style files.
    pub voices_dir: PathBuf,
    /// Sample rate of the built-in engine.
    pub sample_rate: u32,
    /// Prometheus exporter port; disabled when `None`.
    pub metrics_port: Option<u16>,
    /// Advertise the streaming listener over zeroconf.
    pub discovery: bool,
    /// Graceful shutdown timeout in seconds.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8765)),
            wyoming_addr: SocketAddr::from(([0, 0, 0, 0], 10200)),
            options_path: PathBuf::from(tts_core::config::DEFAULT_OPTIONS_PATH),
            model_dir: PathBuf::from("/opt/supertonic/models/onnx"),
            voices_dir: PathBuf::from("/opt/supertonic/models/voice_styles"),
            sample_rate: 44_100,
            metrics_port: None,
            discovery: true,
            shutdown_timeout_secs: 10,
        }
    }
}

/// The TTS server: one shared service behind two front-ends.
pub struct TtsServer {
    config: ServerConfig,
    service: Arc<SynthesisService>,
    info: Arc<Info>,
}

impl TtsServer {
    /// Bootstrap: options document, engine from `model_dir`, then voices.
    ///
    /// An engine that fails to load is fatal.
    pub fn bootstrap(config: ServerConfig) -> TtsResult<Self> {
        let service_config = ServiceConfig::load(&config.options_path)?;
        let engine = load_engine(&config.model_dir, config.sample_rate)?;
        Self::assemble(config, service_config, engine)
    }

    /// Bootstrap with an engine that is already loaded.
    pub fn with_engine(config: ServerConfig, engine: Arc<dyn SpeechEngine>) -> TtsResult<Self> {
        let service_config = ServiceConfig::load(&config.options_path)?;
        Self::assemble(config, service_config, engine)
    }

    /// Voices that fail to load are skipped; an engine with no sample rate is fatal.
    fn assemble(
        config: ServerConfig,
        service_config: ServiceConfig,
        engine: Arc<dyn SpeechEngine>,
    ) -> TtsResult<Self> {
        if engine.sample_rate() == 0 {
            return Err(TtsError::Bootstrap(
                "engine reported a zero sample rate".to_string(),
            ));
        }
        info!(
            sample_rate = engine.sample_rate(),
            reentrant = engine.is_reentrant(),
            "Engine ready"
        );

        let voices = VoiceTable::load(&config.voices_dir, SUPPORTED_VOICES.iter().copied());
        if voices.is_empty() {
            warn!(dir = %config.voices_dir.display(), "No voice styles loaded");
        }

        let mut service = SynthesisService::new(service_config, voices, engine);
        if let Some(port) = config.metrics_port {
            service = service.with_metrics(TtsMetrics::init(port)?);
            info!(port, "Prometheus exporter listening");
        }

        let info = Arc::new(Info::build(service.voices()));

        Ok(Self {
            config,
            service: Arc::new(service),
            info,
        })
    }

    pub fn service(&self) -> &Arc<SynthesisService> {
        &self.service
    }

    /// Bind both listeners and serve until SIGINT/SIGTERM.
    pub async fn run(self) -> TtsResult<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let http_listener = TcpListener::bind(self.config.http_addr).await?;
        let wyoming_listener = TcpListener::bind(self.config.wyoming_addr).await?;
        let wyoming_port = wyoming_listener.local_addr()?.port();

        let http_app = http::router(Arc::clone(&self.service));
        let mut http_shutdown_rx = shutdown_rx.clone();
        let http_handle = tokio::spawn(async move {
            info!(addr = %http_addr(&http_listener), "HTTP server listening");
            let result = axum::serve(http_listener, http_app)
                .with_graceful_shutdown(async move {
                    http_shutdown_rx.changed().await.ok();
                })
                .await;
            if let Err(e) = result {
                error!(error = %e, "HTTP server failed");
            }
        });

        let wyoming_handle = tokio::spawn(wyoming::serve(
            wyoming_listener,
            Arc::clone(&self.service),
            Arc::clone(&self.info),
            shutdown_rx,
        ));

        let advertisement = if self.config.discovery {
            discovery::advertise(PROGRAM_NAME, wyoming_port)
        } else {
            None
        };

        info!(
            http = %self.config.http_addr,
            wyoming = %self.config.wyoming_addr,
            voices = self.service.voices().len(),
            sample_rate = self.service.sample_rate(),
            "TTS server started"
        );

        shutdown_signal().await;

        info!("Shutdown signal received, stopping servers...");

        drop(advertisement);
        let _ = shutdown_tx.send(true);

        let timeout = Duration::from_secs(self.config.shutdown_timeout_secs);
        tokio::select! {
            _ = tokio::time::sleep(timeout) => {
                warn!("Shutdown timeout, forcing exit");
            }
            _ = async {
                let _ = http_handle.await;
                let _ = wyoming_handle.await;
            } => {
                info!("Servers stopped gracefully");
            }
        }

        Ok(())
    }
}

fn http_addr(listener: &TcpListener) -> String {
    listener
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Wait for shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tts_core::{EngineOutput, Lang, VoiceStyle};

    struct SilentEngine;

    impl SpeechEngine for SilentEngine {
        fn sample_rate(&self) -> u32 {
            0
        }

        fn synthesize(
            &self,
            _text: &str,
            _lang: Lang,
            _style: &VoiceStyle,
            _total_step: u32,
            _speed: f32,
        ) -> TtsResult<EngineOutput> {
            Err(TtsError::engine("unused"))
        }
    }

    fn config_in(dir: &std::path::Path) -> ServerConfig {
        ServerConfig {
            options_path: dir.join("options.json"),
            model_dir: dir.to_path_buf(),
            voices_dir: dir.to_path_buf(),
            discovery: false,
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr.port(), 8765);
        assert_eq!(config.wyoming_addr.port(), 10200);
        assert!(config.metrics_port.is_none());
    }

    #[test]
    fn test_bootstrap_loads_available_voices() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("M1.json"),
            r#"{"style_ttl": {"dims": [1], "data": [0.1]}, "style_dp": {"dims": [1], "data": [0.2]}}"#,
        )
        .unwrap();

        let server = TtsServer::bootstrap(config_in(dir.path())).unwrap();
        assert_eq!(server.service().voices().ids(), vec!["M1"]);
        assert_eq!(server.service().config(), &ServiceConfig::default());
        assert_eq!(server.info.tts[0].voices.len(), Lang::ALL.len());
    }

    #[test]
    fn test_zero_sample_rate_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = TtsServer::with_engine(config_in(dir.path()), Arc::new(SilentEngine));
        assert!(matches!(result, Err(TtsError::Bootstrap(_))));
    }

    #[test]
    fn test_missing_model_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            model_dir: dir.path().join("onnx"),
            ..config_in(dir.path())
        };
        assert!(matches!(
            TtsServer::bootstrap(config),
            Err(TtsError::Bootstrap(_))
        ));
    }

    #[test]
    fn test_invalid_options_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("options.json"), r#"{"default_language": "de"}"#).unwrap();
        assert!(matches!(
            TtsServer::bootstrap(config_in(dir.path())),
            Err(TtsError::Config(_))
        ));
    }
}
