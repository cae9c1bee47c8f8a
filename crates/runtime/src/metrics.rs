//! Metrics collection and Prometheus export.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tts_core::{TtsError, TtsResult};

/// Metrics recorder for TTS operations.
///
/// Without an installed exporter every call is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct TtsMetrics;

impl TtsMetrics {
    /// Install the Prometheus exporter on `port` and describe the metrics.
    pub fn init(port: u16) -> TtsResult<Self> {
        let addr: SocketAddr = ([0, 0, 0, 0], port).into();

        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| TtsError::internal(format!("metrics init failed: {e}")))?;

        Self::register_metrics();

        Ok(Self)
    }

    /// Metrics handle without an exporter (for tests and when disabled).
    pub fn init_noop() -> Self {
        Self
    }

    fn register_metrics() {
        describe_counter!(
            "tts_requests_total",
            "Total number of synthesis requests received"
        );
        describe_counter!(
            "tts_requests_completed",
            "Synthesis requests that produced audio"
        );
        describe_counter!(
            "tts_requests_rejected",
            "Synthesis requests rejected for invalid input"
        );
        describe_counter!(
            "tts_requests_failed",
            "Synthesis requests that failed inside the service"
        );
        describe_histogram!(
            "tts_request_latency_ms",
            "End-to-end request latency in milliseconds"
        );
        describe_histogram!(
            "tts_inference_latency_ms",
            "Engine inference latency in milliseconds"
        );
        describe_histogram!(
            "tts_rtf",
            "Real-time factor (inference time / audio duration)"
        );
    }

    /// Record a new request on the given surface (`http` or `wyoming`).
    pub fn request_received(&self, surface: &'static str) {
        counter!("tts_requests_total", "surface" => surface).increment(1);
    }

    /// Record a request that produced audio.
    pub fn request_completed(&self, surface: &'static str) {
        counter!("tts_requests_completed", "surface" => surface).increment(1);
    }

    /// Record a request that ended in an error.
    pub fn request_errored(&self, surface: &'static str, err: &TtsError) {
        if err.is_caller_fault() {
            counter!("tts_requests_rejected", "surface" => surface).increment(1);
        } else {
            counter!("tts_requests_failed", "surface" => surface).increment(1);
        }
    }

    /// Record end-to-end latency of a request that produced audio.
    pub fn record_request_latency(&self, surface: &'static str, ms: f64) {
        histogram!("tts_request_latency_ms", "surface" => surface).record(ms);
    }

    /// Record engine inference latency.
    pub fn record_inference_latency(&self, ms: f64) {
        histogram!("tts_inference_latency_ms").record(ms);
    }

    /// Record real-time factor.
    pub fn record_rtf(&self, rtf: f64) {
        histogram!("tts_rtf").record(rtf);
    }
}
