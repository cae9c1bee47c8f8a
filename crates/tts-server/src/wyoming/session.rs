//! Per-connection Wyoming session.

use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, error, info, warn};

use audio_codec::{CHUNK_SAMPLES, pcm16_chunks};
use runtime::SynthesisService;
use tts_core::{SynthesisResult, TtsError, TtsResult};

use super::event::{read_event, write_event};
use super::info::Info;
use super::messages::{AudioFormat, ClientEvent, Synthesize, audio_chunk, audio_start, audio_stop};

const SURFACE: &str = "wyoming";

/// Where a session is in handling the current command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Synthesizing,
    Streaming,
    Failed,
    Done,
}

/// Handles one connection: commands are processed strictly one at a time.
pub struct Session<R, W> {
    reader: R,
    writer: W,
    service: Arc<SynthesisService>,
    info: Arc<Info>,
    state: SessionState,
    chunk_samples: usize,
}

impl<R, W> Session<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, service: Arc<SynthesisService>, info: Arc<Info>) -> Self {
        Self {
            reader,
            writer,
            service,
            info,
            state: SessionState::Idle,
            chunk_samples: CHUNK_SAMPLES,
        }
    }

    /// Override the number of samples per audio chunk.
    pub fn with_chunk_samples(mut self, chunk_samples: usize) -> Self {
        self.chunk_samples = chunk_samples.max(1);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Serve events until the client closes the stream.
    ///
    /// I/O errors mean the peer went away; protocol errors end the session.
    pub async fn run(mut self) -> TtsResult<()> {
        while let Some(event) = read_event(&mut self.reader).await? {
            match ClientEvent::from(event) {
                ClientEvent::Describe => {
                    let info = self.info.to_event()?;
                    write_event(&mut self.writer, &info).await?;
                }
                ClientEvent::Synthesize(command) => self.handle_synthesize(command).await?,
                ClientEvent::Other(event_type) => {
                    debug!(event_type = %event_type, "Ignoring event");
                }
            }
        }

        debug!("Client closed connection");
        Ok(())
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "Session state");
        self.state = next;
    }

    async fn handle_synthesize(&mut self, command: TtsResult<Synthesize>) -> TtsResult<()> {
        self.transition(SessionState::Synthesizing);
        self.service.metrics().request_received(SURFACE);
        let start = Instant::now();

        match Self::synthesize(Arc::clone(&self.service), command).await {
            Ok(audio) => {
                self.transition(SessionState::Streaming);
                self.stream_audio(&audio).await?;
                let metrics = self.service.metrics();
                metrics.request_completed(SURFACE);
                metrics.record_request_latency(SURFACE, start.elapsed().as_secs_f64() * 1000.0);
            }
            Err(e) => {
                self.transition(SessionState::Failed);
                if e.is_caller_fault() {
                    warn!(error = %e, "Rejected synthesize command");
                } else {
                    error!(error = %e, "Synthesis failed");
                }
                self.service.metrics().request_errored(SURFACE, &e);
                write_event(&mut self.writer, &audio_stop()).await?;
            }
        }

        self.transition(SessionState::Done);
        self.transition(SessionState::Idle);
        Ok(())
    }

    async fn synthesize(
        service: Arc<SynthesisService>,
        command: TtsResult<Synthesize>,
    ) -> TtsResult<SynthesisResult> {
        let command = command?;
        let request = service
            .resolver()
            .resolve_voice_token(command.text.clone(), command.voice_token())?;

        info!(voice = %request.voice, lang = %request.lang, "Synthesize command");
        service.synthesize(request).await
    }

    async fn stream_audio(&mut self, audio: &SynthesisResult) -> TtsResult<()> {
        let format = AudioFormat::pcm16(audio.sample_rate);

        write_event(&mut self.writer, &audio_start(format)).await?;

        let mut chunks = 0usize;
        for pcm in pcm16_chunks(&audio.samples, self.chunk_samples) {
            write_event(&mut self.writer, &audio_chunk(format, pcm)).await?;
            chunks += 1;
        }

        write_event(&mut self.writer, &audio_stop()).await?;

        debug!(chunks, samples = audio.num_samples(), "Streamed audio");
        Ok(())
    }
}

/// Whether a session error is just the peer disconnecting.
pub fn is_disconnect(err: &TtsError) -> bool {
    matches!(err, TtsError::Io(_))
}
