//! Wyoming event framing.
//!
//! Each event is a JSON header line, optionally followed by `data_length`
//! bytes of JSON data and `payload_length` bytes of binary payload:
//!
//! ```text
//! {"type": "audio-chunk", "data_length": 40, "payload_length": 2048}\n
//! {"rate": 44100, "width": 2, "channels": 1}<2048 bytes of PCM>
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use tts_core::{TtsError, TtsResult};

/// Protocol version written into every header.
pub const PROTOCOL_VERSION: &str = "1.5.4";

/// Upper bound for a data or payload section.
const MAX_SECTION_BYTES: usize = 16 * 1024 * 1024;

/// Upper bound for one header line, newline included.
const MAX_HEADER_BYTES: usize = 1024 * 1024;

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

/// A single protocol event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    pub event_type: String,
    pub data: Map<String, Value>,
    pub payload: Option<Vec<u8>>,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            ..Self::default()
        }
    }

    /// Attach data; non-object values are ignored.
    pub fn with_data(mut self, data: Value) -> Self {
        if let Value::Object(map) = data {
            self.data = map;
        }
        self
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn is_type(&self, event_type: &str) -> bool {
        self.event_type == event_type
    }
}

fn check_section(kind: &str, len: usize) -> TtsResult<()> {
    if len > MAX_SECTION_BYTES {
        return Err(TtsError::protocol(format!(
            "{kind} section of {len} bytes exceeds limit"
        )));
    }
    Ok(())
}

/// Read the next event. Returns `None` on a clean end of stream.
pub async fn read_event<R>(reader: &mut R) -> TtsResult<Option<Event>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    loop {
        line.clear();
        let read = (&mut *reader)
            .take(MAX_HEADER_BYTES as u64)
            .read_until(b'\n', &mut line)
            .await?;
        if read == 0 {
            return Ok(None);
        }
        if read == MAX_HEADER_BYTES && line.last() != Some(&b'\n') {
            return Err(TtsError::protocol(format!(
                "event header exceeds {MAX_HEADER_BYTES} bytes"
            )));
        }
        if !line.trim_ascii().is_empty() {
            break;
        }
    }

    let header: Header = serde_json::from_slice(line.trim_ascii())
        .map_err(|e| TtsError::protocol(format!("invalid event header: {e}")))?;

    let mut data = header.data.unwrap_or_default();

    if let Some(len) = header.data_length.filter(|len| *len > 0) {
        check_section("data", len)?;
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf).await?;
        let extra: Map<String, Value> = serde_json::from_slice(&buf)
            .map_err(|e| TtsError::protocol(format!("invalid event data: {e}")))?;
        data.extend(extra);
    }

    let payload = match header.payload_length.filter(|len| *len > 0) {
        Some(len) => {
            check_section("payload", len)?;
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf).await?;
            Some(buf)
        }
        None => None,
    };

    Ok(Some(Event {
        event_type: header.event_type,
        data,
        payload,
    }))
}

/// Write one event and flush it.
pub async fn write_event<W>(writer: &mut W, event: &Event) -> TtsResult<()>
where
    W: AsyncWrite + Unpin,
{
    let data = if event.data.is_empty() {
        None
    } else {
        Some(serde_json::to_vec(&event.data)?)
    };
    let payload = event.payload.as_deref().filter(|p| !p.is_empty());

    let header = Header {
        event_type: event.event_type.clone(),
        data: None,
        data_length: data.as_ref().map(Vec::len),
        payload_length: payload.map(<[u8]>::len),
        version: Some(PROTOCOL_VERSION.to_string()),
    };

    let mut frame = serde_json::to_vec(&header)?;
    frame.push(b'\n');
    if let Some(data) = &data {
        frame.extend_from_slice(data);
    }
    if let Some(payload) = payload {
        frame.extend_from_slice(payload);
    }

    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}
