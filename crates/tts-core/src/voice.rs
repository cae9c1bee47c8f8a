//! Voice style assets and the startup-populated voice table.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{TtsError, TtsResult};

/// A dense tensor stored as its shape plus row-major data.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleTensor {
    pub dims: Vec<usize>,
    pub data: Vec<f32>,
}

impl StyleTensor {
    /// Build a tensor, checking that the data fills the shape exactly.
    pub fn new(dims: Vec<usize>, data: Vec<f32>) -> TtsResult<Self> {
        let expected: usize = dims.iter().product();
        if expected != data.len() {
            return Err(TtsError::Serialization(format!(
                "tensor shape {dims:?} needs {expected} values, found {}",
                data.len()
            )));
        }
        Ok(Self { dims, data })
    }
}

#[derive(Deserialize)]
struct RawTensor {
    dims: Vec<usize>,
    data: Value,
}

#[derive(Deserialize)]
struct RawStyle {
    style_ttl: RawTensor,
    style_dp: RawTensor,
}

/// Speaker style bundle consumed by the engine.
///
/// The contents are opaque to the service; only the engine interprets them.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceStyle {
    /// Style conditioning for the text-to-latent stage.
    pub ttl: StyleTensor,
    /// Style conditioning for the duration predictor.
    pub dp: StyleTensor,
}

impl VoiceStyle {
    /// Parse a style document (`{"style_ttl": {...}, "style_dp": {...}}`).
    pub fn from_json(raw: &str) -> TtsResult<Self> {
        let raw: RawStyle = serde_json::from_str(raw)?;
        Ok(Self {
            ttl: tensor_from_raw(raw.style_ttl)?,
            dp: tensor_from_raw(raw.style_dp)?,
        })
    }

    /// Load a style document from disk.
    pub fn load(path: impl AsRef<Path>) -> TtsResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| TtsError::asset_load(path, e.to_string()))?;
        Self::from_json(&raw).map_err(|e| TtsError::asset_load(path, e.to_string()))
    }
}

fn tensor_from_raw(raw: RawTensor) -> TtsResult<StyleTensor> {
    let mut data = Vec::new();
    flatten_into(&raw.data, &mut data)?;
    StyleTensor::new(raw.dims, data)
}

fn flatten_into(value: &Value, out: &mut Vec<f32>) -> TtsResult<()> {
    match value {
        Value::Number(n) => {
            let v = n
                .as_f64()
                .ok_or_else(|| TtsError::Serialization(format!("non-finite value {n}")))?;
            out.push(v as f32);
        }
        Value::Array(items) => {
            for item in items {
                flatten_into(item, out)?;
            }
        }
        other => {
            return Err(TtsError::Serialization(format!(
                "unexpected tensor element: {other}"
            )));
        }
    }
    Ok(())
}

/// Voice id → style mapping, immutable once built.
#[derive(Debug, Clone, Default)]
pub struct VoiceTable {
    styles: BTreeMap<String, VoiceStyle>,
}

impl VoiceTable {
    /// Load `<dir>/<id>.json` for every id.
    ///
    /// Missing or unreadable assets are logged and skipped.
    pub fn load<'a>(dir: impl AsRef<Path>, ids: impl IntoIterator<Item = &'a str>) -> Self {
        let dir = dir.as_ref();
        let mut styles = BTreeMap::new();

        for id in ids {
            let path = dir.join(format!("{id}.json"));
            if !path.exists() {
                warn!(voice = id, path = %path.display(), "Voice file not found");
                continue;
            }
            match VoiceStyle::load(&path) {
                Ok(style) => {
                    info!(voice = id, "Loaded voice");
                    styles.insert(id.to_string(), style);
                }
                Err(e) => warn!(voice = id, error = %e, "Skipping unreadable voice style"),
            }
        }

        info!(count = styles.len(), "Loaded voice styles");
        Self { styles }
    }

    /// Build a table from already loaded styles.
    pub fn from_styles(styles: impl IntoIterator<Item = (String, VoiceStyle)>) -> Self {
        Self {
            styles: styles.into_iter().collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&VoiceStyle> {
        self.styles.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.styles.contains_key(id)
    }

    /// Loaded voice ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        self.styles.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}
