use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{elo::EloBuckets, engine::Backend, error::MaiaError};

/// Settings for building a [`crate::Maia`] backed by an ONNX model.
///
/// Only `model_path` is required:
///
/// ```json
/// { "model_path": "maia_rapid.onnx", "backend": "tract",
///   "elo": { "start": 1100, "end": 2000, "interval": 100 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaiaConfig {
    pub model_path: PathBuf,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub elo: EloBuckets,
}

impl MaiaConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            backend: Backend::default(),
            elo: EloBuckets::default(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, MaiaError> {
        // Bucket ranges are checked by `EloBuckets::new` during deserialization.
        serde_json::from_str(json).map_err(|e| MaiaError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MaiaError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| MaiaError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }
}
