//! Boundary between the encoding pipeline and the neural network.
//!
//! The pipeline only needs "tensors in, logits out"; anything that can
//! run the Maia2 graph implements [`InferenceEngine`]. [`OrtEngine`] is
//! the ONNX implementation, running on one of the pure Rust runtimes
//! that `ort` can be pointed at.

use std::{path::Path, sync::OnceLock};

use log::{info, warn};
use ndarray::{Array1, Array2, Array4, Ix2};
use ort::{session::Session, value::Tensor};
use serde::{Deserialize, Serialize};

use crate::{config::MaiaConfig, error::MaiaError, tensor::CHANNELS};

/// Inputs of one inference call.
///
/// - `boards`: `[B, 18, 8, 8]`
/// - `elo_self`, `elo_oppo`: `[B]` rating categories
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub boards: Array4<f32>,
    pub elo_self: Array1<i64>,
    pub elo_oppo: Array1<i64>,
}

impl InferenceRequest {
    pub fn new(
        boards: Array4<f32>,
        elo_self: Array1<i64>,
        elo_oppo: Array1<i64>,
    ) -> Result<Self, MaiaError> {
        let shape = boards.shape();
        let batch = shape[0];
        if shape[1] != CHANNELS {
            return Err(MaiaError::shape("board channels", CHANNELS, shape[1]));
        }
        if shape[2] != 8 || shape[3] != 8 {
            return Err(MaiaError::shape("board squares", 64, shape[2] * shape[3]));
        }
        if elo_self.len() != batch {
            return Err(MaiaError::shape("elo_self", batch, elo_self.len()));
        }
        if elo_oppo.len() != batch {
            return Err(MaiaError::shape("elo_oppo", batch, elo_oppo.len()));
        }
        Ok(Self {
            boards,
            elo_self,
            elo_oppo,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.boards.shape()[0]
    }
}

/// Raw outputs of one inference call.
///
/// - `logits_maia`: `[B, V]` per-move logits
/// - `logits_value`: `[B]` value logits
#[derive(Debug, Clone)]
pub struct InferenceOutput {
    pub logits_maia: Array2<f32>,
    pub logits_value: Array1<f32>,
}

impl InferenceOutput {
    /// Check the outputs line up with a batch of `batch` positions over a
    /// vocabulary of `vocab_len` moves.
    pub fn validate(&self, batch: usize, vocab_len: usize) -> Result<(), MaiaError> {
        let (rows, cols) = self.logits_maia.dim();
        if rows != batch {
            return Err(MaiaError::shape("logits_maia batch", batch, rows));
        }
        if cols != vocab_len {
            return Err(MaiaError::shape("logits_maia moves", vocab_len, cols));
        }
        if self.logits_value.len() != batch {
            return Err(MaiaError::shape("logits_value", batch, self.logits_value.len()));
        }
        Ok(())
    }
}

/// Anything that can run the Maia2 network.
pub trait InferenceEngine {
    fn run(&mut self, request: InferenceRequest) -> Result<InferenceOutput, MaiaError>;
}

/// Pure Rust runtime backing `ort`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Tract,
    Candle,
}

/// Runtime handed to `ort`; it keeps the first one for the whole process.
static INSTALLED_BACKEND: OnceLock<Backend> = OnceLock::new();

impl Backend {
    /// Point `ort` at this runtime. Must happen before the first session
    /// is built.  Returns `false`, and logs a warning, if a different
    /// runtime is already in use.
    pub fn install(self) -> bool {
        let active = *INSTALLED_BACKEND.get_or_init(|| {
            let accepted = match self {
                Backend::Tract => ort::set_api(ort_tract::api()),
                Backend::Candle => ort::set_api(ort_candle::api()),
            };
            if !accepted {
                warn!("ort refused the {self:?} runtime, it already has one installed");
            }
            self
        });
        if active != self {
            warn!("{self:?} requested but sessions keep running on {active:?}");
        }
        active == self
    }
}

/// ONNX session running the exported Maia2 graph.
pub struct OrtEngine {
    session: Session,
}

impl OrtEngine {
    /// Initialize from a local `.onnx` file path
    pub fn from_file(path: impl AsRef<Path>, backend: Backend) -> Result<Self, MaiaError> {
        backend.install();
        let path = path.as_ref();
        let session = Session::builder()?.commit_from_file(path)?;
        info!("loaded Maia2 model from {} ({backend:?})", path.display());

        Ok(Self { session })
    }

    /// Initialize from raw bytes
    pub fn from_memory(model_bytes: &[u8], backend: Backend) -> Result<Self, MaiaError> {
        backend.install();
        let session = Session::builder()?.commit_from_memory(model_bytes)?;
        info!("loaded Maia2 model from {} bytes ({backend:?})", model_bytes.len());

        Ok(Self { session })
    }

    pub fn from_config(config: &MaiaConfig) -> Result<Self, MaiaError> {
        Self::from_file(&config.model_path, config.backend)
    }
}

impl InferenceEngine for OrtEngine {
    fn run(&mut self, request: InferenceRequest) -> Result<InferenceOutput, MaiaError> {
        let outputs = self.session.run(ort::inputs! {
                "boards" => Tensor::from_array(request.boards)?,
                "elo_self" => Tensor::from_array(request.elo_self)?,
                "elo_oppo" => Tensor::from_array(request.elo_oppo)?,
        })?;

        let logits_maia = outputs["logits_maia"]
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix2>()?
            .to_owned();

        // Exported graphs emit `[B, 1]`; flatten to one value per item.
        let logits_value: Array1<f32> = outputs["logits_value"]
            .try_extract_array::<f32>()?
            .iter()
            .copied()
            .collect();

        Ok(InferenceOutput {
            logits_maia,
            logits_value,
        })
    }
}
