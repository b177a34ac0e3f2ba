use std::sync::Arc;

use log::debug;
use shakmaty::{Setup, fen::Fen};

use crate::{
    config::MaiaConfig,
    decode::Decoder,
    elo::EloBuckets,
    engine::{Backend, InferenceEngine, OrtEngine},
    error::MaiaError,
    moves::MoveVocabulary,
    tensor::{EncodedPosition, Encoder, stack},
    types::EvaluationResult,
};

/// Evaluates chess positions with the Maia2 network.
///
/// Each call encodes the positions, runs the engine once and decodes
/// every item on its own, so a position scores the same whether it is
/// evaluated alone or as part of a batch.
pub struct Maia<E = OrtEngine> {
    engine: E,
    encoder: Encoder,
    decoder: Decoder,
}

impl Maia<OrtEngine> {
    /// Initialize from a local `.onnx` file path
    pub fn from_file(path: &str) -> Result<Self, MaiaError> {
        Self::new(OrtEngine::from_file(path, Backend::default())?)
    }

    /// Initialize from raw bytes
    pub fn from_memory(model_bytes: &[u8]) -> Result<Self, MaiaError> {
        Self::new(OrtEngine::from_memory(model_bytes, Backend::default())?)
    }

    pub fn from_config(config: &MaiaConfig) -> Result<Self, MaiaError> {
        Self::with_buckets(OrtEngine::from_config(config)?, config.elo)
    }
}

impl<E: InferenceEngine> Maia<E> {
    /// Wrap an engine, using the built-in move table and rating buckets.
    pub fn new(engine: E) -> Result<Self, MaiaError> {
        Self::with_buckets(engine, EloBuckets::default())
    }

    /// Wrap an engine with custom rating buckets and the built-in move table.
    pub fn with_buckets(engine: E, buckets: EloBuckets) -> Result<Self, MaiaError> {
        let vocab = Arc::new(MoveVocabulary::load()?);
        Ok(Self::with_parts(engine, vocab, buckets))
    }

    pub fn with_parts(engine: E, vocab: Arc<MoveVocabulary>, buckets: EloBuckets) -> Self {
        Self {
            engine,
            encoder: Encoder::new(vocab.clone(), buckets),
            decoder: Decoder::new(vocab),
        }
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn evaluate(
        &mut self,
        fen: &str,
        elo_self: i32,
        elo_oppo: i32,
    ) -> Result<EvaluationResult, MaiaError> {
        let setup: Setup = fen.parse::<Fen>()?.into();
        self.evaluate_setup(setup, elo_self, elo_oppo)
    }

    pub fn evaluate_setup(
        &mut self,
        setup: Setup,
        elo_self: i32,
        elo_oppo: i32,
    ) -> Result<EvaluationResult, MaiaError> {
        let mut results = self.batch_evaluate([setup], &[elo_self], &[elo_oppo])?;
        results.pop().ok_or(MaiaError::shape("evaluation results", 1, 0))
    }

    /// Evaluate FEN strings in a single inference call.
    pub fn batch_evaluate_fens(
        &mut self,
        fens: &[&str],
        elo_selfs: &[i32],
        elo_oppos: &[i32],
    ) -> Result<Vec<EvaluationResult>, MaiaError> {
        let setups = fens
            .iter()
            .map(|fen| -> Result<Setup, MaiaError> { Ok(fen.parse::<Fen>()?.into_setup()) })
            .collect::<Result<Vec<Setup>, MaiaError>>()?;
        self.batch_evaluate(setups, elo_selfs, elo_oppos)
    }

    /// Evaluate several positions in a single inference call.
    ///
    /// The slices must have one rating per position; result `i` belongs
    /// to position `i`.  If any position fails to encode, nothing is
    /// evaluated and the error is returned.
    pub fn batch_evaluate(
        &mut self,
        setups: impl IntoIterator<Item = Setup>,
        elo_selfs: &[i32],
        elo_oppos: &[i32],
    ) -> Result<Vec<EvaluationResult>, MaiaError> {
        let setups: Vec<Setup> = setups.into_iter().collect();
        let batch_size = setups.len();
        if elo_selfs.len() != batch_size {
            return Err(MaiaError::shape("elo_selfs", batch_size, elo_selfs.len()));
        }
        if elo_oppos.len() != batch_size {
            return Err(MaiaError::shape("elo_oppos", batch_size, elo_oppos.len()));
        }
        if batch_size == 0 {
            return Ok(Vec::new());
        }

        // 1. Preprocess
        let encoded = setups
            .iter()
            .zip(elo_selfs.iter().zip(elo_oppos))
            .map(|(setup, (&elo_self, &elo_oppo))| self.encoder.encode(setup, elo_self, elo_oppo))
            .collect::<Result<Vec<EncodedPosition>, MaiaError>>()?;

        // 2. Run Inference
        debug!("running Maia2 inference on {batch_size} position(s)");
        let output = self.engine.run(stack(&encoded)?)?;
        output.validate(batch_size, self.encoder.vocabulary().len())?;

        // 3. Postprocess into EvaluationResults
        encoded
            .iter()
            .enumerate()
            .map(|(i, item)| {
                self.decoder.decode(
                    item.mirrored,
                    output.logits_maia.row(i),
                    output.logits_value[i],
                    item.legal_moves.view(),
                )
            })
            .collect()
    }
}
