//! Encoding and decoding pipeline for the Maia2 chess model.
//!
//! Maia2 is a policy + value network that predicts how a human of a
//! given rating plays a position.  This crate turns FEN strings or
//! `shakmaty` setups into the tensors the network expects, and turns
//! the network's raw logits back into a probability for every legal
//! move plus a win probability for the side to move.
//!
//! The pieces, leaf first:
//!
//! - [`MoveVocabulary`]: the fixed move ↔ output-index table.
//! - [`EloBuckets`]: rating → category mapping.
//! - [`Encoder`]: position → `[18, 8, 8]` board tensor and legal move
//!   mask, mirrored so the network always sees White to move.
//! - [`Decoder`]: logits → legal-move policy and win probability in the
//!   caller's orientation.
//! - [`Maia`]: runs the three around an [`InferenceEngine`], one
//!   position at a time or batched.  [`OrtEngine`] runs the exported
//!   ONNX graph.
//!
//! The library re‑exports `shakmaty` to make position construction easy.

mod config;
mod decode;
mod elo;
mod engine;
mod error;
mod maia;
mod moves;
mod tensor;
mod types;

/// Main model wrapper.
pub use maia::Maia;

/// Error type produced by library operations.
pub use error::MaiaError;

/// Output data structures returned by evaluations.
pub use types::{EvaluationResult, MoveProbability};

pub use config::MaiaConfig;
pub use decode::{Decoder, softmax_restricted, win_probability};
pub use elo::EloBuckets;
pub use engine::{Backend, InferenceEngine, InferenceOutput, InferenceRequest, OrtEngine};
pub use moves::{MoveVocabulary, mirror_square, mirror_uci};
pub use tensor::{CHANNELS, EncodedPosition, Encoder, board_tensor, canonicalize, mirror_fen, stack};

/// Re-export of `shakmaty` for convenience when building positions.
pub use shakmaty;
