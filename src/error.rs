//! Error types for the Maia2 evaluation pipeline.
//!
//! A single `thiserror` enumeration covers every failure the pipeline
//! can report: malformed positions, tensors of the wrong shape, a
//! corrupt move table, bad configuration and errors surfaced by the
//! inference runtime. Moves that are legal but absent from the move
//! vocabulary are not errors; they are skipped.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaiaError {
    /// Wraps an error returned by the underlying ONNX Runtime bindings.
    #[error("ONNX Runtime error: {0}")]
    OrtError(#[from] ort::Error),

    /// The provided FEN string could not be parsed (bad placement,
    /// side to move, castling or en passant field).
    #[error("Invalid FEN: {0}")]
    InvalidFen(#[from] shakmaty::fen::ParseFenError),

    /// A parsed position is rejected by the chess rules engine.
    #[error("Invalid Chess Position: {0}")]
    InvalidPosition(#[from] shakmaty::PositionError<shakmaty::Chess>),

    /// A tensor or slice does not have the length the pipeline expects.
    #[error("Shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The frozen move table is not a bijection onto `0..len`.
    #[error("Invalid move vocabulary: {0}")]
    Vocabulary(String),

    /// Configuration could not be read or deserialized.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Occurs when an ndarray has an unexpected shape during tensor
    /// preparation or extraction.
    #[error("Tensor shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),
}

impl MaiaError {
    pub(crate) fn shape(what: &'static str, expected: usize, actual: usize) -> Self {
        MaiaError::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }
}
