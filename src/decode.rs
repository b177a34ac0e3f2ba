use std::sync::Arc;

use ndarray::ArrayView1;
use shakmaty::Setup;

use crate::{
    error::MaiaError,
    moves::{MoveVocabulary, mirror_uci},
    types::{EvaluationResult, MoveProbability},
};

/// Turns raw network outputs back into a policy over legal moves and a
/// win probability, both from the point of view of the actual side to
/// move.
#[derive(Debug, Clone)]
pub struct Decoder {
    vocab: Arc<MoveVocabulary>,
}

impl Decoder {
    pub fn new(vocab: Arc<MoveVocabulary>) -> Self {
        Self { vocab }
    }

    /// Decode the outputs for `original`, the position as given by the
    /// caller before any mirroring.
    pub fn decode_for(
        &self,
        original: &Setup,
        logits: ArrayView1<f32>,
        value_logit: f32,
        legal_moves: ArrayView1<f32>,
    ) -> Result<EvaluationResult, MaiaError> {
        self.decode(original.turn.is_black(), logits, value_logit, legal_moves)
    }

    /// Decode one item.
    ///
    /// The softmax runs over the legal moves only; illegal logits never
    /// enter the normalization.  If the input was mirrored, moves are
    /// mirrored back and the value is taken from the other side.
    pub fn decode(
        &self,
        mirrored: bool,
        logits: ArrayView1<f32>,
        value_logit: f32,
        legal_moves: ArrayView1<f32>,
    ) -> Result<EvaluationResult, MaiaError> {
        if logits.len() != self.vocab.len() {
            return Err(MaiaError::shape("move logits", self.vocab.len(), logits.len()));
        }
        if legal_moves.len() != self.vocab.len() {
            return Err(MaiaError::shape(
                "legal move mask",
                self.vocab.len(),
                legal_moves.len(),
            ));
        }

        let legal_indices: Vec<usize> = legal_moves
            .iter()
            .enumerate()
            .filter(|&(_, &m)| m > 0.0)
            .map(|(i, _)| i)
            .collect();
        let probabilities = softmax_restricted(logits, &legal_indices);

        let mut policy: Vec<MoveProbability> = legal_indices
            .iter()
            .zip(probabilities)
            .filter_map(|(&idx, probability)| {
                let uci = self.vocab.move_of(idx)?;
                // If the board was mirrored (Black's turn), report the
                // move as Black actually plays it.
                let uci = if mirrored { mirror_uci(uci) } else { uci.clone() };
                Some(MoveProbability { uci, probability })
            })
            .collect();

        // Sort by descending probability
        policy.sort_by(|a, b| b.probability.total_cmp(&a.probability));

        Ok(EvaluationResult {
            policy,
            value: win_probability(value_logit, mirrored),
        })
    }
}

/// Side-to-move win probability from a raw value logit, rounded to four
/// decimals.
pub fn win_probability(value_logit: f32, mirrored: bool) -> f32 {
    let mut win_prob = (value_logit / 2.0 + 0.5).clamp(0.0, 1.0);
    if mirrored {
        win_prob = 1.0 - win_prob;
    }
    (win_prob * 10_000.0).round() / 10_000.0
}

/// Numerically stable softmax over `logits[indices]`. The result is
/// aligned with `indices`; an empty index set gives an empty result.
pub fn softmax_restricted(logits: ArrayView1<f32>, indices: &[usize]) -> Vec<f32> {
    let max_logit = indices
        .iter()
        .map(|&i| logits[i])
        .fold(f32::NEG_INFINITY, f32::max);

    let exps: Vec<f32> = indices
        .iter()
        .map(|&i| (logits[i] - max_logit).exp())
        .collect();
    let sum_exp: f32 = exps.iter().sum();

    exps.into_iter().map(|e| e / sum_exp).collect()
}
