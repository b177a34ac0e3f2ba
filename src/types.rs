use std::collections::HashMap;

use shakmaty::uci::UciMove;

#[derive(Debug, Clone, PartialEq)]
pub struct MoveProbability {
    pub uci: UciMove,
    pub probability: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    /// List of legal moves and their probabilities, sorted highest to lowest
    pub policy: Vec<MoveProbability>,
    /// Win probability (0.0 to 1.0) for the side to move
    pub value: f32,
}

impl EvaluationResult {
    /// Probability assigned to `uci`, if it is a tracked legal move.
    pub fn probability_of(&self, uci: &UciMove) -> Option<f32> {
        self.policy
            .iter()
            .find(|m| &m.uci == uci)
            .map(|m| m.probability)
    }

    /// Most likely move, `None` when there are no legal moves.
    pub fn best_move(&self) -> Option<&MoveProbability> {
        self.policy.first()
    }

    /// Policy keyed by UCI string.
    pub fn to_map(&self) -> HashMap<String, f32> {
        self.policy
            .iter()
            .map(|m| (m.uci.to_string(), m.probability))
            .collect()
    }
}
