use std::collections::HashMap;

use shakmaty::{Bitboard, Role, Square, attacks, uci::UciMove};

use crate::error::MaiaError;

// JSON representation of the fixed move vocabulary used by Maia2.  The
// file maps UCI strings to indices in the model's output layer.  The
// `include_str!` macro embeds the data at compile time, avoiding an
// extra filesystem dependency at runtime.
const ALL_MOVES_JSON: &str = include_str!("data/all_moves.json");

/// Promotion pieces in the order the network's output layer lists them.
const PROMOTION_ROLES: [Role; 4] = [Role::Queen, Role::Rook, Role::Bishop, Role::Knight];

/// Bijection between UCI moves and indices of the network's policy head.
///
/// The index order is fixed by the trained model. It is shipped as a
/// frozen table and loaded once; [`MoveVocabulary::generate`] re-derives
/// the same table and only exists so the frozen copy can be verified.
#[derive(Debug, Clone)]
pub struct MoveVocabulary {
    moves: Vec<UciMove>,
    index: HashMap<UciMove, usize>,
}

impl MoveVocabulary {
    /// Parse the embedded move table.
    pub fn load() -> Result<Self, MaiaError> {
        Self::from_json(ALL_MOVES_JSON)
    }

    /// Parse a `{"uci": index, ...}` table. Indices must cover
    /// `0..len` exactly once.
    pub fn from_json(json: &str) -> Result<Self, MaiaError> {
        let parsed: HashMap<String, usize> =
            serde_json::from_str(json).map_err(|e| MaiaError::Vocabulary(e.to_string()))?;

        let mut slots: Vec<Option<UciMove>> = vec![None; parsed.len()];
        for (uci_str, idx) in parsed {
            let uci: UciMove = uci_str
                .parse()
                .map_err(|e| MaiaError::Vocabulary(format!("{uci_str}: {e}")))?;
            let slot = slots.get_mut(idx).ok_or_else(|| {
                MaiaError::Vocabulary(format!("index {idx} of {uci_str} is out of range"))
            })?;
            if slot.replace(uci).is_some() {
                return Err(MaiaError::Vocabulary(format!("index {idx} is assigned twice")));
            }
        }

        // Every slot is filled: len entries landed on len distinct indices.
        Self::from_moves(slots.into_iter().flatten().collect())
    }

    /// Build a vocabulary whose indices follow the order of `moves`.
    pub fn from_moves(moves: Vec<UciMove>) -> Result<Self, MaiaError> {
        let mut index = HashMap::with_capacity(moves.len());
        for (i, uci) in moves.iter().enumerate() {
            if index.insert(uci.clone(), i).is_some() {
                return Err(MaiaError::Vocabulary(format!("duplicate move {uci}")));
            }
        }
        Ok(Self { moves, index })
    }

    /// Derive the table from first principles.
    ///
    /// For every square from a1 to h8, the destinations of a lone queen
    /// followed by those of a lone knight, each from the highest square
    /// down.  Then White's promotions (straight push, capture towards
    /// the lower file, capture towards the higher file) for each file.
    /// Black never moves from the network's point of view, so Black's
    /// promotions are absent.
    pub fn generate() -> Self {
        let mut moves = Vec::with_capacity(1880);

        for from in Square::ALL {
            let queen = attacks::queen_attacks(from, Bitboard::EMPTY);
            let knight = attacks::knight_attacks(from);
            for targets in [queen, knight] {
                let mut squares: Vec<Square> = targets.into_iter().collect();
                squares.reverse();
                moves.extend(squares.into_iter().map(|to| UciMove::Normal {
                    from,
                    to,
                    promotion: None,
                }));
            }
        }

        for file in 0..8u32 {
            let from = Square::new(48 + file);
            let mut targets = vec![Square::new(56 + file)];
            if file > 0 {
                targets.push(Square::new(56 + file - 1));
            }
            if file < 7 {
                targets.push(Square::new(56 + file + 1));
            }
            for to in targets {
                moves.extend(PROMOTION_ROLES.iter().map(|&role| UciMove::Normal {
                    from,
                    to,
                    promotion: Some(role),
                }));
            }
        }

        Self::from_moves(moves).expect("generated moves are distinct")
    }

    /// Number of entries, i.e. the width of the policy head.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn index_of(&self, uci: &UciMove) -> Option<usize> {
        self.index.get(uci).copied()
    }

    pub fn move_of(&self, index: usize) -> Option<&UciMove> {
        self.moves.get(index)
    }

    /// Entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &UciMove)> {
        self.moves.iter().enumerate()
    }
}

/// Flip a square's rank (`rank' = 9 - rank`), keeping its file.
pub fn mirror_square(square: Square) -> Square {
    square.flip_vertical()
}

/// Express a move from the other side's point of view: both squares are
/// mirrored, the promotion piece is unchanged.
pub fn mirror_uci(uci: &UciMove) -> UciMove {
    uci.to_mirrored()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uci(s: &str) -> UciMove {
        s.parse().unwrap()
    }

    #[test]
    fn test_all_moves_loaded() {
        let vocab = MoveVocabulary::load().unwrap();
        assert_eq!(vocab.len(), 1880);
        assert_eq!(vocab.move_of(0), Some(&uci("a1h8")));
        assert_eq!(vocab.move_of(1), Some(&uci("a1a8")));
        assert_eq!(vocab.move_of(1879), Some(&uci("h7g8n")));
        assert_eq!(vocab.move_of(1880), None);
    }

    #[test]
    fn frozen_table_matches_generated() {
        let frozen = MoveVocabulary::load().unwrap();
        let generated = MoveVocabulary::generate();
        assert_eq!(frozen.len(), generated.len());
        for (i, m) in generated.iter() {
            assert_eq!(frozen.move_of(i), Some(m), "index {i}");
        }
    }

    #[test]
    fn round_trips_every_index() {
        let vocab = MoveVocabulary::load().unwrap();
        for i in 0..vocab.len() {
            let m = vocab.move_of(i).unwrap();
            assert_eq!(vocab.index_of(m), Some(i));
        }
        for (_, m) in MoveVocabulary::generate().iter() {
            let i = vocab.index_of(m).unwrap();
            assert_eq!(vocab.move_of(i), Some(m));
        }
    }

    #[test]
    fn tracks_castling_and_promotions() {
        let vocab = MoveVocabulary::load().unwrap();
        assert!(vocab.index_of(&uci("e1g1")).is_some());
        assert!(vocab.index_of(&uci("e1c1")).is_some());
        assert!(vocab.index_of(&uci("g1f3")).is_some());
        assert!(vocab.index_of(&uci("e7e8q")).is_some());
        assert!(vocab.index_of(&uci("b7a8n")).is_some());
        // Black promotions never reach the network.
        assert!(vocab.index_of(&uci("e2e1q")).is_none());
        // Not a queen or knight move.
        assert!(vocab.index_of(&uci("a1b3")).is_some());
        assert!(vocab.index_of(&uci("a1c4")).is_none());
    }

    #[test]
    fn rejects_malformed_tables() {
        assert!(MoveVocabulary::from_json(r#"{"e2e4": 0, "d2d4": 0}"#).is_err());
        assert!(MoveVocabulary::from_json(r#"{"e2e4": 0, "d2d4": 2}"#).is_err());
        assert!(MoveVocabulary::from_json(r#"{"e2e4": 0, "zz": 1}"#).is_err());
        assert!(MoveVocabulary::from_moves(vec![uci("e2e4"), uci("e2e4")]).is_err());
        let ok = MoveVocabulary::from_json(r#"{"e2e4": 1, "d2d4": 0}"#).unwrap();
        assert_eq!(ok.move_of(0), Some(&uci("d2d4")));
    }

    #[test]
    fn mirrors_ranks_only() {
        assert_eq!(mirror_uci(&uci("e2e4")), uci("e7e5"));
        assert_eq!(mirror_uci(&uci("g1f3")), uci("g8f6"));
        assert_eq!(mirror_uci(&uci("b7a8q")), uci("b2a1q"));
        assert_eq!(mirror_square(Square::E3), Square::E6);
        assert_eq!(mirror_uci(&mirror_uci(&uci("h7g8n"))), uci("h7g8n"));
    }
}
