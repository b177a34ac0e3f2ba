use std::sync::Arc;

use log::{debug, trace};
use ndarray::{Array1, Array3, ArrayView3, ArrayViewMut3, Axis};
use shakmaty::{CastlingMode, Chess, Position, PositionError, Role, Setup, Square, fen::Fen};

use crate::{
    elo::EloBuckets, engine::InferenceRequest, error::MaiaError, moves::MoveVocabulary,
};

/// Number of input planes: 12 piece planes, turn, 4 castling rights
/// and the en passant square.
pub const CHANNELS: usize = 18;

/// Model input for a single position.
///
/// - `board` has shape `[18, 8, 8]`, indexed as `[channel, rank, file]`
///   with rank 1 and file a at index 0.
/// - `legal_moves` has one entry per vocabulary move: `1.0` for moves
///   that are legal in the (possibly mirrored) position, `0.0` otherwise.
/// - `mirrored` records whether Black was to move, in which case the
///   board was flipped before encoding and outputs must be flipped back.
#[derive(Debug, Clone)]
pub struct EncodedPosition {
    pub board: Array3<f32>,
    pub legal_moves: Array1<f32>,
    pub elo_self: i64,
    pub elo_oppo: i64,
    pub mirrored: bool,
}

/// Turns positions into the tensors expected by the Maia2 model.
#[derive(Debug, Clone)]
pub struct Encoder {
    vocab: Arc<MoveVocabulary>,
    buckets: EloBuckets,
}

impl Encoder {
    pub fn new(vocab: Arc<MoveVocabulary>, buckets: EloBuckets) -> Self {
        Self { vocab, buckets }
    }

    pub fn vocabulary(&self) -> &Arc<MoveVocabulary> {
        &self.vocab
    }

    pub fn buckets(&self) -> &EloBuckets {
        &self.buckets
    }

    pub fn encode_fen(
        &self,
        fen: &str,
        elo_self: i32,
        elo_oppo: i32,
    ) -> Result<EncodedPosition, MaiaError> {
        let setup = fen.parse::<Fen>()?.into_setup();
        self.encode(&setup, elo_self, elo_oppo)
    }

    /// Encode one position.
    ///
    /// maia2 only ever sees White to move: Black positions are mirrored
    /// first and `mirrored` is set on the result.
    pub fn encode(
        &self,
        setup: &Setup,
        elo_self: i32,
        elo_oppo: i32,
    ) -> Result<EncodedPosition, MaiaError> {
        let (canonical, mirrored) = canonicalize(setup.clone());
        if mirrored {
            debug!("mirrored black-to-move position before encoding");
        }

        let mut board = Array3::<f32>::zeros((CHANNELS, 8, 8));
        board_to_tensor(&canonical, board.view_mut());
        let legal_moves = self.legal_move_mask(&canonical)?;

        Ok(EncodedPosition {
            board,
            legal_moves,
            elo_self: self.buckets.category_of(elo_self),
            elo_oppo: self.buckets.category_of(elo_oppo),
            mirrored,
        })
    }

    /// Mask over the vocabulary marking the legal moves of `setup`, taken
    /// as is (no mirroring).
    ///
    /// Stale castling rights and en passant squares are dropped for move
    /// generation only; the board tensor still carries them.  A board
    /// without kings has no legal moves and yields an all-zero mask; any
    /// other position the rules engine rejects is an error.
    pub fn legal_move_mask(&self, setup: &Setup) -> Result<Array1<f32>, MaiaError> {
        let mut mask = Array1::<f32>::zeros(self.vocab.len());

        let chess = setup
            .clone()
            .position::<Chess>(CastlingMode::Standard)
            .or_else(PositionError::ignore_invalid_castling_rights)
            .or_else(PositionError::ignore_invalid_ep_square);
        let chess = match chess {
            Ok(chess) => chess,
            Err(_) if setup.board.kings().is_empty() => {
                debug!("position has no kings, encoding without legal moves");
                return Ok(mask);
            }
            Err(err) => return Err(err.into()),
        };

        for m in &chess.legal_moves() {
            let uci = m.to_uci(CastlingMode::Standard);
            match self.vocab.index_of(&uci) {
                Some(idx) => mask[idx] = 1.0,
                None => trace!("legal move {uci} is not tracked by the vocabulary"),
            }
        }
        Ok(mask)
    }
}

/// Bring a position into the network's frame of reference.
///
/// If Black is to move the board is flipped top to bottom, piece colors
/// are swapped, the turn passes to White, castling rights trade sides
/// and the en passant square's rank is mirrored.  Returns the position
/// and whether it was mirrored.  Mirroring twice is the identity.
pub fn canonicalize(mut setup: Setup) -> (Setup, bool) {
    let mirrored = setup.turn.is_black();
    if mirrored {
        setup.mirror();
    }
    (setup, mirrored)
}

/// Mirror a FEN string (flip ranks, swap colors, turn, castling rights
/// and en passant square). Move counters are kept.
pub fn mirror_fen(fen: &str) -> Result<String, MaiaError> {
    let mut setup = fen.parse::<Fen>()?.into_setup();
    setup.mirror();
    Ok(fen_string(setup))
}

fn fen_string(setup: Setup) -> String {
    Fen::try_from_setup(setup)
        .unwrap_or_else(|lossy| lossy.ignore())
        .to_string()
}

/// The 18-plane board tensor of `setup`, encoded as is (no mirroring).
pub fn board_tensor(setup: &Setup) -> Array3<f32> {
    let mut board = Array3::<f32>::zeros((CHANNELS, 8, 8));
    board_to_tensor(setup, board.view_mut());
    board
}

/// Concatenate encoded positions along a new leading batch axis,
/// preserving their order.
pub fn stack(encoded: &[EncodedPosition]) -> Result<InferenceRequest, MaiaError> {
    let views: Vec<ArrayView3<f32>> = encoded.iter().map(|e| e.board.view()).collect();
    let boards = ndarray::stack(Axis(0), &views)?;
    let elo_self = encoded.iter().map(|e| e.elo_self).collect();
    let elo_oppo = encoded.iter().map(|e| e.elo_oppo).collect();
    InferenceRequest::new(boards, elo_self, elo_oppo)
}

fn board_to_tensor(setup: &Setup, mut tensor: ArrayViewMut3<f32>) {
    // 1. Piece placement occupies channels 0..11.  We encode white pieces
    // in 0..5 and black pieces in 6..11.
    for sq in Square::ALL {
        if let Some(piece) = setup.board.piece_at(sq) {
            let color_offset = if piece.color.is_white() { 0 } else { 6 };
            let role_offset = match piece.role {
                Role::Pawn => 0,
                Role::Knight => 1,
                Role::Bishop => 2,
                Role::Rook => 3,
                Role::Queen => 4,
                Role::King => 5,
            };
            tensor[[color_offset + role_offset, sq.rank() as usize, sq.file() as usize]] = 1.0;
        }
    }

    // 2. Player's turn (channel 12): set all squares to 1 if white to move.
    tensor
        .index_axis_mut(Axis(0), 12)
        .fill(setup.turn.is_white() as u8 as f32);

    // 3. Castling rights (channels 13..16) are keyed by the original rook
    // squares: K, Q, k, q.
    let castling_rights = [
        setup.castling_rights.contains(Square::H1),
        setup.castling_rights.contains(Square::A1),
        setup.castling_rights.contains(Square::H8),
        setup.castling_rights.contains(Square::A8),
    ];
    for (i, &has_right) in castling_rights.iter().enumerate() {
        tensor
            .index_axis_mut(Axis(0), 13 + i)
            .fill(has_right as u8 as f32);
    }

    // 4. En passant target (channel 17) is a one-hot square if present.
    if let Some(ep_sq) = setup.ep_square {
        tensor[[17, ep_sq.rank() as usize, ep_sq.file() as usize]] = 1.0;
    }
}
