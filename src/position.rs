use crate::pieces::{Color, Piece, PieceType};
use crate::types::Move;
use crate::zobrist;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CastlingRights {
    pub white_king_side: bool,
    pub white_queen_side: bool,
    pub black_king_side: bool,
    pub black_queen_side: bool,
}

impl CastlingRights {
    pub const ALL: CastlingRights = CastlingRights {
        white_king_side: true,
        white_queen_side: true,
        black_king_side: true,
        black_queen_side: true,
    };
}

/// The part of a board the opening books rely on. Move generation and
/// legality stay with the implementor; the books only read state, ask for
/// the legal move list and apply moves while compiling the guide book.
pub trait BookPosition: Clone {
    fn piece_at(&self, sq: u8) -> Option<Piece>;

    fn side_to_move(&self) -> Color;

    fn castling_rights(&self) -> CastlingRights;

    /// File of the en-passant square, only when the capture is actually legal.
    fn en_passant_file(&self) -> Option<u8>;

    /// Legal moves with fully populated flags.
    fn legal_moves(&self) -> Vec<Move>;

    /// Plays `mv` if it is legal. Returns false and leaves the position
    /// untouched otherwise.
    fn apply_move(&mut self, mv: Move) -> bool;

    fn is_legal(&self, mv: Move) -> bool {
        mv.is_valid() && self.legal_moves().contains(&mv)
    }

    fn king_square(&self, color: Color) -> Option<u8> {
        let king = Piece::new(PieceType::King, color);
        (0..64u8).find(|&sq| self.piece_at(sq) == Some(king))
    }

    fn hash_key(&self) -> u64 {
        zobrist::polyglot_key(self)
    }
}
