use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    pub fn index(self) -> usize {
        match self {
            PieceType::Pawn => 0,
            PieceType::Knight => 1,
            PieceType::Bishop => 2,
            PieceType::Rook => 3,
            PieceType::Queen => 4,
            PieceType::King => 5,
        }
    }

    pub fn from_letter(c: char) -> Option<PieceType> {
        match c.to_ascii_uppercase() {
            'P' => Some(PieceType::Pawn),
            'N' => Some(PieceType::Knight),
            'B' => Some(PieceType::Bishop),
            'R' => Some(PieceType::Rook),
            'Q' => Some(PieceType::Queen),
            'K' => Some(PieceType::King),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Piece {
    pub piece_type: PieceType,
    pub color: Color,
}

impl Piece {
    pub fn new(piece_type: PieceType, color: Color) -> Self {
        Self { piece_type, color }
    }

    // black pawn = 0, white pawn = 1, black knight = 2, ... white king = 11
    pub fn polyglot_kind(self) -> usize {
        2 * self.piece_type.index() + usize::from(self.color == Color::White)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polyglot_kind_order() {
        assert_eq!(Piece::new(PieceType::Pawn, Color::Black).polyglot_kind(), 0);
        assert_eq!(Piece::new(PieceType::Pawn, Color::White).polyglot_kind(), 1);
        assert_eq!(Piece::new(PieceType::Rook, Color::White).polyglot_kind(), 7);
        assert_eq!(Piece::new(PieceType::King, Color::White).polyglot_kind(), 11);
    }
}
