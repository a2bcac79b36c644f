use crate::pieces::PieceType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Native 16-bit move: bits 0-5 from square, bits 6-11 to square,
/// bits 12-15 flags.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Move(pub u16);

impl Move {
    pub const NONE: Move = Move(0);

    pub const FLAG_NORMAL: u16 = 0b0000;
    pub const FLAG_DOUBLE_PUSH: u16 = 0b0001;
    pub const FLAG_KING_CASTLE: u16 = 0b0010;
    pub const FLAG_QUEEN_CASTLE: u16 = 0b0011;
    pub const FLAG_CAPTURE: u16 = 0b0100;
    pub const FLAG_EP_CAPTURE: u16 = 0b0101;
    pub const FLAG_PROMO_KNIGHT: u16 = 0b1000;
    pub const FLAG_PROMO_BISHOP: u16 = 0b1001;
    pub const FLAG_PROMO_ROOK: u16 = 0b1010;
    pub const FLAG_PROMO_QUEEN: u16 = 0b1011;
    pub const FLAG_PROMO_KNIGHT_CAP: u16 = 0b1100;
    pub const FLAG_PROMO_BISHOP_CAP: u16 = 0b1101;
    pub const FLAG_PROMO_ROOK_CAP: u16 = 0b1110;
    pub const FLAG_PROMO_QUEEN_CAP: u16 = 0b1111;

    #[inline(always)]
    pub const fn new(from: u8, to: u8, flags: u16) -> Self {
        Move(((flags & 0xF) << 12) | ((to as u16 & 0x3F) << 6) | (from as u16 & 0x3F))
    }

    #[inline(always)]
    pub const fn normal(from: u8, to: u8) -> Self {
        Self::new(from, to, Self::FLAG_NORMAL)
    }

    #[inline(always)]
    pub const fn promotion(from: u8, to: u8, piece: PieceType, is_capture: bool) -> Self {
        let base_flag = match piece {
            PieceType::Knight => Self::FLAG_PROMO_KNIGHT,
            PieceType::Bishop => Self::FLAG_PROMO_BISHOP,
            PieceType::Rook => Self::FLAG_PROMO_ROOK,
            _ => Self::FLAG_PROMO_QUEEN,
        };
        let flag = if is_capture {
            base_flag | 0b0100
        } else {
            base_flag
        };
        Self::new(from, to, flag)
    }

    #[inline(always)]
    pub const fn from_sq(self) -> u8 {
        (self.0 & 0x3F) as u8
    }

    #[inline(always)]
    pub const fn to_sq(self) -> u8 {
        ((self.0 >> 6) & 0x3F) as u8
    }

    #[inline(always)]
    pub const fn flags(self) -> u16 {
        (self.0 >> 12) & 0xF
    }

    #[inline(always)]
    pub const fn is_capture(self) -> bool {
        let f = self.flags();
        f == Self::FLAG_CAPTURE || f == Self::FLAG_EP_CAPTURE || f >= Self::FLAG_PROMO_KNIGHT_CAP
    }

    #[inline(always)]
    pub const fn is_promotion(self) -> bool {
        self.flags() >= Self::FLAG_PROMO_KNIGHT
    }

    #[inline(always)]
    pub const fn is_castle(self) -> bool {
        let f = self.flags();
        f == Self::FLAG_KING_CASTLE || f == Self::FLAG_QUEEN_CASTLE
    }

    #[inline(always)]
    pub const fn promotion_piece(self) -> Option<PieceType> {
        match self.flags() {
            Self::FLAG_PROMO_KNIGHT | Self::FLAG_PROMO_KNIGHT_CAP => Some(PieceType::Knight),
            Self::FLAG_PROMO_BISHOP | Self::FLAG_PROMO_BISHOP_CAP => Some(PieceType::Bishop),
            Self::FLAG_PROMO_ROOK | Self::FLAG_PROMO_ROOK_CAP => Some(PieceType::Rook),
            Self::FLAG_PROMO_QUEEN | Self::FLAG_PROMO_QUEEN_CAP => Some(PieceType::Queen),
            _ => None,
        }
    }

    #[inline(always)]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Coordinate text ("e2e4", "e7e8q"); castling is the two-square king move.
    pub fn to_uci(self) -> String {
        let mut s = format!(
            "{}{}",
            Square::to_algebraic(self.from_sq()),
            Square::to_algebraic(self.to_sq())
        );

        if let Some(promo) = self.promotion_piece() {
            s.push(promotion_letter(promo));
        }

        s
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            f.write_str(&self.to_uci())
        } else {
            f.write_str("0000")
        }
    }
}

pub fn promotion_letter(piece: PieceType) -> char {
    match piece {
        PieceType::Knight => 'n',
        PieceType::Bishop => 'b',
        PieceType::Rook => 'r',
        _ => 'q',
    }
}

pub struct Square;

impl Square {
    pub const A1: u8 = 0;
    pub const C1: u8 = 2;
    pub const E1: u8 = 4;
    pub const G1: u8 = 6;
    pub const H1: u8 = 7;
    pub const A8: u8 = 56;
    pub const C8: u8 = 58;
    pub const E8: u8 = 60;
    pub const G8: u8 = 62;
    pub const H8: u8 = 63;

    #[inline(always)]
    pub const fn file(sq: u8) -> u8 {
        sq % 8
    }

    #[inline(always)]
    pub const fn rank(sq: u8) -> u8 {
        sq / 8
    }

    #[inline(always)]
    pub const fn make(file: u8, rank: u8) -> u8 {
        rank * 8 + file
    }

    pub fn to_algebraic(sq: u8) -> String {
        let file = (b'a' + (sq % 8)) as char;
        let rank = (b'1' + (sq / 8)) as char;
        format!("{}{}", file, rank)
    }

    pub fn from_algebraic(s: &str) -> Option<u8> {
        if s.len() != 2 {
            return None;
        }
        let bytes = s.as_bytes();
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file < 8 && rank < 8 {
            Some(rank * 8 + file)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_encoding() {
        let m = Move::new(12, 28, Move::FLAG_DOUBLE_PUSH); // e2-e4
        assert_eq!(m.from_sq(), 12);
        assert_eq!(m.to_sq(), 28);
        assert_eq!(m.flags(), Move::FLAG_DOUBLE_PUSH);
        assert!(!m.is_capture());
        assert!(!m.is_promotion());
        assert_eq!(m.to_uci(), "e2e4");
    }

    #[test]
    fn test_move_promotion() {
        let m = Move::promotion(52, 60, PieceType::Knight, false); // e7-e8=N
        assert!(m.is_promotion());
        assert!(!m.is_capture());
        assert_eq!(m.promotion_piece(), Some(PieceType::Knight));
        assert_eq!(m.to_uci(), "e7e8n");
    }

    #[test]
    fn test_castle_text() {
        let m = Move::new(Square::E8, Square::C8, Move::FLAG_QUEEN_CASTLE);
        assert!(m.is_castle());
        assert_eq!(m.to_string(), "e8c8");
        assert_eq!(Move::NONE.to_string(), "0000");
    }

    #[test]
    fn test_square_utils() {
        assert_eq!(Square::file(12), 4); // e2 -> file e (4)
        assert_eq!(Square::rank(12), 1); // e2 -> rank 2 (1)
        assert_eq!(Square::make(4, 1), 12); // e2
        assert_eq!(Square::from_algebraic("h8"), Some(Square::H8));
        assert_eq!(Square::from_algebraic("i9"), None);
    }
}
