use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, CastlingSide, Chess, EnPassantMode, Position, Role};

use crate::error::BookError;
use crate::pieces::{Color, Piece, PieceType};
use crate::position::{BookPosition, CastlingRights};
use crate::san;
use crate::types::{Move, Square};

/// Board state backed by shakmaty, exposed to the books through
/// [`BookPosition`].
#[derive(Clone, Debug)]
pub struct Game {
    pos: Chess,
    pub history: Vec<Move>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Self {
            pos: Chess::default(),
            history: Vec::new(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, BookError> {
        let parsed: Fen = fen
            .parse()
            .map_err(|e| BookError::InvalidFen(format!("{fen}: {e}")))?;
        let pos = parsed
            .into_position::<Chess>(CastlingMode::Standard)
            .map_err(|e| BookError::InvalidFen(format!("{fen}: {e}")))?;
        Ok(Self {
            pos,
            history: Vec::new(),
        })
    }

    pub fn chess(&self) -> &Chess {
        &self.pos
    }

    /// Plays a move given as coordinate or SAN text.
    pub fn make_move(&mut self, text: &str) -> bool {
        match san::parse_move(self, text) {
            Some(mv) => self.apply_move(mv),
            None => false,
        }
    }

    pub fn ply(&self) -> usize {
        self.history.len()
    }

    fn legal_pairs(&self) -> Vec<(shakmaty::Move, Move)> {
        self.pos
            .legal_moves()
            .iter()
            .filter_map(|m| to_native(m).map(|native| (m.clone(), native)))
            .collect()
    }
}

impl BookPosition for Game {
    fn piece_at(&self, sq: u8) -> Option<Piece> {
        let piece = self.pos.board().piece_at(shakmaty::Square::new(u32::from(sq)))?;
        Some(Piece::new(piece_type(piece.role), color(piece.color)))
    }

    fn side_to_move(&self) -> Color {
        color(self.pos.turn())
    }

    fn castling_rights(&self) -> CastlingRights {
        let castles = self.pos.castles();
        CastlingRights {
            white_king_side: castles.has(shakmaty::Color::White, CastlingSide::KingSide),
            white_queen_side: castles.has(shakmaty::Color::White, CastlingSide::QueenSide),
            black_king_side: castles.has(shakmaty::Color::Black, CastlingSide::KingSide),
            black_queen_side: castles.has(shakmaty::Color::Black, CastlingSide::QueenSide),
        }
    }

    fn en_passant_file(&self) -> Option<u8> {
        self.pos
            .ep_square(EnPassantMode::Legal)
            .map(|sq| Square::file(sq as u8))
    }

    fn legal_moves(&self) -> Vec<Move> {
        self.legal_pairs().into_iter().map(|(_, mv)| mv).collect()
    }

    fn apply_move(&mut self, mv: Move) -> bool {
        let Some((m, _)) = self.legal_pairs().into_iter().find(|(_, native)| *native == mv) else {
            return false;
        };
        self.pos.play_unchecked(&m);
        self.history.push(mv);
        true
    }
}

fn color(c: shakmaty::Color) -> Color {
    match c {
        shakmaty::Color::White => Color::White,
        shakmaty::Color::Black => Color::Black,
    }
}

fn piece_type(role: Role) -> PieceType {
    match role {
        Role::Pawn => PieceType::Pawn,
        Role::Knight => PieceType::Knight,
        Role::Bishop => PieceType::Bishop,
        Role::Rook => PieceType::Rook,
        Role::Queen => PieceType::Queen,
        Role::King => PieceType::King,
    }
}

fn to_native(m: &shakmaty::Move) -> Option<Move> {
    match m {
        shakmaty::Move::Normal {
            role,
            from,
            capture,
            to,
            promotion,
        } => {
            let (from, to) = (*from as u8, *to as u8);
            if let Some(promo) = promotion {
                return Some(Move::promotion(from, to, piece_type(*promo), capture.is_some()));
            }
            let flags = if capture.is_some() {
                Move::FLAG_CAPTURE
            } else if *role == Role::Pawn && Square::rank(from).abs_diff(Square::rank(to)) == 2 {
                Move::FLAG_DOUBLE_PUSH
            } else {
                Move::FLAG_NORMAL
            };
            Some(Move::new(from, to, flags))
        }
        shakmaty::Move::EnPassant { from, to } => {
            Some(Move::new(*from as u8, *to as u8, Move::FLAG_EP_CAPTURE))
        }
        shakmaty::Move::Castle { king, rook } => {
            // shakmaty encodes castling as king takes rook
            let (king, rook) = (*king as u8, *rook as u8);
            let rank = Square::rank(king);
            if Square::file(rook) > Square::file(king) {
                Some(Move::new(king, Square::make(6, rank), Move::FLAG_KING_CASTLE))
            } else {
                Some(Move::new(king, Square::make(2, rank), Move::FLAG_QUEEN_CASTLE))
            }
        }
        shakmaty::Move::Put { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_state() {
        let game = Game::new();
        assert_eq!(game.side_to_move(), Color::White);
        assert_eq!(game.legal_moves().len(), 20);
        assert_eq!(game.castling_rights(), CastlingRights::ALL);
        assert_eq!(game.king_square(Color::White), Some(Square::E1));
        assert_eq!(game.king_square(Color::Black), Some(Square::E8));
        assert_eq!(
            game.piece_at(Square::A1),
            Some(Piece::new(PieceType::Rook, Color::White))
        );
        assert_eq!(game.piece_at(28), None);
    }

    #[test]
    fn double_push_flag_and_history() {
        let mut game = Game::new();
        assert!(game.make_move("e2e4"));
        assert_eq!(game.history, vec![Move::new(12, 28, Move::FLAG_DOUBLE_PUSH)]);
        assert_eq!(game.side_to_move(), Color::Black);
        // nothing can take on e3
        assert_eq!(game.en_passant_file(), None);
    }

    #[test]
    fn castling_is_two_square_king_move() {
        let game =
            Game::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        let moves = game.legal_moves();
        assert!(moves.contains(&Move::new(Square::E1, Square::G1, Move::FLAG_KING_CASTLE)));
        assert!(moves.contains(&Move::new(Square::E1, Square::C1, Move::FLAG_QUEEN_CASTLE)));
    }

    #[test]
    fn legal_en_passant_file() {
        let game =
            Game::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        assert_eq!(game.en_passant_file(), Some(5));
        assert!(game.legal_moves().contains(&Move::new(36, 45, Move::FLAG_EP_CAPTURE)));
    }

    #[test]
    fn rejects_illegal_move() {
        let mut game = Game::new();
        assert!(!game.apply_move(Move::normal(12, 36)));
        assert!(!game.make_move("e1e2"));
        assert!(game.history.is_empty());
    }

    #[test]
    fn invalid_fen_is_an_error() {
        assert!(matches!(
            Game::from_fen("not a fen"),
            Err(BookError::InvalidFen(_))
        ));
    }
}
