use crate::pieces::PieceType;
use crate::position::BookPosition;
use crate::types::{Move, Square};
use once_cell::sync::Lazy;
use regex::Regex;

static COORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-h][1-8])([a-h][1-8])([nbrqNBRQ])?$").expect("coordinate move pattern")
});

static SAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([NBRQK])?([a-h])?([1-8])?[x-]?([a-h][1-8])(=?[NBRQ])?$").expect("SAN pattern")
});

static MOVE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\.+$").expect("move number pattern"));

/// Drops trailing check marks and `?`/`!` annotations.
pub fn strip_annotations(token: &str) -> &str {
    token.trim_end_matches(|c| matches!(c, '?' | '!' | '+' | '#'))
}

pub fn is_move_number(token: &str) -> bool {
    MOVE_NUMBER_RE.is_match(token)
}

/// Frequency modifier carried by a guide book token. Later rules win, so
/// `!?` counts as `!` and `??`/`!!` override the single marks.
pub fn annotation_weight(token: &str) -> i32 {
    let mut freq = 1;
    if token.contains('?') {
        freq = -100;
    }
    if token.contains('!') {
        freq = 100;
    }
    if token.contains("??") {
        freq = -4900;
    }
    if token.contains("!!") {
        freq = 900;
    }
    freq
}

/// Decodes coordinate (`e2e4`, `e7e8q`) or SAN (`Nf3`, `exd5`, `O-O`) text
/// into a legal move of `pos`.
pub fn parse_move<P: BookPosition>(pos: &P, text: &str) -> Option<Move> {
    let token = strip_annotations(text.trim());
    if token.is_empty() {
        return None;
    }
    let legal = pos.legal_moves();

    if let Some(caps) = COORD_RE.captures(token) {
        let from = Square::from_algebraic(caps.get(1)?.as_str())?;
        let to = Square::from_algebraic(caps.get(2)?.as_str())?;
        let promo = caps
            .get(3)
            .and_then(|m| m.as_str().chars().next())
            .and_then(PieceType::from_letter);
        return pick_by_squares(&legal, from, to, promo);
    }

    let castle = token.replace('0', "O").to_uppercase();
    if castle == "O-O" {
        return legal.into_iter().find(|m| m.flags() == Move::FLAG_KING_CASTLE);
    }
    if castle == "O-O-O" {
        return legal.into_iter().find(|m| m.flags() == Move::FLAG_QUEEN_CASTLE);
    }

    let caps = SAN_RE.captures(token)?;
    let ptype = match caps.get(1) {
        Some(m) => PieceType::from_letter(m.as_str().chars().next()?)?,
        None => PieceType::Pawn,
    };
    let dfile = caps.get(2).map(|m| m.as_str().as_bytes()[0] - b'a');
    let drank = caps.get(3).map(|m| m.as_str().as_bytes()[0] - b'1');
    let dest = Square::from_algebraic(caps.get(4)?.as_str())?;
    let promo = caps
        .get(5)
        .and_then(|m| m.as_str().chars().last())
        .and_then(PieceType::from_letter);

    let mut candidates = legal.into_iter().filter(|m| {
        if m.to_sq() != dest || m.is_castle() {
            return false;
        }
        match pos.piece_at(m.from_sq()) {
            Some(piece) if piece.piece_type == ptype => {}
            _ => return false,
        }
        if dfile.is_some_and(|f| Square::file(m.from_sq()) != f) {
            return false;
        }
        if drank.is_some_and(|r| Square::rank(m.from_sq()) != r) {
            return false;
        }
        match (m.promotion_piece(), promo) {
            (None, None) => true,
            (Some(p), Some(q)) => p == q,
            (Some(p), None) => p == PieceType::Queen,
            (None, Some(_)) => false,
        }
    });

    let first = candidates.next()?;
    if candidates.next().is_some() {
        // ambiguous
        return None;
    }
    Some(first)
}

fn pick_by_squares(legal: &[Move], from: u8, to: u8, promo: Option<PieceType>) -> Option<Move> {
    let mut matching = legal
        .iter()
        .copied()
        .filter(|m| m.from_sq() == from && m.to_sq() == to);
    match promo {
        Some(p) => matching.find(|m| m.promotion_piece() == Some(p)),
        None => matching.find(|m| matches!(m.promotion_piece(), None | Some(PieceType::Queen))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;

    #[test]
    fn castle_kingside() {
        let game = Game::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        let mv = parse_move(&game, "O-O").unwrap();
        assert_eq!(mv.to_uci(), "e1g1");
        assert!(mv.is_castle());
        assert_eq!(parse_move(&game, "0-0-0").unwrap().to_uci(), "e1c1");
        assert_eq!(parse_move(&game, "e1g1"), Some(mv));
    }

    #[test]
    fn queen_move() {
        let mut game = Game::new();
        // open path for queen
        assert!(game.make_move("d2d4"));
        assert!(game.make_move("d7d5"));
        let mv = parse_move(&game, "Qd3").unwrap();
        assert_eq!(mv.to_uci(), "d1d3");
    }

    #[test]
    fn san_and_coordinates_agree() {
        let game = Game::new();
        assert_eq!(parse_move(&game, "Nf3"), parse_move(&game, "g1f3"));
        assert_eq!(parse_move(&game, "e4!?"), parse_move(&game, "e2e4"));
        assert_eq!(
            parse_move(&game, "e4").map(|m| m.flags()),
            Some(Move::FLAG_DOUBLE_PUSH)
        );
        assert_eq!(parse_move(&game, "e5"), None);
        assert_eq!(parse_move(&game, ""), None);
    }

    #[test]
    fn pawn_capture_and_disambiguation() {
        let mut game = Game::new();
        for mv in ["e2e4", "d7d5"] {
            assert!(game.make_move(mv));
        }
        let capture = parse_move(&game, "exd5").unwrap();
        assert!(capture.is_capture());
        assert_eq!(capture.to_uci(), "e4d5");

        let knights = Game::from_fen("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1").unwrap();
        assert_eq!(parse_move(&knights, "Nd2"), None);
        assert_eq!(parse_move(&knights, "Nbd2").unwrap().to_uci(), "b1d2");
        assert_eq!(parse_move(&knights, "Nfd2").unwrap().to_uci(), "f1d2");
    }

    #[test]
    fn promotions() {
        let game = Game::from_fen("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        assert_eq!(parse_move(&game, "e8=N").unwrap().to_uci(), "e7e8n");
        assert_eq!(parse_move(&game, "e7e8").unwrap().to_uci(), "e7e8q");
        assert_eq!(parse_move(&game, "e7e8r").unwrap().to_uci(), "e7e8r");
    }

    #[test]
    fn annotation_weights() {
        assert_eq!(annotation_weight("e2e4"), 1);
        assert_eq!(annotation_weight("e2e4?"), -100);
        assert_eq!(annotation_weight("e2e4!"), 100);
        assert_eq!(annotation_weight("e2e4?!"), 100);
        assert_eq!(annotation_weight("e2e4??"), -4900);
        assert_eq!(annotation_weight("e2e4!!"), 900);
        assert_eq!(strip_annotations("Nf3+!?"), "Nf3");
        assert!(is_move_number("12."));
        assert!(is_move_number("3..."));
        assert!(!is_move_number("e4"));
    }
}
