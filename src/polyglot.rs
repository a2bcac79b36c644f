use log::{debug, info};
use rand::Rng;

use crate::book_file::{BookRecord, BookStore};
use crate::pick::WeightedPick;
use crate::pieces::{Color, PieceType};
use crate::position::BookPosition;
use crate::san;
use crate::types::{Move, Square, promotion_letter};

/// Candidates considered per position.
pub const MAX_CHOICES: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookCandidate {
    pub mv: Move,
    pub weight: u16,
    /// Share of the summed weight, rounded down.
    pub percent: u32,
    pub infrequent: bool,
}

/// A move is not worth playing when it was tried fewer than two times while
/// something else was tried more, or when its weight is below
/// `filter_percent` percent of the best one.
pub fn is_infrequent(val: u32, max: u32, filter_percent: u32) -> bool {
    if max > 2 && val < 2 {
        return true;
    }
    u64::from(val) < u64::from(max) * u64::from(filter_percent) / 100
}

/// Turns a packed book move into a legal move of `pos`.
///
/// The record keeps the origin square in bits 6-11 and the destination in
/// bits 0-5, and stores castling as the king capturing its own rook.
pub fn translate_record_move<P: BookPosition>(raw: u16, pos: &P) -> Option<Move> {
    let from = ((raw >> 6) & 0x3F) as u8;
    let mut to = (raw & 0x3F) as u8;

    let white_home = pos.king_square(Color::White) == Some(Square::E1);
    let black_home = pos.king_square(Color::Black) == Some(Square::E8);
    if from == Square::E1 && to == Square::H1 && white_home {
        to = Square::G1;
    }
    if from == Square::E8 && to == Square::H8 && black_home {
        to = Square::G8;
    }
    if from == Square::E1 && to == Square::A1 && white_home {
        to = Square::C1;
    }
    if from == Square::E8 && to == Square::A8 && black_home {
        to = Square::C8;
    }

    // go through text so the position fills in capture, castle and
    // promotion flags
    let mut text = Move::normal(from, to).to_uci();
    let promotion = match (raw >> 12) & 0x7 {
        1 => Some(PieceType::Knight),
        2 => Some(PieceType::Bishop),
        3 => Some(PieceType::Rook),
        4 => Some(PieceType::Queen),
        _ => None,
    };
    if let Some(piece) = promotion {
        text.push(promotion_letter(piece));
    }
    san::parse_move(pos, &text)
}

fn read_run(store: &mut BookStore, key: u64) -> Vec<BookRecord> {
    let start = store.find_leftmost(key);
    if start >= store.len() {
        return Vec::new();
    }

    let mut records = Vec::new();
    let mut current = store.read_record(start).ok();
    while let Some(record) = current {
        if record.key != key || records.len() >= MAX_CHOICES {
            break;
        }
        records.push(record);
        current = store.next_record().unwrap_or_else(|e| {
            debug!("book read stopped: {e}");
            None
        });
    }
    records
}

/// Book moves for `pos` in record order.
pub fn collect_candidates<P: BookPosition>(
    store: &mut BookStore,
    pos: &P,
    filter_percent: u32,
) -> Vec<BookCandidate> {
    if !store.is_available() {
        return Vec::new();
    }

    let key = pos.hash_key();
    let mut moves = Vec::new();
    for record in read_run(store, key) {
        match translate_record_move(record.mv, pos) {
            Some(mv) => moves.push((mv, record.weight)),
            None => debug!("skipping book move {:04x}: not legal here", record.mv),
        }
    }

    let max_weight = moves.iter().map(|&(_, w)| u32::from(w)).max().unwrap_or(0);
    let weight_sum: u32 = moves.iter().map(|&(_, w)| u32::from(w)).sum();

    moves
        .into_iter()
        .map(|(mv, weight)| BookCandidate {
            mv,
            weight,
            percent: if weight_sum > 0 {
                u32::from(weight) * 100 / weight_sum
            } else {
                0
            },
            infrequent: is_infrequent(u32::from(weight), max_weight, filter_percent),
        })
        .collect()
}

/// Weighted pick among the candidates that are not infrequent.
pub fn choose<R: Rng + ?Sized>(candidates: &[BookCandidate], rng: &mut R) -> Option<Move> {
    let mut picker = WeightedPick::new();
    for candidate in candidates.iter().filter(|c| !c.infrequent) {
        picker.offer(candidate.mv, u64::from(candidate.weight), rng);
    }
    picker.into_choice()
}

pub fn select_move<P: BookPosition, R: Rng + ?Sized>(
    store: &mut BookStore,
    pos: &P,
    filter_percent: u32,
    rng: &mut R,
) -> Option<Move> {
    let path = store.path()?.to_path_buf();
    info!("probing '{}'...", path.display());

    let candidates = collect_candidates(store, pos, filter_percent);
    for c in &candidates {
        let note = if c.infrequent { ", infrequent" } else { "" };
        info!("book {} weight {} ({} %){note}", c.mv, c.weight, c.percent);
    }
    choose(&candidates, rng)
}

pub fn report_lines(candidates: &[BookCandidate]) -> Vec<String> {
    candidates
        .iter()
        .map(|c| {
            if c.infrequent {
                format!("info string {}?!", c.mv)
            } else {
                format!("info string {} {} %", c.mv, c.percent)
            }
        })
        .collect()
}
