// Guide book compiled from annotated opening lines.
//
// Every line is replayed from the initial position; each move becomes a
// `(position key, move, frequency)` entry. Entries for the same position and
// move are merged, anything that ends up with a non-positive frequency is
// dropped and the rest is sorted by key so lookups are a binary search.

use std::collections::HashMap;
use std::path::Path;

use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{InternalBookConfig, InternalSource};
use crate::error::BookError;
use crate::pick::WeightedPick;
use crate::pieces::Color;
use crate::position::BookPosition;
use crate::san;
use crate::types::Move;

/// Added to every stored frequency when picking; the higher it is, the more
/// uniform the choice.
pub const MIN_FREQ: i32 = 20;

static EMBEDDED_LINES: &str = include_str!("../data/guide_book.txt");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalEntry {
    pub hash: u64,
    #[serde(rename = "move")]
    pub mv: Move,
    pub freq: i32,
}

#[derive(Clone, Debug, Default)]
pub struct InternalBook {
    entries: Vec<InternalEntry>,
}

#[derive(Default)]
struct TableBuilder {
    entries: Vec<InternalEntry>,
    index: HashMap<(u64, Move), usize>,
}

impl TableBuilder {
    fn add(&mut self, hash: u64, mv: Move, freq: i32) {
        match self.index.get(&(hash, mv)) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                entry.freq = entry.freq.saturating_add(freq);
            }
            None => {
                self.index.insert((hash, mv), self.entries.len());
                self.entries.push(InternalEntry { hash, mv, freq });
            }
        }
    }

    fn finish(self) -> Vec<InternalEntry> {
        let mut entries = self.entries;
        entries.retain(|e| e.freq > 0);
        entries.sort_by(|a, b| a.hash.cmp(&b.hash).then(b.freq.cmp(&a.freq)));
        entries
    }
}

/// Non-empty, non-comment rows of a guide book source.
pub fn source_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

pub fn embedded_lines() -> impl Iterator<Item = &'static str> {
    source_lines(EMBEDDED_LINES)
}

/// Replays one line from `start`. Fails on the first token that is not a
/// legal move, in which case nothing from the line is kept.
fn line_entries<P: BookPosition>(
    start: &P,
    line: &str,
    excluded: Option<Color>,
) -> Result<Vec<(u64, Move, i32)>, BookError> {
    let mut pos = start.clone();
    let mut out = Vec::new();

    for token in line.split_whitespace() {
        if san::is_move_number(token) {
            continue;
        }
        let illegal = || BookError::IllegalLine {
            line: line.to_string(),
            token: token.to_string(),
        };

        let mv = san::parse_move(&pos, token)
            .filter(|&mv| pos.is_legal(mv))
            .ok_or_else(illegal)?;

        if Some(pos.side_to_move()) != excluded {
            out.push((pos.hash_key(), mv, san::annotation_weight(token)));
        }
        if !pos.apply_move(mv) {
            return Err(illegal());
        }
    }
    Ok(out)
}

impl InternalBook {
    /// Compiles `lines`. Rejected lines are logged and returned next to the
    /// book; they do not stop the build.
    pub fn build<P, I, S>(start: &P, lines: I, excluded: Option<Color>) -> (Self, Vec<BookError>)
    where
        P: BookPosition,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = TableBuilder::default();
        let mut errors = Vec::new();

        for line in lines {
            match line_entries(start, line.as_ref(), excluded) {
                Ok(entries) => {
                    for (hash, mv, freq) in entries {
                        builder.add(hash, mv, freq);
                    }
                }
                Err(e) => {
                    warn!("{e}");
                    errors.push(e);
                }
            }
        }

        let book = Self {
            entries: builder.finish(),
        };
        info!("{} moves loaded from the internal book", book.len());
        (book, errors)
    }

    /// Takes a previously generated table, restoring the merge, filter and
    /// ordering guarantees.
    pub fn from_entries(entries: impl IntoIterator<Item = InternalEntry>) -> Self {
        let mut builder = TableBuilder::default();
        for e in entries {
            builder.add(e.hash, e.mv, e.freq);
        }
        Self {
            entries: builder.finish(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, BookError> {
        let entries: Vec<InternalEntry> = serde_json::from_str(text)?;
        Ok(Self::from_entries(entries))
    }

    /// Builds from lines or loads a generated table, as configured.
    pub fn load<P: BookPosition>(config: &InternalBookConfig, start: &P) -> Result<Self, BookError> {
        let book = match &config.source {
            InternalSource::Embedded => Self::build(start, embedded_lines(), config.excluded_color).0,
            InternalSource::Lines(path) => {
                let text = std::fs::read_to_string(path)?;
                Self::build(start, source_lines(&text), config.excluded_color).0
            }
            InternalSource::Table(path) => {
                let book = Self::from_json(&std::fs::read_to_string(path)?)?;
                info!("{} moves loaded from the internal book", book.len());
                book
            }
        };
        Ok(book)
    }

    pub fn to_json(&self) -> Result<String, BookError> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    pub fn write_table(&self, path: &Path) -> Result<(), BookError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn entries(&self) -> &[InternalEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Legal book moves for `pos` with their picking weight.
    pub fn candidates<P: BookPosition>(&self, pos: &P) -> Vec<(Move, u64)> {
        let key = pos.hash_key();
        let start = self.entries.partition_point(|e| e.hash < key);
        self.entries[start..]
            .iter()
            .take_while(|e| e.hash == key)
            .filter(|e| pos.is_legal(e.mv))
            .map(|e| (e.mv, u64::try_from(e.freq.saturating_add(MIN_FREQ)).unwrap_or(0)))
            .collect()
    }

    pub fn select_move<P: BookPosition, R: Rng + ?Sized>(&self, pos: &P, rng: &mut R) -> Option<Move> {
        let mut picker = WeightedPick::new();
        for (mv, weight) in self.candidates(pos) {
            info!("guide book {mv} {weight}");
            picker.offer(mv, weight, rng);
        }
        picker.into_choice()
    }
}

pub fn report_lines(candidates: &[(Move, u64)]) -> Vec<String> {
    candidates
        .iter()
        .map(|(mv, weight)| format!("info string {mv} {weight}"))
        .collect()
}
