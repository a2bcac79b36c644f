pub mod pieces;
pub mod types;
pub mod error;
pub mod config;
pub mod position;
pub mod game;
pub mod san;
pub mod zobrist;
pub mod pick;
pub mod book_file;
pub mod polyglot;
pub mod opening;
pub mod engine;

#[cfg(test)]
mod test_helpers;

pub use book_file::{BookRecord, BookStore};
pub use config::BookConfig;
pub use engine::BookEngine;
pub use error::BookError;
pub use game::Game;
pub use opening::InternalBook;
pub use position::BookPosition;
pub use types::Move;
