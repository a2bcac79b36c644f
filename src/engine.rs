use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::book_file::BookStore;
use crate::config::BookConfig;
use crate::opening::InternalBook;
use crate::polyglot;
use crate::position::BookPosition;
use crate::types::Move;

/// Book front end: the main Polyglot book is asked first, then the guide
/// book. A `None` answer means the caller should search.
pub struct BookEngine<R: Rng = StdRng> {
    pub config: BookConfig,
    store: BookStore,
    internal: Option<InternalBook>,
    rng: R,
}

impl BookEngine<StdRng> {
    pub fn new(config: BookConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }
}

impl<R: Rng> BookEngine<R> {
    pub fn with_rng(config: BookConfig, rng: R) -> Self {
        Self {
            config,
            store: BookStore::new(),
            internal: None,
            rng,
        }
    }

    /// Opens the main book and loads the guide book. Missing books only
    /// disable the corresponding lookup.
    pub fn init<P: BookPosition>(&mut self, start: &P) {
        self.open_main_book();
        self.load_internal_book(start);
    }

    pub fn open_main_book(&mut self) -> bool {
        let Some(file) = self.config.book.file.clone() else {
            self.store.close();
            return false;
        };
        self.store.open(&file, &self.config.book).is_ok()
    }

    pub fn load_internal_book<P: BookPosition>(&mut self, start: &P) {
        self.internal = None;
        if !self.config.internal.enabled {
            return;
        }
        match InternalBook::load(&self.config.internal, start) {
            Ok(book) => self.internal = Some(book),
            Err(e) => warn!("internal book not loaded: {e}"),
        }
    }

    pub fn set_internal_book(&mut self, book: InternalBook) {
        self.internal = Some(book);
    }

    pub fn internal_book(&self) -> Option<&InternalBook> {
        self.internal.as_ref()
    }

    pub fn store(&self) -> &BookStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut BookStore {
        &mut self.store
    }

    pub fn best_move<P: BookPosition>(&mut self, pos: &P, ply: usize) -> Option<Move> {
        if ply > self.config.max_ply {
            return None;
        }

        let filter = self.config.book.filter_percent;
        let main = polyglot::select_move(&mut self.store, pos, filter, &mut self.rng);
        let mv = main.or_else(|| self.internal.as_ref()?.select_move(pos, &mut self.rng))?;

        if !pos.is_legal(mv) {
            warn!("book move {mv} is not legal, ignoring it");
            return None;
        }
        info!("book move {mv}");
        Some(mv)
    }
}
