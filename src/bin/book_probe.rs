use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chessbook::{BookConfig, BookEngine, Game, opening, polyglot};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Parser, Debug)]
#[command(author, version, about = "Look up a position in the opening books", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Polyglot book, overrides the configured one
    #[arg(long)]
    book: Option<PathBuf>,

    /// Position to probe (defaults to the initial position)
    #[arg(long)]
    fen: Option<String>,

    /// Moves played from that position, space separated
    #[arg(long)]
    moves: Option<String>,

    /// Seed for a reproducible pick
    #[arg(long)]
    seed: Option<u64>,

    /// Infrequent move filter in percent of the best weight
    #[arg(long)]
    filter: Option<u32>,

    /// Write the compiled guide book as JSON
    #[arg(long)]
    dump_table: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
    )
    .target(env_logger::Target::Stderr)
    .init();

    if let Err(e) = run(args) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => BookConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => BookConfig::default(),
    };
    if let Some(book) = args.book {
        // a name given on the command line is relative to the working directory
        config.book.file = Some(std::path::absolute(&book).unwrap_or(book));
    }
    if let Some(filter) = args.filter {
        config.book.filter_percent = filter;
    }

    let mut game = match &args.fen {
        Some(fen) => Game::from_fen(fen)?,
        None => Game::new(),
    };
    for mv in args.moves.as_deref().unwrap_or_default().split_whitespace() {
        if !game.make_move(mv) {
            bail!("illegal move '{mv}'");
        }
    }

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut engine = BookEngine::with_rng(config, rng);
    engine.init(&Game::new());

    if let Some(book) = engine.internal_book() {
        println!("info string {} moves loaded from the internal book", book.len());
        if let Some(path) = &args.dump_table {
            book.write_table(path)
                .with_context(|| format!("writing {}", path.display()))?;
        }
    }

    if let Some(path) = engine.store().path() {
        println!("info string probing '{}'...", path.display());
    }
    let filter = engine.config.book.filter_percent;
    let candidates = polyglot::collect_candidates(engine.store_mut(), &game, filter);
    for line in polyglot::report_lines(&candidates) {
        println!("{line}");
    }
    if let Some(book) = engine.internal_book() {
        for line in opening::report_lines(&book.candidates(&game)) {
            println!("{line}");
        }
    }

    match engine.best_move(&game, game.ply()) {
        Some(mv) => println!("bestmove {mv}"),
        None => println!("bestmove (none)"),
    }
    Ok(())
}
