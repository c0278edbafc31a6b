use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use mineboard_core::{Board, GameConfig, GameState};
use rand::SeedableRng;
use rand::rngs::SmallRng;

mod agent;

/// Plays seeded boards with the constraint solver, guessing only when it is stuck.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    /// Number of games to play
    #[arg(short, long, default_value_t = 100)]
    games: u32,

    /// Board side length
    #[arg(long, default_value_t = GameConfig::DEFAULT_SIZE)]
    size: u8,

    /// Mines per board
    #[arg(long, default_value_t = GameConfig::DEFAULT_MINES)]
    mines: u16,

    /// Seed of the first game, following games use consecutive seeds
    #[arg(short, long)]
    seed: Option<u64>,

    /// Write one JSON training sample per solver step to this file
    #[arg(long)]
    samples: Option<PathBuf>,

    /// Print every final board
    #[arg(long)]
    show: bool,
}

fn init_logging(verbose: &Verbosity<InfoLevel>) {
    use tracing_subscriber::filter::LevelFilter;

    let level = match verbose.log_level_filter() {
        log::LevelFilter::Off => LevelFilter::OFF,
        log::LevelFilter::Error => LevelFilter::ERROR,
        log::LevelFilter::Warn => LevelFilter::WARN,
        log::LevelFilter::Info => LevelFilter::INFO,
        log::LevelFilter::Debug => LevelFilter::DEBUG,
        log::LevelFilter::Trace => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.verbose);

    let config = GameConfig::new(args.size, args.mines).with_context(|| {
        format!(
            "Invalid board: {0}x{0} with {1} mines",
            args.size, args.mines
        )
    })?;
    let first_seed = args.seed.unwrap_or_else(rand::random);
    log::info!("Config: {:?}, first seed: {}", config, first_seed);

    let mut sink = args
        .samples
        .as_deref()
        .map(agent::SampleSink::create)
        .transpose()?;

    let mut wins = 0u32;
    let mut total_guesses = 0u64;

    for game in 0..args.games {
        let seed = first_seed.wrapping_add(u64::from(game));
        let mut board = Board::seeded(config, seed);
        let mut rng = SmallRng::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15);

        let report = agent::play_game(&mut board, &mut rng, sink.as_mut())?;
        if report.state == GameState::Won {
            wins += 1;
        }
        total_guesses += u64::from(report.guesses);
        log::info!(
            "Game {} (seed {}): {:?} after {} guesses, {} solver passes",
            game,
            seed,
            report.state,
            report.guesses,
            report.solver_passes
        );

        if args.show {
            println!("{}", agent::render(&board));
        }
    }

    if let Some(sink) = sink {
        let written = sink.finish()?;
        log::info!("Wrote {} samples", written);
    }

    let games = args.games.max(1);
    println!(
        "games: {}, won: {}, lost: {}, win rate: {:.1}%, guesses per game: {:.2}",
        args.games,
        wins,
        args.games - wins,
        f64::from(wins) * 100.0 / f64::from(games),
        total_guesses as f64 / f64::from(games)
    );
    Ok(())
}
