use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use tilers::agent::{Agent, LookAheadAgent};
use tilers::agent::random::RandomAgent;
use tilers::config::AppConfig;
use tilers::game::{Game, ACTIONS};
use tilers::trainer::{GameStats, Trainer};

/// Train the lookahead double-Q agent on the tile game.
#[derive(Parser)]
#[command(name = "trainagent", about = "Train the tile game agent")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "tilers.toml")]
    config: PathBuf,

    /// Override number of training games
    #[arg(long)]
    games: Option<usize>,

    /// Seed the game and agent for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Play a random agent instead, for comparison
    #[arg(long)]
    baseline: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(games) = cli.games {
        config.training.num_games = games;
        config.validate()?;
    }

    let size = config.game.size;
    let mut game = match cli.seed {
        Some(seed) => Game::seeded(size, seed),
        None => Game::new(size),
    };

    let mut agent: Box<dyn Agent> = if cli.baseline {
        match cli.seed {
            Some(seed) => Box::new(RandomAgent::seeded(ACTIONS, seed)),
            None => Box::new(RandomAgent::new(ACTIONS)),
        }
    } else {
        let features = size * size;
        let lookahead = config.lookahead.clone();
        match cli.seed {
            Some(seed) => Box::new(LookAheadAgent::seeded(features, ACTIONS, &config.agent, lookahead, seed)),
            None => Box::new(LookAheadAgent::new(features, ACTIONS, &config.agent, lookahead)),
        }
    };

    log::info!("training {} for {} games", agent.name(), config.training.num_games);
    let trainer = Trainer::new(config.training.clone());
    let history = trainer.run(agent.as_mut(), &mut game).context("training failed")?;

    report(&history);
    Ok(())
}

fn report(history: &[GameStats]) {
    if history.is_empty() {
        return;
    }
    let mean_score = history.iter().map(|s| s.score as f64).sum::<f64>() / history.len() as f64;
    let best = history.iter().map(|s| s.max_tile).max().unwrap_or(0);

    // last tenth of the run shows where training ended up
    let tail = &history[history.len() - (history.len() / 10).max(1)..];
    let tail_score = tail.iter().map(|s| s.score as f64).sum::<f64>() / tail.len() as f64;

    println!("\ntraining finished.");
    println!("mean score: {:.1}, last {} games: {:.1}, best tile: {}", mean_score, tail.len(), tail_score, best);
}
