//! Colapsi Demo
//!
//! Plays a seeded match between four pseudo-random players on a
//! simulated clock, then replays it to check the engine is deterministic.
//!
//! Usage: `colapsi-demo [config.json]`. Set `RUST_LOG=debug` to see every
//! route step.

use std::env;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uuid::Uuid;

use colapsi::{
    VERSION,
    core::{hash::StateHash, rng::derive_game_seed},
    game::{
        engine::{GameConfig, GameEngine, GameStats},
        events::TracingRenderer,
        input::{InputSource, RandomInput},
    },
};

/// Safety valve for a runaway demo.
const MAX_INPUTS: usize = 100_000;

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    info!("Colapsi Engine v{}", VERSION);

    let mut config = match env::args().nth(1) {
        Some(path) => GameConfig::load(&path).with_context(|| format!("loading config from {path}"))?,
        None => GameConfig::default(),
    };

    if config.rng_seed.is_none() {
        let game_id = Uuid::new_v4();
        let seed = derive_game_seed(game_id.as_bytes(), &config.seat_names());
        info!("Game ID: {}", game_id);
        config.rng_seed = Some(seed);
    }
    info!("RNG Seed: {}", config.seed());
    info!("Grid: {}x{}, {} players, {}s turns", config.rows, config.cols, config.players.len(), config.turn_duration_secs);

    let epoch = Utc::now();

    info!("=== Starting Demo Match ===");
    let first = run_match(&config, epoch, true)?;

    info!("=== Match Results ===");
    info!("Final State Hash: {}", hex::encode(first.hash));
    info!("Inputs processed: {}", first.inputs);
    for p in &first.stats.players {
        let status = if p.eliminated { "eliminated" } else { "standing" };
        info!("{} ({}) - {} moves, {}", p.name, p.id, p.move_count, status);
    }
    println!("{}", serde_json::to_string_pretty(&first.stats).context("serializing stats")?);

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let replay = run_match(&config, epoch, false)?;
    info!("Replay State Hash: {}", hex::encode(replay.hash));

    if replay.hash != first.hash {
        bail!("replay diverged: {} != {}", hex::encode(replay.hash), hex::encode(first.hash));
    }
    info!("Determinism verified");
    Ok(())
}

struct MatchSummary {
    hash: StateHash,
    stats: GameStats,
    inputs: usize,
}

/// Play one match to the end, one input per simulated second.
fn run_match(config: &GameConfig, epoch: DateTime<Utc>, log_events: bool) -> Result<MatchSummary> {
    let mut engine = GameEngine::new(config.clone()).context("building engine")?;
    engine.start_game(epoch).context("starting game")?;

    let mut source = RandomInput::new(config.seed().rotate_left(17));
    let mut renderer = TracingRenderer::new();
    let mut now = epoch;
    let mut inputs = 0;

    while !engine.is_over() {
        now += Duration::seconds(1);

        if !engine.poll_clock(now) {
            let Some(input) = source.next_input(&engine) else {
                break;
            };
            if let Err(err) = engine.handle_input(input.player, input.intent, now) {
                debug!(player = %input.player, %err, "input refused");
            }
            inputs += 1;
        }

        if log_events {
            engine.flush_events(&mut renderer);
        } else {
            engine.take_events();
        }

        if inputs > MAX_INPUTS {
            bail!("match did not finish within {} inputs", MAX_INPUTS);
        }
    }

    Ok(MatchSummary {
        hash: engine.compute_hash(),
        stats: engine.game_stats(),
        inputs,
    })
}
