//! HexHoops replay tool.
//!
//! Usage: `hexhoops-replay <catalog.json> <match.json> <actions.json> [--keep-going]`
//!
//! Paths fall back to `HEXHOOPS_CATALOG`, `HEXHOOPS_MATCH` and
//! `HEXHOOPS_ACTIONS`. The final match state is printed to stdout as JSON.

use anyhow::Context;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod replay;

use replay::{Replay, ReplayInputs};

fn input_path(args: &[String], index: usize, env_var: &str) -> anyhow::Result<PathBuf> {
    args.get(index)
        .cloned()
        .or_else(|| std::env::var(env_var).ok())
        .map(PathBuf::from)
        .with_context(|| format!("missing argument {} (or {})", index + 1, env_var))
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let keep_going = match args.iter().position(|a| a == "--keep-going") {
        Some(index) => {
            args.remove(index);
            true
        }
        None => false,
    };

    let inputs = ReplayInputs {
        catalog: input_path(&args, 0, "HEXHOOPS_CATALOG")?,
        match_config: input_path(&args, 1, "HEXHOOPS_MATCH")?,
        actions: input_path(&args, 2, "HEXHOOPS_ACTIONS")?,
    };

    let mut replay = Replay::load(&inputs)?;
    replay.keep_going = keep_going;
    let outcome = replay.run()?;

    info!(
        applied = outcome.applied,
        rejected = outcome.rejected.len(),
        turn = outcome.state.turn_number,
        "Replay finished"
    );

    println!("{}", outcome.state.to_json()?);
    Ok(())
}
