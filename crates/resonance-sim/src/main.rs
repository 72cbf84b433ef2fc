//! # Resonance Simulator
//!
//! Headless driver for the Resonance combat core.
//!
//! Loads a TOML configuration and a RON content pack, then runs the fight on a
//! fixed-step clock with a built-in player:
//! - Config: run length, stepping, autoplay habits, combat tunables
//! - Abilities: the skill and spell behaviors content files refer to
//! - Sim: frame loop, event collection, and run statistics
//!
//! Usage: `resonance [config.toml]`, or `resonance --init [path]` to write the
//! default configuration.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod abilities;
mod autoplay;
mod config;
mod sim;
mod timing;

use anyhow::Result;
use config::SimConfig;
use sim::Simulation;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("resonance_sim=info".parse()?)
                .add_directive("resonance_combat=info".parse()?),
        )
        .init();

    info!("Resonance simulator starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let config = match args.next().as_deref() {
        Some("--init") => {
            let path = args.next().unwrap_or_else(|| "resonance.toml".to_string());
            SimConfig::default().save_to(&path)?;
            return Ok(());
        },
        Some(path) => SimConfig::load_from(path),
        None => SimConfig::load(),
    };

    let mut sim = Simulation::new(&config)?;
    let stats = sim.run().clone();
    info!(
        area = %sim.combat().waves().current_area(),
        wave = sim.combat().waves().current_wave(),
        "Final position"
    );
    info!("Run summary:\n{}", serde_json::to_string_pretty(&stats)?);

    info!("Resonance simulator finished");
    Ok(())
}
