// nereus_node/src/main.rs

use anyhow::{anyhow, Context};
use clap::Parser;
use nereus_node::config;
use nereus_node::logging;
use nereus_node::prelude::*;
use std::sync::mpsc;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    let mut config = config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    if cli.print_config {
        print!("{}", config::to_toml(&config)?);
        return Ok(());
    }

    // The thruster frames are published from the configuration itself.
    let tf = StaticTfTree::from_config(&config);
    let context = build_context(&config, &tf)?;

    if !cli.scenario {
        info!("Startup complete. No event source attached; pass --scenario to run the synthetic one.");
        return Ok(());
    }

    let (sender, receiver) = mpsc::channel();
    let producer = ScenarioSource::new(&config.scenario)
        .context("invalid [scenario] section")?
        .spawn(sender);

    let mut event_loop = EventLoop::new(context, LogSink::new(cli.report));
    event_loop.run(&receiver);
    drop(receiver);

    producer
        .join()
        .map_err(|_| anyhow!("scenario producer thread panicked"))?;
    Ok(())
}
