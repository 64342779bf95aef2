use std::io;
use std::process;

use anyhow::Result;
use clap::Parser;
use sceap_cli::{Cli, Commands};
use tracing::{debug, error};
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::{graph, hierarchy, paths, size, validate, Session};

fn run(cli: &Cli) -> Result<()> {
    let session = Session::from_cli(cli)?;
    match &cli.command {
        Commands::Validate {
            feeders,
            strict,
            json,
        } => validate::handle(&session, feeders, *strict, *json),
        Commands::Hierarchy { feeders } => hierarchy::handle(&session, feeders),
        Commands::Paths { feeders, out } => paths::handle(&session, feeders, out.as_ref()),
        Commands::Size { feeders, out } => size::handle(&session, feeders, out.as_ref()),
        Commands::Graph { command } => graph::handle(&session, command),
    }
}

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("sceap {} starting", env!("CARGO_PKG_VERSION"));

    if let Err(err) = run(&cli) {
        error!("{err:#}");
        process::exit(1);
    }
}
