use std::io::IsTerminal;

use clap::Parser;
use policy_atlas::{Cli, run};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("ATLAS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();

    let json = cli.json;
    if let Err(err) = run(cli) {
        err.report(json);
        std::process::exit(err.code);
    }
}
