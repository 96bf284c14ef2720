mod cli;
mod commands;
mod model;
mod panel;
mod storage;
mod sync;
mod ui;
mod viewport;
mod window;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let config_path = storage::resolve_config_path(args.config)?;
    let config = storage::load_config(&config_path)?;
    commands::init_logging(&config, args.log_level.as_deref());
    let command = args.command.unwrap_or(cli::Command::Tui { date: None });
    match command {
        cli::Command::Init { force } => commands::init(&config_path, force),
        cli::Command::Show { date, week } => commands::show(&config, date, week),
        cli::Command::Tui { date } => commands::tui(config, date),
    }
}
