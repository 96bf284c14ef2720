use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "swipecal", version, about = "Infinite month/week calendar for the terminal")]
pub struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(short = 'L', long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the month grid (or week strip) containing a date
    Show {
        /// Date in YYYY-MM-DD format (defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Print the week strip instead of the month grid
        #[arg(long)]
        week: bool,
    },
    /// Launch the interactive calendar
    Tui {
        /// Initially selected date in YYYY-MM-DD format
        #[arg(long)]
        date: Option<String>,
    },
}
