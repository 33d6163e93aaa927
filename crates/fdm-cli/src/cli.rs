use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fdm", bin_name = "fdm")]
#[command(about = "Inspect and evaluate flight-dynamics expression documents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse a configuration document and report the functions it publishes
    Load {
        /// Path to a configuration document
        doc: PathBuf,
    },

    /// Load a document and evaluate one registry path
    Eval {
        /// Path to a configuration document
        doc: PathBuf,
        /// Registry path to evaluate, e.g. `aero/cl-alpha`
        path: String,
    },

    /// Load a script document and step it tick by tick
    RunScript {
        /// Path to a script document
        script: PathBuf,
        /// Number of ticks to run
        #[arg(long, default_value_t = 1)]
        ticks: u32,
        /// Tick width in seconds
        #[arg(long, default_value_t = 0.1)]
        dt: f64,
    },
}
