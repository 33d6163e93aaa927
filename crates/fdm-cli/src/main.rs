mod cli;
mod commands;
mod error;

use clap::Parser;

use cli::{Cli, Command};

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Load { doc } => commands::load::run(&doc),
        Command::Eval { doc, path } => commands::eval::run(&doc, &path),
        Command::RunScript { script, ticks, dt } => commands::run_script::run(&script, ticks, dt),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
