//! subwatch - price watcher for classifieds search results

use clap::Parser;
use colored::Colorize;

use subwatch::cli::{usage, Cli, Mode};
use subwatch::config::Config;
use subwatch::error::Result;
use subwatch::logging;

mod commands;
mod utils;

use commands::SearchFlags;

fn main() {
    let cli = Cli::parse();

    // Logging is best-effort; a missing log directory must not stop a check
    let _guard = match Config::log_dir().and_then(|dir| logging::init(&dir)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("{} logging disabled: {}", "Warning:".yellow(), e);
            None
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(hint) = e.hint() {
            eprintln!("\n{}", hint);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let flags = SearchFlags {
        category: cli.category.clone(),
        region: cli.region.clone(),
        interval: cli.interval,
        limit: cli.limit,
        pages: cli.pages,
    };

    match cli.mode() {
        Mode::Test { url, product } => {
            commands::cmd_test(cli.config.as_deref(), url, product, &flags, cli.json)
        }
        Mode::Monitor { product, min, max } => {
            commands::cmd_monitor(cli.config, product, min, max, &flags)
        }
        Mode::RunSaved => commands::cmd_run(cli.config),
        Mode::Usage => {
            println!("{}", usage());
            Ok(())
        }
    }
}
