//! `colorscheme` command-line tool.
//!
//! ```text
//! colorscheme set dark          # pin dark
//! colorscheme set system        # follow the OS again
//! colorscheme status --json     # {"user":"light dark","current":"dark"}
//! colorscheme watch             # print a line whenever the scheme changes
//! ```

mod cli;
mod config;

use std::io;

use anyhow::Result;
use clap::Parser;
use colorscheme::OsSchemeProvider;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let stdout = io::stdout();
    let stderr = io::stderr();
    cli::run(
        cli,
        OsSchemeProvider::new(),
        &mut stdout.lock(),
        &mut stderr.lock(),
    )
}

/// `RUST_LOG` takes precedence; otherwise `warn`, or `debug` with `-v`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
