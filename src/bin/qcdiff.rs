//! qcdiff - reorder-tolerant diff between two verified data files.
//!
//! Both inputs must carry a `.qcd` side-file and pass self-verification.
//! The diff is written to standard output; one prefix character per line:
//! space (equal), `*` (present on both sides but displaced), `+` (added on
//! the right), `-` (removed from the left).

use std::io;
use std::process;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use qcd::Source;

const EXIT_USAGE: i32 = -1;
const EXIT_LOAD_FAILURE: i32 = -2;

/// Reorder-tolerant diff between two verified data files
#[derive(Parser)]
#[command(name = "qcdiff", version)]
struct Cli {
    /// Base (left-hand) data file
    base_file: String,

    /// Test (right-hand) data file
    test_file: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            process::exit(EXIT_USAGE);
        }
    };

    let left = open_source(&cli.base_file);
    let right = open_source(&cli.test_file);

    let stdout = io::stdout().lock();
    if let Err(err) = left.diff_against(&right, stdout) {
        error!("writing diff: {err}");
        process::exit(EXIT_LOAD_FAILURE);
    }
}

fn open_source(path: &str) -> Source {
    match Source::open(path) {
        Ok(source) => source,
        Err(err) => {
            error!("{err}");
            process::exit(EXIT_LOAD_FAILURE);
        }
    }
}
