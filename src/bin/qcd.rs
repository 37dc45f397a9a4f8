//! qcd - order-independent checksums for line-oriented data.
//!
//! With no usable verification data the tool fingerprints its input and
//! reports (optionally records) the checksum metadata. When the `-v` file
//! exists, the input is verified against it instead; the exit code carries
//! the verdict.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;
use std::process;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use qcd::{open_input, Checksummer, Metadata, SketchKind};

/// Aggregate mismatched but no per-record miss (e.g. mask mismatch).
const EXIT_AGGREGATE_MISMATCH: i32 = -1;
/// The `-r` pattern failed to compile.
const EXIT_INVALID_REGEX: i32 = -2;
/// Verification I/O or unpack failure.
const EXIT_VERIFY_FAILURE: i32 = -3;
/// Input I/O failure.
const EXIT_INPUT_FAILURE: i32 = -4;

/// Order-independent checksums for line-oriented data
#[derive(Parser)]
#[command(name = "qcd", version)]
struct Cli {
    /// Input file; standard input when omitted. .gz, .bz2 and .xz inputs
    /// are decompressed on the fly
    input: Option<String>,

    /// Enable verbose errors (one diagnostic per unverified line)
    #[arg(short = 'e')]
    verbose: bool,

    /// Regex to mask unstable content (e.g. dates, offsets, etc.)
    #[arg(short = 'r', value_name = "regex")]
    mask_regex: Option<String>,

    /// Text to use for masked content
    #[arg(short = 'x', value_name = "text", default_value = "")]
    mask_replacement: String,

    /// Verification data filename [%s replaced with input name]
    #[arg(short = 'v', value_name = "filename", default_value = "%s.qcd")]
    verify_file: String,

    /// Estimated data size (0, S, M, L, or * for auto)
    #[arg(short = 'z', value_name = "size", default_value = "*")]
    sum_size: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();
    let mut verify_file = cli.verify_file.clone();

    let source: Box<dyn Read> = match &cli.input {
        Some(name) => {
            let (reader, base) = match open_input(Path::new(name)) {
                Ok(opened) => opened,
                Err(err) => {
                    error!("error opening source file: {err}");
                    process::exit(EXIT_INPUT_FAILURE);
                }
            };
            if verify_file.contains("%s") {
                verify_file = substitute_base(&verify_file, &base);
            }
            reader
        }
        None => {
            info!("reading from standard input...");
            Box::new(io::stdin().lock())
        }
    };

    let verify_data = load_verify_data(&verify_file);

    let kind = SketchKind::from_flag(cli.sum_size.bytes().next().unwrap_or(b'*'));
    let mut ck = Checksummer::with_sketch(kind);

    if let Some(pattern) = cli.mask_regex.as_deref().filter(|p| !p.is_empty()) {
        if let Err(err) = ck.set_mask(pattern, &cli.mask_replacement) {
            error!("invalid regex: -r '{pattern}': {err}");
            process::exit(EXIT_INVALID_REGEX);
        }
    }
    if cli.verbose {
        ck.set_verbose(io::stderr());
    }

    if let Some(meta) = verify_data {
        match ck.verify(source, &meta) {
            Ok(outcome) => {
                if !outcome.valid && outcome.unverified == 0 {
                    process::exit(EXIT_AGGREGATE_MISMATCH);
                }
                process::exit(i32::try_from(outcome.unverified).unwrap_or(i32::MAX));
            }
            Err(err) => {
                error!("unable to verify: {err}");
                process::exit(EXIT_VERIFY_FAILURE);
            }
        }
    }

    if let Err(err) = ck.sum(source) {
        error!("an error occurred: {err}");
        process::exit(EXIT_INPUT_FAILURE);
    }

    let stats = match ck.info() {
        Ok(stats) => stats,
        Err(err) => {
            error!("unable to encode checksum data: {err}");
            process::exit(EXIT_INPUT_FAILURE);
        }
    };

    if !verify_file.is_empty() && !verify_file.contains("%s") {
        match write_verify_data(&verify_file, &stats) {
            Ok(()) => info!("writing verification data to {verify_file}"),
            Err(err) => error!("error writing verification file: {err}"),
        }
    }

    for (key, val) in &stats {
        eprintln!("{key:<20}: {}", elide(val));
    }
}

/// Substitute `%s` in the verification filename: a `%s` prefix takes the
/// whole input base path, anywhere else it takes just the base file name.
fn substitute_base(pattern: &str, base: &str) -> String {
    if let Some(rest) = pattern.strip_prefix("%s") {
        return format!("{base}{rest}");
    }
    let name = Path::new(base)
        .file_name()
        .map_or_else(|| base.to_string(), |n| n.to_string_lossy().into_owned());
    pattern.replace("%s", &name)
}

/// Read and decode the verification side-file. A missing file means "sum
/// instead of verify"; any other failure is fatal.
fn load_verify_data(verify_file: &str) -> Option<Metadata> {
    if verify_file.is_empty() {
        return None;
    }
    let bytes = match fs::read(verify_file) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
        Err(err) => {
            error!("unable to verify: -v '{verify_file}': {err}");
            process::exit(EXIT_VERIFY_FAILURE);
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(meta) => {
            info!("reading verification data from {verify_file}");
            Some(meta)
        }
        Err(err) => {
            error!("unable to verify: -v '{verify_file}': {err}");
            process::exit(EXIT_VERIFY_FAILURE);
        }
    }
}

fn write_verify_data(path: &str, stats: &Metadata) -> io::Result<()> {
    let mut file = File::create(path)?;
    serde_json::to_writer(&mut file, stats)?;
    writeln!(file)?;
    Ok(())
}

/// Shorten long values (sketch blobs) for the stats listing.
fn elide(val: &str) -> String {
    if val.len() > 100 && val.is_ascii() {
        format!("{}...{}", &val[..50], &val[val.len() - 50..])
    } else {
        val.to_string()
    }
}
