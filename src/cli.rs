// Command-line front end for rudiff.
//
// This layer owns everything the core does not: argument parsing, opening
// files (with `-` standing in for stdin/stdout), overwrite protection, log
// setup and exit-code mapping. The core only ever sees pre-opened streams.
//
// Exit codes: 0 success, 1 invalid invocation or refused output,
// 2 operation failure.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use log::debug;

use crate::delta::DeltaStats;
use crate::error::Error;
use crate::signature::{SignatureHeader, SignatureIndex, SignatureStats};
use crate::{delta, engine};

const BUF_SIZE: usize = 64 * 1024;

const EXIT_SUCCESS: i32 = 0;
const EXIT_INVALID_OPTIONS: i32 = 1;
const EXIT_OPERATION_FAILURE: i32 = 2;

// ---------------------------------------------------------------------------
// Byte size parsing (supports K, M, G suffixes)
// ---------------------------------------------------------------------------

fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".into());
    }
    let (num_part, multiplier) = match s.as_bytes().last() {
        Some(b'k' | b'K') => (&s[..s.len() - 1], 1024u64),
        Some(b'm' | b'M') => (&s[..s.len() - 1], 1024 * 1024),
        Some(b'g' | b'G') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        _ => (s, 1u64),
    };
    let num: u64 = num_part
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{s}': {e}"))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size overflow: '{s}'"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// rdiff-style signature/delta tool.
#[derive(Parser, Debug)]
#[command(
    name = "rudiff",
    version,
    about = "Compute rdiff-style signatures and binary deltas",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Compute a signature of a baseline file.
    Signature(SignatureArgs),
    /// Compute a delta from a signature and an updated file.
    Delta(DeltaArgs),
}

#[derive(Args, Debug)]
struct SignatureArgs {
    /// Baseline file (`-` for stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Signature output file (`-` for stdout).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Block size in bytes (supports K/M/G suffix).
    #[arg(long = "block-size", short = 'b', value_parser = parse_byte_size, default_value = "2048")]
    block_size: u64,

    /// Truncated strong-sum length in bytes (1-16).
    #[arg(long = "strong-len", short = 'S', default_value_t = 8)]
    strong_len: u32,
}

#[derive(Args, Debug)]
struct DeltaArgs {
    /// Signature file (`-` for stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    signature: PathBuf,

    /// Updated file (`-` for stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    updated: Option<PathBuf>,

    /// Delta output file (`-` for stdout).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Stream opening (`-` = stdin/stdout sentinel)
// ---------------------------------------------------------------------------

fn is_stdio(path: Option<&PathBuf>) -> bool {
    path.is_none_or(|p| p.as_os_str() == "-")
}

fn open_input(path: Option<&PathBuf>, role: &str) -> Result<Box<dyn Read>, i32> {
    let path = match path {
        Some(p) if p.as_os_str() != "-" => p,
        _ => return Ok(Box::new(BufReader::with_capacity(BUF_SIZE, io::stdin()))),
    };
    match File::open(path) {
        Ok(f) => Ok(Box::new(BufReader::with_capacity(BUF_SIZE, f))),
        Err(e) => {
            eprintln!("rudiff: {role} file: {}: {e}", path.display());
            Err(EXIT_OPERATION_FAILURE)
        }
    }
}

fn open_output(path: Option<&PathBuf>, role: &str, force: bool) -> Result<Box<dyn Write>, i32> {
    let path = match path {
        Some(p) if p.as_os_str() != "-" => p,
        _ => {
            return Ok(Box::new(BufWriter::with_capacity(
                BUF_SIZE,
                io::stdout().lock(),
            )))
        }
    };
    if path.exists() && !force {
        eprintln!(
            "rudiff: {role} file exists, use -f to overwrite: {}",
            path.display()
        );
        return Err(EXIT_INVALID_OPTIONS);
    }
    match File::create(path) {
        Ok(f) => Ok(Box::new(BufWriter::with_capacity(BUF_SIZE, f))),
        Err(e) => {
            eprintln!("rudiff: {role} file: {}: {e}", path.display());
            Err(EXIT_OPERATION_FAILURE)
        }
    }
}

// ---------------------------------------------------------------------------
// Signature command
// ---------------------------------------------------------------------------

fn cmd_signature(args: &SignatureArgs, force: bool, quiet: bool, json: bool) -> i32 {
    let block_size = match u32::try_from(args.block_size) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("rudiff: block size {} exceeds u32 range", args.block_size);
            return EXIT_INVALID_OPTIONS;
        }
    };
    let header = match SignatureHeader::new(block_size, args.strong_len) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("rudiff: {e}");
            return EXIT_INVALID_OPTIONS;
        }
    };

    let mut input = match open_input(args.input.as_ref(), "baseline") {
        Ok(r) => r,
        Err(code) => return code,
    };
    let mut output = match open_output(args.output.as_ref(), "signature", force) {
        Ok(w) => w,
        Err(code) => return code,
    };

    let stats = match engine::signature(&mut input, &mut output, header) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("rudiff: signature: {e}");
            return exit_code_for(&e);
        }
    };
    if let Err(e) = output.flush() {
        eprintln!("rudiff: signature: flush: {e}");
        return EXIT_OPERATION_FAILURE;
    }

    report_signature(&stats, header, quiet, json);
    EXIT_SUCCESS
}

fn report_signature(stats: &SignatureStats, header: SignatureHeader, quiet: bool, json: bool) {
    if json {
        let payload = serde_json::json!({
            "command": "signature",
            "blocks": stats.blocks,
            "baseline_bytes": stats.baseline_len,
            "block_size": header.block_size,
            "strong_len": header.strong_len,
        });
        eprintln!("{payload:#}");
    } else if !quiet {
        debug!(
            "signature: {} blocks over {} bytes",
            stats.blocks, stats.baseline_len
        );
    }
}

// ---------------------------------------------------------------------------
// Delta command
// ---------------------------------------------------------------------------

fn cmd_delta(args: &DeltaArgs, force: bool, quiet: bool, json: bool) -> i32 {
    let sig_is_stdin = args.signature.as_os_str() == "-";
    if sig_is_stdin && is_stdio(args.updated.as_ref()) {
        eprintln!("rudiff: signature and updated file cannot both be stdin");
        return EXIT_INVALID_OPTIONS;
    }

    let mut sig_input = match open_input(Some(&args.signature), "signature") {
        Ok(r) => r,
        Err(code) => return code,
    };
    let index = match SignatureIndex::parse(&mut sig_input) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("rudiff: delta: {e}");
            return exit_code_for(&e);
        }
    };
    drop(sig_input);

    let mut updated = match open_input(args.updated.as_ref(), "updated") {
        Ok(r) => r,
        Err(code) => return code,
    };
    let mut output = match open_output(args.output.as_ref(), "delta", force) {
        Ok(w) => w,
        Err(code) => return code,
    };

    let stats = match delta::compute(&index, &mut updated, &mut output) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("rudiff: delta: {e}");
            return exit_code_for(&e);
        }
    };
    if let Err(e) = output.flush() {
        eprintln!("rudiff: delta: flush: {e}");
        return EXIT_OPERATION_FAILURE;
    }

    report_delta(&stats, &index, quiet, json);
    EXIT_SUCCESS
}

fn report_delta(stats: &DeltaStats, index: &SignatureIndex, quiet: bool, json: bool) {
    if json {
        let payload = serde_json::json!({
            "command": "delta",
            "copies": stats.copies,
            "copy_bytes": stats.copy_bytes,
            "literals": stats.literals,
            "literal_bytes": stats.literal_bytes,
            "updated_bytes": stats.updated_len(),
            "baseline_blocks": index.block_count(),
        });
        eprintln!("{payload:#}");
    } else if !quiet {
        debug!(
            "delta: {} copies ({} bytes), {} literals ({} bytes)",
            stats.copies, stats.copy_bytes, stats.literals, stats.literal_bytes
        );
    }
}

// ---------------------------------------------------------------------------
// Exit-code mapping
// ---------------------------------------------------------------------------

fn exit_code_for(e: &Error) -> i32 {
    match e {
        Error::InvalidParameters(_) => EXIT_INVALID_OPTIONS,
        _ => EXIT_OPERATION_FAILURE,
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();

    // Logs go to stderr; stdout may carry signature/delta bytes.
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let exit_code = match &cli.command {
        Cmd::Signature(args) => cmd_signature(args, cli.force, cli.quiet, cli.json_output),
        Cmd::Delta(args) => cmd_delta(args, cli.force, cli.quiet, cli.json_output),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
