//! Thin CLI wrappers around the `dai` front end and the `dai-fmt` printer.
//!
//! None of these subcommands are part of the core: `runfile` can only take
//! a source through tokenizing and parsing, since compiling a [`Program`]
//! to bytecode and running it on a VM live downstream of this crate, in a
//! collaborator this workspace doesn't implement.
//!
//! [`Program`]: dai::Program

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[clap(name = "dai", bin_name = "dai", version)]
struct Args {
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tokenize and parse a file, reporting any diagnostic.
    ///
    /// Execution itself (running the parsed program on a VM) is not
    /// implemented by this crate; this only exercises the front end.
    Runfile { path: PathBuf },
    /// Print the ANSI-colored AST debug form of a file.
    ShowAst {
        path: PathBuf,
        /// Expand every node instead of only the top-level summary.
        #[clap(long)]
        recursive: bool,
    },
    /// Tokenize, parse and format a file, printing wall-clock timings.
    Benchmark { path: PathBuf },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let result = match args.cmd {
        Command::Runfile { path } => runfile(&path),
        Command::ShowAst { path, recursive } => show_ast(&path, recursive),
        Command::Benchmark { path } => benchmark(&path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %format!("{error:#}"), "operation failed");
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn read_source(path: &PathBuf) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn filename_of(path: &PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

fn runfile(path: &PathBuf) -> Result<()> {
    let source = read_source(path)?;
    let filename = filename_of(path);
    let (program, diagnostic) = dai::parse_source(&source, &filename);
    if let Some(diagnostic) = diagnostic {
        anyhow::bail!("{diagnostic}");
    }
    tracing::info!(
        statements = program.statements.len(),
        "parsed; execution is not implemented by this crate"
    );
    println!(
        "parsed {} statement(s) from {filename}; running it requires a bytecode compiler and VM, which live outside this crate",
        program.statements.len()
    );
    Ok(())
}

fn show_ast(path: &PathBuf, recursive: bool) -> Result<()> {
    let source = read_source(path)?;
    let filename = filename_of(path);
    let (program, diagnostic) = dai::parse_source(&source, &filename);
    if let Some(diagnostic) = diagnostic {
        anyhow::bail!("{diagnostic}");
    }
    print!("{}", dai::debug::ast_debug_string(&program, recursive));
    Ok(())
}

fn benchmark(path: &PathBuf) -> Result<()> {
    let source = read_source(path)?;
    let filename = filename_of(path);

    let start = Instant::now();
    let (tokens, lex_error) = dai::tokenize(&source);
    let tokenize_elapsed = start.elapsed();
    if let Some(diagnostic) = lex_error {
        anyhow::bail!("{}", diagnostic.with_filename(&filename));
    }

    let start = Instant::now();
    let (program, parse_error) = dai::parse(tokens.clone());
    let parse_elapsed = start.elapsed();
    if let Some(diagnostic) = parse_error {
        anyhow::bail!("{}", diagnostic.with_filename(&filename));
    }

    let start = Instant::now();
    let formatted = dai_fmt::format(&program, &tokens, source.len());
    let format_elapsed = start.elapsed();

    println!("file:     {filename}");
    println!("bytes:    {}", source.len());
    println!("tokenize: {tokenize_elapsed:?}");
    println!("parse:    {parse_elapsed:?}");
    println!("format:   {format_elapsed:?} ({} bytes out)", formatted.len());
    Ok(())
}
