//! CLI tool to tokenize Pieck sources and check tensor literal shapes.

mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pieck::{Error, Tokenizer, ValueArena, read_literal};

#[derive(Debug, Parser)]
#[command(name = "pieck", version, about = "Pieck front-end tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every token as `line:column kind text`
    Tokens {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Check that file(s) tokenize cleanly
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Read one tensor literal per file and print its shape
    Shape {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    logging::init_tracing();
    let cli = Cli::parse();

    let had_error = match &cli.command {
        Command::Tokens { files } => run_all(files, print_tokens),
        Command::Check { files } => run_all(files, check),
        Command::Shape { files } => run_all(files, print_shape),
    };

    if had_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Run `command` on every file, returning whether any failed.
fn run_all(files: &[PathBuf], command: fn(&Path) -> Result<(), Error>) -> bool {
    let mut had_error = false;
    for path in files {
        if let Err(e) = command(path) {
            report(path, &e);
            had_error = true;
        }
    }
    had_error
}

fn report(path: &Path, error: &Error) {
    match error {
        Error::Lex(e) => eprintln!("{}", e.diagnostic()),
        Error::Parse(e) => eprintln!("{}", e.diagnostic()),
        _ => eprintln!("{}: {error}", path.display()),
    }
}

fn print_tokens(path: &Path) -> Result<(), Error> {
    let mut tokens = Tokenizer::open(path)?;
    while tokens.next_token()? {
        if let Some(token) = tokens.current() {
            println!(
                "{}:{} {} {}",
                token.span.line, token.span.column, token.kind, token.text
            );
        }
    }
    Ok(())
}

fn check(path: &Path) -> Result<(), Error> {
    let mut tokens = Tokenizer::open(path)?;
    let mut count = 0usize;
    while tokens.next_token()? {
        count += 1;
    }
    eprintln!("{}: ok ({count} tokens)", path.display());
    Ok(())
}

fn print_shape(path: &Path) -> Result<(), Error> {
    let mut tokens = Tokenizer::open(path)?;
    let mut arena = ValueArena::new();
    let id = read_literal(&mut tokens, &mut arena)?;
    let shape = arena.shape(id)?;
    println!("{}: {shape}", path.display());
    Ok(())
}
