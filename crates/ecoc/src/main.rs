//! The Eco core CLI.
//!
//! Provides the `ecoc` command with the following subcommands:
//!
//! - `ecoc lex <grammar> <file>` - Tokenize a file against a grammar file
//!   and print the resulting token stream.
//! - `ecoc check <file>` - Lex a file with the bundled demo grammar and
//!   validate it against a bundled demo LR table via the recognizer.
//! - `ecoc box <file>` - Lex a file with the bundled demo host grammar and
//!   run the language-box detector's line heuristic against its first
//!   error token, printing any candidates found.
//!
//! `check` and `box` ship their own illustrative grammar and LR table
//! rather than accepting an arbitrary one: compiling a grammar file to a
//! concrete LR table is out of this core's scope (section 1's "Grammar
//! compilation to concrete LR tables is out of scope"), the same way the
//! recognizer crate's own tests ship a hand-written table fixture.

mod demo;
mod diagnostics;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ecoc", version, about = "The Eco incremental-lexer and language-box core")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize a file against a grammar file
    Lex {
        /// Path to a `%key=value` + `KIND = pattern` grammar file
        grammar: PathBuf,
        /// Path to the source file to tokenize
        file: PathBuf,
    },
    /// Lex and validate a file against the bundled demo grammar
    Check {
        file: PathBuf,
    },
    /// Run the language-box detector's line heuristic on a file
    Box {
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Lex { grammar, file } => demo::run_lex(&grammar, &file),
        Commands::Check { file } => demo::run_check(&file),
        Commands::Box { file } => demo::run_box(&file),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
