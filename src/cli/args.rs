//! Defines the command-line arguments and subcommands for the weft CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "weft",
    version,
    about = "Evaluate arithmetic with the weft parser-combinator engine."
)]
pub struct WeftArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate an arithmetic expression such as `10 - 5 - 2`.
    Calc {
        /// The expression to evaluate.
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        expr: Option<String>,
        /// Read the expression from a file instead.
        #[arg(long, short)]
        file: Option<PathBuf>,
        /// JSON file with parse options, e.g. `{"max_growth_passes": 64}`.
        #[arg(long)]
        options: Option<PathBuf>,
        /// Print session statistics as JSON after the result.
        #[arg(long)]
        stats: bool,
    },
}
