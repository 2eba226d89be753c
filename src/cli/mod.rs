//! The weft command-line interface.
//!
//! A thin front end over [`crate::arith`]: it reads an expression from the
//! command line or a file, evaluates it, and renders failures with `miette`.

use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::Parser;
use miette::{IntoDiagnostic, WrapErr};

use crate::arith;
use crate::cli::args::{Command, WeftArgs};
use crate::session::ParseOptions;

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = WeftArgs::parse();

    let result = match args.command {
        Command::Calc {
            expr,
            file,
            options,
            stats,
        } => handle_calc(expr, file, options.as_deref(), stats),
    };

    if let Err(report) = result {
        eprintln!("{report:?}");
        process::exit(1);
    }
}

/// Handles the `calc` subcommand.
fn handle_calc(
    expr: Option<String>,
    file: Option<PathBuf>,
    options_path: Option<&Path>,
    show_stats: bool,
) -> miette::Result<()> {
    let source = match (expr, file) {
        (Some(expr), _) => expr,
        (None, Some(path)) => fs::read_to_string(&path)
            .into_diagnostic()
            .wrap_err_with(|| format!("could not read {}", path.display()))?,
        (None, None) => miette::bail!("no expression given"),
    };
    let options = match options_path {
        Some(path) => load_options(path)?,
        None => ParseOptions::default(),
    };
    log::debug!("evaluating {source:?} with {options:?}");

    let (result, stats) = arith::evaluate_with_stats(&source, options);
    let value = result?;
    output::print_value(value).into_diagnostic()?;
    if show_stats {
        output::print_stats(&stats).into_diagnostic()?;
    }
    Ok(())
}

fn load_options(path: &Path) -> miette::Result<ParseOptions> {
    let text = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("could not read {}", path.display()))?;
    serde_json::from_str(&text)
        .into_diagnostic()
        .wrap_err_with(|| format!("invalid parse options in {}", path.display()))
}
