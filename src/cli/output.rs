//! Handles all user-facing output for the CLI.
//!
//! Results go to stdout, colored when stdout is a terminal. Statistics are
//! printed as pretty JSON so they can be piped into other tools.

use std::io::{self, IsTerminal, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::session::SessionStats;

fn stdout() -> StandardStream {
    let choice = if io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

/// Prints an evaluation result.
pub fn print_value(value: f64) -> io::Result<()> {
    let mut out = stdout();
    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
    write!(out, "{value}")?;
    out.reset()?;
    writeln!(out)
}

/// Prints session statistics as JSON.
pub fn print_stats(stats: &SessionStats) -> io::Result<()> {
    let json = serde_json::to_string_pretty(stats)?;
    let mut out = stdout();
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
    writeln!(out, "{json}")?;
    out.reset()
}
