//! CLI command definitions and argument parsing.
//!
//! Uses clap derive macros for ergonomic argument definitions.

pub mod args;

/// Static banner shown on startup and in `--help` output.
pub const BANNER: &str = "ai-reviewer \u{b7} AI-assisted code review";

/// Print the startup banner to stderr.
pub fn print_banner() {
    use colored::Colorize;
    use std::io::Write;
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = writeln!(handle);
    let _ = writeln!(handle, "  {} {}", "ai-reviewer".bold(), "\u{b7} AI-assisted code review".dimmed());
    let _ = writeln!(handle);
    let _ = handle.flush();
}
