//! CLI module for the yarrow schema compiler
//!
//! ## Commands
//!
//! - `validate [DIR]` - Load a package with its imports and validate it
//! - `schema [DIR] [--protocol NAME]` - Validate and print protocol schema strings
//! - `--check-type TYPE` / `--check-expr EXPR` - Parse a type string or expression and print its tree (debug)
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;
pub mod report;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use report::RenderMode;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// The yarrow schema compiler
#[derive(Parser, Debug)]
#[command(name = "yarrow")]
#[command(version = VERSION)]
#[command(about = "Validate yarrow data models and print protocol schemas", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    // Debug/development flags
    /// Parse a type string and print its tree (debug)
    #[arg(long = "check-type", value_name = "TYPE", conflicts_with = "check_expr")]
    pub check_type: Option<String>,

    /// Parse a computed-field expression and print its tree (debug)
    #[arg(long = "check-expr", value_name = "EXPR")]
    pub check_expr: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print diagnostics as plain `file:line:column: message` lines
    #[arg(long, global = true)]
    pub plain: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a package with its imports and validate it
    Validate {
        /// Package directory containing `_package.yml`
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,
    },

    /// Validate a package and print its protocol schemas
    Schema {
        /// Package directory containing `_package.yml`
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,
        /// Print only this protocol (`Name` in the root namespace, or `Ns.Name`)
        #[arg(long, value_name = "NAME")]
        protocol: Option<String>,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Structured logging to stderr with an env-based filter, defaulting to info (debug with `--verbose`).
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .try_init();
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    // Handle debug flags first
    if let Some(text) = cli.check_type {
        return commands::check_type(&text);
    }
    if let Some(text) = cli.check_expr {
        return commands::check_expr(&text);
    }

    let mode = if cli.plain { RenderMode::Plain } else { RenderMode::Fancy };
    match cli.command {
        Some(Command::Validate { dir }) => commands::validate_package(&dir, mode),
        Some(Command::Schema { dir, protocol }) => commands::print_schemas(&dir, protocol.as_deref(), mode),
        // No command - show help
        None => Err(CliError::failure("Error: no command given; run `yarrow --help` for usage")),
    }
}

// ============================================================================
// Tests
// ============================================================================
