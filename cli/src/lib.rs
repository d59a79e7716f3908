//! Shared scaffolding for the `store` and `load` binaries: both parse a
//! near-identical argument surface, open the same kind of SQLite
//! connection, and report failures the same way, so the parsing and
//! bootstrap live here once instead of twice.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use common::config::{read_config, DumpConfig};
use common::err::{CResult, DumpError};
use common::log::tracing_factory::{OutputType, TracingFactory, TracingFactoryOptions};

/// Flags common to both `store` and `load`: a target database file, an
/// optional config file, debug logging, the schema-only switch, and a
/// trailing list of pragma overrides (`name=value` or bare `name` to
/// suppress).
#[derive(Parser, Debug, Clone)]
pub struct CommonArgs {
    /// SQLite database file the dump is taken from, or restored into.
    pub dbfile: PathBuf,

    /// Pragma overrides, `name=value` to replace a captured value or bare
    /// `name` to suppress it entirely.
    pub overrides: Vec<String>,

    /// Emit only pragmas and schema; skip table row data.
    #[arg(short = 's', long)]
    pub schema_only: bool,

    /// Path to an optional TOML config file (default pragma overrides,
    /// log directory).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug-level tracing.
    #[arg(short, long, default_value_t = false)]
    pub debug: bool,
}

impl CommonArgs {
    pub fn load_config(&self) -> DumpConfig {
        match &self.config {
            Some(path) => read_config(path).unwrap_or_else(|e| {
                eprintln!("warning: ignoring unreadable config file {path:?}: {e}");
                DumpConfig::default()
            }),
            None => DumpConfig::default(),
        }
    }

    /// All overrides that apply to this run: the config file's defaults
    /// followed by the command line's, so a flag always wins over the
    /// file for the same pragma name.
    pub fn effective_overrides(&self, config: &DumpConfig) -> Vec<String> {
        let mut overrides = config.default_overrides.clone();
        overrides.extend(self.overrides.iter().cloned());
        overrides
    }
}

pub fn init_logging(debug: bool, log_dir: Option<String>) -> TracingFactory {
    let output = if log_dir.is_some() { OutputType::Log } else { OutputType::Stdout };
    TracingFactory::init_with_options(TracingFactoryOptions::new(debug, output, log_dir))
}

pub fn banner(tool: &str) {
    eprintln!();
    eprintln!("╔═╗╔╗ ╔╦╗  {tool}");
    eprintln!("╚═╗╚╗   ║   SQLite dump/restore toolkit");
    eprintln!("╚═╝╚╝   ╩ ");
    eprintln!();
}

/// Runs `body`, reporting any [`DumpError`] to stderr and mapping it to the
/// process exit code callers expect: 1 on failure, 0 on success.
pub fn run(tool: &str, body: impl FnOnce() -> CResult<()>) -> ExitCode {
    match body() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{tool}: {err}");
            ExitCode::FAILURE
        }
    }
}

pub fn open_existing(path: &std::path::Path) -> CResult<rusqlite::Connection> {
    rusqlite::Connection::open(path).map_err(|e| DumpError::engine("opening database file", e))
}
