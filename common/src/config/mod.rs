use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::err::DumpError;

/// Optional settings a CLI invocation can load from a TOML file instead of
/// (or in addition to) flags. Every field has a sensible default, so an
/// absent or partial config file is never an error.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DumpConfig {
    /// Directory tracing writes to when file logging is requested.
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Pragma overrides applied on every run unless the CLI supplies its
    /// own, in the same "name=value" / "name" syntax as CLI overrides.
    #[serde(default)]
    pub default_overrides: Vec<String>,
}

/// Reads and parses a TOML config file. Returns the default config, silently,
/// if no config was requested; callers resolve an absent `--config` path to
/// `DumpConfig::default()` rather than calling this function at all.
pub fn read_config<P: AsRef<Path>>(path: P) -> Result<DumpConfig, DumpError> {
    let mut file = File::open(path.as_ref())?;
    let mut text = String::new();
    file.read_to_string(&mut text)?;
    toml::from_str(&text).map_err(|e| DumpError::precondition(format!("bad config file: {e}")))
}
