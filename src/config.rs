use crate::parser::Dialect;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CLASSES_DIR: &str = "classes";
pub const DEFAULT_GRADES_DIR: &str = "grades";
const DEFAULT_ENTRY_DELAY_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub classes_dir: PathBuf,
    pub grades_dir: PathBuf,
    pub dialect: Dialect,
    pub entry_delay: Duration,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            classes_dir: PathBuf::from(DEFAULT_CLASSES_DIR),
            grades_dir: PathBuf::from(DEFAULT_GRADES_DIR),
            dialect: Dialect::Auto,
            entry_delay: Duration::from_secs(DEFAULT_ENTRY_DELAY_SECS),
            log_file: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from a variable lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(dir) = get("GRADE_TALLY_CLASSES_DIR") {
            config.classes_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("GRADE_TALLY_GRADES_DIR") {
            config.grades_dir = PathBuf::from(dir);
        }
        if let Some(dialect) = get("GRADE_TALLY_DIALECT") {
            config.dialect = dialect
                .parse()
                .map_err(|e: String| anyhow!(e))
                .context("Invalid GRADE_TALLY_DIALECT")?;
        }
        if let Some(delay) = get("GRADE_TALLY_ENTRY_DELAY") {
            let secs: u64 = delay
                .trim()
                .parse()
                .with_context(|| format!("GRADE_TALLY_ENTRY_DELAY must be whole seconds, got '{}'", delay))?;
            config.entry_delay = Duration::from_secs(secs);
        }
        config.log_file = get("GRADE_TALLY_LOG_FILE").map(PathBuf::from);

        Ok(config)
    }
}
