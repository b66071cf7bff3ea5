//! Configuration at ~/.config/chalkboard/config.toml, overridable with
//! `CHALKBOARD_*` environment variables (`CHALKBOARD_STORE__URL` for nested
//! keys).

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_RECURRENCE_STEPS;
use crate::error::{ChalkboardError, ChalkboardResult};

static DEFAULT_EVENTS_PATH: &str = "~/.local/share/chalkboard/events.json";
static DEFAULT_LOG_LEVEL: &str = "warn";

fn default_events_path() -> PathBuf {
    PathBuf::from(DEFAULT_EVENTS_PATH)
}

fn default_max_steps() -> usize {
    MAX_RECURRENCE_STEPS
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChalkboardConfig {
    /// Owner of every event read or written.
    pub user_id: Option<String>,

    /// IANA zone name; the system zone is used when unset.
    pub timezone: Option<String>,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub recurrence: RecurrenceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Local JSON file at `store.path`.
    #[default]
    Memory,
    /// Hosted table at `store.url`.
    Rest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    #[serde(default = "default_events_path")]
    pub path: PathBuf,

    pub url: Option<String>,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            backend: StoreBackend::default(),
            path: default_events_path(),
            url: None,
            api_key: None,
            access_token: None,
        }
    }
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        RecurrenceConfig {
            max_steps: default_max_steps(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

impl StoreConfig {
    /// `path` with a leading `~` expanded.
    pub fn events_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path.to_string_lossy()).into_owned())
    }
}

impl ChalkboardConfig {
    pub fn config_path() -> ChalkboardResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ChalkboardError::Config("Could not determine config directory".into()))?
            .join("chalkboard");

        Ok(config_dir.join("config.toml"))
    }

    /// Read the config file (creating a commented default on first run) and
    /// apply environment overrides.
    pub fn load() -> ChalkboardResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::build(
            Config::builder()
                .add_source(File::from(config_path).required(false))
                .add_source(
                    Environment::with_prefix("CHALKBOARD")
                        .prefix_separator("_")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    /// Parse TOML text without touching the environment.
    pub fn from_toml(contents: &str) -> ChalkboardResult<Self> {
        Self::build(Config::builder().add_source(File::from_str(contents, FileFormat::Toml)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> ChalkboardResult<Self> {
        builder
            .build()
            .map_err(|e| ChalkboardError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ChalkboardError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> ChalkboardResult<()> {
        let contents = format!(
            "\
# chalkboard configuration

# Owner of the events you read and write:
# user_id = \"00000000-0000-0000-0000-000000000000\"

# Time zone for days and all-day events (defaults to the system zone):
# timezone = \"Europe/Lisbon\"

[store]
# \"memory\" keeps events in a local file, \"rest\" talks to the hosted table.
# backend = \"memory\"
# path = \"{DEFAULT_EVENTS_PATH}\"
# url = \"https://your-project.supabase.co\"
# api_key = \"...\"
# access_token = \"...\"

[recurrence]
# Most steps walked per recurring event when filling a view:
# max_steps = {MAX_RECURRENCE_STEPS}

[logging]
# Overridden by RUST_LOG:
# level = \"{DEFAULT_LOG_LEVEL}\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ChalkboardError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ChalkboardError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// The configured owner, required by every store query.
    pub fn user_id(&self) -> ChalkboardResult<&str> {
        self.user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ChalkboardError::Config(
                    "user_id is not set (add it to the config file or set CHALKBOARD_USER_ID)"
                        .into(),
                )
            })
    }

    /// The configured zone, if any.
    pub fn time_zone(&self) -> ChalkboardResult<Option<Tz>> {
        self.timezone
            .as_deref()
            .map(|name| {
                name.trim()
                    .parse::<Tz>()
                    .map_err(|_| ChalkboardError::Config(format!("Unknown time zone '{name}'")))
            })
            .transpose()
    }

    pub fn max_steps(&self) -> usize {
        self.recurrence.max_steps.max(1)
    }
}
