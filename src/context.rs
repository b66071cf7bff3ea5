//! Logging setup and per-run settings.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use chalkboard_core::notice::Notice;
use chalkboard_core::{ChalkboardConfig, EventStore, MutationGateway, Notifier, RestStore};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

/// Filter used until the config file has been read.
const BOOT_LOG_LEVEL: &str = "warn";

/// Swaps the log filter once the configured level is known.
pub struct LogHandle {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

/// Install the stderr subscriber. `RUST_LOG` wins over the config file.
pub fn init_tracing() -> LogHandle {
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter_layer, handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new(BOOT_LOG_LEVEL)));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    LogHandle { handle, from_env }
}

impl LogHandle {
    pub fn apply_level(&self, level: &str) {
        if self.from_env {
            return;
        }
        match EnvFilter::try_new(level) {
            Ok(filter) => {
                if let Err(e) = self.handle.modify(|current| *current = filter) {
                    tracing::warn!(error = %e, "Failed to update log filter from config");
                }
            }
            Err(_) => {
                tracing::warn!(level, "Invalid log level in config, keeping {BOOT_LOG_LEVEL}");
            }
        }
    }
}

/// Settings every store-backed command needs.
pub struct Context {
    pub config: ChalkboardConfig,
    pub user_id: String,
    pub tz: Tz,
}

impl Context {
    pub fn load(log: &LogHandle) -> Result<Self> {
        let config = ChalkboardConfig::load()?;
        log.apply_level(&config.logging.level);

        let user_id = config.user_id()?.to_string();
        let tz = resolve_time_zone(&config)?;
        tracing::debug!(%user_id, %tz, backend = ?config.store.backend, "Configuration loaded");

        Ok(Context {
            config,
            user_id,
            tz,
        })
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    pub fn max_steps(&self) -> usize {
        self.config.max_steps()
    }

    pub fn rest_store(&self) -> Result<RestStore> {
        let store = &self.config.store;
        let url = store
            .url
            .as_deref()
            .context("store.url must be set for the rest backend")?;
        let api_key = store
            .api_key
            .as_deref()
            .context("store.api_key must be set for the rest backend")?;
        Ok(RestStore::new(url, api_key, store.access_token.as_deref())?)
    }

    /// A gateway in the configured zone, with its notices.
    pub fn gateway<S: EventStore>(
        &self,
        store: Arc<S>,
    ) -> (MutationGateway<S>, UnboundedReceiver<Notice>) {
        let (notifier, notices) = Notifier::channel();
        (MutationGateway::new(store, self.tz).with_notifier(notifier), notices)
    }
}

/// The configured zone, else the system zone, else UTC.
fn resolve_time_zone(config: &ChalkboardConfig) -> Result<Tz> {
    if let Some(tz) = config.time_zone()? {
        return Ok(tz);
    }

    match iana_time_zone::get_timezone() {
        Ok(name) => match name.parse::<Tz>() {
            Ok(tz) => Ok(tz),
            Err(_) => {
                tracing::debug!(%name, "System time zone not recognized, using UTC");
                Ok(Tz::UTC)
            }
        },
        Err(e) => {
            tracing::debug!(error = %e, "Could not detect system time zone, using UTC");
            Ok(Tz::UTC)
        }
    }
}
