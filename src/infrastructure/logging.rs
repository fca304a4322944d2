//! Tracing setup.
//!
//! `HURLSH_LOG` (or `RUST_LOG`) pins the filter. Otherwise the level follows the
//! `debug` and `verbose` settings and is re-applied whenever they change.

use tracing_subscriber::{
    EnvFilter, Registry,
    layer::SubscriberExt,
    reload,
    util::{SubscriberInitExt, TryInitError},
};

pub const LOG_ENV_VAR: &str = "HURLSH_LOG";

pub struct Logging {
    handle: Option<reload::Handle<EnvFilter, Registry>>,
}

impl Logging {
    /// Installs the global subscriber, writing to stderr.
    pub fn init(debug: bool, verbose: bool) -> Result<Self, TryInitError> {
        let pinned = EnvFilter::try_from_env(LOG_ENV_VAR)
            .or_else(|_| EnvFilter::try_from_default_env())
            .ok();
        let reloadable = pinned.is_none();
        let filter = pinned.unwrap_or_else(|| EnvFilter::new(level_for(debug, verbose)));
        let (filter, handle) = reload::Layer::new(filter);

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init()?;

        Ok(Self {
            handle: reloadable.then_some(handle),
        })
    }

    /// Re-applies the level after a `debug`/`verbose` change. No-op when the
    /// filter was pinned by the environment.
    pub fn apply(&self, debug: bool, verbose: bool) {
        if let Some(handle) = &self.handle {
            if let Err(err) = handle.reload(EnvFilter::new(level_for(debug, verbose))) {
                tracing::warn!("Failed to update log level: {}", err);
            }
        }
    }
}

fn level_for(debug: bool, verbose: bool) -> &'static str {
    if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_outranks_verbose() {
        assert_eq!(level_for(true, true), "debug");
        assert_eq!(level_for(false, true), "info");
        assert_eq!(level_for(false, false), "warn");
    }
}
