//! Provides helper functions for initializing log collection.
use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter, Registry};

static INIT: OnceCell<()> = OnceCell::new();

/// Initialize tracing.
///
/// Only the first call installs the global subscriber, later calls are no-ops so every test may
/// call it.
pub fn init() -> Result<()> {
    INIT.get_or_try_init(|| -> Result<()> {
        // Default to INFO if no env is specified
        let log_filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env()?;

        let logger = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .compact()
            .with_filter(log_filter);

        let collector = Registry::default().with(logger);

        tracing::subscriber::set_global_default(collector)?;
        Ok(())
    })?;
    Ok(())
}
