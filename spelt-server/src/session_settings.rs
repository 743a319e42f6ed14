use std::time::Duration;

use anyhow::{Context, Result};
use spelt_core::{AudioOutput, ScoringPolicy, SessionController, SessionTimings, WordCatalog};

use crate::config::Config;

/// Everything a connection needs to run its own sessions
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub catalog: WordCatalog,
    pub scoring: ScoringPolicy,
    pub timings: SessionTimings,
    pub connection_timeout: Duration,
    pub rate_limit_burst: u32,
    pub rate_limit_refill: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog = match &config.word_catalog_path {
            Some(path) => load_catalog(path)?,
            None => WordCatalog::standard(),
        };

        Ok(Self {
            catalog,
            scoring: ScoringPolicy::default(),
            timings: config.session_timings(),
            connection_timeout: config.connection_timeout(),
            rate_limit_burst: config.rate_limit_burst,
            rate_limit_refill: Duration::from_millis(config.rate_limit_refill_ms),
        })
    }

    pub fn new_session(&self, audio: Box<dyn AudioOutput + Send + Sync>) -> SessionController {
        SessionController::new(self.catalog.clone(), self.scoring, self.timings, audio)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            catalog: WordCatalog::standard(),
            scoring: ScoringPolicy::default(),
            timings: SessionTimings::default(),
            connection_timeout: Duration::from_secs(300),
            rate_limit_burst: 30,
            rate_limit_refill: Duration::from_secs(2),
        }
    }
}

fn load_catalog(path: &str) -> Result<WordCatalog> {
    let manifest = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read word catalog {}", path))?;
    WordCatalog::from_manifest(&manifest)
        .with_context(|| format!("Invalid word catalog {}", path))
}
