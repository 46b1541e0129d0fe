//! Action duration resolution.
//!
//! Every action name falls into one of three timing buckets. A bucket's base
//! value is scaled by the multiplier of the requested mode.

use serde::{Deserialize, Serialize};

use crate::{config::TimingConfig, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Ui,
    Events,
    Effects,
}

/// Built-in classification. Anything not listed here is a `Ui` action.
const CLASSIFICATION: &[(&str, Bucket)] = &[
    ("show_title", Bucket::Ui),
    ("show_text", Bucket::Ui),
    ("setup_scene", Bucket::Ui),
    ("setup_widgets", Bucket::Ui),
    ("outro", Bucket::Ui),
    ("play_events", Bucket::Events),
    ("enqueue", Bucket::Events),
    ("dequeue", Bucket::Events),
    ("push", Bucket::Events),
    ("pop", Bucket::Events),
    ("visit", Bucket::Events),
    ("relax", Bucket::Events),
    ("goal_found", Bucket::Events),
    ("highlight", Bucket::Effects),
    ("pulse", Bucket::Effects),
    ("trace_path", Bucket::Effects),
    ("celebrate", Bucket::Effects),
];

#[derive(Debug, Clone)]
pub struct TimingResolver {
    config: TimingConfig,
    /// Multiplier of the current mode, resolved once at construction.
    multiplier: f64,
}

impl Default for TimingResolver {
    fn default() -> Self {
        let config = TimingConfig::default();
        let multiplier = config.multiplier(&config.mode).unwrap_or(1.0);
        Self { config, multiplier }
    }
}

impl TimingResolver {
    pub fn new(config: TimingConfig) -> Result<Self> {
        config.validate()?;
        let multiplier = config.multiplier(&config.mode)?;
        Ok(Self { config, multiplier })
    }

    pub fn config(&self) -> &TimingConfig {
        &self.config
    }

    pub fn current_mode(&self) -> &str {
        &self.config.mode
    }

    pub fn bucket_for(&self, action: &str) -> Bucket {
        if let Some(bucket) = self.config.buckets.get(action) {
            return *bucket;
        }
        CLASSIFICATION
            .iter()
            .find(|(name, _)| *name == action)
            .map(|(_, bucket)| *bucket)
            .unwrap_or(Bucket::Ui)
    }

    /// Duration of `action` in seconds under `mode`, or the current mode when
    /// `mode` is `None`.
    pub fn base_for(&self, action: &str, mode: Option<&str>) -> Result<f64> {
        let multiplier = match mode {
            Some(mode) => self.config.multiplier(mode)?,
            None => self.multiplier,
        };
        Ok(self.config.base_value(self.bucket_for(action)) * multiplier)
    }

    /// [`Self::base_for`] in the current mode, which is known to exist.
    pub fn run_time_for(&self, action: &str) -> f64 {
        self.config.base_value(self.bucket_for(action)) * self.multiplier
    }

    /// Default pause length under `mode` (or the current mode).
    pub fn wait_for(&self, mode: Option<&str>) -> Result<f64> {
        let multiplier = match mode {
            Some(mode) => self.config.multiplier(mode)?,
            None => self.multiplier,
        };
        Ok(self.config.waits * multiplier)
    }
}
