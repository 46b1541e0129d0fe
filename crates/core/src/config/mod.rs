use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{timing::Bucket, Result, VizError};

pub const DEFAULT_MODE: &str = "normal";

/// Top-level configuration structure for a render run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub timing: TimingConfig,
    /// Reject malformed `widget.method` bindings while building the scene
    /// instead of skipping them during dispatch.
    pub strict_bindings: bool,
}

impl AppConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.timing.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Base durations per timing bucket, the mode multiplier table and the
/// active mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub ui: f64,
    pub events: f64,
    pub effects: f64,
    pub waits: f64,
    pub multipliers: BTreeMap<String, f64>,
    pub mode: String,
    /// Per-action bucket overrides consulted before the built-in table.
    pub buckets: BTreeMap<String, Bucket>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            ui: 1.0,
            events: 0.6,
            effects: 0.8,
            waits: 0.5,
            multipliers: default_multipliers(),
            mode: DEFAULT_MODE.to_string(),
            buckets: BTreeMap::new(),
        }
    }
}

impl TimingConfig {
    /// Returns a copy of the configuration running in `mode`.
    pub fn with_mode(mut self, mode: impl Into<String>) -> Result<Self> {
        self.mode = mode.into();
        self.validate()?;
        Ok(self)
    }

    pub fn base_value(&self, bucket: Bucket) -> f64 {
        match bucket {
            Bucket::Ui => self.ui,
            Bucket::Events => self.events,
            Bucket::Effects => self.effects,
        }
    }

    pub fn multiplier(&self, mode: &str) -> Result<f64> {
        self.multipliers.get(mode).copied().ok_or_else(|| {
            let known: Vec<&str> = self.multipliers.keys().map(String::as_str).collect();
            VizError::config(format!(
                "unknown timing mode `{mode}` (known modes: {})",
                known.join(", ")
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("ui", self.ui),
            ("events", self.events),
            ("effects", self.effects),
            ("waits", self.waits),
        ] {
            ensure_positive(name, value)?;
        }
        for (mode, value) in &self.multipliers {
            ensure_positive(&format!("multiplier `{mode}`"), *value)?;
        }
        self.multiplier(&self.mode).map(|_| ())
    }
}

fn default_multipliers() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("draft".to_string(), 0.5),
        ("normal".to_string(), 1.0),
        ("fast".to_string(), 0.25),
    ])
}

fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(VizError::config(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}
