//! Act → Shot → Beat script model.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;

/// String-keyed beat arguments. Values are opaque to the director.
pub type Args = Map<String, Value>;

/// One action invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    pub action: String,
    #[serde(default)]
    pub args: Args,
    /// Explicit run-time that replaces the timing-bucket value.
    #[serde(default, alias = "run_time", skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl Beat {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            args: Args::new(),
            duration: None,
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.args.insert(key.into(), value);
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    #[serde(default)]
    pub beats: Vec<Beat>,
}

impl Shot {
    pub fn new(beats: Vec<Beat>) -> Self {
        Self { beats }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Act {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub shots: Vec<Shot>,
}

impl Act {
    pub fn new(title: impl Into<String>, shots: Vec<Shot>) -> Self {
        Self {
            title: title.into(),
            shots,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Storyboard {
    #[serde(default)]
    pub acts: Vec<Act>,
}

impl Storyboard {
    pub fn new(acts: Vec<Act>) -> Self {
        Self { acts }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Single-shot storyboard used when no script exists for `algorithm`:
    /// title, scene setup, widget setup, event playback, outro.
    pub fn fallback(algorithm: &str) -> Self {
        let title = if algorithm.is_empty() {
            "Algorithm".to_string()
        } else {
            algorithm.to_string()
        };
        let beats = vec![
            Beat::new("show_title").with_arg("text", Value::String(title.clone())),
            Beat::new("setup_scene"),
            Beat::new("setup_widgets"),
            Beat::new("play_events"),
            Beat::new("outro"),
        ];
        Self::new(vec![Act::new(title, vec![Shot::new(beats)])])
    }

    pub fn or_fallback(script: Option<Self>, algorithm: &str) -> Self {
        script.unwrap_or_else(|| Self::fallback(algorithm))
    }

    /// All beats in document order.
    pub fn beats(&self) -> impl Iterator<Item = &Beat> {
        self.acts
            .iter()
            .flat_map(|act| act.shots.iter())
            .flat_map(|shot| shot.beats.iter())
    }

    pub fn beat_count(&self) -> usize {
        self.beats().count()
    }

    pub fn is_empty(&self) -> bool {
        self.beat_count() == 0
    }
}
