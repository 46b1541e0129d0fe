use serde::{Deserialize, Serialize};

use crate::timeline::PlaybackClock;

/// A single animation request handed to the rendering backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub target: String,
    pub effect: String,
}

impl Animation {
    pub fn new(target: impl Into<String>, effect: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            effect: effect.into(),
        }
    }
}

/// Rendering backend abstraction. Objects are referred to by name; what a
/// backend draws for them is its own business.
pub trait Scene {
    fn add(&mut self, object: &str);
    fn remove(&mut self, object: &str);
    fn play(&mut self, animations: &[Animation], run_time: f64);
    fn wait(&mut self, duration: f64);
    /// Scene time consumed so far, in seconds.
    fn elapsed(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SceneOp {
    Add { object: String },
    Remove { object: String },
    Play { animations: Vec<Animation>, run_time: f64 },
    Wait { duration: f64 },
}

/// In-memory backend that records every call and advances a clock by the
/// requested run-times. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct RecordingScene {
    ops: Vec<SceneOp>,
    objects: Vec<String>,
    clock: PlaybackClock,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[SceneOp] {
        &self.ops
    }

    /// Objects currently on stage, in insertion order.
    pub fn objects(&self) -> &[String] {
        &self.objects
    }

    pub fn contains(&self, object: &str) -> bool {
        self.objects.iter().any(|o| o == object)
    }

    pub fn play_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SceneOp::Play { .. }))
            .count()
    }
}

impl Scene for RecordingScene {
    fn add(&mut self, object: &str) {
        if !self.contains(object) {
            self.objects.push(object.to_string());
        }
        self.ops.push(SceneOp::Add {
            object: object.to_string(),
        });
    }

    fn remove(&mut self, object: &str) {
        self.objects.retain(|o| o != object);
        self.ops.push(SceneOp::Remove {
            object: object.to_string(),
        });
    }

    fn play(&mut self, animations: &[Animation], run_time: f64) {
        self.clock.advance(run_time);
        self.ops.push(SceneOp::Play {
            animations: animations.to_vec(),
            run_time,
        });
    }

    fn wait(&mut self, duration: f64) {
        self.clock.advance(duration);
        self.ops.push(SceneOp::Wait { duration });
    }

    fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }
}
