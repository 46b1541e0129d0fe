//! Algorithm events and the adapters that produce them.
//!
//! Adapters hand out lazy, finite streams. Step indices are assigned by
//! [`index_steps`] as events are pulled, whatever the adapter put there.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Result, VizError};

/// One unit of algorithm progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VizEvent {
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
    #[serde(default)]
    pub step: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl VizEvent {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Map::new(),
            step: 0,
            metadata: None,
        }
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }
}

pub type EventStream<'a> = Box<dyn Iterator<Item = VizEvent> + 'a>;

/// Bridge to an algorithm implementation.
pub trait AlgorithmAdapter {
    fn name(&self) -> &str;

    /// Starts the algorithm on `scenario` and returns its event stream.
    fn run(&self, scenario: &Value) -> Result<EventStream<'_>>;
}

/// Wraps a raw stream so every event carries its zero-based emission index.
pub fn index_steps<I>(events: I) -> StepIndexed<I::IntoIter>
where
    I: IntoIterator<Item = VizEvent>,
{
    StepIndexed {
        inner: events.into_iter(),
        next: 0,
    }
}

#[derive(Debug)]
pub struct StepIndexed<I> {
    inner: I,
    next: usize,
}

impl<I> Iterator for StepIndexed<I>
where
    I: Iterator<Item = VizEvent>,
{
    type Item = VizEvent;

    fn next(&mut self) -> Option<VizEvent> {
        let mut event = self.inner.next()?;
        event.step = self.next;
        self.next += 1;
        Some(event)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Adapter that replays a prepared event list instead of running a real
/// algorithm. Without a fixed list it reads `scenario["events"]`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAdapter {
    events: Option<Vec<VizEvent>>,
}

impl ScriptedAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<VizEvent>) -> Self {
        Self {
            events: Some(events),
        }
    }
}

impl AlgorithmAdapter for ScriptedAdapter {
    fn name(&self) -> &str {
        "scripted"
    }

    fn run(&self, scenario: &Value) -> Result<EventStream<'_>> {
        if let Some(events) = &self.events {
            return Ok(Box::new(events.iter().cloned()));
        }

        let events = match scenario.get("events") {
            None | Some(Value::Null) => Vec::new(),
            Some(value @ Value::Array(_)) => Vec::<VizEvent>::deserialize(value)?,
            Some(_) => {
                return Err(VizError::msg(
                    "scenario `events` must be an array of event objects",
                ))
            }
        };
        Ok(Box::new(events.into_iter()))
    }
}
