//! Widget capability, the widget-type factory and a handful of stock widgets.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{
    events::VizEvent,
    render::{Animation, Scene},
    Result, VizError,
};

/// A stateful visual element that reacts to routed events.
pub trait Widget: fmt::Debug {
    fn kind(&self) -> &str;

    /// Handles `method` for `event`. Unknown methods are errors.
    fn update(
        &mut self,
        method: &str,
        scene: &mut dyn Scene,
        event: &VizEvent,
        run_time: f64,
    ) -> Result<()>;

    /// Serialisable snapshot of the widget's internal state.
    fn state(&self) -> Value;
}

pub type WidgetConstructor = Box<dyn Fn(&str, &Map<String, Value>) -> Result<Box<dyn Widget>>>;

/// Registry of widget type identifiers to constructors.
#[derive(Default)]
pub struct WidgetFactory {
    constructors: BTreeMap<String, WidgetConstructor>,
}

impl WidgetFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with the stock `grid`, `queue`, `stack` and `counter` types.
    pub fn with_defaults() -> Self {
        let mut factory = Self::new();
        factory.insert("grid", |name, params| {
            Ok(Box::new(GridWidget::from_params(name, params)?))
        });
        factory.insert("queue", |name, params| {
            Ok(Box::new(QueueWidget::from_params(name, params)?))
        });
        factory.insert("stack", |name, _| Ok(Box::new(StackWidget::new(name))));
        factory.insert("counter", |name, _| Ok(Box::new(CounterWidget::new(name))));
        factory
    }

    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F) -> Result<()>
    where
        F: Fn(&str, &Map<String, Value>) -> Result<Box<dyn Widget>> + 'static,
    {
        let kind = kind.into();
        if self.constructors.contains_key(&kind) {
            return Err(VizError::config(format!(
                "widget type `{kind}` is already registered"
            )));
        }
        self.constructors.insert(kind, Box::new(constructor));
        Ok(())
    }

    fn insert<F>(&mut self, kind: &str, constructor: F)
    where
        F: Fn(&str, &Map<String, Value>) -> Result<Box<dyn Widget>> + 'static,
    {
        self.constructors
            .insert(kind.to_string(), Box::new(constructor));
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Builds widget `name` of type `kind`. Any failure is reported as an
    /// instantiation error naming the widget.
    pub fn build(
        &self,
        name: &str,
        kind: &str,
        params: &Map<String, Value>,
    ) -> Result<Box<dyn Widget>> {
        let constructor = self
            .constructors
            .get(kind)
            .ok_or_else(|| VizError::Instantiation {
                widget: name.to_string(),
                reason: format!("unknown widget type `{kind}`"),
            })?;
        constructor(name, params).map_err(|err| match err {
            err @ VizError::Instantiation { .. } => err,
            other => VizError::Instantiation {
                widget: name.to_string(),
                reason: other.to_string(),
            },
        })
    }
}

impl fmt::Debug for WidgetFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetFactory")
            .field("kinds", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn unsupported(widget: &str, method: &str) -> VizError {
    VizError::widget(format!("`{widget}` has no method `{method}`"))
}

fn usize_param(params: &Map<String, Value>, key: &str, default: usize) -> Result<usize> {
    match params.get(key) {
        None => Ok(default),
        Some(value) => value
            .as_u64()
            .filter(|v| *v > 0)
            .map(|v| v as usize)
            .ok_or_else(|| VizError::config(format!("`{key}` must be a positive integer"))),
    }
}

/// The element an event talks about: `payload.node`, or the whole payload.
fn event_element(event: &VizEvent) -> Value {
    event
        .payload
        .get("node")
        .cloned()
        .unwrap_or_else(|| Value::Object(event.payload.clone()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    Frontier,
    Current,
    Visited,
    Goal,
}

/// Rows x cols board whose cells change state as a search progresses.
#[derive(Debug, Clone)]
pub struct GridWidget {
    name: String,
    rows: usize,
    cols: usize,
    cells: BTreeMap<(usize, usize), CellState>,
}

impl GridWidget {
    pub fn new(name: impl Into<String>, rows: usize, cols: usize) -> Self {
        Self {
            name: name.into(),
            rows,
            cols,
            cells: BTreeMap::new(),
        }
    }

    fn from_params(name: &str, params: &Map<String, Value>) -> Result<Self> {
        let rows = usize_param(params, "rows", 5)?;
        let cols = usize_param(params, "cols", 5)?;
        Ok(Self::new(name, rows, cols))
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<CellState> {
        self.cells.get(&(row, col)).copied()
    }

    fn node(&self, event: &VizEvent) -> Result<(usize, usize)> {
        let coords = event
            .payload
            .get("node")
            .and_then(Value::as_array)
            .and_then(|pair| match pair.as_slice() {
                [row, col] => Some((row.as_u64()? as usize, col.as_u64()? as usize)),
                _ => None,
            })
            .ok_or_else(|| {
                VizError::widget(format!(
                    "`{}` expects payload `node` as [row, col]",
                    self.name
                ))
            })?;
        if coords.0 >= self.rows || coords.1 >= self.cols {
            return Err(VizError::widget(format!(
                "cell {coords:?} is outside the {}x{} grid `{}`",
                self.rows, self.cols, self.name
            )));
        }
        Ok(coords)
    }

    fn mark(
        &mut self,
        scene: &mut dyn Scene,
        event: &VizEvent,
        state: CellState,
        effect: &str,
        run_time: f64,
    ) -> Result<()> {
        let (row, col) = self.node(event)?;
        self.cells.insert((row, col), state);
        scene.play(
            &[Animation::new(format!("{}[{row},{col}]", self.name), effect)],
            run_time,
        );
        Ok(())
    }
}

impl Widget for GridWidget {
    fn kind(&self) -> &str {
        "grid"
    }

    fn update(
        &mut self,
        method: &str,
        scene: &mut dyn Scene,
        event: &VizEvent,
        run_time: f64,
    ) -> Result<()> {
        match method {
            "onEnqueue" => self.mark(scene, event, CellState::Frontier, "fill", run_time),
            "onDequeue" => self.mark(scene, event, CellState::Current, "indicate", run_time),
            "onVisit" => self.mark(scene, event, CellState::Visited, "fill", run_time),
            "onGoal" => self.mark(scene, event, CellState::Goal, "flash", run_time),
            "onReset" => {
                self.cells.clear();
                scene.play(&[Animation::new(self.name.as_str(), "reset")], run_time);
                Ok(())
            }
            other => Err(unsupported(&self.name, other)),
        }
    }

    fn state(&self) -> Value {
        let cells: Map<String, Value> = self
            .cells
            .iter()
            .map(|((row, col), state)| (format!("{row},{col}"), json!(state)))
            .collect();
        json!({ "rows": self.rows, "cols": self.cols, "cells": cells })
    }
}

/// FIFO strip, optionally bounded.
#[derive(Debug, Clone)]
pub struct QueueWidget {
    name: String,
    items: VecDeque<Value>,
    capacity: Option<usize>,
}

impl QueueWidget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: VecDeque::new(),
            capacity: None,
        }
    }

    fn from_params(name: &str, params: &Map<String, Value>) -> Result<Self> {
        let capacity = match params.get("capacity") {
            None | Some(Value::Null) => None,
            Some(_) => Some(usize_param(params, "capacity", 1)?),
        };
        Ok(Self {
            capacity,
            ..Self::new(name)
        })
    }
}

impl Widget for QueueWidget {
    fn kind(&self) -> &str {
        "queue"
    }

    fn update(
        &mut self,
        method: &str,
        scene: &mut dyn Scene,
        event: &VizEvent,
        run_time: f64,
    ) -> Result<()> {
        match method {
            "onEnqueue" => {
                if self.capacity.is_some_and(|cap| self.items.len() >= cap) {
                    return Err(VizError::widget(format!("queue `{}` is full", self.name)));
                }
                self.items.push_back(event_element(event));
                scene.play(&[Animation::new(self.name.as_str(), "append")], run_time);
                Ok(())
            }
            "onDequeue" => {
                self.items
                    .pop_front()
                    .ok_or_else(|| VizError::widget(format!("queue `{}` is empty", self.name)))?;
                scene.play(&[Animation::new(self.name.as_str(), "shift")], run_time);
                Ok(())
            }
            other => Err(unsupported(&self.name, other)),
        }
    }

    fn state(&self) -> Value {
        json!({ "items": self.items })
    }
}

/// LIFO column.
#[derive(Debug, Clone)]
pub struct StackWidget {
    name: String,
    items: Vec<Value>,
}

impl StackWidget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }
}

impl Widget for StackWidget {
    fn kind(&self) -> &str {
        "stack"
    }

    fn update(
        &mut self,
        method: &str,
        scene: &mut dyn Scene,
        event: &VizEvent,
        run_time: f64,
    ) -> Result<()> {
        match method {
            "onPush" => {
                self.items.push(event_element(event));
                scene.play(&[Animation::new(self.name.as_str(), "push")], run_time);
                Ok(())
            }
            "onPop" => {
                self.items
                    .pop()
                    .ok_or_else(|| VizError::widget(format!("stack `{}` is empty", self.name)))?;
                scene.play(&[Animation::new(self.name.as_str(), "pop")], run_time);
                Ok(())
            }
            other => Err(unsupported(&self.name, other)),
        }
    }

    fn state(&self) -> Value {
        json!({ "items": self.items })
    }
}

/// Tally of routed events, e.g. "nodes expanded".
#[derive(Debug, Clone)]
pub struct CounterWidget {
    name: String,
    count: u64,
}

impl CounterWidget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 0,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Widget for CounterWidget {
    fn kind(&self) -> &str {
        "counter"
    }

    fn update(
        &mut self,
        method: &str,
        scene: &mut dyn Scene,
        _event: &VizEvent,
        run_time: f64,
    ) -> Result<()> {
        match method {
            "onEvent" => self.count += 1,
            "onReset" => self.count = 0,
            other => return Err(unsupported(&self.name, other)),
        }
        scene.play(&[Animation::new(self.name.as_str(), "count")], run_time);
        Ok(())
    }

    fn state(&self) -> Value {
        json!({ "count": self.count })
    }
}
