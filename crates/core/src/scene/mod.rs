use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    config::TimingConfig,
    mapping::{Binding, BindingSpec, RoutingMap},
    timing::TimingResolver,
    widgets::{Widget, WidgetFactory},
    Result, VizError,
};

/// Constructor request for one widget: a type identifier plus parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl WidgetSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// Declarative scene description: which widgets exist and which widget
/// methods each event type is routed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    pub name: String,
    pub algorithm: String,
    #[serde(default)]
    pub widgets: BTreeMap<String, WidgetSpec>,
    #[serde(default)]
    pub event_bindings: BTreeMap<String, Vec<BindingSpec>>,
}

impl SceneConfig {
    pub fn new(name: impl Into<String>, algorithm: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            algorithm: algorithm.into(),
            widgets: BTreeMap::new(),
            event_bindings: BTreeMap::new(),
        }
    }

    pub fn with_widget(mut self, name: impl Into<String>, spec: WidgetSpec) -> Self {
        self.widgets.insert(name.into(), spec);
        self
    }

    pub fn with_binding(
        mut self,
        event_kind: impl Into<String>,
        binding: impl Into<BindingSpec>,
    ) -> Self {
        self.event_bindings
            .entry(event_kind.into())
            .or_default()
            .push(binding.into());
        self
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

pub(crate) type WidgetPool = BTreeMap<String, Box<dyn Widget>>;

/// Live widgets plus the compiled routing table for one render run.
///
/// The set of widgets is fixed at construction; widgets only change through
/// their own update methods.
#[derive(Debug)]
pub struct SceneEngine {
    name: String,
    algorithm: String,
    widgets: WidgetPool,
    routing: RoutingMap,
    timing: TimingResolver,
}

impl SceneEngine {
    /// Builds the scene with the stock widget types.
    pub fn new(config: &SceneConfig, timing: TimingConfig) -> Result<Self> {
        Self::with_factory(config, timing, &WidgetFactory::with_defaults())
    }

    pub fn with_factory(
        config: &SceneConfig,
        timing: TimingConfig,
        factory: &WidgetFactory,
    ) -> Result<Self> {
        let timing = TimingResolver::new(timing)?;

        let mut widgets = WidgetPool::new();
        for (name, spec) in &config.widgets {
            let widget = factory.build(name, &spec.kind, &spec.params)?;
            tracing::debug!(widget = %name, kind = %spec.kind, "instantiated widget");
            widgets.insert(name.clone(), widget);
        }

        let routing = RoutingMap::from_specs(&config.event_bindings);
        for (kind, binding) in routing.malformed() {
            tracing::warn!(
                event = kind,
                binding = %binding.label(),
                "binding is not `widget.method`; it will be skipped"
            );
        }
        for widget in routing.referenced_widgets() {
            if !widgets.contains_key(widget) {
                tracing::warn!(
                    widget,
                    "binding references an unknown widget; it will be skipped"
                );
            }
        }

        tracing::info!(
            scene = %config.name,
            algorithm = %config.algorithm,
            widgets = widgets.len(),
            routes = routing.len(),
            "scene engine ready"
        );

        Ok(Self {
            name: config.name.clone(),
            algorithm: config.algorithm.clone(),
            widgets,
            routing,
            timing,
        })
    }

    /// Fails on bindings that do not parse as `widget.method`.
    pub fn validate_bindings(&self) -> Result<()> {
        let malformed: Vec<String> = self
            .routing
            .malformed()
            .map(|(kind, binding)| format!("{kind}: `{}`", binding.label()))
            .collect();
        if malformed.is_empty() {
            Ok(())
        } else {
            Err(VizError::config(format!(
                "malformed event bindings: {}",
                malformed.join(", ")
            )))
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    /// Widget names in sorted order.
    pub fn widget_names(&self) -> Vec<&str> {
        self.widgets.keys().map(String::as_str).collect()
    }

    pub fn widget(&self, name: &str) -> Option<&dyn Widget> {
        self.widgets.get(name).map(|widget| widget.as_ref())
    }

    pub fn routing(&self) -> &RoutingMap {
        &self.routing
    }

    pub fn timing(&self) -> &TimingResolver {
        &self.timing
    }

    /// Bindings for `event_kind`, if the routing map has an entry.
    pub fn bindings_for(&self, event_kind: &str) -> Option<&[Binding]> {
        self.routing.bindings_for(event_kind)
    }

    pub(crate) fn dispatch_parts(&mut self) -> (&RoutingMap, &TimingResolver, &mut WidgetPool) {
        (&self.routing, &self.timing, &mut self.widgets)
    }
}
