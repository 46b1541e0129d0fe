use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Binding as written in a scene document: either `"widget.method"` or an
/// object carrying a parameter template next to the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BindingSpec {
    Target(String),
    Detailed {
        target: String,
        #[serde(default)]
        params: Map<String, Value>,
    },
}

impl BindingSpec {
    pub fn target(&self) -> &str {
        match self {
            Self::Target(target) | Self::Detailed { target, .. } => target,
        }
    }
}

impl From<&str> for BindingSpec {
    fn from(value: &str) -> Self {
        Self::Target(value.to_string())
    }
}

impl From<String> for BindingSpec {
    fn from(value: String) -> Self {
        Self::Target(value)
    }
}

/// Parsed form of a [`BindingSpec`].
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Method {
        widget: String,
        method: String,
        params: Map<String, Value>,
    },
    /// Kept so dispatch can report it; never invoked.
    Malformed { raw: String },
}

impl Binding {
    pub fn parse(spec: &BindingSpec) -> Self {
        let raw = spec.target();
        let params = match spec {
            BindingSpec::Target(_) => Map::new(),
            BindingSpec::Detailed { params, .. } => params.clone(),
        };

        let parts: Vec<&str> = raw.split('.').collect();
        match parts.as_slice() {
            [widget, method] if !widget.is_empty() && !method.is_empty() => Self::Method {
                widget: (*widget).to_string(),
                method: (*method).to_string(),
                params,
            },
            _ => Self::Malformed {
                raw: raw.to_string(),
            },
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }

    /// Run-time pinned by the binding's `duration` parameter, if any.
    pub fn duration_override(&self) -> Option<f64> {
        match self {
            Self::Method { params, .. } => params
                .get("duration")
                .and_then(Value::as_f64)
                .filter(|d| d.is_finite() && *d >= 0.0),
            Self::Malformed { .. } => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Method { widget, method, .. } => format!("{widget}.{method}"),
            Self::Malformed { raw } => raw.clone(),
        }
    }
}

/// Event type to ordered widget bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingMap {
    routes: BTreeMap<String, Vec<Binding>>,
}

impl RoutingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_specs(specs: &BTreeMap<String, Vec<BindingSpec>>) -> Self {
        let routes = specs
            .iter()
            .map(|(kind, bindings)| (kind.clone(), bindings.iter().map(Binding::parse).collect()))
            .collect();
        Self { routes }
    }

    pub fn bind(&mut self, event_kind: impl Into<String>, spec: &BindingSpec) {
        self.routes
            .entry(event_kind.into())
            .or_default()
            .push(Binding::parse(spec));
    }

    pub fn bindings_for(&self, event_kind: &str) -> Option<&[Binding]> {
        self.routes.get(event_kind).map(Vec::as_slice)
    }

    pub fn malformed(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.routes.iter().flat_map(|(kind, bindings)| {
            bindings
                .iter()
                .filter(|b| b.is_malformed())
                .map(move |b| (kind.as_str(), b))
        })
    }

    /// Widget names referenced by well-formed bindings.
    pub fn referenced_widgets(&self) -> impl Iterator<Item = &str> {
        self.routes.values().flatten().filter_map(|b| match b {
            Binding::Method { widget, .. } => Some(widget.as_str()),
            Binding::Malformed { .. } => None,
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
