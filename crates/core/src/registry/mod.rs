use std::collections::BTreeMap;
use std::fmt;

use crate::{
    actions::{ActionContext, BuiltinAction},
    error::RegistryError,
    render::Scene,
    storyboard::Args,
    Result,
};

/// Capability behind a beat's action name.
pub trait Action {
    fn run(
        &self,
        scene: &mut dyn Scene,
        args: &Args,
        run_time: f64,
        ctx: &mut ActionContext,
    ) -> Result<()>;
}

/// Action name to handler table.
///
/// Registration is append-only; [`ActionRegistry::clear`] resets it between
/// independent runs.
#[derive(Default)]
pub struct ActionRegistry {
    actions: BTreeMap<String, Box<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with every [`BuiltinAction`].
    pub fn with_builtins() -> Self {
        let actions = BuiltinAction::ALL
            .iter()
            .map(|action| {
                (
                    action.name().to_string(),
                    Box::new(*action) as Box<dyn Action>,
                )
            })
            .collect();
        Self { actions }
    }

    pub fn register<A>(
        &mut self,
        name: impl Into<String>,
        action: A,
    ) -> std::result::Result<(), RegistryError>
    where
        A: Action + 'static,
    {
        let name = name.into();
        if self.actions.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        tracing::debug!(action = %name, "registered action");
        self.actions.insert(name, Box::new(action));
        Ok(())
    }

    pub fn get(&self, name: &str) -> std::result::Result<&dyn Action, RegistryError> {
        self.actions
            .get(name)
            .map(|action| action.as_ref())
            .ok_or_else(|| RegistryError::NotRegistered {
                name: name.to_string(),
                available: self.list().into_iter().map(str::to_string).collect(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn list(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.list())
            .finish()
    }
}
