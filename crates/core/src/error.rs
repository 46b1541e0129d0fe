/// Result alias that carries the custom [`VizError`] type.
pub type Result<T> = std::result::Result<T, VizError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum VizError {
    /// Duplicate or missing action registration.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Unknown timing mode or an otherwise malformed configuration.
    #[error("config error: {0}")]
    Config(String),
    /// A widget declared by the scene could not be built.
    #[error("failed to instantiate widget `{widget}`: {reason}")]
    Instantiation { widget: String, reason: String },
    /// The storyboard could not be driven to completion.
    #[error("orchestration error: {0}")]
    Orchestration(String),
    /// A widget rejected an update call.
    #[error("widget error: {0}")]
    Widget(String),
    /// Free-form message for failures raised by custom actions.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON (de)serialisation errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl VizError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    pub fn widget<T: Into<String>>(msg: T) -> Self {
        Self::Widget(msg.into())
    }
}

/// Failures raised by the action registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("action `{0}` is already registered")]
    AlreadyRegistered(String),
    #[error("action `{name}` is not registered (available: {})", list_or_none(.available))]
    NotRegistered {
        name: String,
        available: Vec<String>,
    },
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "<none>".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_action_lists_alternatives() {
        let err = RegistryError::NotRegistered {
            name: "sparkle".to_string(),
            available: vec!["outro".to_string(), "wait".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("sparkle"));
        assert!(text.contains("outro, wait"));
    }

    #[test]
    fn missing_action_on_empty_registry() {
        let err = RegistryError::NotRegistered {
            name: "wait".to_string(),
            available: Vec::new(),
        };
        assert!(err.to_string().contains("<none>"));
    }

    #[test]
    fn registry_errors_convert_transparently() {
        let err: VizError = RegistryError::AlreadyRegistered("wait".to_string()).into();
        assert_eq!(err.to_string(), "action `wait` is already registered");
    }
}
