//! Crate-level error type.

use crate::dom::query::SelectorError;
use crate::event::handler::EventKeyError;
use crate::reactive::object::ObjectError;

/// Errors from defining controllers and driving template instances.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No template of this name is registered.
    #[error("template {0:?} not found")]
    TemplateNotFound(String),

    /// A props schema was declared without a validator.
    #[error("props schema for template {template:?} has no validator")]
    PropsValidateRequired { template: String },

    /// `trigger_event` needs exactly one top-level node to fire on.
    #[error("template {template:?} must render exactly one root element to trigger events")]
    RootElementRequired { template: String },

    /// The instance id is stale or was never issued by this view.
    #[error("template instance not found")]
    InstanceNotFound,

    /// No helper of this name is bound on the instance.
    #[error("helper {0:?} not found")]
    HelperNotFound(String),

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error(transparent)]
    EventKey(#[from] EventKeyError),

    #[error(transparent)]
    Object(#[from] ObjectError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
