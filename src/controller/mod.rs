//! Component controllers: declarative state, props, helpers, events and
//! lifecycle hooks attached to a template in one call.
//!
//! - [`ControllerConfig`]: what a component declares.
//! - [`define`]: wires a config into a template's lifecycle.
//! - [`PropsSchema`] / [`Validate`]: the validation contract for props.
//! - [`DiagnosticSink`]: where invalid prop values are reported.
//! - [`bind_to_instance`] / [`bind_all_to_instance`]: capture an instance in a
//!   helper or event handler.

pub mod bind;
pub mod binder;
pub mod config;
pub mod diagnostics;
pub mod schema;

pub use bind::{bind_all_to_instance, bind_to_instance, Bound};
pub use binder::{define, Controller};
pub use config::ControllerConfig;
pub use diagnostics::{DiagnosticSink, PropDiagnostic, RecordingSink, TracingSink};
pub use schema::{PropsSchema, Validate, ValidationDetail, ValidationError};
