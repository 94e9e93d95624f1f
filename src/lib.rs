//! # template-controller
//!
//! Declarative component configuration over a reactive templating layer.
//!
//! A component declares its reactive state, validated input properties,
//! helpers, event handlers, lifecycle hooks and private instance fields as one
//! [`ControllerConfig`](controller::ControllerConfig). [`define`](controller::define)
//! wires that configuration into a named template, and a
//! [`View`](template::View) runs instances of it: created hooks, reactive
//! re-rendering into a slotmap DOM, event routing and teardown.
//!
//! ## Core Systems
//!
//! - **[`reactive`]**: signals, autorun computations, [`ReactiveObject`](reactive::ReactiveObject)
//! - **[`dom`]**: slotmap-backed DOM forest with selector matching
//! - **[`event`]**: event-map keys, queued events, bubbling path
//! - **[`template`]**: template bodies, registry, instances, the view
//! - **[`controller`]**: config, binder, props schema, diagnostics
//! - **[`testing`]**: headless [`Pilot`](testing::Pilot) for driving a view

// Foundation
pub mod error;
pub mod reactive;

// Host
pub mod dom;
pub mod event;
pub mod template;

// Components
pub mod controller;

// Test support
pub mod testing;

pub use controller::{define, Controller, ControllerConfig};
pub use error::{Error, Result};
pub use reactive::ReactiveObject;
pub use template::{Template, TemplateInstance, TemplateRegistry, View};
