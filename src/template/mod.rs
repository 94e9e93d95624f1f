//! Templating host: template definitions, instances and the view that runs
//! them.

pub mod body;
pub mod instance;
pub mod lifecycle;
pub mod registry;
pub mod view;

pub use body::{Element, Expr, Node, Rendered, Scope, Text};
pub use instance::{InstanceId, TemplateInstance};
pub use lifecycle::{LifecycleEvent, LifecycleTracker};
pub use registry::{EventHandler, Helper, LifecycleHook, Template, TemplateRegistry};
pub use view::{View, ViewConfig};
