#![forbid(unsafe_code)]

mod config;
mod marker;
mod metrics;
mod plugin;
mod redactor;
mod registry;
mod rule;
mod scanner;

pub use config::{interpolate, ConfigError, EnabledFlag, PublicSchemaConfig};
pub use marker::{is_marked_private, Declaration, PRIVATE_DIRECTIVE};
pub use plugin::PublicSchemaPlugin;
pub use redactor::redact;
pub use registry::{PrivateFieldRecord, SharedRegistry, VisibilityRegistry, UNOWNED};
pub use rule::{PrivateAccess, PrivateAccessFactory};
pub use scanner::scan;
