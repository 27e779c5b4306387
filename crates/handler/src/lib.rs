#![forbid(unsafe_code)]

mod executor;
mod introspection;
mod metrics;
mod operation;
mod pipeline;
mod plugin;
mod request;
mod response;
mod shared_schema;
mod upstream;

pub mod handler;

pub use executor::GatewayExecutor;
pub use metrics::METRICS;
pub use operation::{introspection_response_keys, is_introspection_operation, select_operation};
pub use pipeline::Pipeline;
pub use plugin::{ExecutionArgs, Executor, Plugin};
pub use request::Request;
pub use response::{Response, ServerError};
pub use shared_schema::SharedSchema;
pub use upstream::Upstream;
