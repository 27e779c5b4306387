use std::sync::Arc;

use async_trait::async_trait;
use http::HeaderMap;
use parser::types::ExecutableDocument;
use publicgate_schema::ComposedSchema;
use publicgate_validation::RuleFactory;

use crate::{
    operation::{introspection_response_keys, is_introspection_operation},
    Request,
    Response,
};

/// Everything needed to execute one validated operation.
pub struct ExecutionArgs<'a> {
    pub schema: &'a ComposedSchema,
    pub document: &'a ExecutableDocument,
    pub request: &'a Request,
    /// Headers forwarded to the upstream service.
    pub headers: &'a HeaderMap,
}

impl<'a> ExecutionArgs<'a> {
    pub fn is_introspection(&self) -> bool {
        is_introspection_operation(self.document, self.request.operation_name.as_deref())
    }

    /// Response keys of the root introspection fields, also when data fields are selected next to them.
    pub fn introspection_keys(&self) -> Vec<&'a str> {
        introspection_response_keys(self.document, self.request.operation_name.as_deref())
    }
}

#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, args: &ExecutionArgs<'_>) -> Response;
}

/// Extension point of the gateway.
///
/// Validation rules are collected once, when the plugin is registered with a
/// [`Pipeline`](crate::Pipeline).
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Called with every new schema before it starts serving requests.
    fn on_schema_change(&self, _schema: &ComposedSchema) {}

    /// Returning `Some` answers the request and skips the remaining plugins and the default execution.
    async fn on_execute(&self, _args: &ExecutionArgs<'_>, _executor: &dyn Executor) -> Option<Response> {
        None
    }

    fn validation_rules(&self) -> Vec<Arc<dyn RuleFactory>> {
        Vec::new()
    }
}
