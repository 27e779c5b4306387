use std::sync::Arc;

use http::HeaderMap;
use publicgate_schema::ComposedSchema;
use publicgate_validation::{check_operation_rules, RuleFactory};
use tracing::instrument;

use crate::{metrics::METRICS, ExecutionArgs, Executor, Plugin, Request, Response, ServerError};

/// Parse, validate, let plugins intercept, then execute.
pub struct Pipeline {
    plugins: Vec<Arc<dyn Plugin>>,
    rules: Vec<Arc<dyn RuleFactory>>,
    executor: Arc<dyn Executor>,
}

impl Pipeline {
    pub fn new(executor: impl Executor + 'static) -> Self {
        Self {
            plugins: Vec::new(),
            rules: Vec::new(),
            executor: Arc::new(executor),
        }
    }

    #[must_use]
    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        let rules = plugin.validation_rules();
        tracing::info!(plugin = plugin.name(), rules = rules.len(), "Plugin registered.");
        self.rules.extend(rules);
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn notify_schema_change(&self, schema: &ComposedSchema) {
        for plugin in &self.plugins {
            plugin.on_schema_change(schema);
        }
    }

    #[instrument(skip_all, fields(operation = ?request.operation_name), level = "debug")]
    pub async fn execute(&self, schema: &ComposedSchema, request: Request, headers: &HeaderMap) -> Response {
        let document = match parser::parse_query(&request.query) {
            Ok(document) => document,
            Err(err) => return Response::from_errors(vec![err.into()]),
        };

        let errors = {
            let factories = self.rules.iter().map(|rule| rule.as_ref()).collect::<Vec<_>>();
            check_operation_rules(
                schema,
                &document,
                request.operation_name.as_deref(),
                &request.variables,
                &factories,
            )
        };
        if !errors.is_empty() {
            METRICS.rejected_counter.add(1, &[]);
            return Response::from_errors(errors.into_iter().map(ServerError::from).collect());
        }

        let args = ExecutionArgs {
            schema,
            document: &document,
            request: &request,
            headers,
        };
        for plugin in &self.plugins {
            if let Some(response) = plugin.on_execute(&args, self.executor.as_ref()).await {
                return response;
            }
        }
        self.executor.execute(&args).await
    }
}
