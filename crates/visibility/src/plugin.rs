use std::sync::Arc;

use async_trait::async_trait;
use publicgate_handler::{ExecutionArgs, Executor, Plugin, Response};
use publicgate_schema::ComposedSchema;
use publicgate_validation::RuleFactory;
use value::ConstValue;

use crate::{
    config::PublicSchemaConfig,
    metrics::METRICS,
    redactor::redact,
    registry::SharedRegistry,
    rule::PrivateAccessFactory,
    scanner::scan,
};

/// Hides `@private` declarations from clients.
///
/// Every schema change rebuilds the registry. Operations touching a private member fail
/// validation, and every `__schema` or `__type` selection has private members stripped from its
/// result, whichever executor answered the operation.
#[derive(Debug, Default)]
pub struct PublicSchemaPlugin {
    registry: SharedRegistry,
}

impl PublicSchemaPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` when the configuration does not enable the public schema.
    pub fn from_config(config: &PublicSchemaConfig) -> Option<Self> {
        if config.enabled.resolve() {
            tracing::info!("Public schema is enabled.");
            Some(Self::new())
        } else {
            tracing::info!("Public schema is disabled.");
            None
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }
}

#[async_trait]
impl Plugin for PublicSchemaPlugin {
    fn name(&self) -> &str {
        "public-schema"
    }

    fn on_schema_change(&self, schema: &ComposedSchema) {
        let registry = scan(schema);
        tracing::info!(private = registry.len(), "Visibility registry rebuilt.");
        self.registry.replace(registry);
    }

    async fn on_execute(&self, args: &ExecutionArgs<'_>, executor: &dyn Executor) -> Option<Response> {
        let keys = args.introspection_keys();
        if keys.is_empty() {
            return None;
        }

        let mut response = executor.execute(args).await;
        let ConstValue::Object(data) = &mut response.data else {
            return Some(response);
        };

        // Only the introspection subtrees; data fields selected alongside are left alone.
        let registry = self.registry.snapshot();
        let mut removed = 0;
        for key in keys {
            if let Some(value) = data.get_mut(key) {
                removed += redact(&registry, value);
            }
        }
        if removed > 0 {
            tracing::debug!(removed, "Introspection result redacted.");
            METRICS.redacted_counter.add(removed as u64, &[]);
        }
        Some(response)
    }

    fn validation_rules(&self) -> Vec<Arc<dyn RuleFactory>> {
        vec![Arc::new(PrivateAccessFactory::new(self.registry.clone()))]
    }
}
