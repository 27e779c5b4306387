use async_trait::async_trait;

use crate::{introspection, ExecutionArgs, Executor, Response, ServerError, Upstream};

/// Default execution: introspection is answered from the local schema, everything else is
/// forwarded to the upstream service.
#[derive(Debug, Default, Clone)]
pub struct GatewayExecutor {
    upstream: Option<Upstream>,
}

impl GatewayExecutor {
    pub fn new(upstream: Option<Upstream>) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl Executor for GatewayExecutor {
    async fn execute(&self, args: &ExecutionArgs<'_>) -> Response {
        if args.is_introspection() {
            return introspection::execute(args.schema, args.document, args.request);
        }

        match &self.upstream {
            Some(upstream) => match upstream.query(args.request, args.headers).await {
                Ok(response) => response,
                Err(err) => {
                    tracing::error!(error = %err, "Upstream request failed.");
                    Response::from_errors(vec![ServerError::new(err.to_string())])
                },
            },
            None => Response::from_errors(vec![ServerError::new("No upstream service is configured.")]),
        }
    }
}
