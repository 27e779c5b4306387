use std::sync::Arc;

use http::HeaderMap;
use publicgate_schema::ComposedSchema;
use tokio::sync::RwLock;

use crate::{Pipeline, Request, Response, ServerError};

/// The schema currently served, and the pipeline that serves it.
#[derive(Clone)]
pub struct SharedSchema {
    schema: Arc<RwLock<Option<Arc<ComposedSchema>>>>,
    pipeline: Arc<Pipeline>,
}

impl SharedSchema {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            schema: Default::default(),
            pipeline: Arc::new(pipeline),
        }
    }

    /// Plugins see the new schema before any request does.
    pub async fn set_schema(&self, schema: ComposedSchema) {
        let mut current = self.schema.write().await;
        self.pipeline.notify_schema_change(&schema);
        *current = Some(Arc::new(schema));
        tracing::info!("Schema updated.");
    }

    pub async fn get(&self) -> Option<Arc<ComposedSchema>> {
        self.schema.read().await.clone()
    }

    pub async fn query(&self, request: Request, header_map: HeaderMap) -> Response {
        match self.get().await {
            Some(schema) => self.pipeline.execute(&schema, request, &header_map).await,
            None => Response::from_errors(vec![ServerError::new("Not ready.")]),
        }
    }
}
