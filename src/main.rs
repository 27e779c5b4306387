#![forbid(unsafe_code)]

mod config;

use std::{
    convert::Infallible,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use config::Config;
use futures_util::FutureExt;
use opentelemetry::{global, sdk::metrics::MeterProvider};
use prometheus::{Encoder, Registry, TextEncoder};
use publicgate_handler::{
    handler,
    handler::HandlerConfig,
    GatewayExecutor,
    Pipeline,
    Response,
    ServerError,
    SharedSchema,
};
use publicgate_schema::ComposedSchema;
use publicgate_visibility::PublicSchemaPlugin;
use tokio::{signal, time::Duration};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use warp::{hyper::StatusCode, Filter, Rejection, Reply};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn load_schema(path: &Path) -> Result<(String, ComposedSchema)> {
    let sdl = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file '{}'.", path.display()))?;
    let schema =
        ComposedSchema::parse(&sdl).with_context(|| format!("Failed to parse schema file '{}'.", path.display()))?;
    Ok((sdl, schema))
}

async fn update_schema_from_file(shared_schema: SharedSchema, path: PathBuf, interval: Duration, mut prev_sdl: String) {
    loop {
        tokio::time::sleep(interval).await;

        match std::fs::read_to_string(&path) {
            Ok(sdl) if sdl == prev_sdl => {},
            Ok(sdl) => {
                match ComposedSchema::parse(&sdl) {
                    Ok(schema) => {
                        shared_schema.set_schema(schema).await;
                        tracing::info!(path = %path.display(), "Schema reloaded.");
                    },
                    Err(err) => {
                        tracing::error!(error = %err, "Failed to parse schema file, keeping the previous schema.");
                    },
                }
                prev_sdl = sdl;
            },
            Err(err) => {
                tracing::error!(error = %err, path = %path.display(), "Failed to read schema file.");
            },
        }
    }
}

pub fn metrics(registry: Registry) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("metrics").and(warp::get()).map({
        move || {
            let mut buffer = Vec::new();
            let encoder = TextEncoder::new();
            let metric_families = registry.gather();
            match encoder.encode(&metric_families, &mut buffer) {
                Ok(()) => warp::reply::with_status(buffer, StatusCode::OK),
                Err(err) => warp::reply::with_status(err.to_string().into_bytes(), StatusCode::INTERNAL_SERVER_ERROR),
            }
        }
    })
}

async fn handle_rejection(err: Rejection) -> std::result::Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::OK, "Not Found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else {
        tracing::error!("unhandled error: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
    };

    let res = warp::reply::json(&Response::from_errors(vec![ServerError::new(message)]));

    Ok(warp::reply::with_status(res, code))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::try_parse()?;
    let registry = Registry::new();
    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()?;
    let meter_provider = MeterProvider::builder().with_reader(exporter).build();
    global::set_meter_provider(meter_provider);

    let upstream = config.create_upstream();
    if upstream.is_none() {
        tracing::warn!("No upstream configured, only introspection can be answered.");
    }
    let mut pipeline = Pipeline::new(GatewayExecutor::new(upstream));
    if let Some(plugin) = PublicSchemaPlugin::from_config(&config.public_schema) {
        pipeline = pipeline.with_plugin(plugin);
    }
    let shared_schema = SharedSchema::new(pipeline);

    let (sdl, schema) = load_schema(&config.schema)?;
    shared_schema.set_schema(schema).await;
    if config.schema_poll_interval > 0 {
        tokio::spawn(update_schema_from_file(
            shared_schema.clone(),
            config.schema.clone(),
            Duration::from_secs(config.schema_poll_interval),
            sdl,
        ));
    }

    let handler_config = HandlerConfig {
        shared_schema,
        forward_headers: Arc::new(config.forward_headers),
    };

    let graphql = warp::path::end().and(
        handler::graphql_request(handler_config).or(handler::graphql_playground(config.path.clone())),
    );
    let health = warp::path!("health").map(|| warp::reply::json(&"healthy"));

    let bind_addr: SocketAddr = config
        .bind
        .parse()
        .context(format!("Failed to parse bind addr '{}'", config.bind))?;
    let routes = graphql.or(health).or(metrics(registry));
    let (addr, server) = warp::serve(routes.recover(handle_rejection))
        .bind_with_graceful_shutdown(bind_addr, signal::ctrl_c().map(|_| ()));
    tracing::info!(addr = %addr, "Listening");
    server.await;
    tracing::info!("Server shutdown");

    Ok(())
}
