use std::{convert::Infallible, net::SocketAddr, str::FromStr, sync::Arc, time::Instant};

use async_graphql::http::GraphiQLSource;
use http::{header::HeaderName, HeaderMap};
use tracing::instrument;
use warp::{http::Response as HttpResponse, Filter, Rejection, Reply};

use crate::{metrics::METRICS, Request, SharedSchema};

#[derive(Clone)]
pub struct HandlerConfig {
    pub shared_schema: SharedSchema,
    pub forward_headers: Arc<Vec<String>>,
}

fn do_forward_headers<T: AsRef<str>>(
    forward_headers: &[T],
    header_map: &HeaderMap,
    remote_addr: Option<SocketAddr>,
) -> HeaderMap {
    let mut new_header_map = HeaderMap::new();
    for name in forward_headers {
        if let Ok(header_name) = HeaderName::from_str(name.as_ref()) {
            for value in header_map.get_all(&header_name) {
                new_header_map.append(header_name.clone(), value.clone());
            }
        }
    }
    if let Some(remote_addr) = remote_addr {
        if let Ok(remote_addr) = remote_addr.to_string().try_into() {
            new_header_map.append(http::header::FORWARDED, remote_addr);
        }
    }
    new_header_map
}

pub fn graphql_request(config: HandlerConfig) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::post()
        .and(warp::body::json())
        .and(warp::header::headers_cloned())
        .and(warp::addr::remote())
        .and_then({
            move |request: Request, header_map: HeaderMap, remote_addr: Option<SocketAddr>| {
                let config = config.clone();
                async move {
                    let start_time = Instant::now();
                    let resp = config
                        .shared_schema
                        .query(
                            request,
                            do_forward_headers(&config.forward_headers, &header_map, remote_addr),
                        )
                        .await;

                    METRICS
                        .query_histogram
                        .record((Instant::now() - start_time).as_secs_f64(), &[]);
                    METRICS.query_counter.add(1, &[]);

                    Ok::<_, Infallible>(warp::reply::json(&resp))
                }
            }
        })
}

#[instrument(level = "trace")]
pub fn graphql_playground(path: String) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let endpoint = format!("/{path}");
    warp::get().map(move || {
        HttpResponse::builder()
            .header("content-type", "text/html")
            .body(GraphiQLSource::build().endpoint(endpoint.as_str()).finish())
    })
}
