use std::sync::Arc;

use publicgate_handler::{
    handler::{graphql_playground, graphql_request, HandlerConfig},
    GatewayExecutor,
    Pipeline,
    SharedSchema,
};
use publicgate_schema::ComposedSchema;
use serde_json::{json, Value};
use warp::{http::StatusCode, test::request};

async fn config() -> HandlerConfig {
    let shared_schema = SharedSchema::new(Pipeline::new(GatewayExecutor::default()));
    shared_schema
        .set_schema(ComposedSchema::parse("type Query { dog: Dog } type Dog { name: String }").unwrap())
        .await;
    HandlerConfig {
        shared_schema,
        forward_headers: Arc::new(vec![]),
    }
}

#[tokio::test]
async fn post_introspection_query() {
    let api = graphql_request(config().await);

    let resp = request()
        .method("POST")
        .path("/")
        .header("content-type", "application/json")
        .body(r#"{ "query": "query Q { __typename }", "operationName": "Q" }"#)
        .reply(&api)
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body, json!({ "data": { "__typename": "Query" } }));
}

#[tokio::test]
async fn invalid_operations_are_answered_with_errors() {
    let api = graphql_request(config().await);

    let resp = request()
        .method("POST")
        .path("/")
        .header("content-type", "application/json")
        .body(r#"{ "query": "{ cat { name } }" }"#)
        .reply(&api)
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body["data"], Value::Null);
    assert_eq!(body["errors"][0]["message"], "Unknown field \"cat\" on type \"Query\".");
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let api = graphql_request(config().await);

    let resp = request()
        .method("POST")
        .path("/")
        .header("content-type", "application/json")
        .body(r#"[{ "query": "{ dog { name } }" }]"#)
        .reply(&api)
        .await;

    assert_ne!(resp.status(), StatusCode::OK);
    assert_ne!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn playground_is_served() {
    let api = graphql_playground("graphql".to_string());

    let resp = request().method("GET").path("/").reply(&api).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "text/html");
    assert!(String::from_utf8_lossy(resp.body()).contains("/graphql"));
}
