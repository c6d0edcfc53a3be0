//! End-to-end operation naming over real connections.

use std::collections::HashMap;

use route_tracer::config::{SamplingStrategy, TracerConfig};

mod common;

#[tokio::test]
async fn test_name_from_matched_route() {
    let server = common::start_server(TracerConfig::default(), common::test_routes).await;
    let client = common::http1_client();

    let res = client.get(server.url("/api/v1/users/42/orders")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let span = server.only_span();
    assert_eq!(span.operation_name, "/api/v1/users/{}/orders");
    assert_eq!(span.tag("http.method"), Some("GET"));
    assert_eq!(span.tag("http.status_code"), Some("200"));
    assert_eq!(span.failure, None);
}

#[tokio::test]
async fn test_string_and_hex_values_are_replaced() {
    let server = common::start_server(TracerConfig::default(), common::test_routes).await;
    let client = common::http1_client();

    client.get(server.url("/users/Alice/posts")).send().await.unwrap();
    client.get(server.url("/api/v1/items/FF")).send().await.unwrap();
    client.get(server.url("/files/docs/readme.txt")).send().await.unwrap();

    let names: Vec<_> = server.spans().into_iter().map(|s| s.operation_name).collect();
    assert_eq!(
        names,
        vec!["/users/{}/posts", "/api/v1/items/{}", "/files/{}"]
    );
}

#[tokio::test]
async fn test_unmatched_request_is_unhandled() {
    let server = common::start_server(TracerConfig::default(), common::test_routes).await;
    let client = common::http1_client();

    let res = client.get(server.url("/nowhere")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    let span = server.only_span();
    assert_eq!(span.operation_name, "unhandled");
    assert_eq!(span.tag("http.status_code"), Some("404"));
}

#[tokio::test]
async fn test_partially_matched_request_keeps_default_name() {
    // Matches recorded on a rejected branch never reach a terminal action.
    let server = common::start_server(TracerConfig::default(), common::test_routes).await;
    let client = common::http1_client();

    let res = client.get(server.url("/api/v1/unknown")).send().await.unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(server.only_span().operation_name, "unhandled");
}

#[tokio::test]
async fn test_failure_marks_span_and_names_it() {
    let server = common::start_server(TracerConfig::default(), common::test_routes).await;
    let client = common::http1_client();

    let res = client.get(server.url("/fail")).send().await.unwrap();
    assert_eq!(res.status(), 500);

    let span = server.only_span();
    assert_eq!(span.operation_name, "/fail");
    assert_eq!(span.failure.as_deref(), Some("request failed: injected"));
    assert_eq!(span.tag("error"), Some("true"));
}

#[tokio::test]
async fn test_redirect_is_named() {
    let server = common::start_server(TracerConfig::default(), common::test_routes).await;
    let client = common::http1_client();

    let res = client.get(server.url("/redirect")).send().await.unwrap();
    assert_eq!(res.status(), 307);
    assert_eq!(server.only_span().operation_name, "/redirect");
}

#[tokio::test]
async fn test_manual_name_is_respected() {
    let server = common::start_server(TracerConfig::default(), common::test_routes).await;
    let client = common::http1_client();

    client.get(server.url("/api/v1/custom")).send().await.unwrap();
    assert_eq!(server.only_span().operation_name, "custom-operation");
}

#[tokio::test]
async fn test_continuations_keep_request_context() {
    let server = common::start_server(TracerConfig::default(), common::test_routes).await;
    let client = common::http1_client();

    let body = client
        .get(server.url("/api/v1/slow/7"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    // The mapped future ran before naming, the continuation after it.
    assert_eq!(
        body,
        r#"Some("http.server.request") Some("/api/v1/slow/{}")"#
    );
    assert_eq!(server.only_span().operation_name, "/api/v1/slow/{}");
}

#[tokio::test]
async fn test_concurrent_requests_do_not_share_matches() {
    let server = common::start_server(TracerConfig::default(), common::test_routes).await;
    let client = common::http1_client();

    let mut handles = Vec::new();
    for i in 0..20 {
        let client = client.clone();
        let url = if i % 2 == 0 {
            server.url(&format!("/api/v1/users/{i}/orders"))
        } else {
            server.url(&format!("/users/user{i}/posts"))
        };
        handles.push(tokio::spawn(async move { client.get(url).send().await.unwrap().status() }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 200);
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for span in server.spans() {
        *counts.entry(span.operation_name).or_default() += 1;
    }
    assert_eq!(counts.len(), 2, "unexpected names: {counts:?}");
    assert_eq!(counts["/api/v1/users/{}/orders"], 10);
    assert_eq!(counts["/users/{}/posts"], 10);
}

#[tokio::test]
async fn test_sampling_override_by_operation_name() {
    let mut config = TracerConfig::default();
    config
        .sampling
        .operations
        .insert("/api/v1/users/{}/orders".into(), SamplingStrategy::Never);
    let server = common::start_server(config, common::test_routes).await;
    let client = common::http1_client();

    client.get(server.url("/api/v1/users/1/orders")).send().await.unwrap();
    client.get(server.url("/users/bob/posts")).send().await.unwrap();

    assert_eq!(server.only_span().operation_name, "/users/{}/posts");
}

#[tokio::test]
async fn test_reconfigure_disables_automatic_naming() {
    let server = common::start_server(TracerConfig::default(), common::test_routes).await;
    let client = common::http1_client();

    let mut updated = TracerConfig::default();
    updated.naming.automatic = false;
    server.tracer.reconfigure(&updated);

    client.get(server.url("/api/v1/users/1/orders")).send().await.unwrap();
    client.get(server.url("/nowhere")).send().await.unwrap();

    let names: Vec<_> = server.spans().into_iter().map(|s| s.operation_name).collect();
    assert_eq!(names, vec!["http.server.request", "http.server.request"]);
}
