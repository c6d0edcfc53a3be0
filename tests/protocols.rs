//! Endpoint metadata on HTTP/1.1 and HTTP/2 connections.

use route_tracer::config::TracerConfig;

mod common;

#[tokio::test]
async fn test_http1_span_carries_endpoint() {
    let server = common::start_server(TracerConfig::default(), common::test_routes).await;
    let client = common::http1_client();

    let res = client.get(server.url("/api/v1/users/3/orders")).send().await.unwrap();
    assert_eq!(res.version(), reqwest::Version::HTTP_11);

    let span = server.only_span();
    assert_eq!(span.operation_name, "/api/v1/users/{}/orders");
    assert_eq!(span.tag("server.interface"), Some("127.0.0.1"));
    assert_eq!(span.tag("server.port"), Some(server.addr.port().to_string().as_str()));
    assert_eq!(span.tag("net.protocol"), Some("HTTP/1"));
    assert_eq!(span.tag("span.kind"), Some("server"));
}

#[tokio::test]
async fn test_http2_span_carries_endpoint() {
    let server = common::start_server(TracerConfig::default(), common::test_routes).await;
    let client = common::http2_client();

    let res = client.get(server.url("/api/v1/users/3/orders")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.version(), reqwest::Version::HTTP_2);

    let span = server.only_span();
    assert_eq!(span.operation_name, "/api/v1/users/{}/orders");
    assert_eq!(span.tag("server.interface"), Some("127.0.0.1"));
    assert_eq!(span.tag("server.port"), Some(server.addr.port().to_string().as_str()));
    assert_eq!(span.tag("net.protocol"), Some("HTTP/2"));
}

#[tokio::test]
async fn test_http2_multiplexed_requests_are_named_independently() {
    let server = common::start_server(TracerConfig::default(), common::test_routes).await;
    let client = common::http2_client();

    let (orders, posts, missing) = tokio::join!(
        client.get(server.url("/api/v1/users/9/orders")).send(),
        client.get(server.url("/users/carol/posts")).send(),
        client.get(server.url("/missing")).send(),
    );
    assert_eq!(orders.unwrap().status(), 200);
    assert_eq!(posts.unwrap().status(), 200);
    assert_eq!(missing.unwrap().status(), 404);

    let mut names: Vec<_> = server.spans().into_iter().map(|s| s.operation_name).collect();
    names.sort();
    assert_eq!(
        names,
        vec!["/api/v1/users/{}/orders", "/users/{}/posts", "unhandled"]
    );
}

#[tokio::test]
async fn test_request_id_is_tagged_and_propagated() {
    let server = common::start_server(TracerConfig::default(), common::test_routes).await;
    let client = common::http1_client();

    let res = client
        .get(server.url("/users/dave/posts"))
        .header("x-request-id", "req-123")
        .send()
        .await
        .unwrap();
    assert_eq!(
        res.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-123")
    );
    assert_eq!(server.only_span().tag("http.request_id"), Some("req-123"));
}
