//! Integration test for the REST wrapper.

use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use quiesce::config::AppConfig;
use quiesce::server::RestApp;

#[tokio::test]
async fn rest_app_serves_requests_and_drains_on_cancellation() {
    let addr = "127.0.0.1:28311";
    let mut config = AppConfig::default();
    config.server.bind_address = addr.to_string();
    config.shutdown.max_shutdown_time_secs = 5;

    let parent = CancellationToken::new();
    let routes = Router::new().route("/", get(|| async { "hello" }));
    let app = RestApp::new(config).router(routes);

    let trigger = parent.clone();
    let server = tokio::spawn(async move { app.serve_with_token(trigger).await });

    let mut stream = connect_with_retry(addr).await;
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("x-request-id"));
    assert!(response.ends_with("hello"));

    parent.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    result.unwrap();
}

async fn connect_with_retry(addr: &str) -> TcpStream {
    for _ in 0..100 {
        if let Ok(stream) = TcpStream::connect(addr).await {
            return stream;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server at {addr} never became reachable");
}
