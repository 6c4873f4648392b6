use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use block_healer::config::SourceConfig;
use block_healer::error::FetchError;
use block_healer::net::BlockSource;
use block_healer::net::rest::RestClient;
use serde_json::json;

async fn latest() -> Response {
    axum::Json(json!({ "block": { "header": { "height": "1234567" } } })).into_response()
}

async fn by_height(Path(height): Path<u64>) -> Response {
    match height {
        404 => (StatusCode::NOT_FOUND, "block not found").into_response(),
        500 => (StatusCode::INTERNAL_SERVER_ERROR, "upstream down").into_response(),
        777 => "{ not json".into_response(),
        888 => axum::Json(json!({ "block": {} })).into_response(),
        999 => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            StatusCode::OK.into_response()
        }
        h => axum::Json(json!({ "block": { "header": { "height": h.to_string() } } }))
            .into_response(),
    }
}

async fn serve() -> SocketAddr {
    let app = Router::new()
        .route("/blocks/latest", get(latest))
        .route("/blocks/:height", get(by_height));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn client() -> RestClient {
    let addr = serve().await;
    RestClient::new(&SourceConfig {
        latest_url: format!("http://{addr}/blocks/latest"),
        block_url: format!("http://{addr}/blocks/{{}}"),
        request_timeout: Duration::from_millis(500),
        ..SourceConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn fetches_latest_and_by_height() {
    let client = client().await;

    let tip = client.latest().await.unwrap();
    assert_eq!(tip.height, 1_234_567);

    let block = client.by_height(42).await.unwrap();
    assert_eq!(block.height, 42);
    assert_eq!(block.payload["block"]["header"]["height"], "42");
}

#[tokio::test]
async fn non_success_status_is_a_fetch_failure() {
    let client = client().await;

    match client.by_height(404).await {
        Err(FetchError::Status { status, body }) => {
            assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
            assert_eq!(body, "block not found");
        }
        other => panic!("expected status error, got {other:?}"),
    }

    let err = client.by_height(500).await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn malformed_payloads_are_rejected() {
    let client = client().await;

    assert!(matches!(client.by_height(777).await, Err(FetchError::Json(_))));
    assert!(matches!(
        client.by_height(888).await,
        Err(FetchError::MissingHeight { .. })
    ));
}

#[tokio::test]
async fn slow_responses_time_out() {
    let client = client().await;
    let err = client.by_height(999).await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout));
    assert!(err.is_transient());
}

#[tokio::test]
async fn unreachable_source_is_a_connect_failure() {
    // Bind and drop to get a port nothing listens on.
    let addr = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap();
    let client = RestClient::new(&SourceConfig {
        latest_url: format!("http://{addr}/blocks/latest"),
        block_url: format!("http://{addr}/blocks"),
        request_timeout: Duration::from_millis(500),
        ..SourceConfig::default()
    })
    .unwrap();

    let err = client.latest().await.unwrap_err();
    assert!(err.is_transient(), "{err:?}");
}
