use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

/// One request as the server saw it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRequest {
    pub method: String,
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

pub type RequestLog = Arc<RwLock<Vec<RecordedRequest>>>;

pub fn app() -> Router {
    let log: RequestLog = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/items", post(create_item))
        .route("/text", get(text))
        .route("/__requests", get(list_requests))
        .with_state(log)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn record(
    log: &RequestLog,
    method: Method,
    uri: Uri,
    headers: &HeaderMap,
    body: &Bytes,
) -> RecordedRequest {
    let entry = RecordedRequest {
        method: method.to_string(),
        uri: uri.to_string(),
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: String::from_utf8_lossy(body).into_owned(),
    };
    log::info!("{} {}", entry.method, entry.uri);
    log.write().await.push(entry.clone());
    entry
}

async fn echo(
    State(log): State<RequestLog>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Json<RecordedRequest> {
    Json(record(&log, method, uri, &headers, &body).await)
}

async fn status(
    State(log): State<RequestLog>,
    Path(code): Path<u16>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    record(&log, method, uri, &headers, &body).await;
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

async fn create_item(
    State(log): State<RequestLog>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    record(&log, method, uri, &headers, &body).await;
    (
        StatusCode::CREATED,
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"id":7}"#,
    )
}

async fn text(
    State(log): State<RequestLog>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> impl IntoResponse {
    record(&log, method, uri, &headers, &Bytes::new()).await;
    ([(header::CONTENT_TYPE, "text/plain")], "hello")
}

async fn list_requests(State(log): State<RequestLog>) -> Json<Vec<RecordedRequest>> {
    Json(log.read().await.clone())
}
