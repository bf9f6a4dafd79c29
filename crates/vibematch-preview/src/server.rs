//! HTTP server for preview endpoints
//!
//! Provides /health, /preview/{video_id}, /audio?src= and DELETE /cache.

use crate::types::{AudioQuery, ErrorResponse, HealthResponse};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
    Router,
};
use cached_blob_fetcher::{preview_audio_url, CachedBlobFetcher, FetchError, Origin};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Shared state for the HTTP server
pub struct ServerState {
    pub fetcher: Arc<CachedBlobFetcher>,
    pub api_base_url: String,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(fetcher: Arc<CachedBlobFetcher>, api_base_url: String) -> Self {
        Self {
            fetcher,
            api_base_url,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/preview/{video_id}", get(get_preview))
        .route("/audio", get(get_audio))
        .route("/cache", delete(clear_cache))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let cache = state.fetcher.store().stats().await;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache,
        live_handles: state.fetcher.handles().live_count(),
    })
}

/// Get a track preview by video id
async fn get_preview(
    State(state): State<SharedState>,
    Path(video_id): Path<String>,
) -> Response {
    let key = preview_audio_url(&state.api_base_url, &video_id);
    serve_key(&state, &key).await
}

/// Get any audio resource by URL
async fn get_audio(State(state): State<SharedState>, Query(query): Query<AudioQuery>) -> Response {
    match url::Url::parse(&query.src) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => serve_key(&state, url.as_str()).await,
        _ => error_response(
            StatusCode::BAD_REQUEST,
            state.fetcher.messages().download_failed.clone(),
        ),
    }
}

/// Drop every stored entry
async fn clear_cache(State(state): State<SharedState>) -> Response {
    match state.fetcher.store().clear().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to clear store");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn serve_key(state: &ServerState, key: &str) -> Response {
    match state.fetcher.resolve(key).await {
        Ok(resolved) => {
            let cache_header = match resolved.origin {
                Origin::Cache => "HIT",
                Origin::Network => "MISS",
            };
            // Not stored alongside the payload, so hits fall back to mpeg
            let content_type = resolved
                .content_type
                .unwrap_or_else(|| "audio/mpeg".to_string());
            // The handle is released once the body has been taken from it
            let body = resolved.handle.bytes().clone();

            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CACHE_CONTROL, "private, max-age=86400".to_string()),
                    (X_CACHE, cache_header.to_string()),
                ],
                body,
            )
                .into_response()
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Failed to resolve preview");
            let status = match &e {
                FetchError::InvalidKey => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            };
            error_response(status, e.user_message(state.fetcher.messages()))
        }
    }
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use blob_store::FileBlobStore;
    use cached_blob_fetcher::HttpBlobSource;
    use tempfile::tempdir;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_state(cache_dir: &std::path::Path, api_base_url: &str) -> SharedState {
        let fetcher = CachedBlobFetcher::new(
            Arc::new(FileBlobStore::open(cache_dir)),
            Arc::new(HttpBlobSource::new()),
        );
        Arc::new(ServerState::new(
            Arc::new(fetcher),
            api_base_url.to_string(),
        ))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let dir = tempdir().unwrap();
        let router = create_router(create_test_state(dir.path(), "http://localhost:8001"));

        let response = router.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert!(json["uptime_secs"].as_u64().is_some());
        assert_eq!(json["cache"]["entries"], 0);
        assert_eq!(json["live_handles"], 0);
    }

    #[tokio::test]
    async fn test_preview_miss_then_hit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/recommend/youtube-audio"))
            .and(query_param("video_id", "abc123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/mpeg")
                    .set_body_bytes(b"ID3 audio".to_vec()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let state = create_test_state(dir.path(), &server.uri());

        let response = create_router(state.clone())
            .oneshot(get("/preview/abc123"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-cache"], "MISS");
        assert_eq!(response.headers()["content-type"], "audio/mpeg");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body.as_ref(), b"ID3 audio");

        let response = create_router(state.clone())
            .oneshot(get("/preview/abc123"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-cache"], "HIT");

        assert_eq!(state.fetcher.handles().live_count(), 0);
        server.verify().await;
    }

    #[tokio::test]
    async fn test_preview_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"{"error": "video unavailable"}"#, "application/json"),
            )
            .expect(2)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let state = create_test_state(dir.path(), &server.uri());

        for _ in 0..2 {
            let response = create_router(state.clone())
                .oneshot(get("/preview/gone"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
            let json = body_json(response).await;
            assert_eq!(json["error"], "video unavailable");
        }

        assert_eq!(state.fetcher.store().stats().await.entries, 0);
        server.verify().await;
    }

    #[tokio::test]
    async fn test_preview_unreachable_backend() {
        let dir = tempdir().unwrap();
        let router = create_router(create_test_state(dir.path(), "http://127.0.0.1:1"));

        let response = router.oneshot(get("/preview/abc123")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Network error");
    }

    #[tokio::test]
    async fn test_audio_rejects_non_http_src() {
        let dir = tempdir().unwrap();
        let router = create_router(create_test_state(dir.path(), "http://localhost:8001"));

        let response = router
            .oneshot(get("/audio?src=file%3A%2F%2F%2Fetc%2Fpasswd"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_audio_by_src() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.ogg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/ogg")
                    .set_body_bytes(b"ogg".to_vec()),
            )
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let state = create_test_state(dir.path(), "http://localhost:8001");

        let src = format!("{}/a.ogg", server.uri());
        let uri = format!("/audio?src={}", src.replace(':', "%3A").replace('/', "%2F"));
        let response = create_router(state.clone())
            .oneshot(get(&uri))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-cache"], "MISS");
        assert_eq!(response.headers()["content-type"], "audio/ogg");

        let response = create_router(state).oneshot(get(&uri)).await.unwrap();
        assert_eq!(response.headers()["x-cache"], "HIT");
        assert_eq!(response.headers()["content-type"], "audio/mpeg");
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/mpeg")
                    .set_body_bytes(b"audio".to_vec()),
            )
            .expect(2)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let state = create_test_state(dir.path(), &server.uri());

        create_router(state.clone())
            .oneshot(get("/preview/x"))
            .await
            .unwrap();

        let response = create_router(state.clone())
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/cache")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = create_router(state.clone())
            .oneshot(get("/preview/x"))
            .await
            .unwrap();
        assert_eq!(response.headers()["x-cache"], "MISS");

        server.verify().await;
    }

    #[test]
    fn test_server_state_new() {
        let dir = tempdir().unwrap();
        let state = create_test_state(dir.path(), "http://localhost:8001");

        let diff = (Utc::now() - state.started_at).num_seconds();
        assert!((0..5).contains(&diff));
    }
}
