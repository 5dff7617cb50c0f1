//! HTTP surface of the complaint router.
//!
//! Routes:
//! - `GET /`: liveness text
//! - `GET /health`: status and catalog size
//! - `POST /`, `POST /api/complaints`: classify a complaint and rank institutions
//! - `GET /api/institutions`: the current catalog
//! - `POST /api/catalog/reload`: re-read the catalog file
use std::sync::Arc;

use axum::{
    extract::State,
    middleware,
    routing::{get, post, MethodRouter},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;

use complaint_common::api::{
    ComplaintRoutingResponse, HealthResponse, InstitutionInfo, InstitutionListResponse,
    ReloadCatalogResponse,
};
use complaint_common::routing::ComplaintRouter;

use crate::error::ApiError;
use crate::rate_limit::{limit_requests, ClientRateLimiter};

#[derive(Clone)]
pub struct AppState {
    router: Arc<ComplaintRouter>,
}

#[derive(Debug, Deserialize)]
struct ComplaintRequest {
    #[serde(default)]
    text: String,
    limit: Option<u32>,
}

/// Read-only routes are never throttled; classification and reload go
/// through the per-client limiter when one is configured.
pub fn build_app(
    router: Arc<ComplaintRouter>,
    limiter: Option<ClientRateLimiter>,
    max_body_kb: usize,
) -> Router {
    let state = AppState { router };
    let classify = limited(post(classify_complaint), limiter.as_ref());
    let reload = limited(post(reload_catalog), limiter.as_ref());

    Router::new()
        .route("/", get(index).merge(classify.clone()))
        .route("/health", get(health))
        .route("/api/complaints", classify)
        .route("/api/institutions", get(list_institutions))
        .route("/api/catalog/reload", reload)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(max_body_kb * 1024))
}

fn limited(
    route: MethodRouter<AppState>,
    limiter: Option<&ClientRateLimiter>,
) -> MethodRouter<AppState> {
    match limiter {
        Some(limiter) => route.route_layer(middleware::from_fn_with_state(
            limiter.clone(),
            limit_requests,
        )),
        None => route,
    }
}

async fn index() -> &'static str {
    "complaint router is running"
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        institutions: state.router.catalog().len(),
    })
}

async fn classify_complaint(
    State(state): State<AppState>,
    Json(request): Json<ComplaintRequest>,
) -> Result<Json<ComplaintRoutingResponse>, ApiError> {
    let limit = request.limit.map(|n| n as usize);
    let response = state.router.route(&request.text, limit).await?;
    Ok(Json(response))
}

async fn list_institutions(State(state): State<AppState>) -> Json<InstitutionListResponse> {
    let catalog = state.router.catalog();
    let institutions: Vec<InstitutionInfo> = catalog.iter().map(InstitutionInfo::from).collect();
    Json(InstitutionListResponse {
        count: institutions.len(),
        institutions,
    })
}

async fn reload_catalog(
    State(state): State<AppState>,
) -> Result<Json<ReloadCatalogResponse>, ApiError> {
    let router = Arc::clone(&state.router);
    let count = tokio::task::spawn_blocking(move || router.reload_catalog())
        .await
        .map_err(|e| ApiError::Internal(format!("reload task failed: {e}")))??;
    info!(institutions = count, "catalog reload requested over http");
    Ok(Json(ReloadCatalogResponse {
        success: true,
        institutions: count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::extract::ConnectInfo;
    use std::net::SocketAddr;
    use axum::http::{Request, StatusCode};
    use complaint_common::routing::RouterSettings;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app(limiter: Option<ClientRateLimiter>) -> Router {
        let router = ComplaintRouter::load(RouterSettings::default()).unwrap();
        build_app(Arc::new(router), limiter, 64)
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let request = builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_index_is_plain_text() {
        let response = app(None)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"complaint router is running");
    }

    #[tokio::test]
    async fn test_health_reports_catalog_size() {
        let (status, json) = send(app(None), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert!(json["institutions"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_bank_complaint() {
        let (status, json) = send(
            app(None),
            "POST",
            "/api/complaints",
            Some(r#"{"text": "My bank deducted money without authorization"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["fallback"], false);
        assert_eq!(json["text"], "My bank deducted money without authorization");
        assert!(json["tags"].as_array().unwrap().iter().any(|t| t == "bank"));
        assert_eq!(json["institutions"][0]["name"], "Central Bank of Nigeria (CBN)");
        assert_eq!(json["institutions"][0]["score"], 2);
    }

    #[tokio::test]
    async fn test_root_post_accepts_complaints() {
        let (status, json) = send(app(None), "POST", "/", Some(r#"{"text": "hello world"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["classification"], "General complaint");
        assert_eq!(json["fallback"], true);
        assert_eq!(
            json["institutions"][0]["name"],
            "Public Complaints Commission (PCC)"
        );
    }

    #[tokio::test]
    async fn test_missing_text_is_bad_request() {
        let (status, json) = send(app(None), "POST", "/api/complaints", Some("{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "text must not be empty");

        let (status, _) =
            send(app(None), "POST", "/api/complaints", Some(r#"{"text": "  "}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_limit_in_body() {
        let (_, json) = send(
            app(None),
            "POST",
            "/api/complaints",
            Some(r#"{"text": "the police officer beat me", "limit": 2}"#),
        )
        .await;
        assert_eq!(json["institutions"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_institutions() {
        let (status, json) = send(app(None), "GET", "/api/institutions", None).await;
        assert_eq!(status, StatusCode::OK);
        let count = json["count"].as_u64().unwrap() as usize;
        assert_eq!(json["institutions"].as_array().unwrap().len(), count);
    }

    #[tokio::test]
    async fn test_reload_without_path_is_server_error() {
        let (status, json) = send(app(None), "POST", "/api/catalog/reload", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["success"], false);
    }

    async fn classify_from(app: Router, peer: [u8; 4]) -> StatusCode {
        let mut request = Request::builder()
            .method("POST")
            .uri("/api/complaints")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"text": "scam"}"#))
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 40000))));
        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_rate_limit() {
        let app = app(ClientRateLimiter::new(Some(1)));
        let body = Some(r#"{"text": "scam"}"#);
        let (first, _) = send(app.clone(), "POST", "/api/complaints", body).await;
        let (second, json) = send(app.clone(), "POST", "/", body).await;
        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["success"], false);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("rate limit exceeded"));

        // read-only routes stay open for a throttled client
        let (status, _) = send(app.clone(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rate_limit_is_per_client() {
        let app = app(ClientRateLimiter::new(Some(1)));
        assert_eq!(classify_from(app.clone(), [10, 0, 0, 1]).await, StatusCode::OK);
        assert_eq!(
            classify_from(app.clone(), [10, 0, 0, 1]).await,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(classify_from(app, [10, 0, 0, 2]).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cors_headers_present() {
        let response = app(None)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", "https://example.org")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
    }
}
