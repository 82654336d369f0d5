use axum::Json;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use seance_protocol::constants::MAX_DEPLOY_BODY_SIZE;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{SERVICE_NAME, deploy, manifest, static_files, timestamp_now};

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/deploy",
            post(deploy::deploy).layer(DefaultBodyLimit::max(MAX_DEPLOY_BODY_SIZE)),
        )
        .route("/health", get(health))
        .route("/updates/api/version.json", get(manifest::version_json))
        .route(
            "/updates/releases/{platform}/{filename}",
            get(manifest::release_download),
        )
        .route("/updates/{platform}/{file}", get(manifest::platform_file))
        .route("/downloads/latest", get(manifest::latest_download))
        .fallback(static_files::serve)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: timestamp_now(),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::test_support::{TestApp, get};

    #[tokio::test]
    async fn health_reports_service() {
        let app = TestApp::new();
        let resp = app.send(get("/health")).await;
        assert_eq!(resp.status, StatusCode::OK);
        let json = resp.json();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "seance-backend");
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn deploy_requires_post() {
        let app = TestApp::new();
        let resp = app.send(get("/deploy")).await;
        assert_eq!(resp.status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
