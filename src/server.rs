use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::pipeline::{Dashboard, Engine, Health};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

pub fn router(engine: Arc<Engine>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/health", get(health))
        .route("/dashboard", get(dashboard))
        .route("/api/dashboard", get(dashboard))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { engine })
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(state.engine.health())
}

async fn dashboard(State(state): State<AppState>) -> Json<Dashboard> {
    Json(state.engine.dashboard().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::signal::{StaticSource, WeatherAdapter};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let mut config = Config::default();
        config.service.seed = Some(99);
        let weather = WeatherAdapter::new(&config.signal, Box::new(StaticSource::new(5.0, 8.0, 0.0)));
        router(Arc::new(Engine::with_weather(&config, weather)))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_is_ok() {
        for uri in ["/health", "/api/health"] {
            let (status, body) = get_json(app(), uri).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "ok");
            assert_eq!(body["project"], "Retail Fusion");
        }
    }

    #[tokio::test]
    async fn dashboard_payload_shape() {
        let (status, body) = get_json(app(), "/api/dashboard").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["project_title"], "Retail Fusion");
        assert_eq!(body["weather"]["influence_factor"], 1.12);
        assert_eq!(body["metrics"]["weather_impact_pct"], 12);
        assert!(body["metrics"]["total_stock"].as_u64().unwrap() > 0);
        assert_eq!(body["forecast"]["forecast"].as_array().unwrap().len(), 7);
        assert_eq!(body["recommendations"].as_array().unwrap().len(), 5);

        let tx = &body["transactions"][0];
        assert!(tx["id"].as_str().unwrap().starts_with("TX-"));
        assert!(tx["product"].is_string());
        assert!(tx["timestamp"].as_str().unwrap().ends_with(" UTC"));
        let status = body["recommendations"][0]["status"].as_str().unwrap();
        assert!(["critical", "low", "healthy"].contains(&status));
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }
}
