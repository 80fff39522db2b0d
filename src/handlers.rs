use anyhow::Context;
use axum::body::Bytes;
use axum::{Extension, response::Json as ResponseJson};
use chrono::Local;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::agents::find_wholesale_agents;
use crate::app::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{
    AgentsRequest, AgentsResponse, HealthResponse, PresetsResponse, SearchRequest, SearchResponse,
};
use crate::search::params::ScrapeParams;
use crate::search::run_search;
use crate::table::Table;

/// Health check handler
/// Returns the service status and health information
pub async fn health_check() -> AppResult<ResponseJson<HealthResponse>> {
    debug!("Health check endpoint called");

    let response = HealthResponse::ok();

    info!("Health check successful");
    Ok(ResponseJson(response))
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> anyhow::Result<T> {
    serde_json::from_slice(body).context("Request body is not valid JSON")
}

/// Property search handler.
/// Failures past validation carry the full diagnostic chain back to the caller.
pub async fn search_handler(
    Extension(state): Extension<AppState>,
    body: Bytes,
) -> AppResult<ResponseJson<SearchResponse>> {
    let request: SearchRequest = parse_body(&body).map_err(AppError::with_traceback)?;

    let location = request
        .location()
        .ok_or_else(|| AppError::BadRequest("Location is required".to_string()))?;
    info!("Search endpoint called for location: {}", location);

    let params = ScrapeParams::from_request(location, &request, state.config.default_limit);
    if let Some(preset) = &params.preset {
        info!("Using preset: {}", preset);
    }

    let outcome = run_search(
        state.engine.as_ref(),
        &params,
        request.include_analytics,
        state.config.high_potential_threshold,
    )
    .await
    .map_err(AppError::with_traceback)?;

    let scraped_at = Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string();
    let response = SearchResponse::new(outcome.properties, outcome.market_stats, scraped_at);

    info!("Returning {} properties", response.count);
    Ok(ResponseJson(response))
}

/// Lists the search presets homeharvest knows about
pub async fn presets_handler(
    Extension(state): Extension<AppState>,
) -> AppResult<ResponseJson<PresetsResponse>> {
    let presets = state
        .engine
        .presets()
        .await
        .context("Failed to load presets")?;

    Ok(ResponseJson(PresetsResponse {
        success: true,
        presets,
    }))
}

/// Wholesale agent handler.
/// Accepts a batch of property records and returns the agents worth contacting.
pub async fn agents_handler(
    Extension(state): Extension<AppState>,
    body: Bytes,
) -> AppResult<ResponseJson<AgentsResponse>> {
    let request: AgentsRequest = parse_body(&body)?;

    let records = request
        .properties()
        .ok_or_else(|| AppError::BadRequest("Properties array is required".to_string()))?;
    info!("Agents endpoint called with {} properties", records.len());

    let properties = Table::from_records(records).context("Invalid property records")?;
    let min_listings = request
        .min_listings
        .unwrap_or(state.config.default_min_listings);

    let agents = find_wholesale_agents(state.engine.as_ref(), &properties, min_listings).await?;

    Ok(ResponseJson(AgentsResponse::new(agents)))
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::create_app;
    use crate::config::Config;
    use crate::harvest::stub::StubEngine;
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(engine: StubEngine) -> Router {
        create_app(Arc::new(engine), Config::default())
    }

    fn shared_app(engine: &Arc<StubEngine>) -> Router {
        create_app(engine.clone(), Config::default())
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.into())
            .expect("request")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    #[tokio::test]
    async fn test_health_check() {
        let result = health_check().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_search_requires_location() {
        let engine = Arc::new(StubEngine::default());
        let (status, body) = send(
            shared_app(&engine),
            post("/api/scrape", r#"{"location": " ", "limit": 5}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], "Location is required");
        assert_eq!(StubEngine::calls(&engine.scrape_calls), 0);
    }

    #[tokio::test]
    async fn test_search_without_results() {
        let (status, body) = send(
            app(StubEngine::default()),
            post("/api/scrape", r#"{"location": "Nowhere, KS"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["count"], json!(0));
        assert_eq!(body["properties"], json!([]));
        assert_eq!(body["market_stats"], json!({}));
        assert!(body["scraped_at"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_search_returns_envelope() {
        let mut engine = StubEngine::with_properties(json!([
            {"property_id": "1", "status": "for_sale", "list_price": 100},
            {"property_id": "2", "status": "Pending", "list_price": 999},
            {"property_id": "3", "status": "for_sale", "list_price": 300},
        ]));
        engine.scores = vec![71.0, 20.0];

        let (status, body) = send(
            app(engine),
            post(
                "/api/scrape",
                r#"{"location": "Tulsa, OK", "bogus_filter": 1}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], json!(2));
        assert_eq!(body["properties"][1]["property_id"], "3");
        assert_eq!(body["market_stats"]["avg_price"], json!(200.0));
        assert_eq!(body["market_stats"]["high_potential_count"], json!(1));
    }

    #[tokio::test]
    async fn test_search_failure_includes_traceback() {
        let engine = StubEngine {
            fail_scrape: true,
            ..StubEngine::default()
        };
        let (status, body) =
            send(app(engine), post("/api/scrape", r#"{"location": "Reno"}"#)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], "Property scrape failed: realtor.com returned 403");
        assert!(body["traceback"].as_str().unwrap().contains("realtor.com returned 403"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_server_error() {
        let engine = StubEngine::default();
        let (status, body) = send(app(engine), post("/api/scrape", "{location:")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["traceback"].is_string());
    }

    #[tokio::test]
    async fn test_presets() {
        let (status, body) = send(app(StubEngine::default()), get("/api/scrape/presets")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert!(body["presets"]["investor_friendly"].is_string());
    }

    #[tokio::test]
    async fn test_presets_failure_hides_traceback() {
        let engine = StubEngine {
            fail_presets: true,
            ..StubEngine::default()
        };
        let (status, body) = send(app(engine), get("/api/scrape/presets")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().unwrap().contains("presets unavailable"));
        assert!(body.get("traceback").is_none());
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let (status, body) = send(app(StubEngine::default()), get("/api/scrape/other")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not Found");
    }

    #[tokio::test]
    async fn test_agents_requires_properties() {
        let engine = Arc::new(StubEngine::default());
        let (status, body) = send(
            shared_app(&engine),
            post("/api/agents", r#"{"properties": []}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Properties array is required");
        assert_eq!(StubEngine::calls(&engine.detect_calls), 0);
        assert_eq!(StubEngine::calls(&engine.specialization_calls), 0);
    }

    #[tokio::test]
    async fn test_agents_envelope() {
        let body = json!({
            "properties": [
                {"agent_name": "A", "list_price": 250000},
                {"agent_name": "A", "list_price": 260000},
                {"agent_name": "A", "list_price": 240000},
                {"agent_name": "B", "list_price": 900000},
            ],
        });
        let (status, body) = send(
            app(StubEngine::default()),
            post("/api/agents", body.to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], json!(1));
        assert_eq!(body["agents"][0]["agent_name"], "A");
        assert_eq!(body["agents"][0]["price_category"], "Mid-Range");
        assert_eq!(body["agents"][0]["avg_days_on_market"], Value::Null);
    }

    #[tokio::test]
    async fn test_agents_failure_hides_traceback() {
        let (status, body) = send(
            app(StubEngine::default()),
            post("/api/agents", r#"{"properties": [1, 2]}"#),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], json!(false));
        assert!(body.get("traceback").is_none());
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/agents")
            .header("origin", "https://app.example")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .expect("request");
        let response = app(StubEngine::default())
            .oneshot(request)
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}
