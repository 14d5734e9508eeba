//! HTTP surface over [`QuoteService`].
//!
//! Partial failures are not transport errors: both quote endpoints answer 200 with `data` and
//! `failed`. Only batch-wide conditions produce a non-200 status.

use crate::aggregator::BatchResult;
use crate::core::{FetchError, InstrumentRef, Quote};
use crate::service::QuoteService;
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QuoteService>,
    pub version: String,
}

impl AppState {
    pub fn new(service: Arc<QuoteService>) -> Self {
        AppState {
            service,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuotesResponse {
    pub data: Vec<Quote>,
    pub failed: Vec<InstrumentRef>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl QuotesResponse {
    fn from_result(result: BatchResult, category: Option<String>) -> Self {
        QuotesResponse {
            data: result.succeeded,
            failed: result.failed,
            timestamp: result.observed_at,
            category,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Batch-wide failure rendered with the status of its error kind.
pub struct ApiError(FetchError);

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        error!(status = %status, error = %self.0, "Request failed");
        (
            status,
            Json(ErrorResponse {
                error: self.0.kind().to_string(),
                message: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/quotes", get(batch_quotes))
        .route("/api/indices", get(index_quotes))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
    })
}

async fn batch_quotes(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
) -> Result<Json<QuotesResponse>, ApiError> {
    let category = query.category.filter(|c| !c.is_empty());
    let result = state.service.batch(category.as_deref()).await?;
    let label = category.unwrap_or_else(|| "all".to_string());
    Ok(Json(QuotesResponse::from_result(result, Some(label))))
}

async fn index_quotes(State(state): State<AppState>) -> Result<Json<QuotesResponse>, ApiError> {
    let result = state.service.indices().await?;
    Ok(Json(QuotesResponse::from_result(result, None)))
}

pub async fn serve(state: AppState, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!("Listening on {}", bind);
    axum::serve(listener, create_router(state))
        .await
        .context("HTTP server terminated")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Market;
    use crate::core::config::{AppConfig, CategoryConfig};
    use crate::testing::{Reply, ScriptedClient};
    use axum::body::Body;
    use axum::http::Request;
    use rust_decimal_macros::dec;
    use tower::ServiceExt;

    fn make_state(client: ScriptedClient) -> AppState {
        let mut config = AppConfig::default();
        config.batch.inter_chunk_delay_ms = 0;
        config.categories = vec![CategoryConfig {
            name: "etf".to_string(),
            instruments: vec![
                InstrumentRef::equity("SPY", Market::Nyse),
                InstrumentRef::equity("QQQ", Market::Nasdaq),
            ],
        }];
        AppState::new(Arc::new(QuoteService::from_config(&config, Arc::new(client))))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(make_state(ScriptedClient::new()));
        let (status, body) = get(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_batch_partial_failure_is_ok() {
        let client = ScriptedClient::new()
            .reply("SPY", Reply::price(dec!(600.10)))
            .reply("QQQ", Reply::Unauthorized);
        let app = create_router(make_state(client));

        let (status, body) = get(app, "/api/quotes?category=etf").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "etf");
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["currentValue"], "600.10");
        assert_eq!(body["failed"][0]["symbol"], "QQQ");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_one_unauthorized_in_ten_keeps_status_ok() {
        let names = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"];
        let client = names
            .iter()
            .fold(ScriptedClient::new(), |client, name| {
                client.reply(name, Reply::price(dec!(100)))
            })
            .reply("F", Reply::Unauthorized);
        let mut config = AppConfig::default();
        config.batch.inter_chunk_delay_ms = 0;
        config.categories = vec![CategoryConfig {
            name: "ten".to_string(),
            instruments: names
                .map(|s| InstrumentRef::equity(s, Market::Nyse))
                .to_vec(),
        }];
        let state = AppState::new(Arc::new(QuoteService::from_config(&config, Arc::new(client))));

        let (status, body) = get(create_router(state), "/api/quotes?category=ten").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 9);
        assert_eq!(body["failed"].as_array().unwrap().len(), 1);
        assert_eq!(body["failed"][0]["symbol"], "F");
    }

    #[tokio::test]
    async fn test_batch_defaults_to_all_categories() {
        let client = ScriptedClient::new()
            .reply("SPY", Reply::price(dec!(600)))
            .reply("QQQ", Reply::price(dec!(620)));
        let app = create_router(make_state(client));

        let (status, body) = get(app, "/api/quotes").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "all");
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_indices_response_has_no_category() {
        let client = ScriptedClient::new()
            .reply("SPX", Reply::price(dec!(6010)))
            .reply("NDX", Reply::price(dec!(21650)))
            .reply("DJI", Reply::price(dec!(44100)))
            .reply("RUT", Reply::price(dec!(2250)));
        let app = create_router(make_state(client));

        let (status, body) = get(app, "/api/indices").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("category").is_none());
        assert_eq!(body["data"].as_array().unwrap().len(), 4);
        assert!(body["failed"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credentials_is_server_error() {
        let app = create_router(make_state(ScriptedClient::new().without_credentials()));

        let (status, body) = get(app, "/api/indices").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "configuration_error");
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (FetchError::Configuration("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (FetchError::Authentication("x".into()), StatusCode::UNAUTHORIZED),
            (
                FetchError::Upstream {
                    code: "E".into(),
                    message: "x".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (FetchError::Unknown("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }
}
