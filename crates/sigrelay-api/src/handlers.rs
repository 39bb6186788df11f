//! Route handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::Value;
use sigrelay_core::{PageRequest, Pagination, TradeSignal, DEFAULT_LIMIT};
use sigrelay_signal::parse_submissions;
use sigrelay_telemetry::Metrics;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{HealthResponse, MessagePage, MessageSubmission, PageParams, TradeBatchResponse};

fn json_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    body.map(|Json(v)| v)
        .map_err(|e| ApiError::Validation(e.body_text()))
}

/// `GET /`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        environment: state.config.environment.clone(),
        port: state.port,
    })
}

/// `GET /messages?page=&limit=`
///
/// Paging never rejects: a malformed query string reads as no parameters.
pub async fn list_messages(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Json<MessagePage>> {
    let params = match query {
        Ok(Query(pairs)) => PageParams::from_pairs(&pairs),
        Err(e) => {
            debug!(error = %e, "Unreadable query string, using default paging");
            PageParams::default()
        }
    };
    let page = PageRequest::from_raw(params.page.as_deref(), params.limit.as_deref())
        .capped(state.config.max_page_limit);

    let (data, total) = state.store.list_messages(page).await?;
    debug!(page = page.page(), limit = page.limit(), total, "Messages listed");

    Ok(Json(MessagePage {
        data,
        pagination: Pagination::new(total, page),
    }))
}

/// `GET /messages/text`
pub async fn list_message_texts(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    let texts = state.store.list_message_texts(DEFAULT_LIMIT).await?;
    Ok(Json(texts))
}

/// `POST /messages`: `{text}` or `[{text}]`.
pub async fn create_messages(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Response> {
    let submission = MessageSubmission::parse(json_body(body)?)?;

    let response = match submission {
        MessageSubmission::One(message) => {
            let stored = state.store.create_message(message).await?;
            info!(id = stored.id, "Message created");
            (StatusCode::CREATED, Json(stored)).into_response()
        }
        MessageSubmission::Many(messages) => {
            let stored = state.store.create_messages(messages).await?;
            info!(count = stored.len(), "Messages created");
            (StatusCode::CREATED, Json(stored)).into_response()
        }
    };
    Ok(response)
}

/// `GET /trades`
pub async fn list_trades(State(state): State<AppState>) -> ApiResult<Json<Vec<TradeSignal>>> {
    let signals = state.store.list_trade_signals(DEFAULT_LIMIT).await?;
    Ok(Json(signals))
}

/// `POST /trades`: one submission or an array. Item failures are reported
/// inline; the status is 201 whenever the body itself is well formed.
pub async fn create_trades(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TradeBatchResponse>)> {
    let items = parse_submissions(json_body(body)?)?;
    let outcome = state.validator.submit(items).await;
    Ok((StatusCode::CREATED, Json(outcome.into())))
}

/// `GET /metrics`
pub async fn metrics() -> ApiResult<Response> {
    let body = Metrics::render().map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
