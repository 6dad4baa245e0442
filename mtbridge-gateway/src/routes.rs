//! HTTP routes: parse requests into bridge commands, render outcomes.
//!
//! | Method | Path              | Command         |
//! |--------|-------------------|-----------------|
//! | GET    | `/health`         | health          |
//! | GET    | `/rates/{symbol}` | get_rates       |
//! | GET    | `/tick/{symbol}`  | get_tick        |
//! | GET    | `/positions`      | list_positions  |
//! | POST   | `/order`          | submit_order    |
//! | POST   | `/close`          | close_position  |
//! | POST   | `/modify`         | modify_position |

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use mtbridge_core::domain::{Bar, ModifyRequest, OrderRequest, Position, Side, Ticket, Tick, Timeframe};
use mtbridge_core::{LifecycleBridge, Outcome, SessionCapability, DEFAULT_RATE_COUNT};

use crate::config::{ErrorStatusPolicy, ServerConfig};
use crate::envelope::ApiError;

/// Shared handler state.
pub struct GatewayState<S> {
    pub bridge: Arc<LifecycleBridge<S>>,
    pub error_status: ErrorStatusPolicy,
    pub request_timeout: Option<Duration>,
}

impl<S> Clone for GatewayState<S> {
    fn clone(&self) -> Self {
        Self {
            bridge: Arc::clone(&self.bridge),
            error_status: self.error_status,
            request_timeout: self.request_timeout,
        }
    }
}

impl<S: SessionCapability + 'static> GatewayState<S> {
    pub fn new(bridge: Arc<LifecycleBridge<S>>, server: &ServerConfig) -> Self {
        Self {
            bridge,
            error_status: server.error_status,
            request_timeout: server.request_timeout(),
        }
    }

    /// Run one bridge command on the blocking pool. The bridge holds a
    /// synchronous lock and may block on the terminal.
    async fn run<T, F>(&self, command: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&LifecycleBridge<S>) -> Outcome<T> + Send + 'static,
    {
        let policy = self.error_status;
        let bridge = Arc::clone(&self.bridge);
        let task = tokio::task::spawn_blocking(move || command(&bridge));

        let joined = match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| ApiError::timeout(limit, policy))?,
            None => task.await,
        };
        let outcome =
            joined.map_err(|e| ApiError::internal(format!("bridge task failed: {e}"), policy))?;
        outcome.map_err(|e| ApiError::from_bridge(&e, policy))
    }
}

/// Build the router over a shared bridge.
pub fn router<S: SessionCapability + 'static>(state: GatewayState<S>) -> Router {
    Router::new()
        .route("/health", get(health::<S>))
        .route("/rates/{symbol}", get(get_rates::<S>))
        .route("/tick/{symbol}", get(get_tick::<S>))
        .route("/positions", get(list_positions::<S>))
        .route("/order", post(submit_order::<S>))
        .route("/close", post(close_position::<S>))
        .route("/modify", post(modify_position::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Wire shapes ──────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub connected: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<Ticket>,
}

impl StatusResponse {
    fn ok() -> Self {
        Self {
            status: "ok".into(),
            ticket: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RatesQuery {
    pub timeframe: String,
    pub count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct OrderBody {
    pub symbol: String,
    #[serde(rename = "type")]
    pub side: String,
    pub volume: f64,
    #[serde(default)]
    pub sl: f64,
    #[serde(default)]
    pub tp: f64,
    #[serde(default)]
    pub comment: String,
}

impl OrderBody {
    fn into_request(self) -> Result<OrderRequest, String> {
        let side: Side = self.side.parse().map_err(|e| format!("{e}"))?;
        let order =
            OrderRequest::market(self.symbol, side, self.volume).with_levels(self.sl, self.tp);
        if self.comment.is_empty() {
            Ok(order)
        } else {
            Ok(order.with_comment(self.comment))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CloseBody {
    pub ticket: u64,
}

#[derive(Debug, Deserialize)]
pub struct ModifyBody {
    pub ticket: u64,
    pub sl: Option<f64>,
    pub tp: Option<f64>,
    #[serde(default)]
    pub update_sl: bool,
    #[serde(default)]
    pub update_tp: bool,
}

impl From<ModifyBody> for ModifyRequest {
    fn from(body: ModifyBody) -> Self {
        ModifyRequest {
            ticket: Ticket(body.ticket),
            stop_loss: body.sl,
            take_profit: body.tp,
            apply_stop_loss: body.update_sl,
            apply_take_profit: body.update_tp,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn health<S: SessionCapability + 'static>(
    State(state): State<GatewayState<S>>,
) -> Result<Json<HealthResponse>, ApiError> {
    let health = state.run(|bridge| bridge.health()).await?;
    Ok(Json(HealthResponse {
        status: "ok".into(),
        connected: health.connected,
    }))
}

async fn get_rates<S: SessionCapability + 'static>(
    State(state): State<GatewayState<S>>,
    Path(symbol): Path<String>,
    query: Result<Query<RatesQuery>, QueryRejection>,
) -> Result<Json<Vec<Bar>>, ApiError> {
    let policy = state.error_status;
    let Query(query) = query.map_err(|e| ApiError::invalid(e.body_text(), policy))?;
    let timeframe: Timeframe = query
        .timeframe
        .parse()
        .map_err(|e| ApiError::invalid(format!("{e}"), policy))?;
    let count = query.count.unwrap_or(DEFAULT_RATE_COUNT);

    let bars = state
        .run(move |bridge| bridge.get_rates(&symbol, timeframe, count))
        .await?;
    Ok(Json(bars))
}

async fn get_tick<S: SessionCapability + 'static>(
    State(state): State<GatewayState<S>>,
    Path(symbol): Path<String>,
) -> Result<Json<Tick>, ApiError> {
    let tick = state.run(move |bridge| bridge.get_tick(&symbol)).await?;
    Ok(Json(tick))
}

async fn list_positions<S: SessionCapability + 'static>(
    State(state): State<GatewayState<S>>,
) -> Result<Json<Vec<Position>>, ApiError> {
    let positions = state.run(|bridge| bridge.list_positions()).await?;
    Ok(Json(positions))
}

async fn submit_order<S: SessionCapability + 'static>(
    State(state): State<GatewayState<S>>,
    body: Result<Json<OrderBody>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let policy = state.error_status;
    let Json(body) = body.map_err(|e| ApiError::invalid(e.body_text(), policy))?;
    let order = body
        .into_request()
        .map_err(|detail| ApiError::invalid(detail, policy))?;

    let ticket = state.run(move |bridge| bridge.submit_order(&order)).await?;
    Ok(Json(StatusResponse {
        status: "ok".into(),
        ticket: Some(ticket),
    }))
}

async fn close_position<S: SessionCapability + 'static>(
    State(state): State<GatewayState<S>>,
    body: Result<Json<CloseBody>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let policy = state.error_status;
    let Json(body) = body.map_err(|e| ApiError::invalid(e.body_text(), policy))?;
    let ticket = Ticket(body.ticket);

    state.run(move |bridge| bridge.close_position(ticket)).await?;
    Ok(Json(StatusResponse::ok()))
}

async fn modify_position<S: SessionCapability + 'static>(
    State(state): State<GatewayState<S>>,
    body: Result<Json<ModifyBody>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let policy = state.error_status;
    let Json(body) = body.map_err(|e| ApiError::invalid(e.body_text(), policy))?;
    let request = ModifyRequest::from(body);

    state.run(move |bridge| bridge.modify_position(&request)).await?;
    Ok(Json(StatusResponse::ok()))
}
