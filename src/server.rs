//! HTTP surface of the service
//!
//! Exposes the refresh, list and lookup endpoints as an axum router. Every error is
//! rendered as a JSON body of the form `{"error": "..."}`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::cache::CacheManager;
use crate::data::{CatalogSource, Pokemon};
use crate::query::{ListQuery, LookupError, QueryEngine, WeightBound, DEFAULT_LIST_LIMIT};
use crate::refresh::{RefreshError, Refresher, DEFAULT_REFRESH_LIMIT};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheManager>,
    pub refresher: Refresher,
    pub queries: QueryEngine,
}

impl AppState {
    pub fn new(cache: Arc<CacheManager>, catalog: Arc<dyn CatalogSource>) -> Self {
        Self {
            refresher: Refresher::new(cache.clone(), catalog.clone()),
            queries: QueryEngine::new(cache.clone(), catalog),
            cache,
        }
    }
}

/// Builds the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/refresh", post(refresh))
        .route("/pokemon", get(list_pokemon))
        .route("/pokemon/:id_or_name", get(get_pokemon))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolves once Ctrl-C is received
///
/// If the signal handler cannot be installed the error is logged and the future
/// never resolves, so the server keeps running.
pub async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await
}

async fn wait_for_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

/// Error returned to HTTP clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not found")
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: &self.message })).into_response()
    }
}

impl From<RefreshError> for ApiError {
    fn from(err: RefreshError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl From<LookupError> for ApiError {
    fn from(_: LookupError) -> Self {
        Self::not_found()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
struct RefreshParams {
    limit: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub cached: usize,
    pub refreshed: usize,
    pub failed: usize,
}

/// Query string of `GET /pokemon`
///
/// Values are taken as raw strings: empty parameters are ignored and numbers are
/// read leniently from their leading digits.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub name_contains: Option<String>,
    #[serde(rename = "type")]
    pub types: Option<String>,
    pub min_weight: Option<String>,
    pub max_weight: Option<String>,
    pub limit: Option<String>,
}

impl From<ListParams> for ListQuery {
    fn from(params: ListParams) -> Self {
        let name_contains = params
            .name_contains
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let types = params
            .types
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        ListQuery {
            name_contains,
            types,
            min_weight: parse_weight(params.min_weight.as_deref()),
            max_weight: parse_weight(params.max_weight.as_deref()),
            limit: parse_limit(params.limit.as_deref(), DEFAULT_LIST_LIMIT),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub count: usize,
    pub results: Vec<Pokemon>,
}

/// Reads the integer at the start of `raw`
///
/// Leading whitespace and one sign are accepted and reading stops at the first
/// non-digit, so `"60kg"` is 60 and `"1.5"` is 1. Returns `None` when no digit
/// follows. Values too large for `i64` saturate.
fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if end == 0 {
        return None;
    }

    let magnitude = unsigned[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Parses a positive limit, falling back to `default` when absent, non-numeric or
/// not positive
fn parse_limit(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(parse_int_prefix)
        .filter(|&n| n > 0)
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
        .unwrap_or(default)
}

/// Parses a weight bound; absent or blank means no bound
fn parse_weight(raw: Option<&str>) -> Option<WeightBound> {
    let raw = raw?;
    if raw.trim().is_empty() {
        return None;
    }
    Some(parse_int_prefix(raw).map_or(WeightBound::Unsatisfiable, WeightBound::At))
}

/// POST /refresh - Refetch records from the remote catalog
async fn refresh(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RefreshParams>,
) -> ApiResult<Json<RefreshResponse>> {
    let limit = parse_limit(params.limit.as_deref(), DEFAULT_REFRESH_LIMIT);
    let report = state.refresher.refresh(limit).await?;

    Ok(Json(RefreshResponse {
        success: true,
        cached: report.cached,
        refreshed: report.refreshed,
        failed: report.failures.len(),
    }))
}

/// GET /pokemon - List cached records matching the filters
async fn list_pokemon(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Json<ListResponse> {
    let query = ListQuery::from(params);
    let results = state.queries.list(&query).await;

    Json(ListResponse {
        count: results.len(),
        results,
    })
}

/// GET /pokemon/:id_or_name - Look up one record, fetching it if needed
async fn get_pokemon(
    State(state): State<Arc<AppState>>,
    Path(id_or_name): Path<String>,
) -> ApiResult<Json<Pokemon>> {
    let pokemon = state.queries.lookup(&id_or_name).await?;
    Ok(Json(pokemon))
}
