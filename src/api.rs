// Expense Tracker - HTTP Boundary
// Maps the entry service onto the /api/v1 routes the web client calls

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::entry::{Entry, EntryFilter, EntryPatch, NewEntry};
use crate::error::StoreError;
use crate::schema::ValidationError;
use crate::service::EntryService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    service: Arc<EntryService>,
}

impl AppState {
    pub fn new(service: EntryService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

// ============================================================================
// Response bodies
// ============================================================================

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct CreatedResponse {
    message: &'static str,
    entry: Entry,
}

#[derive(Serialize)]
struct EntriesResponse {
    message: &'static str,
    entries: Vec<Entry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IncomeResponse {
    message: &'static str,
    income_entries: Vec<Entry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExpenseResponse {
    message: &'static str,
    expense_entries: Vec<Entry>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<ValidationError>,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Store(StoreError),
    /// Request body could not be decoded
    BadRequest(String),
    /// Worker task failed before producing a result
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Store(StoreError::Validation(errors)) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    message: format!(
                        "Validation failed: {}",
                        errors
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join("; ")
                    ),
                    errors,
                },
            ),
            ApiError::Store(StoreError::NotFound(id)) => {
                tracing::debug!(%id, "entry not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse {
                        message: "Entry not found".to_string(),
                        errors: Vec::new(),
                    },
                )
            }
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    message,
                    errors: Vec::new(),
                },
            ),
            ApiError::Store(err) => {
                tracing::error!(error = %err, "store failure");
                internal_error()
            }
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "request task failed");
                internal_error()
            }
        };

        (status, Json(body)).into_response()
    }
}

fn internal_error() -> (StatusCode, ErrorResponse) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorResponse {
            message: "Internal server error".to_string(),
            errors: Vec::new(),
        },
    )
}

/// Run a service call on the blocking pool; SQLite calls are synchronous.
async fn with_service<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&EntryService) -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/v1/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
    })
}

/// POST /api/v1/addentries - Create an entry
async fn add_entry(
    State(state): State<AppState>,
    payload: Result<Json<NewEntry>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let entry = with_service(&state, move |service| service.create(&input)).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Entry created successfully",
            entry,
        }),
    ))
}

/// GET /api/v1/allentries?field=value - All entries, optionally exact-match filtered
async fn all_entries(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<EntriesResponse>, ApiError> {
    let filter = EntryFilter::from_pairs(params);
    let entries = with_service(&state, move |service| service.list(&filter)).await?;

    Ok(Json(EntriesResponse {
        message: "All entries retrieved successfully",
        entries,
    }))
}

/// GET /api/v1/getincomeentry - Income entries
async fn income_entries(State(state): State<AppState>) -> Result<Json<IncomeResponse>, ApiError> {
    let income_entries = with_service(&state, |service| service.list_income()).await?;

    Ok(Json(IncomeResponse {
        message: "Income entries retrieved successfully",
        income_entries,
    }))
}

/// GET /api/v1/getexpense - Expense entries
async fn expense_entries(
    State(state): State<AppState>,
) -> Result<Json<ExpenseResponse>, ApiError> {
    let expense_entries = with_service(&state, |service| service.list_expense()).await?;

    Ok(Json(ExpenseResponse {
        message: "Expense entries retrieved successfully",
        expense_entries,
    }))
}

/// PATCH /api/v1/editentries/:id - Partial update, returns the updated entry
async fn edit_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<EntryPatch>, JsonRejection>,
) -> Result<Json<Entry>, ApiError> {
    let Json(patch) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let entry = with_service(&state, move |service| service.update(&id, &patch)).await?;

    Ok(Json(entry))
}

/// DELETE /api/v1/deleteentries/:id - Hard delete
async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    with_service(&state, move |service| service.delete(&id)).await?;

    Ok(Json(MessageResponse {
        message: "Entry deleted successfully",
    }))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/addentries", post(add_entry))
        .route("/allentries", get(all_entries))
        .route("/getincomeentry", get(income_entries))
        .route("/getexpense", get(expense_entries))
        .route("/editentries/:id", patch(edit_entry))
        .route("/deleteentries/:id", delete(delete_entry))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}

/// CORS for a single browser origin.
pub fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let origin: HeaderValue = origin
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid CORS origin '{}': {}", origin, e))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]))
}
