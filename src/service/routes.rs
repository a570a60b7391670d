//! Axum routes for the collation service.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::config::CollationConfig;
use crate::projection::{AlignmentTable, Apparatus};
use crate::session::{CollationError, CollationSession, CollationSummary, WitnessReport};
use crate::types::Witness;
use crate::COLLATION_SCHEMA_VERSION;

use super::middleware::{metrics_middleware, record_collation_metrics};
use super::state::{ConfigRef, ServiceState};

type AppState = Arc<ServiceState>;
type ApiError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Request/Response Types
// ============================================================================

/// One submitted witness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WitnessText {
    /// Witness sigil.
    pub sigil: String,
    /// Untokenized text.
    pub text: String,
}

/// Projection to include in the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// Alignment table.
    Table,
    /// Critical apparatus.
    Apparatus,
}

fn default_outputs() -> Vec<OutputKind> {
    vec![OutputKind::Table]
}

/// Request to collate a set of witnesses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateRequest {
    /// Witnesses in merge order.
    pub witnesses: Vec<WitnessText>,
    /// Registered config to use.
    #[serde(default)]
    pub config_ref: Option<ConfigRef>,
    /// Inline config to use.
    #[serde(default)]
    pub config: Option<CollationConfig>,
    /// Projections to return.
    #[serde(default = "default_outputs")]
    pub outputs: Vec<OutputKind>,
}

/// Collation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateResponse {
    /// Config used.
    pub config_ref: ConfigRef,
    /// Per-witness merge counts.
    pub reports: Vec<WitnessReport>,
    /// Provenance record taken after merging.
    pub summary: CollationSummary,
    /// Alignment table, if requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<AlignmentTable>,
    /// Critical apparatus, if requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apparatus: Option<Apparatus>,
}

/// Request to register a new config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterConfigRequest {
    pub config: CollationConfig,
}

/// Response containing a config reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigRefResponse {
    pub config_ref: ConfigRef,
}

/// A registered config with its reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub config_ref: ConfigRef,
    pub config: CollationConfig,
}

/// List of registered configs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigListResponse {
    pub configs: Vec<ConfigRef>,
    pub default_config: ConfigRef,
    pub registry_fingerprint: String,
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub schema_version: String,
    pub config_count: usize,
    pub registry_fingerprint: String,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

/// Readiness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub details: Option<String>,
}

/// Structured error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        tracing::warn!(code = %self.code, error = %self.error, "Request error");
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    let body = ErrorResponse::new(code, error);
    tracing::warn!(code = %body.code, error = %body.error, status = status.as_u16(), "Request error");
    (status, Json(body))
}

impl From<CollationError> for ApiError {
    fn from(e: CollationError) -> Self {
        match e {
            CollationError::DuplicateSigil(_) => {
                api_error(StatusCode::BAD_REQUEST, "DUPLICATE_SIGIL", e.to_string())
            }
            CollationError::ResourceLimit(_) => {
                api_error(StatusCode::PAYLOAD_TOO_LARGE, "RESOURCE_LIMIT", e.to_string())
            }
            _ => api_error(StatusCode::INTERNAL_SERVER_ERROR, "COLLATION_FAILED", e.to_string()),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

struct CollationOutput {
    reports: Vec<WitnessReport>,
    summary: CollationSummary,
    table: Option<AlignmentTable>,
    apparatus: Option<Apparatus>,
}

fn run_collation(
    config: CollationConfig,
    witnesses: &[Witness],
    outputs: &[OutputKind],
) -> Result<CollationOutput, CollationError> {
    let mut session = CollationSession::new(config);
    let reports = session.collate(witnesses)?;
    let summary = session.summary();

    let table = if outputs.contains(&OutputKind::Table) {
        Some(session.to_table()?)
    } else {
        None
    };
    // Joins the graph, so it runs last.
    let apparatus = if outputs.contains(&OutputKind::Apparatus) {
        Some(session.to_apparatus()?)
    } else {
        None
    };

    Ok(CollationOutput { reports, summary, table, apparatus })
}

/// Validate a client-supplied config and cap its limits at the server's.
fn effective_config(state: &ServiceState, config: &CollationConfig) -> Result<CollationConfig, ApiError> {
    config
        .validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, "INVALID_CONFIG", e.to_string()))?;
    let mut effective = config.clone();
    effective.limits = config.limits.clamped_to(&state.default_config.limits);
    Ok(effective)
}

fn resolve_config(
    state: &ServiceState,
    request: &CollateRequest,
) -> Result<(CollationConfig, ConfigRef), ApiError> {
    let requested = match (&request.config_ref, &request.config) {
        (Some(_), Some(_)) => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "AMBIGUOUS_CONFIG",
                "Provide either config_ref or config, not both",
            ))
        }
        (Some(config_ref), None) => {
            let registry = state.config_registry.read();
            registry.resolve(config_ref).cloned().ok_or_else(|| {
                api_error(
                    StatusCode::NOT_FOUND,
                    "CONFIG_NOT_FOUND",
                    format!("Config not found: {}", config_ref.params_hash),
                )
            })?
        }
        (None, Some(config)) => config.clone(),
        (None, None) => return Ok(((*state.default_config).clone(), state.default_ref())),
    };
    let config = effective_config(state, &requested)?;
    let config_ref = ConfigRef::from_config(&config);
    Ok((config, config_ref))
}

/// Tokenize and collate the submitted witnesses.
async fn collate_handler(
    State(state): State<AppState>,
    Json(request): Json<CollateRequest>,
) -> Result<Json<CollateResponse>, ApiError> {
    let (config, config_ref) = resolve_config(&state, &request)?;
    let witnesses: Vec<Witness> = request
        .witnesses
        .iter()
        .map(|w| state.tokenizer.witness(w.sigil.as_str(), &w.text))
        .collect();
    let witness_count = witnesses.len();
    let outputs = request.outputs;

    let started = Instant::now();
    let output = tokio::task::spawn_blocking(move || run_collation(config, &witnesses, &outputs))
        .await
        .map_err(|e| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "COLLATION_ABORTED",
                format!("Collation task failed: {}", e),
            )
        })??;

    record_collation_metrics(
        witness_count,
        output.summary.vertex_count,
        output.summary.edge_count,
        started.elapsed().as_millis() as u64,
    );

    Ok(Json(CollateResponse {
        config_ref,
        reports: output.reports,
        summary: output.summary,
        table: output.table,
        apparatus: output.apparatus,
    }))
}

/// List registered configs.
async fn list_configs_handler(State(state): State<AppState>) -> Json<ConfigListResponse> {
    let registry = state.config_registry.read();
    Json(ConfigListResponse {
        configs: registry.list(),
        default_config: state.default_ref(),
        registry_fingerprint: registry.fingerprint().to_string(),
    })
}

/// Register a new config.
///
/// Limits above the server's own are lowered before registering.
async fn register_config_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterConfigRequest>,
) -> Result<Json<ConfigRefResponse>, ApiError> {
    let config = effective_config(&state, &request.config)?;
    let config_ref = state.config_registry.write().register(config);
    Ok(Json(ConfigRefResponse { config_ref }))
}

/// Fetch a registered config by hash.
async fn get_config_handler(
    State(state): State<AppState>,
    Path(params_hash): Path<String>,
) -> Result<Json<ConfigResponse>, ApiError> {
    let registry = state.config_registry.read();
    let (config_ref, config) = registry.find_by_hash(&params_hash).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            "CONFIG_NOT_FOUND",
            format!("Config not found: {}", params_hash),
        )
    })?;
    Ok(Json(ConfigResponse {
        config_ref: config_ref.clone(),
        config: config.clone(),
    }))
}

/// Health check endpoint (detailed).
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry = state.config_registry.read();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: COLLATION_SCHEMA_VERSION.to_string(),
        config_count: registry.len(),
        registry_fingerprint: registry.fingerprint().to_string(),
    })
}

/// Liveness probe endpoint.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Ready once the default config is registered.
async fn readiness_handler(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let ready = state
        .config_registry
        .read()
        .resolve(&state.default_ref())
        .is_some();

    if ready {
        Ok(Json(ReadinessResponse {
            ready: true,
            details: None,
        }))
    } else {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                details: Some("Default config is not registered".to_string()),
            }),
        ))
    }
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the collation service.
pub fn create_router(state: ServiceState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/collate", post(collate_handler))
        // Config management
        .route("/api/configs", get(list_configs_handler).post(register_config_handler))
        .route("/api/configs/:params_hash", get(get_config_handler))
        // Health checks
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .layer(middleware::from_fn(metrics_middleware))
        .with_state(state)
}
