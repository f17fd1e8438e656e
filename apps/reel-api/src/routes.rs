use axum::{
	Json, Router,
	extract::{Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use reel_service::{
	AllHistoryResponse, CreateQueryRequest, CreateQueryResponse, HistoryResponse, ServiceError,
	SessionInfo, SessionResponse,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	let permissive_cors = state.service.cfg.security.permissive_cors;
	let mut router = Router::new()
		.route("/health", get(health))
		.route("/api/sessions", post(create_session).get(list_sessions))
		.route("/api/queries", post(create_query))
		.route("/api/history", get(history))
		.route("/api/history/all", get(all_history))
		.layer(TraceLayer::new_for_http());

	if permissive_cors {
		router = router.layer(CorsLayer::permissive());
	}

	router.with_state(state)
}

#[derive(Debug, Deserialize)]
struct SessionParam {
	session: Uuid,
}

#[derive(Debug, Serialize)]
struct HealthBody {
	status: &'static str,
	database: &'static str,
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthBody>) {
	match state.service.ping().await {
		Ok(()) =>
			(StatusCode::OK, Json(HealthBody { status: "healthy", database: "connected" })),
		Err(err) => {
			tracing::error!(error = %err, "Health check failed.");

			(
				StatusCode::SERVICE_UNAVAILABLE,
				Json(HealthBody { status: "unhealthy", database: "error" }),
			)
		},
	}
}

async fn create_session(
	State(state): State<AppState>,
) -> Result<Json<SessionResponse>, ApiError> {
	let response = state.service.create_session().await?;
	Ok(Json(response))
}

async fn list_sessions(
	State(state): State<AppState>,
) -> Result<Json<Vec<SessionInfo>>, ApiError> {
	let response = state.service.list_sessions().await?;
	Ok(Json(response))
}

async fn create_query(
	State(state): State<AppState>,
	Query(params): Query<SessionParam>,
	Json(payload): Json<CreateQueryRequest>,
) -> Result<Json<CreateQueryResponse>, ApiError> {
	let response = state.service.create_query(params.session, payload).await?;
	Ok(Json(response))
}

async fn history(
	State(state): State<AppState>,
	Query(params): Query<SessionParam>,
) -> Result<Json<HistoryResponse>, ApiError> {
	let response = state.service.history(params.session).await?;
	Ok(Json(response))
}

async fn all_history(
	State(state): State<AppState>,
) -> Result<Json<AllHistoryResponse>, ApiError> {
	let response = state.service.all_history().await?;
	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "invalid_request", message),
			ServiceError::NotFound { message } =>
				ApiError::new(StatusCode::NOT_FOUND, "not_found", message),
			// Upstream detail stays in the logs; callers get a generic failure.
			ServiceError::Provider { message } | ServiceError::VectorSearch { message } => {
				tracing::error!(error = %message, "Retrieval failed.");

				ApiError::new(StatusCode::BAD_GATEWAY, "retrieval_failure", "Failed to create query.")
			},
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Storage operation failed.");

				ApiError::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"storage_failure",
					"Failed to create query.",
				)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
