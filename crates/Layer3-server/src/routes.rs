//! Route handlers and JSON envelopes

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use stackd_exec::{OperationError, OperationOutcome};
use stackd_foundation::{
    DestroyRequest, Error, OperationResult, ProvisionRequest, StopRequest,
};
use tracing::error;

use crate::server::AppState;
use crate::validate;

#[derive(Serialize)]
struct OperationResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    result: OperationResult,
}

pub async fn provision(
    State(state): State<AppState>,
    payload: Result<Json<ProvisionRequest>, JsonRejection>,
) -> Response {
    let req = match decode(payload) {
        Ok(req) => req,
        Err(response) => return response,
    };
    if let Err(err) = validate::provision(&req, &state.config) {
        return client_error(StatusCode::BAD_REQUEST, &validation_message(&err));
    }

    let outcome = run_bounded(&state, state.executor.provision(&req)).await;
    match outcome {
        Ok(result) => completed(result),
        Err(failure) => {
            error!(
                error = %failure.source,
                project_id = req.project_id,
                project_ref = %req.project_ref,
                "provision failed"
            );
            failed(failure)
        }
    }
}

pub async fn stop(
    State(state): State<AppState>,
    payload: Result<Json<StopRequest>, JsonRejection>,
) -> Response {
    let req = match decode(payload) {
        Ok(req) => req,
        Err(response) => return response,
    };
    if let Err(err) = validate::stop(&req, &state.config) {
        return client_error(StatusCode::BAD_REQUEST, &validation_message(&err));
    }

    let outcome = run_bounded(&state, state.executor.stop(&req)).await;
    match outcome {
        Ok(result) => completed(result),
        Err(failure) => {
            error!(error = %failure.source, project_ref = %req.project_ref, "stop failed");
            failed(failure)
        }
    }
}

pub async fn destroy(
    State(state): State<AppState>,
    payload: Result<Json<DestroyRequest>, JsonRejection>,
) -> Response {
    let req = match decode(payload) {
        Ok(req) => req,
        Err(response) => return response,
    };
    if let Err(err) = validate::destroy(&req, &state.config) {
        return client_error(StatusCode::BAD_REQUEST, &validation_message(&err));
    }

    let outcome = run_bounded(&state, state.executor.destroy(&req)).await;
    match outcome {
        Ok(result) => completed(result),
        Err(failure) => {
            error!(error = %failure.source, project_ref = %req.project_ref, "destroy failed");
            failed(failure)
        }
    }
}

pub async fn healthz() -> Response {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))).into_response()
}

/// Bound an executor call with the configured command timeout.
///
/// The executor keeps its gate until the runner returns even if this
/// deadline fires first; the handler just stops waiting.
async fn run_bounded<F>(state: &AppState, operation: F) -> OperationOutcome
where
    F: std::future::Future<Output = OperationOutcome>,
{
    match state.config.operation_timeout() {
        Some(limit) => match tokio::time::timeout(limit, operation).await {
            Ok(outcome) => outcome,
            Err(_) => Err(OperationError {
                source: Error::Timeout(format!(
                    "operation did not finish within {}s",
                    limit.as_secs()
                )),
                result: OperationResult::default(),
            }),
        },
        None => operation.await,
    }
}

fn decode<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => Err(client_error(
            StatusCode::PAYLOAD_TOO_LARGE,
            "request body too large",
        )),
        Err(_) => Err(client_error(StatusCode::BAD_REQUEST, "invalid json payload")),
    }
}

fn validation_message(err: &Error) -> String {
    match err {
        Error::Validation(message) => message.clone(),
        other => other.to_string(),
    }
}

fn completed(result: OperationResult) -> Response {
    (
        StatusCode::OK,
        Json(OperationResponse {
            status: "completed",
            error: None,
            result,
        }),
    )
        .into_response()
}

fn failed(failure: OperationError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(OperationResponse {
            status: "failed",
            error: Some(failure.source.to_string()),
            result: failure.result,
        }),
    )
        .into_response()
}

pub(crate) fn client_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({"error": message}))).into_response()
}
