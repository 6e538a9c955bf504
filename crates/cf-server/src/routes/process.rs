//! `POST /process` and `POST /batch`.
//!
//! Both always answer 200 with a [`ProcessResponse`]; a failed job is
//! `success: false` with the error message.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use cf_core::wire::{BatchRequest, ProcessRequest, ProcessResponse, WireOperation};
use cf_core::MediaReference;
use cf_pipeline::JobResult;

use crate::context::AppContext;
use crate::error::AppError;

const BATCH_OPERATION: &str = "batch";

/// `POST /process`
pub async fn process(
    State(ctx): State<AppContext>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<ProcessResponse>, AppError> {
    let Json(request) = payload?;
    tracing::info!(video_url = %request.video_url, operation = %request.operation, "process request");

    let source = MediaReference::from_url(request.video_url);
    let wire = WireOperation {
        op_type: request.operation.clone(),
        parameters: request.parameters,
        order: 0,
    };
    let result = ctx
        .orchestrator
        .execute_wire_batch(&source, std::slice::from_ref(&wire))
        .await;

    Ok(Json(to_response(result, request.operation)))
}

/// `POST /batch`
pub async fn batch(
    State(ctx): State<AppContext>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<ProcessResponse>, AppError> {
    let Json(request) = payload?;
    tracing::info!(
        video_url = %request.video_url,
        operations = request.operations.len(),
        "batch request"
    );

    let source = MediaReference::from_url(request.video_url);
    let result = ctx
        .orchestrator
        .execute_wire_batch(&source, &request.operations)
        .await;

    Ok(Json(to_response(result, BATCH_OPERATION.into())))
}

fn to_response(result: JobResult, operation: String) -> ProcessResponse {
    if result.success {
        ProcessResponse {
            success: true,
            video_url: result.result_url,
            error: None,
            processing_time_ms: result.duration_ms,
            operation,
        }
    } else {
        ProcessResponse {
            success: false,
            video_url: None,
            error: Some(result.message),
            processing_time_ms: result.duration_ms,
            operation,
        }
    }
}
