//! HTTP endpoint frps posts plugin requests to.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response as HttpResponse},
    Json,
};
use serde::Serialize;
use tokio::task::JoinError;

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::plugin::{PluginError, Request};

/// Error body returned with non-200 statuses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub msg: String,
}

impl IntoResponse for PluginError {
    fn into_response(self) -> HttpResponse {
        (self.status(), Json(ErrorBody { msg: self.to_string() })).into_response()
    }
}

pub async fn handle_plugin(
    State(state): State<AppState>,
    payload: Result<Json<Request>, JsonRejection>,
) -> HttpResponse {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            let err = PluginError::Malformed(rejection.body_text());
            tracing::warn!(outcome = "error", error = %err, "Plugin request");
            metrics::record_plugin_request("unknown", "error");
            return err.into_response();
        }
    };

    // Evaluation takes the store's read lock, which an admin save may hold
    // across a file write; keep that wait off the async workers.
    let dispatcher = state.dispatcher.clone();
    let span = tracing::Span::current();
    let evaluate = move || span.in_scope(|| dispatcher.handle(request));
    let result = match tokio::task::spawn_blocking(evaluate).await {
        Ok(result) => result,
        Err(e) => {
            let err = task_failed(e);
            tracing::error!(outcome = "error", error = %err, "Plugin request");
            metrics::record_plugin_request("unknown", "error");
            Err(err)
        }
    };

    match result {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}

fn task_failed(e: JoinError) -> PluginError {
    PluginError::Internal(format!("policy task failed: {}", e))
}
