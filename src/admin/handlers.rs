use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};

use crate::acl::{AclError, AclResult, AclStore, OperationCode, UserFilter, UserForm};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::storage::StorageError;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub users: usize,
}

/// Result of an admin mutation. Always sent with HTTP 200.
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationResponse {
    pub success: bool,
    pub code: u8,
    pub message: String,
}

/// Listing result in the shape the admin table widget expects.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub code: u8,
    #[serde(rename = "msg")]
    pub message: String,
    #[serde(rename = "count")]
    pub total_count: usize,
    #[serde(rename = "data")]
    pub results: Vec<UserForm>,
}

/// Query string of `GET /tokens`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenSearch {
    pub user: String,
    pub token: String,
    pub comment: String,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TokenUpdate {
    pub before: UserForm,
    pub after: UserForm,
}

#[derive(Debug, Deserialize)]
pub struct UserRef {
    pub user: String,
}

/// Body of remove / enable / disable.
#[derive(Debug, Deserialize)]
pub struct UserSelection {
    pub users: Vec<UserRef>,
}

impl UserSelection {
    fn ids(&self) -> Vec<String> {
        self.users.iter().map(|u| u.user.clone()).collect()
    }
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        users: state.store.len(),
    })
}

pub async fn query_tokens(
    State(state): State<AppState>,
    search: Result<Query<TokenSearch>, QueryRejection>,
) -> Json<TokenResponse> {
    let Query(search) = match search {
        Ok(q) => q,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "query tokens failed, param error");
            return Json(TokenResponse {
                code: OperationCode::ParamError as u8,
                message: "query tokens failed, param error".to_string(),
                total_count: 0,
                results: Vec::new(),
            });
        }
    };

    let filter = UserFilter {
        user: search.user,
        token: search.token,
        comment: search.comment,
    };
    let page = state
        .store
        .list(&filter, search.page.unwrap_or(1), search.limit.unwrap_or(0));

    Json(TokenResponse {
        code: OperationCode::Success as u8,
        message: "query tokens success".to_string(),
        total_count: page.total,
        results: page.results.iter().map(|r| r.to_form()).collect(),
    })
}

pub async fn add_user(
    State(state): State<AppState>,
    payload: Result<Json<UserForm>, JsonRejection>,
) -> Json<OperationResponse> {
    let Json(form) = match payload {
        Ok(p) => p,
        Err(rejection) => return param_error("add", "user add", &rejection),
    };
    let users = form.user.clone();
    let result = run_blocking(&state, move |store| store.add(&form)).await;
    respond("add", "user add", &users, result)
}

pub async fn update_user(
    State(state): State<AppState>,
    payload: Result<Json<TokenUpdate>, JsonRejection>,
) -> Json<OperationResponse> {
    let Json(update) = match payload {
        Ok(p) => p,
        Err(rejection) => return param_error("update", "user update", &rejection),
    };
    let users = update.before.user.clone();
    let result = run_blocking(&state, move |store| store.update(&update.before, &update.after)).await;
    respond("update", "user update", &users, result)
}

pub async fn remove_users(
    State(state): State<AppState>,
    payload: Result<Json<UserSelection>, JsonRejection>,
) -> Json<OperationResponse> {
    let Json(selection) = match payload {
        Ok(p) => p,
        Err(rejection) => return param_error("remove", "user remove", &rejection),
    };
    let ids = selection.ids();
    let users = ids.join(",");
    let result = run_blocking(&state, move |store| store.remove(&ids)).await;
    respond("remove", "user remove", &users, result)
}

pub async fn disable_users(
    State(state): State<AppState>,
    payload: Result<Json<UserSelection>, JsonRejection>,
) -> Json<OperationResponse> {
    set_enabled(state, payload, false).await
}

pub async fn enable_users(
    State(state): State<AppState>,
    payload: Result<Json<UserSelection>, JsonRejection>,
) -> Json<OperationResponse> {
    set_enabled(state, payload, true).await
}

async fn set_enabled(
    state: AppState,
    payload: Result<Json<UserSelection>, JsonRejection>,
    enabled: bool,
) -> Json<OperationResponse> {
    let (op, action) = if enabled {
        ("enable", "user enable")
    } else {
        ("disable", "user disable")
    };
    let Json(selection) = match payload {
        Ok(p) => p,
        Err(rejection) => return param_error(op, action, &rejection),
    };
    let ids = selection.ids();
    let users = ids.join(",");
    let result = run_blocking(&state, move |store| store.set_enabled(&ids, enabled)).await;
    respond(op, action, &users, result)
}

/// Store mutations write the token file; keep that off the async workers.
async fn run_blocking<F>(state: &AppState, f: F) -> AclResult<()>
where
    F: FnOnce(&AclStore) -> AclResult<()> + Send + 'static,
{
    let store = state.store.clone();
    match tokio::task::spawn_blocking(move || f(&store)).await {
        Ok(result) => result,
        Err(e) => Err(AclError::Save(StorageError::Rejected(format!(
            "save task aborted: {}",
            e
        )))),
    }
}

fn respond(
    op: &'static str,
    action: &str,
    users: &str,
    result: AclResult<()>,
) -> Json<OperationResponse> {
    match result {
        Ok(()) => {
            tracing::info!(op, users, code = OperationCode::Success.as_str(), "{} success", action);
            metrics::record_admin_operation(op, OperationCode::Success.as_str());
            Json(OperationResponse {
                success: true,
                code: OperationCode::Success as u8,
                message: format!("{} success", action),
            })
        }
        Err(e) => {
            let code = e.code();
            tracing::warn!(op, users, code = code.as_str(), error = %e, "{} failed", action);
            metrics::record_admin_operation(op, code.as_str());
            Json(OperationResponse {
                success: false,
                code: code as u8,
                message: format!("{} failed, {}", action, e),
            })
        }
    }
}

fn param_error(op: &'static str, action: &str, rejection: &JsonRejection) -> Json<OperationResponse> {
    tracing::warn!(op, error = %rejection.body_text(), "{} failed, param error", action);
    metrics::record_admin_operation(op, OperationCode::ParamError.as_str());
    Json(OperationResponse {
        success: false,
        code: OperationCode::ParamError as u8,
        message: format!("{} failed, param error", action),
    })
}
