pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use crate::http::server::AppState;
use self::handlers::*;
use self::auth::admin_auth_middleware;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/tokens", get(query_tokens))
        .route("/add", post(add_user))
        .route("/update", post(update_user))
        .route("/remove", post(remove_users))
        .route("/disable", post(disable_users))
        .route("/enable", post(enable_users))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
