use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::config::AdminConfig;
use crate::http::server::AppState;

/// Accepts `Basic <user:password>` or `Bearer <api_key>` when configured.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let admin = &state.admin;
    if !admin.requires_auth() {
        return next.run(request).await;
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if let Some(auth_val) = auth_header {
        if is_authorized(admin, auth_val) {
            return next.run(request).await;
        }
    }

    tracing::warn!(path = %request.uri().path(), "Rejected admin request without valid credentials");
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, HeaderValue::from_static("Basic realm=\"frps-acl\""))],
    )
        .into_response()
}

fn is_authorized(admin: &AdminConfig, auth_val: &str) -> bool {
    if !admin.api_key.is_empty() && auth_val == format!("Bearer {}", admin.api_key) {
        return true;
    }
    if !admin.user.is_empty() {
        let expected = STANDARD.encode(format!("{}:{}", admin.user, admin.password));
        return auth_val == format!("Basic {}", expected);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin(user: &str, password: &str, api_key: &str) -> AdminConfig {
        AdminConfig {
            enabled: true,
            user: user.into(),
            password: password.into(),
            api_key: api_key.into(),
        }
    }

    #[test]
    fn test_basic_credentials() {
        let config = admin("admin", "secret", "");
        // base64("admin:secret")
        assert!(is_authorized(&config, "Basic YWRtaW46c2VjcmV0"));
        assert!(!is_authorized(&config, "Basic YWRtaW46d3Jvbmc="));
        assert!(!is_authorized(&config, "Bearer "));
    }

    #[test]
    fn test_bearer_key() {
        let config = admin("", "", "k3y");
        assert!(is_authorized(&config, "Bearer k3y"));
        assert!(!is_authorized(&config, "Bearer other"));
        assert!(!is_authorized(&config, "Basic Og=="));
    }
}
