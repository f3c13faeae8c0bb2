//! Bearer-token authentication for protected gateway routes.

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

#[derive(Clone)]
pub struct AuthState {
    pub token: String,
}

impl AuthState {
    fn accepts(&self, presented: &str) -> bool {
        bool::from(presented.as_bytes().ct_eq(self.token.as_bytes()))
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    let value = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
}

/// Reject requests whose `Authorization: Bearer` token does not match.
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    match bearer_token(&request) {
        Some(token) if auth.accepts(token) => next.run(request).await,
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "rejected request with invalid token");
            (StatusCode::UNAUTHORIZED, "Invalid auth token").into_response()
        }
        None => (StatusCode::UNAUTHORIZED, "Missing auth token").into_response(),
    }
}
