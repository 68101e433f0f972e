//! Login endpoint.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::warn;

use crate::error::AuthError;

use super::types::{LoginRequest, SessionResponse};
use super::workflow::AuthWorkflow;

/// Shared response for unknown users and wrong passwords so callers cannot
/// enumerate accounts. The two stay distinct kinds in the logs.
pub(super) const LOGIN_REJECTED: &str = "Incorrect username or password";

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = SessionResponse),
        (status = 401, description = "Incorrect credentials or unconfirmed email", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    workflow: Extension<Arc<AuthWorkflow>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match workflow.login(&request.login_name, &request.password).await {
        Ok(grant) => {
            let response = SessionResponse {
                first_name: grant.user.first_name,
                last_name: grant.user.last_name,
                session_token: grant.token,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err @ (AuthError::UserNotFound | AuthError::BadCredentials)) => {
            warn!(kind = %err, "login rejected");
            (StatusCode::UNAUTHORIZED, LOGIN_REJECTED.to_string()).into_response()
        }
        Err(err) => err.into_response(),
    }
}
