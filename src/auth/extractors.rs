use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::{repo_types::User, services};

/// Request guard: extracts the bearer token, verifies it and resolves the
/// claimed identity against the store. The resolved user is carried into
/// the handler for this call only.
#[derive(Debug)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        // Expect "Bearer <token>"; a missing or malformed header is the same
        // failure as a bad token
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "token rejected");
            ApiError::Unauthorized
        })?;

        // A token referencing a deleted user grants nothing
        match services::find_user(state, claims.sub).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(ApiError::NotFound) => {
                warn!(user_id = %claims.sub, "token for unknown user");
                Err(ApiError::Unauthorized)
            }
            Err(e) => Err(e),
        }
    }
}
