use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::auth::{dto::PublicUser, extractors::CurrentUser};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::{MessageResponse, UpdatePasswordRequest, UpdateUserRequest};
use crate::users::services::{self, is_valid_email};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/:id",
            get(find_user).patch(update_user).delete(remove_user),
        )
        .route("/users/:id/password", put(update_password))
}

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = services::list_users(&state).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn find_user(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = services::find_user(&state, id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    if let Some(email) = payload.email.as_mut() {
        *email = email.trim().to_lowercase();
        if !is_valid_email(email) {
            warn!(email = %email, "invalid email");
            return Err(ApiError::Validation("invalid email".into()));
        }
    }

    let user = services::update_profile(&state, id, payload.into()).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if payload.new_password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::Validation("password too short".into()));
    }

    services::change_password(&state, id, &payload.current_password, &payload.new_password)
        .await?;
    Ok(Json(MessageResponse {
        message: "password updated".into(),
    }))
}

#[instrument(skip(state))]
pub async fn remove_user(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    services::remove_user(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::User;

    async fn caller(state: &AppState) -> CurrentUser {
        let user = services::register(state, "Root", "Admin", "root@example.com", "root-password")
            .await
            .expect("register caller");
        CurrentUser(user)
    }

    async fn target(state: &AppState) -> User {
        services::register(state, "Ada", "Lovelace", "ada@example.com", "ada-password")
            .await
            .expect("register target")
    }

    #[tokio::test]
    async fn remove_returns_no_content_even_for_missing_ids() {
        let state = AppState::fake();
        let auth = caller(&state).await;
        let status = remove_user(State(state), auth, Path(Uuid::new_v4()))
            .await
            .expect("remove");
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn update_user_rejects_invalid_email() {
        let state = AppState::fake();
        let auth = caller(&state).await;
        let user = target(&state).await;
        let err = update_user(
            State(state),
            auth,
            Path(user.id),
            Json(UpdateUserRequest {
                first_name: None,
                last_name: None,
                email: Some("not-an-email".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn update_password_rejects_short_replacement() {
        let state = AppState::fake();
        let auth = caller(&state).await;
        let user = target(&state).await;
        let err = update_password(
            State(state),
            auth,
            Path(user.id),
            Json(UpdatePasswordRequest {
                current_password: "ada-password".into(),
                new_password: "short".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn list_users_serializes_public_fields_only() {
        let state = AppState::fake();
        let auth = caller(&state).await;
        target(&state).await;
        let Json(users) = list_users(State(state), auth).await.expect("list");
        assert_eq!(users.len(), 2);
        let json = serde_json::to_string(&users).unwrap();
        assert!(!json.contains("password"));
    }
}
