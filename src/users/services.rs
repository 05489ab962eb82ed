use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo_types::{NewUser, User, UserPatch};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Create a new account. The pre-check gives a friendly `Conflict` before
/// paying the hash cost; the store's uniqueness constraint is the arbiter
/// when two registrations race.
pub async fn register(
    state: &AppState,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
) -> Result<User, ApiError> {
    if state.store.find_by_email(email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict);
    }

    let hash = hash_password(&state.config.hash, password).map_err(ApiError::internal)?;
    let user = state
        .store
        .insert(NewUser {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            password_hash: hash,
        })
        .await?;
    Ok(user)
}

/// Verify credentials and issue a bearer token bound to {id, email}.
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<String, ApiError> {
    let Some(user) = state.store.find_by_email(email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::Unauthorized);
    };

    let ok = verify_password(password, &user.password_hash).map_err(ApiError::internal)?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized);
    }

    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(user.id, &user.email).map_err(ApiError::internal)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

pub async fn list_users(state: &AppState) -> Result<Vec<User>, ApiError> {
    Ok(state.store.list().await?)
}

/// Apply provided non-identity, non-password fields only.
pub async fn update_profile(
    state: &AppState,
    id: Uuid,
    patch: UserPatch,
) -> Result<User, ApiError> {
    let user = state.store.update(id, patch).await?.ok_or(ApiError::NotFound)?;
    info!(user_id = %user.id, "profile updated");
    Ok(user)
}

pub async fn change_password(
    state: &AppState,
    id: Uuid,
    current_password: &str,
    new_password: &str,
) -> Result<(), ApiError> {
    let user = state.store.find_by_id(id).await?.ok_or(ApiError::NotFound)?;

    let ok = verify_password(current_password, &user.password_hash).map_err(ApiError::internal)?;
    if !ok {
        warn!(user_id = %id, "password change with wrong current password");
        return Err(ApiError::Unauthorized);
    }

    let hash = hash_password(&state.config.hash, new_password).map_err(ApiError::internal)?;
    if !state.store.update_password(id, &hash).await? {
        // Deleted between the read and the write
        return Err(ApiError::NotFound);
    }
    info!(user_id = %id, "password updated");
    Ok(())
}

pub async fn find_user(state: &AppState, id: Uuid) -> Result<User, ApiError> {
    state.store.find_by_id(id).await?.ok_or(ApiError::NotFound)
}

/// Removal is terminal; deleting a missing id is treated as success.
pub async fn remove_user(state: &AppState, id: Uuid) -> Result<(), ApiError> {
    state.store.delete(id).await?;
    info!(user_id = %id, "user removed");
    Ok(())
}
