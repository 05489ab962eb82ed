use serde::{Deserialize, Serialize};

use crate::users::repo_types::UserPatch;

/// Partial profile update; password and created_at are not updatable here.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl From<UpdateUserRequest> for UserPatch {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
        }
    }
}

/// Request body for a password change.
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Confirmation body for operations without a record to return.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
