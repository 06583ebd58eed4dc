//! Handlers for the signed-in user's own account.

use axum::Json;
use gatehouse_db::models::user::UserResponse;

use crate::middleware::identity::RequireUser;
use crate::response::DataResponse;

/// GET /users/me
pub async fn me(RequireUser(user): RequireUser) -> Json<DataResponse<UserResponse>> {
    Json(DataResponse {
        data: UserResponse::from(&user),
    })
}
