use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use super::owned_memorial;
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiResult, ErrorBody},
    models::MemorialAnalytics,
};

/// get_memorial_analytics
///
/// [Authenticated Route] View counter plus engagement totals for one memorial.
#[utoipa::path(
    get,
    path = "/memorials/{id}/analytics",
    params(("id" = Uuid, Path, description = "Memorial ID")),
    responses(
        (status = 200, description = "Analytics", body = MemorialAnalytics),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn get_memorial_analytics(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MemorialAnalytics>> {
    owned_memorial(&state, id, &user).await?;
    Ok(Json(state.repo.get_analytics(id).await?))
}
