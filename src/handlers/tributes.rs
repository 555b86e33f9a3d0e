use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{owned_memorial, published_memorial};
use crate::{
    AppState,
    auth::AuthUser,
    email,
    error::{ApiError, ApiResult, ErrorBody},
    extract::ApiJson,
    models::{CreateTributeRequest, Memorial, Pagination, Tribute},
};

/// list_tributes
///
/// [Public Route] Approved tributes of a published memorial, newest first.
#[utoipa::path(
    get,
    path = "/memorials/{id}/tributes",
    params(("id" = Uuid, Path, description = "Memorial ID"), Pagination),
    responses(
        (status = 200, description = "Approved tributes", body = [Tribute]),
        (status = 404, description = "Memorial not found", body = ErrorBody)
    )
)]
pub async fn list_tributes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Tribute>>> {
    published_memorial(&state, id).await?;
    Ok(Json(state.repo.list_tributes(id, true, page).await?))
}

/// create_tribute
///
/// [Public Route] Visitors leave a tribute. It stays hidden until the owner approves it; the
/// owner is notified by email, and a failed notification never fails the request.
#[utoipa::path(
    post,
    path = "/memorials/{id}/tributes",
    params(("id" = Uuid, Path, description = "Memorial ID")),
    request_body = CreateTributeRequest,
    responses(
        (status = 201, description = "Awaiting approval", body = Tribute),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 404, description = "Memorial not found", body = ErrorBody)
    )
)]
pub async fn create_tribute(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<CreateTributeRequest>,
) -> ApiResult<(StatusCode, Json<Tribute>)> {
    payload.validate()?;
    let memorial = published_memorial(&state, id).await?;
    let tribute = state.repo.create_tribute(id, None, payload).await?;

    notify_owner(&state, &memorial, &tribute).await;
    Ok((StatusCode::CREATED, Json(tribute)))
}

async fn notify_owner(state: &AppState, memorial: &Memorial, tribute: &Tribute) {
    let owner = match state.repo.get_profile(memorial.owner_id).await {
        Ok(Some(owner)) => owner,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(memorial_id = %memorial.id, "owner lookup for notification failed: {:?}", e);
            return;
        }
    };

    let message =
        email::new_tribute_email(&owner.email, memorial, tribute, &state.config.public_site_url);
    if let Err(e) = state.email.send(message).await {
        tracing::warn!(tribute_id = %tribute.id, "tribute notification not sent: {}", e);
    }
}

/// list_all_tributes
///
/// [Authenticated Route] Every tribute on a memorial, pending ones included, for moderation.
#[utoipa::path(
    get,
    path = "/memorials/{id}/tributes/all",
    params(("id" = Uuid, Path, description = "Memorial ID"), Pagination),
    responses(
        (status = 200, description = "All tributes", body = [Tribute]),
        (status = 403, description = "Not the owner", body = ErrorBody)
    )
)]
pub async fn list_all_tributes(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Tribute>>> {
    owned_memorial(&state, id, &user).await?;
    Ok(Json(state.repo.list_tributes(id, false, page).await?))
}

/// set_tribute_approval
///
/// [Authenticated Route] Body is a bare JSON boolean: `true` shows the tribute, `false` hides it.
#[utoipa::path(
    put,
    path = "/tributes/{id}/approval",
    params(("id" = Uuid, Path, description = "Tribute ID")),
    request_body = bool,
    responses(
        (status = 200, description = "Updated", body = Tribute),
        (status = 403, description = "Not the memorial owner", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn set_tribute_approval(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(approved): ApiJson<bool>,
) -> ApiResult<Json<Tribute>> {
    let tribute = state
        .repo
        .get_tribute(id)
        .await?
        .ok_or(ApiError::NotFound("tribute"))?;
    owned_memorial(&state, tribute.memorial_id, &user).await?;

    state
        .repo
        .set_tribute_approval(id, approved)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("tribute"))
}

#[utoipa::path(
    delete,
    path = "/tributes/{id}",
    params(("id" = Uuid, Path, description = "Tribute ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the memorial owner", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_tribute(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let tribute = state
        .repo
        .get_tribute(id)
        .await?
        .ok_or(ApiError::NotFound("tribute"))?;
    owned_memorial(&state, tribute.memorial_id, &user).await?;

    if state.repo.delete_tribute(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("tribute"))
    }
}
