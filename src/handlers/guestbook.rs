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
    error::{ApiError, ApiResult, ErrorBody},
    extract::ApiJson,
    models::{CreateGuestbookEntryRequest, GuestbookEntry, Pagination},
};

#[utoipa::path(
    get,
    path = "/memorials/{id}/guestbook",
    params(("id" = Uuid, Path, description = "Memorial ID"), Pagination),
    responses(
        (status = 200, description = "Guestbook entries", body = [GuestbookEntry]),
        (status = 404, description = "Memorial not found", body = ErrorBody)
    )
)]
pub async fn list_guestbook(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<GuestbookEntry>>> {
    published_memorial(&state, id).await?;
    Ok(Json(state.repo.list_guestbook_entries(id, page).await?))
}

/// sign_guestbook
///
/// [Public Route] Entries are visible immediately; owners remove unwanted ones afterwards.
#[utoipa::path(
    post,
    path = "/memorials/{id}/guestbook",
    params(("id" = Uuid, Path, description = "Memorial ID")),
    request_body = CreateGuestbookEntryRequest,
    responses(
        (status = 201, description = "Signed", body = GuestbookEntry),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 404, description = "Memorial not found", body = ErrorBody)
    )
)]
pub async fn sign_guestbook(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<CreateGuestbookEntryRequest>,
) -> ApiResult<(StatusCode, Json<GuestbookEntry>)> {
    payload.validate()?;
    published_memorial(&state, id).await?;
    let entry = state.repo.create_guestbook_entry(id, payload).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// [Authenticated Route] Owner removes a guestbook entry.
#[utoipa::path(
    delete,
    path = "/guestbook/{id}",
    params(("id" = Uuid, Path, description = "Guestbook entry ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the memorial owner", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_guestbook_entry(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let entry = state
        .repo
        .get_guestbook_entry(id)
        .await?
        .ok_or(ApiError::NotFound("guestbook entry"))?;
    owned_memorial(&state, entry.memorial_id, &user).await?;

    if state.repo.delete_guestbook_entry(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("guestbook entry"))
    }
}
