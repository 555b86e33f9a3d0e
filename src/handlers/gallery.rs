use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{owned_memorial, published_memorial, with_url};
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, ErrorBody},
    extract::ApiJson,
    models::{CreateMediaRequest, Media, UploadUrlRequest, UploadUrlResponse},
    storage::{self, ALLOWED_CONTENT_TYPES},
};

#[utoipa::path(
    get,
    path = "/memorials/{id}/gallery",
    params(("id" = Uuid, Path, description = "Memorial ID")),
    responses(
        (status = 200, description = "Gallery items with display URLs", body = [Media]),
        (status = 404, description = "Memorial not found", body = ErrorBody)
    )
)]
pub async fn list_gallery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Media>>> {
    published_memorial(&state, id).await?;
    let media = state
        .repo
        .list_media(id)
        .await?
        .into_iter()
        .map(|m| with_url(state.storage.as_ref(), m))
        .collect();
    Ok(Json(media))
}

/// create_upload_url
///
/// [Authenticated Route] Step 1 of a gallery upload.
///
/// Checks the owner's plan (video allowed, gallery not full) before signing, so a rejected
/// upload never reaches the bucket. The client then PUTs the file to `upload_url` with the
/// same `Content-Type`, and registers it with `add_media`.
#[utoipa::path(
    post,
    path = "/memorials/{id}/gallery/upload-url",
    params(("id" = Uuid, Path, description = "Memorial ID")),
    request_body = UploadUrlRequest,
    responses(
        (status = 200, description = "Signed upload URL", body = UploadUrlResponse),
        (status = 400, description = "Unsupported content type", body = ErrorBody),
        (status = 403, description = "Not the owner or plan limit reached", body = ErrorBody)
    )
)]
pub async fn create_upload_url(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<UploadUrlRequest>,
) -> ApiResult<Json<UploadUrlResponse>> {
    let memorial = owned_memorial(&state, id, &user).await?;

    let (media_type, extension) =
        storage::classify_content_type(&payload.content_type).ok_or_else(|| {
            let allowed: Vec<&str> = ALLOWED_CONTENT_TYPES.iter().map(|(ct, _, _)| *ct).collect();
            ApiError::validation(format!(
                "content_type must be one of: {}",
                allowed.join(", ")
            ))
        })?;

    let limits = state.repo.get_plan_limits(memorial.owner_id).await?;
    let current = state.repo.count_media(id).await?;
    limits.check_media_quota(media_type, current)?;

    let storage_key = storage::gallery_object_key(id, extension);
    let upload_url = state
        .storage
        .get_presigned_upload_url(&storage_key, &payload.content_type)
        .await?;

    tracing::debug!(memorial_id = %id, filename = %payload.filename, key = %storage_key, "issued upload url");
    Ok(Json(UploadUrlResponse {
        upload_url,
        storage_key,
        media_type: media_type.to_string(),
    }))
}

/// add_media
///
/// [Authenticated Route] Step 2 of a gallery upload: records an uploaded object. Quota is
/// checked again since several upload URLs can be outstanding at once.
#[utoipa::path(
    post,
    path = "/memorials/{id}/gallery",
    params(("id" = Uuid, Path, description = "Memorial ID")),
    request_body = CreateMediaRequest,
    responses(
        (status = 201, description = "Added", body = Media),
        (status = 400, description = "Key outside this memorial or bad media type", body = ErrorBody),
        (status = 403, description = "Not the owner or plan limit reached", body = ErrorBody)
    )
)]
pub async fn add_media(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<CreateMediaRequest>,
) -> ApiResult<(StatusCode, Json<Media>)> {
    payload.validate(id)?;
    let memorial = owned_memorial(&state, id, &user).await?;

    let limits = state.repo.get_plan_limits(memorial.owner_id).await?;
    let current = state.repo.count_media(id).await?;
    limits.check_media_quota(&payload.media_type, current)?;

    let media = state.repo.create_media(id, user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(with_url(state.storage.as_ref(), media))))
}

/// delete_media
///
/// [Authenticated Route] Removes the row, then the object. A leftover object is only logged.
#[utoipa::path(
    delete,
    path = "/gallery/{id}",
    params(("id" = Uuid, Path, description = "Media ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the memorial owner", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_media(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let media = state
        .repo
        .get_media(id)
        .await?
        .ok_or(ApiError::NotFound("media"))?;
    owned_memorial(&state, media.memorial_id, &user).await?;

    if !state.repo.delete_media(id).await? {
        return Err(ApiError::NotFound("media"));
    }
    if let Err(e) = state.storage.delete_object(&media.storage_key).await {
        tracing::warn!(key = %media.storage_key, "orphaned gallery object: {}", e);
    }
    Ok(StatusCode::NO_CONTENT)
}
