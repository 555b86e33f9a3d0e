use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{owned_memorial, published_memorial, with_url};
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, ErrorBody},
    extract::ApiJson,
    models::{
        CreateMemorialRequest, Memorial, MemorialFilter, MemorialPage, Pagination, QrCodeResponse,
        STATUS_SUSPENDED, UpdateMemorialRequest,
    },
    qr, slug,
};

const PAGE_TRIBUTES: i64 = 20;
const PAGE_CANDLES: i64 = 10;
const PAGE_GUESTBOOK: i64 = 20;

/// create_memorial
///
/// [Authenticated Route] Creates a memorial owned by the caller.
///
/// Order of checks: body validation, then the plan's memorial quota, then slug allocation.
/// An insert that loses a slug race is retried once under a random suffix.
#[utoipa::path(
    post,
    path = "/memorials",
    request_body = CreateMemorialRequest,
    responses(
        (status = 201, description = "Created", body = Memorial),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 403, description = "Plan limit reached", body = ErrorBody)
    )
)]
pub async fn create_memorial(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateMemorialRequest>,
) -> ApiResult<(StatusCode, Json<Memorial>)> {
    payload.validate()?;

    let limits = state.repo.get_plan_limits(user.id).await?;
    limits.check_memorial_quota()?;

    let slug = slug::unique_slug(state.repo.as_ref(), &payload.full_name).await?;
    let memorial = match state.repo.create_memorial(user.id, &slug, payload.clone()).await {
        Err(e) if slug::is_slug_conflict(&e) => {
            let retry = slug::random_slug(&slug::slugify(&payload.full_name));
            tracing::debug!(taken = %slug, retry = %retry, "slug claimed concurrently, retrying");
            state.repo.create_memorial(user.id, &retry, payload).await?
        }
        other => other?,
    };

    tracing::info!(memorial_id = %memorial.id, slug = %memorial.slug, "memorial created");
    Ok((StatusCode::CREATED, Json(memorial)))
}

/// list_memorials
///
/// [Public Route] Published memorials, newest first, with optional search.
#[utoipa::path(
    get,
    path = "/memorials",
    params(MemorialFilter),
    responses((status = 200, description = "Published memorials", body = [Memorial]))
)]
pub async fn list_memorials(
    State(state): State<AppState>,
    Query(filter): Query<MemorialFilter>,
) -> ApiResult<Json<Vec<Memorial>>> {
    let page = filter.pagination();
    let memorials = state
        .repo
        .list_published_memorials(filter.search, page)
        .await?;
    Ok(Json(memorials))
}

/// get_memorial
///
/// [Public Route] A single published memorial.
#[utoipa::path(
    get,
    path = "/memorials/{id}",
    params(("id" = Uuid, Path, description = "Memorial ID")),
    responses(
        (status = 200, description = "Found", body = Memorial),
        (status = 404, description = "Missing or not published", body = ErrorBody)
    )
)]
pub async fn get_memorial(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Memorial>> {
    Ok(Json(published_memorial(&state, id).await?))
}

/// get_my_memorials
///
/// [Authenticated Route] All of the caller's memorials, drafts and suspended included.
#[utoipa::path(
    get,
    path = "/me/memorials",
    responses((status = 200, description = "My memorials", body = [Memorial]))
)]
pub async fn get_my_memorials(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Memorial>>> {
    Ok(Json(state.repo.list_memorials_by_owner(user.id).await?))
}

/// update_memorial
///
/// [Authenticated Route] Partial update by the owner. Owners may move between `draft` and
/// `published`, but a memorial suspended by an administrator stays suspended.
#[utoipa::path(
    put,
    path = "/memorials/{id}",
    params(("id" = Uuid, Path, description = "Memorial ID")),
    request_body = UpdateMemorialRequest,
    responses(
        (status = 200, description = "Updated", body = Memorial),
        (status = 403, description = "Not the owner, or memorial suspended", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn update_memorial(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<UpdateMemorialRequest>,
) -> ApiResult<Json<Memorial>> {
    payload.validate()?;
    let memorial = owned_memorial(&state, id, &user).await?;

    if memorial.status == STATUS_SUSPENDED && payload.status.is_some() && !user.is_admin() {
        return Err(ApiError::forbidden(
            "this memorial has been suspended by an administrator",
        ));
    }

    state
        .repo
        .update_memorial(id, payload)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("memorial"))
}

#[utoipa::path(
    delete,
    path = "/memorials/{id}",
    params(("id" = Uuid, Path, description = "Memorial ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_memorial(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    owned_memorial(&state, id, &user).await?;
    if state.repo.delete_memorial(id).await? {
        tracing::info!(memorial_id = %id, "memorial deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("memorial"))
    }
}

/// get_memorial_page
///
/// [Public Route] Everything the public memorial page shows, looked up by slug. Each call
/// counts as a view; a failure to record it is logged and does not fail the page.
#[utoipa::path(
    get,
    path = "/pages/{slug}",
    params(("slug" = String, Path, description = "Memorial slug")),
    responses(
        (status = 200, description = "Page data", body = MemorialPage),
        (status = 404, description = "Missing or not published", body = ErrorBody)
    )
)]
pub async fn get_memorial_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<MemorialPage>> {
    let memorial = state
        .repo
        .get_memorial_by_slug(&slug)
        .await?
        .filter(Memorial::is_published)
        .ok_or(ApiError::NotFound("memorial"))?;
    let id = memorial.id;

    let view_count = match state.repo.record_view(id).await {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!(memorial_id = %id, "failed to record view: {:?}", e);
            0
        }
    };

    let tributes = state
        .repo
        .list_tributes(id, true, Pagination::new(PAGE_TRIBUTES, 0))
        .await?;
    let candle_count = state.repo.count_candles(id).await?;
    let recent_candles = state
        .repo
        .list_candles(id, Pagination::new(PAGE_CANDLES, 0))
        .await?;
    let guestbook = state
        .repo
        .list_guestbook_entries(id, Pagination::new(PAGE_GUESTBOOK, 0))
        .await?;
    let gallery = state
        .repo
        .list_media(id)
        .await?
        .into_iter()
        .map(|m| with_url(state.storage.as_ref(), m))
        .collect();
    let order_of_service = state.repo.list_service_items(id).await?;

    Ok(Json(MemorialPage {
        memorial,
        tributes,
        candle_count,
        recent_candles,
        guestbook,
        gallery,
        order_of_service,
        view_count,
    }))
}

/// get_memorial_qr
///
/// [Authenticated Route] Share link and QR image URL for printed programs and cards.
#[utoipa::path(
    get,
    path = "/memorials/{id}/qr",
    params(("id" = Uuid, Path, description = "Memorial ID")),
    responses((status = 200, description = "Share link and QR image", body = QrCodeResponse))
)]
pub async fn get_memorial_qr(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<QrCodeResponse>> {
    let memorial = owned_memorial(&state, id, &user).await?;
    let share_url = qr::memorial_share_url(&state.config.public_site_url, &memorial.slug);
    let qr_image_url = qr::qr_image_url(&state.config.qr_service_url, &share_url)
        .map_err(|e| ApiError::Internal(format!("invalid QR service URL: {e}")))?;

    Ok(Json(QrCodeResponse {
        share_url,
        qr_image_url,
    }))
}
