//! Back-office endpoints, nested under `/admin`.
//!
//! The router only guarantees an authenticated caller; each handler checks the admin role
//! itself so a mis-mounted route cannot leak access.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, ErrorBody},
    extract::ApiJson,
    models::{
        AdminDashboardStats, MEMORIAL_STATUSES, Memorial, MemorialStatusUpdate, Pagination,
        PaymentTransaction, Profile, ROLES, UpdateRoleRequest,
    },
};

/// get_dashboard_stats
///
/// [Admin Route] Platform-wide totals for the dashboard cards.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Totals", body = AdminDashboardStats),
        (status = 403, description = "Forbidden - Admin only", body = ErrorBody)
    )
)]
pub async fn get_dashboard_stats(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<AdminDashboardStats>> {
    user.require_admin()?;
    Ok(Json(state.repo.get_stats().await?))
}

/// [Admin Route] Every memorial regardless of status, newest first.
#[utoipa::path(
    get,
    path = "/admin/memorials",
    params(Pagination),
    responses(
        (status = 200, description = "Memorials", body = [Memorial]),
        (status = 403, description = "Forbidden - Admin only", body = ErrorBody)
    )
)]
pub async fn list_all_memorials(
    user: AuthUser,
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Memorial>>> {
    user.require_admin()?;
    Ok(Json(state.repo.list_all_memorials(page).await?))
}

/// set_memorial_status
///
/// [Admin Route] Publishes, unpublishes or suspends any memorial.
#[utoipa::path(
    put,
    path = "/admin/memorials/{id}/status",
    params(("id" = Uuid, Path, description = "Memorial ID")),
    request_body = MemorialStatusUpdate,
    responses(
        (status = 200, description = "Updated", body = Memorial),
        (status = 400, description = "Unknown status", body = ErrorBody),
        (status = 403, description = "Forbidden - Admin only", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn set_memorial_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<MemorialStatusUpdate>,
) -> ApiResult<Json<Memorial>> {
    user.require_admin()?;
    if !MEMORIAL_STATUSES.contains(&payload.status.as_str()) {
        return Err(ApiError::validation(format!(
            "status must be one of: {}",
            MEMORIAL_STATUSES.join(", ")
        )));
    }

    let memorial = state
        .repo
        .set_memorial_status(id, &payload.status)
        .await?
        .ok_or(ApiError::NotFound("memorial"))?;
    tracing::info!(admin_id = %user.id, memorial_id = %id, status = %memorial.status, "memorial status changed");
    Ok(Json(memorial))
}

#[utoipa::path(
    delete,
    path = "/admin/memorials/{id}",
    params(("id" = Uuid, Path, description = "Memorial ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden - Admin only", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_any_memorial(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    user.require_admin()?;
    if state.repo.delete_memorial(id).await? {
        tracing::info!(admin_id = %user.id, memorial_id = %id, "memorial removed by admin");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("memorial"))
    }
}

#[utoipa::path(
    get,
    path = "/admin/users",
    params(Pagination),
    responses(
        (status = 200, description = "Profiles", body = [Profile]),
        (status = 403, description = "Forbidden - Admin only", body = ErrorBody)
    )
)]
pub async fn list_users(
    user: AuthUser,
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Profile>>> {
    user.require_admin()?;
    Ok(Json(state.repo.list_profiles(page).await?))
}

/// set_user_role
///
/// [Admin Route] Promotes or demotes a user. Admins cannot demote themselves, which keeps at
/// least one admin able to undo mistakes.
#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "Profile ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated", body = Profile),
        (status = 400, description = "Unknown role or self-demotion", body = ErrorBody),
        (status = 403, description = "Forbidden - Admin only", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn set_user_role(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<UpdateRoleRequest>,
) -> ApiResult<Json<Profile>> {
    user.require_admin()?;
    if !ROLES.contains(&payload.role.as_str()) {
        return Err(ApiError::validation(format!(
            "role must be one of: {}",
            ROLES.join(", ")
        )));
    }
    if id == user.id && payload.role != user.role {
        return Err(ApiError::validation("admins cannot change their own role"));
    }

    let profile = state
        .repo
        .set_profile_role(id, &payload.role)
        .await?
        .ok_or(ApiError::NotFound("profile"))?;
    tracing::info!(admin_id = %user.id, profile_id = %id, role = %profile.role, "role changed");
    Ok(Json(profile))
}

/// [Admin Route] The full payment ledger, newest first.
#[utoipa::path(
    get,
    path = "/admin/payments",
    params(Pagination),
    responses(
        (status = 200, description = "Transactions", body = [PaymentTransaction]),
        (status = 403, description = "Forbidden - Admin only", body = ErrorBody)
    )
)]
pub async fn list_payments(
    user: AuthUser,
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<PaymentTransaction>>> {
    user.require_admin()?;
    Ok(Json(state.repo.list_all_transactions(page).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/tributes/{id}",
    params(("id" = Uuid, Path, description = "Tribute ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden - Admin only", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn remove_tribute(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    user.require_admin()?;
    if state.repo.delete_tribute(id).await? {
        tracing::info!(admin_id = %user.id, tribute_id = %id, "tribute removed by admin");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("tribute"))
    }
}
