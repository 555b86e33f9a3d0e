use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{owned_memorial, published_memorial};
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, ErrorBody},
    extract::ApiJson,
    models::{
        CreateServiceItemRequest, MAX_SERVICE_POSITION, OrderOfServiceItem,
        UpdateServiceItemRequest,
    },
};

/// [Public Route] The funeral programme, in position order.
#[utoipa::path(
    get,
    path = "/memorials/{id}/order-of-service",
    params(("id" = Uuid, Path, description = "Memorial ID")),
    responses(
        (status = 200, description = "Programme items", body = [OrderOfServiceItem]),
        (status = 404, description = "Memorial not found", body = ErrorBody)
    )
)]
pub async fn list_service_items(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<OrderOfServiceItem>>> {
    published_memorial(&state, id).await?;
    Ok(Json(state.repo.list_service_items(id).await?))
}

/// create_service_item
///
/// [Authenticated Route] Appends an item to the programme, or inserts it at `position`.
/// Requires a plan with order-of-service enabled.
#[utoipa::path(
    post,
    path = "/memorials/{id}/order-of-service",
    params(("id" = Uuid, Path, description = "Memorial ID")),
    request_body = CreateServiceItemRequest,
    responses(
        (status = 201, description = "Created", body = OrderOfServiceItem),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 403, description = "Not the owner or feature not in plan", body = ErrorBody)
    )
)]
pub async fn create_service_item(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<CreateServiceItemRequest>,
) -> ApiResult<(StatusCode, Json<OrderOfServiceItem>)> {
    payload.validate()?;
    let memorial = owned_memorial(&state, id, &user).await?;
    state
        .repo
        .get_plan_limits(memorial.owner_id)
        .await?
        .check_order_of_service()?;

    let position = match payload.position {
        Some(p) => p,
        None => {
            let existing = state.repo.list_service_items(id).await?;
            existing
                .iter()
                .map(|item| item.position)
                .max()
                .unwrap_or(0)
                .checked_add(1)
                .filter(|next| *next <= MAX_SERVICE_POSITION)
                .ok_or_else(|| {
                    ApiError::validation(format!(
                        "order of service is full at position {MAX_SERVICE_POSITION}"
                    ))
                })?
        }
    };

    let item = state
        .repo
        .create_service_item(id, position, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Loads an item and checks the caller owns its memorial. Returns the memorial's owner id so
/// callers can look up the plan that governs it.
async fn owned_item(state: &AppState, id: Uuid, user: &AuthUser) -> ApiResult<Uuid> {
    let item = state
        .repo
        .get_service_item(id)
        .await?
        .ok_or(ApiError::NotFound("order of service item"))?;
    let memorial = owned_memorial(state, item.memorial_id, user).await?;
    Ok(memorial.owner_id)
}

#[utoipa::path(
    put,
    path = "/order-of-service/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = UpdateServiceItemRequest,
    responses(
        (status = 200, description = "Updated", body = OrderOfServiceItem),
        (status = 403, description = "Not the owner or feature not in plan", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn update_service_item(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<UpdateServiceItemRequest>,
) -> ApiResult<Json<OrderOfServiceItem>> {
    payload.validate()?;
    let owner_id = owned_item(&state, id, &user).await?;
    state
        .repo
        .get_plan_limits(owner_id)
        .await?
        .check_order_of_service()?;

    state
        .repo
        .update_service_item(id, payload)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("order of service item"))
}

#[utoipa::path(
    delete,
    path = "/order-of-service/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the memorial owner", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
pub async fn delete_service_item(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    owned_item(&state, id, &user).await?;
    if state.repo.delete_service_item(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("order of service item"))
    }
}
