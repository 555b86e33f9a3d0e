use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::published_memorial;
use crate::{
    AppState,
    error::{ApiResult, ErrorBody},
    extract::ApiJson,
    models::{Candle, LightCandleRequest, Pagination},
};

/// [Public Route] Recently lit candles, newest first.
#[utoipa::path(
    get,
    path = "/memorials/{id}/candles",
    params(("id" = Uuid, Path, description = "Memorial ID"), Pagination),
    responses(
        (status = 200, description = "Candles", body = [Candle]),
        (status = 404, description = "Memorial not found", body = ErrorBody)
    )
)]
pub async fn list_candles(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Candle>>> {
    published_memorial(&state, id).await?;
    Ok(Json(state.repo.list_candles(id, page).await?))
}

/// [Public Route] Light a virtual candle. No moderation.
#[utoipa::path(
    post,
    path = "/memorials/{id}/candles",
    params(("id" = Uuid, Path, description = "Memorial ID")),
    request_body = LightCandleRequest,
    responses(
        (status = 201, description = "Lit", body = Candle),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 404, description = "Memorial not found", body = ErrorBody)
    )
)]
pub async fn light_candle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<LightCandleRequest>,
) -> ApiResult<(StatusCode, Json<Candle>)> {
    payload.validate()?;
    published_memorial(&state, id).await?;
    let candle = state.repo.light_candle(id, payload).await?;
    Ok((StatusCode::CREATED, Json(candle)))
}
