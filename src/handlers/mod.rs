//! Route handlers, one module per resource.
//!
//! Every handler follows the same shape: resolve the caller (if any), validate the body,
//! check ownership or plan limits, call the repository, shape the JSON response.

use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult},
    models::{Media, Memorial},
    storage::StorageService,
};

pub mod admin;
pub mod analytics;
pub mod candles;
pub mod gallery;
pub mod guestbook;
pub mod memorials;
pub mod order_of_service;
pub mod payments;
pub mod profile;
pub mod tributes;

/// owned_memorial
///
/// Loads a memorial and checks the caller owns it. Missing → 404, someone else's → 403.
/// Admins pass the ownership check.
pub(crate) async fn owned_memorial(
    state: &AppState,
    memorial_id: Uuid,
    user: &AuthUser,
) -> ApiResult<Memorial> {
    let memorial = state
        .repo
        .get_memorial(memorial_id)
        .await?
        .ok_or(ApiError::NotFound("memorial"))?;

    if memorial.owner_id != user.id && !user.is_admin() {
        return Err(ApiError::forbidden("you do not own this memorial"));
    }
    Ok(memorial)
}

/// Loads a memorial for anonymous visitors. Drafts and suspended memorials read as 404.
pub(crate) async fn published_memorial(state: &AppState, memorial_id: Uuid) -> ApiResult<Memorial> {
    state
        .repo
        .get_memorial(memorial_id)
        .await?
        .filter(Memorial::is_published)
        .ok_or(ApiError::NotFound("memorial"))
}

pub(crate) fn with_url(storage: &dyn StorageService, mut media: Media) -> Media {
    media.url = Some(storage.public_url(&media.storage_key));
    media
}
