use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, ErrorBody},
    extract::ApiJson,
    identity::IdentityError,
    models::{Plan, PlanLimits, Profile, RegisterUserRequest, UpdateProfileRequest},
};

/// register_user
///
/// [Public Route] Signs the user up with the identity provider, then creates the mirroring
/// profile under the id the provider assigned. New profiles always start as role `user` on
/// the `free` plan; clients cannot choose either.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = Profile),
        (status = 400, description = "Invalid input or rejected by the identity provider", body = ErrorBody)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterUserRequest>,
) -> ApiResult<(StatusCode, Json<Profile>)> {
    payload.validate()?;
    let email = payload.email.trim().to_lowercase();

    let user_id = match state.identity.sign_up(&email, &payload.password).await {
        Ok(id) => id,
        Err(IdentityError::Rejected(reason)) => {
            tracing::info!("signup rejected for {}: {}", email, reason);
            return Err(ApiError::BadRequest(
                "registration was rejected by the identity provider".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let profile = state
        .repo
        .create_profile(user_id, &email, payload.full_name.as_deref().map(str::trim))
        .await?;

    tracing::info!(profile_id = %profile.id, "profile created");
    Ok((StatusCode::CREATED, Json(profile)))
}

/// get_me
///
/// [Authenticated Route] The caller's profile.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = Profile))
)]
pub async fn get_me(user: AuthUser, State(state): State<AppState>) -> ApiResult<Json<Profile>> {
    let profile = state
        .repo
        .get_profile(user.id)
        .await?
        .ok_or(ApiError::NotFound("profile"))?;
    Ok(Json(profile))
}

#[utoipa::path(
    put,
    path = "/me",
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Updated profile", body = Profile))
)]
pub async fn update_me(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<Profile>> {
    payload.validate()?;
    state
        .repo
        .update_profile(user.id, payload)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("profile"))
}

/// get_my_plan
///
/// [Authenticated Route] Entitlements and usage of the caller's plan, as computed by the
/// database's `get_plan_limits` function.
#[utoipa::path(
    get,
    path = "/me/plan",
    responses((status = 200, description = "Plan limits and usage", body = PlanLimits))
)]
pub async fn get_my_plan(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<PlanLimits>> {
    Ok(Json(state.repo.get_plan_limits(user.id).await?))
}

/// list_plans
///
/// [Public Route] The active plan catalogue, cheapest first.
#[utoipa::path(
    get,
    path = "/plans",
    responses((status = 200, description = "Active plans", body = [Plan]))
)]
pub async fn list_plans(State(state): State<AppState>) -> ApiResult<Json<Vec<Plan>>> {
    Ok(Json(state.repo.list_plans().await?))
}
