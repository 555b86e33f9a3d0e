use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    models::ROLE_ADMIN,
    repository::RepositoryState,
};

/// Audience Supabase stamps on access tokens of signed-in users.
pub const TOKEN_AUDIENCE: &str = "authenticated";

/// Claims
///
/// The subset of the Supabase access-token payload this service relies on.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The identity-provider user id, equal to `profiles.id`.
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// AuthUser
///
/// The resolved identity of an authenticated request. The role comes from the profile row,
/// never from the token, so demotions apply immediately.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    /// 'user' or 'admin'.
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("admin access required"))
        }
    }
}

/// Decodes and validates a bearer token: HS256 signature, expiry and audience.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.set_audience(&[TOKEN_AUDIENCE]);
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

/// AuthUser extractor
///
/// 1. In `Env::Local`, an `x-user-id` header naming an existing profile is accepted.
/// 2. Otherwise a `Bearer` JWT is required and validated against the configured secret.
/// 3. The profile is loaded so deleted users lose access even with a live token.
///
/// Every failure rejects with 401.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            let bypass_id = parts
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|id| Uuid::parse_str(id).ok());
            if let Some(user_id) = bypass_id {
                if let Some(profile) = repo.get_profile(user_id).await? {
                    return Ok(AuthUser {
                        id: profile.id,
                        email: profile.email,
                        role: profile.role,
                    });
                }
            }
        }

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let claims = decode_token(token, &config.jwt_secret).map_err(|e| {
            tracing::debug!("rejected token: {:?}", e.kind());
            ApiError::Unauthorized
        })?;

        let profile = repo
            .get_profile(claims.sub)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        Ok(AuthUser {
            id: profile.id,
            email: profile.email,
            role: profile.role,
        })
    }
}
