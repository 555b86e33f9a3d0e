use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("request to identity provider failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The provider refused the signup (duplicate email, weak password, ...).
    #[error("signup rejected: {0}")]
    Rejected(String),
}

/// IdentityProvider
///
/// External authentication service that owns credentials. This service only learns the
/// resulting user id.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Uuid, IdentityError>;
}

pub type IdentityState = Arc<dyn IdentityProvider>;

/// Signup response. Depending on the project's email-confirmation setting Supabase returns
/// either the user object itself or a session wrapping it.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignupResponse {
    Session { user: SignupUser },
    User(SignupUser),
}

#[derive(Deserialize)]
struct SignupUser {
    id: Uuid,
}

/// SupabaseAuthClient
///
/// Calls `POST {supabase_url}/auth/v1/signup` with the project's anon key.
#[derive(Clone)]
pub struct SupabaseAuthClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuthClient {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuthClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Uuid, IdentityError> {
        let response = self
            .http
            .post(format!("{}/auth/v1/signup", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Rejected(body));
        }

        let id = match response.json::<SignupResponse>().await? {
            SignupResponse::Session { user } => user.id,
            SignupResponse::User(user) => user.id,
        };
        Ok(id)
    }
}

/// MockIdentityProvider
///
/// Returns a fixed id, or rejects every signup when `reject` is set.
#[derive(Clone, Default)]
pub struct MockIdentityProvider {
    pub user_id: Uuid,
    pub reject: bool,
}

impl MockIdentityProvider {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            reject: false,
        }
    }

    pub fn rejecting() -> Self {
        Self {
            user_id: Uuid::nil(),
            reject: true,
        }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn sign_up(&self, _email: &str, _password: &str) -> Result<Uuid, IdentityError> {
        if self.reject {
            return Err(IdentityError::Rejected("User already registered".to_string()));
        }
        Ok(self.user_id)
    }
}
