use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

/// Header carrying the hex HMAC-SHA512 of the raw webhook body.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";
pub const CHARGE_SUCCESS_EVENT: &str = "charge.success";

type HmacSha512 = Hmac<Sha512>;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("request to payment gateway failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("payment gateway rejected the request: {0}")]
    Rejected(String),
}

/// InitializeTransaction
///
/// What the gateway needs to open a hosted checkout.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InitializeTransaction {
    pub email: String,
    pub amount: i64,
    pub currency: String,
    pub reference: String,
    pub callback_url: String,
    pub metadata: TransactionMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionMetadata {
    pub profile_id: Uuid,
    pub plan_code: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// VerifiedTransaction
///
/// The gateway's view of a transaction. `status` is the gateway's own vocabulary
/// (`success`, `failed`, `abandoned`, `ongoing`, ...).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VerifiedTransaction {
    pub reference: String,
    pub status: String,
    pub amount: i64,
    #[serde(default)]
    pub gateway_response: Option<String>,
}

/// Gateway response envelope: `{"status": bool, "message": str, "data": T}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

/// WebhookEvent
///
/// The parts of a gateway webhook this service reads.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub reference: String,
    #[serde(default)]
    pub amount: i64,
    /// Charge status reported with the event. Only `success` settles a transaction.
    #[serde(default)]
    pub status: String,
}

/// PaymentGateway
///
/// Contract for the card payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize(
        &self,
        req: &InitializeTransaction,
    ) -> Result<InitializedTransaction, PaymentError>;

    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, PaymentError>;
}

pub type PaymentState = Arc<dyn PaymentGateway>;

/// PaystackClient
///
/// Talks to the Paystack transaction API with the secret key as bearer token.
#[derive(Clone)]
pub struct PaystackClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl PaystackClient {
    pub fn new(base_url: &str, secret_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        }
    }

    async fn unwrap_envelope<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, PaymentError> {
        let http_status = response.status();
        let envelope = response.json::<Envelope<T>>().await?;
        if !http_status.is_success() || !envelope.status {
            return Err(PaymentError::Rejected(envelope.message));
        }
        envelope
            .data
            .ok_or_else(|| PaymentError::Rejected("response carried no data".to_string()))
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize(
        &self,
        req: &InitializeTransaction,
    ) -> Result<InitializedTransaction, PaymentError> {
        let response = self
            .http
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(req)
            .send()
            .await?;
        Self::unwrap_envelope(response).await
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, PaymentError> {
        let response = self
            .http
            .get(format!("{}/transaction/verify/{}", self.base_url, reference))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        Self::unwrap_envelope(response).await
    }
}

/// New transaction reference: `SB-` followed by 32 hex characters.
pub fn new_reference() -> String {
    format!("SB-{}", Uuid::new_v4().simple())
}

/// Hex HMAC-SHA512 of `body` keyed with `secret`, as the gateway computes it.
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length, so construction cannot fail.
    let mut mac = match HmacSha512::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// verify_webhook_signature
///
/// Checks the signature header against the raw body. Comparison happens on the decoded MAC
/// through `verify_slice`, which runs in constant time.
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// MockPaymentGateway
///
/// Scriptable gateway for tests. Records initialize requests and answers `verify` with the
/// configured status and amount.
#[derive(Default)]
pub struct MockPaymentGateway {
    pub should_fail: bool,
    pub verify_status: String,
    pub verify_amount: i64,
    pub initialized: Mutex<Vec<InitializeTransaction>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self {
            verify_status: "success".to_string(),
            ..Self::default()
        }
    }

    pub fn verifying(status: &str, amount: i64) -> Self {
        Self {
            verify_status: status.to_string(),
            verify_amount: amount,
            ..Self::default()
        }
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn initialized_requests(&self) -> Vec<InitializeTransaction> {
        self.initialized
            .lock()
            .map(|reqs| reqs.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn initialize(
        &self,
        req: &InitializeTransaction,
    ) -> Result<InitializedTransaction, PaymentError> {
        if self.should_fail {
            return Err(PaymentError::Rejected("simulated failure".to_string()));
        }
        if let Ok(mut reqs) = self.initialized.lock() {
            reqs.push(req.clone());
        }
        Ok(InitializedTransaction {
            authorization_url: format!("https://checkout.mock/{}", req.reference),
            access_code: "mock_access_code".to_string(),
            reference: req.reference.clone(),
        })
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, PaymentError> {
        if self.should_fail {
            return Err(PaymentError::Rejected("simulated failure".to_string()));
        }
        Ok(VerifiedTransaction {
            reference: reference.to_string(),
            status: self.verify_status.clone(),
            amount: self.verify_amount,
            gateway_response: Some("Mock".to_string()),
        })
    }
}
