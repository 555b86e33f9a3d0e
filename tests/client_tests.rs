use httpmock::prelude::*;
use serde_json::json;
use soulbridge::{
    email::{EmailMessage, EmailService, ResendEmailClient},
    identity::{IdentityError, IdentityProvider, SupabaseAuthClient},
    payments::{
        InitializeTransaction, PaymentError, PaymentGateway, PaystackClient, TransactionMetadata,
    },
};
use uuid::Uuid;

fn init_request() -> InitializeTransaction {
    InitializeTransaction {
        email: "kin@example.com".to_string(),
        amount: 500_000,
        currency: "NGN".to_string(),
        reference: "SB-abc".to_string(),
        callback_url: "http://localhost:5173/billing/callback".to_string(),
        metadata: TransactionMetadata {
            profile_id: Uuid::nil(),
            plan_code: "premium".to_string(),
        },
    }
}

// --- Paystack ---

#[tokio::test]
async fn test_paystack_initialize_sends_secret_and_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/transaction/initialize")
                .header("authorization", "Bearer sk_test_x")
                .json_body_partial(r#"{"reference":"SB-abc","amount":500000,"email":"kin@example.com"}"#);
            then.status(200).json_body(json!({
                "status": true,
                "message": "Authorization URL created",
                "data": {
                    "authorization_url": "https://checkout.paystack.com/xyz",
                    "access_code": "xyz",
                    "reference": "SB-abc"
                }
            }));
        })
        .await;

    let client = PaystackClient::new(&server.base_url(), "sk_test_x");
    let result = client.initialize(&init_request()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(result.authorization_url, "https://checkout.paystack.com/xyz");
    assert_eq!(result.access_code, "xyz");
}

#[tokio::test]
async fn test_paystack_verify_parses_status_and_amount() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/transaction/verify/SB-abc");
            then.status(200).json_body(json!({
                "status": true,
                "message": "Verification successful",
                "data": {
                    "id": 4099260516u64,
                    "reference": "SB-abc",
                    "status": "success",
                    "amount": 500000,
                    "gateway_response": "Successful",
                    "currency": "NGN"
                }
            }));
        })
        .await;

    let client = PaystackClient::new(&format!("{}/", server.base_url()), "sk_test_x");
    let verified = client.verify("SB-abc").await.unwrap();

    mock.assert_async().await;
    assert_eq!(verified.status, "success");
    assert_eq!(verified.amount, 500_000);
    assert_eq!(verified.gateway_response.as_deref(), Some("Successful"));
}

#[tokio::test]
async fn test_paystack_error_envelope_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/transaction/verify/SB-missing");
            then.status(400).json_body(json!({
                "status": false,
                "message": "Transaction reference not found"
            }));
        })
        .await;

    let client = PaystackClient::new(&server.base_url(), "sk_test_x");
    let err = client.verify("SB-missing").await.unwrap_err();
    match err {
        PaymentError::Rejected(message) => assert_eq!(message, "Transaction reference not found"),
        other => panic!("expected rejection, got {other:?}"),
    }
}

// --- Resend ---

#[tokio::test]
async fn test_resend_posts_message() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/emails")
                .header("authorization", "Bearer re_test")
                .json_body_partial(r#"{"from":"SoulBridge <noreply@soulbridge.app>","to":["kin@example.com"],"subject":"Hello"}"#);
            then.status(200).json_body(json!({ "id": "49a3999c-0ce1-4ea6-ab68-afcd6dc2e794" }));
        })
        .await;

    let client = ResendEmailClient::new(&server.base_url(), "re_test", "SoulBridge <noreply@soulbridge.app>");
    client
        .send(EmailMessage {
            to: "kin@example.com".to_string(),
            subject: "Hello".to_string(),
            html: "<p>Hi</p>".to_string(),
        })
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_resend_failure_carries_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/emails");
            then.status(422).body(r#"{"message":"Invalid `to` field"}"#);
        })
        .await;

    let client = ResendEmailClient::new(&server.base_url(), "re_test", "noreply@soulbridge.app");
    let err = client
        .send(EmailMessage {
            to: "nope".to_string(),
            subject: "Hello".to_string(),
            html: String::new(),
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("422"));
}

// --- Supabase auth ---

#[tokio::test]
async fn test_supabase_signup_returns_user_id() {
    let id = Uuid::new_v4();
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/v1/signup")
                .header("apikey", "anon")
                .json_body_partial(r#"{"email":"kin@example.com"}"#);
            then.status(200).json_body(json!({ "id": id, "email": "kin@example.com" }));
        })
        .await;

    let client = SupabaseAuthClient::new(&server.base_url(), "anon");
    let user_id = client.sign_up("kin@example.com", "long password").await.unwrap();

    mock.assert_async().await;
    assert_eq!(user_id, id);
}

#[tokio::test]
async fn test_supabase_signup_with_session_response() {
    let id = Uuid::new_v4();
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/v1/signup");
            then.status(200).json_body(json!({
                "access_token": "token",
                "token_type": "bearer",
                "user": { "id": id, "email": "kin@example.com" }
            }));
        })
        .await;

    let client = SupabaseAuthClient::new(&server.base_url(), "anon");
    assert_eq!(client.sign_up("kin@example.com", "long password").await.unwrap(), id);
}

#[tokio::test]
async fn test_supabase_rejection() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/v1/signup");
            then.status(422).json_body(json!({ "msg": "User already registered" }));
        })
        .await;

    let client = SupabaseAuthClient::new(&server.base_url(), "anon");
    let err = client.sign_up("kin@example.com", "long password").await.unwrap_err();
    assert!(matches!(err, IdentityError::Rejected(body) if body.contains("already registered")));
}
