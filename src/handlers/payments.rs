use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};

use crate::{
    AppState,
    auth::AuthUser,
    email,
    error::{ApiError, ApiResult, ErrorBody},
    extract::ApiJson,
    models::{
        InitializePaymentRequest, InitializePaymentResponse, NewTransaction, PAYMENT_FAILED,
        PAYMENT_SUCCESS, PaymentTransaction, PaymentVerification,
    },
    payments::{
        self, CHARGE_SUCCESS_EVENT, InitializeTransaction, SIGNATURE_HEADER, TransactionMetadata,
        WebhookEvent,
    },
};

/// Gateway statuses that close a transaction as failed.
const TERMINAL_FAILURES: [&str; 2] = ["failed", "abandoned"];

/// initialize_payment
///
/// [Authenticated Route] Opens a hosted checkout for a paid plan.
///
/// The pending transaction is written before the gateway is called, so a webhook can never
/// arrive for a reference this service does not know.
#[utoipa::path(
    post,
    path = "/payments/initialize",
    request_body = InitializePaymentRequest,
    responses(
        (status = 200, description = "Checkout opened", body = InitializePaymentResponse),
        (status = 400, description = "Unknown, inactive or free plan", body = ErrorBody)
    )
)]
pub async fn initialize_payment(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<InitializePaymentRequest>,
) -> ApiResult<Json<InitializePaymentResponse>> {
    let plan = state
        .repo
        .get_plan(payload.plan_code.trim())
        .await?
        .filter(|p| p.is_active && p.price_kobo > 0)
        .ok_or_else(|| ApiError::validation("plan_code must name an active paid plan"))?;

    let reference = payments::new_reference();
    state
        .repo
        .create_transaction(NewTransaction {
            profile_id: user.id,
            reference: reference.clone(),
            plan_code: plan.code.clone(),
            amount_kobo: plan.price_kobo,
            currency: plan.currency.clone(),
        })
        .await?;

    let initialized = state
        .payments
        .initialize(&InitializeTransaction {
            email: user.email.clone(),
            amount: plan.price_kobo,
            currency: plan.currency,
            reference: reference.clone(),
            callback_url: state.config.payment_callback_url.clone(),
            metadata: TransactionMetadata {
                profile_id: user.id,
                plan_code: plan.code,
            },
        })
        .await?;

    tracing::info!(profile_id = %user.id, reference = %reference, "payment initialized");
    Ok(Json(InitializePaymentResponse {
        authorization_url: initialized.authorization_url,
        access_code: initialized.access_code,
        reference,
    }))
}

/// verify_payment
///
/// [Authenticated Route] Called when the user returns from checkout. Settles the transaction
/// from the gateway's answer unless the webhook already did.
#[utoipa::path(
    get,
    path = "/payments/verify/{reference}",
    params(("reference" = String, Path, description = "Transaction reference")),
    responses(
        (status = 200, description = "Current status", body = PaymentVerification),
        (status = 403, description = "Not the caller's transaction", body = ErrorBody),
        (status = 404, description = "Unknown reference", body = ErrorBody)
    )
)]
pub async fn verify_payment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> ApiResult<Json<PaymentVerification>> {
    let txn = state
        .repo
        .get_transaction_by_reference(&reference)
        .await?
        .ok_or(ApiError::NotFound("transaction"))?;
    if txn.profile_id != user.id {
        return Err(ApiError::forbidden("this transaction belongs to another user"));
    }
    if txn.status == PAYMENT_SUCCESS {
        return Ok(Json(verification(&txn, PAYMENT_SUCCESS)));
    }

    let verified = state.payments.verify(&reference).await?;
    let status = if verified.status == PAYMENT_SUCCESS && verified.amount == txn.amount_kobo {
        settle_transaction(&state, &reference).await?;
        PAYMENT_SUCCESS
    } else if verified.status == PAYMENT_SUCCESS {
        tracing::warn!(reference = %reference, expected = txn.amount_kobo, paid = verified.amount, "amount mismatch");
        state
            .repo
            .mark_transaction_failed(&reference, "amount mismatch")
            .await?;
        PAYMENT_FAILED
    } else if TERMINAL_FAILURES.contains(&verified.status.as_str()) {
        let reason = verified.gateway_response.as_deref().unwrap_or(&verified.status);
        state.repo.mark_transaction_failed(&reference, reason).await?;
        PAYMENT_FAILED
    } else {
        txn.status.as_str()
    };

    Ok(Json(verification(&txn, status)))
}

fn verification(txn: &PaymentTransaction, status: &str) -> PaymentVerification {
    PaymentVerification {
        reference: txn.reference.clone(),
        status: status.to_string(),
        plan_code: txn.plan_code.clone(),
    }
}

/// settle_transaction
///
/// Settles a transaction and activates its plan in one repository call. Only the caller that
/// made the transition mails a receipt, after the commit. Concurrent or repeated callers see
/// `None` and do nothing; a failed activation leaves the row unsettled for the next retry.
async fn settle_transaction(state: &AppState, reference: &str) -> ApiResult<()> {
    let Some(txn) = state.repo.settle_transaction(reference).await? else {
        tracing::debug!(reference = %reference, "transaction already settled");
        return Ok(());
    };
    tracing::info!(profile_id = %txn.profile_id, plan = %txn.plan_code, "plan activated");

    match state.repo.get_profile(txn.profile_id).await {
        Ok(Some(profile)) => {
            let receipt = email::payment_receipt_email(&profile.email, &txn);
            if let Err(e) = state.email.send(receipt).await {
                tracing::warn!(reference = %reference, "receipt not sent: {}", e);
            }
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(reference = %reference, "receipt lookup failed: {:?}", e),
    }
    Ok(())
}

/// payment_webhook
///
/// [Public Route] Gateway notifications. The signature is checked over the raw bytes before
/// anything is parsed.
#[utoipa::path(
    post,
    path = "/payments/webhook",
    request_body(content = String, description = "Raw gateway event", content_type = "application/json"),
    responses(
        (status = 200, description = "Acknowledged"),
        (status = 400, description = "Malformed event", body = ErrorBody),
        (status = 401, description = "Bad or missing signature", body = ErrorBody)
    )
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    if !payments::verify_webhook_signature(&state.config.paystack_secret_key, &body, signature) {
        tracing::warn!("webhook rejected: signature mismatch");
        return Err(ApiError::Unauthorized);
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("malformed webhook event: {e}")))?;

    if event.event != CHARGE_SUCCESS_EVENT || event.data.status != PAYMENT_SUCCESS {
        tracing::debug!(event = %event.event, status = %event.data.status, "ignoring webhook event");
        return Ok(StatusCode::OK);
    }

    let reference = event.data.reference;
    let Some(txn) = state.repo.get_transaction_by_reference(&reference).await? else {
        tracing::warn!(reference = %reference, "webhook for unknown reference");
        return Ok(StatusCode::OK);
    };

    if event.data.amount != txn.amount_kobo {
        tracing::warn!(reference = %reference, expected = txn.amount_kobo, paid = event.data.amount, "amount mismatch");
        state
            .repo
            .mark_transaction_failed(&reference, "amount mismatch")
            .await?;
        return Ok(StatusCode::OK);
    }

    settle_transaction(&state, &reference).await?;
    Ok(StatusCode::OK)
}

/// [Authenticated Route] The caller's transactions, newest first.
#[utoipa::path(
    get,
    path = "/payments/history",
    responses((status = 200, description = "Transactions", body = [PaymentTransaction]))
)]
pub async fn payment_history(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PaymentTransaction>>> {
    Ok(Json(state.repo.list_transactions_for_profile(user.id).await?))
}
