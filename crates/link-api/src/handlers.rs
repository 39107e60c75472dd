//! # Request Handlers
//!
//! Axum request handlers for the link-gateway payment flow: publishable
//! config, intent creation with session-cookie correlation, the
//! post-confirmation redirect, and webhook receipt.

use crate::state::{AppState, WebhookMode};
use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use link_core::{
    cookie_from_header, IntentRequest, PaymentError, SessionCookie, LINK_PERSISTENT_TOKEN_COOKIE,
};
use link_stripe::{dispatch_webhook_event, parse_event_unverified, LoggingWebhookHandler};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create payment intent request. The sample clients send `{}`; an amount
/// override is accepted for parity with the configurable default.
#[derive(Debug, Default, Deserialize)]
pub struct CreatePaymentIntentRequest {
    /// Amount override in the currency's smallest unit
    #[serde(default)]
    pub amount: Option<i64>,
    /// Idempotency key (optional)
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Create payment intent response
#[derive(Debug, Serialize)]
pub struct CreatePaymentIntentResponse {
    /// Secret the client uses to resume confirmation
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
}

/// Publishable configuration response
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    #[serde(rename = "publishableKey")]
    pub publishable_key: String,
}

/// Redirect query after client-side confirmation
#[derive(Debug, Deserialize)]
pub struct PaymentNextParams {
    pub payment_intent: String,
}

/// Error response: a single message, nothing internal
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: ErrorMessage {
                message: message.into(),
            },
        }
    }
}

/// Map a payment error to its HTTP response.
///
/// Full detail goes to the server log; the caller only ever sees one
/// human-readable message.
fn payment_error_to_response(err: PaymentError) -> (StatusCode, Json<ErrorBody>) {
    error!("Payment operation failed: {}", err);

    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = match &err {
        // The processor's message is meant for the caller
        PaymentError::ProviderError { message, .. } => message.clone(),
        PaymentError::NetworkError(_) => "Payment processor unreachable".to_string(),
        other => other.to_string(),
    };

    (status, Json(ErrorBody::new(message)))
}

/// Read the Link session token from the inbound Cookie header(s)
fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers.get_all(header::COOKIE).iter().find_map(|value| {
        let header = value.to_str().ok()?;
        cookie_from_header(header, LINK_PERSISTENT_TOKEN_COOKIE).map(String::from)
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "link-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Publishable configuration for client-side widget initialization
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        publishable_key: state.publishable_key.clone(),
    })
}

/// Create a payment intent, forwarding the inbound Link session token
#[instrument(skip(state, headers, body))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CreatePaymentIntentResponse>, (StatusCode, Json<ErrorBody>)> {
    // The sample clients send `{}`; an empty body means the same thing
    let request: CreatePaymentIntentRequest = if body.is_empty() {
        CreatePaymentIntentRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::new(format!("Invalid request body: {}", e))),
            )
        })?
    };

    let mut intent_request = IntentRequest::new(
        request.amount.unwrap_or(state.checkout.amount),
        state.checkout.currency.clone(),
    );

    // Forwarded verbatim; its absence is the common case
    if let Some(token) = session_token_from_headers(&headers) {
        intent_request = intent_request.with_persistent_token(token);
    }

    if let Some(key) = request.idempotency_key {
        intent_request = intent_request.with_idempotency_key(key);
    }

    let intent = state
        .provider
        .create_intent(&intent_request)
        .await
        .map_err(payment_error_to_response)?;

    let client_secret = intent.client_secret.clone().ok_or_else(|| {
        payment_error_to_response(PaymentError::Internal(format!(
            "Intent {} created without client secret",
            intent.id
        )))
    })?;

    info!("Created payment intent: {}", intent.id);

    Ok(Json(CreatePaymentIntentResponse { client_secret }))
}

/// Post-confirmation redirect target.
///
/// Retrieves the intent with its payment method expanded and, when the
/// payment completed with a persistent Link session, sets the session
/// cookie on the redirect response itself. A missing token at any nesting
/// level is the normal "no session" branch, never an error.
#[instrument(skip(state, params), fields(intent_id = %params.payment_intent))]
pub async fn payment_next(
    State(state): State<AppState>,
    Query(params): Query<PaymentNextParams>,
) -> Result<Response, (StatusCode, Json<ErrorBody>)> {
    let intent = state
        .provider
        .retrieve_intent(&params.payment_intent)
        .await
        .map_err(payment_error_to_response)?;

    let cookie = if intent.status.is_complete_enough_for_session() {
        match intent.link_persistent_token() {
            Some(token) => {
                info!("Persisting Link session for intent {}", intent.id);
                Some(SessionCookie::new(token))
            }
            None => {
                info!("No Link session on intent {}", intent.id);
                None
            }
        }
    } else {
        None
    };

    let client_secret = intent.client_secret.as_deref().unwrap_or_default();
    let location = format!(
        "{}?payment_intent_client_secret={}",
        state.checkout.completion_path, client_secret
    );

    Ok(redirect_with_cookie(&location, cookie))
}

/// Build a 302 redirect, attaching the Set-Cookie header (when any) to the
/// same response so it precedes the redirect on the wire.
fn redirect_with_cookie(location: &str, cookie: Option<SessionCookie>) -> Response {
    let mut builder = Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location);

    if let Some(cookie) = cookie {
        builder = builder.header(header::SET_COOKIE, cookie.to_set_cookie());
    }

    builder.body(Body::empty()).unwrap_or_else(|e| {
        warn!("Failed to build redirect response: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}

/// Handle processor webhooks
#[instrument(skip(state, headers, body))]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorBody>)> {
    let event = match state.webhook_mode {
        WebhookMode::Verified => {
            let signature = headers
                .get("stripe-signature")
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(ErrorBody::new("Missing Stripe-Signature header")),
                    )
                })?;

            state
                .provider
                .verify_webhook(&body, signature)
                .await
                .map_err(payment_error_to_response)?
        }
        // Development-only: startup refuses this mode in production
        WebhookMode::UnverifiedDevelopment => {
            parse_event_unverified(&body).map_err(payment_error_to_response)?
        }
    };

    info!(
        "Received webhook: type={:?}, id={}",
        event.event_type, event.event_id
    );

    dispatch_webhook_event(&LoggingWebhookHandler, &event).map_err(payment_error_to_response)?;

    Ok(Json(serde_json::json!({ "status": "success" })))
}

/// Completion page. Reads the client secret back out of the query string;
/// a real deployment would fetch and render the final intent status
/// client-side from here.
pub async fn success_page(
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> impl IntoResponse {
    let client_secret = params
        .get("payment_intent_client_secret")
        .map(|s| s.as_str())
        .unwrap_or("unknown");

    Html(format!(
        r#"
<!DOCTYPE html>
<html>
<head><title>Payment Complete</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; background: linear-gradient(135deg, #1a1a2e 0%, #16213e 100%);">
    <div style="background: white; padding: 60px; border-radius: 16px; text-align: center;">
        <div style="font-size: 60px;">&#x2705;</div>
        <h1>Payment Complete</h1>
        <p>Intent: <code id="client-secret">{}</code></p>
        <p style="color: #666;">Thanks for your purchase.</p>
    </div>
</body>
</html>
"#,
        client_secret
    ))
}
