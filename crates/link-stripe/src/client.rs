//! # Stripe Payment Intents Client
//!
//! Implementation of the Payment Intents API over Stripe's form-encoded
//! HTTP surface. This is the only module that talks to the processor.

use crate::config::StripeConfig;
use crate::webhook;
use async_trait::async_trait;
use link_core::{
    IntentRequest, PaymentError, PaymentIntent, PaymentMethodDetails, PaymentProvider,
    PaymentResult, WebhookEvent,
};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Stripe implementation of the payment provider seam.
///
/// Payment intents are created and retrieved through Stripe's REST API;
/// the intent itself lives entirely on Stripe's side and is only viewed
/// within a single request here.
pub struct StripeProvider {
    config: StripeConfig,
    client: Client,
}

impl StripeProvider {
    /// Create a new Stripe provider
    pub fn new(config: StripeConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let config = StripeConfig::from_env()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Build form data for the intent creation call.
    ///
    /// The inbound session token, when present, goes verbatim into
    /// `payment_method_options[link][persistent_token]`.
    fn build_create_params(request: &IntentRequest) -> Vec<(String, String)> {
        let mut form_params: Vec<(String, String)> = vec![
            ("amount".to_string(), request.amount.to_string()),
            ("currency".to_string(), request.currency.clone()),
        ];

        for (i, method_type) in request.payment_method_types.iter().enumerate() {
            form_params.push((
                format!("payment_method_types[{}]", i),
                method_type.clone(),
            ));
        }

        if let Some(ref token) = request.persistent_token {
            form_params.push((
                "payment_method_options[link][persistent_token]".to_string(),
                token.clone(),
            ));
        }

        form_params
    }

    /// Decode a Stripe response body, turning error bodies into typed errors
    fn decode_intent(status: reqwest::StatusCode, body: &str) -> PaymentResult<PaymentIntent> {
        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(body) {
                return Err(PaymentError::ProviderError {
                    provider: "stripe".to_string(),
                    message: error_response.error.message,
                });
            }

            return Err(PaymentError::ProviderError {
                provider: "stripe".to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let response: StripeIntentResponse = serde_json::from_str(body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })?;

        Ok(response.into_intent())
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    #[instrument(skip(self, request), fields(amount = request.amount, currency = %request.currency))]
    async fn create_intent(&self, request: &IntentRequest) -> PaymentResult<PaymentIntent> {
        if request.amount <= 0 {
            return Err(PaymentError::InvalidRequest(
                "Amount must be positive".to_string(),
            ));
        }

        let form_params = Self::build_create_params(request);

        debug!(
            "Creating payment intent: methods={:?}, token_present={}",
            request.payment_method_types,
            request.persistent_token.is_some()
        );

        let idempotency_key = request
            .idempotency_key
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let url = format!("{}/v1/payment_intents", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .header("Idempotency-Key", &idempotency_key)
            .form(&form_params)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let intent = Self::decode_intent(status, &body)?;

        info!("Created payment intent: id={}, status={:?}", intent.id, intent.status);

        Ok(intent)
    }

    #[instrument(skip(self))]
    async fn retrieve_intent(&self, intent_id: &str) -> PaymentResult<PaymentIntent> {
        let url = format!(
            "{}/v1/payment_intents/{}",
            self.config.api_base_url, intent_id
        );

        let response = self
            .client
            .get(&url)
            .query(&[("expand[]", "payment_method")])
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PaymentError::IntentNotFound {
                intent_id: intent_id.to_string(),
            });
        }

        let intent = Self::decode_intent(status, &body)?;

        debug!(
            "Retrieved payment intent: id={}, status={:?}, token_present={}",
            intent.id,
            intent.status,
            intent.link_persistent_token().is_some()
        );

        Ok(intent)
    }

    #[instrument(skip(self, payload, signature))]
    async fn verify_webhook(&self, payload: &[u8], signature: &str) -> PaymentResult<WebhookEvent> {
        let secret = self.config.webhook_secret.as_deref().ok_or_else(|| {
            PaymentError::Configuration("Webhook secret not configured".to_string())
        })?;

        webhook::verify_and_parse(payload, signature, secret)
    }

    fn provider_name(&self) -> &'static str {
        "stripe"
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeIntentResponse {
    id: String,
    amount: i64,
    currency: String,
    status: link_core::IntentStatus,
    #[serde(default)]
    client_secret: Option<String>,
    /// A string id when unexpanded, an object when expanded, or null
    #[serde(default)]
    payment_method: Option<serde_json::Value>,
}

impl StripeIntentResponse {
    fn into_intent(self) -> PaymentIntent {
        // An unexpanded payment method is just an id string; only the
        // expanded object form carries the Link session detail.
        let payment_method = self.payment_method.and_then(|value| match value {
            serde_json::Value::Object(_) => {
                serde_json::from_value::<PaymentMethodDetails>(value).ok()
            }
            serde_json::Value::String(id) => Some(PaymentMethodDetails {
                id: Some(id),
                method_type: None,
                link: None,
            }),
            _ => None,
        });

        PaymentIntent {
            id: self.id,
            amount: self.amount,
            currency: self.currency,
            status: self.status,
            client_secret: self.client_secret,
            payment_method,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    param: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use link_core::IntentStatus;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> StripeProvider {
        let config = StripeConfig::new("sk_test_abc", "pk_test_xyz", None)
            .with_api_base_url(server.uri());
        StripeProvider::new(config)
    }

    #[test]
    fn test_build_create_params_with_token() {
        let request = IntentRequest::new(1999, "usd").with_persistent_token("lpt_cookie_value");
        let params = StripeProvider::build_create_params(&request);

        assert!(params.contains(&("amount".to_string(), "1999".to_string())));
        assert!(params.contains(&("payment_method_types[0]".to_string(), "link".to_string())));
        assert!(params.contains(&("payment_method_types[1]".to_string(), "card".to_string())));
        assert!(params.contains(&(
            "payment_method_options[link][persistent_token]".to_string(),
            "lpt_cookie_value".to_string()
        )));
    }

    #[test]
    fn test_build_create_params_without_token() {
        let request = IntentRequest::new(1999, "usd");
        let params = StripeProvider::build_create_params(&request);

        assert!(!params
            .iter()
            .any(|(k, _)| k.starts_with("payment_method_options")));
    }

    #[tokio::test]
    async fn test_create_intent_forwards_session_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(header("Authorization", "Bearer sk_test_abc"))
            .and(body_string_contains("amount=1999"))
            .and(body_string_contains("payment_method_types%5B0%5D=link"))
            .and(body_string_contains(
                "payment_method_options%5Blink%5D%5Bpersistent_token%5D=lpt_T",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pi_123",
                "amount": 1999,
                "currency": "usd",
                "status": "requires_payment_method",
                "client_secret": "pi_123_secret_456",
                "payment_method": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let request = IntentRequest::new(1999, "usd").with_persistent_token("lpt_T");
        let intent = provider.create_intent(&request).await.unwrap();

        assert_eq!(intent.id, "pi_123");
        assert_eq!(intent.client_secret.as_deref(), Some("pi_123_secret_456"));
        assert_eq!(intent.status, IntentStatus::RequiresPaymentMethod);
    }

    #[tokio::test]
    async fn test_create_intent_surfaces_provider_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {
                    "message": "Amount must convert to at least 50 cents.",
                    "code": "amount_too_small"
                }
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider
            .create_intent(&IntentRequest::new(1, "usd"))
            .await
            .unwrap_err();

        match err {
            PaymentError::ProviderError { provider, message } => {
                assert_eq!(provider, "stripe");
                assert_eq!(message, "Amount must convert to at least 50 cents.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retrieve_intent_expands_payment_method() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/payment_intents/pi_123"))
            .and(query_param("expand[]", "payment_method"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pi_123",
                "amount": 1999,
                "currency": "usd",
                "status": "succeeded",
                "client_secret": "pi_123_secret_456",
                "payment_method": {
                    "id": "pm_789",
                    "type": "link",
                    "link": { "persistent_token": "lpt_returned" }
                }
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let intent = provider.retrieve_intent("pi_123").await.unwrap();

        assert_eq!(intent.status, IntentStatus::Succeeded);
        assert_eq!(intent.link_persistent_token(), Some("lpt_returned"));
    }

    #[tokio::test]
    async fn test_retrieve_intent_unexpanded_method_id() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/payment_intents/pi_456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pi_456",
                "amount": 500,
                "currency": "usd",
                "status": "processing",
                "payment_method": "pm_raw_id"
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let intent = provider.retrieve_intent("pi_456").await.unwrap();

        // Plain id string: no Link detail, so no session token
        assert_eq!(intent.link_persistent_token(), None);
        assert_eq!(
            intent.payment_method.and_then(|m| m.id).as_deref(),
            Some("pm_raw_id")
        );
    }

    #[tokio::test]
    async fn test_verify_webhook_requires_secret() {
        let server = MockServer::start().await;
        let provider = provider_for(&server);

        let err = provider
            .verify_webhook(b"{}", "t=1,v1=abc")
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amount() {
        // Rejected before any network call is made
        let config = StripeConfig::new("sk_test_abc", "pk_test_xyz", None);
        let provider = StripeProvider::new(config);

        let err = provider
            .create_intent(&IntentRequest::new(0, "usd"))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::InvalidRequest(_)));
    }
}
