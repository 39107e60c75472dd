//! # link-core
//!
//! Core types and traits for the link-gateway payment flow.
//!
//! This crate provides:
//! - `PaymentProvider` trait for the processor seam
//! - `PaymentIntent` and its nested payment method detail types
//! - `SessionCookie` for the persistent Link session correlation
//! - `WebhookEvent` for verified processor notifications
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use link_core::{IntentRequest, SessionCookie, LINK_PERSISTENT_TOKEN_COOKIE};
//!
//! // Forward an inbound session token to the processor
//! let request = IntentRequest::new(1999, "usd")
//!     .with_persistent_token(inbound_token);
//! let intent = provider.create_intent(&request).await?;
//!
//! // After redirect-based completion, correlate the session
//! let intent = provider.retrieve_intent(&intent_id).await?;
//! if intent.status.is_complete_enough_for_session() {
//!     if let Some(token) = intent.link_persistent_token() {
//!         let cookie = SessionCookie::new(token);
//!         // attach cookie.to_set_cookie() to the redirect response
//!     }
//! }
//! ```

pub mod error;
pub mod event;
pub mod intent;
pub mod provider;
pub mod session;

// Re-exports for convenience
pub use error::{PaymentError, PaymentResult};
pub use event::{WebhookEvent, WebhookEventType};
pub use intent::{
    IntentRequest, IntentStatus, LinkDetails, PaymentIntent, PaymentMethodDetails,
};
pub use provider::{BoxedPaymentProvider, PaymentProvider};
pub use session::{
    cookie_from_header, SessionCookie, LINK_PERSISTENT_TOKEN_COOKIE, SESSION_COOKIE_TTL_DAYS,
};
