//! # link-api
//!
//! HTTP API layer for link-gateway.
//!
//! Exposes the payment endpoints over Axum:
//! - `/config` - publishable key for client-side widget initialization
//! - `/create-payment-intent` - intent creation with session-cookie correlation
//! - `/payment/next` - post-confirmation redirect, may set the session cookie
//! - `/webhook` - signed processor notifications
//!
//! See `state::AppState` for configuration and `routes::create_router`
//! for the full routing table.

pub mod handlers;
pub mod routes;
pub mod state;
