//! # checkout-core
//!
//! Core logic for embedding a hosted checkout page in an in-app web view.
//!
//! This crate provides:
//! - `CheckoutConfig` and `Theme` for the per-session checkout parameters
//! - `render_html` / `checkout_url` to build the payload the web view loads
//! - `extract_query` and `QueryParams` for reading navigation URLs
//! - `NavigationObserver` to turn navigation events into host decisions
//! - `CheckoutError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use checkout_core::{CheckoutConfig, NavigationDecision, NavigationObserver, render_html};
//!
//! let config = CheckoutConfig::builder(100.0, "https://shop.example.com/process", "TEST-pk")
//!     .with_success_url("/checkout/success")
//!     .with_failure_url("/checkout/failure")
//!     .build()?;
//!
//! // Load this into the web view
//! let html = render_html(&config);
//!
//! let mut observer = NavigationObserver::new(config)
//!     .with_handler(|params: &QueryParams, is_error: bool| {
//!         println!("done: {:?} (error: {})", params, is_error);
//!     });
//!
//! // On every navigation event from the web view:
//! match observer.observe(&nav_url) {
//!     NavigationDecision::Redirect(url) => web_view.inject(redirect_script(&url)),
//!     NavigationDecision::Resolve(_) => web_view.stop_loading(),
//!     NavigationDecision::NoOp => {}
//! }
//! ```

pub mod config;
pub mod error;
pub mod observer;
pub mod payload;
pub mod query;

// Re-exports for convenience
pub use config::{CheckoutConfig, CheckoutConfigBuilder, Theme, DEFAULT_SCRIPT_URL};
pub use error::{CheckoutError, CheckoutResult};
pub use observer::{
    is_placeholder_action, redirect_script, rewrite_action, LoggingResultHandler,
    NavigationDecision, NavigationEvent, NavigationObserver, ObserverState, PaymentOutcome,
    ResultHandler, PLACEHOLDER_ACTION,
};
pub use payload::{checkout_url, payload_fields, query_pairs, render_html, PayloadField};
pub use query::{build_query, extract_query, QueryParams};
