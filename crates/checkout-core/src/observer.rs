//! # Navigation Observer
//!
//! Decides what the web-view host should do each time the embedded checkout
//! page navigates. The observer never touches the web view itself; it returns
//! a [`NavigationDecision`] and the host performs the side effect.
//!
//! ```text
//!            placeholder action            success / failure URL
//!   Idle ──────────────────────▶ ActionPending ──────────────────▶ Resolved
//!     │                                                               ▲
//!     └───────────────────── success / failure URL ───────────────────┘
//! ```
//!
//! ## Placeholder policy
//!
//! The hosted page echoes the form action back as a query parameter. When it
//! has not been told the route yet it sends `action=null%2F…`. A URL is
//! treated as action-pending when its decoded `action` value is `null` or
//! starts with `null/`. A URL without any `action` parameter is left alone.
//!
//! `Resolved` is terminal: the result handler fires at most once per observer.

use crate::config::CheckoutConfig;
use crate::query::{extract_query, QueryParams};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, instrument, warn};
use url::{form_urlencoded, Url};

/// Sentinel the hosted page puts in `action` before it knows the route
pub const PLACEHOLDER_ACTION: &str = "null";

const ACTION_PARAM: &str = "action";

/// Returns true for the placeholder action value (`null` or `null/…`)
pub fn is_placeholder_action(value: &str) -> bool {
    value
        .strip_prefix(PLACEHOLDER_ACTION)
        .map(|rest| rest.is_empty() || rest.starts_with('/'))
        .unwrap_or(false)
}

/// Rewrite a placeholder `action` parameter to `action`.
///
/// Only the effective `action` pair (the last one, since the last value wins)
/// is replaced; every other segment of the query and the fragment are kept
/// byte for byte. Earlier duplicate `action` pairs are left untouched.
///
/// Returns `None` when the URL is unparsable, has no `action` parameter, or
/// already carries a real action; re-applying to the output is a no-op.
pub fn rewrite_action(url: &str, action: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    let query = parsed.query()?.to_owned();
    let segments: Vec<&str> = query.split('&').collect();

    let index = segments
        .iter()
        .rposition(|segment| decode_pair(segment).is_some_and(|(key, _)| key == ACTION_PARAM))?;
    let (_, value) = decode_pair(segments[index])?;
    if !is_placeholder_action(&value) {
        return None;
    }

    let encoded: String = form_urlencoded::byte_serialize(action.as_bytes()).collect();
    let replacement = format!("{}={}", ACTION_PARAM, encoded);
    let rewritten = segments
        .iter()
        .enumerate()
        .map(|(i, segment)| if i == index { replacement.as_str() } else { *segment })
        .collect::<Vec<_>>()
        .join("&");

    parsed.set_query(Some(&rewritten));
    Some(parsed.into())
}

fn decode_pair(segment: &str) -> Option<(String, String)> {
    form_urlencoded::parse(segment.as_bytes())
        .next()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
}

/// JS snippet the host injects to send the page to `url`
pub fn redirect_script(url: &str) -> String {
    format!("window.location = {};", serde_json::Value::from(url))
}

/// Observer lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObserverState {
    /// Nothing seen yet
    Idle,
    /// A placeholder action was rewritten; waiting for the result redirect
    ActionPending,
    /// Success or failure URL matched; terminal
    Resolved,
}

impl fmt::Display for ObserverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObserverState::Idle => write!(f, "idle"),
            ObserverState::ActionPending => write!(f, "action_pending"),
            ObserverState::Resolved => write!(f, "resolved"),
        }
    }
}

/// Result delivered to the handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    /// Query parameters of the success/failure URL
    pub params: QueryParams,
    /// True when the failure URL matched
    pub is_error: bool,
}

/// A navigation notification from the web view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEvent {
    /// The URL the page navigated to
    pub url: String,
}

impl NavigationEvent {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// What the host should do after a navigation event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Nothing to do
    NoOp,
    /// Navigate the page to this URL
    Redirect(String),
    /// Checkout finished; stop loading
    Resolve(PaymentOutcome),
}

impl NavigationDecision {
    /// Script to inject for a redirect
    pub fn redirect_script(&self) -> Option<String> {
        match self {
            NavigationDecision::Redirect(url) => Some(redirect_script(url)),
            _ => None,
        }
    }

    /// Whether the host should stop loading the page
    pub fn should_stop_loading(&self) -> bool {
        matches!(self, NavigationDecision::Resolve(_))
    }
}

/// Receives the checkout result
pub trait ResultHandler {
    fn on_result(&mut self, outcome: &PaymentOutcome);
}

impl<F> ResultHandler for F
where
    F: FnMut(&QueryParams, bool),
{
    fn on_result(&mut self, outcome: &PaymentOutcome) {
        self(&outcome.params, outcome.is_error)
    }
}

/// Handler that only logs the result
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingResultHandler;

impl ResultHandler for LoggingResultHandler {
    fn on_result(&mut self, outcome: &PaymentOutcome) {
        if outcome.is_error {
            warn!("Checkout failed: {:?}", outcome.params);
        } else {
            info!("Checkout succeeded: {:?}", outcome.params);
        }
    }
}

/// Per-session navigation state machine
pub struct NavigationObserver {
    config: CheckoutConfig,
    handler: Option<Box<dyn ResultHandler>>,
    state: ObserverState,
}

impl NavigationObserver {
    /// Observer without a result handler: only action rewrites happen
    pub fn new(config: CheckoutConfig) -> Self {
        Self {
            config,
            handler: None,
            state: ObserverState::Idle,
        }
    }

    /// Builder: attach the result handler
    pub fn with_handler(mut self, handler: impl ResultHandler + 'static) -> Self {
        self.set_handler(handler);
        self
    }

    /// Attach or replace the result handler
    pub fn set_handler(&mut self, handler: impl ResultHandler + 'static) {
        self.handler = Some(Box::new(handler));
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    pub fn state(&self) -> ObserverState {
        self.state
    }

    pub fn is_resolved(&self) -> bool {
        self.state == ObserverState::Resolved
    }

    /// Feed one navigation event
    pub fn observe_event(&mut self, event: &NavigationEvent) -> NavigationDecision {
        self.observe(&event.url)
    }

    /// Feed one navigation URL
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn observe(&mut self, url: &str) -> NavigationDecision {
        if self.state == ObserverState::Resolved {
            debug!("Already resolved, ignoring navigation");
            return NavigationDecision::NoOp;
        }

        if let Some(rewritten) = rewrite_action(url, &self.config.action) {
            info!("Rewriting placeholder action: {}", rewritten);
            self.state = ObserverState::ActionPending;
            return NavigationDecision::Redirect(rewritten);
        }

        let Some(handler) = self.handler.as_mut() else {
            return NavigationDecision::NoOp;
        };

        let is_error = if matches_url(url, self.config.success_url.as_deref()) {
            false
        } else if matches_url(url, self.config.failure_url.as_deref()) {
            true
        } else {
            return NavigationDecision::NoOp;
        };

        let outcome = PaymentOutcome {
            params: extract_query(url),
            is_error,
        };

        self.state = ObserverState::Resolved;
        info!(is_error, params = outcome.params.len(), "Checkout resolved");
        handler.on_result(&outcome);

        NavigationDecision::Resolve(outcome)
    }
}

impl fmt::Debug for NavigationObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationObserver")
            .field("config", &self.config)
            .field("has_handler", &self.handler.is_some())
            .field("state", &self.state)
            .finish()
    }
}

fn matches_url(url: &str, pattern: Option<&str>) -> bool {
    pattern.is_some_and(|pattern| url.contains(pattern))
}
