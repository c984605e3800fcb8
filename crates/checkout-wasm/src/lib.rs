//! # checkout-wasm
//!
//! WebAssembly bindings for webview-checkout-rs.
//!
//! The JavaScript host (e.g. a React Native `WebView` wrapper) keeps the web
//! view; this crate builds its source and tells it what to do on every
//! navigation:
//! - Building the checkout HTML / URL from a config object
//! - Observing navigation events (action rewrite, success / failure)
//! - Parsing query strings
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmCheckout } from 'webview-checkout-wasm';
//!
//! await init();
//!
//! const checkout = new WasmCheckout({
//!   amount: 100,
//!   action: 'https://shop.example.com/process',
//!   publicKey: 'TEST-pk',
//!   successUrl: '/checkout/success',
//!   failureUrl: '/checkout/failure',
//! });
//! checkout.setResultCallback((params, isError) => console.log(params, isError));
//!
//! <WebView
//!   source={{ html: checkout.html() }}
//!   onNavigationStateChange={(navState) => {
//!     const decision = checkout.onNavigationStateChange(navState);
//!     if (decision.kind === 'redirect') ref.current.injectJavaScript(decision.script);
//!     if (decision.kind === 'resolve') ref.current.stopLoading();
//!   }}
//! />
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

use checkout_core::{
    CheckoutConfig, NavigationDecision, NavigationEvent, NavigationObserver, PaymentOutcome,
    QueryParams, ResultHandler,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Decision handed back to JavaScript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DecisionView {
    /// Nothing to do
    NoOp,
    /// Inject `script` (navigates to `url`)
    Redirect { url: String, script: String },
    /// Stop loading; the result callback has fired
    Resolve {
        params: QueryParams,
        #[serde(rename = "isError")]
        is_error: bool,
    },
}

impl From<&NavigationDecision> for DecisionView {
    fn from(decision: &NavigationDecision) -> Self {
        match decision {
            NavigationDecision::NoOp => DecisionView::NoOp,
            NavigationDecision::Redirect(url) => DecisionView::Redirect {
                url: url.clone(),
                script: checkout_core::redirect_script(url),
            },
            NavigationDecision::Resolve(outcome) => DecisionView::Resolve {
                params: outcome.params.clone(),
                is_error: outcome.is_error,
            },
        }
    }
}

/// Forwards results to a JS `(params, isError) => void` function
struct JsResultHandler {
    callback: js_sys::Function,
}

impl ResultHandler for JsResultHandler {
    fn on_result(&mut self, outcome: &PaymentOutcome) {
        let params = match to_js(&outcome.params) {
            Ok(params) => params,
            Err(err) => {
                log_error("Failed to convert checkout result", &err);
                return;
            }
        };

        if let Err(err) =
            self.callback
                .call2(&JsValue::NULL, &params, &JsValue::from_bool(outcome.is_error))
        {
            log_error("Checkout result callback threw", &err);
        }
    }
}

/// One checkout session bound to a web view
#[wasm_bindgen]
pub struct WasmCheckout {
    observer: NavigationObserver,
}

#[wasm_bindgen]
impl WasmCheckout {
    /// Validate a config object (`camelCase` keys)
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmCheckout, JsValue> {
        let config = config_from_js(config)?;
        Ok(Self {
            observer: NavigationObserver::new(config),
        })
    }

    /// HTML source for the web view
    #[wasm_bindgen]
    pub fn html(&self) -> String {
        checkout_core::render_html(self.observer.config())
    }

    /// Hosted checkout page URL carrying the config as query parameters
    #[wasm_bindgen]
    pub fn url(&self, base: &str) -> Result<String, JsValue> {
        checkout_core::checkout_url(self.observer.config(), base)
            .map(String::from)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Set the `(params, isError) => void` result callback
    #[wasm_bindgen(js_name = setResultCallback)]
    pub fn set_result_callback(&mut self, callback: js_sys::Function) {
        self.observer.set_handler(JsResultHandler { callback });
    }

    /// Feed a navigation URL; returns `{ kind, ... }`
    #[wasm_bindgen(js_name = onNavigation)]
    pub fn on_navigation(&mut self, url: &str) -> Result<JsValue, JsValue> {
        let decision = self.observer.observe(url);
        to_js(&DecisionView::from(&decision))
    }

    /// Feed a web view navigation state object (`{ url, ... }`)
    #[wasm_bindgen(js_name = onNavigationStateChange)]
    pub fn on_navigation_state_change(&mut self, nav_state: JsValue) -> Result<JsValue, JsValue> {
        let event: NavigationEvent = serde_wasm_bindgen::from_value(nav_state)
            .map_err(|e| JsValue::from_str(&format!("Invalid navigation state: {}", e)))?;
        let decision = self.observer.observe_event(&event);
        to_js(&DecisionView::from(&decision))
    }

    /// `idle`, `action_pending` or `resolved`
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.observer.state().to_string()
    }
}

/// Build the checkout HTML straight from a config object
#[wasm_bindgen(js_name = buildCheckoutHtml)]
pub fn build_checkout_html(config: JsValue) -> Result<String, JsValue> {
    let config = config_from_js(config)?;
    Ok(checkout_core::render_html(&config))
}

/// Decoded query parameters of a URL as a plain object
#[wasm_bindgen(js_name = extractQueryParams)]
pub fn extract_query_params(url: &str) -> Result<JsValue, JsValue> {
    to_js(&checkout_core::extract_query(url))
}

/// `window.location = "...";` for `injectJavaScript`
#[wasm_bindgen(js_name = redirectScript)]
pub fn redirect_script(url: &str) -> String {
    checkout_core::redirect_script(url)
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn config_from_js(config: JsValue) -> Result<CheckoutConfig, JsValue> {
    serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsValue::from_str(&format!("Invalid checkout config: {}", e)))
}

/// Plain objects rather than `Map`s
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn log_error(message: &str, err: &JsValue) {
    web_sys::console::error_2(&JsValue::from_str(message), err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decision_view_noop() {
        let view = DecisionView::from(&NavigationDecision::NoOp);
        assert_eq!(serde_json::to_value(&view).unwrap(), json!({ "kind": "noOp" }));
    }

    #[test]
    fn test_decision_view_redirect() {
        let view = DecisionView::from(&NavigationDecision::Redirect(
            "https://x/?action=%2Fp".to_string(),
        ));

        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            json!({
                "kind": "redirect",
                "url": "https://x/?action=%2Fp",
                "script": "window.location = \"https://x/?action=%2Fp\";"
            })
        );
    }

    #[test]
    fn test_decision_view_resolve() {
        let view = DecisionView::from(&NavigationDecision::Resolve(PaymentOutcome {
            params: QueryParams::new().with("status", "approved"),
            is_error: false,
        }));

        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            json!({
                "kind": "resolve",
                "params": { "status": "approved" },
                "isError": false
            })
        );
    }

    #[test]
    fn test_redirect_script() {
        assert_eq!(redirect_script("https://x/"), "window.location = \"https://x/\";");
    }

    #[test]
    fn test_version() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }
}
