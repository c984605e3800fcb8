//! Browser-side tests: `wasm-pack test --headless --firefox`

#![cfg(target_arch = "wasm32")]

use checkout_wasm::{extract_query_params, WasmCheckout};
use js_sys::{Function, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn to_js(value: serde_json::Value) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap()
}

fn config() -> JsValue {
    to_js(serde_json::json!({
        "amount": 100,
        "action": "https://shop.example.com/process",
        "publicKey": "TEST-pk",
        "successUrl": "/success",
        "failureUrl": "/failure",
    }))
}

fn get(value: &JsValue, key: &str) -> JsValue {
    Reflect::get(value, &JsValue::from_str(key)).unwrap()
}

#[wasm_bindgen_test]
fn rejects_invalid_config() {
    let bad = to_js(serde_json::json!({ "amount": 0, "action": "/p", "publicKey": "pk" }));
    assert!(WasmCheckout::new(bad).is_err());
}

#[wasm_bindgen_test]
fn redirects_placeholder_action() {
    let mut checkout = WasmCheckout::new(config()).unwrap();

    let decision = checkout
        .on_navigation("https://c.example.com/tok?action=null%2F")
        .unwrap();

    assert_eq!(get(&decision, "kind").as_string().unwrap(), "redirect");
    assert_eq!(checkout.state(), "action_pending");
}

#[wasm_bindgen_test]
fn resolves_once_with_callback() {
    let mut checkout = WasmCheckout::new(config()).unwrap();
    let calls = js_sys::Array::new();
    let target = calls.clone();

    let callback =
        Closure::<dyn FnMut(JsValue, bool)>::new(move |params: JsValue, is_error: bool| {
            target.push(&params);
            target.push(&JsValue::from_bool(is_error));
        });
    checkout.set_result_callback(callback.as_ref().unchecked_ref::<Function>().clone());

    let decision = checkout
        .on_navigation("https://x/failure?status=rejected&reason=timeout")
        .unwrap();
    checkout
        .on_navigation("https://x/failure?status=rejected")
        .unwrap();

    assert_eq!(get(&decision, "kind").as_string().unwrap(), "resolve");
    assert_eq!(calls.length(), 2);
    assert_eq!(get(&calls.get(0), "reason").as_string().unwrap(), "timeout");
    assert_eq!(calls.get(1).as_bool(), Some(true));
    assert_eq!(checkout.state(), "resolved");
}

#[wasm_bindgen_test]
fn extracts_plain_object() {
    let params = extract_query_params("https://x/success?status=approved").unwrap();
    assert_eq!(get(&params, "status").as_string().unwrap(), "approved");
}
