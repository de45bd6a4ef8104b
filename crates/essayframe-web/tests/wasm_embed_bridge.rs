#![cfg(target_arch = "wasm32")]
#![forbid(unsafe_code)]

//! Browser-side integration coverage for [`EmbedBridge`].
//!
//! Redirecting clicks would navigate the harness page away, so interception
//! itself is exercised natively in `essayframe-core`; here we drive the real
//! DOM through the passthrough paths and the reporter/diagnostic surface.

use essayframe_web::EmbedBridge;
use js_sys::{Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::HtmlElement;

wasm_bindgen_test_configure!(run_in_browser);

fn options(entries: &[(&str, JsValue)]) -> JsValue {
    let obj = Object::new();
    for (key, value) in entries {
        Reflect::set(&obj, &JsValue::from_str(key), value).unwrap();
    }
    obj.into()
}

fn get(value: &JsValue, key: &str) -> JsValue {
    Reflect::get(value, &JsValue::from_str(key)).unwrap()
}

#[wasm_bindgen_test]
fn default_domain_is_the_hardcoded_fallback() {
    let bridge = EmbedBridge::new(JsValue::UNDEFINED).unwrap();
    assert_eq!(
        bridge.parent_domain(),
        "https://dikagirawan-liqpb.wpcomstaging.com"
    );
}

#[wasm_bindgen_test]
fn parent_domain_override_is_normalized() {
    let bridge = EmbedBridge::new(options(&[(
        "parentDomain",
        JsValue::from_str("https://example.com/"),
    )]))
    .unwrap();
    assert_eq!(bridge.parent_domain(), "https://example.com");
}

#[wasm_bindgen_test]
fn non_string_domain_option_is_rejected() {
    let err = EmbedBridge::new(options(&[("parentDomain", JsValue::from_f64(42.0))]))
        .err()
        .expect("non-string domain should be rejected");
    let msg = err.as_string().unwrap_or_default();
    assert!(msg.contains("parentDomain"), "got {msg}");
}

#[wasm_bindgen_test]
fn out_of_range_interval_is_rejected() {
    let err = EmbedBridge::new(options(&[(
        "reportIntervalMs",
        JsValue::from_f64(10.0),
    )]))
    .err()
    .expect("out-of-range interval should be rejected");
    let msg = err.as_string().unwrap_or_default();
    assert!(msg.contains("report interval"), "got {msg}");
}

#[wasm_bindgen_test]
fn report_now_produces_the_wire_payload() {
    let bridge = EmbedBridge::new(JsValue::UNDEFINED).unwrap();
    let payload = bridge.report_now();

    assert_eq!(
        get(&payload, "type").as_string().as_deref(),
        Some("DGI_APP_HEIGHT")
    );
    let height = get(&payload, "height").as_f64().unwrap();
    assert!(height >= 0.0);

    let snapshot = bridge.reporter_snapshot();
    assert_eq!(get(&snapshot, "totalReports").as_f64(), Some(1.0));
    assert_eq!(get(&snapshot, "lastHeight").as_f64(), Some(height));
}

#[wasm_bindgen_test]
fn repeated_reports_with_static_dom_are_identical() {
    let bridge = EmbedBridge::new(JsValue::UNDEFINED).unwrap();
    let first = bridge.report_now();
    let second = bridge.report_now();
    assert_eq!(
        get(&first, "height").as_f64(),
        get(&second, "height").as_f64()
    );
    let snapshot = bridge.reporter_snapshot();
    assert_eq!(get(&snapshot, "totalReports").as_f64(), Some(2.0));
}

#[wasm_bindgen_test]
fn lifecycle_is_idempotent() {
    let mut bridge = EmbedBridge::new(JsValue::UNDEFINED).unwrap();
    assert!(!bridge.router_active());

    bridge.start().unwrap();
    bridge.start().unwrap();
    assert!(bridge.router_active());
    assert!(bridge.reporter_active());

    bridge.stop();
    bridge.stop();
    assert!(!bridge.router_active());
    assert!(!bridge.reporter_active());
}

#[wasm_bindgen_test]
fn clicks_without_an_intercepted_prefix_are_logged_as_passthrough() {
    let document = web_sys::window().unwrap().document().unwrap();
    let body = document.body().unwrap();

    let anchor = document.create_element("a").unwrap();
    anchor.set_attribute("href", "#fragment").unwrap();
    anchor.set_text_content(Some("same-page link"));
    body.append_child(&anchor).unwrap();

    let mut bridge = EmbedBridge::new(JsValue::UNDEFINED).unwrap();
    bridge.start_router().unwrap();

    anchor.dyn_ref::<HtmlElement>().unwrap().click();

    let log = bridge.drain_route_log();
    assert_eq!(log.length(), 1);
    let record = log.get(0);
    assert_eq!(
        get(&record, "href").as_string().as_deref(),
        Some("#fragment")
    );
    assert_eq!(
        get(&record, "decision").as_string().as_deref(),
        Some("passthrough")
    );
    assert_eq!(
        get(&record, "reason").as_string().as_deref(),
        Some("unmatched_path")
    );

    bridge.stop_router();
    body.remove_child(&anchor).unwrap();
}

#[wasm_bindgen_test]
fn clicks_outside_any_anchor_are_logged_without_href() {
    let document = web_sys::window().unwrap().document().unwrap();
    let body = document.body().unwrap();

    let div = document.create_element("div").unwrap();
    body.append_child(&div).unwrap();

    let mut bridge = EmbedBridge::new(JsValue::UNDEFINED).unwrap();
    bridge.start_router().unwrap();

    div.dyn_ref::<HtmlElement>().unwrap().click();

    let log = bridge.drain_route_log();
    assert_eq!(log.length(), 1);
    let record = log.get(0);
    assert!(get(&record, "href").is_null());
    assert_eq!(
        get(&record, "reason").as_string().as_deref(),
        Some("missing_href")
    );

    bridge.stop_router();
    body.remove_child(&div).unwrap();
}

#[wasm_bindgen_test]
fn stopped_router_records_nothing() {
    let document = web_sys::window().unwrap().document().unwrap();
    let body = document.body().unwrap();

    let anchor = document.create_element("a").unwrap();
    anchor.set_attribute("href", "#after-stop").unwrap();
    body.append_child(&anchor).unwrap();

    let mut bridge = EmbedBridge::new(JsValue::UNDEFINED).unwrap();
    bridge.start_router().unwrap();
    bridge.stop_router();

    anchor.dyn_ref::<HtmlElement>().unwrap().click();
    assert_eq!(bridge.drain_route_log().length(), 0);

    body.remove_child(&anchor).unwrap();
}

#[wasm_bindgen_test]
fn diagnostics_expose_context_and_domain_source() {
    let bridge = EmbedBridge::new(JsValue::UNDEFINED).unwrap();
    let diagnostics = bridge.diagnostics();

    let context = get(&diagnostics, "context").as_string().unwrap();
    assert!(
        ["top_level", "same_origin_frame", "cross_origin_frame"].contains(&context.as_str()),
        "got {context}"
    );
    assert_eq!(
        get(&diagnostics, "domainSource").as_string().as_deref(),
        Some("default")
    );

    let banner = bridge.describe_embedding();
    assert!(banner.contains("hardcoded fallback"), "got {banner}");
}
