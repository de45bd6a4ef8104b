#![forbid(unsafe_code)]

//! WASM embed bridge for essay pages hosted inside a parent-site iframe.
//!
//! This crate provides [`EmbedBridge`], a `wasm-bindgen`-exported lifecycle
//! object wrapping the deterministic policy layer in `essayframe-core` with
//! the actual DOM wiring:
//!
//! - a delegated document `click` listener that rewrites `/essay/` and
//!   `/excel/` deep links onto the parent domain at the top level, and
//! - a height reporter (window `load`/`resize`, a `ResizeObserver` on the
//!   body, and a periodic timer) posting `{ type: "DGI_APP_HEIGHT", height }`
//!   to the embedding parent so it can size the iframe.
//!
//! Everything installable is also uninstallable: `start*()` returns only
//! after listeners/observers/timers are registered, and `stop*()` tears them
//! down deterministically instead of relying on page unload.

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::EmbedBridge;

// Log records are used by the wasm module and by native tests.
#[cfg(any(target_arch = "wasm32", test))]
mod bridge_log;

#[cfg(test)]
mod tests {
    use crate::bridge_log::{MAX_ROUTE_LOG, RouteLogRecord, push_bounded};
    use essayframe_core::route::RoutePolicy;
    use pretty_assertions::assert_eq;

    fn record(policy: &RoutePolicy, href: &str) -> RouteLogRecord {
        RouteLogRecord::new(Some(href.to_string()), policy.evaluate(Some(href)))
    }

    #[test]
    fn route_log_records_serialize_both_outcomes() {
        let policy = RoutePolicy::new("https://example.com");

        let json = record(&policy, "/essay/a").to_json();
        assert!(json.contains("\"decision\":\"redirect\""), "got {json}");
        assert!(json.contains("https://example.com/essay/a"), "got {json}");

        let json = record(&policy, "/other/a").to_json();
        assert!(json.contains("\"unmatched_path\""), "got {json}");
    }

    #[test]
    fn route_log_is_bounded_and_evicts_oldest_first() {
        let policy = RoutePolicy::new("https://example.com");
        let mut log = Vec::new();
        for index in 0..MAX_ROUTE_LOG + 10 {
            let href = format!("/essay/{index}");
            push_bounded(&mut log, record(&policy, &href), MAX_ROUTE_LOG);
        }
        assert_eq!(log.len(), MAX_ROUTE_LOG);
        assert_eq!(log[0].href.as_deref(), Some("/essay/10"));
        assert_eq!(
            log.last().unwrap().href.as_deref(),
            Some(format!("/essay/{}", MAX_ROUTE_LOG + 9).as_str())
        );
    }
}
