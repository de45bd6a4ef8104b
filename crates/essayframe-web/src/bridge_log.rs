#![forbid(unsafe_code)]

//! Bounded diagnostic log of routing outcomes.
//!
//! Every dispatched click — intercepted or not — leaves one record here so
//! an embedding host can drain them and explain why a link did or did not
//! escape the iframe. The log is advisory: dropping old records never
//! affects routing.

use serde::Serialize;

use essayframe_core::route::RouteDecision;

/// Cap on retained route records; oldest entries are evicted first.
pub const MAX_ROUTE_LOG: usize = 256;

/// One click dispatch as seen by the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteLogRecord {
    /// Raw `href` of the nearest enclosing anchor, if there was one.
    pub href: Option<String>,
    #[serde(flatten)]
    pub decision: RouteDecision,
}

impl RouteLogRecord {
    #[must_use]
    pub fn new(href: Option<String>, decision: RouteDecision) -> Self {
        Self { href, decision }
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Append keeping at most `limit` entries, evicting from the front.
pub fn push_bounded<T>(queue: &mut Vec<T>, item: T, limit: usize) {
    if queue.len() >= limit {
        let overflow = queue.len() - limit + 1;
        queue.drain(..overflow);
    }
    queue.push(item);
}
