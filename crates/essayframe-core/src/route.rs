#![forbid(unsafe_code)]

//! Link-routing policy: which anchor clicks escape the iframe sandbox.
//!
//! An essay page rendered inside a host-site iframe must not let deep links
//! navigate *inside* the frame — an `/essay/...` click should load the full
//! host page at the top level instead. This module holds the pure decision:
//! the wasm shell feeds in the clicked anchor's `href` and performs whatever
//! [`RouteDecision`] comes back.
//!
//! Interception is a fixed two-entry prefix allow-list. Prefix match, not
//! substring match: `/blog/essay/x` passes through untouched. Every click is
//! evaluated independently; there is no debouncing or de-duplication.

use serde::Serialize;

use crate::config::BridgeConfig;

/// Path prefixes rewritten onto the parent domain.
pub const INTERCEPTED_PREFIXES: [&str; 2] = ["/essay/", "/excel/"];

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// Deterministic reason why a click was left to the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassthroughReason {
    /// No enclosing anchor, or the anchor carries no `href` attribute.
    MissingHref,
    /// The `href` does not start with an intercepted prefix.
    UnmatchedPath,
}

impl PassthroughReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingHref => "missing_href",
            Self::UnmatchedPath => "unmatched_path",
        }
    }
}

/// Outcome of evaluating one click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum RouteDecision {
    /// Suppress default navigation and load `url` in the top-level window.
    Redirect {
        url: String,
        prefix: &'static str,
    },
    /// Take no action; the browser handles the click normally.
    Passthrough { reason: PassthroughReason },
}

impl RouteDecision {
    #[must_use]
    pub const fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect { .. })
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Evaluates clicked hrefs against the prefix allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    parent_domain: String,
}

impl RoutePolicy {
    /// Build a policy from an already-resolved configuration.
    #[must_use]
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            parent_domain: config.parent_domain().to_string(),
        }
    }

    /// Build a policy from a bare domain (tests, embedded tooling).
    #[must_use]
    pub fn new(parent_domain: impl Into<String>) -> Self {
        Self {
            parent_domain: parent_domain.into(),
        }
    }

    /// Domain redirected links are rewritten onto.
    #[must_use]
    pub fn parent_domain(&self) -> &str {
        &self.parent_domain
    }

    /// Decide what to do with one click.
    ///
    /// `href` is the raw attribute value of the nearest enclosing anchor, or
    /// `None` when the click has no enclosing anchor with an `href`. The
    /// redirect URL is the exact concatenation `parent_domain + href`.
    #[must_use]
    pub fn evaluate(&self, href: Option<&str>) -> RouteDecision {
        let Some(href) = href else {
            return RouteDecision::Passthrough {
                reason: PassthroughReason::MissingHref,
            };
        };

        let Some(prefix) = matched_prefix(href) else {
            return RouteDecision::Passthrough {
                reason: PassthroughReason::UnmatchedPath,
            };
        };

        let url = format!("{}{href}", self.parent_domain);

        #[cfg(feature = "tracing")]
        tracing::debug!(%href, %url, "intercepting navigation");

        RouteDecision::Redirect { url, prefix }
    }
}

/// First allow-list prefix that `href` starts with, if any.
#[must_use]
pub fn matched_prefix(href: &str) -> Option<&'static str> {
    INTERCEPTED_PREFIXES
        .into_iter()
        .find(|prefix| href.starts_with(prefix))
}
