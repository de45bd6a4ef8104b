#![forbid(unsafe_code)]

//! Embedding-context detection and misconfiguration diagnostics.
//!
//! The bridge behaves identically whether or not anyone is listening, but a
//! host UI wants to *say* when something is off: the page is running
//! standalone (height reports have no consumer), or the parent domain came
//! from the hardcoded fallback because no configuration was supplied. This
//! module classifies the embedding context and renders a one-line banner
//! string; it never changes bridge behavior.

use serde::Serialize;

use crate::config::{BridgeConfig, DomainSource};

/// Where this document is running relative to an embedding parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedContext {
    /// Top-level browsing context; no parent to report to.
    TopLevel,
    /// Embedded, and the parent's origin is readable (same-origin frame).
    SameOriginFrame,
    /// Embedded by a foreign origin; the parent is opaque.
    CrossOriginFrame,
}

impl EmbedContext {
    /// Classify from what the shell can observe about `window.parent`.
    ///
    /// Browsers report `window.parent === window` at the top level rather
    /// than a missing reference, so "embedded" means a parent exists and is
    /// distinct from the window itself.
    #[must_use]
    pub const fn classify(is_embedded: bool, parent_origin_visible: bool) -> Self {
        match (is_embedded, parent_origin_visible) {
            (false, _) => Self::TopLevel,
            (true, true) => Self::SameOriginFrame,
            (true, false) => Self::CrossOriginFrame,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopLevel => "top_level",
            Self::SameOriginFrame => "same_origin_frame",
            Self::CrossOriginFrame => "cross_origin_frame",
        }
    }

    /// Whether a height-report consumer can exist at all.
    ///
    /// Advisory only: the reporter keeps running regardless, since posts to
    /// a self-parent are guarded no-ops anyway.
    #[must_use]
    pub const fn expects_height_consumer(self) -> bool {
        !matches!(self, Self::TopLevel)
    }
}

// ---------------------------------------------------------------------------
// Diagnostics snapshot
// ---------------------------------------------------------------------------

/// Everything a host banner needs to describe the embedding situation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedDiagnostics {
    pub context: EmbedContext,
    pub parent_domain: String,
    pub domain_source: DomainSource,
    /// Origin of this document, when the shell could read one.
    pub page_origin: Option<String>,
}

impl EmbedDiagnostics {
    /// Gather diagnostics from the resolved configuration and the observed
    /// embedding context.
    #[must_use]
    pub fn gather(
        config: &BridgeConfig,
        context: EmbedContext,
        page_origin: Option<String>,
    ) -> Self {
        Self {
            context,
            parent_domain: config.parent_domain().to_string(),
            domain_source: config.domain_source(),
            page_origin,
        }
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// One-line human-readable banner string.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut line = match self.context {
            EmbedContext::TopLevel => {
                "page is running standalone; height reports have no consumer".to_string()
            }
            EmbedContext::SameOriginFrame => {
                format!("embedded same-origin; deep links route to {}", self.parent_domain)
            }
            EmbedContext::CrossOriginFrame => {
                format!("embedded cross-origin; deep links route to {}", self.parent_domain)
            }
        };
        if self.domain_source == DomainSource::Default {
            line.push_str(" (parent domain is the hardcoded fallback; no configuration supplied)");
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use pretty_assertions::assert_eq;

    // -- classification --

    #[test]
    fn standalone_page_is_top_level() {
        assert_eq!(EmbedContext::classify(false, false), EmbedContext::TopLevel);
        assert_eq!(EmbedContext::classify(false, true), EmbedContext::TopLevel);
    }

    #[test]
    fn readable_parent_origin_means_same_origin_frame() {
        assert_eq!(
            EmbedContext::classify(true, true),
            EmbedContext::SameOriginFrame
        );
    }

    #[test]
    fn opaque_parent_means_cross_origin_frame() {
        assert_eq!(
            EmbedContext::classify(true, false),
            EmbedContext::CrossOriginFrame
        );
    }

    #[test]
    fn only_top_level_lacks_a_consumer() {
        assert!(!EmbedContext::TopLevel.expects_height_consumer());
        assert!(EmbedContext::SameOriginFrame.expects_height_consumer());
        assert!(EmbedContext::CrossOriginFrame.expects_height_consumer());
    }

    // -- diagnostics --

    fn diagnostics(context: EmbedContext, override_domain: Option<&str>) -> EmbedDiagnostics {
        let config = BridgeConfig::resolve(override_domain).unwrap();
        EmbedDiagnostics::gather(&config, context, Some("https://app.test".to_string()))
    }

    #[test]
    fn fallback_domain_is_called_out_in_the_banner() {
        let line = diagnostics(EmbedContext::CrossOriginFrame, None).describe();
        assert!(line.contains("hardcoded fallback"), "got {line}");
    }

    #[test]
    fn configured_domain_banner_names_the_domain() {
        let line =
            diagnostics(EmbedContext::CrossOriginFrame, Some("https://example.com")).describe();
        assert!(line.contains("https://example.com"), "got {line}");
        assert!(!line.contains("hardcoded fallback"), "got {line}");
    }

    #[test]
    fn standalone_banner_mentions_missing_consumer() {
        let line = diagnostics(EmbedContext::TopLevel, Some("https://example.com")).describe();
        assert!(line.contains("standalone"), "got {line}");
    }

    #[test]
    fn snapshot_serializes_context_and_source() {
        let json = diagnostics(EmbedContext::SameOriginFrame, None).to_json();
        assert!(json.contains("\"same_origin_frame\""), "got {json}");
        assert!(json.contains("\"default\""), "got {json}");
    }
}
