#![forbid(unsafe_code)]

//! One-shot resolution of the embed-bridge configuration.
//!
//! The parent domain decides where intercepted links land, so a wrong value
//! is the layer's main correctness risk: redirects silently go to the wrong
//! host. Resolution is therefore layered and happens exactly once, at bridge
//! construction:
//!
//! 1. an explicit host override (the JS options object),
//! 2. the `ESSAYFRAME_PARENT_DOMAIN` build-time setting,
//! 3. the hardcoded production default.
//!
//! The resolved [`BridgeConfig`] is immutable for the life of the bridge.

use serde::Serialize;

/// Production host the essay pages are embedded from.
pub const DEFAULT_PARENT_DOMAIN: &str = "https://dikagirawan-liqpb.wpcomstaging.com";

/// Build-time domain override, baked into the binary the way front-end
/// bundlers bake publishable environment settings.
const BUILD_PARENT_DOMAIN: Option<&str> = option_env!("ESSAYFRAME_PARENT_DOMAIN");

/// Default cadence of the unconditional height-report timer.
pub const DEFAULT_REPORT_INTERVAL_MS: u32 = 1_000;
/// Lower bound for a host-supplied report interval.
pub const MIN_REPORT_INTERVAL_MS: u32 = 100;
/// Upper bound for a host-supplied report interval.
pub const MAX_REPORT_INTERVAL_MS: u32 = 60_000;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Configuration rejected at the bridge boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Host-supplied domain is missing an `http://`/`https://` scheme.
    InvalidDomain(String),
    /// Host-supplied report interval is outside the accepted range.
    IntervalOutOfRange(u32),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidDomain(domain) => {
                write!(f, "parent domain must start with http:// or https://: {domain:?}")
            }
            Self::IntervalOutOfRange(ms) => write!(
                f,
                "report interval must be in \
                 {MIN_REPORT_INTERVAL_MS}..={MAX_REPORT_INTERVAL_MS} ms, got {ms}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Domain source
// ---------------------------------------------------------------------------

/// Which configuration layer supplied the parent domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainSource {
    /// Explicit override from the embedding host's options object.
    HostOverride,
    /// `ESSAYFRAME_PARENT_DOMAIN` set when the binary was built.
    BuildEnv,
    /// Hardcoded fallback ([`DEFAULT_PARENT_DOMAIN`]).
    Default,
}

impl DomainSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HostOverride => "host_override",
            Self::BuildEnv => "build_env",
            Self::Default => "default",
        }
    }
}

// ---------------------------------------------------------------------------
// BridgeConfig
// ---------------------------------------------------------------------------

/// Resolved bridge configuration. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    parent_domain: String,
    domain_source: DomainSource,
    report_interval_ms: u32,
}

impl BridgeConfig {
    /// Resolve the parent domain from the layered sources.
    ///
    /// A blank or whitespace-only override counts as unset. An override with
    /// a non-HTTP scheme is rejected; a wrong-but-well-formed domain is
    /// accepted and will silently redirect there. A malformed build-time
    /// value degrades to the default instead of failing the page.
    pub fn resolve(host_override: Option<&str>) -> Result<Self, ConfigError> {
        let (parent_domain, domain_source) = match host_override.map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                if !has_http_scheme(raw) {
                    return Err(ConfigError::InvalidDomain(raw.to_string()));
                }
                (normalize_domain(raw), DomainSource::HostOverride)
            }
            _ => match BUILD_PARENT_DOMAIN.map(str::trim) {
                Some(raw) if !raw.is_empty() && has_http_scheme(raw) => {
                    (normalize_domain(raw), DomainSource::BuildEnv)
                }
                _ => (normalize_domain(DEFAULT_PARENT_DOMAIN), DomainSource::Default),
            },
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            domain = %parent_domain,
            source = domain_source.as_str(),
            "resolved parent domain"
        );

        Ok(Self {
            parent_domain,
            domain_source,
            report_interval_ms: DEFAULT_REPORT_INTERVAL_MS,
        })
    }

    /// Replace the report interval, enforcing the accepted range.
    pub fn with_report_interval_ms(mut self, ms: u32) -> Result<Self, ConfigError> {
        if !(MIN_REPORT_INTERVAL_MS..=MAX_REPORT_INTERVAL_MS).contains(&ms) {
            return Err(ConfigError::IntervalOutOfRange(ms));
        }
        self.report_interval_ms = ms;
        Ok(self)
    }

    /// Domain intercepted links are rewritten onto. No trailing slash.
    #[must_use]
    pub fn parent_domain(&self) -> &str {
        &self.parent_domain
    }

    /// Which configuration layer supplied the domain.
    #[must_use]
    pub const fn domain_source(&self) -> DomainSource {
        self.domain_source
    }

    /// Cadence of the periodic height-report timer, in milliseconds.
    #[must_use]
    pub const fn report_interval_ms(&self) -> u32 {
        self.report_interval_ms
    }
}

/// Trim whitespace and trailing slashes so `domain + path` concatenation
/// yields exactly one slash.
fn normalize_domain(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn has_http_scheme(raw: &str) -> bool {
    raw.starts_with("http://") || raw.starts_with("https://")
}
