#![forbid(unsafe_code)]

//! `essayframe-core` provides the deterministic building blocks for running
//! an essay page inside a host-site iframe.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment (the wasm shell, or a
//!   test) pushes clicks and height measurements in; this crate only decides.
//! - **No DOM types**: every decision is computable natively, so the whole
//!   protocol surface is testable without a browser.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! This crate intentionally does not bind to `wasm-bindgen`. The primary
//! purpose is to provide the policy/state layer that `essayframe-web` wraps
//! with a stable JS API:
//!
//! - [`config`] resolves the parent domain and report interval exactly once.
//! - [`route`] decides which anchor clicks escape the iframe sandbox.
//! - [`report`] shapes the height-report telemetry sent to the parent.
//! - [`embed`] classifies the embedding context for diagnostics.

pub mod config;
pub mod embed;
pub mod report;
pub mod route;

pub use config::{BridgeConfig, ConfigError, DEFAULT_PARENT_DOMAIN, DomainSource};
pub use embed::{EmbedContext, EmbedDiagnostics};
pub use report::{HEIGHT_MESSAGE_TYPE, HeightReport, HeightReporter, ReportTrigger};
pub use route::{INTERCEPTED_PREFIXES, PassthroughReason, RouteDecision, RoutePolicy};
