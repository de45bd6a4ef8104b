#![forbid(unsafe_code)]

//! Height-report telemetry shaped for the embedding parent.
//!
//! The parent window sizes the iframe from `{ type: "DGI_APP_HEIGHT",
//! height }` messages, so the page never shows an internal scrollbar. The
//! channel is pure at-least-once, fire-and-forget telemetry: no handshake,
//! no acknowledgment, no backpressure. Consumers must be idempotent on
//! repeated identical heights, and this module deliberately applies no
//! coalescing or debounce — every trigger produces a post.
//!
//! # Design
//!
//! - [`ReportTrigger`] names the four sources that can force a measurement
//!   (load, resize, body mutation, periodic tick). All of them feed the one
//!   [`HeightReporter::observe`] entry point, so a coalescing policy could
//!   be added later without touching call sites.
//! - [`HeightReporter`] is the mutable reporting state: per-trigger
//!   counters and the last measured height, exported as a
//!   [`ReporterSnapshot`] for diagnostics.
//!
//! The wire payload uses a wildcard target origin on the sending side. That
//! is a latent looseness (any embedding page receives the height values, not
//! just the intended host) preserved deliberately; see DESIGN.md.

use serde::Serialize;

/// Wire tag of the height message. Unversioned; no schema enforcement.
pub const HEIGHT_MESSAGE_TYPE: &str = "DGI_APP_HEIGHT";

/// Greater of the root element's and body's scroll heights, clamped at zero.
///
/// Scroll heights arrive as DOM `i32` values; a detached or empty document
/// reports 0, never an error.
#[must_use]
pub fn page_height(root_scroll_height: i32, body_scroll_height: i32) -> u32 {
    root_scroll_height.max(body_scroll_height).max(0) as u32
}

// ---------------------------------------------------------------------------
// Wire payload
// ---------------------------------------------------------------------------

/// One height message as posted to the parent window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeightReport {
    /// Always [`HEIGHT_MESSAGE_TYPE`].
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Rendered document height in pixels.
    pub height: u32,
}

impl HeightReport {
    #[must_use]
    pub const fn new(height: u32) -> Self {
        Self {
            kind: HEIGHT_MESSAGE_TYPE,
            height,
        }
    }

    /// JSON form of the wire payload.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

/// Source that forced a height measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportTrigger {
    /// Immediate report outside any DOM trigger (installation, host call).
    Install,
    /// Window `load` event (one-shot).
    Load,
    /// Window `resize` event.
    Resize,
    /// Resize-observation callback on the document body.
    BodyMutation,
    /// Unconditional periodic timer.
    Tick,
}

impl ReportTrigger {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Load => "load",
            Self::Resize => "resize",
            Self::BodyMutation => "body_mutation",
            Self::Tick => "tick",
        }
    }
}

// ---------------------------------------------------------------------------
// Reporter state
// ---------------------------------------------------------------------------

/// Per-trigger report counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TriggerCounts {
    pub install: u64,
    pub load: u64,
    pub resize: u64,
    pub body_mutation: u64,
    pub tick: u64,
}

impl TriggerCounts {
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.install + self.load + self.resize + self.body_mutation + self.tick
    }

    fn bump(&mut self, trigger: ReportTrigger) {
        match trigger {
            ReportTrigger::Install => self.install += 1,
            ReportTrigger::Load => self.load += 1,
            ReportTrigger::Resize => self.resize += 1,
            ReportTrigger::BodyMutation => self.body_mutation += 1,
            ReportTrigger::Tick => self.tick += 1,
        }
    }
}

/// Mutable reporting state behind the four trigger sources.
#[derive(Debug, Clone, Default)]
pub struct HeightReporter {
    last_height: Option<u32>,
    counts: TriggerCounts,
}

impl HeightReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one measurement and produce the payload to post.
    ///
    /// Always emits, including for a height identical to the previous one —
    /// duplicate reports are benign by contract.
    pub fn observe(&mut self, trigger: ReportTrigger, height: u32) -> HeightReport {
        self.counts.bump(trigger);
        self.last_height = Some(height);

        #[cfg(feature = "tracing")]
        tracing::trace!(trigger = trigger.as_str(), height, "height report");

        HeightReport::new(height)
    }

    /// Height from the most recent observation, if any.
    #[must_use]
    pub const fn last_height(&self) -> Option<u32> {
        self.last_height
    }

    /// Total reports emitted since installation.
    #[must_use]
    pub const fn total_reports(&self) -> u64 {
        self.counts.total()
    }

    /// Diagnostic snapshot of the reporting state.
    #[must_use]
    pub const fn snapshot(&self) -> ReporterSnapshot {
        ReporterSnapshot {
            last_height: self.last_height,
            total_reports: self.counts.total(),
            counts: self.counts,
        }
    }
}

/// Immutable view of a [`HeightReporter`] for logs and host diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReporterSnapshot {
    pub last_height: Option<u32>,
    pub total_reports: u64,
    pub counts: TriggerCounts,
}

impl ReporterSnapshot {
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
