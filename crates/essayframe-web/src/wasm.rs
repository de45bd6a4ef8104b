#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for the embed bridge.
//!
//! This module wires [`essayframe_core`]'s policy layer to the real DOM:
//! listeners, observer, and timer are owned [`Closure`]s held by the bridge
//! and released on `stop*()`. Only compiled on `wasm32` targets.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Object, Reflect};
use tracing::{debug, trace, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, ResizeObserver, Window};

use crate::bridge_log::{MAX_ROUTE_LOG, RouteLogRecord, push_bounded};
use essayframe_core::config::BridgeConfig;
use essayframe_core::embed::{EmbedContext, EmbedDiagnostics};
use essayframe_core::report::{HeightReport, HeightReporter, ReportTrigger, page_height};
use essayframe_core::route::{RouteDecision, RoutePolicy};

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

fn set_js(obj: &Object, key: &str, value: JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), &value);
}

/// Counters cross the boundary as plain JS numbers, not BigInts.
fn count_to_js(count: u64) -> JsValue {
    JsValue::from_f64(count as f64)
}

// ---------------------------------------------------------------------------
// Options parsing
// ---------------------------------------------------------------------------

fn get_string_opt(options: &JsValue, key: &str) -> Result<Option<String>, JsValue> {
    let value = Reflect::get(options, &JsValue::from_str(key))?;
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    value
        .as_string()
        .map(Some)
        .ok_or_else(|| JsValue::from_str(&format!("field {key} must be a string")))
}

fn get_u32_opt(options: &JsValue, key: &str) -> Result<Option<u32>, JsValue> {
    let value = Reflect::get(options, &JsValue::from_str(key))?;
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    let number = value
        .as_f64()
        .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
        .ok_or_else(|| JsValue::from_str(&format!("field {key} must be a non-negative integer")))?;
    if number > f64::from(u32::MAX) {
        return Err(JsValue::from_str(&format!("field {key} out of range")));
    }
    Ok(Some(number as u32))
}

fn parse_bridge_config(options: Option<&JsValue>) -> Result<BridgeConfig, JsValue> {
    let domain = match options {
        Some(options) => {
            get_string_opt(options, "parentDomain")?.or(get_string_opt(options, "parent_domain")?)
        }
        None => None,
    };
    let mut config = BridgeConfig::resolve(domain.as_deref()).map_err(err_to_js)?;

    if let Some(options) = options {
        if let Some(ms) = get_u32_opt(options, "reportIntervalMs")?
            .or(get_u32_opt(options, "report_interval_ms")?)
        {
            config = config.with_report_interval_ms(ms).map_err(err_to_js)?;
        }
    }

    Ok(config)
}

fn err_to_js(err: impl std::error::Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

/// `href` of the nearest ancestor anchor carrying one, if the click landed
/// inside such an anchor.
fn anchor_href_from_event(event: &Event) -> Option<String> {
    let target = event.target()?;
    let element: &Element = target.dyn_ref::<Element>()?;
    let anchor = element.closest("a[href]").ok().flatten()?;
    anchor.get_attribute("href")
}

/// Parent window when this document is actually embedded.
///
/// Browsers report `window.parent === window` at the top level, so a parent
/// identical to the window itself counts as absent.
fn embedding_parent(window: &Window) -> Option<Window> {
    let parent = window.parent().ok().flatten()?;
    if parent == *window { None } else { Some(parent) }
}

fn detect_context(window: &Window) -> EmbedContext {
    match embedding_parent(window) {
        None => EmbedContext::classify(false, false),
        // Reading a cross-origin parent's href throws; a readable href means
        // the frame is same-origin with its embedder.
        Some(parent) => EmbedContext::classify(true, parent.location().href().is_ok()),
    }
}

fn measure_height(document: &Document) -> u32 {
    let root = document
        .document_element()
        .map(|el| el.scroll_height())
        .unwrap_or(0);
    let body = document.body().map(|el| el.scroll_height()).unwrap_or(0);
    page_height(root, body)
}

fn height_report_to_js(report: &HeightReport) -> JsValue {
    let payload = Object::new();
    set_js(&payload, "type", JsValue::from_str(report.kind));
    set_js(&payload, "height", JsValue::from_f64(f64::from(report.height)));
    payload.into()
}

/// Best-effort post of one height report to the embedding parent.
///
/// The target origin stays the wildcard `"*"`: the channel is advisory
/// telemetry, and narrowing it would silently break legitimate embedders
/// beyond the configured host. Standalone pages skip the post entirely.
fn post_to_parent(window: &Window, report: &HeightReport) {
    let Some(parent) = embedding_parent(window) else {
        trace!(height = report.height, "not embedded; skipping height report");
        return;
    };
    if let Err(err) = parent.post_message(&height_report_to_js(report), "*") {
        warn!(?err, "height report post failed");
    }
}

/// Load `url` in the top-level browsing context, replacing the whole window
/// stack. Falls back to the frame's own location when the top reference is
/// unavailable.
fn redirect_top(window: &Window, url: &str) {
    let top = window.top().ok().flatten();
    let location = top.as_ref().unwrap_or(window).location();
    if let Err(err) = location.set_href(url) {
        warn!(?err, %url, "top-level navigation failed");
    }
}

// ---------------------------------------------------------------------------
// Shared state and installed hooks
// ---------------------------------------------------------------------------

struct BridgeState {
    policy: RoutePolicy,
    reporter: HeightReporter,
    route_log: Vec<RouteLogRecord>,
}

impl BridgeState {
    fn dispatch_click(&mut self, href: Option<String>) -> RouteDecision {
        let decision = self.policy.evaluate(href.as_deref());
        push_bounded(
            &mut self.route_log,
            RouteLogRecord::new(href, decision.clone()),
            MAX_ROUTE_LOG,
        );
        decision
    }

    fn report(&mut self, trigger: ReportTrigger, height: u32) -> HeightReport {
        self.reporter.observe(trigger, height)
    }
}

type SharedState = Rc<RefCell<BridgeState>>;

/// Measure, record, and post one height report.
fn report_once(window: &Window, document: &Document, state: &SharedState, trigger: ReportTrigger) {
    let height = measure_height(document);
    let report = state.borrow_mut().report(trigger, height);
    post_to_parent(window, &report);
}

/// Installed link-router listener; dropping without `uninstall` would leave a
/// dangling JS callback, so the bridge always tears down explicitly.
struct RouterHooks {
    document: Document,
    click: Closure<dyn FnMut(Event)>,
}

impl RouterHooks {
    fn install(window: &Window, document: &Document, state: &SharedState) -> Result<Self, JsValue> {
        let window = window.clone();
        let state = Rc::clone(state);
        let click = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let href = anchor_href_from_event(&event);
            let decision = state.borrow_mut().dispatch_click(href);
            if let RouteDecision::Redirect { url, .. } = decision {
                event.prevent_default();
                redirect_top(&window, &url);
            }
        });
        document.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
        debug!("link router installed");
        Ok(Self {
            document: document.clone(),
            click,
        })
    }

    fn uninstall(self) {
        let _ = self
            .document
            .remove_event_listener_with_callback("click", self.click.as_ref().unchecked_ref());
        debug!("link router removed");
    }
}

/// Installed resize-reporter triggers: two window listeners, one body
/// observer, one interval.
struct ReporterHooks {
    window: Window,
    load: Closure<dyn FnMut(Event)>,
    resize: Closure<dyn FnMut(Event)>,
    tick: Closure<dyn FnMut()>,
    observer_callback: Closure<dyn FnMut(Array, ResizeObserver)>,
    observer: ResizeObserver,
    interval_id: i32,
}

impl ReporterHooks {
    fn install(
        window: &Window,
        document: &Document,
        state: &SharedState,
        interval_ms: u32,
    ) -> Result<Self, JsValue> {
        let load = Self::trigger_closure(window, document, state, ReportTrigger::Load);
        window.add_event_listener_with_callback("load", load.as_ref().unchecked_ref())?;

        let resize = Self::trigger_closure(window, document, state, ReportTrigger::Resize);
        window.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref())?;

        let observer_callback = {
            let window = window.clone();
            let document = document.clone();
            let state = Rc::clone(state);
            Closure::<dyn FnMut(Array, ResizeObserver)>::new(
                move |_entries: Array, _observer: ResizeObserver| {
                    report_once(&window, &document, &state, ReportTrigger::BodyMutation);
                },
            )
        };
        let observer = ResizeObserver::new(observer_callback.as_ref().unchecked_ref())?;
        match document.body() {
            Some(body) => observer.observe(&body),
            // Script ran before <body> was parsed; the load trigger and the
            // timer still cover later growth.
            None => debug!("document has no body yet; skipping resize observation"),
        }

        let tick = {
            let window = window.clone();
            let document = document.clone();
            let state = Rc::clone(state);
            Closure::<dyn FnMut()>::new(move || {
                report_once(&window, &document, &state, ReportTrigger::Tick);
            })
        };
        let interval_id = window.set_interval_with_callback_and_timeout_and_arguments_0(
            tick.as_ref().unchecked_ref(),
            interval_ms as i32,
        )?;

        // First report goes out immediately; the parent should not have to
        // wait a full tick for an initial size.
        report_once(window, document, state, ReportTrigger::Install);
        debug!(interval_ms, "resize reporter installed");

        Ok(Self {
            window: window.clone(),
            load,
            resize,
            tick,
            observer_callback,
            observer,
            interval_id,
        })
    }

    fn trigger_closure(
        window: &Window,
        document: &Document,
        state: &SharedState,
        trigger: ReportTrigger,
    ) -> Closure<dyn FnMut(Event)> {
        let window = window.clone();
        let document = document.clone();
        let state = Rc::clone(state);
        Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            report_once(&window, &document, &state, trigger);
        })
    }

    fn uninstall(self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("load", self.load.as_ref().unchecked_ref());
        let _ = self
            .window
            .remove_event_listener_with_callback("resize", self.resize.as_ref().unchecked_ref());
        self.observer.disconnect();
        self.window.clear_interval_with_handle(self.interval_id);
        // Closures must outlive deregistration; drop only once the browser
        // can no longer call them.
        drop(self.observer_callback);
        drop(self.tick);
        debug!("resize reporter removed");
    }
}

// ---------------------------------------------------------------------------
// EmbedBridge
// ---------------------------------------------------------------------------

/// Lifecycle object tying an embedded essay page to its hosting parent.
///
/// Construct once per page, then `start()`. The router and reporter can also
/// be started/stopped independently; all lifecycle methods are idempotent.
#[wasm_bindgen]
pub struct EmbedBridge {
    config: BridgeConfig,
    window: Window,
    document: Document,
    state: SharedState,
    router: Option<RouterHooks>,
    reporter: Option<ReporterHooks>,
}

#[wasm_bindgen]
impl EmbedBridge {
    /// Create a bridge from an optional options object.
    ///
    /// Recognized keys (camelCase or snake_case): `parentDomain` (string),
    /// `reportIntervalMs` (integer milliseconds, 100..=60000).
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<EmbedBridge, JsValue> {
        install_panic_hook();

        let options = (!options.is_undefined() && !options.is_null()).then_some(&options);
        let config = parse_bridge_config(options)?;

        let window =
            web_sys::window().ok_or_else(|| JsValue::from_str("no window available"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document available"))?;

        let state = Rc::new(RefCell::new(BridgeState {
            policy: RoutePolicy::from_config(&config),
            reporter: HeightReporter::new(),
            route_log: Vec::new(),
        }));

        Ok(Self {
            config,
            window,
            document,
            state,
            router: None,
            reporter: None,
        })
    }

    /// Install both the link router and the resize reporter.
    pub fn start(&mut self) -> Result<(), JsValue> {
        self.start_router()?;
        self.start_reporter()
    }

    /// Tear down everything `start` installed.
    pub fn stop(&mut self) {
        self.stop_router();
        self.stop_reporter();
    }

    /// Install the delegated click listener.
    #[wasm_bindgen(js_name = startRouter)]
    pub fn start_router(&mut self) -> Result<(), JsValue> {
        if self.router.is_none() {
            self.router = Some(RouterHooks::install(
                &self.window,
                &self.document,
                &self.state,
            )?);
        }
        Ok(())
    }

    /// Remove the click listener.
    #[wasm_bindgen(js_name = stopRouter)]
    pub fn stop_router(&mut self) {
        if let Some(hooks) = self.router.take() {
            hooks.uninstall();
        }
    }

    /// Install all height-report triggers and post an immediate report.
    #[wasm_bindgen(js_name = startReporter)]
    pub fn start_reporter(&mut self) -> Result<(), JsValue> {
        if self.reporter.is_none() {
            self.reporter = Some(ReporterHooks::install(
                &self.window,
                &self.document,
                &self.state,
                self.config.report_interval_ms(),
            )?);
        }
        Ok(())
    }

    /// Remove listeners, disconnect the observer, clear the timer.
    #[wasm_bindgen(js_name = stopReporter)]
    pub fn stop_reporter(&mut self) {
        if let Some(hooks) = self.reporter.take() {
            hooks.uninstall();
        }
    }

    /// Whether the click listener is currently installed.
    #[wasm_bindgen(getter, js_name = routerActive)]
    pub fn router_active(&self) -> bool {
        self.router.is_some()
    }

    /// Whether the reporter triggers are currently installed.
    #[wasm_bindgen(getter, js_name = reporterActive)]
    pub fn reporter_active(&self) -> bool {
        self.reporter.is_some()
    }

    /// Domain intercepted links are rewritten onto.
    #[wasm_bindgen(getter, js_name = parentDomain)]
    pub fn parent_domain(&self) -> String {
        self.config.parent_domain().to_string()
    }

    /// Measure and post one report right now; returns the posted payload.
    #[wasm_bindgen(js_name = reportNow)]
    pub fn report_now(&self) -> JsValue {
        let height = measure_height(&self.document);
        let report = self
            .state
            .borrow_mut()
            .report(ReportTrigger::Install, height);
        post_to_parent(&self.window, &report);
        height_report_to_js(&report)
    }

    /// Drain accumulated routing records, oldest first.
    #[wasm_bindgen(js_name = drainRouteLog)]
    pub fn drain_route_log(&self) -> Array {
        let records: Vec<RouteLogRecord> = self.state.borrow_mut().route_log.drain(..).collect();
        let out = Array::new();
        for record in &records {
            out.push(&route_record_to_js(record));
        }
        out
    }

    /// Snapshot of the reporter counters for host diagnostics.
    #[wasm_bindgen(js_name = reporterSnapshot)]
    pub fn reporter_snapshot(&self) -> JsValue {
        let snapshot = self.state.borrow().reporter.snapshot();
        let counts = Object::new();
        set_js(&counts, "install", count_to_js(snapshot.counts.install));
        set_js(&counts, "load", count_to_js(snapshot.counts.load));
        set_js(&counts, "resize", count_to_js(snapshot.counts.resize));
        set_js(&counts, "bodyMutation", count_to_js(snapshot.counts.body_mutation));
        set_js(&counts, "tick", count_to_js(snapshot.counts.tick));

        let out = Object::new();
        set_js(
            &out,
            "lastHeight",
            snapshot
                .last_height
                .map_or(JsValue::NULL, |h| JsValue::from_f64(f64::from(h))),
        );
        set_js(&out, "totalReports", count_to_js(snapshot.total_reports));
        set_js(&out, "counts", counts.into());
        out.into()
    }

    /// Embedding diagnostics snapshot (context, domain, domain source).
    pub fn diagnostics(&self) -> JsValue {
        let diagnostics = self.gather_diagnostics();
        let out = Object::new();
        set_js(&out, "context", JsValue::from_str(diagnostics.context.as_str()));
        set_js(&out, "parentDomain", JsValue::from_str(&diagnostics.parent_domain));
        set_js(
            &out,
            "domainSource",
            JsValue::from_str(diagnostics.domain_source.as_str()),
        );
        set_js(
            &out,
            "pageOrigin",
            diagnostics
                .page_origin
                .as_deref()
                .map_or(JsValue::NULL, JsValue::from_str),
        );
        out.into()
    }

    /// One-line banner string describing the embedding situation.
    #[wasm_bindgen(js_name = describeEmbedding)]
    pub fn describe_embedding(&self) -> String {
        self.gather_diagnostics().describe()
    }
}

impl EmbedBridge {
    fn gather_diagnostics(&self) -> EmbedDiagnostics {
        EmbedDiagnostics::gather(
            &self.config,
            detect_context(&self.window),
            Some(self.window.origin()),
        )
    }
}

impl Drop for EmbedBridge {
    fn drop(&mut self) {
        self.stop();
    }
}

fn route_record_to_js(record: &RouteLogRecord) -> JsValue {
    let out = Object::new();
    set_js(
        &out,
        "href",
        record
            .href
            .as_deref()
            .map_or(JsValue::NULL, JsValue::from_str),
    );
    match &record.decision {
        RouteDecision::Redirect { url, prefix } => {
            set_js(&out, "decision", JsValue::from_str("redirect"));
            set_js(&out, "url", JsValue::from_str(url));
            set_js(&out, "prefix", JsValue::from_str(prefix));
        }
        RouteDecision::Passthrough { reason } => {
            set_js(&out, "decision", JsValue::from_str("passthrough"));
            set_js(&out, "reason", JsValue::from_str(reason.as_str()));
        }
    }
    out.into()
}

/// Construct and start a bridge in one call — the fire-and-forget entry
/// point for pages that never tear down explicitly.
#[wasm_bindgen(js_name = installEmbedBridge)]
pub fn install_embed_bridge(options: JsValue) -> Result<EmbedBridge, JsValue> {
    let mut bridge = EmbedBridge::new(options)?;
    bridge.start()?;
    Ok(bridge)
}
