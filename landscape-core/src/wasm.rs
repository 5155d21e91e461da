//! WASM bindings for landscape-core.
//!
//! Every diagram kind is a JS class wrapping one session. Constructors take a
//! config JSON string and never throw: a bad config is logged and replaced by
//! the defaults. Render and event methods return JSON strings; decode errors
//! travel inside the render output as `error`.

use log::warn;
use wasm_bindgen::prelude::*;

use crate::config::DiagramConfig;
use crate::layout::PointF;
use crate::session::{DiagramEvent, FlowSession, NetworkSession, TreeSession};

/// Routes `log` output to the browser console and installs the panic hook.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging() {
    #[cfg(target_arch = "wasm32")]
    {
        let _ = console_log::init_with_level(log::Level::Debug);
        console_error_panic_hook::set_once();
        log::info!("landscape-core logging initialized");
    }
}

/// Host clock in ms, for calls that do not carry a timestamp.
fn host_now() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        web_sys::window()
            .and_then(|w| w.performance())
            .map_or(0.0, |p| p.now())
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        0.0
    }
}

fn config_from(json: &str) -> DiagramConfig {
    DiagramConfig::from_json(json).unwrap_or_else(|e| {
        warn!("config: {e}; using defaults");
        DiagramConfig::default()
    })
}

fn events_json(events: Vec<DiagramEvent>) -> String {
    serde_json::to_string(&events).unwrap_or_else(|e| {
        warn!("events: {e}");
        "[]".to_string()
    })
}

#[wasm_bindgen]
pub struct TreeDiagram {
    inner: TreeSession,
}

#[wasm_bindgen]
impl TreeDiagram {
    #[wasm_bindgen(constructor)]
    pub fn new(config: &str) -> Self {
        Self { inner: TreeSession::new(config_from(config)) }
    }

    /// Hierarchy records: `[{id, name, level, parentId, ...}]`.
    #[wasm_bindgen(js_name = setData)]
    pub fn set_data(&mut self, json: &str) {
        self.inner.set_data(json);
    }

    #[wasm_bindgen(js_name = setQuery)]
    pub fn set_query(&mut self, query: &str) {
        self.inner.set_query(query, host_now());
    }

    #[wasm_bindgen(js_name = expandAll)]
    pub fn expand_all(&mut self) {
        self.inner.expand_all(host_now());
    }

    #[wasm_bindgen(js_name = collapseAll)]
    pub fn collapse_all(&mut self) {
        self.inner.collapse_all(host_now());
    }

    pub fn toggle(&mut self, id: &str) -> bool {
        self.inner.toggle(id, host_now())
    }

    pub fn click(&mut self, id: &str) {
        self.inner.click(id, host_now());
    }

    pub fn hover(&mut self, id: Option<String>) {
        self.inner.hover(id.as_deref());
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.inner.resize(width, height);
    }

    pub fn epoch(&self) -> f64 {
        self.inner.epoch() as f64
    }

    /// Returns "continue", "settled" or "cancelled".
    pub fn tick(&mut self, now_ms: f64, epoch: f64) -> String {
        self.inner.tick(now_ms, epoch as u64).as_str().to_string()
    }

    pub fn render(&self) -> String {
        self.inner.render_json()
    }

    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> String {
        events_json(self.inner.drain_events())
    }

    pub fn dispose(&mut self) {
        self.inner.dispose();
    }
}

#[wasm_bindgen]
pub struct FlowDiagram {
    inner: FlowSession,
}

#[wasm_bindgen]
impl FlowDiagram {
    #[wasm_bindgen(constructor)]
    pub fn new(config: &str) -> Self {
        Self { inner: FlowSession::new(config_from(config)) }
    }

    /// Flow document: `{nodes, links, metadata}`.
    #[wasm_bindgen(js_name = setData)]
    pub fn set_data(&mut self, json: &str) {
        self.inner.set_data(json);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.inner.resize(width, height);
    }

    #[wasm_bindgen(js_name = hoverNode)]
    pub fn hover_node(&mut self, id: Option<String>) {
        self.inner.hover_node(id.as_deref());
    }

    #[wasm_bindgen(js_name = hoverLink)]
    pub fn hover_link(&mut self, index: Option<u32>) {
        self.inner.hover_link(index.map(|i| i as usize));
    }

    pub fn click(&mut self, id: &str) {
        self.inner.click(id);
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.inner.pointer_down(PointF::new(x, y), host_now());
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.inner.pointer_move(PointF::new(x, y));
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, x: f32, y: f32) {
        self.inner.pointer_up(PointF::new(x, y), host_now());
    }

    #[wasm_bindgen(js_name = pointerCancel)]
    pub fn pointer_cancel(&mut self) {
        self.inner.pointer_cancel();
    }

    pub fn epoch(&self) -> f64 {
        self.inner.epoch() as f64
    }

    pub fn tick(&mut self, now_ms: f64, epoch: f64) -> String {
        self.inner.tick(now_ms, epoch as u64).as_str().to_string()
    }

    pub fn render(&self) -> String {
        self.inner.render_json()
    }

    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> String {
        events_json(self.inner.drain_events())
    }

    pub fn dispose(&mut self) {
        self.inner.dispose();
    }
}

#[wasm_bindgen]
pub struct NetworkDiagram {
    inner: NetworkSession,
}

#[wasm_bindgen]
impl NetworkDiagram {
    #[wasm_bindgen(constructor)]
    pub fn new(config: &str) -> Self {
        Self { inner: NetworkSession::new(config_from(config)) }
    }

    /// Flow document; the settle budget starts now.
    #[wasm_bindgen(js_name = setData)]
    pub fn set_data(&mut self, json: &str) {
        self.inner.set_data(json, host_now());
    }

    /// Call from requestAnimationFrame with its timestamp.
    pub fn tick(&mut self, now_ms: f64, epoch: f64) -> String {
        self.inner.tick(now_ms, epoch as u64).as_str().to_string()
    }

    pub fn stop(&mut self) {
        self.inner.stop();
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.inner.resize(width, height, host_now());
    }

    pub fn hover(&mut self, id: Option<String>) {
        self.inner.hover(id.as_deref());
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.inner.pointer_down(PointF::new(x, y), host_now());
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.inner.pointer_move(PointF::new(x, y), host_now());
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, x: f32, y: f32) {
        self.inner.pointer_up(PointF::new(x, y), host_now());
    }

    #[wasm_bindgen(js_name = pointerCancel)]
    pub fn pointer_cancel(&mut self) {
        self.inner.pointer_cancel();
    }

    pub fn wheel(&mut self, x: f32, y: f32, delta_y: f32) {
        self.inner.wheel(PointF::new(x, y), delta_y);
    }

    pub fn epoch(&self) -> f64 {
        self.inner.epoch() as f64
    }

    pub fn render(&self) -> String {
        self.inner.render_json()
    }

    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> String {
        events_json(self.inner.drain_events())
    }

    pub fn dispose(&mut self) {
        self.inner.dispose();
    }
}
