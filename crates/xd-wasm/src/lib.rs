//! WASM bridge for XD: exposes snapshotting, exports and the prototype link
//! engine to the canvas page.
//!
//! Compiled via `wasm-pack build --target web`. Structured results cross the
//! boundary as JSON strings shaped `{"ok":true,...}` or
//! `{"ok":false,"error":"..."}`.

mod snapshot;
mod storage;

use kurbo::Point;
use serde_json::{Value, json};
use storage::LocalStorageStore;
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlIFrameElement};
use xd_core::XdConfig;
use xd_proto::{
    Bounds, LinkGesture, PersistentLinks, RescanScheduler, ScreenPositions, render_hotspots,
    render_overlay,
};

fn ok(key: &str, value: Value) -> String {
    let mut body = serde_json::Map::new();
    body.insert("ok".into(), Value::Bool(true));
    body.insert(key.into(), value);
    Value::Object(body).to_string()
}

fn err(message: impl std::fmt::Display) -> String {
    json!({ "ok": false, "error": message.to_string() }).to_string()
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("XD WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Snapshot and export (no canvas state needed) ─────────────────────────

/// Snapshot a rendered element. Returns the snapshot JSON or an error
/// envelope when there is no window.
#[wasm_bindgen]
pub fn snapshot_element(element: &Element) -> String {
    let Some(window) = web_sys::window() else {
        return err("no window");
    };
    let node = snapshot::capture(&window, element);
    match serde_json::to_value(&node) {
        Ok(value) => ok("snapshot", value),
        Err(e) => err(e),
    }
}

/// Snapshot JSON → plugin export document.
#[wasm_bindgen]
pub fn export_plugin_json(snapshot: &str, name: &str) -> String {
    let config = XdConfig::default();
    match xd_core::parse_snapshot_json(snapshot, &config.parser) {
        Ok(tree) => match serde_json::to_value(xd_core::export_document(&tree, name)) {
            Ok(doc) => ok("document", doc),
            Err(e) => err(e),
        },
        Err(e) => err(e),
    }
}

/// Snapshot JSON → standalone SVG document.
#[wasm_bindgen]
pub fn export_svg(snapshot: &str, stylesheet: &str) -> String {
    match xd_core::DomNode::from_json(snapshot) {
        Ok(root) => ok("svg", Value::String(xd_core::export_svg(&root, stylesheet))),
        Err(e) => err(e),
    }
}

/// Snapshot JSON → design tree → positioned HTML.
#[wasm_bindgen]
pub fn render_html(snapshot: &str) -> String {
    let config = XdConfig::default();
    match xd_core::parse_snapshot_json(snapshot, &config.parser) {
        Ok(tree) => ok("html", Value::String(xd_core::render_html(&tree))),
        Err(e) => err(e),
    }
}

// ─── Prototype links ─────────────────────────────────────────────────────

/// Canvas-side controller for one project's prototype links.
///
/// Owns the persisted link graph, the linking gesture, the screen position
/// map and the rescan scheduler. All calls come from the page's event loop.
#[wasm_bindgen]
pub struct XdPrototype {
    links: PersistentLinks<LocalStorageStore>,
    gesture: LinkGesture,
    screens: ScreenPositions,
    scheduler: RescanScheduler,
    config: XdConfig,
}

#[wasm_bindgen]
impl XdPrototype {
    /// Load `project_id`'s links from `localStorage`. `config_toml` overrides
    /// the default thresholds; an invalid document is ignored.
    #[wasm_bindgen(constructor)]
    pub fn new(project_id: &str, config_toml: Option<String>) -> Self {
        console_error_panic_hook_setup();
        let config = match config_toml.as_deref().map(XdConfig::from_toml) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                log::warn!("ignoring prototype config: {e}");
                XdConfig::default()
            }
            None => XdConfig::default(),
        };
        Self {
            links: PersistentLinks::open(LocalStorageStore, project_id),
            gesture: LinkGesture::new(),
            screens: ScreenPositions::new(),
            scheduler: RescanScheduler::new(config.discovery.clone()),
            config,
        }
    }

    /// Place or move a screen on the canvas.
    pub fn set_screen_position(&mut self, screen_id: &str, x: f64, y: f64, width: f64, height: f64) {
        self.screens.set(screen_id, Bounds::new(x, y, width, height));
    }

    /// Start scanning a screen for interactive elements.
    pub fn track_screen(&mut self, screen_id: &str, now_ms: f64) {
        self.scheduler.add_screen(screen_id, now_ms as u64);
    }

    /// Forget a deleted screen and every link touching it. Returns the
    /// number of links removed.
    pub fn remove_screen(&mut self, screen_id: &str) -> u32 {
        self.screens.remove(screen_id);
        self.scheduler.remove_screen(screen_id);
        match self.links.remove_screen(screen_id) {
            Ok(n) => n as u32,
            Err(e) => {
                log::warn!("could not save links after removing {screen_id}: {e}");
                0
            }
        }
    }

    /// JSON array of screen ids due for a rescan.
    pub fn due_screens(&self, now_ms: f64) -> String {
        json!(self.scheduler.due(now_ms as u64)).to_string()
    }

    /// Rescan one screen's iframe. Returns how many elements were found.
    pub fn rescan_frame(&mut self, screen_id: &str, frame: &HtmlIFrameElement, now_ms: f64) -> u32 {
        let snapshot = snapshot::capture_frame(frame);
        self.scheduler
            .record(screen_id, now_ms as u64, snapshot.as_ref().map_err(Clone::clone));
        self.scheduler.elements(screen_id).len() as u32
    }

    /// The latest interactive elements of a screen, as a JSON array.
    pub fn elements_json(&self, screen_id: &str) -> String {
        serde_json::to_string(self.scheduler.elements(screen_id)).unwrap_or_else(|_| "[]".to_string())
    }

    /// Hotspot overlay for one screen.
    pub fn hotspots_svg(&self, screen_id: &str) -> String {
        match self.screens.get(screen_id) {
            Some(position) => render_hotspots(
                screen_id,
                position,
                self.scheduler.elements(screen_id),
                self.links.graph(),
            ),
            None => String::new(),
        }
    }

    /// Begin a link from a discovered element. Returns `false` when the
    /// screen is not placed or the element is unknown.
    pub fn start_linking(&mut self, screen_id: &str, element_id: &str, click_x: f64, click_y: f64) -> bool {
        let Some(screen) = self.screens.get(screen_id) else {
            return false;
        };
        let Some(element) = self
            .scheduler
            .elements(screen_id)
            .iter()
            .find(|e| e.element_id == element_id)
        else {
            return false;
        };
        self.gesture.start(
            screen_id,
            element_id,
            element.bounds.offset_by(screen),
            element.bounds,
            Point::new(click_x, click_y),
        );
        true
    }

    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        self.gesture.pointer_moved(Point::new(x, y));
    }

    /// Click on the canvas while linking. Commits when the point is inside a
    /// screen other than the source; returns `{"ok":true,"link":...}` with
    /// `link: null` when nothing was committed.
    pub fn click_canvas(&mut self, x: f64, y: f64) -> String {
        let Some(target) = self.screens.screen_at(Point::new(x, y)).map(str::to_string) else {
            return ok("link", Value::Null);
        };
        self.finish_linking(&target)
    }

    /// Commit the gesture onto `target_screen_id`.
    pub fn finish_linking(&mut self, target_screen_id: &str) -> String {
        match self.gesture.commit(target_screen_id, &mut self.links) {
            Ok(Some(link)) => ok("link", serde_json::to_value(link).unwrap_or(Value::Null)),
            Ok(None) => ok("link", Value::Null),
            Err(e) => {
                log::warn!("link not saved: {e}");
                err(e)
            }
        }
    }

    pub fn cancel_linking(&mut self) {
        self.gesture.cancel();
    }

    pub fn is_linking(&self) -> bool {
        self.gesture.is_linking()
    }

    /// All links of the project, as a JSON array.
    pub fn links_json(&self) -> String {
        serde_json::to_string(self.links.graph().links()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn remove_link(&mut self, link_id: &str) -> bool {
        match self.links.remove(link_id) {
            Ok(removed) => removed.is_some(),
            Err(e) => {
                log::warn!("could not save links after removing {link_id}: {e}");
                false
            }
        }
    }

    /// Connector overlay for the whole canvas, including the live preview.
    pub fn overlay_svg(&self) -> String {
        let preview = self.gesture.preview(&self.config.connector);
        render_overlay(
            self.links.graph(),
            &self.screens,
            preview.as_ref(),
            &self.config.connector,
        )
    }
}
