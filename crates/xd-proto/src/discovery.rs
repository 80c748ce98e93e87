//! Interactive-element discovery on rendered screens.
//!
//! Works on the live DOM snapshot of a screen already on the canvas, not on
//! the design tree. Candidates come from a fixed selector list and are then
//! filtered by size; generic `div`s need to be larger, and large or
//! child-heavy `div`s are treated as layout containers unless they carry an
//! explicit interactivity marker.

use crate::links::Bounds;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use xd_core::config::DiscoveryConfig;
use xd_core::dom::DomNode;

const INTERACTIVE_TAGS: &[&str] = &["a", "button", "input", "select", "textarea", "summary"];
const INTERACTIVE_ROLES: &[&str] = &[
    "button", "link", "tab", "menuitem", "checkbox", "radio", "switch", "option",
];
const MARKER_ATTRS: &[&str] = &["data-interactive", "data-clickable"];
const CLICKABLE_CLASS_HINTS: &[&str] = &["cursor-pointer", "clickable", "card", "btn"];

/// Reading a screen's document failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The frame has no document yet.
    #[error("screen document is not ready")]
    NotReady,
    /// Cross-origin or other security failure.
    #[error("screen document is not accessible: {0}")]
    Denied(String),
}

/// One element a link can start from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveElement {
    pub element_id: String,
    pub tag: String,
    pub label: Option<String>,
    /// Box relative to the screen's content area.
    pub bounds: Bounds,
}

/// Click handler, data marker or interactive ARIA role.
fn has_explicit_marker(el: &DomNode) -> bool {
    el.has_click_handler()
        || MARKER_ATTRS.iter().any(|a| el.has_attr(a))
        || el
            .attr("role")
            .is_some_and(|r| INTERACTIVE_ROLES.iter().any(|i| r.eq_ignore_ascii_case(i)))
}

fn is_semantic(el: &DomNode) -> bool {
    INTERACTIVE_TAGS.iter().any(|t| el.tag_is(t)) || has_explicit_marker(el)
}

/// `div` selectors: pointer cursor, focusable, or a clickable class name.
fn is_div_candidate(el: &DomNode) -> bool {
    el.tag_is("div")
        && (el.style.is("cursor", "pointer")
            || el.has_attr("tabindex")
            || el
                .classes()
                .any(|c| CLICKABLE_CLASS_HINTS.iter().any(|h| c.contains(h))))
}

fn passes_size(el: &DomNode, semantic: bool, config: &DiscoveryConfig) -> bool {
    let Bounds { width, height, .. } = to_bounds(el);
    if semantic {
        return width >= f64::from(config.min_interactive_width)
            && height >= f64::from(config.min_interactive_height);
    }
    if width < f64::from(config.min_div_width) || height < f64::from(config.min_div_height) {
        return false;
    }
    let containery = width > f64::from(config.max_div_width)
        || height > f64::from(config.max_div_height)
        || el.children.len() > config.max_div_children;
    !containery
}

fn to_bounds(el: &DomNode) -> Bounds {
    Bounds::new(
        f64::from(el.rect.x),
        f64::from(el.rect.y),
        f64::from(el.rect.width),
        f64::from(el.rect.height),
    )
}

/// Stable id: `data-node-id`, then `id`, then the tag plus child-index path.
fn element_id(el: &DomNode, path: &[usize]) -> String {
    if let Some(id) = el.attr("data-node-id").or(el.attr("id")).filter(|s| !s.is_empty()) {
        return id.to_string();
    }
    let path: Vec<String> = path.iter().map(usize::to_string).collect();
    format!("{}@{}", el.tag, path.join("."))
}

fn label(el: &DomNode) -> Option<String> {
    el.attr("aria-label")
        .map(str::to_string)
        .or_else(|| el.own_text())
        .or_else(|| el.children.iter().find_map(DomNode::own_text))
}

/// Find interactive candidates under `root`, with boxes relative to it.
/// Descendants of a semantically interactive match are not reported.
pub fn discover(root: &DomNode, config: &DiscoveryConfig) -> Vec<InteractiveElement> {
    let mut found = Vec::new();
    let origin = (root.rect.x, root.rect.y);
    let mut path = Vec::new();
    for (i, child) in root.children.iter().enumerate() {
        path.push(i);
        walk(child, origin, &mut path, config, &mut found);
        path.pop();
    }
    log::debug!("discovered {} interactive elements", found.len());
    found
}

fn walk(
    el: &DomNode,
    origin: (f32, f32),
    path: &mut Vec<usize>,
    config: &DiscoveryConfig,
    found: &mut Vec<InteractiveElement>,
) {
    if !el.is_rendered() || !el.rect.is_well_formed() {
        return;
    }
    let semantic = is_semantic(el);
    if (semantic || is_div_candidate(el)) && passes_size(el, semantic, config) {
        let rel = el.rect.relative_to(origin);
        found.push(InteractiveElement {
            element_id: element_id(el, path),
            tag: el.tag.clone(),
            label: label(el),
            bounds: Bounds::new(
                f64::from(rel.x),
                f64::from(rel.y),
                f64::from(rel.width),
                f64::from(rel.height),
            ),
        });
        if semantic {
            return;
        }
    }
    for (i, child) in el.children.iter().enumerate() {
        path.push(i);
        walk(child, origin, path, config, found);
        path.pop();
    }
}

#[derive(Debug, Clone, Default)]
struct ScreenScan {
    next_due_ms: u64,
    retries: u32,
    elements: Vec<InteractiveElement>,
}

/// Re-runs discovery per screen on a fixed interval.
///
/// Time is passed in explicitly so the host drives it from its own timer.
/// A screen whose document is not ready is retried after a short backoff
/// until the retry cap, then falls back to the regular interval. A screen
/// that cannot be read at all reports no elements.
#[derive(Debug, Clone)]
pub struct RescanScheduler {
    config: DiscoveryConfig,
    screens: BTreeMap<String, ScreenScan>,
}

impl RescanScheduler {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            config,
            screens: BTreeMap::new(),
        }
    }

    /// Track a screen; it is due immediately.
    pub fn add_screen(&mut self, screen_id: &str, now_ms: u64) {
        self.screens.insert(
            screen_id.to_string(),
            ScreenScan {
                next_due_ms: now_ms,
                ..Default::default()
            },
        );
    }

    pub fn remove_screen(&mut self, screen_id: &str) {
        self.screens.remove(screen_id);
    }

    /// Screens whose scan is due at `now_ms`.
    pub fn due(&self, now_ms: u64) -> Vec<String> {
        self.screens
            .iter()
            .filter(|(_, s)| s.next_due_ms <= now_ms)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// When the next scan of `screen_id` is due.
    pub fn next_due(&self, screen_id: &str) -> Option<u64> {
        self.screens.get(screen_id).map(|s| s.next_due_ms)
    }

    /// The latest candidates for a screen.
    pub fn elements(&self, screen_id: &str) -> &[InteractiveElement] {
        self.screens
            .get(screen_id)
            .map(|s| s.elements.as_slice())
            .unwrap_or_default()
    }

    /// Store the outcome of reading `screen_id`'s document at `now_ms`.
    pub fn record(&mut self, screen_id: &str, now_ms: u64, snapshot: Result<&DomNode, AccessError>) {
        let Some(scan) = self.screens.get_mut(screen_id) else {
            log::trace!("ignoring scan of untracked screen {screen_id}");
            return;
        };
        match snapshot {
            Ok(root) => {
                scan.elements = discover(root, &self.config);
                scan.retries = 0;
                scan.next_due_ms = now_ms + self.config.rescan_interval_ms;
            }
            Err(AccessError::NotReady) if scan.retries < self.config.max_retries => {
                scan.retries += 1;
                scan.next_due_ms = now_ms + self.config.retry_backoff_ms;
                log::trace!("screen {screen_id} not ready, retry {}", scan.retries);
            }
            Err(e) => {
                log::warn!("discovery on screen {screen_id} failed: {e}");
                scan.elements.clear();
                scan.retries = 0;
                scan.next_due_ms = now_ms + self.config.rescan_interval_ms;
            }
        }
    }

    /// Scan every due screen through `read`. Returns the screens scanned.
    pub fn tick<F>(&mut self, now_ms: u64, mut read: F) -> Vec<String>
    where
        F: FnMut(&str) -> Result<DomNode, AccessError>,
    {
        let due = self.due(now_ms);
        for screen_id in &due {
            let snapshot = read(screen_id.as_str());
            self.record(screen_id, now_ms, snapshot.as_ref().map_err(Clone::clone));
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use xd_core::dom::Rect;

    fn el(tag: &str, x: f32, y: f32, w: f32, h: f32) -> DomNode {
        DomNode::new(tag, Rect::new(x, y, w, h))
    }

    fn screen() -> DomNode {
        el("body", 100.0, 50.0, 390.0, 844.0)
            .with_child(
                el("button", 120.0, 700.0, 350.0, 48.0)
                    .with_attr("id", "cta")
                    .with_child(el("span", 130.0, 710.0, 80.0, 20.0).with_attr("role", "button").with_text("Go")),
            )
            .with_child(el("a", 120.0, 760.0, 60.0, 8.0).with_text("tiny"))
            .with_child(
                el("div", 120.0, 100.0, 350.0, 120.0)
                    .with_attr("class", "card shadow")
                    .with_child(el("a", 130.0, 110.0, 80.0, 20.0).with_text("More")),
            )
            .with_child(el("div", 120.0, 240.0, 30.0, 30.0).with_style("cursor", "pointer"))
            .with_child(el("div", 100.0, 300.0, 390.0, 700.0).with_style("cursor", "pointer"))
            .with_child(
                el("div", 100.0, 300.0, 390.0, 700.0)
                    .with_style("cursor", "pointer")
                    .with_attr("data-clickable", ""),
            )
            .with_child(el("button", 0.0, 0.0, 80.0, 40.0).with_style("display", "none"))
    }

    #[test]
    fn finds_semantic_and_card_candidates() {
        let found = discover(&screen(), &DiscoveryConfig::default());
        let ids: Vec<&str> = found.iter().map(|e| e.element_id.as_str()).collect();
        assert_eq!(ids, vec!["cta", "div@2", "a@2.0", "div@5"]);
    }

    #[test]
    fn boxes_are_screen_relative() {
        let found = discover(&screen(), &DiscoveryConfig::default());
        assert_eq!(found[0].bounds, Bounds::new(20.0, 650.0, 350.0, 48.0));
        assert_eq!(found[0].label.as_deref(), Some("Go"));
        assert_eq!(found[2].label.as_deref(), Some("More"));
    }

    #[test]
    fn container_cutoffs_are_configurable() {
        let config = DiscoveryConfig {
            max_div_height: 1000.0,
            min_div_width: 20.0,
            min_div_height: 20.0,
            ..Default::default()
        };
        let found = discover(&screen(), &config);
        let ids: Vec<&str> = found.iter().map(|e| e.element_id.as_str()).collect();
        assert_eq!(ids, vec!["cta", "div@2", "a@2.0", "div@3", "div@4", "div@5"]);
    }

    #[test]
    fn child_heavy_divs_need_a_marker() {
        let mut list = el("div", 0.0, 0.0, 300.0, 300.0).with_attr("tabindex", "0");
        for i in 0..11 {
            list = list.with_child(el("p", 0.0, i as f32 * 20.0, 100.0, 20.0));
        }
        let root = el("body", 0.0, 0.0, 390.0, 844.0).with_child(list.clone());
        assert!(discover(&root, &DiscoveryConfig::default()).is_empty());

        let marked = el("body", 0.0, 0.0, 390.0, 844.0).with_child(list.with_listener("click"));
        assert_eq!(discover(&marked, &DiscoveryConfig::default()).len(), 1);
    }

    fn ready_screen() -> Result<DomNode, AccessError> {
        Ok(screen())
    }

    #[test]
    fn scheduler_rescans_on_interval() {
        let mut scheduler = RescanScheduler::new(DiscoveryConfig::default());
        scheduler.add_screen("home", 0);
        assert_eq!(scheduler.tick(0, |_| ready_screen()), vec!["home"]);
        assert_eq!(scheduler.elements("home").len(), 4);
        assert!(scheduler.tick(1999, |_| ready_screen()).is_empty());
        assert_eq!(scheduler.tick(2000, |_| ready_screen()), vec!["home"]);
        assert_eq!(scheduler.next_due("home"), Some(4000));
    }

    #[test]
    fn not_ready_backs_off_then_gives_up() {
        let config = DiscoveryConfig {
            max_retries: 2,
            ..Default::default()
        };
        let mut scheduler = RescanScheduler::new(config);
        scheduler.add_screen("home", 0);

        scheduler.tick(0, |_| Err(AccessError::NotReady));
        assert_eq!(scheduler.next_due("home"), Some(300));
        scheduler.tick(300, |_| Err(AccessError::NotReady));
        assert_eq!(scheduler.next_due("home"), Some(600));
        scheduler.tick(600, |_| Err(AccessError::NotReady));
        assert_eq!(scheduler.next_due("home"), Some(2600));
        assert!(scheduler.elements("home").is_empty());

        scheduler.tick(2600, |_| ready_screen());
        assert_eq!(scheduler.elements("home").len(), 4);
    }

    #[test]
    fn denied_access_means_no_elements() {
        let mut scheduler = RescanScheduler::new(DiscoveryConfig::default());
        scheduler.add_screen("home", 0);
        scheduler.tick(0, |_| ready_screen());
        scheduler.tick(2000, |_| Err(AccessError::Denied("cross-origin frame".into())));
        assert!(scheduler.elements("home").is_empty());
        assert_eq!(scheduler.next_due("home"), Some(4000));
    }

    #[test]
    fn untracked_screens_are_ignored() {
        let mut scheduler = RescanScheduler::new(DiscoveryConfig::default());
        scheduler.record("ghost", 0, Ok(&screen()));
        assert!(scheduler.elements("ghost").is_empty());
        assert!(scheduler.due(0).is_empty());
    }
}
