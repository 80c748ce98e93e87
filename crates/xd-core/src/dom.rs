//! Rendered-DOM snapshot.
//!
//! The markup is rendered by a browser sandbox outside this crate; what
//! reaches us is a serialisable snapshot of each element: tag, attributes,
//! viewport-absolute bounding rect, computed style, own text and children.
//! `xd-wasm` captures it from a live element; tests and the CLI load it from
//! JSON.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("invalid DOM snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Axis-aligned box in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Finite coordinates and non-negative size.
    pub fn is_well_formed(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
    }

    /// Same box expressed relative to `origin`.
    pub fn relative_to(&self, origin: (f32, f32)) -> Rect {
        Rect::new(self.x - origin.0, self.y - origin.1, self.width, self.height)
    }
}

/// Computed style of one element, property name → serialized value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComputedStyle(BTreeMap<String, String>);

impl ComputedStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trimmed value, `None` when absent or empty.
    pub fn get(&self, property: &str) -> Option<&str> {
        self.0
            .get(property)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn insert(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.0.insert(property.into(), value.into());
    }

    pub fn is(&self, property: &str, value: &str) -> bool {
        self.get(property)
            .is_some_and(|v| v.eq_ignore_ascii_case(value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One rendered element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomNode {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Viewport-absolute border box.
    pub rect: Rect,
    #[serde(default)]
    pub style: ComputedStyle,
    /// Concatenated direct text-node children.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_children")]
    pub children: Vec<DomNode>,
    /// Event types with registered listeners, when the capturer can see them.
    #[serde(default)]
    pub listeners: Vec<String>,
}

/// Deserialize children one by one, dropping any that are malformed.
fn lenient_children<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<DomNode>, D::Error> {
    let raw: Vec<serde_json::Value> = Vec::deserialize(deserializer)?;
    let mut children = Vec::with_capacity(raw.len());
    for (i, value) in raw.into_iter().enumerate() {
        match serde_json::from_value::<DomNode>(value) {
            Ok(child) => children.push(child),
            Err(e) => log::warn!("skipping malformed DOM child #{i}: {e}"),
        }
    }
    Ok(children)
}

impl DomNode {
    pub fn new(tag: &str, rect: Rect) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            rect,
            style: ComputedStyle::new(),
            text: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, DomError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_style(mut self, property: &str, value: &str) -> Self {
        self.style.insert(property, value);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_child(mut self, child: DomNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_listener(mut self, event: &str) -> Self {
        self.listeners.push(event.to_string());
        self
    }

    pub fn tag_is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    /// Own text with whitespace collapsed; `None` when blank.
    pub fn own_text(&self) -> Option<String> {
        let text = self.text.as_deref()?;
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        (!collapsed.is_empty()).then_some(collapsed)
    }

    pub fn has_click_handler(&self) -> bool {
        self.has_attr("onclick") || self.listeners.iter().any(|l| l == "click")
    }

    /// `display:none` and `visibility:hidden` elements are not rendered.
    pub fn is_rendered(&self) -> bool {
        !self.style.is("display", "none")
            && !self.style.is("visibility", "hidden")
            && !self.style.is("visibility", "collapse")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_children_are_skipped() {
        let json = r#"{
            "tag": "div",
            "rect": { "x": 0, "y": 0, "width": 100, "height": 100 },
            "children": [
                { "tag": "span", "rect": { "x": 0, "y": 0, "width": 10, "height": 10 } },
                { "tag": "broken" },
                { "tag": "p", "rect": { "x": 0, "y": 20, "width": 10, "height": 10 },
                  "children": [ 42 ] }
            ]
        }"#;
        let node = DomNode::from_json(json).unwrap();
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[1].tag, "p");
        assert!(node.children[1].children.is_empty());
    }

    #[test]
    fn own_text_collapses_whitespace() {
        let node = DomNode::new("p", Rect::default()).with_text("  Hello \n   world ");
        assert_eq!(node.own_text().as_deref(), Some("Hello world"));
        let blank = DomNode::new("p", Rect::default()).with_text(" \n ");
        assert_eq!(blank.own_text(), None);
    }

    #[test]
    fn hidden_elements_are_not_rendered() {
        let none = DomNode::new("div", Rect::default()).with_style("display", "none");
        let hidden = DomNode::new("div", Rect::default()).with_style("visibility", "hidden");
        let shown = DomNode::new("div", Rect::default()).with_style("display", "flex");
        assert!(!none.is_rendered());
        assert!(!hidden.is_rendered());
        assert!(shown.is_rendered());
    }

    #[test]
    fn rect_well_formedness() {
        assert!(Rect::new(0.0, 0.0, 10.0, 0.0).is_well_formed());
        assert!(!Rect::new(0.0, 0.0, -1.0, 5.0).is_well_formed());
        assert!(!Rect::new(f32::NAN, 0.0, 1.0, 1.0).is_well_formed());
    }
}
