//! Live DOM → `DomNode` snapshot.
//!
//! Reads each element's bounding client rect and the computed-style
//! properties the parser and discovery look at. Reading every computed
//! property would cost hundreds of lookups per element.

use web_sys::{Element, HtmlIFrameElement, Node, Window};
use xd_core::dom::{ComputedStyle, DomNode, Rect};
use xd_proto::AccessError;

const STYLE_PROPERTIES: &[&str] = &[
    "align-items",
    "background-color",
    "background-image",
    "background-repeat",
    "background-size",
    "border-top-width",
    "border-top-style",
    "border-top-color",
    "border-right-width",
    "border-right-style",
    "border-right-color",
    "border-bottom-width",
    "border-bottom-style",
    "border-bottom-color",
    "border-left-width",
    "border-left-style",
    "border-left-color",
    "border-top-left-radius",
    "border-top-right-radius",
    "border-bottom-right-radius",
    "border-bottom-left-radius",
    "box-shadow",
    "color",
    "column-gap",
    "cursor",
    "display",
    "fill",
    "fill-rule",
    "flex-direction",
    "font-family",
    "font-size",
    "font-weight",
    "gap",
    "justify-content",
    "letter-spacing",
    "line-height",
    "object-fit",
    "opacity",
    "overflow-x",
    "overflow-y",
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
    "position",
    "row-gap",
    "stroke",
    "stroke-width",
    "text-align",
    "transform",
    "visibility",
    "white-space",
];

/// Snapshot `element` and its subtree using `window`'s computed styles.
pub fn capture(window: &Window, element: &Element) -> DomNode {
    let rect = element.get_bounding_client_rect();
    let mut node = DomNode::new(
        &element.tag_name(),
        Rect::new(
            rect.x() as f32,
            rect.y() as f32,
            rect.width() as f32,
            rect.height() as f32,
        ),
    );

    for name in element.get_attribute_names().iter() {
        if let Some(name) = name.as_string()
            && let Some(value) = element.get_attribute(&name)
        {
            node.attributes.insert(name, value);
        }
    }
    if let Some(value) = form_value(element) {
        node.attributes.insert("value".to_string(), value);
    }

    node.style = computed_style(window, element);
    node.text = own_text(element);

    let children = element.children();
    for i in 0..children.length() {
        if let Some(child) = children.item(i) {
            node.children.push(capture(window, &child));
        }
    }
    node
}

/// The current value of a form control, which the `value` attribute does
/// not track.
fn form_value(element: &Element) -> Option<String> {
    let tag = element.tag_name().to_ascii_lowercase();
    if !matches!(tag.as_str(), "input" | "textarea" | "select") {
        return None;
    }
    js_sys::Reflect::get(element, &"value".into())
        .ok()?
        .as_string()
        .filter(|v| !v.is_empty())
}

fn computed_style(window: &Window, element: &Element) -> ComputedStyle {
    let mut style = ComputedStyle::new();
    let declaration = match window.get_computed_style(element) {
        Ok(Some(d)) => d,
        Ok(None) => return style,
        Err(e) => {
            log::warn!("getComputedStyle failed on <{}>: {e:?}", element.tag_name());
            return style;
        }
    };
    for property in STYLE_PROPERTIES {
        if let Ok(value) = declaration.get_property_value(property)
            && !value.is_empty()
        {
            style.insert(*property, value);
        }
    }
    style
}

/// Concatenated direct text-node children.
fn own_text(element: &Element) -> Option<String> {
    let nodes = element.child_nodes();
    let mut text = String::new();
    for i in 0..nodes.length() {
        if let Some(node) = nodes.item(i)
            && node.node_type() == Node::TEXT_NODE
            && let Some(content) = node.text_content()
        {
            text.push_str(&content);
        }
    }
    (!text.trim().is_empty()).then_some(text)
}

/// Snapshot the body of a screen's iframe.
///
/// A cross-origin frame exposes no document and is reported as denied; a
/// document that is still loading is not ready.
pub fn capture_frame(frame: &HtmlIFrameElement) -> Result<DomNode, AccessError> {
    let document = frame
        .content_document()
        .ok_or_else(|| AccessError::Denied("frame document is not accessible".into()))?;
    if document.ready_state() != "complete" {
        return Err(AccessError::NotReady);
    }
    let body = document.body().ok_or(AccessError::NotReady)?;
    let window = frame.content_window().ok_or(AccessError::NotReady)?;
    Ok(capture(&window, &body))
}
