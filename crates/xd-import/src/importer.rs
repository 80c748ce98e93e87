//! Recursive builder: plugin JSON → native host layers.
//!
//! The payload is validated as a whole before the first layer is created, so
//! a rejected import leaves the host untouched. After that every failure is
//! local: a text node whose font cannot be loaded is skipped, an image that
//! does not decode is dropped from its node, and the rest of the tree builds.

use crate::host::{CornerRadii, DesignHost, FrameLayout, NativePaint, TextProps};
use crate::protocol::{ImportOutcome, UiMessage};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use xd_core::model::{LayoutMode, TextStyle};
use xd_core::plugin::{EXPORT_TAG, FontName, PluginDocument, PluginNode, PluginNodeType, PluginPaint};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("payload is not a valid export document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not an XD export (type {0:?})")]
    WrongTag(Option<String>),
    #[error("export contains no nodes")]
    NoNodes,
}

/// The font every host is expected to have.
pub fn fallback_font() -> FontName {
    FontName {
        family: "Inter".to_string(),
        style: "Regular".to_string(),
    }
}

/// Only the fields checked before anything is built.
#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    nodes: Vec<serde_json::Value>,
}

/// Check the tag and node list, then decode the full document.
pub fn validate(json: &str) -> Result<PluginDocument, ImportError> {
    let envelope: Envelope = serde_json::from_str(json)?;
    if envelope.kind.as_deref() != Some(EXPORT_TAG) {
        return Err(ImportError::WrongTag(envelope.kind));
    }
    if envelope.nodes.is_empty() {
        return Err(ImportError::NoNodes);
    }
    Ok(serde_json::from_str(json)?)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Native layers created.
    pub created: usize,
    pub warnings: Vec<String>,
}

/// Serve one UI request: import or cancel, then notify and close.
pub async fn handle_message<H: DesignHost>(host: &mut H, message: UiMessage) -> ImportOutcome {
    let outcome = match message {
        UiMessage::Cancel => ImportOutcome::Cancelled,
        UiMessage::ImportJson { json } => match validate(&json) {
            Ok(doc) => {
                let report = import_document(host, &doc).await;
                ImportOutcome::Imported {
                    name: doc.name,
                    created: report.created,
                    warnings: report.warnings,
                }
            }
            Err(e) => {
                log::warn!("rejecting import: {e}");
                ImportOutcome::Rejected {
                    reason: e.to_string(),
                }
            }
        },
    };
    if outcome != ImportOutcome::Cancelled {
        host.notify(&outcome.notice(), outcome.is_error());
    }
    host.close();
    outcome
}

/// Build every root of a validated document, center the first at the
/// viewport center (the rest keep their offset to it), select and focus them.
pub async fn import_document<H: DesignHost>(host: &mut H, doc: &PluginDocument) -> ImportReport {
    let mut builder = Builder {
        host: &mut *host,
        report: ImportReport::default(),
    };
    let mut roots = Vec::with_capacity(doc.nodes.len());
    for node in &doc.nodes {
        if let Some(handle) = builder.build(node).await {
            roots.push((handle, node));
        }
    }
    let report = builder.report;

    if let Some((_, first)) = roots.first() {
        let (cx, cy) = host.viewport_center();
        let dx = cx - first.width / 2.0 - first.x;
        let dy = cy - first.height / 2.0 - first.y;
        for (handle, node) in &roots {
            host.set_position(*handle, node.x + dx, node.y + dy);
        }
        let handles: Vec<H::Handle> = roots.iter().map(|(h, _)| *h).collect();
        host.select_and_focus(&handles);
    }
    log::debug!(
        "imported \"{}\": {} layers, {} warnings",
        doc.name,
        report.created,
        report.warnings.len()
    );
    report
}

struct Builder<'h, H: DesignHost> {
    host: &'h mut H,
    report: ImportReport,
}

impl<H: DesignHost> Builder<'_, H> {
    fn warn(&mut self, message: String) {
        log::warn!("{message}");
        self.report.warnings.push(message);
    }

    fn build<'a>(
        &'a mut self,
        node: &'a PluginNode,
    ) -> Pin<Box<dyn Future<Output = Option<H::Handle>> + 'a>> {
        Box::pin(async move {
            let handle = match node.node_type {
                PluginNodeType::Frame => self.host.create_frame(),
                PluginNodeType::Rectangle => self.host.create_rectangle(),
                PluginNodeType::Vector => {
                    let handle = self.host.create_vector();
                    self.host.set_vector_paths(handle, &node.vector_paths);
                    handle
                }
                PluginNodeType::Text => self.build_text(node).await?,
            };
            self.report.created += 1;
            self.host.set_name(handle, &node.name);
            self.apply_common(handle, node);

            if node.node_type == PluginNodeType::Frame {
                self.host.set_clips_content(handle, node.clips_content.unwrap_or(false));
                self.host.set_layout(handle, &frame_layout(node));
                for child in &node.children {
                    if let Some(child_handle) = self.build(child).await {
                        self.host.append_child(handle, child_handle);
                    }
                }
            } else if !node.children.is_empty() {
                self.warn(format!(
                    "`{}`: children of a non-frame node were ignored",
                    node.id
                ));
            }
            Some(handle)
        })
    }

    /// Load the font (falling back once), then create the text layer.
    async fn build_text(&mut self, node: &PluginNode) -> Option<H::Handle> {
        let mut props = text_props(node);
        if let Err(e) = self.host.load_font(&props.font).await {
            let fallback = fallback_font();
            match self.host.load_font(&fallback).await {
                Ok(()) => {
                    self.warn(format!("`{}`: {e}, using {} {}", node.id, fallback.family, fallback.style));
                    props.font = fallback;
                }
                Err(e2) => {
                    self.warn(format!("`{}`: skipped text layer ({e}; {e2})", node.id));
                    return None;
                }
            }
        }
        let handle = self.host.create_text();
        if let Err(e) = self.host.set_text(handle, &props) {
            self.warn(format!("`{}`: text not applied: {e}", node.id));
        }
        Some(handle)
    }

    /// Position/size, rotation, opacity, fills, strokes, effects, radii; in that order.
    fn apply_common(&mut self, handle: H::Handle, node: &PluginNode) {
        self.host.set_position(handle, node.x, node.y);
        // Hosts reject zero-sized layers.
        self.host.resize(handle, node.width.max(0.01), node.height.max(0.01));
        if node.rotation != 0.0 {
            self.host.set_rotation(handle, node.rotation);
        }
        self.host.set_opacity(handle, node.opacity);

        if !node.fills.is_empty() {
            let fills = self.native_paints(node, &node.fills);
            self.host.set_fills(handle, fills);
        } else if node.node_type != PluginNodeType::Text {
            // Host frames default to a white fill.
            self.host.set_fills(handle, Vec::new());
        }
        if let Some(weight) = node.stroke_weight
            && !node.strokes.is_empty()
        {
            let strokes = self.native_paints(node, &node.strokes);
            self.host.set_strokes(handle, strokes, weight);
        }
        if !node.effects.is_empty() {
            self.host.set_effects(handle, &node.effects);
        }

        if let Some(r) = node.corner_radius {
            self.host.set_corner_radius(handle, CornerRadii::Uniform(r));
        } else if node.top_left_radius.is_some()
            || node.top_right_radius.is_some()
            || node.bottom_right_radius.is_some()
            || node.bottom_left_radius.is_some()
        {
            self.host.set_corner_radius(
                handle,
                CornerRadii::PerCorner {
                    top_left: node.top_left_radius.unwrap_or(0.0),
                    top_right: node.top_right_radius.unwrap_or(0.0),
                    bottom_right: node.bottom_right_radius.unwrap_or(0.0),
                    bottom_left: node.bottom_left_radius.unwrap_or(0.0),
                },
            );
        }
    }

    fn native_paints(&mut self, node: &PluginNode, paints: &[PluginPaint]) -> Vec<NativePaint> {
        let mut out = Vec::with_capacity(paints.len());
        for paint in paints {
            match paint {
                PluginPaint::Solid { color, opacity } => out.push(NativePaint::Solid {
                    color: *color,
                    opacity: *opacity,
                }),
                PluginPaint::Image {
                    image_base64,
                    image_hash,
                    image_url,
                    scale_mode,
                    opacity,
                } => {
                    let hash = if let Some(b64) = image_base64 {
                        self.register_image(node, b64)
                    } else if let Some(hash) = image_hash {
                        Some(hash.clone())
                    } else {
                        let source = image_url.as_deref().unwrap_or("<none>");
                        self.warn(format!("`{}`: image {source} was not embedded before export", node.id));
                        None
                    };
                    if let Some(hash) = hash {
                        out.push(NativePaint::Image {
                            hash,
                            scale_mode: *scale_mode,
                            opacity: *opacity,
                        });
                    }
                }
            }
        }
        out
    }

    fn register_image(&mut self, node: &PluginNode, b64: &str) -> Option<String> {
        let bytes = match STANDARD.decode(b64.trim()) {
            Ok(bytes) => bytes,
            Err(e) => {
                let message = format!("`{}`: image could not be decoded ({e})", node.id);
                self.host.notify(&message, false);
                self.warn(message);
                return None;
            }
        };
        match self.host.create_image(&bytes) {
            Ok(hash) => Some(hash),
            Err(e) => {
                let message = format!("`{}`: {e}", node.id);
                self.host.notify(&message, false);
                self.warn(message);
                None
            }
        }
    }
}

fn text_props(node: &PluginNode) -> TextProps {
    let defaults = TextStyle::default();
    TextProps {
        characters: node.characters.clone().unwrap_or_default(),
        font: node.font_name.clone().unwrap_or_else(fallback_font),
        font_size: node.font_size.unwrap_or(defaults.font_size),
        align_horizontal: node.text_align_horizontal.unwrap_or_default(),
        align_vertical: node.text_align_vertical.unwrap_or_default(),
        letter_spacing: node.letter_spacing,
        line_height: node.line_height,
        auto_resize: node.text_auto_resize,
    }
}

fn frame_layout(node: &PluginNode) -> FrameLayout {
    FrameLayout {
        mode: node.layout_mode.unwrap_or(LayoutMode::None),
        primary_align: node.primary_axis_align_items.unwrap_or_default(),
        counter_align: node.counter_axis_align_items.unwrap_or_default(),
        item_spacing: node.item_spacing.unwrap_or(0.0),
        padding: [
            node.padding_top.unwrap_or(0.0),
            node.padding_right.unwrap_or(0.0),
            node.padding_bottom.unwrap_or(0.0),
            node.padding_left.unwrap_or(0.0),
        ],
        positioning: node.layout_positioning,
    }
}
