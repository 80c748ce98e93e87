//! Plugin JSON contract.
//!
//! The document shape exchanged between the structured exporter and the host
//! importer. Field names follow the host tool's own node API (camelCase,
//! SCREAMING enum values) so the importer can apply them one-to-one. Optional
//! fields are omitted when unset; field order is declaration order, which
//! keeps serialization byte-stable.

use crate::model::{
    CounterAxisAlign, LayoutMode, LayoutPositioning, PrimaryAxisAlign, ScaleMode,
    TextAlignHorizontal, TextAlignVertical, TextAutoResize, WindingRule,
};
use serde::{Deserialize, Serialize};

/// Tag identifying a structured export document.
pub const EXPORT_TAG: &str = "XDESIGN_FIGMA_EXPORT";

/// Top-level export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDocument {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<PluginNode>,
}

/// The four structural kinds the host knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PluginNodeType {
    Frame,
    Text,
    Rectangle,
    Vector,
}

/// Normalized RGB; alpha travels in the paint's `opacity`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PluginPaint {
    Solid { color: Rgb, opacity: f32 },
    /// Exactly one of the three sources is set.
    #[serde(rename_all = "camelCase")]
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_base64: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_hash: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_url: Option<String>,
        scale_mode: ScaleMode,
        opacity: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectType {
    DropShadow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginEffect {
    #[serde(rename = "type")]
    pub kind: EffectType,
    pub color: Rgba,
    pub offset: Vec2,
    pub radius: f32,
    pub spread: f32,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontName {
    pub family: String,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginVectorPath {
    pub winding_rule: WindingRule,
    pub data: String,
}

fn is_zero(v: &f32) -> bool {
    *v == 0.0
}

fn is_one(v: &f32) -> bool {
    *v == 1.0
}

/// One node. Frame, text and vector fields are only present on their kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginNode {
    #[serde(rename = "type")]
    pub node_type: PluginNodeType,
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rotation: f32,
    #[serde(default = "default_opacity", skip_serializing_if = "is_one")]
    pub opacity: f32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fills: Vec<PluginPaint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strokes: Vec<PluginPaint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_weight: Option<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<PluginEffect>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_left_radius: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_right_radius: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_right_radius: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_left_radius: Option<f32>,

    // Frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clips_content: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_mode: Option<LayoutMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_axis_align_items: Option<PrimaryAxisAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_axis_align_items: Option<CounterAxisAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_spacing: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_top: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_right: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_bottom: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_left: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_positioning: Option<LayoutPositioning>,

    // Text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<FontName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align_horizontal: Option<TextAlignHorizontal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align_vertical: Option<TextAlignVertical>,
    /// Pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f32>,
    /// Pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_auto_resize: Option<TextAutoResize>,

    // Vector
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vector_paths: Vec<PluginVectorPath>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PluginNode>,
}

fn default_opacity() -> f32 {
    1.0
}

impl PluginNode {
    /// A node with geometry only; every optional field unset.
    pub fn new(node_type: PluginNodeType, id: &str, name: &str) -> Self {
        Self {
            node_type,
            id: id.to_string(),
            name: name.to_string(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            opacity: 1.0,
            fills: Vec::new(),
            strokes: Vec::new(),
            stroke_weight: None,
            effects: Vec::new(),
            corner_radius: None,
            top_left_radius: None,
            top_right_radius: None,
            bottom_right_radius: None,
            bottom_left_radius: None,
            clips_content: None,
            layout_mode: None,
            primary_axis_align_items: None,
            counter_axis_align_items: None,
            item_spacing: None,
            padding_top: None,
            padding_right: None,
            padding_bottom: None,
            padding_left: None,
            layout_positioning: None,
            characters: None,
            font_name: None,
            font_size: None,
            text_align_horizontal: None,
            text_align_vertical: None,
            letter_spacing: None,
            line_height: None,
            text_auto_resize: None,
            vector_paths: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Total node count of this subtree.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(PluginNode::count).sum::<usize>()
    }
}
