//! Core data model for the design tree.
//!
//! A `DesignTree` is a strict tree of `DesignNode` values stored in a
//! `petgraph` stable graph. Edges go parent → child; child order is insertion
//! order. Style primitives (fills, strokes, shadows, text style, auto-layout)
//! live here too so every converter shares one vocabulary.

use crate::id::NodeId;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::ops::Index;
use thiserror::Error;

// ─── Color ───────────────────────────────────────────────────────────────

/// RGBA color, each channel in `0.0 ..= 1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build from 8-bit channels plus a `0..=1` alpha (the computed-style shape).
    pub fn from_rgb8(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a.clamp(0.0, 1.0),
        )
    }

    /// Parse `#RGB`, `#RGBA`, `#RRGGBB`, or `#RRGGBBAA`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        let bytes = hex.as_bytes();

        fn hex_val(c: u8) -> Option<u8> {
            match c {
                b'0'..=b'9' => Some(c - b'0'),
                b'a'..=b'f' => Some(c - b'a' + 10),
                b'A'..=b'F' => Some(c - b'A' + 10),
                _ => None,
            }
        }

        let short = |i: usize| hex_val(bytes[i]).map(|v| v * 17);
        let long = |i: usize| Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?);

        let (r, g, b, a) = match bytes.len() {
            3 => (short(0)?, short(1)?, short(2)?, 255),
            4 => (short(0)?, short(1)?, short(2)?, short(3)?),
            6 => (long(0)?, long(2)?, long(4)?, 255),
            8 => (long(0)?, long(2)?, long(4)?, long(6)?),
            _ => return None,
        };
        Some(Self::from_rgb8(r, g, b, a as f32 / 255.0))
    }

    /// Lowercase `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }

    /// CSS color value: hex when opaque, `rgba()` otherwise.
    pub fn to_css(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("rgba({r}, {g}, {b}, {})", round2(self.a))
        }
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= f32::EPSILON
    }

    /// All channels finite and inside `0..=1`.
    pub fn is_valid(&self) -> bool {
        [self.r, self.g, self.b, self.a]
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
    }
}

pub(crate) fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

// ─── Fills ───────────────────────────────────────────────────────────────

/// Where an image paint's pixels come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageRef {
    /// Base64 payload carried inline (from a `data:` URI).
    Inline { mime: String, base64: String },
    /// Hash of an image already registered with the host tool.
    Hash(String),
    /// Remote location, not yet fetched.
    Url(String),
}

impl ImageRef {
    /// Classify an `src` / `url(...)` value.
    pub fn from_src(src: &str) -> Self {
        let src = src.trim();
        if let Some(rest) = src.strip_prefix("data:")
            && let Some((meta, payload)) = rest.split_once(',')
            && let Some(mime) = meta.strip_suffix(";base64")
        {
            return ImageRef::Inline {
                mime: mime.to_string(),
                base64: payload.to_string(),
            };
        }
        ImageRef::Url(src.to_string())
    }

    /// Renderable `src`, if this reference has one.
    pub fn to_src(&self) -> Option<String> {
        match self {
            ImageRef::Inline { mime, base64 } => Some(format!("data:{mime};base64,{base64}")),
            ImageRef::Url(url) => Some(url.clone()),
            ImageRef::Hash(_) => None,
        }
    }
}

/// How an image paint is fitted into its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScaleMode {
    #[default]
    Fill,
    Fit,
    Crop,
    Tile,
}

/// A paint layer. Order is paint order (first = bottom).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Fill {
    Solid {
        color: Color,
        opacity: f32,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        image: ImageRef,
        scale_mode: ScaleMode,
        opacity: f32,
    },
}

impl Fill {
    pub fn solid(color: Color) -> Self {
        Fill::Solid {
            color,
            opacity: 1.0,
        }
    }
}

/// The first SOLID fill, used wherever a single color is required.
///
/// Every converter goes through this so they all agree on which fill wins.
pub fn first_solid(fills: &[Fill]) -> Option<(Color, f32)> {
    fills.iter().find_map(|f| match f {
        Fill::Solid { color, opacity } => Some((*color, *opacity)),
        Fill::Image { .. } => None,
    })
}

// ─── Stroke / Shadow ─────────────────────────────────────────────────────

/// An outline, always aligned inside the node bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub weight: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShadowKind {
    #[default]
    DropShadow,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub kind: ShadowKind,
    pub color: Option<Color>,
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
    pub spread: f32,
    pub visible: bool,
}

impl Shadow {
    /// Only visible shadows with a color leave the model.
    pub fn forwarded_color(&self) -> Option<Color> {
        if self.visible { self.color } else { None }
    }
}

// ─── Text ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAlignHorizontal {
    #[default]
    Left,
    Center,
    Right,
    Justified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAlignVertical {
    #[default]
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAutoResize {
    WidthAndHeight,
    Height,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: String,
    /// Numeric weight, 100..900.
    pub font_weight: u16,
    pub font_size: f32,
    pub align_horizontal: TextAlignHorizontal,
    pub align_vertical: TextAlignVertical,
    pub letter_spacing: Option<f32>,
    pub line_height: Option<f32>,
    pub auto_resize: Option<TextAutoResize>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Inter".into(),
            font_weight: 400,
            font_size: 16.0,
            align_horizontal: TextAlignHorizontal::Left,
            align_vertical: TextAlignVertical::Top,
            letter_spacing: None,
            line_height: None,
            auto_resize: None,
        }
    }
}

// ─── Auto-layout ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutMode {
    #[default]
    None,
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrimaryAxisAlign {
    #[default]
    Min,
    Center,
    Max,
    SpaceBetween,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CounterAxisAlign {
    #[default]
    Min,
    Center,
    Max,
    Baseline,
}

/// Opt a node out of its parent's auto-layout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutPositioning {
    Auto,
    Absolute,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Padding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Padding {
    pub fn is_zero(&self) -> bool {
        self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0 && self.left == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutProperties {
    pub mode: LayoutMode,
    pub primary_align: PrimaryAxisAlign,
    pub counter_align: CounterAxisAlign,
    pub item_spacing: f32,
    pub padding: Padding,
    /// Set only when the container itself ignores its parent's auto-layout.
    pub positioning: Option<LayoutPositioning>,
}

impl LayoutProperties {
    pub fn is_auto_layout(&self) -> bool {
        self.mode != LayoutMode::None
    }

    pub fn is_absolute(&self) -> bool {
        self.positioning == Some(LayoutPositioning::Absolute)
    }
}

// ─── Corner radius ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CornerRadius {
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_right: f32,
    pub bottom_left: f32,
}

impl CornerRadius {
    pub fn uniform(r: f32) -> Self {
        Self {
            top_left: r,
            top_right: r,
            bottom_right: r,
            bottom_left: r,
        }
    }

    /// The shared radius when all four corners agree.
    pub fn as_uniform(&self) -> Option<f32> {
        let r = self.top_left;
        (self.top_right == r && self.bottom_right == r && self.bottom_left == r).then_some(r)
    }

    pub fn is_zero(&self) -> bool {
        self.as_uniform() == Some(0.0)
    }
}

// ─── Vector data ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindingRule {
    #[default]
    Nonzero,
    Evenodd,
}

/// One SVG path (`d` attribute) with its fill rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPath {
    pub data: String,
    pub winding_rule: WindingRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// Paint attached to a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
    pub fills: SmallVec<[Fill; 1]>,
    pub strokes: SmallVec<[Stroke; 1]>,
    pub shadows: SmallVec<[Shadow; 1]>,
    pub corner_radius: CornerRadius,
}

impl NodeStyle {
    /// Border width that eats into the content box (first stroke).
    pub fn border_width(&self) -> f32 {
        self.strokes.first().map(|s| s.weight).unwrap_or(0.0)
    }

    pub fn has_paint(&self) -> bool {
        !self.fills.is_empty() || !self.strokes.is_empty() || !self.shadows.is_empty()
    }
}

/// The node kinds of a design tree. Converters match on this exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Visible container with optional clipping.
    Frame {
        layout: LayoutProperties,
        clips_content: bool,
    },
    /// Unstyled structural container.
    Group { layout: LayoutProperties },
    Button { layout: LayoutProperties },
    Input {
        layout: LayoutProperties,
        input_type: String,
        placeholder: Option<String>,
        value: Option<String>,
    },
    Text {
        characters: String,
        text_style: TextStyle,
    },
    /// Bitmap; the pixels live in an IMAGE fill.
    Image { alt: Option<String> },
    /// Either an SVG icon (`paths`) or an icon-font glyph (`glyph`).
    Icon {
        glyph: Option<String>,
        text_style: Option<TextStyle>,
        paths: Vec<VectorPath>,
        view_box: Option<ViewBox>,
    },
    Rectangle,
    Vector {
        paths: Vec<VectorPath>,
        view_box: Option<ViewBox>,
    },
}

impl NodeKind {
    pub fn layout(&self) -> Option<&LayoutProperties> {
        match self {
            NodeKind::Frame { layout, .. }
            | NodeKind::Group { layout }
            | NodeKind::Button { layout }
            | NodeKind::Input { layout, .. } => Some(layout),
            NodeKind::Text { .. }
            | NodeKind::Image { .. }
            | NodeKind::Icon { .. }
            | NodeKind::Rectangle
            | NodeKind::Vector { .. } => None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.layout().is_some()
    }

    /// Short lowercase label used for generated ids and names.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Frame { .. } => "frame",
            NodeKind::Group { .. } => "group",
            NodeKind::Button { .. } => "button",
            NodeKind::Input { .. } => "input",
            NodeKind::Text { .. } => "text",
            NodeKind::Image { .. } => "image",
            NodeKind::Icon { .. } => "icon",
            NodeKind::Rectangle => "rect",
            NodeKind::Vector { .. } => "vector",
        }
    }
}

/// A single node. `x`/`y` are relative to the parent's content-box origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignNode {
    pub id: NodeId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Degrees, clockwise.
    pub rotation: f32,
    pub opacity: f32,
    pub visible: bool,
    /// Extends past its parent's content box on purpose.
    pub overflows: bool,
    pub style: NodeStyle,
    pub kind: NodeKind,
}

impl DesignNode {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            name: kind.label().to_string(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            opacity: 1.0,
            visible: true,
            overflows: false,
            style: NodeStyle::default(),
            kind,
        }
    }

    pub fn with_bounds(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        self
    }
}

// ─── Tree ────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("node id `{0}` is already used in this tree")]
    DuplicateId(NodeId),
    #[error("`{0}` is not a container and cannot hold children")]
    NotAContainer(NodeId),
    #[error("parent index is not part of this tree")]
    UnknownParent,
}

/// One screen's design tree.
#[derive(Debug, Clone)]
pub struct DesignTree {
    /// The underlying directed graph (parent → child edges).
    pub graph: StableDiGraph<DesignNode, ()>,

    /// The root node index.
    pub root: NodeIndex,

    /// Index from NodeId → NodeIndex for fast lookup.
    pub id_index: HashMap<NodeId, NodeIndex>,
}

impl DesignTree {
    /// Create a tree holding only `root`.
    #[must_use]
    pub fn new(root: DesignNode) -> Self {
        let mut graph = StableDiGraph::new();
        let id = root.id;
        let root = graph.add_node(root);
        let mut id_index = HashMap::new();
        id_index.insert(id, root);
        Self {
            graph,
            root,
            id_index,
        }
    }

    /// Append `node` as the last child of `parent`.
    ///
    /// Fails on reused ids and non-container parents, so the structure can
    /// only ever be a tree.
    pub fn add_child(&mut self, parent: NodeIndex, node: DesignNode) -> Result<NodeIndex, TreeError> {
        let parent_node = self.graph.node_weight(parent).ok_or(TreeError::UnknownParent)?;
        if !parent_node.kind.is_container() {
            return Err(TreeError::NotAContainer(parent_node.id));
        }
        if self.id_index.contains_key(&node.id) {
            return Err(TreeError::DuplicateId(node.id));
        }
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.id_index.insert(id, idx);
        Ok(idx)
    }

    pub fn root_node(&self) -> &DesignNode {
        &self.graph[self.root]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn get_by_id(&self, id: NodeId) -> Option<&DesignNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children in insertion order.
    ///
    /// Sorts by `NodeIndex`: the stable graph never reuses indices here
    /// (no removals), so index order is insertion order on every target.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    /// Pre-order walk from the root.
    pub fn descendants(&self) -> Vec<NodeIndex> {
        let mut out = Vec::with_capacity(self.node_count());
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            out.push(idx);
            let children = self.children(idx);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Offset of a container's content box from its outer top-left corner.
    pub fn content_origin(&self, idx: NodeIndex) -> (f32, f32) {
        let node = &self.graph[idx];
        let border = node.style.border_width();
        match node.kind.layout() {
            Some(layout) => (layout.padding.left + border, layout.padding.top + border),
            None => (border, border),
        }
    }

    /// Position of a node's outer top-left corner relative to the root.
    pub fn absolute_position(&self, idx: NodeIndex) -> (f32, f32) {
        let node = &self.graph[idx];
        if idx == self.root {
            return (0.0, 0.0);
        }
        match self.parent(idx) {
            Some(parent) => {
                let (px, py) = self.absolute_position(parent);
                let (ox, oy) = self.content_origin(parent);
                (px + ox + node.x, py + oy + node.y)
            }
            None => (node.x, node.y),
        }
    }
}

impl Index<NodeIndex> for DesignTree {
    type Output = DesignNode;

    fn index(&self, idx: NodeIndex) -> &DesignNode {
        &self.graph[idx]
    }
}
