//! In-memory `DesignHost`.
//!
//! Builds a plain layer tree instead of talking to a real design tool. Used by
//! the CLI's dry-run import and by tests, which inspect the layers, the call
//! log, and the notifications afterwards.

use crate::host::{CornerRadii, DesignHost, FrameLayout, HostError, NativePaint, TextProps};
use std::collections::{HashMap, HashSet};
use std::fmt::Write;
use xd_core::plugin::{FontName, PluginEffect, PluginVectorPath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Frame,
    Text,
    Rectangle,
    Vector,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub kind: LayerKind,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub opacity: f32,
    pub fills: Vec<NativePaint>,
    pub strokes: Vec<NativePaint>,
    pub stroke_weight: f32,
    pub effects: Vec<PluginEffect>,
    pub radii: Option<CornerRadii>,
    pub clips_content: bool,
    pub layout: Option<FrameLayout>,
    pub vector_paths: Vec<PluginVectorPath>,
    pub text: Option<TextProps>,
    pub parent: Option<LayerId>,
    pub children: Vec<LayerId>,
}

impl Layer {
    fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            name: String::new(),
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
            opacity: 1.0,
            fills: Vec::new(),
            strokes: Vec::new(),
            stroke_weight: 0.0,
            effects: Vec::new(),
            radii: None,
            clips_content: false,
            layout: None,
            vector_paths: Vec::new(),
            text: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub error: bool,
}

#[derive(Debug)]
pub struct InMemoryHost {
    layers: Vec<Layer>,
    images: HashMap<String, Vec<u8>>,
    /// `None` accepts every font.
    fonts: Option<HashSet<(String, String)>>,
    loaded_fonts: HashSet<(String, String)>,
    viewport_center: (f32, f32),
    pub selection: Vec<LayerId>,
    pub notifications: Vec<Notification>,
    /// Setter calls in order, as `<setter> <layer name or index>`.
    pub calls: Vec<String>,
    pub closed: bool,
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryHost {
    /// A host that can load any font.
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            images: HashMap::new(),
            fonts: None,
            loaded_fonts: HashSet::new(),
            viewport_center: (0.0, 0.0),
            selection: Vec::new(),
            notifications: Vec::new(),
            calls: Vec::new(),
            closed: false,
        }
    }

    /// A host that only has the given `(family, style)` pairs.
    pub fn with_fonts<'a>(fonts: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            fonts: Some(
                fonts
                    .into_iter()
                    .map(|(f, s)| (f.to_string(), s.to_string()))
                    .collect(),
            ),
            ..Self::new()
        }
    }

    pub fn with_viewport_center(mut self, x: f32, y: f32) -> Self {
        self.viewport_center = (x, y);
        self
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> &Layer {
        &self.layers[id.0]
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Layers without a parent.
    pub fn roots(&self) -> Vec<LayerId> {
        (0..self.layers.len())
            .map(LayerId)
            .filter(|id| self.layers[id.0].parent.is_none())
            .collect()
    }

    pub fn find_by_name(&self, name: &str) -> Option<LayerId> {
        self.layers.iter().position(|l| l.name == name).map(LayerId)
    }

    pub fn image(&self, hash: &str) -> Option<&[u8]> {
        self.images.get(hash).map(Vec::as_slice)
    }

    /// Indented outline of every root, one layer per line.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for root in self.roots() {
            self.outline_layer(&mut out, root, 0);
        }
        out
    }

    fn outline_layer(&self, out: &mut String, id: LayerId, depth: usize) {
        let layer = &self.layers[id.0];
        for _ in 0..depth {
            out.push_str("  ");
        }
        let _ = write!(
            out,
            "{:?} \"{}\" {}×{} @ ({}, {})",
            layer.kind, layer.name, layer.width, layer.height, layer.x, layer.y
        );
        if let Some(text) = &layer.text {
            let _ = write!(out, " \"{}\" [{} {}]", text.characters, text.font.family, text.font.style);
        }
        out.push('\n');
        for child in &layer.children {
            self.outline_layer(out, *child, depth + 1);
        }
    }

    fn create(&mut self, kind: LayerKind) -> LayerId {
        self.layers.push(Layer::new(kind));
        LayerId(self.layers.len() - 1)
    }

    fn log(&mut self, call: &str, node: LayerId) {
        let label = match self.layers[node.0].name.as_str() {
            "" => format!("#{}", node.0),
            name => name.to_string(),
        };
        self.calls.push(format!("{call} {label}"));
    }

    fn font_available(&self, font: &FontName) -> bool {
        self.fonts
            .as_ref()
            .is_none_or(|set| set.contains(&(font.family.clone(), font.style.clone())))
    }
}

impl DesignHost for InMemoryHost {
    type Handle = LayerId;

    fn create_frame(&mut self) -> LayerId {
        self.create(LayerKind::Frame)
    }

    fn create_text(&mut self) -> LayerId {
        self.create(LayerKind::Text)
    }

    fn create_rectangle(&mut self) -> LayerId {
        self.create(LayerKind::Rectangle)
    }

    fn create_vector(&mut self) -> LayerId {
        self.create(LayerKind::Vector)
    }

    fn set_name(&mut self, node: LayerId, name: &str) {
        self.layers[node.0].name = name.to_string();
    }

    fn set_position(&mut self, node: LayerId, x: f32, y: f32) {
        self.log("position", node);
        let layer = &mut self.layers[node.0];
        layer.x = x;
        layer.y = y;
    }

    fn resize(&mut self, node: LayerId, width: f32, height: f32) {
        self.log("resize", node);
        let layer = &mut self.layers[node.0];
        layer.width = width;
        layer.height = height;
    }

    fn set_rotation(&mut self, node: LayerId, degrees: f32) {
        self.log("rotation", node);
        self.layers[node.0].rotation = degrees;
    }

    fn set_opacity(&mut self, node: LayerId, opacity: f32) {
        self.log("opacity", node);
        self.layers[node.0].opacity = opacity;
    }

    fn set_fills(&mut self, node: LayerId, fills: Vec<NativePaint>) {
        self.log("fills", node);
        self.layers[node.0].fills = fills;
    }

    fn set_strokes(&mut self, node: LayerId, strokes: Vec<NativePaint>, weight: f32) {
        self.log("strokes", node);
        let layer = &mut self.layers[node.0];
        layer.strokes = strokes;
        layer.stroke_weight = weight;
    }

    fn set_effects(&mut self, node: LayerId, effects: &[PluginEffect]) {
        self.log("effects", node);
        self.layers[node.0].effects = effects.to_vec();
    }

    fn set_corner_radius(&mut self, node: LayerId, radii: CornerRadii) {
        self.log("radius", node);
        self.layers[node.0].radii = Some(radii);
    }

    fn set_clips_content(&mut self, node: LayerId, clips: bool) {
        self.layers[node.0].clips_content = clips;
    }

    fn set_layout(&mut self, node: LayerId, layout: &FrameLayout) {
        self.log("layout", node);
        self.layers[node.0].layout = Some(*layout);
    }

    fn set_vector_paths(&mut self, node: LayerId, paths: &[PluginVectorPath]) {
        self.layers[node.0].vector_paths = paths.to_vec();
    }

    fn set_text(&mut self, node: LayerId, text: &TextProps) -> Result<(), HostError> {
        let key = (text.font.family.clone(), text.font.style.clone());
        if !self.loaded_fonts.contains(&key) {
            return Err(HostError::FontUnavailable {
                family: key.0,
                style: key.1,
            });
        }
        self.log("text", node);
        self.layers[node.0].text = Some(text.clone());
        Ok(())
    }

    fn append_child(&mut self, parent: LayerId, child: LayerId) {
        self.layers[child.0].parent = Some(parent);
        self.layers[parent.0].children.push(child);
    }

    fn create_image(&mut self, bytes: &[u8]) -> Result<String, HostError> {
        if bytes.is_empty() {
            return Err(HostError::InvalidImage("empty image".into()));
        }
        let hash = format!("img{:04}", self.images.len());
        self.images.insert(hash.clone(), bytes.to_vec());
        Ok(hash)
    }

    async fn load_font(&mut self, font: &FontName) -> Result<(), HostError> {
        if !self.font_available(font) {
            return Err(HostError::FontUnavailable {
                family: font.family.clone(),
                style: font.style.clone(),
            });
        }
        self.loaded_fonts
            .insert((font.family.clone(), font.style.clone()));
        Ok(())
    }

    fn viewport_center(&self) -> (f32, f32) {
        self.viewport_center
    }

    fn select_and_focus(&mut self, nodes: &[LayerId]) {
        self.selection = nodes.to_vec();
    }

    fn notify(&mut self, message: &str, error: bool) {
        self.notifications.push(Notification {
            message: message.to_string(),
            error,
        });
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
