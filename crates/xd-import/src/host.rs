//! The host design tool's node API, as seen by the importer.
//!
//! A real host binds these calls to its scripting runtime; `InMemoryHost`
//! implements them over plain data for dry runs and tests. Font loading is
//! the only asynchronous call.

use thiserror::Error;
use xd_core::model::{
    CounterAxisAlign, LayoutMode, LayoutPositioning, PrimaryAxisAlign, ScaleMode,
    TextAlignHorizontal, TextAlignVertical, TextAutoResize,
};
use xd_core::plugin::{FontName, PluginEffect, PluginVectorPath, Rgb};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("font {family} {style} is not available")]
    FontUnavailable { family: String, style: String },
    #[error("image rejected by host: {0}")]
    InvalidImage(String),
}

/// A fill or stroke paint in host terms. Images reference a registered hash.
#[derive(Debug, Clone, PartialEq)]
pub enum NativePaint {
    Solid { color: Rgb, opacity: f32 },
    Image { hash: String, scale_mode: ScaleMode, opacity: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CornerRadii {
    Uniform(f32),
    PerCorner {
        top_left: f32,
        top_right: f32,
        bottom_right: f32,
        bottom_left: f32,
    },
}

/// Auto-layout settings applied to a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameLayout {
    pub mode: LayoutMode,
    pub primary_align: PrimaryAxisAlign,
    pub counter_align: CounterAxisAlign,
    pub item_spacing: f32,
    pub padding: [f32; 4],
    pub positioning: Option<LayoutPositioning>,
}

/// Text content and typography, applied after the font is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct TextProps {
    pub characters: String,
    pub font: FontName,
    pub font_size: f32,
    pub align_horizontal: TextAlignHorizontal,
    pub align_vertical: TextAlignVertical,
    pub letter_spacing: Option<f32>,
    pub line_height: Option<f32>,
    pub auto_resize: Option<TextAutoResize>,
}

/// Native node constructors and setters.
///
/// Setters mirror the host API one call per property group; the importer
/// calls them in a fixed order.
#[allow(async_fn_in_trait)]
pub trait DesignHost {
    type Handle: Copy + Eq + std::fmt::Debug;

    fn create_frame(&mut self) -> Self::Handle;
    fn create_text(&mut self) -> Self::Handle;
    fn create_rectangle(&mut self) -> Self::Handle;
    fn create_vector(&mut self) -> Self::Handle;

    fn set_name(&mut self, node: Self::Handle, name: &str);
    fn set_position(&mut self, node: Self::Handle, x: f32, y: f32);
    fn resize(&mut self, node: Self::Handle, width: f32, height: f32);
    fn set_rotation(&mut self, node: Self::Handle, degrees: f32);
    fn set_opacity(&mut self, node: Self::Handle, opacity: f32);
    fn set_fills(&mut self, node: Self::Handle, fills: Vec<NativePaint>);
    /// Strokes are always aligned inside.
    fn set_strokes(&mut self, node: Self::Handle, strokes: Vec<NativePaint>, weight: f32);
    fn set_effects(&mut self, node: Self::Handle, effects: &[PluginEffect]);
    fn set_corner_radius(&mut self, node: Self::Handle, radii: CornerRadii);
    fn set_clips_content(&mut self, node: Self::Handle, clips: bool);
    fn set_layout(&mut self, node: Self::Handle, layout: &FrameLayout);
    fn set_vector_paths(&mut self, node: Self::Handle, paths: &[PluginVectorPath]);
    /// Requires the font to be loaded.
    fn set_text(&mut self, node: Self::Handle, text: &TextProps) -> Result<(), HostError>;

    fn append_child(&mut self, parent: Self::Handle, child: Self::Handle);

    /// Register decoded image bytes; returns the host's image hash.
    fn create_image(&mut self, bytes: &[u8]) -> Result<String, HostError>;
    async fn load_font(&mut self, font: &FontName) -> Result<(), HostError>;

    fn viewport_center(&self) -> (f32, f32);
    /// Select `nodes` and frame the viewport around them.
    fn select_and_focus(&mut self, nodes: &[Self::Handle]);
    fn notify(&mut self, message: &str, error: bool);
    fn close(&mut self);
}
