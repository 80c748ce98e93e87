//! DOM parser: rendered DOM snapshot → `DesignTree`.
//!
//! Walks the snapshot depth-first, classifies each element into a node kind,
//! extracts geometry relative to the parent's content box and converts the
//! computed style into fills, strokes, shadows, radii, text style and
//! auto-layout. Nothing here fails: ambiguous elements degrade to the most
//! generic kind and malformed elements are skipped with their subtree.

use crate::config::ParserConfig;
use crate::css::{
    first_font_family, parse_box_shadows, parse_color, parse_font_weight, parse_px,
    parse_rotation, parse_url,
};
use crate::dom::{DomError, DomNode, Rect};
use crate::id::IdAllocator;
use crate::model::*;
use petgraph::graph::NodeIndex;

/// Parse a snapshot with the default configuration.
#[must_use]
pub fn parse_dom(root: &DomNode) -> DesignTree {
    parse_dom_with(root, &ParserConfig::default())
}

/// Parse a JSON snapshot document.
pub fn parse_snapshot_json(json: &str, config: &ParserConfig) -> Result<DesignTree, DomError> {
    let root = DomNode::from_json(json)?;
    Ok(parse_dom_with(&root, config))
}

/// Parse a snapshot. The root element always becomes a clipping Frame at (0, 0).
#[must_use]
pub fn parse_dom_with(root: &DomNode, config: &ParserConfig) -> DesignTree {
    let mut parser = DomParser {
        config,
        ids: IdAllocator::new(),
    };

    let mut root_node = parser.build_node(root, Classification::Frame, None);
    root_node.x = 0.0;
    root_node.y = 0.0;
    if let NodeKind::Frame { clips_content, .. } = &mut root_node.kind {
        *clips_content = true;
    }

    let mut tree = DesignTree::new(root_node);
    let root_idx = tree.root;
    parser.visit_children(&mut tree, root, root_idx);

    log::debug!(
        "parsed DOM snapshot <{}> into {} design nodes",
        root.tag,
        tree.node_count()
    );
    tree
}

/// The node kind chosen for an element, before any data is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Frame,
    Group,
    Button,
    Input,
    Text,
    Image,
    Icon,
    Vector,
    Rectangle,
}

const INTERACTIVE_ROLES: &[&str] = &["button", "link", "tab"];
const INTERACTIVE_DATA_ATTRS: &[&str] = &["data-interactive", "data-clickable", "data-action"];
const ICON_CLASS_MARKERS: &[&str] = &["icon", "material-symbols", "material-icons", "fa-"];

/// Classify an element, most specific rule first:
/// explicit interactivity markers, then tag name, then structure.
pub fn classify(el: &DomNode, config: &ParserConfig) -> Classification {
    let is_form_control = el.tag_is("input") || el.tag_is("textarea") || el.tag_is("select");

    // (a) explicit markers
    let role_interactive = el
        .attr("role")
        .is_some_and(|r| INTERACTIVE_ROLES.iter().any(|i| r.eq_ignore_ascii_case(i)));
    let data_interactive = INTERACTIVE_DATA_ATTRS.iter().any(|a| el.has_attr(a));
    if role_interactive || data_interactive || el.has_click_handler() {
        return if is_form_control {
            Classification::Input
        } else {
            Classification::Button
        };
    }

    // (b) tag name
    match el.tag.as_str() {
        "img" | "picture" => return Classification::Image,
        "svg" => {
            let small = el.rect.width <= config.icon_max_size
                && el.rect.height <= config.icon_max_size;
            return if small {
                Classification::Icon
            } else {
                Classification::Vector
            };
        }
        "button" => return Classification::Button,
        "input" => {
            let ty = el.attr("type").unwrap_or("text").to_ascii_lowercase();
            return if matches!(ty.as_str(), "submit" | "button" | "reset") {
                Classification::Button
            } else {
                Classification::Input
            };
        }
        "textarea" | "select" => return Classification::Input,
        _ => {}
    }

    let has_children = !el.children.is_empty();
    let text = el.own_text();

    if !has_children && text.is_some() {
        if is_icon_glyph(el) {
            return Classification::Icon;
        }
        // Text with its own box paint keeps the box as a frame around the text.
        return if has_box_paint(el) {
            Classification::Frame
        } else {
            Classification::Text
        };
    }

    // (c) structural fallback
    if has_children || text.is_some() {
        if has_box_paint(el) || is_layout_container(el) || clips(el) {
            Classification::Frame
        } else {
            Classification::Group
        }
    } else {
        Classification::Rectangle
    }
}

fn is_icon_glyph(el: &DomNode) -> bool {
    if el.has_attr("data-icon") {
        return true;
    }
    (el.tag_is("i") || el.tag_is("span"))
        && el
            .classes()
            .any(|c| ICON_CLASS_MARKERS.iter().any(|m| c.contains(m)))
}

fn has_box_paint(el: &DomNode) -> bool {
    background_color(el).is_some()
        || extract_stroke(el).is_some()
        || parse_box_shadows(el.style.get("box-shadow").unwrap_or("none"))
            .iter()
            .any(|s| s.forwarded_color().is_some())
        || background_image(el).is_some()
}

fn is_layout_container(el: &DomNode) -> bool {
    matches!(
        el.style.get("display"),
        Some("flex" | "inline-flex" | "grid" | "inline-grid")
    )
}

fn clips(el: &DomNode) -> bool {
    ["overflow", "overflow-x", "overflow-y"].iter().any(|p| {
        matches!(
            el.style.get(p),
            Some("hidden" | "clip" | "auto" | "scroll")
        )
    })
}

// ─── Walker ──────────────────────────────────────────────────────────────

/// Where children of the current container are measured from.
struct ParentCtx {
    /// Viewport-absolute content-box origin.
    origin: (f32, f32),
    content_width: f32,
    content_height: f32,
    auto_layout: bool,
    /// Label text should be centered vertically (buttons, inputs, centered flex).
    center_text: bool,
}

struct DomParser<'c> {
    config: &'c ParserConfig,
    ids: IdAllocator,
}

impl DomParser<'_> {
    fn visit_children(&mut self, tree: &mut DesignTree, el: &DomNode, idx: NodeIndex) {
        let ctx = self.parent_ctx(tree, el, idx);

        if let Some((text, dim)) = synthesized_label(el, &tree[idx].kind) {
            let label = self.text_node(el, text, dim, &ctx);
            if let Err(e) = tree.add_child(idx, label) {
                log::warn!("dropping label of <{}>: {e}", el.tag);
            }
        }

        for child in &el.children {
            self.visit(tree, child, idx, &ctx);
        }
    }

    fn visit(&mut self, tree: &mut DesignTree, el: &DomNode, parent: NodeIndex, ctx: &ParentCtx) {
        if self.config.ignored_tags.iter().any(|t| el.tag_is(t)) {
            return;
        }
        if !el.rect.is_well_formed() {
            log::warn!("skipping <{}> with malformed rect {:?}", el.tag, el.rect);
            return;
        }
        if !el.is_rendered() {
            log::trace!("pruning hidden <{}>", el.tag);
            return;
        }
        if el.rect.width == 0.0 && el.rect.height == 0.0 && el.children.is_empty() {
            log::trace!("pruning empty <{}>", el.tag);
            return;
        }

        let class = classify(el, self.config);
        let node = self.build_node(el, class, Some(ctx));
        let is_container = node.kind.is_container();
        match tree.add_child(parent, node) {
            Ok(idx) if is_container => self.visit_children(tree, el, idx),
            Ok(_) => {}
            Err(e) => log::warn!("skipping <{}>: {e}", el.tag),
        }
    }

    fn parent_ctx(&self, tree: &DesignTree, el: &DomNode, idx: NodeIndex) -> ParentCtx {
        let node = &tree[idx];
        let (ox, oy) = tree.content_origin(idx);
        let border = node.style.border_width();
        let (pad_r, pad_b, auto_layout, centered) = match node.kind.layout() {
            Some(l) => (
                l.padding.right,
                l.padding.bottom,
                l.is_auto_layout(),
                l.counter_align == CounterAxisAlign::Center && l.mode == LayoutMode::Horizontal,
            ),
            None => (0.0, 0.0, false, false),
        };
        ParentCtx {
            origin: (el.rect.x + ox, el.rect.y + oy),
            content_width: (node.width - ox - pad_r - border).max(0.0),
            content_height: (node.height - oy - pad_b - border).max(0.0),
            auto_layout,
            center_text: centered
                || matches!(node.kind, NodeKind::Button { .. } | NodeKind::Input { .. }),
        }
    }

    fn build_node(&mut self, el: &DomNode, class: Classification, ctx: Option<&ParentCtx>) -> DesignNode {
        let parent_auto_layout = ctx.is_some_and(|c| c.auto_layout);
        let kind = node_kind(el, class, parent_auto_layout);
        let preferred = el.attr("data-node-id").or_else(|| el.attr("id"));
        let id = self.ids.claim(preferred, kind.label());

        let mut node = DesignNode::new(id, kind);
        node.name = node_name(el, &node.kind);

        let rel = match ctx {
            Some(c) => el.rect.relative_to(c.origin),
            None => Rect::new(0.0, 0.0, el.rect.width, el.rect.height),
        };
        node.x = round2(rel.x);
        node.y = round2(rel.y);
        node.width = round2(rel.width);
        node.height = round2(rel.height);
        node.rotation = el
            .style
            .get("transform")
            .and_then(parse_rotation)
            .unwrap_or(0.0);
        node.opacity = el
            .style
            .get("opacity")
            .and_then(|o| o.parse::<f32>().ok())
            .filter(|o| o.is_finite())
            .map(|o| o.clamp(0.0, 1.0))
            .unwrap_or(1.0);
        node.style = extract_style(el, &node.kind);

        if let Some(c) = ctx {
            let eps = self.config.containment_epsilon;
            node.overflows = node.x < -eps
                || node.y < -eps
                || node.x + node.width > c.content_width + eps
                || node.y + node.height > c.content_height + eps;
        }
        node
    }

    /// A Text child carrying a container's own text (button labels, mixed content).
    fn text_node(&mut self, el: &DomNode, text: String, dim: bool, ctx: &ParentCtx) -> DesignNode {
        let mut text_style = extract_text_style(el);
        if ctx.center_text {
            text_style.align_vertical = TextAlignVertical::Center;
            if text_style.align_horizontal == TextAlignHorizontal::Left && !el.tag_is("input") {
                text_style.align_horizontal = TextAlignHorizontal::Center;
            }
        }
        let id = self.ids.claim(None, "text");
        let mut node = DesignNode::new(
            id,
            NodeKind::Text {
                characters: text.clone(),
                text_style,
            },
        )
        .with_bounds(0.0, 0.0, round2(ctx.content_width), round2(ctx.content_height));
        node.name = snippet(&text);
        if let Some(color) = color_property(el, "color") {
            node.style.fills.push(Fill::Solid {
                color,
                opacity: if dim { 0.5 } else { 1.0 },
            });
        }
        node
    }
}

/// Text a container shows itself: own text, or an input's value / placeholder.
/// The flag marks placeholder text, rendered dimmed.
fn synthesized_label(el: &DomNode, kind: &NodeKind) -> Option<(String, bool)> {
    match kind {
        NodeKind::Input {
            value, placeholder, ..
        } => value
            .clone()
            .filter(|v| !v.is_empty())
            .map(|v| (v, false))
            .or_else(|| el.own_text().map(|t| (t, false)))
            .or_else(|| placeholder.clone().map(|p| (p, true))),
        k if k.is_container() => el.own_text().map(|t| (t, false)),
        _ => None,
    }
}

fn node_kind(el: &DomNode, class: Classification, parent_auto_layout: bool) -> NodeKind {
    let layout = || extract_layout(el, parent_auto_layout);
    match class {
        Classification::Frame => NodeKind::Frame {
            layout: layout(),
            clips_content: clips(el),
        },
        Classification::Group => NodeKind::Group { layout: layout() },
        Classification::Button => NodeKind::Button { layout: layout() },
        Classification::Input => NodeKind::Input {
            layout: layout(),
            input_type: if el.tag_is("input") {
                el.attr("type").unwrap_or("text").to_ascii_lowercase()
            } else {
                el.tag.clone()
            },
            placeholder: el.attr("placeholder").map(str::to_string),
            value: el.attr("value").map(str::to_string),
        },
        Classification::Text => NodeKind::Text {
            characters: el.own_text().unwrap_or_default(),
            text_style: extract_text_style(el),
        },
        Classification::Image => NodeKind::Image {
            alt: el.attr("alt").map(str::to_string),
        },
        Classification::Icon if el.tag_is("svg") => NodeKind::Icon {
            glyph: None,
            text_style: None,
            paths: collect_paths(el),
            view_box: el.attr("viewBox").and_then(parse_view_box),
        },
        Classification::Icon => NodeKind::Icon {
            glyph: el.own_text(),
            text_style: Some(extract_text_style(el)),
            paths: Vec::new(),
            view_box: None,
        },
        Classification::Vector => NodeKind::Vector {
            paths: collect_paths(el),
            view_box: el.attr("viewBox").and_then(parse_view_box),
        },
        Classification::Rectangle => NodeKind::Rectangle,
    }
}

fn node_name(el: &DomNode, kind: &NodeKind) -> String {
    if let Some(name) = ["data-name", "aria-label", "id"]
        .iter()
        .find_map(|a| el.attr(a).filter(|v| !v.trim().is_empty()))
    {
        return name.trim().to_string();
    }
    match kind {
        NodeKind::Text { characters, .. } => snippet(characters),
        _ => el.tag.clone(),
    }
}

fn snippet(text: &str) -> String {
    const MAX: usize = 32;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX - 1).collect();
        format!("{cut}…")
    }
}

// ─── Style extraction ───────────────────────────────────────────────────

pub(crate) fn color_property(el: &DomNode, property: &str) -> Option<Color> {
    let value = el.style.get(property)?;
    match parse_color(value) {
        Some(c) if !c.is_transparent() => Some(c),
        Some(_) => None,
        None => {
            log::debug!("unparseable {property} {value:?} on <{}>", el.tag);
            None
        }
    }
}

fn background_color(el: &DomNode) -> Option<Color> {
    color_property(el, "background-color")
}

fn background_image(el: &DomNode) -> Option<Fill> {
    let url = el.style.get("background-image").and_then(parse_url)?;
    let scale_mode = match el.style.get("background-size") {
        Some("contain") => ScaleMode::Fit,
        Some("auto") | Some("auto auto") => {
            if el.style.get("background-repeat").is_some_and(|r| r.starts_with("repeat")) {
                ScaleMode::Tile
            } else {
                ScaleMode::Crop
            }
        }
        _ => ScaleMode::Fill,
    };
    Some(Fill::Image {
        image: ImageRef::from_src(&url),
        scale_mode,
        opacity: 1.0,
    })
}

pub(crate) fn extract_stroke(el: &DomNode) -> Option<Stroke> {
    for side in ["top", "right", "bottom", "left"] {
        let Some(weight) = el
            .style
            .get(&format!("border-{side}-width"))
            .and_then(parse_px)
        else {
            continue;
        };
        if weight <= 0.0 {
            continue;
        }
        let style = el.style.get(&format!("border-{side}-style")).unwrap_or("solid");
        if style == "none" || style == "hidden" {
            continue;
        }
        if let Some(color) = color_property(el, &format!("border-{side}-color")) {
            return Some(Stroke { color, weight });
        }
    }
    None
}

fn parse_radius(value: &str, rect: &Rect) -> Option<f32> {
    let first = value.split_whitespace().next()?;
    let r = match first.strip_suffix('%') {
        Some(pct) => pct.parse::<f32>().ok()? / 100.0 * rect.width.min(rect.height),
        None => parse_px(first)?,
    };
    // CSS clamps oversized radii (pill shapes) to half the short side.
    Some(r.clamp(0.0, rect.width.min(rect.height) / 2.0))
}

pub(crate) fn extract_radius(el: &DomNode) -> CornerRadius {
    let corner = |name: &str| {
        el.style
            .get(&format!("border-{name}-radius"))
            .and_then(|v| parse_radius(v, &el.rect))
            .unwrap_or(0.0)
    };
    CornerRadius {
        top_left: corner("top-left"),
        top_right: corner("top-right"),
        bottom_right: corner("bottom-right"),
        bottom_left: corner("bottom-left"),
    }
}

fn extract_style(el: &DomNode, kind: &NodeKind) -> NodeStyle {
    let mut style = NodeStyle::default();

    match kind {
        NodeKind::Text { .. }
        | NodeKind::Icon {
            glyph: Some(_), ..
        } => {
            if let Some(color) = color_property(el, "color") {
                style.fills.push(Fill::solid(color));
            }
            return style;
        }
        NodeKind::Vector { .. } | NodeKind::Icon { .. } => {
            extract_svg_paint(el, &mut style);
            return style;
        }
        NodeKind::Frame { .. }
        | NodeKind::Group { .. }
        | NodeKind::Button { .. }
        | NodeKind::Input { .. }
        | NodeKind::Image { .. }
        | NodeKind::Rectangle => {}
    }

    if let Some(color) = background_color(el) {
        style.fills.push(Fill::solid(color));
    }
    if let Some(fill) = background_image(el) {
        style.fills.push(fill);
    }
    if let NodeKind::Image { .. } = kind
        && let Some(src) = el.attr("src").or_else(|| el.attr("data-src"))
    {
        let scale_mode = match el.style.get("object-fit") {
            Some("contain" | "scale-down") => ScaleMode::Fit,
            Some("none") => ScaleMode::Crop,
            _ => ScaleMode::Fill,
        };
        style.fills.push(Fill::Image {
            image: ImageRef::from_src(src),
            scale_mode,
            opacity: 1.0,
        });
    }

    if let Some(stroke) = extract_stroke(el) {
        style.strokes.push(stroke);
    }
    style
        .shadows
        .extend(parse_box_shadows(el.style.get("box-shadow").unwrap_or("none")));
    style.corner_radius = extract_radius(el);
    style
}

/// SVG paint: `fill` (falling back to `color` for `currentColor`) and `stroke`.
fn extract_svg_paint(el: &DomNode, style: &mut NodeStyle) {
    let fill_value = el
        .style
        .get("fill")
        .or_else(|| el.attr("fill"))
        .unwrap_or("currentcolor");
    if !fill_value.eq_ignore_ascii_case("none") {
        let color = if fill_value.eq_ignore_ascii_case("currentcolor") {
            color_property(el, "color")
        } else {
            parse_color(fill_value).filter(|c| !c.is_transparent())
        };
        if let Some(color) = color {
            style.fills.push(Fill::solid(color));
        }
    }

    let stroke_value = el.style.get("stroke").or_else(|| el.attr("stroke"));
    if let Some(value) = stroke_value.filter(|v| !v.eq_ignore_ascii_case("none")) {
        let color = if value.eq_ignore_ascii_case("currentcolor") {
            color_property(el, "color")
        } else {
            parse_color(value)
        };
        let weight = el
            .style
            .get("stroke-width")
            .or_else(|| el.attr("stroke-width"))
            .and_then(parse_px)
            .unwrap_or(1.0);
        if let Some(color) = color {
            style.strokes.push(Stroke { color, weight });
        }
    }
}

pub(crate) fn extract_text_style(el: &DomNode) -> TextStyle {
    let defaults = TextStyle::default();
    let align_horizontal = match el.style.get("text-align") {
        Some("center") => TextAlignHorizontal::Center,
        Some("right" | "end") => TextAlignHorizontal::Right,
        Some("justify") => TextAlignHorizontal::Justified,
        _ => TextAlignHorizontal::Left,
    };
    let align_vertical = match el.style.get("align-items") {
        Some("center") if is_layout_container(el) => TextAlignVertical::Center,
        Some("flex-end" | "end") if is_layout_container(el) => TextAlignVertical::Bottom,
        _ => TextAlignVertical::Top,
    };
    TextStyle {
        font_family: el
            .style
            .get("font-family")
            .and_then(first_font_family)
            .unwrap_or(defaults.font_family),
        font_weight: el
            .style
            .get("font-weight")
            .and_then(parse_font_weight)
            .unwrap_or(defaults.font_weight),
        font_size: el
            .style
            .get("font-size")
            .and_then(parse_px)
            .filter(|s| *s > 0.0)
            .unwrap_or(defaults.font_size),
        align_horizontal,
        align_vertical,
        letter_spacing: el.style.get("letter-spacing").and_then(parse_px),
        line_height: el.style.get("line-height").and_then(parse_px),
        auto_resize: Some(match el.style.get("white-space") {
            Some("nowrap" | "pre") => TextAutoResize::WidthAndHeight,
            _ => TextAutoResize::Height,
        }),
    }
}

fn extract_layout(el: &DomNode, parent_auto_layout: bool) -> LayoutProperties {
    let px = |p: &str| el.style.get(p).and_then(parse_px).unwrap_or(0.0);
    let padding = Padding {
        top: px("padding-top"),
        right: px("padding-right"),
        bottom: px("padding-bottom"),
        left: px("padding-left"),
    };

    let positioning = (parent_auto_layout
        && matches!(el.style.get("position"), Some("absolute" | "fixed")))
    .then_some(LayoutPositioning::Absolute);

    if !matches!(el.style.get("display"), Some("flex" | "inline-flex")) {
        return LayoutProperties {
            padding,
            positioning,
            ..LayoutProperties::default()
        };
    }

    let vertical = el
        .style
        .get("flex-direction")
        .is_some_and(|d| d.starts_with("column"));
    let gap_property = if vertical { "row-gap" } else { "column-gap" };
    let item_spacing = el
        .style
        .get(gap_property)
        .or_else(|| el.style.get("gap"))
        .and_then(|g| g.split_whitespace().next())
        .and_then(parse_px)
        .unwrap_or(0.0);

    LayoutProperties {
        mode: if vertical {
            LayoutMode::Vertical
        } else {
            LayoutMode::Horizontal
        },
        primary_align: match el.style.get("justify-content") {
            Some("center") => PrimaryAxisAlign::Center,
            Some("flex-end" | "end" | "right") => PrimaryAxisAlign::Max,
            Some("space-between" | "space-around" | "space-evenly") => {
                PrimaryAxisAlign::SpaceBetween
            }
            _ => PrimaryAxisAlign::Min,
        },
        counter_align: match el.style.get("align-items") {
            Some("center") => CounterAxisAlign::Center,
            Some("flex-end" | "end") => CounterAxisAlign::Max,
            Some("baseline") => CounterAxisAlign::Baseline,
            _ => CounterAxisAlign::Min,
        },
        item_spacing,
        padding,
        positioning,
    }
}

// ─── SVG geometry ───────────────────────────────────────────────────────

pub(crate) fn parse_view_box(value: &str) -> Option<ViewBox> {
    let nums: Vec<f32> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match nums.as_slice() {
        [min_x, min_y, width, height] => Some(ViewBox {
            min_x: *min_x,
            min_y: *min_y,
            width: *width,
            height: *height,
        }),
        _ => None,
    }
}

/// Every drawable shape below an `<svg>`, as path data.
pub(crate) fn collect_paths(svg: &DomNode) -> Vec<VectorPath> {
    fn walk(el: &DomNode, out: &mut Vec<VectorPath>) {
        if let Some(data) = shape_to_path(el) {
            let evenodd = el
                .attr("fill-rule")
                .or_else(|| el.style.get("fill-rule"))
                .is_some_and(|r| r == "evenodd");
            out.push(VectorPath {
                data,
                winding_rule: if evenodd {
                    WindingRule::Evenodd
                } else {
                    WindingRule::Nonzero
                },
            });
        }
        for child in &el.children {
            walk(child, out);
        }
    }
    let mut out = Vec::new();
    for child in &svg.children {
        walk(child, &mut out);
    }
    out
}

fn shape_to_path(el: &DomNode) -> Option<String> {
    let num = |name: &str| el.attr(name).and_then(|v| v.trim().parse::<f32>().ok());
    let points = || -> Option<Vec<(f32, f32)>> {
        let nums: Vec<f32> = el
            .attr("points")?
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<_, _>>()
            .ok()?;
        Some(nums.chunks_exact(2).map(|p| (p[0], p[1])).collect())
    };

    match el.tag.as_str() {
        "path" => el.attr("d").map(str::to_string).filter(|d| !d.trim().is_empty()),
        "rect" => {
            let (x, y) = (num("x").unwrap_or(0.0), num("y").unwrap_or(0.0));
            let (w, h) = (num("width")?, num("height")?);
            Some(format!("M {x} {y} H {} V {} H {x} Z", x + w, y + h))
        }
        "circle" | "ellipse" => {
            let (cx, cy) = (num("cx").unwrap_or(0.0), num("cy").unwrap_or(0.0));
            let (rx, ry) = match num("r") {
                Some(r) => (r, r),
                None => (num("rx")?, num("ry")?),
            };
            Some(format!(
                "M {} {cy} A {rx} {ry} 0 1 0 {} {cy} A {rx} {ry} 0 1 0 {} {cy} Z",
                cx - rx,
                cx + rx,
                cx - rx
            ))
        }
        "line" => Some(format!(
            "M {} {} L {} {}",
            num("x1").unwrap_or(0.0),
            num("y1").unwrap_or(0.0),
            num("x2").unwrap_or(0.0),
            num("y2").unwrap_or(0.0)
        )),
        "polyline" | "polygon" => {
            let pts = points()?;
            let (first, rest) = pts.split_first()?;
            let mut d = format!("M {} {}", first.0, first.1);
            for (x, y) in rest {
                d.push_str(&format!(" L {x} {y}"));
            }
            if el.tag_is("polygon") {
                d.push_str(" Z");
            }
            Some(d)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;
    use pretty_assertions::assert_eq;

    fn div(x: f32, y: f32, w: f32, h: f32) -> DomNode {
        DomNode::new("div", Rect::new(x, y, w, h))
    }

    #[test]
    fn classify_priority_markers_over_tags() {
        let cfg = ParserConfig::default();
        let linked_div = div(0.0, 0.0, 100.0, 40.0).with_attr("role", "link");
        assert_eq!(classify(&linked_div, &cfg), Classification::Button);

        let clickable_input = DomNode::new("input", Rect::new(0.0, 0.0, 100.0, 40.0))
            .with_attr("data-clickable", "");
        assert_eq!(classify(&clickable_input, &cfg), Classification::Input);

        let submit = DomNode::new("input", Rect::new(0.0, 0.0, 100.0, 40.0))
            .with_attr("type", "submit");
        assert_eq!(classify(&submit, &cfg), Classification::Button);
    }

    #[test]
    fn classify_tags_and_structure() {
        let cfg = ParserConfig::default();
        let img = DomNode::new("img", Rect::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(classify(&img, &cfg), Classification::Image);

        let small_svg = DomNode::new("svg", Rect::new(0.0, 0.0, 24.0, 24.0));
        assert_eq!(classify(&small_svg, &cfg), Classification::Icon);
        let big_svg = DomNode::new("svg", Rect::new(0.0, 0.0, 200.0, 120.0));
        assert_eq!(classify(&big_svg, &cfg), Classification::Vector);

        let para = DomNode::new("p", Rect::new(0.0, 0.0, 80.0, 20.0)).with_text("Hi");
        assert_eq!(classify(&para, &cfg), Classification::Text);

        let chip = DomNode::new("span", Rect::new(0.0, 0.0, 80.0, 20.0))
            .with_text("New")
            .with_style("background-color", "rgb(0, 128, 0)");
        assert_eq!(classify(&chip, &cfg), Classification::Frame);

        let glyph = DomNode::new("span", Rect::new(0.0, 0.0, 24.0, 24.0))
            .with_attr("class", "material-symbols-outlined")
            .with_text("home");
        assert_eq!(classify(&glyph, &cfg), Classification::Icon);

        let plain_wrapper = div(0.0, 0.0, 100.0, 100.0).with_child(div(0.0, 0.0, 10.0, 10.0));
        assert_eq!(classify(&plain_wrapper, &cfg), Classification::Group);

        let flex_wrapper = plain_wrapper.clone().with_style("display", "flex");
        assert_eq!(classify(&flex_wrapper, &cfg), Classification::Frame);

        // A childless, textless box degrades to the most generic kind.
        assert_eq!(classify(&div(0.0, 0.0, 10.0, 10.0), &cfg), Classification::Rectangle);
    }

    #[test]
    fn red_box_and_text_round_trip() {
        let root = div(0.0, 0.0, 200.0, 100.0)
            .with_child(
                div(10.0, 10.0, 50.0, 50.0).with_style("background-color", "rgb(255, 0, 0)"),
            )
            .with_child(
                DomNode::new("span", Rect::new(70.0, 10.0, 60.0, 20.0))
                    .with_text("Hello")
                    .with_style("color", "rgb(0, 0, 0)"),
            );

        let tree = parse_dom(&root);
        let children = tree.children(tree.root);
        assert_eq!(children.len(), 2);

        let rect = &tree[children[0]];
        assert!(matches!(rect.kind, NodeKind::Rectangle));
        assert_eq!(first_solid(&rect.style.fills).map(|(c, _)| c.to_hex()).as_deref(), Some("#ff0000"));

        match &tree[children[1]].kind {
            NodeKind::Text { characters, .. } => assert_eq!(characters, "Hello"),
            other => panic!("expected Text, got {other:?}"),
        }
    }

    #[test]
    fn geometry_is_relative_to_parent_content_box() {
        let root = div(100.0, 50.0, 300.0, 300.0).with_child(
            div(120.0, 70.0, 200.0, 200.0)
                .with_style("display", "flex")
                .with_style("padding-top", "8px")
                .with_style("padding-left", "12px")
                .with_style("border-top-width", "2px")
                .with_style("border-top-style", "solid")
                .with_style("border-top-color", "rgb(0, 0, 0)")
                .with_child(div(134.0, 80.0, 40.0, 40.0).with_attr("id", "inner")),
        );
        let tree = parse_dom(&root);
        let inner = tree.get_by_id(NodeId::intern("inner")).unwrap();
        // 134 - (120 + 12 + 2), 80 - (70 + 8 + 2)
        assert_eq!((inner.x, inner.y), (0.0, 0.0));
        assert!(!inner.overflows);
    }

    #[test]
    fn hidden_and_empty_nodes_are_pruned() {
        let root = div(0.0, 0.0, 100.0, 100.0)
            .with_child(div(0.0, 0.0, 10.0, 10.0).with_style("display", "none"))
            .with_child(div(0.0, 0.0, 10.0, 10.0).with_style("visibility", "hidden"))
            .with_child(div(0.0, 0.0, 0.0, 0.0))
            .with_child(DomNode::new("script", Rect::new(0.0, 0.0, 0.0, 0.0)))
            .with_child(div(0.0, 0.0, 10.0, 10.0).with_attr("id", "kept"));
        let tree = parse_dom(&root);
        assert_eq!(tree.node_count(), 2);
        assert!(tree.get_by_id(NodeId::intern("kept")).is_some());
    }

    #[test]
    fn malformed_rect_skips_subtree_only() {
        let root = div(0.0, 0.0, 100.0, 100.0)
            .with_child(div(0.0, 0.0, -5.0, 10.0).with_child(div(0.0, 0.0, 5.0, 5.0)))
            .with_child(div(0.0, 0.0, 10.0, 10.0));
        let tree = parse_dom(&root);
        assert_eq!(tree.children(tree.root).len(), 1);
    }

    #[test]
    fn button_label_is_synthesized_and_centered() {
        let root = div(0.0, 0.0, 300.0, 100.0).with_child(
            DomNode::new("button", Rect::new(10.0, 10.0, 120.0, 44.0))
                .with_text("Continue")
                .with_style("font-weight", "600")
                .with_style("background-color", "rgb(79, 70, 229)")
                .with_style("color", "rgb(255, 255, 255)"),
        );
        let tree = parse_dom(&root);
        let button_idx = tree.children(tree.root)[0];
        assert!(matches!(tree[button_idx].kind, NodeKind::Button { .. }));
        let label = &tree[tree.children(button_idx)[0]];
        match &label.kind {
            NodeKind::Text {
                characters,
                text_style,
            } => {
                assert_eq!(characters, "Continue");
                assert_eq!(text_style.font_weight, 600);
                assert_eq!(text_style.align_vertical, TextAlignVertical::Center);
                assert_eq!(text_style.align_horizontal, TextAlignHorizontal::Center);
            }
            other => panic!("expected label text, got {other:?}"),
        }
        assert_eq!((label.width, label.height), (120.0, 44.0));
    }

    #[test]
    fn input_placeholder_becomes_dimmed_label() {
        let root = div(0.0, 0.0, 300.0, 100.0).with_child(
            DomNode::new("input", Rect::new(0.0, 0.0, 200.0, 40.0))
                .with_attr("placeholder", "Email")
                .with_style("color", "rgb(0, 0, 0)"),
        );
        let tree = parse_dom(&root);
        let input_idx = tree.children(tree.root)[0];
        match &tree[input_idx].kind {
            NodeKind::Input {
                input_type,
                placeholder,
                ..
            } => {
                assert_eq!(input_type, "text");
                assert_eq!(placeholder.as_deref(), Some("Email"));
            }
            other => panic!("expected Input, got {other:?}"),
        }
        let label = &tree[tree.children(input_idx)[0]];
        assert_eq!(first_solid(&label.style.fills).map(|(_, o)| o), Some(0.5));
    }

    #[test]
    fn flex_container_maps_to_auto_layout() {
        let root = div(0.0, 0.0, 300.0, 100.0)
            .with_style("display", "flex")
            .with_style("flex-direction", "column")
            .with_style("justify-content", "space-between")
            .with_style("align-items", "center")
            .with_style("row-gap", "12px")
            .with_style("padding-left", "16px");
        let tree = parse_dom(&root);
        let layout = tree.root_node().kind.layout().copied().unwrap();
        assert_eq!(layout.mode, LayoutMode::Vertical);
        assert_eq!(layout.primary_align, PrimaryAxisAlign::SpaceBetween);
        assert_eq!(layout.counter_align, CounterAxisAlign::Center);
        assert_eq!(layout.item_spacing, 12.0);
        assert_eq!(layout.padding.left, 16.0);
    }

    #[test]
    fn absolute_child_of_auto_layout_is_flagged() {
        let root = div(0.0, 0.0, 300.0, 100.0)
            .with_style("display", "flex")
            .with_child(
                div(0.0, 0.0, 50.0, 50.0)
                    .with_style("position", "absolute")
                    .with_child(div(0.0, 0.0, 10.0, 10.0)),
            );
        let tree = parse_dom(&root);
        let child = &tree[tree.children(tree.root)[0]];
        assert!(child.kind.layout().unwrap().is_absolute());
    }

    #[test]
    fn overflowing_children_are_flagged() {
        let root = div(0.0, 0.0, 100.0, 100.0)
            .with_child(div(80.0, 0.0, 50.0, 10.0).with_attr("id", "spill"))
            .with_child(div(50.0, 0.0, 50.5, 10.0).with_attr("id", "fits"));
        let tree = parse_dom(&root);
        assert!(tree.get_by_id(NodeId::intern("spill")).unwrap().overflows);
        assert!(!tree.get_by_id(NodeId::intern("fits")).unwrap().overflows);
    }

    #[test]
    fn style_extraction() {
        let root = div(0.0, 0.0, 100.0, 100.0).with_child(
            div(0.0, 0.0, 80.0, 40.0)
                .with_attr("id", "card")
                .with_style("background-color", "rgb(255, 255, 255)")
                .with_style("border-top-width", "1px")
                .with_style("border-top-style", "solid")
                .with_style("border-top-color", "rgb(229, 231, 235)")
                .with_style("box-shadow", "rgba(0, 0, 0, 0.1) 0px 4px 6px -1px")
                .with_style("border-top-left-radius", "12px")
                .with_style("border-top-right-radius", "12px")
                .with_style("border-bottom-right-radius", "9999px")
                .with_style("border-bottom-left-radius", "12px")
                .with_style("opacity", "0.8")
                .with_style("transform", "matrix(0, 1, -1, 0, 0, 0)"),
        );
        let tree = parse_dom(&root);
        let card = tree.get_by_id(NodeId::intern("card")).unwrap();
        assert_eq!(card.style.fills.len(), 1);
        assert_eq!(card.style.strokes[0].weight, 1.0);
        assert_eq!(card.style.shadows[0].offset_y, 4.0);
        assert_eq!(card.style.corner_radius.top_left, 12.0);
        // Pill radius clamps to half the short side.
        assert_eq!(card.style.corner_radius.bottom_right, 20.0);
        assert_eq!(card.opacity, 0.8);
        assert!((card.rotation - 90.0).abs() < 1e-3);
    }

    #[test]
    fn svg_shapes_become_paths() {
        let svg = DomNode::new("svg", Rect::new(0.0, 0.0, 24.0, 24.0))
            .with_attr("viewBox", "0 0 24 24")
            .with_style("fill", "rgb(0, 0, 0)")
            .with_child(
                DomNode::new("path", Rect::default())
                    .with_attr("d", "M0 0L24 24")
                    .with_attr("fill-rule", "evenodd"),
            )
            .with_child(
                DomNode::new("circle", Rect::default())
                    .with_attr("cx", "12")
                    .with_attr("cy", "12")
                    .with_attr("r", "4"),
            );
        let root = div(0.0, 0.0, 100.0, 100.0).with_child(svg);
        let tree = parse_dom(&root);
        let icon = &tree[tree.children(tree.root)[0]];
        match &icon.kind {
            NodeKind::Icon {
                paths, view_box, ..
            } => {
                assert_eq!(paths.len(), 2);
                assert_eq!(paths[0].winding_rule, WindingRule::Evenodd);
                assert!(paths[1].data.starts_with("M 8 12 A 4 4"));
                assert_eq!(view_box.unwrap().width, 24.0);
            }
            other => panic!("expected Icon, got {other:?}"),
        }
        assert_eq!(icon.style.fills.len(), 1);
    }

    #[test]
    fn ids_are_stable_across_parses() {
        let root = div(0.0, 0.0, 100.0, 100.0)
            .with_child(div(0.0, 0.0, 10.0, 10.0))
            .with_child(div(0.0, 20.0, 10.0, 10.0).with_attr("id", "named"));
        let a = parse_dom(&root);
        let b = parse_dom(&root);
        let ids = |t: &DesignTree| t.descendants().iter().map(|i| t[*i].id).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
    }
}
