//! Markup renderer: `DesignTree` → HTML.
//!
//! Emits one element per node with inline styles. Auto-layout containers
//! become flex boxes with in-flow children; every other child is absolutely
//! positioned inside its parent's padding box. Ids and names ride along as
//! `data-node-id` / `data-name`, so parsing the rendered markup again yields
//! the same ids.

use crate::model::*;
use petgraph::graph::NodeIndex;
use std::fmt::Write;

/// Render the whole tree, root first.
#[must_use]
pub fn render_html(tree: &DesignTree) -> String {
    let mut out = String::with_capacity(2048);
    render_node(&mut out, tree, tree.root, None, 0);
    out
}

/// Render a single subtree as if it were absolutely placed in its parent.
#[must_use]
pub fn render_subtree(tree: &DesignTree, idx: NodeIndex) -> String {
    let mut out = String::with_capacity(512);
    let parent_layout = tree.parent(idx).and_then(|p| tree[p].kind.layout().copied());
    render_node(&mut out, tree, idx, parent_layout.as_ref(), 0);
    out
}

pub(crate) fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

/// Trim float noise: `12.0` → `12`, `0.333333` → `0.33`.
pub(crate) fn num(v: f32) -> String {
    let r = round2(v);
    if r == r.trunc() {
        format!("{}", r as i64)
    } else {
        format!("{r}")
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

/// Inline style declarations in insertion order.
#[derive(Default)]
struct Decls(Vec<(&'static str, String)>);

impl Decls {
    fn push(&mut self, property: &'static str, value: impl Into<String>) {
        self.0.push((property, value.into()));
    }

    fn px(&mut self, property: &'static str, v: f32) {
        self.push(property, format!("{}px", num(v)));
    }

    fn render(&self) -> String {
        self.0
            .iter()
            .map(|(p, v)| format!("{p}:{v}"))
            .collect::<Vec<_>>()
            .join(";")
    }
}

fn render_node(
    out: &mut String,
    tree: &DesignTree,
    idx: NodeIndex,
    parent_layout: Option<&LayoutProperties>,
    depth: usize,
) {
    let node = &tree[idx];
    let mut decls = Decls::default();

    if matches!(node.kind, NodeKind::Button { .. } | NodeKind::Input { .. }) {
        // Clear user-agent chrome; modeled paint follows.
        decls.push("margin", "0");
        decls.push("padding", "0");
        decls.push("border", "none");
        decls.push("background", "none");
    }
    push_position(&mut decls, node, parent_layout);
    decls.push("box-sizing", "border-box");
    decls.px("width", node.width);
    decls.px("height", node.height);
    if node.opacity < 1.0 {
        decls.push("opacity", num(node.opacity));
    }
    if node.rotation != 0.0 {
        decls.push("transform", format!("rotate({}deg)", num(node.rotation)));
    }

    let attrs = format!(
        r#"data-node-id="{}" data-name="{}""#,
        escape_attr(node.id.as_str()),
        escape_attr(&node.name)
    );

    indent(out, depth);
    match &node.kind {
        NodeKind::Text {
            characters,
            text_style,
        } => {
            decls.push("margin", "0");
            push_text_color(&mut decls, node);
            push_text_style(&mut decls, text_style);
            let _ = writeln!(
                out,
                r#"<p {attrs} style="{}">{}</p>"#,
                escape_attr(&decls.render()),
                escape_text(characters)
            );
        }
        NodeKind::Icon {
            glyph: Some(glyph),
            text_style,
            ..
        } => {
            push_text_color(&mut decls, node);
            push_text_style(&mut decls, &text_style.clone().unwrap_or_default());
            let _ = writeln!(
                out,
                r#"<span {attrs} data-icon="" style="{}">{}</span>"#,
                escape_attr(&decls.render()),
                escape_text(glyph)
            );
        }
        NodeKind::Icon {
            paths, view_box, ..
        }
        | NodeKind::Vector { paths, view_box } => {
            render_svg_element(out, node, &attrs, &decls, paths, view_box.as_ref(), depth);
        }
        NodeKind::Image { alt } => {
            push_box_paint(&mut decls, node, false);
            let mut img_attrs = attrs.clone();
            if let Some(alt) = alt {
                let _ = write!(img_attrs, r#" alt="{}""#, escape_attr(alt));
            }
            for fill in &node.style.fills {
                if let Fill::Image {
                    image, scale_mode, ..
                } = fill
                {
                    match image.to_src() {
                        Some(src) => {
                            let _ = write!(img_attrs, r#" src="{}""#, escape_attr(&src));
                        }
                        None => {
                            if let ImageRef::Hash(hash) = image {
                                let _ = write!(img_attrs, r#" data-image-hash="{}""#, escape_attr(hash));
                            }
                        }
                    }
                    decls.push("object-fit", object_fit(*scale_mode));
                    break;
                }
            }
            let _ = writeln!(out, r#"<img {img_attrs} style="{}">"#, escape_attr(&decls.render()));
        }
        NodeKind::Rectangle => {
            push_box_paint(&mut decls, node, true);
            let _ = writeln!(out, r#"<div {attrs} style="{}"></div>"#, escape_attr(&decls.render()));
        }
        NodeKind::Input {
            layout,
            input_type,
            placeholder,
            value,
        } => {
            push_box_paint(&mut decls, node, true);
            push_layout(&mut decls, layout);
            // The label child carries the font.
            if let Some(label) = tree.children(idx).into_iter().find_map(|c| match &tree[c].kind {
                NodeKind::Text { text_style, .. } => Some((c, text_style)),
                _ => None,
            }) {
                push_text_color(&mut decls, &tree[label.0]);
                push_text_style(&mut decls, label.1);
            }
            let mut input_attrs = attrs.clone();
            if let Some(p) = placeholder {
                let _ = write!(input_attrs, r#" placeholder="{}""#, escape_attr(p));
            }
            let style = escape_attr(&decls.render());
            match input_type.as_str() {
                "textarea" => {
                    let _ = writeln!(
                        out,
                        r#"<textarea {input_attrs} style="{style}">{}</textarea>"#,
                        escape_text(value.as_deref().unwrap_or(""))
                    );
                }
                "select" => {
                    let _ = writeln!(
                        out,
                        r#"<select {input_attrs} style="{style}"><option>{}</option></select>"#,
                        escape_text(value.as_deref().unwrap_or(""))
                    );
                }
                ty => {
                    let _ = write!(input_attrs, r#" type="{}""#, escape_attr(ty));
                    if let Some(v) = value {
                        let _ = write!(input_attrs, r#" value="{}""#, escape_attr(v));
                    }
                    let _ = writeln!(out, r#"<input {input_attrs} style="{style}">"#);
                }
            }
        }
        NodeKind::Frame { layout, .. } | NodeKind::Group { layout } | NodeKind::Button { layout } => {
            push_box_paint(&mut decls, node, true);
            push_layout(&mut decls, layout);
            if let NodeKind::Frame {
                clips_content: true,
                ..
            } = node.kind
            {
                decls.push("overflow", "hidden");
            }
            let tag = if matches!(node.kind, NodeKind::Button { .. }) {
                "button"
            } else {
                "div"
            };
            let _ = writeln!(out, r#"<{tag} {attrs} style="{}">"#, escape_attr(&decls.render()));
            for child in tree.children(idx) {
                render_node(out, tree, child, Some(layout), depth + 1);
            }
            indent(out, depth);
            let _ = writeln!(out, "</{tag}>");
        }
    }
}

fn push_position(decls: &mut Decls, node: &DesignNode, parent_layout: Option<&LayoutProperties>) {
    let absolute = node.kind.layout().is_some_and(LayoutProperties::is_absolute);
    match parent_layout {
        None => decls.push("position", "relative"),
        Some(parent) if parent.is_auto_layout() && !absolute => {
            decls.push("position", "relative");
            decls.push("flex-shrink", "0");
        }
        Some(parent) => {
            decls.push("position", "absolute");
            decls.px("left", node.x + parent.padding.left);
            decls.px("top", node.y + parent.padding.top);
        }
    }
}

/// Background, border, shadow and radius. `with_images` adds image fills as
/// background images (an `<img>` draws its own).
fn push_box_paint(decls: &mut Decls, node: &DesignNode, with_images: bool) {
    if let Some((color, opacity)) = first_solid(&node.style.fills) {
        let color = Color { a: color.a * opacity, ..color };
        decls.push("background-color", color.to_css());
    }
    if with_images {
        for fill in &node.style.fills {
            if let Fill::Image {
                image, scale_mode, ..
            } = fill
                && let Some(src) = image.to_src()
            {
                decls.push("background-image", format!("url(\"{src}\")"));
                match scale_mode {
                    ScaleMode::Fill => decls.push("background-size", "cover"),
                    ScaleMode::Fit => decls.push("background-size", "contain"),
                    ScaleMode::Crop => decls.push("background-size", "auto"),
                    ScaleMode::Tile => decls.push("background-repeat", "repeat"),
                }
                if *scale_mode != ScaleMode::Tile {
                    decls.push("background-repeat", "no-repeat");
                    decls.push("background-position", "center");
                }
                break;
            }
        }
    }
    if let Some(stroke) = node.style.strokes.first() {
        decls.push(
            "border",
            format!("{}px solid {}", num(stroke.weight), stroke.color.to_css()),
        );
    }
    let shadows: Vec<String> = node
        .style
        .shadows
        .iter()
        .filter_map(|s| {
            s.forwarded_color().map(|c| {
                format!(
                    "{}px {}px {}px {}px {}",
                    num(s.offset_x),
                    num(s.offset_y),
                    num(s.blur),
                    num(s.spread),
                    c.to_css()
                )
            })
        })
        .collect();
    if !shadows.is_empty() {
        decls.push("box-shadow", shadows.join(", "));
    }
    let r = node.style.corner_radius;
    match r.as_uniform() {
        Some(v) if v == 0.0 => {}
        Some(v) => decls.px("border-radius", v),
        None => decls.push(
            "border-radius",
            format!(
                "{}px {}px {}px {}px",
                num(r.top_left),
                num(r.top_right),
                num(r.bottom_right),
                num(r.bottom_left)
            ),
        ),
    }
}

fn push_layout(decls: &mut Decls, layout: &LayoutProperties) {
    if layout.is_auto_layout() {
        decls.push("display", "flex");
        decls.push(
            "flex-direction",
            if layout.mode == LayoutMode::Vertical {
                "column"
            } else {
                "row"
            },
        );
        decls.push(
            "justify-content",
            match layout.primary_align {
                PrimaryAxisAlign::Min => "flex-start",
                PrimaryAxisAlign::Center => "center",
                PrimaryAxisAlign::Max => "flex-end",
                PrimaryAxisAlign::SpaceBetween => "space-between",
            },
        );
        decls.push(
            "align-items",
            match layout.counter_align {
                CounterAxisAlign::Min => "flex-start",
                CounterAxisAlign::Center => "center",
                CounterAxisAlign::Max => "flex-end",
                CounterAxisAlign::Baseline => "baseline",
            },
        );
        if layout.item_spacing != 0.0 {
            decls.px("gap", layout.item_spacing);
        }
    }
    let p = layout.padding;
    if !p.is_zero() {
        decls.push(
            "padding",
            format!(
                "{}px {}px {}px {}px",
                num(p.top),
                num(p.right),
                num(p.bottom),
                num(p.left)
            ),
        );
    }
}

fn push_text_color(decls: &mut Decls, node: &DesignNode) {
    if let Some((color, opacity)) = first_solid(&node.style.fills) {
        let color = Color { a: color.a * opacity, ..color };
        decls.push("color", color.to_css());
    }
}

fn push_text_style(decls: &mut Decls, style: &TextStyle) {
    decls.push("font-family", format!("'{}'", style.font_family.replace('\'', "")));
    decls.push("font-weight", style.font_weight.to_string());
    decls.px("font-size", style.font_size);
    decls.push(
        "text-align",
        match style.align_horizontal {
            TextAlignHorizontal::Left => "left",
            TextAlignHorizontal::Center => "center",
            TextAlignHorizontal::Right => "right",
            TextAlignHorizontal::Justified => "justify",
        },
    );
    if let Some(ls) = style.letter_spacing {
        decls.px("letter-spacing", ls);
    }
    if let Some(lh) = style.line_height {
        decls.px("line-height", lh);
    }
    if style.auto_resize == Some(TextAutoResize::WidthAndHeight) {
        decls.push("white-space", "nowrap");
    }
    if style.align_vertical != TextAlignVertical::Top {
        decls.push("display", "flex");
        decls.push(
            "align-items",
            if style.align_vertical == TextAlignVertical::Center {
                "center"
            } else {
                "flex-end"
            },
        );
        decls.push(
            "justify-content",
            match style.align_horizontal {
                TextAlignHorizontal::Center => "center",
                TextAlignHorizontal::Right => "flex-end",
                TextAlignHorizontal::Left | TextAlignHorizontal::Justified => "flex-start",
            },
        );
    }
}

fn object_fit(mode: ScaleMode) -> &'static str {
    match mode {
        ScaleMode::Fill => "cover",
        ScaleMode::Fit => "contain",
        ScaleMode::Crop | ScaleMode::Tile => "none",
    }
}

fn render_svg_element(
    out: &mut String,
    node: &DesignNode,
    attrs: &str,
    decls: &Decls,
    paths: &[VectorPath],
    view_box: Option<&ViewBox>,
    depth: usize,
) {
    let view_box = view_box.copied().unwrap_or(ViewBox {
        min_x: 0.0,
        min_y: 0.0,
        width: node.width,
        height: node.height,
    });
    let fill = first_solid(&node.style.fills)
        .map(|(c, o)| Color { a: c.a * o, ..c }.to_css())
        .unwrap_or_else(|| "none".to_string());
    let mut svg_attrs = format!(
        r#"{attrs} width="{}" height="{}" viewBox="{} {} {} {}" fill="{}""#,
        num(node.width),
        num(node.height),
        num(view_box.min_x),
        num(view_box.min_y),
        num(view_box.width),
        num(view_box.height),
        escape_attr(&fill)
    );
    if let Some(stroke) = node.style.strokes.first() {
        let _ = write!(
            svg_attrs,
            r#" stroke="{}" stroke-width="{}""#,
            escape_attr(&stroke.color.to_css()),
            num(stroke.weight)
        );
    }
    let _ = writeln!(out, r#"<svg {svg_attrs} style="{}">"#, escape_attr(&decls.render()));
    for path in paths {
        indent(out, depth + 1);
        let rule = match path.winding_rule {
            WindingRule::Nonzero => "nonzero",
            WindingRule::Evenodd => "evenodd",
        };
        let _ = writeln!(
            out,
            r#"<path d="{}" fill-rule="{rule}"/>"#,
            escape_attr(&path.data)
        );
    }
    indent(out, depth);
    out.push_str("</svg>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;

    fn tree_with(child: DesignNode, layout: LayoutProperties) -> DesignTree {
        let mut tree = DesignTree::new(
            DesignNode::new(
                NodeId::intern("mk_root"),
                NodeKind::Frame {
                    layout,
                    clips_content: true,
                },
            )
            .with_bounds(0.0, 0.0, 390.0, 844.0),
        );
        tree.add_child(tree.root, child).unwrap();
        tree
    }

    #[test]
    fn absolute_children_offset_by_padding() {
        let mut rect = DesignNode::new(NodeId::intern("mk_rect"), NodeKind::Rectangle)
            .with_bounds(10.0, 20.0, 50.0, 50.0);
        rect.style.fills.push(Fill::solid(Color::rgba(1.0, 0.0, 0.0, 1.0)));
        let layout = LayoutProperties {
            padding: Padding {
                top: 4.0,
                right: 0.0,
                bottom: 0.0,
                left: 8.0,
            },
            ..LayoutProperties::default()
        };
        let html = render_html(&tree_with(rect, layout));
        assert!(html.contains("position:absolute;left:18px;top:24px"));
        assert!(html.contains("background-color:#ff0000"));
        assert!(html.contains(r#"data-node-id="mk_rect""#));
        assert!(html.contains("overflow:hidden"));
    }

    #[test]
    fn auto_layout_becomes_flex() {
        let rect = DesignNode::new(NodeId::intern("mk_flow"), NodeKind::Rectangle)
            .with_bounds(0.0, 0.0, 50.0, 50.0);
        let layout = LayoutProperties {
            mode: LayoutMode::Horizontal,
            primary_align: PrimaryAxisAlign::SpaceBetween,
            counter_align: CounterAxisAlign::Center,
            item_spacing: 12.0,
            ..LayoutProperties::default()
        };
        let html = render_html(&tree_with(rect, layout));
        assert!(html.contains(
            "display:flex;flex-direction:row;justify-content:space-between;align-items:center;gap:12px"
        ));
        assert!(html.contains("position:relative;flex-shrink:0"));
    }

    #[test]
    fn text_is_escaped() {
        let text = DesignNode::new(
            NodeId::intern("mk_text"),
            NodeKind::Text {
                characters: "Terms & <Conditions>".into(),
                text_style: TextStyle::default(),
            },
        )
        .with_bounds(0.0, 0.0, 200.0, 20.0);
        let html = render_html(&tree_with(text, LayoutProperties::default()));
        assert!(html.contains(">Terms &amp; &lt;Conditions&gt;</p>"));
        assert!(html.contains("font-family:'Inter';font-weight:400;font-size:16px"));
    }

    #[test]
    fn mixed_radii_use_four_values() {
        let mut rect = DesignNode::new(NodeId::intern("mk_radius"), NodeKind::Rectangle)
            .with_bounds(0.0, 0.0, 50.0, 50.0);
        rect.style.corner_radius = CornerRadius {
            top_left: 8.0,
            top_right: 8.0,
            bottom_right: 0.0,
            bottom_left: 0.0,
        };
        let html = render_html(&tree_with(rect, LayoutProperties::default()));
        assert!(html.contains("border-radius:8px 8px 0px 0px"));
    }

    #[test]
    fn num_trims_noise() {
        assert_eq!(num(12.0), "12");
        assert_eq!(num(0.3333), "0.33");
        assert_eq!(num(-1.5), "-1.5");
    }
}
