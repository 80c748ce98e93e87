//! Structured exporter: `DesignTree` → plugin JSON.
//!
//! Every container kind collapses to FRAME so auto-layout, clipping and
//! corner radii stay editable after import. Output is a pure function of the
//! tree: same tree, same bytes.

use crate::model::*;
use crate::plugin::*;
use petgraph::graph::NodeIndex;

/// Host font style name for a numeric weight.
pub fn weight_style(weight: u16) -> &'static str {
    match weight {
        700..=u16::MAX => "Bold",
        600..=699 => "Semi Bold",
        500..=599 => "Medium",
        _ => "Regular",
    }
}

/// Export a tree as a plugin document named `name`.
#[must_use]
pub fn export_document(tree: &DesignTree, name: &str) -> PluginDocument {
    let root = tree.root_node();
    let mut root_node = export_node(tree, tree.root, (0.0, 0.0));
    // The root is positioned by the importer.
    root_node.x = 0.0;
    root_node.y = 0.0;
    PluginDocument {
        kind: EXPORT_TAG.to_string(),
        name: name.to_string(),
        width: finite_or(root.width, 0.0),
        height: finite_or(root.height, 0.0),
        nodes: vec![root_node],
    }
}

/// Export straight to pretty-printed JSON.
pub fn export_json(tree: &DesignTree, name: &str) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&export_document(tree, name))
}

fn finite_or(v: f32, default: f32) -> f32 {
    if v.is_finite() { v } else { default }
}

/// `parent_origin` is the parent's content-box offset, which the host does not
/// model: child coordinates there are relative to the outer frame corner.
fn export_node(tree: &DesignTree, idx: NodeIndex, parent_origin: (f32, f32)) -> PluginNode {
    let node = &tree[idx];
    let node_type = match &node.kind {
        NodeKind::Frame { .. }
        | NodeKind::Group { .. }
        | NodeKind::Button { .. }
        | NodeKind::Input { .. } => PluginNodeType::Frame,
        NodeKind::Text { .. } | NodeKind::Icon { glyph: Some(_), .. } => PluginNodeType::Text,
        NodeKind::Icon { .. } | NodeKind::Vector { .. } => PluginNodeType::Vector,
        NodeKind::Rectangle | NodeKind::Image { .. } => PluginNodeType::Rectangle,
    };

    let mut out = PluginNode::new(node_type, node.id.as_str(), &node.name);
    out.x = round2(finite_or(node.x, 0.0) + parent_origin.0);
    out.y = round2(finite_or(node.y, 0.0) + parent_origin.1);
    out.width = finite_or(node.width, 0.0).max(0.0);
    out.height = finite_or(node.height, 0.0).max(0.0);
    out.rotation = finite_or(node.rotation, 0.0);
    out.opacity = if node.opacity.is_finite() {
        node.opacity.clamp(0.0, 1.0)
    } else {
        log::warn!("node `{}`: invalid opacity, using 1", node.id);
        1.0
    };

    apply_paint(node, &mut out);
    match &node.kind {
        NodeKind::Text {
            characters,
            text_style,
        } => apply_text(&mut out, characters, text_style),
        NodeKind::Icon {
            glyph: Some(glyph),
            text_style,
            ..
        } => apply_text(&mut out, glyph, &text_style.clone().unwrap_or_default()),
        NodeKind::Icon { paths, .. } | NodeKind::Vector { paths, .. } => {
            out.vector_paths = paths
                .iter()
                .filter(|p| !p.data.trim().is_empty())
                .map(|p| PluginVectorPath {
                    winding_rule: p.winding_rule,
                    data: p.data.clone(),
                })
                .collect();
        }
        NodeKind::Frame { layout, clips_content } => {
            out.clips_content = Some(*clips_content);
            apply_layout(&mut out, layout);
        }
        NodeKind::Group { layout } | NodeKind::Button { layout } | NodeKind::Input { layout, .. } => {
            out.clips_content = Some(false);
            apply_layout(&mut out, layout);
        }
        NodeKind::Rectangle | NodeKind::Image { .. } => {}
    }

    if node.kind.is_container() {
        let origin = tree.content_origin(idx);
        out.children = tree
            .children(idx)
            .into_iter()
            .map(|child| export_node(tree, child, origin))
            .collect();
    }
    out
}

fn rgb(color: &Color) -> Rgb {
    Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

/// A solid paint, or `None` (with a warning) when the color is unusable.
fn solid_paint(node: &DesignNode, color: &Color, opacity: f32) -> Option<PluginPaint> {
    if !color.is_valid() || !opacity.is_finite() {
        log::warn!("node `{}`: dropping invalid color {color:?}", node.id);
        return None;
    }
    Some(PluginPaint::Solid {
        color: rgb(color),
        opacity: round2(color.a * opacity.clamp(0.0, 1.0)),
    })
}

fn apply_paint(node: &DesignNode, out: &mut PluginNode) {
    // First SOLID fill only; image fills pass through in order.
    let mut solid_taken = false;
    for fill in &node.style.fills {
        match fill {
            Fill::Solid { color, opacity } => {
                if solid_taken {
                    continue;
                }
                solid_taken = true;
                out.fills.extend(solid_paint(node, color, *opacity));
            }
            Fill::Image {
                image,
                scale_mode,
                opacity,
            } => {
                let (image_base64, image_hash, image_url) = match image {
                    ImageRef::Inline { base64, .. } => (Some(base64.clone()), None, None),
                    ImageRef::Hash(hash) => (None, Some(hash.clone()), None),
                    ImageRef::Url(url) => (None, None, Some(url.clone())),
                };
                out.fills.push(PluginPaint::Image {
                    image_base64,
                    image_hash,
                    image_url,
                    scale_mode: *scale_mode,
                    opacity: finite_or(*opacity, 1.0).clamp(0.0, 1.0),
                });
            }
        }
    }

    if let Some(stroke) = node.style.strokes.first() {
        let weight = finite_or(stroke.weight, 0.0);
        if weight > 0.0
            && let Some(paint) = solid_paint(node, &stroke.color, 1.0)
        {
            out.strokes.push(paint);
            out.stroke_weight = Some(weight);
        }
    }

    out.effects = node
        .style
        .shadows
        .iter()
        .filter_map(|s| {
            let color = s.forwarded_color()?;
            if !color.is_valid() {
                log::warn!("node `{}`: dropping shadow with invalid color", node.id);
                return None;
            }
            Some(PluginEffect {
                kind: EffectType::DropShadow,
                color: Rgba {
                    r: color.r,
                    g: color.g,
                    b: color.b,
                    a: color.a,
                },
                offset: Vec2 {
                    x: finite_or(s.offset_x, 0.0),
                    y: finite_or(s.offset_y, 0.0),
                },
                radius: finite_or(s.blur, 0.0).max(0.0),
                spread: finite_or(s.spread, 0.0),
                visible: true,
            })
        })
        .collect();

    let radius = node.style.corner_radius;
    match radius.as_uniform() {
        Some(r) if r > 0.0 && r.is_finite() => out.corner_radius = Some(r),
        Some(_) => {}
        None => {
            out.top_left_radius = Some(finite_or(radius.top_left, 0.0));
            out.top_right_radius = Some(finite_or(radius.top_right, 0.0));
            out.bottom_right_radius = Some(finite_or(radius.bottom_right, 0.0));
            out.bottom_left_radius = Some(finite_or(radius.bottom_left, 0.0));
        }
    }
}

fn apply_text(out: &mut PluginNode, characters: &str, style: &TextStyle) {
    out.characters = Some(characters.to_string());
    out.font_name = Some(FontName {
        family: style.font_family.clone(),
        style: weight_style(style.font_weight).to_string(),
    });
    out.font_size = Some(if style.font_size.is_finite() && style.font_size > 0.0 {
        style.font_size
    } else {
        TextStyle::default().font_size
    });
    out.text_align_horizontal = Some(style.align_horizontal);
    out.text_align_vertical = Some(style.align_vertical);
    out.letter_spacing = style.letter_spacing.filter(|v| v.is_finite());
    out.line_height = style.line_height.filter(|v| v.is_finite() && *v > 0.0);
    out.text_auto_resize = style.auto_resize;
}

fn apply_layout(out: &mut PluginNode, layout: &LayoutProperties) {
    out.layout_mode = Some(layout.mode);
    if layout.is_auto_layout() {
        out.primary_axis_align_items = Some(layout.primary_align);
        out.counter_axis_align_items = Some(layout.counter_align);
        out.item_spacing = Some(finite_or(layout.item_spacing, 0.0));
    }
    out.padding_top = Some(finite_or(layout.padding.top, 0.0));
    out.padding_right = Some(finite_or(layout.padding.right, 0.0));
    out.padding_bottom = Some(finite_or(layout.padding.bottom, 0.0));
    out.padding_left = Some(finite_or(layout.padding.left, 0.0));
    out.layout_positioning = layout.positioning;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;
    use pretty_assertions::assert_eq;

    fn sample_tree() -> DesignTree {
        let mut tree = DesignTree::new(
            DesignNode::new(
                NodeId::intern("exp_root"),
                NodeKind::Frame {
                    layout: LayoutProperties {
                        mode: LayoutMode::Vertical,
                        item_spacing: 8.0,
                        padding: Padding {
                            top: 16.0,
                            right: 16.0,
                            bottom: 16.0,
                            left: 24.0,
                        },
                        ..LayoutProperties::default()
                    },
                    clips_content: true,
                },
            )
            .with_bounds(0.0, 0.0, 390.0, 844.0),
        );
        let mut button = DesignNode::new(
            NodeId::intern("exp_button"),
            NodeKind::Button {
                layout: LayoutProperties::default(),
            },
        )
        .with_bounds(0.0, 0.0, 120.0, 44.0);
        button.style.fills.push(Fill::solid(Color::from_rgb8(79, 70, 229, 1.0)));
        button.style.fills.push(Fill::solid(Color::WHITE));
        button.style.corner_radius = CornerRadius::uniform(8.0);
        let button = tree.add_child(tree.root, button).unwrap();

        let label = DesignNode::new(
            NodeId::intern("exp_label"),
            NodeKind::Text {
                characters: "Go".into(),
                text_style: TextStyle {
                    font_weight: 650,
                    ..TextStyle::default()
                },
            },
        )
        .with_bounds(0.0, 0.0, 120.0, 44.0);
        tree.add_child(button, label).unwrap();
        tree
    }

    #[test]
    fn weight_mapping() {
        assert_eq!(weight_style(650), "Semi Bold");
        assert_eq!(weight_style(300), "Regular");
        assert_eq!(weight_style(700), "Bold");
        assert_eq!(weight_style(900), "Bold");
        assert_eq!(weight_style(500), "Medium");
        assert_eq!(weight_style(499), "Regular");
    }

    #[test]
    fn containers_collapse_to_frames() {
        let doc = export_document(&sample_tree(), "Login");
        assert_eq!(doc.kind, EXPORT_TAG);
        assert_eq!((doc.width, doc.height), (390.0, 844.0));
        let root = &doc.nodes[0];
        assert_eq!(root.node_type, PluginNodeType::Frame);
        assert_eq!(root.layout_mode, Some(LayoutMode::Vertical));
        assert_eq!(root.item_spacing, Some(8.0));
        assert_eq!(root.padding_left, Some(24.0));
        assert_eq!(root.layout_positioning, None);

        let button = &root.children[0];
        assert_eq!(button.node_type, PluginNodeType::Frame);
        // Child coordinates include the parent's padding.
        assert_eq!((button.x, button.y), (24.0, 16.0));
        assert_eq!(button.corner_radius, Some(8.0));
        assert_eq!(button.top_left_radius, None);

        let label = &button.children[0];
        assert_eq!(label.node_type, PluginNodeType::Text);
        assert_eq!(label.font_name.as_ref().unwrap().style, "Semi Bold");
    }

    #[test]
    fn only_first_solid_fill_is_kept() {
        let doc = export_document(&sample_tree(), "Login");
        let button = &doc.nodes[0].children[0];
        assert_eq!(button.fills.len(), 1);
        match &button.fills[0] {
            PluginPaint::Solid { color, opacity } => {
                assert!((color.r - 79.0 / 255.0).abs() < 1e-6);
                assert_eq!(*opacity, 1.0);
            }
            other => panic!("expected solid, got {other:?}"),
        }
    }

    #[test]
    fn mixed_corners_emit_individually() {
        let mut tree = sample_tree();
        let idx = tree.index_of(NodeId::intern("exp_button")).unwrap();
        tree.graph[idx].style.corner_radius = CornerRadius {
            top_left: 8.0,
            top_right: 8.0,
            bottom_right: 0.0,
            bottom_left: 0.0,
        };
        let doc = export_document(&tree, "Login");
        let button = &doc.nodes[0].children[0];
        assert_eq!(button.corner_radius, None);
        assert_eq!(button.top_left_radius, Some(8.0));
        assert_eq!(button.bottom_left_radius, Some(0.0));
    }

    #[test]
    fn invalid_color_still_emits_node() {
        let mut tree = sample_tree();
        let idx = tree.index_of(NodeId::intern("exp_button")).unwrap();
        tree.graph[idx].style.fills = [Fill::solid(Color::rgba(f32::NAN, 0.0, 0.0, 1.0))]
            .into_iter()
            .collect();
        tree.graph[idx].opacity = f32::INFINITY;
        let doc = export_document(&tree, "Login");
        let button = &doc.nodes[0].children[0];
        assert!(button.fills.is_empty());
        assert_eq!(button.opacity, 1.0);
        assert_eq!(button.children.len(), 1);
    }

    #[test]
    fn export_is_byte_identical() {
        let tree = sample_tree();
        assert_eq!(export_json(&tree, "Login").unwrap(), export_json(&tree, "Login").unwrap());
    }

    #[test]
    fn image_fill_passes_through() {
        let mut tree = sample_tree();
        let mut image = DesignNode::new(NodeId::intern("exp_img"), NodeKind::Image { alt: None })
            .with_bounds(0.0, 60.0, 100.0, 100.0);
        image.style.fills.push(Fill::Image {
            image: ImageRef::from_src("data:image/png;base64,AAAA"),
            scale_mode: ScaleMode::Fill,
            opacity: 1.0,
        });
        tree.add_child(tree.root, image).unwrap();
        let doc = export_document(&tree, "Login");
        let img = &doc.nodes[0].children[1];
        assert_eq!(img.node_type, PluginNodeType::Rectangle);
        assert_eq!(
            img.fills[0],
            PluginPaint::Image {
                image_base64: Some("AAAA".into()),
                image_hash: None,
                image_url: None,
                scale_mode: ScaleMode::Fill,
                opacity: 1.0,
            }
        );
    }
}
