//! Lint diagnostics for design trees.
//!
//! Reports structural issues without modifying the tree.
//! Results feed the CLI `lint` command.

use crate::config::ParserConfig;
use crate::id::NodeId;
use crate::model::*;

// ─── Diagnostic types ────────────────────────────────────────────────────

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// Should be fixed, likely a mistake.
    Warning,
    /// Informational.
    Info,
}

/// A single lint diagnostic for a design node.
#[derive(Debug, Clone)]
pub struct LintDiagnostic {
    /// The node this diagnostic refers to.
    pub node_id: NodeId,
    /// Human-readable message.
    pub message: String,
    /// Severity level.
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "containment", "invalid-color").
    pub rule: &'static str,
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run all lint rules over the tree and return diagnostics.
#[must_use]
pub fn lint_tree(tree: &DesignTree, config: &ParserConfig) -> Vec<LintDiagnostic> {
    let mut diags = Vec::new();
    lint_containment(tree, config.containment_epsilon, &mut diags);
    lint_opacity(tree, &mut diags);
    lint_colors(tree, &mut diags);
    lint_empty_containers(tree, &mut diags);
    lint_absolute_in_auto_layout(tree, &mut diags);
    diags
}

// ─── Rules ────────────────────────────────────────────────────────────────

/// Unflagged children must sit inside their parent's content box.
fn lint_containment(tree: &DesignTree, epsilon: f32, diags: &mut Vec<LintDiagnostic>) {
    for idx in tree.descendants() {
        let Some(parent) = tree.parent(idx) else {
            continue;
        };
        let node = &tree[idx];
        if node.overflows {
            continue;
        }
        let p = &tree[parent];
        let (ox, oy) = tree.content_origin(parent);
        let (pr, pb) = p
            .kind
            .layout()
            .map(|l| (l.padding.right, l.padding.bottom))
            .unwrap_or((0.0, 0.0));
        let border = p.style.border_width();
        let content_w = p.width - ox - pr - border;
        let content_h = p.height - oy - pb - border;

        let outside = node.x < -epsilon
            || node.y < -epsilon
            || node.x + node.width > content_w + epsilon
            || node.y + node.height > content_h + epsilon;
        if outside {
            diags.push(LintDiagnostic {
                node_id: node.id,
                message: format!(
                    "`{}` ({}, {}, {}×{}) leaves the {}×{} content box of `{}` without being flagged as overflowing.",
                    node.id, node.x, node.y, node.width, node.height, content_w, content_h, p.id
                ),
                severity: LintSeverity::Warning,
                rule: "containment",
            });
        }
    }
}

fn lint_opacity(tree: &DesignTree, diags: &mut Vec<LintDiagnostic>) {
    for idx in tree.graph.node_indices() {
        let node = &tree[idx];
        if !(0.0..=1.0).contains(&node.opacity) {
            diags.push(LintDiagnostic {
                node_id: node.id,
                message: format!("`{}` has opacity {} outside 0..1.", node.id, node.opacity),
                severity: LintSeverity::Warning,
                rule: "opacity-range",
            });
        }
    }
}

fn lint_colors(tree: &DesignTree, diags: &mut Vec<LintDiagnostic>) {
    for idx in tree.graph.node_indices() {
        let node = &tree[idx];
        let fill_colors = node.style.fills.iter().filter_map(|f| match f {
            Fill::Solid { color, .. } => Some(*color),
            Fill::Image { .. } => None,
        });
        let stroke_colors = node.style.strokes.iter().map(|s| s.color);
        let shadow_colors = node.style.shadows.iter().filter_map(|s| s.color);
        if fill_colors
            .chain(stroke_colors)
            .chain(shadow_colors)
            .any(|c| !c.is_valid())
        {
            diags.push(LintDiagnostic {
                node_id: node.id,
                message: format!(
                    "`{}` has a color outside 0..1; exporters will drop it.",
                    node.id
                ),
                severity: LintSeverity::Warning,
                rule: "invalid-color",
            });
        }
    }
}

/// Containers with no children and no paint add nothing to the design.
fn lint_empty_containers(tree: &DesignTree, diags: &mut Vec<LintDiagnostic>) {
    for idx in tree.graph.node_indices() {
        let node = &tree[idx];
        if idx == tree.root || !node.kind.is_container() {
            continue;
        }
        if tree.children(idx).is_empty() && !node.style.has_paint() {
            diags.push(LintDiagnostic {
                node_id: node.id,
                message: format!("Empty {} `{}` has no children and no paint.", node.kind.label(), node.id),
                severity: LintSeverity::Info,
                rule: "empty-container",
            });
        }
    }
}

/// Absolute children of auto-layout frames are easy to lose track of.
fn lint_absolute_in_auto_layout(tree: &DesignTree, diags: &mut Vec<LintDiagnostic>) {
    for idx in tree.graph.node_indices() {
        let Some(layout) = tree[idx].kind.layout() else {
            continue;
        };
        if !layout.is_auto_layout() {
            continue;
        }
        for child in tree.children(idx) {
            let node = &tree[child];
            if node.kind.layout().is_some_and(LayoutProperties::is_absolute) {
                diags.push(LintDiagnostic {
                    node_id: node.id,
                    message: format!(
                        "`{}` ignores the auto-layout of `{}`.",
                        node.id, tree[idx].id
                    ),
                    severity: LintSeverity::Info,
                    rule: "absolute-in-auto-layout",
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(id: &str) -> DesignTree {
        DesignTree::new(
            DesignNode::new(
                NodeId::intern(id),
                NodeKind::Frame {
                    layout: LayoutProperties::default(),
                    clips_content: true,
                },
            )
            .with_bounds(0.0, 0.0, 100.0, 100.0),
        )
    }

    fn rules(diags: &[LintDiagnostic]) -> Vec<&'static str> {
        diags.iter().map(|d| d.rule).collect()
    }

    #[test]
    fn flagged_overflow_is_exempt() {
        let mut tree = root("lint_root_a");
        tree.add_child(
            tree.root,
            DesignNode::new(NodeId::intern("lint_spill"), NodeKind::Rectangle)
                .with_bounds(80.0, 0.0, 50.0, 10.0),
        )
        .unwrap();
        let mut flagged = DesignNode::new(NodeId::intern("lint_flagged"), NodeKind::Rectangle)
            .with_bounds(80.0, 20.0, 50.0, 10.0);
        flagged.overflows = true;
        tree.add_child(tree.root, flagged).unwrap();

        let diags = lint_tree(&tree, &ParserConfig::default());
        assert_eq!(rules(&diags), vec!["containment"]);
        assert_eq!(diags[0].node_id, NodeId::intern("lint_spill"));
    }

    #[test]
    fn opacity_and_color_rules() {
        let mut tree = root("lint_root_b");
        let mut node = DesignNode::new(NodeId::intern("lint_bad"), NodeKind::Rectangle)
            .with_bounds(0.0, 0.0, 10.0, 10.0);
        node.opacity = 1.5;
        node.style.fills.push(Fill::solid(Color::rgba(2.0, 0.0, 0.0, 1.0)));
        tree.add_child(tree.root, node).unwrap();
        let diags = lint_tree(&tree, &ParserConfig::default());
        assert_eq!(rules(&diags), vec!["opacity-range", "invalid-color"]);
    }

    #[test]
    fn empty_and_absolute_rules() {
        let mut tree = root("lint_root_c");
        if let NodeKind::Frame { layout, .. } = &mut tree.graph[tree.root].kind {
            layout.mode = LayoutMode::Horizontal;
        }
        tree.add_child(
            tree.root,
            DesignNode::new(
                NodeId::intern("lint_floating"),
                NodeKind::Group {
                    layout: LayoutProperties {
                        positioning: Some(LayoutPositioning::Absolute),
                        ..LayoutProperties::default()
                    },
                },
            )
            .with_bounds(0.0, 0.0, 10.0, 10.0),
        )
        .unwrap();
        let diags = lint_tree(&tree, &ParserConfig::default());
        assert_eq!(rules(&diags), vec!["empty-container", "absolute-in-auto-layout"]);
    }
}
