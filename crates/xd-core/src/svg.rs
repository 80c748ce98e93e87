//! Vector exporter: rendered DOM → flat SVG document.
//!
//! Walks the DOM snapshot directly rather than the design tree, trading
//! editability for fidelity. Backgrounds become `<rect>`, borders stroke-only
//! `<rect>`, leaf text `<text>` on an approximate baseline, `<img>` `<image>`.
//! Pasting the result into a design tool yields plain groups and shapes, never
//! frames or auto-layout; that is what the structured exporter is for.

use crate::config::ParserConfig;
use crate::dom::DomNode;
use crate::markup::{escape_attr, escape_text, num};
use crate::model::{TextAlignHorizontal, WindingRule};
use crate::parser::{
    collect_paths, color_property, extract_radius, extract_stroke, extract_text_style,
    parse_view_box,
};
use crate::css::parse_url;
use std::fmt::Write;

/// Baseline offset as a fraction of the font size.
const BASELINE_FACTOR: f32 = 0.8;

/// Export with the default parser configuration.
#[must_use]
pub fn export_svg(root: &DomNode, stylesheet: &str) -> String {
    export_svg_with(root, stylesheet, &ParserConfig::default())
}

/// Export `root` as a standalone SVG sized to its bounding box.
/// `stylesheet` is embedded verbatim in `<defs><style>`.
#[must_use]
pub fn export_svg_with(root: &DomNode, stylesheet: &str, config: &ParserConfig) -> String {
    let (w, h) = (root.rect.width.max(0.0), root.rect.height.max(0.0));
    let mut out = String::with_capacity(4096);
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        num(w),
        num(h),
        num(w),
        num(h)
    );
    out.push_str("  <defs><style><![CDATA[\n");
    // `]]>` would close the section early.
    out.push_str(&stylesheet.replace("]]>", "]]]]><![CDATA[>"));
    if !stylesheet.ends_with('\n') && !stylesheet.is_empty() {
        out.push('\n');
    }
    out.push_str("  ]]></style></defs>\n");

    let walker = SvgWalker {
        config,
        origin: (root.rect.x, root.rect.y),
    };
    walker.element(&mut out, root, 1);

    out.push_str("</svg>\n");
    out
}

struct SvgWalker<'c> {
    config: &'c ParserConfig,
    origin: (f32, f32),
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

impl SvgWalker<'_> {
    fn element(&self, out: &mut String, el: &DomNode, depth: usize) {
        if self.config.ignored_tags.iter().any(|t| el.tag_is(t)) || !el.is_rendered() {
            return;
        }
        if !el.rect.is_well_formed() {
            log::warn!("svg export: skipping <{}> with malformed rect", el.tag);
            return;
        }

        let x = el.rect.x - self.origin.0;
        let y = el.rect.y - self.origin.1;
        let (w, h) = (el.rect.width, el.rect.height);

        let opacity = el
            .style
            .get("opacity")
            .and_then(|o| o.parse::<f32>().ok())
            .filter(|o| o.is_finite() && *o < 1.0);
        let depth = match opacity {
            Some(o) => {
                indent(out, depth);
                let _ = writeln!(out, r#"<g opacity="{}">"#, num(o.max(0.0)));
                depth + 1
            }
            None => depth,
        };

        let rx = extract_radius(el).top_left;
        let rx_attr = if rx > 0.0 {
            format!(r#" rx="{}""#, num(rx))
        } else {
            String::new()
        };

        if let Some(bg) = color_property(el, "background-color") {
            indent(out, depth);
            let _ = writeln!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}"{rx_attr} fill="{}"/>"#,
                num(x),
                num(y),
                num(w),
                num(h),
                escape_attr(&bg.to_css())
            );
        }
        if let Some(url) = el.style.get("background-image").and_then(parse_url) {
            self.image(out, &url, (x, y, w, h), "xMidYMid slice", depth);
        }
        if let Some(stroke) = extract_stroke(el) {
            // Inside alignment: inset by half the stroke.
            let half = stroke.weight / 2.0;
            indent(out, depth);
            let _ = writeln!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}"{rx_attr} fill="none" stroke="{}" stroke-width="{}"/>"#,
                num(x + half),
                num(y + half),
                num((w - stroke.weight).max(0.0)),
                num((h - stroke.weight).max(0.0)),
                escape_attr(&stroke.color.to_css()),
                num(stroke.weight)
            );
        }

        if el.tag_is("img") {
            if let Some(src) = el.attr("src") {
                let fit = match el.style.get("object-fit") {
                    Some("contain" | "scale-down") => "xMidYMid meet",
                    Some("fill") => "none",
                    _ => "xMidYMid slice",
                };
                self.image(out, src, (x, y, w, h), fit, depth);
            }
        } else if el.tag_is("svg") {
            self.inline_svg(out, el, (x, y, w, h), depth);
        } else if el.children.is_empty() {
            if let Some(text) = el.own_text() {
                self.text(out, el, &text, (x, y, w), depth);
            }
        } else {
            for child in &el.children {
                self.element(out, child, depth);
            }
        }

        if opacity.is_some() {
            indent(out, depth - 1);
            out.push_str("</g>\n");
        }
    }

    fn image(&self, out: &mut String, href: &str, (x, y, w, h): (f32, f32, f32, f32), fit: &str, depth: usize) {
        indent(out, depth);
        let _ = writeln!(
            out,
            r#"<image href="{}" x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="{fit}"/>"#,
            escape_attr(href),
            num(x),
            num(y),
            num(w),
            num(h)
        );
    }

    fn text(&self, out: &mut String, el: &DomNode, text: &str, (x, y, w): (f32, f32, f32), depth: usize) {
        let style = extract_text_style(el);
        let (tx, anchor) = match style.align_horizontal {
            TextAlignHorizontal::Center => (x + w / 2.0, Some("middle")),
            TextAlignHorizontal::Right => (x + w, Some("end")),
            TextAlignHorizontal::Left | TextAlignHorizontal::Justified => (x, None),
        };
        let fill = color_property(el, "color")
            .map(|c| c.to_css())
            .unwrap_or_else(|| "#000000".to_string());
        indent(out, depth);
        let _ = write!(
            out,
            r#"<text x="{}" y="{}" font-family="{}" font-size="{}" font-weight="{}" fill="{}""#,
            num(tx),
            num(y + style.font_size * BASELINE_FACTOR),
            escape_attr(&style.font_family),
            num(style.font_size),
            style.font_weight,
            escape_attr(&fill)
        );
        if let Some(anchor) = anchor {
            let _ = write!(out, r#" text-anchor="{anchor}""#);
        }
        if let Some(ls) = style.letter_spacing {
            let _ = write!(out, r#" letter-spacing="{}""#, num(ls));
        }
        let _ = writeln!(out, ">{}</text>", escape_text(text));
    }

    fn inline_svg(&self, out: &mut String, el: &DomNode, (x, y, w, h): (f32, f32, f32, f32), depth: usize) {
        let fill = match el.style.get("fill").or_else(|| el.attr("fill")) {
            Some(v) if v.eq_ignore_ascii_case("none") => "none".to_string(),
            Some(v) if !v.eq_ignore_ascii_case("currentcolor") => v.to_string(),
            _ => color_property(el, "color")
                .map(|c| c.to_css())
                .unwrap_or_else(|| "#000000".to_string()),
        };
        indent(out, depth);
        let _ = write!(
            out,
            r#"<svg x="{}" y="{}" width="{}" height="{}" fill="{}""#,
            num(x),
            num(y),
            num(w),
            num(h),
            escape_attr(&fill)
        );
        if let Some(vb) = el.attr("viewBox").and_then(parse_view_box) {
            let _ = write!(
                out,
                r#" viewBox="{} {} {} {}""#,
                num(vb.min_x),
                num(vb.min_y),
                num(vb.width),
                num(vb.height)
            );
        }
        if let Some(stroke) = el.style.get("stroke").or_else(|| el.attr("stroke")) {
            let _ = write!(out, r#" stroke="{}""#, escape_attr(stroke));
        }
        out.push_str(">\n");
        for path in collect_paths(el) {
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Rect;

    fn screen() -> DomNode {
        DomNode::new("div", Rect::new(100.0, 50.0, 390.0, 844.0))
            .with_style("background-color", "rgb(255, 255, 255)")
            .with_child(
                DomNode::new("div", Rect::new(120.0, 70.0, 200.0, 100.0))
                    .with_style("background-color", "rgb(255, 0, 0)")
                    .with_style("border-top-left-radius", "8px")
                    .with_style("border-top-width", "2px")
                    .with_style("border-top-style", "solid")
                    .with_style("border-top-color", "rgb(0, 0, 0)"),
            )
            .with_child(
                DomNode::new("h1", Rect::new(120.0, 200.0, 200.0, 30.0))
                    .with_text("Welcome")
                    .with_style("font-size", "20px")
                    .with_style("font-weight", "700")
                    .with_style("color", "rgb(17, 24, 39)"),
            )
            .with_child(
                DomNode::new("img", Rect::new(100.0, 300.0, 50.0, 50.0))
                    .with_attr("src", "https://cdn.test/a.png"),
            )
    }

    #[test]
    fn document_shell() {
        let svg = export_svg(&screen(), ".a { color: red; }");
        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg "));
        assert!(svg.contains(r#"width="390" height="844" viewBox="0 0 390 844""#));
        assert!(svg.contains("<defs><style><![CDATA[\n.a { color: red; }\n"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn coordinates_are_root_relative() {
        let svg = export_svg(&screen(), "");
        assert!(svg.contains(r##"<rect x="0" y="0" width="390" height="844" fill="#ffffff"/>"##));
        assert!(svg.contains(r##"<rect x="20" y="20" width="200" height="100" rx="8" fill="#ff0000"/>"##));
        assert!(svg.contains(
            r##"<rect x="21" y="21" width="198" height="98" rx="8" fill="none" stroke="#000000" stroke-width="2"/>"##
        ));
        assert!(svg.contains(r#"<image href="https://cdn.test/a.png" x="0" y="250" width="50" height="50""#));
    }

    #[test]
    fn text_sits_on_approximate_baseline() {
        let svg = export_svg(&screen(), "");
        // 150 + 20 * 0.8
        assert!(svg.contains(r##"<text x="20" y="166" font-family="Inter" font-size="20" font-weight="700" fill="#111827">Welcome</text>"##));
    }

    #[test]
    fn hidden_elements_are_skipped() {
        let root = DomNode::new("div", Rect::new(0.0, 0.0, 100.0, 100.0)).with_child(
            DomNode::new("div", Rect::new(0.0, 0.0, 10.0, 10.0))
                .with_style("display", "none")
                .with_style("background-color", "rgb(255, 0, 0)"),
        );
        assert!(!export_svg(&root, "").contains("<rect"));
    }

    #[test]
    fn translucent_subtrees_are_grouped() {
        let root = DomNode::new("div", Rect::new(0.0, 0.0, 100.0, 100.0)).with_child(
            DomNode::new("div", Rect::new(0.0, 0.0, 10.0, 10.0))
                .with_style("opacity", "0.5")
                .with_style("background-color", "rgb(255, 0, 0)"),
        );
        let svg = export_svg(&root, "");
        assert!(svg.contains("<g opacity=\"0.5\">"));
        assert!(svg.contains("</g>"));
    }
}
