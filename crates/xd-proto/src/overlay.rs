//! SVG overlay for the canvas: committed connectors, the live preview, and
//! per-screen hotspots over discovered elements.

use crate::connector::{ConnectorPath, ScreenPositions, num, route_link};
use crate::discovery::InteractiveElement;
use crate::links::{LinkGraph, ScreenPosition};
use std::collections::HashSet;
use std::fmt::Write;
use xd_core::config::ConnectorConfig;

const LINK_COLOR: &str = "#6366f1";
const PREVIEW_COLOR: &str = "#a5b4fc";

/// One `<svg>` covering the canvas, with a group per committed link and the
/// preview (if any) on top. Links whose screens are not placed are skipped.
pub fn render_overlay(
    links: &LinkGraph,
    screens: &ScreenPositions,
    preview: Option<&ConnectorPath>,
    config: &ConnectorConfig,
) -> String {
    let mut out = String::from(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" class=\"xd-connectors\" \
         style=\"position:absolute;left:0;top:0;overflow:visible;pointer-events:none\">\n",
    );
    for link in links.links() {
        let Some(path) = route_link(link, screens, config) else {
            log::trace!("link {} has an unplaced screen", link.id);
            continue;
        };
        let _ = write!(
            out,
            "  <g class=\"xd-connector\" data-link-id=\"{}\">",
            escape_attr(&link.id)
        );
        connector(&mut out, &path, config.arrow_size);
        out.push_str("</g>\n");
    }
    if let Some(path) = preview {
        out.push_str("  <g class=\"xd-connector-preview\">");
        preview_connector(&mut out, path);
        out.push_str("</g>\n");
    }
    out.push_str("</svg>\n");
    out
}

fn connector(out: &mut String, path: &ConnectorPath, arrow_size: f64) {
    let _ = write!(
        out,
        "<path d=\"{}\" fill=\"none\" stroke=\"{LINK_COLOR}\" stroke-width=\"2\"/>",
        path.to_svg_path()
    );
    let points: Vec<String> = path
        .arrowhead(arrow_size)
        .iter()
        .map(|p| format!("{},{}", num(p.x), num(p.y)))
        .collect();
    let _ = write!(out, "<polygon points=\"{}\" fill=\"{LINK_COLOR}\"/>", points.join(" "));
}

fn preview_connector(out: &mut String, path: &ConnectorPath) {
    let _ = write!(
        out,
        "<path d=\"{}\" fill=\"none\" stroke=\"{PREVIEW_COLOR}\" stroke-width=\"2\" \
         stroke-dasharray=\"6 4\">\
         <animate attributeName=\"stroke-dashoffset\" from=\"20\" to=\"0\" dur=\"0.6s\" \
         repeatCount=\"indefinite\"/></path>",
        path.to_svg_path()
    );
}

/// Hotspot rectangles for one screen. Elements that already start a link
/// are marked `linked`.
pub fn render_hotspots(
    screen_id: &str,
    screen: ScreenPosition,
    elements: &[InteractiveElement],
    links: &LinkGraph,
) -> String {
    let linked: HashSet<&str> = links
        .links_from(screen_id)
        .map(|l| l.from_element_id.as_str())
        .collect();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "<g class=\"xd-hotspots\" data-screen-id=\"{}\" transform=\"translate({} {})\">",
        escape_attr(screen_id),
        num(screen.x),
        num(screen.y)
    );
    for el in elements {
        let class = if linked.contains(el.element_id.as_str()) {
            "xd-hotspot linked"
        } else {
            "xd-hotspot"
        };
        let _ = writeln!(
            out,
            "  <rect class=\"{class}\" data-element-id=\"{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"4\"/>",
            escape_attr(&el.element_id),
            num(el.bounds.x),
            num(el.bounds.y),
            num(el.bounds.width),
            num(el.bounds.height)
        );
    }
    out.push_str("</g>\n");
    out
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::compute_preview_path;
    use crate::links::{Bounds, LinkDraft};
    use kurbo::Point;

    fn graph() -> LinkGraph {
        let mut graph = LinkGraph::new("p1");
        graph
            .upsert(LinkDraft {
                from_screen_id: "a".into(),
                from_element_id: "cta".into(),
                to_screen_id: "b".into(),
                from_element_position: None,
            })
            .unwrap();
        graph
    }

    fn screens() -> ScreenPositions {
        let mut screens = ScreenPositions::new();
        screens.set("a", Bounds::new(0.0, 0.0, 320.0, 600.0));
        screens.set("b", Bounds::new(400.0, 0.0, 320.0, 600.0));
        screens
    }

    #[test]
    fn committed_connector_is_solid_with_arrowhead() {
        let svg = render_overlay(&graph(), &screens(), None, &Default::default());
        assert!(svg.contains("<path d=\"M 320 300 C 380 300 340 300 400 300\""));
        assert!(svg.contains("<polygon points=\"400,300 390,305 390,295\""));
        assert!(!svg.contains("stroke-dasharray"));
        assert_eq!(svg.matches("class=\"xd-connector\"").count(), 1);
    }

    #[test]
    fn preview_is_dashed_and_animated() {
        let config = ConnectorConfig::default();
        let preview = compute_preview_path(Point::new(10.0, 10.0), Point::new(200.0, 10.0), &config);
        let svg = render_overlay(&LinkGraph::new("p1"), &screens(), Some(&preview), &config);
        assert!(svg.contains("stroke-dasharray=\"6 4\""));
        assert!(svg.contains("<animate attributeName=\"stroke-dashoffset\""));
        assert!(!svg.contains("<polygon"));
    }

    #[test]
    fn unplaced_screens_are_skipped() {
        let mut screens = screens();
        screens.remove("a");
        let svg = render_overlay(&graph(), &screens, None, &Default::default());
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn hotspots_mark_linked_elements() {
        let elements = vec![
            InteractiveElement {
                element_id: "cta".into(),
                tag: "button".into(),
                label: None,
                bounds: Bounds::new(20.0, 440.0, 200.0, 48.0),
            },
            InteractiveElement {
                element_id: "a@3".into(),
                tag: "a".into(),
                label: None,
                bounds: Bounds::new(20.0, 500.0, 80.0, 20.0),
            },
        ];
        let svg = render_hotspots("a", Bounds::new(0.0, 0.0, 320.0, 600.0), &elements, &graph());
        assert!(svg.contains("class=\"xd-hotspot linked\" data-element-id=\"cta\""));
        assert!(svg.contains("class=\"xd-hotspot\" data-element-id=\"a@3\""));
        assert!(svg.contains("translate(0 0)"));
    }
}
