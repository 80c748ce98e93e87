//! Connector routing between screens on the canvas.
//!
//! Every function here is pure: the same boxes produce the same path. Screen
//! placement comes in through an explicit [`ScreenPositions`] map owned by
//! the canvas host.

use crate::links::{Bounds, PrototypeLink, ScreenPosition};
use kurbo::{CubicBez, Point, Rect, Vec2};
use std::collections::BTreeMap;
use std::fmt::Write;
use xd_core::config::ConnectorConfig;

/// A box edge where a connector attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }

    /// Unit vector pointing out of the box through this side.
    pub fn outward(self) -> Vec2 {
        match self {
            Side::Left => Vec2::new(-1.0, 0.0),
            Side::Right => Vec2::new(1.0, 0.0),
            Side::Top => Vec2::new(0.0, -1.0),
            Side::Bottom => Vec2::new(0.0, 1.0),
        }
    }
}

/// The side of `rect` facing `toward`, chosen on the dominant axis of the
/// vector from the rect's center. Ties go horizontal.
pub fn facing_side(rect: Rect, toward: Point) -> Side {
    let d = toward - rect.center();
    if d.x.abs() >= d.y.abs() {
        if d.x >= 0.0 { Side::Right } else { Side::Left }
    } else if d.y >= 0.0 {
        Side::Bottom
    } else {
        Side::Top
    }
}

/// Midpoint of one side of `rect`.
pub fn attachment_point(rect: Rect, side: Side) -> Point {
    let c = rect.center();
    match side {
        Side::Left => Point::new(rect.x0, c.y),
        Side::Right => Point::new(rect.x1, c.y),
        Side::Top => Point::new(c.x, rect.y0),
        Side::Bottom => Point::new(c.x, rect.y1),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorPath {
    pub start: Point,
    pub end: Point,
    pub exit: Side,
    pub entry: Side,
    pub curve: CubicBez,
    /// Direction of the arrowhead at `end`, in radians.
    pub arrow_angle: f64,
}

impl ConnectorPath {
    fn new(start: Point, exit: Side, end: Point, entry: Side, factor: f64, min_offset: f64) -> Self {
        let delta = end - start;
        let offset = delta.x.abs().min(delta.y.abs()) * factor + min_offset;
        Self {
            start,
            end,
            exit,
            entry,
            curve: CubicBez::new(
                start,
                start + exit.outward() * offset,
                end + entry.outward() * offset,
                end,
            ),
            arrow_angle: delta.y.atan2(delta.x),
        }
    }

    /// SVG path data, `M x y C x1 y1 x2 y2 x y`.
    pub fn to_svg_path(&self) -> String {
        let CubicBez { p0, p1, p2, p3 } = self.curve;
        let mut d = String::new();
        let _ = write!(
            d,
            "M {} {} C {} {} {} {} {} {}",
            num(p0.x),
            num(p0.y),
            num(p1.x),
            num(p1.y),
            num(p2.x),
            num(p2.y),
            num(p3.x),
            num(p3.y)
        );
        d
    }

    /// Arrowhead triangle: tip at `end`, base `size` back along the arrow
    /// angle, as much wide as long.
    pub fn arrowhead(&self, size: f64) -> [Point; 3] {
        let back = Vec2::from_angle(self.arrow_angle) * size;
        let across = Vec2::new(-back.y, back.x) * 0.5;
        let base = self.end - back;
        [self.end, base + across, base - across]
    }
}

/// Route a connector from a source screen (or an element on it) to a target
/// screen. `element` is in canvas coordinates.
pub fn compute_connector_path(
    source_screen: Bounds,
    target_screen: Bounds,
    element: Option<Bounds>,
    config: &ConnectorConfig,
) -> ConnectorPath {
    let target = target_screen.to_rect();
    let from = element.unwrap_or(source_screen).to_rect();
    let exit = facing_side(from, target.center());
    let start = attachment_point(from, exit);
    let entry = facing_side(target, start);
    let end = attachment_point(target, entry);
    ConnectorPath::new(start, exit, end, entry, config.offset_factor, config.min_offset)
}

/// The in-progress curve from the click point to the pointer. Always bows
/// horizontally.
pub fn compute_preview_path(click: Point, mouse: Point, config: &ConnectorConfig) -> ConnectorPath {
    let (exit, entry) = if mouse.x >= click.x {
        (Side::Right, Side::Left)
    } else {
        (Side::Left, Side::Right)
    };
    ConnectorPath::new(
        click,
        exit,
        mouse,
        entry,
        config.preview_offset_factor,
        config.preview_min_offset,
    )
}

/// Canvas placement of every screen, keyed by screen id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenPositions(BTreeMap<String, ScreenPosition>);

impl ScreenPositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, screen_id: impl Into<String>, position: ScreenPosition) {
        self.0.insert(screen_id.into(), position);
    }

    pub fn get(&self, screen_id: &str) -> Option<ScreenPosition> {
        self.0.get(screen_id).copied()
    }

    pub fn remove(&mut self, screen_id: &str) -> Option<ScreenPosition> {
        self.0.remove(screen_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The screen whose box contains a canvas point; the last one wins when
    /// screens overlap.
    pub fn screen_at(&self, point: Point) -> Option<&str> {
        self.0
            .iter()
            .filter(|(_, b)| b.contains(point.x, point.y))
            .map(|(id, _)| id.as_str())
            .last()
    }
}

/// Route a stored link using the current screen positions. `None` when
/// either screen is not placed.
pub fn route_link(
    link: &PrototypeLink,
    screens: &ScreenPositions,
    config: &ConnectorConfig,
) -> Option<ConnectorPath> {
    let source = screens.get(&link.from_screen_id)?;
    let target = screens.get(&link.to_screen_id)?;
    let element = link.from_element_position.map(|e| e.offset_by(source));
    Some(compute_connector_path(source, target, element, config))
}

pub(crate) fn num(v: f64) -> String {
    let r = (v * 100.0).round() / 100.0;
    if r == 0.0 {
        // normalizes -0
        "0".to_string()
    } else {
        format!("{r}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn screen(x: f64, y: f64) -> Bounds {
        Bounds::new(x, y, 320.0, 600.0)
    }

    #[test]
    fn side_by_side_screens_use_facing_edges() {
        let path = compute_connector_path(screen(0.0, 0.0), screen(400.0, 0.0), None, &Default::default());
        assert_eq!((path.exit, path.entry), (Side::Right, Side::Left));
        assert_eq!(path.start, Point::new(320.0, 300.0));
        assert_eq!(path.end, Point::new(400.0, 300.0));
        assert_eq!(path.to_svg_path(), "M 320 300 C 380 300 340 300 400 300");
        assert_eq!(path.arrow_angle, 0.0);
    }

    #[test]
    fn leftward_target_mirrors() {
        let path = compute_connector_path(screen(400.0, 0.0), screen(0.0, 0.0), None, &Default::default());
        assert_eq!((path.exit, path.entry), (Side::Left, Side::Right));
        assert_eq!(path.start, Point::new(400.0, 300.0));
        assert_eq!(path.end, Point::new(320.0, 300.0));
        assert_eq!(path.arrow_angle, std::f64::consts::PI);
    }

    #[test]
    fn stacked_screens_connect_vertically() {
        let path = compute_connector_path(screen(0.0, 0.0), screen(0.0, 800.0), None, &Default::default());
        assert_eq!((path.exit, path.entry), (Side::Bottom, Side::Top));
        assert_eq!(path.to_svg_path(), "M 160 600 C 160 660 160 740 160 800");
    }

    #[test]
    fn element_box_picks_its_own_edge() {
        let element = Bounds::new(20.0, 440.0, 200.0, 48.0);
        let path = compute_connector_path(screen(0.0, 0.0), screen(400.0, 0.0), Some(element), &Default::default());
        assert_eq!(path.exit, Side::Right);
        assert_eq!(path.start, Point::new(220.0, 464.0));
        assert_eq!(path.entry, Side::Left);
        assert_eq!(path.end, Point::new(400.0, 300.0));
        // offset = min(180, 164) * 0.5 + 60
        assert_eq!(path.curve.p1, Point::new(362.0, 464.0));
        assert_eq!(path.curve.p2, Point::new(258.0, 300.0));
    }

    #[test]
    fn routing_is_deterministic() {
        let config = ConnectorConfig::default();
        let a = compute_connector_path(screen(13.5, 70.0), screen(-900.0, 1200.0), None, &config);
        let b = compute_connector_path(screen(13.5, 70.0), screen(-900.0, 1200.0), None, &config);
        assert_eq!(a, b);
        assert_eq!(a.to_svg_path(), b.to_svg_path());
    }

    #[test]
    fn preview_uses_smaller_offset() {
        let config = ConnectorConfig::default();
        let path = compute_preview_path(Point::new(0.0, 0.0), Point::new(200.0, 100.0), &config);
        // min(200, 100) * 0.3 + 40
        assert_eq!(path.curve.p1, Point::new(70.0, 0.0));
        assert_eq!(path.curve.p2, Point::new(130.0, 100.0));

        let back = compute_preview_path(Point::new(0.0, 0.0), Point::new(-200.0, 0.0), &config);
        assert_eq!(back.curve.p1, Point::new(-40.0, 0.0));
        assert_eq!(back.curve.p2, Point::new(-160.0, 0.0));
    }

    #[test]
    fn arrowhead_points_along_the_angle() {
        let path = compute_connector_path(screen(0.0, 0.0), screen(400.0, 0.0), None, &Default::default());
        let [tip, a, b] = path.arrowhead(10.0);
        assert_eq!(tip, Point::new(400.0, 300.0));
        assert_eq!(a, Point::new(390.0, 305.0));
        assert_eq!(b, Point::new(390.0, 295.0));
    }

    #[test]
    fn links_route_through_screen_positions() {
        let mut screens = ScreenPositions::new();
        screens.set("a", screen(100.0, 100.0));
        screens.set("b", screen(500.0, 100.0));
        let link = PrototypeLink {
            id: "1".into(),
            from_screen_id: "a".into(),
            from_element_id: "cta".into(),
            to_screen_id: "b".into(),
            from_element_position: Some(Bounds::new(20.0, 440.0, 200.0, 48.0)),
        };
        let path = route_link(&link, &screens, &Default::default()).unwrap();
        assert_eq!(path.start, Point::new(320.0, 564.0));

        screens.remove("b");
        assert!(route_link(&link, &screens, &Default::default()).is_none());
    }

    #[test]
    fn hit_testing_screens() {
        let mut screens = ScreenPositions::new();
        screens.set("a", screen(0.0, 0.0));
        screens.set("b", screen(400.0, 0.0));
        assert_eq!(screens.screen_at(Point::new(500.0, 20.0)), Some("b"));
        assert_eq!(screens.screen_at(Point::new(360.0, 20.0)), None);
    }
}
