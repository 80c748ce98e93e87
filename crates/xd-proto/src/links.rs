//! Prototype link graph.
//!
//! A link is a directed edge from one interactive element on a screen to
//! another whole screen. The graph holds at most one link per source element
//! and never a link back into its own screen.

use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("a screen cannot link to itself ({0})")]
    SameScreen(String),
    #[error("link is missing its {0}")]
    EmptyId(&'static str),
}

/// An axis-aligned box on the canvas or inside a screen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// This box, given relative to `origin`'s top-left, in `origin`'s frame.
    pub fn offset_by(self, origin: Bounds) -> Bounds {
        Bounds::new(self.x + origin.x, self.y + origin.y, self.width, self.height)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Where a screen sits on the canvas.
pub type ScreenPosition = Bounds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrototypeLink {
    pub id: String,
    pub from_screen_id: String,
    pub from_element_id: String,
    pub to_screen_id: String,
    /// Source element box relative to the source screen's content area.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_element_position: Option<Bounds>,
}

impl PrototypeLink {
    pub fn validate(&self) -> Result<(), LinkError> {
        check_endpoints(&self.from_screen_id, &self.from_element_id, &self.to_screen_id)
    }

    fn source(&self) -> (&str, &str) {
        (&self.from_screen_id, &self.from_element_id)
    }
}

fn check_endpoints(from_screen: &str, from_element: &str, to_screen: &str) -> Result<(), LinkError> {
    if from_screen.is_empty() {
        return Err(LinkError::EmptyId("source screen"));
    }
    if from_element.is_empty() {
        return Err(LinkError::EmptyId("source element"));
    }
    if to_screen.is_empty() {
        return Err(LinkError::EmptyId("target screen"));
    }
    if from_screen == to_screen {
        return Err(LinkError::SameScreen(from_screen.to_string()));
    }
    Ok(())
}

/// A link about to be created, as produced by a finished linking gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkDraft {
    pub from_screen_id: String,
    pub from_element_id: String,
    pub to_screen_id: String,
    pub from_element_position: Option<Bounds>,
}

/// All links of one project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkGraph {
    project_id: String,
    links: Vec<PrototypeLink>,
}

impl LinkGraph {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            links: Vec::new(),
        }
    }

    /// Rebuild a graph from stored records. Invalid records and repeated
    /// source elements (after the first) are dropped with a warning.
    pub fn from_links(project_id: impl Into<String>, links: Vec<PrototypeLink>) -> Self {
        let mut graph = Self::new(project_id);
        let mut seen = HashSet::new();
        for link in links {
            if let Err(e) = link.validate() {
                log::warn!("dropping stored link {}: {e}", link.id);
                continue;
            }
            if !seen.insert((link.from_screen_id.clone(), link.from_element_id.clone())) {
                log::warn!(
                    "dropping duplicate link {} from {}/{}",
                    link.id,
                    link.from_screen_id,
                    link.from_element_id
                );
                continue;
            }
            graph.links.push(link);
        }
        graph
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn links(&self) -> &[PrototypeLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Create a link, or retarget the existing link from the same element.
    /// An existing link keeps its id.
    pub fn upsert(&mut self, draft: LinkDraft) -> Result<&PrototypeLink, LinkError> {
        check_endpoints(&draft.from_screen_id, &draft.from_element_id, &draft.to_screen_id)?;
        let mut link = PrototypeLink {
            id: String::new(),
            from_screen_id: draft.from_screen_id,
            from_element_id: draft.from_element_id,
            to_screen_id: draft.to_screen_id,
            from_element_position: draft.from_element_position,
        };

        let index = match self.links.iter().position(|l| l.source() == link.source()) {
            Some(i) => {
                link.id = std::mem::take(&mut self.links[i].id);
                log::debug!(
                    "retargeting link {} from {} to {}",
                    link.id,
                    self.links[i].to_screen_id,
                    link.to_screen_id
                );
                self.links[i] = link;
                i
            }
            None => {
                link.id = uuid::Uuid::new_v4().to_string();
                log::debug!(
                    "new link {}: {}/{} -> {}",
                    link.id,
                    link.from_screen_id,
                    link.from_element_id,
                    link.to_screen_id
                );
                self.links.push(link);
                self.links.len() - 1
            }
        };
        Ok(&self.links[index])
    }

    /// Remove a link by id; returns it when found.
    pub fn remove(&mut self, link_id: &str) -> Option<PrototypeLink> {
        let index = self.links.iter().position(|l| l.id == link_id)?;
        Some(self.links.remove(index))
    }

    /// Remove every link leaving or entering `screen_id`; returns how many.
    pub fn remove_screen(&mut self, screen_id: &str) -> usize {
        let before = self.links.len();
        self.links
            .retain(|l| l.from_screen_id != screen_id && l.to_screen_id != screen_id);
        before - self.links.len()
    }

    pub fn links_from<'a>(&'a self, screen_id: &'a str) -> impl Iterator<Item = &'a PrototypeLink> {
        self.links.iter().filter(move |l| l.from_screen_id == screen_id)
    }

    pub fn links_to<'a>(&'a self, screen_id: &'a str) -> impl Iterator<Item = &'a PrototypeLink> {
        self.links.iter().filter(move |l| l.to_screen_id == screen_id)
    }

    /// The link starting at a given element, if any.
    pub fn link_for(&self, screen_id: &str, element_id: &str) -> Option<&PrototypeLink> {
        self.links
            .iter()
            .find(|l| l.source() == (screen_id, element_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn draft(from: &str, element: &str, to: &str) -> LinkDraft {
        LinkDraft {
            from_screen_id: from.into(),
            from_element_id: element.into(),
            to_screen_id: to.into(),
            from_element_position: None,
        }
    }

    #[test]
    fn second_link_from_same_element_retargets() {
        let mut graph = LinkGraph::new("p1");
        let first_id = graph.upsert(draft("a", "btn", "b")).unwrap().id.clone();
        let second = graph.upsert(draft("a", "btn", "c")).unwrap();
        assert_eq!(second.id, first_id);
        assert_eq!(second.to_screen_id, "c");
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.link_for("a", "btn").unwrap().to_screen_id, "c");
    }

    #[test]
    fn distinct_elements_get_distinct_links() {
        let mut graph = LinkGraph::new("p1");
        let a = graph.upsert(draft("a", "btn", "b")).unwrap().id.clone();
        let b = graph.upsert(draft("a", "tab", "b")).unwrap().id.clone();
        assert_ne!(a, b);
        assert_eq!(graph.links_from("a").count(), 2);
        assert_eq!(graph.links_to("b").count(), 2);
    }

    #[test]
    fn self_links_are_rejected() {
        let mut graph = LinkGraph::new("p1");
        assert_eq!(
            graph.upsert(draft("a", "btn", "a")).unwrap_err(),
            LinkError::SameScreen("a".into())
        );
        assert_eq!(
            graph.upsert(draft("a", "", "b")).unwrap_err(),
            LinkError::EmptyId("source element")
        );
        assert!(graph.is_empty());
    }

    #[test]
    fn removing_a_screen_drops_links_both_ways() {
        let mut graph = LinkGraph::new("p1");
        graph.upsert(draft("a", "x", "b")).unwrap();
        graph.upsert(draft("b", "y", "c")).unwrap();
        graph.upsert(draft("c", "z", "a")).unwrap();
        assert_eq!(graph.remove_screen("b"), 2);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.links()[0].from_screen_id, "c");
    }

    #[test]
    fn remove_by_id() {
        let mut graph = LinkGraph::new("p1");
        let id = graph.upsert(draft("a", "x", "b")).unwrap().id.clone();
        assert!(graph.remove("missing").is_none());
        assert_eq!(graph.remove(&id).unwrap().to_screen_id, "b");
        assert!(graph.is_empty());
    }

    #[test]
    fn loading_drops_invalid_and_duplicate_records() {
        let json = r#"[
            {"id":"1","fromScreenId":"a","fromElementId":"x","toScreenId":"b"},
            {"id":"2","fromScreenId":"a","fromElementId":"x","toScreenId":"c"},
            {"id":"3","fromScreenId":"a","fromElementId":"y","toScreenId":"a"},
            {"id":"4","fromScreenId":"b","fromElementId":"y","toScreenId":"a",
             "fromElementPosition":{"x":10,"y":20,"width":100,"height":40}}
        ]"#;
        let links: Vec<PrototypeLink> = serde_json::from_str(json).unwrap();
        let graph = LinkGraph::from_links("p1", links);
        let ids: Vec<&str> = graph.links().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
        assert_eq!(
            graph.links()[1].from_element_position,
            Some(Bounds::new(10.0, 20.0, 100.0, 40.0))
        );
    }

    #[test]
    fn records_serialize_camel_case() {
        let link = PrototypeLink {
            id: "1".into(),
            from_screen_id: "a".into(),
            from_element_id: "x".into(),
            to_screen_id: "b".into(),
            from_element_position: None,
        };
        assert_eq!(
            serde_json::to_string(&link).unwrap(),
            r#"{"id":"1","fromScreenId":"a","fromElementId":"x","toScreenId":"b"}"#
        );
    }
}
