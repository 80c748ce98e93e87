//! The click-move-click gesture that authors a link.
//!
//! `Idle → Linking` on a click on a discovered element, `Linking → Idle` on a
//! click inside a different screen (commit) or on cancel. Pointer movement
//! only updates the transient mouse point; the link graph is touched once,
//! at commit.

use crate::connector::{ConnectorPath, compute_preview_path};
use crate::links::{Bounds, LinkDraft, PrototypeLink};
use crate::store::{LinkStore, PersistentLinks, StoreError};
use kurbo::Point;
use xd_core::config::ConnectorConfig;

/// Everything captured when a gesture starts.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkingState {
    pub source_screen_id: String,
    pub source_element_id: String,
    /// Element box in viewport (canvas) coordinates.
    pub element_viewport: Bounds,
    /// Element box relative to the source screen's content area.
    pub element_in_screen: Bounds,
    pub click: Point,
    pub mouse: Point,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    Linking(LinkingState),
}

#[derive(Debug, Clone, Default)]
pub struct LinkGesture {
    state: GestureState,
}

impl LinkGesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_linking(&self) -> bool {
        matches!(self.state, GestureState::Linking(_))
    }

    /// Begin linking from an element. Restarts if a gesture is already open.
    pub fn start(
        &mut self,
        screen_id: &str,
        element_id: &str,
        element_viewport: Bounds,
        element_in_screen: Bounds,
        click: Point,
    ) {
        if self.is_linking() {
            log::debug!("restarting link gesture from {screen_id}/{element_id}");
        }
        self.state = GestureState::Linking(LinkingState {
            source_screen_id: screen_id.to_string(),
            source_element_id: element_id.to_string(),
            element_viewport,
            element_in_screen,
            click,
            mouse: click,
        });
    }

    pub fn pointer_moved(&mut self, to: Point) {
        if let GestureState::Linking(state) = &mut self.state {
            state.mouse = to;
        }
    }

    /// Click inside `target_screen_id`. Yields the link to create and returns
    /// to `Idle`; clicking the source screen again (or finishing while idle)
    /// changes nothing.
    pub fn finish(&mut self, target_screen_id: &str) -> Option<LinkDraft> {
        let GestureState::Linking(state) = &self.state else {
            return None;
        };
        if state.source_screen_id == target_screen_id {
            log::trace!("ignoring click on source screen {target_screen_id}");
            return None;
        }
        let GestureState::Linking(state) = std::mem::take(&mut self.state) else {
            return None;
        };
        Some(LinkDraft {
            from_screen_id: state.source_screen_id,
            from_element_id: state.source_element_id,
            to_screen_id: target_screen_id.to_string(),
            from_element_position: Some(state.element_in_screen),
        })
    }

    /// Finish and upsert into a persisted graph in one step.
    pub fn commit<S: LinkStore>(
        &mut self,
        target_screen_id: &str,
        links: &mut PersistentLinks<S>,
    ) -> Result<Option<PrototypeLink>, StoreError> {
        match self.finish(target_screen_id) {
            Some(draft) => links.upsert(draft).map(Some),
            None => Ok(None),
        }
    }

    pub fn cancel(&mut self) {
        self.state = GestureState::Idle;
    }

    /// The dashed curve from the click point to the pointer while linking.
    pub fn preview(&self, config: &ConnectorConfig) -> Option<ConnectorPath> {
        match &self.state {
            GestureState::Linking(state) => Some(compute_preview_path(state.click, state.mouse, config)),
            GestureState::Idle => None,
        }
    }
}
