pub mod connector;
pub mod discovery;
pub mod gesture;
pub mod links;
pub mod overlay;
pub mod store;

pub use connector::{
    ConnectorPath, ScreenPositions, Side, compute_connector_path, compute_preview_path, route_link,
};
pub use discovery::{AccessError, InteractiveElement, RescanScheduler, discover};
pub use gesture::{GestureState, LinkGesture, LinkingState};
pub use links::{Bounds, LinkDraft, LinkError, LinkGraph, PrototypeLink, ScreenPosition};
pub use overlay::{render_hotspots, render_overlay};
pub use store::{FileStore, LinkStore, MemoryStore, PersistentLinks, StoreError, storage_key};
