//! Link persistence.
//!
//! Each project's links are one JSON array under `prototype-links-<projectId>`.
//! The graph is read once when a project loads and the whole array is
//! rewritten after every mutation; the last writer wins.

use crate::links::{LinkDraft, LinkError, LinkGraph, PrototypeLink};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("link store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored links are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("link storage unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Key under which a project's links are stored.
pub fn storage_key(project_id: &str) -> String {
    format!("prototype-links-{project_id}")
}

/// A key/value backend holding serialized link arrays.
pub trait LinkStore {
    /// The raw JSON stored under `key`, `None` when nothing was saved yet.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    fn load(&self, project_id: &str) -> Result<Vec<PrototypeLink>, StoreError> {
        match self.read(&storage_key(project_id))? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&mut self, project_id: &str, links: &[PrototypeLink]) -> Result<(), StoreError> {
        let json = serde_json::to_string(links)?;
        self.write(&storage_key(project_id), &json)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl LinkStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per project inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl LinkStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// A link graph bound to a store: loaded once, saved after each change.
#[derive(Debug)]
pub struct PersistentLinks<S: LinkStore> {
    graph: LinkGraph,
    store: S,
}

impl<S: LinkStore> PersistentLinks<S> {
    /// Load `project_id`'s links. Unreadable data starts an empty graph.
    pub fn open(store: S, project_id: &str) -> Self {
        let links = match store.load(project_id) {
            Ok(links) => links,
            Err(e) => {
                log::warn!("could not load links for {project_id}: {e}");
                Vec::new()
            }
        };
        Self {
            graph: LinkGraph::from_links(project_id, links),
            store,
        }
    }

    pub fn graph(&self) -> &LinkGraph {
        &self.graph
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn upsert(&mut self, draft: LinkDraft) -> Result<PrototypeLink, StoreError> {
        let link = self.graph.upsert(draft)?.clone();
        self.save()?;
        Ok(link)
    }

    pub fn remove(&mut self, link_id: &str) -> Result<Option<PrototypeLink>, StoreError> {
        let removed = self.graph.remove(link_id);
        if removed.is_some() {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn remove_screen(&mut self, screen_id: &str) -> Result<usize, StoreError> {
        let removed = self.graph.remove_screen(screen_id);
        if removed > 0 {
            self.save()?;
        }
        Ok(removed)
    }

    fn save(&mut self) -> Result<(), StoreError> {
        let project_id = self.graph.project_id().to_string();
        self.store.save(&project_id, self.graph.links())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn draft(element: &str, to: &str) -> LinkDraft {
        LinkDraft {
            from_screen_id: "home".into(),
            from_element_id: element.into(),
            to_screen_id: to.into(),
            from_element_position: None,
        }
    }

    #[test]
    fn key_format() {
        assert_eq!(storage_key("p42"), "prototype-links-p42");
    }

    #[test]
    fn every_mutation_is_written_through() {
        let mut links = PersistentLinks::open(MemoryStore::new(), "p1");
        assert!(links.store().raw("prototype-links-p1").is_none());

        let link = links.upsert(draft("cta", "checkout")).unwrap();
        let stored: Vec<PrototypeLink> =
            serde_json::from_str(links.store().raw("prototype-links-p1").unwrap()).unwrap();
        assert_eq!(stored, vec![link.clone()]);

        links.remove(&link.id).unwrap();
        assert_eq!(links.store().raw("prototype-links-p1"), Some("[]"));
    }

    #[test]
    fn failed_mutation_writes_nothing() {
        let mut links = PersistentLinks::open(MemoryStore::new(), "p1");
        assert!(matches!(
            links.upsert(draft("cta", "home")),
            Err(StoreError::Link(LinkError::SameScreen(_)))
        ));
        assert!(links.store().raw("prototype-links-p1").is_none());
    }

    #[test]
    fn reopening_restores_the_graph() {
        let mut first = PersistentLinks::open(MemoryStore::new(), "p1");
        first.upsert(draft("cta", "checkout")).unwrap();
        first.upsert(draft("cta", "cart")).unwrap();
        let store = first.store().clone();

        let reopened = PersistentLinks::open(store, "p1");
        assert_eq!(reopened.graph().len(), 1);
        assert_eq!(reopened.graph().links()[0].to_screen_id, "cart");
    }

    #[test]
    fn corrupt_data_opens_empty() {
        let mut store = MemoryStore::new();
        store.write("prototype-links-p1", "{oops").unwrap();
        let links = PersistentLinks::open(store, "p1");
        assert!(links.graph().is_empty());
    }
}
