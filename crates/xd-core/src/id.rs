use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for node IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A lightweight, interned identifier for nodes in a design tree.
/// Internally a 4-byte `Spur` index, so comparison and hashing are O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

impl NodeId {
    /// Intern a new string as a NodeId, or return existing if already interned.
    pub fn intern(s: &str) -> Self {
        NodeId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeId::intern(&s))
    }
}

/// Per-parse id allocator.
///
/// Prefers ids supplied by the markup (`data-node-id`, `id`) and falls back
/// to `<prefix>_<n>` with a counter local to one parse, so parsing the same
/// snapshot twice yields the same ids.
#[derive(Debug, Default)]
pub struct IdAllocator {
    used: HashSet<NodeId>,
    counter: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `preferred` if it is non-empty and unused, otherwise generate one.
    pub fn claim(&mut self, preferred: Option<&str>, prefix: &str) -> NodeId {
        if let Some(p) = preferred.map(str::trim).filter(|p| !p.is_empty()) {
            let id = NodeId::intern(p);
            if self.used.insert(id) {
                return id;
            }
        }
        loop {
            let id = NodeId::intern(&format!("{prefix}_{}", self.counter));
            self.counter += 1;
            if self.used.insert(id) {
                return id;
            }
        }
    }

    pub fn is_used(&self, id: NodeId) -> bool {
        self.used.contains(&id)
    }
}
