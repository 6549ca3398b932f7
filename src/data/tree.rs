use serde_json::Value;

use crate::{data::node::ConfigNode, error::ConfigError};

/// In-memory configuration tree with point lookup, point mutation, and
/// dirty tracking.
///
/// The tree holds a top-level forest, matching what the persistence
/// collaborator returns from `load()`. It is mutated only by the thread
/// holding the UI event loop; there is no concurrent mutator and hence no
/// lock. The tree itself *is* the form state: editors write straight into
/// it with no staging buffer.
#[derive(Debug, Clone, Default)]
pub struct ConfigTree {
    roots: Vec<ConfigNode>,
    dirty: bool,
}

impl ConfigTree {
    /// Wrap a freshly loaded forest. The dirty flag starts cleared.
    pub fn new(roots: Vec<ConfigNode>) -> Self {
        Self {
            roots,
            dirty: false,
        }
    }

    /// The top-level nodes in display order.
    pub fn roots(&self) -> &[ConfigNode] {
        &self.roots
    }

    /// Whether there are unsaved edits.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag after a successful save.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Look up a value by key.
    ///
    /// Traversal is pre-order depth-first; when keys collide across
    /// branches the first match wins.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] when no node in the tree has the
    /// key.
    pub fn get(&self, key: &str) -> Result<&str, ConfigError> {
        find(&self.roots, key)
            .map(|n| n.value.as_str())
            .ok_or_else(|| ConfigError::NotFound {
                key: key.to_string(),
            })
    }

    /// First-match node access, used by editors that need options or
    /// kind information alongside the value.
    pub fn node(&self, key: &str) -> Option<&ConfigNode> {
        find(&self.roots, key)
    }

    /// Set the value of every node carrying `key`.
    ///
    /// Unlike [`get`](Self::get), this updates *all* matches when keys
    /// collide across branches. The read/write asymmetry is inherited
    /// from the system this tree models and is covered by tests rather
    /// than silently changed.
    ///
    /// Returns whether at least one node was updated; any successful
    /// update marks the tree dirty.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        let updated = set_all(&mut self.roots, key, value);
        if updated > 0 {
            self.dirty = true;
            true
        } else {
            false
        }
    }

    /// Serialize the forest for the persistence collaborator.
    ///
    /// # Errors
    ///
    /// Returns the underlying serde error; with this data model it can
    /// only occur on pathological inputs.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(&self.roots)
    }

    /// Rebuild a tree from a persisted payload. Child order is
    /// preserved; the dirty flag starts cleared.
    ///
    /// # Errors
    ///
    /// Returns the underlying serde error when the payload does not
    /// match the node shape.
    pub fn from_json(payload: Value) -> serde_json::Result<Self> {
        let roots: Vec<ConfigNode> = serde_json::from_value(payload)?;
        Ok(Self::new(roots))
    }
}

fn find<'a>(nodes: &'a [ConfigNode], key: &str) -> Option<&'a ConfigNode> {
    for node in nodes {
        if node.key == key {
            return Some(node);
        }
        if let Some(found) = find(&node.children, key) {
            return Some(found);
        }
    }
    None
}

fn set_all(nodes: &mut [ConfigNode], key: &str, value: &str) -> usize {
    let mut updated = 0;
    for node in nodes {
        if node.key == key {
            node.value = value.to_string();
            updated += 1;
        }
        updated += set_all(&mut node.children, key, value);
    }
    updated
}
