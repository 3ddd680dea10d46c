//! Chord trie mapping key-press sequences to action ids.

use std::collections::BTreeMap;

use super::types::KeyDescriptor;

/// One node of the chord trie.
///
/// The path from the root to a node at depth `d` is a sequence of `d` key
/// presses; `actions` holds the actions bound to exactly that sequence. The
/// root has depth 0 and never holds actions.
#[derive(Debug, Clone)]
pub struct ShortcutTreeNode {
    key: Option<KeyDescriptor>,
    depth: usize,
    actions: Vec<String>,
    chords: BTreeMap<KeyDescriptor, ShortcutTreeNode>,
}

impl Default for ShortcutTreeNode {
    fn default() -> Self {
        Self::root()
    }
}

impl ShortcutTreeNode {
    pub fn root() -> Self {
        Self::new(None, 0)
    }

    fn new(key: Option<KeyDescriptor>, depth: usize) -> Self {
        Self {
            key,
            depth,
            actions: Vec::new(),
            chords: BTreeMap::new(),
        }
    }

    /// Bind `action` to the sequence `keys`, creating nodes as needed.
    ///
    /// Duplicate bindings are kept; the trie does not deduplicate.
    pub fn add_key_mapping(&mut self, keys: &[KeyDescriptor], action: &str) {
        if keys.len() < self.depth {
            return;
        }
        if keys.len() == self.depth {
            if self.depth > 0 {
                self.actions.push(action.to_string());
            }
            return;
        }
        let key = keys[self.depth];
        let depth = self.depth + 1;
        self.chords
            .entry(key)
            .or_insert_with(|| Self::new(Some(key), depth))
            .add_key_mapping(keys, action);
    }

    pub fn get_node(&self, key: &KeyDescriptor) -> Option<&ShortcutTreeNode> {
        self.chords.get(key)
    }

    /// Walk `keys` from this node.
    pub fn node_for_sequence(&self, keys: &[KeyDescriptor]) -> Option<&ShortcutTreeNode> {
        keys.iter().try_fold(self, |node, key| node.get_node(key))
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn has_chords(&self) -> bool {
        !self.chords.is_empty()
    }

    pub fn chords(&self) -> impl Iterator<Item = &ShortcutTreeNode> {
        self.chords.values()
    }

    /// The key press leading to this node; `None` for the root.
    pub fn key(&self) -> Option<KeyDescriptor> {
        self.key
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn clear(&mut self) {
        self.actions.clear();
        self.chords.clear();
    }
}
