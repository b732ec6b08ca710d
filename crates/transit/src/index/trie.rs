//! Character trie keyed by entity identifier.
//!
//! Nodes live in a single arena and refer to each other by index, so the whole
//! index can be dropped or rebuilt without chasing owned pointers. Children are
//! kept in a `BTreeMap`, which makes depth-first traversal yield keys in
//! lexical order.
//!
//! ## Nearest matches
//!
//! Search-as-you-type walks the query down the trie as far as it matches, then
//! collects entries from the deepest matched node. When the query is not a
//! prefix of any key, collection backs off one character at a time toward the
//! root, so results are ranked by how long a prefix they share with the query.
//! Work is bounded by the query length plus the nodes visited to fill `limit`,
//! never by the total number of entries.

use std::collections::BTreeMap;

use tracing::warn;

use crate::models::types::{Result, TransitError};

type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Clone, Debug)]
struct Node<V> {
    children: BTreeMap<char, NodeId>,
    entry: Option<(Box<str>, V)>,
}

impl<V> Default for Node<V> {
    fn default() -> Self {
        Self {
            children: BTreeMap::new(),
            entry: None,
        }
    }
}

/// String-keyed map with prefix search
#[derive(Clone, Debug)]
pub struct PrefixIndex<V> {
    nodes: Vec<Node<V>>,
    len: usize,
}

impl<V> PrefixIndex<V> {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            len: 0,
        }
    }

    /// Insert or overwrite the value stored under `key`, returning the previous value.
    pub fn insert(&mut self, key: &str, value: V) -> Result<Option<V>> {
        if key.is_empty() {
            return Err(TransitError::EmptyKey);
        }

        let mut node = ROOT;
        for c in key.chars() {
            let next = self.nodes[node].children.get(&c).copied();
            node = match next {
                Some(child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[node].children.insert(c, child);
                    child
                }
            };
        }

        let previous = self.nodes[node]
            .entry
            .replace((key.into(), value))
            .map(|(_, v)| v);
        if previous.is_none() {
            self.len += 1;
        }
        Ok(previous)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        let node = self.find_node(key)?;
        self.nodes[node].entry.as_ref().map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let node = self.find_node(key)?;
        self.nodes[node].entry.as_mut().map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Alias of [`len`](Self::len)
    pub fn size(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node::default());
        self.len = 0;
    }

    /// Values in trie (lexical key) order. Each call starts a fresh traversal.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            entries: self.entries(),
        }
    }

    /// `(key, value)` pairs in trie order
    pub fn entries(&self) -> Entries<'_, V> {
        Entries::new(&self.nodes, ROOT, None)
    }

    /// Every value, mutably, in no particular order
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.nodes
            .iter_mut()
            .filter_map(|node| node.entry.as_mut().map(|(_, v)| v))
    }

    /// Up to `limit` values whose keys best match `query`.
    ///
    /// If any key starts with `query`, only such keys are returned, in lexical
    /// order. Otherwise keys are ranked by the length of the prefix they share
    /// with `query` (longest first), ties broken lexically. An empty query
    /// matches every key.
    pub fn nearest_matches(&self, query: &str, limit: usize) -> Vec<&V> {
        self.nearest_entries(query, limit)
            .into_iter()
            .map(|(_, v)| v)
            .collect()
    }

    /// Like [`nearest_matches`](Self::nearest_matches), keeping the keys
    pub fn nearest_entries(&self, query: &str, limit: usize) -> Vec<(&str, &V)> {
        let mut results = Vec::new();
        if limit == 0 {
            return results;
        }

        // path[d] is the node reached after matching d characters of the query
        let mut path = vec![ROOT];
        let mut query_len = 0;
        for c in query.chars() {
            query_len += 1;
            match self.nodes[path[path.len() - 1]].children.get(&c) {
                Some(&child) => path.push(child),
                None => break,
            }
        }

        let deepest = path[path.len() - 1];
        results.extend(Entries::new(&self.nodes, deepest, None).take(limit));

        if path.len() == query_len + 1 {
            return results;
        }

        // Back off toward the root, skipping the subtree already collected
        for depth in (0..path.len() - 1).rev() {
            if results.len() >= limit {
                break;
            }
            let remaining = limit - results.len();
            let visited = path[depth + 1];
            results.extend(Entries::new(&self.nodes, path[depth], Some(visited)).take(remaining));
        }

        results
    }

    fn find_node(&self, key: &str) -> Option<NodeId> {
        if key.is_empty() {
            return None;
        }
        key.chars()
            .try_fold(ROOT, |node, c| self.nodes[node].children.get(&c).copied())
    }
}

impl<V> Default for PrefixIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Entries with an empty key are skipped.
impl<K: AsRef<str>, V> Extend<(K, V)> for PrefixIndex<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            if let Err(err) = self.insert(key.as_ref(), value) {
                warn!(%err, "skipping index entry");
            }
        }
    }
}

impl<K: AsRef<str>, V> FromIterator<(K, V)> for PrefixIndex<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut index = Self::new();
        index.extend(iter);
        index
    }
}

impl<'a, V> IntoIterator for &'a PrefixIndex<V> {
    type Item = &'a V;
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// Iterators
// ============================================================================

/// Depth-first, pre-order traversal of a subtree
pub struct Entries<'a, V> {
    nodes: &'a [Node<V>],
    stack: Vec<NodeId>,
    skip: Option<NodeId>,
}

impl<'a, V> Entries<'a, V> {
    fn new(nodes: &'a [Node<V>], start: NodeId, skip: Option<NodeId>) -> Self {
        Self {
            nodes,
            stack: vec![start],
            skip,
        }
    }
}

impl<'a, V> Iterator for Entries<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        while let Some(id) = self.stack.pop() {
            let node = &nodes[id];

            // Reverse so the smallest child is popped first
            let skip = self.skip;
            self.stack.extend(
                node.children
                    .values()
                    .rev()
                    .copied()
                    .filter(|&child| Some(child) != skip),
            );

            if let Some((key, value)) = &node.entry {
                return Some((&**key, value));
            }
        }
        None
    }
}

/// Values of a [`PrefixIndex`] in trie order
pub struct Iter<'a, V> {
    entries: Entries<'a, V>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(|(_, v)| v)
    }
}
