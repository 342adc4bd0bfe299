//! Prefix tree keyed by fixed-width chunks of the masked text.
//!
//! Nodes and entries live in two arenas owned by [`Tree`] and refer to each
//! other by index. A node at offset `start` routes entries by the chunk
//! `masked[start..start + step]`, counted in chars. Entries that are too short
//! to carry that chunk stay in the node's pending list.

use crate::config::SplitPolicy;
use ahash::AHashMap;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub original: String,
    pub masked: String,
}

impl Entry {
    pub fn new(original: impl Into<String>, masked: impl Into<String>) -> Self {
        Self { original: original.into(), masked: masked.into() }
    }
}

#[derive(Debug, Default)]
pub struct Node {
    start: usize,
    children: AHashMap<String, NodeId>,
    pending: Vec<EntryId>,
}

impl Node {
    fn at(start: usize) -> Self {
        Self { start, ..Default::default() }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.children.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn child(&self, chunk: &str) -> Option<NodeId> {
        self.children.get(chunk).copied()
    }

    pub fn pending(&self) -> &[EntryId] {
        &self.pending
    }
}

#[derive(Debug)]
pub struct Tree {
    step: usize,
    split: SplitPolicy,
    nodes: Vec<Node>,
    entries: Vec<Entry>,
}

impl Tree {
    pub const ROOT: NodeId = NodeId(0);

    /// `step` must be at least 1; [`crate::config::CounterConfig::validate`] checks it.
    pub fn new(step: usize, split: SplitPolicy) -> Self {
        assert!(step >= 1, "chunk width must be at least 1");
        Self { step, split, nodes: vec![Node::at(0)], entries: Vec::new() }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn entry(&self, id: EntryId) -> &Entry {
        &self.entries[id.0]
    }

    /// Every entry ever inserted, in insertion order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Follows exact chunk matches from the root and returns the deepest node reached.
    pub fn descend(&self, masked: &str) -> NodeId {
        let bounds = char_bounds(masked);
        let mut id = Self::ROOT;
        loop {
            let node = &self.nodes[id.0];
            let next = chunk_in(masked, &bounds, node.start, self.step).and_then(|chunk| node.child(chunk));
            match next {
                Some(child) => id = child,
                None => return id,
            }
        }
    }

    /// Stores `entry` under `node` and redistributes that node's pending set
    /// according to the split policy.
    pub fn insert(&mut self, node: NodeId, entry: Entry) -> EntryId {
        let id = EntryId(self.entries.len());
        self.entries.push(entry);

        // FIFO keeps per-child arrival order the same as a recursive insert would
        let mut work = VecDeque::from([(node, id)]);
        while let Some((node, id)) = work.pop_front() {
            self.nodes[node.0].pending.push(id);
            if !self.should_split(node) {
                continue;
            }

            let start = self.nodes[node.0].start;
            let pending = std::mem::take(&mut self.nodes[node.0].pending);
            let mut stunted = Vec::new();
            for eid in pending {
                let chunk = match chunk_at(&self.entries[eid.0].masked, start, self.step) {
                    Some(c) => c.to_string(),
                    None => {
                        stunted.push(eid);
                        continue;
                    }
                };
                match self.nodes[node.0].child(&chunk) {
                    Some(child) => work.push_back((child, eid)),
                    None => {
                        let child = NodeId(self.nodes.len());
                        let mut fresh = Node::at(start + self.step);
                        fresh.pending.push(eid);
                        self.nodes.push(fresh);
                        self.nodes[node.0].children.insert(chunk, child);
                    }
                }
            }
            self.nodes[node.0].pending = stunted;
        }
        id
    }

    /// All entries held at or beneath `node`. Order follows the child map and
    /// is not stable across tree instances.
    pub fn collect(&self, node: NodeId) -> Vec<EntryId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let n = &self.nodes[id.0];
            out.extend_from_slice(&n.pending);
            stack.extend(n.children.values().copied());
        }
        out
    }

    fn should_split(&self, node: NodeId) -> bool {
        match self.split {
            SplitPolicy::Immediate => true,
            SplitPolicy::Overflow { leaf_limit } => self.nodes[node.0].pending.len() > leaf_limit,
        }
    }
}

/// The chunk `s[start..start + step]` in chars, or `None` when `s` is too short.
pub fn chunk_at(s: &str, start: usize, step: usize) -> Option<&str> {
    char_slice(s, start, Some(start + step))
}

/// The tail of `s` from char offset `start`, or `None` past the end.
pub fn suffix_from(s: &str, start: usize) -> Option<&str> {
    char_slice(s, start, None)
}

/// Byte offset of every char in `s`, followed by `s.len()`.
fn char_bounds(s: &str) -> Vec<usize> {
    s.char_indices().map(|(i, _)| i).chain(std::iter::once(s.len())).collect()
}

/// [`chunk_at`] over precomputed [`char_bounds`], so each lookup is O(1).
fn chunk_in<'a>(s: &'a str, bounds: &[usize], start: usize, step: usize) -> Option<&'a str> {
    let hi = *bounds.get(start + step)?;
    Some(&s[bounds[start]..hi])
}

fn char_slice(s: &str, start: usize, end: Option<usize>) -> Option<&str> {
    let mut bounds = s.char_indices().map(|(i, _)| i).chain(std::iter::once(s.len()));
    let lo = bounds.nth(start)?;
    match end {
        Some(end) => {
            let hi = bounds.nth(end - start - 1)?;
            Some(&s[lo..hi])
        }
        None => Some(&s[lo..]),
    }
}
