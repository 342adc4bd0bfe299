use crate::tree::{suffix_from, EntryId, NodeId, Tree};

/// Unit-cost Levenshtein distance over chars.
pub fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j]
            } else {
                1 + prev[j].min(prev[j + 1]).min(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// `(max_len - distance) / max_len`, lengths in chars. Two empty strings score 1.
///
/// A single division keeps the result equal to the nearest double of the
/// exact ratio, so it compares cleanly against thresholds like `0.3`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    char_similarity(&a, &b)
}

fn char_similarity(a: &[char], b: &[char]) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    (max_len - levenshtein(a, b)) as f64 / max_len as f64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch {
    pub entry: EntryId,
    pub score: f64,
}

/// Scores every entry at or beneath `node` against `masked`, comparing only
/// the text after the node's offset since everything before it is shared.
///
/// Ties keep the first candidate seen; candidate order comes from the tree's
/// child maps and is not deterministic.
pub fn best_match(tree: &Tree, node: NodeId, masked: &str) -> Option<BestMatch> {
    let start = tree.node(node).start();
    let query: Vec<char> = suffix_of(masked, start).chars().collect();

    let mut best: Option<BestMatch> = None;
    for id in tree.collect(node) {
        let candidate: Vec<char> = suffix_of(&tree.entry(id).masked, start).chars().collect();
        let score = char_similarity(&query, &candidate);
        if best.map_or(true, |b| score > b.score) {
            best = Some(BestMatch { entry: id, score });
            if score == 1.0 {
                break;
            }
        }
    }
    best
}

fn suffix_of(s: &str, start: usize) -> &str {
    suffix_from(s, start)
        .unwrap_or_else(|| panic!("string of {} chars reached a node at offset {start}", s.chars().count()))
}
