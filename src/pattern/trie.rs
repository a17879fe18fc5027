//! Trie-based matcher: O(m) exact/prefix matching across many
//! patterns at once, where m is the input length — much better than
//! O(n*m) from checking each pattern individually, which matters for
//! routing tables with large numbers of static rules.

use std::collections::HashMap;

#[derive(Default)]
struct TrieNode {
    children: HashMap<u8, TrieNode>,
    exact_rule_ids: Vec<u32>,
    prefix_rule_ids: Vec<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrieStats {
    pub pattern_count: usize,
    pub node_count: usize,
}

/// Non-generic over rule payloads; callers store `rule_id` and resolve it
/// against their own rule table.
pub struct TrieMatcher {
    root: TrieNode,
    pattern_count: usize,
}

impl TrieMatcher {
    pub fn new() -> Self {
        TrieMatcher {
            root: TrieNode::default(),
            pattern_count: 0,
        }
    }

    pub fn add_exact(&mut self, pattern: &str, rule_id: u32) {
        let node = self.descend_and_create(pattern);
        if node.exact_rule_ids.is_empty() {
            self.pattern_count += 1;
        }
        if !node.exact_rule_ids.contains(&rule_id) {
            node.exact_rule_ids.push(rule_id);
        }
    }

    pub fn add_prefix(&mut self, prefix: &str, rule_id: u32) {
        let node = self.descend_and_create(prefix);
        if node.prefix_rule_ids.is_empty() {
            self.pattern_count += 1;
        }
        if !node.prefix_rule_ids.contains(&rule_id) {
            node.prefix_rule_ids.push(rule_id);
        }
    }

    fn descend_and_create(&mut self, s: &str) -> &mut TrieNode {
        let mut node = &mut self.root;
        for &byte in s.as_bytes() {
            node = node.children.entry(byte).or_default();
        }
        node
    }

    /// Exact matches first, then any prefix matches found along the walk.
    pub fn find_matches(&self, input: &str) -> Vec<u32> {
        let mut matches = Vec::new();
        let mut node = &self.root;
        let mut prefix_hits = Vec::new();

        for &byte in input.as_bytes() {
            prefix_hits.extend_from_slice(&node.prefix_rule_ids);
            match node.children.get(&byte) {
                Some(next) => node = next,
                None => {
                    matches.extend(prefix_hits);
                    return matches;
                }
            }
        }

        matches.extend_from_slice(&node.exact_rule_ids);
        prefix_hits.extend_from_slice(&node.prefix_rule_ids);
        matches.extend(prefix_hits);
        matches
    }

    pub fn find_exact(&self, input: &str) -> Vec<u32> {
        let mut node = &self.root;
        for &byte in input.as_bytes() {
            match node.children.get(&byte) {
                Some(next) => node = next,
                None => return Vec::new(),
            }
        }
        node.exact_rule_ids.clone()
    }

    pub fn matches(&self, input: &str) -> bool {
        !self.find_matches(input).is_empty()
    }

    pub fn clear(&mut self) {
        self.root = TrieNode::default();
        self.pattern_count = 0;
    }

    pub fn size(&self) -> usize {
        self.pattern_count
    }

    pub fn is_empty(&self) -> bool {
        self.pattern_count == 0
    }

    pub fn stats(&self) -> TrieStats {
        fn count_nodes(node: &TrieNode) -> usize {
            1 + node.children.values().map(count_nodes).sum::<usize>()
        }
        TrieStats {
            pattern_count: self.pattern_count,
            node_count: count_nodes(&self.root),
        }
    }
}

impl Default for TrieMatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_takes_priority_over_prefix() {
        let mut trie = TrieMatcher::new();
        trie.add_prefix("sensors/", 1);
        trie.add_exact("sensors/temp", 2);
        let matches = trie.find_matches("sensors/temp");
        assert_eq!(matches[0], 2);
        assert!(matches.contains(&1));
    }

    #[test]
    fn no_match_returns_empty() {
        let trie = TrieMatcher::new();
        assert!(trie.find_matches("anything").is_empty());
        assert!(!trie.matches("anything"));
    }

    #[test]
    fn find_exact_ignores_prefix_entries() {
        let mut trie = TrieMatcher::new();
        trie.add_prefix("sensors/", 1);
        assert!(trie.find_exact("sensors/").is_empty());
        assert!(trie.find_exact("sensors/temp").is_empty());
    }

    #[test]
    fn size_counts_distinct_patterns() {
        let mut trie = TrieMatcher::new();
        trie.add_exact("a", 1);
        trie.add_prefix("a", 2);
        assert_eq!(trie.size(), 2);
    }

    #[test]
    fn exact_supports_multiple_rules_on_the_same_address() {
        let mut trie = TrieMatcher::new();
        trie.add_exact("sensors/temp", 1);
        trie.add_exact("sensors/temp", 2);
        let hits = trie.find_exact("sensors/temp");
        assert_eq!(hits.len(), 2);
        assert!(hits.contains(&1) && hits.contains(&2));
    }
}
