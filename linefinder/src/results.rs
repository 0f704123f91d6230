use serde::Serialize;
use std::collections::btree_set;
use std::collections::BTreeSet;

/// Byte position of the first byte of a line; the identity of a line
pub type LineOffset = u64;

/// Offsets surrounding one matching line, the match included
pub type MatchContext = BTreeSet<LineOffset>;

/// Unique line offsets in ascending file order.
///
/// Since offsets grow with position in the file, iterating the set yields
/// lines in the order they appear in the document, and merging two sets can
/// never produce the same line twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    offsets: BTreeSet<LineOffset>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, offset: LineOffset) -> bool {
        self.offsets.insert(offset)
    }

    /// Adds every offset of a match context
    pub fn add_context(&mut self, context: MatchContext) {
        self.merge(ResultSet { offsets: context });
    }

    /// Unions another set into this one
    pub fn merge(&mut self, mut other: ResultSet) {
        if other.offsets.len() > self.offsets.len() {
            std::mem::swap(&mut self.offsets, &mut other.offsets);
        }
        self.offsets.append(&mut other.offsets);
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn contains(&self, offset: LineOffset) -> bool {
        self.offsets.contains(&offset)
    }

    /// Iterates offsets in ascending order
    pub fn iter(&self) -> btree_set::Iter<'_, LineOffset> {
        self.offsets.iter()
    }

    pub fn to_vec(&self) -> Vec<LineOffset> {
        self.offsets.iter().copied().collect()
    }
}

impl FromIterator<LineOffset> for ResultSet {
    fn from_iter<I: IntoIterator<Item = LineOffset>>(iter: I) -> Self {
        Self {
            offsets: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a LineOffset;
    type IntoIter = btree_set::Iter<'a, LineOffset>;

    fn into_iter(self) -> Self::IntoIter {
        self.offsets.iter()
    }
}

/// What a completed `find` run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FindSummary {
    /// The keyword searched for; empty when the run wrote the placeholder
    pub keyword: String,
    pub context_size: u32,
    pub ranges_planned: usize,
    pub workers: usize,
    pub lines_scanned: u64,
    pub matches_found: u64,
    pub offsets_collected: usize,
    pub lines_written: usize,
    pub elapsed_ms: u64,
}

impl FindSummary {
    /// Summary of a run that skipped scanning because no keyword was given
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn is_placeholder(&self) -> bool {
        self.keyword.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_deduplicates_and_orders() {
        let mut left: ResultSet = [40, 0, 12].into_iter().collect();
        let right: ResultSet = [12, 25, 90, 0].into_iter().collect();
        left.merge(right);
        assert_eq!(left.to_vec(), vec![0, 12, 25, 40, 90]);
    }

    #[test]
    fn test_merge_into_empty() {
        let mut set = ResultSet::new();
        set.merge([3, 1, 2].into_iter().collect());
        assert_eq!(set.to_vec(), vec![1, 2, 3]);
        assert!(set.contains(2));
        assert!(!set.contains(4));
    }

    #[test]
    fn test_overlapping_contexts() {
        let mut set = ResultSet::new();
        set.add_context([10, 20, 30].into_iter().collect());
        set.add_context([20, 30, 40].into_iter().collect());
        assert_eq!(set.len(), 4);
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_placeholder_summary() {
        assert!(FindSummary::placeholder().is_placeholder());
        let summary = FindSummary {
            keyword: "target".to_string(),
            ..FindSummary::default()
        };
        assert!(!summary.is_placeholder());
    }
}
