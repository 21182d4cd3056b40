//! Element counters for `[[a.b.c]]` array-of-tables headers.

use std::collections::HashMap;

/// Counts how many `[[...]]` headers have been seen per root name and depth.
///
/// Counters are keyed by the first path segment and the depth of the header.
/// Opening a header at depth `d` increments counter `d` and resets every
/// deeper counter, so a new outer element starts its inner arrays afresh.
///
/// # Examples
///
/// ```
/// use hyconf::tables::TableIndexer;
///
/// let mut indexer = TableIndexer::default();
/// assert_eq!(indexer.advance(&["fruit"]), vec![1]);
/// assert_eq!(indexer.advance(&["fruit", "variety"]), vec![1, 1]);
/// assert_eq!(indexer.advance(&["fruit", "variety"]), vec![1, 2]);
/// assert_eq!(indexer.advance(&["fruit"]), vec![2, 0]);
/// assert_eq!(indexer.advance(&["fruit", "variety"]), vec![2, 1]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct TableIndexer {
    counters: HashMap<String, Vec<usize>>,
}

impl TableIndexer {
    /// Registers a header for `path` and returns the counters of its root.
    pub fn advance<S: AsRef<str>>(&mut self, path: &[S]) -> Vec<usize> {
        let Some(root) = path.first() else {
            return Vec::new();
        };
        let depth = path.len() - 1;
        let counters = self.counters.entry(root.as_ref().to_string()).or_default();

        if counters.len() <= depth {
            counters.resize(depth + 1, 0);
        }
        for deeper in counters.iter_mut().skip(depth + 1) {
            *deeper = 0;
        }
        counters[depth] += 1;

        counters.clone()
    }

    /// Counters of `root` rendered as `1.2.0`, for logging.
    pub fn dotted(&self, root: &str) -> Option<String> {
        self.counters.get(root).map(|counters| {
            counters
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(".")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roots_count_independently() {
        let mut indexer = TableIndexer::default();
        indexer.advance(&["a"]);
        indexer.advance(&["a"]);
        assert_eq!(indexer.advance(&["b"]), vec![1]);
        assert_eq!(indexer.dotted("a").as_deref(), Some("2"));
    }

    #[test]
    fn deeper_header_first_starts_outer_at_zero() {
        let mut indexer = TableIndexer::default();
        assert_eq!(indexer.advance(&["a", "b"]), vec![0, 1]);
        assert_eq!(indexer.dotted("a").as_deref(), Some("0.1"));
    }
}
