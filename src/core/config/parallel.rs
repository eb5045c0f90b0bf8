//! Parallel processing configuration for the per-glyph stages.

use serde::{Deserialize, Serialize};

/// Controls how normalization and tracing fan out across glyph records.
///
/// Slot assignment is sequential; only the per-glyph stages after it are parallel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelPolicy {
    /// Maximum number of threads to use for parallel processing.
    /// If None, rayon's global pool is used (typically one thread per CPU core).
    #[serde(default)]
    pub max_threads: Option<usize>,

    /// Number of glyph records processed sequentially (<= this uses sequential).
    /// Default: 4
    #[serde(default = "ParallelPolicy::default_glyph_threshold")]
    pub glyph_threshold: usize,
}

impl ParallelPolicy {
    /// Create a new ParallelPolicy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of threads.
    pub fn with_max_threads(mut self, max_threads: Option<usize>) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Whether `count` records should be processed in parallel.
    pub fn should_parallelize(&self, count: usize) -> bool {
        count > self.glyph_threshold && self.max_threads != Some(1)
    }

    fn default_glyph_threshold() -> usize {
        4
    }
}

impl Default for ParallelPolicy {
    fn default() -> Self {
        Self {
            max_threads: None,
            glyph_threshold: Self::default_glyph_threshold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parallelize() {
        let policy = ParallelPolicy::new();
        assert!(!policy.should_parallelize(4));
        assert!(policy.should_parallelize(5));

        let single = ParallelPolicy::new().with_max_threads(Some(1));
        assert!(!single.should_parallelize(100));
    }

    #[test]
    fn test_serde_defaults() {
        let policy: ParallelPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy.glyph_threshold, 4);
        assert!(policy.max_threads.is_none());
    }
}
