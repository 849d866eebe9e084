use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::SCHEMA_VERSION;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Dense pairwise cosine-similarity matrix over a document batch.
///
/// Square and symmetric, entries in [-1, 1], diagonal exactly 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Row-major; `values[i][j]` is the cosine of documents i and j.
    pub values: Vec<Vec<f64>>,
}

impl SimilarityMatrix {
    /// Number of documents covered.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }
}

/// A group of transitively similar documents.
///
/// Fresh output of each clustering call; nothing here is persisted by the
/// engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Smallest member index. Stable for identical inputs, not across
    /// input permutations.
    pub cluster_id: usize,
    pub member_indices: BTreeSet<usize>,
    /// Mean pairwise similarity among members; 1.0 for singletons.
    pub avg_similarity: f64,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.member_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.member_indices.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.member_indices.contains(&index)
    }
}
