//! Similarity clustering over document embeddings.
//!
//! Builds a dense pairwise cosine matrix (rows computed in parallel) and
//! groups documents whose similarity clears a threshold, transitively, with
//! an array-backed union-find.
//!
//! Sub-modules:
//! - [`union_find`] — disjoint-set forest used for transitive grouping

pub mod union_find;

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use tracing::debug;

use stylograph_core::{
    Cluster, ClusterConfig, FeatureVector, Result, SimilarityMatrix, StylographError,
    SCHEMA_VERSION,
};

use crate::vector::{dot, normalize};
use union_find::UnionFind;

/// Deterministic threshold clustering over cosine similarities.
pub struct ClusterEngine {
    config: ClusterConfig,
}

impl ClusterEngine {
    pub fn new() -> Self {
        Self::with_config(ClusterConfig::default())
    }

    pub fn with_config(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Pairwise cosine similarity over all embeddings.
    ///
    /// Embeddings are unit-normalized once, then each row of dot products is
    /// computed in parallel; identical summation order for (i, j) and (j, i)
    /// keeps the matrix exactly symmetric. The diagonal is forced to 1.0.
    /// Zero vectors stay zero and score 0.0 against everything off-diagonal.
    pub fn build_similarity_matrix(
        &self,
        embeddings: &[FeatureVector],
    ) -> Result<SimilarityMatrix> {
        if embeddings.is_empty() {
            return Err(StylographError::InsufficientInput("no embeddings"));
        }
        let dim = embeddings[0].len();
        for e in embeddings {
            if e.len() != dim {
                return Err(StylographError::DimensionMismatch {
                    expected: dim,
                    actual: e.len(),
                });
            }
        }

        let units: Vec<FeatureVector> = embeddings.iter().map(|e| normalize(e)).collect();

        let mut values: Vec<Vec<f64>> = units
            .par_iter()
            .map(|row| {
                units
                    .iter()
                    .map(|col| dot(row, col).clamp(-1.0, 1.0))
                    .collect()
            })
            .collect();

        for (i, row) in values.iter_mut().enumerate() {
            row[i] = 1.0;
        }

        debug!(documents = embeddings.len(), dim, "similarity matrix built");

        Ok(SimilarityMatrix {
            schema_version: SCHEMA_VERSION,
            values,
        })
    }

    /// Group documents transitively at the configured threshold.
    pub fn cluster(&self, matrix: &SimilarityMatrix) -> Vec<Cluster> {
        self.cluster_at(matrix, self.config.similarity_threshold)
    }

    /// Group documents transitively at an explicit threshold.
    ///
    /// Every pair at or above the threshold is unioned, so chains merge even
    /// when their endpoints are dissimilar. Cluster ids are the smallest
    /// member index and output is sorted by id, so identical inputs produce
    /// identical results. Ids are not stable across input permutations.
    pub fn cluster_at(&self, matrix: &SimilarityMatrix, threshold: f64) -> Vec<Cluster> {
        let n = matrix.len();
        let mut dsu = UnionFind::new(n);

        for i in 0..n {
            for j in (i + 1)..n {
                if matrix.values[i][j] >= threshold {
                    dsu.union(i, j);
                }
            }
        }

        let mut groups: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        for i in 0..n {
            let root = dsu.find(i);
            groups.entry(root).or_default().insert(i);
        }

        let mut clusters: Vec<Cluster> = groups
            .into_values()
            .filter_map(|members| {
                let cluster_id = *members.first()?;
                let avg_similarity = avg_pairwise_similarity(matrix, &members);
                Some(Cluster {
                    cluster_id,
                    member_indices: members,
                    avg_similarity,
                })
            })
            .collect();
        clusters.sort_by_key(|c| c.cluster_id);

        debug!(documents = n, clusters = clusters.len(), threshold, "clustering complete");

        clusters
    }
}

impl Default for ClusterEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Mean pairwise similarity among cluster members; 1.0 for singletons.
fn avg_pairwise_similarity(matrix: &SimilarityMatrix, members: &BTreeSet<usize>) -> f64 {
    if members.len() < 2 {
        return 1.0;
    }
    let idx: Vec<usize> = members.iter().copied().collect();
    let mut sum = 0.0;
    let mut pairs = 0usize;
    for (a, &i) in idx.iter().enumerate() {
        for &j in &idx[a + 1..] {
            sum += matrix.values[i][j];
            pairs += 1;
        }
    }
    sum / pairs as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix_from(values: Vec<Vec<f64>>) -> SimilarityMatrix {
        SimilarityMatrix {
            schema_version: SCHEMA_VERSION,
            values,
        }
    }

    #[test]
    fn diagonal_is_exactly_one() {
        let engine = ClusterEngine::new();
        let matrix = engine
            .build_similarity_matrix(&[
                vec![1.0, 2.0, 3.0],
                vec![0.1, 0.2, 0.3],
                vec![-5.0, 0.0, 2.5],
            ])
            .unwrap();
        for i in 0..3 {
            assert_eq!(matrix.get(i, i), 1.0);
        }
    }

    #[test]
    fn matrix_is_symmetric() {
        let engine = ClusterEngine::new();
        let matrix = engine
            .build_similarity_matrix(&[
                vec![1.0, 0.5, -2.0],
                vec![3.0, 1.0, 0.0],
                vec![0.2, -0.4, 1.1],
                vec![2.2, 2.2, 2.2],
            ])
            .unwrap();
        for i in 0..4 {
            for j in 0..4 {
                assert!(
                    (matrix.get(i, j) - matrix.get(j, i)).abs() < 1e-12,
                    "asymmetry at ({i}, {j})"
                );
            }
        }
    }

    #[test]
    fn parallel_vectors_score_one() {
        let engine = ClusterEngine::new();
        let matrix = engine
            .build_similarity_matrix(&[vec![1.0, 2.0], vec![2.0, 4.0]])
            .unwrap();
        assert!((matrix.get(0, 1) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_vector_scores_zero_off_diagonal() {
        let engine = ClusterEngine::new();
        let matrix = engine
            .build_similarity_matrix(&[vec![0.0, 0.0], vec![1.0, 0.0]])
            .unwrap();
        assert_eq!(matrix.get(0, 1), 0.0);
        assert_eq!(matrix.get(1, 0), 0.0);
        assert_eq!(matrix.get(0, 0), 1.0);
    }

    #[test]
    fn empty_embeddings_rejected() {
        let engine = ClusterEngine::new();
        let err = engine.build_similarity_matrix(&[]).unwrap_err();
        assert!(matches!(err, StylographError::InsufficientInput(_)));
    }

    #[test]
    fn ragged_dimensions_rejected() {
        let engine = ClusterEngine::new();
        let err = engine
            .build_similarity_matrix(&[vec![1.0, 2.0], vec![1.0, 2.0, 3.0]])
            .unwrap_err();
        match err {
            StylographError::DimensionMismatch { expected, actual } => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("wrong error: {other:?}"),
        }
    }

    #[test]
    fn chain_merges_into_one_cluster() {
        // A-B and B-C clear the threshold, A-C does not; transitivity
        // still puts all three together.
        let engine = ClusterEngine::new();
        let matrix = matrix_from(vec![
            vec![1.0, 0.9, 0.3],
            vec![0.9, 1.0, 0.9],
            vec![0.3, 0.9, 1.0],
        ]);

        let clusters = engine.cluster_at(&matrix, 0.85);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].cluster_id, 0);
        assert_eq!(clusters[0].len(), 3);
        // (0.9 + 0.9 + 0.3) / 3
        assert!((clusters[0].avg_similarity - 0.7).abs() < 1e-9);
    }

    #[test]
    fn dissimilar_documents_stay_singletons() {
        let engine = ClusterEngine::new();
        let matrix = matrix_from(vec![
            vec![1.0, 0.2, 0.1],
            vec![0.2, 1.0, 0.0],
            vec![0.1, 0.0, 1.0],
        ]);

        let clusters = engine.cluster_at(&matrix, 0.85);
        assert_eq!(clusters.len(), 3);
        for (i, c) in clusters.iter().enumerate() {
            assert_eq!(c.cluster_id, i);
            assert_eq!(c.len(), 1);
            assert_eq!(c.avg_similarity, 1.0);
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        let engine = ClusterEngine::new();
        let matrix = matrix_from(vec![vec![1.0, 0.85], vec![0.85, 1.0]]);
        let clusters = engine.cluster_at(&matrix, 0.85);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 2);
    }

    #[test]
    fn cluster_ids_are_smallest_member_and_sorted() {
        // Pairs (0, 3) and (1, 2).
        let engine = ClusterEngine::new();
        let matrix = matrix_from(vec![
            vec![1.0, 0.0, 0.0, 0.9],
            vec![0.0, 1.0, 0.9, 0.0],
            vec![0.0, 0.9, 1.0, 0.0],
            vec![0.9, 0.0, 0.0, 1.0],
        ]);

        let clusters = engine.cluster_at(&matrix, 0.85);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].cluster_id, 0);
        assert!(clusters[0].contains(0) && clusters[0].contains(3));
        assert_eq!(clusters[1].cluster_id, 1);
        assert!(clusters[1].contains(1) && clusters[1].contains(2));
    }

    #[test]
    fn end_to_end_near_duplicates_cluster() {
        let engine = ClusterEngine::new();
        let embeddings = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.99, 0.01, 0.0],
            vec![0.0, 1.0, 0.0],
        ];
        let matrix = engine.build_similarity_matrix(&embeddings).unwrap();
        let clusters = engine.cluster(&matrix);

        assert_eq!(clusters.len(), 2);
        assert!(clusters[0].contains(0) && clusters[0].contains(1));
        assert!(clusters[1].contains(2));
        assert!(clusters[0].avg_similarity > 0.99);
    }
}
