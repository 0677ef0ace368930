//! Deterministic isolation forest
//!
//! Isolation trees recursively split on a random feature at a random
//! cut point; anomalous points isolate in fewer splits, so shorter
//! average path lengths mean higher anomaly scores. All randomness comes
//! from a caller-supplied seed (per-tree rngs are derived as
//! `seed.wrapping_add(tree_index)`), so a fitted forest scores
//! identically across runs and platforms.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone)]
enum Node {
    Internal {
        feature: usize,
        split: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
    root: usize,
}

impl Tree {
    fn path_length(&self, point: &[f64]) -> f64 {
        let mut node = self.root;
        let mut depth = 0.0;
        loop {
            match &self.nodes[node] {
                Node::Leaf { size } => return depth + average_path(*size),
                Node::Internal {
                    feature,
                    split,
                    left,
                    right,
                } => {
                    node = if point[*feature] < *split { *left } else { *right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Average unsuccessful-search path length of a binary search tree with
/// `n` points; the standard normalization term for isolation forests
fn average_path(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        n => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// An ensemble of isolation trees fitted over a fixed population
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<Tree>,
    normalization: f64,
}

impl IsolationForest {
    /// Fit `n_trees` trees over `data`, each on a subsample of at most
    /// `max_samples` points drawn without replacement
    pub fn fit(data: &[Vec<f64>], n_trees: usize, max_samples: usize, seed: u64) -> Self {
        if data.is_empty() {
            return Self {
                trees: Vec::new(),
                normalization: 1.0,
            };
        }

        let sample_size = max_samples.max(2).min(data.len());
        let max_depth = (sample_size as f64).log2().ceil() as usize;

        let trees = (0..n_trees)
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                let indices: Vec<usize> = if sample_size == data.len() {
                    (0..data.len()).collect()
                } else {
                    rand::seq::index::sample(&mut rng, data.len(), sample_size).into_vec()
                };
                let mut nodes = Vec::new();
                let root = build_node(data, indices, 0, max_depth, &mut rng, &mut nodes);
                Tree { nodes, root }
            })
            .collect();

        Self {
            trees,
            normalization: average_path(sample_size).max(1.0),
        }
    }

    /// Anomaly score in (0, 1); higher means easier to isolate
    pub fn score(&self, point: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let mean_path: f64 = self
            .trees
            .iter()
            .map(|t| t.path_length(point))
            .sum::<f64>()
            / self.trees.len() as f64;
        2f64.powf(-mean_path / self.normalization)
    }
}

fn build_node(
    data: &[Vec<f64>],
    indices: Vec<usize>,
    depth: usize,
    max_depth: usize,
    rng: &mut StdRng,
    nodes: &mut Vec<Node>,
) -> usize {
    if indices.len() <= 1 || depth >= max_depth {
        nodes.push(Node::Leaf {
            size: indices.len(),
        });
        return nodes.len() - 1;
    }

    let dims = data[indices[0]].len();
    let splittable: Vec<(usize, f64, f64)> = (0..dims)
        .filter_map(|feature| {
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for &i in &indices {
                min = min.min(data[i][feature]);
                max = max.max(data[i][feature]);
            }
            (max > min).then_some((feature, min, max))
        })
        .collect();

    if splittable.is_empty() {
        nodes.push(Node::Leaf {
            size: indices.len(),
        });
        return nodes.len() - 1;
    }

    let (feature, min, max) = splittable[rng.gen_range(0..splittable.len())];
    let split = rng.gen_range(min..max);

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
        indices.into_iter().partition(|&i| data[i][feature] < split);

    let left = build_node(data, left_idx, depth + 1, max_depth, rng, nodes);
    let right = build_node(data, right_idx, depth + 1, max_depth, rng, nodes);
    nodes.push(Node::Internal {
        feature,
        split,
        left,
        right,
    });
    nodes.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_with_outlier() -> Vec<Vec<f64>> {
        let mut data: Vec<Vec<f64>> = (0..60)
            .map(|i| {
                let x = (i % 10) as f64 * 0.1;
                let y = (i / 10) as f64 * 0.1;
                vec![x, y]
            })
            .collect();
        data.push(vec![10.0, 10.0]);
        data
    }

    #[test]
    fn test_outlier_scores_higher() {
        let data = cluster_with_outlier();
        let forest = IsolationForest::fit(&data, 100, 64, 42);

        let outlier_score = forest.score(&data[data.len() - 1]);
        let inlier_score = forest.score(&data[5]);
        assert!(
            outlier_score > inlier_score,
            "outlier {outlier_score} vs inlier {inlier_score}"
        );
    }

    #[test]
    fn test_deterministic_with_seed() {
        let data = cluster_with_outlier();
        let a = IsolationForest::fit(&data, 50, 64, 42);
        let b = IsolationForest::fit(&data, 50, 64, 42);
        for point in &data {
            assert_eq!(a.score(point), b.score(point));
        }
    }

    #[test]
    fn test_constant_data_neutral() {
        let data = vec![vec![1.0, 1.0]; 30];
        let forest = IsolationForest::fit(&data, 50, 16, 42);
        let score = forest.score(&[1.0, 1.0]);
        assert!((score - 0.5).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn test_empty_population() {
        let forest = IsolationForest::fit(&[], 50, 64, 42);
        assert_eq!(forest.score(&[0.0]), 0.5);
    }

    #[test]
    fn test_scores_in_unit_interval() {
        let data = cluster_with_outlier();
        let forest = IsolationForest::fit(&data, 100, 64, 7);
        for point in &data {
            let s = forest.score(point);
            assert!((0.0..=1.0).contains(&s), "score out of range: {s}");
        }
    }
}
