//! Peer-group statistics and normalization primitives
//!
//! ## Table of Contents
//! - **IndustryStats**: Mean/std summary for one peer group
//! - **IndustryNormalizer**: Per-industry statistics with city-wide fallback
//! - **MinMax**: Min-max rescaler to [0, 100]
//! - **percentile**: Linear-interpolated percentile of a sample

use std::collections::HashMap;
use tracing::debug;

// Guards degenerate peer groups where every facility reports the same mass.
const STD_EPSILON: f64 = 1e-9;

/// Summary statistics for one peer group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndustryStats {
    /// Sample mean
    pub mean: f64,
    /// Sample standard deviation
    pub std_dev: f64,
    /// Number of facilities in the group
    pub count: usize,
    /// Whether these are city-wide fallback statistics
    pub fallback: bool,
}

impl IndustryStats {
    /// Z-score of a value against this group
    pub fn z_score(&self, value: f64) -> f64 {
        (value - self.mean) / (self.std_dev + STD_EPSILON)
    }
}

/// Per-industry statistics over the scored population
///
/// Groups smaller than the minimum peer count fall back to city-wide
/// statistics, so tiny industries are not normalized against themselves.
#[derive(Debug, Clone)]
pub struct IndustryNormalizer {
    by_industry: HashMap<String, IndustryStats>,
    citywide: IndustryStats,
}

impl IndustryNormalizer {
    /// Fit over `(industry, value)` pairs for the full scored population
    pub fn fit<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>, min_peer_group: usize) -> Self {
        let mut groups: HashMap<String, Vec<f64>> = HashMap::new();
        let mut all = Vec::new();
        for (industry, value) in pairs {
            groups.entry(industry.to_string()).or_default().push(value);
            all.push(value);
        }

        let citywide = IndustryStats {
            fallback: true,
            ..summarize(&all)
        };

        let mut by_industry = HashMap::new();
        for (industry, values) in groups {
            if values.len() < min_peer_group {
                debug!(
                    industry = %industry,
                    peers = values.len(),
                    "peer group below minimum, using city-wide statistics"
                );
                by_industry.insert(industry, citywide);
            } else {
                by_industry.insert(industry, summarize(&values));
            }
        }

        Self {
            by_industry,
            citywide,
        }
    }

    /// Statistics for an industry; unknown industries get city-wide stats
    pub fn stats_for(&self, industry: &str) -> IndustryStats {
        self.by_industry
            .get(industry)
            .copied()
            .unwrap_or(self.citywide)
    }

    /// Z-score of a value against its industry peers
    pub fn z_score(&self, industry: &str, value: f64) -> f64 {
        self.stats_for(industry).z_score(value)
    }

    /// City-wide statistics over the whole population
    pub fn citywide(&self) -> IndustryStats {
        self.citywide
    }
}

fn summarize(values: &[f64]) -> IndustryStats {
    if values.is_empty() {
        return IndustryStats {
            mean: 0.0,
            std_dev: 0.0,
            count: 0,
            fallback: false,
        };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    IndustryStats {
        mean,
        std_dev: variance.sqrt(),
        count: values.len(),
        fallback: false,
    }
}

/// Min-max rescaler mapping an observed range onto [0, 100]
#[derive(Debug, Clone, Copy)]
pub struct MinMax {
    min: f64,
    max: f64,
}

impl MinMax {
    /// Fit bounds over a sample; an empty sample yields a degenerate range
    pub fn fit(values: impl IntoIterator<Item = f64>) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            min = min.min(v);
            max = max.max(v);
        }
        if min > max {
            // Empty sample.
            min = 0.0;
            max = 0.0;
        }
        Self { min, max }
    }

    /// Rescale a value into [0, 100], clamping outside the fitted range
    ///
    /// A degenerate range (all inputs equal) maps everything to 0 so a
    /// uniform population carries no signal in that term.
    pub fn rescale(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / span * 100.0).clamp(0.0, 100.0)
    }
}

/// Percentile of a sample with linear interpolation between ranks
///
/// Returns 0.0 for an empty sample.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let q = q.clamp(0.0, 100.0);
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_mean_std() {
        let stats = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_small_group_uses_citywide_fallback() {
        let pairs = vec![
            ("smelting", 10.0),
            ("smelting", 12.0),
            ("smelting", 11.0),
            ("printing", 100.0), // single facility
        ];
        let normalizer = IndustryNormalizer::fit(pairs, 3);

        let printing = normalizer.stats_for("printing");
        assert!(printing.fallback);
        assert_eq!(printing.count, 4);

        let smelting = normalizer.stats_for("smelting");
        assert!(!smelting.fallback);
        assert_eq!(smelting.count, 3);
    }

    #[test]
    fn test_unknown_industry_uses_citywide() {
        let normalizer = IndustryNormalizer::fit(vec![("a", 1.0), ("a", 2.0), ("a", 3.0)], 3);
        assert!(normalizer.stats_for("never seen").fallback);
    }

    #[test]
    fn test_z_score_degenerate_std() {
        let normalizer =
            IndustryNormalizer::fit(vec![("a", 5.0), ("a", 5.0), ("a", 5.0)], 3);
        // All-equal peer group: z-score must stay finite.
        let z = normalizer.z_score("a", 5.0);
        assert!(z.is_finite());
        assert_eq!(z, 0.0);
    }

    #[test]
    fn test_minmax_rescale() {
        let mm = MinMax::fit([0.0, 5.0, 10.0]);
        assert_eq!(mm.rescale(0.0), 0.0);
        assert_eq!(mm.rescale(5.0), 50.0);
        assert_eq!(mm.rescale(10.0), 100.0);
        assert_eq!(mm.rescale(20.0), 100.0);
    }

    #[test]
    fn test_minmax_degenerate() {
        let mm = MinMax::fit([3.0, 3.0, 3.0]);
        assert_eq!(mm.rescale(3.0), 0.0);
    }

    #[test]
    fn test_percentile_interpolation() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 4.0);
        assert!((percentile(&values, 50.0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_empty() {
        assert_eq!(percentile(&[], 95.0), 0.0);
    }
}
