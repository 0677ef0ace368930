//! Majority-vote anomaly ensemble
//!
//! ## Table of Contents
//! - **EnsembleObservation**: One facility's feature input to the ensemble
//! - **EnsembleModel**: Immutable fitted state produced by `fit`
//! - **AnomalyVerdict**: Vote outcome for one facility
//!
//! Four independent detectors vote on every facility: a global
//! isolation-forest outlier pass, an industry-relative pass over each
//! peer group, an extreme-risk percentile rule, and a
//! carcinogen-plus-proximity rule. Any single method either over-flags
//! (global outliers on a heterogeneous population) or under-flags
//! (fixed thresholds miss multi-factor anomalies); requiring agreement
//! between at least two orthogonal signals keeps false positives down
//! while still catching what only one framing would reveal.
//!
//! Fitting requires the full population's feature vectors, so the model
//! is an explicit value: `fit` consumes the population once, `classify`
//! is a pure function of the fitted model and one observation.

pub mod forest;

use crate::config::PipelineConfig;
use crate::scorer::RawFeatures;
use crate::stats::percentile;
use crate::types::DetectorKind;
use self::forest::IsolationForest;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Trees in the global isolation forest
const GLOBAL_TREES: usize = 200;
/// Subsample size per global tree
const GLOBAL_SUBSAMPLE: usize = 256;
/// Trees in each industry peer-group forest
const INDUSTRY_TREES: usize = 100;

const FEATURE_COUNT: usize = 7;
const STD_EPSILON: f64 = 1e-9;

/// One facility's input to the ensemble
#[derive(Debug, Clone)]
pub struct EnsembleObservation {
    /// Industry classification used for peer grouping
    pub industry: String,
    /// Raw features from the scoring pass
    pub features: RawFeatures,
    /// Final composite risk score
    pub risk_score: f64,
}

/// Vote outcome for one facility
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyVerdict {
    /// True when at least 2 of the 4 detectors vote yes
    pub anomaly: bool,
    /// Agreement as a percentage: 100 x votes / 4
    pub confidence: f64,
    /// Detectors that voted yes, in stable order
    pub votes: Vec<DetectorKind>,
}

impl AnomalyVerdict {
    fn from_votes(votes: Vec<DetectorKind>) -> Self {
        Self {
            anomaly: votes.len() >= 2,
            confidence: votes.len() as f64 / 4.0 * 100.0,
            votes,
        }
    }
}

struct Scaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl Scaler {
    fn fit(vectors: &[Vec<f64>]) -> Self {
        let n = vectors.len().max(1) as f64;
        let mut means = vec![0.0; FEATURE_COUNT];
        for v in vectors {
            for (m, x) in means.iter_mut().zip(v) {
                *m += x / n;
            }
        }
        let mut stds = vec![0.0; FEATURE_COUNT];
        for v in vectors {
            for ((s, m), x) in stds.iter_mut().zip(&means).zip(v) {
                *s += (x - m).powi(2) / n;
            }
        }
        for s in &mut stds {
            *s = s.sqrt();
        }
        Self { means, stds }
    }

    fn transform(&self, vector: &[f64]) -> Vec<f64> {
        vector
            .iter()
            .zip(&self.means)
            .zip(&self.stds)
            .map(|((x, m), s)| (x - m) / (s + STD_EPSILON))
            .collect()
    }
}

fn feature_vector(features: &RawFeatures, risk_score: f64) -> Vec<f64> {
    vec![
        risk_score,
        features.toxicity_weighted_exposure.ln_1p(),
        features.total_release_kg.ln_1p(),
        features.max_toxicity,
        features.carcinogen_count as f64,
        features.heavy_metal_mass_kg.ln_1p(),
        features.industry_z_release,
    ]
}

/// Score threshold flagging roughly the `contamination` most extreme
/// fraction; `INFINITY` when the population is too small to flag anyone
fn contamination_threshold(scores: &[f64], contamination: f64) -> f64 {
    let k = (contamination * scores.len() as f64).round() as usize;
    if k == 0 {
        return f64::INFINITY;
    }
    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    if sorted[0] == sorted[sorted.len() - 1] {
        // No spread at all: nothing is more extreme than anything else.
        return f64::INFINITY;
    }
    sorted[k.min(sorted.len()) - 1]
}

/// Immutable fitted ensemble state
///
/// Produced by [`EnsembleModel::fit`] after all risk scores exist; the
/// two-phase barrier between scoring and classification is explicit in
/// this type.
pub struct EnsembleModel {
    scaler: Scaler,
    global: IsolationForest,
    global_threshold: f64,
    /// City-wide threshold at the industry contamination rate, used for
    /// facilities whose peer group was too small for its own forest
    fallback_threshold: f64,
    industry: HashMap<String, (IsolationForest, f64)>,
    risk_cutoff: f64,
    carcinogen_count_threshold: u32,
    combo_proximity_threshold: f64,
}

impl EnsembleModel {
    /// Fit the ensemble over the full scored population
    pub fn fit(population: &[EnsembleObservation], config: &PipelineConfig) -> Self {
        let vectors: Vec<Vec<f64>> = population
            .iter()
            .map(|o| feature_vector(&o.features, o.risk_score))
            .collect();
        let scaler = Scaler::fit(&vectors);
        let scaled: Vec<Vec<f64>> = vectors.iter().map(|v| scaler.transform(v)).collect();

        let global = IsolationForest::fit(&scaled, GLOBAL_TREES, GLOBAL_SUBSAMPLE, config.seed);
        let global_scores: Vec<f64> = scaled.iter().map(|v| global.score(v)).collect();
        let global_threshold =
            contamination_threshold(&global_scores, config.global_contamination);
        let fallback_threshold =
            contamination_threshold(&global_scores, config.industry_contamination);

        // Deterministic iteration order also fixes per-industry seeds.
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, obs) in population.iter().enumerate() {
            groups.entry(obs.industry.as_str()).or_default().push(i);
        }

        let mut industry = HashMap::new();
        for (group_index, (name, members)) in groups.iter().enumerate() {
            if members.len() < config.min_peer_group {
                debug!(
                    industry = %name,
                    peers = members.len(),
                    "peer group below minimum, industry detector uses city-wide fallback"
                );
                continue;
            }
            let group_vectors: Vec<Vec<f64>> =
                members.iter().map(|&i| scaled[i].clone()).collect();
            let seed = config.seed.wrapping_add(101 + group_index as u64);
            let subsample = group_vectors.len().min(GLOBAL_SUBSAMPLE);
            let forest = IsolationForest::fit(&group_vectors, INDUSTRY_TREES, subsample, seed);
            let scores: Vec<f64> = group_vectors.iter().map(|v| forest.score(v)).collect();
            let threshold = contamination_threshold(&scores, config.industry_contamination);
            industry.insert(name.to_string(), (forest, threshold));
        }

        let risks: Vec<f64> = population.iter().map(|o| o.risk_score).collect();
        let risk_cutoff = percentile(&risks, config.extreme_risk_percentile);

        Self {
            scaler,
            global,
            global_threshold,
            fallback_threshold,
            industry,
            risk_cutoff,
            carcinogen_count_threshold: config.carcinogen_count_threshold,
            combo_proximity_threshold: config.combo_proximity_threshold,
        }
    }

    /// Classify one observation against the fitted model
    pub fn classify(&self, observation: &EnsembleObservation) -> AnomalyVerdict {
        let features = &observation.features;
        let scaled = self
            .scaler
            .transform(&feature_vector(features, observation.risk_score));
        let has_release = features.total_release_kg > 0.0;

        let mut votes = Vec::new();

        if self.global.score(&scaled) >= self.global_threshold {
            votes.push(DetectorKind::GlobalOutlier);
        }

        let industry_hit = match self.industry.get(&observation.industry) {
            Some((forest, threshold)) => forest.score(&scaled) >= *threshold,
            None => self.global.score(&scaled) >= self.fallback_threshold,
        };
        if industry_hit {
            votes.push(DetectorKind::IndustryOutlier);
        }

        // Zero-release facilities never trip the rule-based detectors.
        if has_release && observation.risk_score >= self.risk_cutoff {
            votes.push(DetectorKind::ExtremeRisk);
        }
        if has_release
            && features.carcinogen_count >= self.carcinogen_count_threshold
            && features.proximity_multiplier >= self.combo_proximity_threshold
        {
            votes.push(DetectorKind::CarcinogenProximity);
        }

        AnomalyVerdict::from_votes(votes)
    }

    /// Risk score at the configured extreme-risk percentile
    pub fn risk_cutoff(&self) -> f64 {
        self.risk_cutoff
    }
}
