//! Pipeline configuration
//!
//! ## Table of Contents
//! - **ScoreWeights**: Weights of the composite risk terms
//! - **PipelineConfig**: Complete configuration with documented defaults

use crate::error::{PipelineError, Result};
use crate::proximity::default_receptors;
use crate::types::SensitiveReceptor;
use serde::{Deserialize, Serialize};

/// Weights of the four composite risk terms; must sum to 1.0
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Toxicity-weighted exposure term
    pub toxicity_exposure: f64,
    /// Industry-normalized release volume term
    pub release_volume: f64,
    /// Maximum single-chemical toxicity term
    pub max_toxicity: f64,
    /// Heavy-metal mass term
    pub heavy_metal: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            toxicity_exposure: 0.40,
            release_volume: 0.25,
            max_toxicity: 0.20,
            heavy_metal: 0.15,
        }
    }
}

impl ScoreWeights {
    fn sum(&self) -> f64 {
        self.toxicity_exposure + self.release_volume + self.max_toxicity + self.heavy_metal
    }
}

/// Complete pipeline configuration
///
/// Defaults match the documented model: 6% global and 15% industry
/// contamination, seed 42, proximity influence fading out at 5 km with a
/// 2.0x multiplier ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Seed pinning all randomized detectors for reproducible runs
    pub seed: u64,
    /// Fraction of the full population the global outlier detector flags
    pub global_contamination: f64,
    /// Fraction flagged within each industry peer group
    pub industry_contamination: f64,
    /// Minimum peer-group size before falling back to city-wide statistics
    pub min_peer_group: usize,
    /// Additive cap on summed proximity contributions (multiplier ceiling = 1 + cap)
    pub proximity_cap: f64,
    /// Radius within which a receptor contributes its full weight (km)
    pub full_weight_radius_km: f64,
    /// Radius beyond which a receptor contributes nothing (km)
    pub max_influence_radius_km: f64,
    /// Percentile of the risk distribution the extreme-risk detector flags at
    pub extreme_risk_percentile: f64,
    /// Carcinogen count at which the risk bonus and combo detector trigger
    pub carcinogen_count_threshold: u32,
    /// Multiplier applied to facilities at or above the carcinogen threshold
    pub carcinogen_bonus: f64,
    /// Proximity multiplier the carcinogen combo detector requires
    pub combo_proximity_threshold: f64,
    /// Composite score weights
    pub weights: ScoreWeights,
    /// Sensitive receptor locations used by the proximity engine
    pub receptors: Vec<SensitiveReceptor>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            global_contamination: 0.06,
            industry_contamination: 0.15,
            min_peer_group: 3,
            proximity_cap: 1.0,
            full_weight_radius_km: 1.0,
            max_influence_radius_km: 5.0,
            extreme_risk_percentile: 95.0,
            carcinogen_count_threshold: 2,
            carcinogen_bonus: 1.15,
            combo_proximity_threshold: 1.3,
            weights: ScoreWeights::default(),
            receptors: default_receptors(),
        }
    }
}

impl PipelineConfig {
    /// Create a config with documented defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the detector seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the global contamination rate
    pub fn with_global_contamination(mut self, rate: f64) -> Self {
        self.global_contamination = rate;
        self
    }

    /// Set the industry contamination rate
    pub fn with_industry_contamination(mut self, rate: f64) -> Self {
        self.industry_contamination = rate;
        self
    }

    /// Set the minimum peer-group size
    pub fn with_min_peer_group(mut self, size: usize) -> Self {
        self.min_peer_group = size;
        self
    }

    /// Replace the sensitive receptor set
    pub fn with_receptors(mut self, receptors: Vec<SensitiveReceptor>) -> Self {
        self.receptors = receptors;
        self
    }

    /// Set the composite score weights
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..0.5).contains(&self.global_contamination)
            || !(0.0..0.5).contains(&self.industry_contamination)
        {
            return Err(PipelineError::config(
                "contamination rates must be within [0, 0.5)",
            ));
        }
        if self.full_weight_radius_km <= 0.0
            || self.max_influence_radius_km <= self.full_weight_radius_km
        {
            return Err(PipelineError::config(
                "max_influence_radius_km must exceed full_weight_radius_km",
            ));
        }
        if self.proximity_cap <= 0.0 {
            return Err(PipelineError::config("proximity_cap must be positive"));
        }
        if !(0.0..=100.0).contains(&self.extreme_risk_percentile) {
            return Err(PipelineError::config(
                "extreme_risk_percentile must be within [0, 100]",
            ));
        }
        if self.carcinogen_bonus < 1.0 {
            return Err(PipelineError::config("carcinogen_bonus cannot reduce risk"));
        }
        if (self.weights.sum() - 1.0).abs() > 1e-9 {
            return Err(PipelineError::config("score weights must sum to 1.0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bad_contamination_rejected() {
        let config = PipelineConfig::default().with_global_contamination(0.9);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_weights_rejected() {
        let config = PipelineConfig::default().with_weights(ScoreWeights {
            toxicity_exposure: 0.5,
            release_volume: 0.5,
            max_toxicity: 0.5,
            heavy_metal: 0.5,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder_chain() {
        let config = PipelineConfig::new()
            .with_seed(7)
            .with_min_peer_group(5)
            .with_industry_contamination(0.2);
        assert_eq!(config.seed, 7);
        assert_eq!(config.min_peer_group, 5);
        assert!(config.validate().is_ok());
    }
}
