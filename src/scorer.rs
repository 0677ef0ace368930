//! Multi-factor weighted-sum risk scorer
//!
//! ## Table of Contents
//! - **RawFeatures**: Per-facility inputs to the composite model
//! - **PopulationNorms**: Min-max bounds fitted over the scored population
//! - **composite_score**: The weighted composite with proximity and carcinogen adjustments
//!
//! Scoring is two-phase: population norms are fitted over every scorable
//! facility first, then each facility is scored independently against
//! those norms. Mass-like inputs are log-transformed before min-max
//! rescaling so a single giant emitter does not flatten the rest of the
//! population onto zero.

use crate::config::PipelineConfig;
use crate::proximity::ProximityEngine;
use crate::stats::{IndustryNormalizer, MinMax};
use crate::toxicity::{canonicalize, ToxicityTable};
use crate::types::Facility;
use std::collections::BTreeSet;

/// Per-facility feature values consumed by the composite model and the
/// anomaly ensemble
#[derive(Debug, Clone)]
pub struct RawFeatures {
    /// Total release mass across all pathways
    pub total_release_kg: f64,
    /// Sum of amount x pathway weight x toxicity weight
    pub toxicity_weighted_exposure: f64,
    /// Highest toxicity weight among reported chemicals
    pub max_toxicity: f64,
    /// Total heavy-metal mass
    pub heavy_metal_mass_kg: f64,
    /// Number of distinct carcinogenic chemicals reported
    pub carcinogen_count: u32,
    /// Receptor proximity multiplier
    pub proximity_multiplier: f64,
    /// Log release volume z-scored against industry peers
    pub industry_z_release: f64,
}

/// Compute raw features for one facility
///
/// Returns `None` when the facility has no coordinates, since proximity
/// cannot be computed and the facility is excluded from scoring.
pub fn extract_features(
    facility: &Facility,
    table: &ToxicityTable,
    engine: &ProximityEngine,
    normalizer: &IndustryNormalizer,
) -> Option<RawFeatures> {
    let (lat, lon) = facility.coordinates()?;

    let mut toxicity_weighted_exposure = 0.0;
    let mut max_toxicity: f64 = 0.0;
    let mut heavy_metal_mass_kg = 0.0;
    let mut carcinogens = BTreeSet::new();

    for release in &facility.releases {
        let entry = table.lookup(&release.chemical_name);
        toxicity_weighted_exposure +=
            release.amount_kg * release.pathway.exposure_weight() * entry.toxicity_weight;
        max_toxicity = max_toxicity.max(entry.toxicity_weight);
        if entry.is_heavy_metal {
            heavy_metal_mass_kg += release.amount_kg;
        }
        if entry.is_carcinogen {
            carcinogens.insert(canonicalize(&release.chemical_name));
        }
    }

    let total_release_kg = facility.total_release_kg();
    Some(RawFeatures {
        total_release_kg,
        toxicity_weighted_exposure,
        max_toxicity,
        heavy_metal_mass_kg,
        carcinogen_count: carcinogens.len() as u32,
        proximity_multiplier: engine.multiplier(lat, lon),
        industry_z_release: normalizer.z_score(&facility.industry, total_release_kg.ln_1p()),
    })
}

/// Min-max bounds of the composite inputs over the scored population
#[derive(Debug, Clone)]
pub struct PopulationNorms {
    log_exposure: MinMax,
    release_z: MinMax,
    max_toxicity: MinMax,
    log_heavy_metal: MinMax,
}

impl PopulationNorms {
    /// Fit bounds over every scorable facility's features
    pub fn fit(features: &[RawFeatures]) -> Self {
        Self {
            log_exposure: MinMax::fit(
                features.iter().map(|f| f.toxicity_weighted_exposure.ln_1p()),
            ),
            release_z: MinMax::fit(features.iter().map(|f| f.industry_z_release)),
            max_toxicity: MinMax::fit(features.iter().map(|f| f.max_toxicity)),
            log_heavy_metal: MinMax::fit(
                features.iter().map(|f| f.heavy_metal_mass_kg.ln_1p()),
            ),
        }
    }

    /// Industry-normalized release volume rescaled to [0, 100]
    pub fn release_volume_score(&self, features: &RawFeatures) -> f64 {
        self.release_z.rescale(features.industry_z_release)
    }
}

/// Composite risk score in [0, 100]
///
/// Weighted sum of the four normalized terms, amplified by receptor
/// proximity, with a bonus for facilities reporting multiple
/// carcinogens, clamped into range. A facility with zero total release
/// scores exactly 0.
pub fn composite_score(
    features: &RawFeatures,
    norms: &PopulationNorms,
    config: &PipelineConfig,
) -> f64 {
    if features.total_release_kg <= 0.0 {
        return 0.0;
    }

    let w = &config.weights;
    let base = w.toxicity_exposure
        * norms
            .log_exposure
            .rescale(features.toxicity_weighted_exposure.ln_1p())
        + w.release_volume * norms.release_volume_score(features)
        + w.max_toxicity * norms.max_toxicity.rescale(features.max_toxicity)
        + w.heavy_metal
            * norms
                .log_heavy_metal
                .rescale(features.heavy_metal_mass_kg.ln_1p());

    let mut adjusted = base * features.proximity_multiplier;
    if features.carcinogen_count >= config.carcinogen_count_threshold {
        adjusted *= config.carcinogen_bonus;
    }
    adjusted.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChemicalRelease, Pathway, ReceptorCategory, SensitiveReceptor};

    fn test_config() -> PipelineConfig {
        PipelineConfig::default().with_receptors(vec![SensitiveReceptor::new(
            "Hospital",
            43.65,
            -79.38,
            ReceptorCategory::Hospital,
        )])
    }

    fn score_population(facilities: &[Facility], config: &PipelineConfig) -> Vec<f64> {
        let table = ToxicityTable::builtin();
        let engine = ProximityEngine::from_config(config);
        let normalizer = IndustryNormalizer::fit(
            facilities
                .iter()
                .map(|f| (f.industry.as_str(), f.total_release_kg().ln_1p())),
            config.min_peer_group,
        );
        let features: Vec<RawFeatures> = facilities
            .iter()
            .map(|f| extract_features(f, &table, &engine, &normalizer).expect("has coordinates"))
            .collect();
        let norms = PopulationNorms::fit(&features);
        features
            .iter()
            .map(|f| composite_score(f, &norms, config))
            .collect()
    }

    #[test]
    fn test_mercury_near_hospital_outranks_remote_solvent() {
        let config = test_config();
        // A: 100 kg mercury 0.5 km from the hospital.
        let a = Facility::new("A", "Mercury Works", "Smelting")
            .with_coordinates(43.65 + 0.5 / 111.2, -79.38)
            .with_release(ChemicalRelease::new("Mercury", 100.0, Pathway::Air));
        // B: 100 kg acetone, ~22 km away from any receptor.
        let b = Facility::new("B", "Solvent Depot", "Smelting")
            .with_coordinates(43.65 + 0.2, -79.38)
            .with_release(ChemicalRelease::new("Acetone", 100.0, Pathway::Air));
        let c = Facility::new("C", "Quiet Shop", "Smelting")
            .with_coordinates(43.65 + 0.3, -79.38)
            .with_release(ChemicalRelease::new("Acetone", 1.0, Pathway::Air));

        let facilities = vec![a, b, c];
        let scores = score_population(&facilities, &config);
        assert!(
            scores[0] > scores[1],
            "mercury near hospital {} should outrank remote solvent {}",
            scores[0],
            scores[1]
        );

        let engine = ProximityEngine::from_config(&config);
        let normalizer = IndustryNormalizer::fit(std::iter::empty(), config.min_peer_group);
        let table = ToxicityTable::builtin();
        let near = extract_features(&facilities[0], &table, &engine, &normalizer).unwrap();
        let far = extract_features(&facilities[1], &table, &engine, &normalizer).unwrap();
        assert!(near.proximity_multiplier > far.proximity_multiplier);
        assert_eq!(far.proximity_multiplier, 1.0);
    }

    #[test]
    fn test_scores_bounded() {
        let config = test_config();
        let facilities: Vec<Facility> = (0..20)
            .map(|i| {
                Facility::new(format!("F-{i}"), "Plant", "Chemicals")
                    .with_coordinates(43.65 + i as f64 * 0.01, -79.38)
                    .with_release(ChemicalRelease::new(
                        "Mercury",
                        10f64.powi(i % 6),
                        Pathway::Air,
                    ))
                    .with_release(ChemicalRelease::new("Benzene", 50.0, Pathway::Water))
            })
            .collect();
        for score in score_population(&facilities, &config) {
            assert!((0.0..=100.0).contains(&score), "score out of range: {score}");
        }
    }

    #[test]
    fn test_zero_release_scores_zero() {
        let config = test_config();
        let zero = Facility::new("Z", "Idle Plant", "Chemicals")
            .with_coordinates(43.65, -79.38);
        let busy = Facility::new("B", "Busy Plant", "Chemicals")
            .with_coordinates(43.66, -79.38)
            .with_release(ChemicalRelease::new("Benzene", 500.0, Pathway::Air));
        let other = Facility::new("C", "Other Plant", "Chemicals")
            .with_coordinates(43.67, -79.38)
            .with_release(ChemicalRelease::new("Toluene", 50.0, Pathway::Air));

        let scores = score_population(&[zero, busy, other], &config);
        assert_eq!(scores[0], 0.0);
        assert!(scores[1] > 0.0);
    }

    #[test]
    fn test_carcinogen_bonus_applied_at_threshold() {
        let config = test_config();
        let table = ToxicityTable::builtin();
        let engine = ProximityEngine::from_config(&config);
        let normalizer = IndustryNormalizer::fit(std::iter::empty(), config.min_peer_group);

        let two = Facility::new("2", "Two Carcinogens", "Chemicals")
            .with_coordinates(43.0, -79.0)
            .with_release(ChemicalRelease::new("Benzene", 10.0, Pathway::Air))
            .with_release(ChemicalRelease::new("Formaldehyde", 10.0, Pathway::Air));
        let features = extract_features(&two, &table, &engine, &normalizer).unwrap();
        assert_eq!(features.carcinogen_count, 2);

        // Same chemical on two pathways is still one carcinogen.
        let one = Facility::new("1", "One Carcinogen", "Chemicals")
            .with_coordinates(43.0, -79.0)
            .with_release(ChemicalRelease::new("Benzene", 10.0, Pathway::Air))
            .with_release(ChemicalRelease::new("Benzene", 5.0, Pathway::Water));
        let features = extract_features(&one, &table, &engine, &normalizer).unwrap();
        assert_eq!(features.carcinogen_count, 1);
    }

    #[test]
    fn test_heavy_metal_mass_accumulates() {
        let config = test_config();
        let table = ToxicityTable::builtin();
        let engine = ProximityEngine::from_config(&config);
        let normalizer = IndustryNormalizer::fit(std::iter::empty(), config.min_peer_group);

        let facility = Facility::new("F", "Foundry", "Metal Casting")
            .with_coordinates(43.0, -79.0)
            .with_release(ChemicalRelease::new("Lead", 12.0, Pathway::Air))
            .with_release(ChemicalRelease::new("Cadmium", 3.0, Pathway::Land))
            .with_release(ChemicalRelease::new("Toluene", 40.0, Pathway::Air));
        let features = extract_features(&facility, &table, &engine, &normalizer).unwrap();
        assert!((features.heavy_metal_mass_kg - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_coordinates_excluded() {
        let config = test_config();
        let table = ToxicityTable::builtin();
        let engine = ProximityEngine::from_config(&config);
        let normalizer = IndustryNormalizer::fit(std::iter::empty(), config.min_peer_group);

        let facility = Facility::new("F", "No Address", "Printing")
            .with_release(ChemicalRelease::new("Toluene", 10.0, Pathway::Air));
        assert!(extract_features(&facility, &table, &engine, &normalizer).is_none());
    }

    #[test]
    fn test_pathway_weighting_shapes_exposure() {
        let config = test_config();
        let table = ToxicityTable::builtin();
        let engine = ProximityEngine::from_config(&config);
        let normalizer = IndustryNormalizer::fit(std::iter::empty(), config.min_peer_group);

        let air = Facility::new("A", "Air Release", "Chemicals")
            .with_coordinates(43.0, -79.0)
            .with_release(ChemicalRelease::new("Benzene", 100.0, Pathway::Air));
        let recycling = Facility::new("R", "Recycling Release", "Chemicals")
            .with_coordinates(43.0, -79.0)
            .with_release(ChemicalRelease::new("Benzene", 100.0, Pathway::Recycling));

        let air = extract_features(&air, &table, &engine, &normalizer).unwrap();
        let recycling = extract_features(&recycling, &table, &engine, &normalizer).unwrap();
        assert!(air.toxicity_weighted_exposure > recycling.toxicity_weighted_exposure);
    }
}
