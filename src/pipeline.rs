//! Pipeline orchestration
//!
//! ## Table of Contents
//! - **Pipeline**: Configured pipeline instance
//! - **PipelineOutput / RunSummary**: Results of one batch run
//!
//! One run is a full recompute: industry statistics and population norms
//! are fitted over every scorable facility, facilities are scored in
//! parallel against those fits, and only then is the anomaly ensemble
//! fitted and applied. The ensemble cannot see a facility before every
//! risk score exists, which is why classification consumes an explicit
//! fitted [`EnsembleModel`] value.

use crate::anomaly::{EnsembleModel, EnsembleObservation};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::proximity::ProximityEngine;
use crate::scorer::{self, PopulationNorms, RawFeatures};
use crate::stats::IndustryNormalizer;
use crate::toxicity::ToxicityTable;
use crate::types::{Facility, RiskMetrics, ScoredFacility, UnscoredReason};
use rayon::prelude::*;
use tracing::info;

/// Counters describing one pipeline run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    /// Facilities ingested
    pub facilities: usize,
    /// Facilities that received a risk score
    pub scored: usize,
    /// Facilities excluded from scoring
    pub unscored: usize,
    /// Facilities flagged anomalous
    pub anomalies: usize,
}

/// Output of one batch run
#[derive(Debug)]
pub struct PipelineOutput {
    /// Enriched facility records, ordered by facility id
    pub scored: Vec<ScoredFacility>,
    /// Run counters
    pub summary: RunSummary,
}

/// Configured risk pipeline
///
/// Holds the immutable reference data (toxicity table, receptor set);
/// each [`run`](Pipeline::run) is an independent batch computation.
pub struct Pipeline {
    config: PipelineConfig,
    toxicity: ToxicityTable,
    proximity: ProximityEngine,
}

impl Pipeline {
    /// Build a pipeline after validating the configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let proximity = ProximityEngine::from_config(&config);
        Ok(Self {
            config,
            toxicity: ToxicityTable::builtin(),
            proximity,
        })
    }

    /// Build a pipeline with a custom toxicity table
    pub fn with_toxicity_table(mut self, table: ToxicityTable) -> Self {
        self.toxicity = table;
        self
    }

    /// The toxicity reference table in use
    pub fn toxicity_table(&self) -> &ToxicityTable {
        &self.toxicity
    }

    /// The pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Score and classify a full facility population
    ///
    /// An empty input completes successfully with an empty output.
    pub fn run(&self, facilities: Vec<Facility>) -> Result<PipelineOutput> {
        let total = facilities.len();
        info!(facilities = total, "pipeline run started");

        let (scorable, unscorable): (Vec<Facility>, Vec<Facility>) = facilities
            .into_iter()
            .partition(|f| f.coordinates().is_some());

        // Industry statistics need the whole scorable population first.
        let normalizer = IndustryNormalizer::fit(
            scorable
                .iter()
                .map(|f| (f.industry.as_str(), f.total_release_kg().ln_1p())),
            self.config.min_peer_group,
        );

        let features: Vec<RawFeatures> = scorable
            .par_iter()
            .map(|f| {
                scorer::extract_features(f, &self.toxicity, &self.proximity, &normalizer)
                    .expect("scorable facilities have coordinates")
            })
            .collect();

        let norms = PopulationNorms::fit(&features);
        let risk_scores: Vec<f64> = features
            .par_iter()
            .map(|f| scorer::composite_score(f, &norms, &self.config))
            .collect();

        // Hard barrier: every score exists before the ensemble is fitted.
        let observations: Vec<EnsembleObservation> = scorable
            .iter()
            .zip(&features)
            .zip(&risk_scores)
            .map(|((facility, features), risk)| EnsembleObservation {
                industry: facility.industry.clone(),
                features: features.clone(),
                risk_score: *risk,
            })
            .collect();
        let model = EnsembleModel::fit(&observations, &self.config);

        let mut scored: Vec<ScoredFacility> = scorable
            .into_par_iter()
            .zip(features)
            .zip(risk_scores)
            .map(|((facility, features), risk_score)| {
                let verdict = model.classify(&EnsembleObservation {
                    industry: facility.industry.clone(),
                    features: features.clone(),
                    risk_score,
                });
                ScoredFacility {
                    facility,
                    metrics: Some(RiskMetrics {
                        toxicity_weighted_exposure: features.toxicity_weighted_exposure,
                        release_volume_score: norms.release_volume_score(&features),
                        max_toxicity: features.max_toxicity,
                        heavy_metal_mass_kg: features.heavy_metal_mass_kg,
                        proximity_multiplier: features.proximity_multiplier,
                        carcinogen_count: features.carcinogen_count,
                        industry_z_release: features.industry_z_release,
                        risk_score,
                    }),
                    unscored_reason: None,
                    anomaly: verdict.anomaly,
                    anomaly_confidence: verdict.confidence,
                    anomaly_votes: verdict.votes,
                }
            })
            .collect();

        scored.extend(unscorable.into_iter().map(|facility| ScoredFacility {
            facility,
            metrics: None,
            unscored_reason: Some(UnscoredReason::MissingCoordinates),
            anomaly: false,
            anomaly_confidence: 0.0,
            anomaly_votes: Vec::new(),
        }));
        scored.sort_by(|a, b| a.facility.id.cmp(&b.facility.id));

        let summary = RunSummary {
            facilities: total,
            scored: scored.iter().filter(|s| s.metrics.is_some()).count(),
            unscored: scored.iter().filter(|s| s.metrics.is_none()).count(),
            anomalies: scored.iter().filter(|s| s.anomaly).count(),
        };
        info!(
            facilities = summary.facilities,
            scored = summary.scored,
            unscored = summary.unscored,
            anomalies = summary.anomalies,
            "pipeline run complete"
        );

        Ok(PipelineOutput { scored, summary })
    }
}
