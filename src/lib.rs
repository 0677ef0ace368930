//! # chemrisk
//!
//! Deterministic environmental health-risk scoring and anomaly detection
//! for industrial chemical-release inventories.
//!
//! ## Features
//!
//! - **Toxicity Reference**: Total chemical lookup with canonicalization
//!   and a curated alias table
//! - **Proximity Engine**: Haversine distance-decayed multipliers for
//!   sensitive receptors (hospitals, schools, dense residential)
//! - **Risk Scorer**: Multi-factor weighted composite on a 0-100 scale,
//!   normalized against industry peers
//! - **Anomaly Ensemble**: Four independent detectors combined by
//!   majority vote, seeded for reproducible runs
//! - **Export Adapter**: Stable-ordered JSON artifact for the map layer
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chemrisk::{ingest, export, Pipeline, PipelineConfig};
//!
//! fn main() -> chemrisk::Result<()> {
//!     let (facilities, _) = ingest::read_csv_path("releases.csv")?;
//!     let pipeline = Pipeline::new(PipelineConfig::default())?;
//!     let output = pipeline.run(facilities)?;
//!     let records = export::to_records(&output.scored, pipeline.toxicity_table());
//!     export::write_json("facilities.json", &records)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod anomaly;
pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod pipeline;
pub mod proximity;
pub mod scorer;
pub mod stats;
pub mod toxicity;
pub mod types;

// Re-exports for ergonomic API
pub use anomaly::{AnomalyVerdict, EnsembleModel, EnsembleObservation};
pub use config::{PipelineConfig, ScoreWeights};
pub use error::{PipelineError, Result};
pub use export::FacilityRecord;
pub use pipeline::{Pipeline, PipelineOutput, RunSummary};
pub use proximity::ProximityEngine;
pub use toxicity::{ToxicityEntry, ToxicityTable};
pub use types::{
    ChemicalRelease, DetectorKind, Facility, FacilityId, Pathway, ReceptorCategory, RiskMetrics,
    ScoredFacility, SensitiveReceptor, UnscoredReason,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::error::Result;
    pub use crate::pipeline::{Pipeline, PipelineOutput};
    pub use crate::types::{ChemicalRelease, Facility, Pathway, ScoredFacility};
}
