//! Export adapter for the presentation layer
//!
//! ## Table of Contents
//! - **ChemicalRecord / FacilityRecord**: Interchange-format records
//! - **to_records**: Scored facilities to stable-ordered records
//! - **write_json / read_json**: Artifact IO
//!
//! The artifact is a JSON array with one record per facility, ordered by
//! facility id so consecutive runs diff cleanly. `risk_score` is null
//! for facilities excluded from scoring; consumers must render those
//! distinctly from a true zero.

use crate::error::{PipelineError, Result};
use crate::toxicity::ToxicityTable;
use crate::types::{Pathway, ScoredFacility, UnscoredReason};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// One chemical entry in the exported record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChemicalRecord {
    /// Chemical name as reported
    pub name: String,
    /// Mass released in kilograms
    pub amount_kg: f64,
    /// Release pathway
    pub pathway: Pathway,
    /// Toxicity weight the pipeline assigned to this chemical
    pub toxicity_weight: f64,
}

/// One facility in the exported artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityRecord {
    /// Facility identifier
    pub id: String,
    /// Facility name
    pub name: String,
    /// Industry classification
    pub industry: String,
    /// Latitude, absent when unreported
    pub latitude: Option<f64>,
    /// Longitude, absent when unreported
    pub longitude: Option<f64>,
    /// Employee count, absent when unreported
    pub employee_count: Option<u32>,
    /// Total release mass in kilograms
    pub total_release_kg: f64,
    /// Composite risk score; null for unscored facilities
    pub risk_score: Option<f64>,
    /// Majority-vote anomaly flag
    pub anomaly: bool,
    /// Vote agreement percentage
    pub anomaly_confidence: f64,
    /// Names of detectors that voted yes
    pub anomaly_votes: Vec<String>,
    /// Proximity multiplier; null for unscored facilities
    pub proximity_multiplier: Option<f64>,
    /// Number of distinct carcinogens reported
    pub carcinogen_count: u32,
    /// Highest toxicity weight among reported chemicals
    pub max_toxicity: f64,
    /// Why the facility was excluded from scoring, if it was
    pub unscored_reason: Option<UnscoredReason>,
    /// Releases ordered by descending mass
    pub chemicals: Vec<ChemicalRecord>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Convert scored facilities into interchange records, ordered by id
pub fn to_records(scored: &[ScoredFacility], toxicity: &ToxicityTable) -> Vec<FacilityRecord> {
    let mut records: Vec<FacilityRecord> = scored
        .iter()
        .map(|s| {
            let facility = &s.facility;
            let mut chemicals: Vec<ChemicalRecord> = facility
                .releases
                .iter()
                .map(|r| ChemicalRecord {
                    name: r.chemical_name.clone(),
                    amount_kg: round3(r.amount_kg),
                    pathway: r.pathway,
                    toxicity_weight: toxicity.lookup(&r.chemical_name).toxicity_weight,
                })
                .collect();
            chemicals.sort_by(|a, b| {
                b.amount_kg
                    .partial_cmp(&a.amount_kg)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.name.cmp(&b.name))
            });

            FacilityRecord {
                id: facility.id.as_str().to_string(),
                name: facility.name.clone(),
                industry: facility.industry.clone(),
                latitude: facility.latitude,
                longitude: facility.longitude,
                employee_count: facility.employee_count,
                total_release_kg: round3(facility.total_release_kg()),
                risk_score: s.risk_score().map(round2),
                anomaly: s.anomaly,
                anomaly_confidence: round2(s.anomaly_confidence),
                anomaly_votes: s.anomaly_votes.iter().map(|v| v.to_string()).collect(),
                proximity_multiplier: s.metrics.as_ref().map(|m| round2(m.proximity_multiplier)),
                carcinogen_count: s.metrics.as_ref().map(|m| m.carcinogen_count).unwrap_or(0),
                max_toxicity: s
                    .metrics
                    .as_ref()
                    .map(|m| round2(m.max_toxicity))
                    .unwrap_or(0.0),
                unscored_reason: s.unscored_reason,
                chemicals,
            }
        })
        .collect();
    records.sort_by(|a, b| a.id.cmp(&b.id));
    records
}

/// Write records as pretty-printed JSON to a path
pub fn write_json(path: impl AsRef<Path>, records: &[FacilityRecord]) -> Result<()> {
    let path = path.as_ref();
    let contents = serde_json::to_string_pretty(records)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| PipelineError::export(format!("cannot create {}: {e}", parent.display())))?;
    }
    fs::write(path, contents)
        .map_err(|e| PipelineError::export(format!("cannot write {}: {e}", path.display())))?;
    info!(path = %path.display(), facilities = records.len(), "artifact written");
    Ok(())
}

/// Read a previously exported artifact
pub fn read_json(path: impl AsRef<Path>) -> Result<Vec<FacilityRecord>> {
    let contents = fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&contents)?)
}
