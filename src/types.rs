//! Core types for the risk pipeline
//!
//! ## Table of Contents
//! - **FacilityId**: Unique identifier for facilities
//! - **Pathway**: Environmental medium a release enters
//! - **ChemicalRelease**: One reported release of one chemical
//! - **Facility**: Raw facility record as ingested
//! - **SensitiveReceptor**: Location whose population is vulnerable to exposure
//! - **ScoredFacility**: Derived record produced by the pipeline

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a facility, taken from the source dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityId(String);

impl FacilityId {
    /// Create a facility id from the dataset value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FacilityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Environmental medium a chemical release enters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pathway {
    /// Direct release to air
    Air,
    /// Release to surface or drinking water
    Water,
    /// Release to soil
    Land,
    /// Contained disposal
    Disposal,
    /// Recovery/recycling processes
    Recycling,
}

impl Pathway {
    /// Exposure multiplier applied to releases on this pathway
    ///
    /// Inhalation is the highest-risk route; contained disposal and
    /// recycling carry the least immediate exposure.
    pub fn exposure_weight(&self) -> f64 {
        match self {
            Pathway::Air => 1.0,
            Pathway::Water => 0.95,
            Pathway::Land => 0.7,
            Pathway::Disposal => 0.3,
            Pathway::Recycling => 0.15,
        }
    }

    /// Pathway name as it appears in the interchange format
    pub fn as_str(&self) -> &'static str {
        match self {
            Pathway::Air => "air",
            Pathway::Water => "water",
            Pathway::Land => "land",
            Pathway::Disposal => "disposal",
            Pathway::Recycling => "recycling",
        }
    }
}

impl fmt::Display for Pathway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Pathway {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "air" => Ok(Pathway::Air),
            "water" => Ok(Pathway::Water),
            "land" => Ok(Pathway::Land),
            "disposal" => Ok(Pathway::Disposal),
            "recycling" => Ok(Pathway::Recycling),
            _ => Err(()),
        }
    }
}

/// One reported release of one chemical along one pathway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChemicalRelease {
    /// Chemical name as reported in the source data
    pub chemical_name: String,
    /// Mass released in kilograms (non-negative)
    pub amount_kg: f64,
    /// Pathway the release entered
    pub pathway: Pathway,
}

impl ChemicalRelease {
    /// Create a new release record
    pub fn new(chemical_name: impl Into<String>, amount_kg: f64, pathway: Pathway) -> Self {
        Self {
            chemical_name: chemical_name.into(),
            amount_kg: amount_kg.max(0.0),
            pathway,
        }
    }
}

/// Raw facility record as ingested, never mutated after creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    /// Unique facility identifier
    pub id: FacilityId,
    /// Facility name
    pub name: String,
    /// Industry classification (NAICS-like), used for peer grouping
    pub industry: String,
    /// Latitude in degrees, if reported
    pub latitude: Option<f64>,
    /// Longitude in degrees, if reported
    pub longitude: Option<f64>,
    /// Reported employee count, if any
    pub employee_count: Option<u32>,
    /// All reported releases for this facility
    pub releases: Vec<ChemicalRelease>,
}

impl Facility {
    /// Create a new facility with no releases
    pub fn new(id: impl Into<FacilityId>, name: impl Into<String>, industry: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            industry: industry.into(),
            latitude: None,
            longitude: None,
            employee_count: None,
            releases: Vec::new(),
        }
    }

    /// Set the facility coordinates
    pub fn with_coordinates(mut self, lat: f64, lon: f64) -> Self {
        self.latitude = Some(lat);
        self.longitude = Some(lon);
        self
    }

    /// Set the employee count
    pub fn with_employees(mut self, count: u32) -> Self {
        self.employee_count = Some(count);
        self
    }

    /// Add a release record
    pub fn with_release(mut self, release: ChemicalRelease) -> Self {
        self.releases.push(release);
        self
    }

    /// Both coordinates, when the facility can be placed on the map
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// Total release mass across all pathways in kilograms
    pub fn total_release_kg(&self) -> f64 {
        self.releases.iter().map(|r| r.amount_kg).sum()
    }
}

impl From<String> for FacilityId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Category of a sensitive receptor location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceptorCategory {
    /// Hospitals and care facilities
    Hospital,
    /// Childcare centres
    Childcare,
    /// Primary and secondary schools
    School,
    /// Universities and colleges
    University,
    /// High-density residential zones
    HighDensityResidential,
}

impl ReceptorCategory {
    /// Category weight scaling the proximity contribution, in (0, 1]
    ///
    /// Hospitals and childcare are weighted highest; general residential
    /// density lowest.
    pub fn weight(&self) -> f64 {
        match self {
            ReceptorCategory::Hospital => 1.0,
            ReceptorCategory::Childcare => 1.0,
            ReceptorCategory::School => 0.85,
            ReceptorCategory::University => 0.7,
            ReceptorCategory::HighDensityResidential => 0.5,
        }
    }
}

/// A location whose nearby population is considered more vulnerable to
/// chemical exposure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitiveReceptor {
    /// Receptor name
    pub name: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Receptor category
    pub category: ReceptorCategory,
}

impl SensitiveReceptor {
    /// Create a new receptor
    pub fn new(
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        category: ReceptorCategory,
    ) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            category,
        }
    }
}

/// Why a facility was excluded from scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnscoredReason {
    /// Coordinates missing or unparseable; proximity cannot be computed
    MissingCoordinates,
}

/// Name of an anomaly detector that voted on a facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Isolation-based outlier over the full population
    GlobalOutlier,
    /// Isolation-based outlier within the industry peer group
    IndustryOutlier,
    /// Risk score at or above the population 95th percentile
    ExtremeRisk,
    /// Two or more carcinogens combined with receptor proximity
    CarcinogenProximity,
}

impl DetectorKind {
    /// Detector name as it appears in exported vote sets
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::GlobalOutlier => "global_outlier",
            DetectorKind::IndustryOutlier => "industry_outlier",
            DetectorKind::ExtremeRisk => "extreme_risk",
            DetectorKind::CarcinogenProximity => "carcinogen_proximity",
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Risk metrics computed for a facility that could be scored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Sum of amount x pathway weight x toxicity weight over all releases
    pub toxicity_weighted_exposure: f64,
    /// Industry-normalized release volume rescaled to [0, 100]
    pub release_volume_score: f64,
    /// Highest toxicity weight among reported chemicals (0 if none)
    pub max_toxicity: f64,
    /// Total mass of heavy-metal releases in kilograms
    pub heavy_metal_mass_kg: f64,
    /// Proximity multiplier, always within [1.0, cap]
    pub proximity_multiplier: f64,
    /// Number of reported carcinogens
    pub carcinogen_count: u32,
    /// Release volume z-score against industry peers
    pub industry_z_release: f64,
    /// Final composite risk score in [0, 100]
    pub risk_score: f64,
}

/// Derived, immutable record produced by the pipeline for one facility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredFacility {
    /// The raw facility record this was derived from
    pub facility: Facility,
    /// Risk metrics, absent when the facility could not be scored
    pub metrics: Option<RiskMetrics>,
    /// Why the facility was excluded from scoring, if it was
    pub unscored_reason: Option<UnscoredReason>,
    /// Majority-vote anomaly flag (at least 2 of 4 detectors agree)
    pub anomaly: bool,
    /// Vote agreement as a percentage: 100 x votes / 4
    pub anomaly_confidence: f64,
    /// Detectors that voted yes, in stable order
    pub anomaly_votes: Vec<DetectorKind>,
}

impl ScoredFacility {
    /// Final risk score, `None` for unscored facilities
    pub fn risk_score(&self) -> Option<f64> {
        self.metrics.as_ref().map(|m| m.risk_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pathway_from_str() {
        assert_eq!("Air".parse::<Pathway>(), Ok(Pathway::Air));
        assert_eq!(" disposal ".parse::<Pathway>(), Ok(Pathway::Disposal));
        assert!("groundwater".parse::<Pathway>().is_err());
    }

    #[test]
    fn test_pathway_weights_ordered() {
        // Air is the highest-risk route, recycling the lowest.
        assert!(Pathway::Air.exposure_weight() > Pathway::Water.exposure_weight());
        assert!(Pathway::Water.exposure_weight() > Pathway::Land.exposure_weight());
        assert!(Pathway::Land.exposure_weight() > Pathway::Disposal.exposure_weight());
        assert!(Pathway::Disposal.exposure_weight() > Pathway::Recycling.exposure_weight());
    }

    #[test]
    fn test_facility_builder() {
        let facility = Facility::new("F-100", "Acme Plating", "Metal Coating")
            .with_coordinates(43.65, -79.38)
            .with_employees(40)
            .with_release(ChemicalRelease::new("Lead", 12.5, Pathway::Air))
            .with_release(ChemicalRelease::new("Toluene", 3.0, Pathway::Water));

        assert_eq!(facility.id.as_str(), "F-100");
        assert_eq!(facility.coordinates(), Some((43.65, -79.38)));
        assert!((facility.total_release_kg() - 15.5).abs() < 1e-12);
    }

    #[test]
    fn test_facility_without_coordinates() {
        let facility = Facility::new("F-1", "No Address Inc", "Printing");
        assert_eq!(facility.coordinates(), None);
        assert_eq!(facility.total_release_kg(), 0.0);
    }

    #[test]
    fn test_receptor_category_ordering() {
        assert!(ReceptorCategory::Hospital.weight() > ReceptorCategory::School.weight());
        assert!(
            ReceptorCategory::School.weight() > ReceptorCategory::HighDensityResidential.weight()
        );
    }

    #[test]
    fn test_negative_amount_clamped() {
        let release = ChemicalRelease::new("Ammonia", -5.0, Pathway::Air);
        assert_eq!(release.amount_kg, 0.0);
    }
}
