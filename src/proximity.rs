//! Geospatial proximity engine
//!
//! ## Table of Contents
//! - **haversine_km**: Great-circle distance between two coordinates
//! - **ProximityEngine**: Distance-decayed receptor multiplier
//!
//! Each sensitive receptor contributes its category weight in full within
//! the inner radius, fading linearly to zero at the outer radius. The sum
//! of contributions is capped before being added to the 1.0 baseline, so
//! clustered receptors (a downtown core) cannot compound without bound.

use crate::config::PipelineConfig;
use crate::types::{ReceptorCategory, SensitiveReceptor};

/// Mean Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two lat/lon points in kilometers
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Computes a distance-decayed risk multiplier from receptor proximity
///
/// The multiplier never decreases raw risk: it is 1.0 for facilities
/// beyond the influence radius of every receptor and at most
/// `1.0 + cap` regardless of how many receptors are nearby.
#[derive(Debug, Clone)]
pub struct ProximityEngine {
    receptors: Vec<SensitiveReceptor>,
    cap: f64,
    full_weight_radius_km: f64,
    max_influence_radius_km: f64,
}

impl ProximityEngine {
    /// Build the engine from pipeline configuration
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            receptors: config.receptors.clone(),
            cap: config.proximity_cap,
            full_weight_radius_km: config.full_weight_radius_km,
            max_influence_radius_km: config.max_influence_radius_km,
        }
    }

    /// Multiplier for a facility at the given coordinates, in [1.0, 1.0 + cap]
    pub fn multiplier(&self, lat: f64, lon: f64) -> f64 {
        let total: f64 = self
            .receptors
            .iter()
            .map(|r| {
                let dist = haversine_km(lat, lon, r.latitude, r.longitude);
                self.contribution(dist, r.category)
            })
            .sum();
        1.0 + total.min(self.cap)
    }

    /// Contribution of one receptor at the given distance
    ///
    /// Full category weight inside the inner radius (a coincident receptor
    /// contributes exactly its category weight, never more), linear decay
    /// to zero at the outer radius.
    fn contribution(&self, distance_km: f64, category: ReceptorCategory) -> f64 {
        let weight = category.weight();
        if distance_km <= self.full_weight_radius_km {
            weight
        } else if distance_km < self.max_influence_radius_km {
            let span = self.max_influence_radius_km - self.full_weight_radius_km;
            weight * (self.max_influence_radius_km - distance_km) / span
        } else {
            0.0
        }
    }

    /// The configured receptor set
    pub fn receptors(&self) -> &[SensitiveReceptor] {
        &self.receptors
    }
}

/// Built-in sensitive receptor list: Toronto hospital clusters, university
/// campuses, and high-density residential centres
pub fn default_receptors() -> Vec<SensitiveReceptor> {
    vec![
        SensitiveReceptor::new("Toronto General Hospital", 43.6591, -79.3879, ReceptorCategory::Hospital),
        SensitiveReceptor::new("SickKids", 43.6566, -79.3900, ReceptorCategory::Hospital),
        SensitiveReceptor::new("Sunnybrook", 43.7315, -79.4558, ReceptorCategory::Hospital),
        SensitiveReceptor::new("University of Toronto", 43.6629, -79.3957, ReceptorCategory::University),
        SensitiveReceptor::new("York University", 43.7735, -79.5019, ReceptorCategory::University),
        SensitiveReceptor::new("UofT Scarborough", 43.7843, -79.1864, ReceptorCategory::University),
        SensitiveReceptor::new("Downtown Core", 43.6426, -79.3871, ReceptorCategory::HighDensityResidential),
        SensitiveReceptor::new("North York Centre", 43.7615, -79.4111, ReceptorCategory::HighDensityResidential),
        SensitiveReceptor::new("Scarborough Town", 43.7731, -79.2578, ReceptorCategory::HighDensityResidential),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReceptorCategory;

    fn engine_with(receptors: Vec<SensitiveReceptor>) -> ProximityEngine {
        let config = PipelineConfig::default().with_receptors(receptors);
        ProximityEngine::from_config(&config)
    }

    // Roughly 1 degree of latitude in km at Toronto's latitude.
    const KM_PER_DEG_LAT: f64 = 111.2;

    #[test]
    fn test_haversine_known_distance() {
        // Toronto General to SickKids is a few hundred meters.
        let d = haversine_km(43.6591, -79.3879, 43.6566, -79.3900);
        assert!(d > 0.2 && d < 0.5, "got {d}");
    }

    #[test]
    fn test_haversine_zero_distance() {
        assert_eq!(haversine_km(43.65, -79.38, 43.65, -79.38), 0.0);
    }

    #[test]
    fn test_multiplier_baseline_beyond_influence() {
        let engine = engine_with(vec![SensitiveReceptor::new(
            "Hospital",
            43.65,
            -79.38,
            ReceptorCategory::Hospital,
        )]);
        // ~11 km north: outside the 5 km influence radius.
        let far = engine.multiplier(43.65 + 0.1, -79.38);
        assert_eq!(far, 1.0);
    }

    #[test]
    fn test_multiplier_decays_with_distance() {
        let engine = engine_with(vec![SensitiveReceptor::new(
            "Hospital",
            43.65,
            -79.38,
            ReceptorCategory::Hospital,
        )]);
        let at_zero = engine.multiplier(43.65, -79.38);
        let at_3km = engine.multiplier(43.65 + 3.0 / KM_PER_DEG_LAT, -79.38);
        let at_6km = engine.multiplier(43.65 + 6.0 / KM_PER_DEG_LAT, -79.38);

        assert_eq!(at_zero, 2.0); // 1.0 + full hospital weight
        assert!(at_zero > at_3km, "{at_zero} vs {at_3km}");
        assert!(at_3km > at_6km, "{at_3km} vs {at_6km}");
        assert_eq!(at_6km, 1.0);
    }

    #[test]
    fn test_coincident_receptor_is_finite() {
        let engine = engine_with(vec![SensitiveReceptor::new(
            "Clinic",
            43.70,
            -79.40,
            ReceptorCategory::Hospital,
        )]);
        let m = engine.multiplier(43.70, -79.40);
        assert_eq!(m, 1.0 + ReceptorCategory::Hospital.weight());
    }

    #[test]
    fn test_cluster_capped() {
        // Ten hospitals stacked on one block must still respect the cap.
        let receptors = (0..10)
            .map(|i| {
                SensitiveReceptor::new(
                    format!("Hospital {i}"),
                    43.65,
                    -79.38 + i as f64 * 0.001,
                    ReceptorCategory::Hospital,
                )
            })
            .collect();
        let engine = engine_with(receptors);
        let m = engine.multiplier(43.65, -79.38);
        assert_eq!(m, 2.0);
    }

    #[test]
    fn test_category_weights_rank_contributions() {
        let hospital = engine_with(vec![SensitiveReceptor::new(
            "H", 43.65, -79.38, ReceptorCategory::Hospital,
        )]);
        let residential = engine_with(vec![SensitiveReceptor::new(
            "R", 43.65, -79.38, ReceptorCategory::HighDensityResidential,
        )]);
        assert!(hospital.multiplier(43.65, -79.38) > residential.multiplier(43.65, -79.38));
    }

    #[test]
    fn test_default_receptors_populated() {
        let receptors = default_receptors();
        assert_eq!(receptors.len(), 9);
        assert!(receptors
            .iter()
            .any(|r| r.category == ReceptorCategory::Hospital));
    }
}
