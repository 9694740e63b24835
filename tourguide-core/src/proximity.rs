use crate::entity::LocatedEntity;
use crate::geo::{distance_km, GeoPoint};
use serde::Serialize;

/// Radius used by the nearby-cities search when the caller has no preference
pub const DEFAULT_RADIUS_KM: f64 = 50.0;

/// An entity annotated with its distance from a reference point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProximityResult {
    pub entity: LocatedEntity,
    pub distance_km: f64,
}

impl ProximityResult {
    /// Whole kilometres, as shown in "N km away" labels
    pub fn rounded_km(&self) -> u64 {
        self.distance_km.round() as u64
    }
}

/// Returns the entities within `radius_km` of `reference`, nearest first
///
/// The radius is inclusive. Entities at equal distance keep their input
/// order. Entities with non-finite or out-of-range coordinates are skipped.
pub fn find_nearby(
    reference: GeoPoint,
    entities: &[LocatedEntity],
    radius_km: f64,
) -> Vec<ProximityResult> {
    let mut results: Vec<ProximityResult> = entities
        .iter()
        .filter(|entity| {
            if entity.location.is_valid() {
                true
            } else {
                log::warn!(
                    "Skipping {} with malformed coordinates ({}, {})",
                    entity.name,
                    entity.location.lat,
                    entity.location.lng
                );
                false
            }
        })
        .map(|entity| ProximityResult {
            distance_km: distance_km(reference, entity.location),
            entity: entity.clone(),
        })
        .filter(|result| result.distance_km <= radius_km)
        .collect();

    // sort_by is stable; every distance here is finite
    results.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    log::debug!(
        "{} of {} entities within {} km of {}",
        results.len(),
        entities.len(),
        radius_km,
        reference
    );

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALEM: GeoPoint = GeoPoint { lat: 11.6643, lng: 78.1460 };

    fn tamil_nadu_sample() -> Vec<LocatedEntity> {
        vec![
            LocatedEntity::new("Chennai", 13.0827, 80.2707),
            LocatedEntity::new("Coimbatore", 11.0174, 76.9589),
            LocatedEntity::new("Madurai", 9.9252, 78.1198),
        ]
    }

    fn names(results: &[ProximityResult]) -> Vec<&str> {
        results.iter().map(|r| r.entity.name.as_str()).collect()
    }

    #[test]
    fn test_salem_within_200km() {
        let entities = tamil_nadu_sample();
        let results = find_nearby(SALEM, &entities, 200.0);

        // Coimbatore ~148 km, Madurai ~193 km, Chennai ~280 km
        assert_eq!(names(&results), vec!["Coimbatore", "Madurai"]);
        assert!((results[0].distance_km - 148.1).abs() < 1.0);
        assert!((results[1].distance_km - 193.4).abs() < 1.0);
        assert!(results.iter().all(|r| r.distance_km <= 200.0));
    }

    #[test]
    fn test_salem_within_150km_keeps_only_coimbatore() {
        let entities = tamil_nadu_sample();
        let results = find_nearby(SALEM, &entities, 150.0);
        assert_eq!(names(&results), vec!["Coimbatore"]);
        assert_eq!(results[0].rounded_km(), 148);
    }

    #[test]
    fn test_radius_boundary_is_inclusive() {
        let target = LocatedEntity::new("Edge", 11.9, 78.3);
        let exact = distance_km(SALEM, target.location);
        let entities = vec![target];

        assert_eq!(find_nearby(SALEM, &entities, exact).len(), 1);
        assert!(find_nearby(SALEM, &entities, exact - 0.001).is_empty());
    }

    #[test]
    fn test_equal_distances_keep_input_order() {
        // Mirror images across the reference meridian are equidistant
        let reference = GeoPoint::new(11.5, 78.0);
        let entities = vec![
            LocatedEntity::new("East", 11.5, 78.25),
            LocatedEntity::new("Far", 12.5, 78.0),
            LocatedEntity::new("West", 11.5, 77.75),
        ];
        let results = find_nearby(reference, &entities, DEFAULT_RADIUS_KM);
        assert_eq!(names(&results), vec!["East", "West"]);
        assert_eq!(results[0].distance_km, results[1].distance_km);

        let reversed: Vec<LocatedEntity> = vec![entities[2].clone(), entities[0].clone()];
        let results = find_nearby(reference, &reversed, DEFAULT_RADIUS_KM);
        assert_eq!(names(&results), vec!["West", "East"]);
    }

    #[test]
    fn test_identical_positions_keep_input_order() {
        let entities = vec![
            LocatedEntity::new("B", 11.7, 78.2),
            LocatedEntity::new("A", 11.7, 78.2),
            LocatedEntity::new("C", 11.7, 78.2),
        ];
        let results = find_nearby(SALEM, &entities, DEFAULT_RADIUS_KM);
        assert_eq!(names(&results), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_empty_collection() {
        assert!(find_nearby(SALEM, &[], DEFAULT_RADIUS_KM).is_empty());
    }

    #[test]
    fn test_malformed_coordinates_are_skipped() {
        let entities = vec![
            LocatedEntity::new("Broken", f64::NAN, 78.0),
            LocatedEntity::new("Salem", 11.6643, 78.1460),
            LocatedEntity::new("Nowhere", 123.0, 78.0),
        ];
        let results = find_nearby(SALEM, &entities, DEFAULT_RADIUS_KM);
        assert_eq!(names(&results), vec!["Salem"]);
        assert_eq!(results[0].distance_km, 0.0);
    }
}
