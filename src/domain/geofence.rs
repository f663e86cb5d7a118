// Dump zone polygons and the point-in-polygon test
use chrono::{DateTime, Utc};
use geo::{Intersects, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};

/// Id of the built-in zone used until an operator saves their own set.
pub const DEFAULT_POLYGON_ID: &str = "default_msw_plant";

/// Raised when a ring or probe point cannot be interpreted as geometry.
#[derive(Debug, thiserror::Error)]
#[error("invalid geometry: {reason}")]
pub struct InvalidGeometry {
    reason: String,
}

impl InvalidGeometry {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A named geofence around a dump site.
///
/// Ring vertices are `[longitude, latitude]` pairs. The ring is implicitly
/// closed; repeating the first vertex at the end is accepted but not
/// required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpPolygon {
    pub id: String,
    pub name: String,
    pub ring: Vec<[f64; 2]>,
    pub created_at: DateTime<Utc>,
}

impl DumpPolygon {
    pub fn new(
        id: String,
        name: String,
        ring: Vec<[f64; 2]>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, InvalidGeometry> {
        validate_ring(&ring)?;
        Ok(Self {
            id,
            name,
            ring,
            created_at,
        })
    }

    /// The rectangle around the Mathura MSW plant; returned when no polygon
    /// set has ever been saved.
    pub fn default_plant() -> Self {
        Self {
            id: DEFAULT_POLYGON_ID.to_string(),
            name: "Mathura MSW Plant (Default)".to_string(),
            ring: vec![
                [77.7070, 27.5065],
                [77.7090, 27.5065],
                [77.7090, 27.5085],
                [77.7070, 27.5085],
                [77.7070, 27.5065],
            ],
            created_at: Utc::now(),
        }
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> Result<bool, InvalidGeometry> {
        ring_contains(&self.ring, longitude, latitude)
    }
}

/// Check that `ring` describes a usable polygon: every coordinate finite
/// and at least 3 distinct vertices. A repeated closing vertex does not
/// count twice.
pub fn validate_ring(ring: &[[f64; 2]]) -> Result<(), InvalidGeometry> {
    for vertex in ring {
        if !(vertex[0].is_finite() && vertex[1].is_finite()) {
            return Err(InvalidGeometry::new("non-finite ring coordinate"));
        }
    }

    let mut distinct: Vec<[f64; 2]> = Vec::new();
    for vertex in ring {
        if !distinct.contains(vertex) {
            distinct.push(*vertex);
        }
    }
    if distinct.len() < 3 {
        return Err(InvalidGeometry::new(format!(
            "ring has {} distinct vertices, need at least 3",
            distinct.len()
        )));
    }

    Ok(())
}

/// Boundary-inclusive point-in-polygon test.
///
/// A point exactly on an edge or vertex counts as inside, hence
/// `Intersects` rather than `Contains` (the latter excludes the boundary).
/// Self-intersecting rings are not rejected; containment for them is
/// whatever the predicate yields.
pub fn ring_contains(ring: &[[f64; 2]], lon: f64, lat: f64) -> Result<bool, InvalidGeometry> {
    validate_ring(ring)?;
    if !(lon.is_finite() && lat.is_finite()) {
        return Err(InvalidGeometry::new("non-finite point coordinate"));
    }

    let exterior = LineString::from(
        ring.iter()
            .map(|vertex| (vertex[0], vertex[1]))
            .collect::<Vec<(f64, f64)>>(),
    );
    // Polygon::new closes an open ring, which is exactly the implicit
    // closure rule above
    let polygon = Polygon::new(exterior, vec![]);
    Ok(polygon.intersects(&Point::new(lon, lat)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<[f64; 2]> {
        vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]
    }

    #[test]
    fn test_interior_point_is_inside() {
        assert!(ring_contains(&unit_square(), 0.5, 0.5).unwrap());
    }

    #[test]
    fn test_exterior_point_is_outside() {
        assert!(!ring_contains(&unit_square(), 1.5, 0.5).unwrap());
        assert!(!ring_contains(&unit_square(), 0.5, -0.1).unwrap());
    }

    #[test]
    fn test_boundary_counts_as_inside() {
        // a vertex and an edge midpoint
        assert!(ring_contains(&unit_square(), 0.0, 0.0).unwrap());
        assert!(ring_contains(&unit_square(), 0.5, 0.0).unwrap());
    }

    #[test]
    fn test_open_and_closed_rings_agree() {
        let mut closed = unit_square();
        closed.push([0.0, 0.0]);

        assert!(ring_contains(&closed, 0.5, 0.5).unwrap());
        assert_eq!(
            ring_contains(&unit_square(), 0.99, 0.01).unwrap(),
            ring_contains(&closed, 0.99, 0.01).unwrap()
        );
    }

    #[test]
    fn test_too_few_distinct_vertices_is_an_error() {
        assert!(ring_contains(&[[0.0, 0.0], [1.0, 1.0]], 0.5, 0.5).is_err());

        // three vertices of which two coincide
        let degenerate = vec![[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]];
        assert!(validate_ring(&degenerate).is_err());
    }

    #[test]
    fn test_non_finite_input_is_an_error() {
        let bad_ring = vec![[0.0, 0.0], [f64::NAN, 1.0], [1.0, 1.0]];
        assert!(validate_ring(&bad_ring).is_err());

        assert!(ring_contains(&unit_square(), f64::NAN, 0.5).is_err());
        assert!(ring_contains(&unit_square(), 0.5, f64::INFINITY).is_err());
    }

    #[test]
    fn test_constructor_validates_ring() {
        let result = DumpPolygon::new(
            "z1".to_string(),
            "Too small".to_string(),
            vec![[0.0, 0.0], [1.0, 1.0]],
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_default_plant_zone() {
        let plant = DumpPolygon::default_plant();
        assert_eq!(plant.id, DEFAULT_POLYGON_ID);
        assert!(validate_ring(&plant.ring).is_ok());
        assert!(plant.contains(27.5075, 77.7080).unwrap());
        assert!(!plant.contains(27.6000, 77.7080).unwrap());
    }
}
