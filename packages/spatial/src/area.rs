//! User-drawn analysis polygons.

use std::collections::BTreeSet;

use geo::orient::{Direction, Orient};
use geo::{Coord, GeodesicArea, LineString, Polygon};
use geojson::GeoJson;

use crate::AreaError;

/// Twice the triangle area (in squared degrees) below which three vertices
/// count as collinear.
const COLLINEAR_EPSILON: f64 = 1e-14;

/// A validated, closed analysis polygon.
///
/// Stored in `geo` convention (`x` = longitude, `y` = latitude). The input
/// may be open or closed and drawn in either direction; the ring is always
/// closed and wound counter-clockwise here.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisArea {
    polygon: Polygon<f64>,
    distinct_vertices: usize,
}

impl AnalysisArea {
    /// Builds an area from `(latitude, longitude)` vertices in WGS84
    /// decimal degrees.
    ///
    /// Self-intersecting rings are accepted as-is; no repair is attempted.
    ///
    /// # Errors
    ///
    /// * [`AreaError::NonFiniteCoordinate`] / [`AreaError::CoordinateOutOfRange`]
    ///   for unusable vertices
    /// * [`AreaError::TooFewVertices`] when fewer than 3 distinct vertices remain
    /// * [`AreaError::ZeroArea`] when all vertices are collinear
    pub fn from_lat_lon(vertices: &[(f64, f64)]) -> Result<Self, AreaError> {
        for (index, &(latitude, longitude)) in vertices.iter().enumerate() {
            if !latitude.is_finite() || !longitude.is_finite() {
                return Err(AreaError::NonFiniteCoordinate { index });
            }
            if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
                return Err(AreaError::CoordinateOutOfRange {
                    index,
                    latitude,
                    longitude,
                });
            }
        }

        let mut ring: Vec<Coord<f64>> = Vec::with_capacity(vertices.len() + 1);
        for &(latitude, longitude) in vertices {
            let coord = Coord {
                x: longitude,
                y: latitude,
            };
            if ring.last() != Some(&coord) {
                ring.push(coord);
            }
        }
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }

        // `+ 0.0` folds -0.0 into 0.0 so both hash to the same bits.
        let distinct: BTreeSet<(u64, u64)> = ring
            .iter()
            .map(|c| ((c.x + 0.0).to_bits(), (c.y + 0.0).to_bits()))
            .collect();
        if distinct.len() < 3 {
            return Err(AreaError::TooFewVertices {
                found: distinct.len(),
            });
        }

        if is_collinear(&ring) {
            return Err(AreaError::ZeroArea);
        }

        // Geodesic area of a clockwise ring is the rest of the globe.
        let polygon = Polygon::new(LineString::from(ring), vec![]).orient(Direction::Default);

        Ok(Self {
            polygon,
            distinct_vertices: distinct.len(),
        })
    }

    /// Parses an area from a `GeoJSON` `Polygon` geometry or a `Feature`
    /// wrapping one. Coordinates are `[longitude, latitude]` per RFC 7946.
    ///
    /// Interior rings are ignored: an analysis area is a simple polygon.
    ///
    /// # Errors
    ///
    /// Returns [`AreaError::InvalidGeoJson`] if the input doesn't parse or
    /// isn't a single polygon, plus any validation error from
    /// [`Self::from_lat_lon`].
    pub fn from_geojson(geojson_str: &str) -> Result<Self, AreaError> {
        let geojson: GeoJson = geojson_str
            .parse()
            .map_err(|e: geojson::Error| AreaError::InvalidGeoJson(e.to_string()))?;

        let geometry = match geojson {
            GeoJson::Geometry(geometry) => geometry,
            GeoJson::Feature(feature) => feature.geometry.ok_or_else(|| {
                AreaError::InvalidGeoJson("feature has no geometry".to_string())
            })?,
            GeoJson::FeatureCollection(_) => {
                return Err(AreaError::InvalidGeoJson(
                    "expected a single Polygon, got a FeatureCollection".to_string(),
                ));
            }
        };

        let geo_geom: geo::Geometry<f64> = geometry
            .try_into()
            .map_err(|e: geojson::Error| AreaError::InvalidGeoJson(e.to_string()))?;

        let polygon = match geo_geom {
            geo::Geometry::Polygon(p) => p,
            geo::Geometry::MultiPolygon(mp) if mp.0.len() == 1 => {
                mp.0.into_iter().next().ok_or(AreaError::ZeroArea)?
            }
            other => {
                return Err(AreaError::InvalidGeoJson(format!(
                    "expected a Polygon, got {}",
                    geometry_name(&other)
                )));
            }
        };

        if !polygon.interiors().is_empty() {
            log::debug!(
                "Ignoring {} interior ring(s) of GeoJSON area",
                polygon.interiors().len()
            );
        }

        let vertices: Vec<(f64, f64)> = polygon.exterior().coords().map(|c| (c.y, c.x)).collect();
        Self::from_lat_lon(&vertices)
    }

    /// The closed polygon (`x` = longitude, `y` = latitude).
    #[must_use]
    pub const fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Number of distinct vertices.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.distinct_vertices
    }

    /// Geodesic area on the WGS84 ellipsoid in square kilometers.
    #[must_use]
    pub fn area_km2(&self) -> f64 {
        self.polygon.geodesic_area_unsigned() / 1_000_000.0
    }
}

/// Whether every vertex lies on the line through the first two distinct
/// vertices.
fn is_collinear(ring: &[Coord<f64>]) -> bool {
    let Some(&origin) = ring.first() else {
        return true;
    };
    let Some(&direction) = ring.iter().find(|c| **c != origin) else {
        return true;
    };
    let d = direction - origin;

    ring.iter().all(|&c| {
        let v = c - origin;
        (d.x * v.y - d.y * v.x).abs() <= COLLINEAR_EPSILON
    })
}

const fn geometry_name(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Roughly 1.1 km square in Sulaimani.
    fn square() -> Vec<(f64, f64)> {
        vec![
            (35.55, 45.40),
            (35.55, 45.41),
            (35.56, 45.41),
            (35.56, 45.40),
        ]
    }

    #[test]
    fn closes_open_rings() {
        let area = AnalysisArea::from_lat_lon(&square()).unwrap();
        let exterior = area.polygon().exterior();
        assert_eq!(exterior.0.first(), exterior.0.last());
        assert_eq!(area.vertex_count(), 4);
    }

    #[test]
    fn accepts_already_closed_rings() {
        let mut closed = square();
        closed.push(closed[0]);
        let area = AnalysisArea::from_lat_lon(&closed).unwrap();
        assert_eq!(area.vertex_count(), 4);
    }

    #[test]
    fn rejects_fewer_than_three_distinct_vertices() {
        let err = AnalysisArea::from_lat_lon(&[(35.5, 45.4), (35.6, 45.4), (35.5, 45.4)])
            .unwrap_err();
        assert_eq!(err, AreaError::TooFewVertices { found: 2 });

        let err = AnalysisArea::from_lat_lon(&[]).unwrap_err();
        assert_eq!(err, AreaError::TooFewVertices { found: 0 });
    }

    #[test]
    fn rejects_collinear_vertices() {
        let err =
            AnalysisArea::from_lat_lon(&[(35.5, 45.4), (35.6, 45.5), (35.7, 45.6)]).unwrap_err();
        assert_eq!(err, AreaError::ZeroArea);
    }

    #[test]
    fn rejects_non_finite_and_out_of_range_coordinates() {
        let err = AnalysisArea::from_lat_lon(&[(35.5, 45.4), (f64::NAN, 45.5), (35.7, 45.6)])
            .unwrap_err();
        assert_eq!(err, AreaError::NonFiniteCoordinate { index: 1 });

        let err = AnalysisArea::from_lat_lon(&[(35.5, 45.4), (35.6, 45.5), (95.0, 45.6)])
            .unwrap_err();
        assert!(matches!(
            err,
            AreaError::CoordinateOutOfRange { index: 2, .. }
        ));
    }

    #[test]
    fn accepts_self_intersecting_rings() {
        let bowtie = [(35.50, 45.40), (35.51, 45.41), (35.50, 45.41), (35.51, 45.40)];
        assert!(AnalysisArea::from_lat_lon(&bowtie).is_ok());
    }

    #[test]
    fn geodesic_area_is_close_to_expected() {
        // 0.01° x 0.01° at 35.55°N is about 1.112 km * 0.905 km.
        let area = AnalysisArea::from_lat_lon(&square()).unwrap().area_km2();
        assert!((area - 1.006).abs() < 0.02, "unexpected area {area}");
    }

    #[test]
    fn winding_direction_does_not_change_area() {
        let counter_clockwise = AnalysisArea::from_lat_lon(&square()).unwrap();
        let mut reversed = square();
        reversed.reverse();
        let clockwise = AnalysisArea::from_lat_lon(&reversed).unwrap();

        assert!((clockwise.area_km2() - counter_clockwise.area_km2()).abs() < 1e-9);
        assert!(clockwise.area_km2() < 2.0);
    }

    #[test]
    fn parses_geojson_polygon_in_lon_lat_order() {
        let json = r#"{
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[45.40, 35.55], [45.41, 35.55], [45.41, 35.56], [45.40, 35.56], [45.40, 35.55]]]
            }
        }"#;
        let from_json = AnalysisArea::from_geojson(json).unwrap();
        let from_vertices = AnalysisArea::from_lat_lon(&square()).unwrap();
        assert!((from_json.area_km2() - from_vertices.area_km2()).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_polygon_geojson() {
        let json = r#"{"type": "Point", "coordinates": [45.4, 35.5]}"#;
        assert!(matches!(
            AnalysisArea::from_geojson(json),
            Err(AreaError::InvalidGeoJson(_))
        ));
        assert!(matches!(
            AnalysisArea::from_geojson("not json"),
            Err(AreaError::InvalidGeoJson(_))
        ));
    }
}
