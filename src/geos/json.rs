//! GeoJSON conversion.
//!
//! Serialization walks the typed geometry tree and builds a `geojson::Value`;
//! parsing does the reverse. SRIDs do not appear in GeoJSON output and parsed
//! geometries carry none.

use geojson::Value;

use crate::error::{GeobindError, Result};
use crate::geos::collections::{GeometryCollection, MultiLineString, MultiPoint, MultiPolygon};
use crate::geos::coordseq::Coord;
use crate::geos::geometry::{AnyGeometry, Geometry};
use crate::geos::linestring::{LineString, LinearRing};
use crate::geos::point::Point;
use crate::geos::polygon::Polygon;

pub(crate) fn to_geojson(geometry: &Geometry) -> Result<String> {
    let value = value_of(&geometry.try_clone().and_then(AnyGeometry::from_geometry)?)?;
    serde_json::to_string(&geojson::Geometry::new(value))
        .map_err(|err| GeobindError::GeometryConstruction(err.to_string()))
}

pub(crate) fn from_geojson(json: &str) -> Result<AnyGeometry> {
    let document: geojson::GeoJson = json
        .parse()
        .map_err(|err: geojson::Error| GeobindError::GeometryConstruction(err.to_string()))?;
    match document {
        geojson::GeoJson::Geometry(geometry) => from_value(&geometry.value),
        other => Err(GeobindError::GeometryConstruction(format!(
            "expected a GeoJSON geometry, got a {}",
            match other {
                geojson::GeoJson::Feature(_) => "Feature",
                _ => "FeatureCollection",
            }
        ))),
    }
}

fn position(coord: Coord) -> Vec<f64> {
    match coord.z {
        Some(z) => vec![coord.x, coord.y, z],
        None => vec![coord.x, coord.y],
    }
}

fn positions(coords: Vec<Coord>) -> Vec<Vec<f64>> {
    coords.into_iter().map(position).collect()
}

fn polygon_rings(polygon: &Polygon) -> Result<Vec<Vec<Vec<f64>>>> {
    if polygon.is_empty()? {
        return Ok(Vec::new());
    }
    let mut rings = vec![positions(polygon.exterior_ring()?.coords()?)];
    for i in 0..polygon.num_interior_rings()? {
        rings.push(positions(polygon.interior_ring(i)?.coords()?));
    }
    Ok(rings)
}

fn value_of(geometry: &AnyGeometry) -> Result<Value> {
    Ok(match geometry {
        AnyGeometry::Point(point) => Value::Point(if point.is_empty()? {
            Vec::new()
        } else {
            position(point.coord()?)
        }),
        AnyGeometry::LineString(line) => Value::LineString(positions(line.coords()?)),
        AnyGeometry::LinearRing(ring) => Value::LineString(positions(ring.coords()?)),
        AnyGeometry::Polygon(polygon) => Value::Polygon(polygon_rings(polygon)?),
        AnyGeometry::MultiPoint(multi) => {
            let mut points = Vec::with_capacity(multi.len()?);
            for member in multi.members()? {
                points.push(position(Point::try_from(member)?.coord()?));
            }
            Value::MultiPoint(points)
        }
        AnyGeometry::MultiLineString(multi) => {
            let mut lines = Vec::with_capacity(multi.len()?);
            for member in multi.members()? {
                lines.push(positions(LineString::try_from(member)?.coords()?));
            }
            Value::MultiLineString(lines)
        }
        AnyGeometry::MultiPolygon(multi) => {
            let mut polygons = Vec::with_capacity(multi.len()?);
            for member in multi.members()? {
                polygons.push(polygon_rings(&Polygon::try_from(member)?)?);
            }
            Value::MultiPolygon(polygons)
        }
        AnyGeometry::GeometryCollection(collection) => {
            let mut members = Vec::with_capacity(collection.len()?);
            for member in collection.members()? {
                members.push(geojson::Geometry::new(value_of(&member)?));
            }
            Value::GeometryCollection(members)
        }
    })
}

fn coord(position: &[f64]) -> Result<Coord> {
    match *position {
        [x, y] => Ok(Coord::new(x, y)),
        [x, y, z, ..] => Ok(Coord::new_3d(x, y, z)),
        _ => Err(GeobindError::GeometryConstruction(
            "GeoJSON position needs at least two ordinates".to_string(),
        )),
    }
}

fn coords(positions: &[Vec<f64>]) -> Result<Vec<Coord>> {
    positions.iter().map(|p| coord(p)).collect()
}

fn polygon(rings: &[Vec<Vec<f64>>]) -> Result<Polygon> {
    let mut it = rings.iter();
    let exterior = match it.next() {
        Some(ring) => LinearRing::new(&coords(ring)?)?,
        None => {
            return AnyGeometry::empty(crate::geos::geometry::GeometryType::Polygon)
                .and_then(Polygon::try_from)
        }
    };
    let interiors = it
        .map(|ring| LinearRing::new(&coords(ring)?))
        .collect::<Result<Vec<_>>>()?;
    Polygon::new(&exterior, &interiors.iter().collect::<Vec<_>>())
}

fn from_value(value: &Value) -> Result<AnyGeometry> {
    Ok(match value {
        Value::Point(p) if p.is_empty() => {
            AnyGeometry::empty(crate::geos::geometry::GeometryType::Point)?
        }
        Value::Point(p) => AnyGeometry::Point(Point::from_coord(coord(p)?)?),
        Value::LineString(p) => AnyGeometry::LineString(LineString::new(&coords(p)?)?),
        Value::Polygon(rings) => AnyGeometry::Polygon(polygon(rings)?),
        Value::MultiPoint(points) => {
            let members = points
                .iter()
                .map(|p| Ok(AnyGeometry::Point(Point::from_coord(coord(p)?)?)))
                .collect::<Result<Vec<_>>>()?;
            AnyGeometry::MultiPoint(MultiPoint::new(&members)?)
        }
        Value::MultiLineString(lines) => {
            let members = lines
                .iter()
                .map(|p| Ok(AnyGeometry::LineString(LineString::new(&coords(p)?)?)))
                .collect::<Result<Vec<_>>>()?;
            AnyGeometry::MultiLineString(MultiLineString::new(&members)?)
        }
        Value::MultiPolygon(polygons) => {
            let members = polygons
                .iter()
                .map(|rings| Ok(AnyGeometry::Polygon(polygon(rings)?)))
                .collect::<Result<Vec<_>>>()?;
            AnyGeometry::MultiPolygon(MultiPolygon::new(&members)?)
        }
        Value::GeometryCollection(geometries) => {
            let members = geometries
                .iter()
                .map(|g| from_value(&g.value))
                .collect::<Result<Vec<_>>>()?;
            AnyGeometry::GeometryCollection(GeometryCollection::new(&members)?)
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn point_to_geojson() {
        let point = AnyGeometry::from_wkt("POINT (1 2)").unwrap();
        assert_eq!(
            point.geometry().geojson().unwrap(),
            r#"{"coordinates":[1.0,2.0],"type":"Point"}"#
        );
    }

    #[test]
    fn polygon_with_hole_round_trips() {
        let wkt = "POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0), (2 2, 2 4, 4 4, 4 2, 2 2))";
        let polygon = AnyGeometry::from_wkt(wkt).unwrap();
        let json = polygon.geometry().geojson().unwrap();
        let back = AnyGeometry::from_geojson(&json).unwrap();
        assert_eq!(back, polygon);
    }

    #[test]
    fn collection_round_trips() {
        let wkt = "GEOMETRYCOLLECTION (POINT (1 1), LINESTRING (0 0, 2 2))";
        let collection = AnyGeometry::from_wkt(wkt).unwrap();
        let back = AnyGeometry::from_geojson(&collection.geometry().geojson().unwrap()).unwrap();
        assert_eq!(back, collection);
    }

    #[test]
    fn parses_a_hand_written_document() {
        let json = r#"{"type": "MultiPoint", "coordinates": [[1, 2], [3, 4]]}"#;
        let multi = AnyGeometry::from_geojson(json).unwrap();
        let multi = match multi {
            AnyGeometry::MultiPoint(m) => m,
            other => panic!("expected a MultiPoint, got {:?}", other.kind()),
        };
        assert_eq!(multi.len().unwrap(), 2);
        assert_eq!(multi.get(1).unwrap().geometry().wkt().unwrap(), "POINT (3 4)");
    }

    #[test]
    fn rejects_malformed_documents() {
        let err = AnyGeometry::from_geojson("{not json").unwrap_err();
        assert!(matches!(err, GeobindError::GeometryConstruction(_)));
        let err = AnyGeometry::from_geojson(r#"{"type": "Point"}"#).unwrap_err();
        assert!(matches!(err, GeobindError::GeometryConstruction(_)));
    }
}
