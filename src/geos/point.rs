//! Point geometries.

use geos_sys::GEOSGeom_createPoint_r;

use crate::error::{GeobindError, Result};
use crate::geos::context::with_context;
use crate::geos::coordseq::{
    clone_from_geometry, geometry_seq_ptr, kml_coordinates, seq_get_ordinate, seq_set_ordinate,
    Coord, CoordSeq, Dimensions,
};
use crate::geos::geometry::{geometry_wrapper, AnyGeometry, Geometry, GeometryType};

/// A single 2D or 3D point.
pub struct Point {
    base: Geometry,
}

geometry_wrapper!(Point);

impl Point {
    pub fn new(x: f64, y: f64) -> Result<Point> {
        Point::from_coord(Coord::new(x, y))
    }

    pub fn new_3d(x: f64, y: f64, z: f64) -> Result<Point> {
        Point::from_coord(Coord::new_3d(x, y, z))
    }

    pub fn empty() -> Result<Point> {
        AnyGeometry::empty(GeometryType::Point).and_then(Point::try_from)
    }

    pub fn from_coord(coord: impl Into<Coord>) -> Result<Point> {
        let coord = coord.into();
        let dims = match coord.z {
            Some(_) => Dimensions::Three,
            None => Dimensions::Two,
        };
        let mut seq = CoordSeq::new(1, dims)?;
        seq.set(0, coord)?;
        Point::from_seq(seq)
    }

    /// Build a point from a one-coordinate sequence, consuming it.
    pub fn from_seq(seq: CoordSeq) -> Result<Point> {
        let raw = seq.take()?;
        let ptr = with_context(|ctx| unsafe { GEOSGeom_createPoint_r(ctx, raw) })?;
        Ok(Point::from_base(Geometry::from_ptr(
            ptr,
            "GEOSGeom_createPoint",
        )?))
    }

    pub fn x(&self) -> Result<f64> {
        self.ordinate(0)
    }

    pub fn y(&self) -> Result<f64> {
        self.ordinate(1)
    }

    /// The z ordinate, `None` for 2D points.
    pub fn z(&self) -> Result<Option<f64>> {
        if self.has_z()? {
            Ok(Some(self.ordinate(2)?))
        } else {
            Ok(None)
        }
    }

    pub fn set_x(&mut self, value: f64) -> Result<()> {
        self.set_ordinate(0, value)
    }

    pub fn set_y(&mut self, value: f64) -> Result<()> {
        self.set_ordinate(1, value)
    }

    /// Fails on 2D points: the native storage has no z slot to write.
    pub fn set_z(&mut self, value: f64) -> Result<()> {
        if !self.has_z()? {
            return Err(GeobindError::DimensionMismatch {
                expected: 2,
                found: 3,
            });
        }
        self.set_ordinate(2, value)
    }

    fn ordinate(&self, dimension: usize) -> Result<f64> {
        seq_get_ordinate(geometry_seq_ptr(&self.base)?, 0, dimension)
    }

    fn set_ordinate(&mut self, dimension: usize, value: f64) -> Result<()> {
        seq_set_ordinate(geometry_seq_ptr(&self.base)?, 0, dimension, value)
    }

    /// The point as a single coordinate.
    pub fn coord(&self) -> Result<Coord> {
        let x = self.x()?;
        let y = self.y()?;
        let z = self.z()?;
        Ok(Coord { x, y, z })
    }

    /// Deep copy of the underlying coordinate sequence.
    pub fn coord_seq(&self) -> Result<CoordSeq> {
        clone_from_geometry(&self.base)
    }

    pub fn kml(&self) -> Result<String> {
        Ok(format!(
            "<Point>{}</Point>",
            kml_coordinates(&[self.coord()?])
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::GeobindError;
    use crate::geos::geometry::AnyGeometry;
    use approx::assert_relative_eq;

    #[test]
    fn two_dimensional_point_wkt() {
        let point = Point::new(1.0, 2.0).unwrap();
        assert_eq!(point.wkt().unwrap(), "POINT (1 2)");
        assert_eq!(point.z().unwrap(), None);
    }

    #[test]
    fn empty_point() {
        let point = Point::empty().unwrap();
        assert!(point.is_empty().unwrap());
        assert_eq!(point.wkt().unwrap(), "POINT EMPTY");
    }

    #[test]
    fn three_dimensional_point_wkt() {
        let point = Point::new_3d(1.0, 2.0, 3.0).unwrap();
        assert_eq!(point.wkt().unwrap(), "POINT Z (1 2 3)");
        assert_relative_eq!(point.z().unwrap().unwrap(), 3.0);
    }

    #[test]
    fn ordinates_mutate_in_place() {
        let mut point = Point::new(5.0, 23.0).unwrap();
        point.set_x(-1.5).unwrap();
        point.set_y(42.0).unwrap();
        assert_relative_eq!(point.x().unwrap(), -1.5);
        assert_relative_eq!(point.y().unwrap(), 42.0);
        assert!(point.set_z(1.0).is_err());
    }

    #[test]
    fn typed_conversion_enforces_kind() {
        let any = AnyGeometry::from_wkt("LINESTRING (0 0, 1 1)").unwrap();
        match Point::try_from(any) {
            Err(GeobindError::TypeMismatch { expected, found }) => {
                assert_eq!(expected, "Point");
                assert_eq!(found, "LineString");
            }
            other => panic!("expected type mismatch, got {other:?}"),
        }
    }

    #[test]
    fn point_kml() {
        let point = Point::new(1.0, 2.0).unwrap();
        assert_eq!(
            point.kml().unwrap(),
            "<Point><coordinates>1,2,0</coordinates></Point>"
        );
    }
}
