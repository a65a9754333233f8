//! Line strings and linear rings.

use geos_sys::{GEOSGeom_createLineString_r, GEOSGeom_createLinearRing_r, GEOSGeomGetNumPoints_r, GEOSisClosed_r};

use crate::error::{GeobindError, Result};
use crate::geos::context::{check_predicate, native_error, with_context};
use crate::geos::coordseq::{
    clone_from_geometry, geometry_seq_ptr, kml_coordinates, seq_get_ordinate, seq_set_ordinate,
    Coord, CoordSeq,
};
use crate::geos::geometry::{geometry_wrapper, Geometry};

/// An open sequence of two or more vertices.
pub struct LineString {
    base: Geometry,
}

geometry_wrapper!(LineString);

/// A closed ring of at least four vertices, used as polygon boundary.
pub struct LinearRing {
    base: Geometry,
}

geometry_wrapper!(LinearRing);

impl LineString {
    /// Build from coordinates; a single vertex is rejected before any native
    /// call.
    pub fn new<C: Into<Coord> + Copy>(coords: &[C]) -> Result<LineString> {
        if coords.len() == 1 {
            return Err(GeobindError::GeometryConstruction(
                "LineString requires at least 2 points".to_string(),
            ));
        }
        LineString::from_seq(CoordSeq::from_coords(coords)?)
    }

    /// Build from a coordinate sequence, consuming it.
    pub fn from_seq(seq: CoordSeq) -> Result<LineString> {
        let raw = seq.take()?;
        let ptr = with_context(|ctx| unsafe { GEOSGeom_createLineString_r(ctx, raw) })?;
        Ok(LineString::from_base(Geometry::from_ptr(
            ptr,
            "GEOSGeom_createLineString",
        )?))
    }

    pub fn num_points(&self) -> Result<usize> {
        num_points(&self.base)
    }

    /// The coordinate at `index`.
    pub fn coord(&self, index: usize) -> Result<Coord> {
        coord_at(&self.base, index)
    }

    /// All vertices.
    pub fn coords(&self) -> Result<Vec<Coord>> {
        self.coord_seq()?.coords()
    }

    /// Overwrite one vertex in place. Structural changes (point count or
    /// dimensionality) require [`LineString::set_coords`].
    pub fn set_coord(&mut self, index: usize, coord: impl Into<Coord>) -> Result<()> {
        set_coord_in_place(&mut self.base, index, coord.into())
    }

    /// Replace all vertices. The native line string is immutable in size, so
    /// this builds a replacement and swaps it in; the old pointer is
    /// released only after the new one exists, and the SRID carries over.
    pub fn set_coords<C: Into<Coord> + Copy>(&mut self, coords: &[C]) -> Result<()> {
        if coords.len() == 1 {
            return Err(GeobindError::GeometryConstruction(
                "LineString requires at least 2 points".to_string(),
            ));
        }
        let replacement = LineString::new(coords)?;
        rebuild_in_place(&mut self.base, replacement.into_base())
    }

    pub fn is_closed(&self) -> Result<bool> {
        is_closed(&self.base)
    }

    /// Deep copy of the underlying coordinate sequence.
    pub fn coord_seq(&self) -> Result<CoordSeq> {
        clone_from_geometry(&self.base)
    }

    pub fn kml(&self) -> Result<String> {
        Ok(format!(
            "<LineString>{}</LineString>",
            kml_coordinates(&self.coords()?)
        ))
    }
}

impl LinearRing {
    /// Build a ring. It must be empty or closed with at least four vertices;
    /// both checks run before any native call.
    pub fn new<C: Into<Coord> + Copy>(coords: &[C]) -> Result<LinearRing> {
        if !coords.is_empty() {
            if coords.len() < 4 {
                return Err(GeobindError::GeometryConstruction(
                    "LinearRing requires at least 4 points".to_string(),
                ));
            }
            let first: Coord = coords[0].into();
            let last: Coord = coords[coords.len() - 1].into();
            if first != last {
                return Err(GeobindError::GeometryConstruction(
                    "LinearRing must be closed".to_string(),
                ));
            }
        }
        LinearRing::from_seq(CoordSeq::from_coords(coords)?)
    }

    /// Build from a coordinate sequence, consuming it.
    pub fn from_seq(seq: CoordSeq) -> Result<LinearRing> {
        let raw = seq.take()?;
        let ptr = with_context(|ctx| unsafe { GEOSGeom_createLinearRing_r(ctx, raw) })?;
        Ok(LinearRing::from_base(Geometry::from_ptr(
            ptr,
            "GEOSGeom_createLinearRing",
        )?))
    }

    pub fn num_points(&self) -> Result<usize> {
        num_points(&self.base)
    }

    pub fn coord(&self, index: usize) -> Result<Coord> {
        coord_at(&self.base, index)
    }

    pub fn coords(&self) -> Result<Vec<Coord>> {
        self.coord_seq()?.coords()
    }

    pub fn set_coord(&mut self, index: usize, coord: impl Into<Coord>) -> Result<()> {
        set_coord_in_place(&mut self.base, index, coord.into())
    }

    pub fn set_coords<C: Into<Coord> + Copy>(&mut self, coords: &[C]) -> Result<()> {
        let replacement = LinearRing::new(coords)?;
        rebuild_in_place(&mut self.base, replacement.into_base())
    }

    pub fn is_closed(&self) -> Result<bool> {
        is_closed(&self.base)
    }

    pub fn is_counterclockwise(&self) -> Result<bool> {
        self.coord_seq()?.is_counterclockwise()
    }

    pub fn coord_seq(&self) -> Result<CoordSeq> {
        clone_from_geometry(&self.base)
    }

    pub fn kml(&self) -> Result<String> {
        Ok(format!(
            "<LinearRing>{}</LinearRing>",
            kml_coordinates(&self.coords()?)
        ))
    }
}

fn num_points(base: &Geometry) -> Result<usize> {
    let ptr = base.raw()?;
    let count = with_context(|ctx| unsafe { GEOSGeomGetNumPoints_r(ctx, ptr.as_ptr()) })?;
    if count < 0 {
        return Err(native_error("GEOSGeomGetNumPoints"));
    }
    Ok(count as usize)
}

fn is_closed(base: &Geometry) -> Result<bool> {
    let ptr = base.raw()?;
    let ret = with_context(|ctx| unsafe { GEOSisClosed_r(ctx, ptr.as_ptr()) })?;
    check_predicate(ret, "GEOSisClosed")
}

fn coord_at(base: &Geometry, index: usize) -> Result<Coord> {
    let size = num_points(base)?;
    if index >= size {
        return Err(GeobindError::IndexOutOfRange { index, size });
    }
    let seq = geometry_seq_ptr(base)?;
    let x = seq_get_ordinate(seq, index, 0)?;
    let y = seq_get_ordinate(seq, index, 1)?;
    let z = if base.has_z()? {
        Some(seq_get_ordinate(seq, index, 2)?)
    } else {
        None
    };
    Ok(Coord { x, y, z })
}

fn set_coord_in_place(base: &mut Geometry, index: usize, coord: Coord) -> Result<()> {
    let size = num_points(base)?;
    if index >= size {
        return Err(GeobindError::IndexOutOfRange { index, size });
    }
    let expected = if base.has_z()? { 3 } else { 2 };
    if coord.dimensions() != expected {
        return Err(GeobindError::DimensionMismatch {
            expected,
            found: coord.dimensions(),
        });
    }
    let seq = geometry_seq_ptr(base)?;
    seq_set_ordinate(seq, index, 0, coord.x)?;
    seq_set_ordinate(seq, index, 1, coord.y)?;
    if let Some(z) = coord.z {
        seq_set_ordinate(seq, index, 2, z)?;
    }
    Ok(())
}

/// Swap a rebuilt native geometry into `base`, carrying the SRID over and
/// releasing the old pointer only after the replacement is installed.
pub(crate) fn rebuild_in_place(base: &mut Geometry, mut replacement: Geometry) -> Result<()> {
    replacement.inherit_srid(base)?;
    let ptr = replacement.take_ptr()?;
    base.swap_ptr(ptr);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geos::geometry::AnyGeometry;

    #[test]
    fn two_point_line() {
        let line = LineString::new(&[(0.0, 0.0), (1.0, 1.0)]).unwrap();
        assert_eq!(line.num_points().unwrap(), 2);
        assert_eq!(
            line.coords().unwrap(),
            vec![Coord::new(0.0, 0.0), Coord::new(1.0, 1.0)]
        );
        assert_eq!(line.wkt().unwrap(), "LINESTRING (0 0, 1 1)");
    }

    #[test]
    fn single_point_is_rejected_before_native_calls() {
        assert!(matches!(
            LineString::new(&[(0.0, 0.0)]),
            Err(GeobindError::GeometryConstruction(_))
        ));
    }

    #[test]
    fn vertex_mutation_in_place() {
        let mut line = LineString::new(&[(0.0, 0.0), (1.0, 1.0)]).unwrap();
        line.set_coord(1, (2.0, 2.0)).unwrap();
        assert_eq!(line.coord(1).unwrap(), Coord::new(2.0, 2.0));
        assert!(matches!(
            line.set_coord(5, (0.0, 0.0)),
            Err(GeobindError::IndexOutOfRange { index: 5, size: 2 })
        ));
    }

    #[test]
    fn structural_reset_rebuilds_and_keeps_srid() {
        let mut line = match AnyGeometry::from_wkt("SRID=4326;LINESTRING (0 0, 1 1)").unwrap() {
            AnyGeometry::LineString(l) => l,
            other => panic!("expected line string, got {:?}", other.kind()),
        };
        line.set_coords(&[(0.0, 0.0), (1.0, 0.0), (2.0, 5.0)]).unwrap();
        assert_eq!(line.num_points().unwrap(), 3);
        assert_eq!(line.srid().unwrap(), Some(4326));
    }

    #[test]
    fn ring_must_be_closed() {
        assert!(LinearRing::new(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]).is_err());
        let ring =
            LinearRing::new(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]).unwrap();
        assert!(ring.is_closed().unwrap());
        assert!(ring.is_counterclockwise().unwrap());
    }

    #[test]
    fn line_kml() {
        let line = LineString::new(&[(0.0, 0.0), (1.0, 1.0)]).unwrap();
        assert_eq!(
            line.kml().unwrap(),
            "<LineString><coordinates>0,0,0 1,1,0</coordinates></LineString>"
        );
    }
}
