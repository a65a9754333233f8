//! Polygon geometries.

use geos_sys::{
    GEOSGeom_createPolygon_r, GEOSGetExteriorRing_r, GEOSGetInteriorRingN_r,
    GEOSGetNumInteriorRings_r, GEOSGeometry,
};
use libc::{c_int, c_uint};

use crate::error::{GeobindError, Result};
use crate::geos::context::{native_error, with_context};
use crate::geos::geometry::{clone_children, clone_raw, geometry_wrapper, Geometry};
use crate::geos::linestring::LinearRing;

/// A polygon: one exterior ring plus zero or more interior rings (holes).
pub struct Polygon {
    base: Geometry,
}

geometry_wrapper!(Polygon);

impl Polygon {
    /// Build from rings. The rings are cloned into the polygon, so the
    /// arguments stay usable; a partial clone failure releases whatever was
    /// already cloned.
    pub fn new(exterior: &LinearRing, interiors: &[&LinearRing]) -> Result<Polygon> {
        let mut sources = Vec::with_capacity(interiors.len() + 1);
        sources.push(exterior.raw()?);
        for ring in interiors {
            sources.push(ring.raw()?);
        }
        let mut cloned = clone_children(&sources)?;
        let shell = cloned[0];
        let holes = &mut cloned[1..];
        let nholes = holes.len() as c_uint;
        // The factory consumes shell and holes, success or not.
        let ptr = with_context(|ctx| unsafe {
            GEOSGeom_createPolygon_r(ctx, shell, holes.as_mut_ptr(), nholes)
        })?;
        Ok(Polygon::from_base(Geometry::from_ptr(
            ptr,
            "GEOSGeom_createPolygon",
        )?))
    }

    /// Rectangle polygon from an `(xmin, ymin, xmax, ymax)` bounding box.
    pub fn from_bbox(bbox: (f64, f64, f64, f64)) -> Result<Polygon> {
        let (x0, y0, x1, y1) = bbox;
        let ring = LinearRing::new(&[(x0, y0), (x0, y1), (x1, y1), (x1, y0), (x0, y0)])?;
        Polygon::new(&ring, &[])
    }

    /// A clone of the exterior ring.
    pub fn exterior_ring(&self) -> Result<LinearRing> {
        let ptr = self.raw()?;
        let ring = with_context(|ctx| unsafe { GEOSGetExteriorRing_r(ctx, ptr.as_ptr()) })?;
        if ring.is_null() {
            return Err(native_error("GEOSGetExteriorRing"));
        }
        self.wrap_ring(ring)
    }

    pub fn num_interior_rings(&self) -> Result<usize> {
        let ptr = self.raw()?;
        let count =
            with_context(|ctx| unsafe { GEOSGetNumInteriorRings_r(ctx, ptr.as_ptr()) })?;
        if count < 0 {
            return Err(native_error("GEOSGetNumInteriorRings"));
        }
        Ok(count as usize)
    }

    /// A clone of the interior ring at `index`.
    pub fn interior_ring(&self, index: usize) -> Result<LinearRing> {
        let size = self.num_interior_rings()?;
        if index >= size {
            return Err(GeobindError::IndexOutOfRange { index, size });
        }
        let ptr = self.raw()?;
        let ring = with_context(|ctx| unsafe {
            GEOSGetInteriorRingN_r(ctx, ptr.as_ptr(), index as c_int)
        })?;
        if ring.is_null() {
            return Err(native_error("GEOSGetInteriorRingN"));
        }
        self.wrap_ring(ring)
    }

    fn wrap_ring(&self, borrowed: *const GEOSGeometry) -> Result<LinearRing> {
        let mut ring = Geometry::from_ptr(clone_raw(borrowed)?, "GEOSGeom_clone")?;
        ring.inherit_srid(self)?;
        Ok(LinearRing::from_base(ring))
    }

    pub fn kml(&self) -> Result<String> {
        let mut kml = format!(
            "<Polygon><outerBoundaryIs>{}</outerBoundaryIs>",
            self.exterior_ring()?.kml()?
        );
        for i in 0..self.num_interior_rings()? {
            kml.push_str(&format!(
                "<innerBoundaryIs>{}</innerBoundaryIs>",
                self.interior_ring(i)?.kml()?
            ));
        }
        kml.push_str("</Polygon>");
        Ok(kml)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn unit_ring() -> LinearRing {
        LinearRing::new(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]).unwrap()
    }

    #[test]
    fn polygon_from_rings_does_not_consume_them() {
        let ring = unit_ring();
        let polygon = Polygon::new(&ring, &[]).unwrap();
        assert_eq!(
            polygon.wkt().unwrap(),
            "POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))"
        );
        // The source ring is still live and independent.
        assert_eq!(ring.num_points().unwrap(), 5);
    }

    #[test]
    fn polygon_with_hole() {
        let shell = LinearRing::new(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
            (0.0, 0.0),
        ])
        .unwrap();
        let hole =
            LinearRing::new(&[(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0), (4.0, 4.0)])
                .unwrap();
        let polygon = Polygon::new(&shell, &[&hole]).unwrap();
        assert_eq!(polygon.num_interior_rings().unwrap(), 1);
        assert_eq!(polygon.interior_ring(0).unwrap(), hole);
        assert!(matches!(
            polygon.interior_ring(1),
            Err(GeobindError::IndexOutOfRange { index: 1, size: 1 })
        ));
    }

    #[test]
    fn ring_accessors_return_clones() {
        let polygon = Polygon::new(&unit_ring(), &[]).unwrap();
        let mut exterior = polygon.exterior_ring().unwrap();
        exterior
            .set_coords(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 0.0)])
            .unwrap();
        // Mutating the returned ring leaves the polygon untouched.
        assert_eq!(
            polygon.wkt().unwrap(),
            "POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))"
        );
    }

    #[test]
    fn bbox_polygon() {
        let polygon = Polygon::from_bbox((0.0, 0.0, 2.0, 3.0)).unwrap();
        assert_eq!(
            polygon.wkt().unwrap(),
            "POLYGON ((0 0, 0 3, 2 3, 2 0, 0 0))"
        );
    }
}
