//! Safe wrappers over the OGR C API, the crate's second engine.
//!
//! OGR covers what GEOS does not: spatial reference systems, coordinate
//! transformation, and markup formats (GML, KML, OGR's GeoJSON dialect).
//! Geometries cross between the two engines as WKB with the SRID carried
//! alongside.

mod geometry;
mod geomtype;
mod srs;
mod util;

pub use geometry::OgrGeometry;
pub use geomtype::OgrGeometryType;
pub use srs::{CoordTransform, SpatialRef, SpatialRefInput};

use crate::error::Result;
use crate::geos::Geometry;

impl Geometry {
    /// Reproject in place by routing through the OGR engine.
    ///
    /// Requires an SRID; the result carries the target's EPSG code when it
    /// has one, and no SRID otherwise.
    pub fn transform<'a>(&mut self, target: impl Into<SpatialRefInput<'a>>) -> Result<()> {
        let mut carrier = OgrGeometry::from_geos(self)?;
        carrier.transform(target)?;
        let mut transformed = carrier.to_geos()?.into_geometry();
        self.swap_ptr(transformed.take_ptr()?);
        Ok(())
    }

    /// Like [`transform`](Geometry::transform), leaving this geometry
    /// untouched.
    pub fn transformed<'a>(
        &self,
        target: impl Into<SpatialRefInput<'a>>,
    ) -> Result<Geometry> {
        let mut clone = self.try_clone()?;
        clone.transform(target)?;
        Ok(clone)
    }
}

#[cfg(test)]
mod test {
    use crate::geos::AnyGeometry;

    #[test]
    fn geometries_reproject_through_the_second_engine() {
        let mut geom = AnyGeometry::from_wkt("SRID=4326;POINT (30 44)")
            .unwrap()
            .into_geometry();
        geom.transform(3857).unwrap();
        assert_eq!(geom.srid().unwrap(), Some(3857));
        assert!(geom.wkt().unwrap().starts_with("POINT (33395"));
    }

    #[test]
    fn transformed_leaves_the_original_alone() {
        let geom = AnyGeometry::from_wkt("SRID=4326;POINT (30 44)")
            .unwrap()
            .into_geometry();
        let projected = geom.transformed(3857).unwrap();
        assert_eq!(geom.srid().unwrap(), Some(4326));
        assert_eq!(projected.srid().unwrap(), Some(3857));
    }
}
