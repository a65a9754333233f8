//! Prepared geometries: read-only accelerators for repeated predicate
//! queries against one fixed source geometry.

use std::ptr::NonNull;
use std::rc::Rc;

use geos_sys::{
    GEOSPrepare_r, GEOSPreparedContainsProperly_r, GEOSPreparedContains_r, GEOSPreparedCovers_r,
    GEOSPreparedCrosses_r, GEOSPreparedDisjoint_r, GEOSPreparedGeom_destroy_r,
    GEOSPreparedGeometry, GEOSPreparedIntersects_r, GEOSPreparedOverlaps_r,
    GEOSPreparedTouches_r, GEOSPreparedWithin_r, GEOSGeometry,
};

use crate::error::{GeobindError, Result};
use crate::geos::context::{check_predicate, take_last_error, with_context};
use crate::geos::geometry::Geometry;
use crate::handle::{Handle, NativeFree};

impl NativeFree for GEOSPreparedGeometry {
    unsafe fn free(ptr: NonNull<Self>) {
        let _ = with_context(|ctx| GEOSPreparedGeom_destroy_r(ctx, ptr.as_ptr()));
    }
}

/// A prepared geometry.
///
/// The accelerator never owns geometry data: it indexes into its source, so
/// the source must stay alive for the accelerator's whole lifetime. The
/// shared `source` reference enforces that, and field order guarantees the
/// accelerator is released before the source can be, whatever order the
/// caller drops its own handles in.
///
/// There is no mutation API; to query a changed geometry, build a new
/// prepared geometry from it.
pub struct PreparedGeometry {
    // Declared first: released before `source`.
    handle: Handle<GEOSPreparedGeometry>,
    source: Rc<Geometry>,
}

impl PreparedGeometry {
    pub fn new(source: impl Into<Rc<Geometry>>) -> Result<PreparedGeometry> {
        let source = source.into();
        let raw = source.raw()?;
        let ptr = with_context(|ctx| unsafe { GEOSPrepare_r(ctx, raw.as_ptr()) })?;
        let handle = Handle::new(ptr as *mut GEOSPreparedGeometry).ok_or_else(|| {
            GeobindError::Preparation(
                take_last_error().unwrap_or_else(|| "GEOSPrepare returned null".to_string()),
            )
        })?;
        Ok(PreparedGeometry { handle, source })
    }

    /// The geometry this accelerator was built from.
    pub fn source(&self) -> &Geometry {
        &self.source
    }

    pub fn contains(&self, other: &Geometry) -> Result<bool> {
        self.predicate(other, "GEOSPreparedContains", GEOSPreparedContains_r)
    }

    pub fn contains_properly(&self, other: &Geometry) -> Result<bool> {
        self.predicate(
            other,
            "GEOSPreparedContainsProperly",
            GEOSPreparedContainsProperly_r,
        )
    }

    pub fn covers(&self, other: &Geometry) -> Result<bool> {
        self.predicate(other, "GEOSPreparedCovers", GEOSPreparedCovers_r)
    }

    pub fn intersects(&self, other: &Geometry) -> Result<bool> {
        self.predicate(other, "GEOSPreparedIntersects", GEOSPreparedIntersects_r)
    }

    pub fn crosses(&self, other: &Geometry) -> Result<bool> {
        self.predicate(other, "GEOSPreparedCrosses", GEOSPreparedCrosses_r)
    }

    pub fn disjoint(&self, other: &Geometry) -> Result<bool> {
        self.predicate(other, "GEOSPreparedDisjoint", GEOSPreparedDisjoint_r)
    }

    pub fn overlaps(&self, other: &Geometry) -> Result<bool> {
        self.predicate(other, "GEOSPreparedOverlaps", GEOSPreparedOverlaps_r)
    }

    pub fn touches(&self, other: &Geometry) -> Result<bool> {
        self.predicate(other, "GEOSPreparedTouches", GEOSPreparedTouches_r)
    }

    pub fn within(&self, other: &Geometry) -> Result<bool> {
        self.predicate(other, "GEOSPreparedWithin", GEOSPreparedWithin_r)
    }

    fn predicate(
        &self,
        other: &Geometry,
        op: &'static str,
        f: unsafe extern "C" fn(
            geos_sys::GEOSContextHandle_t,
            *const GEOSPreparedGeometry,
            *const GEOSGeometry,
        ) -> libc::c_char,
    ) -> Result<bool> {
        let prepared = self.handle.get()?;
        let geom = other.raw()?;
        let ret = with_context(|ctx| unsafe { f(ctx, prepared.as_ptr(), geom.as_ptr()) })?;
        check_predicate(ret, op)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geos::geometry::AnyGeometry;

    fn polygon() -> Geometry {
        AnyGeometry::from_wkt("POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))")
            .unwrap()
            .into_geometry()
    }

    #[test]
    fn prepared_predicates() {
        let prepared = PreparedGeometry::new(polygon()).unwrap();
        let inside = AnyGeometry::from_wkt("POINT (5 5)").unwrap();
        let outside = AnyGeometry::from_wkt("POINT (50 50)").unwrap();
        assert!(prepared.contains(&inside).unwrap());
        assert!(prepared.contains_properly(&inside).unwrap());
        assert!(prepared.covers(&inside).unwrap());
        assert!(prepared.intersects(&inside).unwrap());
        assert!(!prepared.contains(&outside).unwrap());
        assert!(prepared.disjoint(&outside).unwrap());
    }

    #[test]
    fn source_outlives_caller_release_order() {
        // The caller's only handle to the source goes out of scope here; the
        // back-reference must keep the accelerator valid.
        let prepared = {
            let source = polygon();
            PreparedGeometry::new(source).unwrap()
        };
        let inside = AnyGeometry::from_wkt("POINT (5 5)").unwrap();
        assert!(prepared.contains(&inside).unwrap());
        assert!(!prepared.source().is_empty().unwrap());
    }

    #[test]
    fn shared_source_can_outlive_prepared() {
        let source = Rc::new(polygon());
        let prepared = PreparedGeometry::new(Rc::clone(&source)).unwrap();
        drop(prepared);
        // Releasing the accelerator first leaves the source untouched.
        assert!(!source.is_empty().unwrap());
    }
}
