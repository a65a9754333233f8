//! Geometry collections: `GeometryCollection`, `MultiPoint`,
//! `MultiLineString` and `MultiPolygon`.
//!
//! The native store is a fixed array assembled at construction. Membership
//! changes rebuild the whole native collection from cloned children and swap
//! it in; the previous pointer is released only after the replacement
//! exists, so a failed rebuild never drops the only live collection.

use geos_sys::GEOSGeom_createCollection_r;
use libc::c_uint;

use crate::error::{GeobindError, Result};
use crate::geos::context::{native_error, with_context};
use crate::geos::geometry::{
    clone_children, clone_raw, geometry_wrapper, AnyGeometry, Geometry, GeometryType,
};
use crate::geos::linestring::rebuild_in_place;

use geos_sys::{GEOSGetGeometryN_r, GEOSGetNumGeometries_r};
use libc::c_int;

/// Allowed child kinds per collection subtype. Checked before any native
/// call, from the members' construction-time tags.
fn allowed_children(collection: GeometryType) -> &'static [GeometryType] {
    match collection {
        GeometryType::MultiPoint => &[GeometryType::Point],
        GeometryType::MultiLineString => &[GeometryType::LineString, GeometryType::LinearRing],
        GeometryType::MultiPolygon => &[GeometryType::Polygon],
        _ => &[
            GeometryType::Point,
            GeometryType::LineString,
            GeometryType::LinearRing,
            GeometryType::Polygon,
            GeometryType::MultiPoint,
            GeometryType::MultiLineString,
            GeometryType::MultiPolygon,
        ],
    }
}

fn check_members(collection: GeometryType, members: &[AnyGeometry]) -> Result<()> {
    let allowed = allowed_children(collection);
    for member in members {
        if !allowed.contains(&member.kind()) {
            return Err(GeobindError::InvalidChildType {
                collection: collection.name(),
                child: member.kind().name(),
            });
        }
    }
    Ok(())
}

/// Clone every member and assemble a new native collection.
fn create_collection(collection: GeometryType, members: &[AnyGeometry]) -> Result<Geometry> {
    check_members(collection, members)?;
    let sources = members
        .iter()
        .map(|m| m.raw())
        .collect::<Result<Vec<_>>>()?;
    let mut cloned = clone_children(&sources)?;
    let count = cloned.len() as c_uint;
    // The factory consumes the cloned children, success or not.
    let ptr = with_context(|ctx| unsafe {
        GEOSGeom_createCollection_r(ctx, collection.into(), cloned.as_mut_ptr(), count)
    })?;
    Geometry::from_ptr(ptr, "GEOSGeom_createCollection")
}

fn member_count(base: &Geometry) -> Result<usize> {
    let ptr = base.raw()?;
    let count = with_context(|ctx| unsafe { GEOSGetNumGeometries_r(ctx, ptr.as_ptr()) })?;
    if count < 0 {
        return Err(native_error("GEOSGetNumGeometries"));
    }
    Ok(count as usize)
}

/// Clone the member at `index` out of the native array. Never aliases: the
/// caller's handle stays valid if the collection is released.
fn member_at(base: &Geometry, index: usize) -> Result<AnyGeometry> {
    let size = member_count(base)?;
    if index >= size {
        return Err(GeobindError::IndexOutOfRange { index, size });
    }
    let ptr = base.raw()?;
    let borrowed =
        with_context(|ctx| unsafe { GEOSGetGeometryN_r(ctx, ptr.as_ptr(), index as c_int) })?;
    if borrowed.is_null() {
        return Err(native_error("GEOSGetGeometryN"));
    }
    let mut child = Geometry::from_ptr(clone_raw(borrowed)?, "GEOSGeom_clone")?;
    child.inherit_srid(base)?;
    AnyGeometry::from_geometry(child)
}

/// Replace the member at `index`, rebuilding the native store.
fn set_member(
    base: &mut Geometry,
    collection: GeometryType,
    index: usize,
    value: &AnyGeometry,
) -> Result<()> {
    let size = member_count(base)?;
    if index >= size {
        return Err(GeobindError::IndexOutOfRange { index, size });
    }
    let mut members = Vec::with_capacity(size);
    for i in 0..size {
        if i == index {
            members.push(value.try_clone()?);
        } else {
            members.push(member_at(base, i)?);
        }
    }
    let replacement = create_collection(collection, &members)?;
    rebuild_in_place(base, replacement)
}

fn push_member(base: &mut Geometry, collection: GeometryType, value: &AnyGeometry) -> Result<()> {
    let size = member_count(base)?;
    let mut members = Vec::with_capacity(size + 1);
    for i in 0..size {
        members.push(member_at(base, i)?);
    }
    members.push(value.try_clone()?);
    let replacement = create_collection(collection, &members)?;
    rebuild_in_place(base, replacement)
}

macro_rules! collection_type {
    ($(#[$doc:meta])* $name:ident, $kind:expr, $kml_tag:expr) => {
        $(#[$doc])*
        pub struct $name {
            base: Geometry,
        }

        geometry_wrapper!($name);

        impl $name {
            /// Build from members, cloning each one; the arguments stay
            /// usable. Disallowed child kinds fail before any native call.
            pub fn new(members: &[AnyGeometry]) -> Result<$name> {
                Ok($name::from_base(create_collection($kind, members)?))
            }

            /// Number of members.
            pub fn len(&self) -> Result<usize> {
                member_count(&self.base)
            }

            /// A clone of the member at `index`, never an alias into the
            /// live native array.
            pub fn get(&self, index: usize) -> Result<AnyGeometry> {
                member_at(&self.base, index)
            }

            /// Replace one member, rebuilding the native collection.
            pub fn set(&mut self, index: usize, value: &AnyGeometry) -> Result<()> {
                set_member(&mut self.base, $kind, index, value)
            }

            /// Append one member, rebuilding the native collection.
            pub fn push(&mut self, value: &AnyGeometry) -> Result<()> {
                push_member(&mut self.base, $kind, value)
            }

            /// Replace the whole member set, rebuilding the native
            /// collection. The SRID carries over.
            pub fn replace_all(&mut self, members: &[AnyGeometry]) -> Result<()> {
                let replacement = create_collection($kind, members)?;
                rebuild_in_place(&mut self.base, replacement)
            }

            /// Clones of all members.
            pub fn members(&self) -> Result<Vec<AnyGeometry>> {
                (0..self.len()?).map(|i| self.get(i)).collect()
            }

            pub fn kml(&self) -> Result<String> {
                let mut kml = String::from(concat!("<", $kml_tag, ">"));
                for member in self.members()? {
                    kml.push_str(&member.kml()?);
                }
                kml.push_str(concat!("</", $kml_tag, ">"));
                Ok(kml)
            }
        }
    };
}

collection_type!(
    /// A heterogeneous collection of non-collection members plus the three
    /// multi types.
    GeometryCollection,
    GeometryType::GeometryCollection,
    "MultiGeometry"
);

collection_type!(
    /// A collection accepting only points.
    MultiPoint,
    GeometryType::MultiPoint,
    "MultiGeometry"
);

collection_type!(
    /// A collection accepting line strings and rings.
    MultiLineString,
    GeometryType::MultiLineString,
    "MultiGeometry"
);

collection_type!(
    /// A collection accepting only polygons.
    MultiPolygon,
    GeometryType::MultiPolygon,
    "MultiGeometry"
);

#[cfg(test)]
mod test {
    use super::*;
    use crate::geos::point::Point;

    fn point(x: f64, y: f64) -> AnyGeometry {
        AnyGeometry::Point(Point::new(x, y).unwrap())
    }

    #[test]
    fn multi_point_round_trip() {
        let collection = MultiPoint::new(&[point(0.0, 0.0), point(1.0, 1.0)]).unwrap();
        assert_eq!(collection.len().unwrap(), 2);
        assert_eq!(collection.get(0).unwrap().wkt().unwrap(), "POINT (0 0)");
        assert_eq!(collection.get(1).unwrap().wkt().unwrap(), "POINT (1 1)");
    }

    #[test]
    fn non_point_child_is_rejected_before_construction() {
        use crate::geos::geometry::CLONES_MADE;

        let line = AnyGeometry::from_wkt("LINESTRING (0 0, 1 1)").unwrap();
        let clones_before = CLONES_MADE.with(std::cell::Cell::get);
        match MultiPoint::new(&[point(0.0, 0.0), line]) {
            Err(GeobindError::InvalidChildType { collection, child }) => {
                assert_eq!(collection, "MultiPoint");
                assert_eq!(child, "LineString");
            }
            other => panic!("expected invalid child type, got {other:?}"),
        }
        // The membership check runs before any child is cloned natively.
        assert_eq!(CLONES_MADE.with(std::cell::Cell::get), clones_before);
    }

    #[test]
    fn collections_do_not_nest_in_multi_types() {
        let inner = AnyGeometry::GeometryCollection(GeometryCollection::new(&[]).unwrap());
        assert!(matches!(
            GeometryCollection::new(&[inner]),
            Err(GeobindError::InvalidChildType { .. })
        ));
    }

    #[test]
    fn indexed_read_returns_equivalent_clone() {
        let original = point(3.0, 4.0);
        let collection = MultiPoint::new(&[point(0.0, 0.0), original.try_clone().unwrap()])
            .unwrap();
        let read = collection.get(1).unwrap();
        assert_eq!(read.wkt().unwrap(), original.wkt().unwrap());
        // The read member survives the parent's release.
        drop(collection);
        assert_eq!(read.wkt().unwrap(), "POINT (3 4)");
    }

    #[test]
    fn set_rebuilds_and_preserves_others() {
        let mut collection =
            MultiPoint::new(&[point(0.0, 0.0), point(1.0, 1.0), point(2.0, 2.0)]).unwrap();
        collection.set(1, &point(9.0, 9.0)).unwrap();
        assert_eq!(collection.len().unwrap(), 3);
        assert_eq!(collection.get(0).unwrap().wkt().unwrap(), "POINT (0 0)");
        assert_eq!(collection.get(1).unwrap().wkt().unwrap(), "POINT (9 9)");
        assert_eq!(collection.get(2).unwrap().wkt().unwrap(), "POINT (2 2)");
        assert!(matches!(
            collection.set(3, &point(0.0, 0.0)),
            Err(GeobindError::IndexOutOfRange { index: 3, size: 3 })
        ));
    }

    #[test]
    fn push_and_replace_all() {
        let mut collection = MultiPoint::new(&[point(0.0, 0.0)]).unwrap();
        collection.push(&point(1.0, 2.0)).unwrap();
        assert_eq!(collection.len().unwrap(), 2);
        collection.replace_all(&[point(7.0, 8.0)]).unwrap();
        assert_eq!(collection.len().unwrap(), 1);
        assert_eq!(collection.get(0).unwrap().wkt().unwrap(), "POINT (7 8)");
    }

    #[test]
    fn rebuild_keeps_srid() {
        let mut collection = match AnyGeometry::from_wkt("SRID=3857;MULTIPOINT (0 0)").unwrap() {
            AnyGeometry::MultiPoint(mp) => mp,
            other => panic!("expected multi point, got {:?}", other.kind()),
        };
        collection.push(&point(1.0, 1.0)).unwrap();
        assert_eq!(collection.srid().unwrap(), Some(3857));
    }

    #[test]
    fn heterogeneous_collection() {
        let line = AnyGeometry::from_wkt("LINESTRING (0 0, 1 1)").unwrap();
        let collection = GeometryCollection::new(&[point(0.0, 0.0), line]).unwrap();
        assert_eq!(collection.len().unwrap(), 2);
        assert_eq!(collection.get(1).unwrap().kind(), GeometryType::LineString);
    }
}
