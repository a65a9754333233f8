//! The base GEOS geometry handle and the typed geometry value returned by
//! every construction entry point.

use std::ptr::NonNull;
use std::rc::Rc;

use geos_sys::{
    GEOSBoundary_r, GEOSContains_r, GEOSConvexHull_r, GEOSCovers_r, GEOSCrosses_r,
    GEOSDifference_r, GEOSDisjoint_r, GEOSEquals_r, GEOSGeom_clone_r, GEOSGeom_createEmptyCollection_r,
    GEOSGeom_createEmptyLineString_r, GEOSGeom_createEmptyPoint_r, GEOSGeom_createEmptyPolygon_r,
    GEOSGeom_createLinearRing_r, GEOSGeom_destroy_r, GEOSGeomTypeId_r, GEOSGeometry,
    GEOSGetNumCoordinates_r, GEOSGetSRID_r, GEOSHasZ_r, GEOSIntersection_r, GEOSIntersects_r, GEOSNormalize_r,
    GEOSOverlaps_r, GEOSSetSRID_r, GEOSSymDifference_r, GEOSTouches_r, GEOSUnion_r,
    GEOSWithin_r, GEOSisEmpty_r,
};
use libc::c_int;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::{GeobindError, Result};
use crate::geos::collections::{GeometryCollection, MultiLineString, MultiPoint, MultiPolygon};
use crate::geos::context::{check_predicate, native_error, with_context};
use crate::geos::coordseq::{CoordSeq, Dimensions};
use crate::geos::io::{WkbReader, WkbWriter, WktReader, WktWriter};
use crate::geos::linestring::{LineString, LinearRing};
use crate::geos::point::Point;
use crate::geos::polygon::Polygon;
use crate::geos::prepared::PreparedGeometry;
use crate::handle::{Handle, NativeFree};

impl NativeFree for GEOSGeometry {
    unsafe fn free(ptr: NonNull<Self>) {
        let _ = with_context(|ctx| GEOSGeom_destroy_r(ctx, ptr.as_ptr()));
    }
}

/// Native geometry type codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum GeometryType {
    Point = 0,
    LineString = 1,
    LinearRing = 2,
    Polygon = 3,
    MultiPoint = 4,
    MultiLineString = 5,
    MultiPolygon = 6,
    GeometryCollection = 7,
}

impl GeometryType {
    pub fn name(self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::LinearRing => "LinearRing",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::MultiPolygon => "MultiPolygon",
            GeometryType::GeometryCollection => "GeometryCollection",
        }
    }

    /// Parse a bare type name, case-insensitively.
    pub fn from_name(name: &str) -> Result<GeometryType> {
        let all = [
            GeometryType::Point,
            GeometryType::LineString,
            GeometryType::LinearRing,
            GeometryType::Polygon,
            GeometryType::MultiPoint,
            GeometryType::MultiLineString,
            GeometryType::MultiPolygon,
            GeometryType::GeometryCollection,
        ];
        all.into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                GeobindError::GeometryConstruction(format!("unknown geometry type {name:?}"))
            })
    }
}

impl std::fmt::Display for GeometryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An owned GEOS geometry pointer.
///
/// This is the base handle every typed wrapper derefs to: it carries the
/// predicates, the geometry-generating operations and the export accessors.
/// The SRID lives in the native object (0 means unset).
pub struct Geometry {
    handle: Handle<GEOSGeometry>,
}

impl Geometry {
    /// Take ownership of a pointer returned by a native factory.
    pub(crate) fn from_ptr(ptr: *mut GEOSGeometry, op: &'static str) -> Result<Geometry> {
        let handle = Handle::new(ptr).ok_or_else(|| native_error(op))?;
        Ok(Geometry { handle })
    }

    pub(crate) fn raw(&self) -> Result<NonNull<GEOSGeometry>> {
        self.handle.get()
    }

    /// Commit a rebuilt native geometry, releasing the previous pointer only
    /// after the swap.
    pub(crate) fn swap_ptr(&mut self, ptr: NonNull<GEOSGeometry>) {
        self.handle.swap(ptr);
    }

    /// Transfer the native pointer out, leaving this handle released.
    pub(crate) fn take_ptr(&mut self) -> Result<NonNull<GEOSGeometry>> {
        self.handle.take()
    }

    /// The native type code, mapped to [`GeometryType`].
    pub fn geometry_type(&self) -> Result<GeometryType> {
        let ptr = self.raw()?;
        let code = with_context(|ctx| unsafe { GEOSGeomTypeId_r(ctx, ptr.as_ptr()) })?;
        if code < 0 {
            return Err(native_error("GEOSGeomTypeId"));
        }
        GeometryType::try_from(code)
            .map_err(|_| GeobindError::GeometryConstruction(format!("unknown type code {code}")))
    }

    /// Spatial reference identifier attached to this geometry, if any.
    pub fn srid(&self) -> Result<Option<i32>> {
        let ptr = self.raw()?;
        let srid = with_context(|ctx| unsafe { GEOSGetSRID_r(ctx, ptr.as_ptr()) })?;
        Ok((srid != 0).then_some(srid))
    }

    pub fn set_srid(&mut self, srid: i32) -> Result<()> {
        let ptr = self.raw()?;
        with_context(|ctx| unsafe { GEOSSetSRID_r(ctx, ptr.as_ptr(), srid as c_int) })
    }

    pub(crate) fn inherit_srid(&mut self, source: &Geometry) -> Result<()> {
        if let Some(srid) = source.srid()? {
            self.set_srid(srid)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> Result<bool> {
        let ptr = self.raw()?;
        let ret = with_context(|ctx| unsafe { GEOSisEmpty_r(ctx, ptr.as_ptr()) })?;
        check_predicate(ret, "GEOSisEmpty")
    }

    pub fn has_z(&self) -> Result<bool> {
        let ptr = self.raw()?;
        let ret = with_context(|ctx| unsafe { GEOSHasZ_r(ctx, ptr.as_ptr()) })?;
        check_predicate(ret, "GEOSHasZ")
    }

    /// Total number of coordinates, counting every ring and member.
    pub fn num_coords(&self) -> Result<usize> {
        let ptr = self.raw()?;
        let count = with_context(|ctx| unsafe { GEOSGetNumCoordinates_r(ctx, ptr.as_ptr()) })?;
        if count < 0 {
            return Err(native_error("GEOSGetNumCoordinates"));
        }
        Ok(count as usize)
    }

    /// Convert to canonical form in place.
    pub fn normalize(&mut self) -> Result<()> {
        let ptr = self.raw()?;
        let ret = with_context(|ctx| unsafe { GEOSNormalize_r(ctx, ptr.as_ptr()) })?;
        if ret == -1 {
            return Err(native_error("GEOSNormalize"));
        }
        Ok(())
    }

    /// Deep copy owning an independent native pointer; SRID carries over.
    pub fn try_clone(&self) -> Result<Geometry> {
        let ptr = self.raw()?;
        let cloned = with_context(|ctx| unsafe { GEOSGeom_clone_r(ctx, ptr.as_ptr()) })?;
        Geometry::from_ptr(cloned, "GEOSGeom_clone")
    }

    /// Build the read-only accelerator for repeated predicate queries. The
    /// prepared geometry keeps `self` alive for its whole lifetime.
    pub fn prepare(self) -> Result<PreparedGeometry> {
        PreparedGeometry::new(Rc::new(self))
    }

    // Topology predicates. Each one delegates to a single native boolean
    // function through the per-thread adapter.

    pub fn intersects(&self, other: &Geometry) -> Result<bool> {
        self.binary_predicate(other, "GEOSIntersects", GEOSIntersects_r)
    }

    pub fn disjoint(&self, other: &Geometry) -> Result<bool> {
        self.binary_predicate(other, "GEOSDisjoint", GEOSDisjoint_r)
    }

    pub fn touches(&self, other: &Geometry) -> Result<bool> {
        self.binary_predicate(other, "GEOSTouches", GEOSTouches_r)
    }

    pub fn crosses(&self, other: &Geometry) -> Result<bool> {
        self.binary_predicate(other, "GEOSCrosses", GEOSCrosses_r)
    }

    pub fn within(&self, other: &Geometry) -> Result<bool> {
        self.binary_predicate(other, "GEOSWithin", GEOSWithin_r)
    }

    pub fn contains(&self, other: &Geometry) -> Result<bool> {
        self.binary_predicate(other, "GEOSContains", GEOSContains_r)
    }

    pub fn overlaps(&self, other: &Geometry) -> Result<bool> {
        self.binary_predicate(other, "GEOSOverlaps", GEOSOverlaps_r)
    }

    pub fn covers(&self, other: &Geometry) -> Result<bool> {
        self.binary_predicate(other, "GEOSCovers", GEOSCovers_r)
    }

    /// Topological equality, not pointer identity.
    pub fn equals(&self, other: &Geometry) -> Result<bool> {
        self.binary_predicate(other, "GEOSEquals", GEOSEquals_r)
    }

    fn binary_predicate(
        &self,
        other: &Geometry,
        op: &'static str,
        f: unsafe extern "C" fn(
            geos_sys::GEOSContextHandle_t,
            *const GEOSGeometry,
            *const GEOSGeometry,
        ) -> libc::c_char,
    ) -> Result<bool> {
        let a = self.raw()?;
        let b = other.raw()?;
        let ret = with_context(|ctx| unsafe { f(ctx, a.as_ptr(), b.as_ptr()) })?;
        check_predicate(ret, op)
    }

    // Geometry-generating operations. Results are new handles inheriting the
    // left operand's SRID; neither input is mutated.

    pub fn union(&self, other: &Geometry) -> Result<AnyGeometry> {
        self.binary_topology(other, "GEOSUnion", GEOSUnion_r)
    }

    pub fn intersection(&self, other: &Geometry) -> Result<AnyGeometry> {
        self.binary_topology(other, "GEOSIntersection", GEOSIntersection_r)
    }

    pub fn difference(&self, other: &Geometry) -> Result<AnyGeometry> {
        self.binary_topology(other, "GEOSDifference", GEOSDifference_r)
    }

    pub fn sym_difference(&self, other: &Geometry) -> Result<AnyGeometry> {
        self.binary_topology(other, "GEOSSymDifference", GEOSSymDifference_r)
    }

    pub fn boundary(&self) -> Result<AnyGeometry> {
        self.unary_topology("GEOSBoundary", GEOSBoundary_r)
    }

    pub fn convex_hull(&self) -> Result<AnyGeometry> {
        self.unary_topology("GEOSConvexHull", GEOSConvexHull_r)
    }

    fn binary_topology(
        &self,
        other: &Geometry,
        op: &'static str,
        f: unsafe extern "C" fn(
            geos_sys::GEOSContextHandle_t,
            *const GEOSGeometry,
            *const GEOSGeometry,
        ) -> *mut GEOSGeometry,
    ) -> Result<AnyGeometry> {
        let a = self.raw()?;
        let b = other.raw()?;
        let ptr = with_context(|ctx| unsafe { f(ctx, a.as_ptr(), b.as_ptr()) })?;
        let mut result = Geometry::from_ptr(ptr, op)?;
        result.inherit_srid(self)?;
        AnyGeometry::from_geometry(result)
    }

    fn unary_topology(
        &self,
        op: &'static str,
        f: unsafe extern "C" fn(
            geos_sys::GEOSContextHandle_t,
            *const GEOSGeometry,
        ) -> *mut GEOSGeometry,
    ) -> Result<AnyGeometry> {
        let a = self.raw()?;
        let ptr = with_context(|ctx| unsafe { f(ctx, a.as_ptr()) })?;
        let mut result = Geometry::from_ptr(ptr, op)?;
        result.inherit_srid(self)?;
        AnyGeometry::from_geometry(result)
    }

    // Export accessors: pure reads computed on demand.

    /// Well-known text.
    pub fn wkt(&self) -> Result<String> {
        WktWriter::new()?.write(self)
    }

    /// Extended WKT with an `SRID=<int>;` prefix when an SRID is attached.
    pub fn ewkt(&self) -> Result<String> {
        let wkt = self.wkt()?;
        Ok(match self.srid()? {
            Some(srid) => format!("SRID={srid};{wkt}"),
            None => wkt,
        })
    }

    /// Well-known binary in platform byte order.
    pub fn wkb(&self) -> Result<Vec<u8>> {
        self.wkb_writer()?.write(self)
    }

    /// Extended WKB embedding the SRID.
    pub fn ewkb(&self) -> Result<Vec<u8>> {
        let mut writer = self.wkb_writer()?;
        writer.set_include_srid(true)?;
        writer.write(self)
    }

    /// Uppercase hexadecimal WKB.
    pub fn hex(&self) -> Result<String> {
        self.wkb_writer()?.write_hex(self)
    }

    fn wkb_writer(&self) -> Result<WkbWriter> {
        let mut writer = WkbWriter::new()?;
        if self.has_z()? {
            writer.set_output_dimension(Dimensions::Three)?;
        }
        Ok(writer)
    }

    /// GeoJSON representation.
    pub fn geojson(&self) -> Result<String> {
        crate::geos::json::to_geojson(self)
    }
}

impl PartialEq for Geometry {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other).unwrap_or(false)
    }
}

impl std::fmt::Debug for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.wkt() {
            Ok(wkt) => write!(f, "Geometry({wkt})"),
            Err(_) => f.write_str("Geometry(<released>)"),
        }
    }
}

/// Clone a child pointer borrowed from a parent structure into a new owned
/// pointer.
#[cfg(test)]
thread_local! {
    pub(crate) static CLONES_MADE: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

pub(crate) fn clone_raw(ptr: *const GEOSGeometry) -> Result<*mut GEOSGeometry> {
    let cloned = with_context(|ctx| unsafe { GEOSGeom_clone_r(ctx, ptr) })?;
    if cloned.is_null() {
        return Err(native_error("GEOSGeom_clone"));
    }
    #[cfg(test)]
    CLONES_MADE.with(|count| count.set(count.get() + 1));
    Ok(cloned)
}

/// Clone a set of child pointers for handing to a native composite factory.
/// A mid-build clone failure rolls the partial set back instead of leaking
/// it.
pub(crate) fn clone_children(sources: &[NonNull<GEOSGeometry>]) -> Result<Vec<*mut GEOSGeometry>> {
    let mut cloned: Vec<*mut GEOSGeometry> = Vec::with_capacity(sources.len());
    for source in sources {
        match clone_raw(source.as_ptr()) {
            Ok(ptr) => cloned.push(ptr),
            Err(err) => {
                for ptr in cloned {
                    let _ = with_context(|ctx| unsafe { GEOSGeom_destroy_r(ctx, ptr) });
                }
                return Err(err);
            }
        }
    }
    Ok(cloned)
}

/// A geometry tagged with its concrete type.
///
/// The variant is selected once, from the native type code, before the value
/// is exposed; there is no later re-typing. Every variant derefs to
/// [`Geometry`].
#[derive(Debug)]
pub enum AnyGeometry {
    Point(Point),
    LineString(LineString),
    LinearRing(LinearRing),
    Polygon(Polygon),
    MultiPoint(MultiPoint),
    MultiLineString(MultiLineString),
    MultiPolygon(MultiPolygon),
    GeometryCollection(GeometryCollection),
}

impl AnyGeometry {
    /// Wrap an owned base geometry in the variant matching its native type
    /// code.
    pub(crate) fn from_geometry(geometry: Geometry) -> Result<AnyGeometry> {
        Ok(match geometry.geometry_type()? {
            GeometryType::Point => AnyGeometry::Point(Point::from_base(geometry)),
            GeometryType::LineString => AnyGeometry::LineString(LineString::from_base(geometry)),
            GeometryType::LinearRing => AnyGeometry::LinearRing(LinearRing::from_base(geometry)),
            GeometryType::Polygon => AnyGeometry::Polygon(Polygon::from_base(geometry)),
            GeometryType::MultiPoint => AnyGeometry::MultiPoint(MultiPoint::from_base(geometry)),
            GeometryType::MultiLineString => {
                AnyGeometry::MultiLineString(MultiLineString::from_base(geometry))
            }
            GeometryType::MultiPolygon => {
                AnyGeometry::MultiPolygon(MultiPolygon::from_base(geometry))
            }
            GeometryType::GeometryCollection => {
                AnyGeometry::GeometryCollection(GeometryCollection::from_base(geometry))
            }
        })
    }

    /// Parse WKT, accepting the extended `SRID=<int>;` prefix.
    pub fn from_wkt(wkt: &str) -> Result<AnyGeometry> {
        let (srid, body) = split_srid_prefix(wkt)?;
        let mut geom = WktReader::new()?.read(body)?;
        if let Some(srid) = srid {
            geom.geometry_mut().set_srid(srid)?;
        }
        Ok(geom)
    }

    /// Parse well-known binary.
    pub fn from_wkb(wkb: &[u8]) -> Result<AnyGeometry> {
        WkbReader::new()?.read(wkb)
    }

    /// Parse hex-encoded WKB.
    pub fn from_hex(hex: &str) -> Result<AnyGeometry> {
        WkbReader::new()?.read_hex(hex)
    }

    /// Parse a GeoJSON geometry.
    pub fn from_geojson(json: &str) -> Result<AnyGeometry> {
        crate::geos::json::from_geojson(json)
    }

    /// An empty geometry of the given type.
    pub fn empty(geometry_type: GeometryType) -> Result<AnyGeometry> {
        let ptr = with_context(|ctx| unsafe {
            match geometry_type {
                GeometryType::Point => GEOSGeom_createEmptyPoint_r(ctx),
                GeometryType::LineString => GEOSGeom_createEmptyLineString_r(ctx),
                GeometryType::LinearRing => {
                    // No dedicated empty-ring factory; an empty sequence
                    // produces one.
                    match CoordSeq::new(0, Dimensions::Two).and_then(CoordSeq::take) {
                        Ok(seq) => GEOSGeom_createLinearRing_r(ctx, seq),
                        Err(_) => std::ptr::null_mut(),
                    }
                }
                GeometryType::Polygon => GEOSGeom_createEmptyPolygon_r(ctx),
                GeometryType::MultiPoint
                | GeometryType::MultiLineString
                | GeometryType::MultiPolygon
                | GeometryType::GeometryCollection => {
                    GEOSGeom_createEmptyCollection_r(ctx, geometry_type.into())
                }
            }
        })?;
        if ptr.is_null() {
            return Err(GeobindError::GeometryConstruction(format!(
                "could not create empty {geometry_type}"
            )));
        }
        AnyGeometry::from_geometry(Geometry::from_ptr(ptr, "GEOSGeom_createEmpty")?)
    }

    /// An empty geometry from a bare type name such as `"Point"` or
    /// `"POLYGON"`.
    pub fn from_type_name(name: &str) -> Result<AnyGeometry> {
        AnyGeometry::empty(GeometryType::from_name(name)?)
    }

    /// Rectangle polygon from an `(xmin, ymin, xmax, ymax)` bounding box.
    pub fn from_bbox(bbox: (f64, f64, f64, f64)) -> Result<AnyGeometry> {
        Ok(AnyGeometry::Polygon(Polygon::from_bbox(bbox)?))
    }

    /// The tag this value was constructed with. No native call involved.
    pub fn kind(&self) -> GeometryType {
        match self {
            AnyGeometry::Point(_) => GeometryType::Point,
            AnyGeometry::LineString(_) => GeometryType::LineString,
            AnyGeometry::LinearRing(_) => GeometryType::LinearRing,
            AnyGeometry::Polygon(_) => GeometryType::Polygon,
            AnyGeometry::MultiPoint(_) => GeometryType::MultiPoint,
            AnyGeometry::MultiLineString(_) => GeometryType::MultiLineString,
            AnyGeometry::MultiPolygon(_) => GeometryType::MultiPolygon,
            AnyGeometry::GeometryCollection(_) => GeometryType::GeometryCollection,
        }
    }

    pub fn geometry(&self) -> &Geometry {
        match self {
            AnyGeometry::Point(g) => g,
            AnyGeometry::LineString(g) => g,
            AnyGeometry::LinearRing(g) => g,
            AnyGeometry::Polygon(g) => g,
            AnyGeometry::MultiPoint(g) => g,
            AnyGeometry::MultiLineString(g) => g,
            AnyGeometry::MultiPolygon(g) => g,
            AnyGeometry::GeometryCollection(g) => g,
        }
    }

    pub fn geometry_mut(&mut self) -> &mut Geometry {
        match self {
            AnyGeometry::Point(g) => g.base_mut(),
            AnyGeometry::LineString(g) => g.base_mut(),
            AnyGeometry::LinearRing(g) => g.base_mut(),
            AnyGeometry::Polygon(g) => g.base_mut(),
            AnyGeometry::MultiPoint(g) => g.base_mut(),
            AnyGeometry::MultiLineString(g) => g.base_mut(),
            AnyGeometry::MultiPolygon(g) => g.base_mut(),
            AnyGeometry::GeometryCollection(g) => g.base_mut(),
        }
    }

    pub fn into_geometry(self) -> Geometry {
        match self {
            AnyGeometry::Point(g) => g.into_base(),
            AnyGeometry::LineString(g) => g.into_base(),
            AnyGeometry::LinearRing(g) => g.into_base(),
            AnyGeometry::Polygon(g) => g.into_base(),
            AnyGeometry::MultiPoint(g) => g.into_base(),
            AnyGeometry::MultiLineString(g) => g.into_base(),
            AnyGeometry::MultiPolygon(g) => g.into_base(),
            AnyGeometry::GeometryCollection(g) => g.into_base(),
        }
    }

    pub fn try_clone(&self) -> Result<AnyGeometry> {
        AnyGeometry::from_geometry(self.geometry().try_clone()?)
    }

    /// KML markup for this geometry.
    pub fn kml(&self) -> Result<String> {
        match self {
            AnyGeometry::Point(g) => g.kml(),
            AnyGeometry::LineString(g) => g.kml(),
            AnyGeometry::LinearRing(g) => g.kml(),
            AnyGeometry::Polygon(g) => g.kml(),
            AnyGeometry::MultiPoint(g) => g.kml(),
            AnyGeometry::MultiLineString(g) => g.kml(),
            AnyGeometry::MultiPolygon(g) => g.kml(),
            AnyGeometry::GeometryCollection(g) => g.kml(),
        }
    }
}

impl std::ops::Deref for AnyGeometry {
    type Target = Geometry;

    fn deref(&self) -> &Geometry {
        self.geometry()
    }
}

impl PartialEq for AnyGeometry {
    /// Same concrete type and topologically equal.
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.geometry() == other.geometry()
    }
}

/// Boilerplate shared by the typed wrappers: base-handle plumbing, deref to
/// [`Geometry`], and the checked conversion out of [`AnyGeometry`].
macro_rules! geometry_wrapper {
    ($name:ident) => {
        impl $name {
            pub(crate) fn from_base(base: crate::geos::geometry::Geometry) -> $name {
                $name { base }
            }

            pub(crate) fn base_mut(&mut self) -> &mut crate::geos::geometry::Geometry {
                &mut self.base
            }

            pub(crate) fn into_base(self) -> crate::geos::geometry::Geometry {
                self.base
            }

            pub fn try_clone(&self) -> crate::error::Result<$name> {
                Ok($name::from_base(self.base.try_clone()?))
            }
        }

        impl std::ops::Deref for $name {
            type Target = crate::geos::geometry::Geometry;

            fn deref(&self) -> &crate::geos::geometry::Geometry {
                &self.base
            }
        }

        impl std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut crate::geos::geometry::Geometry {
                &mut self.base
            }
        }

        impl TryFrom<crate::geos::geometry::AnyGeometry> for $name {
            type Error = crate::error::GeobindError;

            fn try_from(value: crate::geos::geometry::AnyGeometry) -> crate::error::Result<$name> {
                match value {
                    crate::geos::geometry::AnyGeometry::$name(inner) => Ok(inner),
                    other => Err(crate::error::GeobindError::TypeMismatch {
                        expected: stringify!($name),
                        found: other.kind().name().to_string(),
                    }),
                }
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.base == other.base
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.wkt() {
                    Ok(wkt) => write!(f, "{}({wkt})", stringify!($name)),
                    Err(_) => write!(f, "{}(<released>)", stringify!($name)),
                }
            }
        }
    };
}

pub(crate) use geometry_wrapper;

/// Split an optional EWKT `SRID=<int>;` prefix off a WKT string.
pub(crate) fn split_srid_prefix(wkt: &str) -> Result<(Option<i32>, &str)> {
    let trimmed = wkt.trim_start();
    // The prefix is ASCII, so byte 5 is a char boundary whenever it matches.
    let rest = match trimmed.as_bytes().get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case(b"srid=") => &trimmed[5..],
        _ => return Ok((None, trimmed)),
    };
    let semi = rest.find(';').ok_or_else(|| {
        GeobindError::GeometryConstruction("EWKT SRID prefix is missing ';'".to_string())
    })?;
    let srid = rest[..semi].trim().parse::<i32>().map_err(|_| {
        GeobindError::GeometryConstruction(format!("invalid SRID value {:?}", &rest[..semi]))
    })?;
    Ok((Some(srid), &rest[semi + 1..]))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wkt_round_trip() {
        let geom = AnyGeometry::from_wkt("POINT (1 2)").unwrap();
        assert_eq!(geom.kind(), GeometryType::Point);
        assert_eq!(geom.wkt().unwrap(), "POINT (1 2)");
        let reparsed = AnyGeometry::from_wkt(&geom.wkt().unwrap()).unwrap();
        assert_eq!(geom, reparsed);
    }

    #[test]
    fn num_coords_counts_every_ring() {
        let geom =
            AnyGeometry::from_wkt("POLYGON ((0 0, 4 0, 4 4, 0 0), (1 1, 2 1, 1 2, 1 1))").unwrap();
        assert_eq!(geom.num_coords().unwrap(), 8);
    }

    #[test]
    fn wkb_round_trip_is_byte_identical() {
        let geom = AnyGeometry::from_wkt("LINESTRING (0 0, 1 1, 2 0)").unwrap();
        let wkb = geom.wkb().unwrap();
        let reparsed = AnyGeometry::from_wkb(&wkb).unwrap();
        assert_eq!(reparsed.wkb().unwrap(), wkb);
        assert_eq!(geom, reparsed);
    }

    #[test]
    fn hex_round_trip() {
        let geom = AnyGeometry::from_wkt("POINT (5 23)").unwrap();
        let hex = geom.hex().unwrap();
        let reparsed = AnyGeometry::from_hex(&hex).unwrap();
        assert_eq!(geom, reparsed);
    }

    #[test]
    fn ewkt_parses_and_prints_srid() {
        let geom = AnyGeometry::from_wkt("SRID=4326;POINT (5 23)").unwrap();
        assert_eq!(geom.srid().unwrap(), Some(4326));
        assert_eq!(geom.ewkt().unwrap(), "SRID=4326;POINT (5 23)");
    }

    #[test]
    fn malformed_wkt_is_a_construction_error() {
        assert!(AnyGeometry::from_wkt("POINT (a b)").is_err());
        assert!(AnyGeometry::from_wkt("SRID=abc;POINT (1 2)").is_err());
    }

    #[test]
    fn multibyte_input_is_not_an_srid_prefix() {
        assert_eq!(
            split_srid_prefix("日本語テスト").unwrap(),
            (None, "日本語テスト")
        );
        assert!(matches!(
            AnyGeometry::from_wkt("日本語テスト"),
            Err(GeobindError::GeometryConstruction(_))
        ));
    }

    #[test]
    fn clone_owns_an_independent_pointer() {
        let original = AnyGeometry::from_wkt("POINT (1 2)").unwrap();
        let cloned = original.try_clone().unwrap();
        assert_eq!(original, cloned);
        let mut cloned = match cloned {
            AnyGeometry::Point(p) => p,
            other => panic!("expected point, got {:?}", other.kind()),
        };
        cloned.set_x(9.0).unwrap();
        assert_ne!(original, AnyGeometry::Point(cloned));
    }

    #[test]
    fn generators_inherit_left_srid_and_do_not_mutate_inputs() {
        let a = AnyGeometry::from_wkt("SRID=4326;POLYGON ((0 0, 2 0, 2 2, 0 2, 0 0))").unwrap();
        let b = AnyGeometry::from_wkt("POLYGON ((1 1, 3 1, 3 3, 1 3, 1 1))").unwrap();
        let result = a.union(&b).unwrap();
        assert_eq!(result.srid().unwrap(), Some(4326));
        assert_eq!(a.wkt().unwrap(), "POLYGON ((0 0, 2 0, 2 2, 0 2, 0 0))");
        assert_eq!(b.wkt().unwrap(), "POLYGON ((1 1, 3 1, 3 3, 1 3, 1 1))");
    }

    #[test]
    fn disjoint_unit_squares_intersect_to_empty() {
        let a = AnyGeometry::from_wkt("POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))").unwrap();
        let b = AnyGeometry::from_wkt("POLYGON ((5 5, 6 5, 6 6, 5 6, 5 5))").unwrap();
        assert!(!a.intersects(&b).unwrap());
        let intersection = a.intersection(&b).unwrap();
        assert!(intersection.is_empty().unwrap());
    }

    #[test]
    fn predicates_cover_the_basic_relations() {
        let outer = AnyGeometry::from_wkt("POLYGON ((0 0, 4 0, 4 4, 0 4, 0 0))").unwrap();
        let inner = AnyGeometry::from_wkt("POINT (2 2)").unwrap();
        assert!(outer.contains(&inner).unwrap());
        assert!(inner.within(&outer).unwrap());
        assert!(!outer.disjoint(&inner).unwrap());
        assert!(outer.covers(&inner).unwrap());
        assert!(!outer.touches(&inner).unwrap());
        assert!(!outer.crosses(&inner).unwrap());
        assert!(!outer.overlaps(&inner).unwrap());
    }

    #[test]
    fn empty_geometries_by_type_name() {
        let geom = AnyGeometry::from_type_name("GeometryCollection").unwrap();
        assert_eq!(geom.kind(), GeometryType::GeometryCollection);
        assert!(geom.is_empty().unwrap());
        assert!(AnyGeometry::from_type_name("dodecahedron").is_err());
    }

    #[test]
    fn boundary_and_convex_hull() {
        let line = AnyGeometry::from_wkt("LINESTRING (0 0, 1 0, 1 1)").unwrap();
        let boundary = line.boundary().unwrap();
        assert_eq!(boundary.kind(), GeometryType::MultiPoint);
        let hull = line.convex_hull().unwrap();
        assert_eq!(hull.kind(), GeometryType::Polygon);
    }
}
