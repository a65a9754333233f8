//! OGR geometry wrappers.
//!
//! The OGR engine backs the interchange surface: formats GEOS cannot parse
//! or emit (GML, OGR's GeoJSON dialect, KML with spatial references) and
//! coordinate transformation. Geometries cross between engines as WKB.

use std::ffi::CString;
use std::ptr::NonNull;

use gdal_sys::{
    OGRwkbByteOrder, OGR_G_AssignSpatialReference, OGR_G_Clone, OGR_G_Contains,
    OGR_G_CreateFromWkb, OGR_G_CreateFromWkt, OGR_G_CreateGeometry, OGR_G_CreateGeometryFromJson,
    OGR_G_Crosses, OGR_G_DestroyGeometry, OGR_G_Difference, OGR_G_Disjoint, OGR_G_Equals,
    OGR_G_ExportToGML, OGR_G_ExportToJson, OGR_G_ExportToKML, OGR_G_ExportToWkb,
    OGR_G_ExportToWkt, OGR_G_GetCoordinateDimension, OGR_G_GetGeometryCount,
    OGR_G_GetGeometryType, OGR_G_GetPointCount, OGR_G_GetSpatialReference, OGR_G_Intersection,
    OGR_G_Intersects, OGR_G_IsEmpty, OGR_G_Overlaps, OGR_G_SymDifference, OGR_G_Touches,
    OGR_G_Transform, OGR_G_TransformTo, OGR_G_Union, OGR_G_Within, OGR_G_WkbSize, OGRGeometryH,
};
use libc::{c_char, c_int, c_void};

use crate::error::{GeobindError, Result};
use crate::gdal::geomtype::OgrGeometryType;
use crate::gdal::srs::{SpatialRef, SpatialRefInput};
use crate::gdal::util::{
    _owned_string, check_ogr_err, decode_hex, encode_hex, last_null_pointer_err,
};
use crate::geos;
use crate::handle::{Handle, NativeFree};

/// Opaque marker for `OGRGeometryH`, which is a bare void pointer natively.
pub(crate) enum GeomToken {}

impl NativeFree for GeomToken {
    unsafe fn free(ptr: NonNull<Self>) {
        OGR_G_DestroyGeometry(ptr.as_ptr() as OGRGeometryH);
    }
}

/// An OGR geometry.
pub struct OgrGeometry {
    handle: Handle<GeomToken>,
}

impl OgrGeometry {
    /// Build from any textual form this layer accepts: EWKT, WKT, hex WKB,
    /// GeoJSON, or a bare geometry type name (yielding an empty geometry).
    pub fn new(input: &str) -> Result<OgrGeometry> {
        let (srid, body) = geos::split_srid_prefix(input)?;
        let mut geometry = if !body.is_empty() && body.bytes().all(|b| b.is_ascii_hexdigit()) {
            OgrGeometry::from_hex(body)?
        } else if body.starts_with('{') {
            OgrGeometry::from_json(body)?
        } else if let Some(geometry_type) = OgrGeometryType::from_name(body) {
            OgrGeometry::empty(geometry_type)?
        } else {
            OgrGeometry::from_wkt(body)?
        };
        if let Some(srid) = srid {
            geometry.set_srs(srid)?;
        }
        Ok(geometry)
    }

    pub fn from_wkt(wkt: &str) -> Result<OgrGeometry> {
        let text = CString::new(wkt)
            .map_err(|_| GeobindError::GeometryConstruction("WKT contains a NUL byte".into()))?;
        // The engine advances this cursor past what it consumed.
        let mut cursor = text.as_ptr() as *mut c_char;
        let mut ptr: OGRGeometryH = std::ptr::null_mut();
        check_ogr_err(
            unsafe { OGR_G_CreateFromWkt(&mut cursor, std::ptr::null_mut(), &mut ptr) },
            "OGR_G_CreateFromWkt",
        )
        .map_err(|_| malformed("WKT", wkt))?;
        OgrGeometry::from_ptr(ptr, "OGR_G_CreateFromWkt")
    }

    pub fn from_wkb(wkb: &[u8]) -> Result<OgrGeometry> {
        let mut ptr: OGRGeometryH = std::ptr::null_mut();
        check_ogr_err(
            unsafe {
                OGR_G_CreateFromWkb(
                    wkb.as_ptr() as *mut c_void,
                    std::ptr::null_mut(),
                    &mut ptr,
                    wkb.len() as c_int,
                )
            },
            "OGR_G_CreateFromWkb",
        )
        .map_err(|_| GeobindError::GeometryConstruction("malformed WKB input".to_string()))?;
        OgrGeometry::from_ptr(ptr, "OGR_G_CreateFromWkb")
    }

    pub fn from_hex(hex: &str) -> Result<OgrGeometry> {
        OgrGeometry::from_wkb(&decode_hex(hex)?)
    }

    pub fn from_json(json: &str) -> Result<OgrGeometry> {
        let text = CString::new(json).map_err(|_| {
            GeobindError::GeometryConstruction("GeoJSON contains a NUL byte".into())
        })?;
        let ptr = unsafe { OGR_G_CreateGeometryFromJson(text.as_ptr()) };
        if ptr.is_null() {
            return Err(malformed("GeoJSON", json));
        }
        OgrGeometry::from_ptr(ptr, "OGR_G_CreateGeometryFromJson")
    }

    /// An empty geometry of the given type.
    pub fn empty(geometry_type: OgrGeometryType) -> Result<OgrGeometry> {
        let ptr = unsafe { OGR_G_CreateGeometry(geometry_type.into()) };
        OgrGeometry::from_ptr(ptr, "OGR_G_CreateGeometry")
    }

    /// An axis-aligned rectangle as a polygon.
    pub fn from_bbox(x0: f64, y0: f64, x1: f64, y1: f64) -> Result<OgrGeometry> {
        OgrGeometry::from_wkt(&format!(
            "POLYGON (({x0} {y0}, {x0} {y1}, {x1} {y1}, {x1} {y0}, {x0} {y0}))"
        ))
    }

    /// Carry a GEOS geometry across, keeping its SRID as a spatial reference
    /// when one is attached.
    pub fn from_geos(geometry: &geos::Geometry) -> Result<OgrGeometry> {
        let mut ogr = OgrGeometry::from_wkb(&geometry.wkb()?)?;
        if let Some(srid) = geometry.srid()? {
            ogr.set_srs(srid)?;
        }
        Ok(ogr)
    }

    /// Carry this geometry into the GEOS engine.
    ///
    /// Fails with [`GeobindError::IncompatibleGeometry`] for OGR-only types
    /// (curves, surfaces) that have no simple-feature equivalent.
    pub fn to_geos(&self) -> Result<geos::AnyGeometry> {
        self.geometry_type()?;
        let mut converted = geos::AnyGeometry::from_wkb(&self.wkb()?)?;
        if let Some(srid) = self.srid()? {
            converted.geometry_mut().set_srid(srid)?;
        }
        Ok(converted)
    }

    fn from_ptr(ptr: OGRGeometryH, op: &'static str) -> Result<OgrGeometry> {
        let handle =
            Handle::new(ptr as *mut GeomToken).ok_or_else(|| last_null_pointer_err(op))?;
        Ok(OgrGeometry { handle })
    }

    fn raw(&self) -> Result<OGRGeometryH> {
        Ok(self.handle.get()?.as_ptr() as OGRGeometryH)
    }

    pub fn try_clone(&self) -> Result<OgrGeometry> {
        let ptr = unsafe { OGR_G_Clone(self.raw()?) };
        OgrGeometry::from_ptr(ptr, "OGR_G_Clone")
    }

    pub fn geometry_type(&self) -> Result<OgrGeometryType> {
        OgrGeometryType::from_raw(unsafe { OGR_G_GetGeometryType(self.raw()?) })
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(unsafe { OGR_G_IsEmpty(self.raw()?) } != 0)
    }

    /// Vertex count for points and line strings; zero for containers.
    pub fn point_count(&self) -> Result<usize> {
        Ok(unsafe { OGR_G_GetPointCount(self.raw()?) } as usize)
    }

    /// Child count for containers (rings for polygons); zero otherwise.
    pub fn geometry_count(&self) -> Result<usize> {
        Ok(unsafe { OGR_G_GetGeometryCount(self.raw()?) } as usize)
    }

    pub fn coordinate_dimension(&self) -> Result<usize> {
        Ok(unsafe { OGR_G_GetCoordinateDimension(self.raw()?) } as usize)
    }

    // Spatial reference handling.

    /// The attached spatial reference, if any.
    pub fn srs(&self) -> Result<Option<SpatialRef>> {
        let ptr = unsafe { OGR_G_GetSpatialReference(self.raw()?) };
        Ok(SpatialRef::from_shared(ptr))
    }

    pub fn set_srs<'a>(&mut self, srs: impl Into<SpatialRefInput<'a>>) -> Result<()> {
        let srs = srs.into().resolve()?;
        unsafe {
            OGR_G_AssignSpatialReference(
                self.raw()?,
                srs.raw()? as gdal_sys::OGRSpatialReferenceH,
            )
        };
        Ok(())
    }

    /// The EPSG code of the attached spatial reference, if any.
    pub fn srid(&self) -> Result<Option<i32>> {
        match self.srs()? {
            Some(srs) => srs.srid(),
            None => Ok(None),
        }
    }

    // Exports.

    pub fn wkt(&self) -> Result<String> {
        let mut ptr: *mut c_char = std::ptr::null_mut();
        check_ogr_err(
            unsafe { OGR_G_ExportToWkt(self.raw()?, &mut ptr) },
            "OGR_G_ExportToWkt",
        )?;
        Ok(_owned_string(ptr))
    }

    pub fn ewkt(&self) -> Result<String> {
        let wkt = self.wkt()?;
        Ok(match self.srid()? {
            Some(srid) => format!("SRID={srid};{wkt}"),
            None => wkt,
        })
    }

    /// Well-known binary in the platform's byte order.
    pub fn wkb(&self) -> Result<Vec<u8>> {
        let geom = self.raw()?;
        let order = if cfg!(target_endian = "big") {
            OGRwkbByteOrder::wkbXDR
        } else {
            OGRwkbByteOrder::wkbNDR
        };
        let size = unsafe { OGR_G_WkbSize(geom) } as usize;
        let mut buffer = vec![0u8; size];
        check_ogr_err(
            unsafe { OGR_G_ExportToWkb(geom, order, buffer.as_mut_ptr()) },
            "OGR_G_ExportToWkb",
        )?;
        Ok(buffer)
    }

    /// Uppercase hexadecimal WKB.
    pub fn hex(&self) -> Result<String> {
        Ok(encode_hex(&self.wkb()?))
    }

    /// GeoJSON in OGR's dialect.
    pub fn json(&self) -> Result<String> {
        let ptr = unsafe { OGR_G_ExportToJson(self.raw()?) };
        if ptr.is_null() {
            return Err(last_null_pointer_err("OGR_G_ExportToJson"));
        }
        Ok(_owned_string(ptr))
    }

    pub fn gml(&self) -> Result<String> {
        let ptr = unsafe { OGR_G_ExportToGML(self.raw()?) };
        if ptr.is_null() {
            return Err(last_null_pointer_err("OGR_G_ExportToGML"));
        }
        Ok(_owned_string(ptr))
    }

    pub fn kml(&self) -> Result<String> {
        let ptr = unsafe { OGR_G_ExportToKML(self.raw()?, std::ptr::null()) };
        if ptr.is_null() {
            return Err(last_null_pointer_err("OGR_G_ExportToKML"));
        }
        Ok(_owned_string(ptr))
    }

    // Predicates.

    pub fn intersects(&self, other: &OgrGeometry) -> Result<bool> {
        self.predicate(other, OGR_G_Intersects)
    }

    pub fn contains(&self, other: &OgrGeometry) -> Result<bool> {
        self.predicate(other, OGR_G_Contains)
    }

    pub fn crosses(&self, other: &OgrGeometry) -> Result<bool> {
        self.predicate(other, OGR_G_Crosses)
    }

    pub fn disjoint(&self, other: &OgrGeometry) -> Result<bool> {
        self.predicate(other, OGR_G_Disjoint)
    }

    pub fn equals(&self, other: &OgrGeometry) -> Result<bool> {
        self.predicate(other, OGR_G_Equals)
    }

    pub fn overlaps(&self, other: &OgrGeometry) -> Result<bool> {
        self.predicate(other, OGR_G_Overlaps)
    }

    pub fn touches(&self, other: &OgrGeometry) -> Result<bool> {
        self.predicate(other, OGR_G_Touches)
    }

    pub fn within(&self, other: &OgrGeometry) -> Result<bool> {
        self.predicate(other, OGR_G_Within)
    }

    fn predicate(
        &self,
        other: &OgrGeometry,
        f: unsafe extern "C" fn(OGRGeometryH, OGRGeometryH) -> c_int,
    ) -> Result<bool> {
        Ok(unsafe { f(self.raw()?, other.raw()?) } != 0)
    }

    // Set operations.

    pub fn difference(&self, other: &OgrGeometry) -> Result<OgrGeometry> {
        self.set_operation(other, "OGR_G_Difference", OGR_G_Difference)
    }

    pub fn intersection(&self, other: &OgrGeometry) -> Result<OgrGeometry> {
        self.set_operation(other, "OGR_G_Intersection", OGR_G_Intersection)
    }

    pub fn sym_difference(&self, other: &OgrGeometry) -> Result<OgrGeometry> {
        self.set_operation(other, "OGR_G_SymDifference", OGR_G_SymDifference)
    }

    pub fn union(&self, other: &OgrGeometry) -> Result<OgrGeometry> {
        self.set_operation(other, "OGR_G_Union", OGR_G_Union)
    }

    fn set_operation(
        &self,
        other: &OgrGeometry,
        op: &'static str,
        f: unsafe extern "C" fn(OGRGeometryH, OGRGeometryH) -> OGRGeometryH,
    ) -> Result<OgrGeometry> {
        let ptr = unsafe { f(self.raw()?, other.raw()?) };
        let mut result = OgrGeometry::from_ptr(ptr, op)?;
        if let Some(srs) = self.srs()? {
            result.set_srs(&srs)?;
        }
        Ok(result)
    }

    /// Reproject in place.
    ///
    /// With a prepared [`CoordTransform`] the geometry's own reference is
    /// ignored; any other target requires one to already be attached.
    ///
    /// [`CoordTransform`]: crate::gdal::CoordTransform
    pub fn transform<'a>(&mut self, target: impl Into<SpatialRefInput<'a>>) -> Result<()> {
        let target = target.into();
        if let SpatialRefInput::Transform(ct) = target {
            check_ogr_err(
                unsafe { OGR_G_Transform(self.raw()?, ct.raw()?) },
                "OGR_G_Transform",
            )?;
            return self.set_srs(ct.target());
        }
        if self.srs()?.is_none() {
            return Err(GeobindError::SpatialReference(
                "cannot transform a geometry with no spatial reference".to_string(),
            ));
        }
        let srs = target.resolve()?;
        check_ogr_err(
            unsafe {
                OGR_G_TransformTo(self.raw()?, srs.raw()? as gdal_sys::OGRSpatialReferenceH)
            },
            "OGR_G_TransformTo",
        )
    }
}

impl PartialEq for OgrGeometry {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other).unwrap_or(false)
    }
}

impl std::fmt::Debug for OgrGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.wkt() {
            Ok(wkt) => f.write_str(&wkt),
            Err(_) => f.write_str("OgrGeometry(released)"),
        }
    }
}

fn malformed(what: &str, input: &str) -> GeobindError {
    GeobindError::GeometryConstruction(format!("malformed {what} input: {input:?}"))
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn construction_dispatches_on_input_shape() {
        let from_wkt = OgrGeometry::new("POINT (1 2)").unwrap();
        assert_eq!(from_wkt.geometry_type().unwrap(), OgrGeometryType::Point);

        let from_hex =
            OgrGeometry::new("010100000000000000000000F03F0000000000000040").unwrap();
        assert_eq!(from_hex, from_wkt);

        let from_json = OgrGeometry::new(r#"{"type": "Point", "coordinates": [1, 2]}"#).unwrap();
        assert_eq!(from_json, from_wkt);

        let named = OgrGeometry::new("MultiPolygon").unwrap();
        assert_eq!(named.geometry_type().unwrap(), OgrGeometryType::MultiPolygon);
        assert!(named.is_empty().unwrap());
    }

    #[test]
    fn ewkt_input_attaches_a_spatial_reference() {
        let geom = OgrGeometry::new("SRID=4326;POINT (1 2)").unwrap();
        assert_eq!(geom.srid().unwrap(), Some(4326));
        assert_eq!(geom.ewkt().unwrap(), "SRID=4326;POINT (1 2)");
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(OgrGeometry::new("POINT (a b)").is_err());
        assert!(OgrGeometry::from_json("{not json").is_err());
        assert!(OgrGeometry::from_hex("zz").is_err());
    }

    #[test]
    fn wkb_leads_with_the_platform_byte_order_flag() {
        let geom = OgrGeometry::new("POINT (1 2)").unwrap();
        let flag = if cfg!(target_endian = "big") { 0 } else { 1 };
        assert_eq!(geom.wkb().unwrap()[0], flag);
    }

    #[test]
    fn hex_round_trip() {
        let geom = OgrGeometry::new("POINT (1 2)").unwrap();
        let hex = geom.hex().unwrap();
        if cfg!(target_endian = "little") {
            assert_eq!(hex, "010100000000000000000000F03F0000000000000040");
        }
        assert_eq!(OgrGeometry::from_hex(&hex).unwrap(), geom);
    }

    #[test]
    fn markup_exports() {
        let geom = OgrGeometry::new("POINT (1 2)").unwrap();
        assert!(geom.json().unwrap().contains("\"Point\""));
        assert!(geom.gml().unwrap().starts_with("<gml:Point>"));
        assert!(geom.kml().unwrap().contains("<coordinates>"));
    }

    #[test]
    fn predicates_and_set_operations() {
        let a = OgrGeometry::new("POLYGON ((0 0, 4 0, 4 4, 0 4, 0 0))").unwrap();
        let b = OgrGeometry::new("POLYGON ((2 2, 6 2, 6 6, 2 6, 2 2))").unwrap();
        assert!(a.intersects(&b).unwrap());
        assert!(!a.contains(&b).unwrap());
        let both = a.intersection(&b).unwrap();
        assert!(both.within(&a).unwrap() && both.within(&b).unwrap());
        let either = a.union(&b).unwrap();
        assert!(a.within(&either).unwrap() && b.within(&either).unwrap());
    }

    #[test]
    fn transform_reprojects_and_retags() {
        let mut geom = OgrGeometry::new("SRID=4326;POINT (30 44)").unwrap();
        geom.transform(3857).unwrap();
        assert_eq!(geom.srid().unwrap(), Some(3857));
        let (x, y) = point_xy(&geom);
        assert_relative_eq!(x, 3339584.72, epsilon = 1.0);
        assert_relative_eq!(y, 5465442.18, epsilon = 1.0);
    }

    #[test]
    fn transform_without_a_reference_fails() {
        let mut geom = OgrGeometry::new("POINT (30 44)").unwrap();
        let err = geom.transform(3857).unwrap_err();
        assert!(matches!(err, GeobindError::SpatialReference(_)));
    }

    #[test]
    fn prepared_transform_ignores_the_source_tag() {
        let source = SpatialRef::from_epsg(4326).unwrap();
        let target = SpatialRef::from_epsg(3857).unwrap();
        let ct = crate::gdal::CoordTransform::new(&source, &target).unwrap();
        let mut geom = OgrGeometry::new("POINT (30 44)").unwrap();
        geom.transform(&ct).unwrap();
        assert_eq!(geom.srid().unwrap(), Some(3857));
    }

    #[test]
    fn round_trips_through_the_other_engine() {
        let original = geos::AnyGeometry::from_wkt("SRID=4326;POINT (1 2)").unwrap();
        let ogr = OgrGeometry::from_geos(&original).unwrap();
        assert_eq!(ogr.srid().unwrap(), Some(4326));
        let back = ogr.to_geos().unwrap();
        assert_eq!(back, original);
        assert_eq!(back.geometry().srid().unwrap(), Some(4326));
    }

    #[test]
    fn curve_types_do_not_cross_engines() {
        let curve = OgrGeometry::from_wkt("CIRCULARSTRING (0 0, 1 1, 2 0)").unwrap();
        let err = curve.to_geos().unwrap_err();
        assert!(matches!(err, GeobindError::IncompatibleGeometry(_)));
    }

    fn point_xy(geom: &OgrGeometry) -> (f64, f64) {
        let mut x = 0.0;
        let mut y = 0.0;
        let mut z = 0.0;
        unsafe { gdal_sys::OGR_G_GetPoint(geom.raw().unwrap(), 0, &mut x, &mut y, &mut z) };
        (x, y)
    }
}
