//! OGR geometry type codes.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::{GeobindError, Result};

/// The high bit marks a type code as three-dimensional in pre-ISO WKB.
const WKB_25D_BIT: u32 = 0x8000_0000;

/// Geometry type codes the OGR wrappers accept.
///
/// OGR itself knows many more (curves, surfaces, TINs); those never map onto
/// the simple-feature model the rest of the crate speaks, so they are
/// rejected at the boundary instead of carried around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum OgrGeometryType {
    Unknown = 0,
    Point = 1,
    LineString = 2,
    Polygon = 3,
    MultiPoint = 4,
    MultiLineString = 5,
    MultiPolygon = 6,
    GeometryCollection = 7,
    LinearRing = 101,
}

impl OgrGeometryType {
    /// Classify a raw native type code, ignoring the 2.5D flag.
    pub fn from_raw(raw: u32) -> Result<OgrGeometryType> {
        OgrGeometryType::try_from(raw & !WKB_25D_BIT).map_err(|_| {
            GeobindError::IncompatibleGeometry(format!(
                "unsupported OGR geometry type code {raw}"
            ))
        })
    }

    pub fn from_name(name: &str) -> Option<OgrGeometryType> {
        let name = name.trim();
        [
            OgrGeometryType::Unknown,
            OgrGeometryType::Point,
            OgrGeometryType::LineString,
            OgrGeometryType::Polygon,
            OgrGeometryType::MultiPoint,
            OgrGeometryType::MultiLineString,
            OgrGeometryType::MultiPolygon,
            OgrGeometryType::GeometryCollection,
            OgrGeometryType::LinearRing,
        ]
        .into_iter()
        .find(|ty| ty.name().eq_ignore_ascii_case(name))
    }

    pub fn name(&self) -> &'static str {
        match self {
            OgrGeometryType::Unknown => "Unknown",
            OgrGeometryType::Point => "Point",
            OgrGeometryType::LineString => "LineString",
            OgrGeometryType::Polygon => "Polygon",
            OgrGeometryType::MultiPoint => "MultiPoint",
            OgrGeometryType::MultiLineString => "MultiLineString",
            OgrGeometryType::MultiPolygon => "MultiPolygon",
            OgrGeometryType::GeometryCollection => "GeometryCollection",
            OgrGeometryType::LinearRing => "LinearRing",
        }
    }
}

impl std::fmt::Display for OgrGeometryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn raw_codes_strip_the_25d_flag() {
        assert_eq!(
            OgrGeometryType::from_raw(gdal_sys::OGRwkbGeometryType::wkbPoint25D).unwrap(),
            OgrGeometryType::Point
        );
        assert_eq!(OgrGeometryType::from_raw(3).unwrap(), OgrGeometryType::Polygon);
    }

    #[test]
    fn curve_codes_are_incompatible() {
        let err = OgrGeometryType::from_raw(gdal_sys::OGRwkbGeometryType::wkbCircularString)
            .unwrap_err();
        assert!(matches!(err, GeobindError::IncompatibleGeometry(_)));
    }

    #[test]
    fn names_round_trip_case_insensitively() {
        assert_eq!(
            OgrGeometryType::from_name("multipolygon"),
            Some(OgrGeometryType::MultiPolygon)
        );
        assert_eq!(OgrGeometryType::from_name("Curve"), None);
    }
}
