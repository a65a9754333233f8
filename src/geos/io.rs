//! WKT and WKB readers and writers.
//!
//! Each reader/writer owns one native parser or serializer object and can be
//! reused across calls. Output buffers returned by the engine are copied into
//! owned Rust values and released with `GEOSFree_r` before returning.

use std::ffi::{CStr, CString};
use std::ptr::NonNull;

use geos_sys::{
    GEOSFree_r, GEOSWKBReader, GEOSWKBReader_create_r, GEOSWKBReader_destroy_r,
    GEOSWKBReader_readHEX_r, GEOSWKBReader_read_r, GEOSWKBWriter, GEOSWKBWriter_create_r,
    GEOSWKBWriter_destroy_r, GEOSWKBWriter_setByteOrder_r, GEOSWKBWriter_setIncludeSRID_r,
    GEOSWKBWriter_setOutputDimension_r, GEOSWKBWriter_writeHEX_r, GEOSWKBWriter_write_r,
    GEOSWKTReader, GEOSWKTReader_create_r, GEOSWKTReader_destroy_r, GEOSWKTReader_read_r,
    GEOSWKTWriter, GEOSWKTWriter_create_r, GEOSWKTWriter_destroy_r, GEOSWKTWriter_setOld3D_r,
    GEOSWKTWriter_setOutputDimension_r, GEOSWKTWriter_setRoundingPrecision_r,
    GEOSWKTWriter_setTrim_r, GEOSWKTWriter_write_r,
};
use libc::{c_char, c_int, c_void};

use crate::error::{GeobindError, Result};
use crate::geos::context::{native_error, take_last_error, with_context};
use crate::geos::coordseq::Dimensions;
use crate::geos::geometry::{AnyGeometry, Geometry};
use crate::handle::{Handle, NativeFree};

impl NativeFree for GEOSWKTReader {
    unsafe fn free(ptr: NonNull<Self>) {
        let _ = with_context(|ctx| GEOSWKTReader_destroy_r(ctx, ptr.as_ptr()));
    }
}

impl NativeFree for GEOSWKTWriter {
    unsafe fn free(ptr: NonNull<Self>) {
        let _ = with_context(|ctx| GEOSWKTWriter_destroy_r(ctx, ptr.as_ptr()));
    }
}

impl NativeFree for GEOSWKBReader {
    unsafe fn free(ptr: NonNull<Self>) {
        let _ = with_context(|ctx| GEOSWKBReader_destroy_r(ctx, ptr.as_ptr()));
    }
}

impl NativeFree for GEOSWKBWriter {
    unsafe fn free(ptr: NonNull<Self>) {
        let _ = with_context(|ctx| GEOSWKBWriter_destroy_r(ctx, ptr.as_ptr()));
    }
}

/// Byte order of WKB output. The default matches the running platform, so
/// round trips on one machine never byte-swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    BigEndian = 0,
    LittleEndian = 1,
}

impl Default for ByteOrder {
    fn default() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }
}

fn dimension_flag(dims: Dimensions) -> c_int {
    match dims {
        Dimensions::Two => 2,
        Dimensions::Three => 3,
    }
}

fn parse_error(what: &str) -> GeobindError {
    GeobindError::GeometryConstruction(
        take_last_error().unwrap_or_else(|| format!("malformed {what}")),
    )
}

/// Reads well-known text.
pub struct WktReader {
    handle: Handle<GEOSWKTReader>,
}

impl WktReader {
    pub fn new() -> Result<WktReader> {
        let ptr = with_context(|ctx| unsafe { GEOSWKTReader_create_r(ctx) })?;
        let handle = Handle::new(ptr).ok_or_else(|| native_error("GEOSWKTReader_create"))?;
        Ok(WktReader { handle })
    }

    pub fn read(&self, wkt: &str) -> Result<AnyGeometry> {
        let reader = self.handle.get()?;
        let text = CString::new(wkt)
            .map_err(|_| GeobindError::GeometryConstruction("WKT contains a NUL byte".into()))?;
        let ptr = with_context(|ctx| unsafe {
            GEOSWKTReader_read_r(ctx, reader.as_ptr(), text.as_ptr())
        })?;
        if ptr.is_null() {
            return Err(parse_error("WKT"));
        }
        AnyGeometry::from_geometry(Geometry::from_ptr(ptr, "GEOSWKTReader_read")?)
    }
}

/// Writes well-known text.
///
/// Defaults to trimmed output with three output dimensions, so 2D and 3D
/// geometries both serialize without padding: `POINT (1 2)` and
/// `POINT Z (1 2 3)`.
pub struct WktWriter {
    handle: Handle<GEOSWKTWriter>,
}

impl WktWriter {
    pub fn new() -> Result<WktWriter> {
        let ptr = with_context(|ctx| unsafe { GEOSWKTWriter_create_r(ctx) })?;
        let handle = Handle::new(ptr).ok_or_else(|| native_error("GEOSWKTWriter_create"))?;
        let mut writer = WktWriter { handle };
        writer.set_trim(true)?;
        writer.set_output_dimension(Dimensions::Three)?;
        Ok(writer)
    }

    /// Trim unnecessary decimals (`1` instead of `1.0000000000000000`).
    pub fn set_trim(&mut self, trim: bool) -> Result<()> {
        let writer = self.handle.get()?;
        with_context(|ctx| unsafe {
            GEOSWKTWriter_setTrim_r(ctx, writer.as_ptr(), trim as c_char)
        })
    }

    pub fn set_output_dimension(&mut self, dims: Dimensions) -> Result<()> {
        let writer = self.handle.get()?;
        with_context(|ctx| unsafe {
            GEOSWKTWriter_setOutputDimension_r(ctx, writer.as_ptr(), dimension_flag(dims))
        })
    }

    /// Number of decimal places, or `None` for the full double precision.
    pub fn set_rounding_precision(&mut self, precision: Option<u8>) -> Result<()> {
        let writer = self.handle.get()?;
        let flag = precision.map_or(-1, c_int::from);
        with_context(|ctx| unsafe {
            GEOSWKTWriter_setRoundingPrecision_r(ctx, writer.as_ptr(), flag)
        })
    }

    /// Emit the pre-ISO `POINT (1 2 3)` form instead of `POINT Z (1 2 3)`.
    pub fn set_old_3d(&mut self, old_3d: bool) -> Result<()> {
        let writer = self.handle.get()?;
        with_context(|ctx| unsafe {
            GEOSWKTWriter_setOld3D_r(ctx, writer.as_ptr(), old_3d as c_int)
        })
    }

    pub fn write(&self, geometry: &Geometry) -> Result<String> {
        let writer = self.handle.get()?;
        let geom = geometry.raw()?;
        with_context(|ctx| unsafe {
            let ptr = GEOSWKTWriter_write_r(ctx, writer.as_ptr(), geom.as_ptr());
            if ptr.is_null() {
                return Err(native_error("GEOSWKTWriter_write"));
            }
            let text = CStr::from_ptr(ptr).to_string_lossy().into_owned();
            GEOSFree_r(ctx, ptr as *mut c_void);
            Ok(text)
        })?
    }
}

/// Reads well-known binary, raw or hex-encoded.
pub struct WkbReader {
    handle: Handle<GEOSWKBReader>,
}

impl WkbReader {
    pub fn new() -> Result<WkbReader> {
        let ptr = with_context(|ctx| unsafe { GEOSWKBReader_create_r(ctx) })?;
        let handle = Handle::new(ptr).ok_or_else(|| native_error("GEOSWKBReader_create"))?;
        Ok(WkbReader { handle })
    }

    pub fn read(&self, wkb: &[u8]) -> Result<AnyGeometry> {
        let reader = self.handle.get()?;
        let ptr = with_context(|ctx| unsafe {
            GEOSWKBReader_read_r(ctx, reader.as_ptr(), wkb.as_ptr(), wkb.len())
        })?;
        if ptr.is_null() {
            return Err(parse_error("WKB"));
        }
        AnyGeometry::from_geometry(Geometry::from_ptr(ptr, "GEOSWKBReader_read")?)
    }

    pub fn read_hex(&self, hex: &str) -> Result<AnyGeometry> {
        let reader = self.handle.get()?;
        let bytes = hex.as_bytes();
        let ptr = with_context(|ctx| unsafe {
            GEOSWKBReader_readHEX_r(ctx, reader.as_ptr(), bytes.as_ptr(), bytes.len())
        })?;
        if ptr.is_null() {
            return Err(parse_error("hex WKB"));
        }
        AnyGeometry::from_geometry(Geometry::from_ptr(ptr, "GEOSWKBReader_readHEX")?)
    }
}

/// Writes well-known binary.
///
/// Defaults to two output dimensions in the platform byte order, without an
/// embedded SRID.
pub struct WkbWriter {
    handle: Handle<GEOSWKBWriter>,
}

impl WkbWriter {
    pub fn new() -> Result<WkbWriter> {
        let ptr = with_context(|ctx| unsafe { GEOSWKBWriter_create_r(ctx) })?;
        let handle = Handle::new(ptr).ok_or_else(|| native_error("GEOSWKBWriter_create"))?;
        let mut writer = WkbWriter { handle };
        writer.set_byte_order(ByteOrder::default())?;
        Ok(writer)
    }

    pub fn set_output_dimension(&mut self, dims: Dimensions) -> Result<()> {
        let writer = self.handle.get()?;
        with_context(|ctx| unsafe {
            GEOSWKBWriter_setOutputDimension_r(ctx, writer.as_ptr(), dimension_flag(dims))
        })
    }

    pub fn set_byte_order(&mut self, order: ByteOrder) -> Result<()> {
        let writer = self.handle.get()?;
        with_context(|ctx| unsafe {
            GEOSWKBWriter_setByteOrder_r(ctx, writer.as_ptr(), order as c_int)
        })
    }

    /// Embed the SRID in the output (the PostGIS EWKB extension).
    pub fn set_include_srid(&mut self, include: bool) -> Result<()> {
        let writer = self.handle.get()?;
        with_context(|ctx| unsafe {
            GEOSWKBWriter_setIncludeSRID_r(ctx, writer.as_ptr(), include as c_char)
        })
    }

    pub fn write(&self, geometry: &Geometry) -> Result<Vec<u8>> {
        let writer = self.handle.get()?;
        let geom = geometry.raw()?;
        with_context(|ctx| unsafe {
            let mut size = 0;
            let ptr = GEOSWKBWriter_write_r(ctx, writer.as_ptr(), geom.as_ptr(), &mut size);
            if ptr.is_null() {
                return Err(native_error("GEOSWKBWriter_write"));
            }
            let bytes = std::slice::from_raw_parts(ptr, size).to_vec();
            GEOSFree_r(ctx, ptr as *mut c_void);
            Ok(bytes)
        })?
    }

    pub fn write_hex(&self, geometry: &Geometry) -> Result<String> {
        let writer = self.handle.get()?;
        let geom = geometry.raw()?;
        with_context(|ctx| unsafe {
            let mut size = 0;
            let ptr = GEOSWKBWriter_writeHEX_r(ctx, writer.as_ptr(), geom.as_ptr(), &mut size);
            if ptr.is_null() {
                return Err(native_error("GEOSWKBWriter_writeHEX"));
            }
            let hex =
                String::from_utf8_lossy(std::slice::from_raw_parts(ptr, size)).into_owned();
            GEOSFree_r(ctx, ptr as *mut c_void);
            Ok(hex)
        })?
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wkt_writer_trims_and_labels_z_by_default() {
        let flat = AnyGeometry::from_wkt("POINT (1 2)").unwrap();
        let tall = AnyGeometry::from_wkt("POINT Z (1 2 3)").unwrap();
        let writer = WktWriter::new().unwrap();
        assert_eq!(writer.write(&flat).unwrap(), "POINT (1 2)");
        assert_eq!(writer.write(&tall).unwrap(), "POINT Z (1 2 3)");
    }

    #[test]
    fn wkt_writer_options() {
        let point = AnyGeometry::from_wkt("POINT Z (1.4567 2 3)").unwrap();
        let mut writer = WktWriter::new().unwrap();
        writer.set_rounding_precision(Some(2)).unwrap();
        assert_eq!(writer.write(&point).unwrap(), "POINT Z (1.46 2 3)");
        writer.set_rounding_precision(None).unwrap();
        writer.set_old_3d(true).unwrap();
        assert_eq!(writer.write(&point).unwrap(), "POINT (1.4567 2 3)");
        writer.set_output_dimension(Dimensions::Two).unwrap();
        assert_eq!(writer.write(&point).unwrap(), "POINT (1.4567 2)");
    }

    #[test]
    fn wkb_round_trip_defaults_to_two_dimensions() {
        let point = AnyGeometry::from_wkt("POINT Z (1 2 3)").unwrap();
        let writer = WkbWriter::new().unwrap();
        let wkb = writer.write(&point).unwrap();
        let back = WkbReader::new().unwrap().read(&wkb).unwrap();
        assert_eq!(back.geometry().wkt().unwrap(), "POINT (1 2)");
    }

    #[test]
    fn wkb_writer_three_dimensions_and_hex() {
        let point = AnyGeometry::from_wkt("POINT Z (1 2 3)").unwrap();
        let mut writer = WkbWriter::new().unwrap();
        writer.set_output_dimension(Dimensions::Three).unwrap();
        let hex = writer.write_hex(&point).unwrap();
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        let back = WkbReader::new().unwrap().read_hex(&hex).unwrap();
        assert_eq!(back.geometry().wkt().unwrap(), "POINT Z (1 2 3)");
    }

    #[test]
    fn include_srid_survives_a_round_trip() {
        let point = AnyGeometry::from_wkt("SRID=4326;POINT (1 2)").unwrap();
        let mut writer = WkbWriter::new().unwrap();
        writer.set_include_srid(true).unwrap();
        let ewkb = writer.write(&point).unwrap();
        let back = WkbReader::new().unwrap().read(&ewkb).unwrap();
        assert_eq!(back.geometry().srid().unwrap(), Some(4326));
    }

    #[test]
    fn malformed_input_is_a_construction_error() {
        let err = WktReader::new().unwrap().read("POINT (a b)").unwrap_err();
        assert!(matches!(err, GeobindError::GeometryConstruction(_)));
        let err = WkbReader::new().unwrap().read(&[0x00, 0x01]).unwrap_err();
        assert!(matches!(err, GeobindError::GeometryConstruction(_)));
    }
}
