//! Spatial reference systems and coordinate transformations.

use std::ffi::CString;
use std::ptr::NonNull;

use gdal_sys::{
    OCTDestroyCoordinateTransformation, OCTNewCoordinateTransformation, OSRExportToPrettyWkt,
    OSRExportToProj4, OSRExportToWkt, OSRGetAuthorityCode, OSRGetAuthorityName, OSRImportFromEPSG,
    OSRIsGeographic, OSRIsProjected, OSRNewSpatialReference, OSRReference, OSRRelease,
    OSRSetFromUserInput,
};
use libc::c_char;

use crate::error::{GeobindError, Result};
use crate::gdal::util::{_owned_string, _string, check_ogr_err, last_null_pointer_err};
use crate::handle::{Handle, NativeFree};

/// Opaque marker for `OGRSpatialReferenceH`. The native handle type is a
/// bare void pointer, so a distinct Rust type carries the release contract.
pub(crate) enum SrsToken {}

impl NativeFree for SrsToken {
    unsafe fn free(ptr: NonNull<Self>) {
        // Reference-counted on the native side; this drops one reference.
        OSRRelease(ptr.as_ptr() as gdal_sys::OGRSpatialReferenceH);
    }
}

/// Opaque marker for `OGRCoordinateTransformationH`.
pub(crate) enum TransformToken {}

impl NativeFree for TransformToken {
    unsafe fn free(ptr: NonNull<Self>) {
        OCTDestroyCoordinateTransformation(ptr.as_ptr() as gdal_sys::OGRCoordinateTransformationH);
    }
}

/// A spatial reference system.
///
/// Cloning shares the native object by bumping its reference count, so a
/// reference attached to several geometries stays alive until the last owner
/// drops.
pub struct SpatialRef {
    handle: Handle<SrsToken>,
}

impl SpatialRef {
    fn empty() -> Result<SpatialRef> {
        let ptr = unsafe { OSRNewSpatialReference(std::ptr::null()) };
        let handle = Handle::new(ptr as *mut SrsToken)
            .ok_or_else(|| last_null_pointer_err("OSRNewSpatialReference"))?;
        Ok(SpatialRef { handle })
    }

    pub fn from_epsg(code: i32) -> Result<SpatialRef> {
        let srs = SpatialRef::empty()?;
        check_ogr_err(
            unsafe { OSRImportFromEPSG(srs.raw()? as gdal_sys::OGRSpatialReferenceH, code) },
            "OSRImportFromEPSG",
        )?;
        Ok(srs)
    }

    /// Build from any definition GDAL understands: WKT, PROJ strings,
    /// `EPSG:<code>`, well-known names like `WGS84`.
    pub fn from_definition(definition: &str) -> Result<SpatialRef> {
        let srs = SpatialRef::empty()?;
        let text = CString::new(definition).map_err(|_| {
            GeobindError::SpatialReference("definition contains a NUL byte".to_string())
        })?;
        check_ogr_err(
            unsafe {
                OSRSetFromUserInput(
                    srs.raw()? as gdal_sys::OGRSpatialReferenceH,
                    text.as_ptr(),
                )
            },
            "OSRSetFromUserInput",
        )
        .map_err(|_| {
            GeobindError::SpatialReference(format!(
                "could not interpret spatial reference definition {definition:?}"
            ))
        })?;
        Ok(srs)
    }

    pub(crate) fn raw(&self) -> Result<*mut SrsToken> {
        Ok(self.handle.get()?.as_ptr())
    }

    fn native(&self) -> Result<gdal_sys::OGRSpatialReferenceH> {
        Ok(self.raw()? as gdal_sys::OGRSpatialReferenceH)
    }

    /// Adopt a native handle the engine still owns, bumping its reference
    /// count so both owners can release independently.
    pub(crate) fn from_shared(ptr: gdal_sys::OGRSpatialReferenceH) -> Option<SpatialRef> {
        let handle = Handle::new(ptr as *mut SrsToken)?;
        unsafe { OSRReference(ptr) };
        Some(SpatialRef { handle })
    }

    pub fn auth_name(&self) -> Result<Option<String>> {
        let ptr = unsafe { OSRGetAuthorityName(self.native()?, std::ptr::null()) };
        Ok((!ptr.is_null()).then(|| _string(ptr)))
    }

    pub fn auth_code(&self) -> Result<Option<String>> {
        let ptr = unsafe { OSRGetAuthorityCode(self.native()?, std::ptr::null()) };
        Ok((!ptr.is_null()).then(|| _string(ptr)))
    }

    /// The EPSG code, when the root authority is EPSG.
    pub fn srid(&self) -> Result<Option<i32>> {
        match (self.auth_name()?, self.auth_code()?) {
            (Some(name), Some(code)) if name.eq_ignore_ascii_case("EPSG") => {
                Ok(code.parse().ok())
            }
            _ => Ok(None),
        }
    }

    pub fn wkt(&self) -> Result<String> {
        let mut ptr: *mut c_char = std::ptr::null_mut();
        check_ogr_err(
            unsafe { OSRExportToWkt(self.native()?, &mut ptr) },
            "OSRExportToWkt",
        )?;
        Ok(_owned_string(ptr))
    }

    pub fn pretty_wkt(&self) -> Result<String> {
        let mut ptr: *mut c_char = std::ptr::null_mut();
        check_ogr_err(
            unsafe { OSRExportToPrettyWkt(self.native()?, &mut ptr, 0) },
            "OSRExportToPrettyWkt",
        )?;
        Ok(_owned_string(ptr))
    }

    pub fn proj4(&self) -> Result<String> {
        let mut ptr: *mut c_char = std::ptr::null_mut();
        check_ogr_err(
            unsafe { OSRExportToProj4(self.native()?, &mut ptr) },
            "OSRExportToProj4",
        )?;
        Ok(_owned_string(ptr))
    }

    pub fn is_geographic(&self) -> Result<bool> {
        Ok(unsafe { OSRIsGeographic(self.native()?) } != 0)
    }

    pub fn is_projected(&self) -> Result<bool> {
        Ok(unsafe { OSRIsProjected(self.native()?) } != 0)
    }
}

impl Clone for SpatialRef {
    fn clone(&self) -> Self {
        let Ok(ptr) = self.native() else {
            // A released handle clones to a released handle.
            return SpatialRef {
                handle: Handle::released(),
            };
        };
        // Null was ruled out by native().
        SpatialRef::from_shared(ptr).unwrap_or(SpatialRef {
            handle: Handle::released(),
        })
    }
}

impl std::fmt::Debug for SpatialRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.wkt() {
            Ok(wkt) => f.write_str(&wkt),
            Err(_) => f.write_str("SpatialRef(released)"),
        }
    }
}

/// A reusable transformation between two spatial references.
///
/// Holds its own references to both systems; callers may drop theirs.
pub struct CoordTransform {
    handle: Handle<TransformToken>,
    source: SpatialRef,
    target: SpatialRef,
}

impl CoordTransform {
    pub fn new(source: &SpatialRef, target: &SpatialRef) -> Result<CoordTransform> {
        let ptr =
            unsafe { OCTNewCoordinateTransformation(source.native()?, target.native()?) };
        let handle = Handle::new(ptr as *mut TransformToken)
            .ok_or_else(|| last_null_pointer_err("OCTNewCoordinateTransformation"))?;
        Ok(CoordTransform {
            handle,
            source: source.clone(),
            target: target.clone(),
        })
    }

    pub(crate) fn raw(&self) -> Result<gdal_sys::OGRCoordinateTransformationH> {
        Ok(self.handle.get()?.as_ptr() as gdal_sys::OGRCoordinateTransformationH)
    }

    pub fn source(&self) -> &SpatialRef {
        &self.source
    }

    pub fn target(&self) -> &SpatialRef {
        &self.target
    }
}

/// Anything that names a transformation target.
pub enum SpatialRefInput<'a> {
    Srid(i32),
    Definition(&'a str),
    SpatialRef(&'a SpatialRef),
    Transform(&'a CoordTransform),
}

impl SpatialRefInput<'_> {
    /// Resolve to a concrete spatial reference.
    pub(crate) fn resolve(&self) -> Result<SpatialRef> {
        match self {
            SpatialRefInput::Srid(srid) => SpatialRef::from_epsg(*srid),
            SpatialRefInput::Definition(definition) => SpatialRef::from_definition(definition),
            SpatialRefInput::SpatialRef(srs) => Ok((*srs).clone()),
            SpatialRefInput::Transform(ct) => Ok(ct.target().clone()),
        }
    }
}

impl From<i32> for SpatialRefInput<'_> {
    fn from(srid: i32) -> Self {
        SpatialRefInput::Srid(srid)
    }
}

impl<'a> From<&'a str> for SpatialRefInput<'a> {
    fn from(definition: &'a str) -> Self {
        SpatialRefInput::Definition(definition)
    }
}

impl<'a> From<&'a SpatialRef> for SpatialRefInput<'a> {
    fn from(srs: &'a SpatialRef) -> Self {
        SpatialRefInput::SpatialRef(srs)
    }
}

impl<'a> From<&'a CoordTransform> for SpatialRefInput<'a> {
    fn from(ct: &'a CoordTransform) -> Self {
        SpatialRefInput::Transform(ct)
    }
}
