//! Coordinate sequences: the native buffers holding the vertices of points,
//! line strings and rings.

use std::ptr::NonNull;

use geos_sys::{
    GEOSCoordSeq_clone_r, GEOSCoordSeq_create_r, GEOSCoordSeq_destroy_r,
    GEOSCoordSeq_getOrdinate_r, GEOSCoordSeq_getSize_r, GEOSCoordSeq_isCCW_r,
    GEOSCoordSeq_setOrdinate_r, GEOSCoordSequence, GEOSGeom_getCoordSeq_r,
};
use libc::{c_char, c_double, c_uint};

use crate::error::{GeobindError, Result};
use crate::geos::context::{check_predicate, native_error, with_context};
use crate::geos::geometry::Geometry;
use crate::handle::{Handle, NativeFree};

impl NativeFree for GEOSCoordSequence {
    unsafe fn free(ptr: NonNull<Self>) {
        // Teardown failures are swallowed; see `handle`.
        let _ = with_context(|ctx| GEOSCoordSeq_destroy_r(ctx, ptr.as_ptr()));
    }
}

/// One coordinate, 2D or 3D.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Coord { x, y, z: None }
    }

    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Coord { x, y, z: Some(z) }
    }

    /// Number of ordinates carried by this coordinate.
    pub fn dimensions(&self) -> usize {
        if self.z.is_some() {
            3
        } else {
            2
        }
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Coord::new(x, y)
    }
}

impl From<(f64, f64, f64)> for Coord {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Coord::new_3d(x, y, z)
    }
}

/// Declared dimensionality of a sequence, fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimensions {
    Two,
    Three,
}

impl Dimensions {
    pub(crate) fn as_c_uint(self) -> c_uint {
        match self {
            Dimensions::Two => 2,
            Dimensions::Three => 3,
        }
    }

    fn size(self) -> usize {
        self.as_c_uint() as usize
    }
}

/// An owned coordinate sequence.
///
/// Ownership is exclusive: attaching a sequence to a geometry consumes it,
/// and sequences read back from a geometry are deep clones. Size and
/// dimensionality are fixed; resizing means rebuilding the owning geometry.
pub struct CoordSeq {
    handle: Handle<GEOSCoordSequence>,
    size: usize,
    dims: Dimensions,
}

impl CoordSeq {
    /// Allocate a sequence of `size` uninitialized coordinates.
    pub fn new(size: usize, dims: Dimensions) -> Result<CoordSeq> {
        let ptr = with_context(|ctx| unsafe {
            GEOSCoordSeq_create_r(ctx, size as c_uint, dims.as_c_uint())
        })?;
        let handle = Handle::new(ptr).ok_or_else(|| native_error("GEOSCoordSeq_create"))?;
        Ok(CoordSeq { handle, size, dims })
    }

    /// Build a sequence from coordinates, inferring dimensionality from the
    /// first one. Mixed 2D/3D input fails with `DimensionMismatch`.
    pub fn from_coords<C: Into<Coord> + Copy>(coords: &[C]) -> Result<CoordSeq> {
        let dims = match coords.first() {
            Some(first) => match (*first).into().z {
                Some(_) => Dimensions::Three,
                None => Dimensions::Two,
            },
            None => Dimensions::Two,
        };
        let mut seq = CoordSeq::new(coords.len(), dims)?;
        for (i, coord) in coords.iter().enumerate() {
            seq.set(i, (*coord).into())?;
        }
        Ok(seq)
    }

    /// Wrap a pointer cloned from a geometry's internal sequence.
    pub(crate) fn from_raw(ptr: *mut GEOSCoordSequence, size: usize, has_z: bool) -> Result<CoordSeq> {
        let handle = Handle::new(ptr).ok_or(GeobindError::NullHandle)?;
        let dims = if has_z { Dimensions::Three } else { Dimensions::Two };
        Ok(CoordSeq { handle, size, dims })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn has_z(&self) -> bool {
        self.dims == Dimensions::Three
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.size {
            Ok(())
        } else {
            Err(GeobindError::IndexOutOfRange {
                index,
                size: self.size,
            })
        }
    }

    fn check_ordinate(&self, dimension: usize) -> Result<()> {
        if dimension > 2 {
            Err(GeobindError::InvalidOrdinate(dimension))
        } else {
            Ok(())
        }
    }

    /// Value of one ordinate (0 = x, 1 = y, 2 = z).
    pub fn ordinate(&self, dimension: usize, index: usize) -> Result<f64> {
        self.check_index(index)?;
        self.check_ordinate(dimension)?;
        let ptr = self.handle.get()?;
        seq_get_ordinate(ptr.as_ptr(), index, dimension)
    }

    /// Set one ordinate in place.
    pub fn set_ordinate(&mut self, dimension: usize, index: usize, value: f64) -> Result<()> {
        self.check_index(index)?;
        self.check_ordinate(dimension)?;
        let ptr = self.handle.get()?;
        seq_set_ordinate(ptr.as_ptr(), index, dimension, value)
    }

    pub fn x(&self, index: usize) -> Result<f64> {
        self.ordinate(0, index)
    }

    pub fn y(&self, index: usize) -> Result<f64> {
        self.ordinate(1, index)
    }

    pub fn z(&self, index: usize) -> Result<f64> {
        self.ordinate(2, index)
    }

    /// The coordinate at `index`, with a z ordinate when the sequence is 3D.
    pub fn get(&self, index: usize) -> Result<Coord> {
        self.check_index(index)?;
        let ptr = self.handle.get()?.as_ptr();
        let x = seq_get_ordinate(ptr, index, 0)?;
        let y = seq_get_ordinate(ptr, index, 1)?;
        let z = if self.has_z() {
            Some(seq_get_ordinate(ptr, index, 2)?)
        } else {
            None
        };
        Ok(Coord { x, y, z })
    }

    /// Write a whole coordinate. Its dimensionality must match the
    /// sequence's declared dimensionality.
    pub fn set(&mut self, index: usize, coord: impl Into<Coord>) -> Result<()> {
        let coord = coord.into();
        if coord.dimensions() != self.dims.size() {
            return Err(GeobindError::DimensionMismatch {
                expected: self.dims.size(),
                found: coord.dimensions(),
            });
        }
        self.check_index(index)?;
        let ptr = self.handle.get()?.as_ptr();
        seq_set_ordinate(ptr, index, 0, coord.x)?;
        seq_set_ordinate(ptr, index, 1, coord.y)?;
        if let Some(z) = coord.z {
            seq_set_ordinate(ptr, index, 2, z)?;
        }
        Ok(())
    }

    /// All coordinates of the sequence.
    pub fn coords(&self) -> Result<Vec<Coord>> {
        (0..self.size).map(|i| self.get(i)).collect()
    }

    /// Deep copy of the native buffer. Required before attaching the same
    /// logical coordinates to a second geometry.
    pub fn try_clone(&self) -> Result<CoordSeq> {
        let ptr = self.handle.get()?;
        let cloned = with_context(|ctx| unsafe { GEOSCoordSeq_clone_r(ctx, ptr.as_ptr()) })?;
        let handle = Handle::new(cloned).ok_or_else(|| native_error("GEOSCoordSeq_clone"))?;
        Ok(CoordSeq {
            handle,
            size: self.size,
            dims: self.dims,
        })
    }

    /// Ring orientation of the sequence.
    pub fn is_counterclockwise(&self) -> Result<bool> {
        let ptr = self.handle.get()?;
        let mut is_ccw: c_char = 0;
        let ret = with_context(|ctx| unsafe {
            GEOSCoordSeq_isCCW_r(ctx, ptr.as_ptr(), &mut is_ccw)
        })?;
        if ret == 0 {
            return Err(native_error("GEOSCoordSeq_isCCW"));
        }
        check_predicate(is_ccw, "GEOSCoordSeq_isCCW")
    }

    /// Hand the native buffer to a geometry factory, which takes ownership.
    pub(crate) fn take(mut self) -> Result<*mut GEOSCoordSequence> {
        Ok(self.handle.take()?.as_ptr())
    }
}

/// KML `<coordinates>` rendering shared by the markup exports. 2D
/// coordinates render a zero altitude, matching the KML convention.
pub(crate) fn kml_coordinates(coords: &[Coord]) -> String {
    let parts: Vec<String> = coords
        .iter()
        .map(|c| match c.z {
            Some(z) => format!("{},{},{}", c.x, c.y, z),
            None => format!("{},{},0", c.x, c.y),
        })
        .collect();
    format!("<coordinates>{}</coordinates>", parts.join(" "))
}

/// Deep-clone the internal coordinate sequence of a point, line string or
/// ring geometry.
pub(crate) fn clone_from_geometry(geom: &Geometry) -> Result<CoordSeq> {
    let has_z = geom.has_z()?;
    let inner = geometry_seq_ptr(geom)?;
    let mut size: c_uint = 0;
    let ret = with_context(|ctx| unsafe { GEOSCoordSeq_getSize_r(ctx, inner, &mut size) })?;
    if ret == 0 {
        return Err(native_error("GEOSCoordSeq_getSize"));
    }
    let cloned = with_context(|ctx| unsafe { GEOSCoordSeq_clone_r(ctx, inner) })?;
    if cloned.is_null() {
        return Err(native_error("GEOSCoordSeq_clone"));
    }
    CoordSeq::from_raw(cloned, size as usize, has_z)
}

/// Pointer to the coordinate sequence owned by a geometry.
///
/// The engine reports it as const; in-place ordinate writes through it are
/// sound because the geometry is the sequence's only owner. The pointer must
/// not outlive the geometry or be handed to a destroying call.
pub(crate) fn geometry_seq_ptr(geom: &Geometry) -> Result<*mut GEOSCoordSequence> {
    let gptr = geom.raw()?;
    let seq = with_context(|ctx| unsafe { GEOSGeom_getCoordSeq_r(ctx, gptr.as_ptr()) })?;
    if seq.is_null() {
        return Err(native_error("GEOSGeom_getCoordSeq"));
    }
    Ok(seq as *mut GEOSCoordSequence)
}

pub(crate) fn seq_get_ordinate(
    ptr: *mut GEOSCoordSequence,
    index: usize,
    dimension: usize,
) -> Result<f64> {
    let mut value: c_double = 0.0;
    let ret = with_context(|ctx| unsafe {
        GEOSCoordSeq_getOrdinate_r(ctx, ptr, index as c_uint, dimension as c_uint, &mut value)
    })?;
    if ret == 0 {
        return Err(native_error("GEOSCoordSeq_getOrdinate"));
    }
    Ok(value)
}

pub(crate) fn seq_set_ordinate(
    ptr: *mut GEOSCoordSequence,
    index: usize,
    dimension: usize,
    value: f64,
) -> Result<()> {
    let ret = with_context(|ctx| unsafe {
        GEOSCoordSeq_setOrdinate_r(ctx, ptr, index as c_uint, dimension as c_uint, value)
    })?;
    if ret == 0 {
        return Err(native_error("GEOSCoordSeq_setOrdinate"));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn get_and_set_round_trip() {
        let mut seq = CoordSeq::new(2, Dimensions::Two).unwrap();
        seq.set(0, (1.0, 2.0)).unwrap();
        seq.set(1, (3.0, 4.0)).unwrap();
        assert_relative_eq!(seq.x(0).unwrap(), 1.0);
        assert_relative_eq!(seq.y(1).unwrap(), 4.0);
        assert_eq!(seq.get(1).unwrap(), Coord::new(3.0, 4.0));
    }

    #[test]
    fn index_out_of_range() {
        let seq = CoordSeq::new(1, Dimensions::Two).unwrap();
        assert!(matches!(
            seq.get(1),
            Err(GeobindError::IndexOutOfRange { index: 1, size: 1 })
        ));
    }

    #[test]
    fn invalid_ordinate_dimension() {
        let seq = CoordSeq::new(1, Dimensions::Two).unwrap();
        assert!(matches!(
            seq.ordinate(3, 0),
            Err(GeobindError::InvalidOrdinate(3))
        ));
    }

    #[test]
    fn dimension_mismatch_on_set() {
        let mut seq = CoordSeq::new(1, Dimensions::Two).unwrap();
        assert!(matches!(
            seq.set(0, (1.0, 2.0, 3.0)),
            Err(GeobindError::DimensionMismatch {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn mixed_dimensionality_is_rejected() {
        let mut seq = CoordSeq::new(2, Dimensions::Three).unwrap();
        seq.set(0, (0.0, 0.0, 0.0)).unwrap();
        assert!(seq.set(1, (1.0, 1.0)).is_err());
    }

    #[test]
    fn clone_is_independent() {
        let mut seq = CoordSeq::from_coords(&[(0.0, 0.0), (1.0, 1.0)]).unwrap();
        let cloned = seq.try_clone().unwrap();
        seq.set(0, (9.0, 9.0)).unwrap();
        assert_eq!(cloned.get(0).unwrap(), Coord::new(0.0, 0.0));
        assert_eq!(seq.get(0).unwrap(), Coord::new(9.0, 9.0));
    }

    #[test]
    fn counterclockwise_ring() {
        let ccw =
            CoordSeq::from_coords(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]).unwrap();
        assert!(ccw.is_counterclockwise().unwrap());
        let cw = CoordSeq::from_coords(&[(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)]).unwrap();
        assert!(!cw.is_counterclockwise().unwrap());
    }
}
