//! Safe wrappers over the GEOS C API.
//!
//! Every type here owns exactly one native object through a [`Handle`] and
//! releases it on drop through the calling thread's engine session. Nothing
//! in this module is `Send` or `Sync`; geometries move between threads as
//! WKB or WKT, never as live handles.
//!
//! [`Handle`]: crate::handle::Handle

mod collections;
mod context;
mod coordseq;
mod geometry;
mod io;
mod json;
mod linestring;
mod point;
mod polygon;
mod prepared;

#[cfg(feature = "gdal")]
pub(crate) use geometry::split_srid_prefix;

pub use collections::{GeometryCollection, MultiLineString, MultiPoint, MultiPolygon};
pub use coordseq::{Coord, CoordSeq, Dimensions};
pub use geometry::{AnyGeometry, Geometry, GeometryType};
pub use io::{ByteOrder, WkbReader, WkbWriter, WktReader, WktWriter};
pub use linestring::{LineString, LinearRing};
pub use point::Point;
pub use polygon::Polygon;
pub use prepared::PreparedGeometry;
