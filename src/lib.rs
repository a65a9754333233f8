//! Safe, thread-aware bindings to the GEOS and OGR geometry engines.
//!
//! Every native object is owned by exactly one Rust wrapper, every native
//! call runs through the calling thread's own engine session, and no wrapper
//! is `Send` or `Sync`. Geometries parse from and serialize to WKT, EWKT,
//! WKB, hex WKB, GeoJSON, and KML; the optional `gdal` feature adds the OGR
//! engine for spatial references, coordinate transformation, and GML.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub mod error;
#[cfg(feature = "gdal")]
pub mod gdal;
pub mod geos;
pub(crate) mod handle;

pub use error::{GeobindError, Result};
