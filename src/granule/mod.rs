//! Granule naming, tile geodesy, and metadata extraction.

pub mod id;
pub mod metadata;
pub mod mgrs;

pub use id::{GranuleId, ParseError};
pub use metadata::GranuleRecord;
pub use mgrs::{InvalidTileError, epsg_label, utm_epsg};
