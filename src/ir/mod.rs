//! Intermediate representation for timemark.
//!
//! This module defines the normalized, host-facing representation of timeline
//! items and the reader that produces them from KML. Reading is a one-way,
//! per-call transformation: the raw document becomes a navigable tree, items
//! are assembled in document order, and the resulting sequence is handed to
//! the caller with no state retained between calls.

mod bind;
mod clock;
pub mod io_kml;
mod model;

// Re-export core types for convenient access
pub use bind::{FieldBinder, OptionSetter};
pub use clock::{Clock, FixedClock, SystemClock};
pub use io_kml::{
    decode_coordinates, from_kml_slice, from_kml_str, from_kml_str_with, read_kml, read_kml_with,
    KmlReadOptions,
};
pub use model::{Coordinate, Geometry, Overlay, TimelineItem};
