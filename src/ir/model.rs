//! Host-facing timeline item model produced by the KML reader.
//!
//! Items are constructed fresh per parse call from immutable input and never
//! mutated after being appended to the output sequence. Field names and the
//! tagged shape of [`Geometry`] match what the host visualization engine
//! expects to render.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One timeline entry: a temporal extent plus either map geometries or a
/// ground-overlay image, never both.
///
/// All fields are optional at the model level; missing source data leaves a
/// field unset rather than failing the parse, so the host can apply its own
/// rendering fallbacks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineItem {
    /// Text label shown on the timeline band.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Free-text description (may contain HTML in KML sources).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Start of the temporal extent, as date/time text from the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    /// End of a span extent; unset for instants and untimed items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,

    /// Geometries in document order; empty for overlay items.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geometries: Vec<Geometry>,

    /// Ground-overlay image, populated only for overlay-derived items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<Overlay>,

    /// Caller-requested metadata fields bound from the item's extended data.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, String>,
}

impl TimelineItem {
    /// Returns true if this item carries an image overlay rather than
    /// geometries.
    pub fn is_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    /// Returns true if a temporal extent was resolved for this item.
    pub fn has_time(&self) -> bool {
        self.start.is_some()
    }
}

/// A map shape attached to a timeline item.
///
/// This is a closed sum type so the host gets exhaustive-match guarantees;
/// downstream code never has to probe optional fields to discover the shape
/// kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates", rename_all = "lowercase")]
pub enum Geometry {
    /// A single position.
    Point(Coordinate),
    /// An open path of zero or more vertices.
    Polyline(Vec<Coordinate>),
    /// One polygon ring. Rings are passed through as declared in the source
    /// and are not auto-closed.
    Polygon(Vec<Coordinate>),
}

/// A (longitude, latitude[, altitude]) tuple, component order fixed by the
/// KML coordinate format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<f64>,
}

impl Coordinate {
    /// Creates a coordinate without an altitude component.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon,
            lat,
            alt: None,
        }
    }

    /// Sets the altitude component.
    pub fn with_alt(mut self, alt: f64) -> Self {
        self.alt = Some(alt);
        self
    }
}

/// A rectangular, geographically bounded image overlay.
///
/// Bounding-box edges are numeric-text pass-through from the source; no
/// validation or reprojection is applied.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlay {
    /// Image URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub north: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub south: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub east: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub west: Option<String>,
}
