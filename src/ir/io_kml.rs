//! KML reader.
//!
//! Extracts timeline items from KML: every `<Placemark>` at any nesting depth
//! (point / line / polygon geometries, possibly several per placemark) and
//! every `<GroundOverlay>` (image plus `<LatLonBox>` bounds). Placemarks
//! without their own time declaration inherit one from the nearest enclosing
//! `<Folder>` or `<Document>` that carries a `<TimeStamp>` or `<TimeSpan>`.
//!
//! Tag matching ignores XML namespaces, so documents with or without the KML
//! namespace declaration parse the same way.

use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

use super::bind::FieldBinder;
use super::clock::{Clock, SystemClock};
use super::model::{Coordinate, Geometry, Overlay, TimelineItem};
use crate::error::TimemarkError;

/// Container kinds whose time declarations descendant placemarks inherit.
const CONTAINER_TAGS: [&str; 2] = ["Folder", "Document"];

/// Cap on ancestor ascent while resolving time, so a pathological tree can
/// never walk unbounded.
const MAX_TIME_ASCENT: usize = 64;

/// Per-parse configuration: metadata binders, the clock used to close
/// open-ended spans, and an optional per-item hook.
pub struct KmlReadOptions {
    /// Binders run against each item's `<ExtendedData>` block, if present.
    pub binders: Vec<FieldBinder>,

    /// Source of "now" text for spans declared without an `<end>`.
    pub clock: Box<dyn Clock>,

    /// Caller-defined post-processing applied to every item before it is
    /// appended to the output.
    pub postprocess: Option<Box<dyn Fn(&mut TimelineItem)>>,
}

impl Default for KmlReadOptions {
    fn default() -> Self {
        Self {
            binders: Vec::new(),
            clock: Box::new(SystemClock),
            postprocess: None,
        }
    }
}

impl KmlReadOptions {
    /// Adds a metadata field binder.
    pub fn with_binder(mut self, binder: FieldBinder) -> Self {
        self.binders.push(binder);
        self
    }

    /// Replaces the clock used for open-ended span defaulting.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Sets the per-item post-processing hook.
    pub fn with_postprocess(mut self, hook: impl Fn(&mut TimelineItem) + 'static) -> Self {
        self.postprocess = Some(Box::new(hook));
        self
    }
}

/// Read a KML file into timeline items with default options.
pub fn read_kml(path: &Path) -> Result<Vec<TimelineItem>, TimemarkError> {
    read_kml_with(path, &KmlReadOptions::default())
}

/// Read a KML file into timeline items.
pub fn read_kml_with(
    path: &Path,
    opts: &KmlReadOptions,
) -> Result<Vec<TimelineItem>, TimemarkError> {
    let xml = fs::read_to_string(path).map_err(TimemarkError::Io)?;
    parse_kml_str(&xml, path, opts)
}

/// Parse KML from a string with default options.
pub fn from_kml_str(xml: &str) -> Result<Vec<TimelineItem>, TimemarkError> {
    parse_kml_str(xml, Path::new("<string>"), &KmlReadOptions::default())
}

/// Parse KML from a string.
pub fn from_kml_str_with(
    xml: &str,
    opts: &KmlReadOptions,
) -> Result<Vec<TimelineItem>, TimemarkError> {
    parse_kml_str(xml, Path::new("<string>"), opts)
}

/// Parse KML from bytes (must be valid UTF-8).
pub fn from_kml_slice(bytes: &[u8]) -> Result<Vec<TimelineItem>, TimemarkError> {
    let xml = std::str::from_utf8(bytes).map_err(|source| TimemarkError::KmlParse {
        path: PathBuf::from("<bytes>"),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    parse_kml_str(xml, Path::new("<bytes>"), &KmlReadOptions::default())
}

/// Decode a KML coordinate string into (lon, lat[, alt]) tuples.
///
/// Tuples are whitespace/newline-separated; components within a tuple are
/// comma-separated. Tuple order is preserved. A tuple whose longitude or
/// latitude fails to parse is skipped; a malformed third component degrades
/// to a missing altitude.
pub fn decode_coordinates(text: &str) -> Vec<Coordinate> {
    let mut coords = Vec::new();
    for tuple in text.split_whitespace() {
        let mut parts = tuple.split(',');

        let Some(lon) = parts.next().and_then(parse_component) else {
            continue;
        };
        let Some(lat) = parts.next().and_then(parse_component) else {
            continue;
        };
        let alt = parts.next().and_then(parse_component);

        coords.push(Coordinate { lon, lat, alt });
    }
    coords
}

fn parse_component(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

fn parse_kml_str(
    xml: &str,
    path: &Path,
    opts: &KmlReadOptions,
) -> Result<Vec<TimelineItem>, TimemarkError> {
    let document = Document::parse(xml).map_err(|source| TimemarkError::KmlParse {
        path: path.to_path_buf(),
        message: source.to_string(),
    })?;

    let root = document.root_element();
    let mut items = Vec::new();

    // Placemark-derived items first, then overlays, each group in document
    // order.
    for placemark in descendants_named(root, "Placemark") {
        items.push(parse_placemark(placemark, opts));
    }
    for overlay in descendants_named(root, "GroundOverlay") {
        items.push(parse_ground_overlay(overlay, opts));
    }

    Ok(items)
}

fn parse_placemark(node: Node<'_, '_>, opts: &KmlReadOptions) -> TimelineItem {
    let mut item = item_base(node, opts);

    for point in descendants_named(node, "Point") {
        if let Some(geometry) = extract_point(point) {
            item.geometries.push(geometry);
        }
    }
    for line in descendants_named(node, "LineString") {
        item.geometries.push(extract_polyline(line));
    }
    for polygon in descendants_named(node, "Polygon") {
        item.geometries.push(extract_polygon(polygon));
    }

    finish_item(item, opts)
}

fn parse_ground_overlay(node: Node<'_, '_>, opts: &KmlReadOptions) -> TimelineItem {
    let mut item = item_base(node, opts);
    let mut overlay = Overlay::default();

    if let Some(icon) = child_element(node, "Icon") {
        overlay.image = optional_child_text(icon, "href");
    }

    // First <LatLonBox> wins; later duplicates are ignored.
    if let Some(latlonbox) = child_element(node, "LatLonBox") {
        overlay.north = optional_child_text(latlonbox, "north");
        overlay.south = optional_child_text(latlonbox, "south");
        overlay.east = optional_child_text(latlonbox, "east");
        overlay.west = optional_child_text(latlonbox, "west");
    }

    item.overlay = Some(overlay);
    finish_item(item, opts)
}

/// Title, description, time, and bound metadata shared by placemark and
/// overlay items.
fn item_base(node: Node<'_, '_>, opts: &KmlReadOptions) -> TimelineItem {
    let mut item = TimelineItem {
        title: optional_child_text(node, "name"),
        description: optional_child_text(node, "description"),
        ..TimelineItem::default()
    };

    resolve_time(node, &mut item, opts.clock.as_ref(), MAX_TIME_ASCENT);
    bind_extended_data(node, &mut item, opts);
    item
}

fn finish_item(mut item: TimelineItem, opts: &KmlReadOptions) -> TimelineItem {
    if let Some(hook) = &opts.postprocess {
        hook(&mut item);
    }
    item
}

/// Resolve `start`/`end` for `node`, ascending through container ancestors
/// until a time declaration is found or the ascent path is exhausted.
///
/// `<TimeStamp>` takes priority over `<TimeSpan>` at the same element; the
/// first element hit along the ascent wins and the search never continues
/// past it. A span without an `<end>` is closed at the clock's current value.
fn resolve_time(node: Node<'_, '_>, item: &mut TimelineItem, clock: &dyn Clock, budget: usize) {
    if let Some(stamp) = child_element(node, "TimeStamp") {
        item.start = optional_child_text(stamp, "when");
        return;
    }

    if let Some(span) = child_element(node, "TimeSpan") {
        item.start = optional_child_text(span, "begin");
        item.end = optional_child_text(span, "end").or_else(|| Some(clock.now()));
        return;
    }

    if budget == 0 {
        return;
    }

    if let Some(parent) = node.parent().filter(Node::is_element) {
        if CONTAINER_TAGS.contains(&parent.tag_name().name()) {
            resolve_time(parent, item, clock, budget - 1);
        }
    }
}

fn bind_extended_data(node: Node<'_, '_>, item: &mut TimelineItem, opts: &KmlReadOptions) {
    if opts.binders.is_empty() {
        return;
    }

    let Some(block) = child_element(node, "ExtendedData") else {
        return;
    };

    let entries: Vec<Node<'_, '_>> = block
        .children()
        .filter(|child| child.is_element() && child.tag_name().name() == "Data")
        .collect();

    for binder in &opts.binders {
        binder.bind(&mut item.extras, &entries);
    }
}

fn extract_point(node: Node<'_, '_>) -> Option<Geometry> {
    // A point carries exactly one tuple; extras beyond the first are ignored.
    geometry_coordinates(node)
        .into_iter()
        .next()
        .map(Geometry::Point)
}

fn extract_polyline(node: Node<'_, '_>) -> Geometry {
    Geometry::Polyline(geometry_coordinates(node))
}

fn extract_polygon(node: Node<'_, '_>) -> Geometry {
    // The first <coordinates> under a polygon is its outer ring
    // (outerBoundaryIs/LinearRing). Rings are not auto-closed.
    Geometry::Polygon(geometry_coordinates(node))
}

fn geometry_coordinates(node: Node<'_, '_>) -> Vec<Coordinate> {
    descendants_named(node, "coordinates")
        .next()
        .and_then(|coords| coords.text())
        .map(decode_coordinates)
        .unwrap_or_default()
}

fn descendants_named<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants()
        .filter(move |n| n.is_element() && n.tag_name().name() == tag)
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}

fn optional_child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    child_element(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::FixedClock;

    #[test]
    fn decode_preserves_tuple_order_and_values() {
        let coords = decode_coordinates("1.0,2.0 3.0,4.0");
        assert_eq!(
            coords,
            vec![Coordinate::new(1.0, 2.0), Coordinate::new(3.0, 4.0)]
        );
    }

    #[test]
    fn decode_reads_optional_altitude() {
        let coords = decode_coordinates("10.5,-3.25,120\n11,-3.5");
        assert_eq!(coords.len(), 2);
        assert_eq!(coords[0].alt, Some(120.0));
        assert_eq!(coords[1].alt, None);
    }

    #[test]
    fn decode_skips_malformed_tuples() {
        let coords = decode_coordinates("1,2 nope,3 4,oops 5,6,huh");
        assert_eq!(coords.len(), 2);
        assert_eq!(coords[0], Coordinate::new(1.0, 2.0));
        // Malformed altitude degrades to None rather than dropping the tuple.
        assert_eq!(coords[1], Coordinate::new(5.0, 6.0));
    }

    #[test]
    fn decode_empty_text_yields_no_tuples() {
        assert!(decode_coordinates("   \n  ").is_empty());
    }

    #[test]
    fn malformed_xml_surfaces_parse_error() {
        let err = from_kml_str("<kml><Placemark>").unwrap_err();
        match err {
            TimemarkError::KmlParse { message, .. } => assert!(!message.is_empty()),
            other => panic!("expected KmlParse, got {other:?}"),
        }
    }

    #[test]
    fn timestamp_beats_span_at_same_element() {
        let kml = r#"<kml><Placemark>
            <TimeStamp><when>1914-06-28</when></TimeStamp>
            <TimeSpan><begin>1914-07-28</begin><end>1918-11-11</end></TimeSpan>
        </Placemark></kml>"#;

        let items = from_kml_str(kml).expect("parse");
        assert_eq!(items[0].start.as_deref(), Some("1914-06-28"));
        assert_eq!(items[0].end, None);
    }

    #[test]
    fn open_span_closes_at_injected_clock() {
        let kml = r#"<kml><Placemark>
            <TimeSpan><begin>2005-01-01</begin></TimeSpan>
        </Placemark></kml>"#;

        let opts = KmlReadOptions::default().with_clock(FixedClock::new("2011-10-01T00:00:00Z"));
        let items = from_kml_str_with(kml, &opts).expect("parse");
        assert_eq!(items[0].start.as_deref(), Some("2005-01-01"));
        assert_eq!(items[0].end.as_deref(), Some("2011-10-01T00:00:00Z"));
    }

    #[test]
    fn time_ascends_only_through_containers() {
        // The placemark sits under a non-container element; the document's
        // span must not leak through it.
        let kml = r#"<kml><Document>
            <TimeSpan><begin>1900</begin><end>1910</end></TimeSpan>
            <NetworkLink><Placemark><name>p</name></Placemark></NetworkLink>
        </Document></kml>"#;

        let items = from_kml_str(kml).expect("parse");
        assert_eq!(items[0].start, None);
        assert_eq!(items[0].end, None);
    }

    #[test]
    fn point_uses_only_first_tuple() {
        let kml = r#"<kml><Placemark>
            <Point><coordinates>1,2 3,4</coordinates></Point>
        </Placemark></kml>"#;

        let items = from_kml_str(kml).expect("parse");
        assert_eq!(
            items[0].geometries,
            vec![Geometry::Point(Coordinate::new(1.0, 2.0))]
        );
    }

    #[test]
    fn point_without_coordinates_yields_no_geometry() {
        let kml = r#"<kml><Placemark><Point/></Placemark></kml>"#;
        let items = from_kml_str(kml).expect("parse");
        assert!(items[0].geometries.is_empty());
    }

    #[test]
    fn polygon_reads_outer_ring_without_closing_it() {
        let kml = r#"<kml><Placemark><Polygon>
            <outerBoundaryIs><LinearRing>
                <coordinates>0,0 4,0 4,4</coordinates>
            </LinearRing></outerBoundaryIs>
        </Polygon></Placemark></kml>"#;

        let items = from_kml_str(kml).expect("parse");
        let Geometry::Polygon(ring) = &items[0].geometries[0] else {
            panic!("expected polygon");
        };
        // Three vertices in, three vertices out; the ring is not auto-closed.
        assert_eq!(ring.len(), 3);
        assert_eq!(ring[2], Coordinate::new(4.0, 4.0));
    }

    #[test]
    fn multi_geometry_placemark_groups_by_kind() {
        let kml = r#"<kml><Placemark>
            <MultiGeometry>
                <LineString><coordinates>0,0 1,1</coordinates></LineString>
                <Point><coordinates>5,5</coordinates></Point>
                <LineString><coordinates>2,2 3,3</coordinates></LineString>
            </MultiGeometry>
        </Placemark></kml>"#;

        let items = from_kml_str(kml).expect("parse");
        let kinds: Vec<&str> = items[0]
            .geometries
            .iter()
            .map(|g| match g {
                Geometry::Point(_) => "point",
                Geometry::Polyline(_) => "polyline",
                Geometry::Polygon(_) => "polygon",
            })
            .collect();
        // Points first, then polylines (each kind in document order).
        assert_eq!(kinds, vec!["point", "polyline", "polyline"]);
    }

    #[test]
    fn postprocess_hook_sees_every_item() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let kml = r#"<kml>
            <Placemark><name>a</name></Placemark>
            <GroundOverlay><name>b</name></GroundOverlay>
        </kml>"#;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_hook = Rc::clone(&seen);
        let opts = KmlReadOptions::default().with_postprocess(move |item: &mut TimelineItem| {
            seen_hook.borrow_mut().push(item.title.clone());
            item.extras.insert("tagged".to_string(), "yes".to_string());
        });

        let items = from_kml_str_with(kml, &opts).expect("parse");
        assert_eq!(seen.borrow().len(), 2);
        assert!(items.iter().all(|i| i.extras.contains_key("tagged")));
    }
}
