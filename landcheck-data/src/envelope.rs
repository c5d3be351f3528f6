//! Raw upstream rows and the shapes their geometry arrives in.
//!
//! Rows come from several government tables that never agreed on a schema.
//! Geometry may sit under any of [`GEOMETRY_KEYS`], be a GeoJSON object, a
//! JSON document serialised into a string, WKT, or just a coordinate pair.
//! This module only sorts rows into a [`RawGeometryEnvelope`]; interpreting
//! the coordinates is the normalizer's job.

use serde_json::{Map, Value};

use landcheck_core::Properties;

/// Keys that may hold a row's geometry, in lookup order.
pub const GEOMETRY_KEYS: [&str; 5] = ["geometry", "geom", "the_geom", "wkt", "shape"];
/// Keys that may hold a precomputed centroid.
pub const CENTROID_KEYS: [&str; 2] = ["centroid", "center"];
/// Nested attribute bags merged into the feature properties.
pub const ATTRIBUTE_BAG_KEYS: [&str; 3] = ["attributes", "properties", "raw_data"];
/// Keys that may hold a row identifier, in lookup order.
pub const ID_KEYS: [&str; 4] = ["id", "objectid", "OBJECTID", "fid"];
/// Named coordinate pairs as `(x key, y key)`.
pub const PAIR_KEYS: [(&str, &str); 4] = [
    ("lng", "lat"),
    ("lon", "lat"),
    ("longitude", "latitude"),
    ("x", "y"),
];

const WKT_KEYWORDS: [&str; 7] = [
    "POINT",
    "LINESTRING",
    "POLYGON",
    "MULTIPOINT",
    "MULTILINESTRING",
    "MULTIPOLYGON",
    "GEOMETRYCOLLECTION",
];

/// The shape a row's geometry was delivered in.
#[derive(Debug, Clone, PartialEq)]
pub enum RawGeometryEnvelope {
    /// An object carrying `type` and `coordinates`.
    GeoJsonLike(Map<String, Value>),
    /// A string that is neither WKT nor empty; expected to hold JSON.
    JsonString(String),
    /// A WKT string plus the sibling centroid, if the row had one.
    WktLikeString {
        /// The WKT text as delivered.
        wkt: String,
        /// Sibling centroid value.
        centroid: Option<Value>,
    },
    /// A bare `[x, y]` array.
    CentroidArray(Vec<Value>),
    /// An object with named components such as `{lng, lat}` or `{x, y}`.
    CentroidObject(Map<String, Value>),
    /// No geometry at all.
    Missing,
}

impl RawGeometryEnvelope {
    /// Sort a geometry value, falling back to `centroid` when it is absent.
    #[must_use]
    pub fn from_value(geometry: Option<&Value>, centroid: Option<&Value>) -> Self {
        match geometry {
            None | Some(Value::Null) => centroid.map_or(Self::Missing, |value| {
                Self::from_value(Some(value), None)
            }),
            Some(Value::Object(map)) if map.contains_key("type") && map.contains_key("coordinates") => {
                Self::GeoJsonLike(map.clone())
            }
            Some(Value::Object(map)) => Self::CentroidObject(map.clone()),
            Some(Value::Array(items)) => Self::CentroidArray(items.clone()),
            Some(Value::String(text)) => Self::from_text(text, centroid),
            Some(other) => Self::JsonString(other.to_string()),
        }
    }

    fn from_text(text: &str, centroid: Option<&Value>) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return centroid.map_or(Self::Missing, |value| Self::from_value(Some(value), None));
        }
        if is_wkt_like(trimmed) {
            return Self::WktLikeString {
                wkt: trimmed.to_owned(),
                centroid: centroid.filter(|value| !value.is_null()).cloned(),
            };
        }
        Self::JsonString(trimmed.to_owned())
    }

    /// Short label for logging.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::GeoJsonLike(_) => "geojson",
            Self::JsonString(_) => "json-string",
            Self::WktLikeString { .. } => "wkt",
            Self::CentroidArray(_) => "centroid-array",
            Self::CentroidObject(_) => "centroid-object",
            Self::Missing => "missing",
        }
    }
}

/// Whether `text` opens like a WKT geometry, with an optional `SRID=n;`
/// prefix, ignoring case.
#[must_use]
pub fn is_wkt_like(text: &str) -> bool {
    let mut body = text.trim_start();
    if body.get(..5).is_some_and(|head| head.eq_ignore_ascii_case("SRID=")) {
        let Some((_, rest)) = body.split_once(';') else {
            return false;
        };
        body = rest.trim_start();
    }
    let keyword_len = body
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(body.len());
    let (keyword, rest) = body.split_at(keyword_len);
    WKT_KEYWORDS
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(keyword))
        && rest.trim_start().starts_with('(')
}

/// One upstream row, split into identity, attributes and geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Identifier found under one of [`ID_KEYS`].
    pub id: Option<String>,
    /// Merged attributes; top-level fields win over nested bag entries.
    pub properties: Properties,
    /// The geometry envelope.
    pub geometry: RawGeometryEnvelope,
    /// Sibling centroid found under one of [`CENTROID_KEYS`], kept for when
    /// the geometry itself cannot be read.
    pub centroid: Option<Value>,
}

impl RawRecord {
    /// Split a JSON row. Returns `None` when the row is not an object.
    ///
    /// # Examples
    ///
    /// ```
    /// use landcheck_data::{RawGeometryEnvelope, RawRecord};
    /// use serde_json::json;
    ///
    /// let row = json!({
    ///     "OBJECTID": 17,
    ///     "name": "top-level",
    ///     "attributes": {"name": "nested", "gush": 6638},
    ///     "centroid": {"lng": 34.77, "lat": 32.07},
    /// });
    /// let record = RawRecord::from_value(&row).expect("object row");
    /// assert_eq!(record.id.as_deref(), Some("17"));
    /// assert_eq!(record.properties["name"], "top-level");
    /// assert_eq!(record.properties["gush"], 6638);
    /// assert!(matches!(record.geometry, RawGeometryEnvelope::CentroidObject(_)));
    /// ```
    #[must_use]
    pub fn from_value(row: &Value) -> Option<Self> {
        let fields = row.as_object()?;
        Some(Self {
            id: find_id(fields),
            properties: merge_properties(fields),
            geometry: envelope_for(fields),
            centroid: first_present(fields, &CENTROID_KEYS).cloned(),
        })
    }
}

fn find_id(fields: &Map<String, Value>) -> Option<String> {
    ID_KEYS.iter().find_map(|key| match fields.get(*key)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

fn first_present<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| !value.is_null())
}

fn envelope_for(fields: &Map<String, Value>) -> RawGeometryEnvelope {
    let geometry = first_present(fields, &GEOMETRY_KEYS);
    let centroid = first_present(fields, &CENTROID_KEYS);
    if geometry.is_none()
        && centroid.is_none()
        && let Some(pair) = top_level_pair(fields)
    {
        return RawGeometryEnvelope::CentroidObject(pair);
    }
    RawGeometryEnvelope::from_value(geometry, centroid)
}

fn top_level_pair(fields: &Map<String, Value>) -> Option<Map<String, Value>> {
    PAIR_KEYS.iter().find_map(|(x_key, y_key)| {
        let x = fields.get(*x_key)?;
        let y = fields.get(*y_key)?;
        let mut pair = Map::new();
        pair.insert((*x_key).to_owned(), x.clone());
        pair.insert((*y_key).to_owned(), y.clone());
        Some(pair)
    })
}

/// Shallow-merge a row's nested attribute bag with its top-level fields.
///
/// Geometry, centroid and bag keys are dropped. On a name clash the
/// top-level value wins.
#[must_use]
pub fn merge_properties(fields: &Map<String, Value>) -> Properties {
    let mut merged = Properties::new();
    for bag in ATTRIBUTE_BAG_KEYS
        .iter()
        .filter_map(|key| fields.get(*key).and_then(Value::as_object))
    {
        for (key, value) in bag {
            merged.insert(key.clone(), value.clone());
        }
    }
    for (key, value) in fields {
        let structural = GEOMETRY_KEYS.contains(&key.as_str())
            || CENTROID_KEYS.contains(&key.as_str())
            || ATTRIBUTE_BAG_KEYS.contains(&key.as_str());
        if !structural {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("POINT (34.7 32.0)")]
    #[case("polygon((1 2, 3 4, 5 6, 1 2))")]
    #[case("SRID=2039;MULTIPOLYGON (((1 2, 3 4, 5 6, 1 2)))")]
    #[case("  srid=4326; GeometryCollection (POINT (1 2))")]
    fn recognises_wkt(#[case] text: &str) {
        assert!(is_wkt_like(text), "{text} should look like WKT");
    }

    #[rstest]
    #[case("{\"type\": \"Point\"}")]
    #[case("POINTS (1 2)")]
    #[case("POINT 1 2")]
    #[case("SRID=2039 POINT (1 2)")]
    #[case("")]
    fn rejects_non_wkt(#[case] text: &str) {
        assert!(!is_wkt_like(text), "{text} should not look like WKT");
    }

    #[rstest]
    fn geojson_objects_are_geojson_like() {
        let geometry = json!({"type": "Point", "coordinates": [34.7, 32.0]});
        let envelope = RawGeometryEnvelope::from_value(Some(&geometry), None);
        assert_eq!(envelope.label(), "geojson");
    }

    #[rstest]
    fn wkt_keeps_sibling_centroid() {
        let row = json!({
            "the_geom": "POLYGON ((1 2, 3 4, 5 6, 1 2))",
            "centroid": [180000.0, 665000.0],
        });
        let record = RawRecord::from_value(&row).expect("object row");
        match record.geometry {
            RawGeometryEnvelope::WktLikeString { centroid, .. } => {
                assert_eq!(centroid, Some(json!([180000.0, 665000.0])));
            }
            other => panic!("expected WKT, got {other:?}"),
        }
    }

    #[rstest]
    fn sibling_centroid_is_kept_beside_geojson() {
        let row = json!({
            "geometry": {"type": "Polygon", "coordinates": "unreadable"},
            "centroid": {"lng": 34.77, "lat": 32.07},
        });
        let record = RawRecord::from_value(&row).expect("object row");
        assert_eq!(record.geometry.label(), "geojson");
        assert_eq!(record.centroid, Some(json!({"lng": 34.77, "lat": 32.07})));
    }

    #[rstest]
    fn null_geometry_falls_back_to_centroid() {
        let row = json!({"geometry": null, "center": {"x": 180000, "y": 665000}});
        let record = RawRecord::from_value(&row).expect("object row");
        assert_eq!(record.geometry.label(), "centroid-object");
    }

    #[rstest]
    fn top_level_pairs_become_centroid_objects() {
        let row = json!({"id": "a", "lon": "34.78", "lat": "32.08"});
        let record = RawRecord::from_value(&row).expect("object row");
        let RawGeometryEnvelope::CentroidObject(pair) = record.geometry else {
            panic!("expected a centroid object");
        };
        assert_eq!(pair.len(), 2);
        assert_eq!(pair["lon"], "34.78");
    }

    #[rstest]
    fn rows_without_geometry_are_missing() {
        let record = RawRecord::from_value(&json!({"id": 4})).expect("object row");
        assert_eq!(record.geometry, RawGeometryEnvelope::Missing);
    }

    #[rstest]
    fn non_object_rows_are_refused() {
        assert!(RawRecord::from_value(&json!([1, 2])).is_none());
    }

    #[rstest]
    #[case(json!({"id": " p-1 "}), Some("p-1"))]
    #[case(json!({"objectid": 12}), Some("12"))]
    #[case(json!({"fid": 3, "id": ""}), Some("3"))]
    #[case(json!({"name": "x"}), None)]
    fn finds_ids(#[case] row: Value, #[case] expected: Option<&str>) {
        let record = RawRecord::from_value(&row).expect("object row");
        assert_eq!(record.id.as_deref(), expected);
    }

    #[rstest]
    fn top_level_fields_win_the_merge() {
        let row = json!({
            "status": "approved",
            "raw_data": {"status": "pending", "area": 412.5},
            "geometry": {"type": "Point", "coordinates": [34.7, 32.0]},
        });
        let record = RawRecord::from_value(&row).expect("object row");
        assert_eq!(record.properties["status"], "approved");
        assert_eq!(record.properties["area"], 412.5);
        assert!(!record.properties.contains_key("geometry"));
        assert!(!record.properties.contains_key("raw_data"));
    }
}
