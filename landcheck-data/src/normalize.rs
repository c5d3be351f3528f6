//! Turn raw upstream rows into validated WGS84 features.
//!
//! A row either becomes exactly one [`NormalizedFeature`] or is counted in
//! [`RejectionStats`]; a bad row never aborts its page. Geometry already in
//! WGS84 passes through with its shape intact and its positions rewritten as
//! plain numbers. Anything that needs converting is reduced to a point at its
//! centroid, since only point reprojection is supported. Every position of a
//! geometry must land inside the bounds under the same interpretation.

use geo::{
    Centroid, Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point,
    Polygon,
};
use log::trace;
use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

use landcheck_core::{
    BoundsProfile, ClassificationRejected, ClassifiedPoint, CrsKind, FeatureGeometry,
    NormalizedFeature, Point2D, Provenance, classify,
};

use crate::envelope::{PAIR_KEYS, RawGeometryEnvelope, RawRecord};

/// Reason a WKT geometry without a usable centroid is refused.
pub const WKT_WITHOUT_CENTROID: &str = "WKT without centroid fallback";

const GEOJSON_TYPES: [&str; 6] = [
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
];

/// Why a row was not turned into a feature.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    /// The row carried no geometry at all.
    #[error("record has no geometry")]
    Missing,
    /// The geometry could not be read.
    #[error("malformed geometry: {reason}")]
    Malformed {
        /// What was wrong.
        reason: String,
    },
    /// The geometry was readable but cannot be handled.
    #[error("unsupported geometry: {reason}")]
    Unsupported {
        /// What was unsupported.
        reason: String,
    },
    /// No coordinate system placed the geometry inside the bounds.
    #[error(transparent)]
    Unclassified(#[from] ClassificationRejected),
}

impl NormalizeError {
    fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    /// The counter bucket this rejection falls into.
    #[must_use]
    pub const fn reason(&self) -> RejectionReason {
        match self {
            Self::Missing => RejectionReason::Missing,
            Self::Malformed { .. } => RejectionReason::Malformed,
            Self::Unsupported { .. } => RejectionReason::Unsupported,
            Self::Unclassified(_) => RejectionReason::Unclassified,
        }
    }
}

/// Rejection buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    /// No geometry.
    Missing,
    /// Unreadable geometry.
    Malformed,
    /// Readable but unsupported geometry.
    Unsupported,
    /// Out of bounds under every interpretation.
    Unclassified,
}

/// Per-load rejection counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RejectionStats {
    /// Rows without geometry.
    pub missing: u64,
    /// Rows with unreadable geometry, including non-object rows.
    pub malformed: u64,
    /// Rows with unsupported geometry.
    pub unsupported: u64,
    /// Rows no coordinate system placed in bounds.
    pub unclassified: u64,
}

impl RejectionStats {
    /// Count one rejection.
    pub fn record(&mut self, reason: RejectionReason) {
        let counter = match reason {
            RejectionReason::Missing => &mut self.missing,
            RejectionReason::Malformed => &mut self.malformed,
            RejectionReason::Unsupported => &mut self.unsupported,
            RejectionReason::Unclassified => &mut self.unclassified,
        };
        *counter += 1;
    }

    /// Add another set of counters into this one.
    pub fn merge(&mut self, other: &Self) {
        self.missing += other.missing;
        self.malformed += other.malformed;
        self.unsupported += other.unsupported;
        self.unclassified += other.unclassified;
    }

    /// Total rejected rows.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.missing + self.malformed + self.unsupported + self.unclassified
    }
}

/// Converts raw rows into features under one [`BoundsProfile`].
///
/// # Examples
///
/// ```
/// use landcheck_core::BoundsProfile;
/// use landcheck_data::{GeometryNormalizer, RejectionStats};
/// use serde_json::json;
///
/// let normalizer = GeometryNormalizer::new(BoundsProfile::LENIENT);
/// let rows = [
///     json!({"id": 1, "geometry": {"type": "Point", "coordinates": [34.7668, 32.0749]}}),
///     json!({"id": 2, "geometry": "not a geometry"}),
/// ];
/// let mut stats = RejectionStats::default();
/// let features = normalizer.normalize_page(&rows, "parcels-1", &mut stats);
/// assert_eq!(features.len(), 1);
/// assert_eq!(stats.malformed, 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryNormalizer {
    profile: BoundsProfile,
}

impl GeometryNormalizer {
    /// Create a normalizer validating against `profile`.
    #[must_use]
    pub const fn new(profile: BoundsProfile) -> Self {
        Self { profile }
    }

    /// The bounds profile in force.
    #[must_use]
    pub const fn profile(&self) -> BoundsProfile {
        self.profile
    }

    /// Normalize one record, or explain why it was refused.
    ///
    /// # Errors
    ///
    /// Returns a [`NormalizeError`] describing the rejection.
    pub fn try_normalize(
        &self,
        record: &RawRecord,
        fallback_id: &str,
    ) -> Result<NormalizedFeature, NormalizeError> {
        let (geometry, provenance) = match self.resolve(&record.geometry) {
            Ok(resolved) => resolved,
            Err(err @ (NormalizeError::Malformed { .. } | NormalizeError::Unsupported { .. })) => {
                let centroid = record.centroid.as_ref().ok_or_else(|| err.clone())?;
                self.centroid_fallback(centroid).map_err(|_| err)?
            }
            Err(err) => return Err(err),
        };
        Ok(NormalizedFeature {
            id: record
                .id
                .clone()
                .unwrap_or_else(|| fallback_id.to_owned()),
            properties: record.properties.clone(),
            geometry,
            provenance,
        })
    }

    /// Normalize one record, counting a rejection in `stats`.
    pub fn normalize(
        &self,
        record: &RawRecord,
        fallback_id: &str,
        stats: &mut RejectionStats,
    ) -> Option<NormalizedFeature> {
        match self.try_normalize(record, fallback_id) {
            Ok(feature) => Some(feature),
            Err(err) => {
                trace!("rejected row {fallback_id}: {err}");
                stats.record(err.reason());
                None
            }
        }
    }

    /// Normalize a page of JSON rows in order.
    ///
    /// Rows without an id get `{id_prefix}-{row}`, with `row` counted from 0.
    pub fn normalize_page(
        &self,
        rows: &[Value],
        id_prefix: &str,
        stats: &mut RejectionStats,
    ) -> Vec<NormalizedFeature> {
        rows.iter()
            .enumerate()
            .filter_map(|(index, row)| {
                let fallback_id = format!("{id_prefix}-{index}");
                let Some(record) = RawRecord::from_value(row) else {
                    trace!("rejected row {fallback_id}: row is not an object");
                    stats.record(RejectionReason::Malformed);
                    return None;
                };
                self.normalize(&record, &fallback_id, stats)
            })
            .collect()
    }

    fn resolve(
        &self,
        envelope: &RawGeometryEnvelope,
    ) -> Result<(FeatureGeometry, Provenance), NormalizeError> {
        match envelope {
            RawGeometryEnvelope::GeoJsonLike(map) => self.from_geojson(map),
            RawGeometryEnvelope::JsonString(text) => self.from_json_text(text),
            RawGeometryEnvelope::WktLikeString { centroid, .. } => {
                let centroid = centroid.as_ref().ok_or_else(|| NormalizeError::Unsupported {
                    reason: WKT_WITHOUT_CENTROID.to_owned(),
                })?;
                self.point_from(extract_pair(centroid)?)
            }
            RawGeometryEnvelope::CentroidArray(items) => self.point_from(pair_from_array(items)?),
            RawGeometryEnvelope::CentroidObject(map) => self.point_from(pair_from_object(map)?),
            RawGeometryEnvelope::Missing => Err(NormalizeError::Missing),
        }
    }

    fn from_json_text(&self, text: &str) -> Result<(FeatureGeometry, Provenance), NormalizeError> {
        let parsed: Value = serde_json::from_str(text)
            .map_err(|_| NormalizeError::malformed("unparseable geometry string"))?;
        match &parsed {
            Value::Object(map) if map.contains_key("type") && map.contains_key("coordinates") => {
                self.from_geojson(map)
            }
            Value::Object(map) => self.point_from(pair_from_object(map)?),
            Value::Array(items) => self.point_from(pair_from_array(items)?),
            _ => Err(NormalizeError::malformed("unparseable geometry string")),
        }
    }

    /// Place an unreadable geometry at its sibling centroid.
    fn centroid_fallback(
        &self,
        centroid: &Value,
    ) -> Result<(FeatureGeometry, Provenance), NormalizeError> {
        let (geometry, provenance) = self.point_from(extract_pair(centroid)?)?;
        trace!("geometry unreadable, using the sibling centroid");
        Ok((
            geometry,
            Provenance {
                degraded: true,
                ..provenance
            },
        ))
    }

    fn point_from(&self, pair: Point2D) -> Result<(FeatureGeometry, Provenance), NormalizeError> {
        let classified = classify(pair, &self.profile)?;
        Ok((
            FeatureGeometry::point(classified.lat_lng()),
            Provenance {
                source_crs: classified.source_crs,
                swapped: classified.swapped,
                degraded: false,
            },
        ))
    }

    fn from_geojson(
        &self,
        map: &Map<String, Value>,
    ) -> Result<(FeatureGeometry, Provenance), NormalizeError> {
        let kind = map
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| NormalizeError::malformed("geometry type is not a string"))?;
        if !GEOJSON_TYPES.contains(&kind) {
            return Err(NormalizeError::Unsupported {
                reason: format!("geometry type {kind}"),
            });
        }
        let raw = map.get("coordinates").unwrap_or(&Value::Null);
        let mut positions = Vec::new();
        let coordinates = rebuild(raw, nesting(kind), &mut positions)?;
        let representative = positions
            .first()
            .copied()
            .ok_or_else(|| NormalizeError::malformed("geometry has no coordinates"))?;
        let classified = classify(representative, &self.profile)?;
        if !positions
            .iter()
            .all(|&position| classified.reproject(position, &self.profile).is_some())
        {
            return Err(NormalizeError::malformed("positions disagree on coordinate system"));
        }

        if classified.source_crs == CrsKind::Wgs84 && !classified.swapped {
            return Ok((
                FeatureGeometry {
                    kind: kind.to_owned(),
                    coordinates,
                },
                Provenance::unchanged(),
            ));
        }

        let position = planar_centroid(kind, &coordinates)
            .and_then(|centroid| classified.reproject(centroid, &self.profile))
            .unwrap_or_else(|| classified.lat_lng());
        Ok((
            FeatureGeometry::point(position),
            degraded_provenance(&classified, kind),
        ))
    }
}

fn degraded_provenance(classified: &ClassifiedPoint, kind: &str) -> Provenance {
    Provenance {
        source_crs: classified.source_crs,
        swapped: classified.swapped,
        degraded: kind != "Point",
    }
}

fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

fn position(value: &Value) -> Option<Point2D> {
    let items = value.as_array()?;
    match items.as_slice() {
        [x, y, ..] => Some(Coord {
            x: number(x)?,
            y: number(y)?,
        }),
        _ => None,
    }
}

/// Array levels between `coordinates` and a single position.
fn nesting(kind: &str) -> usize {
    match kind {
        "Point" => 0,
        "MultiPoint" | "LineString" => 1,
        "MultiLineString" | "Polygon" => 2,
        _ => 3,
    }
}

/// Copy `value` as numeric positions, checking it nests `depth` levels deep.
fn rebuild(value: &Value, depth: usize, out: &mut Vec<Point2D>) -> Result<Value, NormalizeError> {
    if depth == 0 {
        let point =
            position(value).ok_or_else(|| NormalizeError::malformed("non-numeric position"))?;
        out.push(point);
        return Ok(json!([point.x, point.y]));
    }
    let items = value
        .as_array()
        .ok_or_else(|| NormalizeError::malformed("coordinates nest too shallowly for the type"))?;
    items
        .iter()
        .map(|item| rebuild(item, depth - 1, out))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn pair_from_array(items: &[Value]) -> Result<Point2D, NormalizeError> {
    match items {
        [x, y, ..] => match (number(x), number(y)) {
            (Some(x), Some(y)) => Ok(Coord { x, y }),
            _ => Err(NormalizeError::malformed("coordinate pair is not numeric")),
        },
        _ => Err(NormalizeError::malformed("coordinate pair needs two values")),
    }
}

fn pair_from_object(map: &Map<String, Value>) -> Result<Point2D, NormalizeError> {
    if let Some(coordinates) = map.get("coordinates") {
        return extract_pair(coordinates);
    }
    PAIR_KEYS
        .iter()
        .find_map(|(x_key, y_key)| {
            let x = number(map.get(*x_key)?)?;
            let y = number(map.get(*y_key)?)?;
            Some(Coord { x, y })
        })
        .ok_or_else(|| NormalizeError::malformed("no coordinate pair"))
}

fn extract_pair(value: &Value) -> Result<Point2D, NormalizeError> {
    match value {
        Value::Array(items) => pair_from_array(items),
        Value::Object(map) => pair_from_object(map),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => pair_from_array(&items),
            Ok(Value::Object(map)) => pair_from_object(&map),
            _ => Err(NormalizeError::malformed("unparseable centroid string")),
        },
        _ => Err(NormalizeError::malformed("no coordinate pair")),
    }
}

fn line(value: &Value) -> Option<LineString<f64>> {
    value
        .as_array()?
        .iter()
        .map(position)
        .collect::<Option<Vec<_>>>()
        .map(LineString::from)
}

fn polygon(value: &Value) -> Option<Polygon<f64>> {
    let mut rings = value.as_array()?.iter().map(line);
    let exterior = rings.next()??;
    let interiors = rings.collect::<Option<Vec<_>>>()?;
    Some(Polygon::new(exterior, interiors))
}

fn many<T>(value: &Value, parse: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
    value.as_array()?.iter().map(parse).collect()
}

/// Planar centroid of a GeoJSON geometry in its raw units.
fn planar_centroid(kind: &str, coordinates: &Value) -> Option<Point2D> {
    let geometry: Geometry<f64> = match kind {
        "Point" => Point::from(position(coordinates)?).into(),
        "MultiPoint" => MultiPoint::new(many(coordinates, |v| position(v).map(Point::from))?).into(),
        "LineString" => line(coordinates)?.into(),
        "MultiLineString" => MultiLineString::new(many(coordinates, line)?).into(),
        "Polygon" => polygon(coordinates)?.into(),
        "MultiPolygon" => MultiPolygon::new(many(coordinates, polygon)?).into(),
        _ => return None,
    };
    geometry.centroid().map(|point| point.0)
}
