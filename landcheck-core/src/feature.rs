//! GeoJSON-compatible features emitted by the normalizer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::crs::CrsKind;
use crate::geodesy::LatLng;

/// Free-form property bag attached to a feature.
pub type Properties = Map<String, Value>;

/// A GeoJSON geometry object in WGS84 (`[lng, lat]` positions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureGeometry {
    /// GeoJSON geometry type, e.g. `"Point"` or `"Polygon"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Nested position arrays.
    pub coordinates: Value,
}

impl FeatureGeometry {
    /// A `Point` geometry at `position`.
    #[must_use]
    pub fn point(position: LatLng) -> Self {
        Self {
            kind: "Point".to_owned(),
            coordinates: json!([position.lng, position.lat]),
        }
    }

    /// Whether this is a `Point` geometry.
    #[must_use]
    pub fn is_point(&self) -> bool {
        self.kind == "Point"
    }
}

/// How a feature's coordinates were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Coordinate system the raw geometry was recognised as.
    pub source_crs: CrsKind,
    /// Whether the raw pair order was reversed.
    pub swapped: bool,
    /// Whether a non-point geometry was reduced to its centroid.
    pub degraded: bool,
}

impl Provenance {
    /// Provenance of geometry accepted without conversion.
    #[must_use]
    pub const fn unchanged() -> Self {
        Self {
            source_crs: CrsKind::Wgs84,
            swapped: false,
            degraded: false,
        }
    }
}

/// A validated feature whose coordinates are WGS84.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFeature {
    /// Stable identifier within its layer.
    pub id: String,
    /// Merged attribute bag.
    pub properties: Properties,
    /// WGS84 geometry.
    pub geometry: FeatureGeometry,
    /// Conversion details.
    pub provenance: Provenance,
}

impl NormalizedFeature {
    /// Render as a GeoJSON `Feature`, folding the provenance into properties.
    #[must_use]
    pub fn to_geojson(&self) -> Value {
        let mut properties = self.properties.clone();
        properties.insert(
            "source_crs".to_owned(),
            Value::from(self.provenance.source_crs.as_str()),
        );
        properties.insert(
            "coordinates_swapped".to_owned(),
            Value::from(self.provenance.swapped),
        );
        properties.insert(
            "geometry_degraded".to_owned(),
            Value::from(self.provenance.degraded),
        );
        json!({
            "type": "Feature",
            "id": self.id,
            "properties": properties,
            "geometry": self.geometry,
        })
    }
}

/// Render features, in order, as a GeoJSON `FeatureCollection`.
///
/// # Examples
///
/// ```
/// use landcheck_core::{LatLng, feature_collection};
/// use landcheck_core::feature::{FeatureGeometry, NormalizedFeature, Properties, Provenance};
///
/// let feature = NormalizedFeature {
///     id: "parcels-1-0".into(),
///     properties: Properties::new(),
///     geometry: FeatureGeometry::point(LatLng::new(32.0749, 34.7668)),
///     provenance: Provenance::unchanged(),
/// };
/// let collection = feature_collection([&feature]);
/// assert_eq!(collection["type"], "FeatureCollection");
/// assert_eq!(collection["features"][0]["geometry"]["coordinates"][0], 34.7668);
/// ```
#[must_use]
pub fn feature_collection<'a, I>(features: I) -> Value
where
    I: IntoIterator<Item = &'a NormalizedFeature>,
{
    let features: Vec<Value> = features
        .into_iter()
        .map(NormalizedFeature::to_geojson)
        .collect();
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}
