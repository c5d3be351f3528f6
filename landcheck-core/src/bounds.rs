//! Region plausibility checks shared by classification and normalization.

use std::{fmt, str::FromStr};

use geo::{Coord, Rect};
use serde::{Deserialize, Deserializer, Serialize, de};
use thiserror::Error;

/// A named latitude/longitude box that accepted coordinates must fall into.
///
/// Two profiles exist: [`BoundsProfile::STRICT`] for map display and
/// [`BoundsProfile::LENIENT`] for bulk ingestion. Both edges are inclusive.
///
/// # Examples
///
/// ```
/// use landcheck_core::BoundsProfile;
///
/// assert!(BoundsProfile::STRICT.contains(32.0749, 34.7668));
/// assert!(!BoundsProfile::STRICT.contains(28.5, 34.7668));
/// assert!(BoundsProfile::LENIENT.contains(28.5, 34.7668));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "String")]
pub struct BoundsProfile {
    name: &'static str,
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
}

impl BoundsProfile {
    /// Tight box used before placing features on the map.
    pub const STRICT: Self = Self {
        name: "strict",
        min_lat: 29.0,
        max_lat: 34.0,
        min_lng: 34.0,
        max_lng: 36.0,
    };

    /// Wider box used while ingesting bulk upstream pages.
    pub const LENIENT: Self = Self {
        name: "lenient",
        min_lat: 28.0,
        max_lat: 35.0,
        min_lng: 33.0,
        max_lng: 37.0,
    };

    /// Every known profile.
    pub const ALL: [Self; 2] = [Self::STRICT, Self::LENIENT];

    /// Stable profile name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Return `true` when the position is finite and inside the box.
    #[must_use]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat.is_finite()
            && lng.is_finite()
            && (self.min_lat..=self.max_lat).contains(&lat)
            && (self.min_lng..=self.max_lng).contains(&lng)
    }

    /// The box as a `geo` rectangle with `x = lng`, `y = lat`.
    #[must_use]
    pub fn rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.min_lng,
                y: self.min_lat,
            },
            Coord {
                x: self.max_lng,
                y: self.max_lat,
            },
        )
    }
}

impl Default for BoundsProfile {
    fn default() -> Self {
        Self::LENIENT
    }
}

impl fmt::Display for BoundsProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Error returned when a profile name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown bounds profile {name:?} (expected \"strict\" or \"lenient\")")]
pub struct BoundsProfileParseError {
    /// The rejected input.
    pub name: String,
}

impl FromStr for BoundsProfile {
    type Err = BoundsProfileParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|profile| profile.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| BoundsProfileParseError {
                name: value.to_owned(),
            })
    }
}

impl<'de> Deserialize<'de> for BoundsProfile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

impl From<BoundsProfile> for String {
    fn from(profile: BoundsProfile) -> Self {
        profile.name.to_owned()
    }
}

/// Whether `(lat, lng)` is plausibly inside the region described by `profile`.
#[must_use]
pub fn in_region(lat: f64, lng: f64, profile: &BoundsProfile) -> bool {
    profile.contains(lat, lng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BoundsProfile::STRICT, 29.0, 34.0, true)]
    #[case(BoundsProfile::STRICT, 34.0, 36.0, true)]
    #[case(BoundsProfile::STRICT, 28.99, 35.0, false)]
    #[case(BoundsProfile::STRICT, 32.0, 36.01, false)]
    #[case(BoundsProfile::LENIENT, 28.0, 33.0, true)]
    #[case(BoundsProfile::LENIENT, 35.0, 37.0, true)]
    #[case(BoundsProfile::LENIENT, 35.5, 35.0, false)]
    fn edges_are_inclusive(
        #[case] profile: BoundsProfile,
        #[case] lat: f64,
        #[case] lng: f64,
        #[case] expected: bool,
    ) {
        assert_eq!(in_region(lat, lng, &profile), expected);
    }

    #[rstest]
    #[case(f64::NAN, 35.0)]
    #[case(32.0, f64::INFINITY)]
    fn non_finite_positions_are_outside(#[case] lat: f64, #[case] lng: f64) {
        assert!(!BoundsProfile::LENIENT.contains(lat, lng));
    }

    #[rstest]
    #[case("strict", BoundsProfile::STRICT)]
    #[case(" Lenient ", BoundsProfile::LENIENT)]
    fn parses_profile_names(#[case] input: &str, #[case] expected: BoundsProfile) {
        assert_eq!(input.parse::<BoundsProfile>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_profile_name() {
        let err = "global".parse::<BoundsProfile>().expect_err("unknown name");
        assert_eq!(err.name, "global");
    }

    #[rstest]
    fn serialises_as_name() {
        let json = serde_json::to_string(&BoundsProfile::STRICT).expect("serialise");
        assert_eq!(json, "\"strict\"");
        let back: BoundsProfile = serde_json::from_str("\"lenient\"").expect("deserialise");
        assert_eq!(back, BoundsProfile::LENIENT);
    }

    #[derive(Debug, Deserialize)]
    struct ProfileSetting {
        #[serde(default)]
        profile: Option<BoundsProfile>,
    }

    #[rstest]
    fn deserialises_from_owned_configuration() {
        let body = String::from(r#"{"profile": "strict"}"#);
        let setting: ProfileSetting = serde_json::from_str(&body).expect("deserialise");
        assert_eq!(setting.profile, Some(BoundsProfile::STRICT));
        let owned: ProfileSetting =
            serde_json::from_value(serde_json::json!({"profile": "Lenient"})).expect("deserialise");
        assert_eq!(owned.profile, Some(BoundsProfile::LENIENT));
    }

    #[rstest]
    fn deserialising_an_unknown_name_fails() {
        let err = serde_json::from_value::<BoundsProfile>(serde_json::json!("global"))
            .expect_err("unknown name");
        assert!(err.to_string().contains("global"));
    }

    #[rstest]
    fn rect_uses_lng_for_x() {
        let rect = BoundsProfile::STRICT.rect();
        assert_eq!(rect.min(), Coord { x: 34.0, y: 29.0 });
        assert_eq!(rect.max(), Coord { x: 36.0, y: 34.0 });
    }
}
