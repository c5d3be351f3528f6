//! Point-radius filters expressed in the proxy's ITM grid.

use geo::{Coord, Rect};
use landcheck_core::{LatLng, TransformError, wgs84_to_itm};
use thiserror::Error;

/// SRID of the envelope sent to the proxy.
pub(super) const ITM_SRID: u32 = 2039;

/// A [`RadiusFilter`] that cannot be expressed as an ITM envelope.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RadiusFilterError {
    /// The radius is NaN or infinite.
    #[error("search radius must be a finite number of metres, got {radius_m}")]
    NonFiniteRadius {
        /// The rejected radius.
        radius_m: f64,
    },
    /// The centre does not project to ITM.
    #[error("radius filter centre does not project: {0}")]
    Centre(#[from] TransformError),
}

/// Restrict a layer to rows near a WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusFilter {
    /// Centre of the search.
    pub center: LatLng,
    /// Radius in metres.
    pub radius_m: f64,
}

impl RadiusFilter {
    /// Filter rows within `radius_m` metres of `center`.
    #[must_use]
    pub const fn new(center: LatLng, radius_m: f64) -> Self {
        Self { center, radius_m }
    }

    /// Square ITM envelope enclosing the circle.
    ///
    /// # Errors
    ///
    /// Returns [`RadiusFilterError`] when the radius is not finite or the
    /// centre does not project.
    pub fn envelope(&self) -> Result<Rect<f64>, RadiusFilterError> {
        if !self.radius_m.is_finite() {
            return Err(RadiusFilterError::NonFiniteRadius {
                radius_m: self.radius_m,
            });
        }
        let centre = wgs84_to_itm(self.center.lat, self.center.lng)?;
        let radius = self.radius_m.abs();
        Ok(Rect::new(
            Coord {
                x: centre.x - radius,
                y: centre.y - radius,
            },
            Coord {
                x: centre.x + radius,
                y: centre.y + radius,
            },
        ))
    }

    /// Query-string value `xmin,ymin,xmax,ymax`, rounded to centimetres.
    ///
    /// # Errors
    ///
    /// Returns [`RadiusFilterError`] under the same conditions as
    /// [`RadiusFilter::envelope`].
    pub fn bbox_param(&self) -> Result<String, RadiusFilterError> {
        let envelope = self.envelope()?;
        Ok(format!(
            "{:.2},{:.2},{:.2},{:.2}",
            envelope.min().x,
            envelope.min().y,
            envelope.max().x,
            envelope.max().y
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landcheck_core::geodesy::{
        ITM_FALSE_EASTING, ITM_FALSE_NORTHING, ITM_ORIGIN_LAT, ITM_ORIGIN_LNG,
    };
    use rstest::rstest;

    #[rstest]
    fn envelope_is_centred_on_the_projection() {
        let filter = RadiusFilter::new(LatLng::new(ITM_ORIGIN_LAT, ITM_ORIGIN_LNG), 500.0);
        let envelope = filter.envelope().expect("projects");
        assert!((envelope.min().x - (ITM_FALSE_EASTING - 500.0)).abs() < 1e-3);
        assert!((envelope.max().y - (ITM_FALSE_NORTHING + 500.0)).abs() < 1e-3);
        assert!((envelope.width() - 1_000.0).abs() < 1e-9);
    }

    #[rstest]
    fn bbox_param_has_four_components() {
        let filter = RadiusFilter::new(LatLng::new(32.0749, 34.7668), 250.0);
        let param = filter.bbox_param().expect("projects");
        assert_eq!(param.split(',').count(), 4);
    }

    #[rstest]
    fn non_finite_centres_are_refused() {
        let filter = RadiusFilter::new(LatLng::new(f64::NAN, 34.7668), 250.0);
        assert!(matches!(
            filter.envelope(),
            Err(RadiusFilterError::Centre(_))
        ));
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(f64::NEG_INFINITY)]
    fn non_finite_radii_are_refused(#[case] radius_m: f64) {
        let filter = RadiusFilter::new(LatLng::new(32.0749, 34.7668), radius_m);
        assert!(matches!(
            filter.bbox_param(),
            Err(RadiusFilterError::NonFiniteRadius { .. })
        ));
    }
}
