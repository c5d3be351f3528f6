//! Map layers backed by the government GIS proxy.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A toggleable map layer with its own paginated upstream table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerKind {
    /// Cadastral parcels (helka).
    Parcels,
    /// Cadastral blocks (gush).
    Blocks,
    /// Urban-renewal compounds.
    UrbanRenewal,
    /// Land-use zoning.
    LandUse,
    /// Metro-corridor plans.
    MetroPlans,
}

impl LayerKind {
    /// Every layer, in display order.
    pub const ALL: [Self; 5] = [
        Self::Parcels,
        Self::Blocks,
        Self::UrbanRenewal,
        Self::LandUse,
        Self::MetroPlans,
    ];

    /// Stable kebab-case identifier, also used for feature id prefixes.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Parcels => "parcels",
            Self::Blocks => "blocks",
            Self::UrbanRenewal => "urban-renewal",
            Self::LandUse => "land-use",
            Self::MetroPlans => "metro-plans",
        }
    }

    /// Path of the proxy endpoint serving this layer's pages.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Parcels => "gis/parcels",
            Self::Blocks => "gis/gushim",
            Self::UrbanRenewal => "gis/urban-renewal",
            Self::LandUse => "gis/land-use",
            Self::MetroPlans => "gis/metro-plans",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Error returned when a layer name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown layer {name:?}")]
pub struct LayerParseError {
    /// The rejected input.
    pub name: String,
}

impl FromStr for LayerKind {
    type Err = LayerParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        match wanted.to_ascii_lowercase().as_str() {
            "gushim" | "gush" => return Ok(Self::Blocks),
            "helkot" | "helka" => return Ok(Self::Parcels),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|layer| layer.slug().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LayerParseError {
                name: value.to_owned(),
            })
    }
}
