//! Classify command implementation for the landcheck CLI.

use std::io::Write;

use clap::Parser;
use geo::Coord;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use landcheck_core::{BoundsProfile, classify};

use crate::{
    ARG_CLASSIFY_PROFILE, ARG_CLASSIFY_X, ARG_CLASSIFY_Y, CliError, ENV_CLASSIFY_X, ENV_CLASSIFY_Y,
};

/// CLI arguments for the `classify` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Work out which coordinate system produced a raw pair and \
                 print the WGS84 position, or every interpretation that was \
                 tried when none lands inside the acceptance region.",
    about = "Classify a raw coordinate pair",
    allow_negative_numbers = true
)]
#[ortho_config(prefix = "LANDCHECK")]
pub(crate) struct ClassifyArgs {
    /// First component of the pair.
    #[arg(id = ARG_CLASSIFY_X, value_name = "x")]
    #[serde(default)]
    pub(crate) x: Option<f64>,
    /// Second component of the pair.
    #[arg(id = ARG_CLASSIFY_Y, value_name = "y")]
    #[serde(default)]
    pub(crate) y: Option<f64>,
    /// Acceptance region: `strict` or `lenient`.
    #[arg(long = ARG_CLASSIFY_PROFILE, value_name = "profile")]
    #[serde(default)]
    pub(crate) profile: Option<BoundsProfile>,
}

/// Resolved `classify` command configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ClassifyConfig {
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) profile: BoundsProfile,
}

impl TryFrom<ClassifyArgs> for ClassifyConfig {
    type Error = CliError;

    fn try_from(args: ClassifyArgs) -> Result<Self, Self::Error> {
        let x = args.x.ok_or(CliError::MissingArgument {
            field: ARG_CLASSIFY_X,
            env: ENV_CLASSIFY_X,
        })?;
        let y = args.y.ok_or(CliError::MissingArgument {
            field: ARG_CLASSIFY_Y,
            env: ENV_CLASSIFY_Y,
        })?;
        Ok(Self {
            x,
            y,
            profile: args.profile.unwrap_or_default(),
        })
    }
}

pub(crate) fn run_classify(args: ClassifyArgs) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = ClassifyConfig::try_from(merged)?;
    let mut stdout = std::io::stdout().lock();
    write_classification(&mut stdout, &config)
}

/// The JSON report for one pair.
pub(crate) fn classification_report(config: &ClassifyConfig) -> Value {
    let input = Coord {
        x: config.x,
        y: config.y,
    };
    match classify(input, &config.profile) {
        Ok(point) => json!({
            "accepted": true,
            "profile": config.profile.name(),
            "lat": point.lat,
            "lng": point.lng,
            "source_crs": point.source_crs,
            "swapped": point.swapped,
        }),
        Err(rejected) => json!({
            "accepted": false,
            "profile": rejected.profile,
            "input": {"x": rejected.input.x, "y": rejected.input.y},
            "attempts": rejected.attempts,
        }),
    }
}

pub(crate) fn write_classification(
    writer: &mut dyn Write,
    config: &ClassifyConfig,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(&classification_report(config))
        .map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}
