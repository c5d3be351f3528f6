//! Command-line interface for loading and inspecting land-use layers.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod classify;
mod error;
mod load;
mod logging;
mod output;

pub use error::CliError;

use classify::ClassifyArgs;
use load::LoadArgs;

pub(crate) const ARG_LOAD_BASE_URL: &str = "base-url";
pub(crate) const ARG_LOAD_LAYER: &str = "layer";
pub(crate) const ARG_LOAD_PAGE_SIZE: &str = "page-size";
pub(crate) const ARG_LOAD_PROFILE: &str = "profile";
pub(crate) const ARG_LOAD_NEAR: &str = "near";
pub(crate) const ARG_LOAD_RADIUS: &str = "radius-m";
pub(crate) const ARG_LOAD_OUTPUT: &str = "output";
pub(crate) const ARG_LOAD_TIMEOUT: &str = "timeout-secs";
pub(crate) const ARG_CLASSIFY_X: &str = "x";
pub(crate) const ARG_CLASSIFY_Y: &str = "y";
pub(crate) const ARG_CLASSIFY_PROFILE: &str = "profile";
pub(crate) const ENV_LOAD_BASE_URL: &str = "LANDCHECK_CMDS_LOAD_BASE_URL";
pub(crate) const ENV_LOAD_NEAR: &str = "LANDCHECK_CMDS_LOAD_NEAR";
pub(crate) const ENV_LOAD_RADIUS: &str = "LANDCHECK_CMDS_LOAD_RADIUS_M";
pub(crate) const ENV_CLASSIFY_X: &str = "LANDCHECK_CMDS_CLASSIFY_X";
pub(crate) const ENV_CLASSIFY_Y: &str = "LANDCHECK_CMDS_CLASSIFY_Y";

/// Run the landcheck CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid, when
/// logging cannot be installed, or when the selected command fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    logging::init()?;
    match cli.command {
        Command::Load(args) => load::run_load(args),
        Command::Classify(args) => classify::run_classify(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "landcheck",
    about = "Load and inspect land-use layers from a paginated GIS service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Page through one or more layers and write them as GeoJSON.
    Load(LoadArgs),
    /// Classify a single coordinate pair.
    Classify(ClassifyArgs),
}

#[cfg(test)]
mod tests;
