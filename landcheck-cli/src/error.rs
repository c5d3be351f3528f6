//! Error types emitted by the landcheck CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use landcheck_core::LayerKind;
use landcheck_data::{HttpSourceBuildError, LoaderConfigError};
use thiserror::Error;
use tracing_subscriber::util::TryInitError;

/// Errors emitted by the landcheck CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// `--near` was not a `LAT,LNG` pair.
    #[error("--near expects LAT,LNG in degrees, got {value:?}")]
    InvalidNear { value: String },
    /// `--radius-m` was not a positive distance.
    #[error("--radius-m must be a positive number of metres, got {value}")]
    InvalidRadius { value: f64 },
    /// The loader configuration was rejected.
    #[error(transparent)]
    LoaderConfig(#[from] LoaderConfigError),
    /// Installing the log subscriber failed.
    #[error("failed to initialise logging: {0}")]
    Logging(#[from] TryInitError),
    /// Building the async runtime failed.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// Constructing a layer's page source failed.
    #[error("failed to build page source for {layer}: {source}")]
    BuildPageSource {
        layer: LayerKind,
        #[source]
        source: HttpSourceBuildError,
    },
    /// Preparing the output directory failed.
    #[error("failed to open output directory {path:?}: {source}")]
    OpenOutputDir {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Writing a layer collection failed.
    #[error("failed to write {layer} collection into {path:?}: {source}")]
    WriteCollection {
        layer: LayerKind,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// One or more layers stopped on a fetch failure.
    #[error("{} layer(s) failed to load: {}", .layers.len(), .layers.join(", "))]
    LayersFailed { layers: Vec<String> },
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
