//! Load command implementation for the landcheck CLI.

use std::time::Duration;

use camino::Utf8PathBuf;
use cap_std::fs_utf8;
use clap::Parser;
use futures_util::future::join_all;
use log::{info, warn};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use landcheck_core::{BoundsProfile, LatLng, LayerKind};
use landcheck_data::source::PageSource;
use landcheck_data::{
    ChunkedFeatureLoader, DEFAULT_PAGE_SIZE, HttpPageSource, HttpPageSourceConfig, LayerSnapshot,
    LoadState, LoadSummary, LoaderConfig, RadiusFilter,
};

use crate::output::{collection_file_name, open_output_dir, write_collection};
use crate::{
    ARG_LOAD_BASE_URL, ARG_LOAD_LAYER, ARG_LOAD_NEAR, ARG_LOAD_OUTPUT, ARG_LOAD_PAGE_SIZE,
    ARG_LOAD_PROFILE, ARG_LOAD_RADIUS, ARG_LOAD_TIMEOUT, CliError, ENV_LOAD_BASE_URL,
    ENV_LOAD_NEAR, ENV_LOAD_RADIUS,
};

const DEFAULT_OUTPUT_DIR: &str = "layers";

/// CLI arguments for the `load` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Page through the selected layers of a GIS proxy \
                 concurrently, normalise every row to WGS84 and write one \
                 GeoJSON FeatureCollection per layer. Options can come from \
                 CLI flags, configuration files, or environment variables.",
    about = "Load layers and write them as GeoJSON"
)]
#[ortho_config(prefix = "LANDCHECK")]
pub(crate) struct LoadArgs {
    /// Base URL of the GIS proxy (e.g. "http://localhost:8080/api").
    #[arg(long = ARG_LOAD_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    /// Layer to load; repeat for several. Defaults to every layer.
    #[arg(long = ARG_LOAD_LAYER, value_name = "layer")]
    #[serde(default)]
    pub(crate) layer: Option<Vec<LayerKind>>,
    /// Rows requested per page.
    #[arg(long = ARG_LOAD_PAGE_SIZE, value_name = "rows")]
    #[serde(default)]
    pub(crate) page_size: Option<u32>,
    /// Acceptance region: `strict` or `lenient`.
    #[arg(long = ARG_LOAD_PROFILE, value_name = "profile")]
    #[serde(default)]
    pub(crate) profile: Option<BoundsProfile>,
    /// Only load rows near this WGS84 position, as "LAT,LNG".
    #[arg(long = ARG_LOAD_NEAR, value_name = "lat,lng")]
    #[serde(default)]
    pub(crate) near: Option<String>,
    /// Search radius in metres around `--near`.
    #[arg(long = ARG_LOAD_RADIUS, value_name = "metres")]
    #[serde(default)]
    pub(crate) radius_m: Option<f64>,
    /// Directory receiving `{layer}.geojson` files.
    #[arg(long = ARG_LOAD_OUTPUT, value_name = "dir")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Per-request timeout in seconds.
    #[arg(long = ARG_LOAD_TIMEOUT, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
}

impl LoadArgs {
    pub(crate) fn into_config(self) -> Result<LoadConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        LoadConfig::try_from(merged)
    }
}

/// Resolved `load` command configuration.
#[derive(Debug, Clone)]
pub(crate) struct LoadConfig {
    /// Layers in request order, without duplicates.
    pub(crate) layers: Vec<LayerKind>,
    /// Paging and acceptance settings shared by every layer.
    pub(crate) loader: LoaderConfig,
    /// HTTP settings shared by every layer.
    pub(crate) source: HttpPageSourceConfig,
    /// Output directory.
    pub(crate) output: Utf8PathBuf,
}

impl TryFrom<LoadArgs> for LoadConfig {
    type Error = CliError;

    fn try_from(args: LoadArgs) -> Result<Self, Self::Error> {
        let base_url = args.base_url.ok_or(CliError::MissingArgument {
            field: ARG_LOAD_BASE_URL,
            env: ENV_LOAD_BASE_URL,
        })?;

        let mut layers = Vec::new();
        for layer in args.layer.unwrap_or_else(|| LayerKind::ALL.to_vec()) {
            if !layers.contains(&layer) {
                layers.push(layer);
            }
        }

        let loader = LoaderConfig::new(args.page_size.unwrap_or(DEFAULT_PAGE_SIZE))?
            .with_profile(args.profile.unwrap_or_default());

        let mut source = HttpPageSourceConfig::new(base_url);
        if let Some(secs) = args.timeout_secs {
            source = source.with_timeout(Duration::from_secs(secs));
        }
        if let Some(radius) = radius_filter(args.near.as_deref(), args.radius_m)? {
            source = source.with_radius(radius);
        }

        Ok(Self {
            layers,
            loader,
            source,
            output: args
                .output
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT_DIR)),
        })
    }
}

fn radius_filter(
    near: Option<&str>,
    radius_m: Option<f64>,
) -> Result<Option<RadiusFilter>, CliError> {
    match (near, radius_m) {
        (None, None) => Ok(None),
        (Some(_), None) => Err(CliError::MissingArgument {
            field: ARG_LOAD_RADIUS,
            env: ENV_LOAD_RADIUS,
        }),
        (None, Some(_)) => Err(CliError::MissingArgument {
            field: ARG_LOAD_NEAR,
            env: ENV_LOAD_NEAR,
        }),
        (Some(near), Some(radius_m)) => {
            if !(radius_m.is_finite() && radius_m > 0.0) {
                return Err(CliError::InvalidRadius { value: radius_m });
            }
            Ok(Some(RadiusFilter::new(parse_near(near)?, radius_m)))
        }
    }
}

/// Parse `"LAT,LNG"` in decimal degrees.
pub(crate) fn parse_near(value: &str) -> Result<LatLng, CliError> {
    let invalid = || CliError::InvalidNear {
        value: value.to_owned(),
    };
    let (lat, lng) = value.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;
    let position = LatLng::new(lat, lng);
    if position.is_finite() && lat.abs() <= 90.0 && lng.abs() <= 180.0 {
        Ok(position)
    } else {
        Err(invalid())
    }
}

/// Builds the page source for each layer of a load.
pub(crate) trait LayerSourceBuilder {
    type Source: PageSource;

    fn build(&self, config: &LoadConfig, layer: LayerKind) -> Result<Self::Source, CliError>;
}

pub(crate) struct HttpLayerSourceBuilder;

impl LayerSourceBuilder for HttpLayerSourceBuilder {
    type Source = HttpPageSource;

    fn build(&self, config: &LoadConfig, layer: LayerKind) -> Result<HttpPageSource, CliError> {
        HttpPageSource::new(&config.source, layer)
            .map_err(|source| CliError::BuildPageSource { layer, source })
    }
}

pub(crate) fn run_load(args: LoadArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let summaries = runtime.block_on(load_layers(&config, &HttpLayerSourceBuilder))?;
    report(&summaries)
}

/// Load every configured layer concurrently and write each collection.
///
/// A layer that stops on a fetch failure still has its partial collection
/// written.
pub(crate) async fn load_layers<B: LayerSourceBuilder>(
    config: &LoadConfig,
    builder: &B,
) -> Result<Vec<LoadSummary>, CliError> {
    let dir = open_output_dir(&config.output).map_err(|source| CliError::OpenOutputDir {
        path: config.output.clone(),
        source,
    })?;
    let loads = config
        .layers
        .iter()
        .map(|&layer| load_layer(config, builder, &dir, layer));
    join_all(loads).await.into_iter().collect()
}

async fn load_layer<B: LayerSourceBuilder>(
    config: &LoadConfig,
    builder: &B,
    dir: &fs_utf8::Dir,
    layer: LayerKind,
) -> Result<LoadSummary, CliError> {
    let source = builder.build(config, layer)?;
    let mut loader = ChunkedFeatureLoader::new(layer, source, config.loader);
    let summary = loader.run(log_progress).await;
    write_collection(dir, layer, &loader.snapshot().to_feature_collection()).map_err(
        |source| CliError::WriteCollection {
            layer,
            path: config.output.join(collection_file_name(layer)),
            source,
        },
    )?;
    Ok(summary)
}

fn log_progress(snapshot: &LayerSnapshot<'_>) {
    if snapshot.loading {
        info!(
            "{}: {} features so far",
            snapshot.layer,
            snapshot.features.len()
        );
    }
}

pub(crate) fn report(summaries: &[LoadSummary]) -> Result<(), CliError> {
    let mut failed = Vec::new();
    for summary in summaries {
        let rejections = summary.rejections;
        info!(
            "{}: {} features from {} pages; rejected {} (missing {}, malformed {}, unsupported {}, unclassified {}); swapped {}, degraded {}",
            summary.layer,
            summary.features,
            summary.pages,
            rejections.total(),
            rejections.missing,
            rejections.malformed,
            rejections.unsupported,
            rejections.unclassified,
            summary.swapped,
            summary.degraded,
        );
        if summary.state == LoadState::Failed {
            if let Some(error) = &summary.error {
                warn!("{}: load failed: {error}", summary.layer);
            }
            failed.push(summary.layer.to_string());
        }
    }
    if failed.is_empty() {
        Ok(())
    } else {
        Err(CliError::LayersFailed { layers: failed })
    }
}
