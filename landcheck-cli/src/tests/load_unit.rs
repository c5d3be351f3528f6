//! Focused unit tests covering load CLI configuration and layer output.

use super::*;
use crate::load::{LayerSourceBuilder, LoadArgs, LoadConfig, load_layers, parse_near, report};
use crate::output::collection_file_name;
use camino::Utf8PathBuf;
use landcheck_core::test_support::{JERUSALEM, TEL_AVIV};
use landcheck_core::{BoundsProfile, LayerKind};
use landcheck_data::source::test_support::{
    StubPageSource, block_on, itm_row, malformed_row, network_error, wgs84_row,
};
use landcheck_data::{DEFAULT_PAGE_SIZE, LoadState, LoaderConfigError};
use rstest::rstest;
use serde_json::{Value, json};
use tempfile::TempDir;

fn base_args() -> LoadArgs {
    LoadArgs {
        base_url: Some("http://localhost:8080/api".to_owned()),
        ..LoadArgs::default()
    }
}

#[rstest]
fn converting_load_without_base_url_errors() {
    let err = LoadConfig::try_from(LoadArgs::default()).expect_err("missing base url");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_LOAD_BASE_URL);
            assert_eq!(env, ENV_LOAD_BASE_URL);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn load_args_deserialise_from_owned_configuration() {
    let file = json!({
        "base_url": "http://localhost:8080/api",
        "layer": ["land-use", "blocks"],
        "profile": "strict",
        "radius_m": 250.0,
    })
    .to_string();
    let args: LoadArgs = serde_json::from_str(&file).expect("configuration should parse");
    assert_eq!(args.profile, Some(BoundsProfile::STRICT));

    let args: LoadArgs = serde_json::from_value(json!({"profile": "lenient"}))
        .expect("configuration should parse");
    assert_eq!(args.profile, Some(BoundsProfile::LENIENT));
}

#[rstest]
fn load_config_applies_defaults() {
    let config = LoadConfig::try_from(base_args()).expect("config should build");
    assert_eq!(config.layers, LayerKind::ALL.to_vec());
    assert_eq!(config.loader.page_size(), DEFAULT_PAGE_SIZE);
    assert_eq!(config.loader.profile(), BoundsProfile::LENIENT);
    assert_eq!(config.output, Utf8PathBuf::from("layers"));
    assert!(config.source.radius.is_none());
}

#[rstest]
fn repeated_layers_are_loaded_once() {
    let args = LoadArgs {
        layer: Some(vec![LayerKind::Blocks, LayerKind::Parcels, LayerKind::Blocks]),
        ..base_args()
    };
    let config = LoadConfig::try_from(args).expect("config should build");
    assert_eq!(config.layers, vec![LayerKind::Blocks, LayerKind::Parcels]);
}

#[rstest]
fn zero_page_size_is_rejected() {
    let args = LoadArgs {
        page_size: Some(0),
        ..base_args()
    };
    let err = LoadConfig::try_from(args).expect_err("zero page size");
    assert!(
        matches!(err, CliError::LoaderConfig(LoaderConfigError::ZeroPageSize)),
        "unexpected error {err:?}"
    );
}

#[rstest]
#[case(Some("32.0749,34.7668"), None, ARG_LOAD_RADIUS, ENV_LOAD_RADIUS)]
#[case(None, Some(250.0), ARG_LOAD_NEAR, ENV_LOAD_NEAR)]
fn near_and_radius_come_together(
    #[case] near: Option<&str>,
    #[case] radius_m: Option<f64>,
    #[case] field: &'static str,
    #[case] env_var: &'static str,
) {
    let args = LoadArgs {
        near: near.map(str::to_owned),
        radius_m,
        ..base_args()
    };
    let err = LoadConfig::try_from(args).expect_err("incomplete radius filter");
    match err {
        CliError::MissingArgument {
            field: missing,
            env,
        } => {
            assert_eq!(missing, field);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn radius_filter_is_passed_to_the_source() {
    let args = LoadArgs {
        near: Some(" 32.0749 , 34.7668 ".to_owned()),
        radius_m: Some(250.0),
        ..base_args()
    };
    let config = LoadConfig::try_from(args).expect("config should build");
    let radius = config.source.radius.expect("radius filter");
    assert_eq!(radius.center, TEL_AVIV);
    assert_eq!(radius.radius_m, 250.0);
}

#[rstest]
#[case(0.0)]
#[case(-10.0)]
#[case(f64::NAN)]
fn non_positive_radius_is_rejected(#[case] radius_m: f64) {
    let args = LoadArgs {
        near: Some("32.0749,34.7668".to_owned()),
        radius_m: Some(radius_m),
        ..base_args()
    };
    let err = LoadConfig::try_from(args).expect_err("invalid radius");
    assert!(
        matches!(err, CliError::InvalidRadius { .. }),
        "unexpected error {err:?}"
    );
}

#[rstest]
#[case("32.0749")]
#[case("north,east")]
#[case("95.0,34.7")]
#[case("32.0,inf")]
fn malformed_near_is_rejected(#[case] value: &str) {
    match parse_near(value) {
        Err(CliError::InvalidNear { value: reported }) => assert_eq!(reported, value),
        other => panic!("expected InvalidNear, found {other:?}"),
    }
}

struct ScriptedSources;

impl LayerSourceBuilder for ScriptedSources {
    type Source = StubPageSource;

    fn build(&self, _config: &LoadConfig, layer: LayerKind) -> Result<StubPageSource, CliError> {
        Ok(match layer {
            LayerKind::Blocks => StubPageSource::new()
                .with_page(vec![itm_row("b1", JERUSALEM)], true)
                .with_failure(network_error()),
            _ => StubPageSource::new().with_page(
                vec![wgs84_row(&format!("{layer}-1"), TEL_AVIV), malformed_row("bad")],
                false,
            ),
        })
    }
}

fn read_collection(root: &Utf8PathBuf, layer: LayerKind) -> Value {
    let text = std::fs::read_to_string(root.join(collection_file_name(layer)))
        .expect("collection file should exist");
    serde_json::from_str(&text).expect("collection should be JSON")
}

#[rstest]
fn layers_are_written_even_when_one_fails() {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().join("out")).expect("utf-8 workspace");
    let args = LoadArgs {
        layer: Some(vec![LayerKind::Parcels, LayerKind::Blocks]),
        output: Some(root.clone()),
        ..base_args()
    };
    let config = LoadConfig::try_from(args).expect("config should build");

    let summaries =
        block_on(load_layers(&config, &ScriptedSources)).expect("layers should load");

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].state, LoadState::Exhausted);
    assert_eq!(summaries[0].features, 1);
    assert_eq!(summaries[0].rejections.total(), 1);
    assert_eq!(summaries[1].state, LoadState::Failed);
    assert_eq!(summaries[1].features, 1);

    let parcels = read_collection(&root, LayerKind::Parcels);
    assert_eq!(parcels["type"], "FeatureCollection");
    assert_eq!(parcels["features"].as_array().map(Vec::len), Some(1));
    let blocks = read_collection(&root, LayerKind::Blocks);
    assert_eq!(blocks["features"][0]["properties"]["source_crs"], "itm");

    match report(&summaries) {
        Err(CliError::LayersFailed { layers }) => assert_eq!(layers, vec!["blocks".to_owned()]),
        other => panic!("expected LayersFailed, found {other:?}"),
    }
}

#[rstest]
fn successful_loads_report_ok() {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    let args = LoadArgs {
        layer: Some(vec![LayerKind::LandUse]),
        output: Some(root.clone()),
        ..base_args()
    };
    let config = LoadConfig::try_from(args).expect("config should build");

    let summaries =
        block_on(load_layers(&config, &ScriptedSources)).expect("layers should load");

    assert!(report(&summaries).is_ok());
    let land_use = read_collection(&root, LayerKind::LandUse);
    assert_eq!(land_use["features"][0]["id"], "land-use-1");
}
