//! Behavioural tests for classifying unlabeled coordinate pairs.

use std::cell::RefCell;

use geo::Coord;
use landcheck_core::test_support::{JERUSALEM, TEL_AVIV, approx_eq, itm, web_mercator};
use landcheck_core::{
    BoundsProfile, ClassificationRejected, ClassifiedPoint, CrsKind, LatLng, Point2D, classify,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

type Outcome = Result<ClassifiedPoint, ClassificationRejected>;

#[derive(Default)]
struct ClassificationWorld {
    pair: RefCell<Option<Point2D>>,
    outcome: RefCell<Option<Outcome>>,
}

impl ClassificationWorld {
    fn classify_with(&self, profile: BoundsProfile) {
        let pair = self.pair.borrow().expect("pair configured");
        self.outcome.replace(Some(classify(pair, &profile)));
    }

    fn classified(&self) -> ClassifiedPoint {
        let outcome = self.outcome.borrow();
        match outcome.as_ref().expect("classification ran") {
            Ok(point) => *point,
            Err(err) => panic!("expected a classification, got {err}"),
        }
    }
}

#[fixture]
fn world() -> ClassificationWorld {
    ClassificationWorld::default()
}

#[given("the raw pair {x} {y}")]
fn given_raw_pair(world: &ClassificationWorld, x: f64, y: f64) {
    world.pair.replace(Some(Coord { x, y }));
}

#[given("the ITM projection of central Tel Aviv")]
fn given_itm_tel_aviv(world: &ClassificationWorld) {
    world.pair.replace(Some(itm(TEL_AVIV)));
}

#[given("the ITM projection of central Tel Aviv with axes reversed")]
fn given_reversed_itm_tel_aviv(world: &ClassificationWorld) {
    let projected = itm(TEL_AVIV);
    world.pair.replace(Some(Coord {
        x: projected.y,
        y: projected.x,
    }));
}

#[given("the Web Mercator projection of central Jerusalem")]
fn given_web_mercator_jerusalem(world: &ClassificationWorld) {
    world.pair.replace(Some(web_mercator(JERUSALEM)));
}

#[when("I classify it with the strict profile")]
fn when_classify_strict(world: &ClassificationWorld) {
    world.classify_with(BoundsProfile::STRICT);
}

#[when("I classify it with the lenient profile")]
fn when_classify_lenient(world: &ClassificationWorld) {
    world.classify_with(BoundsProfile::LENIENT);
}

#[then("the pair is classified as wgs84")]
fn then_wgs84(world: &ClassificationWorld) {
    assert_eq!(world.classified().source_crs, CrsKind::Wgs84);
}

#[then("the pair is classified as itm")]
fn then_itm(world: &ClassificationWorld) {
    assert_eq!(world.classified().source_crs, CrsKind::Itm);
}

#[then("the pair is classified as web_mercator")]
fn then_web_mercator(world: &ClassificationWorld) {
    assert_eq!(world.classified().source_crs, CrsKind::WebMercator);
}

#[then("the pair was not swapped")]
fn then_not_swapped(world: &ClassificationWorld) {
    assert!(!world.classified().swapped, "expected the raw order to hold");
}

#[then("the pair was swapped")]
fn then_swapped(world: &ClassificationWorld) {
    assert!(world.classified().swapped, "expected the swap retry to win");
}

#[then("the position is near {lat} {lng}")]
fn then_position_near(world: &ClassificationWorld, lat: f64, lng: f64) {
    let actual = world.classified().lat_lng();
    assert!(
        approx_eq(actual, LatLng::new(lat, lng), 1e-4),
        "expected ({lat}, {lng}), got {actual:?}"
    );
}

#[then("the pair is rejected after {count} attempts")]
fn then_rejected(world: &ClassificationWorld, count: usize) {
    let outcome = world.outcome.borrow();
    let err = match outcome.as_ref().expect("classification ran") {
        Ok(point) => panic!("expected a rejection, got {point:?}"),
        Err(err) => err,
    };
    assert_eq!(err.attempts.len(), count);
}

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/crs_classification.feature", name = $title)]
        fn $fn_name(world: ClassificationWorld) {
            let _ = world;
        }
    };
}

register_scenario!(wgs84_unchanged, "WGS84 degrees are accepted unchanged");
register_scenario!(itm_projected, "ITM metres are projected to WGS84");
register_scenario!(itm_swapped, "Northing-first ITM metres use the swap retry");
register_scenario!(
    web_mercator_projected,
    "Web Mercator metres are projected to WGS84"
);
register_scenario!(
    implausible_rejected,
    "An implausible pair is rejected under every profile"
);
