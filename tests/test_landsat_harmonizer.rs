//! Multi-mission Landsat harmonization scenario: TM and OLI scenes of the
//! same day merge into one calibrated daily composite.

use std::collections::HashMap;

use approx::assert_abs_diff_eq;
use chrono::{NaiveDate, TimeZone, Utc};
use ndarray::array;

use gemlst::core::landcover::LAND_MODEL;
use gemlst::core::qa::LANDSAT_THERMAL_SCALE;
use gemlst::core::{harmonize_series, LandCoverMasks, LandsatScene, SensorGeneration};

fn land_only_masks() -> LandCoverMasks {
    LandCoverMasks::new(array![[true]], array![[false]], array![[false]]).unwrap()
}

fn scene(generation: SensorGeneration, hour: u32, thermal_dn: u16) -> LandsatScene {
    LandsatScene {
        generation,
        timestamp: Utc.with_ymd_and_hms(2015, 7, 10, hour, 0, 0).unwrap(),
        thermal_dn: array![[thermal_dn]],
        qa_pixel: array![[0u16]],
        qa_radsat: array![[0u16]],
        optical_dn: HashMap::new(),
    }
}

#[test]
fn test_same_day_missions_average_after_calibration() {
    let start = NaiveDate::from_ymd_opt(2015, 7, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2015, 7, 31).unwrap();
    let scenes = vec![
        scene(SensorGeneration::Oli, 14, 40000),
        scene(SensorGeneration::Etm, 15, 41000),
    ];

    let composites = harmonize_series(&scenes, &land_only_masks(), start, end).unwrap();
    assert_eq!(composites.len(), 1);
    assert_eq!(composites[0].date, NaiveDate::from_ymd_opt(2015, 7, 10).unwrap());

    let to_calibrated =
        |dn: f64| LAND_MODEL.apply(dn * LANDSAT_THERMAL_SCALE + 149.0 - 273.15);
    let expected = (to_calibrated(40000.0) + to_calibrated(41000.0)) / 2.0;
    assert_abs_diff_eq!(
        composites[0].grid.get(0, 0).unwrap(),
        expected,
        epsilon = 1e-9
    );
}

#[test]
fn test_cloudy_scene_leaves_day_masked_not_missing() {
    let start = NaiveDate::from_ymd_opt(2015, 7, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2015, 7, 31).unwrap();
    let mut cloudy = scene(SensorGeneration::Oli, 14, 40000);
    cloudy.qa_pixel = array![[0b01000u16]]; // cloud bit

    let composites = harmonize_series(&[cloudy], &land_only_masks(), start, end).unwrap();
    // the day still produces a composite; its only pixel is masked
    assert_eq!(composites.len(), 1);
    assert_eq!(composites[0].grid.get(0, 0), None);
}
