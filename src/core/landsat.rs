//! Harmonization of five Landsat generations into one calibrated LST series.
//!
//! Each generation carries its own band names and QA conventions; a single
//! dispatch table replaces the per-mission processing blocks. Scenes are
//! masked with the shared Landsat QA policy, converted to Celsius,
//! bias-corrected by land-cover class, and merged into one multi-mission
//! series that the daily compositor then averages per calendar day.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use ndarray::Array2;

use crate::core::compositor::composite_daily;
use crate::core::landcover::{calibrate, LandCoverMasks};
use crate::core::qa::{decode_landsat_optical, decode_landsat_thermal, encode_landsat_uint16};
use crate::types::{DailyComposite, GemResult, MaskedGrid, Scene};

/// Landsat sensor generations, 1982 to present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorGeneration {
    /// Landsat 4 TM
    Tm4,
    /// Landsat 5 TM
    Tm5,
    /// Landsat 7 ETM+
    Etm,
    /// Landsat 8 OLI/TIRS
    Oli,
    /// Landsat 9 OLI-2/TIRS-2
    Oli2,
}

impl SensorGeneration {
    pub const ALL: [SensorGeneration; 5] = [
        SensorGeneration::Tm4,
        SensorGeneration::Tm5,
        SensorGeneration::Etm,
        SensorGeneration::Oli,
        SensorGeneration::Oli2,
    ];

    /// Native name of the surface temperature band.
    pub fn thermal_band(self) -> &'static str {
        match self {
            SensorGeneration::Tm4 | SensorGeneration::Tm5 | SensorGeneration::Etm => "ST_B6",
            SensorGeneration::Oli | SensorGeneration::Oli2 => "ST_B10",
        }
    }

    /// (native, common) optical band correspondence. TM/ETM+ lack the
    /// bluest OLI band, so the mapping is four bands wide for every
    /// generation; common names follow the OLI schema.
    pub fn optical_bands(self) -> &'static [(&'static str, &'static str)] {
        match self {
            SensorGeneration::Tm4 | SensorGeneration::Tm5 | SensorGeneration::Etm => &[
                ("SR_B1", "SR_B2"),
                ("SR_B2", "SR_B3"),
                ("SR_B3", "SR_B4"),
                ("SR_B4", "SR_B5"),
            ],
            SensorGeneration::Oli | SensorGeneration::Oli2 => &[
                ("SR_B2", "SR_B2"),
                ("SR_B3", "SR_B3"),
                ("SR_B4", "SR_B4"),
                ("SR_B5", "SR_B5"),
            ],
        }
    }

    /// Whether a scene acquired at this instant is usable. ETM+ scenes
    /// after 2020 are excluded (orbit drift).
    pub fn accepts(self, timestamp: DateTime<Utc>) -> bool {
        match self {
            SensorGeneration::Etm => timestamp.year() <= 2020,
            _ => true,
        }
    }
}

/// One raw Landsat Collection 2 Level-2 scene, native band names.
#[derive(Debug, Clone)]
pub struct LandsatScene {
    pub generation: SensorGeneration,
    pub timestamp: DateTime<Utc>,
    pub thermal_dn: Array2<u16>,
    pub qa_pixel: Array2<u16>,
    pub qa_radsat: Array2<u16>,
    /// Surface reflectance bands, keyed by native band name.
    pub optical_dn: HashMap<String, Array2<u16>>,
}

/// A scene harmonized to the common schema: calibrated LST in Celsius plus
/// optical reflectance under OLI band names.
#[derive(Debug, Clone)]
pub struct HarmonizedScene {
    pub generation: SensorGeneration,
    pub timestamp: DateTime<Utc>,
    pub lst: MaskedGrid,
    pub optical: HashMap<String, MaskedGrid>,
}

/// Harmonize one scene: QA masking, thermal conversion, land-cover
/// calibration, band renaming.
pub fn harmonize(scene: &LandsatScene, masks: &LandCoverMasks) -> GemResult<HarmonizedScene> {
    log::debug!(
        "Harmonizing {:?} scene at {}",
        scene.generation,
        scene.timestamp
    );
    let lst = decode_landsat_thermal(&scene.thermal_dn, &scene.qa_pixel, &scene.qa_radsat)?;
    let lst = calibrate(&lst, masks)?;

    let mut optical = HashMap::new();
    for &(native, common) in scene.generation.optical_bands() {
        if let Some(dn) = scene.optical_dn.get(native) {
            let band = decode_landsat_optical(dn, &scene.qa_pixel, &scene.qa_radsat)?;
            optical.insert(common.to_string(), band);
        }
    }

    Ok(HarmonizedScene {
        generation: scene.generation,
        timestamp: scene.timestamp,
        lst,
        optical,
    })
}

/// Harmonize a merged multi-mission collection and composite the calibrated
/// LST per calendar day. Same-day overlaps between missions average out in
/// the compositor; out-of-service scenes are dropped.
pub fn harmonize_series(
    scenes: &[LandsatScene],
    masks: &LandCoverMasks,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> GemResult<Vec<DailyComposite>> {
    let mut lst_series = Vec::new();
    let mut skipped = 0usize;
    for scene in scenes {
        if !scene.generation.accepts(scene.timestamp) {
            skipped += 1;
            continue;
        }
        let harmonized = harmonize(scene, masks)?;
        lst_series.push(Scene {
            timestamp: harmonized.timestamp,
            grid: harmonized.lst,
        });
    }
    if skipped > 0 {
        log::info!("Dropped {} out-of-service scenes", skipped);
    }
    composite_daily(&lst_series, start_date, end_date)
}

/// Re-encode a calibrated LST grid into the compact Landsat uint16 DN
/// space for export. Masked pixels encode as 0 (the fill DN).
pub fn encode_product_uint16(grid: &MaskedGrid) -> Array2<u16> {
    let mut out = Array2::zeros(grid.dim());
    for ((r, c), v) in out.indexed_iter_mut() {
        if let Some(celsius) = grid.get(r, c) {
            *v = encode_landsat_uint16(celsius);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;
    use ndarray::array;
    use crate::core::landcover::{LAND_MODEL, OCEAN_MODEL};
    use crate::core::qa::{decode_landsat_uint16, LANDSAT_THERMAL_SCALE};

    fn masks() -> LandCoverMasks {
        LandCoverMasks::new(
            array![[true, false, false]],
            array![[false, true, false]],
            array![[false, false, true]],
        )
        .unwrap()
    }

    fn scene(generation: SensorGeneration, year: i32) -> LandsatScene {
        let mut optical_dn = HashMap::new();
        optical_dn.insert("SR_B2".to_string(), array![[10000u16, 10000, 10000]]);
        LandsatScene {
            generation,
            timestamp: Utc.with_ymd_and_hms(year, 7, 1, 14, 30, 0).unwrap(),
            thermal_dn: array![[40000u16, 40000, 40000]],
            qa_pixel: array![[0u16, 0, 8]], // third pixel is cloudy
            qa_radsat: array![[0u16, 0, 0]],
            optical_dn,
        }
    }

    #[test]
    fn test_thermal_band_rename() {
        assert_eq!(SensorGeneration::Tm5.thermal_band(), "ST_B6");
        assert_eq!(SensorGeneration::Etm.thermal_band(), "ST_B6");
        assert_eq!(SensorGeneration::Oli.thermal_band(), "ST_B10");
    }

    #[test]
    fn test_optical_rename_is_four_bands_everywhere() {
        for generation in SensorGeneration::ALL {
            let mapping = generation.optical_bands();
            assert_eq!(mapping.len(), 4);
            let common: Vec<&str> = mapping.iter().map(|&(_, c)| c).collect();
            assert_eq!(common, vec!["SR_B2", "SR_B3", "SR_B4", "SR_B5"]);
        }
        // TM family maps SR_B1 up, OLI family is the identity
        assert_eq!(SensorGeneration::Tm4.optical_bands()[0], ("SR_B1", "SR_B2"));
        assert_eq!(SensorGeneration::Oli2.optical_bands()[0], ("SR_B2", "SR_B2"));
    }

    #[test]
    fn test_etm_post_2020_excluded() {
        let ok = Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap();
        let drifted = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap();
        assert!(SensorGeneration::Etm.accepts(ok));
        assert!(!SensorGeneration::Etm.accepts(drifted));
        assert!(SensorGeneration::Oli.accepts(drifted));
    }

    #[test]
    fn test_harmonize_calibrates_per_land_cover() {
        let harmonized = harmonize(&scene(SensorGeneration::Oli, 2020), &masks()).unwrap();
        let raw = 40000.0 * LANDSAT_THERMAL_SCALE + 149.0 - 273.15;
        assert_abs_diff_eq!(
            harmonized.lst.get(0, 0).unwrap(),
            LAND_MODEL.apply(raw),
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            harmonized.lst.get(0, 1).unwrap(),
            OCEAN_MODEL.apply(raw),
            epsilon = 1e-9
        );
        // cloudy pixel masked by QA regardless of land cover
        assert_eq!(harmonized.lst.get(0, 2), None);
    }

    #[test]
    fn test_harmonize_renames_tm_optical_bands() {
        let mut tm = scene(SensorGeneration::Tm5, 1995);
        tm.optical_dn.clear();
        tm.optical_dn
            .insert("SR_B1".to_string(), array![[20000u16, 20000, 20000]]);
        let harmonized = harmonize(&tm, &masks()).unwrap();
        assert!(harmonized.optical.contains_key("SR_B2"));
        assert!(!harmonized.optical.contains_key("SR_B1"));
    }

    #[test]
    fn test_harmonize_series_drops_drifted_etm_and_composites() {
        let start = NaiveDate::from_ymd_opt(2021, 7, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2021, 7, 2).unwrap();
        let scenes = vec![
            scene(SensorGeneration::Oli, 2021),
            scene(SensorGeneration::Etm, 2021), // dropped, orbit drift
        ];
        let composites = harmonize_series(&scenes, &masks(), start, end).unwrap();
        assert_eq!(composites.len(), 1);
        // single contributing scene: composite equals that scene
        let single = harmonize(&scenes[0], &masks()).unwrap();
        assert_eq!(composites[0].grid.values, single.lst.values);
    }

    #[test]
    fn test_uint16_export_round_trip() {
        let grid = MaskedGrid::new(
            array![[5.0, -20.0, 0.0]],
            array![[true, true, false]],
        )
        .unwrap();
        let encoded = encode_product_uint16(&grid);
        assert!((decode_landsat_uint16(encoded[[0, 0]]) - 5.0).abs() <= LANDSAT_THERMAL_SCALE);
        assert!((decode_landsat_uint16(encoded[[0, 1]]) + 20.0).abs() <= LANDSAT_THERMAL_SCALE);
        assert_eq!(encoded[[0, 2]], 0);
    }
}
