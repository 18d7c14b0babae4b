//! Land-cover specific bias correction for surface temperature.
//!
//! The linear models were fitted offline against in-situ measurements from
//! the Greenland Ecosystem Monitoring programme and are treated as immutable
//! constants. Ice keeps the satellite value unchanged.

use ndarray::Array2;

use crate::types::{GemError, GemResult, MaskedGrid};

/// A fixed linear bias-correction model, y = gain * x + offset.
#[derive(Debug, Clone, Copy)]
pub struct LinearModel {
    pub gain: f64,
    pub offset: f64,
}

impl LinearModel {
    pub fn apply(&self, x: f64) -> f64 {
        self.gain * x + self.offset
    }
}

/// Calibration for snow/ice free land pixels.
pub const LAND_MODEL: LinearModel = LinearModel {
    gain: 0.8382798596053026,
    offset: 1.9527861913159263,
};

/// Calibration for ocean pixels.
pub const OCEAN_MODEL: LinearModel = LinearModel {
    gain: 0.7212493050563921,
    offset: 1.4461030886482544,
};

/// Ice pixels keep the satellite value.
pub const ICE_MODEL: LinearModel = LinearModel {
    gain: 1.0,
    offset: 0.0,
};

/// Static land/ocean/ice classification masks.
///
/// The three masks are mutually exclusive; pixels outside all three lie
/// outside the study area.
#[derive(Debug, Clone)]
pub struct LandCoverMasks {
    pub land: Array2<bool>,
    pub ocean: Array2<bool>,
    pub ice: Array2<bool>,
}

impl LandCoverMasks {
    /// Build the mask set, validating shape agreement and mutual exclusivity.
    pub fn new(
        land: Array2<bool>,
        ocean: Array2<bool>,
        ice: Array2<bool>,
    ) -> GemResult<Self> {
        if land.dim() != ocean.dim() || land.dim() != ice.dim() {
            return Err(GemError::ShapeMismatch(format!(
                "land {:?}, ocean {:?}, ice {:?}",
                land.dim(),
                ocean.dim(),
                ice.dim()
            )));
        }
        for ((r, c), &l) in land.indexed_iter() {
            let classes = l as u8 + ocean[[r, c]] as u8 + ice[[r, c]] as u8;
            if classes > 1 {
                return Err(GemError::Processing(format!(
                    "land-cover masks overlap at pixel ({}, {})",
                    r, c
                )));
            }
        }
        Ok(Self { land, ocean, ice })
    }

    pub fn dim(&self) -> (usize, usize) {
        self.land.dim()
    }

    /// Study-area mask: every pixel covered by one of the three classes.
    pub fn study_area(&self) -> Array2<bool> {
        let mut area = self.land.clone();
        for ((r, c), a) in area.indexed_iter_mut() {
            *a = *a || self.ocean[[r, c]] || self.ice[[r, c]];
        }
        area
    }
}

/// Apply the land-cover calibration to a temperature grid (Celsius).
///
/// Ocean is applied first, then land, then ice; the last write wins. With
/// validated exclusive masks each pixel sees at most one model. Pixels
/// outside all three masks come out masked.
pub fn calibrate(temperature: &MaskedGrid, masks: &LandCoverMasks) -> GemResult<MaskedGrid> {
    if temperature.dim() != masks.dim() {
        return Err(GemError::ShapeMismatch(format!(
            "temperature {:?} vs land-cover masks {:?}",
            temperature.dim(),
            masks.dim()
        )));
    }
    log::debug!(
        "Calibrating {}x{} temperature grid by land-cover class",
        temperature.dim().0,
        temperature.dim().1
    );

    let mut out = MaskedGrid::fully_masked(temperature.dim());
    let layers = [
        (&masks.ocean, OCEAN_MODEL),
        (&masks.land, LAND_MODEL),
        (&masks.ice, ICE_MODEL),
    ];
    for (mask, model) in layers {
        for ((r, c), &selected) in mask.indexed_iter() {
            if !selected {
                continue;
            }
            if let Some(t) = temperature.get(r, c) {
                out.values[[r, c]] = model.apply(t);
                out.valid[[r, c]] = true;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn three_class_masks() -> LandCoverMasks {
        LandCoverMasks::new(
            array![[true, false, false, false]],
            array![[false, true, false, false]],
            array![[false, false, true, false]],
        )
        .unwrap()
    }

    #[test]
    fn test_overlapping_masks_rejected() {
        let result = LandCoverMasks::new(
            array![[true]],
            array![[true]],
            array![[false]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_per_class_models() {
        let masks = three_class_masks();
        let t = MaskedGrid::from_values(array![[10.0, 10.0, 10.0, 10.0]]);
        let cal = calibrate(&t, &masks).unwrap();
        assert_abs_diff_eq!(cal.get(0, 0).unwrap(), LAND_MODEL.apply(10.0), epsilon = 1e-12);
        assert_abs_diff_eq!(cal.get(0, 1).unwrap(), OCEAN_MODEL.apply(10.0), epsilon = 1e-12);
        assert_abs_diff_eq!(cal.get(0, 2).unwrap(), 10.0, epsilon = 1e-12);
        // outside all classes stays masked
        assert_eq!(cal.get(0, 3), None);
    }

    #[test]
    fn test_idempotent_on_ice_only() {
        let masks = three_class_masks();
        let t = MaskedGrid::from_values(array![[10.0, 10.0, 10.0, 10.0]]);
        let once = calibrate(&t, &masks).unwrap();
        let twice = calibrate(&once, &masks).unwrap();
        // ice is identity, so applying twice changes nothing there
        assert_abs_diff_eq!(
            twice.get(0, 2).unwrap(),
            once.get(0, 2).unwrap(),
            epsilon = 1e-12
        );
        // land and ocean are strict contractions plus offset: a second
        // application must move the value
        assert!((twice.get(0, 0).unwrap() - once.get(0, 0).unwrap()).abs() > 1e-9);
        assert!((twice.get(0, 1).unwrap() - once.get(0, 1).unwrap()).abs() > 1e-9);
    }

    #[test]
    fn test_mask_propagates_through_calibration() {
        let masks = three_class_masks();
        let t = MaskedGrid::new(
            array![[10.0, 10.0, 10.0, 10.0]],
            array![[false, true, true, true]],
        )
        .unwrap();
        let cal = calibrate(&t, &masks).unwrap();
        assert_eq!(cal.get(0, 0), None);
        assert!(cal.get(0, 1).is_some());
    }

    #[test]
    fn test_study_area_union() {
        let masks = three_class_masks();
        assert_eq!(masks.study_area(), array![[true, true, true, false]]);
    }
}
