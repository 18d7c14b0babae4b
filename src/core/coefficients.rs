//! Regression coefficients fusing MODIS LST with net solar radiation.
//!
//! One record per availability pattern 1..=15, fitted offline against
//! in-situ station data. Pattern 0 (no observation) has no record; the
//! fusion engine falls back to reanalysis skin temperature there.

use crate::types::{GemError, GemResult};

/// One fused-LST regression record:
/// `lst = t_coeff * mean_modis_lst + solar_coeff * net_solar + intercept`.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationRecord {
    pub pattern: u8,
    pub intercept: f64,
    pub t_coeff: f64,
    pub solar_coeff: f64,
}

/// The 15 regression records, one per non-zero availability pattern.
/// Bit order: 8 = Terra day, 4 = Terra night, 2 = Aqua day, 1 = Aqua night.
pub const COEFFICIENTS: [CalibrationRecord; 15] = [
    CalibrationRecord { pattern: 1,  intercept: -0.784992834128613,   t_coeff: 0.906590788274843, solar_coeff: 1.03669127251288e-06 },
    CalibrationRecord { pattern: 2,  intercept: -2.72772961154428,    t_coeff: 0.864013566310192, solar_coeff: -3.35940233622233e-08 },
    CalibrationRecord { pattern: 3,  intercept: -0.631502973964556,   t_coeff: 0.976195873933907, solar_coeff: 8.5668092908308e-08 },
    CalibrationRecord { pattern: 4,  intercept: -0.482353446197247,   t_coeff: 0.9232805167859,   solar_coeff: 6.28895745791016e-07 },
    CalibrationRecord { pattern: 5,  intercept: 0.13822534121047,     t_coeff: 0.972898933945562, solar_coeff: 6.07908419848783e-07 },
    CalibrationRecord { pattern: 6,  intercept: -0.644606390843865,   t_coeff: 0.971834024884555, solar_coeff: -7.48746592128951e-08 },
    CalibrationRecord { pattern: 7,  intercept: -0.0074406421379301,  t_coeff: 1.00258673602663,  solar_coeff: 8.30382103055948e-08 },
    CalibrationRecord { pattern: 8,  intercept: -1.34695967294259,    t_coeff: 0.918214355203352, solar_coeff: 4.53098106772407e-08 },
    CalibrationRecord { pattern: 9,  intercept: -0.284975970024893,   t_coeff: 0.972507056820705, solar_coeff: 2.90972229423868e-07 },
    CalibrationRecord { pattern: 10, intercept: -1.87107581116087,    t_coeff: 0.905781514375017, solar_coeff: -6.98570333719986e-08 },
    CalibrationRecord { pattern: 11, intercept: -0.710224635510656,   t_coeff: 0.969619217974844, solar_coeff: 1.17703947635499e-08 },
    CalibrationRecord { pattern: 12, intercept: -0.0945029361445182,  t_coeff: 0.984136140624823, solar_coeff: 6.02125454340973e-08 },
    CalibrationRecord { pattern: 13, intercept: 0.2080247987705,      t_coeff: 0.998557440221747, solar_coeff: 2.29617740169069e-07 },
    CalibrationRecord { pattern: 14, intercept: -0.669653995793039,   t_coeff: 0.970568958538719, solar_coeff: -1.11444153642164e-07 },
    CalibrationRecord { pattern: 15, intercept: -0.155889791750814,   t_coeff: 0.996384902208461, solar_coeff: 2.61860711397444e-09 },
];

/// Look up the record for an availability pattern.
///
/// A miss here is a logic error upstream (the classifier never produces a
/// pattern outside [0, 15], and pattern 0 must not reach a lookup), so it
/// aborts the day loudly instead of defaulting.
pub fn record_for(pattern: u8) -> GemResult<&'static CalibrationRecord> {
    if pattern == 0 || pattern > 15 {
        return Err(GemError::InvalidPattern { pattern });
    }
    Ok(&COEFFICIENTS[pattern as usize - 1])
}
