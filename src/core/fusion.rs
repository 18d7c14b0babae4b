//! Multi-sensor LST fusion with reanalysis gap filling.
//!
//! For each day the engine classifies the Terra/Aqua day/night availability
//! pattern, applies the regression record matching every pattern actually
//! present in the scene, and fills pixels with no optical observation from
//! ERA5 skin temperature. The original lazy fold over a histogram of
//! patterns becomes an explicit two-pass algorithm: pass 1 tallies the
//! distinct patterns inside the study area, pass 2 applies and accumulates.

use chrono::NaiveDate;
use ndarray::Array2;

use crate::core::availability::{classify, MAX_PATTERN};
use crate::core::coefficients::record_for;
use crate::core::qa::KELVIN_OFFSET;
use crate::types::{DailyComposite, GemError, GemResult, Grid, MaskedGrid};

/// All inputs the fusion engine needs for one calendar day.
#[derive(Debug, Clone)]
pub struct DailyObservations {
    pub date: NaiveDate,
    pub terra_day: MaskedGrid,
    pub terra_night: MaskedGrid,
    pub aqua_day: MaskedGrid,
    pub aqua_night: MaskedGrid,
    /// ERA5 daily mean surface net solar radiation (J/m^2)
    pub net_solar: Grid,
    /// ERA5 daily mean skin temperature (Kelvin)
    pub skin_temperature: Grid,
}

/// Daily mean ERA5 auxiliary fields.
#[derive(Debug, Clone)]
pub struct Era5Daily {
    pub date: NaiveDate,
    pub net_solar: Grid,
    pub skin_temperature: Grid,
}

/// Fusion output: calibrated LST in Celsius plus the availability pattern,
/// both masked to the study area.
#[derive(Debug, Clone)]
pub struct FusedProduct {
    pub date: NaiveDate,
    pub corrected_lst: MaskedGrid,
    pub pattern: Array2<u8>,
}

/// Fuse one day of observations into a gapless calibrated LST grid.
pub fn fuse(obs: &DailyObservations, study_area: &Array2<bool>) -> GemResult<FusedProduct> {
    let dim = obs.terra_day.dim();
    if study_area.dim() != dim
        || obs.net_solar.dim() != dim
        || obs.skin_temperature.dim() != dim
    {
        return Err(GemError::ShapeMismatch(format!(
            "fusion inputs disagree on shape for {}",
            obs.date
        )));
    }

    let pattern = classify(
        &obs.terra_day,
        &obs.terra_night,
        &obs.aqua_day,
        &obs.aqua_night,
    )?;

    // Pass 1: which patterns actually occur in the study area today.
    // Typically a small subset of the 15 possible values.
    let mut present = [false; MAX_PATTERN as usize + 1];
    for ((r, c), &p) in pattern.indexed_iter() {
        if study_area[[r, c]] {
            present[p as usize] = true;
        }
    }
    let distinct: Vec<u8> = (1..=MAX_PATTERN).filter(|&p| present[p as usize]).collect();
    log::debug!(
        "{}: availability patterns present: {:?}",
        obs.date,
        distinct
    );

    let mean_lst = mean_of_available(obs);

    // Pass 2: apply each matching regression record. The per-pattern masks
    // partition the area, so summing into a zero-initialized accumulator is
    // equivalent to picking the matching value.
    let mut corrected: Grid = Array2::zeros(dim);
    for &key in &distinct {
        let record = record_for(key)?;
        for ((r, c), &p) in pattern.indexed_iter() {
            if p == key && study_area[[r, c]] {
                // pattern != 0 implies at least one valid observation, so
                // the mean is defined here
                corrected[[r, c]] += mean_lst.values[[r, c]] * record.t_coeff
                    + obs.net_solar[[r, c]] * record.solar_coeff
                    + record.intercept;
            }
        }
    }

    // Reanalysis fallback where no optical observation exists.
    let mut fallback_pixels = 0usize;
    for ((r, c), &p) in pattern.indexed_iter() {
        if p == 0 && study_area[[r, c]] {
            corrected[[r, c]] = obs.skin_temperature[[r, c]] - KELVIN_OFFSET;
            fallback_pixels += 1;
        }
    }
    if fallback_pixels > 0 {
        log::debug!(
            "{}: {} pixels filled from ERA5 skin temperature",
            obs.date,
            fallback_pixels
        );
    }

    let corrected_lst = MaskedGrid::new(corrected, study_area.clone())?;
    let mut pattern_masked = pattern;
    for ((r, c), p) in pattern_masked.indexed_iter_mut() {
        if !study_area[[r, c]] {
            *p = 0;
        }
    }
    Ok(FusedProduct {
        date: obs.date,
        corrected_lst,
        pattern: pattern_masked,
    })
}

/// Per-pixel mean over whichever of the four observations are valid.
fn mean_of_available(obs: &DailyObservations) -> MaskedGrid {
    let dim = obs.terra_day.dim();
    let mut out = MaskedGrid::fully_masked(dim);
    let bands = [
        &obs.terra_day,
        &obs.terra_night,
        &obs.aqua_day,
        &obs.aqua_night,
    ];
    for ((r, c), v) in out.values.indexed_iter_mut() {
        let mut sum = 0.0;
        let mut n = 0u32;
        for band in bands {
            if let Some(x) = band.get(r, c) {
                sum += x;
                n += 1;
            }
        }
        if n > 0 {
            *v = sum / n as f64;
            out.valid[[r, c]] = true;
        }
    }
    out
}

/// Align per-sensor daily composites and ERA5 daily fields by date.
///
/// Every day with ERA5 data yields an entry; a sensor missing that day
/// contributes a fully masked grid (its availability bit stays 0). Days
/// without ERA5 cannot be gap-filled and are skipped with a warning.
pub fn join_daily(
    terra_day: &[DailyComposite],
    terra_night: &[DailyComposite],
    aqua_day: &[DailyComposite],
    aqua_night: &[DailyComposite],
    era5: &[Era5Daily],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> GemResult<Vec<DailyObservations>> {
    let find = |series: &[DailyComposite], date: NaiveDate, dim: (usize, usize)| {
        series
            .iter()
            .find(|c| c.date == date)
            .map(|c| c.grid.clone())
            .unwrap_or_else(|| MaskedGrid::fully_masked(dim))
    };

    let mut joined = Vec::new();
    let mut date = start_date;
    while date < end_date {
        if let Some(aux) = era5.iter().find(|e| e.date == date) {
            let dim = aux.net_solar.dim();
            joined.push(DailyObservations {
                date,
                terra_day: find(terra_day, date, dim),
                terra_night: find(terra_night, date, dim),
                aqua_day: find(aqua_day, date, dim),
                aqua_night: find(aqua_night, date, dim),
                net_solar: aux.net_solar.clone(),
                skin_temperature: aux.skin_temperature.clone(),
            });
        } else {
            log::warn!("{}: no ERA5 data, day skipped", date);
        }
        date = date.succ_opt().ok_or_else(|| {
            GemError::Processing(format!("calendar overflow after {}", date))
        })?;
    }
    Ok(joined)
}

/// Fuse a run of days sequentially. Each day is independent; one failing
/// day does not abort the others.
pub fn fuse_series(
    days: &[DailyObservations],
    study_area: &Array2<bool>,
) -> Vec<(NaiveDate, GemResult<FusedProduct>)> {
    log::info!("Fusing {} days", days.len());
    days.iter()
        .map(|obs| (obs.date, fuse(obs, study_area)))
        .collect()
}

/// Fuse a run of days in parallel with rayon. Days carry no ordering
/// dependency, so this is a plain task-parallel map; failure isolation is
/// per day, exactly as in the sequential path.
#[cfg(feature = "parallel")]
pub fn fuse_series_parallel(
    days: &[DailyObservations],
    study_area: &Array2<bool>,
) -> Vec<(NaiveDate, GemResult<FusedProduct>)> {
    use rayon::prelude::*;

    log::info!("Fusing {} days in parallel", days.len());
    days.par_iter()
        .map(|obs| (obs.date, fuse(obs, study_area)))
        .collect()
}
