//! NDVI from MODIS 250 m and Sentinel-2 surface reflectance.
//!
//! Vegetation monitoring restricts itself to ice- and ocean-free land, so
//! every scene is additionally clipped to the land mask. Terra and Aqua
//! scenes of the same day average out in the daily compositor.

use chrono::{DateTime, Utc};
use ndarray::Array2;

use crate::core::qa::{
    decode_modis_sr, decode_sentinel2_reflectance, sentinel2_clear_mask,
};
use crate::types::{GemError, GemResult, MaskedGrid, Scene};

/// Normalized difference vegetation index from red and NIR reflectance.
///
/// A pixel is valid when both inputs are valid and the denominator is
/// positive; bare fill (red + NIR == 0) stays masked.
pub fn ndvi(red: &MaskedGrid, nir: &MaskedGrid) -> GemResult<MaskedGrid> {
    if red.dim() != nir.dim() {
        return Err(GemError::ShapeMismatch(format!(
            "red {:?} vs nir {:?}",
            red.dim(),
            nir.dim()
        )));
    }
    let mut out = MaskedGrid::fully_masked(red.dim());
    for ((r, c), v) in out.values.indexed_iter_mut() {
        if let (Some(red), Some(nir)) = (red.get(r, c), nir.get(r, c)) {
            let total = nir + red;
            if total > 0.0 {
                *v = (nir - red) / total;
                out.valid[[r, c]] = true;
            }
        }
    }
    Ok(out)
}

/// NDVI scene from one MODIS MxD09GQ acquisition.
pub fn modis_ndvi_scene(
    red_dn: &Array2<i16>,
    nir_dn: &Array2<i16>,
    qc_250m: &Array2<u16>,
    landmask: &Array2<bool>,
    timestamp: DateTime<Utc>,
) -> GemResult<Scene> {
    let red = decode_modis_sr(red_dn, qc_250m)?;
    let nir = decode_modis_sr(nir_dn, qc_250m)?;
    let grid = clip_to_land(ndvi(&red, &nir)?, landmask)?;
    log::debug!(
        "MODIS NDVI scene at {}: {} valid pixels",
        timestamp,
        grid.valid_count()
    );
    Ok(Scene { timestamp, grid })
}

/// NDVI scene from one Sentinel-2 acquisition with Cloud Score+ masking.
pub fn sentinel2_ndvi_scene(
    red_dn: &Array2<u16>,
    nir_dn: &Array2<u16>,
    cloud_score: &Array2<f64>,
    scl: &Array2<u16>,
    landmask: &Array2<bool>,
    clear_threshold: f64,
    timestamp: DateTime<Utc>,
) -> GemResult<Scene> {
    let clear = sentinel2_clear_mask(cloud_score, scl, clear_threshold)?;
    let red = decode_sentinel2_reflectance(red_dn, &clear)?;
    let nir = decode_sentinel2_reflectance(nir_dn, &clear)?;
    let grid = clip_to_land(ndvi(&red, &nir)?, landmask)?;
    Ok(Scene { timestamp, grid })
}

fn clip_to_land(grid: MaskedGrid, landmask: &Array2<bool>) -> GemResult<MaskedGrid> {
    if grid.dim() != landmask.dim() {
        return Err(GemError::ShapeMismatch(format!(
            "ndvi {:?} vs landmask {:?}",
            grid.dim(),
            landmask.dim()
        )));
    }
    let mut out = grid;
    for ((r, c), valid) in out.valid.indexed_iter_mut() {
        *valid = *valid && landmask[[r, c]];
    }
    Ok(out)
}
