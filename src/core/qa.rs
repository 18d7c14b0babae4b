//! Per-sensor quality decoding and digital-number to physical-unit conversion.
//!
//! Every decoder returns a [`MaskedGrid`]: bad pixels are masked, never an
//! error. Bit layouts follow the MODIS MxD11A1 QC word, the Landsat
//! Collection 2 QA_PIXEL/QA_RADSAT bands, the Sentinel-2 Cloud Score+ band
//! and the MODIS MxD09GQ QC_250m word.

use ndarray::{Array2, Zip};

use crate::types::{GemError, GemResult, MaskedGrid};

/// MODIS LST scale factor (DN to Kelvin)
pub const MODIS_LST_SCALE: f64 = 0.02;
/// Kelvin to Celsius offset
pub const KELVIN_OFFSET: f64 = 273.15;
/// Landsat Collection 2 surface temperature scale (DN to Kelvin)
pub const LANDSAT_THERMAL_SCALE: f64 = 0.00341802;
/// Landsat Collection 2 surface temperature offset (Kelvin)
pub const LANDSAT_THERMAL_OFFSET: f64 = 149.0;
/// Landsat Collection 2 surface reflectance scale
pub const LANDSAT_OPTICAL_SCALE: f64 = 0.0000275;
/// Landsat Collection 2 surface reflectance offset
pub const LANDSAT_OPTICAL_OFFSET: f64 = -0.2;
/// MODIS MxD09GQ surface reflectance scale
pub const MODIS_SR_SCALE: f64 = 0.0001;
/// Sentinel-2 reflectance scale divisor
pub const S2_REFLECTANCE_SCALE: f64 = 10000.0;
/// Cloud Score+ threshold; values between 0.50 and 0.65 generally work well.
/// Higher values remove thin clouds, haze and cirrus shadows.
pub const DEFAULT_CLEAR_THRESHOLD: f64 = 0.65;

/// Extract the bit field [from_bit, to_bit] (inclusive) from a QA word.
/// Handles the full 16-bit span; the shift is widened so (0, 15) is valid.
pub fn bitwise_extract(value: u16, from_bit: u8, to_bit: u8) -> u16 {
    debug_assert!(from_bit <= to_bit && to_bit < 16);
    let mask_size = u32::from(to_bit - from_bit + 1);
    let mask = ((1u32 << mask_size) - 1) as u16;
    (value >> from_bit) & mask
}

/// MODIS MxD11A1 QC word check, identical for QC_Day and QC_Night.
///
/// Bits 0-1: mandatory QA, 0 = good, 1 = other quality (both accepted).
/// Bits 2-3: data quality flag, pass only if 0.
/// Bits 4-5: emissivity error flag, pass only if 0.
/// Bits 6-7: LST error flag, pass only if 0.
pub fn modis_qc_valid(qc: u16) -> bool {
    bitwise_extract(qc, 0, 1) <= 1
        && bitwise_extract(qc, 2, 3) == 0
        && bitwise_extract(qc, 4, 5) == 0
        && bitwise_extract(qc, 6, 7) == 0
}

/// Decode a MODIS LST band to Celsius with its QC word.
///
/// DN 0 is the product fill value and is masked regardless of the QC word.
pub fn decode_modis_lst(dn: &Array2<u16>, qc: &Array2<u16>) -> GemResult<MaskedGrid> {
    check_same_dim(dn.dim(), qc.dim())?;
    log::debug!("Decoding MODIS LST band ({}x{})", dn.dim().0, dn.dim().1);

    let valid = Zip::from(dn)
        .and(qc)
        .map_collect(|&dn, &qc| dn != 0 && modis_qc_valid(qc));
    let values = dn.mapv(|dn| dn as f64 * MODIS_LST_SCALE - KELVIN_OFFSET);
    MaskedGrid::new(values, valid)
}

/// Landsat Collection 2 pixel check.
///
/// QA_PIXEL bits 0-4 (fill, dilated cloud, cirrus, cloud, cloud shadow) must
/// all be clear, and QA_RADSAT must report no saturated band.
pub fn landsat_pixel_valid(qa_pixel: u16, qa_radsat: u16) -> bool {
    qa_pixel & 0b11111 == 0 && qa_radsat == 0
}

/// Decode a Landsat surface temperature band to Celsius.
pub fn decode_landsat_thermal(
    dn: &Array2<u16>,
    qa_pixel: &Array2<u16>,
    qa_radsat: &Array2<u16>,
) -> GemResult<MaskedGrid> {
    check_same_dim(dn.dim(), qa_pixel.dim())?;
    check_same_dim(dn.dim(), qa_radsat.dim())?;
    log::debug!("Decoding Landsat thermal band ({}x{})", dn.dim().0, dn.dim().1);

    let valid = Zip::from(qa_pixel)
        .and(qa_radsat)
        .map_collect(|&qa, &sat| landsat_pixel_valid(qa, sat));
    let values = dn.mapv(|dn| {
        dn as f64 * LANDSAT_THERMAL_SCALE + LANDSAT_THERMAL_OFFSET - KELVIN_OFFSET
    });
    MaskedGrid::new(values, valid)
}

/// Decode a Landsat surface reflectance band to [0, 1] reflectance.
pub fn decode_landsat_optical(
    dn: &Array2<u16>,
    qa_pixel: &Array2<u16>,
    qa_radsat: &Array2<u16>,
) -> GemResult<MaskedGrid> {
    check_same_dim(dn.dim(), qa_pixel.dim())?;
    check_same_dim(dn.dim(), qa_radsat.dim())?;

    let valid = Zip::from(qa_pixel)
        .and(qa_radsat)
        .map_collect(|&qa, &sat| landsat_pixel_valid(qa, sat));
    let values = dn.mapv(|dn| dn as f64 * LANDSAT_OPTICAL_SCALE + LANDSAT_OPTICAL_OFFSET);
    MaskedGrid::new(values, valid)
}

/// Re-encode a calibrated Celsius value into the Landsat uint16 DN space.
/// Exact inverse of the thermal conversion, used for compact exports.
pub fn encode_landsat_uint16(celsius: f64) -> u16 {
    let dn = ((celsius + KELVIN_OFFSET) - LANDSAT_THERMAL_OFFSET) / LANDSAT_THERMAL_SCALE;
    dn.round().clamp(0.0, u16::MAX as f64) as u16
}

/// Decode a Landsat uint16 DN back to Celsius.
pub fn decode_landsat_uint16(dn: u16) -> f64 {
    dn as f64 * LANDSAT_THERMAL_SCALE + LANDSAT_THERMAL_OFFSET - KELVIN_OFFSET
}

/// Sentinel-2 clear-sky mask from the Cloud Score+ band and the scene
/// classification layer. A pixel is kept when its clear-sky score reaches
/// the threshold and SCL does not flag it saturated/defective (class 1).
pub fn sentinel2_clear_mask(
    cloud_score: &Array2<f64>,
    scl: &Array2<u16>,
    clear_threshold: f64,
) -> GemResult<Array2<bool>> {
    check_same_dim(cloud_score.dim(), scl.dim())?;
    Ok(Zip::from(cloud_score)
        .and(scl)
        .map_collect(|&score, &scl| score >= clear_threshold && scl != 1))
}

/// Decode a Sentinel-2 reflectance band with a precomputed clear-sky mask.
pub fn decode_sentinel2_reflectance(
    dn: &Array2<u16>,
    clear: &Array2<bool>,
) -> GemResult<MaskedGrid> {
    check_same_dim(dn.dim(), clear.dim())?;
    let values = dn.mapv(|dn| dn as f64 / S2_REFLECTANCE_SCALE);
    MaskedGrid::new(values, clear.clone())
}

/// MODIS MxD09GQ QC_250m word check.
///
/// Bits 0-1: land QA, pass only at ideal quality.
/// Bits 4-7: band 1 quality, bits 8-11: band 2 quality; pass only if 0.
pub fn modis_sr_qc_valid(qc: u16) -> bool {
    bitwise_extract(qc, 0, 1) == 0
        && bitwise_extract(qc, 4, 7) == 0
        && bitwise_extract(qc, 8, 11) == 0
}

/// Decode a MODIS 250 m surface reflectance band with its QC_250m word.
pub fn decode_modis_sr(dn: &Array2<i16>, qc: &Array2<u16>) -> GemResult<MaskedGrid> {
    check_same_dim(dn.dim(), qc.dim())?;
    let valid = qc.mapv(modis_sr_qc_valid);
    let values = dn.mapv(|dn| dn as f64 * MODIS_SR_SCALE);
    MaskedGrid::new(values, valid)
}

fn check_same_dim(a: (usize, usize), b: (usize, usize)) -> GemResult<()> {
    if a != b {
        return Err(GemError::ShapeMismatch(format!("{:?} vs {:?}", a, b)));
    }
    Ok(())
}
