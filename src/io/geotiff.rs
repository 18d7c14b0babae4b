//! GDAL-backed raster import/export.
//!
//! Reads the static inputs (land-cover classification) and writes the
//! per-day fused products. Nodata values map onto the crate's validity
//! masks on the way in and back out on the way out.

use std::path::{Path, PathBuf};

use gdal::raster::Buffer;
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use ndarray::Array2;

use crate::core::fusion::FusedProduct;
use crate::core::landcover::LandCoverMasks;
use crate::types::{GemError, GemResult, GeoTransform, MaskedGrid, ProcessingConfig};

/// Nodata value written for masked LST pixels.
pub const LST_NODATA: f64 = -9999.0;
/// Nodata value for the availability pattern band. Pattern 0 is a real
/// in-area code (ERA5 fallback), so off-area pixels need a distinct value.
pub const PATTERN_NODATA: f64 = 255.0;

/// Read one band of a raster into a masked grid.
pub fn read_band<P: AsRef<Path>>(path: P, band_index: isize) -> GemResult<(MaskedGrid, GeoTransform)> {
    log::info!("Reading raster: {}", path.as_ref().display());

    let dataset = Dataset::open(path.as_ref())?;
    let geo_transform = dataset.geo_transform()?;
    let (width, height) = dataset.raster_size();
    log::debug!("Raster size: {}x{}", width, height);

    let rasterband = dataset.rasterband(band_index)?;
    let no_data = rasterband.no_data_value();
    let band_data =
        rasterband.read_as::<f64>((0, 0), (width, height), (width, height), None)?;

    let values = Array2::from_shape_vec((height, width), band_data.data)
        .map_err(|e| GemError::Processing(format!("Failed to reshape raster data: {}", e)))?;
    let valid = match no_data {
        Some(nd) => values.mapv(|v| v != nd && v.is_finite()),
        None => values.mapv(|v| v.is_finite()),
    };

    let geo_transform = GeoTransform {
        top_left_x: geo_transform[0],
        pixel_width: geo_transform[1],
        rotation_x: geo_transform[2],
        top_left_y: geo_transform[3],
        rotation_y: geo_transform[4],
        pixel_height: geo_transform[5],
    };

    Ok((MaskedGrid::new(values, valid)?, geo_transform))
}

/// Read a two-band ice/ocean classification raster (band 1 = ocean flag,
/// band 2 = ice flag) into the three exclusive land-cover masks. Land is
/// everything flagged neither ocean nor ice.
pub fn read_landcover_masks<P: AsRef<Path>>(
    path: P,
) -> GemResult<(LandCoverMasks, GeoTransform)> {
    let (ocean_flag, geo_transform) = read_band(path.as_ref(), 1)?;
    let (ice_flag, _) = read_band(path.as_ref(), 2)?;
    if ocean_flag.dim() != ice_flag.dim() {
        return Err(GemError::ShapeMismatch(format!(
            "ocean band {:?} vs ice band {:?}",
            ocean_flag.dim(),
            ice_flag.dim()
        )));
    }

    let dim = ocean_flag.dim();
    let mut ocean = Array2::from_elem(dim, false);
    let mut ice = Array2::from_elem(dim, false);
    let mut land = Array2::from_elem(dim, false);
    for ((r, c), l) in land.indexed_iter_mut() {
        let is_ocean = ocean_flag.get(r, c) == Some(1.0);
        let is_ice = ice_flag.get(r, c) == Some(1.0);
        ocean[[r, c]] = is_ocean && !is_ice;
        ice[[r, c]] = is_ice && !is_ocean;
        *l = ocean_flag.get(r, c) == Some(0.0) && ice_flag.get(r, c) == Some(0.0);
    }
    Ok((LandCoverMasks::new(land, ocean, ice)?, geo_transform))
}

/// Write a fused daily product as a two-band float GeoTIFF:
/// band 1 `Corrected_LST` (Celsius, nodata for masked pixels),
/// band 2 `Available_Pattern` (nodata for the same masked pixels, so an
/// off-area pixel is never confused with in-area pattern 0). Returns the
/// written path, `{prefix}{yyyy_MM_dd}.tif` inside the output directory.
pub fn write_fused_product<P: AsRef<Path>>(
    output_dir: P,
    product: &FusedProduct,
    geo_transform: &GeoTransform,
    config: &ProcessingConfig,
) -> GemResult<PathBuf> {
    let file_name = format!(
        "{}{}.tif",
        config.file_name_prefix,
        product.date.format("%Y_%m_%d")
    );
    let path = output_dir.as_ref().join(file_name);
    log::info!("Writing fused product: {}", path.display());

    let (rows, cols) = product.corrected_lst.dim();
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut dataset =
        driver.create_with_band_type::<f64, _>(&path, cols as isize, rows as isize, 2)?;
    set_georeference(&mut dataset, geo_transform, config.epsg)?;

    let mut lst_data = Vec::with_capacity(rows * cols);
    for ((r, c), &v) in product.corrected_lst.values.indexed_iter() {
        lst_data.push(if product.corrected_lst.valid[[r, c]] {
            v
        } else {
            LST_NODATA
        });
    }
    let mut lst_band = dataset.rasterband(1)?;
    lst_band.set_no_data_value(Some(LST_NODATA))?;
    lst_band.write((0, 0), (cols, rows), &Buffer::new((cols, rows), lst_data))?;

    let mut pattern_data = Vec::with_capacity(rows * cols);
    for ((r, c), &p) in product.pattern.indexed_iter() {
        pattern_data.push(if product.corrected_lst.valid[[r, c]] {
            p as f64
        } else {
            PATTERN_NODATA
        });
    }
    let mut pattern_band = dataset.rasterband(2)?;
    pattern_band.set_no_data_value(Some(PATTERN_NODATA))?;
    pattern_band.write((0, 0), (cols, rows), &Buffer::new((cols, rows), pattern_data))?;

    Ok(path)
}

/// Write a uint16-encoded LST grid as a single-band GeoTIFF (DN 0 = fill).
pub fn write_uint16_grid<P: AsRef<Path>>(
    path: P,
    grid: &Array2<u16>,
    geo_transform: &GeoTransform,
    epsg: u32,
) -> GemResult<()> {
    log::info!("Writing uint16 export: {}", path.as_ref().display());

    let (rows, cols) = grid.dim();
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut dataset =
        driver.create_with_band_type::<u16, _>(path.as_ref(), cols as isize, rows as isize, 1)?;
    set_georeference(&mut dataset, geo_transform, epsg)?;

    let data: Vec<u16> = grid.iter().copied().collect();
    let mut band = dataset.rasterband(1)?;
    band.set_no_data_value(Some(0.0))?;
    band.write((0, 0), (cols, rows), &Buffer::new((cols, rows), data))?;
    Ok(())
}

fn set_georeference(
    dataset: &mut Dataset,
    geo_transform: &GeoTransform,
    epsg: u32,
) -> GemResult<()> {
    dataset.set_geo_transform(&[
        geo_transform.top_left_x,
        geo_transform.pixel_width,
        geo_transform.rotation_x,
        geo_transform.top_left_y,
        geo_transform.rotation_y,
        geo_transform.pixel_height,
    ])?;
    let spatial_ref = SpatialRef::from_epsg(epsg)?;
    dataset.set_spatial_ref(&spatial_ref)?;
    Ok(())
}
