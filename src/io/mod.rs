//! Raster and table I/O

pub mod extract;
pub mod geotiff;

pub use extract::{extract_to_csv, sample_station, SampledScene, Station};
pub use geotiff::{
    read_band, read_landcover_masks, write_fused_product, write_uint16_grid, LST_NODATA,
    PATTERN_NODATA,
};
