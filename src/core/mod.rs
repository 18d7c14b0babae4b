//! Core LST/NDVI processing modules

pub mod availability;
pub mod coefficients;
pub mod compositor;
pub mod fusion;
pub mod landcover;
pub mod landsat;
pub mod ndvi;
pub mod qa;

// Re-export main types
pub use availability::{classify, ModisPass, MAX_PATTERN};
pub use coefficients::{record_for, CalibrationRecord, COEFFICIENTS};
pub use compositor::composite_daily;
pub use fusion::{
    fuse, fuse_series, join_daily, DailyObservations, Era5Daily, FusedProduct,
};
pub use landcover::{calibrate, LandCoverMasks, LinearModel, ICE_MODEL, LAND_MODEL, OCEAN_MODEL};
pub use landsat::{
    encode_product_uint16, harmonize, harmonize_series, HarmonizedScene, LandsatScene,
    SensorGeneration,
};
pub use ndvi::{modis_ndvi_scene, ndvi, sentinel2_ndvi_scene};

#[cfg(feature = "parallel")]
pub use fusion::fuse_series_parallel;
