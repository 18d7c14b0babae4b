//! GEMLST: A Fast, Modular Multi-Sensor Surface Temperature Processor
//!
//! This library fuses MODIS Terra/Aqua land surface temperature with ERA5
//! reanalysis into a calibrated, gap-free daily LST dataset for Greenland,
//! and harmonizes five Landsat generations into a bias-corrected 30 m LST
//! series. NDVI processing for MODIS and Sentinel-2 shares the same quality
//! decoding and compositing machinery.

pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    BoundingBox, DailyComposite, GemError, GemResult, GeoTransform, Grid, GridReal,
    MaskedGrid, ProcessingConfig, Scene,
};

pub use crate::core::{
    classify, composite_daily, fuse, fuse_series, harmonize, harmonize_series, join_daily,
    record_for, CalibrationRecord, DailyObservations, Era5Daily, FusedProduct,
    LandCoverMasks, LandsatScene, ModisPass, SensorGeneration,
};
