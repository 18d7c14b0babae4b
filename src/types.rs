use chrono::{DateTime, NaiveDate, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Real-valued raster band data
pub type GridReal = f64;

/// 2D raster band array (row x column)
pub type Grid = Array2<GridReal>;

/// A raster band with an explicit per-pixel validity mask.
///
/// Invalid pixels represent missing observations (cloud, fill, off-swath).
/// Every transform in the crate propagates the mask; arithmetic never
/// substitutes a value for an invalid pixel.
#[derive(Debug, Clone)]
pub struct MaskedGrid {
    pub values: Grid,
    pub valid: Array2<bool>,
}

impl MaskedGrid {
    /// Create a masked grid, checking that values and mask share one shape.
    pub fn new(values: Grid, valid: Array2<bool>) -> GemResult<Self> {
        if values.dim() != valid.dim() {
            return Err(GemError::ShapeMismatch(format!(
                "values {:?} vs mask {:?}",
                values.dim(),
                valid.dim()
            )));
        }
        Ok(Self { values, valid })
    }

    /// Wrap a fully-valid grid.
    pub fn from_values(values: Grid) -> Self {
        let valid = Array2::from_elem(values.dim(), true);
        Self { values, valid }
    }

    /// A grid of the given shape with every pixel masked out.
    pub fn fully_masked(dim: (usize, usize)) -> Self {
        Self {
            values: Array2::zeros(dim),
            valid: Array2::from_elem(dim, false),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Value at a pixel, or None if the pixel is masked.
    pub fn get(&self, row: usize, col: usize) -> Option<GridReal> {
        if self.valid[[row, col]] {
            Some(self.values[[row, col]])
        } else {
            None
        }
    }

    /// Apply a per-pixel function to valid pixels, preserving the mask.
    pub fn map<F: Fn(GridReal) -> GridReal>(&self, f: F) -> Self {
        let mut out = self.clone();
        for ((r, c), v) in out.values.indexed_iter_mut() {
            if self.valid[[r, c]] {
                *v = f(*v);
            }
        }
        out
    }

    /// Number of valid pixels.
    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }
}

/// One satellite acquisition of a single band.
#[derive(Debug, Clone)]
pub struct Scene {
    pub timestamp: DateTime<Utc>,
    pub grid: MaskedGrid,
}

/// Mean of all same-day scenes, tagged with the composite date.
#[derive(Debug, Clone)]
pub struct DailyComposite {
    pub date: NaiveDate,
    pub grid: MaskedGrid,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

/// Geospatial transformation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Map a geographic coordinate to a (row, col) pixel index.
    /// Returns None when the point falls outside the grid.
    pub fn locate(&self, x: f64, y: f64, dim: (usize, usize)) -> Option<(usize, usize)> {
        let col = (x - self.top_left_x) / self.pixel_width;
        let row = (y - self.top_left_y) / self.pixel_height;
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (rows, cols) = dim;
        let (row, col) = (row as usize, col as usize);
        if row < rows && col < cols {
            Some((row, col))
        } else {
            None
        }
    }
}

/// Processing configuration: date range, region of interest, and export
/// parameters. The core takes these as explicit arguments; nothing reads
/// ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub roi: BoundingBox,
    pub scale: f64,
    pub epsg: u32,
    pub folder: String,
    pub file_name_prefix: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            date_start: NaiveDate::from_ymd_opt(2024, 1, 1).expect("static date"),
            date_end: NaiveDate::from_ymd_opt(2024, 1, 31).expect("static date"),
            // Greenland
            roi: BoundingBox {
                min_lon: -74.0,
                max_lon: -11.0,
                min_lat: 59.0,
                max_lat: 83.0,
            },
            scale: 1000.0,
            epsg: 3413, // Greenland Polar Stereographic
            folder: "GEMLST".to_string(),
            file_name_prefix: "GEMLST_".to_string(),
        }
    }
}

/// Error types for LST processing
#[derive(Debug, thiserror::Error)]
pub enum GemError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Availability pattern {pattern} has no calibration record")]
    InvalidPattern { pattern: u8 },

    #[error("Grid shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for LST operations
pub type GemResult<T> = Result<T, GemError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_masked_grid_shape_check() {
        let values = Array2::zeros((2, 3));
        let valid = Array2::from_elem((3, 2), true);
        assert!(MaskedGrid::new(values, valid).is_err());
    }

    #[test]
    fn test_masked_grid_map_preserves_mask() {
        let values = array![[1.0, 2.0], [3.0, 4.0]];
        let valid = array![[true, false], [true, true]];
        let grid = MaskedGrid::new(values, valid).unwrap();
        let doubled = grid.map(|v| v * 2.0);
        assert_eq!(doubled.get(0, 0), Some(2.0));
        assert_eq!(doubled.get(0, 1), None);
        assert_eq!(doubled.valid_count(), 3);
    }

    #[test]
    fn test_geo_transform_locate() {
        let gt = GeoTransform {
            top_left_x: 100.0,
            pixel_width: 10.0,
            rotation_x: 0.0,
            top_left_y: 200.0,
            rotation_y: 0.0,
            pixel_height: -10.0,
        };
        assert_eq!(gt.locate(125.0, 175.0, (4, 4)), Some((2, 2)));
        assert_eq!(gt.locate(99.0, 175.0, (4, 4)), None);
        assert_eq!(gt.locate(125.0, 300.0, (4, 4)), None);
    }
}
