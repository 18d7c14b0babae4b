//! Daily temporal compositing of an irregular-revisit scene series.
//!
//! Buckets scenes into calendar-day [00:00, 24:00) UTC bins and averages
//! the valid observations per pixel. Days without any contributing scene
//! produce no composite.

use chrono::NaiveDate;
use ndarray::Array2;

use crate::types::{DailyComposite, GemError, GemResult, MaskedGrid, Scene};

/// Composite a scene series into at most one image per calendar day in
/// [start_date, end_date). Composites come out in ascending date order and
/// are independent of the input scene order.
pub fn composite_daily(
    scenes: &[Scene],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> GemResult<Vec<DailyComposite>> {
    if scenes.is_empty() {
        log::debug!("Empty scene series, no composites produced");
        return Ok(Vec::new());
    }
    let dim = scenes[0].grid.dim();
    for scene in scenes {
        if scene.grid.dim() != dim {
            return Err(GemError::ShapeMismatch(format!(
                "scene at {} is {:?}, expected {:?}",
                scene.timestamp,
                scene.grid.dim(),
                dim
            )));
        }
    }

    let mut composites = Vec::new();
    let mut date = start_date;
    while date < end_date {
        let same_day: Vec<&Scene> = scenes
            .iter()
            .filter(|s| s.timestamp.date_naive() == date)
            .collect();
        if !same_day.is_empty() {
            composites.push(DailyComposite {
                date,
                grid: masked_mean(&same_day, dim),
            });
        }
        date = date.succ_opt().ok_or_else(|| {
            GemError::Processing(format!("calendar overflow after {}", date))
        })?;
    }

    log::info!(
        "Composited {} scenes into {} daily images",
        scenes.len(),
        composites.len()
    );
    Ok(composites)
}

/// Per-pixel arithmetic mean over the scenes valid at that pixel. Pixels
/// invalid in every scene remain masked.
fn masked_mean(scenes: &[&Scene], dim: (usize, usize)) -> MaskedGrid {
    let mut sum: Array2<f64> = Array2::zeros(dim);
    let mut count: Array2<u32> = Array2::zeros(dim);
    for scene in scenes {
        for ((r, c), &valid) in scene.grid.valid.indexed_iter() {
            if valid {
                sum[[r, c]] += scene.grid.values[[r, c]];
                count[[r, c]] += 1;
            }
        }
    }

    let mut out = MaskedGrid::fully_masked(dim);
    for ((r, c), &n) in count.indexed_iter() {
        if n > 0 {
            out.values[[r, c]] = sum[[r, c]] / n as f64;
            out.valid[[r, c]] = true;
        }
    }
    out
}
