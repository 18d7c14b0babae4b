//! MODIS Terra/Aqua day/night availability classification.
//!
//! Each pixel of a fused daily composite is labelled with a 4-bit pattern
//! describing which of the four possible LST observations exist there.

use ndarray::Array2;

use crate::types::{GemError, GemResult, MaskedGrid};

/// Bit weight of each sensor/pass combination in the availability pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModisPass {
    TerraDay,
    TerraNight,
    AquaDay,
    AquaNight,
}

impl ModisPass {
    pub fn bit_weight(self) -> u8 {
        match self {
            ModisPass::TerraDay => 8,
            ModisPass::TerraNight => 4,
            ModisPass::AquaDay => 2,
            ModisPass::AquaNight => 1,
        }
    }
}

/// Maximum availability pattern value (all four observations present).
pub const MAX_PATTERN: u8 = 15;

/// Compute the per-pixel availability pattern in [0, 15].
///
/// `pattern = 8*terra_day + 4*terra_night + 2*aqua_day + 1*aqua_night`,
/// each term 1 when the pixel holds a valid observation. 0 means no optical
/// LST of any kind for that day.
pub fn classify(
    terra_day: &MaskedGrid,
    terra_night: &MaskedGrid,
    aqua_day: &MaskedGrid,
    aqua_night: &MaskedGrid,
) -> GemResult<Array2<u8>> {
    let dim = terra_day.dim();
    for (name, grid) in [
        ("terra_night", terra_night),
        ("aqua_day", aqua_day),
        ("aqua_night", aqua_night),
    ] {
        if grid.dim() != dim {
            return Err(GemError::ShapeMismatch(format!(
                "terra_day {:?} vs {} {:?}",
                dim,
                name,
                grid.dim()
            )));
        }
    }

    let mut pattern = Array2::zeros(dim);
    for ((r, c), p) in pattern.indexed_iter_mut() {
        *p = (terra_day.valid[[r, c]] as u8) * ModisPass::TerraDay.bit_weight()
            + (terra_night.valid[[r, c]] as u8) * ModisPass::TerraNight.bit_weight()
            + (aqua_day.valid[[r, c]] as u8) * ModisPass::AquaDay.bit_weight()
            + (aqua_night.valid[[r, c]] as u8) * ModisPass::AquaNight.bit_weight();
    }
    Ok(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn presence_grid(present: bool) -> MaskedGrid {
        MaskedGrid::new(array![[0.0]], array![[present]]).unwrap()
    }

    #[test]
    fn test_classify_is_a_bijection_on_presence_tuples() {
        for code in 0u8..16 {
            let pattern = classify(
                &presence_grid(code & 8 != 0),
                &presence_grid(code & 4 != 0),
                &presence_grid(code & 2 != 0),
                &presence_grid(code & 1 != 0),
            )
            .unwrap();
            assert_eq!(pattern[[0, 0]], code);
        }
    }

    #[test]
    fn test_classify_corner_cases() {
        let present = presence_grid(true);
        let absent = presence_grid(false);
        assert_eq!(
            classify(&present, &absent, &absent, &absent).unwrap()[[0, 0]],
            8
        );
        assert_eq!(
            classify(&absent, &absent, &absent, &present).unwrap()[[0, 0]],
            1
        );
        assert_eq!(
            classify(&present, &present, &present, &present).unwrap()[[0, 0]],
            15
        );
        assert_eq!(
            classify(&absent, &absent, &absent, &absent).unwrap()[[0, 0]],
            0
        );
    }

    #[test]
    fn test_classify_shape_mismatch() {
        let a = MaskedGrid::fully_masked((1, 1));
        let b = MaskedGrid::fully_masked((2, 1));
        assert!(classify(&a, &a, &a, &b).is_err());
    }
}
