use ndarray::{Array2, Zip};

use crate::constants::{is_nodata, NODATAVAL};
use crate::modules::functions::snap_nodata;

// Bernard & Iheanacho (2015): WBGT [°C] = -0.0034 HI^2 + 0.96 HI - 34, HI in °F
pub fn hi_to_wbgt(hi_f: f32) -> f32 {
    -0.0034 * hi_f.powi(2) + 0.96 * hi_f - 34.0
}

/// WBGT [°C] grid from a heat index grid already converted to °F
pub fn wbgt_from_hi(hi_f: &Array2<f32>) -> Array2<f32> {
    let mut wbgt = Array2::from_elem(hi_f.raw_dim(), NODATAVAL);
    Zip::from(&mut wbgt).and(hi_f).par_for_each(|w, &hi| {
        if !is_nodata(hi) {
            *w = snap_nodata(hi_to_wbgt(hi));
        }
    });
    wbgt
}
