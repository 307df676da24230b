use ndarray::{Array2, Zip};

use crate::constants::{is_nodata, NODATAVAL};

/// Running per-cell mean over annual grids, sentinel cells excluded
#[derive(Debug)]
pub struct MeanState {
    sum: Array2<f64>,
    valid: Array2<u32>,
    layers: usize,
}

impl MeanState {
    pub fn new(shape: (usize, usize)) -> Self {
        MeanState {
            sum: Array2::zeros(shape),
            valid: Array2::zeros(shape),
            layers: 0,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.sum.dim()
    }

    pub fn layers(&self) -> usize {
        self.layers
    }

    /// Add one layer; `layer` must have the state's shape
    pub fn update(&mut self, layer: &Array2<f32>) {
        Zip::from(&mut self.sum)
            .and(&mut self.valid)
            .and(layer)
            .par_for_each(|sum, valid, &value| {
                if !is_nodata(value) {
                    *sum += value as f64;
                    *valid += 1;
                }
            });
        self.layers += 1;
    }

    /// Mean of the valid layers; sentinel where no layer was valid
    pub fn output(&self) -> Array2<f32> {
        let mut out = Array2::from_elem(self.shape(), NODATAVAL);
        Zip::from(&mut out)
            .and(&self.sum)
            .and(&self.valid)
            .par_for_each(|out, &sum, &valid| {
                if valid > 0 {
                    *out = (sum / valid as f64) as f32;
                }
            });
        out
    }
}
