use ndarray::{Array2, Zip};

use super::{
    config::CountModelConfig,
    functions::{clean_value, exceedance},
};
use crate::constants::{is_nodata, NODATAVAL};

/// Running exceedance count of one year
#[derive(Debug)]
pub struct CountState {
    pub threshold: f32,
    config: CountModelConfig,
    counts: Array2<u16>,
    mask: Array2<bool>,
    days: usize,
}

impl CountState {
    pub fn new(shape: (usize, usize), threshold: f32, config: CountModelConfig) -> Self {
        CountState {
            threshold,
            config,
            counts: Array2::zeros(shape),
            mask: Array2::from_elem(shape, false),
            days: 0,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.counts.dim()
    }

    pub fn days(&self) -> usize {
        self.days
    }

    /// Add one day; `day` must have the state's shape
    pub fn update(&mut self, day: &Array2<f32>) {
        let threshold = self.threshold;
        let config = self.config;
        Zip::from(&mut self.counts)
            .and(&mut self.mask)
            .and(day)
            .par_for_each(|count, masked, &value| {
                let value = clean_value(value);
                *masked = config.merge_mask(*masked, is_nodata(value));
                *count += exceedance(value, threshold);
            });
        self.days += 1;
    }

    /// Counts as `i16`, masked cells set to the sentinel
    pub fn output(&self) -> Array2<i16> {
        let mut out = Array2::<i16>::zeros(self.shape());
        Zip::from(&mut out)
            .and(&self.counts)
            .and(&self.mask)
            .par_for_each(|out, &count, &masked| {
                *out = if masked {
                    NODATAVAL as i16
                } else {
                    count.min(i16::MAX as u16) as i16
                };
            });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::NodataPolicy;
    use ndarray::array;

    fn run(days: &[Array2<f32>], policy: NodataPolicy) -> Array2<i16> {
        let mut state = CountState::new(days[0].dim(), 30.0, CountModelConfig::new(policy));
        for day in days {
            state.update(day);
        }
        assert_eq!(state.days(), days.len());
        state.output()
    }

    fn five_days() -> Vec<Array2<f32>> {
        // cell (0,0) exceeds on days 1, 3, 5; (0,1) never; (1,0) sentinel on day 2; (1,1) always
        vec![
            array![[31.0, 10.0], [35.0, 40.0]],
            array![[29.0, 10.0], [NODATAVAL, 40.0]],
            array![[32.0, 30.0], [35.0, 40.0]],
            array![[20.0, 10.0], [35.0, 40.0]],
            array![[30.5, 10.0], [35.0, 40.0]],
        ]
    }

    #[test]
    fn counts_exceedance_days() {
        let out = run(&five_days(), NodataPolicy::AnyDay);
        assert_eq!(out[[0, 0]], 3);
        assert_eq!(out[[0, 1]], 0);
        assert_eq!(out[[1, 1]], 5);
    }

    #[test]
    fn any_day_nodata_masks_cell() {
        let out = run(&five_days(), NodataPolicy::AnyDay);
        assert_eq!(out[[1, 0]], -9999);
    }

    #[test]
    fn last_day_policy_only_uses_final_mask() {
        let out = run(&five_days(), NodataPolicy::LastDay);
        // sentinel on day 2 is forgotten, the four valid days count
        assert_eq!(out[[1, 0]], 4);

        let mut days = five_days();
        days[4][[0, 1]] = f32::NAN;
        let out = run(&days, NodataPolicy::LastDay);
        assert_eq!(out[[0, 1]], -9999);
    }
}
