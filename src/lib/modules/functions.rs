use ndarray::{Array2, Zip};
use strum_macros::{Display, EnumString};

use crate::constants::{is_nodata, NODATAVAL, NODATA_GUARD};

/// Temperature unit accepted and produced by the index functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum TemperatureUnit {
    #[strum(serialize = "C")]
    Celsius,
    #[strum(serialize = "F")]
    Fahrenheit,
}

pub fn c_to_f(temp_c: f32) -> f32 {
    temp_c * 9.0 / 5.0 + 32.0
}

pub fn f_to_c(temp_f: f32) -> f32 {
    (temp_f - 32.0) * 5.0 / 9.0
}

/// Convert a temperature grid from Celsius to Fahrenheit, keeping sentinel cells
pub fn grid_c_to_f(grid: &Array2<f32>) -> Array2<f32> {
    grid.mapv(|t| if is_nodata(t) { NODATAVAL } else { c_to_f(t) })
}

/// Values below the guard, or non-finite, collapse to exactly the sentinel
#[inline]
pub fn snap_nodata(value: f32) -> f32 {
    if !value.is_finite() || value < NODATA_GUARD {
        NODATAVAL
    } else {
        value
    }
}

pub fn snap_nodata_inplace(grid: &mut Array2<f32>) {
    Zip::from(grid).par_for_each(|v| *v = snap_nodata(*v));
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::str::FromStr;

    #[test]
    fn unit_conversions() {
        assert_eq!(c_to_f(100.0), 212.0);
        assert_eq!(c_to_f(-40.0), -40.0);
        assert!((f_to_c(c_to_f(31.3)) - 31.3).abs() < 1e-5);
    }

    #[test]
    fn snap_collapses_artifacts() {
        let mut grid = array![[-1000.5, -999.0], [f32::NAN, f32::INFINITY]];
        snap_nodata_inplace(&mut grid);
        assert_eq!(grid, array![[NODATAVAL, -999.0], [NODATAVAL, NODATAVAL]]);
    }

    #[test]
    fn grid_conversion_keeps_sentinel() {
        let grid = array![[0.0, NODATAVAL]];
        assert_eq!(grid_c_to_f(&grid), array![[32.0, NODATAVAL]]);
    }

    #[test]
    fn unit_names() {
        assert_eq!(TemperatureUnit::from_str("C").unwrap(), TemperatureUnit::Celsius);
        assert_eq!(TemperatureUnit::Fahrenheit.to_string(), "F");
    }
}
