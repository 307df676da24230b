use ndarray::{Array2, Zip};

use super::constants::*;
use crate::constants::{is_nodata, NODATAVAL};
use crate::modules::functions::{c_to_f, f_to_c, snap_nodata, TemperatureUnit};

// NOAA Heat Index [°F]
// From https://www.wpc.ncep.noaa.gov/html/heatindex_equation.shtml
pub fn heat_index_f(
    temp_f: f32, // air temperature [°F]
    rh: f32,     // relative humidity [%]
) -> f32 {
    // Steadman simple form, averaged with the temperature to pick the regime
    let simple = 0.5 * (temp_f + 61.0 + (temp_f - 68.0) * 1.2 + rh * 0.094);
    if (simple + temp_f) / 2.0 < ROTHFUSZ_MIN_F {
        return simple;
    }

    let t = temp_f;
    let mut hi = C1
        + C2 * t
        + C3 * rh
        + C4 * t * rh
        + C5 * t * t
        + C6 * rh * rh
        + C7 * t * t * rh
        + C8 * t * rh * rh
        + C9 * t * t * rh * rh;

    if rh < 13.0 && (80.0..=112.0).contains(&t) {
        hi -= ((13.0 - rh) / 4.0) * ((17.0 - (t - 95.0).abs()) / 17.0).sqrt();
    } else if rh > 85.0 && (80.0..=87.0).contains(&t) {
        hi += ((rh - 85.0) / 10.0) * ((87.0 - t) / 5.0);
    }
    hi
}

/// Heat index of a single cell; a sentinel in either input gives the sentinel
pub fn heat_index(
    temp: f32, // air temperature [unit_in]
    rh: f32,   // relative humidity [%]
    unit_in: TemperatureUnit,
    unit_out: TemperatureUnit,
) -> f32 {
    if is_nodata(temp) || is_nodata(rh) {
        return NODATAVAL;
    }
    let temp_f = match unit_in {
        TemperatureUnit::Celsius => c_to_f(temp),
        TemperatureUnit::Fahrenheit => temp,
    };
    let hi_f = heat_index_f(temp_f, rh);
    let hi = match unit_out {
        TemperatureUnit::Celsius => f_to_c(hi_f),
        TemperatureUnit::Fahrenheit => hi_f,
    };
    snap_nodata(hi)
}

/// Cell-wise heat index of two grids sharing the same shape
pub fn heatindex(
    tmax: &Array2<f32>,
    rh: &Array2<f32>,
    unit_in: TemperatureUnit,
    unit_out: TemperatureUnit,
) -> Array2<f32> {
    let mut hi = Array2::from_elem(tmax.raw_dim(), NODATAVAL);
    Zip::from(&mut hi)
        .and(tmax)
        .and(rh)
        .par_for_each(|hi, &t, &h| *hi = heat_index(t, h, unit_in, unit_out));
    hi
}
