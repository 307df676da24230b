use crate::constants::{is_nodata, NODATAVAL};

/// Revalue NaN / inf to the sentinel, as the daily rasters may carry either
#[inline]
pub fn clean_value(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        NODATAVAL
    }
}

/// 1 if the value strictly exceeds the threshold, else 0
#[inline]
pub fn exceedance(value: f32, threshold: f32) -> u16 {
    if !is_nodata(value) && value > threshold {
        1
    } else {
        0
    }
}

/// mask OR-merged over all days seen so far
pub fn merge_mask_any_day(masked: bool, missing_today: bool) -> bool {
    masked || missing_today
}

/// mask overwritten by each day, only the last one survives
pub fn merge_mask_last_day(_masked: bool, missing_today: bool) -> bool {
    missing_today
}
