use super::functions::{merge_mask_any_day, merge_mask_last_day};
use crate::models::config::NodataPolicy;

/// configuration structure for the counter
/// selects how the daily no-data masks are merged
#[derive(Debug, Clone, Copy)]
pub struct CountModelConfig {
    pub policy: NodataPolicy,
    merge_mask_fn: fn(bool, bool) -> bool,
}

impl CountModelConfig {
    pub fn new(policy: NodataPolicy) -> Self {
        let merge_mask_fn: fn(bool, bool) -> bool = match policy {
            NodataPolicy::AnyDay => merge_mask_any_day,
            NodataPolicy::LastDay => merge_mask_last_day,
        };
        CountModelConfig {
            policy,
            merge_mask_fn,
        }
    }

    pub fn merge_mask(&self, masked: bool, missing_today: bool) -> bool {
        (self.merge_mask_fn)(masked, missing_today)
    }
}
