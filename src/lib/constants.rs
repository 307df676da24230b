/// No-data sentinel written to every derived grid
pub const NODATAVAL: f32 = -9999.0;

/// Any derived value below this is treated as an overflow/sentinel artifact
pub const NODATA_GUARD: f32 = -1000.0;

/// Extension of every raster handled by the pipeline
pub const RASTER_EXT: &str = ".tif";

/// Returns true when the value must be treated as missing
#[inline]
pub fn is_nodata(value: f32) -> bool {
    !value.is_finite() || value <= (NODATAVAL + 1.0)
}
