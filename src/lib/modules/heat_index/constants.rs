// Rothfusz regression coefficients (NOAA), temperature in °F and RH in %
pub const C1: f32 = -42.379;
pub const C2: f32 = 2.04901523;
pub const C3: f32 = 10.14333127;
pub const C4: f32 = -0.22475541;
pub const C5: f32 = -0.00683783;
pub const C6: f32 = -0.05481717;
pub const C7: f32 = 0.00122874;
pub const C8: f32 = 0.00085282;
pub const C9: f32 = -0.00000199;

/// below this (°F, averaged with T) the simple Steadman form is used
pub const ROTHFUSZ_MIN_F: f32 = 80.0;
