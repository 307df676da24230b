/// NOAA Heat Index
/// Source: https://www.wpc.ncep.noaa.gov/html/heatindex_equation.shtml
pub mod constants;
pub mod functions;
