/// Multi-year mean of annual exceedance counts
pub mod models;
