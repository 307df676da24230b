/// Annual threshold-exceedance day counts
pub mod config;
pub mod functions;
pub mod models;
