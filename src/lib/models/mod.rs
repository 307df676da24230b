pub mod config;
pub mod grid;
