pub mod constants;
pub mod error;
pub mod io;
pub mod models;
pub mod modules;
pub mod parallel;
pub mod stages;
