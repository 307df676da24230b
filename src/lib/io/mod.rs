//! Raster and file-tree I/O

pub mod files;

#[cfg(feature = "gdal")]
mod geotiff;
mod native;

#[cfg(feature = "gdal")]
pub use geotiff::{read_grid, write_grid};

#[cfg(not(feature = "gdal"))]
pub use native::{read_grid, write_grid};
