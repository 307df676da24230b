use std::fmt::Debug;
use std::path::Path;

use ndarray::Array2;
use strum_macros::{Display, EnumString};

use crate::error::{HeatStressError, Result};

/// On-disk sample type of a single-band raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum DataType {
    Float32,
    Int16,
}

/// Cell types a [`Grid`] can hold
pub trait RasterElement: Copy + Send + Sync + PartialEq + Debug + 'static {
    const DATA_TYPE: DataType;

    fn from_f64(value: f64) -> Self;
    fn to_f64(self) -> f64;
}

impl RasterElement for f32 {
    const DATA_TYPE: DataType = DataType::Float32;

    fn from_f64(value: f64) -> Self {
        value as f32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl RasterElement for i16 {
    const DATA_TYPE: DataType = DataType::Int16;

    // saturating: counts never leave [-9999, 366]
    fn from_f64(value: f64) -> Self {
        value.round() as i16
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

/// North-up affine transform: origin is the upper-left corner of cell (0, 0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    /// negative for north-up rasters
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// GDAL ordering: [origin_x, pixel_width, 0, origin_y, 0, pixel_height]
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            0.0,
            self.origin_y,
            0.0,
            self.pixel_height,
        ]
    }

    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self::new(gt[0], gt[3], gt[1], gt[5])
    }
}

/// Georeferencing carried alongside the cell values
#[derive(Debug, Clone, PartialEq)]
pub struct GridMeta {
    pub transform: GeoTransform,
    /// EPSG code of the coordinate reference system, when declared
    pub epsg: Option<u16>,
    pub nodata: Option<f64>,
}

impl GridMeta {
    pub fn new(transform: GeoTransform, epsg: Option<u16>, nodata: Option<f64>) -> Self {
        Self {
            transform,
            epsg,
            nodata,
        }
    }

    pub fn with_nodata(&self, nodata: f64) -> Self {
        Self {
            nodata: Some(nodata),
            ..self.clone()
        }
    }
}

/// Single-band 2-D raster
#[derive(Debug, Clone)]
pub struct Grid<T: RasterElement> {
    pub data: Array2<T>,
    pub meta: GridMeta,
}

impl<T: RasterElement> Grid<T> {
    pub fn new(data: Array2<T>, meta: GridMeta) -> Self {
        Self { data, meta }
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn nodata(&self) -> Option<f64> {
        self.meta.nodata
    }

    /// Overrides whatever no-data value the source declared
    pub fn stamp_nodata(&mut self, nodata: f64) {
        self.meta.nodata = Some(nodata);
    }

    pub fn map<U: RasterElement>(&self, f: impl Fn(T) -> U) -> Grid<U> {
        Grid {
            data: self.data.mapv(f),
            meta: self.meta.clone(),
        }
    }
}

/// Fails with a metadata error when `got` does not have the `expected` shape
pub fn ensure_shape(path: &Path, expected: (usize, usize), got: (usize, usize)) -> Result<()> {
    if expected != got {
        return Err(HeatStressError::metadata(
            path,
            format!(
                "grid shape {}x{} does not match expected {}x{}",
                got.0, got.1, expected.0, expected.1
            ),
        ));
    }
    Ok(())
}
