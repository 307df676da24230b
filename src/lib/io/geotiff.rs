//! GeoTIFF reading/writing through GDAL, enabled with the `gdal` feature

use std::path::Path;

use gdal::raster::{Buffer, GdalType, RasterCreationOption};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use ndarray::Array2;

use crate::error::{HeatStressError, Result};
use crate::models::grid::{DataType, GeoTransform, Grid, GridMeta, RasterElement};

pub fn read_grid<T: RasterElement>(path: &Path) -> Result<Grid<T>> {
    let gdal_err = |err: gdal::errors::GdalError| HeatStressError::raster(path, err);

    let dataset = Dataset::open(path).map_err(gdal_err)?;
    let (cols, rows) = dataset.raster_size();
    let band = dataset.rasterband(1).map_err(gdal_err)?;

    let buffer = band
        .read_as::<f64>((0, 0), (cols, rows), (cols, rows), None)
        .map_err(gdal_err)?;
    let values: Vec<T> = buffer.data().iter().map(|&v| T::from_f64(v)).collect();
    let data = Array2::from_shape_vec((rows, cols), values)
        .map_err(|err| HeatStressError::raster(path, err))?;

    let transform = dataset
        .geo_transform()
        .map_err(|_| HeatStressError::metadata(path, "missing geotransform"))?;
    let epsg = dataset
        .spatial_ref()
        .ok()
        .and_then(|srs| srs.auth_code().ok())
        .and_then(|code| u16::try_from(code).ok());

    let meta = GridMeta::new(GeoTransform::from_gdal(transform), epsg, band.no_data_value());
    Ok(Grid::new(data, meta))
}

pub fn write_grid<T: RasterElement>(path: &Path, grid: &Grid<T>) -> Result<()> {
    match T::DATA_TYPE {
        DataType::Float32 => {
            let data: Vec<f32> = grid.data.iter().map(|v| v.to_f64() as f32).collect();
            write_band(path, grid.shape(), &grid.meta, data)
        }
        DataType::Int16 => {
            let data: Vec<i16> = grid.data.iter().map(|v| v.to_f64() as i16).collect();
            write_band(path, grid.shape(), &grid.meta, data)
        }
    }
    .map_err(|err| HeatStressError::raster(path, err))
}

fn write_band<V: GdalType + Copy>(
    path: &Path,
    (rows, cols): (usize, usize),
    meta: &GridMeta,
    data: Vec<V>,
) -> std::result::Result<(), gdal::errors::GdalError> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;

    let options = vec![
        RasterCreationOption {
            key: "COMPRESS",
            value: "LZW",
        },
        RasterCreationOption {
            key: "PROFILE",
            value: "GDALGeoTIFF",
        },
    ];
    let mut dataset = driver.create_with_band_type_with_options::<V, _>(
        path,
        cols as isize,
        rows as isize,
        1,
        &options,
    )?;

    dataset.set_geo_transform(&meta.transform.to_gdal())?;
    if let Some(code) = meta.epsg {
        dataset.set_spatial_ref(&SpatialRef::from_epsg(code as u32)?)?;
    }

    let mut band = dataset.rasterband(1)?;
    band.set_no_data_value(meta.nodata)?;

    let size = (cols, rows);
    let buffer = Buffer::new(size, data);
    band.write((0, 0), size, &buffer)?;

    Ok(())
}
