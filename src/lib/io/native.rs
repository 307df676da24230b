//! GeoTIFF reading/writing on top of the `tiff` crate.
//!
//! Georeferencing is kept in the ModelPixelScale / ModelTiepoint tags, the CRS as an
//! EPSG code in the GeoKeyDirectory and the no-data value in the GDAL_NODATA tag, so
//! the files open with the right metadata in GDAL-based tools.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use ndarray::Array2;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;
use tiff::TiffResult;

use crate::error::{HeatStressError, Result};
use crate::models::grid::{DataType, GeoTransform, Grid, GridMeta, RasterElement};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

// the decoder files GeoTIFF/GDAL ids under their named variants
fn geotag(id: u16) -> Tag {
    Tag::from_u16_exhaustive(id)
}

/// Read band 1 of a GeoTIFF
pub fn read_grid<T: RasterElement>(path: &Path) -> Result<Grid<T>> {
    let file = File::open(path).map_err(|err| HeatStressError::io(path, err))?;
    decode_grid(BufReader::new(file), path)
}

/// Write a single-band GeoTIFF with the grid's sample type
pub fn write_grid<T: RasterElement>(path: &Path, grid: &Grid<T>) -> Result<()> {
    let file = File::create(path).map_err(|err| HeatStressError::io(path, err))?;
    let mut writer = BufWriter::new(file);
    encode_grid(&mut writer, grid).map_err(|err| HeatStressError::raster(path, err))?;
    writer.flush().map_err(|err| HeatStressError::io(path, err))
}

fn cast_all<S, T: RasterElement>(buf: Vec<S>, to_f64: impl Fn(S) -> f64) -> Vec<T> {
    buf.into_iter().map(|v| T::from_f64(to_f64(v))).collect()
}

fn decode_grid<T, R>(reader: R, path: &Path) -> Result<Grid<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader).map_err(|err| HeatStressError::raster(path, err))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|err| HeatStressError::raster(path, err))?;
    let (rows, cols) = (height as usize, width as usize);

    let image = decoder
        .read_image()
        .map_err(|err| HeatStressError::raster(path, err))?;
    let values: Vec<T> = match image {
        DecodingResult::F32(buf) => cast_all(buf, f64::from),
        DecodingResult::F64(buf) => cast_all(buf, |v| v),
        DecodingResult::I16(buf) => cast_all(buf, f64::from),
        DecodingResult::I32(buf) => cast_all(buf, f64::from),
        DecodingResult::U16(buf) => cast_all(buf, f64::from),
        DecodingResult::U8(buf) => cast_all(buf, f64::from),
        DecodingResult::I8(buf) => cast_all(buf, f64::from),
        _ => return Err(HeatStressError::raster(path, "unsupported pixel format")),
    };

    let data = Array2::from_shape_vec((rows, cols), values)
        .map_err(|err| HeatStressError::raster(path, err))?;

    let transform = read_transform(&mut decoder).ok_or_else(|| {
        HeatStressError::metadata(path, "missing ModelPixelScale/ModelTiepoint tags")
    })?;
    let epsg = read_epsg(&mut decoder);
    let nodata = read_nodata(&mut decoder);

    Ok(Grid::new(data, GridMeta::new(transform, epsg, nodata)))
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(geotag(MODEL_PIXEL_SCALE))
        .ok()?;
    let tiepoint = decoder.get_tag_f64_vec(geotag(MODEL_TIEPOINT)).ok()?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }
    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    Some(GeoTransform::new(
        tiepoint[3] - tiepoint[0] * scale[0],
        tiepoint[4] + tiepoint[1] * scale[1],
        scale[0],
        -scale[1],
    ))
}

fn read_epsg<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<u16> {
    let keys = decoder
        .get_tag_u16_vec(geotag(GEO_KEY_DIRECTORY))
        .ok()?;
    // header [version, revision, minor, count] then [key, location, count, value]
    keys.chunks_exact(4)
        .skip(1)
        .find(|entry| {
            (entry[0] == GEOGRAPHIC_TYPE || entry[0] == PROJECTED_CS_TYPE) && entry[1] == 0
        })
        .map(|entry| entry[3])
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let text = decoder
        .get_tag_ascii_string(geotag(GDAL_NODATA))
        .ok()?;
    text.trim_matches(char::from(0)).trim().parse::<f64>().ok()
}

fn geo_keys(epsg: Option<u16>) -> Vec<u16> {
    // EPSG 4000-4999 are geographic 2D systems
    let (model_type, crs_key) = match epsg {
        Some(code) if (4000..5000).contains(&code) => (MODEL_TYPE_GEOGRAPHIC, Some((GEOGRAPHIC_TYPE, code))),
        Some(code) => (MODEL_TYPE_PROJECTED, Some((PROJECTED_CS_TYPE, code))),
        None => (MODEL_TYPE_GEOGRAPHIC, None),
    };

    let mut entries = vec![
        [GT_MODEL_TYPE, 0, 1, model_type],
        [GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA],
    ];
    if let Some((key, code)) = crs_key {
        entries.push([key, 0, 1, code]);
    }

    let mut keys = vec![1, 1, 0, entries.len() as u16];
    keys.extend(entries.into_iter().flatten());
    keys
}

fn encode_grid<T, W>(writer: W, grid: &Grid<T>) -> TiffResult<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer)?;
    let (rows, cols) = grid.shape();

    match T::DATA_TYPE {
        DataType::Float32 => {
            let data: Vec<f32> = grid.data.iter().map(|v| v.to_f64() as f32).collect();
            encode_image::<colortype::Gray32Float, _>(&mut encoder, rows, cols, &grid.meta, &data)
        }
        DataType::Int16 => {
            let data: Vec<i16> = grid.data.iter().map(|v| v.to_f64() as i16).collect();
            encode_image::<colortype::GrayI16, _>(&mut encoder, rows, cols, &grid.meta, &data)
        }
    }
}

fn encode_image<C, W>(
    encoder: &mut TiffEncoder<W>,
    rows: usize,
    cols: usize,
    meta: &GridMeta,
    data: &[C::Inner],
) -> TiffResult<()>
where
    C: ColorType,
    [C::Inner]: TiffValue,
    W: Write + Seek,
{
    let mut image = encoder.new_image::<C>(cols as u32, rows as u32)?;

    let gt = &meta.transform;
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(geotag(MODEL_PIXEL_SCALE), &scale[..])?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(geotag(MODEL_TIEPOINT), &tiepoint[..])?;

    let keys = geo_keys(meta.epsg);
    image
        .encoder()
        .write_tag(geotag(GEO_KEY_DIRECTORY), keys.as_slice())?;

    if let Some(nodata) = meta.nodata {
        let text = format!("{nodata}");
        image
            .encoder()
            .write_tag(geotag(GDAL_NODATA), text.as_str())?;
    }

    image.write_data(data)
}
