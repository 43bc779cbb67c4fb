use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ndarray::Array2;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::ColorType;
use tracing::debug;

use crate::error::{LumitraceError, Result};
use crate::frame::{Stack, StackInfo};

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(Decoder::new(BufReader::new(file))?)
}

fn gray_bit_depth(color: ColorType) -> Result<u8> {
    match color {
        ColorType::Gray(bits @ (8 | 16 | 32)) => Ok(bits),
        other => Err(LumitraceError::UnsupportedFormat(format!(
            "{other:?} (expected grayscale)"
        ))),
    }
}

/// Read shape metadata by walking the IFD chain without decoding pixel data.
pub fn probe(path: &Path) -> Result<StackInfo> {
    let mut decoder = open_decoder(path)?;
    let (width, height) = decoder.dimensions()?;
    let bit_depth = gray_bit_depth(decoder.colortype()?)?;
    let mut frames = 1usize;
    while decoder.more_images() {
        decoder.next_image()?;
        frames += 1;
    }
    Ok(StackInfo {
        width,
        height,
        bit_depth,
        frames,
    })
}

/// Decode a grayscale stack from a single- or multi-page TIFF.
///
/// With `limit` set, decoding stops after that many pages; fewer pages than
/// the limit is not an error here (the dark-image builder checks counts).
pub fn read_stack(path: &Path, limit: Option<usize>) -> Result<Stack> {
    read_stack_with(path, limit, |_| {})
}

/// Same as [`read_stack`], reporting each decoded frame count to `progress`.
pub fn read_stack_with(
    path: &Path,
    limit: Option<usize>,
    mut progress: impl FnMut(usize),
) -> Result<Stack> {
    let mut decoder = open_decoder(path)?;
    let (width, height) = decoder.dimensions()?;
    let color = decoder.colortype()?;
    let bit_depth = match color {
        ColorType::Gray(8) => 8,
        ColorType::Gray(16) => 16,
        other => {
            return Err(LumitraceError::UnsupportedFormat(format!(
                "{other:?} (expected 8- or 16-bit grayscale)"
            )))
        }
    };

    let max_frames = limit.unwrap_or(usize::MAX);
    let mut frames = Vec::new();
    loop {
        if frames.len() >= max_frames {
            break;
        }
        frames.push(decode_gray_page(&mut decoder, height as usize, width as usize)?);
        progress(frames.len());
        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
        let dims = decoder.dimensions()?;
        if dims != (width, height) {
            return Err(LumitraceError::ShapeMismatch {
                expected_width: width as usize,
                expected_height: height as usize,
                actual_width: dims.0 as usize,
                actual_height: dims.1 as usize,
            });
        }
        if decoder.colortype()? != color {
            return Err(LumitraceError::UnsupportedFormat(
                "mixed color types across pages".into(),
            ));
        }
    }

    debug!(path = %path.display(), frames = frames.len(), "decoded stack");
    Stack::new(frames, bit_depth)
}

fn decode_gray_page(
    decoder: &mut Decoder<BufReader<File>>,
    height: usize,
    width: usize,
) -> Result<Array2<u16>> {
    let pixels: Vec<u16> = match decoder.read_image()? {
        DecodingResult::U8(buf) => buf.into_iter().map(u16::from).collect(),
        DecodingResult::U16(buf) => buf,
        _ => {
            return Err(LumitraceError::UnsupportedFormat(
                "unexpected sample format in grayscale page".into(),
            ))
        }
    };
    Array2::from_shape_vec((height, width), pixels).map_err(|_| {
        LumitraceError::UnsupportedFormat("page buffer does not match its dimensions".into())
    })
}

/// Decode the first page of a grayscale image as `f32`, for use as a
/// subtraction reference. Accepts 8/16-bit integer and 32-bit float samples,
/// the latter so saved dark images round-trip exactly.
pub fn read_reference_image(path: &Path) -> Result<Array2<f32>> {
    let mut decoder = open_decoder(path)?;
    let (width, height) = decoder.dimensions()?;
    gray_bit_depth(decoder.colortype()?)?;
    let pixels: Vec<f32> = match decoder.read_image()? {
        DecodingResult::U8(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::F32(buf) => buf,
        _ => {
            return Err(LumitraceError::UnsupportedFormat(
                "unexpected sample format in grayscale page".into(),
            ))
        }
    };
    Array2::from_shape_vec((height as usize, width as usize), pixels).map_err(|_| {
        LumitraceError::UnsupportedFormat("page buffer does not match its dimensions".into())
    })
}

/// Write a single-page 32-bit float grayscale TIFF. Used for dark images so
/// fractional medians survive the round trip.
pub fn write_image_f32(path: &Path, image: &Array2<f32>) -> Result<()> {
    let (height, width) = image.dim();
    let data: Vec<f32> = image.iter().copied().collect();
    let mut file = File::create(path)?;
    let mut encoder = TiffEncoder::new(&mut file)?;
    encoder.write_image::<colortype::Gray32Float>(width as u32, height as u32, &data)?;
    Ok(())
}
