use ndarray::Array2;
use tempfile::NamedTempFile;
use tiff::encoder::{colortype, TiffEncoder};

use lumitrace_core::frame::Stack;

/// Write frames as a multi-page 16-bit grayscale TIFF.
///
/// The file stays alive as long as the returned `NamedTempFile` is not dropped.
pub fn write_gray16_tiff(frames: &[Array2<u16>]) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("create temp file");
    let mut encoder = TiffEncoder::new(tmp.as_file_mut()).expect("tiff encoder");
    for frame in frames {
        let (h, w) = frame.dim();
        let data: Vec<u16> = frame.iter().copied().collect();
        encoder
            .write_image::<colortype::Gray16>(w as u32, h as u32, &data)
            .expect("write page");
    }
    tmp
}

/// Write frames as a multi-page 8-bit grayscale TIFF.
pub fn write_gray8_tiff(frames: &[Array2<u8>]) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("create temp file");
    let mut encoder = TiffEncoder::new(tmp.as_file_mut()).expect("tiff encoder");
    for frame in frames {
        let (h, w) = frame.dim();
        let data: Vec<u8> = frame.iter().copied().collect();
        encoder
            .write_image::<colortype::Gray8>(w as u32, h as u32, &data)
            .expect("write page");
    }
    tmp
}

/// Frame filled with a single value.
pub fn flat_frame(height: usize, width: usize, value: u16) -> Array2<u16> {
    Array2::from_elem((height, width), value)
}

/// Frame with a bright square on a flat background. The square spans `side`
/// pixels starting at (x0, y0).
pub fn square_frame(
    height: usize,
    width: usize,
    background: u16,
    value: u16,
    x0: usize,
    y0: usize,
    side: usize,
) -> Array2<u16> {
    let mut frame = Array2::from_elem((height, width), background);
    for y in y0..y0 + side {
        for x in x0..x0 + side {
            frame[[y, x]] = value;
        }
    }
    frame
}

/// Stack of identical flat frames.
pub fn flat_stack(height: usize, width: usize, num_frames: usize, value: u16) -> Stack {
    let frames = vec![flat_frame(height, width, value); num_frames];
    Stack::new(frames, 16).expect("build stack")
}

/// Stack of identical bright-square frames.
pub fn square_stack(
    height: usize,
    width: usize,
    num_frames: usize,
    background: u16,
    value: u16,
    x0: usize,
    y0: usize,
    side: usize,
) -> Stack {
    let frames = vec![square_frame(height, width, background, value, x0, y0, side); num_frames];
    Stack::new(frames, 16).expect("build stack")
}
