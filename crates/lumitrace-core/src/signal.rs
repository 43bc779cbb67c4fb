use ndarray::s;

use crate::error::Result;
use crate::frame::{Roi, Stack};

/// Sum the pixel intensities inside `roi` for every frame of `stack`.
///
/// The ROI is validated against the frame dimensions first; a rectangle that
/// leaves the frame is an error, never clamped. Sums are `u64`, which cannot
/// overflow for any plausible frame size at 16 bits per pixel.
pub fn extract_signal(stack: &Stack, roi: &Roi) -> Result<Vec<u64>> {
    let (height, width) = stack.dims();
    roi.validate(height, width)?;

    let x = roi.x as usize;
    let y = roi.y as usize;
    let w = roi.width as usize;
    let h = roi.height as usize;

    let series = stack
        .frames()
        .iter()
        .map(|frame| {
            frame
                .slice(s![y..y + h, x..x + w])
                .iter()
                .map(|&v| u64::from(v))
                .sum()
        })
        .collect();
    Ok(series)
}
