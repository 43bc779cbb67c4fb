use ndarray::{Array2, Zip};
use rayon::prelude::*;
use tracing::debug;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{LumitraceError, Result};
use crate::frame::Stack;

/// Per-pixel subtraction reference, either a median over dark frames or an
/// acquired background exposure.
#[derive(Clone, Debug)]
pub struct DarkImage {
    data: Array2<f32>,
}

impl DarkImage {
    /// Build a dark image as the per-pixel median over the first `num_frames`
    /// frames of `reference`.
    ///
    /// Uses `select_nth_unstable` for O(n) medians without a full sort and
    /// parallelizes at the row level for large frames.
    pub fn median_of_leading(reference: &Stack, num_frames: usize) -> Result<Self> {
        if num_frames == 0 {
            return Err(LumitraceError::Config(
                "dark frame count must be at least 1".into(),
            ));
        }
        if reference.len() < num_frames {
            return Err(LumitraceError::InsufficientFrames {
                requested: num_frames,
                available: reference.len(),
            });
        }

        let (h, w) = reference.dims();
        let frames = &reference.frames()[..num_frames];
        let n = num_frames;

        let data = if h * w >= PARALLEL_PIXEL_THRESHOLD && n > 1 {
            // Row-parallel: each row allocates its own pixel_values
            let rows: Vec<Vec<f32>> = (0..h)
                .into_par_iter()
                .map(|row| {
                    let mut pixel_values = vec![0.0f32; n];
                    let mut row_result = vec![0.0f32; w];
                    for (col, result) in row_result.iter_mut().enumerate() {
                        for (i, frame) in frames.iter().enumerate() {
                            pixel_values[i] = f32::from(frame[[row, col]]);
                        }
                        *result = compute_median(&mut pixel_values, n);
                    }
                    row_result
                })
                .collect();

            let mut data = Array2::<f32>::zeros((h, w));
            for (row, row_data) in rows.into_iter().enumerate() {
                for (col, val) in row_data.into_iter().enumerate() {
                    data[[row, col]] = val;
                }
            }
            data
        } else {
            let mut data = Array2::<f32>::zeros((h, w));
            let mut pixel_values = vec![0.0f32; n];
            for row in 0..h {
                for col in 0..w {
                    for (i, frame) in frames.iter().enumerate() {
                        pixel_values[i] = f32::from(frame[[row, col]]);
                    }
                    data[[row, col]] = compute_median(&mut pixel_values, n);
                }
            }
            data
        };

        debug!(frames = n, height = h, width = w, "built dark image");
        Ok(DarkImage { data })
    }

    /// Wrap an already-corrected reference image, e.g. a background exposure
    /// or a dark image loaded from disk.
    pub fn from_image(data: Array2<f32>) -> Self {
        DarkImage { data }
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    /// Spatial dimensions as (height, width).
    pub fn dims(&self) -> (usize, usize) {
        self.data.dim()
    }
}

fn compute_median(pixel_values: &mut [f32], n: usize) -> f32 {
    if n == 1 {
        pixel_values[0]
    } else if n % 2 == 1 {
        let mid = n / 2;
        *pixel_values
            .select_nth_unstable_by(mid, |a, b| a.total_cmp(b))
            .1
    } else {
        let mid = n / 2;
        pixel_values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        pixel_values[..mid].select_nth_unstable_by(mid - 1, |a, b| a.total_cmp(b));
        (pixel_values[mid - 1] + pixel_values[mid]) / 2.0
    }
}

/// Subtract `reference` from every frame of `raw`, clamping at zero.
///
/// Pure function of its inputs: running it twice on the same stack yields
/// identical output.
pub fn subtract_reference(raw: &Stack, reference: &DarkImage) -> Result<Stack> {
    let (h, w) = raw.dims();
    if (h, w) != reference.dims() {
        let (rh, rw) = reference.dims();
        return Err(LumitraceError::ShapeMismatch {
            expected_width: rw,
            expected_height: rh,
            actual_width: w,
            actual_height: h,
        });
    }

    let corrected: Vec<Array2<u16>> = raw
        .frames()
        .iter()
        .map(|frame| {
            let mut out = Array2::<u16>::zeros((h, w));
            Zip::from(&mut out)
                .and(frame)
                .and(reference.data())
                .for_each(|out, &raw, &dark| {
                    let value = f32::from(raw) - dark;
                    *out = if value > 0.0 { value.round() as u16 } else { 0 };
                });
            out
        })
        .collect();

    Stack::new(corrected, raw.bit_depth())
}
