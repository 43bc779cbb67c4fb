use ndarray::Array2;

use crate::frame::Stack;

/// Map spatial coordinates to a row index in the feature matrix.
///
/// Row-major: all pixels of image row 0 first, then row 1, and so on. This is
/// the single flattening convention for the whole pipeline; [`pixel_coords`]
/// is its inverse.
pub fn pixel_index(x: usize, y: usize, width: usize) -> usize {
    y * width + x
}

/// Map a feature-matrix row index back to spatial (x, y).
pub fn pixel_coords(index: usize, width: usize) -> (usize, usize) {
    (index % width, index / width)
}

/// Per-pixel temporal traces: one row per pixel, one column per frame.
#[derive(Clone, Debug)]
pub struct FeatureMatrix {
    data: Array2<f64>,
    height: usize,
    width: usize,
}

impl FeatureMatrix {
    /// Flatten a corrected stack into pixel traces.
    pub fn from_stack(stack: &Stack) -> Self {
        let (height, width) = stack.dims();
        let num_frames = stack.len();
        let mut data = Array2::<f64>::zeros((height * width, num_frames));

        for (t, frame) in stack.frames().iter().enumerate() {
            for y in 0..height {
                for x in 0..width {
                    data[[pixel_index(x, y, width), t]] = f64::from(frame[[y, x]]);
                }
            }
        }

        FeatureMatrix {
            data,
            height,
            width,
        }
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn num_pixels(&self) -> usize {
        self.data.nrows()
    }

    pub fn num_frames(&self) -> usize {
        self.data.ncols()
    }

    /// Spatial dimensions as (height, width) of the source frames.
    pub fn spatial_dims(&self) -> (usize, usize) {
        (self.height, self.width)
    }
}
