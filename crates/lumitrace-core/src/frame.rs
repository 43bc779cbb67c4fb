use std::fmt;

use ndarray::Array2;

use crate::error::{LumitraceError, Result};

/// A stack of grayscale frames sharing one spatial grid.
///
/// Pixel values are stored as `u16` regardless of source bit depth; 8-bit
/// input is widened without rescaling so sums stay comparable to the raw
/// counts.
#[derive(Clone, Debug)]
pub struct Stack {
    frames: Vec<Array2<u16>>,
    bit_depth: u8,
}

impl Stack {
    /// Build a stack from decoded frames. Every frame must share the
    /// dimensions of the first one.
    pub fn new(frames: Vec<Array2<u16>>, bit_depth: u8) -> Result<Self> {
        let first = frames.first().ok_or(LumitraceError::EmptyStack)?;
        let (height, width) = first.dim();
        for frame in &frames[1..] {
            let (h, w) = frame.dim();
            if (h, w) != (height, width) {
                return Err(LumitraceError::ShapeMismatch {
                    expected_width: width,
                    expected_height: height,
                    actual_width: w,
                    actual_height: h,
                });
            }
        }
        Ok(Stack { frames, bit_depth })
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Spatial dimensions as (height, width).
    pub fn dims(&self) -> (usize, usize) {
        self.frames[0].dim()
    }

    pub fn height(&self) -> usize {
        self.dims().0
    }

    pub fn width(&self) -> usize {
        self.dims().1
    }

    /// Bit depth of the source data (8 or 16).
    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    pub fn frames(&self) -> &[Array2<u16>] {
        &self.frames
    }
}

/// Shape metadata read from a stack file without decoding pixel data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackInfo {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub frames: usize,
}

/// A square region of interest in frame coordinates.
///
/// The origin can go negative when a blob sits near the frame edge; callers
/// run `validate` before reading pixels, and placements that leave the frame
/// are rejected rather than clamped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Roi {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    /// Check that the rectangle lies fully inside a `frame_height` x
    /// `frame_width` frame.
    pub fn validate(&self, frame_height: usize, frame_width: usize) -> Result<()> {
        let right = self.x as i64 + self.width as i64;
        let bottom = self.y as i64 + self.height as i64;
        if self.x < 0 || self.y < 0 || right > frame_width as i64 || bottom > frame_height as i64 {
            return Err(LumitraceError::RoiOutOfBounds {
                roi: *self,
                width: frame_width,
                height: frame_height,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} at ({}, {})", self.width, self.height, self.x, self.y)
    }
}
