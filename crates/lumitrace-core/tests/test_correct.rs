#[allow(dead_code)]
mod common;

use ndarray::Array2;

use lumitrace_core::correct::{subtract_reference, DarkImage};
use lumitrace_core::error::LumitraceError;
use lumitrace_core::frame::Stack;

fn stack_of_values(height: usize, width: usize, values: &[u16]) -> Stack {
    let frames = values
        .iter()
        .map(|&v| Array2::from_elem((height, width), v))
        .collect();
    Stack::new(frames, 16).unwrap()
}

#[test]
fn median_of_odd_count_is_middle_value() {
    let stack = stack_of_values(4, 4, &[90, 10, 20]);
    let dark = DarkImage::median_of_leading(&stack, 3).unwrap();
    assert_eq!(dark.data()[[0, 0]], 20.0);
    assert_eq!(dark.dims(), (4, 4));
}

#[test]
fn median_of_even_count_averages_middle_pair() {
    let stack = stack_of_values(3, 3, &[100, 10, 30, 20]);
    let dark = DarkImage::median_of_leading(&stack, 4).unwrap();
    assert_eq!(dark.data()[[1, 1]], 25.0);
}

#[test]
fn median_uses_only_leading_frames() {
    // Frames beyond the requested count must not influence the median.
    let stack = stack_of_values(2, 2, &[10, 10, 10, 9000, 9000]);
    let dark = DarkImage::median_of_leading(&stack, 3).unwrap();
    assert_eq!(dark.data()[[0, 0]], 10.0);
}

#[test]
fn median_rejects_short_stack() {
    let stack = stack_of_values(2, 2, &[10, 20, 30]);
    let err = DarkImage::median_of_leading(&stack, 5).unwrap_err();
    match err {
        LumitraceError::InsufficientFrames {
            requested,
            available,
        } => {
            assert_eq!(requested, 5);
            assert_eq!(available, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn median_rejects_zero_frame_request() {
    let stack = stack_of_values(2, 2, &[10]);
    assert!(matches!(
        DarkImage::median_of_leading(&stack, 0),
        Err(LumitraceError::Config(_))
    ));
}

#[test]
fn subtraction_clamps_at_zero() {
    let raw = stack_of_values(3, 3, &[5, 200]);
    let dark = DarkImage::from_image(Array2::from_elem((3, 3), 10.0));

    let corrected = subtract_reference(&raw, &dark).unwrap();
    assert_eq!(corrected.frames()[0][[0, 0]], 0, "5 - 10 must clamp to 0");
    assert_eq!(corrected.frames()[1][[0, 0]], 190);
    assert_eq!(corrected.bit_depth(), 16);
}

#[test]
fn subtraction_rounds_fractional_references() {
    let raw = stack_of_values(2, 2, &[15]);
    let dark = DarkImage::from_image(Array2::from_elem((2, 2), 10.5));

    let corrected = subtract_reference(&raw, &dark).unwrap();
    // 15 - 10.5 = 4.5, rounded half away from zero.
    assert_eq!(corrected.frames()[0][[0, 0]], 5);
}

#[test]
fn subtraction_is_pure() {
    let raw = stack_of_values(4, 4, &[50, 80, 120]);
    let dark = DarkImage::from_image(Array2::from_elem((4, 4), 33.0));

    let first = subtract_reference(&raw, &dark).unwrap();
    let second = subtract_reference(&raw, &dark).unwrap();
    for (a, b) in first.frames().iter().zip(second.frames()) {
        assert_eq!(a, b);
    }
}

#[test]
fn subtraction_rejects_mismatched_shapes() {
    let raw = common::flat_stack(8, 8, 1, 100);
    let dark = DarkImage::from_image(Array2::from_elem((4, 4), 1.0));
    assert!(matches!(
        subtract_reference(&raw, &dark),
        Err(LumitraceError::ShapeMismatch { .. })
    ));
}

#[test]
fn stack_rejects_ragged_frames() {
    let frames = vec![Array2::zeros((4, 4)), Array2::zeros((4, 5))];
    assert!(matches!(
        Stack::new(frames, 16),
        Err(LumitraceError::ShapeMismatch { .. })
    ));
}

#[test]
fn stack_rejects_empty_frame_list() {
    assert!(matches!(
        Stack::new(Vec::new(), 16),
        Err(LumitraceError::EmptyStack)
    ));
}
