#[allow(dead_code)]
mod common;

use ndarray::Array2;

use lumitrace_core::blob::{
    connected_components, detect_blobs, select_roi, touches_border, Blob, BlobConfig,
};
use lumitrace_core::cluster::ClusterAssignment;
use lumitrace_core::error::LumitraceError;
use lumitrace_core::features::pixel_index;

fn mask_with(pixels: &[(usize, usize)], height: usize, width: usize) -> Array2<u8> {
    let mut mask = Array2::<u8>::zeros((height, width));
    for &(row, col) in pixels {
        mask[[row, col]] = 255;
    }
    mask
}

/// Assign `id` to a `side` x `side` square of labels with its corner at
/// (x0, y0), in pixel-index order.
fn label_square(labels: &mut [u32], width: usize, id: u32, x0: usize, y0: usize, side: usize) {
    for y in y0..y0 + side {
        for x in x0..x0 + side {
            labels[pixel_index(x, y, width)] = id;
        }
    }
}

#[test]
fn components_report_area_bbox_and_centroid() {
    // A 2x2 square at the origin and a 3-pixel line at row 4.
    let mask = mask_with(
        &[(0, 0), (0, 1), (1, 0), (1, 1), (4, 2), (4, 3), (4, 4)],
        6,
        6,
    );

    let components = connected_components(&mask);
    assert_eq!(components.len(), 2);

    // Sorted by area descending, so the square comes first.
    assert_eq!(components[0].area, 4);
    assert_eq!(components[0].bbox, (0, 1, 0, 1));
    assert_eq!(components[0].centroid(), (0.5, 0.5));

    assert_eq!(components[1].area, 3);
    assert_eq!(components[1].bbox, (4, 4, 2, 4));
    assert_eq!(components[1].centroid(), (3.0, 4.0));
}

#[test]
fn diagonal_pixels_stay_separate() {
    // 4-connectivity only; diagonal neighbors do not merge.
    let mask = mask_with(&[(0, 0), (1, 1)], 4, 4);
    let components = connected_components(&mask);
    assert_eq!(components.len(), 2);
    assert!(components.iter().all(|c| c.area == 1));
}

#[test]
fn u_shape_merges_into_one_component() {
    // Two vertical arms joined along the bottom row exercise label unions.
    let mask = mask_with(
        &[(0, 0), (1, 0), (2, 0), (0, 2), (1, 2), (2, 2), (2, 1)],
        3,
        3,
    );
    let components = connected_components(&mask);
    assert_eq!(components.len(), 1);
    assert_eq!(components[0].area, 7);
    assert_eq!(components[0].bbox, (0, 2, 0, 2));
}

#[test]
fn border_contact_is_detected_on_every_edge() {
    assert!(touches_border((0, 2, 3, 4), 10, 10));
    assert!(touches_border((3, 9, 3, 4), 10, 10));
    assert!(touches_border((3, 4, 0, 2), 10, 10));
    assert!(touches_border((3, 4, 7, 9), 10, 10));
    assert!(!touches_border((1, 8, 1, 8), 10, 10));
}

#[test]
fn detect_blobs_filters_area_and_border() {
    // Interior 3x3 square, a lone interior pixel, and a full top row.
    let mut mask = Array2::<u8>::zeros((8, 8));
    for row in 2..5 {
        for col in 2..5 {
            mask[[row, col]] = 255;
        }
    }
    mask[[6, 6]] = 255;
    for col in 0..8 {
        mask[[0, col]] = 255;
    }

    let config = BlobConfig {
        min_area: 2.0,
        exclude_border: true,
    };
    let blobs = detect_blobs(&mask, &config);
    assert_eq!(blobs.len(), 1, "only the interior square should survive");
    assert_eq!(blobs[0].area, 9);
    assert_eq!(blobs[0].bbox, (2, 4, 2, 4));
    assert_eq!((blobs[0].cx, blobs[0].cy), (3.0, 3.0));

    let permissive = BlobConfig {
        min_area: 1.0,
        exclude_border: false,
    };
    let all = detect_blobs(&mask, &permissive);
    assert_eq!(all.len(), 3);
    // Largest first.
    assert_eq!(all[0].area, 9);
    assert_eq!(all[1].area, 8);
    assert_eq!(all[2].area, 1);
}

#[test]
fn blob_size_is_equivalent_diameter() {
    let mask = mask_with(&[(2, 2), (2, 3), (3, 2), (3, 3)], 6, 6);
    let config = BlobConfig {
        min_area: 1.0,
        exclude_border: true,
    };
    let blobs = detect_blobs(&mask, &config);
    let expected = 2.0 * (4.0 / std::f64::consts::PI).sqrt();
    assert!((blobs[0].size - expected).abs() < 1e-12);
}

#[test]
fn roi_rounds_origin_and_side() {
    // Area 25 centered on (10, 10): size = 2 * sqrt(25 / pi) = 5.6419, so the
    // ROI rounds to a 6x6 square at (7, 7).
    let blob = Blob {
        cx: 10.0,
        cy: 10.0,
        size: 2.0 * (25.0 / std::f64::consts::PI).sqrt(),
        area: 25,
        bbox: (8, 12, 8, 12),
    };
    let roi = blob.roi();
    assert_eq!((roi.x, roi.y), (7, 7));
    assert_eq!((roi.width, roi.height), (6, 6));
}

#[test]
fn largest_blob_wins_across_clusters() {
    let (height, width) = (12, 12);
    let mut labels = vec![0u32; height * width];
    label_square(&mut labels, width, 1, 1, 1, 2);
    label_square(&mut labels, width, 2, 6, 6, 4);
    let assignment = ClusterAssignment::new(labels, 3);

    let config = BlobConfig {
        min_area: 2.0,
        exclude_border: true,
    };
    let selection = select_roi(&assignment, (height, width), &config).unwrap();
    assert_eq!(selection.cluster_id, 2);
    assert_eq!(selection.blob.area, 16);
}

#[test]
fn equal_sizes_resolve_to_lowest_cluster_id() {
    // Two 3x3 squares of identical area in clusters 1 and 2; the background
    // cluster 0 touches the border and is never a candidate.
    let (height, width) = (10, 10);
    let mut labels = vec![0u32; height * width];
    label_square(&mut labels, width, 1, 1, 1, 3);
    label_square(&mut labels, width, 2, 5, 5, 3);
    let assignment = ClusterAssignment::new(labels, 3);

    let config = BlobConfig {
        min_area: 2.0,
        exclude_border: true,
    };
    let selection = select_roi(&assignment, (height, width), &config).unwrap();
    assert_eq!(selection.cluster_id, 1);
    assert_eq!(selection.blob.area, 9);
    assert_eq!(selection.blob.bbox, (1, 3, 1, 3));
    assert_eq!((selection.roi.width, selection.roi.height), (3, 3));
}

#[test]
fn checkerboard_labels_have_no_prominent_blob() {
    // Every component is a single pixel under 4-connectivity, all below the
    // area floor.
    let (height, width) = (6, 6);
    let labels: Vec<u32> = (0..height * width)
        .map(|i| ((i % width + i / width) % 2) as u32)
        .collect();
    let assignment = ClusterAssignment::new(labels, 2);

    let config = BlobConfig {
        min_area: 2.0,
        exclude_border: true,
    };
    match select_roi(&assignment, (height, width), &config) {
        Err(LumitraceError::NoProminentBlob { clusters }) => assert_eq!(clusters, 2),
        other => panic!("expected no prominent blob, got {other:?}"),
    }
}
