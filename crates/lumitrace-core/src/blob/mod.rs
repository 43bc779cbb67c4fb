mod components;

pub use components::{connected_components, touches_border, ComponentStats};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cluster::ClusterAssignment;
use crate::consts::DEFAULT_MIN_BLOB_AREA;
use crate::error::{LumitraceError, Result};
use crate::features::pixel_coords;
use crate::frame::Roi;

/// Configuration for blob-based ROI selection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlobConfig {
    /// Minimum component area (pixels) for an ROI candidate.
    #[serde(default = "default_min_area")]
    pub min_area: f64,
    /// Drop candidates whose bounding box touches the frame edge. Diffuse
    /// background clusters usually surface as one huge border-touching
    /// component.
    #[serde(default = "default_exclude_border")]
    pub exclude_border: bool,
}

fn default_min_area() -> f64 {
    DEFAULT_MIN_BLOB_AREA
}
fn default_exclude_border() -> bool {
    true
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            min_area: DEFAULT_MIN_BLOB_AREA,
            exclude_border: true,
        }
    }
}

/// A connected bright region of a cluster mask.
#[derive(Clone, Debug)]
pub struct Blob {
    /// Centroid column, in pixel coordinates.
    pub cx: f64,
    /// Centroid row, in pixel coordinates.
    pub cy: f64,
    /// Equivalent-circle diameter: 2 * sqrt(area / pi).
    pub size: f64,
    /// Area in pixels.
    pub area: usize,
    /// Bounding box: (min_row, max_row, min_col, max_col).
    pub bbox: (usize, usize, usize, usize),
}

impl Blob {
    /// Square ROI covering the blob: origin at centroid minus radius, side
    /// equal to the rounded size. May extend past the frame edge; bounds are
    /// checked at extraction time.
    pub fn roi(&self) -> Roi {
        let radius = self.size / 2.0;
        let side = self.size.round() as u32;
        Roi {
            x: (self.cx - radius).round() as i32,
            y: (self.cy - radius).round() as i32,
            width: side,
            height: side,
        }
    }
}

/// Render the binary mask of one cluster: 255 where the pixel belongs to
/// `cluster_id`, 0 elsewhere. Labels are consumed in pixel-index order, the
/// same convention the feature matrix was built with.
pub fn cluster_mask(
    assignment: &ClusterAssignment,
    cluster_id: u32,
    dims: (usize, usize),
) -> Array2<u8> {
    let (height, width) = dims;
    debug_assert_eq!(assignment.len(), height * width);
    let mut mask = Array2::<u8>::zeros((height, width));
    for (i, &label) in assignment.labels().iter().enumerate() {
        if label == cluster_id {
            let (x, y) = pixel_coords(i, width);
            mask[[y, x]] = 255;
        }
    }
    mask
}

/// Detect blob candidates in a binary mask, largest first.
///
/// Components below `min_area` are dropped, as are border-touching ones when
/// `exclude_border` is set. Candidate order follows the area-sorted component
/// list, and size is monotone in area.
pub fn detect_blobs(mask: &Array2<u8>, config: &BlobConfig) -> Vec<Blob> {
    let (h, w) = mask.dim();
    connected_components(mask)
        .into_iter()
        .filter(|c| c.area as f64 >= config.min_area)
        .filter(|c| !(config.exclude_border && touches_border(c.bbox, h, w)))
        .map(|c| {
            let (cx, cy) = c.centroid();
            Blob {
                cx,
                cy,
                size: 2.0 * (c.area as f64 / std::f64::consts::PI).sqrt(),
                area: c.area,
                bbox: c.bbox,
            }
        })
        .collect()
}

/// Result of ROI selection across all cluster masks.
#[derive(Clone, Debug)]
pub struct RoiSelection {
    pub roi: Roi,
    pub cluster_id: u32,
    pub blob: Blob,
}

/// Scan every cluster mask for the globally largest blob and derive its ROI.
///
/// Candidates are compared with strict `>` in ascending cluster-id order, so
/// ties on size resolve to the lowest cluster id.
pub fn select_roi(
    assignment: &ClusterAssignment,
    dims: (usize, usize),
    config: &BlobConfig,
) -> Result<RoiSelection> {
    let n_clusters = assignment.n_clusters() as u32;
    let mut best: Option<(u32, Blob)> = None;

    for cluster_id in 0..n_clusters {
        let mask = cluster_mask(assignment, cluster_id, dims);
        let blobs = detect_blobs(&mask, config);
        debug!(cluster_id, candidates = blobs.len(), "scanned cluster mask");
        if let Some(blob) = blobs.into_iter().next() {
            let better = match &best {
                Some((_, current)) => blob.size > current.size,
                None => true,
            };
            if better {
                best = Some((cluster_id, blob));
            }
        }
    }

    let (cluster_id, blob) = best.ok_or(LumitraceError::NoProminentBlob {
        clusters: n_clusters as usize,
    })?;
    Ok(RoiSelection {
        roi: blob.roi(),
        cluster_id,
        blob,
    })
}
