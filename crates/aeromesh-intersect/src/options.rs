//! Configuration for the intersection engine.

use serde::{Deserialize, Serialize};

/// Tolerances and limits for a surface-surface intersection run.
///
/// Passed explicitly into every driver entry point together with the output
/// sink, so a run carries no global state and two runs with the same options
/// on the same surfaces produce identical results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectOptions {
    /// Relative planarity tolerance for the subdivision driver, scaled by
    /// each patch's own bounding-box diagonal.
    pub plane_rel_tol: f64,
    /// Absolute planarity tolerance for segment-vs-patch queries.
    pub plane_tol: f64,
    /// Hard subdivision depth cap. A patch pair at this depth is intersected
    /// as planar quads regardless of flatness, which bounds the worklist on
    /// near-tangent geometry.
    pub max_sub_depth: u32,
    /// Margin added to bounding boxes in overlap tests, so patches meeting
    /// exactly along a shared edge still count as candidates.
    pub bbox_margin: f64,
    /// Raw segments shorter than this are discarded as near-tangency noise.
    pub min_seg_len: f64,
    /// Parametric slack when deciding whether both segment endpoints sit on
    /// a patch's minimum-u or minimum-w edge (shared-border artifacts).
    pub border_tol: f64,
    /// Alternating-projection iterations when refining each raw endpoint.
    pub refine_iters: usize,
    /// Parameter-step convergence threshold inside closest-point searches.
    pub uw_tol: f64,
}

impl Default for IntersectOptions {
    fn default() -> Self {
        Self {
            plane_rel_tol: 1e-4,
            plane_tol: 1e-6,
            max_sub_depth: 7,
            bbox_margin: 1e-8,
            min_seg_len: 1e-8,
            border_tol: 1e-8,
            refine_iters: 3,
            uw_tol: 1e-14,
        }
    }
}
