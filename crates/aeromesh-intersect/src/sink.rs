//! Output side of the intersection engine.
//!
//! Raw refined segments stream into an [`IntersectionSink`]; the engine
//! itself retains nothing. [`SegmentCollector`] is the standard sink: it
//! buffers segments and suppresses duplicates, and per-pair collectors can
//! be merged in a fixed order after a parallel run.

use aeromesh_geom::SurfId;
use aeromesh_math::{Point3, Tolerance};

/// One refined intersection endpoint: position, parametric coordinates on
/// each contributing surface, and the residual distance between the two
/// surfaces' projections of it (a quality signal, never an error).
#[derive(Debug, Clone, Copy)]
pub struct IntersectionPoint {
    /// Refined 3D position.
    pub pnt: Point3,
    /// `(u, w)` on surface A.
    pub uw_a: (f64, f64),
    /// `(u, w)` on surface B.
    pub uw_b: (f64, f64),
    /// Distance between the A- and B-side projections after refinement.
    pub residual: f64,
}

/// A raw intersection segment between two surfaces. Downstream chaining
/// into continuous border curves happens outside this crate.
#[derive(Debug, Clone, Copy)]
pub struct IntersectionSegment {
    /// Surface contributing the A-side parameters.
    pub surf_a: SurfId,
    /// Surface contributing the B-side parameters.
    pub surf_b: SurfId,
    /// The two endpoints.
    pub points: [IntersectionPoint; 2],
}

/// Receiver for refined intersection segments.
pub trait IntersectionSink {
    /// Called once per surviving segment, in driver order.
    fn add_segment(&mut self, seg: IntersectionSegment);
}

/// Buffering sink with duplicate suppression.
///
/// Planar quads sharing an edge produce the same crossing from both
/// adjacent patch pairs; a segment matching an already-collected one on the
/// same surface pair (endpoints coincident in either orientation) is
/// dropped.
#[derive(Debug, Default)]
pub struct SegmentCollector {
    segments: Vec<IntersectionSegment>,
    tol: Tolerance,
}

impl SegmentCollector {
    /// Collector with default tolerances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector with explicit coincidence tolerances.
    pub fn with_tolerance(tol: Tolerance) -> Self {
        Self {
            segments: Vec::new(),
            tol,
        }
    }

    /// Collected segments, in emission order.
    pub fn segments(&self) -> &[IntersectionSegment] {
        &self.segments
    }

    /// Number of collected segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Consume the collector, returning its segments.
    pub fn into_segments(self) -> Vec<IntersectionSegment> {
        self.segments
    }

    /// Fold another collector's segments into this one, re-applying
    /// duplicate suppression. Merging per-pair collectors in a fixed pair
    /// order keeps parallel runs deterministic.
    pub fn merge(&mut self, other: SegmentCollector) {
        for seg in other.segments {
            self.add_segment(seg);
        }
    }

    fn is_duplicate(&self, seg: &IntersectionSegment) -> bool {
        let (p0, p1) = (&seg.points[0].pnt, &seg.points[1].pnt);
        self.segments.iter().any(|s| {
            s.surf_a == seg.surf_a
                && s.surf_b == seg.surf_b
                && ((self.tol.points_equal(&s.points[0].pnt, p0)
                    && self.tol.points_equal(&s.points[1].pnt, p1))
                    || (self.tol.points_equal(&s.points[0].pnt, p1)
                        && self.tol.points_equal(&s.points[1].pnt, p0)))
        })
    }
}

impl IntersectionSink for SegmentCollector {
    fn add_segment(&mut self, seg: IntersectionSegment) {
        if self.is_duplicate(&seg) {
            return;
        }
        self.segments.push(seg);
    }
}
