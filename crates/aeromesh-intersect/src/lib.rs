#![warn(missing_docs)]

//! Surface-surface intersection engine for aeromesh.
//!
//! Computes the 3D curves along which two Bezier component surfaces cross,
//! to sub-tolerance accuracy, as a stream of refined segments that a
//! downstream stage chains into continuous border curves.
//!
//! The engine has 4 stages:
//! 1. **Broadphase** — surface and patch bounding-box filters
//! 2. **Subdivision** — worklist-driven adaptive bisection until both
//!    patches of a pair are planar within a size-relative tolerance (or the
//!    depth cap forces the issue)
//! 3. **Planar quad-quad** — triangle-triangle intersection on the corner
//!    quads, yielding raw segments
//! 4. **Refinement** — alternating closest-point projection snaps each
//!    endpoint onto both true surfaces and reports a residual
//!
//! All tolerances and limits travel in [`IntersectOptions`]; results stream
//! into an [`IntersectionSink`]. Nothing is global, so runs are
//! deterministic and unit-testable.

// Internal modules
pub mod driver;
pub mod options;
pub mod refine;
pub mod sink;
pub mod surf;
pub mod tri;

// Re-export public API
pub use driver::{intersect_patches, intersect_quads};
pub use options::IntersectOptions;
pub use refine::refine_intersect_pt;
pub use sink::{IntersectionPoint, IntersectionSegment, IntersectionSink, SegmentCollector};
pub use surf::{Surf, SurfaceSet};
pub use tri::{tri_tri_intersect_line, TriTriIsect};
