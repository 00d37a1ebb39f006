#![warn(missing_docs)]

//! Surface intersection toolkit for aircraft CFD meshing.
//!
//! Register component surfaces in a [`SurfaceSet`], then compute the raw
//! intersection segments between every cross-component pair. Downstream
//! meshing chains the segments into continuous border curves.
//!
//! # Example
//!
//! ```
//! use aeromesh::{BezierPatch, IntersectOptions, Point3, SurfaceSet};
//!
//! // A flat quad in z = 0 and a flat quad in x = 0: they cross on the
//! // y axis.
//! let quad_a = BezierPatch::bilinear(
//!     Point3::new(-1.0, -1.0, 0.0),
//!     Point3::new(1.0, -1.0, 0.0),
//!     Point3::new(-1.0, 1.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//! );
//! let quad_b = BezierPatch::bilinear(
//!     Point3::new(0.0, -1.0, -1.0),
//!     Point3::new(0.0, 1.0, -1.0),
//!     Point3::new(0.0, -1.0, 1.0),
//!     Point3::new(0.0, 1.0, 1.0),
//! );
//!
//! let mut set = SurfaceSet::new();
//! set.insert(quad_a, 1, 0).unwrap();
//! set.insert(quad_b, 2, 0).unwrap();
//!
//! let segments = set.intersect_all(&IntersectOptions::default());
//! assert!(!segments.is_empty());
//! for seg in &segments {
//!     for p in &seg.points {
//!         assert!(p.pnt.x.abs() < 1e-8);
//!         assert!(p.pnt.z.abs() < 1e-8);
//!     }
//! }
//! ```

pub use aeromesh_bezier;
pub use aeromesh_geom;
pub use aeromesh_intersect;
pub use aeromesh_math;

pub use aeromesh_bezier::{BezierPatch, PatchError, SurfPatch};
pub use aeromesh_geom::{closest_uw, project_pnt, SurfId, Surface};
pub use aeromesh_intersect::{
    intersect_patches, intersect_quads, refine_intersect_pt, IntersectOptions, IntersectionPoint,
    IntersectionSegment, IntersectionSink, SegmentCollector, Surf, SurfaceSet,
};
pub use aeromesh_math::{BndBox, Point2, Point3, Tolerance, Vec2, Vec3};
