#![warn(missing_docs)]

//! Math types for the aeromesh surface-intersection kernel.
//!
//! Thin wrappers around nalgebra providing domain-specific types for
//! aircraft surface geometry: points, vectors, bounding boxes, tolerance
//! constants, and the distance predicates used by the planarity tests.

use nalgebra::{Vector2, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A point in 2D `(u, w)` parameter space.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D parameter space.
pub type Vec2 = Vector2<f64>;

// =============================================================================
// Tolerance
// =============================================================================

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance.
    pub linear: f64,
    /// Parameter-space tolerance for `(u, w)` convergence tests.
    pub parametric: f64,
}

impl Tolerance {
    /// Default meshing tolerances (1e-6 linear, 1e-10 parametric).
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        parametric: 1e-10,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// =============================================================================
// Bounding box
// =============================================================================

/// Axis-aligned bounding box in 3D.
///
/// Used as the broadphase filter of the intersection engine: only patch
/// pairs with overlapping boxes need further testing. The convex-hull
/// property of Bezier control nets makes this rejection sound — the surface
/// never leaves the box of its control points.
#[derive(Debug, Clone, Copy)]
pub struct BndBox {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl BndBox {
    /// Create a box from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) box suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Build the box of a point set.
    pub fn from_points<'a, I: IntoIterator<Item = &'a Point3>>(points: I) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.update(p);
        }
        bb
    }

    /// Expand this box to include a point.
    pub fn update(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Expand this box to include another box.
    pub fn union(&mut self, other: &BndBox) {
        self.update(&other.min);
        self.update(&other.max);
    }

    /// Test if two boxes overlap (touching counts as overlap).
    pub fn overlaps(&self, other: &BndBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Test overlap with the other box grown by `margin` in all directions.
    ///
    /// The intersection driver uses a small positive margin so that patches
    /// meeting exactly along a shared edge still count as candidates.
    pub fn overlaps_margin(&self, other: &BndBox, margin: f64) -> bool {
        self.min.x <= other.max.x + margin
            && self.max.x >= other.min.x - margin
            && self.min.y <= other.max.y + margin
            && self.max.y >= other.min.y - margin
            && self.min.z <= other.max.z + margin
            && self.max.z >= other.min.z - margin
    }

    /// Grow the box by `tol` in all directions.
    pub fn expand(&mut self, tol: f64) {
        self.min.x -= tol;
        self.min.y -= tol;
        self.min.z -= tol;
        self.max.x += tol;
        self.max.y += tol;
        self.max.z += tol;
    }

    /// Diagonal length of the box. Zero for an empty box.
    pub fn diag(&self) -> f64 {
        if self.min.x > self.max.x {
            return 0.0;
        }
        (self.max - self.min).norm()
    }

    /// Center of the box.
    pub fn center(&self) -> Point3 {
        Point3::from((self.min.coords + self.max.coords) * 0.5)
    }
}

// =============================================================================
// Distance predicates
// =============================================================================

/// Distance from `p` to the plane through `org` with unit normal `norm`.
///
/// Returns 0 when the normal is degenerate (zero-area corner span), which
/// the planarity test treats as "no plane constraint".
pub fn dist_pnt_to_plane(org: &Point3, norm: &Vec3, p: &Point3) -> f64 {
    let n = norm.norm();
    if n < f64::EPSILON {
        return 0.0;
    }
    ((p - org).dot(norm) / n).abs()
}

/// Distance from `p` to the infinite line through `a` and `b`.
///
/// Falls back to point distance when `a` and `b` coincide.
pub fn dist_pnt_to_line(a: &Point3, b: &Point3, p: &Point3) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 < f64::EPSILON {
        return (p - a).norm();
    }
    let t = (p - a).dot(&ab) / len2;
    let foot = a + ab * t;
    (p - foot).norm()
}

/// Intersect the segment `org + t * dir`, `t ∈ [0, 1]`, with the triangle
/// spanned at `a` by edge vectors `e1` and `e2`.
///
/// Returns `(r, s, t)` where `(r, s)` are the triangle coordinates
/// (`r ≥ 0`, `s ≥ 0`, `r + s ≤ 1`) and `t` the segment parameter, or `None`
/// when the segment misses or runs parallel to the triangle plane. A small
/// negative slack on the bounds keeps hits exactly on an edge from being
/// lost to roundoff.
pub fn tri_seg_intersect(
    a: &Point3,
    e1: &Vec3,
    e2: &Vec3,
    org: &Point3,
    dir: &Vec3,
) -> Option<(f64, f64, f64)> {
    const ZERO: f64 = -1.0e-8;
    const ONE: f64 = 1.0 - ZERO;

    let cs = e1.cross(e2);
    let denom = cs.dot(dir);
    if denom.abs() <= f64::EPSILON {
        return None;
    }
    let t = (cs.dot(&a.coords) - cs.dot(&org.coords)) / denom;
    if !(ZERO..=ONE).contains(&t) {
        return None;
    }

    let cs = e2.cross(dir);
    let denom = cs.dot(e1);
    if denom.abs() <= f64::EPSILON {
        return None;
    }
    let r = (cs.dot(&org.coords) - cs.dot(&a.coords)) / denom;
    if !(ZERO..=ONE).contains(&r) {
        return None;
    }

    let cs = e1.cross(dir);
    let denom = cs.dot(e2);
    if denom.abs() <= f64::EPSILON {
        return None;
    }
    let s = (cs.dot(&org.coords) - cs.dot(&a.coords)) / denom;
    if !(ZERO..=ONE).contains(&s) {
        return None;
    }

    if r + s > ONE {
        return None;
    }
    Some((r, s, t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bndbox_update() {
        let mut bb = BndBox::empty();
        bb.update(&Point3::new(1.0, 2.0, 3.0));
        bb.update(&Point3::new(-1.0, 5.0, 0.0));
        assert!((bb.min.x + 1.0).abs() < 1e-12);
        assert!((bb.max.y - 5.0).abs() < 1e-12);
        assert!((bb.min.z - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_bndbox_overlap() {
        let a = BndBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 10.0));
        let b = BndBox::new(Point3::new(5.0, 5.0, 5.0), Point3::new(15.0, 15.0, 15.0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));

        let c = BndBox::new(Point3::new(20.0, 20.0, 20.0), Point3::new(30.0, 30.0, 30.0));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_bndbox_touching() {
        let a = BndBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 10.0));
        let b = BndBox::new(Point3::new(10.0, 0.0, 0.0), Point3::new(20.0, 10.0, 10.0));
        assert!(a.overlaps(&b)); // touching counts
    }

    #[test]
    fn test_bndbox_margin() {
        let a = BndBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let b = BndBox::new(Point3::new(1.001, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps_margin(&b, 0.01));
    }

    #[test]
    fn test_bndbox_diag() {
        let bb = BndBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 4.0, 0.0));
        assert!((bb.diag() - 5.0).abs() < 1e-12);
        assert!(BndBox::empty().diag() == 0.0);
    }

    #[test]
    fn test_dist_pnt_to_plane() {
        let org = Point3::origin();
        let n = Vec3::z();
        let d = dist_pnt_to_plane(&org, &n, &Point3::new(5.0, -3.0, 2.5));
        assert!((d - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_dist_pnt_to_line() {
        let a = Point3::origin();
        let b = Point3::new(10.0, 0.0, 0.0);
        let d = dist_pnt_to_line(&a, &b, &Point3::new(5.0, 7.0, 0.0));
        assert!((d - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_dist_degenerate_line() {
        let a = Point3::origin();
        let d = dist_pnt_to_line(&a, &a, &Point3::new(3.0, 4.0, 0.0));
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_tri_seg_hit() {
        // Triangle in z=0, segment dropping straight through its interior.
        let a = Point3::origin();
        let e1 = Vec3::new(1.0, 0.0, 0.0);
        let e2 = Vec3::new(0.0, 1.0, 0.0);
        let org = Point3::new(0.25, 0.25, 1.0);
        let dir = Vec3::new(0.0, 0.0, -2.0);
        let (r, s, t) = tri_seg_intersect(&a, &e1, &e2, &org, &dir).unwrap();
        assert!((r - 0.25).abs() < 1e-12);
        assert!((s - 0.25).abs() < 1e-12);
        assert!((t - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_tri_seg_miss() {
        let a = Point3::origin();
        let e1 = Vec3::new(1.0, 0.0, 0.0);
        let e2 = Vec3::new(0.0, 1.0, 0.0);
        // Outside the r + s <= 1 half of the parallelogram.
        let org = Point3::new(0.9, 0.9, 1.0);
        let dir = Vec3::new(0.0, 0.0, -2.0);
        assert!(tri_seg_intersect(&a, &e1, &e2, &org, &dir).is_none());
        // Parallel to the plane.
        let dir = Vec3::new(1.0, 0.0, 0.0);
        assert!(tri_seg_intersect(&a, &e1, &e2, &org, &dir).is_none());
    }

    #[test]
    fn test_tolerance_points_equal() {
        let tol = Tolerance::DEFAULT;
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(1.0 + 1e-8, 2.0, 3.0);
        assert!(tol.points_equal(&a, &b));
        let c = Point3::new(1.001, 2.0, 3.0);
        assert!(!tol.points_equal(&a, &c));
    }
}
