#![warn(missing_docs)]

//! Bezier patch evaluation and adaptive subdivision for aeromesh.
//!
//! Provides the tensor-product [`BezierPatch`] (evaluated via de Casteljau's
//! algorithm) and [`SurfPatch`], the node type of the adaptive subdivision
//! used by the surface-surface intersection engine: a rectangular parametric
//! sub-domain of an owning surface together with its control net, bounding
//! box, subdivision depth, and planarity cache.
//!
//! # Key types
//!
//! - [`BezierPatch`] — knotless tensor-product Bezier net of any degree
//! - [`SurfPatch`] — subdivision node with global `(u, w)` sub-domain
//!
//! # Algorithms
//!
//! - **De Casteljau's algorithm** for evaluation and derivatives
//! - **Midpoint de Casteljau subdivision** producing 4 exact children

use aeromesh_math::{dist_pnt_to_line, dist_pnt_to_plane, tri_seg_intersect, BndBox, Point3, Vec3};
use aeromesh_geom::{Surface, SurfId};
use thiserror::Error;

/// Tolerance for merging nearly coincident segment parameters in
/// [`SurfPatch::add_t_val`].
pub const T_VAL_TOL: f64 = 1e-6;

/// Errors from Bezier patch construction.
#[derive(Debug, Error, PartialEq)]
pub enum PatchError {
    /// Control net length does not match `(degree_u + 1) * (degree_w + 1)`.
    #[error("control net has {got} points, expected {expected}")]
    NetSize {
        /// Required number of control points.
        expected: usize,
        /// Number of control points supplied.
        got: usize,
    },
    /// A degree of zero would make the patch a curve, not a surface.
    #[error("patch degree must be at least 1 in each direction")]
    ZeroDegree,
    /// Parametric sub-domain has `min >= max` in some direction.
    #[error("inverted parametric domain")]
    InvertedDomain,
}

// =============================================================================
// 1D de Casteljau helpers
// =============================================================================

/// Evaluate a 1D Bezier polygon at parameter `t` by repeated lerp.
fn de_casteljau(pts: &[Point3], t: f64) -> Point3 {
    let mut work = pts.to_vec();
    let n = work.len();
    for lvl in 1..n {
        for i in 0..n - lvl {
            work[i] = Point3::from(work[i].coords.lerp(&work[i + 1].coords, t));
        }
    }
    work[0]
}

/// Derivative of a 1D Bezier polygon at `t`: `n` times the degree-reduced
/// Bezier of the forward differences.
fn de_casteljau_deriv(pts: &[Point3], t: f64) -> Vec3 {
    let n = pts.len();
    if n < 2 {
        return Vec3::zeros();
    }
    let mut diffs: Vec<Vec3> = (0..n - 1).map(|i| pts[i + 1] - pts[i]).collect();
    let m = diffs.len();
    for lvl in 1..m {
        for i in 0..m - lvl {
            diffs[i] = diffs[i].lerp(&diffs[i + 1], t);
        }
    }
    diffs[0] * (n - 1) as f64
}

/// Split a 1D Bezier polygon at its midpoint.
///
/// Both halves reproduce the parent curve exactly on their sub-interval.
fn split_poly(pts: &[Point3]) -> (Vec<Point3>, Vec<Point3>) {
    let n = pts.len();
    let mut work = pts.to_vec();
    let mut left = vec![Point3::origin(); n];
    let mut right = vec![Point3::origin(); n];
    left[0] = work[0];
    right[n - 1] = work[n - 1];
    for lvl in 1..n {
        for i in 0..n - lvl {
            work[i] = Point3::from((work[i].coords + work[i + 1].coords) * 0.5);
        }
        left[lvl] = work[0];
        right[n - 1 - lvl] = work[n - 1 - lvl];
    }
    (left, right)
}

// =============================================================================
// BezierPatch
// =============================================================================

/// A tensor-product Bezier patch over the unit square.
///
/// Control points are stored row-major: index `(i, j)` — `i` along `u`,
/// `j` along `w` — lives at `j * (degree_u + 1) + i`.
#[derive(Debug, Clone)]
pub struct BezierPatch {
    degree_u: usize,
    degree_w: usize,
    pnts: Vec<Point3>,
}

impl BezierPatch {
    /// Create a patch, validating net dimensions.
    pub fn new(degree_u: usize, degree_w: usize, pnts: Vec<Point3>) -> Result<Self, PatchError> {
        if degree_u == 0 || degree_w == 0 {
            return Err(PatchError::ZeroDegree);
        }
        let expected = (degree_u + 1) * (degree_w + 1);
        if pnts.len() != expected {
            return Err(PatchError::NetSize {
                expected,
                got: pnts.len(),
            });
        }
        Ok(Self {
            degree_u,
            degree_w,
            pnts,
        })
    }

    /// A bilinear (degree 1×1) quad from its four corners.
    pub fn bilinear(p00: Point3, p10: Point3, p01: Point3, p11: Point3) -> Self {
        Self {
            degree_u: 1,
            degree_w: 1,
            pnts: vec![p00, p10, p01, p11],
        }
    }

    /// Degree in the `u` direction.
    pub fn degree_u(&self) -> usize {
        self.degree_u
    }

    /// Degree in the `w` direction.
    pub fn degree_w(&self) -> usize {
        self.degree_w
    }

    /// Control point at net index `(i, j)`.
    pub fn pnt(&self, i: usize, j: usize) -> &Point3 {
        &self.pnts[j * (self.degree_u + 1) + i]
    }

    /// The full control net, row-major.
    pub fn net(&self) -> &[Point3] {
        &self.pnts
    }

    /// Control row `j` (all `i` at fixed `j`).
    fn row(&self, j: usize) -> &[Point3] {
        let n_u = self.degree_u + 1;
        &self.pnts[j * n_u..(j + 1) * n_u]
    }

    /// Evaluate at local `(u, w)` in `[0, 1]²`.
    pub fn eval(&self, u: f64, w: f64) -> Point3 {
        let col: Vec<Point3> = (0..=self.degree_w)
            .map(|j| de_casteljau(self.row(j), u))
            .collect();
        de_casteljau(&col, w)
    }

    /// Partial derivative with respect to local `u`.
    pub fn deriv_u(&self, u: f64, w: f64) -> Vec3 {
        let col: Vec<Point3> = (0..=self.degree_w)
            .map(|j| Point3::from(de_casteljau_deriv(self.row(j), u)))
            .collect();
        de_casteljau(&col, w).coords
    }

    /// Partial derivative with respect to local `w`.
    pub fn deriv_w(&self, u: f64, w: f64) -> Vec3 {
        let col: Vec<Point3> = (0..=self.degree_w)
            .map(|j| de_casteljau(self.row(j), u))
            .collect();
        de_casteljau_deriv(&col, w)
    }

    /// Split into `(left, right)` halves along `u`.
    fn split_u(&self) -> (BezierPatch, BezierPatch) {
        let n_u = self.degree_u + 1;
        let n_w = self.degree_w + 1;
        let mut left = Vec::with_capacity(n_u * n_w);
        let mut right = Vec::with_capacity(n_u * n_w);
        for j in 0..n_w {
            let (l, r) = split_poly(self.row(j));
            left.extend(l);
            right.extend(r);
        }
        (
            BezierPatch {
                degree_u: self.degree_u,
                degree_w: self.degree_w,
                pnts: left,
            },
            BezierPatch {
                degree_u: self.degree_u,
                degree_w: self.degree_w,
                pnts: right,
            },
        )
    }

    /// Split into `(bottom, top)` halves along `w`.
    fn split_w(&self) -> (BezierPatch, BezierPatch) {
        let n_u = self.degree_u + 1;
        let n_w = self.degree_w + 1;
        let mut bottom = vec![Point3::origin(); n_u * n_w];
        let mut top = vec![Point3::origin(); n_u * n_w];
        for i in 0..n_u {
            let col: Vec<Point3> = (0..n_w).map(|j| *self.pnt(i, j)).collect();
            let (b, t) = split_poly(&col);
            for j in 0..n_w {
                bottom[j * n_u + i] = b[j];
                top[j * n_u + i] = t[j];
            }
        }
        (
            BezierPatch {
                degree_u: self.degree_u,
                degree_w: self.degree_w,
                pnts: bottom,
            },
            BezierPatch {
                degree_u: self.degree_u,
                degree_w: self.degree_w,
                pnts: top,
            },
        )
    }
}

// =============================================================================
// SurfPatch
// =============================================================================

/// A node of the adaptive patch tree: a Bezier control net covering the
/// global parametric sub-domain `[u_min, u_max] × [w_min, w_max]` of its
/// owning surface.
///
/// Children produced by [`split`](SurfPatch::split) are plain values owned
/// by the caller; the intersection driver keeps them on an explicit
/// worklist, so no heap tree is ever built.
#[derive(Debug, Clone)]
pub struct SurfPatch {
    patch: BezierPatch,
    u_min: f64,
    u_max: f64,
    w_min: f64,
    w_max: f64,
    bnd_box: BndBox,
    sub_depth: u32,
    surf: SurfId,
    /// Planarity result cached together with the tolerance it was computed
    /// for. Re-testing with a different tolerance recomputes instead of
    /// reusing a stale answer.
    planar_cache: Option<(f64, bool)>,
}

impl SurfPatch {
    /// Create a patch over the given global sub-domain.
    pub fn new(
        patch: BezierPatch,
        (u_min, u_max): (f64, f64),
        (w_min, w_max): (f64, f64),
        surf: SurfId,
    ) -> Result<Self, PatchError> {
        if u_min >= u_max || w_min >= w_max {
            return Err(PatchError::InvertedDomain);
        }
        let bnd_box = BndBox::from_points(patch.net());
        Ok(Self {
            patch,
            u_min,
            u_max,
            w_min,
            w_max,
            bnd_box,
            sub_depth: 0,
            surf,
            planar_cache: None,
        })
    }

    /// The underlying Bezier net.
    pub fn patch(&self) -> &BezierPatch {
        &self.patch
    }

    /// Owning surface handle.
    pub fn surf(&self) -> SurfId {
        self.surf
    }

    /// Global sub-domain `((u_min, u_max), (w_min, w_max))`.
    pub fn uw_domain(&self) -> ((f64, f64), (f64, f64)) {
        ((self.u_min, self.u_max), (self.w_min, self.w_max))
    }

    /// Subdivision depth since the tessellation-time leaf patch.
    pub fn sub_depth(&self) -> u32 {
        self.sub_depth
    }

    /// Bounding box of the control net.
    pub fn bnd_box(&self) -> &BndBox {
        &self.bnd_box
    }

    /// Recompute the bounding box as the min/max over all control points.
    ///
    /// The convex-hull property of Bezier nets guarantees the surface patch
    /// never leaves this box, so box rejection cannot lose intersections.
    pub fn compute_bnd_box(&mut self) {
        self.bnd_box = BndBox::from_points(self.patch.net());
    }

    /// The four corner control points `[p00, p10, p11, p01]`, in loop order.
    pub fn corners(&self) -> [Point3; 4] {
        let nu = self.patch.degree_u;
        let nw = self.patch.degree_w;
        [
            *self.patch.pnt(0, 0),
            *self.patch.pnt(nu, 0),
            *self.patch.pnt(nu, nw),
            *self.patch.pnt(0, nw),
        ]
    }

    /// Evaluate at global parameters, clamping to the sub-domain edges.
    pub fn comp_pnt(&self, u: f64, w: f64) -> Point3 {
        let lu = if u <= self.u_min {
            0.0
        } else if u >= self.u_max {
            1.0
        } else {
            (u - self.u_min) / (self.u_max - self.u_min)
        };
        let lw = if w <= self.w_min {
            0.0
        } else if w >= self.w_max {
            1.0
        } else {
            (w - self.w_min) / (self.w_max - self.w_min)
        };
        self.patch.eval(lu, lw)
    }

    /// Test whether the control net deviates from the corner-spanned plane
    /// by less than the absolute tolerance `tol`.
    ///
    /// Boundary control points are measured against the straight line
    /// between their edge's corners; all other points against the plane.
    /// The result is cached per tolerance value.
    pub fn test_planar(&mut self, tol: f64) -> bool {
        if let Some((cached_tol, result)) = self.planar_cache {
            if cached_tol == tol {
                return result;
            }
        }
        let result = self.planar_deviation() <= tol;
        self.planar_cache = Some((tol, result));
        result
    }

    /// Relative form of [`test_planar`](SurfPatch::test_planar): the
    /// tolerance scales with the patch bounding-box diagonal, so flatness is
    /// judged against local feature size rather than one global length.
    pub fn test_planar_rel(&mut self, rel_tol: f64) -> bool {
        self.test_planar(rel_tol * self.bnd_box.diag())
    }

    /// Maximum deviation of the control net from its planar approximation.
    fn planar_deviation(&self) -> f64 {
        let nu = self.patch.degree_u;
        let nw = self.patch.degree_w;
        let [c00, c10, c11, c01] = self.corners();
        let norm = (c10 - c00).cross(&(c01 - c00));

        let mut max_dev: f64 = 0.0;
        for j in 0..=nw {
            for i in 0..=nu {
                let p = self.patch.pnt(i, j);
                let on_u_edge = j == 0 || j == nw;
                let on_w_edge = i == 0 || i == nu;
                let d = if on_u_edge && on_w_edge {
                    // Corner: p11 is the only corner off the spanning plane.
                    dist_pnt_to_plane(&c00, &norm, p)
                } else if on_u_edge {
                    let (a, b) = if j == 0 { (c00, c10) } else { (c01, c11) };
                    dist_pnt_to_line(&a, &b, p)
                } else if on_w_edge {
                    let (a, b) = if i == 0 { (c00, c01) } else { (c10, c11) };
                    dist_pnt_to_line(&a, &b, p)
                } else {
                    dist_pnt_to_plane(&c00, &norm, p)
                };
                max_dev = max_dev.max(d);
            }
        }
        max_dev
    }

    /// Bisect the sub-domain at its parametric midpoint, producing the four
    /// children `[q00, q10, q01, q11]` (`q10` is the high-`u`/low-`w`
    /// quadrant).
    ///
    /// The children's control nets reproduce the parent surface exactly on
    /// their quadrants; each child has `sub_depth = parent + 1` and a fresh
    /// bounding box and planarity cache.
    pub fn split(&self) -> [SurfPatch; 4] {
        let u_mid = 0.5 * (self.u_min + self.u_max);
        let w_mid = 0.5 * (self.w_min + self.w_max);

        let (left, right) = self.patch.split_u();
        let (p00, p01) = left.split_w();
        let (p10, p11) = right.split_w();

        let child = |patch: BezierPatch, u_rng: (f64, f64), w_rng: (f64, f64)| {
            let bnd_box = BndBox::from_points(patch.net());
            SurfPatch {
                patch,
                u_min: u_rng.0,
                u_max: u_rng.1,
                w_min: w_rng.0,
                w_max: w_rng.1,
                bnd_box,
                sub_depth: self.sub_depth + 1,
                surf: self.surf,
                planar_cache: None,
            }
        };

        [
            child(p00, (self.u_min, u_mid), (self.w_min, w_mid)),
            child(p10, (u_mid, self.u_max), (self.w_min, w_mid)),
            child(p01, (self.u_min, u_mid), (w_mid, self.w_max)),
            child(p11, (u_mid, self.u_max), (w_mid, self.w_max)),
        ]
    }

    /// Closest `(u, w)` on this patch to `pnt`, seeded from `guess`.
    ///
    /// Local Gauss-Newton search on the patch itself (not the owning
    /// surface); used to turn raw 3D intersection points into parametric
    /// coordinates.
    pub fn find_closest_uw(&self, pnt: &Point3, guess: (f64, f64)) -> (f64, f64) {
        aeromesh_geom::closest_uw(self, pnt, guess, 10, 1e-14)
    }

    /// [`find_closest_uw`](SurfPatch::find_closest_uw) seeded from the
    /// sub-domain midpoint.
    pub fn find_closest_uw_default(&self, pnt: &Point3) -> (f64, f64) {
        let guess = (
            0.5 * (self.u_min + self.u_max),
            0.5 * (self.w_min + self.w_max),
        );
        self.find_closest_uw(pnt, guess)
    }

    /// Intersect the segment `p0 → p1` with this patch, appending the
    /// de-duplicated segment parameters `t ∈ [0, 1]` of the hits to
    /// `t_vals`.
    ///
    /// Planar-enough patches (or patches at the subdivision cap) are tested
    /// as the two corner triangles; everything else subdivides. `line_box`
    /// is the precomputed box of the segment, used for pruning.
    pub fn intersect_line_seg(
        &mut self,
        p0: &Point3,
        p1: &Point3,
        line_box: &BndBox,
        plane_tol: f64,
        max_depth: u32,
        t_vals: &mut Vec<f64>,
    ) {
        if !line_box.overlaps(&self.bnd_box) {
            return;
        }

        if self.test_planar(plane_tol) || self.sub_depth >= max_depth {
            let [c00, c10, c11, c01] = self.corners();
            let diag = c11 - c00;
            let e_u = c10 - c00;
            let e_w = c01 - c00;
            let dir = p1 - p0;

            if let Some((_, _, t)) = tri_seg_intersect(&c00, &diag, &e_u, p0, &dir) {
                Self::add_t_val(t, t_vals);
            }
            if let Some((_, _, t)) = tri_seg_intersect(&c00, &e_w, &diag, p0, &dir) {
                Self::add_t_val(t, t_vals);
            }
            return;
        }

        for mut bp in self.split() {
            bp.intersect_line_seg(p0, p1, line_box, plane_tol, max_depth, t_vals);
        }
    }

    /// Append `t` unless an existing value lies within [`T_VAL_TOL`].
    pub fn add_t_val(t: f64, t_vals: &mut Vec<f64>) {
        if t_vals.iter().all(|&v| (t - v).abs() >= T_VAL_TOL) {
            t_vals.push(t);
        }
    }

    /// The patch boundary as a closed polyline (corner loop), for
    /// diagnostic visualization only.
    pub fn boundary_polyline(&self) -> Vec<Point3> {
        let [c00, c10, c11, c01] = self.corners();
        vec![c00, c10, c11, c01, c00]
    }
}

impl Surface for SurfPatch {
    fn evaluate(&self, u: f64, w: f64) -> Point3 {
        self.comp_pnt(u, w)
    }

    fn deriv_u(&self, u: f64, w: f64) -> Vec3 {
        let lu = ((u - self.u_min) / (self.u_max - self.u_min)).clamp(0.0, 1.0);
        let lw = ((w - self.w_min) / (self.w_max - self.w_min)).clamp(0.0, 1.0);
        self.patch.deriv_u(lu, lw) / (self.u_max - self.u_min)
    }

    fn deriv_w(&self, u: f64, w: f64) -> Vec3 {
        let lu = ((u - self.u_min) / (self.u_max - self.u_min)).clamp(0.0, 1.0);
        let lw = ((w - self.w_min) / (self.w_max - self.w_min)).clamp(0.0, 1.0);
        self.patch.deriv_w(lu, lw) / (self.w_max - self.w_min)
    }

    fn domain(&self) -> ((f64, f64), (f64, f64)) {
        self.uw_domain()
    }
}
