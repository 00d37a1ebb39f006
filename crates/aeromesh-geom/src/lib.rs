#![warn(missing_docs)]

//! Parametric surface boundary for the aeromesh intersection engine.
//!
//! The engine only ever talks to the owning surfaces through the [`Surface`]
//! trait (evaluation, first partials, domain) and through the Gauss-Newton
//! closest-point projection [`closest_uw`]. Surfaces themselves live in a
//! registry keyed by [`SurfId`]; patches carry the id as a non-owning
//! back-reference instead of a raw pointer.

use aeromesh_math::{Point3, Vec3};

slotmap::new_key_type! {
    /// Non-owning handle to a surface in a slotmap-backed registry.
    pub struct SurfId;
}

/// A parametric surface in 3D space, parameterized over `(u, w)`.
pub trait Surface: Send + Sync + std::fmt::Debug {
    /// Evaluate the surface at `(u, w)` to get a 3D point.
    fn evaluate(&self, u: f64, w: f64) -> Point3;

    /// Partial derivative with respect to `u` at `(u, w)`.
    fn deriv_u(&self, u: f64, w: f64) -> Vec3;

    /// Partial derivative with respect to `w` at `(u, w)`.
    fn deriv_w(&self, u: f64, w: f64) -> Vec3;

    /// Parameter domain as `((u_min, u_max), (w_min, w_max))`.
    fn domain(&self) -> ((f64, f64), (f64, f64));
}

/// One Gauss-Newton step toward the closest point on `surf` to `target`.
///
/// Solves the tangent-plane normal equations with the cross-product form:
/// for step `(du, dw)` with `t_u·du + t_w·dw = -(p - target)`, crossing both
/// sides with one tangent and dotting with the patch normal isolates the
/// other unknown. Returns `(0, 0)` at parabolic/degenerate points where the
/// tangents are parallel.
fn delta_uw(surf: &dyn Surface, target: &Point3, u: f64, w: f64) -> (f64, f64) {
    let tan_u = surf.deriv_u(u, w);
    let tan_w = surf.deriv_w(u, w);
    let dist = surf.evaluate(u, w) - target;

    let norm = tan_u.cross(&tan_w);
    let n2 = norm.norm_squared();
    if n2 <= f64::EPSILON {
        return (0.0, 0.0);
    }

    let du = tan_w.cross(&dist).dot(&norm) / n2;
    let dw = -tan_u.cross(&dist).dot(&norm) / n2;
    (du, dw)
}

/// Find the `(u, w)` of the point on `surf` closest to `target`, seeded
/// from `guess` and clamped to the surface domain.
///
/// Local search only: convergence depends on the quality of the seed, which
/// the intersection driver guarantees by subdividing until patches are
/// nearly planar before projecting. Stops when the combined parameter step
/// drops below `uw_tol` or after `max_iter` iterations; never fails — the
/// best estimate so far is returned.
pub fn closest_uw(
    surf: &dyn Surface,
    target: &Point3,
    guess: (f64, f64),
    max_iter: usize,
    uw_tol: f64,
) -> (f64, f64) {
    let ((u_min, u_max), (w_min, w_max)) = surf.domain();
    let mut u = guess.0.clamp(u_min, u_max);
    let mut w = guess.1.clamp(w_min, w_max);

    for _ in 0..max_iter {
        let (du, dw) = delta_uw(surf, target, u, w);
        u = (u + du).clamp(u_min, u_max);
        w = (w + dw).clamp(w_min, w_max);
        if du.abs() + dw.abs() < uw_tol {
            break;
        }
    }

    (u, w)
}

/// Project `target` onto `surf`: the closest `(u, w)` and the surface point
/// there. Convenience wrapper over [`closest_uw`].
pub fn project_pnt(
    surf: &dyn Surface,
    target: &Point3,
    guess: (f64, f64),
    max_iter: usize,
    uw_tol: f64,
) -> ((f64, f64), Point3) {
    let (u, w) = closest_uw(surf, target, guess, max_iter, uw_tol);
    ((u, w), surf.evaluate(u, w))
}
