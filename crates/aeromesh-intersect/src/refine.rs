//! Endpoint refinement by alternating closest-point projection.

use aeromesh_geom::{closest_uw, Surface};
use aeromesh_math::Point3;

/// Inner closest-point iteration cap per projection.
const CLOSEST_MAX_ITER: usize = 10;

/// Snap an approximate intersection point onto both surfaces.
///
/// Each round projects the current point onto A near `uw_a` and onto B near
/// `uw_b`, then replaces the point with the midpoint of the two projections.
/// `uw_a`, `uw_b`, and `pnt` are updated in place; the return value is the
/// distance between the final A- and B-side projections.
///
/// Works on any [`Surface`]: during the quad-quad stage the surfaces are the
/// nearly planar `SurfPatch` leaves themselves, which seeds the final
/// full-surface snap well enough that convergence is the normal case.
/// Non-convergence is not an error — the best estimate stands and the
/// residual tells the caller how much to trust it.
pub fn refine_intersect_pt(
    pnt: &mut Point3,
    surf_a: &dyn Surface,
    uw_a: &mut (f64, f64),
    surf_b: &dyn Surface,
    uw_b: &mut (f64, f64),
    iters: usize,
    uw_tol: f64,
) -> f64 {
    let mut residual = 0.0;
    for _ in 0..iters.max(1) {
        *uw_a = closest_uw(surf_a, pnt, *uw_a, CLOSEST_MAX_ITER, uw_tol);
        *uw_b = closest_uw(surf_b, pnt, *uw_b, CLOSEST_MAX_ITER, uw_tol);
        let p_a = surf_a.evaluate(uw_a.0, uw_a.1);
        let p_b = surf_b.evaluate(uw_b.0, uw_b.1);
        residual = (p_a - p_b).norm();
        *pnt = Point3::from((p_a.coords + p_b.coords) * 0.5);
    }
    residual
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeromesh_math::Vec3;

    /// `P(u, w) = (u, w, 0)` over `[-1, 1]^2`.
    #[derive(Debug)]
    struct PlaneZ0;

    impl Surface for PlaneZ0 {
        fn evaluate(&self, u: f64, w: f64) -> Point3 {
            Point3::new(u, w, 0.0)
        }
        fn deriv_u(&self, _u: f64, _w: f64) -> Vec3 {
            Vec3::x()
        }
        fn deriv_w(&self, _u: f64, _w: f64) -> Vec3 {
            Vec3::y()
        }
        fn domain(&self) -> ((f64, f64), (f64, f64)) {
            ((-1.0, 1.0), (-1.0, 1.0))
        }
    }

    /// `P(u, w) = (0, u, w)` over `[-1, 1]^2`.
    #[derive(Debug)]
    struct PlaneX0;

    impl Surface for PlaneX0 {
        fn evaluate(&self, u: f64, w: f64) -> Point3 {
            Point3::new(0.0, u, w)
        }
        fn deriv_u(&self, _u: f64, _w: f64) -> Vec3 {
            Vec3::y()
        }
        fn deriv_w(&self, _u: f64, _w: f64) -> Vec3 {
            Vec3::z()
        }
        fn domain(&self) -> ((f64, f64), (f64, f64)) {
            ((-1.0, 1.0), (-1.0, 1.0))
        }
    }

    #[test]
    fn test_refine_converges_to_shared_curve() {
        // True intersection is the y axis. Start off both planes.
        let mut pnt = Point3::new(0.05, 0.3, -0.04);
        let mut uw_a = (0.0, 0.3);
        let mut uw_b = (0.3, 0.0);
        let res = refine_intersect_pt(&mut pnt, &PlaneZ0, &mut uw_a, &PlaneX0, &mut uw_b, 5, 1e-14);
        assert!(res < 1e-10, "residual {res}");
        assert!(pnt.x.abs() < 1e-10);
        assert!(pnt.z.abs() < 1e-10);
        assert!((pnt.y - 0.3).abs() < 1e-10);
    }

    #[test]
    fn test_refine_non_worsening() {
        let start = Point3::new(0.2, -0.4, 0.15);
        let mut prev = f64::INFINITY;
        for iters in 1..=4 {
            let mut pnt = start;
            let mut uw_a = (start.x, start.y);
            let mut uw_b = (start.y, start.z);
            let res =
                refine_intersect_pt(&mut pnt, &PlaneZ0, &mut uw_a, &PlaneX0, &mut uw_b, iters, 1e-14);
            assert!(res <= prev + 1e-12, "residual grew at iters={iters}");
            prev = res;
        }
    }

    #[test]
    fn test_refine_updates_uw_in_place() {
        let mut pnt = Point3::new(0.0, 0.5, 0.0);
        let mut uw_a = (0.4, 0.1);
        let mut uw_b = (0.1, 0.4);
        refine_intersect_pt(&mut pnt, &PlaneZ0, &mut uw_a, &PlaneX0, &mut uw_b, 3, 1e-14);
        // On plane A the point (0, 0.5, 0) sits at u=0, w=0.5.
        assert!(uw_a.0.abs() < 1e-9);
        assert!((uw_a.1 - 0.5).abs() < 1e-9);
        // On plane B it sits at u=0.5, w=0.
        assert!((uw_b.0 - 0.5).abs() < 1e-9);
        assert!(uw_b.1.abs() < 1e-9);
    }
}
