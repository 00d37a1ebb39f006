//! Triangle-triangle intersection with intersection line.
//!
//! Möller's interval-overlap test, extended to report the actual segment
//! where the two triangles cross. The planar quad-quad stage of the
//! intersection engine runs each quad's two corner triangles through this
//! routine.

use aeromesh_math::Point3;

/// Distances below this count as "on the plane". Keeps the sign test from
/// flipping on roundoff when a vertex sits exactly on the other plane.
const EPS: f64 = 1e-10;

/// Outcome of a triangle-triangle intersection query.
#[derive(Debug, Clone, PartialEq)]
pub enum TriTriIsect {
    /// The triangles do not cross.
    None,
    /// The triangles lie in the same plane. The engine discards these:
    /// coplanar patch overlap is not a transverse intersection curve.
    Coplanar,
    /// The triangles cross along this segment (possibly zero-length at a
    /// touch point).
    Segment(Point3, Point3),
}

/// Interval of the intersection line covered by one triangle, with the 3D
/// points at its ends.
struct Interval {
    lo: f64,
    hi: f64,
    p_lo: Point3,
    p_hi: Point3,
}

impl Interval {
    fn sorted(t0: f64, t1: f64, p0: Point3, p1: Point3) -> Self {
        if t0 > t1 {
            Interval {
                lo: t1,
                hi: t0,
                p_lo: p1,
                p_hi: p0,
            }
        } else {
            Interval {
                lo: t0,
                hi: t1,
                p_lo: p0,
                p_hi: p1,
            }
        }
    }
}

/// Where the edges `v0-v1` and `v0-v2` cross the other plane: `v0` is the
/// lone vertex on its side, `d*` the signed plane distances, `t*` the
/// projections onto the intersection-line axis.
#[allow(clippy::too_many_arguments)]
fn cross_edges(
    v0: &Point3,
    v1: &Point3,
    v2: &Point3,
    t0: f64,
    t1: f64,
    t2: f64,
    d0: f64,
    d1: f64,
    d2: f64,
) -> Interval {
    let f1 = d0 / (d0 - d1);
    let a = t0 + (t1 - t0) * f1;
    let pa = v0 + (v1 - v0) * f1;

    let f2 = d0 / (d0 - d2);
    let b = t0 + (t2 - t0) * f2;
    let pb = v0 + (v2 - v0) * f2;

    Interval::sorted(a, b, pa, pb)
}

/// Build the triangle's interval on the intersection line, isolating the
/// vertex that lies alone on one side of the other plane. `None` means all
/// three distances vanished (coplanar).
#[allow(clippy::too_many_arguments)]
fn compute_interval(
    v0: &Point3,
    v1: &Point3,
    v2: &Point3,
    t0: f64,
    t1: f64,
    t2: f64,
    d0: f64,
    d1: f64,
    d2: f64,
) -> Option<Interval> {
    if d0 * d1 > 0.0 {
        // d2 alone on the other side
        Some(cross_edges(v2, v0, v1, t2, t0, t1, d2, d0, d1))
    } else if d0 * d2 > 0.0 {
        Some(cross_edges(v1, v0, v2, t1, t0, t2, d1, d0, d2))
    } else if d1 * d2 > 0.0 || d0 != 0.0 {
        Some(cross_edges(v0, v1, v2, t0, t1, t2, d0, d1, d2))
    } else if d1 != 0.0 {
        Some(cross_edges(v1, v0, v2, t1, t0, t2, d1, d0, d2))
    } else if d2 != 0.0 {
        Some(cross_edges(v2, v0, v1, t2, t0, t1, d2, d0, d1))
    } else {
        None
    }
}

/// Intersect triangles `(v0, v1, v2)` and `(u0, u1, u2)`, reporting the
/// crossing segment when they intersect transversally.
pub fn tri_tri_intersect_line(
    v0: &Point3,
    v1: &Point3,
    v2: &Point3,
    u0: &Point3,
    u1: &Point3,
    u2: &Point3,
) -> TriTriIsect {
    // Plane of triangle V; signed distances of triangle U's vertices.
    let n_v = (v1 - v0).cross(&(v2 - v0));
    let d_v = -n_v.dot(&v0.coords);
    let mut du0 = n_v.dot(&u0.coords) + d_v;
    let mut du1 = n_v.dot(&u1.coords) + d_v;
    let mut du2 = n_v.dot(&u2.coords) + d_v;
    if du0.abs() < EPS {
        du0 = 0.0;
    }
    if du1.abs() < EPS {
        du1 = 0.0;
    }
    if du2.abs() < EPS {
        du2 = 0.0;
    }
    if du0 * du1 > 0.0 && du0 * du2 > 0.0 {
        return TriTriIsect::None;
    }

    // Plane of triangle U; signed distances of triangle V's vertices.
    let n_u = (u1 - u0).cross(&(u2 - u0));
    let d_u = -n_u.dot(&u0.coords);
    let mut dv0 = n_u.dot(&v0.coords) + d_u;
    let mut dv1 = n_u.dot(&v1.coords) + d_u;
    let mut dv2 = n_u.dot(&v2.coords) + d_u;
    if dv0.abs() < EPS {
        dv0 = 0.0;
    }
    if dv1.abs() < EPS {
        dv1 = 0.0;
    }
    if dv2.abs() < EPS {
        dv2 = 0.0;
    }
    if dv0 * dv1 > 0.0 && dv0 * dv2 > 0.0 {
        return TriTriIsect::None;
    }

    // Direction of the intersection line; project on its dominant axis.
    let dir = n_v.cross(&n_u);
    let axis = {
        let (ax, ay, az) = (dir.x.abs(), dir.y.abs(), dir.z.abs());
        if ax >= ay && ax >= az {
            0
        } else if ay >= az {
            1
        } else {
            2
        }
    };

    let iv = compute_interval(
        v0, v1, v2, v0[axis], v1[axis], v2[axis], dv0, dv1, dv2,
    );
    let iu = compute_interval(
        u0, u1, u2, u0[axis], u1[axis], u2[axis], du0, du1, du2,
    );
    let (iv, iu) = match (iv, iu) {
        (Some(iv), Some(iu)) => (iv, iu),
        _ => return TriTriIsect::Coplanar,
    };

    if iv.hi < iu.lo || iu.hi < iv.lo {
        return TriTriIsect::None;
    }

    // Shared interval: start at the larger lo, end at the smaller hi.
    let start = if iu.lo > iv.lo { iu.p_lo } else { iv.p_lo };
    let end = if iu.hi < iv.hi { iu.p_hi } else { iv.p_hi };
    TriTriIsect::Segment(start, end)
}
