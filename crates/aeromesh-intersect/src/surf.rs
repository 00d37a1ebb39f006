//! Component surfaces and the surface registry.
//!
//! A [`Surf`] is one aircraft component surface: the full Bezier control
//! net plus the tessellated leaf patches the intersection driver actually
//! walks. Surfaces live in a [`SurfaceSet`] keyed by [`SurfId`]; patches
//! carry the id back to their owner instead of a pointer.

use aeromesh_bezier::{BezierPatch, PatchError, SurfPatch};
use aeromesh_geom::{SurfId, Surface};
use aeromesh_math::{BndBox, Point3, Vec3};
use rayon::prelude::*;
use slotmap::SlotMap;

use crate::driver::intersect_patches;
use crate::options::IntersectOptions;
use crate::sink::{IntersectionSegment, IntersectionSink, SegmentCollector};

/// One component surface: full control net, leaf patches, component id.
///
/// Surfaces belonging to the same component (same `comp_id`) are never
/// intersected against each other; their shared borders are handled by the
/// component's own construction, not by this engine.
#[derive(Debug)]
pub struct Surf {
    id: SurfId,
    comp_id: i32,
    patch: BezierPatch,
    leaves: Vec<SurfPatch>,
    bnd_box: BndBox,
}

impl Surf {
    fn build(id: SurfId, patch: BezierPatch, comp_id: i32, tess_depth: u32) -> Result<Self, PatchError> {
        let root = SurfPatch::new(patch.clone(), (0.0, 1.0), (0.0, 1.0), id)?;
        let mut leaves = vec![root];
        for _ in 0..tess_depth {
            let mut next = Vec::with_capacity(leaves.len() * 4);
            for leaf in &leaves {
                next.extend(leaf.split());
            }
            leaves = next;
        }

        let mut bnd_box = BndBox::empty();
        for leaf in &leaves {
            bnd_box.union(leaf.bnd_box());
        }

        Ok(Self {
            id,
            comp_id,
            patch,
            leaves,
            bnd_box,
        })
    }

    /// Registry handle of this surface.
    pub fn id(&self) -> SurfId {
        self.id
    }

    /// Component this surface belongs to.
    pub fn comp_id(&self) -> i32 {
        self.comp_id
    }

    /// The tessellated leaf patches.
    pub fn patches(&self) -> &[SurfPatch] {
        &self.leaves
    }

    /// Bounding box over all leaf patches.
    pub fn bnd_box(&self) -> &BndBox {
        &self.bnd_box
    }

    /// Intersect this surface with another, streaming segments into `sink`.
    ///
    /// Same-component pairs are skipped. Candidate patch pairs are filtered
    /// box-against-surface first and box-against-box second, so the
    /// subdivision driver only ever starts on pairs that can intersect.
    pub fn intersect(&self, other: &Surf, opts: &IntersectOptions, sink: &mut dyn IntersectionSink) {
        if other.comp_id == self.comp_id {
            return;
        }
        if !self.bnd_box.overlaps_margin(&other.bnd_box, opts.bbox_margin) {
            return;
        }

        for pa in &self.leaves {
            if !pa.bnd_box().overlaps_margin(&other.bnd_box, opts.bbox_margin) {
                continue;
            }
            for pb in &other.leaves {
                if pa.bnd_box().overlaps_margin(pb.bnd_box(), opts.bbox_margin) {
                    intersect_patches(pa, pb, opts, sink);
                }
            }
        }
    }

    /// Intersect the segment `p0 → p1` with this surface, appending the
    /// de-duplicated hit parameters `t ∈ [0, 1]` over all leaf patches.
    pub fn intersect_line_seg(&self, p0: &Point3, p1: &Point3, opts: &IntersectOptions, t_vals: &mut Vec<f64>) {
        let mut line_box = BndBox::empty();
        line_box.update(p0);
        line_box.update(p1);

        if !line_box.overlaps_margin(&self.bnd_box, opts.bbox_margin) {
            return;
        }

        for leaf in &self.leaves {
            let mut leaf = leaf.clone();
            leaf.intersect_line_seg(p0, p1, &line_box, opts.plane_tol, opts.max_sub_depth, t_vals);
        }
    }
}

impl Surface for Surf {
    fn evaluate(&self, u: f64, w: f64) -> Point3 {
        self.patch.eval(u.clamp(0.0, 1.0), w.clamp(0.0, 1.0))
    }

    fn deriv_u(&self, u: f64, w: f64) -> Vec3 {
        self.patch.deriv_u(u.clamp(0.0, 1.0), w.clamp(0.0, 1.0))
    }

    fn deriv_w(&self, u: f64, w: f64) -> Vec3 {
        self.patch.deriv_w(u.clamp(0.0, 1.0), w.clamp(0.0, 1.0))
    }

    fn domain(&self) -> ((f64, f64), (f64, f64)) {
        ((0.0, 1.0), (0.0, 1.0))
    }
}

/// Registry of component surfaces.
#[derive(Debug, Default)]
pub struct SurfaceSet {
    surfs: SlotMap<SurfId, Surf>,
}

impl SurfaceSet {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a surface, tessellating its leaf patches by `tess_depth`
    /// uniform subdivisions (`4^tess_depth` leaves).
    pub fn insert(
        &mut self,
        patch: BezierPatch,
        comp_id: i32,
        tess_depth: u32,
    ) -> Result<SurfId, PatchError> {
        let mut err = None;
        let key = self.surfs.insert_with_key(|id| {
            match Surf::build(id, patch.clone(), comp_id, tess_depth) {
                Ok(surf) => surf,
                Err(e) => {
                    err = Some(e);
                    Surf {
                        id,
                        comp_id,
                        patch: patch.clone(),
                        leaves: Vec::new(),
                        bnd_box: BndBox::empty(),
                    }
                }
            }
        });
        match err {
            None => Ok(key),
            Some(e) => {
                self.surfs.remove(key);
                Err(e)
            }
        }
    }

    /// Look up a surface.
    pub fn get(&self, id: SurfId) -> Option<&Surf> {
        self.surfs.get(id)
    }

    /// Number of surfaces.
    pub fn len(&self) -> usize {
        self.surfs.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.surfs.is_empty()
    }

    /// All surface ids, in insertion order.
    pub fn ids(&self) -> Vec<SurfId> {
        self.surfs.keys().collect()
    }

    /// Intersect every cross-component surface pair, in parallel.
    ///
    /// Each pair accumulates into its own [`SegmentCollector`]; the
    /// per-pair collectors are merged in fixed `(i, j)` order, so the
    /// result is identical run to run regardless of scheduling.
    pub fn intersect_all(&self, opts: &IntersectOptions) -> Vec<IntersectionSegment> {
        let ids = self.ids();
        let mut pairs = Vec::new();
        for i in 0..ids.len() {
            for j in i + 1..ids.len() {
                pairs.push((ids[i], ids[j]));
            }
        }

        let collectors: Vec<SegmentCollector> = pairs
            .par_iter()
            .map(|&(ka, kb)| {
                let mut coll = SegmentCollector::new();
                if let (Some(sa), Some(sb)) = (self.get(ka), self.get(kb)) {
                    sa.intersect(sb, opts, &mut coll);
                }
                coll
            })
            .collect();

        let mut merged = SegmentCollector::new();
        for coll in collectors {
            merged.merge(coll);
        }
        merged.into_segments()
    }
}
