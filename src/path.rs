//! In-flight path state: the arena of path segments plus the per-bounce
//! intersection buffer.

use crate::aliases::Vec3;
use crate::material::MaterialId;
use crate::ray::Ray;

/// One simulated light path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathSegment {
    pub ray: Ray,
    /// Running multiplicative color weight, white at generation.
    pub throughput: Vec3,
    pub pixel_index: usize,
    pub remaining_bounces: i32,
}

impl PathSegment {
    pub fn new(ray: Ray, pixel_index: usize, remaining_bounces: i32) -> Self {
        PathSegment {
            ray,
            throughput: Vec3::new(1.0, 1.0, 1.0),
            pixel_index,
            remaining_bounces,
        }
    }
    pub fn is_terminated(&self) -> bool {
        self.remaining_bounces <= 0
    }
    pub fn terminate(&mut self) {
        self.remaining_bounces = 0;
    }
}

impl Default for PathSegment {
    fn default() -> Self {
        PathSegment::new(Ray::new(&Vec3::zeros(), &Vec3::new(0.0, 0.0, -1.0)), 0, 0)
    }
}

/// Nearest hit of one path for the current bounce.
/// `t <= 0` means no hit; the other fields are meaningless in that case.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    pub t: f32,
    pub material_id: MaterialId,
    /// Normalized, facing against the incoming ray.
    pub normal: Vec3,
    /// Whether the ray hit the front side (entering the volume).
    pub outside: bool,
}

impl Intersection {
    pub const MISS_T: f32 = -1.0;

    pub fn miss() -> Self {
        Intersection {
            t: Self::MISS_T,
            material_id: 0,
            normal: Vec3::zeros(),
            outside: true,
        }
    }
    pub fn is_hit(&self) -> bool {
        self.t > 0.0
    }
}

impl Default for Intersection {
    fn default() -> Self {
        Intersection::miss()
    }
}

/// Fixed-capacity arena of paths with a shrinking logical length.
/// Buffers are allocated once; only `active` changes between bounces.
pub struct PathPool {
    pub(crate) paths: Vec<PathSegment>,
    pub(crate) intersections: Vec<Intersection>,
    // scratch space for the material sort
    pub(crate) sorted_paths: Vec<PathSegment>,
    pub(crate) sorted_intersections: Vec<Intersection>,
    pub(crate) order: Vec<usize>,
    active: usize,
}

impl PathPool {
    pub fn with_capacity(capacity: usize) -> Self {
        PathPool {
            paths: vec![PathSegment::default(); capacity],
            intersections: vec![Intersection::default(); capacity],
            sorted_paths: vec![PathSegment::default(); capacity],
            sorted_intersections: vec![Intersection::default(); capacity],
            order: vec![0; capacity],
            active: 0,
        }
    }
    pub fn capacity(&self) -> usize {
        self.paths.len()
    }
    pub fn active_count(&self) -> usize {
        self.active
    }
    /// Makes every slot active again.
    pub fn reset_active(&mut self) {
        self.active = self.paths.len();
    }
    pub(crate) fn set_active_count(&mut self, active: usize) {
        debug_assert!(active <= self.active);
        self.active = active;
    }
    /// The whole arena, used when regenerating paths.
    pub fn all_paths_mut(&mut self) -> &mut [PathSegment] {
        &mut self.paths
    }
    pub fn active_paths(&self) -> &[PathSegment] {
        &self.paths[..self.active]
    }
    pub fn active_paths_mut(&mut self) -> &mut [PathSegment] {
        &mut self.paths[..self.active]
    }
    pub fn active_intersections(&self) -> &[Intersection] {
        &self.intersections[..self.active]
    }
    /// Active paths and their intersections, index-aligned.
    pub fn active_pairs_mut(&mut self) -> (&mut [PathSegment], &mut [Intersection]) {
        (
            &mut self.paths[..self.active],
            &mut self.intersections[..self.active],
        )
    }
}
