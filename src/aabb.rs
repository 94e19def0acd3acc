use crate::aliases::Vec3;
use crate::ray::Ray;
use crate::util::{max_vec3, min_vec3};

/// Axis-Aligned Bounding Box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: &Vec3, max: &Vec3) -> Self {
        Aabb {
            min: *min,
            max: *max,
        }
    }
    pub fn empty() -> Self {
        Aabb::new(
            &Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            &Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        )
    }
    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1] || self.min[2] > self.max[2]
    }
    pub fn hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> bool {
        let mut t_min_int = t_min; // int = intersection
        let mut t_max_int = t_max;
        for a in 0..3 {
            let inv_d = 1.0 / ray.direction[a];
            let mut t0 = (self.min[a] - ray.origin[a]) * inv_d;
            let mut t1 = (self.max[a] - ray.origin[a]) * inv_d;
            if inv_d < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            // NaN (origin on a slab plane with a parallel ray) must not reject the box
            if t0.is_nan() || t1.is_nan() {
                continue;
            }
            t_min_int = f32::max(t_min_int, t0);
            t_max_int = f32::min(t_max_int, t1);
            // strict so that flat boxes still register
            if t_min_int > t_max_int {
                return false;
            }
        }
        true
    }
    pub fn append_point(&mut self, point: &Vec3) {
        self.min = min_vec3(&self.min, point);
        self.max = max_vec3(&self.max, point);
    }
    /// Grows the box by `margin` on every side.
    pub fn inflated(&self, margin: f32) -> Aabb {
        let m = Vec3::new(margin, margin, margin);
        Aabb::new(&(self.min - m), &(self.max + m))
    }
}

impl<'a> std::iter::FromIterator<&'a Vec3> for Aabb {
    fn from_iter<I: IntoIterator<Item = &'a Vec3>>(iter: I) -> Self {
        let mut ret = Aabb::empty();
        for pt in iter {
            ret.append_point(pt);
        }
        ret
    }
}
