use crate::aliases::Vec3;
use crate::hit_record::HitRecord;
use crate::ray::Ray;

pub const RADIUS: f32 = 0.5;

/// Calculates the parameter t of the ray at which it hits the sphere.
/// The ray direction need not be normalized.
pub fn hit_core(center: &Vec3, radius: f32, ray: &Ray, t_min: f32, t_max: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let a = ray.direction.dot(&ray.direction);
    let b = oc.dot(&ray.direction);
    let c = oc.dot(&oc) - radius * radius;
    let disc: f32 = b * b - a * c;
    if disc <= 0.0 {
        return None;
    }
    let disc_rt = f32::sqrt(disc);
    let mut t: f32;
    t = (-b - disc_rt) / a;
    if t_min < t && t < t_max {
        return Some(t);
    }
    t = (-b + disc_rt) / a;
    if t_min < t && t < t_max {
        return Some(t);
    }
    None
}

/// Object-space test against the unit-diameter sphere at the origin.
pub fn hit(ray: &Ray) -> Option<HitRecord> {
    let center = Vec3::zeros();
    hit_core(&center, RADIUS, ray, 0.0, f32::INFINITY).map(|t| {
        let normal = (ray.evaluate(t) - center) / RADIUS;
        HitRecord {
            t,
            normal,
            outside: ray.direction.dot(&normal) < 0.0,
        }
    })
}
