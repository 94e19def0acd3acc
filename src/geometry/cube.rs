use crate::aliases::Vec3;
use crate::hit_record::HitRecord;
use crate::ray::Ray;

const HALF_EXTENT: f32 = 0.5;

/// Object-space slab test against the unit cube at the origin.
/// Returns the entry face, or the exit face when the ray starts inside.
pub fn hit(ray: &Ray) -> Option<HitRecord> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;
    let mut near_normal = Vec3::zeros();
    let mut far_normal = Vec3::zeros();
    for a in 0..3 {
        let d = ray.direction[a];
        let o = ray.origin[a];
        if d == 0.0 {
            if o < -HALF_EXTENT || o > HALF_EXTENT {
                return None;
            }
            continue;
        }
        let t1 = (-HALF_EXTENT - o) / d;
        let t2 = (HALF_EXTENT - o) / d;
        // the face at -HALF_EXTENT is entered first when d > 0
        let (ta, tb, sign) = if t1 < t2 { (t1, t2, -1.0) } else { (t2, t1, 1.0) };
        if ta > t_near {
            t_near = ta;
            near_normal = Vec3::zeros();
            near_normal[a] = sign;
        }
        if tb < t_far {
            t_far = tb;
            far_normal = Vec3::zeros();
            far_normal[a] = -sign;
        }
    }
    if t_far < t_near || t_far <= 0.0 {
        return None;
    }
    if t_near > 0.0 {
        Some(HitRecord {
            t: t_near,
            normal: near_normal,
            outside: true,
        })
    } else {
        Some(HitRecord {
            t: t_far,
            normal: far_normal,
            outside: false,
        })
    }
}
