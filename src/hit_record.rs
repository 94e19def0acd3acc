use crate::affine::Affine;
use crate::aliases::Vec3;

/// Hit of a single shape, before it is turned into an `Intersection`.
#[derive(Clone, Copy, Debug)]
pub struct HitRecord {
    pub t: f32,
    /// Outward surface normal, normalized.
    pub normal: Vec3,
    /// Whether the ray arrived on the side the normal points to.
    pub outside: bool,
}

impl HitRecord {
    /// Maps an object-space hit into world space.
    /// The ray parameter is shared between both spaces.
    pub fn get_transformed(&self, tr: &Affine) -> HitRecord {
        HitRecord {
            t: self.t,
            normal: tr.act_normal(&self.normal).normalize(),
            outside: self.outside,
        }
    }
}
