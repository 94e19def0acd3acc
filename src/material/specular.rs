use crate::aliases::{RandGen, Vec3};
use crate::sampling::rnd_in_unit_sphere;

/// * `n` - must be normalized
pub fn reflect(v: &Vec3, n: &Vec3) -> Vec3 {
    debug_assert!((n.norm() - 1.0).abs() < 1e-3);
    v - 2.0 * v.dot(n) * n
}

/// Perturbs a perfect mirror direction by `roughness`.
/// Falls back to the mirror direction when the perturbation would leave the
/// hemisphere of `n`.
pub fn fuzz(mirror: &Vec3, n: &Vec3, roughness: f32, rng: &mut RandGen) -> Vec3 {
    let mirror = mirror.normalize();
    if roughness <= 0.0 {
        return mirror;
    }
    let fuzzed = mirror + roughness * rnd_in_unit_sphere(rng);
    if fuzzed.dot(n) > 0.0 && fuzzed.norm_squared() > 0.0 {
        fuzzed.normalize()
    } else {
        mirror
    }
}

/// Mirror reflection blended by `roughness` (0 = perfect mirror).
pub fn scatter(in_dir: &Vec3, normal: &Vec3, roughness: f32, rng: &mut RandGen) -> Vec3 {
    fuzz(&reflect(in_dir, normal), normal, roughness, rng)
}
