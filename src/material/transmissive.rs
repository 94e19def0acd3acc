use crate::aliases::{RandGen, Vec3};
use crate::material::specular::{fuzz, reflect};
use rand::Rng;

/// Refracts `v` through a surface with normal `n` facing against `v`.
/// `r` is the ratio of refractive indices (incident over transmitted).
/// Returns None on total internal reflection.
pub fn refract(v: &Vec3, n: &Vec3, r: f32) -> Option<Vec3> {
    let uv = v.normalize();
    let dt = uv.dot(n);
    let d = 1.0 - r * r * (1.0 - dt * dt);
    if d > 0.0 {
        Some(r * (uv - n * dt) - n * f32::sqrt(d))
    } else {
        None
    }
}

/// Unpolarized Fresnel reflectance of a dielectric boundary.
/// * `cos_i` - cosine between the incident direction and the normal, in [0, 1]
/// * `r` - ratio of refractive indices (incident over transmitted)
pub fn fresnel_dielectric(cos_i: f32, r: f32) -> f32 {
    let sin_t2 = r * r * (1.0 - cos_i * cos_i).max(0.0);
    if sin_t2 >= 1.0 {
        return 1.0;
    }
    let cos_t = (1.0 - sin_t2).sqrt();
    let rs = (r * cos_i - cos_t) / (r * cos_i + cos_t);
    let rp = (cos_i - r * cos_t) / (cos_i + r * cos_t);
    0.5 * (rs * rs + rp * rp)
}

/// Chooses between reflection and refraction.
/// The refraction probability is the Fresnel transmittance scaled by
/// `transmittance`; the remainder reflects.
pub fn scatter(
    in_dir: &Vec3,
    normal: &Vec3,
    outside: bool,
    ior: f32,
    transmittance: f32,
    roughness: f32,
    rng: &mut RandGen,
) -> Vec3 {
    let r = if outside { 1.0 / ior } else { ior };
    let cos_i = (-in_dir.normalize().dot(normal)).clamp(0.0, 1.0);
    let p_refract = (1.0 - fresnel_dielectric(cos_i, r)) * transmittance.clamp(0.0, 1.0);
    let u = rng.gen::<f32>();
    match refract(in_dir, normal, r) {
        Some(refracted) if u < p_refract => fuzz(&refracted, &-normal, roughness, rng),
        _ => fuzz(&reflect(&in_dir.normalize(), normal), normal, roughness, rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{path_rng, Salt};

    #[test]
    fn index_matched_boundary_does_not_bend_or_reflect() {
        let n = Vec3::new(0.0, 0.0, 1.0);
        for pixel in 0..200 {
            let d = Vec3::new(0.7, 0.1 * pixel as f32 / 200.0, -0.4).normalize();
            let mut rng = path_rng(0, pixel, 0, Salt::Bsdf);
            let out = scatter(&d, &n, pixel % 2 == 0, 1.0, 1.0, 0.0, &mut rng);
            assert!((out - d).norm() < 1e-5);
        }
    }

    #[test]
    fn fresnel_matches_normal_incidence_reflectance() {
        // ((1 - 1.5) / (1 + 1.5))^2 = 0.04
        assert!((fresnel_dielectric(1.0, 1.0 / 1.5) - 0.04).abs() < 1e-4);
        assert_eq!(fresnel_dielectric(1.0, 1.0), 0.0);
    }

    #[test]
    fn grazing_exit_is_totally_reflected() {
        assert_eq!(fresnel_dielectric(0.1, 1.5), 1.0);
        let n = Vec3::new(0.0, 0.0, 1.0);
        let d = Vec3::new(1.0, 0.0, -0.1).normalize();
        assert!(refract(&d, &n, 1.5).is_none());
        let mut rng = path_rng(0, 0, 0, Salt::Bsdf);
        let out = scatter(&d, &n, false, 1.5, 1.0, 0.0, &mut rng);
        assert!(out.dot(&n) > 0.0);
    }

    #[test]
    fn zero_transmittance_always_reflects() {
        let n = Vec3::new(0.0, 0.0, 1.0);
        let d = Vec3::new(0.0, 0.0, -1.0);
        for pixel in 0..100 {
            let mut rng = path_rng(1, pixel, 0, Salt::Bsdf);
            let out = scatter(&d, &n, true, 1.5, 0.0, 0.0, &mut rng);
            assert!((out - n).norm() < 1e-6);
        }
    }
}
