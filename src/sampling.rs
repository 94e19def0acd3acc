//! Stateless per-path random streams and direction sampling.
//!
//! Every random decision in the pipeline draws from a generator that is a pure
//! function of (iteration, pixel, depth, salt). No generator is shared between
//! paths, so the result of a path does not depend on where or when it runs.

use crate::aliases::{RandGen, Vec2, Vec3};
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

/// Distinguishes the independent random needs of one path at one depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Salt {
    AntiAlias = 1,
    DepthOfField = 2,
    Bsdf = 3,
}

fn mix64(mut h: u64) -> u64 {
    // splitmix64 finalizer
    h ^= h >> 30;
    h = h.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h ^= h >> 27;
    h = h.wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^ (h >> 31)
}

/// Hashes the four keys into one seed.
pub fn path_seed(iteration: u32, pixel_index: usize, depth: u32, salt: Salt) -> u64 {
    let mut h = mix64(0x9e37_79b9_7f4a_7c15 ^ iteration as u64);
    h = mix64(h ^ pixel_index as u64);
    h = mix64(h ^ depth as u64);
    mix64(h ^ salt as u64)
}

pub fn path_rng(iteration: u32, pixel_index: usize, depth: u32, salt: Salt) -> RandGen {
    RandGen::seed_from_u64(path_seed(iteration, pixel_index, depth, salt))
}

pub fn rnd_in_unit_sphere(rng: &mut RandGen) -> Vec3 {
    loop {
        let p = Vec3::new(
            2.0 * rng.gen::<f32>() - 1.0,
            2.0 * rng.gen::<f32>() - 1.0,
            2.0 * rng.gen::<f32>() - 1.0,
        );
        if p.norm_squared() < 1.0 {
            return p;
        }
    }
}

/// Concentric mapping of the unit square onto the unit disc.
pub fn rnd_in_unit_disc(rng: &mut RandGen) -> Vec2 {
    let a = 2.0 * rng.gen::<f32>() - 1.0;
    let b = 2.0 * rng.gen::<f32>() - 1.0;
    if a == 0.0 && b == 0.0 {
        return Vec2::zeros();
    }
    let (r, theta) = if a.abs() > b.abs() {
        (a, 0.25 * PI * (b / a))
    } else {
        (b, 0.5 * PI - 0.25 * PI * (a / b))
    };
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Calculates a random point on a unit hemisphere (x^2+y^2+z^2=1, z>=0)
/// such that pdf(d)/sin(t) ~= cos(t) where t is angle between d and n=(0,0,1)
pub fn random_cosine_direction(rng: &mut RandGen) -> Vec3 {
    let r0 = rng.gen::<f32>();
    let rr0 = r0.sqrt();
    let r1 = rng.gen::<f32>();
    let angle = 2.0 * PI * r1;
    let z = (1.0 - r0).sqrt();
    let x = angle.cos() * rr0;
    let y = angle.sin() * rr0;
    Vec3::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_are_pure_functions_of_their_keys() {
        let mut a = path_rng(7, 1234, 3, Salt::Bsdf);
        let mut b = path_rng(7, 1234, 3, Salt::Bsdf);
        for _ in 0..16 {
            assert_eq!(a.gen::<u64>(), b.gen::<u64>());
        }
    }

    #[test]
    fn every_key_changes_the_stream() {
        let base = path_seed(7, 1234, 3, Salt::Bsdf);
        assert_ne!(base, path_seed(8, 1234, 3, Salt::Bsdf));
        assert_ne!(base, path_seed(7, 1235, 3, Salt::Bsdf));
        assert_ne!(base, path_seed(7, 1234, 4, Salt::Bsdf));
        assert_ne!(base, path_seed(7, 1234, 3, Salt::AntiAlias));
        assert_ne!(
            path_seed(0, 0, 0, Salt::AntiAlias),
            path_seed(0, 0, 0, Salt::DepthOfField)
        );
    }

    #[test]
    fn cosine_directions_follow_cosine_density() {
        const SAMPLE_CNT: usize = 20000;
        let mut rng = path_rng(0, 0, 0, Salt::Bsdf);
        let mut mean_cos = 0.0f32;
        for _ in 0..SAMPLE_CNT {
            let d = random_cosine_direction(&mut rng);
            assert!(d[2] >= 0.0);
            assert!((d.norm() - 1.0).abs() < 1e-4);
            mean_cos += d[2];
        }
        mean_cos /= SAMPLE_CNT as f32;
        // E[cos] under the cosine-weighted hemisphere is 2/3.
        assert!((mean_cos - 2.0 / 3.0).abs() < 0.02);
    }

    #[test]
    fn disc_and_sphere_samples_stay_inside() {
        let mut rng = path_rng(1, 2, 0, Salt::DepthOfField);
        for _ in 0..1000 {
            assert!(rnd_in_unit_disc(&mut rng).norm() <= 1.0 + 1e-5);
            assert!(rnd_in_unit_sphere(&mut rng).norm() < 1.0);
        }
    }
}
