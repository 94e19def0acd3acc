//! Shading engine: applies the hit material to every active path.

use crate::aliases::Vec3;
use crate::material::Material;
use crate::path::{Intersection, PathPool, PathSegment};
use crate::ray::Ray;
use crate::sampling::{path_rng, Salt};
use crate::scatter_record::ScatterRecord;
use rayon::prelude::*;

/// Distance a continuing ray is pushed along its new direction so that it does
/// not hit the surface it leaves.
pub const RAY_OFFSET: f32 = 1e-4;

/// Shades one path in place.
pub fn shade_path(
    path: &mut PathSegment,
    isect: &Intersection,
    materials: &[Material],
    iteration: u32,
    depth: u32,
) {
    if !isect.is_hit() {
        path.throughput = Vec3::zeros();
        path.terminate();
        return;
    }
    let material = &materials[isect.material_id];
    let mut rng = path_rng(iteration, path.pixel_index, depth, Salt::Bsdf);
    match material.scatter(&path.ray.direction, &isect.normal, isect.outside, &mut rng) {
        ScatterRecord::Emitted { radiance } => {
            path.throughput = path.throughput.component_mul(&radiance);
            path.terminate();
        }
        ScatterRecord::Scattered { attenuation, dir } => {
            let hit_point = path.ray.evaluate(isect.t);
            path.ray = Ray::new(&(hit_point + RAY_OFFSET * dir), &dir);
            path.throughput = path.throughput.component_mul(&attenuation);
            path.remaining_bounces = (path.remaining_bounces - 1).max(0);
        }
    }
}

pub fn shade_paths(pool: &mut PathPool, materials: &[Material], iteration: u32, depth: u32) {
    let (paths, intersections) = pool.active_pairs_mut();
    paths
        .par_iter_mut()
        .zip(intersections.par_iter())
        .for_each(|(path, isect)| shade_path(path, isect, materials, iteration, depth));
}
