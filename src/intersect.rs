//! Intersection engine: nearest hit of every active path against every
//! primitive of the scene.

use crate::aliases::Vec3;
use crate::geometry::mesh::MeshBuffers;
use crate::geometry::Geometry;
use crate::path::{Intersection, PathPool};
use crate::ray::Ray;
use rayon::prelude::*;

/// Brute-force nearest hit over `geometries`.
/// Keeps the smallest strictly positive `t`; on equal `t` the geometry that
/// comes first wins.
pub fn nearest_hit(
    ray: &Ray,
    geometries: &[Geometry],
    meshes: &MeshBuffers,
    cull_back_faces: bool,
) -> Intersection {
    let mut nearest = Intersection::miss();
    let mut t_min = f32::INFINITY;
    for geom in geometries {
        if let Some(rec) = geom.hit(ray, meshes, cull_back_faces) {
            if rec.t > 0.0 && rec.t < t_min {
                t_min = rec.t;
                nearest = Intersection {
                    t: rec.t,
                    material_id: geom.material_id,
                    normal: if rec.outside { rec.normal } else { -rec.normal },
                    outside: rec.outside,
                };
            }
        }
    }
    nearest
}

/// Fills the intersection buffer for the active set.
/// At depth 0 the hit normals are also written to `normal_buffer` by pixel;
/// pixels whose path misses keep their current value.
pub fn compute_intersections(
    pool: &mut PathPool,
    geometries: &[Geometry],
    meshes: &MeshBuffers,
    cull_back_faces: bool,
    depth: u32,
    normal_buffer: &mut [Vec3],
) {
    let (paths, intersections) = pool.active_pairs_mut();
    paths
        .par_iter()
        .zip(intersections.par_iter_mut())
        .for_each(|(path, isect)| {
            *isect = nearest_hit(&path.ray, geometries, meshes, cull_back_faces);
        });
    if depth == 0 {
        for (path, isect) in paths.iter().zip(intersections.iter()) {
            if isect.is_hit() {
                normal_buffer[path.pixel_index] = isect.normal;
            }
        }
    }
}
