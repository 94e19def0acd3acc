//! Material sorter: groups active paths by the material they hit.
//!
//! The same stable permutation is applied to the path and intersection
//! arrays, so slot `i` of one still belongs to slot `i` of the other.

use crate::path::{Intersection, PathPool};
use rayon::prelude::*;

/// Sort key; misses go after every material.
fn material_key(isect: &Intersection) -> usize {
    if isect.is_hit() {
        isect.material_id
    } else {
        usize::MAX
    }
}

pub fn sort_by_material(pool: &mut PathPool) {
    let active = pool.active_count();
    if active < 2 {
        return;
    }
    let order = &mut pool.order[..active];
    order
        .par_iter_mut()
        .enumerate()
        .for_each(|(slot, idx)| *idx = slot);
    let intersections = &pool.intersections;
    order.par_sort_by_key(|&idx| material_key(&intersections[idx]));

    let paths = &pool.paths;
    pool.sorted_paths[..active]
        .par_iter_mut()
        .zip(pool.sorted_intersections[..active].par_iter_mut())
        .zip(order.par_iter())
        .for_each(|((path, isect), &idx)| {
            *path = paths[idx];
            *isect = intersections[idx];
        });
    std::mem::swap(&mut pool.paths, &mut pool.sorted_paths);
    std::mem::swap(&mut pool.intersections, &mut pool.sorted_intersections);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliases::Vec3;
    use crate::path::PathSegment;
    use crate::ray::Ray;

    fn pool_with(materials: &[Option<usize>]) -> PathPool {
        let mut pool = PathPool::with_capacity(materials.len() + 2);
        pool.reset_active();
        for (slot, mat) in materials.iter().enumerate() {
            pool.paths[slot] = PathSegment::new(
                Ray::new(&Vec3::zeros(), &Vec3::new(0.0, 0.0, -1.0)),
                slot,
                5,
            );
            pool.intersections[slot] = match mat {
                Some(id) => Intersection {
                    t: 1.0 + slot as f32,
                    material_id: *id,
                    normal: Vec3::new(0.0, 0.0, 1.0),
                    outside: true,
                },
                None => Intersection::miss(),
            };
        }
        pool.set_active_count(materials.len());
        pool
    }

    #[test]
    fn groups_by_material_and_keeps_pairs_together() {
        let mut pool = pool_with(&[Some(2), None, Some(0), Some(2), Some(1), Some(0)]);
        sort_by_material(&mut pool);
        let keys: Vec<usize> = pool.active_intersections().iter().map(material_key).collect();
        assert_eq!(keys, vec![0, 0, 1, 2, 2, usize::MAX]);
        // stable within a material, and every path still owns its own hit
        let pixels: Vec<usize> = pool.active_paths().iter().map(|p| p.pixel_index).collect();
        assert_eq!(pixels, vec![2, 5, 4, 0, 3, 1]);
        for (path, isect) in pool.active_paths().iter().zip(pool.active_intersections()) {
            if isect.is_hit() {
                assert_eq!(isect.t, 1.0 + path.pixel_index as f32);
            }
        }
    }

    #[test]
    fn only_the_active_prefix_is_touched() {
        let mut pool = pool_with(&[Some(1), Some(0)]);
        let capacity = pool.capacity();
        sort_by_material(&mut pool);
        assert_eq!(pool.capacity(), capacity);
        assert_eq!(pool.active_count(), 2);
        assert_eq!(pool.active_paths()[0].pixel_index, 1);
    }
}
