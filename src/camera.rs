use crate::aliases::Vec3;
use crate::path::{PathPool, PathSegment};
use crate::ray::Ray;
use crate::sampling::{path_rng, rnd_in_unit_disc, Salt};
use rand::Rng;
use rayon::prelude::*;

/// Pinhole or thin-lens camera. Pixel (0, 0) is the top-left corner and
/// pixel indices are row-major.
#[derive(Clone, Debug)]
pub struct Camera {
    width: usize,
    height: usize,
    lower_left_corner: Vec3, // on the focal plane
    horizontal: Vec3,
    vertical: Vec3,
    origin: Vec3,
    lens_radius: f32,
    u: Vec3, // a unit vector directing right
    v: Vec3, // a unit vector directing up
}

impl Camera {
    /// * `vfov` - vertical field of view in degrees
    /// * `lens_radius` - 0 disables depth of field
    /// * `focus_dist` - distance from `look_from` to the plane in focus
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        width: usize,
        height: usize,
        look_from: &Vec3,
        look_at: &Vec3,
        view_up: &Vec3,
        vfov: f32,
        lens_radius: f32,
        focus_dist: f32,
    ) -> Self {
        let aspect = width as f32 / height as f32;
        let half_height = (vfov.to_radians() * 0.5).tan();
        let half_width = aspect * half_height;
        let origin = *look_from;
        let w = (look_from - look_at).normalize();
        let u = view_up.cross(&w).normalize();
        let v = w.cross(&u);
        let lower_left_corner = origin - focus_dist * (half_width * u + half_height * v + w);
        let horizontal = u * 2.0 * focus_dist * half_width;
        let vertical = v * 2.0 * focus_dist * half_height;
        Camera {
            width,
            height,
            lower_left_corner,
            horizontal,
            vertical,
            origin,
            lens_radius,
            u,
            v,
        }
    }
    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
    /// Primary ray through a jittered sample of the pixel.
    /// Anti-aliasing and lens samples come from separately salted streams.
    pub fn get_ray(&self, pixel_index: usize, iteration: u32) -> Ray {
        let x = (pixel_index % self.width) as f32;
        let y = (pixel_index / self.width) as f32;
        let mut aa_rng = path_rng(iteration, pixel_index, 0, Salt::AntiAlias);
        let s = (x + aa_rng.gen::<f32>()) / self.width as f32;
        let t = 1.0 - (y + aa_rng.gen::<f32>()) / self.height as f32;
        let focal_point = self.lower_left_corner + s * self.horizontal + t * self.vertical;
        if self.lens_radius > 0.0 {
            let mut lens_rng = path_rng(iteration, pixel_index, 0, Salt::DepthOfField);
            let r = self.lens_radius * rnd_in_unit_disc(&mut lens_rng);
            let origin = self.origin + r.x * self.u + r.y * self.v;
            Ray::new(&origin, &(focal_point - origin))
        } else {
            Ray::new(&self.origin, &(focal_point - self.origin))
        }
    }
}

/// Fills the whole pool with one fresh path per pixel; slot i holds pixel i.
pub fn generate_paths(pool: &mut PathPool, camera: &Camera, iteration: u32, trace_depth: u32) {
    debug_assert_eq!(pool.capacity(), camera.pixel_count());
    let depth = i32::try_from(trace_depth).unwrap_or(i32::MAX);
    pool.all_paths_mut()
        .par_iter_mut()
        .enumerate()
        .for_each(|(pixel_index, path)| {
            *path = PathSegment::new(
                camera.get_ray(pixel_index, iteration),
                pixel_index,
                depth,
            );
        });
    pool.reset_active();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(lens_radius: f32) -> Camera {
        Camera::new(
            8,
            4,
            &Vec3::new(0.0, 0.0, 10.0),
            &Vec3::zeros(),
            &Vec3::new(0.0, 1.0, 0.0),
            45.0,
            lens_radius,
            10.0,
        )
    }

    #[test]
    fn rays_stay_inside_their_pixel_footprint() {
        let cam = camera(0.0);
        let half_height = (22.5f32).to_radians().tan();
        let half_width = 2.0 * half_height;
        for iteration in 0..20 {
            // top-left and bottom-right pixels
            let tl = cam.get_ray(0, iteration);
            assert_eq!(tl.origin, Vec3::new(0.0, 0.0, 10.0));
            let p = tl.evaluate(10.0 / -tl.direction[2]);
            assert!(p.x <= -half_width * 10.0 * 0.75 + 1e-3 && p.x >= -half_width * 10.0 - 1e-3);
            assert!(p.y >= half_height * 10.0 * 0.5 - 1e-3 && p.y <= half_height * 10.0 + 1e-3);
            let br = cam.get_ray(31, iteration);
            let q = br.evaluate(10.0 / -br.direction[2]);
            assert!(q.x >= half_width * 10.0 * 0.75 - 1e-3);
            assert!(q.y <= -half_height * 10.0 * 0.5 + 1e-3);
        }
    }

    #[test]
    fn same_iteration_and_pixel_give_the_same_ray() {
        let cam = camera(0.5);
        assert_eq!(cam.get_ray(5, 3), cam.get_ray(5, 3));
        assert_ne!(cam.get_ray(5, 3), cam.get_ray(5, 4));
    }

    #[test]
    fn lens_rays_converge_on_the_focal_plane() {
        let pinhole = camera(0.0);
        let lens = camera(0.5);
        let mut moved = false;
        for iteration in 0..10 {
            let a = pinhole.get_ray(13, iteration);
            let b = lens.get_ray(13, iteration);
            moved |= (a.origin - b.origin).norm() > 1e-4;
            let pa = a.evaluate((0.0 - a.origin[2]) / a.direction[2]);
            let pb = b.evaluate((0.0 - b.origin[2]) / b.direction[2]);
            assert!((pa - pb).norm() < 1e-3);
        }
        assert!(moved);
    }

    #[test]
    fn generation_fills_every_slot() {
        let cam = camera(0.0);
        let mut pool = PathPool::with_capacity(cam.pixel_count());
        generate_paths(&mut pool, &cam, 0, 5);
        assert_eq!(pool.active_count(), 32);
        for (slot, path) in pool.active_paths().iter().enumerate() {
            assert_eq!(path.pixel_index, slot);
            assert_eq!(path.remaining_bounces, 5);
            assert_eq!(path.throughput, Vec3::new(1.0, 1.0, 1.0));
        }
    }

    #[test]
    fn oversized_trace_depth_saturates() {
        let cam = camera(0.0);
        let mut pool = PathPool::with_capacity(cam.pixel_count());
        generate_paths(&mut pool, &cam, 0, u32::MAX);
        assert!(pool
            .active_paths()
            .iter()
            .all(|path| path.remaining_bounces == i32::MAX && !path.is_terminated()));
    }
}
