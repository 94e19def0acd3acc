//! Image accumulator and output frames.

use crate::aliases::Vec3;
use crate::error::Result;
use crate::util::clamp_vec3;
use crossbeam::atomic::AtomicCell;
use rayon::prelude::*;
use std::path::Path;

/// Running per-pixel radiance sums, safe to add to from many threads.
/// After k iterations each pixel holds the sum (not the average) of the k
/// per-iteration contributions.
pub struct Accumulator {
    width: usize,
    height: usize,
    // f32 bit patterns
    sum: Vec<[AtomicCell<u32>; 3]>,
}

fn atomic_add(cell: &AtomicCell<u32>, value: f32) {
    let mut current = cell.load();
    loop {
        let next = (f32::from_bits(current) + value).to_bits();
        match cell.compare_exchange(current, next) {
            Ok(_) => return,
            Err(actual) => current = actual,
        }
    }
}

fn atomic_load(cell: &AtomicCell<u32>) -> f32 {
    f32::from_bits(cell.load())
}

impl Accumulator {
    pub fn new(width: usize, height: usize) -> Self {
        Accumulator {
            width,
            height,
            sum: (0..width * height)
                .map(|_| [AtomicCell::new(0), AtomicCell::new(0), AtomicCell::new(0)])
                .collect(),
        }
    }
    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn len(&self) -> usize {
        self.sum.len()
    }
    pub fn is_empty(&self) -> bool {
        self.sum.is_empty()
    }
    /// Adds `color` to the pixel. Order-independent across calls.
    pub fn add(&self, pixel_index: usize, color: &Vec3) {
        let px = &self.sum[pixel_index];
        for c in 0..3 {
            if color[c] != 0.0 {
                atomic_add(&px[c], color[c]);
            }
        }
    }
    pub fn get(&self, pixel_index: usize) -> Vec3 {
        let px = &self.sum[pixel_index];
        Vec3::new(atomic_load(&px[0]), atomic_load(&px[1]), atomic_load(&px[2]))
    }
    pub fn snapshot(&self) -> Vec<Vec3> {
        (0..self.sum.len())
            .into_par_iter()
            .map(|idx| self.get(idx))
            .collect()
    }
    /// Per-pixel average over `iterations`.
    pub fn normalized(&self, iterations: u32) -> Vec<Vec3> {
        let count = iterations.max(1) as f32;
        (0..self.sum.len())
            .into_par_iter()
            .map(|idx| self.get(idx) / count)
            .collect()
    }
    pub fn reset(&mut self) {
        for px in &self.sum {
            for c in px {
                c.store(0.0f32.to_bits());
            }
        }
    }
}

/// A finished image: linear RGB, averaged over iterations.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Vec3>,
    pub denoised: bool,
}

impl Frame {
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut buffer = vec![0u8; self.width * self.height * 3];
        for (idx, px) in self.pixels.iter().enumerate() {
            let col = clamp_vec3(px, 0.0, 1.0);
            buffer[idx * 3] = (255.99 * col[0]) as u8;
            buffer[idx * 3 + 1] = (255.99 * col[1]) as u8;
            buffer[idx * 3 + 2] = (255.99 * col[2]) as u8;
        }
        buffer
    }
    pub fn save_png(&self, path: &Path) -> Result<()> {
        image::save_buffer_with_format(
            path,
            &self.to_rgb8(),
            self.width as u32,
            self.height as u32,
            image::ColorType::Rgb8,
            image::ImageFormat::Png,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrent_adds_are_not_lost() {
        let acc = Accumulator::new(4, 1);
        (0..40_000usize).into_par_iter().for_each(|i| {
            acc.add(i % 4, &Vec3::new(1.0, 0.5, 0.25));
        });
        for idx in 0..4 {
            assert_eq!(acc.get(idx), Vec3::new(10_000.0, 5_000.0, 2_500.0));
        }
    }

    #[test]
    fn sum_is_independent_of_add_order() {
        let values: Vec<Vec3> = (0..64)
            .map(|i| Vec3::new(i as f32 * 0.25, 1.0, 0.5))
            .collect();
        let forward = Accumulator::new(1, 1);
        let backward = Accumulator::new(1, 1);
        values.iter().for_each(|v| forward.add(0, v));
        values.iter().rev().for_each(|v| backward.add(0, v));
        assert_eq!(forward.get(0), backward.get(0));
    }

    #[test]
    fn normalized_divides_by_iterations() {
        let mut acc = Accumulator::new(2, 1);
        acc.add(1, &Vec3::new(3.0, 6.0, 9.0));
        assert_eq!(acc.normalized(3)[1], Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(acc.snapshot()[0], Vec3::zeros());
        acc.reset();
        assert_eq!(acc.get(1), Vec3::zeros());
    }

    #[test]
    fn png_round_trips_through_the_image_crate() {
        let frame = Frame {
            width: 2,
            height: 1,
            pixels: vec![Vec3::new(1.0, 0.0, 2.0), Vec3::new(-1.0, 0.5, 0.0)],
            denoised: false,
        };
        assert_eq!(frame.to_rgb8(), vec![255, 0, 255, 0, 127, 0]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        frame.save_png(&path).unwrap();
        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (2, 1));
        assert_eq!(img.get_pixel(1, 0).0, [0, 127, 0]);
    }
}
