//! Denoising post-process.
//!
//! A `Denoiser` maps a color buffer plus a normal guide buffer to a new color
//! buffer of the same size. Calls share no state. The bundled filter is an
//! edge-avoiding à-trous wavelet transform (Dammertz et al. 2010) guided by
//! color and normal similarity.

use crate::aliases::Vec3;
use crate::util::is_finite_vec3;
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DenoiseError {
    #[error("color buffer has {actual} pixels, expected {expected}")]
    ColorSize { expected: usize, actual: usize },

    #[error("normal buffer has {actual} pixels, expected {expected}")]
    NormalSize { expected: usize, actual: usize },

    #[error("filter produced a non-finite value at pixel {0}")]
    NonFinite(usize),

    #[error("filter failed: {0}")]
    Filter(String),
}

pub trait Denoiser: Send + Sync {
    /// Returns a fresh denoised buffer; the inputs are never written.
    fn denoise(
        &self,
        color: &[Vec3],
        normals: &[Vec3],
        width: usize,
        height: usize,
    ) -> Result<Vec<Vec3>, DenoiseError>;
}

/// Checks buffer sizes against the resolution.
pub fn check_buffers(
    color: &[Vec3],
    normals: &[Vec3],
    width: usize,
    height: usize,
) -> Result<(), DenoiseError> {
    let expected = width * height;
    if color.len() != expected {
        return Err(DenoiseError::ColorSize {
            expected,
            actual: color.len(),
        });
    }
    if normals.len() != expected {
        return Err(DenoiseError::NormalSize {
            expected,
            actual: normals.len(),
        });
    }
    Ok(())
}

// B3 spline
const KERNEL: [f32; 5] = [1.0 / 16.0, 1.0 / 4.0, 3.0 / 8.0, 1.0 / 4.0, 1.0 / 16.0];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtrousDenoiser {
    /// Number of filter passes, at most 16; the step width doubles with each.
    pub levels: u32,
    pub sigma_color: f32,
    pub sigma_normal: f32,
}

impl Default for AtrousDenoiser {
    fn default() -> Self {
        AtrousDenoiser {
            levels: 5,
            sigma_color: 0.5,
            sigma_normal: 0.35,
        }
    }
}

// a step of 2^16 pixels already spans any image
const MAX_LEVELS: u32 = 16;

impl AtrousDenoiser {
    fn pass(
        &self,
        src: &[Vec3],
        dst: &mut [Vec3],
        normals: &[Vec3],
        width: usize,
        height: usize,
        level: u32,
    ) {
        let step = 1i64 << level;
        // the color edge-stopping tightens as coarser levels smooth the noise
        let sigma_color = self.sigma_color / (1u32 << level) as f32;
        let inv_color = 1.0 / (sigma_color * sigma_color).max(1e-12);
        let inv_normal = 1.0 / (self.sigma_normal * self.sigma_normal).max(1e-12);
        dst.par_iter_mut().enumerate().for_each(|(idx, out)| {
            let px = (idx % width) as i64;
            let py = (idx / width) as i64;
            let c_p = src[idx];
            let n_p = normals[idx];
            let mut sum = Vec3::zeros();
            let mut weight_sum = 0.0f32;
            for (ky, hy) in KERNEL.iter().enumerate() {
                let qy = py + (ky as i64 - 2) * step;
                if qy < 0 || qy >= height as i64 {
                    continue;
                }
                for (kx, hx) in KERNEL.iter().enumerate() {
                    let qx = px + (kx as i64 - 2) * step;
                    if qx < 0 || qx >= width as i64 {
                        continue;
                    }
                    let q = qy as usize * width + qx as usize;
                    let c_q = src[q];
                    let w_color = (-(c_p - c_q).norm_squared() * inv_color).exp();
                    let n_dist = (n_p - normals[q]).norm_squared() / (step * step) as f32;
                    let w_normal = (-n_dist.max(0.0) * inv_normal).exp();
                    let w = hx * hy * w_color * w_normal;
                    sum += w * c_q;
                    weight_sum += w;
                }
            }
            *out = if weight_sum > 0.0 { sum / weight_sum } else { c_p };
        });
    }
}

impl Denoiser for AtrousDenoiser {
    fn denoise(
        &self,
        color: &[Vec3],
        normals: &[Vec3],
        width: usize,
        height: usize,
    ) -> Result<Vec<Vec3>, DenoiseError> {
        check_buffers(color, normals, width, height)?;
        let mut src = color.to_vec();
        let mut dst = vec![Vec3::zeros(); color.len()];
        for level in 0..self.levels.min(MAX_LEVELS) {
            self.pass(&src, &mut dst, normals, width, height, level);
            std::mem::swap(&mut src, &mut dst);
        }
        if let Some(idx) = src.iter().position(|c| !is_finite_vec3(c)) {
            return Err(DenoiseError::NonFinite(idx));
        }
        Ok(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{path_rng, Salt};
    use rand::Rng;

    fn noisy_image(width: usize, height: usize) -> (Vec<Vec3>, Vec<Vec3>) {
        let mut color = Vec::new();
        let mut normals = Vec::new();
        for idx in 0..width * height {
            let mut rng = path_rng(0, idx, 0, Salt::Bsdf);
            let left = idx % width < width / 2;
            let base = if left { 0.2 } else { 0.8 };
            let noise = 0.1 * (rng.gen::<f32>() - 0.5);
            color.push(Vec3::new(base + noise, base + noise, base + noise));
            normals.push(if left {
                Vec3::new(0.0, 0.0, 1.0)
            } else {
                Vec3::new(1.0, 0.0, 0.0)
            });
        }
        (color, normals)
    }

    fn variance(pixels: &[Vec3]) -> f32 {
        let mean = pixels.iter().map(|c| c[0]).sum::<f32>() / pixels.len() as f32;
        pixels.iter().map(|c| (c[0] - mean).powi(2)).sum::<f32>() / pixels.len() as f32
    }

    #[test]
    fn reduces_noise_and_keeps_the_normal_edge() {
        let (width, height) = (32, 16);
        let (color, normals) = noisy_image(width, height);
        let out = AtrousDenoiser::default()
            .denoise(&color, &normals, width, height)
            .unwrap();
        assert_eq!(out.len(), color.len());
        let left = |buf: &[Vec3]| -> Vec<Vec3> {
            buf.iter()
                .enumerate()
                .filter(|(i, _)| i % width < width / 2)
                .map(|(_, c)| *c)
                .collect()
        };
        assert!(variance(&left(&out)) < 0.5 * variance(&left(&color)));
        // pixel right next to the edge stays on its own side
        let edge = 5 * width + width / 2 - 1;
        assert!((out[edge][0] - 0.2).abs() < 0.1);
    }

    #[test]
    fn constant_image_is_unchanged() {
        let color = vec![Vec3::new(0.3, 0.6, 0.9); 64];
        let normals = vec![Vec3::new(0.0, 1.0, 0.0); 64];
        let out = AtrousDenoiser::default()
            .denoise(&color, &normals, 8, 8)
            .unwrap();
        for c in out {
            assert!((c - Vec3::new(0.3, 0.6, 0.9)).norm() < 1e-5);
        }
    }

    #[test]
    fn excess_levels_are_capped() {
        let color: Vec<Vec3> = (0..64).map(|i| Vec3::repeat((i % 7) as f32 / 7.0)).collect();
        let normals = vec![Vec3::new(0.0, 1.0, 0.0); 64];
        let capped = AtrousDenoiser {
            levels: 16,
            ..AtrousDenoiser::default()
        };
        let deep = AtrousDenoiser {
            levels: 64,
            ..AtrousDenoiser::default()
        };
        assert_eq!(
            deep.denoise(&color, &normals, 8, 8).unwrap(),
            capped.denoise(&color, &normals, 8, 8).unwrap()
        );
    }

    #[test]
    fn mismatched_buffers_are_rejected() {
        let color = vec![Vec3::zeros(); 6];
        let normals = vec![Vec3::zeros(); 5];
        assert_eq!(
            AtrousDenoiser::default().denoise(&color, &normals, 3, 2),
            Err(DenoiseError::NormalSize {
                expected: 6,
                actual: 5
            })
        );
        assert_eq!(
            AtrousDenoiser::default().denoise(&color, &normals, 4, 2),
            Err(DenoiseError::ColorSize {
                expected: 8,
                actual: 6
            })
        );
    }

    #[test]
    fn non_finite_output_is_an_error() {
        let mut color = vec![Vec3::new(0.5, 0.5, 0.5); 16];
        color[3] = Vec3::new(f32::NAN, 0.0, 0.0);
        let normals = vec![Vec3::new(0.0, 0.0, 1.0); 16];
        assert!(matches!(
            AtrousDenoiser::default().denoise(&color, &normals, 4, 4),
            Err(DenoiseError::NonFinite(_))
        ));
    }
}
