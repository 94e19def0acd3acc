//! Iteration scheduler.
//!
//! One iteration walks `Generate -> Bounce(0) -> .. -> Bounce(n) ->
//! Accumulate -> Denoise`. Every stage runs over the whole active set and
//! finishes before the next one starts.

use crate::aliases::Vec3;
use crate::camera::generate_paths;
use crate::compact::{compact, flush};
use crate::config::{DenoiseMode, RenderSettings};
use crate::denoise::{DenoiseError, Denoiser};
use crate::film::{Accumulator, Frame};
use crate::intersect::compute_intersections;
use crate::path::PathPool;
use crate::scene::Scene;
use crate::shade::shade_paths;
use crate::sort::sort_by_material;
use tracing::{debug, info, info_span, trace, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Generate,
    Bounce(u32),
    Accumulate,
    Denoise,
    Done,
}

/// What one iteration did.
#[derive(Clone, Debug)]
pub struct IterationReport {
    /// Zero-based index of the iteration.
    pub iteration: u32,
    /// Active path count entering each bounce. Never increases.
    pub active_counts: Vec<usize>,
    /// Paths still in flight when the depth limit ended the bounce loop.
    pub flushed: usize,
    /// Present on preview iterations and on the last one.
    pub frame: Option<Frame>,
    /// Set when the denoiser failed and the raw image was presented instead.
    pub denoise_error: Option<DenoiseError>,
}

impl IterationReport {
    pub fn bounces(&self) -> usize {
        self.active_counts.len()
    }
}

/// Owns every per-render buffer. All of them are sized once here; an
/// iteration only resets the pool's active count.
pub struct RenderSession {
    scene: Scene,
    settings: RenderSettings,
    pool: PathPool,
    accumulator: Accumulator,
    normals: Vec<Vec3>,
    denoiser: Box<dyn Denoiser>,
    iteration: u32,
}

impl RenderSession {
    /// Uses the à-trous filter configured in `settings`.
    pub fn new(scene: Scene, settings: RenderSettings) -> Self {
        let denoiser = Box::new(settings.denoiser);
        Self::with_denoiser(scene, settings, denoiser)
    }
    pub fn with_denoiser(scene: Scene, settings: RenderSettings, denoiser: Box<dyn Denoiser>) -> Self {
        let width = scene.camera.width();
        let height = scene.camera.height();
        let pixels = scene.camera.pixel_count();
        debug!(width, height, "allocating render buffers");
        RenderSession {
            pool: PathPool::with_capacity(pixels),
            accumulator: Accumulator::new(width, height),
            normals: vec![Vec3::zeros(); pixels],
            scene,
            settings,
            denoiser,
            iteration: 0,
        }
    }
    pub fn scene(&self) -> &Scene {
        &self.scene
    }
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }
    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }
    /// Per-pixel first-hit normals of the latest iteration; zero where the
    /// primary ray missed.
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }
    /// Number of iterations accumulated so far.
    pub fn completed_iterations(&self) -> u32 {
        self.iteration
    }
    pub fn is_finished(&self) -> bool {
        self.iteration >= self.settings.iterations
    }
    /// Drops the accumulated image; the next iteration starts from zero.
    pub fn reset(&mut self) {
        self.accumulator.reset();
        self.iteration = 0;
    }

    pub fn run_iteration(&mut self) -> IterationReport {
        let iteration = self.iteration;
        let _span = info_span!("iteration", iteration).entered();
        let mut report = IterationReport {
            iteration,
            active_counts: Vec::new(),
            flushed: 0,
            frame: None,
            denoise_error: None,
        };
        let max_depth = self.settings.max_depth;
        let mut stage = Stage::Generate;
        while stage != Stage::Done {
            trace!(?stage);
            stage = match stage {
                Stage::Generate => {
                    generate_paths(&mut self.pool, &self.scene.camera, iteration, max_depth);
                    self.normals.iter_mut().for_each(|n| *n = Vec3::zeros());
                    Stage::Bounce(0)
                }
                Stage::Bounce(depth) => {
                    let entering = self.pool.active_count();
                    report.active_counts.push(entering);
                    compute_intersections(
                        &mut self.pool,
                        &self.scene.geometries,
                        &self.scene.meshes,
                        self.settings.cull_back_faces,
                        depth,
                        &mut self.normals,
                    );
                    if self.settings.sort_materials {
                        sort_by_material(&mut self.pool);
                    }
                    shade_paths(&mut self.pool, &self.scene.materials, iteration, depth);
                    let alive = compact(&mut self.pool, &self.accumulator);
                    debug_assert!(alive <= entering);
                    debug!(depth, entering, alive, "bounce");
                    if alive > 0 && depth + 1 < max_depth {
                        Stage::Bounce(depth + 1)
                    } else {
                        Stage::Accumulate
                    }
                }
                Stage::Accumulate => {
                    report.flushed = flush(&mut self.pool, &self.accumulator);
                    if report.flushed > 0 {
                        debug!(paths = report.flushed, "depth limit reached, flushing");
                    }
                    self.iteration += 1;
                    Stage::Denoise
                }
                Stage::Denoise => {
                    let last = self.is_finished();
                    if last || self.settings.wants_preview(self.iteration) {
                        let denoise = match self.settings.denoise {
                            DenoiseMode::Off => false,
                            DenoiseMode::Final => last,
                            DenoiseMode::EveryIteration => true,
                        };
                        let (frame, error) = self.present(denoise);
                        report.frame = Some(frame);
                        report.denoise_error = error;
                    }
                    Stage::Done
                }
                Stage::Done => Stage::Done,
            };
        }
        report
    }

    /// Averages the accumulator and optionally denoises it. On filter
    /// failure the raw average is returned together with the error.
    pub fn present(&self, denoise: bool) -> (Frame, Option<DenoiseError>) {
        let width = self.accumulator.width();
        let height = self.accumulator.height();
        let raw = self.accumulator.normalized(self.iteration);
        if !denoise {
            return (
                Frame {
                    width,
                    height,
                    pixels: raw,
                    denoised: false,
                },
                None,
            );
        }
        match self.denoiser.denoise(&raw, &self.normals, width, height) {
            Ok(pixels) => (
                Frame {
                    width,
                    height,
                    pixels,
                    denoised: true,
                },
                None,
            ),
            Err(e) => {
                warn!("denoiser failed, presenting the raw image: {}", e);
                (
                    Frame {
                        width,
                        height,
                        pixels: raw,
                        denoised: false,
                    },
                    Some(e),
                )
            }
        }
    }

    /// Runs the remaining iterations, handing every report to
    /// `on_iteration`, and returns the final frame.
    pub fn render(&mut self, mut on_iteration: impl FnMut(&IterationReport)) -> Frame {
        let _span = info_span!("render", iterations = self.settings.iterations).entered();
        let mut last_frame = None;
        while !self.is_finished() {
            let mut report = self.run_iteration();
            on_iteration(&report);
            if self.is_finished() {
                last_frame = report.frame.take();
            }
        }
        info!(iterations = self.iteration, "render finished");
        match last_frame {
            Some(frame) => frame,
            None => self.present(self.settings.denoise != DenoiseMode::Off).0,
        }
    }
}
