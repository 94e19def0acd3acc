//! Render settings shared by the library and the command line.

use crate::denoise::AtrousDenoiser;
use std::fmt;
use std::str::FromStr;

/// When the denoising filter runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenoiseMode {
    Off,
    /// Only the frame of the last iteration is denoised.
    Final,
    /// Every presented frame is denoised, previews included.
    EveryIteration,
}

impl FromStr for DenoiseMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(DenoiseMode::Off),
            "final" => Ok(DenoiseMode::Final),
            "every" => Ok(DenoiseMode::EveryIteration),
            _ => Err(format!(
                "unknown denoise mode '{}' (expected off, final or every)",
                s
            )),
        }
    }
}

impl fmt::Display for DenoiseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DenoiseMode::Off => "off",
            DenoiseMode::Final => "final",
            DenoiseMode::EveryIteration => "every",
        })
    }
}

/// Largest trace depth a path's bounce counter can hold.
pub const MAX_TRACE_DEPTH: u32 = i32::MAX as u32;

#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
    pub iterations: u32,
    /// Maximum number of bounces per path and iteration.
    pub max_depth: u32,
    pub sort_materials: bool,
    pub cull_back_faces: bool,
    pub denoise: DenoiseMode,
    pub denoiser: AtrousDenoiser,
    /// Produce a preview frame every n iterations. The last iteration always
    /// produces a frame.
    pub preview_every: Option<u32>,
    /// Worker threads; rayon's default when `None`.
    pub threads: Option<usize>,
}

impl RenderSettings {
    pub fn new(iterations: u32, max_depth: u32) -> Self {
        RenderSettings {
            iterations,
            max_depth,
            sort_materials: true,
            cull_back_faces: false,
            denoise: DenoiseMode::Final,
            denoiser: AtrousDenoiser::default(),
            preview_every: None,
            threads: None,
        }
    }
    /// Rejects settings the scheduler cannot run.
    pub fn check(&self) -> Result<(), String> {
        if self.iterations == 0 {
            return Err("iterations must be positive".to_string());
        }
        if self.max_depth == 0 || self.max_depth > MAX_TRACE_DEPTH {
            return Err(format!(
                "depth must lie in 1..={}, got {}",
                MAX_TRACE_DEPTH, self.max_depth
            ));
        }
        Ok(())
    }
    pub fn wants_preview(&self, completed: u32) -> bool {
        match self.preview_every {
            Some(n) if n > 0 => completed % n == 0,
            _ => false,
        }
    }
}
