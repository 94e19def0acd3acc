use crate::aliases::Vec3;

/// Outcome of a material interaction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScatterRecord {
    /// The path reached a light source and ends here.
    Emitted { radiance: Vec3 },
    /// The path continues along `dir` (normalized).
    Scattered { attenuation: Vec3, dir: Vec3 },
}
