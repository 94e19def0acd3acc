pub mod diffuse;
pub mod specular;
pub mod transmissive;

use crate::aliases::{RandGen, Vec3};
use crate::scatter_record::ScatterRecord;

/// Identifies a material in the scene's material list.
pub type MaterialId = usize;

/// Light-transport behavior of a surface. Immutable after scene load.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Material {
    Emitting {
        color: Vec3,
        emittance: f32,
    },
    Diffuse {
        color: Vec3,
    },
    Specular {
        color: Vec3,
        roughness: f32,
    },
    Transmitting {
        color: Vec3,
        roughness: f32,
        transmittance: f32,
        ior: f32,
    },
}

impl Material {
    pub fn color(&self) -> Vec3 {
        match *self {
            Material::Emitting { color, .. }
            | Material::Diffuse { color }
            | Material::Specular { color, .. }
            | Material::Transmitting { color, .. } => color,
        }
    }
    pub fn is_transmissive(&self) -> bool {
        matches!(self, Material::Transmitting { .. })
    }
    /// Decides what happens to a path arriving along `in_dir`.
    /// * `normal` - normalized, facing against `in_dir`
    /// * `outside` - whether the path hit the front side of the surface
    pub fn scatter(
        &self,
        in_dir: &Vec3,
        normal: &Vec3,
        outside: bool,
        rng: &mut RandGen,
    ) -> ScatterRecord {
        match *self {
            Material::Emitting { color, emittance } => ScatterRecord::Emitted {
                radiance: color * emittance,
            },
            Material::Diffuse { color } => ScatterRecord::Scattered {
                attenuation: color,
                dir: diffuse::scatter(normal, rng),
            },
            Material::Specular { color, roughness } => ScatterRecord::Scattered {
                attenuation: color,
                dir: specular::scatter(in_dir, normal, roughness, rng),
            },
            Material::Transmitting {
                color,
                roughness,
                transmittance,
                ior,
            } => ScatterRecord::Scattered {
                attenuation: color,
                dir: transmissive::scatter(
                    in_dir,
                    normal,
                    outside,
                    ior,
                    transmittance,
                    roughness,
                    rng,
                ),
            },
        }
    }
}
