//! Scene primitives and their ray tests.

pub mod cube;
pub mod mesh;
pub mod sphere;

use crate::affine::Affine;
use crate::hit_record::HitRecord;
use crate::material::MaterialId;
use crate::ray::Ray;
use mesh::{MeshBuffers, MeshRange};

#[derive(Clone, Debug)]
pub enum Shape {
    /// Unit cube centered at the origin in object space.
    Cube,
    /// Sphere of radius 0.5 centered at the origin in object space.
    Sphere,
    /// Triangles already transformed to world space.
    Mesh(MeshRange),
}

/// One object of the scene. Immutable after scene load.
#[derive(Clone, Debug)]
pub struct Geometry {
    pub shape: Shape,
    pub material_id: MaterialId,
    transform: Affine,
    inv_transform: Affine,
}

impl Geometry {
    pub fn new(shape: Shape, material_id: MaterialId, transform: Affine) -> Self {
        Geometry {
            shape,
            material_id,
            transform,
            inv_transform: transform.inverse(),
        }
    }
    pub fn transform(&self) -> &Affine {
        &self.transform
    }
    /// Nearest hit with strictly positive `t`, if any.
    /// * `cull_back_faces` - only consulted for meshes that allow it
    pub fn hit(&self, ray: &Ray, meshes: &MeshBuffers, cull_back_faces: bool) -> Option<HitRecord> {
        match self.shape {
            Shape::Cube => cube::hit(&ray.get_transformed(&self.inv_transform))
                .map(|rec| rec.get_transformed(&self.transform)),
            Shape::Sphere => sphere::hit(&ray.get_transformed(&self.inv_transform))
                .map(|rec| rec.get_transformed(&self.transform)),
            Shape::Mesh(ref range) => mesh::hit(range, meshes, ray, cull_back_faces),
        }
    }
}
