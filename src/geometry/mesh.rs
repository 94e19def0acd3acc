use crate::aabb::Aabb;
use crate::aliases::Vec3;
use crate::hit_record::HitRecord;
use crate::ray::Ray;
use std::ops::Range;

const PARALLEL_EPSILON: f32 = 1e-9;

/// World-space vertex backing mesh geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    /// Zero when the mesh provides no vertex normals.
    pub normal: Vec3,
}

/// Indices into `MeshBuffers::vertices`, counter-clockwise seen from the front.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Triangle(pub [u32; 3]);

/// Vertex and triangle storage shared by every mesh of a scene.
#[derive(Clone, Debug, Default)]
pub struct MeshBuffers {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

/// One mesh object's slice of the shared buffers.
#[derive(Clone, Debug)]
pub struct MeshRange {
    pub triangles: Range<usize>,
    pub bounds: Aabb,
    /// Interpolate vertex normals instead of using face normals.
    pub smooth: bool,
    /// False for meshes that rays may travel inside of (transmissive ones).
    pub cullable: bool,
}

impl MeshBuffers {
    /// Appends world-space vertices and triangles with indices relative to
    /// `vertices`, returning the new triangle range and its bounds.
    pub fn append(&mut self, vertices: &[Vertex], triangles: &[Triangle]) -> (Range<usize>, Aabb) {
        let base = self.vertices.len() as u32;
        let first = self.triangles.len();
        self.vertices.extend_from_slice(vertices);
        self.triangles.extend(
            triangles
                .iter()
                .map(|tri| Triangle([tri.0[0] + base, tri.0[1] + base, tri.0[2] + base])),
        );
        let bounds: Aabb = vertices.iter().map(|v| &v.position).collect();
        (first..self.triangles.len(), bounds)
    }
}

/// Möller-Trumbore test of one triangle. Returns (t, u, v, geometric normal).
fn hit_triangle(
    p: [&Vec3; 3],
    ray: &Ray,
    cull_back_faces: bool,
) -> Option<(f32, f32, f32, Vec3)> {
    let e1 = p[1] - p[0];
    let e2 = p[2] - p[0];
    let pvec = ray.direction.cross(&e2);
    let det = e1.dot(&pvec);
    // det > 0 iff the ray sees the front (counter-clockwise) side
    if cull_back_faces {
        if det < PARALLEL_EPSILON {
            return None;
        }
    } else if det.abs() < PARALLEL_EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - p[0];
    let u = s.dot(&pvec) * inv_det;
    if u < 0.0 || u > 1.0 {
        return None;
    }
    let q = s.cross(&e1);
    let v = ray.direction.dot(&q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(&q) * inv_det;
    if t <= 0.0 {
        return None;
    }
    Some((t, u, v, e1.cross(&e2).normalize()))
}

/// Nearest triangle of `range` along `ray`, ties going to the earlier triangle.
pub fn hit(range: &MeshRange, buffers: &MeshBuffers, ray: &Ray, cull_back_faces: bool) -> Option<HitRecord> {
    if !range.bounds.inflated(1e-4).hit(ray, 0.0, f32::INFINITY) {
        return None;
    }
    let cull = cull_back_faces && range.cullable;
    let mut nearest: Option<(f32, f32, f32, Vec3, usize)> = None;
    for idx in range.triangles.clone() {
        let tri = &buffers.triangles[idx];
        let p = [
            &buffers.vertices[tri.0[0] as usize].position,
            &buffers.vertices[tri.0[1] as usize].position,
            &buffers.vertices[tri.0[2] as usize].position,
        ];
        if let Some((t, u, v, n)) = hit_triangle(p, ray, cull) {
            if nearest.map_or(true, |cur| t < cur.0) {
                nearest = Some((t, u, v, n, idx));
            }
        }
    }
    nearest.map(|(t, u, v, geometric, idx)| {
        let outside = ray.direction.dot(&geometric) < 0.0;
        let mut normal = geometric;
        if range.smooth {
            let tri = &buffers.triangles[idx];
            let interpolated = (1.0 - u - v) * buffers.vertices[tri.0[0] as usize].normal
                + u * buffers.vertices[tri.0[1] as usize].normal
                + v * buffers.vertices[tri.0[2] as usize].normal;
            // keep the shading normal on the geometric side
            if interpolated.norm_squared() > 0.0 && interpolated.dot(&geometric) > 0.0 {
                normal = interpolated.normalize();
            }
        }
        HitRecord { t, normal, outside }
    })
}
