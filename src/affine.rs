use crate::aliases::{Mat3, Vec3};
use nalgebra::{Rotation3, Vector3};

/// 3d invertible affine transformation
#[derive(Clone, Copy, Debug)]
pub struct Affine {
    a: Mat3,
    b: Vec3,
    a_inv: Mat3, // the inverse matrix of a
}

impl Affine {
    /// Returns None when `a` is singular.
    fn new(a: &Mat3, b: &Vec3) -> Option<Self> {
        a.try_inverse().map(|a_inv| Affine {
            a: *a,
            b: *b,
            a_inv: a_inv,
        })
    }
    /// Object-to-world transformation: translate * rot_x * rot_y * rot_z * scale.
    /// Rotation angles are in degrees.
    /// Returns None when some scale component is zero.
    pub fn from_trs(translation: &Vec3, rotation_deg: &Vec3, scale: &Vec3) -> Option<Self> {
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), rotation_deg[0].to_radians());
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), rotation_deg[1].to_radians());
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), rotation_deg[2].to_radians());
        let linear = (rx * ry * rz).matrix() * Mat3::from_diagonal(scale);
        Affine::new(&linear, translation)
    }
    /// Creates inverse transformation of self
    pub fn inverse(&self) -> Affine {
        Affine {
            a: self.a_inv,
            b: -self.a_inv * self.b,
            a_inv: self.a,
        }
    }
    /// Determinant of the linear part; negative when the transform mirrors.
    pub fn determinant(&self) -> f32 {
        self.a.determinant()
    }
    /// Act on a point.
    pub fn act_point(&self, pt: &Vec3) -> Vec3 {
        self.a * pt + self.b
    }
    /// Act on a 1-vector (e.g., difference of two points)
    pub fn act_vec(&self, v: &Vec3) -> Vec3 {
        self.a * v
    }
    /// Act on a surface normal. The result is not normalized.
    pub fn act_normal(&self, n: &Vec3) -> Vec3 {
        self.a_inv.transpose() * n
    }
}
