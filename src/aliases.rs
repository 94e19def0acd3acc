use nalgebra as na;
use rand::rngs::SmallRng;

pub type Vec3 = na::Vector3<f32>;
pub type Vec2 = na::Vector2<f32>;
pub type Mat3 = na::Matrix3<f32>;
pub type RandGen = SmallRng;
