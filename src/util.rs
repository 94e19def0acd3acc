use crate::aliases::Vec3;

pub fn zipwith_vec3(lhs: &Vec3, rhs: &Vec3, zipper: impl Fn(f32, f32) -> f32) -> Vec3 {
    Vec3::new(
        zipper(lhs[0], rhs[0]),
        zipper(lhs[1], rhs[1]),
        zipper(lhs[2], rhs[2]),
    )
}

pub fn min_vec3(lhs: &Vec3, rhs: &Vec3) -> Vec3 {
    zipwith_vec3(lhs, rhs, f32::min)
}

pub fn max_vec3(lhs: &Vec3, rhs: &Vec3) -> Vec3 {
    zipwith_vec3(lhs, rhs, f32::max)
}

pub fn clamp_vec3(v: &Vec3, lo: f32, hi: f32) -> Vec3 {
    v.map(|x| x.max(lo).min(hi))
}

pub fn is_finite_vec3(v: &Vec3) -> bool {
    v.iter().all(|x| x.is_finite())
}
