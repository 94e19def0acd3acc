use crate::aliases::{RandGen, Vec3};
use crate::onb::Onb;
use crate::sampling::random_cosine_direction;

/// Cosine-weighted direction about `normal`.
/// The cosine and the 1/pi of the Lambertian BRDF cancel against the density,
/// so the path weight is just the albedo.
pub fn scatter(normal: &Vec3, rng: &mut RandGen) -> Vec3 {
    Onb::build_from_w(normal)
        .local_to_global_vec(&random_cosine_direction(rng))
        .normalize()
}
