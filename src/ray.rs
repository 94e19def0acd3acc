use crate::affine::Affine;
use crate::aliases::Vec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3, // normalized
}

impl Ray {
    pub fn new(origin: &Vec3, direction: &Vec3) -> Self {
        Ray {
            origin: *origin,
            direction: direction.normalize(),
        }
    }
    pub fn evaluate(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }
    /// Moves the ray into the space of `tr`.
    /// The direction is left unnormalized so that parameters stay comparable
    /// between the two spaces.
    pub fn get_transformed(&self, tr: &Affine) -> Ray {
        Ray {
            origin: tr.act_point(&self.origin),
            direction: tr.act_vec(&self.direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_direction() {
        let ray = Ray::new(&Vec3::new(1.0, 2.0, 3.0), &Vec3::new(0.0, 0.0, -5.0));
        assert_eq!(ray.direction, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(ray.evaluate(2.0), Vec3::new(1.0, 2.0, 1.0));
    }
}
