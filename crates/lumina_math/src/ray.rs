use crate::{Point3, Transformation, Vec3};

/// A ray in 3D space, the parametric segment `origin + t * direction`
/// for `t` in the open interval `(tmin, tmax)`.
///
/// `depth` counts the bounces that produced this ray; primary rays have
/// depth 0. The direction is not required to be unit length.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vec3,
    pub tmin: f32,
    pub tmax: f32,
    pub depth: u32,
}

impl Ray {
    /// Create a primary ray with the default bounds `(1e-5, +inf)`.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            tmin: 1e-5,
            tmax: f32::INFINITY,
            depth: 0,
        }
    }

    /// The point along the ray at parameter t.
    pub fn at(&self, t: f32) -> Point3 {
        self.origin + self.direction * t
    }

    /// Apply a transformation to origin and direction, preserving the
    /// parameter bounds and the depth.
    pub fn transform(&self, transformation: &Transformation) -> Ray {
        Ray {
            origin: *transformation * self.origin,
            direction: *transformation * self.direction,
            ..*self
        }
    }

    pub fn is_close(&self, other: &Ray, epsilon: f32) -> bool {
        self.origin.is_close(other.origin, epsilon)
            && self.direction.abs_diff_eq(other.direction, epsilon)
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self::new(Point3::ORIGIN, Vec3::Z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Point3::new(1.0, 2.0, 4.0), Vec3::new(4.0, 2.0, 1.0));

        assert!(ray.at(0.0).is_close(ray.origin, 1e-6));
        assert!(ray.at(1.0).is_close(Point3::new(5.0, 4.0, 5.0), 1e-6));
        assert!(ray.at(2.0).is_close(Point3::new(9.0, 6.0, 6.0), 1e-6));
    }

    #[test]
    fn test_ray_transform() {
        let ray = Ray::new(Point3::new(1.0, 2.0, 3.0), Vec3::new(6.0, 5.0, 4.0));
        let t = Transformation::translation(Vec3::new(10.0, 11.0, 12.0))
            * Transformation::rotation_x(90.0);

        let transformed = ray.transform(&t);
        assert!(transformed.origin.is_close(Point3::new(11.0, 8.0, 14.0), 1e-5));
        assert!(transformed
            .direction
            .abs_diff_eq(Vec3::new(6.0, -4.0, 5.0), 1e-5));
        assert_eq!(transformed.tmin, ray.tmin);
        assert_eq!(transformed.tmax, ray.tmax);
        assert_eq!(transformed.depth, ray.depth);
    }

    #[test]
    fn test_ray_transform_round_trip() {
        let ray = Ray::new(Point3::new(1.0, -2.0, 0.5), Vec3::new(0.3, 0.4, -1.0));
        let t = Transformation::rotation_y(40.0)
            * Transformation::scaling(Vec3::new(2.0, 3.0, 4.0)).unwrap();

        let round_trip = ray.transform(&t).transform(&t.inverse());
        assert!(round_trip.is_close(&ray, 1e-5));
    }
}
