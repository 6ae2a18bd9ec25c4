//! Materials and their scattering contracts.
//!
//! A material answers four questions at a hit point: its albedo, its
//! emitted radiance, the BRDF value for a pair of angles, and where a
//! secondary ray goes. Materials are immutable after construction and
//! shared between shapes behind `Arc`.

use std::f32::consts::PI;
use std::sync::Arc;

use lumina_core::{Texture, UniformTexture};
use lumina_math::{Color, Pcg, PcgSample, Ray, Vec2, Vec3, BLACK};

use crate::shape::HitRecord;

/// Surface appearance: albedo, emission, BRDF and scattering.
pub trait Material: Send + Sync {
    /// Albedo color at the surface point.
    fn color(&self, uv: Vec2) -> Color;

    /// Emitted radiance at the surface point.
    fn emitted(&self, uv: Vec2) -> Color;

    /// BRDF value for the given incidence and reflection angles
    /// (radians from the surface normal).
    fn eval(&self, uv: Vec2, theta_in: f32, theta_out: f32) -> Color;

    /// Secondary ray leaving the hit point, with the given bounce
    /// depth.
    fn scatter(&self, pcg: &mut Pcg, hit: &HitRecord, depth: u32) -> Ray;
}

fn black_texture() -> Arc<dyn Texture> {
    Arc::new(UniformTexture::new(BLACK))
}

/// Lambertian diffuse material with cosine-weighted scattering.
pub struct Diffuse {
    albedo: Arc<dyn Texture>,
    emitted: Arc<dyn Texture>,
    reflectance: f32,
}

impl Diffuse {
    /// Diffuse material with full reflectance.
    pub fn new(albedo: Arc<dyn Texture>, emitted: Arc<dyn Texture>) -> Self {
        Self::with_reflectance(albedo, emitted, 1.0)
    }

    pub fn with_reflectance(
        albedo: Arc<dyn Texture>,
        emitted: Arc<dyn Texture>,
        reflectance: f32,
    ) -> Self {
        Self {
            albedo,
            emitted,
            reflectance,
        }
    }
}

impl Default for Diffuse {
    fn default() -> Self {
        Self::new(black_texture(), black_texture())
    }
}

impl Material for Diffuse {
    fn color(&self, uv: Vec2) -> Color {
        self.albedo.color(uv)
    }

    fn emitted(&self, uv: Vec2) -> Color {
        self.emitted.color(uv)
    }

    fn eval(&self, uv: Vec2, _theta_in: f32, _theta_out: f32) -> Color {
        self.albedo.color(uv) * (self.reflectance / PI)
    }

    fn scatter(&self, pcg: &mut Pcg, hit: &HitRecord, depth: u32) -> Ray {
        let normal = hit.normal.normalize().to_vec3();
        Ray {
            depth,
            ..Ray::new(hit.world_point, pcg.sample_hemisphere(normal))
        }
    }
}

/// Mirror-like material with an adjustable blur.
pub struct Specular {
    albedo: Arc<dyn Texture>,
    emitted: Arc<dyn Texture>,
    blur: f32,
    threshold_angle: f32,
}

impl Specular {
    /// Perfect mirror.
    pub fn new(albedo: Arc<dyn Texture>, emitted: Arc<dyn Texture>) -> Self {
        Self::with_blur(albedo, emitted, 0.0)
    }

    /// Mirror whose reflected rays are jittered by `blur` in [0, 1).
    pub fn with_blur(albedo: Arc<dyn Texture>, emitted: Arc<dyn Texture>, blur: f32) -> Self {
        Self {
            albedo,
            emitted,
            blur,
            threshold_angle: PI / 1800.0,
        }
    }
}

impl Material for Specular {
    fn color(&self, uv: Vec2) -> Color {
        self.albedo.color(uv)
    }

    fn emitted(&self, uv: Vec2) -> Color {
        self.emitted.color(uv)
    }

    fn eval(&self, uv: Vec2, theta_in: f32, theta_out: f32) -> Color {
        if (theta_in - theta_out).abs() < self.threshold_angle {
            self.albedo.color(uv)
        } else {
            BLACK
        }
    }

    fn scatter(&self, pcg: &mut Pcg, hit: &HitRecord, depth: u32) -> Ray {
        let normal = hit.normal.normalize().to_vec3();
        let mut reflected = reflect(hit.ray.direction.normalize(), normal);

        // Jitter the mirror direction inside the reflected hemisphere.
        // The blurred ray can graze back into the surface; the shadow
        // epsilon on tmin absorbs the worst of it.
        if self.blur > 0.0 {
            reflected += pcg.sample_hemisphere(reflected) * self.blur;
        }

        Ray {
            depth,
            ..Ray::new(hit.world_point, reflected)
        }
    }
}

/// Transparent material refracting rays through the surface.
pub struct Transparent {
    albedo: Arc<dyn Texture>,
    emitted: Arc<dyn Texture>,
    refraction_index: f32,
}

impl Transparent {
    /// `refraction_index` is the ratio of the inner to the outer
    /// refraction index (1.5 for glass in air).
    pub fn new(
        albedo: Arc<dyn Texture>,
        emitted: Arc<dyn Texture>,
        refraction_index: f32,
    ) -> Self {
        Self {
            albedo,
            emitted,
            refraction_index,
        }
    }
}

impl Material for Transparent {
    fn color(&self, uv: Vec2) -> Color {
        self.albedo.color(uv)
    }

    fn emitted(&self, uv: Vec2) -> Color {
        self.emitted.color(uv)
    }

    fn eval(&self, uv: Vec2, _theta_in: f32, _theta_out: f32) -> Color {
        self.albedo.color(uv) * (1.0 / PI)
    }

    fn scatter(&self, _pcg: &mut Pcg, hit: &HitRecord, depth: u32) -> Ray {
        // Snell's law needs n1/n2 of the medium the ray leaves over the
        // one it enters
        let ratio = if hit.is_inside {
            self.refraction_index
        } else {
            1.0 / self.refraction_index
        };

        let refracted = refract(
            hit.ray.direction.normalize(),
            hit.normal.normalize().to_vec3(),
            ratio,
        );
        Ray {
            depth,
            ..Ray::new(hit.world_point, refracted)
        }
    }
}

/// Mirror reflection of `v` about the normal `n`. Both unit vectors;
/// the result stays unit length.
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - n * 2.0 * n.dot(v)
}

/// Refraction of `v` through a surface with outward normal `n` and
/// refraction index ratio `ratio` (leaving medium over entering one).
/// Falls back to mirror reflection beyond the critical angle.
pub fn refract(v: Vec3, n: Vec3, ratio: f32) -> Vec3 {
    // v enters the surface while n exits it
    let n = -n;

    let cos = n.dot(v);
    let sin2 = 1.0 - cos * cos;

    // total internal reflection when n1/n2 * sin(theta1) > 1
    if ratio * ratio * sin2 > 1.0 {
        return reflect(v, -n);
    }

    n * (1.0 - ratio * ratio * sin2).sqrt() + (v - n * cos) * ratio
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Shape, Sphere};
    use lumina_math::{Point3, Transformation, WHITE};

    fn uniform(color: Color) -> Arc<dyn Texture> {
        Arc::new(UniformTexture::new(color))
    }

    fn hit_on_unit_sphere() -> HitRecord {
        let sphere = Sphere::new(
            Arc::new(Diffuse::default()),
            Transformation::IDENTITY,
        );
        let ray = Ray::new(Point3::new(0.0, 0.0, 2.0), -Vec3::Z);
        sphere.is_hit(&ray).unwrap()
    }

    #[test]
    fn test_diffuse_eval_divides_by_pi() {
        let material = Diffuse::new(uniform(Color::new(1.0, 2.0, 3.0)), black_texture());
        let brdf = material.eval(Vec2::ZERO, 0.3, 0.7);
        assert!(brdf.abs_diff_eq(Color::new(1.0 / PI, 2.0 / PI, 3.0 / PI), 1e-6));
    }

    #[test]
    fn test_diffuse_scatter_stays_in_hemisphere() {
        let material = Diffuse::new(uniform(WHITE), black_texture());
        let hit = hit_on_unit_sphere();
        let mut pcg = Pcg::new(42, 54);

        for depth in 1..50 {
            let scattered = material.scatter(&mut pcg, &hit, depth);
            assert_eq!(scattered.depth, depth);
            assert_eq!(scattered.tmin, 1e-5);
            assert!(scattered.origin.is_close(hit.world_point, 1e-6));
            assert!(scattered.direction.dot(hit.normal.to_vec3()) >= 0.0);
        }
    }

    #[test]
    fn test_diffuse_partial_reflectance() {
        let material =
            Diffuse::with_reflectance(uniform(WHITE), black_texture(), 0.5);
        let brdf = material.eval(Vec2::ZERO, 0.0, 0.0);
        assert!(brdf.abs_diff_eq(WHITE * (0.5 / PI), 1e-6));
    }

    #[test]
    fn test_transparent_scatter_enters_the_surface() {
        let material = Transparent::new(uniform(WHITE), black_texture(), 1.5);
        let sphere = Sphere::new(Arc::new(Diffuse::default()), Transformation::IDENTITY);

        // oblique hit on the north pole: the refracted ray bends toward
        // the normal and keeps going down into the sphere
        let ray = Ray::new(Point3::new(0.5, 0.0, 2.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = sphere.is_hit(&ray).unwrap();
        let mut pcg = Pcg::new(42, 54);

        let scattered = material.scatter(&mut pcg, &hit, 1);
        assert!((scattered.direction.length() - 1.0).abs() < 1e-4);
        assert!(scattered.direction.z < 0.0);
        assert!(!hit.is_inside);
    }

    #[test]
    fn test_specular_eval_threshold() {
        let color = Color::new(0.2, 0.4, 0.6);
        let material = Specular::new(uniform(color), black_texture());

        assert_eq!(material.eval(Vec2::ZERO, 0.5, 0.5), color);
        assert_eq!(material.eval(Vec2::ZERO, 0.5, 0.9), BLACK);
    }

    #[test]
    fn test_specular_scatter_is_mirror() {
        let material = Specular::new(uniform(WHITE), black_texture());
        let sphere = Sphere::new(Arc::new(Diffuse::default()), Transformation::IDENTITY);

        // Hit the north pole straight on: the reflection goes back up
        let ray = Ray::new(Point3::new(0.0, 0.0, 2.0), -Vec3::Z);
        let hit = sphere.is_hit(&ray).unwrap();
        let mut pcg = Pcg::new(42, 54);

        let scattered = material.scatter(&mut pcg, &hit, 1);
        assert!(scattered.direction.abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn test_reflect() {
        let v = Vec3::new(1.0, -1.0, 0.0).normalize();
        let reflected = reflect(v, Vec3::Y);
        assert!(reflected.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0).normalize(), 1e-6));
        assert!((reflected.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_refract_straight_through() {
        // Normal incidence passes straight through for any ratio
        let v = -Vec3::Z;
        let refracted = refract(v, Vec3::Z, 1.0 / 1.5);
        assert!(refracted.abs_diff_eq(-Vec3::Z, 1e-6));
    }

    #[test]
    fn test_refract_preserves_unit_length() {
        let mut pcg = Pcg::new(42, 54);
        for _ in 0..100 {
            let mut v = pcg.random_versor();
            if v.z > 0.0 {
                v.z = -v.z; // make it point against the normal
            }
            let refracted = refract(v, Vec3::Z, 1.0 / 1.5);
            assert!((refracted.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_refract_total_internal_reflection() {
        // Grazing incidence from the dense medium reflects instead
        let v = Vec3::new(0.99, 0.0, -0.14).normalize();
        let refracted = refract(v, Vec3::Z, 1.5);
        assert!((refracted.length() - 1.0).abs() < 1e-4);
        assert!(refracted.z > 0.0); // bounced back up
    }

    #[test]
    fn test_snell_angle() {
        // 45 degrees into glass: sin(theta2) = sin(45deg) / 1.5
        let v = Vec3::new(1.0, 0.0, -1.0).normalize();
        let refracted = refract(v, Vec3::Z, 1.0 / 1.5);

        let sin_out = refracted.x.hypot(refracted.y);
        let expected = (45.0_f32.to_radians()).sin() / 1.5;
        assert!((sin_out - expected).abs() < 1e-4);
        assert!(refracted.z < 0.0); // still going down
    }
}
