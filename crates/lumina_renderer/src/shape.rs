//! Ray-shape intersection.
//!
//! Shapes are unit primitives (a unit sphere at the origin, the z=0
//! plane) carrying a transformation: the incoming ray is pulled back
//! into the local frame through the cached inverse, the intersection is
//! solved there, and the hit point and normal are pushed forward again
//! (the normal through the inverse-transpose).

use std::f32::consts::PI;
use std::sync::Arc;

use lumina_math::{Normal3, Point3, Ray, Transformation, Vec2, Vec3};

use crate::material::Material;

/// A ray-surface intersection.
#[derive(Clone)]
pub struct HitRecord {
    /// Hit point in world space
    pub world_point: Point3,
    /// Surface normal in world space, facing against the ray
    pub normal: Normal3,
    /// Surface (u, v) coordinates at the hit
    pub surface_point: Vec2,
    /// Ray parameter of the hit
    pub t: f32,
    /// The ray that produced this hit
    pub ray: Ray,
    /// Material of the intersected shape
    pub material: Arc<dyn Material>,
    /// Whether the ray started inside the surface
    pub is_inside: bool,
}

impl HitRecord {
    /// Geometric comparison within a tolerance, ignoring the material.
    pub fn is_close(&self, other: &HitRecord, epsilon: f32) -> bool {
        self.world_point.is_close(other.world_point, epsilon)
            && self.normal.is_close(other.normal, epsilon)
            && self.surface_point.abs_diff_eq(other.surface_point, epsilon)
            && (self.t - other.t).abs() < epsilon
            && self.ray.is_close(&other.ray, epsilon)
    }
}

/// A surface a ray can intersect.
pub trait Shape: Send + Sync {
    /// Closest intersection with `ray` strictly inside its parameter
    /// bounds, if any.
    fn is_hit(&self, ray: &Ray) -> Option<HitRecord>;

    /// Whether any intersection falls inside the ray bounds. Used for
    /// visibility queries, where the hit itself is irrelevant.
    fn any_hit(&self, ray: &Ray) -> bool {
        self.is_hit(ray).is_some()
    }
}

/// Normal of the unit sphere at `point`, oriented against `ray_dir`.
fn sphere_normal(point: Point3, ray_dir: Vec3) -> Normal3 {
    let normal = Normal3(point.to_vec3());
    if point.to_vec3().dot(ray_dir) < 0.0 {
        normal
    } else {
        -normal
    }
}

/// Spherical (u, v) coordinates of a point on the unit sphere:
/// longitude in [0, 1), colatitude in [0, 1].
fn sphere_uv(point: Point3) -> Vec2 {
    let mut u = point.y.atan2(point.x) / (2.0 * PI);
    if u < 0.0 {
        u += 1.0;
    }
    let v = point.z.clamp(-1.0, 1.0).acos() / PI;
    Vec2::new(u, v)
}

/// The unit sphere at the origin, placed in the scene by its
/// transformation.
pub struct Sphere {
    material: Arc<dyn Material>,
    transformation: Transformation,
}

impl Sphere {
    pub fn new(material: Arc<dyn Material>, transformation: Transformation) -> Self {
        Self {
            material,
            transformation,
        }
    }
}

impl Shape for Sphere {
    fn is_hit(&self, ray: &Ray) -> Option<HitRecord> {
        let inv_ray = ray.transform(&self.transformation.inverse());
        let origin = inv_ray.origin.to_vec3();

        // Quadratic with b halved: delta is already divided by 4
        let a = inv_ray.direction.length_squared();
        let b = origin.dot(inv_ray.direction);
        let c = origin.length_squared() - 1.0;

        let delta = b * b - a * c;
        if delta <= 0.0 {
            return None;
        }

        let sqrt_delta = delta.sqrt();
        let t1 = (-b - sqrt_delta) / a;
        let t2 = (-b + sqrt_delta) / a;

        let t = if t1 > inv_ray.tmin && t1 < inv_ray.tmax {
            t1
        } else if t2 > inv_ray.tmin && t2 < inv_ray.tmax {
            t2
        } else {
            return None;
        };

        let local_hit = inv_ray.at(t);
        let is_inside = local_hit.to_vec3().dot(inv_ray.direction) >= 0.0;

        Some(HitRecord {
            world_point: self.transformation * local_hit,
            normal: self.transformation * sphere_normal(local_hit, inv_ray.direction),
            surface_point: sphere_uv(local_hit),
            t,
            ray: *ray,
            material: Arc::clone(&self.material),
            is_inside,
        })
    }

    fn any_hit(&self, ray: &Ray) -> bool {
        let inv_ray = ray.transform(&self.transformation.inverse());
        let origin = inv_ray.origin.to_vec3();

        let a = inv_ray.direction.length_squared();
        let b = origin.dot(inv_ray.direction);
        let c = origin.length_squared() - 1.0;

        let delta = b * b - a * c;
        if delta <= 0.0 {
            return false;
        }

        let sqrt_delta = delta.sqrt();
        let t1 = (-b - sqrt_delta) / a;
        let t2 = (-b + sqrt_delta) / a;

        (t1 > inv_ray.tmin && t1 < inv_ray.tmax) || (t2 > inv_ray.tmin && t2 < inv_ray.tmax)
    }
}

/// The z=0 plane, placed in the scene by its transformation. Surface
/// coordinates tile the unit square.
pub struct Plane {
    material: Arc<dyn Material>,
    transformation: Transformation,
}

impl Plane {
    pub fn new(material: Arc<dyn Material>, transformation: Transformation) -> Self {
        Self {
            material,
            transformation,
        }
    }
}

impl Shape for Plane {
    fn is_hit(&self, ray: &Ray) -> Option<HitRecord> {
        let inv_ray = ray.transform(&self.transformation.inverse());

        if inv_ray.direction.z.abs() < 1e-5 {
            return None; // parallel to the plane
        }

        let t = -inv_ray.origin.z / inv_ray.direction.z;
        if t <= inv_ray.tmin || t >= inv_ray.tmax {
            return None;
        }

        let local_hit = inv_ray.at(t);
        let normal_z = if inv_ray.direction.z < 0.0 { 1.0 } else { -1.0 };

        Some(HitRecord {
            world_point: self.transformation * local_hit,
            normal: self.transformation * Normal3::new(0.0, 0.0, normal_z),
            surface_point: Vec2::new(
                local_hit.x - local_hit.x.floor(),
                local_hit.y - local_hit.y.floor(),
            ),
            t,
            ray: *ray,
            material: Arc::clone(&self.material),
            is_inside: false,
        })
    }

    fn any_hit(&self, ray: &Ray) -> bool {
        let inv_ray = ray.transform(&self.transformation.inverse());

        if inv_ray.direction.z.abs() < 1e-5 {
            return false;
        }

        let t = -inv_ray.origin.z / inv_ray.direction.z;
        t > inv_ray.tmin && t < inv_ray.tmax
    }
}
