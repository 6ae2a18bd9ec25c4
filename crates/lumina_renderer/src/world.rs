//! The scene contents and its intersection queries.

use std::sync::Arc;

use lumina_math::{Color, Point3, Ray};

use crate::shape::{HitRecord, Shape};

/// A point light source with optional linear falloff radius.
#[derive(Debug, Clone, Copy)]
pub struct PointLight {
    pub position: Point3,
    pub color: Color,
    pub linear_radius: f32,
}

impl PointLight {
    pub fn new(position: Point3, color: Color, linear_radius: f32) -> Self {
        Self {
            position,
            color,
            linear_radius,
        }
    }
}

/// An ordered collection of shapes and point lights.
#[derive(Default)]
pub struct World {
    shapes: Vec<Arc<dyn Shape>>,
    pub point_lights: Vec<PointLight>,
    pub background_color: Color,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_shape(&mut self, shape: Arc<dyn Shape>) {
        self.shapes.push(shape);
    }

    pub fn shapes(&self) -> &[Arc<dyn Shape>] {
        &self.shapes
    }

    pub fn add_light(&mut self, light: PointLight) {
        self.point_lights.push(light);
    }

    /// Closest intersection of `ray` with the scene, with the normal
    /// normalized.
    pub fn closest_hit(&self, ray: &Ray) -> Option<HitRecord> {
        let mut closest: Option<HitRecord> = None;

        for shape in &self.shapes {
            if let Some(hit) = shape.is_hit(ray) {
                if closest.as_ref().map_or(true, |best| hit.t < best.t) {
                    closest = Some(hit);
                }
            }
        }

        if let Some(hit) = &mut closest {
            hit.normal = hit.normal.normalize();
        }
        closest
    }

    /// Whether `point` is reachable from `observer` without crossing
    /// any shape. Used for shadow rays.
    pub fn is_point_visible(&self, point: Point3, observer: Point3) -> bool {
        let direction = point - observer;
        let distance = direction.length();

        let shadow_ray = Ray {
            tmin: 1e-2 / distance,
            tmax: 1.0,
            ..Ray::new(observer, direction)
        };

        !self.shapes.iter().any(|shape| shape.any_hit(&shadow_ray))
    }
}
