//! Ray-to-radiance strategies.
//!
//! All renderers share one signature: given a primary ray, the world
//! and the random stream, produce the radiance flowing back along the
//! ray. The camera drives whichever strategy it is given.

use lumina_math::{Color, Pcg, PcgSample, Ray, BLACK, WHITE};

use crate::world::World;

/// A rendering strategy mapping a ray to a color.
pub trait Renderer: Send + Sync {
    fn radiance(&self, ray: Ray, world: &World, pcg: &mut Pcg) -> Color;
}

/// White on hit, black on miss. Useful to debug scene geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnOff;

impl Renderer for OnOff {
    fn radiance(&self, ray: Ray, world: &World, _pcg: &mut Pcg) -> Color {
        if world.closest_hit(&ray).is_some() {
            WHITE
        } else {
            BLACK
        }
    }
}

/// The surface's BRDF color at normal incidence, with no lighting.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flat;

impl Renderer for Flat {
    fn radiance(&self, ray: Ray, world: &World, _pcg: &mut Pcg) -> Color {
        match world.closest_hit(&ray) {
            Some(hit) => hit.material.eval(hit.surface_point, 0.0, 0.0),
            None => world.background_color,
        }
    }
}

/// Ambient light plus direct illumination from the world's point
/// lights, with shadow rays but no recursion.
#[derive(Debug, Clone, Copy)]
pub struct PointLightTracer {
    pub ambient_color: Color,
}

impl Default for PointLightTracer {
    fn default() -> Self {
        Self {
            ambient_color: Color::splat(0.1),
        }
    }
}

impl Renderer for PointLightTracer {
    fn radiance(&self, ray: Ray, world: &World, _pcg: &mut Pcg) -> Color {
        let Some(hit) = world.closest_hit(&ray) else {
            return world.background_color;
        };

        let mut result = self.ambient_color + hit.material.emitted(hit.surface_point);
        let normal = hit.normal.normalize().to_vec3();

        for light in &world.point_lights {
            if !world.is_point_visible(light.position, hit.world_point) {
                continue;
            }

            let to_hit = hit.world_point - light.position;
            let distance = to_hit.length();

            let cos_theta = normal.dot(-to_hit / distance).max(0.0);
            let distance_factor = if light.linear_radius > 0.0 {
                (light.linear_radius / distance).powi(2)
            } else {
                1.0
            };

            let in_dir = (light.position - hit.world_point).normalize();
            let out_dir = -ray.direction.normalize();
            let theta_in = normal.dot(in_dir).clamp(-1.0, 1.0).acos();
            let theta_out = normal.dot(out_dir).clamp(-1.0, 1.0).acos();

            let brdf = hit.material.eval(hit.surface_point, theta_in, theta_out);
            result += brdf * light.color * (cos_theta * distance_factor);
        }

        result
    }
}

/// Recursive Monte Carlo path tracer with Russian roulette
/// termination.
#[derive(Debug, Clone, Copy)]
pub struct PathTracer {
    /// Rays scattered from every hit point
    pub n_rays: u32,
    /// Hard recursion cap
    pub max_depth: u32,
    /// Depth at which Russian roulette starts
    pub rr_limit: u32,
}

impl Default for PathTracer {
    fn default() -> Self {
        Self {
            n_rays: 8,
            max_depth: 8,
            rr_limit: 3,
        }
    }
}

impl PathTracer {
    fn trace(&self, ray: Ray, world: &World, pcg: &mut Pcg) -> Color {
        if ray.depth > self.max_depth {
            return BLACK;
        }

        let Some(hit) = world.closest_hit(&ray) else {
            return world.background_color;
        };

        let mut albedo = hit.material.color(hit.surface_point);
        let emitted = hit.material.emitted(hit.surface_point);
        let luminosity = albedo.max_element();

        if ray.depth >= self.rr_limit {
            let q = (1.0 - luminosity).max(0.05);
            if pcg.random() > q {
                // survive: compensate for the terminated paths
                albedo *= 1.0 / (1.0 - q);
            } else {
                return emitted;
            }
        }

        let mut total = BLACK;
        if luminosity > 0.0 {
            // recursion is only worth its cost on reflective surfaces
            for _ in 0..self.n_rays {
                let scattered = hit.material.scatter(pcg, &hit, ray.depth + 1);
                total += albedo * self.trace(scattered, world, pcg);
            }
        }

        emitted + total / self.n_rays as f32
    }
}

impl Renderer for PathTracer {
    fn radiance(&self, ray: Ray, world: &World, pcg: &mut Pcg) -> Color {
        self.trace(ray, world, pcg)
    }
}
