//! Lumina renderer - CPU ray tracing core.
//!
//! This crate holds the rendering pipeline proper:
//!
//! - **Materials**: diffuse, specular and transparent BRDFs with
//!   emission, shared across shapes
//! - **Shapes**: unit sphere and z=0 plane, intersected in their local
//!   frame through cached inverse transformations
//! - **World**: closest-hit and visibility queries over a shape list,
//!   plus point lights
//! - **Camera**: orthogonal/perspective ray generation and the
//!   anti-aliased render loop
//! - **Renderers**: on/off, flat, point-light and the Monte Carlo path
//!   tracer with Russian roulette

pub mod camera;
pub mod material;
pub mod renderer;
pub mod shape;
pub mod world;

pub use camera::{Camera, Projection};
pub use material::{reflect, refract, Diffuse, Material, Specular, Transparent};
pub use renderer::{Flat, OnOff, PathTracer, PointLightTracer, Renderer};
pub use shape::{HitRecord, Plane, Shape, Sphere};
pub use world::{PointLight, World};
