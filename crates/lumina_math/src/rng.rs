//! Deterministic random sampling.
//!
//! The renderer draws every random number from a PCG-XSH-RR 64/32
//! stream, so a render is reproducible given `(seed, sequence)`. The
//! generator itself comes from `rand_pcg`; this module layers the
//! sampling helpers the renderer needs on top of `RngCore`.

use std::f32::consts::PI;

use glam::Vec3;
pub use rand::{Rng, RngCore};

/// The renderer's PRNG. `Pcg::new(seed, sequence)` follows the
/// canonical PCG32 seeding (advance, add seed, advance), so streams are
/// deterministic and independent per sequence id.
pub type Pcg = rand_pcg::Pcg32;

/// Build an orthonormal basis around a unit vector.
///
/// Branchless construction from Pixar's "Building an Orthonormal
/// Basis, Revisited". `n` must be normalized; the returned pair
/// completes it to a right-handed basis.
pub fn create_onb(n: Vec3) -> (Vec3, Vec3) {
    let sign = 1.0_f32.copysign(n.z);
    let a = -1.0 / (sign + n.z);
    let b = n.x * n.y * a;

    let e1 = Vec3::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
    let e2 = Vec3::new(b, sign + n.y * n.y * a, -n.y);
    (e1, e2)
}

/// Sampling helpers over any `RngCore` stream.
pub trait PcgSample {
    /// Uniform float in `[0, 1)`.
    fn random(&mut self) -> f32;

    /// Uniform float in `[a, b)`.
    fn random_in(&mut self, a: f32, b: f32) -> f32;

    /// Uniformly distributed unit vector, by rejection sampling in the
    /// unit cube.
    fn random_versor(&mut self) -> Vec3;

    /// Cosine-weighted direction in the hemisphere around `n`.
    ///
    /// `n` must be normalized.
    fn sample_hemisphere(&mut self, n: Vec3) -> Vec3;
}

impl<R: RngCore> PcgSample for R {
    fn random(&mut self) -> f32 {
        // Top 24 bits scaled into [0, 1), so the result never rounds up
        // to 1.0
        (self.next_u32() >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
    }

    fn random_in(&mut self, a: f32, b: f32) -> f32 {
        a + self.random() * (b - a)
    }

    fn random_versor(&mut self) -> Vec3 {
        loop {
            let v = Vec3::new(
                self.random_in(-1.0, 1.0),
                self.random_in(-1.0, 1.0),
                self.random_in(-1.0, 1.0),
            );
            let norm2 = v.length_squared();
            if norm2 < 1.0 && norm2 != 0.0 {
                return v / norm2.sqrt();
            }
        }
    }

    fn sample_hemisphere(&mut self, n: Vec3) -> Vec3 {
        let (e1, e2) = create_onb(n);
        let cos2 = self.random();
        let (cos_theta, sin_theta) = (cos2.sqrt(), (1.0 - cos2).sqrt());
        let phi = 2.0 * PI * self.random();

        e1 * (phi.cos() * cos_theta) + e2 * (phi.sin() * cos_theta) + n * sin_theta
    }
}
