//! Affine transformations with cached inverses.
//!
//! Every factory synthesizes the analytic inverse alongside the forward
//! matrix: shape queries pull rays back into local space through the
//! inverse on every intersection test, and normals always need the
//! inverse-transpose, so the pair is kept together instead of inverting
//! numerically on demand.

use std::ops::Mul;

use glam::{Mat4, Vec3};
use thiserror::Error;

use crate::{Normal3, Point3, Ray};

/// Errors from transformation factories.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("scaling factors must be non-zero, got ({0}, {1}, {2})")]
    ZeroScaling(f32, f32, f32),
}

/// An invertible affine transformation, stored as a forward/inverse
/// matrix pair.
///
/// Composition keeps the pair consistent: `(a * b)` multiplies the
/// forward matrices and reverses the product of the inverses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transformation {
    m: Mat4,
    inv: Mat4,
}

impl Transformation {
    pub const IDENTITY: Transformation = Transformation {
        m: Mat4::IDENTITY,
        inv: Mat4::IDENTITY,
    };

    /// Rigid translation by `offset`.
    pub fn translation(offset: Vec3) -> Self {
        Self {
            m: Mat4::from_translation(offset),
            inv: Mat4::from_translation(-offset),
        }
    }

    /// Right-handed rotation about the x axis, angle in degrees.
    pub fn rotation_x(degrees: f32) -> Self {
        let radians = degrees.to_radians();
        Self {
            m: Mat4::from_rotation_x(radians),
            inv: Mat4::from_rotation_x(-radians),
        }
    }

    /// Right-handed rotation about the y axis, angle in degrees.
    pub fn rotation_y(degrees: f32) -> Self {
        let radians = degrees.to_radians();
        Self {
            m: Mat4::from_rotation_y(radians),
            inv: Mat4::from_rotation_y(-radians),
        }
    }

    /// Right-handed rotation about the z axis, angle in degrees.
    pub fn rotation_z(degrees: f32) -> Self {
        let radians = degrees.to_radians();
        Self {
            m: Mat4::from_rotation_z(radians),
            inv: Mat4::from_rotation_z(-radians),
        }
    }

    /// Anisotropic scaling. Fails on a zero factor, whose inverse would
    /// divide by zero.
    pub fn scaling(factors: Vec3) -> Result<Self, TransformError> {
        if factors.x == 0.0 || factors.y == 0.0 || factors.z == 0.0 {
            return Err(TransformError::ZeroScaling(
                factors.x, factors.y, factors.z,
            ));
        }
        Ok(Self {
            m: Mat4::from_scale(factors),
            inv: Mat4::from_scale(factors.recip()),
        })
    }

    /// Uniform scaling by `factor` on all three axes.
    pub fn uniform_scaling(factor: f32) -> Result<Self, TransformError> {
        Self::scaling(Vec3::splat(factor))
    }

    /// The inverse transformation, by swapping the cached pair.
    pub fn inverse(&self) -> Self {
        Self {
            m: self.inv,
            inv: self.m,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        self.m
    }

    pub fn inverse_matrix(&self) -> Mat4 {
        self.inv
    }

    /// Whether the cached pair still multiplies to the identity.
    pub fn is_consistent(&self) -> bool {
        (self.m * self.inv).abs_diff_eq(Mat4::IDENTITY, 1e-4)
    }

    pub fn is_close(&self, other: &Transformation, epsilon: f32) -> bool {
        self.m.abs_diff_eq(other.m, epsilon) && self.inv.abs_diff_eq(other.inv, epsilon)
    }
}

impl Default for Transformation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transformation {
    type Output = Transformation;

    fn mul(self, rhs: Transformation) -> Transformation {
        Transformation {
            m: self.m * rhs.m,
            inv: rhs.inv * self.inv,
        }
    }
}

impl Mul<Point3> for Transformation {
    type Output = Point3;

    fn mul(self, p: Point3) -> Point3 {
        Point3(self.m.transform_point3(p.0))
    }
}

impl Mul<Vec3> for Transformation {
    type Output = Vec3;

    fn mul(self, v: Vec3) -> Vec3 {
        self.m.transform_vector3(v)
    }
}

impl Mul<Normal3> for Transformation {
    type Output = Normal3;

    fn mul(self, n: Normal3) -> Normal3 {
        Normal3(self.inv.transpose().transform_vector3(n.0))
    }
}

impl Mul<Ray> for Transformation {
    type Output = Ray;

    fn mul(self, ray: Ray) -> Ray {
        ray.transform(&self)
    }
}
