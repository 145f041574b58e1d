//! 3D transformation utilities

use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// A 4x4 object transform in column-vector convention (`p' = M * p`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub matrix: Matrix4<f32>,
}

impl Transform3D {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&translation),
        }
    }

    /// Create a rotation transformation from a quaternion
    pub fn rotation(rotation: UnitQuaternion<f32>) -> Self {
        Self {
            matrix: rotation.to_homogeneous(),
        }
    }

    /// Create a scaling transformation
    pub fn scaling(scale: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_nonuniform_scaling(&scale),
        }
    }

    /// Narrow a double precision stage matrix to a render transform
    pub fn from_f64(matrix: &Matrix4<f64>) -> Self {
        Self {
            matrix: matrix.cast::<f32>(),
        }
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        let homogeneous = self.matrix * point.to_homogeneous();
        Point3::from_homogeneous(homogeneous).unwrap_or(*point)
    }

    /// Apply the linear part of the transformation to a vector
    pub fn transform_vector(&self, vector: &Vector3<f32>) -> Vector3<f32> {
        self.matrix.fixed_view::<3, 3>(0, 0) * vector
    }

    /// Compose this transformation with another; `other` is applied first
    pub fn compose(self, other: Self) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Get the inverse transformation
    pub fn inverse(self) -> Option<Self> {
        self.matrix.try_inverse().map(|inv_matrix| Self {
            matrix: inv_matrix,
        })
    }

    /// Translation component of the transform
    pub fn translation_part(&self) -> Vector3<f32> {
        Vector3::new(self.matrix[(0, 3)], self.matrix[(1, 3)], self.matrix[(2, 3)])
    }

    /// Check if this is approximately the identity transformation
    pub fn is_identity(&self, epsilon: f32) -> bool {
        let identity = Matrix4::identity();
        (self.matrix - identity).norm() < epsilon
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Transform3D {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}

impl From<Matrix4<f32>> for Transform3D {
    fn from(matrix: Matrix4<f32>) -> Self {
        Self { matrix }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_compose_applies_right_operand_first() {
        let scale = Transform3D::scaling(Vector3::new(2.0, 2.0, 2.0));
        let shift = Transform3D::translation(Vector3::new(1.0, 0.0, 0.0));

        let p = Point3::new(1.0, 1.0, 1.0);
        let scaled_then_shifted = (shift * scale).transform_point(&p);
        assert_relative_eq!(scaled_then_shifted, Point3::new(3.0, 2.0, 2.0));

        let shifted_then_scaled = (scale * shift).transform_point(&p);
        assert_relative_eq!(shifted_then_scaled, Point3::new(4.0, 2.0, 2.0));
    }

    #[test]
    fn test_from_f64_and_inverse() {
        let m = Matrix4::<f64>::new_translation(&Vector3::new(0.5, -2.0, 3.0));
        let t = Transform3D::from_f64(&m);
        assert_relative_eq!(t.translation_part(), Vector3::new(0.5, -2.0, 3.0));

        let inv = t.inverse().unwrap();
        assert!((t * inv).is_identity(1e-6));
    }

    #[test]
    fn test_vectors_ignore_translation() {
        let t = Transform3D::translation(Vector3::new(5.0, 5.0, 5.0));
        let v = Vector3::new(0.0, 1.0, 0.0);
        assert_relative_eq!(t.transform_vector(&v), v);
    }
}
