/// 4x4 homogeneous transformation matrices
use crate::error::GeometryError;
use crate::geometry::Vec3;
use crate::matrix::Matrix;

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Rotation about the x axis (radians)
    pub fn rotation_x(angle: f32) -> Matrix {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix::identity(4);
        m[1][1] = c;
        m[1][2] = -s;
        m[2][1] = s;
        m[2][2] = c;
        m
    }

    /// Rotation about the y axis (radians)
    pub fn rotation_y(angle: f32) -> Matrix {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix::identity(4);
        m[0][0] = c;
        m[0][2] = s;
        m[2][0] = -s;
        m[2][2] = c;
        m
    }

    /// Rotation about the z axis (radians)
    pub fn rotation_z(angle: f32) -> Matrix {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix::identity(4);
        m[0][0] = c;
        m[0][1] = -s;
        m[1][0] = s;
        m[1][1] = c;
        m
    }

    /// Create a rotation matrix from per-axis angles in radians
    pub fn rotation_matrix(angles: Vec3<f32>) -> Matrix {
        let rx = Self::rotation_x(angles.x);
        let ry = Self::rotation_y(angles.y);
        let rz = Self::rotation_z(angles.z);

        // Apply rotations in order: X, then Y, then Z
        &(&rz * &ry) * &rx
    }

    /// Same as [`Transform::rotation_matrix`] with angles in degrees
    pub fn rotation_degrees(angles: Vec3<f32>) -> Matrix {
        Self::rotation_matrix(Vec3::new(
            angles.x.to_radians(),
            angles.y.to_radians(),
            angles.z.to_radians(),
        ))
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix {
        let mut m = Matrix::identity(4);
        m[0][3] = x;
        m[1][3] = y;
        m[2][3] = z;
        m
    }

    /// Create a scale matrix
    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix {
        let mut m = Matrix::identity(4);
        m[0][0] = sx;
        m[1][1] = sy;
        m[2][2] = sz;
        m
    }

    /// Central projection for a camera at `(0, 0, camera_distance)` looking
    /// down -z. After the perspective divide, points on `z = 0` are unchanged.
    pub fn perspective(camera_distance: f32) -> Matrix {
        let mut m = Matrix::identity(4);
        m[3][2] = -1.0 / camera_distance;
        m
    }

    /// Column vector `(x, y, z, 1)`
    pub fn to_homogeneous(p: Vec3<f32>) -> Matrix {
        let mut m = Matrix::new(4, 1);
        m[0][0] = p.x;
        m[1][0] = p.y;
        m[2][0] = p.z;
        m[3][0] = 1.0;
        m
    }

    /// Perspective divide of a 4x1 column vector
    ///
    /// # Panics
    ///
    /// Panics if `m` is not 4x1.
    pub fn from_homogeneous(m: &Matrix) -> Result<Vec3<f32>, GeometryError> {
        assert_eq!(m.shape(), (4, 1), "homogeneous point must be 4x1");
        let w = m[3][0];
        if w == 0.0 {
            return Err(GeometryError::PointAtInfinity);
        }
        Ok(Vec3::new(m[0][0] / w, m[1][0] / w, m[2][0] / w))
    }

    /// Transform a point by a 4x4 matrix, including the perspective divide
    ///
    /// # Panics
    ///
    /// Panics if `m` is not 4x4.
    pub fn apply(m: &Matrix, p: Vec3<f32>) -> Result<Vec3<f32>, GeometryError> {
        assert_eq!(m.shape(), (4, 4), "point transform must be 4x4");
        Self::from_homogeneous(&(m * &Self::to_homogeneous(p)))
    }
}
