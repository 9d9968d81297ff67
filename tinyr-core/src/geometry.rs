/// 2-D and 3-D vector value types.
///
/// Components are public fields, so `v.x`, `v.y`, `v.z` are checked at compile
/// time. Generic code that needs positional access goes through [`Vec3::get`],
/// which rejects indices past the arity instead of aliasing a component.
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use nalgebra::{Scalar, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Two-component vector, used for texture coordinates and 2-D points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vec2<T> {
    pub x: T,
    pub y: T,
}

/// Three-component vector, used for positions, normals and barycentric weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vec3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

pub type Vec2f = Vec2<f32>;
pub type Vec2i = Vec2<i32>;
pub type Vec3f = Vec3<f32>;
pub type Vec3i = Vec3<i32>;

impl<T: Copy> Vec2<T> {
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    /// Component by position: 0 is `x`, 1 is `y`.
    pub fn get(&self, index: usize) -> Result<T, GeometryError> {
        match index {
            0 => Ok(self.x),
            1 => Ok(self.y),
            _ => Err(GeometryError::IndexOutOfRange { index, len: 2 }),
        }
    }
}

impl<T: Copy> Vec3<T> {
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    /// Component by position: 0 is `x`, 1 is `y`, 2 is `z`.
    pub fn get(&self, index: usize) -> Result<T, GeometryError> {
        match index {
            0 => Ok(self.x),
            1 => Ok(self.y),
            2 => Ok(self.z),
            _ => Err(GeometryError::IndexOutOfRange { index, len: 3 }),
        }
    }

    /// Drop the `z` component.
    pub fn xy(self) -> Vec2<T> {
        Vec2::new(self.x, self.y)
    }
}

impl<T> Vec3<T>
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<Output = T>,
{
    pub fn dot(self, other: Self) -> T {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product by determinant expansion. Anti-commutative; zero when
    /// the operands are parallel or either one is zero.
    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }
}

macro_rules! impl_float_vectors {
    ($($t:ty),*) => {$(
        impl Vec3<$t> {
            /// Euclidean length.
            pub fn norm(self) -> $t {
                self.dot(self).sqrt()
            }

            /// Unit vector in the same direction.
            pub fn normalize(self) -> Result<Self, GeometryError> {
                self.normalize_to(1.0)
            }

            /// Vector in the same direction with the given length.
            ///
            /// Zero and non-finite vectors have no direction and fail with
            /// [`GeometryError::DegenerateGeometry`]. Components are scaled
            /// down by the largest one first, so large finite vectors do not
            /// overflow while squaring.
            pub fn normalize_to(self, length: $t) -> Result<Self, GeometryError> {
                if !(self.x.is_finite() && self.y.is_finite() && self.z.is_finite()) {
                    return Err(GeometryError::DegenerateGeometry);
                }
                let largest = self.x.abs().max(self.y.abs()).max(self.z.abs());
                if largest == 0.0 {
                    return Err(GeometryError::DegenerateGeometry);
                }
                let unit_box = self * (1.0 / largest);
                Ok(unit_box * (length / unit_box.norm()))
            }
        }
    )*};
}

impl_float_vectors!(f32, f64);

impl Vec3<f32> {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
}

impl Vec2<f32> {
    pub const ZERO: Self = Self::new(0.0, 0.0);
}

impl Vec2<i32> {
    pub fn to_f32(self) -> Vec2<f32> {
        Vec2::new(self.x as f32, self.y as f32)
    }
}

impl Vec2<f32> {
    /// Truncates toward zero, the way texel coordinates are addressed.
    pub fn to_i32(self) -> Vec2<i32> {
        Vec2::new(self.x as i32, self.y as i32)
    }
}

impl Vec3<i32> {
    pub fn to_f32(self) -> Vec3<f32> {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

impl<T: Add<Output = T>> Add for Vec2<T> {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl<T: Sub<Output = T>> Sub for Vec2<T> {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl<T: Copy + Mul<Output = T>> Mul<T> for Vec2<T> {
    type Output = Self;
    fn mul(self, s: T) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
        }
    }
}

impl<T: Add<Output = T>> Add for Vec3<T> {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl<T: Sub<Output = T>> Sub for Vec3<T> {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl<T: Copy + Mul<Output = T>> Mul<T> for Vec3<T> {
    type Output = Self;
    fn mul(self, s: T) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }
}

impl<T: Neg<Output = T>> Neg for Vec3<T> {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Vec2<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl<T: fmt::Display> fmt::Display for Vec3<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl<T: Scalar + Copy> From<Vector2<T>> for Vec2<T> {
    fn from(v: Vector2<T>) -> Self {
        Self::new(v[0], v[1])
    }
}

impl<T: Scalar> From<Vec2<T>> for Vector2<T> {
    fn from(v: Vec2<T>) -> Self {
        Vector2::new(v.x, v.y)
    }
}

impl<T: Scalar + Copy> From<Vector3<T>> for Vec3<T> {
    fn from(v: Vector3<T>) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl<T: Scalar> From<Vec3<T>> for Vector3<T> {
    fn from(v: Vec3<T>) -> Self {
        Vector3::new(v.x, v.y, v.z)
    }
}
