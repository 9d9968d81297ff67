/// Screen-space projection.
use serde::{Deserialize, Serialize};

use crate::geometry::Vec3;
use crate::matrix::Matrix;
use crate::transform::Transform;

/// How model coordinates reach normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ProjectionMode {
    /// Coordinates are already in NDC and pass straight through.
    #[default]
    Orthographic,
    /// Central projection onto the `z = 0` plane from a camera on the +z axis.
    Perspective { camera_distance: f32 },
}

impl ProjectionMode {
    /// The homogeneous matrix for this mode, `None` for a passthrough.
    pub fn matrix(&self) -> Option<Matrix> {
        match *self {
            ProjectionMode::Orthographic => None,
            ProjectionMode::Perspective { camera_distance } => {
                Some(Transform::perspective(camera_distance))
            }
        }
    }
}

/// Map a point in NDC (`[-1, 1]` on x and y) to pixel coordinates.
///
/// x and y are rounded to the nearest pixel centre; z passes through. Points
/// outside NDC land outside the canvas, bounding them is the rasterizer's job.
pub fn world_to_screen(v: Vec3<f32>, width: usize, height: usize) -> Vec3<f32> {
    Vec3::new(
        ((v.x + 1.0) * width as f32 / 2.0 + 0.5).floor(),
        ((v.y + 1.0) * height as f32 / 2.0 + 0.5).floor(),
        v.z,
    )
}
