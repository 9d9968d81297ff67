/// tinyr Core Library - software triangle rasterization
///
/// This library provides the CPU rendering pipeline: small vector and matrix
/// algebra, NDC to screen projection, a z-buffered textured triangle
/// rasterizer, and the per-frame driver that lights and draws a mesh.

pub mod error;
pub mod framebuffer;
pub mod geometry;
pub mod matrix;
pub mod model;
pub mod obj;
pub mod projection;
pub mod raster;
pub mod render;
pub mod transform;

// Re-export commonly used types
pub use error::{FramebufferError, GeometryError, MatrixError, ModelError, RenderError};
pub use framebuffer::{Color, Framebuffer, ImageSink};
pub use geometry::{Vec2, Vec2f, Vec2i, Vec3, Vec3f, Vec3i};
pub use matrix::Matrix;
pub use model::{Mesh, Model, Texture};
pub use projection::{world_to_screen, ProjectionMode};
pub use raster::{barycentric, line, DepthBuffer, ScreenVertex, Triangle};
pub use render::{RenderConfig, RenderStats, Renderer};
pub use transform::Transform;
