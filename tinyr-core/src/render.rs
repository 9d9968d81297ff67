/// Per-frame driver: transforms, lights and rasterizes every face of a model.
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, RenderError, RenderResult};
use crate::framebuffer::{Color, ImageSink};
use crate::geometry::{Vec2, Vec3};
use crate::matrix::Matrix;
use crate::model::Model;
use crate::projection::{world_to_screen, ProjectionMode};
use crate::raster::{line, DepthBuffer, ScreenVertex, Triangle};
use crate::transform::Transform;

/// Frame settings. Every field has a default, so a config file only needs
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    /// Direction the light travels; normalized when the renderer is built.
    pub light_dir: Vec3<f32>,
    /// Model rotation in degrees about x, y and z.
    pub rotation: Vec3<f32>,
    pub projection: ProjectionMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            light_dir: Vec3::new(0.0, 0.0, -1.0),
            rotation: Vec3::ZERO,
            projection: ProjectionMode::Orthographic,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidConfig(format!(
                "canvas must not be empty, got {}x{}",
                self.width, self.height
            )));
        }
        let light = self.light_dir;
        if ![light.x, light.y, light.z].iter().all(|c| c.is_finite()) || light.norm() == 0.0 {
            return Err(RenderError::InvalidConfig(format!(
                "light direction must be a finite non-zero vector, got {light}"
            )));
        }
        let r = self.rotation;
        if ![r.x, r.y, r.z].iter().all(|c| c.is_finite()) {
            return Err(RenderError::InvalidConfig(format!(
                "rotation must be finite, got {r}"
            )));
        }
        if let ProjectionMode::Perspective { camera_distance } = self.projection {
            if !(camera_distance > 0.0 && camera_distance.is_finite()) {
                return Err(RenderError::InvalidConfig(format!(
                    "camera distance must be positive, got {camera_distance}"
                )));
            }
        }
        Ok(())
    }
}

/// Per-frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub faces: usize,
    /// Faces handed to the rasterizer.
    pub drawn: usize,
    /// Faces facing away from the light.
    pub culled: usize,
    /// Faces with a zero-length or non-finite normal.
    pub degenerate: usize,
    pub pixels: usize,
}

/// Flat-shaded renderer owning the frame's depth buffer.
#[derive(Debug, Clone)]
pub struct Renderer {
    config: RenderConfig,
    light: Vec3<f32>,
    rotation: Option<Matrix>,
    projection: Option<Matrix>,
    depth: DepthBuffer,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> RenderResult<Self> {
        config.validate()?;
        let light = config.light_dir.normalize()?;
        let rotation = (config.rotation != Vec3::ZERO)
            .then(|| Transform::rotation_degrees(config.rotation));
        let projection = config.projection.matrix();
        let depth = DepthBuffer::new(config.width, config.height);
        Ok(Self {
            config,
            light,
            rotation,
            projection,
            depth,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Depth values left by the last frame.
    pub fn depth_buffer(&self) -> &DepthBuffer {
        &self.depth
    }

    /// Render one frame of `model` into `sink`.
    ///
    /// The depth buffer is reset first. Faces whose normal points away from
    /// the light are culled, faces with no area are skipped; everything else
    /// is rasterized with flat intensity `normal . light`.
    pub fn render<M, S>(&mut self, model: &M, sink: &mut S) -> RenderResult<RenderStats>
    where
        M: Model + ?Sized,
        S: ImageSink + ?Sized,
    {
        self.check_sink(sink)?;
        self.depth.clear();

        let mut stats = RenderStats::default();
        for face_index in 0..model.face_count() {
            stats.faces += 1;
            let face = model.face(face_index);

            let mut world = [Vec3::ZERO; 3];
            for (slot, &vertex) in world.iter_mut().zip(face.iter()) {
                *slot = self.rotate(model.vertex(vertex))?;
            }

            let normal = match (world[2] - world[0]).cross(world[1] - world[0]).normalize() {
                Ok(n) => n,
                Err(GeometryError::DegenerateGeometry) => {
                    trace!("face {face_index}: zero-length or non-finite normal, skipped");
                    stats.degenerate += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let intensity = normal.dot(self.light);
            if !(intensity > 0.0) {
                trace!("face {face_index}: facing away from the light ({intensity:.3})");
                stats.culled += 1;
                continue;
            }

            let mut corners = [ScreenVertex::new(Vec3::ZERO, model.uv(face_index, 0)); 3];
            for (corner, (slot, &w)) in corners.iter_mut().zip(world.iter()).enumerate() {
                *slot = ScreenVertex::new(self.to_screen(w)?, model.uv(face_index, corner));
            }

            let [v0, v1, v2] = corners;
            stats.pixels += Triangle::new(v0, v1, v2).rasterize(intensity, model, &mut self.depth, sink);
            stats.drawn += 1;
        }

        debug!(
            "frame {}x{}: {} faces, {} drawn, {} culled, {} degenerate, {} pixels",
            self.config.width,
            self.config.height,
            stats.faces,
            stats.drawn,
            stats.culled,
            stats.degenerate,
            stats.pixels
        );
        Ok(stats)
    }

    /// Draw the edges of every face of `model` in `color`.
    ///
    /// No lighting, culling or depth test: back faces show through. Faces
    /// with a non-finite screen corner are counted as degenerate and skipped.
    /// The depth buffer is left as the last [`Renderer::render`] wrote it.
    pub fn render_wireframe<M, S>(
        &self,
        model: &M,
        color: Color,
        sink: &mut S,
    ) -> RenderResult<RenderStats>
    where
        M: Model + ?Sized,
        S: ImageSink + ?Sized,
    {
        self.check_sink(sink)?;

        let mut stats = RenderStats::default();
        for face_index in 0..model.face_count() {
            stats.faces += 1;
            let mut corners = [Vec2::new(0, 0); 3];
            let mut finite = true;
            for (slot, &vertex) in corners.iter_mut().zip(model.face(face_index).iter()) {
                let p = self.to_screen(self.rotate(model.vertex(vertex))?)?;
                finite &= p.x.is_finite() && p.y.is_finite();
                *slot = Vec2::new(p.x as i32, p.y as i32);
            }
            if !finite {
                trace!("face {face_index}: non-finite corner, skipped");
                stats.degenerate += 1;
                continue;
            }

            for edge in 0..3 {
                stats.pixels += line(corners[edge], corners[(edge + 1) % 3], color, sink);
            }
            stats.drawn += 1;
        }

        debug!(
            "wireframe {}x{}: {} faces, {} drawn, {} pixels",
            self.config.width, self.config.height, stats.faces, stats.drawn, stats.pixels
        );
        Ok(stats)
    }

    fn check_sink<S: ImageSink + ?Sized>(&self, sink: &S) -> RenderResult<()> {
        let expected = (self.depth.width(), self.depth.height());
        let found = (sink.width(), sink.height());
        if expected != found {
            return Err(RenderError::SinkSizeMismatch { expected, found });
        }
        Ok(())
    }

    fn rotate(&self, v: Vec3<f32>) -> RenderResult<Vec3<f32>> {
        Ok(match &self.rotation {
            Some(m) => Transform::apply(m, v)?,
            None => v,
        })
    }

    fn to_screen(&self, world: Vec3<f32>) -> RenderResult<Vec3<f32>> {
        let ndc = match &self.projection {
            Some(m) => Transform::apply(m, world)?,
            None => world,
        };
        Ok(world_to_screen(ndc, self.config.width, self.config.height))
    }
}
