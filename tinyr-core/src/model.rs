/// Mesh and texture collaborators of the rasterizer.
///
/// The render driver only sees the [`Model`] trait. [`Mesh`] is the in-memory
/// implementation used by the binary: it comes from an OBJ file (see
/// [`crate::obj`]) or from [`Mesh::cube`], and owns its diffuse [`Texture`].
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::{ModelError, ModelResult};
use crate::framebuffer::Color;
use crate::geometry::{Vec2, Vec3};
use crate::obj;

/// Read-only triangle mesh with a diffuse texture.
pub trait Model {
    fn vertex_count(&self) -> usize;
    fn face_count(&self) -> usize;
    fn vertex(&self, index: usize) -> Vec3<f32>;
    /// Vertex indices of a triangular face.
    fn face(&self, index: usize) -> [usize; 3];
    /// Texel coordinates of one corner (0..3) of a face.
    fn uv(&self, face: usize, corner: usize) -> Vec2<i32>;
    fn sample_diffuse(&self, uv: Vec2<i32>) -> Color;
}

/// Simple texture (array of colors), row 0 at the bottom
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Color>,
}

impl Texture {
    /// Single-color texture.
    pub fn solid(width: usize, height: usize, color: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    /// Create a checkerboard test texture
    pub fn checkerboard(width: usize, height: usize, cell: usize, color1: Color, color2: Color) -> Self {
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / cell) + (y / cell)) % 2 == 0;
                pixels.push(if checker { color1 } else { color2 });
            }
        }
        Self { width, height, pixels }
    }

    /// Decode an image file. Rows are flipped so that texture coordinate
    /// `v = 0` addresses the bottom of the picture.
    pub fn from_file(path: impl AsRef<Path>) -> ModelResult<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| ModelError::Texture {
            path: path.to_path_buf(),
            source,
        })?;
        let mut rgba = img.to_rgba8();
        image::imageops::flip_vertical_in_place(&mut rgba);

        let (width, height) = rgba.dimensions();
        let pixels = rgba
            .pixels()
            .map(|p| Color::with_alpha(p[0], p[1], p[2], p[3]))
            .collect();

        Ok(Self {
            width: width as usize,
            height: height as usize,
            pixels,
        })
    }

    /// Texel at integer coordinates; black outside the texture.
    pub fn get(&self, x: i32, y: i32) -> Color {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return Color::BLACK;
        }
        self.pixels[y as usize * self.width + x as usize]
    }
}

/// One corner of a face: a vertex index and an optional texture coordinate index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corner {
    pub vertex: usize,
    pub uv: Option<usize>,
}

impl Corner {
    pub fn new(vertex: usize, uv: Option<usize>) -> Self {
        Self { vertex, uv }
    }
}

/// Triangle mesh with per-corner texture coordinates.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vec3<f32>>,
    /// Normalized texture coordinates in `0.0..=1.0`.
    pub uvs: Vec<Vec2<f32>>,
    pub faces: Vec<[Corner; 3]>,
    pub diffuse: Texture,
}

impl Mesh {
    pub fn new(
        vertices: Vec<Vec3<f32>>,
        uvs: Vec<Vec2<f32>>,
        faces: Vec<[Corner; 3]>,
        diffuse: Texture,
    ) -> Self {
        Self {
            vertices,
            uvs,
            faces,
            diffuse,
        }
    }

    /// Load an OBJ file and the diffuse texture that sits next to it.
    ///
    /// The texture is looked up as `<stem>_diffuse.tga`, then
    /// `<stem>_diffuse.png`. Without one the mesh renders in plain white.
    pub fn load(path: impl AsRef<Path>) -> ModelResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let obj::ObjGeometry {
            vertices,
            uvs,
            faces,
        } = obj::parse_obj(&source)?;

        let diffuse = match diffuse_path(path) {
            Some(texture_path) => Texture::from_file(&texture_path)?,
            None => {
                warn!("no diffuse texture next to {}, using white", path.display());
                Texture::solid(1, 1, Color::WHITE)
            }
        };

        info!(
            "loaded {}: {} vertices, {} faces, {} texcoords, texture {}x{}",
            path.display(),
            vertices.len(),
            faces.len(),
            uvs.len(),
            diffuse.width,
            diffuse.height
        );
        Ok(Self::new(vertices, uvs, faces, diffuse))
    }

    /// Axis-aligned cube centred on the origin, two triangles per side,
    /// every side mapped to the full texture.
    pub fn cube(size: f32, diffuse: Texture) -> Self {
        let h = size / 2.0;
        let vertices = vec![
            Vec3::new(-h, -h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(-h, h, -h),
            Vec3::new(-h, -h, h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
        ];
        let uvs = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        // Quads listed counter-clockwise seen from outside the cube
        let sides: [[usize; 4]; 6] = [
            [4, 5, 6, 7], // front (+z)
            [1, 0, 3, 2], // back (-z)
            [5, 1, 2, 6], // right (+x)
            [0, 4, 7, 3], // left (-x)
            [7, 6, 2, 3], // top (+y)
            [0, 1, 5, 4], // bottom (-y)
        ];
        let mut faces = Vec::with_capacity(12);
        for side in sides {
            let c = |k: usize| Corner::new(side[k], Some(k));
            faces.push([c(0), c(1), c(2)]);
            faces.push([c(0), c(2), c(3)]);
        }
        Self::new(vertices, uvs, faces, diffuse)
    }
}

fn diffuse_path(model_path: &Path) -> Option<PathBuf> {
    let stem = model_path.file_stem()?.to_string_lossy().into_owned();
    ["tga", "png"]
        .iter()
        .map(|ext| model_path.with_file_name(format!("{stem}_diffuse.{ext}")))
        .find(|candidate| candidate.is_file())
}

impl Model for Mesh {
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn vertex(&self, index: usize) -> Vec3<f32> {
        self.vertices[index]
    }

    fn face(&self, index: usize) -> [usize; 3] {
        self.faces[index].map(|corner| corner.vertex)
    }

    fn uv(&self, face: usize, corner: usize) -> Vec2<i32> {
        let uv = self.faces[face][corner]
            .uv
            .and_then(|i| self.uvs.get(i).copied())
            .unwrap_or(Vec2::ZERO);
        let texel = Vec2::new(
            uv.x * self.diffuse.width as f32,
            uv.y * self.diffuse.height as f32,
        )
        .to_i32();
        // u or v of exactly 1.0 addresses the last texel
        Vec2::new(
            texel.x.clamp(0, self.diffuse.width.saturating_sub(1) as i32),
            texel.y.clamp(0, self.diffuse.height.saturating_sub(1) as i32),
        )
    }

    fn sample_diffuse(&self, uv: Vec2<i32>) -> Color {
        self.diffuse.get(uv.x, uv.y)
    }
}
