/// Z-buffered, textured triangle rasterization.
///
/// Pixel coverage is decided by three edge functions: a pixel is inside when
/// all of them have the same sign, zero included, so both windings fill and
/// boundary pixels belong to every triangle touching them. Depth is
/// greater-is-nearer and a pixel is only replaced by a strictly greater depth,
/// so a shared edge drawn twice at equal depth keeps its first color.
use crate::framebuffer::{Color, ImageSink};
use crate::geometry::{Vec2, Vec3};
use crate::model::Model;

/// Triangles whose doubled area is below this have no barycentric solution.
const DEGENERATE_EPSILON: f32 = 1e-6;

/// Per-pixel depth record, `width * height` values, `-inf` when empty.
#[derive(Debug, Clone)]
pub struct DepthBuffer {
    width: usize,
    height: usize,
    depths: Vec<f32>,
}

impl DepthBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            depths: vec![f32::NEG_INFINITY; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self) {
        self.depths.fill(f32::NEG_INFINITY);
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.width && y < self.height {
            Some(self.depths[x + y * self.width])
        } else {
            None
        }
    }

    /// Store `z` at `(x, y)` if it is strictly nearer (greater) than the
    /// current value. Returns whether it was stored.
    pub fn test_and_set(&mut self, x: usize, y: usize, z: f32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let slot = &mut self.depths[x + y * self.width];
        if z > *slot {
            *slot = z;
            true
        } else {
            false
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.depths
    }
}

/// A projected vertex: pixel position with depth, and its texel coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenVertex {
    pub position: Vec3<f32>,
    pub uv: Vec2<i32>,
}

impl ScreenVertex {
    pub fn new(position: Vec3<f32>, uv: Vec2<i32>) -> Self {
        Self { position, uv }
    }
}

/// Inclusive pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

/// Screen-space triangle, built per face and dropped after drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [ScreenVertex; 3],
}

impl Triangle {
    pub fn new(v0: ScreenVertex, v1: ScreenVertex, v2: ScreenVertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Vertices reordered by ascending y, each keeping its own uv and depth.
    pub fn sorted_by_y(mut self) -> Self {
        self.vertices
            .sort_by(|a, b| a.position.y.total_cmp(&b.position.y));
        self
    }

    pub fn positions(&self) -> [Vec3<f32>; 3] {
        self.vertices.map(|v| v.position)
    }

    /// Pixel range covered by the triangle, clipped to a `width x height`
    /// canvas. `None` when nothing of it is on the canvas.
    pub fn bounding_box(&self, width: usize, height: usize) -> Option<BoundingBox> {
        if width == 0 || height == 0 {
            return None;
        }
        let [a, b, c] = self.positions();
        if ![a.x, a.y, b.x, b.y, c.x, c.y].iter().all(|v| v.is_finite()) {
            return None;
        }
        let (min_x, max_x) = (a.x.min(b.x).min(c.x), a.x.max(b.x).max(c.x));
        let (min_y, max_y) = (a.y.min(b.y).min(c.y), a.y.max(b.y).max(c.y));

        let max_x = max_x.floor().min((width - 1) as f32);
        let max_y = max_y.floor().min((height - 1) as f32);
        let min_x = min_x.ceil().max(0.0);
        let min_y = min_y.ceil().max(0.0);
        if max_x < min_x || max_y < min_y {
            return None;
        }
        Some(BoundingBox {
            min_x: min_x as usize,
            min_y: min_y as usize,
            max_x: max_x as usize,
            max_y: max_y as usize,
        })
    }

    /// Inclusive edge-function inside test for either winding.
    pub fn contains(&self, p: Vec3<f32>) -> bool {
        let [v0, v1, v2] = self.positions();
        let p = Vec3::new(p.x, p.y, 0.0);
        let e0 = (v1 - v0).cross(p - v0).z;
        let e1 = (v2 - v1).cross(p - v1).z;
        let e2 = (v0 - v2).cross(p - v2).z;
        (e0 >= 0.0 && e1 >= 0.0 && e2 >= 0.0) || (e0 <= 0.0 && e1 <= 0.0 && e2 <= 0.0)
    }

    /// Draw the triangle: every covered pixel that passes the depth test gets
    /// the diffuse texel at its interpolated uv, scaled by `intensity`.
    ///
    /// Returns the number of pixels written. A degenerate (zero-area)
    /// triangle writes nothing and leaves the depth buffer untouched.
    pub fn rasterize<M, S>(
        &self,
        intensity: f32,
        model: &M,
        depth: &mut DepthBuffer,
        sink: &mut S,
    ) -> usize
    where
        M: Model + ?Sized,
        S: ImageSink + ?Sized,
    {
        let tri = self.sorted_by_y();
        let [v0, v1, v2] = tri.vertices;
        let (p0, p1, p2) = (v0.position, v1.position, v2.position);
        if barycentric(p0, p1, p2, p0).is_none() {
            return 0;
        }
        let Some(bbox) = tri.bounding_box(depth.width(), depth.height()) else {
            return 0;
        };

        let (uv0, uv1, uv2) = (v0.uv.to_f32(), v1.uv.to_f32(), v2.uv.to_f32());
        let mut written = 0;
        for y in bbox.min_y..=bbox.max_y {
            for x in bbox.min_x..=bbox.max_x {
                let p = Vec3::new(x as f32, y as f32, 0.0);
                if !tri.contains(p) {
                    continue;
                }
                let Some(w) = barycentric(p0, p1, p2, p) else {
                    continue;
                };

                let z = w.x * p0.z + w.y * p1.z + w.z * p2.z;
                if !z.is_finite() || !depth.test_and_set(x, y, z) {
                    continue;
                }

                let uv = (uv0 * w.x + uv1 * w.y + uv2 * w.z).to_i32();
                let color = model.sample_diffuse(uv).shade(intensity);
                sink.set_pixel(x, y, color);
                written += 1;
            }
        }
        written
    }
}

/// Barycentric weights `(alpha, beta, gamma)` of `p` relative to triangle
/// `(a, b, c)` in the xy plane, from ratios of signed areas. The weights sum
/// to 1 for any `p`; all three are non-negative exactly when `p` is inside.
///
/// Returns `None` for a degenerate (collinear) triangle.
pub fn barycentric(a: Vec3<f32>, b: Vec3<f32>, c: Vec3<f32>, p: Vec3<f32>) -> Option<Vec3<f32>> {
    let flat = |v: Vec3<f32>| Vec3::new(v.x, v.y, 0.0);
    let (ab, ac, ap) = (flat(b - a), flat(c - a), flat(p - a));

    let area = ab.cross(ac).z;
    if !(area.abs() >= DEGENERATE_EPSILON) {
        return None;
    }

    let beta = ap.cross(ac).z / area;
    let gamma = ab.cross(ap).z / area;
    Some(Vec3::new(1.0 - beta - gamma, beta, gamma))
}

/// Draw a one-pixel-wide segment from `a` to `b`, both endpoints included,
/// with Bresenham's integer error stepping. Steep segments step along y so
/// every row gets exactly one pixel; endpoints are ordered first, so `a..b`
/// and `b..a` cover the same pixels. Columns along the major axis that fall
/// outside the sink are skipped without being walked.
///
/// Returns the number of pixels that landed on the sink.
pub fn line<S>(a: Vec2<i32>, b: Vec2<i32>, color: Color, sink: &mut S) -> usize
where
    S: ImageSink + ?Sized,
{
    let (mut x0, mut y0) = (i64::from(a.x), i64::from(a.y));
    let (mut x1, mut y1) = (i64::from(b.x), i64::from(b.y));
    let steep = (x1 - x0).abs() < (y1 - y0).abs();
    if steep {
        std::mem::swap(&mut x0, &mut y0);
        std::mem::swap(&mut x1, &mut y1);
    }
    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut y0, &mut y1);
    }

    let dx = x1 - x0;
    let dy = (y1 - y0).abs();
    let y_step = if y1 > y0 { 1 } else { -1 };
    let (width, height) = (sink.width() as i64, sink.height() as i64);
    let major = if steep { height } else { width };
    let (start, end) = (x0.max(0), x1.min(major - 1));
    if start > end {
        return 0;
    }

    // State after `skipped` steps: the y offset is ceil((2dy*k - dx) / 2dx)
    let skipped = start - x0;
    let (mut y, mut error) = if skipped == 0 {
        (y0, 2 * dy - dx)
    } else {
        let (k, dx2, dy2) = (i128::from(skipped), i128::from(2 * dx), i128::from(2 * dy));
        let climb = dy2 * k - i128::from(dx);
        let rise = -(-climb).div_euclid(dx2);
        let error = dy2 + climb - dx2 * rise;
        (y0 + y_step * rise as i64, error as i64)
    };

    let mut written = 0;
    for x in start..=end {
        let (px, py) = if steep { (y, x) } else { (x, y) };
        if (0..width).contains(&px) && (0..height).contains(&py) {
            sink.set_pixel(px as usize, py as usize, color);
            written += 1;
        }
        if error > 0 {
            y += y_step;
            error -= 2 * dx;
        }
        error += 2 * dy;
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::Framebuffer;
    use approx::assert_relative_eq;

    /// Model whose diffuse color encodes the texel coordinate it was sampled at.
    struct TexelEcho;

    impl Model for TexelEcho {
        fn vertex_count(&self) -> usize {
            0
        }
        fn face_count(&self) -> usize {
            0
        }
        fn vertex(&self, _: usize) -> Vec3<f32> {
            Vec3::ZERO
        }
        fn face(&self, _: usize) -> [usize; 3] {
            [0, 0, 0]
        }
        fn uv(&self, _: usize, _: usize) -> Vec2<i32> {
            Vec2::new(0, 0)
        }
        fn sample_diffuse(&self, uv: Vec2<i32>) -> Color {
            Color::new(uv.x as u8, uv.y as u8, 255)
        }
    }

    fn vertex(x: f32, y: f32, z: f32) -> ScreenVertex {
        ScreenVertex::new(Vec3::new(x, y, z), Vec2::new(0, 0))
    }

    fn flat_triangle(z: f32) -> Triangle {
        Triangle::new(vertex(1.0, 1.0, z), vertex(8.0, 1.0, z), vertex(1.0, 8.0, z))
    }

    #[test]
    fn test_barycentric_of_vertices() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(10.0, 0.0, 0.0);
        let c = Vec3::new(5.0, 10.0, 0.0);
        assert_eq!(barycentric(a, b, c, a), Some(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(barycentric(a, b, c, b), Some(Vec3::new(0.0, 1.0, 0.0)));
        assert_eq!(barycentric(a, b, c, c), Some(Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_barycentric_sums_to_one() {
        let a = Vec3::new(3.0, -2.0, 0.0);
        let b = Vec3::new(17.0, 4.0, 0.0);
        let c = Vec3::new(-5.0, 11.0, 0.0);
        for p in [
            Vec3::new(4.0, 3.0, 0.0),
            Vec3::new(-40.0, 90.0, 0.0),
            Vec3::new(100.0, -7.5, 0.0),
        ] {
            let w = barycentric(a, b, c, p).unwrap();
            assert_relative_eq!(w.x + w.y + w.z, 1.0, epsilon = 1e-5);
            // Weights reproduce the point
            let q = a * w.x + b * w.y + c * w.z;
            assert_relative_eq!(q.x, p.x, epsilon = 1e-3);
            assert_relative_eq!(q.y, p.y, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_barycentric_degenerate() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(5.0, 5.0, 0.0);
        let c = Vec3::new(10.0, 10.0, 0.0);
        assert_eq!(barycentric(a, b, c, Vec3::new(2.0, 1.0, 0.0)), None);
        assert_eq!(barycentric(a, a, a, a), None);
    }

    #[test]
    fn test_contains_both_windings() {
        let ccw = flat_triangle(0.0);
        let [a, b, c] = ccw.vertices;
        let cw = Triangle::new(a, c, b);
        for tri in [ccw, cw] {
            assert!(tri.contains(Vec3::new(3.0, 3.0, 0.0)));
            assert!(!tri.contains(Vec3::new(7.0, 7.0, 0.0)));
            // Boundary pixels are inside
            assert!(tri.contains(Vec3::new(4.0, 1.0, 0.0)));
            assert!(tri.contains(Vec3::new(1.0, 8.0, 0.0)));
        }
    }

    #[test]
    fn test_sort_keeps_attributes_together() {
        let tri = Triangle::new(
            ScreenVertex::new(Vec3::new(0.0, 9.0, 1.0), Vec2::new(9, 9)),
            ScreenVertex::new(Vec3::new(0.0, 1.0, 2.0), Vec2::new(1, 1)),
            ScreenVertex::new(Vec3::new(0.0, 5.0, 3.0), Vec2::new(5, 5)),
        )
        .sorted_by_y();
        let ys: Vec<f32> = tri.vertices.iter().map(|v| v.position.y).collect();
        assert_eq!(ys, vec![1.0, 5.0, 9.0]);
        assert!(tri.vertices.iter().all(|v| v.uv.x as f32 == v.position.y));
    }

    #[test]
    fn test_bounding_box_is_clipped() {
        let tri = Triangle::new(vertex(-5.0, 2.0, 0.0), vertex(30.0, 4.0, 0.0), vertex(3.0, 50.0, 0.0));
        assert_eq!(
            tri.bounding_box(20, 10),
            Some(BoundingBox {
                min_x: 0,
                min_y: 2,
                max_x: 19,
                max_y: 9
            })
        );
        let off = Triangle::new(vertex(-9.0, -9.0, 0.0), vertex(-1.0, -9.0, 0.0), vertex(-5.0, -1.0, 0.0));
        assert_eq!(off.bounding_box(20, 10), None);
        let nan = Triangle::new(vertex(f32::NAN, 0.0, 0.0), vertex(1.0, 0.0, 0.0), vertex(0.0, 1.0, 0.0));
        assert_eq!(nan.bounding_box(20, 10), None);
    }

    #[test]
    fn test_depth_buffer_strictly_greater() {
        let mut depth = DepthBuffer::new(2, 2);
        assert_eq!(depth.get(1, 1), Some(f32::NEG_INFINITY));
        assert!(depth.test_and_set(1, 1, 5.0));
        assert!(!depth.test_and_set(1, 1, 5.0));
        assert!(!depth.test_and_set(1, 1, 3.0));
        assert!(depth.test_and_set(1, 1, 6.0));
        assert_eq!(depth.get(1, 1), Some(6.0));
        assert!(!depth.test_and_set(2, 0, 100.0));
        depth.clear();
        assert!(depth.as_slice().iter().all(|&z| z == f32::NEG_INFINITY));
    }

    #[test]
    fn test_rasterize_fills_triangle() {
        let mut depth = DepthBuffer::new(10, 10);
        let mut fb = Framebuffer::new(10, 10);
        let written = flat_triangle(0.5).rasterize(1.0, &TexelEcho, &mut depth, &mut fb);
        // Right isosceles triangle with legs of 8 pixels: 8 + 7 + ... + 1
        assert_eq!(written, 36);
        assert_eq!(fb.pixels().filter(|&(_, _, c)| c != Color::BLACK).count(), 36);
        assert_relative_eq!(depth.get(2, 2).unwrap(), 0.5, epsilon = 1e-6);
        assert_eq!(depth.get(0, 0), Some(f32::NEG_INFINITY));
    }

    #[test]
    fn test_uv_follows_its_vertex_after_sorting() {
        let tri = Triangle::new(
            ScreenVertex::new(Vec3::new(0.0, 10.0, 0.0), Vec2::new(200, 0)),
            ScreenVertex::new(Vec3::new(10.0, 0.0, 0.0), Vec2::new(0, 100)),
            ScreenVertex::new(Vec3::new(0.0, 0.0, 0.0), Vec2::new(0, 0)),
        );
        let mut depth = DepthBuffer::new(16, 16);
        let mut fb = Framebuffer::new(16, 16);
        tri.rasterize(1.0, &TexelEcho, &mut depth, &mut fb);
        assert_eq!(fb.get_pixel(0, 10), Some(Color::new(200, 0, 255)));
        assert_eq!(fb.get_pixel(10, 0), Some(Color::new(0, 100, 255)));
        assert_eq!(fb.get_pixel(0, 0), Some(Color::new(0, 0, 255)));
        assert_eq!(fb.get_pixel(0, 5), Some(Color::new(100, 0, 255)));
    }

    #[test]
    fn test_depth_interpolation() {
        let tri = Triangle::new(vertex(0.0, 0.0, 0.0), vertex(10.0, 0.0, 1.0), vertex(0.0, 10.0, 2.0));
        let mut depth = DepthBuffer::new(16, 16);
        let mut fb = Framebuffer::new(16, 16);
        tri.rasterize(1.0, &TexelEcho, &mut depth, &mut fb);
        assert_relative_eq!(depth.get(5, 0).unwrap(), 0.5, epsilon = 1e-6);
        assert_relative_eq!(depth.get(0, 5).unwrap(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(depth.get(5, 5).unwrap(), 1.5, epsilon = 1e-6);
    }

    #[test]
    fn test_nearer_triangle_is_kept() {
        let mut depth = DepthBuffer::new(10, 10);
        let mut fb = Framebuffer::new(10, 10);
        flat_triangle(5.0).rasterize(1.0, &TexelEcho, &mut depth, &mut fb);
        let drawn = flat_triangle(3.0).rasterize(0.5, &TexelEcho, &mut depth, &mut fb);
        assert_eq!(drawn, 0);
        assert_relative_eq!(depth.get(2, 2).unwrap(), 5.0, epsilon = 1e-5);
        assert_eq!(fb.get_pixel(2, 2), Some(Color::new(0, 0, 255)));

        // Equal depth does not overwrite either
        assert_eq!(flat_triangle(5.0).rasterize(0.5, &TexelEcho, &mut depth, &mut fb), 0);
        // A nearer one does
        assert_eq!(flat_triangle(6.0).rasterize(0.5, &TexelEcho, &mut depth, &mut fb), 36);
        assert_eq!(fb.get_pixel(2, 2), Some(Color::new(0, 0, 127)));
    }

    #[test]
    fn test_degenerate_triangle_draws_nothing() {
        let tri = Triangle::new(vertex(0.0, 0.0, 1.0), vertex(4.0, 4.0, 1.0), vertex(8.0, 8.0, 1.0));
        let mut depth = DepthBuffer::new(10, 10);
        let mut fb = Framebuffer::new(10, 10);
        assert_eq!(tri.rasterize(1.0, &TexelEcho, &mut depth, &mut fb), 0);
        assert!(depth.as_slice().iter().all(|&z| z == f32::NEG_INFINITY));
        assert!(fb.pixels().all(|(_, _, c)| c == Color::BLACK));
    }

    #[test]
    fn test_partially_offscreen_triangle() {
        let tri = Triangle::new(vertex(-20.0, -20.0, 0.0), vertex(40.0, -20.0, 0.0), vertex(-20.0, 40.0, 0.0));
        let mut depth = DepthBuffer::new(10, 10);
        let mut fb = Framebuffer::new(10, 10);
        // Hypotenuse x + y = 20 lies beyond the canvas, so everything is covered
        assert_eq!(tri.rasterize(1.0, &TexelEcho, &mut depth, &mut fb), 100);
    }

    fn lit(fb: &Framebuffer) -> Vec<(usize, usize)> {
        fb.pixels()
            .filter(|&(_, _, c)| c != Color::BLACK)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    #[test]
    fn test_line_shallow() {
        let mut fb = Framebuffer::new(12, 12);
        assert_eq!(line(Vec2::new(0, 0), Vec2::new(9, 3), Color::WHITE, &mut fb), 10);
        let pixels = lit(&fb);
        assert_eq!(pixels.len(), 10);
        for x in 0..10 {
            assert_eq!(pixels.iter().filter(|p| p.0 == x).count(), 1, "column {x}");
        }
        assert_eq!(fb.get_pixel(0, 0), Some(Color::WHITE));
        assert_eq!(fb.get_pixel(9, 3), Some(Color::WHITE));
    }

    #[test]
    fn test_line_steep() {
        let mut fb = Framebuffer::new(12, 12);
        assert_eq!(line(Vec2::new(2, 0), Vec2::new(4, 9), Color::RED, &mut fb), 10);
        let pixels = lit(&fb);
        for y in 0..10 {
            assert_eq!(pixels.iter().filter(|p| p.1 == y).count(), 1, "row {y}");
        }
        assert_eq!(fb.get_pixel(2, 0), Some(Color::RED));
        assert_eq!(fb.get_pixel(4, 9), Some(Color::RED));
    }

    #[test]
    fn test_line_reversed_covers_same_pixels() {
        for (a, b) in [
            (Vec2::new(1, 2), Vec2::new(10, 7)),
            (Vec2::new(3, 1), Vec2::new(0, 11)),
            (Vec2::new(0, 5), Vec2::new(11, 5)),
        ] {
            let mut forward = Framebuffer::new(12, 12);
            let mut backward = Framebuffer::new(12, 12);
            line(a, b, Color::WHITE, &mut forward);
            line(b, a, Color::WHITE, &mut backward);
            assert_eq!(lit(&forward), lit(&backward), "{a} -> {b}");
        }
    }

    #[test]
    fn test_line_single_point() {
        let mut fb = Framebuffer::new(8, 8);
        let p = Vec2::new(4, 4);
        assert_eq!(line(p, p, Color::GREEN, &mut fb), 1);
        assert_eq!(lit(&fb), vec![(4, 4)]);
    }

    #[test]
    fn test_line_clipped_to_sink() {
        let mut fb = Framebuffer::new(10, 10);
        assert_eq!(line(Vec2::new(-5, 2), Vec2::new(5, 2), Color::WHITE, &mut fb), 6);
        assert_eq!(line(Vec2::new(-3, -3), Vec2::new(-1, -9), Color::WHITE, &mut fb), 0);
        assert_eq!(lit(&fb).len(), 6);
    }

    #[test]
    fn test_line_clipping_matches_unclipped() {
        let (a, b) = (Vec2::new(-7, 1), Vec2::new(12, 9));
        let shift = Vec2::new(10, 0);
        let mut clipped = Framebuffer::new(10, 10);
        let mut full = Framebuffer::new(30, 10);
        line(a, b, Color::WHITE, &mut clipped);
        line(a + shift, b + shift, Color::WHITE, &mut full);
        let expected: Vec<(usize, usize)> = lit(&full)
            .into_iter()
            .filter(|&(x, _)| (10..20).contains(&x))
            .map(|(x, y)| (x - 10, y))
            .collect();
        assert_eq!(lit(&clipped), expected);
    }

    #[test]
    fn test_line_far_off_canvas() {
        let mut fb = Framebuffer::new(10, 10);
        let written = line(
            Vec2::new(-2_000_000_000, 0),
            Vec2::new(2_000_000_000, 5),
            Color::WHITE,
            &mut fb,
        );
        assert_eq!(written, 10);
        assert!(lit(&fb).iter().all(|&(_, y)| y == 2 || y == 3));
    }
}
