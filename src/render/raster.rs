//! CPU rasterizer.
//!
//! [`RasterCanvas`] renders into a premultiplied RGBA float buffer. Shapes
//! are turned into an anti-aliased coverage mask, an optional blurred copy of
//! the mask is composited first as the shadow, then the paint is blended
//! through the mask with the current [`BlendMode`].
//!
//! Transforms are assumed to be rigid (translate and rotate), which is all
//! the draw routines use. Line caps are always round.

use super::canvas::{BlendMode, Canvas2d, DrawState, Paint, Shape, StateStack};
use crate::color::{Rgb, Rgba};
use crate::error::ExportError;
use glam::{Affine2, Vec2};
use image::{Rgba as Pixel, RgbaImage};
use std::path::Path;

/// Software canvas with a premultiplied float framebuffer.
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    width: u32,
    height: u32,
    /// Premultiplied RGBA, row-major.
    pixels: Vec<[f32; 4]>,
    states: StateStack,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width as usize * height as usize],
            states: StateStack::default(),
        }
    }

    /// Premultiplied pixel at `(x, y)`, `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Straight-alpha 8-bit image with a transparent background.
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let [r, g, b, a] = self.pixels[(y * self.width + x) as usize];
            if a <= 0.0 {
                return Pixel([0, 0, 0, 0]);
            }
            Pixel([to_u8(r / a), to_u8(g / a), to_u8(b / a), to_u8(a)])
        })
    }

    /// Opaque image composited over `background`.
    pub fn to_image_over(&self, background: Rgb) -> RgbaImage {
        let bg = [background.r, background.g, background.b].map(|c| c as f32 / 255.0);
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let [r, g, b, a] = self.pixels[(y * self.width + x) as usize];
            let inv = 1.0 - a.min(1.0);
            Pixel([to_u8(r + bg[0] * inv), to_u8(g + bg[1] * inv), to_u8(b + bg[2] * inv), 255])
        })
    }

    /// Write the canvas as a PNG, over `background` when given.
    pub fn save_png(&self, path: impl AsRef<Path>, background: Option<Rgb>) -> Result<(), ExportError> {
        let image = match background {
            Some(bg) => self.to_image_over(bg),
            None => self.to_image(),
        };
        image.save(path.as_ref())?;
        log::debug!("Wrote frame {}", path.as_ref().display());
        Ok(())
    }

    /// Raw straight-alpha bytes, for uploading to a texture.
    pub fn to_rgba8(&self, background: Option<Rgb>) -> Vec<u8> {
        match background {
            Some(bg) => self.to_image_over(bg).into_raw(),
            None => self.to_image().into_raw(),
        }
    }

    fn draw(&mut self, shape: &Shape, paint: &Paint, stroke_width: Option<f32>) {
        let state = *self.state();
        let prepared = Prepared::new(shape, &state.transform);
        let pad = if state.has_shadow() { state.shadow_blur.ceil() + 2.0 } else { 0.0 };
        let half_width = stroke_width.map(|w| w.max(1.0) / 2.0);
        let thin = stroke_width.map_or(1.0, |w| w.clamp(0.0, 1.0));

        let Some(mut mask) = Mask::covering(prepared.bounds(half_width.unwrap_or(0.0)), pad, self.width, self.height)
        else {
            return;
        };
        match half_width {
            Some(hw) => prepared.stroke_into(&mut mask, hw),
            None => prepared.fill_into(&mut mask),
        }
        if thin < 1.0 {
            mask.data.iter_mut().for_each(|c| *c *= thin);
        }

        if state.has_shadow() {
            let mut shadow = mask.clone();
            shadow.blur((state.shadow_blur / 2.0).round().max(1.0) as usize);
            let strength = state.shadow_color.a * paint.max_alpha();
            let color = Rgba { a: 1.0, ..state.shadow_color };
            self.composite(&shadow, &state, |_| color, strength);
        }

        let device_paint = DevicePaint::new(paint, &state.transform);
        self.composite(&mask, &state, |p| device_paint.at(p), 1.0);
    }

    fn composite(&mut self, mask: &Mask, state: &DrawState, color_at: impl Fn(Vec2) -> Rgba, strength: f32) {
        for my in 0..mask.h {
            for mx in 0..mask.w {
                let coverage = mask.data[my * mask.w + mx] * strength;
                if coverage <= 0.0 {
                    continue;
                }
                let x = mask.x0 + mx;
                let y = mask.y0 + my;
                let color = color_at(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
                let [r, g, b, a] = color.to_f32();
                let sa = a * coverage;
                if sa <= 0.0 {
                    continue;
                }
                let src = [r * sa, g * sa, b * sa, sa];
                let dst = &mut self.pixels[y * self.width as usize + x];
                match state.blend {
                    BlendMode::Alpha => {
                        for i in 0..4 {
                            dst[i] = src[i] + dst[i] * (1.0 - sa);
                        }
                    }
                    BlendMode::Additive => {
                        for i in 0..4 {
                            dst[i] = (src[i] + dst[i]).min(1.0);
                        }
                    }
                }
            }
        }
    }
}

impl Canvas2d for RasterCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn states(&self) -> &StateStack {
        &self.states
    }

    fn states_mut(&mut self) -> &mut StateStack {
        &mut self.states
    }

    fn clear(&mut self) {
        self.pixels.fill([0.0; 4]);
    }

    fn fill(&mut self, shape: &Shape, paint: &Paint) {
        self.draw(shape, paint, None);
    }

    fn stroke(&mut self, shape: &Shape, color: Rgba) {
        let width = self.state().line_width;
        if width <= 0.0 || !width.is_finite() {
            return;
        }
        self.draw(shape, &Paint::Solid(color), Some(width));
    }
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

// ============================================================================
// Device-space geometry
// ============================================================================

/// Shape mapped into device pixels.
enum Prepared {
    Circle { center: Vec2, radius: f32 },
    Ellipse { center: Vec2, radii: Vec2, rotation: f32 },
    Path { points: Vec<Vec2>, closed: bool },
    Segments(Vec<[Vec2; 2]>),
}

impl Prepared {
    fn new(shape: &Shape, transform: &Affine2) -> Self {
        let scale = transform.matrix2.x_axis.length();
        let angle = transform.matrix2.x_axis.y.atan2(transform.matrix2.x_axis.x);
        let map = |p: Vec2| transform.transform_point2(p);
        match shape {
            Shape::Circle { center, radius } => Prepared::Circle {
                center: map(*center),
                radius: radius * scale,
            },
            Shape::Ellipse { center, radii, rotation } => Prepared::Ellipse {
                center: map(*center),
                radii: *radii * scale,
                rotation: rotation + angle,
            },
            Shape::Polyline { points, closed } => Prepared::Path {
                points: points.iter().copied().map(map).collect(),
                closed: *closed,
            },
            Shape::Segments(segments) => {
                Prepared::Segments(segments.iter().map(|[a, b]| [map(*a), map(*b)]).collect())
            }
        }
    }

    /// Device bounding box `(min, max)` grown by `grow` pixels.
    fn bounds(&self, grow: f32) -> Option<(Vec2, Vec2)> {
        let (min, max) = match self {
            Prepared::Circle { center, radius } => (*center - *radius, *center + *radius),
            Prepared::Ellipse { center, radii, .. } => {
                let r = radii.max_element();
                (*center - r, *center + r)
            }
            Prepared::Path { points, .. } => points_bounds(points.iter().copied())?,
            Prepared::Segments(segments) => points_bounds(segments.iter().flatten().copied())?,
        };
        if !(min.is_finite() && max.is_finite()) {
            return None;
        }
        Some((min - grow - 1.0, max + grow + 1.0))
    }

    fn fill_into(&self, mask: &mut Mask) {
        match self {
            Prepared::Circle { center, radius } => {
                mask.each(|p| (radius - p.distance(*center) + 0.5).clamp(0.0, 1.0));
            }
            Prepared::Ellipse { center, radii, rotation } => {
                mask.each(|p| (0.5 - ellipse_distance(p, *center, *radii, *rotation)).clamp(0.0, 1.0));
            }
            Prepared::Path { points, .. } => {
                if points.len() >= 3 {
                    mask.each(|p| if contains_even_odd(points, p) { 1.0 } else { 0.0 });
                }
            }
            // open segments enclose nothing
            Prepared::Segments(_) => {}
        }
    }

    fn stroke_into(&self, mask: &mut Mask, half_width: f32) {
        match self {
            Prepared::Circle { center, radius } => {
                mask.each(|p| (half_width - (p.distance(*center) - radius).abs() + 0.5).clamp(0.0, 1.0));
            }
            Prepared::Ellipse { center, radii, rotation } => {
                mask.each(|p| {
                    let d = ellipse_distance(p, *center, *radii, *rotation).abs();
                    (half_width - d + 0.5).clamp(0.0, 1.0)
                });
            }
            Prepared::Path { points, closed } => {
                for pair in points.windows(2) {
                    mask.stamp_segment(pair[0], pair[1], half_width);
                }
                if *closed && points.len() > 2 {
                    mask.stamp_segment(points[points.len() - 1], points[0], half_width);
                }
            }
            Prepared::Segments(segments) => {
                for [a, b] in segments {
                    mask.stamp_segment(*a, *b, half_width);
                }
            }
        }
    }
}

fn points_bounds(mut points: impl Iterator<Item = Vec2>) -> Option<(Vec2, Vec2)> {
    let first = points.next()?;
    Some(points.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
}

/// Approximate signed distance to an ellipse outline (negative inside).
fn ellipse_distance(p: Vec2, center: Vec2, radii: Vec2, rotation: f32) -> f32 {
    let radii = radii.max(Vec2::splat(1e-3));
    let q = Vec2::from_angle(-rotation).rotate(p - center);
    let f = (q.x / radii.x).powi(2) + (q.y / radii.y).powi(2) - 1.0;
    let grad = 2.0 * Vec2::new(q.x / (radii.x * radii.x), q.y / (radii.y * radii.y)).length();
    if grad > 1e-6 {
        f / grad
    } else {
        -radii.min_element()
    }
}

fn contains_even_odd(points: &[Vec2], p: Vec2) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    let t = if len2 > 0.0 { ((p - a).dot(ab) / len2).clamp(0.0, 1.0) } else { 0.0 };
    p.distance(a + ab * t)
}

/// Paint resolved into device coordinates.
enum DevicePaint<'a> {
    Solid(Rgba),
    Radial { center: Vec2, radius: f32, paint: &'a Paint },
}

impl<'a> DevicePaint<'a> {
    fn new(paint: &'a Paint, transform: &Affine2) -> Self {
        match paint {
            Paint::Solid(color) => DevicePaint::Solid(*color),
            Paint::Radial { center, radius, .. } => DevicePaint::Radial {
                center: transform.transform_point2(*center),
                radius: radius * transform.matrix2.x_axis.length(),
                paint,
            },
        }
    }

    fn at(&self, p: Vec2) -> Rgba {
        match self {
            DevicePaint::Solid(color) => *color,
            DevicePaint::Radial { center, radius, paint } => {
                let t = if *radius > 0.0 { p.distance(*center) / radius } else { 1.0 };
                paint.sample(t)
            }
        }
    }
}

// ============================================================================
// Coverage mask
// ============================================================================

/// Coverage values over a device-space rectangle clipped to the canvas.
#[derive(Clone)]
struct Mask {
    x0: usize,
    y0: usize,
    w: usize,
    h: usize,
    data: Vec<f32>,
}

impl Mask {
    fn covering(bounds: Option<(Vec2, Vec2)>, pad: f32, width: u32, height: u32) -> Option<Mask> {
        let (min, max) = bounds?;
        let x0 = (min.x - pad).floor().max(0.0);
        let y0 = (min.y - pad).floor().max(0.0);
        let x1 = (max.x + pad).ceil().min(width as f32);
        let y1 = (max.y + pad).ceil().min(height as f32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        let (w, h) = ((x1 - x0) as usize, (y1 - y0) as usize);
        Some(Mask {
            x0: x0 as usize,
            y0: y0 as usize,
            w,
            h,
            data: vec![0.0; w * h],
        })
    }

    fn each(&mut self, coverage: impl Fn(Vec2) -> f32) {
        for my in 0..self.h {
            for mx in 0..self.w {
                let p = Vec2::new((self.x0 + mx) as f32 + 0.5, (self.y0 + my) as f32 + 0.5);
                self.data[my * self.w + mx] = coverage(p);
            }
        }
    }

    /// Max-accumulate a round-capped segment of half width `hw`.
    fn stamp_segment(&mut self, a: Vec2, b: Vec2, hw: f32) {
        let lo = a.min(b) - hw - 1.0;
        let hi = a.max(b) + hw + 1.0;
        let mx0 = (lo.x.floor() as i64 - self.x0 as i64).max(0) as usize;
        let my0 = (lo.y.floor() as i64 - self.y0 as i64).max(0) as usize;
        let mx1 = ((hi.x.ceil() as i64 - self.x0 as i64).max(0) as usize).min(self.w);
        let my1 = ((hi.y.ceil() as i64 - self.y0 as i64).max(0) as usize).min(self.h);
        for my in my0..my1 {
            for mx in mx0..mx1 {
                let p = Vec2::new((self.x0 + mx) as f32 + 0.5, (self.y0 + my) as f32 + 0.5);
                let c = (hw - segment_distance(p, a, b) + 0.5).clamp(0.0, 1.0);
                let slot = &mut self.data[my * self.w + mx];
                *slot = slot.max(c);
            }
        }
    }

    /// Two passes of a separable box blur approximate a gaussian.
    fn blur(&mut self, radius: usize) {
        for _ in 0..2 {
            box_pass(&mut self.data, self.w, self.h, radius, true);
            box_pass(&mut self.data, self.w, self.h, radius, false);
        }
    }
}

fn box_pass(data: &mut [f32], w: usize, h: usize, radius: usize, horizontal: bool) {
    let (lines, len) = if horizontal { (h, w) } else { (w, h) };
    let index = |line: usize, i: usize| if horizontal { line * w + i } else { i * w + line };
    let norm = 1.0 / (2 * radius + 1) as f32;
    let mut scratch = vec![0.0; len];

    for line in 0..lines {
        let mut sum = 0.0;
        for i in 0..=radius.min(len.saturating_sub(1)) {
            sum += data[index(line, i)];
        }
        for (i, out) in scratch.iter_mut().enumerate() {
            *out = sum * norm;
            if i + radius + 1 < len {
                sum += data[index(line, i + radius + 1)];
            }
            if i >= radius {
                sum -= data[index(line, i - radius)];
            }
        }
        for (i, v) in scratch.iter().enumerate() {
            data[index(line, i)] = *v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha(c: &RasterCanvas, x: u32, y: u32) -> f32 {
        c.pixel(x, y).map_or(0.0, |p| p[3])
    }

    #[test]
    fn test_fill_circle_coverage() {
        let mut canvas = RasterCanvas::new(40, 40);
        canvas.fill(&Shape::circle(Vec2::splat(20.0), 8.0), &Paint::Solid(Rgba::new(255, 0, 0, 1.0)));
        assert!((alpha(&canvas, 20, 20) - 1.0).abs() < 1e-6);
        assert_eq!(alpha(&canvas, 2, 2), 0.0);
        let image = canvas.to_image();
        assert_eq!(image.get_pixel(20, 20).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_additive_saturates() {
        let mut canvas = RasterCanvas::new(10, 10);
        canvas.set_blend(BlendMode::Additive);
        let paint = Paint::Solid(Rgba::new(255, 255, 255, 0.6));
        let shape = Shape::circle(Vec2::splat(5.0), 4.0);
        canvas.fill(&shape, &paint);
        canvas.fill(&shape, &paint);
        assert_eq!(alpha(&canvas, 5, 5), 1.0);
    }

    #[test]
    fn test_source_over_accumulates() {
        let mut canvas = RasterCanvas::new(10, 10);
        let paint = Paint::Solid(Rgba::new(255, 255, 255, 0.5));
        let shape = Shape::circle(Vec2::splat(5.0), 4.0);
        canvas.fill(&shape, &paint);
        canvas.fill(&shape, &paint);
        assert!((alpha(&canvas, 5, 5) - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_stroke_closed_ring() {
        let mut canvas = RasterCanvas::new(60, 60);
        let points: Vec<Vec2> = (0..=64)
            .map(|i| Vec2::splat(30.0) + Vec2::from_angle(i as f32 / 64.0 * std::f32::consts::TAU) * 20.0)
            .collect();
        canvas.set_line_width(2.0);
        canvas.stroke(&Shape::closed(points), Rgba::new(0, 255, 0, 1.0));
        assert!(alpha(&canvas, 50, 30) > 0.5);
        assert_eq!(alpha(&canvas, 30, 30), 0.0);
    }

    #[test]
    fn test_shadow_spreads_beyond_shape() {
        let mut plain = RasterCanvas::new(40, 40);
        let mut glowing = RasterCanvas::new(40, 40);
        let shape = Shape::circle(Vec2::splat(20.0), 4.0);
        let paint = Paint::Solid(Rgba::new(255, 255, 255, 1.0));
        plain.fill(&shape, &paint);
        glowing.set_shadow_blur(10.0);
        glowing.set_shadow_color(Rgba::new(255, 255, 255, 1.0));
        glowing.fill(&shape, &paint);
        assert_eq!(alpha(&plain, 27, 20), 0.0);
        assert!(alpha(&glowing, 27, 20) > 0.0);
    }

    #[test]
    fn test_transform_moves_shape() {
        let mut canvas = RasterCanvas::new(40, 40);
        canvas.translate(Vec2::new(30.0, 10.0));
        canvas.fill(&Shape::circle(Vec2::ZERO, 3.0), &Paint::Solid(Rgba::new(255, 255, 255, 1.0)));
        assert!(alpha(&canvas, 30, 10) > 0.9);
        assert_eq!(alpha(&canvas, 5, 5), 0.0);
    }

    #[test]
    fn test_ellipse_orientation() {
        let mut canvas = RasterCanvas::new(40, 40);
        let shape = Shape::Ellipse {
            center: Vec2::splat(20.0),
            radii: Vec2::new(12.0, 2.0),
            rotation: 0.0,
        };
        canvas.fill(&shape, &Paint::Solid(Rgba::new(255, 255, 255, 1.0)));
        assert!(alpha(&canvas, 30, 20) > 0.9);
        assert_eq!(alpha(&canvas, 20, 30), 0.0);
    }

    #[test]
    fn test_offscreen_draw_is_ignored() {
        let mut canvas = RasterCanvas::new(10, 10);
        canvas.fill(&Shape::circle(Vec2::splat(-50.0), 3.0), &Paint::Solid(Rgba::new(255, 255, 255, 1.0)));
        canvas.fill(&Shape::circle(Vec2::splat(f32::NAN), 3.0), &Paint::Solid(Rgba::new(255, 255, 255, 1.0)));
        assert!(canvas.to_image().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_background_composite() {
        let canvas = RasterCanvas::new(4, 4);
        let image = canvas.to_image_over(Rgb::new(10, 20, 30));
        assert_eq!(image.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }
}
