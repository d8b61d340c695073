//! 2D drawing surface abstraction.
//!
//! [`Canvas2d`] models the small slice of an immediate-mode 2D context the
//! draw routines need: a current [`DrawState`] (blend mode, shadow, line
//! style, transform) with a save/restore stack, plus `fill` and `stroke` of
//! a handful of [`Shape`]s.
//!
//! Draw routines never call `save`/`restore` by hand. They open a
//! [`Scoped`] guard, which saves on creation and restores on drop, so a
//! particle's blend mode or transform can never leak into the next one.
//!
//! ```ignore
//! {
//!     let mut c = Scoped::new(canvas);
//!     c.set_blend(BlendMode::Additive);
//!     c.fill(&Shape::circle(pos, 4.0), &Paint::Solid(color));
//! } // state restored here
//! ```

use crate::color::Rgba;
use glam::{Affine2, Vec2};
use std::ops::{Deref, DerefMut};

/// How source pixels combine with the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Source-over alpha blending (default).
    #[default]
    Alpha,
    /// Colors add together and saturate. Overlaps glow brighter.
    Additive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
}

/// Everything `save` captures and `restore` brings back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    pub blend: BlendMode,
    /// Blur radius in pixels. `0` disables the shadow.
    pub shadow_blur: f32,
    pub shadow_color: Rgba,
    pub line_width: f32,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    /// Local to device transform.
    pub transform: Affine2,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            blend: BlendMode::Alpha,
            shadow_blur: 0.0,
            shadow_color: Rgba::TRANSPARENT,
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            transform: Affine2::IDENTITY,
        }
    }
}

impl DrawState {
    /// True when a shadow would be visible.
    pub fn has_shadow(&self) -> bool {
        self.shadow_blur > 0.0 && self.shadow_color.a > 0.0
    }
}

/// Current state plus the saved stack.
#[derive(Debug, Clone, Default)]
pub struct StateStack {
    current: DrawState,
    saved: Vec<DrawState>,
}

impl StateStack {
    pub fn current(&self) -> &DrawState {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut DrawState {
        &mut self.current
    }

    pub fn push(&mut self) {
        self.saved.push(self.current);
    }

    /// Pop the last saved state. An unbalanced restore is ignored.
    pub fn pop(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.current = state;
        }
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn reset(&mut self) {
        self.current = DrawState::default();
        self.saved.clear();
    }
}

/// Gradient color stop. `offset` is in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stop {
    pub offset: f32,
    pub color: Rgba,
}

impl Stop {
    pub fn new(offset: f32, color: Rgba) -> Self {
        Self { offset, color }
    }
}

/// Fill style.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    /// Radial gradient starting at `center` with radius zero and ending at
    /// `radius`. Stops are sorted by offset.
    Radial { center: Vec2, radius: f32, stops: Vec<Stop> },
}

impl Paint {
    /// Color at normalized gradient position `t`.
    pub fn sample(&self, t: f32) -> Rgba {
        match self {
            Paint::Solid(color) => *color,
            Paint::Radial { stops, .. } => sample_stops(stops, t),
        }
    }

    /// Largest alpha the paint can produce.
    pub fn max_alpha(&self) -> f32 {
        match self {
            Paint::Solid(color) => color.a,
            Paint::Radial { stops, .. } => stops.iter().map(|s| s.color.a).fold(0.0, f32::max),
        }
    }
}

fn sample_stops(stops: &[Stop], t: f32) -> Rgba {
    let Some(first) = stops.first() else {
        return Rgba::TRANSPARENT;
    };
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = b.offset - a.offset;
            let k = if span > 0.0 { (t - a.offset) / span } else { 1.0 };
            return lerp_rgba(a.color, b.color, k);
        }
    }
    stops[stops.len() - 1].color
}

fn lerp_rgba(a: Rgba, b: Rgba, k: f32) -> Rgba {
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * k).round().clamp(0.0, 255.0) as u8;
    Rgba::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b), a.a + (b.a - a.a) * k)
}

/// Geometry in local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { center: Vec2, radius: f32 },
    /// Ellipse with semi-axes `radii`, rotated by `rotation` radians.
    Ellipse { center: Vec2, radii: Vec2, rotation: f32 },
    Polyline { points: Vec<Vec2>, closed: bool },
    /// Disconnected line segments.
    Segments(Vec<[Vec2; 2]>),
}

impl Shape {
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Shape::Circle { center, radius }
    }

    pub fn closed(points: Vec<Vec2>) -> Self {
        Shape::Polyline { points, closed: true }
    }
}

/// Immediate-mode 2D drawing target.
pub trait Canvas2d {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn states(&self) -> &StateStack;
    fn states_mut(&mut self) -> &mut StateStack;

    /// Erase every pixel to transparent.
    fn clear(&mut self);

    /// Fill `shape` using the current state.
    fn fill(&mut self, shape: &Shape, paint: &Paint);

    /// Stroke the outline of `shape` using the current line style.
    fn stroke(&mut self, shape: &Shape, color: Rgba);

    fn state(&self) -> &DrawState {
        self.states().current()
    }

    fn save(&mut self) {
        self.states_mut().push();
    }

    fn restore(&mut self) {
        self.states_mut().pop();
    }

    fn set_blend(&mut self, blend: BlendMode) {
        self.states_mut().current_mut().blend = blend;
    }

    fn set_shadow_blur(&mut self, blur: f32) {
        self.states_mut().current_mut().shadow_blur = blur.max(0.0);
    }

    fn set_shadow_color(&mut self, color: Rgba) {
        self.states_mut().current_mut().shadow_color = color;
    }

    fn set_line(&mut self, width: f32, cap: LineCap, join: LineJoin) {
        let state = self.states_mut().current_mut();
        state.line_width = width;
        state.line_cap = cap;
        state.line_join = join;
    }

    fn set_line_width(&mut self, width: f32) {
        self.states_mut().current_mut().line_width = width;
    }

    fn translate(&mut self, offset: Vec2) {
        let state = self.states_mut().current_mut();
        state.transform = state.transform * Affine2::from_translation(offset);
    }

    fn rotate(&mut self, angle: f32) {
        let state = self.states_mut().current_mut();
        state.transform = state.transform * Affine2::from_angle(angle);
    }
}

/// Save on creation, restore on drop.
pub struct Scoped<'a, C: Canvas2d + ?Sized> {
    canvas: &'a mut C,
}

impl<'a, C: Canvas2d + ?Sized> Scoped<'a, C> {
    pub fn new(canvas: &'a mut C) -> Self {
        canvas.save();
        Self { canvas }
    }
}

impl<C: Canvas2d + ?Sized> Deref for Scoped<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.canvas
    }
}

impl<C: Canvas2d + ?Sized> DerefMut for Scoped<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.canvas
    }
}

impl<C: Canvas2d + ?Sized> Drop for Scoped<'_, C> {
    fn drop(&mut self) {
        self.canvas.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DisplayList;

    #[test]
    fn test_scoped_restores_state() {
        let mut canvas = DisplayList::new(100, 100);
        {
            let mut c = Scoped::new(&mut canvas);
            c.set_blend(BlendMode::Additive);
            c.set_shadow_blur(12.0);
            c.translate(Vec2::new(5.0, 5.0));
            {
                let mut inner = Scoped::new(&mut *c);
                inner.rotate(1.0);
                assert_eq!(inner.states().depth(), 2);
            }
            assert_eq!(c.state().transform, Affine2::from_translation(Vec2::new(5.0, 5.0)));
        }
        assert_eq!(*canvas.state(), DrawState::default());
        assert_eq!(canvas.states().depth(), 0);
    }

    #[test]
    fn test_unbalanced_restore_is_ignored() {
        let mut stack = StateStack::default();
        stack.pop();
        assert_eq!(*stack.current(), DrawState::default());
    }

    #[test]
    fn test_gradient_sampling() {
        let paint = Paint::Radial {
            center: Vec2::ZERO,
            radius: 10.0,
            stops: vec![
                Stop::new(0.0, Rgba::new(255, 0, 0, 1.0)),
                Stop::new(1.0, Rgba::new(0, 0, 255, 0.0)),
            ],
        };
        let mid = paint.sample(0.5);
        assert_eq!((mid.r, mid.b), (128, 128));
        assert!((mid.a - 0.5).abs() < 1e-6);
        assert_eq!(paint.sample(-1.0).r, 255);
        assert_eq!(paint.sample(2.0).a, 0.0);
        assert_eq!(paint.max_alpha(), 1.0);
    }
}
