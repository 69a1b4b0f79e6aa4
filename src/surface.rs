//! Drawing-surface abstraction used by every renderer.
//!
//! Renderers only talk to [`Surface`]; [`crate::raster::PixmapSurface`] is the real
//! tiny-skia backend. Text coordinates are alphabetic baselines.

use std::ops::{Deref, DerefMut};

use crate::error::RenderError;
use crate::image::RasterImage;
use crate::theme::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec<'a> {
    pub family: &'a str,
    pub size: f32,
}

impl<'a> FontSpec<'a> {
    pub fn new(family: &'a str, size: f32) -> Self {
        FontSpec { family, size }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextMetrics {
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub radius: f32,
}

impl RoundedRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32, radius: f32) -> Self {
        RoundedRect { x, y, width, height, radius }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Corner radius clamped so opposite corners never overlap.
    pub fn effective_radius(&self) -> f32 {
        self.radius.min(self.width / 2.0).min(self.height / 2.0).max(0.0)
    }

    /// Line and quadratic-curve outline, clockwise from the top-left corner's end.
    pub fn to_path(&self) -> Option<tiny_skia::Path> {
        if self.is_empty() {
            return None;
        }
        let RoundedRect { x, y, width: w, height: h, .. } = *self;
        let r = self.effective_radius();
        let mut pb = tiny_skia::PathBuilder::new();
        pb.move_to(x + r, y);
        pb.line_to(x + w - r, y);
        pb.quad_to(x + w, y, x + w, y + r);
        pb.line_to(x + w, y + h - r);
        pb.quad_to(x + w, y + h, x + w - r, y + h);
        pb.line_to(x + r, y + h);
        pb.quad_to(x, y + h, x, y + h - r);
        pb.line_to(x, y + r);
        pb.quad_to(x, y, x + r, y);
        pb.close();
        pb.finish()
    }
}

pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// A blank off-screen surface of the same size and fonts, for measurement passes.
    fn scratch(&self) -> Self
    where
        Self: Sized;

    fn fill(&mut self, color: Color);

    fn measure_text(&self, text: &str, font: &FontSpec) -> Result<TextMetrics, RenderError>;

    fn fill_text(&mut self, text: &str, x: f32, y: f32, font: &FontSpec, color: Color) -> Result<(), RenderError>;

    fn fill_rounded_rect(&mut self, rect: RoundedRect, color: Color) -> Result<(), RenderError>;

    fn stroke_rounded_rect(&mut self, rect: RoundedRect, color: Color, line_width: f32) -> Result<(), RenderError>;

    /// Blit `image` scaled to `width` x `height` at (`x`, `y`).
    fn draw_image(&mut self, image: &RasterImage, x: f32, y: f32, width: f32, height: f32) -> Result<(), RenderError>;

    fn push_clip(&mut self, rect: RoundedRect) -> Result<(), RenderError>;

    fn pop_clip(&mut self);

    /// Clip to `rect` until the returned guard is dropped.
    fn clipped(&mut self, rect: RoundedRect) -> Result<ClipScope<'_, Self>, RenderError>
    where
        Self: Sized,
    {
        self.push_clip(rect)?;
        Ok(ClipScope { surface: self })
    }
}

/// Active clip region; pops it on drop so early returns restore the previous state.
pub struct ClipScope<'a, S: Surface> {
    surface: &'a mut S,
}

impl<S: Surface> Deref for ClipScope<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: Surface> DerefMut for ClipScope<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: Surface> Drop for ClipScope<'_, S> {
    fn drop(&mut self) {
        self.surface.pop_clip();
    }
}
