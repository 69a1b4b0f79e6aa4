//! tiny-skia + fontdue implementation of [`Surface`].

use tiny_skia::{FillRule, FilterQuality, Mask, Paint, Pixmap, PixmapPaint, Shader, Stroke, Transform};

use crate::error::RenderError;
use crate::image::{encode_pixmap_png, RasterImage};
use crate::surface::{FontSpec, RoundedRect, Surface, TextMetrics};
use crate::theme::{Color, FontBook};

pub struct PixmapSurface<'f> {
    pixmap: Pixmap,
    fonts: &'f FontBook,
    clips: Vec<Mask>,
}

impl<'f> PixmapSurface<'f> {
    /// Transparent surface; zero-sized dimensions are rejected.
    pub fn new(width: u32, height: u32, fonts: &'f FontBook) -> Result<Self, RenderError> {
        let pixmap = Pixmap::new(width, height)
            .ok_or_else(|| RenderError::Paint(format!("cannot allocate {width}x{height} surface")))?;
        Ok(PixmapSurface { pixmap, fonts, clips: Vec::new() })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        encode_pixmap_png(&self.pixmap)
    }

    fn solid(color: Color) -> Paint<'static> {
        Paint {
            shader: Shader::SolidColor(color.to_skia()),
            anti_alias: true,
            ..Paint::default()
        }
    }
}

impl Surface for PixmapSurface<'_> {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn scratch(&self) -> Self {
        let mut pixmap = self.pixmap.clone();
        pixmap.fill(tiny_skia::Color::TRANSPARENT);
        PixmapSurface { pixmap, fonts: self.fonts, clips: Vec::new() }
    }

    fn fill(&mut self, color: Color) {
        self.pixmap.fill(color.to_skia());
    }

    fn measure_text(&self, text: &str, font: &FontSpec) -> Result<TextMetrics, RenderError> {
        let face = self.fonts.get(font.family)?;
        let width = text.chars().map(|ch| face.metrics(ch, font.size).advance_width).sum();
        let (ascent, descent) = face
            .horizontal_line_metrics(font.size)
            .map(|lm| (lm.ascent, -lm.descent))
            .unwrap_or((font.size * 0.8, font.size * 0.2));
        Ok(TextMetrics { width, ascent, descent })
    }

    /// Per-glyph coverage blended source-over into premultiplied pixels,
    /// scaled by the active clip mask.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, font: &FontSpec, color: Color) -> Result<(), RenderError> {
        let face = self.fonts.get(font.family)?;
        if color.a == 0 {
            return Ok(());
        }
        let pw = self.pixmap.width() as i32;
        let ph = self.pixmap.height() as i32;
        let clip = self.clips.last();
        let data = self.pixmap.data_mut();

        let mut cursor_x = x;
        for ch in text.chars() {
            let (metrics, bitmap) = face.rasterize(ch, font.size);
            let gx = cursor_x as i32 + metrics.xmin;
            let gy = y as i32 - metrics.ymin - metrics.height as i32;

            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let px = gx + col as i32;
                    let py = gy + row as i32;
                    if px < 0 || py < 0 || px >= pw || py >= ph {
                        continue;
                    }
                    let coverage = bitmap[row * metrics.width + col] as u32;
                    if coverage == 0 {
                        continue;
                    }
                    let pixel = (py * pw + px) as usize;
                    let clip_cov = clip.map_or(255, |m| m.data()[pixel] as u32);
                    let alpha = coverage * color.a as u32 / 255 * clip_cov / 255;
                    if alpha == 0 {
                        continue;
                    }
                    let idx = pixel * 4;
                    let inv = 255 - alpha;
                    data[idx] = ((color.r as u32 * alpha + data[idx] as u32 * inv) / 255) as u8;
                    data[idx + 1] = ((color.g as u32 * alpha + data[idx + 1] as u32 * inv) / 255) as u8;
                    data[idx + 2] = ((color.b as u32 * alpha + data[idx + 2] as u32 * inv) / 255) as u8;
                    data[idx + 3] = (alpha + data[idx + 3] as u32 * inv / 255).min(255) as u8;
                }
            }
            cursor_x += metrics.advance_width;
        }
        Ok(())
    }

    fn fill_rounded_rect(&mut self, rect: RoundedRect, color: Color) -> Result<(), RenderError> {
        if color.a == 0 {
            return Ok(());
        }
        if let Some(path) = rect.to_path() {
            self.pixmap
                .fill_path(&path, &Self::solid(color), FillRule::Winding, Transform::identity(), self.clips.last());
        }
        Ok(())
    }

    fn stroke_rounded_rect(&mut self, rect: RoundedRect, color: Color, line_width: f32) -> Result<(), RenderError> {
        if color.a == 0 {
            return Ok(());
        }
        if let Some(path) = rect.to_path() {
            let stroke = Stroke { width: line_width, ..Stroke::default() };
            self.pixmap
                .stroke_path(&path, &Self::solid(color), &stroke, Transform::identity(), self.clips.last());
        }
        Ok(())
    }

    fn draw_image(&mut self, image: &RasterImage, x: f32, y: f32, width: f32, height: f32) -> Result<(), RenderError> {
        if width <= 0.0 || height <= 0.0 {
            return Ok(());
        }
        let sx = width / image.width() as f32;
        let sy = height / image.height() as f32;
        let transform = Transform::from_row(sx, 0.0, 0.0, sy, x, y);
        let paint = PixmapPaint { quality: FilterQuality::Bilinear, ..PixmapPaint::default() };
        self.pixmap
            .draw_pixmap(0, 0, image.pixmap().as_ref(), &paint, transform, self.clips.last());
        Ok(())
    }

    /// Clips nest: each pushed region is intersected with the current one.
    fn push_clip(&mut self, rect: RoundedRect) -> Result<(), RenderError> {
        let mut mask = match self.clips.last() {
            Some(current) => current.clone(),
            None => {
                let mut full = Mask::new(self.pixmap.width(), self.pixmap.height())
                    .ok_or_else(|| RenderError::Paint("cannot allocate clip mask".into()))?;
                full.data_mut().fill(255);
                full
            }
        };
        match rect.to_path() {
            Some(path) => mask.intersect_path(&path, FillRule::Winding, true, Transform::identity()),
            None => mask.data_mut().fill(0),
        }
        self.clips.push(mask);
        Ok(())
    }

    fn pop_clip(&mut self) {
        self.clips.pop();
    }
}
