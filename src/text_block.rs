//! Title and footer text blocks.
//!
//! The title hangs from a top margin; the footer stands on a bottom margin. Both wrap to the
//! canvas width minus padding and align each line independently.

use log::error;

use crate::config::{FontSettings, HorizontalAlign};
use crate::surface::{FontSpec, Surface};
use crate::theme::Color;
use crate::wrap::wrap_text;

/// Geometry of a painted title or footer.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Baseline just past the last painted line.
    pub final_y: f32,
    pub lines: Vec<String>,
    /// Zero when nothing was painted.
    pub line_height: f32,
}

impl TextBlock {
    fn empty(final_y: f32) -> Self {
        TextBlock { final_y, lines: Vec::new(), line_height: 0.0 }
    }

    /// Vertical extent of the wrapped lines.
    pub fn height(&self) -> f32 {
        self.lines.len() as f32 * self.line_height
    }
}

/// Left edge of a line of width `line_width` inside `[padding, image_width - padding]`.
pub fn align_x(align: HorizontalAlign, line_width: f32, padding: f32, image_width: f32) -> f32 {
    let available = image_width - 2.0 * padding;
    match align {
        HorizontalAlign::Start => padding,
        HorizontalAlign::Center => padding + (available - line_width) / 2.0,
        HorizontalAlign::Right => image_width - padding - line_width,
    }
}

pub fn render_title<S: Surface>(
    surface: &mut S,
    text: &str,
    settings: &FontSettings,
    padding: f32,
    image_width: f32,
    top_margin: f32,
) -> TextBlock {
    if text.is_empty() {
        return TextBlock::empty(top_margin);
    }
    let font = FontSpec::new(&settings.font_family, settings.title_size);
    let lines = wrap_lines(surface, text, &font, image_width - 2.0 * padding);
    let line_height = FontSettings::line_height(settings.title_size);

    match paint_lines(surface, &lines, &font, settings.title_color, settings.title_align, padding, image_width, top_margin, line_height) {
        Some(final_y) => TextBlock { final_y, lines, line_height },
        None => {
            error!("Failed to draw title {text:?}");
            TextBlock::empty(top_margin)
        }
    }
}

pub fn render_footer<S: Surface>(
    surface: &mut S,
    text: &str,
    settings: &FontSettings,
    padding: f32,
    image_width: f32,
    image_height: f32,
    bottom_margin: f32,
) -> TextBlock {
    if text.is_empty() {
        return TextBlock::empty(image_height);
    }
    let font = FontSpec::new(&settings.font_family, settings.footer_size);
    let lines = wrap_lines(surface, text, &font, image_width - 2.0 * padding);
    let line_height = FontSettings::line_height(settings.footer_size);
    let start_y = image_height - bottom_margin - lines.len() as f32 * line_height;

    match paint_lines(surface, &lines, &font, settings.footer_color, settings.footer_align, padding, image_width, start_y, line_height) {
        Some(final_y) => TextBlock { final_y, lines, line_height },
        None => {
            error!("Failed to draw footer {text:?}");
            TextBlock::empty(image_height)
        }
    }
}

fn wrap_lines<S: Surface>(surface: &S, text: &str, font: &FontSpec, max_width: f32) -> Vec<String> {
    wrap_text(text, |s| surface.measure_text(s, font).map(|m| m.width), max_width)
}

/// Paint `lines` downward from baseline `start_y`; returns the baseline after the last line.
#[allow(clippy::too_many_arguments)]
pub(crate) fn paint_lines<S: Surface>(
    surface: &mut S,
    lines: &[String],
    font: &FontSpec,
    color: Color,
    align: HorizontalAlign,
    padding: f32,
    image_width: f32,
    start_y: f32,
    line_height: f32,
) -> Option<f32> {
    let mut y = start_y;
    for line in lines {
        let width = match surface.measure_text(line, font) {
            Ok(m) => m.width,
            Err(e) => {
                error!("Failed to measure {line:?}: {e}");
                return None;
            }
        };
        let x = align_x(align, width, padding, image_width);
        if let Err(e) = surface.fill_text(line, x, y, font, color) {
            error!("Failed to paint {line:?}: {e}");
            return None;
        }
        y += line_height;
    }
    Some(y)
}
