//! Decorative element anchored to the bottom-right corner, painted last.

use log::{error, warn};

use crate::config::GroupElement;
use crate::image::RasterImage;
use crate::surface::{FontSpec, Surface};

/// Paint `element`, if any. Failures are logged and leave the surface as it was.
///
/// Text is right-anchored on its measured width with its baseline `margin_bottom` above the
/// bottom edge; images keep their native size. A text element without its own family uses
/// `default_family`.
pub fn render_overlay<S: Surface>(
    surface: &mut S,
    element: Option<&GroupElement>,
    default_family: &str,
    image_width: f32,
    image_height: f32,
) {
    let Some(element) = element else {
        return;
    };
    match element {
        GroupElement::Text { content, font_size, font_color, font_family, margin_right, margin_bottom } => {
            if content.is_empty() {
                return;
            }
            let font = FontSpec::new(font_family.as_deref().unwrap_or(default_family), *font_size);
            let result = surface.measure_text(content, &font).and_then(|m| {
                let x = image_width - margin_right - m.width;
                let y = image_height - margin_bottom;
                surface.fill_text(content, x, y, &font, *font_color)
            });
            if let Err(e) = result {
                error!("Failed to draw overlay text {content:?}: {e}");
            }
        }
        GroupElement::Image { image_path, margin_right, margin_bottom } => {
            let image = match RasterImage::load(image_path) {
                Ok(image) => image,
                Err(e) => {
                    warn!("Skipping overlay image: {e}");
                    return;
                }
            };
            let (w, h) = (image.width() as f32, image.height() as f32);
            let x = image_width - margin_right - w;
            let y = image_height - margin_bottom - h;
            if let Err(e) = surface.draw_image(&image, x, y, w, h) {
                error!("Failed to draw overlay image {}: {e}", image_path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::image::fixtures::write_png;
    use crate::surface::testing::{Op, RecordingSurface};
    use crate::theme::Color;

    fn text(content: &str, family: Option<&str>) -> GroupElement {
        GroupElement::Text {
            content: content.into(),
            font_size: 14.0,
            font_color: Color::rgb(9, 9, 9),
            font_family: family.map(String::from),
            margin_right: 10.0,
            margin_bottom: 8.0,
        }
    }

    #[test]
    fn text_is_anchored_bottom_right() {
        let mut surface = RecordingSurface::new(600, 400);
        render_overlay(&mut surface, Some(&text("#rust", None)), "Mono", 600.0, 400.0);
        // 5 chars * 7px
        assert_eq!(surface.texts(), vec![("#rust".to_string(), 600.0 - 10.0 - 35.0, 392.0, Color::rgb(9, 9, 9))]);
    }

    #[test]
    fn image_keeps_native_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "logo.png", 32, 16, [0, 0, 0]);
        let element = GroupElement::Image { image_path: path, margin_right: 4.0, margin_bottom: 6.0 };
        let mut surface = RecordingSurface::new(600, 400);
        render_overlay(&mut surface, Some(&element), "Mono", 600.0, 400.0);
        assert_eq!(surface.ops, vec![Op::Image { x: 564.0, y: 378.0, width: 32.0, height: 16.0 }]);
    }

    #[test]
    fn absent_or_broken_elements_are_no_ops() {
        let mut surface = RecordingSurface::new(600, 400);
        render_overlay(&mut surface, None, "Mono", 600.0, 400.0);
        render_overlay(&mut surface, Some(&text("", None)), "Mono", 600.0, 400.0);
        // empty family cannot be measured
        render_overlay(&mut surface, Some(&text("x", Some(""))), "Mono", 600.0, 400.0);
        let missing = GroupElement::Image { image_path: PathBuf::from("/missing/logo.png"), margin_right: 0.0, margin_bottom: 0.0 };
        render_overlay(&mut surface, Some(&missing), "Mono", 600.0, 400.0);
        assert!(surface.ops.is_empty());
    }
}
