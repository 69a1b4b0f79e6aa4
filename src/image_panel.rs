//! Image panel: an external picture scaled into a box and clipped to rounded corners.

use std::path::Path;

use log::error;

use crate::error::RenderError;
use crate::image::RasterImage;
use crate::surface::{RoundedRect, Surface};

/// Shrink to `max_width` first, then to `max_height`, keeping the aspect ratio.
///
/// This is sequential rather than a min-of-ratios fit; both passes only ever shrink.
pub fn fit_sequential(width: f32, height: f32, max_width: f32, max_height: f32) -> (f32, f32) {
    if !(width > 0.0 && height > 0.0) {
        return (0.0, 0.0);
    }
    let aspect = width / height;
    let (mut w, mut h) = (width, height);
    if w > max_width {
        w = max_width;
        h = w / aspect;
    }
    if h > max_height {
        h = max_height;
        w = h * aspect;
    }
    (w, h)
}

/// Paint the image at `path` centered in the box and return the reserved height,
/// `max_height + 2 * padding`. A missing or undecodable image paints nothing and returns 0.
#[allow(clippy::too_many_arguments)]
pub fn render_image_panel<S: Surface>(
    surface: &mut S,
    path: &Path,
    x: f32,
    y: f32,
    max_width: f32,
    max_height: f32,
    padding: f32,
    radius: f32,
) -> f32 {
    let image = match RasterImage::load(path) {
        Ok(image) => image,
        Err(e) => {
            error!("Failed to load panel image: {e}");
            return 0.0;
        }
    };
    match paint_image(surface, &image, x, y, max_width, max_height, padding, radius) {
        Ok(()) => max_height + 2.0 * padding,
        Err(e) => {
            error!("Failed to draw panel image {}: {e}", path.display());
            0.0
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn paint_image<S: Surface>(
    surface: &mut S,
    image: &RasterImage,
    x: f32,
    y: f32,
    max_width: f32,
    max_height: f32,
    padding: f32,
    radius: f32,
) -> Result<(), RenderError> {
    let (w, h) = fit_sequential(image.width() as f32, image.height() as f32, max_width, max_height);
    let img_x = x + padding + (max_width - w) / 2.0;
    let img_y = y + padding + (max_height - h) / 2.0;

    let mut clipped = surface.clipped(RoundedRect::new(x, y, max_width, max_height, radius))?;
    clipped.draw_image(image, img_x, img_y, w, h)
}
