//! Composition of one task card: background, title, footer, panel, overlay.

use std::path::Path;

use log::{debug, warn};

use crate::config::{RunConfig, TaskSpec, VerticalPosition};
use crate::error::RenderError;
use crate::image::RasterImage;
use crate::overlay::render_overlay;
use crate::placement::{place_panel, Frame, PanelGeometry, PanelRequest};
use crate::raster::PixmapSurface;
use crate::surface::Surface;
use crate::text_block::{render_footer, render_title, TextBlock};
use crate::theme::{Color, FontBook};

// ── Canvas constants ────────────────────────────────────────

pub const IMAGE_WIDTH: u32 = 600;
pub const IMAGE_HEIGHT: u32 = 400;
pub const PADDING: f32 = 10.0;
pub const MAX_CODE_HEIGHT: f32 = 300.0;
pub const PANEL_GAP: f32 = 20.0;

impl Default for Frame {
    fn default() -> Self {
        Frame {
            width: IMAGE_WIDTH as f32,
            height: IMAGE_HEIGHT as f32,
            padding: PADDING,
            max_code_height: MAX_CODE_HEIGHT,
            gap: PANEL_GAP,
        }
    }
}

/// What was laid out for one task.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub title: TextBlock,
    pub footer: TextBlock,
    pub panel: Option<PanelGeometry>,
}

/// Background shared by every task of a run. A missing or unreadable file yields `None`
/// and tasks fall back to a white canvas.
pub fn load_background(path: Option<&Path>) -> Option<RasterImage> {
    let path = path?;
    match RasterImage::load(path) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!("Background unavailable, using white: {e}");
            None
        }
    }
}

fn paint_background<S: Surface>(surface: &mut S, background: Option<&RasterImage>) {
    let (w, h) = (surface.width() as f32, surface.height() as f32);
    if let Some(image) = background {
        match surface.draw_image(image, 0.0, 0.0, w, h) {
            Ok(()) => return,
            Err(e) => warn!("Failed to draw background, using white: {e}"),
        }
    }
    surface.fill(Color::WHITE);
}

/// Paint `task` onto `surface`.
///
/// Only a task without title or number is an error, reported before anything is painted.
/// Every other failure degrades the card and is logged where it happens.
pub fn compose_task<S: Surface>(
    surface: &mut S,
    task: &TaskSpec,
    config: &RunConfig,
    background: Option<&RasterImage>,
    frame: &Frame,
) -> Result<Composition, RenderError> {
    let (title_text, number) = task.require_identity()?;
    let settings = &config.font_settings;
    let vertical = config.code_block_position;
    debug!("Composing task {number}");

    paint_background(surface, background);

    let request = PanelRequest::select(task.code.as_deref(), task.language.as_deref(), task.image.as_deref());

    // With the panel at the top, the title only appears below it.
    let title_below_panel = vertical == VerticalPosition::Start && request.is_some();
    let mut title = if title_below_panel {
        let mut scratch = surface.scratch();
        render_title(&mut scratch, title_text, settings, frame.padding, frame.width, settings.title_top_margin)
    } else {
        render_title(surface, title_text, settings, frame.padding, frame.width, settings.title_top_margin)
    };

    let footer = render_footer(
        surface,
        task.bottom_title.as_deref().unwrap_or_default(),
        settings,
        frame.padding,
        frame.width,
        frame.height,
        settings.footer_bottom_margin,
    );

    let panel = request.and_then(|request| {
        place_panel(
            surface,
            &request,
            &title,
            &footer,
            settings,
            vertical,
            config.code_block_horizontal_position,
            frame,
        )
    });
    if title_below_panel && panel.is_none() {
        debug!("No panel for task {number}; title stays at the top");
        title = render_title(surface, title_text, settings, frame.padding, frame.width, settings.title_top_margin);
    }

    render_overlay(surface, config.group_element.as_ref(), &settings.font_family, frame.width, frame.height);

    Ok(Composition { title, footer, panel })
}

/// Render `task` on a fresh 600x400 canvas and encode it as PNG.
pub fn render_task_png(
    task: &TaskSpec,
    config: &RunConfig,
    fonts: &FontBook,
    background: Option<&RasterImage>,
) -> Result<Vec<u8>, RenderError> {
    let mut surface = PixmapSurface::new(IMAGE_WIDTH, IMAGE_HEIGHT, fonts)?;
    compose_task(&mut surface, task, config, background, &Frame::default())?;
    surface.encode_png()
}
