//! Panel placement: picks the code or image panel, measures it on a scratch surface,
//! solves its position against the title and footer blocks, then paints it for real.

use std::path::Path;

use log::{debug, warn};

use crate::code_panel::{layout_code, render_code_panel};
use crate::config::{FontSettings, HorizontalAlign, VerticalPosition};
use crate::image_panel::render_image_panel;
use crate::surface::{FontSpec, Surface};
use crate::text_block::{align_x, paint_lines, TextBlock};

/// Fixed canvas geometry shared by every renderer of one task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub width: f32,
    pub height: f32,
    /// Outer margin around title, footer and panel.
    pub padding: f32,
    /// Height budget of the code rows; image panels get this plus panel padding.
    pub max_code_height: f32,
    /// Minimum distance between the title block and the panel.
    pub gap: f32,
}

/// The single panel a task shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelRequest<'a> {
    Code { code: &'a str, language: Option<&'a str> },
    Image(&'a Path),
}

impl<'a> PanelRequest<'a> {
    /// Code wins over an image; empty code counts as absent.
    pub fn select(code: Option<&'a str>, language: Option<&'a str>, image: Option<&'a Path>) -> Option<Self> {
        match (code.filter(|c| !c.is_empty()), image) {
            (Some(code), _) => Some(PanelRequest::Code { code, language }),
            (None, Some(path)) => Some(PanelRequest::Image(path)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelGeometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Top edge of a panel of `panel_height` under `policy`.
///
/// `center` and `end` never start above `title.final_y + frame.gap`.
pub fn resolve_y(policy: VerticalPosition, panel_height: f32, title: &TextBlock, footer: &TextBlock, frame: &Frame) -> f32 {
    let min_y = title.final_y + frame.gap;
    match policy {
        VerticalPosition::Start => frame.padding,
        VerticalPosition::Center => {
            let available = frame.height - 2.0 * frame.padding;
            let text_height = title.height();
            let y = frame.padding + (available - panel_height - text_height - footer.height()) / 2.0 + text_height;
            y.max(min_y)
        }
        VerticalPosition::End => {
            let y = frame.height - panel_height - frame.padding - frame.gap - footer.height();
            y.max(min_y)
        }
    }
}

/// Natural width and height of the panel, measured on a scratch surface.
fn measure_panel<S: Surface>(surface: &S, request: &PanelRequest, settings: &FontSettings, frame: &Frame) -> Option<(f32, f32)> {
    let mut scratch = surface.scratch();
    let max_width = frame.width - 2.0 * frame.padding;
    match *request {
        PanelRequest::Code { code, language } => {
            layout_code(&scratch, code, language, max_width, frame.max_code_height, settings).map(|l| (l.width, l.height))
        }
        PanelRequest::Image(path) => {
            let height = render_image_panel(
                &mut scratch,
                path,
                frame.padding,
                0.0,
                max_width,
                image_box_height(settings, frame),
                settings.panel_padding,
                settings.panel_radius,
            );
            (height > 0.0).then_some((max_width, height))
        }
    }
}

fn image_box_height(settings: &FontSettings, frame: &Frame) -> f32 {
    frame.max_code_height + 2.0 * settings.panel_padding
}

/// Place and paint the panel. `None` when the panel could not be produced (unsupported
/// language, unreadable image); nothing is painted in that case.
///
/// Under the `start` policy the panel takes the top of the canvas and the title lines are
/// painted again below it.
#[allow(clippy::too_many_arguments)]
pub fn place_panel<S: Surface>(
    surface: &mut S,
    request: &PanelRequest,
    title: &TextBlock,
    footer: &TextBlock,
    settings: &FontSettings,
    vertical: VerticalPosition,
    horizontal: HorizontalAlign,
    frame: &Frame,
) -> Option<PanelGeometry> {
    let (width, natural_height) = measure_panel(surface, request, settings, frame)?;
    // At the bottom an image panel stands on its box, not on the padded reservation.
    let anchor_height = match (vertical, request) {
        (VerticalPosition::End, PanelRequest::Image(_)) => image_box_height(settings, frame),
        _ => natural_height,
    };
    let y = resolve_y(vertical, anchor_height, title, footer, frame);
    let x = align_x(horizontal, width, frame.padding, frame.width);
    debug!("Panel {width}x{natural_height} placed at ({x}, {y}) [{vertical:?}/{horizontal:?}]");

    let height = match *request {
        PanelRequest::Code { code, language } => {
            render_code_panel(surface, code, language, x, y, width, frame.max_code_height, settings)
        }
        PanelRequest::Image(path) => render_image_panel(
            surface,
            path,
            x,
            y,
            width,
            image_box_height(settings, frame),
            settings.panel_padding,
            settings.panel_radius,
        ),
    };
    if height <= 0.0 {
        warn!("Panel at ({x}, {y}) painted nothing");
        return None;
    }

    if vertical == VerticalPosition::Start && !title.lines.is_empty() {
        let font = FontSpec::new(&settings.font_family, settings.title_size);
        paint_lines(
            surface,
            &title.lines,
            &font,
            settings.title_color,
            settings.title_align,
            frame.padding,
            frame.width,
            y + height + frame.gap,
            title.line_height,
        );
    }

    Some(PanelGeometry { x, y, width, height })
}
