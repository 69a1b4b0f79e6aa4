//! End-to-end renders on the tiny-skia surface. No fonts are registered, so text paints
//! nothing and only backgrounds and panels show up in the pixels.

use std::path::{Path, PathBuf};

use taskcard::compose::{compose_task, load_background, render_task_png, IMAGE_HEIGHT, IMAGE_WIDTH};
use taskcard::config::{HorizontalAlign, RunConfig, TaskNumber, TaskSpec, VerticalPosition};
use taskcard::error::RenderError;
use taskcard::image::RasterImage;
use taskcard::placement::Frame;
use taskcard::raster::PixmapSurface;
use taskcard::theme::FontBook;

fn config(vertical: &str, horizontal: &str) -> RunConfig {
    let toml = format!("code_block_position = \"{vertical}\"\ncode_block_horizontal_position = \"{horizontal}\"\n");
    RunConfig::parse(&toml, Path::new("scenario.toml")).unwrap()
}

fn task(title: &str) -> TaskSpec {
    TaskSpec { title: Some(title.into()), number: Some(TaskNumber::Int(1)), ..TaskSpec::default() }
}

fn rgb(surface: &PixmapSurface, x: u32, y: u32) -> (u8, u8, u8) {
    let px = surface.pixmap().pixel(x, y).unwrap().demultiply();
    (px.red(), px.green(), px.blue())
}

fn write_solid_png(dir: &Path, w: u32, h: u32, color: [u8; 3]) -> PathBuf {
    let rgba: Vec<u8> = (0..w * h).flat_map(|_| [color[0], color[1], color[2], 255]).collect();
    let path = dir.join("panel.png");
    std::fs::write(&path, RasterImage::from_rgba(w, h, &rgba).unwrap().encode_png().unwrap()).unwrap();
    path
}

#[test]
fn missing_background_falls_back_to_white() {
    let fonts = FontBook::new();
    let background = load_background(Some(Path::new("/nonexistent/background.png")));
    assert!(background.is_none());

    let mut surface = PixmapSurface::new(IMAGE_WIDTH, IMAGE_HEIGHT, &fonts).unwrap();
    let result = compose_task(&mut surface, &task("Hello World"), &config("center", "start"), background.as_ref(), &Frame::default());
    assert!(result.is_ok());
    for (x, y) in [(0, 0), (300, 200), (599, 399)] {
        assert_eq!(rgb(&surface, x, y), (255, 255, 255));
    }
}

#[test]
fn background_image_is_stretched_over_canvas() {
    let fonts = FontBook::new();
    let background = RasterImage::from_rgba(1, 1, &[10, 20, 30, 255]).unwrap();
    let mut surface = PixmapSurface::new(IMAGE_WIDTH, IMAGE_HEIGHT, &fonts).unwrap();
    compose_task(&mut surface, &task("Bg"), &config("start", "start"), Some(&background), &Frame::default()).unwrap();
    assert_eq!(rgb(&surface, 5, 395), (10, 20, 30));
}

#[test]
fn unsupported_language_leaves_no_panel_pixels() {
    let fonts = FontBook::new();
    let mut t = task("Loop");
    t.code = Some("+[-->+<]".into());
    t.language = Some("brainfuck".into());
    let mut surface = PixmapSurface::new(IMAGE_WIDTH, IMAGE_HEIGHT, &fonts).unwrap();
    let composition = compose_task(&mut surface, &t, &config("start", "center"), None, &Frame::default()).unwrap();
    assert_eq!(composition.panel, None);
    assert!(surface.pixmap().pixels().iter().all(|p| (p.red(), p.green(), p.blue()) == (255, 255, 255)));
}

#[test]
fn code_panel_background_is_painted_at_top() {
    let fonts = FontBook::new();
    let mut t = task("Sum");
    t.code = Some("const x = 1;".into());
    t.language = Some("javascript".into());
    let cfg = config("start", "center");
    let mut surface = PixmapSurface::new(IMAGE_WIDTH, IMAGE_HEIGHT, &fonts).unwrap();
    let composition = compose_task(&mut surface, &t, &cfg, None, &Frame::default()).unwrap();

    let panel = composition.panel.unwrap();
    assert_eq!(panel.y, 10.0);
    assert!(panel.height > 0.0);
    let inside = ((panel.x + panel.width / 2.0) as u32, (panel.y + panel.height / 2.0) as u32);
    let bg = cfg.font_settings.code_background;
    assert_eq!(rgb(&surface, inside.0, inside.1), (bg.r, bg.g, bg.b));
}

#[test]
fn image_panel_is_centered_below_title_gap() {
    let dir = tempfile::tempdir().unwrap();
    let fonts = FontBook::new();
    let mut t = task("Diagram");
    t.image = Some(write_solid_png(dir.path(), 100, 50, [200, 0, 0]));
    let mut surface = PixmapSurface::new(IMAGE_WIDTH, IMAGE_HEIGHT, &fonts).unwrap();
    let composition = compose_task(&mut surface, &t, &config("center", "start"), None, &Frame::default()).unwrap();

    let panel = composition.panel.unwrap();
    // without fonts the title block is empty and ends at the top margin
    assert_eq!(panel.y, 40.0 + 20.0);
    assert_eq!(panel.height, 340.0);
    // image centered in the 580x320 box, offset by the panel padding
    assert_eq!(rgb(&surface, 310, 230), (200, 0, 0));
    assert_eq!(rgb(&surface, 250, 230), (255, 255, 255));
}

#[test]
fn rendered_png_has_fixed_size() {
    let fonts = FontBook::new();
    let dir = tempfile::tempdir().unwrap();
    let mut t = task("Encode");
    t.code = Some("fn main() {}".into());
    t.language = Some("rust".into());
    t.bottom_title = Some("footer".into());

    let bytes = render_task_png(&t, &config("end", "right"), &fonts, None).unwrap();
    let path = dir.path().join("task_1.png");
    std::fs::write(&path, bytes).unwrap();
    let image = RasterImage::load(&path).unwrap();
    assert_eq!((image.width(), image.height()), (600, 400));
}

#[test]
fn task_without_number_is_rejected() {
    let fonts = FontBook::new();
    let t = TaskSpec { title: Some("Orphan".into()), ..TaskSpec::default() };
    let err = render_task_png(&t, &config("start", "start"), &fonts, None).unwrap_err();
    assert!(matches!(err, RenderError::Configuration(_)));
}

#[test]
fn every_placement_combination_renders() {
    let fonts = FontBook::new();
    for vertical in ["start", "center", "end"] {
        for horizontal in ["start", "center", "right"] {
            let cfg = config(vertical, horizontal);
            assert!(matches!(cfg.code_block_position, VerticalPosition::Start | VerticalPosition::Center | VerticalPosition::End));
            assert!(matches!(cfg.code_block_horizontal_position, HorizontalAlign::Start | HorizontalAlign::Center | HorizontalAlign::Right));
            let mut t = task("Combo");
            t.code = Some("x = 1\nprint(x)".into());
            t.language = Some("python".into());
            let mut surface = PixmapSurface::new(IMAGE_WIDTH, IMAGE_HEIGHT, &fonts).unwrap();
            let composition = compose_task(&mut surface, &t, &cfg, None, &Frame::default()).unwrap();
            let panel = composition.panel.unwrap();
            assert!(panel.x >= 10.0 && panel.x + panel.width <= 590.0, "{vertical}/{horizontal}: {panel:?}");
            if vertical != "start" {
                assert!(panel.y >= composition.title.final_y + 20.0);
            }
        }
    }
}
