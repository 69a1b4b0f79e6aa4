//! Local preview tool: renders a demo task under every placement combination + atlas.
//!
//! Usage: cargo run --bin preview [-- --config PATH]
//!
//! Outputs:
//!   preview-output/<vertical>-<horizontal>.png  nine code-panel placements
//!   preview-output/image-panel.png             image panel variant
//!   preview-output/atlas.png                   single tiled overview

use std::path::{Path, PathBuf};
use std::process;

use log::{error, warn};
use tiny_skia::{Pixmap, PixmapPaint, Transform};

use taskcard::compose::{compose_task, load_background, IMAGE_HEIGHT, IMAGE_WIDTH};
use taskcard::config::{HorizontalAlign, RunConfig, TaskNumber, TaskSpec, VerticalPosition};
use taskcard::error::RenderError;
use taskcard::image::RasterImage;
use taskcard::placement::Frame;
use taskcard::raster::PixmapSurface;
use taskcard::theme::FontBook;

/// Used when no config is found; fonts are then picked from well-known system locations.
const DEMO_CONFIG: &str = r##"
[font_settings]
font_family = "sans"
code_font_family = "mono"
title_color = "#1b1b1f"
title_align = "center"
footer_align = "right"

[font_settings.highlight]
comment = "#6a9955"
string = "#ce9178"
keyword = "#569cd6"
function = "#dcdcaa"
operator = "#d4d4d4"

[group_element]
type = "text"
content = "#taskcard"
font_size = 12
font_color = "#888888"
margin_right = 12
margin_bottom = 10
"##;

const DEMO_CODE: &str = "// sum of two numbers\nfunction sum(a, b) {\n  return a + b;\n}\n\nconsole.log(`total: ${sum(2, 3)}`);";

const SYSTEM_FONTS: &[(&str, &[&str])] = &[
    (
        "sans",
        &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
        ],
    ),
    (
        "mono",
        &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
            "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
            "/System/Library/Fonts/Supplemental/Courier New.ttf",
            "C:\\Windows\\Fonts\\consola.ttf",
        ],
    ),
];

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let explicit = std::env::args()
        .skip_while(|a| a != "--config")
        .nth(1)
        .map(PathBuf::from);

    let mut config = match RunConfig::find(explicit) {
        Some(path) => {
            println!("config: {}", path.display());
            RunConfig::load(&path).unwrap_or_else(|e| {
                error!("{e}");
                process::exit(1);
            })
        }
        None => demo_config(),
    };
    let fonts = FontBook::load(&config.fonts);
    if fonts.is_empty() {
        warn!("No fonts found; previews will have no text");
    }
    let background = load_background(config.background_image.as_deref());

    let out = PathBuf::from("preview-output");
    if let Err(e) = std::fs::create_dir_all(&out) {
        error!("Cannot create {}: {e}", out.display());
        process::exit(1);
    }

    let mut frames: Vec<(String, Pixmap)> = Vec::new();

    // ── Code panel placements ───────────────────────────────
    let task = TaskSpec {
        title: Some("Write a function that returns the sum of two numbers".into()),
        number: Some(TaskNumber::Int(1)),
        code: Some(DEMO_CODE.into()),
        language: Some("javascript".into()),
        bottom_title: Some("Difficulty: easy".into()),
        ..TaskSpec::default()
    };
    for vertical in [VerticalPosition::Start, VerticalPosition::Center, VerticalPosition::End] {
        for horizontal in [HorizontalAlign::Start, HorizontalAlign::Center, HorizontalAlign::Right] {
            config.code_block_position = vertical;
            config.code_block_horizontal_position = horizontal;
            let label = format!("{vertical:?}-{horizontal:?}").to_lowercase();
            if let Some(pixmap) = render(&task, &config, &fonts, background.as_ref(), &out, &label) {
                frames.push((label, pixmap));
            }
        }
    }
    println!("rendered {} placement frames", frames.len());

    // ── Image panel ─────────────────────────────────────────
    let gradient_path = out.join("gradient-source.png");
    match generate_gradient(320, 180) {
        Some(gradient) if save(&gradient_path, gradient.encode_png()) => {
            let task = TaskSpec {
                title: Some("What does this diagram show?".into()),
                number: Some(TaskNumber::Int(2)),
                image: Some(gradient_path),
                ..TaskSpec::default()
            };
            config.code_block_position = VerticalPosition::Center;
            if let Some(pixmap) = render(&task, &config, &fonts, background.as_ref(), &out, "image-panel") {
                frames.push(("image-panel".into(), pixmap));
            }
        }
        Some(_) => {}
        None => warn!("Cannot build gradient"),
    }

    // ── Build atlas ─────────────────────────────────────────
    let Some(atlas) = build_atlas(&frames) else {
        error!("Cannot allocate atlas");
        process::exit(1);
    };
    let atlas_path = out.join("atlas.png");
    if save(&atlas_path, RasterImage::from_pixmap(atlas).encode_png()) {
        println!("\natlas: {} ({} frames)", atlas_path.display(), frames.len());
    }
    println!("individual frames in {}/", out.display());

    #[cfg(target_os = "macos")]
    {
        let _ = std::process::Command::new("open").arg(&atlas_path).spawn();
    }
}

fn demo_config() -> RunConfig {
    let mut config = match RunConfig::parse(DEMO_CONFIG, Path::new("demo.toml")) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };
    for (family, candidates) in SYSTEM_FONTS {
        if let Some(path) = candidates.iter().map(PathBuf::from).find(|p| p.exists()) {
            config.fonts.insert(family.to_string(), path);
        }
    }
    config
}

fn render(
    task: &TaskSpec,
    config: &RunConfig,
    fonts: &FontBook,
    background: Option<&RasterImage>,
    out: &Path,
    label: &str,
) -> Option<Pixmap> {
    let mut surface = match PixmapSurface::new(IMAGE_WIDTH, IMAGE_HEIGHT, fonts) {
        Ok(surface) => surface,
        Err(e) => {
            error!("{label}: {e}");
            return None;
        }
    };
    if let Err(e) = compose_task(&mut surface, task, config, background, &Frame::default()) {
        error!("{label}: {e}");
        return None;
    }
    save(&out.join(format!("{label}.png")), surface.encode_png());
    Some(surface.pixmap().clone())
}

fn save(path: &Path, encoded: Result<Vec<u8>, RenderError>) -> bool {
    let result = encoded
        .map_err(|e| e.to_string())
        .and_then(|bytes| std::fs::write(path, bytes).map_err(|e| e.to_string()));
    if let Err(e) = &result {
        warn!("Cannot write {}: {e}", path.display());
    }
    result.is_ok()
}

/// Three columns of half-size thumbnails on a dark backdrop.
fn build_atlas(frames: &[(String, Pixmap)]) -> Option<Pixmap> {
    let cols = 3_u32;
    let thumb_w = IMAGE_WIDTH / 2;
    let thumb_h = IMAGE_HEIGHT / 2;
    let pad = 8_u32;
    let rows = (frames.len() as u32).div_ceil(cols).max(1);

    let mut atlas = Pixmap::new(cols * (thumb_w + pad) + pad, rows * (thumb_h + pad) + pad)?;
    atlas.fill(tiny_skia::Color::from_rgba8(30, 30, 46, 255));

    for (idx, (_label, frame)) in frames.iter().enumerate() {
        let col = idx as u32 % cols;
        let row = idx as u32 / cols;
        let ox = (pad + col * (thumb_w + pad)) as f32;
        let oy = (pad + row * (thumb_h + pad)) as f32;
        let transform = Transform::from_row(0.5, 0.0, 0.0, 0.5, ox, oy);
        atlas.draw_pixmap(0, 0, frame.as_ref(), &PixmapPaint::default(), transform, None);
    }
    Some(atlas)
}

/// Horizontal warm-to-cool gradient standing in for a task illustration.
fn generate_gradient(w: u32, h: u32) -> Option<RasterImage> {
    let mut rgba = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            let tx = x as f32 / w as f32;
            let ty = y as f32 / h as f32;
            rgba.extend_from_slice(&[
                (255.0 * (1.0 - tx * 0.7)) as u8,
                (120.0 + 80.0 * ty) as u8,
                (60.0 + 180.0 * tx) as u8,
                255,
            ]);
        }
    }
    RasterImage::from_rgba(w, h, &rgba)
}
