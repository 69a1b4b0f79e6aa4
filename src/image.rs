//! Raster images: PNG/SVG loading and PNG encoding.

use std::io::Cursor;
use std::path::Path;

use log::debug;
use tiny_skia::{IntSize, Pixmap};

use crate::error::RenderError;

/// Decoded image, premultiplied RGBA.
#[derive(Clone)]
pub struct RasterImage {
    pixmap: Pixmap,
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RasterImage({}x{})", self.width(), self.height())
    }
}

impl RasterImage {
    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        RasterImage { pixmap }
    }

    /// Build from straight (non-premultiplied) RGBA bytes.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Option<Self> {
        if rgba.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        let mut data = Vec::with_capacity(rgba.len());
        for px in rgba.chunks_exact(4) {
            let a = px[3] as u16;
            data.push(((px[0] as u16 * a + 127) / 255) as u8);
            data.push(((px[1] as u16 * a + 127) / 255) as u8);
            data.push(((px[2] as u16 * a + 127) / 255) as u8);
            data.push(px[3]);
        }
        let size = IntSize::from_wh(width, height)?;
        Pixmap::from_vec(data, size).map(RasterImage::from_pixmap)
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Load a PNG or SVG file. Absence is reported before any read is attempted.
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        if !path.exists() {
            return Err(RenderError::ResourceNotFound(path.to_path_buf()));
        }
        let data = std::fs::read(path).map_err(|e| RenderError::io(path, e))?;
        let is_svg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
        let image = if is_svg { decode_svg(&data, path)? } else { decode_png(&data, path)? };
        debug!("Loaded {} ({}x{})", path.display(), image.width(), image.height());
        Ok(image)
    }

    /// Encode as an 8-bit RGBA PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        encode_pixmap_png(&self.pixmap)
    }
}

pub(crate) fn encode_pixmap_png(pixmap: &Pixmap) -> Result<Vec<u8>, RenderError> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(Cursor::new(&mut buf), pixmap.width(), pixmap.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().map_err(|e| RenderError::Encode(e.to_string()))?;
        writer.write_image_data(&rgba).map_err(|e| RenderError::Encode(e.to_string()))?;
    }
    Ok(buf)
}

fn decode_png(bytes: &[u8], path: &Path) -> Result<RasterImage, RenderError> {
    let fail = |reason: String| RenderError::Decode { path: path.to_path_buf(), reason };

    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(|e| fail(e.to_string()))?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(|e| fail(e.to_string()))?;
    buf.truncate(info.buffer_size());

    let rgba: Vec<u8> = match info.color_type {
        png::ColorType::Rgba => buf,
        png::ColorType::Rgb => buf.chunks_exact(3).flat_map(|p| [p[0], p[1], p[2], 255]).collect(),
        png::ColorType::GrayscaleAlpha => buf.chunks_exact(2).flat_map(|p| [p[0], p[0], p[0], p[1]]).collect(),
        png::ColorType::Grayscale => buf.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        other => return Err(fail(format!("unsupported color type {other:?}"))),
    };

    RasterImage::from_rgba(info.width, info.height, &rgba)
        .ok_or_else(|| fail(format!("bad dimensions {}x{}", info.width, info.height)))
}

/// Rasterize at the SVG's intrinsic size.
fn decode_svg(bytes: &[u8], path: &Path) -> Result<RasterImage, RenderError> {
    let fail = |reason: String| RenderError::Decode { path: path.to_path_buf(), reason };

    let opts = resvg::usvg::Options::default();
    let tree = resvg::usvg::Tree::from_data(bytes, &opts).map_err(|e| fail(e.to_string()))?;
    let size = tree.size();
    let width = size.width().ceil() as u32;
    let height = size.height().ceil() as u32;
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| fail(format!("bad dimensions {width}x{height}")))?;
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
    Ok(RasterImage::from_pixmap(pixmap))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::{Path, PathBuf};

    /// Write a solid-color RGB PNG and return its path.
    pub fn write_png(dir: &Path, name: &str, width: u32, height: u32, rgb: [u8; 3]) -> PathBuf {
        let path = dir.join(name);
        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        let data: Vec<u8> = (0..width * height).flat_map(|_| rgb).collect();
        writer.write_image_data(&data).unwrap();
        path
    }
}
