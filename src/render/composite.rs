use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use anyhow::Context;
use kurbo::PathEl;
use rayon::prelude::*;
use resvg::tiny_skia;

use crate::assets::decode::PreparedImage;
use crate::assets::photo::{PhotoLoader, PhotoSource};
use crate::compose::assign::PhotoAssignment;
use crate::foundation::core::{BezPath, Rect, Rgba8, ViewBox, demultiply_rgba8_in_place};
use crate::foundation::error::{CollageError, CollageResult};
use crate::template::Slot;

/// Largest surface edge we are willing to allocate, in pixels.
pub const MAX_SURFACE_DIM: u32 = 16_384;

/// Colors and stroke used for slot outlines and empty slots.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompositeStyle {
    pub background: Rgba8,
    pub placeholder_fill: Rgba8,
    pub stroke: Rgba8,
    /// In view box units.
    pub stroke_width: f64,
}

impl Default for CompositeStyle {
    fn default() -> Self {
        Self {
            background: Rgba8::WHITE,
            placeholder_fill: Rgba8::opaque(0xe5, 0xe7, 0xeb),
            stroke: Rgba8::opaque(0x9c, 0xa3, 0xaf),
            stroke_width: 2.0,
        }
    }
}

/// Rendered collage pixels before encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Vec<u8>,
}

impl RawImage {
    /// Straight-alpha RGBA8 of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let mut px = [
            self.rgba8_premul[i],
            self.rgba8_premul[i + 1],
            self.rgba8_premul[i + 2],
            self.rgba8_premul[i + 3],
        ];
        demultiply_rgba8_in_place(&mut px);
        Some(px)
    }
}

/// Where a photo lands for a cover fit: uniform scale plus the drawn rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverFit {
    pub scale: f64,
    pub dest: Rect,
}

/// Scale the image so its shorter side equals `max(bbox.w, bbox.h)` and center it on the box.
/// Whatever spills past the slot is clipped away by the caller.
pub fn cover_fit(bbox: Rect, img_width: u32, img_height: u32) -> CoverFit {
    let img_size = bbox.width().max(bbox.height());
    let shorter = f64::from(img_width.min(img_height)).max(1.0);
    let scale = img_size / shorter;
    let w = f64::from(img_width) * scale;
    let h = f64::from(img_height) * scale;
    let c = bbox.center();
    CoverFit {
        scale,
        dest: Rect::new(c.x - w / 2.0, c.y - h / 2.0, c.x + w / 2.0, c.y + h / 2.0),
    }
}

/// Load every distinct photo source once, in parallel. Results line up with `assignments`;
/// slots sharing a source (placeholders, mostly) share the decoded pixels.
#[tracing::instrument(level = "debug", skip_all, fields(slots = assignments.len()))]
pub fn load_photos(
    assignments: &[PhotoAssignment],
    loader: &dyn PhotoLoader,
) -> Vec<CollageResult<PreparedImage>> {
    let unique: HashSet<&PhotoSource> = assignments.iter().map(|a| &a.source).collect();
    tracing::debug!(sources = unique.len(), "loading photos");
    let loaded: HashMap<&PhotoSource, CollageResult<PreparedImage>> = unique
        .into_par_iter()
        .map(|source| (source, loader.load(source)))
        .collect();

    assignments
        .iter()
        .map(|a| match loaded.get(&a.source) {
            Some(Ok(img)) => Ok(img.clone()),
            Some(Err(CollageError::ImageLoad(msg))) => Err(CollageError::image_load(msg.clone())),
            Some(Err(e)) => Err(CollageError::image_load(e.to_string())),
            None => loader.load(&a.source),
        })
        .collect()
}

/// Draw slots and their photos onto a fresh white surface of `view_box * scale` pixels.
///
/// `photos[i]` belongs to `slots[i]`; a missing entry or an error leaves that slot showing its
/// placeholder fill. Only failing to get a surface aborts the whole composite.
#[tracing::instrument(level = "debug", skip(slots, photos, style), fields(slots = slots.len()))]
pub fn composite(
    slots: &[Slot],
    photos: &[CollageResult<PreparedImage>],
    view_box: ViewBox,
    scale: f64,
    style: &CompositeStyle,
) -> CollageResult<RawImage> {
    let (width, height) = surface_size(view_box, scale)?;
    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
        CollageError::canvas_context(format!("failed to allocate {width}x{height} surface"))
    })?;
    pixmap.fill(skia_color(style.background));

    let ts = tiny_skia::Transform::from_row(
        scale as f32,
        0.0,
        0.0,
        scale as f32,
        (-view_box.x * scale) as f32,
        (-view_box.y * scale) as f32,
    );
    let fill = solid_paint(style.placeholder_fill);
    let stroke_paint = solid_paint(style.stroke);
    let stroke = tiny_skia::Stroke {
        width: style.stroke_width as f32,
        ..Default::default()
    };

    for (i, slot) in slots.iter().enumerate() {
        let Some(path) = skia_path(&slot.path) else {
            tracing::warn!(slot = %slot.id, "slot has an empty outline, skipping");
            continue;
        };

        pixmap.fill_path(&path, &fill, tiny_skia::FillRule::Winding, ts, None);
        if style.stroke_width > 0.0 {
            pixmap.stroke_path(&path, &stroke_paint, &stroke, ts, None);
        }

        match photos.get(i) {
            Some(Ok(img)) => {
                if let Err(e) = draw_photo(&mut pixmap, &path, slot.bbox, img, ts) {
                    tracing::warn!(slot = %slot.id, error = %e, "photo could not be drawn");
                    continue;
                }
                if style.stroke_width > 0.0 {
                    pixmap.stroke_path(&path, &stroke_paint, &stroke, ts, None);
                }
            }
            Some(Err(e)) => {
                tracing::warn!(slot = %slot.id, error = %e, "photo unavailable, keeping placeholder");
            }
            None => {
                tracing::debug!(slot = %slot.id, "no photo for slot");
            }
        }
    }

    Ok(RawImage {
        width,
        height,
        rgba8_premul: pixmap.take(),
    })
}

/// Pixel size of the backing surface for `view_box` at `scale`.
pub fn surface_size(view_box: ViewBox, scale: f64) -> CollageResult<(u32, u32)> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(CollageError::canvas_context(format!(
            "invalid surface scale {scale}"
        )));
    }
    let to_px = |v: f64| -> CollageResult<u32> {
        let px = (v * scale).ceil();
        if !px.is_finite() || px < 1.0 || px > f64::from(MAX_SURFACE_DIM) {
            return Err(CollageError::canvas_context(format!(
                "surface edge {px} px is outside 1..={MAX_SURFACE_DIM}"
            )));
        }
        Ok(px as u32)
    };
    Ok((to_px(view_box.width)?, to_px(view_box.height)?))
}

fn draw_photo(
    pixmap: &mut tiny_skia::Pixmap,
    clip: &tiny_skia::Path,
    bbox: Rect,
    img: &PreparedImage,
    ts: tiny_skia::Transform,
) -> CollageResult<()> {
    let size = tiny_skia::IntSize::from_wh(img.width, img.height)
        .ok_or_else(|| CollageError::image_load("photo has zero size"))?;
    let photo = tiny_skia::Pixmap::from_vec((*img.rgba8_premul).clone(), size)
        .ok_or_else(|| CollageError::image_load("photo pixel buffer does not match its size"))?;
    let mut mask = tiny_skia::Mask::new(pixmap.width(), pixmap.height())
        .ok_or_else(|| CollageError::canvas_context("failed to allocate clip mask"))?;
    mask.fill_path(clip, tiny_skia::FillRule::Winding, true, ts);

    let fit = cover_fit(bbox, img.width, img.height);
    let place = tiny_skia::Transform::from_row(
        fit.scale as f32,
        0.0,
        0.0,
        fit.scale as f32,
        fit.dest.x0 as f32,
        fit.dest.y0 as f32,
    );
    let paint = tiny_skia::PixmapPaint {
        quality: tiny_skia::FilterQuality::Bicubic,
        ..Default::default()
    };
    pixmap.draw_pixmap(0, 0, photo.as_ref(), &paint, ts.pre_concat(place), Some(&mask));
    Ok(())
}

fn skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = tiny_skia::PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => pb.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32),
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

fn skia_color(c: Rgba8) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn solid_paint(c: Rgba8) -> tiny_skia::Paint<'static> {
    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(c.r, c.g, c.b, c.a);
    paint.anti_alias = true;
    paint
}

/// Encode composited pixels as PNG (straight alpha).
pub fn encode_png(img: &RawImage) -> CollageResult<Vec<u8>> {
    let mut straight = img.rgba8_premul.clone();
    demultiply_rgba8_in_place(&mut straight);
    let rgba = image::RgbaImage::from_raw(img.width, img.height, straight)
        .ok_or_else(|| CollageError::validation("raw image buffer does not match its size"))?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(rgba)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode collage png")?;
    Ok(buf)
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
