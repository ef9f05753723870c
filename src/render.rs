//! The compound icon renderer.
//!
//! Shapes render back-to-front in icon order. Each shape's paths are
//! flattened, run through the shape's transformer pipeline and the
//! composed shape-and-global transform, then accumulated under a unique
//! style id. Consecutive opaque shapes share one compound pass; a
//! semi-transparent style forces the pass to flush first, which keeps
//! painter-order compositing exact. Blending happens in a gamma-linear
//! space when a gamma other than 1.0 is configured.

pub mod bitmap;
pub mod gamma;
mod rasterizer;
mod style_handler;

pub use bitmap::Bitmap;
pub use gamma::GammaTable;

use log::warn;

use crate::geom::{flatten_events, Transform};
use crate::model::{Icon, Rgba};
use crate::render::rasterizer::sweep;
use crate::render::style_handler::{mul255, PremulColor, SpanSource, StyleHandler};

/// What the target is filled with before the icon is drawn.
#[derive(Clone, Debug)]
pub enum Background {
    /// A uniform fill; use a zero-alpha color for a transparent canvas.
    Color(Rgba),
    /// An existing bitmap, copied in first. Must match the target size.
    Bitmap(Bitmap),
}

impl Default for Background {
    fn default() -> Self {
        Background::Color(Rgba::TRANSPARENT)
    }
}

/// Options of one [`render`] invocation.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Global scale on top of the shapes' own transforms; a 64-pixel
    /// target at scale 1.0 shows the whole design box.
    pub scale: f64,
    pub background: Background,
    /// Blending gamma. 1.0 disables the gamma post-pass.
    pub gamma: f64,
    /// Overrides every shape's hinting flag when set.
    pub hinting_override: Option<bool>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            background: Background::default(),
            gamma: 2.2,
            hinting_override: None,
        }
    }
}

/// Renders `icon` into `bitmap` with the given options.
///
/// Rendering itself cannot fail: shapes with missing styles or degenerate
/// geometry are skipped.
pub fn render(icon: &Icon, bitmap: &mut Bitmap, options: &RenderOptions) {
    let mut renderer = IconRenderer::new(icon);
    renderer.set_scale(options.scale);
    renderer.set_gamma(options.gamma);
    renderer.set_background(options.background.clone());
    renderer.set_hinting_override(options.hinting_override);
    renderer.render(bitmap);
}

/// The reusable renderer behind [`render`].
pub struct IconRenderer<'a> {
    icon: &'a Icon,
    global_transform: Transform,
    gamma: GammaTable,
    background: Background,
    hinting_override: Option<bool>,
    passes: u32,
}

impl<'a> IconRenderer<'a> {
    pub fn new(icon: &'a Icon) -> Self {
        Self {
            icon,
            global_transform: Transform::identity(),
            gamma: GammaTable::new(2.2),
            background: Background::default(),
            hinting_override: None,
            passes: 0,
        }
    }

    /// Sets the uniform global scale (target size / 64 for a full-box
    /// view).
    pub fn set_scale(&mut self, scale: f64) {
        self.global_transform = Transform::scaling(scale, scale);
    }

    pub fn set_gamma(&mut self, gamma: f64) {
        if self.gamma.gamma() != gamma {
            self.gamma = GammaTable::new(gamma);
        }
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    pub fn set_hinting_override(&mut self, hinting_override: Option<bool>) {
        self.hinting_override = hinting_override;
    }

    /// The number of compound passes the last `render` call flushed.
    pub fn pass_count(&self) -> u32 {
        self.passes
    }

    pub fn render(&mut self, bitmap: &mut Bitmap) {
        self.prepare_background(bitmap);
        self.passes = 0;

        let mut handler = StyleHandler::new();
        let global_scale = self.global_transform.scale();

        for shape_handle in self.icon.shapes().borrow().iter() {
            let shape = shape_handle.borrow();

            // Level-of-detail culling.
            if !shape.is_visible_at(global_scale) {
                continue;
            }

            let Some(style_handle) = shape.style() else {
                warn!("skipping shape without style");
                continue;
            };
            let style = style_handle.borrow();

            // A semi-transparent style must not blend with shapes that
            // come later in the list; flush everything accumulated so
            // far as one compound pass.
            if style.has_transparency() && handler.has_pending_geometry() {
                if flush_pass(&mut handler, bitmap) {
                    self.passes += 1;
                }
            }

            let mut transform = *shape.transform();
            transform.multiply(&self.global_transform);

            let span_transform = match style.gradient() {
                Some(gradient) if !gradient.inherit_transformation() => self.global_transform,
                _ => transform,
            };
            let style_id = handler.add_style(&style, &span_transform, &self.gamma);

            // Flatten, pipe through the transformer pipeline, then apply
            // the composed transform.
            let approximation_scale = transform.scale().max(1.0);
            let mut events = Vec::new();
            for path in shape.paths().borrow().iter() {
                events.extend(path.borrow().events());
            }
            let mut sub_paths = flatten_events(&events, approximation_scale);
            for transformer in shape.transformers() {
                sub_paths = transformer.apply(sub_paths, approximation_scale);
            }

            let hinting = self.hinting_override.unwrap_or(shape.hinting());
            let rasterizer = handler.rasterizer_mut(style_id);
            for sub in &sub_paths {
                if sub.points.len() < 2 {
                    continue;
                }
                let points: Vec<(f64, f64)> = sub
                    .points
                    .iter()
                    .map(|p| {
                        let q = transform.transform_point(p);
                        if hinting {
                            ((q.x + 0.5).floor(), (q.y + 0.5).floor())
                        } else {
                            (q.x, q.y)
                        }
                    })
                    .collect();
                rasterizer.add_polygon(&points);
            }
        }

        if flush_pass(&mut handler, bitmap) {
            self.passes += 1;
        }

        if self.gamma.gamma() != 1.0 {
            apply_inverse_gamma(bitmap, &self.gamma);
        }
    }

    fn prepare_background(&self, bitmap: &mut Bitmap) {
        match &self.background {
            Background::Bitmap(source) => {
                if !bitmap.copy_from(source) {
                    warn!("background bitmap size mismatch, clearing instead");
                    bitmap.clear([0, 0, 0, 0]);
                }
            }
            Background::Color(color) => {
                let premul = PremulColor {
                    r: mul255(self.gamma.dir(color.r) as u32, color.a as u32) as u8,
                    g: mul255(self.gamma.dir(color.g) as u32, color.a as u32) as u8,
                    b: mul255(self.gamma.dir(color.b) as u32, color.a as u32) as u8,
                    a: color.a,
                };
                bitmap.clear([premul.b, premul.g, premul.r, premul.a]);
            }
        }
    }
}

/// Rasterizes every style registered since the last flush, blending spans
/// over the bitmap in style registration order. Returns whether anything
/// was flushed.
fn flush_pass(handler: &mut StyleHandler, bitmap: &mut Bitmap) -> bool {
    if !handler.has_pending() {
        return false;
    }
    let width = bitmap.width() as i32;
    let height = bitmap.height() as i32;

    for entry in handler.pending_entries_mut() {
        let source = &entry.source;
        let cells = entry.rasterizer.sorted_cells();
        sweep(cells, |y, x, len, cover| {
            if y < 0 || y >= height {
                return;
            }
            let start = x.max(0);
            let end = (x + len).min(width);
            if start >= end {
                return;
            }
            let row = bitmap.row_mut(y as u32);
            match source {
                SpanSource::Solid(color) => {
                    for px in start..end {
                        blend_pixel(&mut row[px as usize * 4..px as usize * 4 + 4], color, cover);
                    }
                }
                SpanSource::Gradient(gradient) => {
                    for px in start..end {
                        let color = gradient.color_at(px as f64, y as f64);
                        blend_pixel(&mut row[px as usize * 4..px as usize * 4 + 4], &color, cover);
                    }
                }
            }
        });
    }

    handler.mark_flushed();
    true
}

/// Blends one premultiplied color over a BGRA pixel with the given
/// coverage.
#[inline]
fn blend_pixel(pixel: &mut [u8], color: &PremulColor, cover: u8) {
    let cover = cover as u32;
    if cover == 0 {
        return;
    }
    let alpha = mul255(color.a as u32, cover);
    let b = mul255(color.b as u32, cover);
    let g = mul255(color.g as u32, cover);
    let r = mul255(color.r as u32, cover);

    let blend = |dst: u8, src: u32| -> u8 {
        (dst as i32 + src as i32 - mul255(dst as u32, alpha) as i32).clamp(0, 255) as u8
    };
    pixel[0] = blend(pixel[0], b);
    pixel[1] = blend(pixel[1], g);
    pixel[2] = blend(pixel[2], r);
    pixel[3] = blend(pixel[3], alpha);
}

/// Applies the inverse gamma table to the color channels of the finished
/// bitmap.
fn apply_inverse_gamma(bitmap: &mut Bitmap, gamma: &GammaTable) {
    for pixel in bitmap.pixels_mut().chunks_exact_mut(4) {
        pixel[0] = gamma.inv(pixel[0]);
        pixel[1] = gamma.inv(pixel[1]);
        pixel[2] = gamma.inv(pixel[2]);
    }
}
