use crate::geom::Transform;
use crate::model::{GradientType, Rgba, Style};
use crate::render::gamma::GammaTable;
use crate::render::rasterizer::CellRasterizer;

/// A gamma-converted, premultiplied color ready for blending.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct PremulColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[inline]
pub(crate) fn mul255(a: u32, b: u32) -> u32 {
    (a * b + 127) / 255
}

fn premultiply(color: Rgba, gamma: &GammaTable) -> PremulColor {
    let a = color.a as u32;
    PremulColor {
        r: mul255(gamma.dir(color.r) as u32, a) as u8,
        g: mul255(gamma.dir(color.g) as u32, a) as u8,
        b: mul255(gamma.dir(color.b) as u32, a) as u8,
        a: color.a,
    }
}

/// Per-pixel color production for one gradient style.
pub(crate) struct GradientSource {
    kind: GradientType,
    /// Maps target pixels back into gradient space.
    inverse: Transform,
    table: Box<[PremulColor; 256]>,
}

impl GradientSource {
    /// The color of the pixel at (x, y) in target coordinates.
    #[inline]
    pub fn color_at(&self, x: f64, y: f64) -> PremulColor {
        let mut gx = x;
        let mut gy = y;
        self.inverse.transform(&mut gx, &mut gy);

        // The gradient functions parameterize the 64-unit design box.
        let t = match self.kind {
            GradientType::Linear => gx / 64.0,
            GradientType::Circular => (gx * gx + gy * gy).sqrt() / 64.0,
            GradientType::Diamond => gx.abs().max(gy.abs()) / 64.0,
            GradientType::Conic => gy.atan2(gx).abs() / std::f64::consts::PI,
            GradientType::Xy => (gx * gy).abs() / 64.0,
            GradientType::SqrtXy => (gx * gy).abs().sqrt() / 64.0,
        };
        let index = ((t * 256.0) as i64).clamp(0, 255) as usize;
        self.table[index]
    }
}

/// The color source of one registered style.
pub(crate) enum SpanSource {
    Solid(PremulColor),
    Gradient(GradientSource),
}

/// One registered style with its accumulated geometry.
pub(crate) struct StyleEntry {
    pub source: SpanSource,
    pub rasterizer: CellRasterizer,
}

/// Registers the styles of one render invocation, in shape order, and
/// owns their coverage accumulation until the pass is flushed.
pub(crate) struct StyleHandler {
    entries: Vec<StyleEntry>,
    first_pending: usize,
}

impl StyleHandler {
    pub fn new() -> Self {
        Self { entries: Vec::new(), first_pending: 0 }
    }

    /// Registers a style under the next style id and returns that id.
    ///
    /// For gradients, `transform` is the span transform (the composed
    /// shape transform, or just the global one when the gradient does not
    /// inherit transformations); the gradient's own matrix is prepended
    /// and the result inverted once here.
    pub fn add_style(&mut self, style: &Style, transform: &Transform, gamma: &GammaTable) -> usize {
        let source = match style.gradient() {
            None => SpanSource::Solid(premultiply(style.color(), gamma)),
            Some(gradient) => {
                let mut colors = [Rgba::TRANSPARENT; 256];
                gradient.make_color_table(&mut colors);
                let mut table = Box::new([PremulColor::default(); 256]);
                for (slot, color) in table.iter_mut().zip(colors.iter()) {
                    *slot = premultiply(*color, gamma);
                }

                let mut span_transform = gradient.transform().multiplied(transform);
                if span_transform.is_valid() {
                    span_transform.invert();
                } else {
                    span_transform.reset();
                }

                SpanSource::Gradient(GradientSource {
                    kind: gradient.gradient_type(),
                    inverse: span_transform,
                    table,
                })
            }
        };

        self.entries.push(StyleEntry { source, rasterizer: CellRasterizer::new() });
        self.entries.len() - 1
    }

    pub fn rasterizer_mut(&mut self, index: usize) -> &mut CellRasterizer {
        &mut self.entries[index].rasterizer
    }

    /// Whether any style registered since the last flush has geometry.
    pub fn has_pending_geometry(&self) -> bool {
        self.entries[self.first_pending..]
            .iter()
            .any(|e| !e.rasterizer.is_empty())
    }

    /// Whether any style has been registered since the last flush.
    pub fn has_pending(&self) -> bool {
        self.first_pending < self.entries.len()
    }

    pub fn pending_entries_mut(&mut self) -> &mut [StyleEntry] {
        &mut self.entries[self.first_pending..]
    }

    pub fn mark_flushed(&mut self) {
        self.first_pending = self.entries.len();
    }
}
