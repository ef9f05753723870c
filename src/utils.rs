//! Bitmap utilities around the renderer: legacy 8-bit palette
//! conversion, the integer-ratio pixel-art scalers, and the entry points
//! for icons stored in filesystem attributes.

use ahash::AHashMap;

use crate::error::ViconError;
use crate::format::decode;
use crate::model::Rgba;
use crate::render::{render, Bitmap, RenderOptions};

/// The filesystem attribute holding a node's vector icon.
pub const VECTOR_ATTRIBUTE_NODE_NAME: &str = "BEOS:ICON";
/// The attribute holding a MIME type's vector icon.
pub const VECTOR_ATTRIBUTE_MIME_NAME: &str = "META:ICON";
/// The type tag of vector icon attributes ('VICN').
pub const VECTOR_ATTRIBUTE_TYPE: u32 = 0x5649_434E;
/// Attributes larger than this are rejected as implausible.
pub const MAX_ATTRIBUTE_SIZE: usize = 512 * 1024;

/// The palette index decoding to fully transparent.
pub const TRANSPARENT_INDEX: u8 = 255;

/// Decodes an icon read from a filesystem attribute and renders it at the
/// bitmap's native size.
pub fn render_icon_attribute(data: &[u8], bitmap: &mut Bitmap) -> Result<(), ViconError> {
    if data.is_empty() {
        return Err(ViconError::InvalidArgument("empty attribute".to_string()));
    }
    if data.len() > MAX_ATTRIBUTE_SIZE {
        return Err(ViconError::InvalidArgument(format!(
            "attribute of {} bytes exceeds the {} byte limit",
            data.len(),
            MAX_ATTRIBUTE_SIZE
        )));
    }
    let icon = decode(data)?;
    let options = RenderOptions {
        scale: bitmap.width() as f64 / 64.0,
        ..RenderOptions::default()
    };
    render(&icon, bitmap, &options);
    Ok(())
}

/// A 256-entry color palette for legacy indexed bitmaps.
///
/// Index 255 is the transparent magic. The default palette is a 6x6x6
/// color cube followed by a gray ramp; callers talking to a host system
/// with its own palette can supply that instead.
#[derive(Clone)]
pub struct Palette {
    colors: [Rgba; 256],
}

impl Default for Palette {
    fn default() -> Self {
        let mut colors = [Rgba::TRANSPARENT; 256];
        let levels = [0u8, 51, 102, 153, 204, 255];
        let mut index = 0;
        for r in levels {
            for g in levels {
                for b in levels {
                    colors[index] = Rgba::new(r, g, b, 255);
                    index += 1;
                }
            }
        }
        // 216..=254: gray ramp between the cube's gray diagonal entries.
        for (i, slot) in colors[216..255].iter_mut().enumerate() {
            let value = ((i + 1) * 255 / 40) as u8;
            *slot = Rgba::gray(value, 255);
        }
        colors[TRANSPARENT_INDEX as usize] = Rgba::TRANSPARENT;
        Self { colors }
    }
}

impl Palette {
    pub fn new(colors: [Rgba; 256]) -> Self {
        Self { colors }
    }

    pub fn color(&self, index: u8) -> Rgba {
        if index == TRANSPARENT_INDEX {
            Rgba::TRANSPARENT
        } else {
            self.colors[index as usize]
        }
    }

    /// The palette index closest to `color` (ignoring alpha).
    fn nearest(&self, color: Rgba) -> u8 {
        let mut best = 0u8;
        let mut best_distance = u32::MAX;
        for (i, candidate) in self.colors.iter().enumerate() {
            if i == TRANSPARENT_INDEX as usize {
                continue;
            }
            let dr = color.r as i32 - candidate.r as i32;
            let dg = color.g as i32 - candidate.g as i32;
            let db = color.b as i32 - candidate.b as i32;
            let distance = (dr * dr + dg * dg + db * db) as u32;
            if distance < best_distance {
                best_distance = distance;
                best = i as u8;
            }
        }
        best
    }
}

/// Expands an indexed 8-bit bitmap into `dst`, scaling as needed.
///
/// Exact 2x, 3x and 4x ratios use the AdvanceMAME Scale2x family;
/// everything else falls back to bilinear filtering (also used for
/// downscaling).
pub fn convert_cmap8_to_rgba(
    src: &[u8],
    width: u32,
    height: u32,
    src_bytes_per_row: usize,
    dst: &mut Bitmap,
    palette: &Palette,
) -> Result<(), ViconError> {
    if width == 0 || height == 0 || src_bytes_per_row < width as usize {
        return Err(ViconError::InvalidArgument("invalid source dimensions".to_string()));
    }
    if src.len() < (height as usize - 1) * src_bytes_per_row + width as usize {
        return Err(ViconError::InvalidArgument("source buffer too small".to_string()));
    }

    // Convert at native size first.
    let mut native = Bitmap::new(width, height)?;
    for y in 0..height {
        let row = &src[y as usize * src_bytes_per_row..];
        let dst_row = native.row_mut(y);
        for x in 0..width as usize {
            let color = palette.color(row[x]);
            let alpha = if row[x] == TRANSPARENT_INDEX { 0 } else { color.a };
            dst_row[x * 4] = color.b;
            dst_row[x * 4 + 1] = color.g;
            dst_row[x * 4 + 2] = color.r;
            dst_row[x * 4 + 3] = alpha;
        }
    }

    let (dw, dh) = (dst.width(), dst.height());
    if (dw, dh) == (width, height) {
        dst.copy_from(&native);
    } else if dw == width * 2 && dh == height * 2 {
        scale2x(&native, dst);
    } else if dw == width * 3 && dh == height * 3 {
        scale3x(&native, dst);
    } else if dw == width * 4 && dh == height * 4 {
        let mut doubled = Bitmap::new(width * 2, height * 2)?;
        scale2x(&native, &mut doubled);
        scale2x(&doubled, dst);
    } else {
        scale_bilinear(&native, dst);
    }
    Ok(())
}

/// Quantizes an RGBA bitmap down to palette indices.
///
/// Pixels with alpha below 128 map to the transparent index; everything
/// else maps to the nearest palette color through a 15-bit quantized
/// memo, so repeated colors only search the palette once.
pub fn convert_rgba_to_cmap8(src: &Bitmap, palette: &Palette) -> Vec<u8> {
    let mut memo: AHashMap<u16, u8> = AHashMap::new();
    let mut result = Vec::with_capacity(src.width() as usize * src.height() as usize);
    for pixel in src.pixels().chunks_exact(4) {
        let (b, g, r, a) = (pixel[0], pixel[1], pixel[2], pixel[3]);
        if a < 128 {
            result.push(TRANSPARENT_INDEX);
            continue;
        }
        let key = (((r as u16) & 0xf8) << 7) | (((g as u16) & 0xf8) << 2) | ((b as u16) >> 3);
        let index = *memo
            .entry(key)
            .or_insert_with(|| palette.nearest(Rgba::new(r, g, b, 255)));
        result.push(index);
    }
    result
}

fn pixel_u32(bitmap: &Bitmap, x: i64, y: i64) -> u32 {
    let x = x.clamp(0, bitmap.width() as i64 - 1) as usize;
    let y = y.clamp(0, bitmap.height() as i64 - 1) as usize;
    let offset = (y * bitmap.width() as usize + x) * 4;
    u32::from_le_bytes(bitmap.pixels()[offset..offset + 4].try_into().unwrap())
}

fn put_pixel_u32(bitmap: &mut Bitmap, x: u32, y: u32, value: u32) {
    let offset = (y as usize * bitmap.width() as usize + x as usize) * 4;
    bitmap.pixels_mut()[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// AdvanceMAME Scale2x: doubles pixel art while interpolating out the
/// jaggies.
pub fn scale2x(src: &Bitmap, dst: &mut Bitmap) {
    debug_assert_eq!(dst.width(), src.width() * 2);
    debug_assert_eq!(dst.height(), src.height() * 2);
    for y in 0..src.height() as i64 {
        for x in 0..src.width() as i64 {
            let b = pixel_u32(src, x, y - 1);
            let d = pixel_u32(src, x - 1, y);
            let e = pixel_u32(src, x, y);
            let f = pixel_u32(src, x + 1, y);
            let h = pixel_u32(src, x, y + 1);

            let e0 = if d == b && b != f && d != h { d } else { e };
            let e1 = if b == f && b != d && f != h { f } else { e };
            let e2 = if d == h && d != b && h != f { d } else { e };
            let e3 = if h == f && d != h && b != f { f } else { e };

            let (dx, dy) = (x as u32 * 2, y as u32 * 2);
            put_pixel_u32(dst, dx, dy, e0);
            put_pixel_u32(dst, dx + 1, dy, e1);
            put_pixel_u32(dst, dx, dy + 1, e2);
            put_pixel_u32(dst, dx + 1, dy + 1, e3);
        }
    }
}

/// AdvanceMAME Scale3x.
pub fn scale3x(src: &Bitmap, dst: &mut Bitmap) {
    debug_assert_eq!(dst.width(), src.width() * 3);
    debug_assert_eq!(dst.height(), src.height() * 3);
    for y in 0..src.height() as i64 {
        for x in 0..src.width() as i64 {
            let a = pixel_u32(src, x - 1, y - 1);
            let b = pixel_u32(src, x, y - 1);
            let c = pixel_u32(src, x + 1, y - 1);
            let d = pixel_u32(src, x - 1, y);
            let e = pixel_u32(src, x, y);
            let f = pixel_u32(src, x + 1, y);
            let g = pixel_u32(src, x - 1, y + 1);
            let h = pixel_u32(src, x, y + 1);
            let i = pixel_u32(src, x + 1, y + 1);

            let e0 = if d == b && b != f && d != h { d } else { e };
            let e1 = if (d == b && b != f && d != h && e != c)
                || (b == f && b != d && f != h && e != a)
            {
                b
            } else {
                e
            };
            let e2 = if b == f && b != d && f != h { f } else { e };
            let e3 = if (d == b && b != f && d != h && e != g)
                || (d == h && d != b && h != f && e != a)
            {
                d
            } else {
                e
            };
            let e4 = e;
            let e5 = if (b == f && b != d && f != h && e != i)
                || (h == f && d != h && b != f && e != c)
            {
                f
            } else {
                e
            };
            let e6 = if d == h && d != b && h != f { d } else { e };
            let e7 = if (d == h && d != b && h != f && e != i)
                || (h == f && d != h && b != f && e != g)
            {
                h
            } else {
                e
            };
            let e8 = if h == f && d != h && b != f { f } else { e };

            let (dx, dy) = (x as u32 * 3, y as u32 * 3);
            put_pixel_u32(dst, dx, dy, e0);
            put_pixel_u32(dst, dx + 1, dy, e1);
            put_pixel_u32(dst, dx + 2, dy, e2);
            put_pixel_u32(dst, dx, dy + 1, e3);
            put_pixel_u32(dst, dx + 1, dy + 1, e4);
            put_pixel_u32(dst, dx + 2, dy + 1, e5);
            put_pixel_u32(dst, dx, dy + 2, e6);
            put_pixel_u32(dst, dx + 1, dy + 2, e7);
            put_pixel_u32(dst, dx + 2, dy + 2, e8);
        }
    }
}

/// Bilinear resampling for arbitrary (including fractional and downward)
/// scale ratios.
pub fn scale_bilinear(src: &Bitmap, dst: &mut Bitmap) {
    let sw = src.width() as f64;
    let sh = src.height() as f64;
    let dw = dst.width() as f64;
    let dh = dst.height() as f64;

    for y in 0..dst.height() {
        let sy = if dh > 1.0 { y as f64 * (sh - 1.0) / (dh - 1.0) } else { 0.0 };
        let y0 = sy.floor() as i64;
        let wy = sy - y0 as f64;
        for x in 0..dst.width() {
            let sx = if dw > 1.0 { x as f64 * (sw - 1.0) / (dw - 1.0) } else { 0.0 };
            let x0 = sx.floor() as i64;
            let wx = sx - x0 as f64;

            let p00 = pixel_u32(src, x0, y0).to_le_bytes();
            let p10 = pixel_u32(src, x0 + 1, y0).to_le_bytes();
            let p01 = pixel_u32(src, x0, y0 + 1).to_le_bytes();
            let p11 = pixel_u32(src, x0 + 1, y0 + 1).to_le_bytes();

            let mut out = [0u8; 4];
            for channel in 0..4 {
                let top = p00[channel] as f64 * (1.0 - wx) + p10[channel] as f64 * wx;
                let bottom = p01[channel] as f64 * (1.0 - wx) + p11[channel] as f64 * wx;
                out[channel] = (top * (1.0 - wy) + bottom * wy + 0.5) as u8;
            }
            put_pixel_u32(dst, x, y, u32::from_le_bytes(out));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_round_trips_cube_colors() {
        let palette = Palette::default();
        assert_eq!(palette.color(0), Rgba::new(0, 0, 0, 255));
        assert_eq!(palette.nearest(Rgba::new(51, 102, 153, 255)), palette.nearest(Rgba::new(52, 101, 152, 255)));
        assert_eq!(palette.color(TRANSPARENT_INDEX).a, 0);
    }

    #[test]
    fn scale2x_preserves_solid_blocks() {
        let mut src = Bitmap::new(2, 2).unwrap();
        src.clear([1, 2, 3, 255]);
        let mut dst = Bitmap::new(4, 4).unwrap();
        scale2x(&src, &mut dst);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(dst.pixel(x, y), [1, 2, 3, 255]);
            }
        }
    }
}
