use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use crate::error::ViconError;
use crate::format::buffer::LittleEndianBuffer;
use crate::format::command_queue::PathCommandQueue;
use crate::format::{
    FLAT_ICON_MAGIC, GradientFlags, LOD_SCALE_FACTOR, MESSAGE_MAGIC, PathFlags,
    SHAPE_TYPE_PATH_SOURCE, STYLE_TYPE_GRADIENT, STYLE_TYPE_SOLID_COLOR,
    STYLE_TYPE_SOLID_COLOR_NO_ALPHA, STYLE_TYPE_SOLID_GRAY, STYLE_TYPE_SOLID_GRAY_NO_ALPHA,
    ShapeFlags, TRANSFORMER_TYPE_AFFINE, TRANSFORMER_TYPE_CONTOUR,
    TRANSFORMER_TYPE_PERSPECTIVE, TRANSFORMER_TYPE_STROKE, message,
};
use crate::geom::{Point, Transform};
use crate::model::{
    Container, Gradient, GradientType, Icon, Rgba, Shape, Style, VectorPath,
};
use crate::transformer::{
    AffineTransformer, ContourTransformer, LineCap, LineJoin, PerspectiveTransformer,
    StrokeTransformer, Transformer,
};

/// Parses an icon from a byte buffer, auto-detecting the container format
/// by its magic.
pub fn decode(data: &[u8]) -> Result<Icon, ViconError> {
    if data.len() >= 4 && &data[0..4] == MESSAGE_MAGIC {
        return message::decode_message(data);
    }

    let mut buffer = LittleEndianBuffer::from_bytes(data);
    let magic = buffer.read_u32().map_err(|_| ViconError::InvalidMagic)?;
    if magic != FLAT_ICON_MAGIC {
        return Err(ViconError::InvalidMagic);
    }

    let icon = Icon::new();
    parse_style_section(&mut buffer, &mut icon.styles().borrow_mut())?;
    parse_path_section(&mut buffer, &mut icon.paths().borrow_mut())?;
    {
        let styles = icon.styles().borrow();
        let paths = icon.paths().borrow();
        parse_shape_section(&mut buffer, &mut icon.shapes().borrow_mut(), &styles, &paths)?;
    }
    Ok(icon)
}

// --- Styles ---

pub(crate) fn parse_style_section(
    buffer: &mut LittleEndianBuffer,
    styles: &mut Container<Style>,
) -> Result<(), ViconError> {
    let count = buffer.read_u8()?;
    for _ in 0..count {
        let style_type = buffer.read_u8()?;
        let style = match style_type {
            STYLE_TYPE_SOLID_COLOR => Some(read_color_style(buffer, true, false)?),
            STYLE_TYPE_SOLID_COLOR_NO_ALPHA => Some(read_color_style(buffer, false, false)?),
            STYLE_TYPE_SOLID_GRAY => Some(read_color_style(buffer, true, true)?),
            STYLE_TYPE_SOLID_GRAY_NO_ALPHA => Some(read_color_style(buffer, false, true)?),
            STYLE_TYPE_GRADIENT => Some(read_gradient_style(buffer)?),
            _ => {
                skip_unknown_tag(buffer)?;
                None
            }
        };
        if let Some(style) = style {
            styles.add_item(Rc::new(RefCell::new(style)));
        }
    }
    Ok(())
}

fn read_color(buffer: &mut LittleEndianBuffer, alpha: bool, gray: bool) -> Result<Rgba, ViconError> {
    Ok(match (alpha, gray) {
        (true, true) => {
            let value = buffer.read_u8()?;
            Rgba::gray(value, buffer.read_u8()?)
        }
        (true, false) => {
            let r = buffer.read_u8()?;
            let g = buffer.read_u8()?;
            let b = buffer.read_u8()?;
            Rgba::new(r, g, b, buffer.read_u8()?)
        }
        (false, true) => Rgba::gray(buffer.read_u8()?, 255),
        (false, false) => {
            let r = buffer.read_u8()?;
            let g = buffer.read_u8()?;
            Rgba::new(r, g, buffer.read_u8()?, 255)
        }
    })
}

fn read_color_style(
    buffer: &mut LittleEndianBuffer,
    alpha: bool,
    gray: bool,
) -> Result<Style, ViconError> {
    Ok(Style::new(read_color(buffer, alpha, gray)?))
}

fn read_gradient_style(buffer: &mut LittleEndianBuffer) -> Result<Style, ViconError> {
    let gradient_type = buffer.read_u8()?;
    let flags = GradientFlags::from_bits_retain(buffer.read_u8()?);
    let stop_count = buffer.read_u8()?;

    let mut gradient = Gradient::new_empty();
    gradient.set_gradient_type(GradientType::from_u8(gradient_type));

    if flags.contains(GradientFlags::TRANSFORM) {
        gradient.set_transform(read_transform(buffer)?);
    }

    let alpha = !flags.contains(GradientFlags::NO_ALPHA);
    let gray = flags.contains(GradientFlags::GRAYS);

    for _ in 0..stop_count {
        let offset = buffer.read_u8()?;
        let color = read_color(buffer, alpha, gray)?;
        gradient.add_stop(color, offset as f32 / 255.0);
    }

    if gradient.count_stops() == 0 {
        warn!("decoded gradient without color stops");
    }

    Ok(Style::with_gradient(gradient))
}

// --- Paths ---

pub(crate) fn parse_path_section(
    buffer: &mut LittleEndianBuffer,
    paths: &mut Container<VectorPath>,
) -> Result<(), ViconError> {
    let count = buffer.read_u8()?;
    for _ in 0..count {
        let flags = PathFlags::from_bits_retain(buffer.read_u8()?);
        let point_count = buffer.read_u8()? as usize;

        let mut path = VectorPath::new();
        if flags.contains(PathFlags::NO_CURVES) {
            for _ in 0..point_count {
                let x = buffer.read_coord()? as f64;
                let y = buffer.read_coord()? as f64;
                path.add_point_full(Point::new(x, y), Point::new(x, y), Point::new(x, y), false);
            }
        } else if flags.contains(PathFlags::USES_COMMANDS) {
            PathCommandQueue::read(buffer, &mut path, point_count)?;
        } else {
            for _ in 0..point_count {
                let x = buffer.read_coord()? as f64;
                let y = buffer.read_coord()? as f64;
                let in_x = buffer.read_coord()? as f64;
                let in_y = buffer.read_coord()? as f64;
                let out_x = buffer.read_coord()? as f64;
                let out_y = buffer.read_coord()? as f64;
                path.add_point_full(
                    Point::new(x, y),
                    Point::new(in_x, in_y),
                    Point::new(out_x, out_y),
                    false,
                );
            }
        }

        // Normalize decoded handles and re-derive the connected flags.
        path.cleanup();
        if flags.contains(PathFlags::CLOSED) {
            path.set_closed(true);
        }
        paths.add_item(Rc::new(RefCell::new(path)));
    }
    Ok(())
}

// --- Shapes ---

pub(crate) fn parse_shape_section(
    buffer: &mut LittleEndianBuffer,
    shapes: &mut Container<Shape>,
    styles: &Container<Style>,
    paths: &Container<VectorPath>,
) -> Result<(), ViconError> {
    let count = buffer.read_u8()?;
    for _ in 0..count {
        let shape_type = buffer.read_u8()?;
        if shape_type != SHAPE_TYPE_PATH_SOURCE {
            skip_unknown_tag(buffer)?;
            continue;
        }
        let shape = read_path_source_shape(buffer, styles, paths)?;
        shapes.add_item(Rc::new(RefCell::new(shape)));
    }
    Ok(())
}

fn read_path_source_shape(
    buffer: &mut LittleEndianBuffer,
    styles: &Container<Style>,
    paths: &Container<VectorPath>,
) -> Result<Shape, ViconError> {
    let style_index = buffer.read_u8()? as usize;
    let path_count = buffer.read_u8()?;

    // A missing style reference is dropped, not fatal: the shape decodes
    // as visually empty.
    let style = styles.item_at(style_index).cloned();
    if style.is_none() {
        warn!("shape references non-existing style {style_index}");
    }
    let mut shape = Shape::new(style);

    for _ in 0..path_count {
        let path_index = buffer.read_u8()? as usize;
        match paths.item_at(path_index) {
            Some(path) => {
                shape.paths().borrow_mut().add_item(path.clone());
            }
            None => warn!("shape references non-existing path {path_index}"),
        }
    }

    let flags = ShapeFlags::from_bits_retain(buffer.read_u8()?);
    shape.set_hinting(flags.contains(ShapeFlags::HINTING));

    if flags.contains(ShapeFlags::TRANSFORM) {
        shape.set_transform(read_transform(buffer)?);
    } else if flags.contains(ShapeFlags::TRANSLATION) {
        let x = buffer.read_coord()? as f64;
        let y = buffer.read_coord()? as f64;
        shape.set_transform(Transform::translation(x, y));
    }

    if flags.contains(ShapeFlags::LOD_SCALE) {
        let min = buffer.read_u8()?;
        let max = buffer.read_u8()?;
        shape.set_min_visibility_scale(min as f64 / LOD_SCALE_FACTOR);
        shape.set_max_visibility_scale(max as f64 / LOD_SCALE_FACTOR);
    }

    if flags.contains(ShapeFlags::HAS_TRANSFORMERS) {
        let transformer_count = buffer.read_u8()?;
        for _ in 0..transformer_count {
            if let Some(transformer) = read_transformer(buffer)? {
                shape.add_transformer(transformer);
            }
        }
    }

    Ok(shape)
}

fn read_transformer(
    buffer: &mut LittleEndianBuffer,
) -> Result<Option<Transformer>, ViconError> {
    let transformer_type = buffer.read_u8()?;
    match transformer_type {
        TRANSFORMER_TYPE_AFFINE => {
            let matrix = read_transform(buffer)?;
            Ok(Some(Transformer::Affine(AffineTransformer::new(matrix))))
        }
        TRANSFORMER_TYPE_CONTOUR => {
            let width = buffer.read_u8()? as f64 - 128.0;
            let line_join = LineJoin::from_u8(buffer.read_u8()?);
            let miter_limit = buffer.read_u8()? as f64;
            Ok(Some(Transformer::Contour(ContourTransformer {
                width,
                line_join,
                miter_limit,
            })))
        }
        TRANSFORMER_TYPE_PERSPECTIVE => {
            // Reserved: the tag carries no payload yet.
            Ok(Some(Transformer::Perspective(PerspectiveTransformer::new())))
        }
        TRANSFORMER_TYPE_STROKE => {
            let width = buffer.read_u8()? as f64 - 128.0;
            let line_options = buffer.read_u8()?;
            let miter_limit = buffer.read_u8()? as f64;
            Ok(Some(Transformer::Stroke(StrokeTransformer {
                width,
                line_cap: LineCap::from_u8(line_options >> 4),
                line_join: LineJoin::from_u8(line_options & 0x0f),
                miter_limit,
            })))
        }
        _ => {
            skip_unknown_tag(buffer)?;
            Ok(None)
        }
    }
}

// --- Shared helpers ---

fn read_transform(buffer: &mut LittleEndianBuffer) -> Result<Transform, ViconError> {
    let mut elements = [0.0f64; 6];
    for element in &mut elements {
        *element = buffer.read_float24()? as f64;
    }
    Ok(Transform::from_elements(&elements))
}

/// Skips an unknown tag using its u16 length prefix. A length running
/// past the end of the buffer is the one case reported as `UnknownTag`.
fn skip_unknown_tag(buffer: &mut LittleEndianBuffer) -> Result<(), ViconError> {
    let length = buffer.read_u16()? as usize;
    buffer.skip(length).map_err(|_| ViconError::UnknownTag)
}
