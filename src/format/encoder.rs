use crate::error::ViconError;
use crate::format::buffer::{coord_size, LittleEndianBuffer};
use crate::format::command_queue::PathCommandQueue;
use crate::format::{
    FLAT_ICON_MAGIC, GradientFlags, LOD_SCALE_FACTOR, MAX_SECTION_COUNT, PathFlags,
    SHAPE_TYPE_PATH_SOURCE, STYLE_TYPE_GRADIENT, STYLE_TYPE_SOLID_COLOR,
    STYLE_TYPE_SOLID_COLOR_NO_ALPHA, STYLE_TYPE_SOLID_GRAY, STYLE_TYPE_SOLID_GRAY_NO_ALPHA,
    ShapeFlags, TRANSFORMER_TYPE_AFFINE, TRANSFORMER_TYPE_CONTOUR, TRANSFORMER_TYPE_STROKE,
};
use crate::geom::{Point, Transform};
use crate::model::{Container, Gradient, Icon, Shape, Style, VectorPath};
use crate::transformer::Transformer;

/// Serializes an icon to the flat binary format.
///
/// Fails when a section exceeds its 255-entry capacity, when a path has
/// more than 255 points, or when a shape references entities that are not
/// in the icon's containers.
pub fn encode(icon: &Icon) -> Result<Vec<u8>, ViconError> {
    let mut buffer = LittleEndianBuffer::new();
    buffer.write_u32(FLAT_ICON_MAGIC);

    let styles = icon.styles().borrow();
    let paths = icon.paths().borrow();
    let shapes = icon.shapes().borrow();

    write_style_section(&mut buffer, &styles)?;
    write_path_section(&mut buffer, &paths)?;
    write_shape_section(&mut buffer, &shapes, &styles, &paths)?;

    Ok(buffer.into_vec())
}

// --- Styles ---

pub(crate) fn write_style_section(
    buffer: &mut LittleEndianBuffer,
    styles: &Container<Style>,
) -> Result<(), ViconError> {
    if styles.count_items() > MAX_SECTION_COUNT {
        return Err(ViconError::TooManyStyles);
    }
    buffer.write_u8(styles.count_items() as u8);
    for style in styles.iter() {
        write_style(buffer, &style.borrow())?;
    }
    Ok(())
}

/// Writes one style with the smallest tag that is lossless for its color.
pub(crate) fn write_style(
    buffer: &mut LittleEndianBuffer,
    style: &Style,
) -> Result<(), ViconError> {
    if let Some(gradient) = style.gradient() {
        buffer.write_u8(STYLE_TYPE_GRADIENT);
        return write_gradient(buffer, gradient);
    }

    let color = style.color();
    match (color.is_gray(), color.is_opaque()) {
        (true, true) => {
            buffer.write_u8(STYLE_TYPE_SOLID_GRAY_NO_ALPHA);
            buffer.write_u8(color.r);
        }
        (true, false) => {
            buffer.write_u8(STYLE_TYPE_SOLID_GRAY);
            buffer.write_u8(color.r);
            buffer.write_u8(color.a);
        }
        (false, true) => {
            buffer.write_u8(STYLE_TYPE_SOLID_COLOR_NO_ALPHA);
            buffer.write_u8(color.r);
            buffer.write_u8(color.g);
            buffer.write_u8(color.b);
        }
        (false, false) => {
            buffer.write_u8(STYLE_TYPE_SOLID_COLOR);
            buffer.write_u8(color.r);
            buffer.write_u8(color.g);
            buffer.write_u8(color.b);
            buffer.write_u8(color.a);
        }
    }
    Ok(())
}

fn write_gradient(buffer: &mut LittleEndianBuffer, gradient: &Gradient) -> Result<(), ViconError> {
    let stops = gradient.stops();
    if stops.is_empty() {
        return Err(ViconError::InvalidArgument(
            "gradient has no color stops".to_string(),
        ));
    }
    if stops.len() > MAX_SECTION_COUNT {
        return Err(ViconError::InvalidArgument(
            "gradient has too many color stops".to_string(),
        ));
    }

    let mut flags = GradientFlags::empty();
    if !gradient.transform().is_identity() {
        flags |= GradientFlags::TRANSFORM;
    }
    let alpha = stops.iter().any(|s| s.color.a < 255);
    let gray = stops.iter().all(|s| s.color.is_gray());
    if !alpha {
        flags |= GradientFlags::NO_ALPHA;
    }
    if gray {
        flags |= GradientFlags::GRAYS;
    }

    buffer.write_u8(gradient.gradient_type() as u8);
    buffer.write_u8(flags.bits());
    buffer.write_u8(stops.len() as u8);

    if flags.contains(GradientFlags::TRANSFORM) {
        write_transform(buffer, gradient.transform());
    }

    for stop in stops {
        buffer.write_u8((stop.offset * 255.0) as u8);
        if alpha {
            if gray {
                buffer.write_u8(stop.color.r);
                buffer.write_u8(stop.color.a);
            } else {
                buffer.write_u8(stop.color.r);
                buffer.write_u8(stop.color.g);
                buffer.write_u8(stop.color.b);
                buffer.write_u8(stop.color.a);
            }
        } else if gray {
            buffer.write_u8(stop.color.r);
        } else {
            buffer.write_u8(stop.color.r);
            buffer.write_u8(stop.color.g);
            buffer.write_u8(stop.color.b);
        }
    }

    Ok(())
}

// --- Paths ---

pub(crate) fn write_path_section(
    buffer: &mut LittleEndianBuffer,
    paths: &Container<VectorPath>,
) -> Result<(), ViconError> {
    if paths.count_items() > MAX_SECTION_COUNT {
        return Err(ViconError::TooManyPaths);
    }
    buffer.write_u8(paths.count_items() as u8);
    for path in paths.iter() {
        write_path(buffer, &path.borrow())?;
    }
    Ok(())
}

/// The exact payload sizes of the three path encodings.
struct PathAnalysis {
    all_plain: bool,
    no_curves_size: usize,
    commands_size: usize,
    curves_size: usize,
}

fn analyse_path(path: &VectorPath, point_count: usize) -> PathAnalysis {
    let mut analysis = PathAnalysis {
        all_plain: true,
        no_curves_size: 0,
        commands_size: (point_count + 3) / 4,
        curves_size: 0,
    };

    let mut last = Point::ORIGIN;
    for p in path.points().iter().take(point_count) {
        let sx = coord_size(p.point.x as f32);
        let sy = coord_size(p.point.y as f32);
        let handle_sizes = coord_size(p.point_in.x as f32)
            + coord_size(p.point_in.y as f32)
            + coord_size(p.point_out.x as f32)
            + coord_size(p.point_out.y as f32);

        analysis.no_curves_size += sx + sy;
        analysis.curves_size += sx + sy + handle_sizes;

        if p.is_plain() {
            // Same classification the command queue uses when writing.
            if p.point.x == last.x {
                analysis.commands_size += sy;
            } else if p.point.y == last.y {
                analysis.commands_size += sx;
            } else {
                analysis.commands_size += sx + sy;
            }
        } else {
            analysis.all_plain = false;
            analysis.commands_size += sx + sy + handle_sizes;
        }
        last = p.point;
    }

    analysis
}

pub(crate) fn write_path(
    buffer: &mut LittleEndianBuffer,
    path: &VectorPath,
) -> Result<(), ViconError> {
    if path.count_points() > MAX_SECTION_COUNT {
        return Err(ViconError::PathTooManyPoints);
    }
    let point_count = path.count_points();

    let mut flags = PathFlags::empty();
    if path.is_closed() {
        flags |= PathFlags::CLOSED;
    }

    // Pick the variant with the smallest payload; ties prefer the plain
    // point list, then the command encoding, then full curves.
    let analysis = analyse_path(path, point_count);
    if analysis.all_plain && analysis.no_curves_size <= analysis.commands_size {
        flags |= PathFlags::NO_CURVES;
    } else if analysis.commands_size <= analysis.curves_size {
        flags |= PathFlags::USES_COMMANDS;
    }

    buffer.write_u8(flags.bits());
    buffer.write_u8(point_count as u8);

    if flags.contains(PathFlags::NO_CURVES) {
        for p in path.points().iter().take(point_count) {
            buffer.write_coord(p.point.x as f32);
            buffer.write_coord(p.point.y as f32);
        }
    } else if flags.contains(PathFlags::USES_COMMANDS) {
        PathCommandQueue::new().write(buffer, path, point_count)?;
    } else {
        for p in path.points().iter().take(point_count) {
            buffer.write_coord(p.point.x as f32);
            buffer.write_coord(p.point.y as f32);
            buffer.write_coord(p.point_in.x as f32);
            buffer.write_coord(p.point_in.y as f32);
            buffer.write_coord(p.point_out.x as f32);
            buffer.write_coord(p.point_out.y as f32);
        }
    }

    Ok(())
}

// --- Shapes ---

pub(crate) fn write_shape_section(
    buffer: &mut LittleEndianBuffer,
    shapes: &Container<Shape>,
    styles: &Container<Style>,
    paths: &Container<VectorPath>,
) -> Result<(), ViconError> {
    if shapes.count_items() > MAX_SECTION_COUNT {
        return Err(ViconError::TooManyShapes);
    }
    buffer.write_u8(shapes.count_items() as u8);
    for shape in shapes.iter() {
        write_shape(buffer, &shape.borrow(), styles, paths)?;
    }
    Ok(())
}

pub(crate) fn write_shape(
    buffer: &mut LittleEndianBuffer,
    shape: &Shape,
    styles: &Container<Style>,
    paths: &Container<VectorPath>,
) -> Result<(), ViconError> {
    let style = shape.style().ok_or_else(|| {
        ViconError::InvalidArgument("shape has no style assigned".to_string())
    })?;
    let style_index = styles.index_of(style).ok_or_else(|| {
        ViconError::InvalidArgument("shape references a style outside the icon".to_string())
    })?;

    let shape_paths = shape.paths().borrow();
    if shape_paths.count_items() > MAX_SECTION_COUNT {
        return Err(ViconError::ShapeTooManyPaths);
    }

    // The encoder only emits transformers the format can represent;
    // reserved perspective entries are dropped.
    let transformers: Vec<&Transformer> = shape
        .transformers()
        .iter()
        .filter(|t| !matches!(t, Transformer::Perspective(_)))
        .collect();
    if transformers.len() > MAX_SECTION_COUNT {
        return Err(ViconError::ShapeTooManyTransformers);
    }

    buffer.write_u8(SHAPE_TYPE_PATH_SOURCE);
    buffer.write_u8(style_index as u8);
    buffer.write_u8(shape_paths.count_items() as u8);

    for path in shape_paths.iter() {
        let path_index = paths.index_of(path).ok_or_else(|| {
            ViconError::InvalidArgument("shape references a path outside the icon".to_string())
        })?;
        buffer.write_u8(path_index as u8);
    }

    let mut flags = ShapeFlags::empty();
    let transform = shape.transform();
    if !transform.is_identity() {
        if transform.is_translation_only() {
            flags |= ShapeFlags::TRANSLATION;
        } else {
            flags |= ShapeFlags::TRANSFORM;
        }
    }
    if shape.hinting() {
        flags |= ShapeFlags::HINTING;
    }
    if shape.min_visibility_scale() != 0.0 || shape.max_visibility_scale() != 4.0 {
        flags |= ShapeFlags::LOD_SCALE;
    }
    if !transformers.is_empty() {
        flags |= ShapeFlags::HAS_TRANSFORMERS;
    }

    buffer.write_u8(flags.bits());

    if flags.contains(ShapeFlags::TRANSFORM) {
        write_transform(buffer, transform);
    } else if flags.contains(ShapeFlags::TRANSLATION) {
        let origin = transform.transform_point(&Point::ORIGIN);
        buffer.write_coord(origin.x as f32);
        buffer.write_coord(origin.y as f32);
    }

    if flags.contains(ShapeFlags::LOD_SCALE) {
        buffer.write_u8((shape.min_visibility_scale() * LOD_SCALE_FACTOR + 0.5) as u8);
        buffer.write_u8((shape.max_visibility_scale() * LOD_SCALE_FACTOR + 0.5) as u8);
    }

    if flags.contains(ShapeFlags::HAS_TRANSFORMERS) {
        buffer.write_u8(transformers.len() as u8);
        for transformer in transformers {
            write_transformer(buffer, transformer);
        }
    }

    Ok(())
}

fn write_transformer(buffer: &mut LittleEndianBuffer, transformer: &Transformer) {
    match transformer {
        Transformer::Affine(affine) => {
            buffer.write_u8(TRANSFORMER_TYPE_AFFINE);
            write_transform(buffer, &affine.matrix);
        }
        Transformer::Contour(contour) => {
            buffer.write_u8(TRANSFORMER_TYPE_CONTOUR);
            buffer.write_u8((contour.width as i8 as i16 + 128) as u8);
            buffer.write_u8(contour.line_join as u8);
            buffer.write_u8(contour.miter_limit as u8);
        }
        Transformer::Stroke(stroke) => {
            buffer.write_u8(TRANSFORMER_TYPE_STROKE);
            buffer.write_u8((stroke.width as i8 as i16 + 128) as u8);
            let line_options = (stroke.line_join as u8) | ((stroke.line_cap as u8) << 4);
            buffer.write_u8(line_options);
            buffer.write_u8(stroke.miter_limit as u8);
        }
        Transformer::Perspective(_) => {
            // Reserved; never emitted (filtered out by the caller).
        }
    }
}

fn write_transform(buffer: &mut LittleEndianBuffer, transform: &Transform) {
    for element in transform.elements() {
        buffer.write_float24(element as f32);
    }
}
