use std::cell::RefCell;
use std::error::Error;
use std::rc::Rc;

use vicon::format::{encode_message, PathFlags};
use vicon::prelude::*;

fn handle<T>(value: T) -> Handle<T> {
    Rc::new(RefCell::new(value))
}

/// One opaque red square: a style, a closed four-point path, one shape.
fn red_square_icon() -> Icon {
    let icon = Icon::new();
    let style = handle(Style::new(Rgba::new(255, 0, 0, 255)));
    icon.styles().borrow_mut().add_item(style.clone());

    let mut path = VectorPath::new();
    path.add_point(Point::new(16.0, 16.0));
    path.add_point(Point::new(48.0, 16.0));
    path.add_point(Point::new(48.0, 48.0));
    path.add_point(Point::new(16.0, 48.0));
    path.set_closed(true);
    let path = handle(path);
    icon.paths().borrow_mut().add_item(path.clone());

    let shape = handle(Shape::new(Some(style)));
    shape.borrow().paths().borrow_mut().add_item(path);
    icon.shapes().borrow_mut().add_item(shape);
    icon
}

#[test]
fn empty_icon_encoding() -> Result<(), Box<dyn Error>> {
    // Magic plus three zero counts.
    let bytes = encode(&Icon::new())?;
    assert_eq!(bytes, vec![0x66, 0x69, 0x63, 0x6E, 0x00, 0x00, 0x00]);

    let icon = decode(&bytes)?;
    assert_eq!(icon.styles().borrow().count_items(), 0);
    assert_eq!(icon.paths().borrow().count_items(), 0);
    assert_eq!(icon.shapes().borrow().count_items(), 0);
    Ok(())
}

#[test]
fn magic_round_trip() -> Result<(), Box<dyn Error>> {
    let bytes = encode(&red_square_icon())?;
    assert_eq!(&bytes[0..4], b"ficn");
    let bytes_again = encode(&decode(&bytes)?)?;
    assert_eq!(&bytes_again[0..4], b"ficn");
    Ok(())
}

#[test]
fn invalid_magic_is_rejected() {
    assert!(matches!(decode(b"nope\x00\x00\x00"), Err(ViconError::InvalidMagic)));
    assert!(matches!(decode(b"fi"), Err(ViconError::InvalidMagic)));
}

#[test]
fn solid_style_tags_choose_smallest_lossless_form() -> Result<(), Box<dyn Error>> {
    let cases = [
        // (color, expected tag, payload bytes after tag)
        (Rgba::new(10, 20, 30, 128), 1u8, 4usize),
        (Rgba::new(10, 20, 30, 255), 3, 3),
        (Rgba::gray(99, 128), 4, 2),
        (Rgba::gray(99, 255), 5, 1),
    ];
    for (color, tag, payload) in cases {
        let icon = Icon::new();
        icon.styles().borrow_mut().add_item(handle(Style::new(color)));
        let bytes = encode(&icon)?;
        // magic(4) + style count(1) + tag + payload + path count + shape count
        assert_eq!(bytes[5], tag, "color {color}");
        assert_eq!(bytes.len(), 4 + 1 + 1 + payload + 1 + 1);

        let decoded = decode(&bytes)?;
        let styles = decoded.styles().borrow();
        assert_eq!(styles.item_at(0).unwrap().borrow().color(), color);
    }
    Ok(())
}

#[test]
fn structural_round_trip() -> Result<(), Box<dyn Error>> {
    let icon = Icon::new();

    // A gradient with transform, transparency, and mixed colors.
    let mut gradient = Gradient::new_empty();
    gradient.set_gradient_type(GradientType::Diamond);
    gradient.set_interpolation(Interpolation::Linear);
    gradient.add_stop(Rgba::new(255, 0, 0, 200), 0.0);
    gradient.add_stop(Rgba::new(0, 0, 255, 255), 1.0);
    gradient.set_transform(Transform::translation(4.0, -2.0));
    let gradient_style = handle(Style::with_gradient(gradient.clone()));
    let solid_style = handle(Style::new(Rgba::new(1, 2, 3, 255)));
    icon.styles().borrow_mut().add_item(gradient_style.clone());
    icon.styles().borrow_mut().add_item(solid_style.clone());

    // A curved path.
    let mut curved = VectorPath::new();
    curved.add_point_full(
        Point::new(8.0, 8.0),
        Point::new(4.0, 8.0),
        Point::new(12.0, 8.0),
        true,
    );
    curved.add_point_full(
        Point::new(40.0, 8.0),
        Point::new(36.0, 2.0),
        Point::new(44.0, 14.0),
        false,
    );
    curved.add_point(Point::new(40.0, 40.0));
    curved.set_closed(true);
    let curved = handle(curved);

    // A rectilinear path that should use the command encoding.
    let mut rect = VectorPath::new();
    rect.add_point(Point::new(0.0, 4.0));
    rect.add_point(Point::new(20.0, 4.0));
    rect.add_point(Point::new(20.0, 24.0));
    rect.add_point(Point::new(0.0, 24.0));
    rect.set_closed(true);
    let rect = handle(rect);

    icon.paths().borrow_mut().add_item(curved.clone());
    icon.paths().borrow_mut().add_item(rect.clone());

    // Shape 1: gradient style, both paths, full transform + transformers.
    let shape = handle(Shape::new(Some(gradient_style)));
    {
        let shape = shape.borrow();
        shape.paths().borrow_mut().add_item(curved.clone());
        shape.paths().borrow_mut().add_item(rect.clone());
    }
    {
        let mut shape = shape.borrow_mut();
        let mut transform = Transform::scaling(1.5, 0.75);
        transform.translate_by(Point::new(3.0, 1.0));
        shape.set_transform(transform);
        shape.add_transformer(Transformer::Stroke(StrokeTransformer {
            width: 3.0,
            line_cap: LineCap::Round,
            line_join: LineJoin::Bevel,
            miter_limit: 4.0,
        }));
        shape.add_transformer(Transformer::Contour(ContourTransformer {
            width: -2.0,
            line_join: LineJoin::Miter,
            miter_limit: 8.0,
        }));
        shape.set_min_visibility_scale(0.5);
        shape.set_max_visibility_scale(2.0);
    }
    icon.shapes().borrow_mut().add_item(shape);

    // Shape 2: solid style, translation only, hinting.
    let shape = handle(Shape::new(Some(solid_style)));
    shape.borrow().paths().borrow_mut().add_item(rect.clone());
    {
        let mut shape = shape.borrow_mut();
        shape.set_transform(Transform::translation(7.0, 9.0));
        shape.set_hinting(true);
    }
    icon.shapes().borrow_mut().add_item(shape);

    let bytes = encode(&icon)?;
    let decoded = decode(&bytes)?;

    // Styles.
    {
        let styles = decoded.styles().borrow();
        assert_eq!(styles.count_items(), 2);
        let first = styles.item_at(0).unwrap().borrow();
        let decoded_gradient = first.gradient().expect("gradient survived");
        assert_eq!(decoded_gradient.gradient_type(), GradientType::Diamond);
        assert_eq!(decoded_gradient.count_stops(), 2);
        assert_eq!(decoded_gradient.stops()[0].color, Rgba::new(255, 0, 0, 200));
        assert_eq!(decoded_gradient.stops()[1].color, Rgba::new(0, 0, 255, 255));
        // Offsets quantize to 1/255.
        assert!((decoded_gradient.stops()[1].offset - 1.0).abs() < 1.0 / 255.0);
        // The transform survives float24 storage.
        assert!((decoded_gradient.transform().tx - 4.0).abs() < 1e-3);
        assert!((decoded_gradient.transform().ty + 2.0).abs() < 1e-3);

        let second = styles.item_at(1).unwrap().borrow();
        assert_eq!(second.color(), Rgba::new(1, 2, 3, 255));
    }

    // Paths: geometry within coordinate codec resolution.
    {
        let paths = decoded.paths().borrow();
        assert_eq!(paths.count_items(), 2);
        let decoded_curved = paths.item_at(0).unwrap().borrow();
        let original = curved.borrow();
        assert_eq!(decoded_curved.count_points(), original.count_points());
        assert!(decoded_curved.is_closed());
        for (a, b) in decoded_curved.points().iter().zip(original.points().iter()) {
            assert!(a.point.distance_to(&b.point) <= 2.0 / 102.0);
            assert!(a.point_in.distance_to(&b.point_in) <= 2.0 / 102.0);
            assert!(a.point_out.distance_to(&b.point_out) <= 2.0 / 102.0);
        }
    }

    // Shapes: references, transforms, transformers, LOD.
    {
        let shapes = decoded.shapes().borrow();
        assert_eq!(shapes.count_items(), 2);

        let first = shapes.item_at(0).unwrap().borrow();
        assert!(first.style().is_some());
        assert_eq!(first.paths().borrow().count_items(), 2);
        assert_eq!(first.count_transformers(), 2);
        match &first.transformers()[0] {
            Transformer::Stroke(stroke) => {
                assert_eq!(stroke.width, 3.0);
                assert_eq!(stroke.line_cap, LineCap::Round);
                assert_eq!(stroke.line_join, LineJoin::Bevel);
                assert_eq!(stroke.miter_limit, 4.0);
            }
            other => panic!("expected stroke, got {other:?}"),
        }
        match &first.transformers()[1] {
            Transformer::Contour(contour) => {
                assert_eq!(contour.width, -2.0);
                assert_eq!(contour.miter_limit, 8.0);
            }
            other => panic!("expected contour, got {other:?}"),
        }
        // LOD pair quantizes at 1/63.75.
        assert!((first.min_visibility_scale() - 0.5).abs() <= 1.0 / 63.75);
        assert!((first.max_visibility_scale() - 2.0).abs() <= 1.0 / 63.75);
        assert!((first.transform().sx - 1.5).abs() < 1e-3);

        let second = shapes.item_at(1).unwrap().borrow();
        assert!(second.hinting());
        assert!(second.transform().is_translation_only());
        assert!((second.transform().tx - 7.0).abs() <= 1.0 / 102.0);
        assert!((second.transform().ty - 9.0).abs() <= 1.0 / 102.0);
    }

    Ok(())
}

#[test]
fn coord_codec_limits() -> Result<(), Box<dyn Error>> {
    // Encoding clamps coordinates to [-128, 192].
    let icon = Icon::new();
    let style = handle(Style::new(Rgba::BLACK));
    icon.styles().borrow_mut().add_item(style.clone());
    let mut path = VectorPath::new();
    path.add_point(Point::new(-500.0, 500.0));
    path.add_point(Point::new(0.0, 0.0));
    path.add_point(Point::new(10.0, 30.0));
    let path = handle(path);
    icon.paths().borrow_mut().add_item(path.clone());
    let shape = handle(Shape::new(Some(style)));
    shape.borrow().paths().borrow_mut().add_item(path);
    icon.shapes().borrow_mut().add_item(shape);

    let decoded = decode(&encode(&icon)?)?;
    let paths = decoded.paths().borrow();
    let decoded_path = paths.item_at(0).unwrap().borrow();
    let clamped = decoded_path.point_at(0).unwrap().point;
    assert!((clamped.x + 128.0).abs() <= 1.0 / 102.0);
    assert!((clamped.y - 192.0).abs() <= 1.0 / 102.0);
    Ok(())
}

#[test]
fn path_variant_selection() -> Result<(), Box<dyn Error>> {
    // Diagonal plain points: every command would be a full line, so the
    // plain point list wins.
    let mut diagonal = VectorPath::new();
    for i in 0..6 {
        diagonal.add_point(Point::new(i as f64 * 7.0 + 1.0, i as f64 * 5.0 + 2.0));
    }

    // Rectilinear points: h/v commands save a coordinate per segment.
    let mut rectilinear = VectorPath::new();
    rectilinear.add_point(Point::new(2.0, 4.0));
    rectilinear.add_point(Point::new(30.0, 4.0));
    rectilinear.add_point(Point::new(30.0, 28.0));
    rectilinear.add_point(Point::new(2.0, 28.0));

    // All-curve path: commands would only add the command buffer.
    let mut curves = VectorPath::new();
    for i in 0..4 {
        let x = 8.0 + i as f64 * 10.0;
        curves.add_point_full(
            Point::new(x, 20.0),
            Point::new(x - 3.0, 15.0),
            Point::new(x + 3.0, 25.0),
            false,
        );
    }

    for (path, expected_flag, label) in [
        (diagonal, PathFlags::NO_CURVES, "diagonal"),
        (rectilinear, PathFlags::USES_COMMANDS, "rectilinear"),
        (curves, PathFlags::empty(), "curves"),
    ] {
        let icon = Icon::new();
        icon.paths().borrow_mut().add_item(handle(path));
        let bytes = encode(&icon)?;
        // magic(4) + style count(1) -> path count at 5, flags at 6.
        let flags = PathFlags::from_bits_retain(bytes[6]);
        assert_eq!(
            flags & (PathFlags::NO_CURVES | PathFlags::USES_COMMANDS),
            expected_flag,
            "{label}"
        );

        // Whatever variant was chosen decodes to the same geometry.
        let decoded = decode(&bytes)?;
        assert_eq!(
            decoded.paths().borrow().item_at(0).unwrap().borrow().count_points(),
            icon.paths().borrow().item_at(0).unwrap().borrow().count_points()
        );
    }
    Ok(())
}

#[test]
fn unknown_style_tag_is_elided() -> Result<(), Box<dyn Error>> {
    let reference = encode(&red_square_icon())?;

    // Rebuild the buffer with an extra unknown style (tag 200) injected
    // in front of the real one.
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&reference[0..4]);
    bytes.push(2); // style count
    bytes.push(200); // unknown tag
    let junk = [0xDEu8, 0xAD, 0xBE, 0xEF, 0x42];
    bytes.extend_from_slice(&(junk.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&junk);
    bytes.extend_from_slice(&reference[5..]);

    let decoded = decode(&bytes)?;
    // The unknown style vanished; everything else decodes as before.
    assert_eq!(decoded.styles().borrow().count_items(), 1);
    assert_eq!(decoded.shapes().borrow().count_items(), 1);
    assert_eq!(encode(&decoded)?, reference);
    Ok(())
}

#[test]
fn unknown_tag_with_bad_length_is_an_error() {
    let mut bytes = vec![0x66, 0x69, 0x63, 0x6E, 1, 200];
    bytes.extend_from_slice(&1000u16.to_le_bytes());
    bytes.push(0);
    assert!(matches!(decode(&bytes), Err(ViconError::UnknownTag)));
}

#[test]
fn truncated_buffer_is_an_error() -> Result<(), Box<dyn Error>> {
    let bytes = encode(&red_square_icon())?;
    for cut in [5, 8, bytes.len() - 1] {
        assert!(
            matches!(decode(&bytes[0..cut]), Err(ViconError::Truncated)),
            "cut at {cut}"
        );
    }
    Ok(())
}

#[test]
fn shape_with_missing_style_decodes_empty() -> Result<(), Box<dyn Error>> {
    // A shape referencing style 7 in an icon with one style.
    let mut bytes = encode(&red_square_icon())?;
    // Find the shape section: magic(4) styles(1+1+4) paths(...) then
    // shapes. Easier: patch the style index byte right after the shape
    // type tag, which is the third byte from the end of the fixed tail:
    // ... [shape count][type=10][style index][path count][path 0][flags]
    let len = bytes.len();
    assert_eq!(bytes[len - 5], 10, "shape type tag");
    bytes[len - 4] = 7;

    let decoded = decode(&bytes)?;
    let shapes = decoded.shapes().borrow();
    assert_eq!(shapes.count_items(), 1);
    assert!(shapes.item_at(0).unwrap().borrow().style().is_none());
    Ok(())
}

#[test]
fn capacity_limits() -> Result<(), Box<dyn Error>> {
    let icon = Icon::new();
    let style = handle(Style::new(Rgba::BLACK));
    icon.styles().borrow_mut().add_item(style.clone());
    let mut path = VectorPath::new();
    path.add_point(Point::new(1.0, 1.0));
    path.add_point(Point::new(2.0, 2.0));
    let path = handle(path);
    icon.paths().borrow_mut().add_item(path.clone());

    for _ in 0..255 {
        let shape = handle(Shape::new(Some(style.clone())));
        shape.borrow().paths().borrow_mut().add_item(path.clone());
        icon.shapes().borrow_mut().add_item(shape);
    }
    assert!(encode(&icon).is_ok(), "255 shapes must encode");

    let shape = handle(Shape::new(Some(style.clone())));
    shape.borrow().paths().borrow_mut().add_item(path.clone());
    icon.shapes().borrow_mut().add_item(shape);
    assert!(matches!(encode(&icon), Err(ViconError::TooManyShapes)));

    // A path with 256 points is rejected too.
    let icon = Icon::new();
    let mut long_path = VectorPath::new();
    for i in 0..256 {
        long_path.add_point(Point::new((i % 64) as f64, (i / 64) as f64));
    }
    icon.paths().borrow_mut().add_item(handle(long_path));
    assert!(matches!(encode(&icon), Err(ViconError::PathTooManyPoints)));
    Ok(())
}

#[test]
fn message_archive_round_trip() -> Result<(), Box<dyn Error>> {
    let icon = red_square_icon();
    let bytes = encode_message(&icon)?;
    assert_eq!(&bytes[0..4], b"IMSG");

    let decoded = decode(&bytes)?;
    assert_eq!(decoded.styles().borrow().count_items(), 1);
    assert_eq!(decoded.paths().borrow().count_items(), 1);
    assert_eq!(decoded.shapes().borrow().count_items(), 1);

    // The archived icon flattens to the same bytes as the original.
    assert_eq!(encode(&decoded)?, encode(&icon)?);
    Ok(())
}
