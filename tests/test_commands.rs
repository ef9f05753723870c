use std::cell::{Cell, RefCell};
use std::error::Error;
use std::rc::Rc;

use vicon::prelude::*;

fn handle<T>(value: T) -> Handle<T> {
    Rc::new(RefCell::new(value))
}

fn red_square_icon() -> (Icon, Handle<Style>, Handle<Shape>) {
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

    let shape = handle(Shape::new(Some(style.clone())));
    shape.borrow().paths().borrow_mut().add_item(path);
    icon.shapes().borrow_mut().add_item(shape.clone());
    (icon, style, shape)
}

#[test]
fn undo_restores_the_exact_encoding() -> Result<(), Box<dyn Error>> {
    let (icon, style, _) = red_square_icon();
    let original = encode(&icon)?;

    let mut stack = CommandStack::new();
    stack.perform(Box::new(SetColorCommand::new(&style, Rgba::new(0, 0, 255, 255))))?;
    assert_eq!(style.borrow().color(), Rgba::new(0, 0, 255, 255));
    assert_ne!(encode(&icon)?, original);

    stack.undo()?;
    assert_eq!(encode(&icon)?, original, "undo must restore the byte-exact encoding");

    stack.redo()?;
    assert_eq!(style.borrow().color(), Rgba::new(0, 0, 255, 255));
    Ok(())
}

#[test]
fn color_edits_within_the_window_coalesce() -> Result<(), Box<dyn Error>> {
    let (_, style, _) = red_square_icon();
    let initial = style.borrow().color();

    let mut stack = CommandStack::new();
    stack.perform(Box::new(
        SetColorCommand::new(&style, Rgba::new(10, 20, 30, 255)).with_timestamp(0),
    ))?;
    stack.perform(Box::new(
        SetColorCommand::new(&style, Rgba::new(40, 50, 60, 255)).with_timestamp(500_000),
    ))?;

    assert_eq!(style.borrow().color(), Rgba::new(40, 50, 60, 255));

    // One undo step covers both edits.
    stack.undo()?;
    assert_eq!(style.borrow().color(), initial);
    assert!(!stack.can_undo());
    Ok(())
}

#[test]
fn color_edits_outside_the_window_do_not_coalesce() -> Result<(), Box<dyn Error>> {
    let (_, style, _) = red_square_icon();
    let initial = style.borrow().color();

    let mut stack = CommandStack::new();
    stack.perform(Box::new(
        SetColorCommand::new(&style, Rgba::new(10, 20, 30, 255)).with_timestamp(0),
    ))?;
    stack.perform(Box::new(
        SetColorCommand::new(&style, Rgba::new(40, 50, 60, 255)).with_timestamp(1_000_000),
    ))?;

    stack.undo()?;
    assert_eq!(style.borrow().color(), Rgba::new(10, 20, 30, 255));
    stack.undo()?;
    assert_eq!(style.borrow().color(), initial);
    Ok(())
}

#[test]
fn edits_to_different_styles_never_coalesce() -> Result<(), Box<dyn Error>> {
    let style_a = handle(Style::new(Rgba::BLACK));
    let style_b = handle(Style::new(Rgba::BLACK));

    let mut stack = CommandStack::new();
    stack.perform(Box::new(
        SetColorCommand::new(&style_a, Rgba::new(1, 1, 1, 255)).with_timestamp(0),
    ))?;
    stack.perform(Box::new(
        SetColorCommand::new(&style_b, Rgba::new(2, 2, 2, 255)).with_timestamp(100),
    ))?;

    stack.undo()?;
    stack.undo()?;
    assert_eq!(style_a.borrow().color(), Rgba::BLACK);
    assert_eq!(style_b.borrow().color(), Rgba::BLACK);
    Ok(())
}

#[test]
fn failing_init_check_drops_the_command() {
    let (_, style, _) = red_square_icon();
    let mut stack = CommandStack::new();
    // Setting the color the style already has is a no-op edit.
    let result = stack.perform(Box::new(SetColorCommand::new(&style, Rgba::new(255, 0, 0, 255))));
    assert!(result.is_err());
    assert!(!stack.can_undo());
}

#[test]
fn perform_clears_the_redo_stack() -> Result<(), Box<dyn Error>> {
    let (_, style, _) = red_square_icon();
    let mut stack = CommandStack::new();
    stack.perform(Box::new(SetColorCommand::new(&style, Rgba::new(1, 1, 1, 255))))?;
    stack.undo()?;
    assert!(stack.can_redo());
    stack.perform(Box::new(SetColorCommand::new(&style, Rgba::new(2, 2, 2, 255))))?;
    assert!(!stack.can_redo());
    Ok(())
}

#[test]
fn save_marker_tracks_the_top_of_the_stack() -> Result<(), Box<dyn Error>> {
    let (_, style, _) = red_square_icon();
    let mut stack = CommandStack::new();
    assert!(stack.is_saved(), "a fresh stack is saved");

    stack.perform(Box::new(SetColorCommand::new(&style, Rgba::new(1, 1, 1, 255))))?;
    assert!(!stack.is_saved());

    stack.save();
    assert!(stack.is_saved());

    stack.perform(Box::new(SetColorCommand::new(&style, Rgba::new(2, 2, 2, 255))))?;
    assert!(!stack.is_saved());

    stack.undo()?;
    assert!(stack.is_saved(), "undoing back to the saved step");

    stack.undo()?;
    assert!(!stack.is_saved());
    Ok(())
}

#[derive(Default)]
struct ChangeCounter {
    calls: Cell<usize>,
}

impl Observer for ChangeCounter {
    fn object_changed(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

#[test]
fn suspended_notifications_fire_once() {
    let style = handle(Style::new(Rgba::BLACK));
    let counter = Rc::new(ChangeCounter::default());
    let observer = observer_handle(&counter);
    style.borrow().add_observer(observer.clone());

    style.borrow().suspend_notifications(true);
    style.borrow_mut().set_color(Rgba::new(1, 0, 0, 255));
    style.borrow_mut().set_color(Rgba::new(2, 0, 0, 255));
    style.borrow_mut().set_color(Rgba::new(3, 0, 0, 255));
    assert_eq!(counter.calls.get(), 0);
    style.borrow().suspend_notifications(false);
    assert_eq!(counter.calls.get(), 1, "exactly one deferred notification");

    style.borrow_mut().set_color(Rgba::new(4, 0, 0, 255));
    assert_eq!(counter.calls.get(), 2);

    style.borrow().remove_observer(&observer);
}

#[test]
fn add_remove_move_commands_round_trip() -> Result<(), Box<dyn Error>> {
    let icon = Icon::new();
    let a = handle(Style::new(Rgba::new(1, 1, 1, 255)));
    let b = handle(Style::new(Rgba::new(2, 2, 2, 255)));
    let c = handle(Style::new(Rgba::new(3, 3, 3, 255)));
    let styles = icon.styles();

    let mut stack = CommandStack::new();
    stack.perform(Box::new(AddCommand::append(styles, vec![a.clone(), b.clone(), c.clone()])))?;
    assert_eq!(styles.borrow().count_items(), 3);

    // Move the first two styles to the end.
    stack.perform(Box::new(MoveCommand::new(styles, vec![a.clone(), b.clone()], 3)))?;
    assert_eq!(styles.borrow().index_of(&c), Some(0));
    assert_eq!(styles.borrow().index_of(&a), Some(1));
    assert_eq!(styles.borrow().index_of(&b), Some(2));

    stack.undo()?;
    assert_eq!(styles.borrow().index_of(&a), Some(0));
    assert_eq!(styles.borrow().index_of(&b), Some(1));
    assert_eq!(styles.borrow().index_of(&c), Some(2));

    // Remove the middle style and restore it.
    stack.perform(Box::new(RemoveCommand::new(styles, vec![b.clone()])))?;
    assert_eq!(styles.borrow().count_items(), 2);
    assert!(!styles.borrow().has_item(&b));

    stack.undo()?;
    assert_eq!(styles.borrow().index_of(&b), Some(1));

    // Undo the initial add as well.
    stack.undo()?;
    assert_eq!(styles.borrow().count_items(), 0);
    Ok(())
}

#[test]
fn compound_commands_undo_in_reverse_order() -> Result<(), Box<dyn Error>> {
    let (_, style, shape) = red_square_icon();
    let replacement = handle(Style::new(Rgba::new(9, 9, 9, 255)));

    let commands: Vec<Box<dyn Command>> = vec![
        Box::new(SetColorCommand::new(&style, Rgba::new(5, 5, 5, 255))),
        Box::new(AssignStyleCommand::new(&shape, &replacement)),
    ];
    let mut stack = CommandStack::new();
    stack.perform(Box::new(CompoundCommand::new(commands, "Edit Shape")))?;

    assert_eq!(style.borrow().color(), Rgba::new(5, 5, 5, 255));
    assert!(Rc::ptr_eq(shape.borrow().style().unwrap(), &replacement));

    stack.undo()?;
    assert_eq!(style.borrow().color(), Rgba::new(255, 0, 0, 255));
    assert!(Rc::ptr_eq(shape.borrow().style().unwrap(), &style));

    // An empty compound is rejected up front.
    assert!(stack.perform(Box::new(CompoundCommand::new(Vec::new(), "Nothing"))).is_err());
    Ok(())
}

#[test]
fn set_gradient_command_toggles() -> Result<(), Box<dyn Error>> {
    let (_, style, _) = red_square_icon();
    let mut stack = CommandStack::new();

    let gradient = Gradient::new();
    stack.perform(Box::new(SetGradientCommand::new(&style, Some(gradient.clone()))))?;
    assert!(style.borrow().gradient().is_some());

    stack.undo()?;
    assert!(style.borrow().gradient().is_none());

    stack.redo()?;
    assert_eq!(style.borrow().gradient(), Some(&gradient));
    Ok(())
}

#[test]
fn freeze_transformation_bakes_into_paths() -> Result<(), Box<dyn Error>> {
    let (icon, _, shape) = red_square_icon();
    shape.borrow_mut().set_transform(Transform::translation(10.0, 5.0));

    let original_anchor = {
        let shapes = shape.borrow();
        let paths = shapes.paths().borrow();
        let p = paths.item_at(0).unwrap().borrow();
        p.point_at(0).unwrap().point
    };

    let mut stack = CommandStack::new();
    stack.perform(Box::new(FreezeTransformationCommand::new(
        vec![shape.clone()],
        icon.shapes(),
    )))?;

    // The transform moved into the path and the shape is back to
    // identity.
    assert!(shape.borrow().transform().is_identity());
    {
        let shapes = shape.borrow();
        let paths = shapes.paths().borrow();
        let p = paths.item_at(0).unwrap().borrow();
        let moved = p.point_at(0).unwrap().point;
        assert!((moved.x - (original_anchor.x + 10.0)).abs() < 1e-9);
        assert!((moved.y - (original_anchor.y + 5.0)).abs() < 1e-9);
    }

    stack.undo()?;
    assert_eq!(*shape.borrow().transform(), Transform::translation(10.0, 5.0));
    {
        let shapes = shape.borrow();
        let paths = shapes.paths().borrow();
        let p = paths.item_at(0).unwrap().borrow();
        let restored = p.point_at(0).unwrap().point;
        assert!((restored.x - original_anchor.x).abs() < 1e-9);
        assert!((restored.y - original_anchor.y).abs() < 1e-9);
    }
    Ok(())
}

#[test]
fn freeze_leaves_shared_paths_alone() -> Result<(), Box<dyn Error>> {
    let (icon, style, shape) = red_square_icon();

    // A second shape referencing the same path.
    let shared_path = icon.paths().borrow().item_at(0).unwrap().clone();
    let other = handle(Shape::new(Some(style.clone())));
    other.borrow().paths().borrow_mut().add_item(shared_path.clone());
    icon.shapes().borrow_mut().add_item(other.clone());

    shape.borrow_mut().set_transform(Transform::translation(10.0, 5.0));
    let original_anchor = shared_path.borrow().point_at(0).unwrap().point;

    let mut stack = CommandStack::new();
    stack.perform(Box::new(FreezeTransformationCommand::new(
        vec![shape.clone()],
        icon.shapes(),
    )))?;

    // The command succeeds, resets the shape, but the shared path must
    // not move.
    assert!(shape.borrow().transform().is_identity());
    let anchor = shared_path.borrow().point_at(0).unwrap().point;
    assert_eq!(anchor, original_anchor);
    Ok(())
}
