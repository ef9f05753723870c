use std::any::Any;

use log::warn;

use crate::command::{current_time_us, Command};
use crate::error::ViconError;
use crate::geom::Transform;
use crate::model::{Handle, Shape, SharedContainer, VectorPath};
use crate::observe::Observable;

/// Bakes shapes' transforms into their path vertices and gradient
/// transforms, then resets the shapes' transforms to identity.
///
/// A path that is assigned to more than one shape is left untouched (with
/// a warning): transforming it would move the other shapes too. The
/// command still succeeds for the paths it could transform and undoes
/// exactly what it applied.
pub struct FreezeTransformationCommand {
    shapes: Vec<Handle<Shape>>,
    /// All shapes of the icon, used to count how many reference a path.
    all_shapes: SharedContainer<Shape>,
    originals: Vec<Transform>,
    timestamp: u64,
}

impl FreezeTransformationCommand {
    pub fn new(shapes: Vec<Handle<Shape>>, all_shapes: &SharedContainer<Shape>) -> Self {
        let originals = shapes.iter().map(|s| *s.borrow().transform()).collect();
        Self {
            shapes,
            all_shapes: all_shapes.clone(),
            originals,
            timestamp: current_time_us(),
        }
    }

    fn reference_count(&self, path: &Handle<VectorPath>) -> usize {
        self.all_shapes
            .borrow()
            .iter()
            .filter(|shape| shape.borrow().paths().borrow().has_item(path))
            .count()
    }

    fn apply_transformation(&self, shape: &Handle<Shape>, transform: &Transform) {
        let (paths, style) = {
            let shape = shape.borrow();
            (shape.paths().clone(), shape.style().cloned())
        };

        for path in paths.borrow().iter() {
            if self.reference_count(path) == 1 {
                path.borrow_mut().apply_transform(transform);
            } else {
                warn!("not transferring transformation onto a path assigned to other shapes");
            }
        }

        if let Some(style) = style {
            let mut style = style.borrow_mut();
            if let Some(gradient) = style.gradient_mut() {
                gradient.transform_mut().multiply(transform);
                gradient.notify();
            }
        }
    }
}

impl Command for FreezeTransformationCommand {
    fn init_check(&self) -> Result<(), ViconError> {
        if self.shapes.iter().all(|s| s.borrow().transform().is_identity()) {
            return Err(ViconError::InvalidArgument(
                "no shape has a transformation to freeze".to_string(),
            ));
        }
        Ok(())
    }

    fn perform(&mut self) -> Result<(), ViconError> {
        for shape in &self.shapes {
            let transform = *shape.borrow().transform();
            if transform.is_identity() {
                continue;
            }
            self.apply_transformation(shape, &transform);
            shape.borrow_mut().reset_transform();
        }
        Ok(())
    }

    fn undo(&mut self) -> Result<(), ViconError> {
        for (shape, original) in self.shapes.iter().zip(self.originals.iter()) {
            shape.borrow_mut().set_transform(*original);

            if !original.is_valid() || original.is_identity() {
                continue;
            }
            let inverse = original.inverted();
            self.apply_transformation(shape, &inverse);
        }
        Ok(())
    }

    fn name(&self) -> String {
        if self.shapes.len() > 1 { "Freeze Shapes".to_string() } else { "Freeze Shape".to_string() }
    }

    fn timestamp_us(&self) -> u64 {
        self.timestamp
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}