use std::any::Any;
use std::rc::Rc;

use crate::command::{current_time_us, Command, COALESCE_WINDOW_US};
use crate::error::ViconError;
use crate::model::{Gradient, Handle, Rgba, Shape, Style};

/// Assigns a different style to a shape.
pub struct AssignStyleCommand {
    shape: Handle<Shape>,
    style: Handle<Style>,
    previous: Option<Handle<Style>>,
    timestamp: u64,
}

impl AssignStyleCommand {
    pub fn new(shape: &Handle<Shape>, style: &Handle<Style>) -> Self {
        Self {
            shape: shape.clone(),
            style: style.clone(),
            previous: None,
            timestamp: current_time_us(),
        }
    }
}

impl Command for AssignStyleCommand {
    fn init_check(&self) -> Result<(), ViconError> {
        if let Some(current) = self.shape.borrow().style() {
            if Rc::ptr_eq(current, &self.style) {
                return Err(ViconError::InvalidArgument(
                    "style is already assigned".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn perform(&mut self) -> Result<(), ViconError> {
        self.previous = self.shape.borrow().style().cloned();
        self.shape.borrow_mut().set_style(Some(self.style.clone()));
        Ok(())
    }

    fn undo(&mut self) -> Result<(), ViconError> {
        self.shape.borrow_mut().set_style(self.previous.clone());
        Ok(())
    }

    fn name(&self) -> String {
        "Assign Style".to_string()
    }

    fn timestamp_us(&self) -> u64 {
        self.timestamp
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Changes a style's solid color.
///
/// `perform` swaps the stored color with the style's current one, so the
/// same swap undoes the edit. Rapid successive color edits on the same
/// style coalesce into one undo step.
pub struct SetColorCommand {
    style: Handle<Style>,
    color: Rgba,
    timestamp: u64,
}

impl SetColorCommand {
    pub fn new(style: &Handle<Style>, color: Rgba) -> Self {
        Self { style: style.clone(), color, timestamp: current_time_us() }
    }

    /// Overrides the creation timestamp; used to script coalescing
    /// behavior deterministically.
    pub fn with_timestamp(mut self, timestamp_us: u64) -> Self {
        self.timestamp = timestamp_us;
        self
    }
}

impl Command for SetColorCommand {
    fn init_check(&self) -> Result<(), ViconError> {
        if self.style.borrow().color() == self.color {
            return Err(ViconError::InvalidArgument(
                "style already has this color".to_string(),
            ));
        }
        Ok(())
    }

    fn perform(&mut self) -> Result<(), ViconError> {
        let previous = self.style.borrow().color();
        self.style.borrow_mut().set_color(self.color);
        self.color = previous;
        Ok(())
    }

    fn undo(&mut self) -> Result<(), ViconError> {
        self.perform()
    }

    fn name(&self) -> String {
        "Change Color".to_string()
    }

    fn timestamp_us(&self) -> u64 {
        self.timestamp
    }

    fn combine_with_next(&mut self, next: &dyn Command) -> bool {
        let Some(next) = next.as_any().downcast_ref::<SetColorCommand>() else {
            return false;
        };
        if !Rc::ptr_eq(&self.style, &next.style) {
            return false;
        }
        if next.timestamp.saturating_sub(self.timestamp) >= COALESCE_WINDOW_US {
            return false;
        }
        // `next` has already been performed; keeping our remembered color
        // makes one undo step span both edits.
        self.timestamp = next.timestamp;
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Sets, replaces or removes a style's gradient.
///
/// Like [`SetColorCommand`] this swaps the stored gradient with the
/// style's current one on every `perform`, and rapid edits to the same
/// style coalesce.
pub struct SetGradientCommand {
    style: Handle<Style>,
    gradient: Option<Gradient>,
    timestamp: u64,
}

impl SetGradientCommand {
    pub fn new(style: &Handle<Style>, gradient: Option<Gradient>) -> Self {
        Self { style: style.clone(), gradient, timestamp: current_time_us() }
    }

    pub fn with_timestamp(mut self, timestamp_us: u64) -> Self {
        self.timestamp = timestamp_us;
        self
    }
}

impl Command for SetGradientCommand {
    fn init_check(&self) -> Result<(), ViconError> {
        let style = self.style.borrow();
        match (&self.gradient, style.gradient()) {
            (Some(new), Some(current)) if new == current => Err(ViconError::InvalidArgument(
                "style already has this gradient".to_string(),
            )),
            (None, None) => Err(ViconError::InvalidArgument(
                "style has no gradient to remove".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn perform(&mut self) -> Result<(), ViconError> {
        let previous = self.style.borrow().gradient().cloned();
        self.style.borrow_mut().set_gradient(self.gradient.take());
        self.gradient = previous;
        Ok(())
    }

    fn undo(&mut self) -> Result<(), ViconError> {
        self.perform()
    }

    fn name(&self) -> String {
        "Edit Gradient".to_string()
    }

    fn timestamp_us(&self) -> u64 {
        self.timestamp
    }

    fn combine_with_next(&mut self, next: &dyn Command) -> bool {
        let Some(next) = next.as_any().downcast_ref::<SetGradientCommand>() else {
            return false;
        };
        if !Rc::ptr_eq(&self.style, &next.style) {
            return false;
        }
        if next.timestamp.saturating_sub(self.timestamp) >= COALESCE_WINDOW_US {
            return false;
        }
        self.timestamp = next.timestamp;
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
