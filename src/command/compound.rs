use std::any::Any;

use crate::command::{current_time_us, Command};
use crate::error::ViconError;

/// A command owning an ordered list of sub-commands.
///
/// `perform` runs them front to back, `undo` back to front. A failure in
/// the middle of the sequence is returned as-is without rolling back the
/// commands that already ran; callers are expected to build compounds
/// only from sub-commands whose preconditions have been checked.
pub struct CompoundCommand {
    commands: Vec<Box<dyn Command>>,
    name: String,
    timestamp: u64,
}

impl CompoundCommand {
    pub fn new(commands: Vec<Box<dyn Command>>, name: impl Into<String>) -> Self {
        Self { commands, name: name.into(), timestamp: current_time_us() }
    }
}

impl Command for CompoundCommand {
    fn init_check(&self) -> Result<(), ViconError> {
        if self.commands.is_empty() {
            return Err(ViconError::InvalidArgument(
                "compound command without sub-commands".to_string(),
            ));
        }
        Ok(())
    }

    fn perform(&mut self) -> Result<(), ViconError> {
        for command in &mut self.commands {
            command.perform()?;
        }
        Ok(())
    }

    fn undo(&mut self) -> Result<(), ViconError> {
        for command in self.commands.iter_mut().rev() {
            command.undo()?;
        }
        Ok(())
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn timestamp_us(&self) -> u64 {
        self.timestamp
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
