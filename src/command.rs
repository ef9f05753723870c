//! The editor's undoable command framework.
//!
//! Every edit to the data model goes through a [`Command`] performed on
//! the [`CommandStack`](stack::CommandStack). Commands carry their own
//! undo state; the stack owns history, the saved marker and the
//! time-windowed coalescing of rapid repeated edits.

pub mod compound;
pub mod container;
pub mod freeze;
pub mod stack;
pub mod style_commands;

pub use compound::CompoundCommand;
pub use container::{AddCommand, MoveCommand, RemoveCommand};
pub use freeze::FreezeTransformationCommand;
pub use stack::CommandStack;
pub use style_commands::{AssignStyleCommand, SetColorCommand, SetGradientCommand};

use std::any::Any;

use crate::error::ViconError;

/// Two commands of the same kind closer together than this window (in
/// microseconds) may coalesce into one undo step.
pub const COALESCE_WINDOW_US: u64 = 1_000_000;

/// An undoable edit.
///
/// `perform` and `undo` must be exact inverses; `redo` defaults to
/// `perform`. A command that fails `init_check` or `perform` is dropped
/// by the stack without entering history.
pub trait Command {
    /// Verifies the command's preconditions before the first `perform`.
    fn init_check(&self) -> Result<(), ViconError> {
        Ok(())
    }

    fn perform(&mut self) -> Result<(), ViconError>;

    fn undo(&mut self) -> Result<(), ViconError>;

    fn redo(&mut self) -> Result<(), ViconError> {
        self.perform()
    }

    /// A human-readable name for undo/redo menus.
    fn name(&self) -> String;

    /// Creation time in microseconds, used for the coalescing window.
    fn timestamp_us(&self) -> u64;

    /// Tries to absorb `next` (already performed) into this command so
    /// both edits undo as one step.
    ///
    /// Implementations may only return true when `next` is the same
    /// concrete kind, targets the same entity, and is newer by less than
    /// [`COALESCE_WINDOW_US`]; they must then take over `next`'s
    /// timestamp.
    fn combine_with_next(&mut self, _next: &dyn Command) -> bool {
        false
    }

    /// Downcast support for `combine_with_next` implementations.
    fn as_any(&self) -> &dyn Any;
}

/// The current wall-clock time in microseconds since the Unix epoch.
pub(crate) fn current_time_us() -> u64 {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    (nanos / 1_000).max(0) as u64
}
