use crate::command::Command;
use crate::error::ViconError;
use crate::observe::{Observable, ObserverList};

struct Entry {
    /// Monotonic identity of the recorded step; survives coalescing, so
    /// the saved marker stays meaningful.
    serial: u64,
    command: Box<dyn Command>,
}

/// The two-stack undo/redo engine.
///
/// Performed commands are pushed on the undo stack; undoing moves them to
/// the redo stack and vice versa. Saving records the serial of the step
/// currently on top, and [`is_saved`](CommandStack::is_saved) compares
/// against it. Observers are notified after every history change.
pub struct CommandStack {
    undo_stack: Vec<Entry>,
    redo_stack: Vec<Entry>,
    saved: Option<u64>,
    next_serial: u64,
    observers: ObserverList,
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandStack {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            saved: None,
            next_serial: 0,
            observers: ObserverList::new(),
        }
    }

    /// Runs a command and records it as the newest undo step.
    ///
    /// A command failing its `init_check` or `perform` is dropped and the
    /// error returned; history is unchanged. After a successful run the
    /// top of the undo stack may absorb the command instead (coalescing);
    /// either way the redo stack is cleared.
    pub fn perform(&mut self, mut command: Box<dyn Command>) -> Result<(), ViconError> {
        command.init_check()?;
        command.perform()?;

        let combined = match self.undo_stack.last_mut() {
            Some(top) => top.command.combine_with_next(command.as_ref()),
            None => false,
        };
        if !combined {
            let serial = self.next_serial;
            self.next_serial += 1;
            self.undo_stack.push(Entry { serial, command });
        }

        self.redo_stack.clear();
        self.notify();
        Ok(())
    }

    /// Undoes the newest recorded step.
    pub fn undo(&mut self) -> Result<(), ViconError> {
        let mut entry = self.undo_stack.pop().ok_or_else(|| {
            ViconError::InvalidArgument("nothing to undo".to_string())
        })?;
        let result = entry.command.undo();
        match result {
            Ok(()) => self.redo_stack.push(entry),
            // A failing undo leaves the step in place.
            Err(_) => self.undo_stack.push(entry),
        }
        self.notify();
        result
    }

    /// Redoes the newest undone step.
    pub fn redo(&mut self) -> Result<(), ViconError> {
        let mut entry = self.redo_stack.pop().ok_or_else(|| {
            ViconError::InvalidArgument("nothing to redo".to_string())
        })?;
        let result = entry.command.redo();
        match result {
            Ok(()) => self.undo_stack.push(entry),
            Err(_) => self.redo_stack.push(entry),
        }
        self.notify();
        result
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// The name of the step `undo` would revert.
    pub fn undo_name(&self) -> Option<String> {
        self.undo_stack.last().map(|e| e.command.name())
    }

    pub fn redo_name(&self) -> Option<String> {
        self.redo_stack.last().map(|e| e.command.name())
    }

    /// Marks the current state as saved.
    pub fn save(&mut self) {
        self.saved = self.top_serial();
        self.notify();
    }

    /// Whether the document state matches the last `save`.
    pub fn is_saved(&self) -> bool {
        self.top_serial() == self.saved
    }

    /// Drops all history and the saved marker.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.saved = None;
        self.notify();
    }

    fn top_serial(&self) -> Option<u64> {
        self.undo_stack.last().map(|e| e.serial)
    }
}

impl Observable for CommandStack {
    fn observer_list(&self) -> &ObserverList {
        &self.observers
    }
}
