use std::any::Any;

use crate::command::{current_time_us, Command};
use crate::error::ViconError;
use crate::model::{Handle, SharedContainer};

/// Adds items to a container at a given index.
pub struct AddCommand<T> {
    container: SharedContainer<T>,
    items: Vec<Handle<T>>,
    index: usize,
    timestamp: u64,
}

impl<T> AddCommand<T> {
    pub fn new(container: &SharedContainer<T>, items: Vec<Handle<T>>, index: usize) -> Self {
        Self {
            container: container.clone(),
            items,
            index,
            timestamp: current_time_us(),
        }
    }

    /// Appends at the end of the container.
    pub fn append(container: &SharedContainer<T>, items: Vec<Handle<T>>) -> Self {
        let index = container.borrow().count_items();
        Self::new(container, items, index)
    }
}

impl<T: 'static> Command for AddCommand<T> {
    fn init_check(&self) -> Result<(), ViconError> {
        if self.items.is_empty() {
            return Err(ViconError::InvalidArgument("no items to add".to_string()));
        }
        Ok(())
    }

    fn perform(&mut self) -> Result<(), ViconError> {
        let mut container = self.container.borrow_mut();
        for (i, item) in self.items.iter().enumerate() {
            if !container.add_item_at(item.clone(), self.index + i) {
                // Roll back what was already inserted.
                for inserted in self.items.iter().take(i) {
                    container.remove_item(inserted);
                }
                return Err(ViconError::InvalidArgument(
                    "item is already in the container".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn undo(&mut self) -> Result<(), ViconError> {
        let mut container = self.container.borrow_mut();
        for item in &self.items {
            container.remove_item(item);
        }
        Ok(())
    }

    fn name(&self) -> String {
        if self.items.len() > 1 { "Add Items".to_string() } else { "Add Item".to_string() }
    }

    fn timestamp_us(&self) -> u64 {
        self.timestamp
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Removes items from a container, remembering their positions for undo.
pub struct RemoveCommand<T> {
    container: SharedContainer<T>,
    items: Vec<Handle<T>>,
    indices: Vec<usize>,
    timestamp: u64,
}

impl<T> RemoveCommand<T> {
    pub fn new(container: &SharedContainer<T>, items: Vec<Handle<T>>) -> Self {
        let indices = {
            let c = container.borrow();
            items.iter().map(|i| c.index_of(i).unwrap_or(usize::MAX)).collect()
        };
        Self {
            container: container.clone(),
            items,
            indices,
            timestamp: current_time_us(),
        }
    }
}

impl<T: 'static> Command for RemoveCommand<T> {
    fn init_check(&self) -> Result<(), ViconError> {
        if self.items.is_empty() || self.indices.iter().any(|i| *i == usize::MAX) {
            return Err(ViconError::InvalidArgument(
                "items are not in the container".to_string(),
            ));
        }
        Ok(())
    }

    fn perform(&mut self) -> Result<(), ViconError> {
        let mut container = self.container.borrow_mut();
        for item in &self.items {
            container.remove_item(item);
        }
        Ok(())
    }

    fn undo(&mut self) -> Result<(), ViconError> {
        // Re-insert in ascending index order so the remembered positions
        // come out right.
        let mut order: Vec<usize> = (0..self.items.len()).collect();
        order.sort_unstable_by_key(|i| self.indices[*i]);
        let mut container = self.container.borrow_mut();
        for i in order {
            container.add_item_at(self.items[i].clone(), self.indices[i]);
        }
        Ok(())
    }

    fn name(&self) -> String {
        if self.items.len() > 1 { "Remove Items".to_string() } else { "Remove Item".to_string() }
    }

    fn timestamp_us(&self) -> u64 {
        self.timestamp
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Moves items to a new position within their container.
pub struct MoveCommand<T> {
    container: SharedContainer<T>,
    items: Vec<Handle<T>>,
    indices: Vec<usize>,
    to_index: usize,
    timestamp: u64,
}

impl<T> MoveCommand<T> {
    pub fn new(container: &SharedContainer<T>, items: Vec<Handle<T>>, to_index: usize) -> Self {
        // Remember the original positions and compensate the target index
        // for items that will be removed in front of it.
        let (indices, adjusted) = {
            let c = container.borrow();
            let indices: Vec<usize> =
                items.iter().map(|i| c.index_of(i).unwrap_or(usize::MAX)).collect();
            let before = indices.iter().filter(|i| **i != usize::MAX && **i < to_index).count();
            (indices, to_index.saturating_sub(before))
        };
        Self {
            container: container.clone(),
            items,
            indices,
            to_index: adjusted,
            timestamp: current_time_us(),
        }
    }
}

impl<T: 'static> Command for MoveCommand<T> {
    fn init_check(&self) -> Result<(), ViconError> {
        if self.items.is_empty() || self.indices.iter().any(|i| *i == usize::MAX) {
            return Err(ViconError::InvalidArgument(
                "items are not in the container".to_string(),
            ));
        }
        // Reject no-op moves: a contiguous block moved onto itself.
        if self.indices[0] == self.to_index {
            let contiguous = self
                .indices
                .windows(2)
                .all(|pair| pair[1] == pair[0] + 1);
            if contiguous {
                return Err(ViconError::InvalidArgument(
                    "move does not change the container".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn perform(&mut self) -> Result<(), ViconError> {
        let mut container = self.container.borrow_mut();
        for item in &self.items {
            container.remove_item(item);
        }
        let mut index = self.to_index;
        for item in &self.items {
            container.add_item_at(item.clone(), index);
            index += 1;
        }
        Ok(())
    }

    fn undo(&mut self) -> Result<(), ViconError> {
        let mut container = self.container.borrow_mut();
        for item in &self.items {
            container.remove_item(item);
        }
        let mut order: Vec<usize> = (0..self.items.len()).collect();
        order.sort_unstable_by_key(|i| self.indices[*i]);
        for i in order {
            container.add_item_at(self.items[i].clone(), self.indices[i]);
        }
        Ok(())
    }

    fn name(&self) -> String {
        if self.items.len() > 1 { "Move Items".to_string() } else { "Move Item".to_string() }
    }

    fn timestamp_us(&self) -> u64 {
        self.timestamp
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
