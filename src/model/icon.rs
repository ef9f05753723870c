use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use crate::model::container::{Container, SharedContainer};
use crate::model::path::VectorPath;
use crate::model::shape::Shape;
use crate::model::style::Style;
use crate::observe::{Observable, ObserverList};

/// The root aggregate of one renderable figure.
///
/// An icon owns three ordered containers: styles, paths and shapes. Shapes
/// reference styles and paths inside the same icon only. The containers
/// are shared handles so editor commands can address them directly.
pub struct Icon {
    // Field order is teardown order: shapes drop before the paths and
    // styles they reference.
    shapes: SharedContainer<Shape>,
    paths: SharedContainer<VectorPath>,
    styles: SharedContainer<Style>,
    observers: ObserverList,
}

impl Default for Icon {
    fn default() -> Self {
        Self::new()
    }
}

impl Icon {
    /// Creates an empty icon.
    pub fn new() -> Self {
        Self {
            shapes: Container::new_shared(),
            paths: Container::new_shared(),
            styles: Container::new_shared(),
            observers: ObserverList::new(),
        }
    }

    pub fn styles(&self) -> &SharedContainer<Style> {
        &self.styles
    }

    pub fn paths(&self) -> &SharedContainer<VectorPath> {
        &self.paths
    }

    pub fn shapes(&self) -> &SharedContainer<Shape> {
        &self.shapes
    }

    /// Removes all entities, shapes first.
    pub fn make_empty(&self) {
        self.shapes.borrow_mut().make_empty();
        self.paths.borrow_mut().make_empty();
        self.styles.borrow_mut().make_empty();
        self.notify();
    }

    /// Deep-clones the icon.
    ///
    /// Every style, path and shape is cloned, and the clones' shape
    /// references are remapped onto the cloned styles and paths by index.
    pub fn duplicate(&self) -> Icon {
        let clone = Icon::new();

        let styles = self.styles.borrow();
        for style in styles.iter() {
            let copy = Rc::new(RefCell::new(style.borrow().clone()));
            clone.styles.borrow_mut().add_item(copy);
        }

        let paths = self.paths.borrow();
        for path in paths.iter() {
            let copy = Rc::new(RefCell::new(path.borrow().clone()));
            clone.paths.borrow_mut().add_item(copy);
        }

        for shape in self.shapes.borrow().iter() {
            let shape = shape.borrow();

            // Remap the style reference onto the cloned container.
            let style = shape.style().and_then(|style| {
                let index = styles.index_of(style)?;
                clone.styles.borrow().item_at(index).cloned()
            });

            let copy = Rc::new(RefCell::new(Shape::new(style)));
            {
                let mut target = copy.borrow_mut();
                target.set_transform(*shape.transform());
                target.set_hinting(shape.hinting());
                target.set_min_visibility_scale(shape.min_visibility_scale());
                target.set_max_visibility_scale(shape.max_visibility_scale());
                for transformer in shape.transformers() {
                    target.add_transformer(transformer.clone());
                }
                for path in shape.paths().borrow().iter() {
                    match paths.index_of(path) {
                        Some(index) => {
                            if let Some(local) = clone.paths.borrow().item_at(index).cloned() {
                                target.paths().borrow_mut().add_item(local);
                            }
                        }
                        None => {
                            warn!("failed to match remote and local paths while cloning icon");
                        }
                    }
                }
            }
            clone.shapes.borrow_mut().add_item(copy);
        }

        clone
    }
}

impl Observable for Icon {
    fn observer_list(&self) -> &ObserverList {
        &self.observers
    }
}
