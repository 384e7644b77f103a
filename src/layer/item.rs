//! Stacking items
//!
//! An [`Item`] is a group of windows that always move together in the stack
//! (a frame and its client, for instance). Items live in the manager's arena
//! and are addressed by generational [`ItemId`]s; the item remembers the index
//! of its layer instead of pointing at it.

use log::warn;
use std::fmt;

use crate::error::Result;
use crate::handle::WindowHandle;
use crate::manager::LayerManager;
use crate::restack::Restacker;

/// Generational handle to an item in a [`LayerManager`].
///
/// Ids of destroyed items never resolve again, even when their slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}v{}", self.index, self.generation)
    }
}

/// A group of windows stacked as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Front-most window first
    windows: Vec<WindowHandle>,
    layer: Option<usize>,
}

impl Item {
    pub(crate) fn new(first: WindowHandle) -> Self {
        Self {
            windows: vec![first],
            layer: None,
        }
    }

    /// The item's windows, front-most first.
    pub fn windows(&self) -> &[WindowHandle] {
        &self.windows
    }

    pub fn num_windows(&self) -> usize {
        self.windows.len()
    }

    /// Index of the layer holding this item, `None` while detached.
    pub fn layer(&self) -> Option<usize> {
        self.layer
    }

    pub fn contains(&self, window: WindowHandle) -> bool {
        self.windows.contains(&window)
    }

    /// The window other items anchor to when stacking directly below this one.
    pub fn anchor(&self) -> Option<WindowHandle> {
        self.windows.iter().rev().copied().find(|w| !w.is_none())
    }

    pub(crate) fn set_layer_index(&mut self, layer: Option<usize>) {
        self.layer = layer;
    }

    pub(crate) fn push_window(&mut self, window: WindowHandle) {
        self.windows.push(window);
    }

    /// Removes `window`, refusing to leave the item empty.
    pub(crate) fn remove_window(&mut self, window: WindowHandle) -> bool {
        let Some(pos) = self.windows.iter().position(|&w| w == window) else {
            return false;
        };
        if self.windows.len() == 1 {
            warn!("Refusing to remove {}, the last window of its item", window);
            return false;
        }
        self.windows.remove(pos);
        true
    }
}

/// Mutable view of one item, carrying the manager it lives in.
///
/// Obtained from [`LayerManager::item_mut`].
pub struct ItemMut<'a, R: Restacker> {
    pub(crate) manager: &'a mut LayerManager<R>,
    pub(crate) id: ItemId,
}

impl<'a, R: Restacker> ItemMut<'a, R> {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn windows(&self) -> &[WindowHandle] {
        self.manager.item(self.id).map(Item::windows).unwrap_or(&[])
    }

    pub fn layer(&self) -> Option<usize> {
        self.manager.item(self.id).and_then(Item::layer)
    }

    /// Appends a window below the item's existing windows and re-anchors the item.
    ///
    /// Adding a window that is already part of the item is a caller bug.
    pub fn add_window(&mut self, window: WindowHandle) -> Result<()> {
        self.manager.item_push_window(self.id, window)
    }

    /// Removes a window from the item without restacking anything.
    ///
    /// Returns `false` if the window was not part of the item or is its last one.
    pub fn remove_window(&mut self, window: WindowHandle) -> bool {
        self.manager.item_remove_window(self.id, window)
    }

    /// Moves `window` to the end of the item's own window list.
    pub fn bring_to_top(&mut self, window: WindowHandle) -> Result<()> {
        if !self.manager.item_remove_window(self.id, window) {
            return Ok(());
        }
        self.manager.item_push_window(self.id, window)
    }

    /// Moves the item to the front of layer `index`, unless it is already there.
    pub fn set_layer(&mut self, index: usize) -> Result<()> {
        self.manager.set_item_layer(self.id, index)
    }

    pub fn raise(&mut self) -> Result<()> {
        match self.layer() {
            Some(layer) => self.manager.layer_raise(layer, self.id),
            None => Ok(()),
        }
    }

    pub fn lower(&mut self) -> Result<()> {
        match self.layer() {
            Some(layer) => self.manager.layer_lower(layer, self.id),
            None => Ok(()),
        }
    }

    /// Raises the item on screen only; the next restack puts it back.
    pub fn temp_raise(&mut self) -> Result<()> {
        match self.layer() {
            Some(layer) => self.manager.layer_temp_raise(layer, self.id),
            None => Ok(()),
        }
    }

    pub fn move_to_layer(&mut self, index: usize) -> Result<()> {
        self.manager.move_to_layer(self.id, index)
    }

    /// Moves the item one whole band toward the front.
    pub fn raise_layer(&mut self) -> Result<()> {
        self.manager.raise_layer(self.id)
    }

    /// Moves the item one whole band toward the back.
    pub fn lower_layer(&mut self) -> Result<()> {
        self.manager.lower_layer(self.id)
    }
}
