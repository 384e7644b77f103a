//! Layers: fixed-priority bands of items
//!
//! A [`Layer`] holds its items front to back. Its order is authoritative for
//! every window of those items; the manager concatenates all layers, front
//! band first, to get the global stack.

pub mod item;
pub mod level;

use std::collections::VecDeque;

pub use item::{Item, ItemId, ItemMut};
pub use level::{LayerLevel, ParseLayerError};

use crate::error::Result;
use crate::manager::LayerManager;
use crate::restack::Restacker;

/// Whether a layer's on-screen order can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StackState {
    /// Screen order matches the layer's sequence; incremental moves are safe.
    #[default]
    Clean,
    /// Screen order may differ (a temp raise, a deferred or failed request);
    /// the next restack of this layer must be a full one.
    Dirty,
}

/// One band of the stack.
#[derive(Debug, Clone)]
pub struct Layer {
    index: usize,
    /// Front-most item first
    items: VecDeque<ItemId>,
    state: StackState,
}

impl Layer {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            items: VecDeque::new(),
            state: StackState::Clean,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Items front to back.
    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn front(&self) -> Option<ItemId> {
        self.items.front().copied()
    }

    /// The back-most item, used as the anchor by the layer below.
    pub fn lowest_item(&self) -> Option<ItemId> {
        self.items.back().copied()
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|&item| item == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, position: usize) -> Option<ItemId> {
        self.items.get(position).copied()
    }

    pub fn state(&self) -> StackState {
        self.state
    }

    pub fn needs_restack(&self) -> bool {
        self.state == StackState::Dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.state = StackState::Dirty;
    }

    pub(crate) fn mark_clean(&mut self) {
        self.state = StackState::Clean;
    }

    pub(crate) fn push_front(&mut self, id: ItemId) {
        self.items.push_front(id);
    }

    pub(crate) fn push_back(&mut self, id: ItemId) {
        self.items.push_back(id);
    }

    /// Erases `id`, returning whether it was present.
    pub(crate) fn remove(&mut self, id: ItemId) -> bool {
        match self.position(id) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }
}

/// Mutable view of one layer, carrying the manager it lives in.
///
/// Obtained from [`LayerManager::layer_mut`]. Every operation here may issue a
/// restack request and returns the restacker's error if that request fails.
pub struct LayerMut<'a, R: Restacker> {
    pub(crate) manager: &'a mut LayerManager<R>,
    pub(crate) index: usize,
}

impl<'a, R: Restacker> LayerMut<'a, R> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn layer(&self) -> &Layer {
        &self.manager.layers[self.index]
    }

    /// Inserts a detached item at the front of this layer.
    pub fn insert(&mut self, id: ItemId) -> Result<()> {
        self.manager.layer_insert(self.index, id)
    }

    /// Erases an item from this layer without restacking.
    pub fn remove(&mut self, id: ItemId) -> bool {
        self.manager.layer_remove(self.index, id)
    }

    /// Brings an item to the front of this layer.
    pub fn raise(&mut self, id: ItemId) -> Result<()> {
        self.manager.layer_raise(self.index, id)
    }

    /// Sends an item to the back of this layer.
    pub fn lower(&mut self, id: ItemId) -> Result<()> {
        self.manager.layer_lower(self.index, id)
    }

    /// Shows an item in front of this layer without changing the layer's order.
    pub fn temp_raise(&mut self, id: ItemId) -> Result<()> {
        self.manager.layer_temp_raise(self.index, id)
    }

    /// Re-anchors one item after its window set changed.
    pub fn align(&mut self, id: ItemId) -> Result<()> {
        self.manager.layer_align(self.index, id)
    }

    /// Issues one full request for this layer's windows.
    pub fn restack(&mut self) -> Result<()> {
        self.manager.restack_layer(self.index)
    }

    pub fn lowest_item(&self) -> Option<ItemId> {
        self.layer().lowest_item()
    }
}
