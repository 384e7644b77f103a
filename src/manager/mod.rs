//! Multi-layer stacking manager
//!
//! [`LayerManager`] owns a fixed array of layers (layer 0 is the frontmost
//! band), the arena of items stacked in them, the host's [`Restacker`] and the
//! [`StackingStrategy`] chosen at construction.
//!
//! The global stack is layer 0's items, then layer 1's, and so on, each item
//! contributing its windows in order. Mutations keep that order in memory and
//! push the smallest request that makes the screen agree: an item's own
//! windows placed directly below one anchor window. Only [`LayerManager::restack`]
//! sends the whole list.

use log::{debug, trace, warn};

use crate::config::StackingConfig;
use crate::error::Result;
use crate::handle::{extend_live, WindowHandle};
use crate::layer::{Item, ItemId, ItemMut, Layer, LayerMut};
use crate::restack::Restacker;
use crate::strategy::{Outcome, StackingMode, StackingStrategy};

#[derive(Debug)]
struct Slot {
    generation: u32,
    item: Option<Item>,
}

/// Owns every layer and item and keeps the screen's stacking order in sync.
///
/// # Examples
///
/// ```
/// use strata::{LayerManager, VirtualScreen, WindowHandle};
///
/// let mut manager = LayerManager::new(3, VirtualScreen::new());
/// let back = manager.create_item(WindowHandle::new(1), 2).unwrap();
/// let front = manager.create_item(WindowHandle::new(2), 1).unwrap();
///
/// assert_eq!(
///     manager.stacking_order(),
///     vec![WindowHandle::new(2), WindowHandle::new(1)]
/// );
///
/// manager.move_to_layer(back, 0).unwrap();
/// assert_eq!(manager.item_above(front), Some(back));
/// ```
#[derive(Debug)]
pub struct LayerManager<R: Restacker> {
    pub(crate) layers: Vec<Layer>,
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    restacker: R,
    strategy: Box<dyn StackingStrategy>,
    lock_depth: usize,
}

impl<R: Restacker> LayerManager<R> {
    /// Creates a manager with `layer_count` layers that restacks eagerly.
    ///
    /// A layer count of zero is raised to one.
    pub fn new(layer_count: usize, restacker: R) -> Self {
        Self::with_mode(layer_count, StackingMode::Eager, restacker)
    }

    pub fn with_mode(layer_count: usize, mode: StackingMode, restacker: R) -> Self {
        Self::with_strategy(layer_count, mode.strategy(), restacker)
    }

    pub fn with_strategy(
        layer_count: usize,
        strategy: Box<dyn StackingStrategy>,
        restacker: R,
    ) -> Self {
        let layer_count = layer_count.max(1);
        debug!(
            "Creating layer manager with {} layers ({} mode)",
            layer_count,
            strategy.mode()
        );
        Self {
            layers: (0..layer_count).map(Layer::new).collect(),
            slots: Vec::new(),
            free_list: Vec::new(),
            restacker,
            strategy,
            lock_depth: 0,
        }
    }

    pub fn from_config(config: &StackingConfig, restacker: R) -> Self {
        Self::with_mode(config.layers, config.mode, restacker)
    }

    pub fn mode(&self) -> StackingMode {
        self.strategy.mode()
    }

    pub fn restacker(&self) -> &R {
        &self.restacker
    }

    pub fn restacker_mut(&mut self) -> &mut R {
        &mut self.restacker
    }

    pub fn into_restacker(self) -> R {
        self.restacker
    }

    // -- Layers --

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<LayerMut<'_, R>> {
        if index < self.layers.len() {
            Some(LayerMut {
                manager: self,
                index,
            })
        } else {
            None
        }
    }

    fn clamp_layer(&self, index: usize) -> usize {
        index.min(self.layers.len() - 1)
    }

    // -- Items --

    /// Registers an item holding `first` without placing it in any layer.
    ///
    /// Place it with [`add_to_top`](Self::add_to_top) or
    /// [`move_to_layer`](Self::move_to_layer).
    pub fn create_detached_item(&mut self, first: WindowHandle) -> ItemId {
        let item = Some(Item::new(first));
        match self.free_list.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation = slot.generation.wrapping_add(1);
                slot.item = item;
                ItemId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    item,
                });
                ItemId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Registers an item holding `first` and inserts it at the front of `layer`
    /// (clamped to the last layer).
    ///
    /// If the insertion request fails the item is discarded again and the error
    /// returned.
    pub fn create_item(&mut self, first: WindowHandle, layer: usize) -> Result<ItemId> {
        let id = self.create_detached_item(first);
        let layer = self.clamp_layer(layer);
        match self.layer_insert(layer, id) {
            Ok(()) => Ok(id),
            Err(e) => {
                self.destroy_item(id);
                Err(e)
            }
        }
    }

    /// Removes an item from its layer and frees its id.
    pub fn destroy_item(&mut self, id: ItemId) -> Option<Item> {
        if let Some(layer) = self.layer_of(id) {
            self.layer_remove(layer, id);
        }
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let mut item = slot.item.take()?;
        self.free_list.push(id.index);
        item.set_layer_index(None);
        trace!("Destroyed {}", id);
        Some(item)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.item.as_ref())
    }

    fn item_entry(&mut self, id: ItemId) -> Option<&mut Item> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.item.as_mut())
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<ItemMut<'_, R>> {
        if self.item(id).is_some() {
            Some(ItemMut { manager: self, id })
        } else {
            None
        }
    }

    pub fn contains_item(&self, id: ItemId) -> bool {
        self.item(id).is_some()
    }

    /// Number of live items, placed or detached.
    pub fn item_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.item.is_some()).count()
    }

    pub fn layer_of(&self, id: ItemId) -> Option<usize> {
        self.item(id).and_then(Item::layer)
    }

    fn live_handles(&self, id: ItemId) -> Vec<WindowHandle> {
        let mut handles = Vec::new();
        if let Some(item) = self.item(id) {
            extend_live(&mut handles, item.windows());
        }
        handles
    }

    fn anchor_of(&self, id: ItemId) -> Option<WindowHandle> {
        self.item(id).and_then(Item::anchor)
    }

    /// The window to stack directly below when placing behind `above`.
    ///
    /// Items holding only null handles are skipped, so the anchor is the
    /// back-most live window of the nearest item at or in front of `above`.
    fn anchor_from(&self, mut above: Option<ItemId>) -> Option<WindowHandle> {
        while let Some(id) = above {
            if let Some(anchor) = self.anchor_of(id) {
                return Some(anchor);
            }
            above = self.item_above(id);
        }
        None
    }

    /// Live windows of one layer, with `first`'s windows moved ahead of the rest.
    fn layer_handles(&self, index: usize, first: Option<ItemId>) -> Vec<WindowHandle> {
        let mut handles = Vec::new();
        if let Some(first) = first {
            handles = self.live_handles(first);
        }
        for id in self.layers[index].items() {
            if Some(id) == first {
                continue;
            }
            if let Some(item) = self.item(id) {
                extend_live(&mut handles, item.windows());
            }
        }
        handles
    }

    pub(crate) fn item_push_window(&mut self, id: ItemId, window: WindowHandle) -> Result<()> {
        let Some(item) = self.item_entry(id) else {
            warn!("add_window on unknown {}", id);
            return Ok(());
        };
        item.push_window(window);
        match item.layer() {
            Some(layer) => self.layer_align(layer, id),
            None => Ok(()),
        }
    }

    pub(crate) fn item_remove_window(&mut self, id: ItemId, window: WindowHandle) -> bool {
        match self.item_entry(id) {
            Some(item) => item.remove_window(window),
            None => {
                warn!("remove_window on unknown {}", id);
                false
            }
        }
    }

    /// Moves an item to the front of layer `index` unless it already lives there.
    pub(crate) fn set_item_layer(&mut self, id: ItemId, index: usize) -> Result<()> {
        let index = self.clamp_layer(index);
        let Some(item) = self.item(id) else {
            warn!("set_layer on unknown {}", id);
            return Ok(());
        };
        let current = item.layer();
        if current == Some(index) {
            return Ok(());
        }
        if let Some(current) = current {
            self.layer_remove(current, id);
        }
        self.layer_insert(index, id)
    }

    // -- Single-layer algorithms --

    /// Records the result of a strategy request against layer `index`.
    fn settle(&mut self, index: usize, result: Result<Outcome>) -> Result<()> {
        match result {
            Ok(Outcome::Applied) => Ok(()),
            Ok(Outcome::Deferred) => {
                self.layers[index].mark_dirty();
                Ok(())
            }
            Err(e) => {
                warn!("Restack request for layer {} failed: {}", index, e);
                self.layers[index].mark_dirty();
                Err(e)
            }
        }
    }

    /// Stacks every window of `id` directly below the item `above`, or at the
    /// very top when nothing is above.
    fn stack_below(&mut self, index: usize, id: ItemId, above: Option<ItemId>) -> Result<()> {
        if !self.is_updatable() {
            self.layers[index].mark_dirty();
            return Ok(());
        }
        if self.layers[index].needs_restack() {
            return self.restack_layer(index);
        }

        let handles = self.live_handles(id);
        if handles.is_empty() {
            return Ok(());
        }
        let anchor = self.anchor_from(above);
        match anchor {
            Some(anchor) => debug!("Stacking {} ({} windows) below {}", id, handles.len(), anchor),
            None => debug!("Stacking {} ({} windows) on top", id, handles.len()),
        }

        let result = self.strategy.place(&mut self.restacker, anchor, &handles);
        self.settle(index, result)
    }

    pub(crate) fn layer_insert(&mut self, index: usize, id: ItemId) -> Result<()> {
        let Some(item) = self.item_entry(id) else {
            warn!("insert of unknown {} into layer {}", id, index);
            return Ok(());
        };
        if let Some(current) = item.layer() {
            warn!("{} is already in layer {}, not inserting into {}", id, current, index);
            return Ok(());
        }
        item.set_layer_index(Some(index));
        self.layers[index].push_front(id);

        let above = self.lowest_item_above_layer(index);
        self.stack_below(index, id, above)
    }

    pub(crate) fn layer_remove(&mut self, index: usize, id: ItemId) -> bool {
        if !self.layers[index].remove(id) {
            return false;
        }
        if let Some(item) = self.item_entry(id) {
            item.set_layer_index(None);
        }
        true
    }

    pub(crate) fn layer_raise(&mut self, index: usize, id: ItemId) -> Result<()> {
        let layer = &self.layers[index];
        if layer.front() == Some(id) {
            if layer.needs_restack() {
                return self.restack_layer(index);
            }
            trace!("{} is already at the front of layer {}", id, index);
            return Ok(());
        }
        if !self.layers[index].remove(id) {
            warn!("raise of {} which is not in layer {}", id, index);
            return Ok(());
        }
        self.layers[index].push_front(id);

        let above = self.lowest_item_above_layer(index);
        self.stack_below(index, id, above)
    }

    pub(crate) fn layer_lower(&mut self, index: usize, id: ItemId) -> Result<()> {
        let layer = &self.layers[index];
        if layer.lowest_item() == Some(id) {
            if layer.needs_restack() {
                return self.restack_layer(index);
            }
            trace!("{} is already at the back of layer {}", id, index);
            return Ok(());
        }
        if !self.layers[index].remove(id) {
            warn!("lower of {} which is not in layer {}", id, index);
            return Ok(());
        }
        self.layers[index].push_back(id);

        // at least two items now, so the predecessor exists
        let layer = &self.layers[index];
        let above = layer.len().checked_sub(2).and_then(|pos| layer.get(pos));
        self.stack_below(index, id, above)
    }

    pub(crate) fn layer_temp_raise(&mut self, index: usize, id: ItemId) -> Result<()> {
        let layer = &self.layers[index];
        let dirty = layer.needs_restack();
        if !dirty && layer.front() == Some(id) {
            return Ok(());
        }
        if !layer.contains(id) {
            warn!("temp_raise of {} which is not in layer {}", id, index);
            return Ok(());
        }
        if !self.is_updatable() {
            self.layers[index].mark_dirty();
            return Ok(());
        }

        // a dirty layer may be visibly out of order, so reissue all of it
        let handles = if dirty {
            self.layer_handles(index, Some(id))
        } else {
            self.live_handles(id)
        };
        let anchor = self.anchor_from(self.lowest_item_above_layer(index));
        debug!("Temporarily raising {} in layer {}", id, index);

        let result = self.strategy.place(&mut self.restacker, anchor, &handles);
        self.layers[index].mark_dirty();
        self.settle(index, result)
    }

    pub(crate) fn layer_align(&mut self, index: usize, id: ItemId) -> Result<()> {
        let Some(pos) = self.layers[index].position(id) else {
            warn!("align of {} which is not in layer {}", id, index);
            return Ok(());
        };
        let above = match pos {
            0 => self.lowest_item_above_layer(index),
            _ => self.layers[index].get(pos - 1),
        };
        self.stack_below(index, id, above)
    }

    /// Sends one request with every window of layer `index`.
    pub(crate) fn restack_layer(&mut self, index: usize) -> Result<()> {
        if !self.is_updatable() {
            self.layers[index].mark_dirty();
            return Ok(());
        }
        let handles = self.layer_handles(index, None);
        if handles.is_empty() {
            self.layers[index].mark_clean();
            return Ok(());
        }

        debug!("Restacking layer {} ({} windows)", index, handles.len());
        let result = self.strategy.restack_layer(&mut self.restacker, &handles);
        if let Ok(Outcome::Applied) = result {
            self.layers[index].mark_clean();
        }
        self.settle(index, result)
    }

    // -- Cross-layer operations --

    /// The back-most item of the nearest non-empty layer in front of layer `index`.
    pub fn lowest_item_above_layer(&self, index: usize) -> Option<ItemId> {
        if index == 0 || index >= self.layers.len() {
            return None;
        }
        self.layers[..index].iter().rev().find_map(Layer::lowest_item)
    }

    /// Inserts a detached item at the front of layer `index` (clamped), then
    /// restacks everything.
    pub fn add_to_top(&mut self, id: ItemId, index: usize) -> Result<()> {
        let index = self.clamp_layer(index);
        match self.item(id) {
            None => {
                warn!("add_to_top of unknown {}", id);
                return Ok(());
            }
            Some(item) => {
                if let Some(current) = item.layer() {
                    warn!("add_to_top of {} which is already in layer {}", id, current);
                    return Ok(());
                }
            }
        }
        self.layer_insert(index, id)?;
        self.restack()
    }

    /// Takes an item out of its layer without restacking.
    ///
    /// Returns `false` if the item was not in any layer.
    pub fn remove(&mut self, id: ItemId) -> bool {
        match self.layer_of(id) {
            Some(layer) => self.layer_remove(layer, id),
            None => false,
        }
    }

    /// Moves an item one whole band toward the front.
    pub fn raise_layer(&mut self, id: ItemId) -> Result<()> {
        match self.layer_of(id) {
            Some(current) => self.move_to_layer(id, current.saturating_sub(1)),
            None => Ok(()),
        }
    }

    /// Moves an item one whole band toward the back.
    pub fn lower_layer(&mut self, id: ItemId) -> Result<()> {
        match self.layer_of(id) {
            Some(current) => self.move_to_layer(id, current + 1),
            None => Ok(()),
        }
    }

    /// Moves an item to the front of layer `index` (clamped to the last layer).
    pub fn move_to_layer(&mut self, id: ItemId, index: usize) -> Result<()> {
        if self.layer_of(id) == Some(index) {
            return Ok(());
        }
        self.set_item_layer(id, index)
    }

    /// Sends the whole stack, front band first, as one request.
    ///
    /// This is the only operation whose cost grows with the total number of
    /// windows. Every layer is clean afterwards.
    pub fn restack(&mut self) -> Result<()> {
        if !self.is_updatable() {
            for layer in &mut self.layers {
                layer.mark_dirty();
            }
            trace!("Restack postponed while locked");
            return Ok(());
        }

        let mut handles = Vec::with_capacity(self.size());
        for layer in &self.layers {
            for id in layer.items() {
                if let Some(item) = self.item(id) {
                    extend_live(&mut handles, item.windows());
                }
            }
        }

        if !handles.is_empty() {
            debug!("Restacking all layers ({} windows)", handles.len());
            if let Err(e) = self.restacker.restack(&handles) {
                warn!("Full restack failed: {}", e);
                for layer in &mut self.layers {
                    layer.mark_dirty();
                }
                return Err(e);
            }
        }
        for layer in &mut self.layers {
            layer.mark_clean();
        }
        Ok(())
    }

    /// Total number of windows held by items in layers.
    pub fn size(&self) -> usize {
        self.layers
            .iter()
            .flat_map(Layer::items)
            .filter_map(|id| self.item(id))
            .map(Item::num_windows)
            .sum()
    }

    /// The global front-to-back order of every window in every layer.
    pub fn stacking_order(&self) -> Vec<WindowHandle> {
        (0..self.layers.len())
            .flat_map(|index| self.layer_order(index))
            .collect()
    }

    /// Front-to-back windows of one layer; empty for an unknown index.
    pub fn layer_order(&self, index: usize) -> Vec<WindowHandle> {
        let Some(layer) = self.layers.get(index) else {
            return Vec::new();
        };
        layer
            .items()
            .filter_map(|id| self.item(id))
            .flat_map(|item| item.windows().iter().copied())
            .collect()
    }

    /// The item directly in front of `id` in the global order.
    pub fn item_above(&self, id: ItemId) -> Option<ItemId> {
        let index = self.layer_of(id)?;
        let pos = self.layers[index].position(id)?;
        match pos {
            0 => self.lowest_item_above_layer(index),
            _ => self.layers[index].get(pos - 1),
        }
    }

    /// The item directly behind `id` in the global order.
    pub fn item_below(&self, id: ItemId) -> Option<ItemId> {
        let index = self.layer_of(id)?;
        let layer = &self.layers[index];
        let pos = layer.position(id)?;
        layer
            .get(pos + 1)
            .or_else(|| self.layers[index + 1..].iter().find_map(Layer::front))
    }

    // -- Activity gating --

    /// Whether requests may be sent right now.
    pub fn is_updatable(&self) -> bool {
        self.lock_depth == 0
    }

    /// Stops sending requests until the matching [`unlock`](Self::unlock).
    ///
    /// Locks nest. Mutations made while locked only mark their layers dirty.
    pub fn lock(&mut self) {
        self.lock_depth += 1;
        trace!("Layer manager locked (depth {})", self.lock_depth);
    }

    /// Releases one lock; the last release restacks everything.
    pub fn unlock(&mut self) -> Result<()> {
        if self.lock_depth == 0 {
            warn!("unlock called on a layer manager that is not locked");
            return Ok(());
        }
        self.lock_depth -= 1;
        if self.lock_depth == 0 {
            self.restack()
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests;
