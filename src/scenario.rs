//! Scenario replay
//!
//! A scenario is a TOML list of named stacking operations. Replaying one on a
//! [`VirtualScreen`] shows the order the manager keeps, the order a window
//! system would end up showing, and how many requests it took to get there.
//!
//! ```toml
//! layers = 13
//!
//! [[op]]
//! action = "create"
//! name = "term"
//! layer = "normal"
//! windows = [1, 2]
//!
//! [[op]]
//! action = "temp_raise"
//! name = "term"
//! ```

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::handle::WindowHandle;
use crate::layer::{ItemId, ItemMut, LayerLevel};
use crate::manager::LayerManager;
use crate::restack::VirtualScreen;
use crate::strategy::StackingMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Destroy,
    Raise,
    Lower,
    TempRaise,
    Move,
    RaiseLayer,
    LowerLayer,
    AddWindow,
    RemoveWindow,
    BringToTop,
    Restack,
    Lock,
    Unlock,
}

impl Action {
    fn needs_name(self) -> bool {
        !matches!(self, Action::Restack | Action::Lock | Action::Unlock)
    }
}

/// One `[[op]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Step {
    pub action: Action,

    /// Item the operation applies to
    #[serde(default)]
    pub name: Option<String>,

    /// Target layer for `create` and `move`
    #[serde(default)]
    pub layer: Option<LayerLevel>,

    /// Windows for `create`, `add_window`, `remove_window` and `bring_to_top`
    #[serde(default)]
    pub windows: Vec<WindowHandle>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Scenario {
    /// Layer count; the configured count is used when absent
    #[serde(default)]
    pub layers: Option<usize>,

    #[serde(default, rename = "op")]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse scenario")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse scenario file: {}", path.display()))
    }
}

/// What a replay ended with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub mode: StackingMode,
    pub layers: usize,
    pub steps: usize,
    /// Windows front to back as the manager stacks them
    pub logical_order: Vec<WindowHandle>,
    /// Windows front to back as the simulated screen shows them
    pub screen_order: Vec<WindowHandle>,
    pub requests: usize,
    pub full_restacks: usize,
    pub dirty_layers: Vec<usize>,
    pub locked: bool,
}

impl Report {
    /// Whether the screen shows every stacked window in the logical order.
    pub fn in_sync(&self) -> bool {
        let shown: Vec<WindowHandle> = self
            .screen_order
            .iter()
            .copied()
            .filter(|w| self.logical_order.contains(w))
            .collect();
        let live: Vec<WindowHandle> = self
            .logical_order
            .iter()
            .copied()
            .filter(|w| !w.is_none())
            .collect();
        shown == live
    }
}

fn join(windows: &[WindowHandle]) -> String {
    windows
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "mode:          {}", self.mode)?;
        writeln!(f, "layers:        {}", self.layers)?;
        writeln!(f, "steps:         {}", self.steps)?;
        writeln!(f, "logical order: {}", join(&self.logical_order))?;
        writeln!(f, "screen order:  {}", join(&self.screen_order))?;
        writeln!(
            f,
            "requests:      {} ({} full)",
            self.requests, self.full_restacks
        )?;
        if !self.dirty_layers.is_empty() {
            writeln!(f, "dirty layers:  {:?}", self.dirty_layers)?;
        }
        if self.locked {
            writeln!(f, "still locked")?;
        }
        write!(f, "in sync:       {}", if self.in_sync() { "yes" } else { "no" })
    }
}

/// Replays scenario steps against a manager driving a [`VirtualScreen`].
#[derive(Debug)]
pub struct Replay {
    manager: LayerManager<VirtualScreen>,
    names: HashMap<String, ItemId>,
    steps: usize,
}

impl Replay {
    pub fn new(layers: usize, mode: StackingMode) -> Self {
        Self {
            manager: LayerManager::with_mode(layers, mode, VirtualScreen::new()),
            names: HashMap::new(),
            steps: 0,
        }
    }

    pub fn manager(&self) -> &LayerManager<VirtualScreen> {
        &self.manager
    }

    pub fn item(&self, name: &str) -> Option<ItemId> {
        self.names.get(name).copied()
    }

    /// Runs every step, stopping at the first failure.
    pub fn run(&mut self, scenario: &Scenario) -> Result<()> {
        for (index, step) in scenario.steps.iter().enumerate() {
            self.apply(step)
                .with_context(|| format!("Step {} ({:?}) failed", index + 1, step.action))?;
        }
        Ok(())
    }

    fn lookup(&self, step: &Step) -> Result<(String, ItemId)> {
        let name = step
            .name
            .clone()
            .ok_or_else(|| anyhow!("missing item name"))?;
        let id = self
            .item(&name)
            .ok_or_else(|| anyhow!("unknown item: {}", name))?;
        Ok((name, id))
    }

    pub fn apply(&mut self, step: &Step) -> Result<()> {
        self.steps += 1;
        debug!("Replaying {:?} {:?}", step.action, step.name);

        if !step.action.needs_name() {
            match step.action {
                Action::Restack => self.manager.restack()?,
                Action::Lock => self.manager.lock(),
                _ => self.manager.unlock()?,
            }
            return Ok(());
        }

        if step.action == Action::Create {
            return self.create(step);
        }

        let (name, id) = self.lookup(step)?;
        match step.action {
            Action::Destroy => {
                self.manager.destroy_item(id);
                self.names.remove(&name);
            }
            Action::Move => {
                let layer = step
                    .layer
                    .ok_or_else(|| anyhow!("move of {} needs a layer", name))?;
                self.manager.move_to_layer(id, layer.index())?;
            }
            Action::RaiseLayer => self.manager.raise_layer(id)?,
            Action::LowerLayer => self.manager.lower_layer(id)?,
            Action::Raise => self.item_mut(id, &name)?.raise()?,
            Action::Lower => self.item_mut(id, &name)?.lower()?,
            Action::TempRaise => self.item_mut(id, &name)?.temp_raise()?,
            Action::AddWindow => {
                let mut item = self.item_mut(id, &name)?;
                for &window in &step.windows {
                    item.add_window(window)?;
                }
            }
            Action::RemoveWindow => {
                let mut item = self.item_mut(id, &name)?;
                for &window in &step.windows {
                    if !item.remove_window(window) {
                        warn!("{} kept window {}", name, window);
                    }
                }
            }
            Action::BringToTop => {
                let mut item = self.item_mut(id, &name)?;
                for &window in &step.windows {
                    item.bring_to_top(window)?;
                }
            }
            Action::Create | Action::Restack | Action::Lock | Action::Unlock => {}
        }
        Ok(())
    }

    fn item_mut(&mut self, id: ItemId, name: &str) -> Result<ItemMut<'_, VirtualScreen>> {
        self.manager
            .item_mut(id)
            .ok_or_else(|| anyhow!("stale item: {}", name))
    }

    fn create(&mut self, step: &Step) -> Result<()> {
        let name = step
            .name
            .clone()
            .ok_or_else(|| anyhow!("missing item name"))?;
        if self.names.contains_key(&name) {
            bail!("item {} already exists", name);
        }
        let Some((&first, rest)) = step.windows.split_first() else {
            bail!("create of {} needs at least one window", name);
        };

        let layer = step.layer.unwrap_or_default();
        let id = self.manager.create_item(first, layer.index())?;
        self.names.insert(name, id);

        if let Some(mut item) = self.manager.item_mut(id) {
            for &window in rest {
                item.add_window(window)?;
            }
        }
        Ok(())
    }

    pub fn report(&self) -> Report {
        let screen = self.manager.restacker();
        Report {
            mode: self.manager.mode(),
            layers: self.manager.layer_count(),
            steps: self.steps,
            logical_order: self.manager.stacking_order(),
            screen_order: screen.order().to_vec(),
            requests: screen.requests().len(),
            full_restacks: screen.requests().iter().filter(|r| r.is_full()).count(),
            dirty_layers: self
                .manager
                .layers()
                .iter()
                .filter(|layer| layer.needs_restack())
                .map(|layer| layer.index())
                .collect(),
            locked: !self.manager.is_updatable(),
        }
    }
}

/// Replays a whole scenario and reports the result.
pub fn run(scenario: &Scenario, default_layers: usize, mode: StackingMode) -> Result<Report> {
    let layers = scenario.layers.unwrap_or(default_layers);
    info!(
        "Replaying {} steps on {} layers ({} mode)",
        scenario.steps.len(),
        layers,
        mode
    );

    let mut replay = Replay::new(layers, mode);
    replay.run(scenario)?;
    Ok(replay.report())
}
