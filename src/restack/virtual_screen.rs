//! In-memory window system stack
//!
//! [`VirtualScreen`] models a window system's stacking order with the exact
//! semantics the engine relies on: windows that a request does not name keep
//! their relative order. It backs the headless scenario tool and the tests,
//! and keeps a log of every request it received.

use std::collections::{HashMap, HashSet};

use log::trace;

use super::{RestackRequest, Restacker};
use crate::error::{Result, StackError};
use crate::handle::WindowHandle;

/// Simulated window stack.
///
/// Windows are stored front to back: index 0 is the topmost window.
///
/// # Examples
///
/// ```
/// use strata::{Restacker, VirtualScreen, WindowHandle};
///
/// let mut screen = VirtualScreen::new();
/// screen.map(WindowHandle::new(1));
/// screen.map(WindowHandle::new(2));
/// assert_eq!(screen.top(), Some(WindowHandle::new(2)));
///
/// screen.stack_below(WindowHandle::new(2), &[WindowHandle::new(1)]).unwrap();
/// assert_eq!(screen.order(), &[WindowHandle::new(2), WindowHandle::new(1)]);
/// ```
#[derive(Debug, Clone)]
pub struct VirtualScreen {
    /// Windows ordered from top to bottom
    windows: Vec<WindowHandle>,

    /// Fast lookup: window → position in stack
    positions: HashMap<WindowHandle, usize>,

    /// Every request received, oldest first
    requests: Vec<RestackRequest>,

    connected: bool,
}

impl VirtualScreen {
    /// Creates an empty, connected screen.
    pub fn new() -> Self {
        Self {
            windows: Vec::new(),
            positions: HashMap::new(),
            requests: Vec::new(),
            connected: true,
        }
    }

    /// Creates a screen that already shows `windows`, front-most first.
    pub fn with_windows(windows: impl IntoIterator<Item = WindowHandle>) -> Self {
        let mut screen = Self::new();
        for window in windows {
            if !window.is_none() && !screen.positions.contains_key(&window) {
                screen.windows.push(window);
            }
        }
        screen.rebuild_positions();
        screen
    }

    /// Maps a window on top of everything, as a window system does for a new window.
    ///
    /// Returns `false` if the window was already on screen.
    pub fn map(&mut self, window: WindowHandle) -> bool {
        if window.is_none() || self.positions.contains_key(&window) {
            return false;
        }
        self.windows.insert(0, window);
        self.rebuild_positions();
        true
    }

    /// Removes a window from the screen.
    ///
    /// Returns its previous position if it was shown.
    pub fn unmap(&mut self, window: WindowHandle) -> Option<usize> {
        let pos = self.positions.remove(&window)?;
        self.windows.remove(pos);
        self.rebuild_positions();
        Some(pos)
    }

    /// Windows front to back.
    pub fn order(&self) -> &[WindowHandle] {
        &self.windows
    }

    /// Windows front to back, restricted to those for which `keep` holds.
    pub fn order_of(&self, keep: impl Fn(WindowHandle) -> bool) -> Vec<WindowHandle> {
        self.windows.iter().copied().filter(|&w| keep(w)).collect()
    }

    pub fn top(&self) -> Option<WindowHandle> {
        self.windows.first().copied()
    }

    pub fn bottom(&self) -> Option<WindowHandle> {
        self.windows.last().copied()
    }

    pub fn position(&self, window: WindowHandle) -> Option<usize> {
        self.positions.get(&window).copied()
    }

    pub fn contains(&self, window: WindowHandle) -> bool {
        self.positions.contains_key(&window)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> &[RestackRequest] {
        &self.requests
    }

    /// Returns and clears the request log.
    pub fn take_requests(&mut self) -> Vec<RestackRequest> {
        std::mem::take(&mut self.requests)
    }

    /// Simulates losing the window system connection; requests fail until
    /// [`reconnect`](Self::reconnect).
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    pub fn reconnect(&mut self) {
        self.connected = true;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn check_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(StackError::ConnectionLost)
        }
    }

    /// Chains `rest` directly below `first`, mapping `first` on top if new.
    ///
    /// A window named twice ends up where its last mention puts it. The
    /// lookup map is rebuilt once per run.
    fn apply_run(&mut self, first: WindowHandle, rest: &[WindowHandle]) {
        self.map(first);

        let mut named = HashSet::new();
        let mut run: Vec<WindowHandle> = rest
            .iter()
            .rev()
            .copied()
            .filter(|&window| !window.is_none() && window != first && named.insert(window))
            .collect();
        if run.is_empty() {
            return;
        }
        run.reverse();

        self.windows.retain(|window| !named.contains(window));
        let at = self
            .windows
            .iter()
            .position(|&window| window == first)
            .map_or(0, |pos| pos + 1);
        self.windows.splice(at..at, run);
        self.rebuild_positions();
    }

    /// Rebuilds the position lookup map.
    ///
    /// This is called internally after operations that change window positions.
    fn rebuild_positions(&mut self) {
        self.positions.clear();
        for (i, &window) in self.windows.iter().enumerate() {
            self.positions.insert(window, i);
        }
    }
}

impl Default for VirtualScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Restacker for VirtualScreen {
    fn restack(&mut self, handles: &[WindowHandle]) -> Result<()> {
        self.check_connected()?;
        self.requests.push(RestackRequest::Restack {
            handles: handles.to_vec(),
        });
        trace!("virtual restack of {} windows", handles.len());

        let mut live = handles.iter().copied().filter(|w| !w.is_none());
        if let Some(first) = live.next() {
            let rest: Vec<WindowHandle> = live.collect();
            self.apply_run(first, &rest);
        }
        Ok(())
    }

    fn stack_below(&mut self, anchor: WindowHandle, handles: &[WindowHandle]) -> Result<()> {
        self.check_connected()?;
        self.requests.push(RestackRequest::StackBelow {
            anchor,
            handles: handles.to_vec(),
        });
        trace!("virtual stack of {} windows below {}", handles.len(), anchor);

        self.apply_run(anchor, handles);
        Ok(())
    }

    fn raise_to_top(&mut self, handles: &[WindowHandle]) -> Result<()> {
        self.check_connected()?;
        self.requests.push(RestackRequest::RaiseToTop {
            handles: handles.to_vec(),
        });
        trace!("virtual raise of {} windows", handles.len());

        let mut live = handles.iter().copied().filter(|w| !w.is_none());
        if let Some(first) = live.next() {
            self.unmap(first);
            self.map(first);
            let rest: Vec<WindowHandle> = live.collect();
            self.apply_run(first, &rest);
        }
        Ok(())
    }
}
