//! Native window handles
//!
//! A [`WindowHandle`] is the engine's only view of an on-screen surface: an
//! opaque id owned by the host windowing system (an XID on X11).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a native window.
///
/// The raw value `0` is the null handle ([`WindowHandle::NONE`]): a window that
/// has not been created yet. Null handles may sit inside an item but are never
/// included in restack requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(u32);

impl WindowHandle {
    /// The null handle.
    pub const NONE: WindowHandle = WindowHandle(0);

    /// Wraps a raw native window id.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw native window id.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns `true` for the null handle.
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for WindowHandle {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<WindowHandle> for u32 {
    fn from(handle: WindowHandle) -> Self {
        handle.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Appends every non-null handle of `windows` to `out`.
pub(crate) fn extend_live(out: &mut Vec<WindowHandle>, windows: &[WindowHandle]) {
    out.extend(windows.iter().copied().filter(|w| !w.is_none()));
}
