//! The restack primitive consumed by the engine
//!
//! The engine never talks to the display directly. Every reorder goes through
//! a [`Restacker`] supplied by the host, which must keep the relative order of
//! all windows it is not told about. That guarantee is what lets the engine
//! move one item with a request naming only that item's windows and a single
//! anchor.

pub mod virtual_screen;
#[cfg(feature = "x11")]
pub mod x11;

use serde::Serialize;

use crate::error::Result;
use crate::handle::WindowHandle;

pub use virtual_screen::VirtualScreen;
#[cfg(feature = "x11")]
pub use x11::X11Restacker;

/// Reorders the host's real window stack.
///
/// All lists are front-most first.
#[cfg_attr(test, mockall::automock)]
pub trait Restacker {
    /// Restacks `handles` as one run: `handles[0]` keeps its place and each
    /// following handle goes directly below its predecessor (the semantics of
    /// `XRestackWindows`).
    fn restack(&mut self, handles: &[WindowHandle]) -> Result<()>;

    /// Places `handles` directly below `anchor`, in order.
    fn stack_below(&mut self, anchor: WindowHandle, handles: &[WindowHandle]) -> Result<()> {
        let mut run = Vec::with_capacity(handles.len() + 1);
        run.push(anchor);
        run.extend_from_slice(handles);
        self.restack(&run)
    }

    /// Makes `handles[0]` the topmost window and stacks the rest below it.
    fn raise_to_top(&mut self, handles: &[WindowHandle]) -> Result<()>;
}

impl<R: Restacker + ?Sized> Restacker for Box<R> {
    fn restack(&mut self, handles: &[WindowHandle]) -> Result<()> {
        (**self).restack(handles)
    }

    fn stack_below(&mut self, anchor: WindowHandle, handles: &[WindowHandle]) -> Result<()> {
        (**self).stack_below(anchor, handles)
    }

    fn raise_to_top(&mut self, handles: &[WindowHandle]) -> Result<()> {
        (**self).raise_to_top(handles)
    }
}

impl<R: Restacker + ?Sized> Restacker for &mut R {
    fn restack(&mut self, handles: &[WindowHandle]) -> Result<()> {
        (**self).restack(handles)
    }

    fn stack_below(&mut self, anchor: WindowHandle, handles: &[WindowHandle]) -> Result<()> {
        (**self).stack_below(anchor, handles)
    }

    fn raise_to_top(&mut self, handles: &[WindowHandle]) -> Result<()> {
        (**self).raise_to_top(handles)
    }
}

/// One request as seen by a [`Restacker`], kept for logs and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RestackRequest {
    Restack { handles: Vec<WindowHandle> },
    StackBelow { anchor: WindowHandle, handles: Vec<WindowHandle> },
    RaiseToTop { handles: Vec<WindowHandle> },
}

impl RestackRequest {
    /// Windows being moved by this request (the anchor is not counted).
    pub fn handles(&self) -> &[WindowHandle] {
        match self {
            RestackRequest::Restack { handles }
            | RestackRequest::StackBelow { handles, .. }
            | RestackRequest::RaiseToTop { handles } => handles,
        }
    }

    pub fn anchor(&self) -> Option<WindowHandle> {
        match self {
            RestackRequest::StackBelow { anchor, .. } => Some(*anchor),
            _ => None,
        }
    }

    /// Returns `true` for a full run restack rather than an anchored move.
    pub fn is_full(&self) -> bool {
        matches!(self, RestackRequest::Restack { .. })
    }
}
