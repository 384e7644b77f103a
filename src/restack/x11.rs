//! X11 restacking over an `x11rb` connection
//!
//! `XRestackWindows` is not a protocol request of its own; it is a chain of
//! `ConfigureWindow` requests, each stacking one window directly below its
//! predecessor. This module issues that chain and flushes once per request.

use log::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ConfigureWindowAux, ConnectionExt as _, StackMode};

use super::Restacker;
use crate::error::Result;
use crate::handle::WindowHandle;

/// Restacker that talks to a live X server.
pub struct X11Restacker<'c, C: Connection> {
    conn: &'c C,
}

impl<'c, C: Connection> X11Restacker<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    /// Stacks every window of `rest` directly below the one before it.
    fn chain_below(&self, first: WindowHandle, rest: &[WindowHandle]) -> Result<()> {
        let mut sibling = first;
        for &window in rest.iter().filter(|w| !w.is_none()) {
            self.conn.configure_window(
                window.raw(),
                &ConfigureWindowAux::new()
                    .sibling(sibling.raw())
                    .stack_mode(StackMode::BELOW),
            )?;
            sibling = window;
        }
        Ok(())
    }
}

impl<C: Connection> std::fmt::Debug for X11Restacker<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X11Restacker").finish_non_exhaustive()
    }
}

impl<C: Connection> Restacker for X11Restacker<'_, C> {
    fn restack(&mut self, handles: &[WindowHandle]) -> Result<()> {
        let live: Vec<WindowHandle> = handles.iter().copied().filter(|w| !w.is_none()).collect();
        let Some((&first, rest)) = live.split_first() else {
            return Ok(());
        };

        debug!("Restacking {} windows below {}", rest.len(), first);
        self.chain_below(first, rest)?;
        self.conn.flush()?;
        Ok(())
    }

    fn raise_to_top(&mut self, handles: &[WindowHandle]) -> Result<()> {
        let live: Vec<WindowHandle> = handles.iter().copied().filter(|w| !w.is_none()).collect();
        let Some((&first, rest)) = live.split_first() else {
            return Ok(());
        };

        debug!("Raising {} to the top with {} windows below", first, rest.len());
        self.conn.configure_window(
            first.raw(),
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        )?;
        self.chain_below(first, rest)?;
        self.conn.flush()?;
        Ok(())
    }
}
