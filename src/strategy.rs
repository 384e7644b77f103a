//! When restack requests go out
//!
//! The layer algorithms decide *what* has to move. A [`StackingStrategy`]
//! decides whether the incremental and per-layer requests are sent right away
//! ([`EagerStrategy`], for window systems that honour anchored partial
//! restacks such as X11) or held back until the next global restack
//! ([`DeferredStrategy`], for hosts that rebuild their whole order anyway).

use log::trace;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::handle::WindowHandle;
use crate::restack::Restacker;

/// Which strategy a manager is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackingMode {
    #[default]
    Eager,
    Deferred,
}

impl StackingMode {
    pub fn strategy(self) -> Box<dyn StackingStrategy> {
        match self {
            StackingMode::Eager => Box::new(EagerStrategy),
            StackingMode::Deferred => Box::new(DeferredStrategy),
        }
    }
}

impl fmt::Display for StackingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackingMode::Eager => f.write_str("eager"),
            StackingMode::Deferred => f.write_str("deferred"),
        }
    }
}

impl FromStr for StackingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eager" => Ok(StackingMode::Eager),
            "deferred" => Ok(StackingMode::Deferred),
            other => Err(format!("unknown stacking mode: {other}")),
        }
    }
}

/// What happened to a request handed to a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The restacker was called and the screen now reflects the request.
    Applied,
    /// Nothing was sent; the layer owes a full restack.
    Deferred,
}

/// Decides whether layer-level requests reach the restacker immediately.
pub trait StackingStrategy: fmt::Debug {
    fn mode(&self) -> StackingMode;

    /// Places `handles` directly below `anchor`, or on top of everything when
    /// there is no anchor.
    fn place(
        &mut self,
        restacker: &mut dyn Restacker,
        anchor: Option<WindowHandle>,
        handles: &[WindowHandle],
    ) -> Result<Outcome>;

    /// Restacks one layer's windows as a single run.
    fn restack_layer(
        &mut self,
        restacker: &mut dyn Restacker,
        handles: &[WindowHandle],
    ) -> Result<Outcome>;
}

/// Sends every request as soon as the model changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct EagerStrategy;

impl StackingStrategy for EagerStrategy {
    fn mode(&self) -> StackingMode {
        StackingMode::Eager
    }

    fn place(
        &mut self,
        restacker: &mut dyn Restacker,
        anchor: Option<WindowHandle>,
        handles: &[WindowHandle],
    ) -> Result<Outcome> {
        match anchor {
            Some(anchor) => restacker.stack_below(anchor, handles)?,
            None => restacker.raise_to_top(handles)?,
        }
        Ok(Outcome::Applied)
    }

    fn restack_layer(
        &mut self,
        restacker: &mut dyn Restacker,
        handles: &[WindowHandle],
    ) -> Result<Outcome> {
        restacker.restack(handles)?;
        Ok(Outcome::Applied)
    }
}

/// Holds every incremental request back until the next global restack.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeferredStrategy;

impl StackingStrategy for DeferredStrategy {
    fn mode(&self) -> StackingMode {
        StackingMode::Deferred
    }

    fn place(
        &mut self,
        _restacker: &mut dyn Restacker,
        anchor: Option<WindowHandle>,
        handles: &[WindowHandle],
    ) -> Result<Outcome> {
        trace!("Deferring placement of {} windows (anchor {:?})", handles.len(), anchor);
        Ok(Outcome::Deferred)
    }

    fn restack_layer(
        &mut self,
        _restacker: &mut dyn Restacker,
        handles: &[WindowHandle],
    ) -> Result<Outcome> {
        trace!("Deferring layer restack of {} windows", handles.len());
        Ok(Outcome::Deferred)
    }
}
