//! # Strata Window Stacking Library
//!
//! Keeps top-level windows ordered across fixed-priority layers (menus above
//! docks above normal windows above the desktop) and tells the window system
//! about every change with the smallest restack request that will do.
//!
//! ## Architecture
//!
//! Strata is built on a small set of modules:
//! - `manager`: the layer manager, item arena and global restack
//! - `layer`: layers, items and the named layer levels
//! - `strategy`: eager and deferred request strategies
//! - `restack`: the restacker interface, an in-memory screen and the X11 backend
//! - `config`: configuration parsing and validation
//! - `scenario`: headless replay of TOML operation scripts
//!
//! ## Usage
//!
//! ```rust
//! use strata::{LayerLevel, LayerManager, VirtualScreen, WindowHandle};
//!
//! fn main() -> strata::Result<()> {
//!     let mut manager = LayerManager::new(LayerLevel::COUNT, VirtualScreen::new());
//!     let desktop = manager.create_item(WindowHandle::new(1), LayerLevel::DESKTOP.index())?;
//!     let editor = manager.create_item(WindowHandle::new(2), LayerLevel::NORMAL.index())?;
//!
//!     manager.item_mut(editor).unwrap().temp_raise()?;
//!     manager.restack()?;
//!
//!     assert_eq!(manager.item_below(editor), Some(desktop));
//!     assert_eq!(
//!         manager.restacker().order(),
//!         &[WindowHandle::new(2), WindowHandle::new(1)]
//!     );
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handle;
pub mod layer;
pub mod logging;
pub mod manager;
pub mod restack;
pub mod scenario;
pub mod strategy;

// Re-export main types for easy access
pub use config::StackConfig;
pub use error::{Result, StackError};
pub use handle::WindowHandle;
pub use layer::{Item, ItemId, ItemMut, Layer, LayerLevel, LayerMut, StackState};
pub use manager::LayerManager;
pub use restack::{RestackRequest, Restacker, VirtualScreen};
#[cfg(feature = "x11")]
pub use restack::X11Restacker;
pub use strategy::{DeferredStrategy, EagerStrategy, Outcome, StackingMode, StackingStrategy};

/// Version information for Strata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
