//! Plugin hosting for the bounce offline host.
//!
//! Plugins of heterogeneous backends (VST2 dynamic libraries, host
//! built-ins) sit behind one [`Plugin`] trait; the [`PluginChain`] drives
//! them in order over shared audio settings.

mod chain;
mod error;
mod internal;
mod plugin;

#[cfg(feature = "vst2")]
mod vst2;

pub use chain::PluginChain;
pub use error::{LoadStage, PluginError, Result};
pub use plugin::{open_by_name, Plugin, PluginCategory, PluginSpec, PluginType};
