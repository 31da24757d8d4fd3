//! Map state engine.
//!
//! [`MapEngine`] owns every piece of mutable map state and runs as a
//! single task; [`EngineHandle`] is the cloneable client side. See
//! [`core`](self) for the task's internals.
//!
//! Provider failures never surface here: fetches that fail keep previous
//! state and report through notices. [`EngineError`] covers only caller
//! mistakes and lifecycle.

mod command;
mod config;
mod core;
mod handle;
mod status;

pub use self::core::MapEngine;
pub use config::{
    DisplayMode, EngineConfig, DEFAULT_COMMAND_CHANNEL_CAPACITY, DEFAULT_PROVIDER_TIMEOUT,
    DEFAULT_REFRESH_INTERVAL,
};
pub use handle::EngineHandle;
pub use status::EngineStatus;

use thiserror::Error;

/// Errors returned to engine API callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// An operation that needs a selected entity ran without one.
    #[error("no entity is selected")]
    NoSelection,
    /// A search was submitted with a blank query.
    #[error("search query is empty")]
    EmptyQuery,
    /// The engine task has shut down and no longer accepts commands.
    #[error("engine is not running")]
    Stopped,
}
