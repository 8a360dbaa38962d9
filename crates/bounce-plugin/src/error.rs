//! Plugin errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Opening,
    Instantiation,
    Initialization,
}

impl std::fmt::Display for LoadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStage::Opening => write!(f, "opening library"),
            LoadStage::Instantiation => write!(f, "creating instance"),
            LoadStage::Initialization => write!(f, "initializing"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Unknown plugin '{0}'")]
    Unresolved(String),

    #[error("Plugin load failed at {stage} stage: {path}\n  Reason: {reason}")]
    LoadFailed {
        path: PathBuf,
        stage: LoadStage,
        reason: String,
    },

    #[error("Invalid plugin chain: {0}")]
    InvalidChain(String),

    #[error("Invalid plugin parameter '{0}'")]
    InvalidParameter(String),

    #[error("Plugin '{name}' failed to initialize: {reason}")]
    InitFailed { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, PluginError>;
