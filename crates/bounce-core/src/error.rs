//! Core errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid audio settings: {0}")]
    InvalidSettings(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
