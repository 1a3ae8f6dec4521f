//! Error types for the routing core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Route encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Transpose {0} out of range (-12..=12)")]
    TransposeOutOfRange(i32),

    #[error("Route {0} not found")]
    RouteNotFound(usize),

    #[error("MIDI port error: {0}")]
    MidiPort(String),
}

pub type Result<T> = std::result::Result<T, Error>;
