//! Centralized error type for the junction umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] junction_core::Error),

    #[cfg(feature = "midi-io")]
    #[error("MIDI: {0}")]
    Midi(#[from] junction_midi_io::Error),

    #[error("A route needs at least one input and one output port")]
    NoPorts,

    #[error("No MIDI {kind} matches '{query}'")]
    PortNotFound { kind: &'static str, query: String },

    #[error("Config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
