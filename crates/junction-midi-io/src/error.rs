//! Error types for the hardware MIDI layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("MIDI access unavailable: {0}")]
    Unavailable(String),

    #[error("MIDI port error: {0}")]
    MidiPort(String),

    #[error("MIDI device error: {0}")]
    MidiDevice(String),

    #[error("MIDI I/O thread not running")]
    ThreadStopped,
}

#[cfg(feature = "midi-io")]
impl From<midir::InitError> for Error {
    fn from(e: midir::InitError) -> Self {
        Error::Unavailable(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::PortInfoError> for Error {
    fn from(e: midir::PortInfoError) -> Self {
        Error::MidiDevice(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::ConnectError<midir::MidiOutput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiOutput>) -> Self {
        Error::MidiPort(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::ConnectError<midir::MidiInput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiInput>) -> Self {
        Error::MidiPort(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::SendError> for Error {
    fn from(e: midir::SendError) -> Self {
        Error::MidiPort(e.to_string())
    }
}

impl From<Error> for junction_core::Error {
    fn from(e: Error) -> Self {
        junction_core::Error::MidiPort(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
