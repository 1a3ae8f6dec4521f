//! Hardware MIDI I/O for Junction.
//!
//! Exposes the platform's MIDI ports as a [`junction_core::PortRegistry`],
//! keeps them in sync with hot-plug changes and feeds every input message
//! to a [`junction_core::MessageSink`].
//!
//! Feature gates: `midi-io` (hardware access via midir).

pub mod error;
pub use error::{Error, Result};

pub mod changes;
pub use changes::{diff_ports, is_own_port, without_own_ports, PortChanges};

#[cfg(feature = "midi-io")]
pub(crate) mod io;

#[cfg(feature = "midi-io")]
pub use io::{list_inputs, list_outputs};

#[cfg(feature = "midi-io")]
mod hardware;

#[cfg(feature = "midi-io")]
pub use hardware::HardwarePorts;
