//! Hardware MIDI I/O.
//!
//! Port enumeration and per-port connections via midir. Connections are
//! owned by the I/O thread in [`crate::hardware`].
//! Requires the `midi-io` feature.

mod input;
mod output;

pub(crate) use input::{InputSet, SinkSlot};
pub(crate) use output::OutputSet;
pub use input::list_inputs;
pub use output::list_outputs;
