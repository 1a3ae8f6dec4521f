//! # Junction - MIDI port router
//!
//! Forwards messages between MIDI ports through user-defined routes. Each
//! route can restrict message types, transpose notes and pass or drop
//! active sense.
//!
//! ## Architecture
//!
//! Junction is an umbrella crate that coordinates:
//! - **junction-core** - Routes, router, port registry seam, persistence, activity counters
//! - **junction-midi-io** - Hardware ports via midir, hot-plug rescans
//!
//! ## Quick Start
//!
//! ```ignore
//! use junction::prelude::*;
//!
//! let junction = Junction::builder().hardware().build()?;
//!
//! let input = junction.resolve_port(PortType::Input, None)?;
//! let output = junction.resolve_port(PortType::Output, None)?;
//! junction.add_route(&input.id, &output.id, RouteSettings {
//!     transpose: Transpose::new(2)?,
//!     message_types: MessageTypeFilter::only([9]),
//!     active_sense: false,
//! })?;
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Hardware MIDI I/O
//! - `midi-io` - Hardware MIDI I/O (midir)

/// Re-export of junction-core for direct access
pub use junction_core as core;

pub use junction_core::{
    port_label, ActivityMonitor, JsonFileStore, KeyValueStore, MemoryStore, MessageSink,
    MessageType, MessageTypeFilter, Outcome, Port, PortActivity, PortRegistry, PortType, Route,
    RouteOutcome, RouteSettings, RouteStore, Router, Transpose, VirtualPortRegistry,
};

#[cfg(feature = "midi-io")]
pub use junction_midi_io as midi_io;

#[cfg(feature = "midi-io")]
pub use junction_midi_io::{HardwarePorts, PortChanges};

mod error;
pub use error::{Error, Result};

mod config;
pub use config::{default_store_path, JunctionConfig};

mod builder;
pub use builder::JunctionBuilder;

mod engine;
pub use engine::{Junction, RouteView};

pub mod prelude {
    pub use crate::{
        Junction, JunctionBuilder, JunctionConfig, MessageType, MessageTypeFilter, Port,
        PortType, Route, RouteSettings, RouteView, Transpose,
    };
}
