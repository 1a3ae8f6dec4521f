//! Routing core for Junction.
//!
//! Routes, per-message filtering and transposition, the port registry seam,
//! activity counters and route persistence. Hardware I/O lives in
//! `junction-midi-io`; this crate only sees ports through [`PortRegistry`].

pub mod error;
pub use error::{Error, Result};

pub mod message;
pub use message::{message_type, MessageType, ACTIVE_SENSE, TRANSPOSABLE_STATUS_MAX};

pub mod route;
pub use route::{MessageTypeFilter, Route, RouteDecision, RouteSettings, Transpose};

pub mod store;
pub use store::RouteStore;

pub mod port;
pub use port::{port_label, Port, PortRegistry, PortType, VirtualPortRegistry};

pub mod router;
pub use router::{MessageSink, Outcome, RouteOutcome, Router};

pub mod activity;
pub use activity::{ActivityMonitor, PortActivity};

pub mod persist;
pub use persist::{load_routes, save_routes, JsonFileStore, KeyValueStore, MemoryStore, ROUTES_KEY};
