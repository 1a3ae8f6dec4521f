//! MIDI input: enumeration and a callback connection per attached port.
//!
//! Callbacks run on the backend's thread and hand each message straight to
//! the installed [`MessageSink`]. Until a sink is installed messages are
//! dropped.

use crate::changes::without_own_ports;
use crate::error::{Error, Result};
use junction_core::{MessageSink, Port};
use midir::{Ignore, MidiInput, MidiInputConnection};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Shared slot for the message receiver. Weak so connections never keep the
/// router alive.
pub(crate) type SinkSlot = Arc<RwLock<Option<Weak<dyn MessageSink>>>>;

/// Enumerate input ports without connecting to them.
///
/// Ports created by this process's own connections are left out.
pub fn list_inputs(client_name: &str) -> Result<Vec<Port>> {
    let midi_input = MidiInput::new(&format!("{}-scan", client_name))?;
    let ports = midi_input
        .ports()
        .iter()
        .enumerate()
        .map(|(index, port)| {
            let name = midi_input
                .port_name(port)
                .unwrap_or_else(|_| format!("Input {}", index));
            Port::new(port.id(), name)
        })
        .collect();
    Ok(without_own_ports(client_name, ports))
}

struct InputSlot {
    port: Port,
    _connection: MidiInputConnection<String>,
}

/// Open input connections, keyed by port id. Lives on the I/O thread.
pub(crate) struct InputSet {
    client_name: String,
    sink: SinkSlot,
    slots: HashMap<String, InputSlot>,
    order: Vec<String>,
}

impl InputSet {
    pub(crate) fn new(client_name: impl Into<String>, sink: SinkSlot) -> Self {
        Self {
            client_name: client_name.into(),
            sink,
            slots: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub(crate) fn enumerate(&self) -> Result<Vec<Port>> {
        list_inputs(&self.client_name)
    }

    pub(crate) fn attach(&mut self, port: Port) -> Result<()> {
        let mut midi_input = MidiInput::new(&self.client_name)?;
        // Routes decide about active sense and clock themselves
        midi_input.ignore(Ignore::None);

        let found = midi_input.find_port_by_id(port.id.clone()).ok_or_else(|| {
            Error::MidiDevice(format!("MIDI input {} vanished before connect", port.name))
        })?;

        let sink = Arc::clone(&self.sink);
        let connection = midi_input.connect(
            &found,
            &format!("{}-in", self.client_name),
            move |_timestamp, message, port_id: &mut String| {
                let target = sink.read().as_ref().and_then(|weak| weak.upgrade());
                if let Some(target) = target {
                    target.on_message(port_id, message);
                }
            },
            port.id.clone(),
        )?;

        debug!("Connected MIDI input {}: {}", port.id, port.name);
        self.order.push(port.id.clone());
        self.slots.insert(
            port.id.clone(),
            InputSlot {
                port,
                _connection: connection,
            },
        );
        Ok(())
    }

    pub(crate) fn detach(&mut self, id: &str) -> Option<Port> {
        self.order.retain(|o| o != id);
        self.slots.remove(id).map(|slot| {
            debug!("Disconnected MIDI input {}", id);
            slot.port
        })
    }

    pub(crate) fn ports(&self) -> Vec<Port> {
        self.order
            .iter()
            .filter_map(|id| self.slots.get(id).map(|slot| slot.port.clone()))
            .collect()
    }

    pub(crate) fn close_all(&mut self) {
        self.order.clear();
        self.slots.clear();
    }
}
