//! MIDI output: enumeration and one open connection per attached port.

use crate::changes::without_own_ports;
use crate::error::{Error, Result};
use junction_core::Port;
use midir::{MidiOutput, MidiOutputConnection};
use std::collections::HashMap;
use tracing::debug;

/// Enumerate output ports without connecting to them.
///
/// Ports created by this process's own connections are left out.
pub fn list_outputs(client_name: &str) -> Result<Vec<Port>> {
    let midi_output = MidiOutput::new(&format!("{}-scan", client_name))?;
    let ports = midi_output
        .ports()
        .iter()
        .enumerate()
        .map(|(index, port)| {
            let name = midi_output
                .port_name(port)
                .unwrap_or_else(|_| format!("Output {}", index));
            Port::new(port.id(), name)
        })
        .collect();
    Ok(without_own_ports(client_name, ports))
}

struct OutputSlot {
    port: Port,
    connection: MidiOutputConnection,
}

/// Open output connections, keyed by port id. Lives on the I/O thread.
pub(crate) struct OutputSet {
    client_name: String,
    slots: HashMap<String, OutputSlot>,
    /// Attach order, for stable listings.
    order: Vec<String>,
}

impl OutputSet {
    pub(crate) fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            slots: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub(crate) fn enumerate(&self) -> Result<Vec<Port>> {
        list_outputs(&self.client_name)
    }

    pub(crate) fn attach(&mut self, port: Port) -> Result<()> {
        // midir connections consume their client, so each port gets its own
        let midi_output = MidiOutput::new(&self.client_name)?;
        let found = midi_output.find_port_by_id(port.id.clone()).ok_or_else(|| {
            Error::MidiDevice(format!("MIDI output {} vanished before connect", port.name))
        })?;
        let connection = midi_output.connect(&found, &format!("{}-out", self.client_name))?;

        debug!("Connected MIDI output {}: {}", port.id, port.name);
        self.order.push(port.id.clone());
        self.slots.insert(port.id.clone(), OutputSlot { port, connection });
        Ok(())
    }

    pub(crate) fn detach(&mut self, id: &str) -> Option<Port> {
        self.order.retain(|o| o != id);
        self.slots.remove(id).map(|slot| {
            slot.connection.close();
            debug!("Disconnected MIDI output {}", id);
            slot.port
        })
    }

    /// `Ok(false)` when the port is not attached.
    pub(crate) fn send(&mut self, id: &str, message: &[u8]) -> Result<bool> {
        match self.slots.get_mut(id) {
            Some(slot) => {
                slot.connection.send(message)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub(crate) fn ports(&self) -> Vec<Port> {
        self.order
            .iter()
            .filter_map(|id| self.slots.get(id).map(|slot| slot.port.clone()))
            .collect()
    }

    pub(crate) fn close_all(&mut self) {
        let ids: Vec<String> = self.order.clone();
        for id in ids {
            self.detach(&id);
        }
    }
}
