//! Port descriptions and the registry the router reads live ports from.

use crate::error::{Error, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Characters of a port id shown when the port itself is gone.
const DETACHED_ID_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortType {
    Input,
    Output,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl Port {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            manufacturer: None,
            version: None,
        }
    }

    pub fn manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// `Manufacturer Name/Version`, omitting whatever is unknown.
    pub fn label(&self) -> String {
        let mut label = self.name.clone();
        if let Some(version) = self.version.as_deref().filter(|v| !v.is_empty()) {
            label = format!("{}/{}", label, version);
        }
        if let Some(manufacturer) = self.manufacturer.as_deref().filter(|m| !m.is_empty()) {
            label = format!("{} {}", manufacturer, label);
        }
        label
    }
}

/// Label for a port id, falling back to a truncated id when the port is absent.
pub fn port_label(id: &str, port: Option<&Port>) -> String {
    match port {
        Some(port) => port.label(),
        None => id.chars().take(DETACHED_ID_CHARS).collect(),
    }
}

/// Live view of the ports the platform currently exposes.
///
/// Implementations must be callable from MIDI callback threads.
pub trait PortRegistry: Send + Sync {
    fn inputs(&self) -> Vec<Port>;

    fn outputs(&self) -> Vec<Port>;

    fn input(&self, id: &str) -> Option<Port> {
        self.inputs().into_iter().find(|p| p.id == id)
    }

    fn output(&self, id: &str) -> Option<Port> {
        self.outputs().into_iter().find(|p| p.id == id)
    }

    fn has_input(&self, id: &str) -> bool {
        self.input(id).is_some()
    }

    fn has_output(&self, id: &str) -> bool {
        self.output(id).is_some()
    }

    /// Send `message` to an attached output.
    ///
    /// Returns `Ok(false)` when no output with that id is attached.
    fn send(&self, output_id: &str, message: &[u8]) -> Result<bool>;
}

/// In-memory registry. Records everything sent so callers can inspect it.
#[derive(Debug, Default)]
pub struct VirtualPortRegistry {
    inputs: RwLock<Vec<Port>>,
    outputs: RwLock<Vec<Port>>,
    sent: RwLock<HashMap<String, Vec<Vec<u8>>>>,
}

impl VirtualPortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an input. Re-attaching an existing id replaces its description.
    pub fn attach_input(&self, port: Port) {
        Self::attach(&self.inputs, port);
    }

    pub fn attach_output(&self, port: Port) {
        Self::attach(&self.outputs, port);
    }

    pub fn detach(&self, port_type: PortType, id: &str) -> bool {
        let ports = match port_type {
            PortType::Input => &self.inputs,
            PortType::Output => &self.outputs,
        };
        let mut ports = ports.write();
        let before = ports.len();
        ports.retain(|p| p.id != id);
        before != ports.len()
    }

    /// Take every message sent to `output_id` so far.
    pub fn take_sent(&self, output_id: &str) -> Vec<Vec<u8>> {
        self.sent.write().remove(output_id).unwrap_or_default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.read().values().map(Vec::len).sum()
    }

    fn attach(ports: &RwLock<Vec<Port>>, port: Port) {
        let mut ports = ports.write();
        match ports.iter_mut().find(|p| p.id == port.id) {
            Some(existing) => *existing = port,
            None => {
                tracing::debug!("Attached virtual port {}: {}", port.id, port.name);
                ports.push(port);
            }
        }
    }
}

impl PortRegistry for VirtualPortRegistry {
    fn inputs(&self) -> Vec<Port> {
        self.inputs.read().clone()
    }

    fn outputs(&self) -> Vec<Port> {
        self.outputs.read().clone()
    }

    fn has_output(&self, id: &str) -> bool {
        self.outputs.read().iter().any(|p| p.id == id)
    }

    fn send(&self, output_id: &str, message: &[u8]) -> Result<bool> {
        if !self.has_output(output_id) {
            return Ok(false);
        }
        if message.is_empty() {
            return Err(Error::MidiPort("Refusing to send an empty message".to_string()));
        }
        self.sent
            .write()
            .entry(output_id.to_string())
            .or_default()
            .push(message.to_vec());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_formats() {
        let plain = Port::new("1", "Keystation");
        assert_eq!(plain.label(), "Keystation");

        let versioned = Port::new("2", "Keystation").version("2.0");
        assert_eq!(versioned.label(), "Keystation/2.0");

        let full = Port::new("3", "Keystation").manufacturer("M-Audio").version("2.0");
        assert_eq!(full.label(), "M-Audio Keystation/2.0");

        let manufacturer_only = Port::new("4", "Keystation").manufacturer("M-Audio");
        assert_eq!(manufacturer_only.label(), "M-Audio Keystation");
    }

    #[test]
    fn test_detached_label_truncates_id() {
        assert_eq!(port_label("0123456789abcdef", None), "0123456789");
        assert_eq!(port_label("short", None), "short");

        let port = Port::new("0123456789abcdef", "Synth");
        assert_eq!(port_label(&port.id, Some(&port)), "Synth");
    }

    #[test]
    fn test_virtual_attach_detach() {
        let registry = VirtualPortRegistry::new();
        registry.attach_input(Port::new("in", "Keys"));
        registry.attach_output(Port::new("out", "Synth"));

        assert!(registry.has_input("in"));
        assert!(registry.has_output("out"));
        assert!(!registry.has_output("in"));

        assert!(registry.detach(PortType::Output, "out"));
        assert!(!registry.detach(PortType::Output, "out"));
        assert!(!registry.has_output("out"));
    }

    #[test]
    fn test_reattach_replaces_description() {
        let registry = VirtualPortRegistry::new();
        registry.attach_output(Port::new("out", "Synth"));
        registry.attach_output(Port::new("out", "Synth").version("3"));

        let outputs = registry.outputs();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].label(), "Synth/3");
    }

    #[test]
    fn test_send_to_missing_output_is_noop() {
        let registry = VirtualPortRegistry::new();
        assert!(!registry.send("nowhere", &[0x90, 60, 100]).unwrap());
        assert_eq!(registry.sent_count(), 0);
    }

    #[test]
    fn test_send_records_messages() {
        let registry = VirtualPortRegistry::new();
        registry.attach_output(Port::new("out", "Synth"));

        assert!(registry.send("out", &[0x90, 60, 100]).unwrap());
        assert!(registry.send("out", &[0x80, 60, 0]).unwrap());

        let sent = registry.take_sent("out");
        assert_eq!(sent, vec![vec![0x90, 60, 100], vec![0x80, 60, 0]]);
        assert!(registry.take_sent("out").is_empty());
    }
}
