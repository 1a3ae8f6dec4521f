//! Per-port message counters, bumped from MIDI callback threads.

use crate::port::PortType;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortActivity {
    pub port_id: String,
    pub port_type: PortType,
    pub messages: u64,
}

#[derive(Debug, Default)]
pub struct ActivityMonitor {
    received: DashMap<String, AtomicU64>,
    forwarded: DashMap<String, AtomicU64>,
}

impl ActivityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A message reached a route whose source is `input_id`.
    pub fn record_received(&self, input_id: &str) {
        Self::bump(&self.received, input_id);
    }

    /// A message went out on `output_id`.
    pub fn record_forwarded(&self, output_id: &str) {
        Self::bump(&self.forwarded, output_id);
    }

    pub fn received(&self, input_id: &str) -> u64 {
        Self::count(&self.received, input_id)
    }

    pub fn forwarded(&self, output_id: &str) -> u64 {
        Self::count(&self.forwarded, output_id)
    }

    /// Inputs first, then outputs, each sorted by port id.
    pub fn snapshot(&self) -> Vec<PortActivity> {
        let mut inputs = Self::collect(&self.received, PortType::Input);
        let mut outputs = Self::collect(&self.forwarded, PortType::Output);
        inputs.sort_by(|a, b| a.port_id.cmp(&b.port_id));
        outputs.sort_by(|a, b| a.port_id.cmp(&b.port_id));
        inputs.extend(outputs);
        inputs
    }

    pub fn reset(&self) {
        self.received.clear();
        self.forwarded.clear();
    }

    fn bump(counters: &DashMap<String, AtomicU64>, id: &str) {
        // Fast path avoids allocating the key once the port is known
        if let Some(counter) = counters.get(id) {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }
        counters
            .entry(id.to_string())
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    fn count(counters: &DashMap<String, AtomicU64>, id: &str) -> u64 {
        counters
            .get(id)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn collect(counters: &DashMap<String, AtomicU64>, port_type: PortType) -> Vec<PortActivity> {
        counters
            .iter()
            .map(|entry| PortActivity {
                port_id: entry.key().clone(),
                port_type,
                messages: entry.value().load(Ordering::Relaxed),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let monitor = ActivityMonitor::new();
        monitor.record_received("keys");
        monitor.record_received("keys");
        monitor.record_forwarded("synth");

        assert_eq!(monitor.received("keys"), 2);
        assert_eq!(monitor.forwarded("synth"), 1);
        assert_eq!(monitor.forwarded("keys"), 0);
    }

    #[test]
    fn test_snapshot_order() {
        let monitor = ActivityMonitor::new();
        monitor.record_forwarded("b-out");
        monitor.record_forwarded("a-out");
        monitor.record_received("z-in");

        let snapshot = monitor.snapshot();
        let ids: Vec<&str> = snapshot.iter().map(|a| a.port_id.as_str()).collect();
        assert_eq!(ids, vec!["z-in", "a-out", "b-out"]);
        assert_eq!(snapshot[0].port_type, PortType::Input);
    }

    #[test]
    fn test_reset() {
        let monitor = ActivityMonitor::new();
        monitor.record_received("keys");
        monitor.reset();
        assert!(monitor.snapshot().is_empty());
    }
}
