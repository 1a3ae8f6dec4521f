//! Port set differences between two scans.

use junction_core::{Port, PortType};

/// Ports that appeared or vanished since the previous scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortChanges {
    pub attached: Vec<(PortType, Port)>,
    pub detached: Vec<(PortType, Port)>,
}

impl PortChanges {
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty() && self.detached.is_empty()
    }
}

/// Compare by id: `(newly found, no longer present)`.
pub fn diff_ports(known: &[Port], found: &[Port]) -> (Vec<Port>, Vec<Port>) {
    let attached = found
        .iter()
        .filter(|p| !known.iter().any(|k| k.id == p.id))
        .cloned()
        .collect();
    let detached = known
        .iter()
        .filter(|k| !found.iter().any(|p| p.id == k.id))
        .cloned()
        .collect();
    (attached, detached)
}

/// Whether a port belongs to one of our own clients.
///
/// ALSA lists every sequencer port as `client:port`, including the
/// `{client_name}-in` / `{client_name}-out` ports our connections create.
/// Attaching those would open yet another connection on every rescan.
pub fn is_own_port(client_name: &str, port_name: &str) -> bool {
    let Some((client, port)) = port_name.split_once(':') else {
        return false;
    };
    client == client_name
        || port.starts_with(&format!("{}-in", client_name))
        || port.starts_with(&format!("{}-out", client_name))
}

/// Drop the ports [`is_own_port`] recognises.
pub fn without_own_ports(client_name: &str, ports: Vec<Port>) -> Vec<Port> {
    ports
        .into_iter()
        .filter(|p| !is_own_port(client_name, &p.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_by_id() {
        let known = vec![Port::new("a", "Keys"), Port::new("b", "Pads")];
        let found = vec![Port::new("b", "Pads"), Port::new("c", "Synth")];

        let (attached, detached) = diff_ports(&known, &found);
        assert_eq!(attached, vec![Port::new("c", "Synth")]);
        assert_eq!(detached, vec![Port::new("a", "Keys")]);
    }

    #[test]
    fn test_diff_ignores_name_changes() {
        let known = vec![Port::new("a", "Keys")];
        let found = vec![Port::new("a", "Keys (renamed)")];
        let (attached, detached) = diff_ports(&known, &found);
        assert!(attached.is_empty());
        assert!(detached.is_empty());
    }

    #[test]
    fn test_own_ports_recognised() {
        assert!(is_own_port("junction", "junction:junction-in 128:0"));
        assert!(is_own_port("junction", "junction:junction-out 129:0"));
        // Client renamed by the sequencer when the name is taken
        assert!(is_own_port("junction", "junction-2:junction-out 130:0"));

        assert!(!is_own_port("junction", "Midi Through:Midi Through Port-0 14:0"));
        assert!(!is_own_port("junction", "Keystation 49:Keystation 49 MIDI 1 20:0"));
        // Non-ALSA backends have no client prefix
        assert!(!is_own_port("junction", "junction"));
        assert!(!is_own_port("studio", "junction:junction-in 128:0"));
    }

    #[test]
    fn test_rescan_of_own_ports_converges() {
        let hardware = vec![Port::new("20:0", "Keystation 49:Keystation 49 MIDI 1 20:0")];
        let mut found = hardware.clone();
        found.push(Port::new("128:0", "junction:junction-in 128:0"));
        found.push(Port::new("129:0", "junction:junction-out 129:0"));

        let found = without_own_ports("junction", found);
        let (attached, detached) = diff_ports(&hardware, &found);
        assert!(attached.is_empty());
        assert!(detached.is_empty());
    }

    #[test]
    fn test_is_empty() {
        let mut changes = PortChanges::default();
        assert!(changes.is_empty());
        changes.attached.push((PortType::Input, Port::new("a", "Keys")));
        assert!(!changes.is_empty());
    }
}
