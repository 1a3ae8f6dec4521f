//! Platform port registry backed by a dedicated I/O thread.
//!
//! The thread owns every midir connection. It rescans on a fixed interval
//! (hot-plug), attaching new ports and dropping vanished ones, and performs
//! sends handed to it by [`HardwarePorts::send`]. Callers see the attached
//! ports through lock-free snapshots.

use crate::changes::{diff_ports, PortChanges};
use crate::error::{Error, Result};
use crate::io::{InputSet, OutputSet, SinkSlot};
use arc_swap::ArcSwap;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use junction_core::{MessageSink, Port, PortRegistry, PortType};
use midir::MidiInput;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Wake-up period when automatic rescans are off.
const IDLE_TIMEOUT: Duration = Duration::from_millis(500);
const COMMAND_CAPACITY: usize = 1024;

enum IoCommand {
    Rescan(Sender<Result<PortChanges>>),
    Send { port_id: String, bytes: Vec<u8> },
    Shutdown,
}

pub struct HardwarePorts {
    command_sender: Sender<IoCommand>,
    inputs: Arc<ArcSwap<Vec<Port>>>,
    outputs: Arc<ArcSwap<Vec<Port>>>,
    sink: SinkSlot,
}

impl HardwarePorts {
    /// Start the I/O thread. Fails when the platform has no MIDI backend.
    ///
    /// No ports are attached until the first rescan, either from
    /// [`refresh`](Self::refresh) or the periodic timer.
    pub fn open(client_name: impl Into<String>, rescan_interval: Option<Duration>) -> Result<Self> {
        let client_name = client_name.into();

        // Open a client once here so an unsupported platform surfaces to the
        // caller instead of dying silently on the I/O thread.
        drop(MidiInput::new(&format!("{}-check", client_name))?);

        let (command_sender, command_receiver) = bounded(COMMAND_CAPACITY);
        let inputs = Arc::new(ArcSwap::from_pointee(Vec::new()));
        let outputs = Arc::new(ArcSwap::from_pointee(Vec::new()));
        let sink: SinkSlot = Arc::new(RwLock::new(None));

        let sink_clone = Arc::clone(&sink);
        let inputs_clone = Arc::clone(&inputs);
        let outputs_clone = Arc::clone(&outputs);

        // Connections are created and dropped on the I/O thread only
        thread::Builder::new()
            .name("junction-midi-io".to_string())
            .spawn(move || {
                let io = IoThread {
                    inputs: InputSet::new(client_name.clone(), sink_clone),
                    outputs: OutputSet::new(client_name),
                    input_snapshot: inputs_clone,
                    output_snapshot: outputs_clone,
                };
                io.run(command_receiver, rescan_interval);
            })
            .map_err(|e| Error::MidiDevice(format!("Failed to spawn MIDI I/O thread: {}", e)))?;

        Ok(Self {
            command_sender,
            inputs,
            outputs,
            sink,
        })
    }

    /// Install the receiver for every input's messages.
    pub fn set_sink(&self, sink: Weak<dyn MessageSink>) {
        *self.sink.write() = Some(sink);
    }

    pub fn clear_sink(&self) {
        *self.sink.write() = None;
    }

    /// Rescan now and wait for the result.
    pub fn refresh(&self) -> Result<PortChanges> {
        let (reply_sender, reply_receiver) = bounded(1);
        self.command_sender
            .send(IoCommand::Rescan(reply_sender))
            .map_err(|_| Error::ThreadStopped)?;
        reply_receiver.recv().map_err(|_| Error::ThreadStopped)?
    }
}

impl PortRegistry for HardwarePorts {
    fn inputs(&self) -> Vec<Port> {
        self.inputs.load().as_ref().clone()
    }

    fn outputs(&self) -> Vec<Port> {
        self.outputs.load().as_ref().clone()
    }

    fn has_output(&self, id: &str) -> bool {
        self.outputs.load().iter().any(|p| p.id == id)
    }

    fn send(&self, output_id: &str, message: &[u8]) -> junction_core::Result<bool> {
        if !self.has_output(output_id) {
            return Ok(false);
        }
        self.command_sender
            .try_send(IoCommand::Send {
                port_id: output_id.to_string(),
                bytes: message.to_vec(),
            })
            .map_err(|e| junction_core::Error::MidiPort(format!("MIDI output queue: {}", e)))?;
        Ok(true)
    }
}

impl Drop for HardwarePorts {
    fn drop(&mut self) {
        let _ = self.command_sender.send(IoCommand::Shutdown);
    }
}

impl std::fmt::Debug for HardwarePorts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HardwarePorts")
            .field("num_inputs", &self.inputs.load().len())
            .field("num_outputs", &self.outputs.load().len())
            .finish()
    }
}

struct IoThread {
    inputs: InputSet,
    outputs: OutputSet,
    input_snapshot: Arc<ArcSwap<Vec<Port>>>,
    output_snapshot: Arc<ArcSwap<Vec<Port>>>,
}

impl IoThread {
    fn run(mut self, commands: Receiver<IoCommand>, rescan_interval: Option<Duration>) {
        let timeout = rescan_interval.unwrap_or(IDLE_TIMEOUT);

        loop {
            match commands.recv_timeout(timeout) {
                Ok(IoCommand::Rescan(reply)) => {
                    let result = self.rescan();
                    let _ = reply.send(result);
                }
                Ok(IoCommand::Send { port_id, bytes }) => {
                    match self.outputs.send(&port_id, &bytes) {
                        Ok(true) => {}
                        Ok(false) => debug!("MIDI output {} detached before send", port_id),
                        Err(e) => warn!("MIDI send to {} failed: {}", port_id, e),
                    }
                }
                Ok(IoCommand::Shutdown) => break,
                Err(RecvTimeoutError::Timeout) => {
                    if rescan_interval.is_some() {
                        if let Err(e) = self.rescan() {
                            debug!("Periodic MIDI rescan failed: {}", e);
                        }
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.inputs.close_all();
        self.outputs.close_all();
        self.publish();
        debug!("MIDI I/O thread stopped");
    }

    fn rescan(&mut self) -> Result<PortChanges> {
        let found_inputs = self.inputs.enumerate()?;
        let found_outputs = self.outputs.enumerate()?;

        let mut changes = PortChanges::default();

        let (attached, detached) = diff_ports(&self.inputs.ports(), &found_inputs);
        for port in detached {
            if let Some(port) = self.inputs.detach(&port.id) {
                changes.detached.push((PortType::Input, port));
            }
        }
        for port in attached {
            match self.inputs.attach(port.clone()) {
                Ok(()) => changes.attached.push((PortType::Input, port)),
                Err(e) => warn!("Could not open MIDI input {}: {}", port.name, e),
            }
        }

        let (attached, detached) = diff_ports(&self.outputs.ports(), &found_outputs);
        for port in detached {
            if let Some(port) = self.outputs.detach(&port.id) {
                changes.detached.push((PortType::Output, port));
            }
        }
        for port in attached {
            match self.outputs.attach(port.clone()) {
                Ok(()) => changes.attached.push((PortType::Output, port)),
                Err(e) => warn!("Could not open MIDI output {}: {}", port.name, e),
            }
        }

        if !changes.is_empty() {
            for (port_type, port) in &changes.attached {
                info!("MIDI {:?} attached: {}", port_type, port.label());
            }
            for (port_type, port) in &changes.detached {
                info!("MIDI {:?} detached: {}", port_type, port.label());
            }
            self.publish();
        }

        Ok(changes)
    }

    fn publish(&self) {
        self.input_snapshot.store(Arc::new(self.inputs.ports()));
        self.output_snapshot.store(Arc::new(self.outputs.ports()));
    }
}
