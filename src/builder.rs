//! Builder for configuring and constructing a `Junction`.

use crate::config::JunctionConfig;
use crate::{Junction, Result};
use junction_core::{JsonFileStore, KeyValueStore, PortRegistry, VirtualPortRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "midi-io")]
use junction_midi_io::HardwarePorts;

/// Without `.hardware()` or `.registry()` the session runs against an empty
/// [`VirtualPortRegistry`]. Routes are loaded from the store during
/// [`build`](Self::build).
///
/// # Example
///
/// ```ignore
/// use junction::prelude::*;
///
/// let junction = Junction::builder()
///     .client_name("studio")
///     .hardware()
///     .build()?;
///
/// for view in junction.route_views() {
///     println!("{} -> {}", view.source, view.destination);
/// }
/// ```
#[derive(Default)]
pub struct JunctionBuilder {
    config: JunctionConfig,
    store: Option<Box<dyn KeyValueStore>>,
    registry: Option<Arc<dyn PortRegistry>>,

    #[cfg(feature = "midi-io")]
    enable_hardware: bool,
}

impl JunctionBuilder {
    /// Replace every setting at once, e.g. with one read from a file.
    pub fn config(mut self, config: JunctionConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: "junction"
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.config.client_name = name.into();
        self
    }

    /// Ignored when a store is supplied with `.store()`.
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store_path = path.into();
        self
    }

    /// Default: "mj.routes"
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.config.storage_key = key.into();
        self
    }

    /// `Duration::ZERO` turns automatic rescans off. Anything else is
    /// rounded up to whole milliseconds.
    pub fn rescan_interval(mut self, interval: Duration) -> Self {
        let millis = interval.as_nanos().div_ceil(1_000_000);
        self.config.rescan_interval_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    pub fn store(mut self, store: impl KeyValueStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Use a caller-owned registry. Messages for it go through
    /// [`Junction::handle_message`].
    pub fn registry(mut self, registry: Arc<dyn PortRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Attach to the platform's MIDI ports.
    #[cfg(feature = "midi-io")]
    pub fn hardware(mut self) -> Self {
        self.enable_hardware = true;
        self
    }

    pub fn build(self) -> Result<Junction> {
        let store = self
            .store
            .unwrap_or_else(|| Box::new(JsonFileStore::new(self.config.store_path.clone())));

        #[cfg(feature = "midi-io")]
        let hardware = if self.enable_hardware && self.registry.is_none() {
            Some(Arc::new(HardwarePorts::open(
                self.config.client_name.clone(),
                self.config.rescan_interval(),
            )?))
        } else {
            None
        };

        #[cfg(feature = "midi-io")]
        let registry: Arc<dyn PortRegistry> = match (self.registry, &hardware) {
            (Some(registry), _) => registry,
            (None, Some(hardware)) => hardware.clone() as Arc<dyn PortRegistry>,
            (None, None) => Arc::new(VirtualPortRegistry::new()),
        };

        #[cfg(not(feature = "midi-io"))]
        let registry: Arc<dyn PortRegistry> = self
            .registry
            .unwrap_or_else(|| Arc::new(VirtualPortRegistry::new()));

        let junction = Junction::from_parts(
            self.config,
            store,
            registry,
            #[cfg(feature = "midi-io")]
            hardware,
        )?;
        Ok(junction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use junction_core::MemoryStore;

    fn interval_after(interval: Duration) -> Option<Duration> {
        JunctionBuilder::default()
            .store(MemoryStore::new())
            .rescan_interval(interval)
            .build()
            .unwrap()
            .config()
            .rescan_interval()
    }

    #[test]
    fn test_rescan_interval_rounds_up() {
        assert_eq!(
            interval_after(Duration::from_micros(300)),
            Some(Duration::from_millis(1))
        );
        assert_eq!(
            interval_after(Duration::from_micros(2500)),
            Some(Duration::from_millis(3))
        );
        assert_eq!(
            interval_after(Duration::from_millis(250)),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_zero_interval_disables_rescans() {
        assert_eq!(interval_after(Duration::ZERO), None);
    }
}
