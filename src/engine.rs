//! Junction session: routes, router, persistence and ports wired together.

use crate::config::JunctionConfig;
use crate::error::{Error, Result};
use junction_core::{
    load_routes, port_label, save_routes, ActivityMonitor, KeyValueStore, Port, PortActivity,
    PortRegistry, PortType, Route, RouteOutcome, RouteSettings, RouteStore, Router,
};
use std::sync::Arc;
use tracing::{info, warn};

#[cfg(feature = "midi-io")]
use junction_core::MessageSink;
#[cfg(feature = "midi-io")]
use junction_midi_io::{HardwarePorts, PortChanges};
#[cfg(feature = "midi-io")]
use std::sync::Weak;

/// One route as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteView {
    pub index: usize,
    pub source: String,
    pub destination: String,
    /// Source port is not attached right now.
    pub source_inactive: bool,
    /// Destination port is not attached right now.
    pub destination_inactive: bool,
    pub summary: String,
}

/// A routing session.
///
/// Every mutation is written through to the store. Messages reach the router
/// either from the hardware registry's input callbacks or through
/// [`handle_message`](Self::handle_message).
///
/// # Example
///
/// ```ignore
/// use junction::prelude::*;
///
/// let junction = Junction::builder().hardware().build()?;
/// let input = junction.resolve_port(PortType::Input, Some("keystation"))?;
/// let output = junction.resolve_port(PortType::Output, None)?;
///
/// junction.add_route(&input.id, &output.id, RouteSettings {
///     transpose: Transpose::new(-12)?,
///     ..Default::default()
/// })?;
/// ```
pub struct Junction {
    config: JunctionConfig,
    routes: Arc<RouteStore>,
    router: Arc<Router>,
    registry: Arc<dyn PortRegistry>,
    activity: Arc<ActivityMonitor>,
    store: Box<dyn KeyValueStore>,

    #[cfg(feature = "midi-io")]
    hardware: Option<Arc<HardwarePorts>>,
}

impl Junction {
    pub fn builder() -> crate::JunctionBuilder {
        crate::JunctionBuilder::default()
    }

    pub(crate) fn from_parts(
        config: JunctionConfig,
        store: Box<dyn KeyValueStore>,
        registry: Arc<dyn PortRegistry>,
        #[cfg(feature = "midi-io")] hardware: Option<Arc<HardwarePorts>>,
    ) -> Result<Self> {
        let routes = Arc::new(RouteStore::new());
        let activity = Arc::new(ActivityMonitor::new());
        let router = Arc::new(Router::new(
            Arc::clone(&routes),
            Arc::clone(&registry),
            Arc::clone(&activity),
        ));

        let junction = Self {
            config,
            routes,
            router,
            registry,
            activity,
            store,
            #[cfg(feature = "midi-io")]
            hardware,
        };

        // A store that can't be read must not block the session
        if let Err(e) = junction.load() {
            warn!("Could not read saved routes, starting empty: {}", e);
        }

        #[cfg(feature = "midi-io")]
        if let Some(hardware) = &junction.hardware {
            let sink: Weak<dyn MessageSink> = Arc::<Router>::downgrade(&junction.router);
            hardware.set_sink(sink);
            hardware.refresh()?;
        }

        Ok(junction)
    }

    pub fn config(&self) -> &JunctionConfig {
        &self.config
    }

    pub fn inputs(&self) -> Vec<Port> {
        self.registry.inputs()
    }

    pub fn outputs(&self) -> Vec<Port> {
        self.registry.outputs()
    }

    /// Routes can only be created while at least one input and one output exist.
    pub fn can_add_route(&self) -> bool {
        !self.registry.inputs().is_empty() && !self.registry.outputs().is_empty()
    }

    /// Append a route and save. Returns its index.
    pub fn add_route(&self, in_id: &str, out_id: &str, settings: RouteSettings) -> Result<usize> {
        if !self.can_add_route() {
            return Err(Error::NoPorts);
        }
        let index = self
            .routes
            .push(Route::new(in_id, out_id).with_settings(settings));
        info!("Added route {}: {} -> {}", index, in_id, out_id);
        self.save()?;
        Ok(index)
    }

    /// Replace a route's settings, keeping its ports. Saves.
    pub fn edit_route(&self, index: usize, settings: RouteSettings) -> Result<()> {
        let mut route = self
            .routes
            .get(index)
            .ok_or(junction_core::Error::RouteNotFound(index))?;
        route.apply_settings(settings);
        self.routes.replace(index, route)?;
        info!("Edited route {}", index);
        self.save()
    }

    /// Delete exactly one route and save. Later routes shift down by one.
    pub fn remove_route(&self, index: usize) -> Result<Route> {
        let route = self.routes.remove(index)?;
        info!("Removed route {}: {} -> {}", index, route.in_id, route.out_id);
        self.save()?;
        Ok(route)
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.list()
    }

    pub fn route_views(&self) -> Vec<RouteView> {
        let inputs = self.registry.inputs();
        let outputs = self.registry.outputs();

        self.routes
            .snapshot()
            .iter()
            .enumerate()
            .map(|(index, route)| {
                let input = inputs.iter().find(|p| p.id == route.in_id);
                let output = outputs.iter().find(|p| p.id == route.out_id);
                RouteView {
                    index,
                    source: port_label(&route.in_id, input),
                    destination: port_label(&route.out_id, output),
                    source_inactive: input.is_none(),
                    destination_inactive: output.is_none(),
                    summary: route.summary(),
                }
            })
            .collect()
    }

    /// Run one message from `input_id` through the router.
    pub fn handle_message(&self, input_id: &str, message: &[u8]) -> Vec<RouteOutcome> {
        self.router.dispatch(input_id, message)
    }

    /// Replace the in-memory routes with the stored ones. Returns how many were loaded.
    pub fn load(&self) -> Result<usize> {
        let routes = load_routes(self.store.as_ref(), &self.config.storage_key)?;
        let count = routes.len();
        self.routes.replace_all(routes);
        info!("Restored {} routes", count);
        Ok(count)
    }

    pub fn save(&self) -> Result<()> {
        save_routes(
            self.store.as_ref(),
            &self.config.storage_key,
            &self.routes.snapshot(),
        )?;
        Ok(())
    }

    /// Find a port by exact id, else by case-insensitive name fragment.
    /// `None` picks the first port.
    pub fn resolve_port(&self, port_type: PortType, query: Option<&str>) -> Result<Port> {
        let (ports, kind) = match port_type {
            PortType::Input => (self.registry.inputs(), "input"),
            PortType::Output => (self.registry.outputs(), "output"),
        };

        let found = match query {
            None => ports.into_iter().next(),
            Some(query) => {
                let needle = query.to_lowercase();
                match ports.iter().position(|p| p.id == query) {
                    Some(i) => Some(ports[i].clone()),
                    None => ports
                        .into_iter()
                        .find(|p| p.name.to_lowercase().contains(&needle)),
                }
            }
        };

        found.ok_or_else(|| Error::PortNotFound {
            kind,
            query: query.unwrap_or("<first>").to_string(),
        })
    }

    pub fn activity(&self) -> Vec<PortActivity> {
        self.activity.snapshot()
    }

    pub fn reset_activity(&self) {
        self.activity.reset();
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn registry(&self) -> &Arc<dyn PortRegistry> {
        &self.registry
    }

    pub fn is_hardware(&self) -> bool {
        #[cfg(feature = "midi-io")]
        {
            self.hardware.is_some()
        }
        #[cfg(not(feature = "midi-io"))]
        {
            false
        }
    }

    /// Rescan hardware ports now instead of waiting for the next interval.
    #[cfg(feature = "midi-io")]
    pub fn refresh_ports(&self) -> Result<PortChanges> {
        match &self.hardware {
            Some(hardware) => Ok(hardware.refresh()?),
            None => Ok(PortChanges::default()),
        }
    }
}

impl Drop for Junction {
    fn drop(&mut self) {
        #[cfg(feature = "midi-io")]
        if let Some(hardware) = &self.hardware {
            hardware.clear_sink();
        }
    }
}

impl std::fmt::Debug for Junction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Junction")
            .field("config", &self.config)
            .field("routes", &self.routes.len())
            .field("hardware", &self.is_hardware())
            .finish_non_exhaustive()
    }
}
