//! Per-message dispatch across every route whose source matches.
//!
//! Each message is handled synchronously on the thread that delivered it.
//! Nothing is queued and nothing escapes: missing destinations are skipped
//! and failed sends are logged.

use crate::activity::ActivityMonitor;
use crate::port::PortRegistry;
use crate::route::RouteDecision;
use crate::store::RouteStore;
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Forwarded,
    Filtered,
    ActiveSense,
    /// Transposed note fell outside the MIDI range.
    OutOfRange,
    /// Destination port not attached right now.
    NoDestination,
    SendFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteOutcome {
    pub route_index: usize,
    pub outcome: Outcome,
}

/// Receiver for raw messages arriving on an input port.
///
/// Called from platform MIDI threads; implementations must not block.
pub trait MessageSink: Send + Sync {
    fn on_message(&self, input_id: &str, message: &[u8]);
}

#[derive(Clone)]
pub struct Router {
    routes: Arc<RouteStore>,
    registry: Arc<dyn PortRegistry>,
    activity: Arc<ActivityMonitor>,
}

impl Router {
    pub fn new(
        routes: Arc<RouteStore>,
        registry: Arc<dyn PortRegistry>,
        activity: Arc<ActivityMonitor>,
    ) -> Self {
        Self {
            routes,
            registry,
            activity,
        }
    }

    /// Run `message` from `input_id` through every matching route, in list order.
    pub fn dispatch(&self, input_id: &str, message: &[u8]) -> Vec<RouteOutcome> {
        let routes = self.routes.snapshot();
        let mut outcomes = Vec::new();

        for (route_index, route) in routes.iter().enumerate() {
            if route.in_id != input_id {
                continue;
            }
            self.activity.record_received(input_id);

            let outcome = match route.process(message) {
                RouteDecision::Filtered => Outcome::Filtered,
                RouteDecision::ActiveSense => Outcome::ActiveSense,
                RouteDecision::OutOfRange => {
                    debug!("Route {}: transposed note out of range, dropping", route_index);
                    Outcome::OutOfRange
                }
                RouteDecision::Forward(bytes) => {
                    match self.registry.send(&route.out_id, &bytes) {
                        Ok(true) => {
                            self.activity.record_forwarded(&route.out_id);
                            Outcome::Forwarded
                        }
                        Ok(false) => {
                            debug!(
                                "Route {}: output {} not attached, dropping",
                                route_index, route.out_id
                            );
                            Outcome::NoDestination
                        }
                        Err(e) => {
                            warn!("Route {}: send to {} failed: {}", route_index, route.out_id, e);
                            Outcome::SendFailed
                        }
                    }
                }
            };

            trace!(route = route_index, ?outcome, "{} -> {}", input_id, route.out_id);
            outcomes.push(RouteOutcome {
                route_index,
                outcome,
            });
        }

        outcomes
    }

    pub fn routes(&self) -> &Arc<RouteStore> {
        &self.routes
    }

    pub fn registry(&self) -> &Arc<dyn PortRegistry> {
        &self.registry
    }

    pub fn activity(&self) -> &Arc<ActivityMonitor> {
        &self.activity
    }
}

impl MessageSink for Router {
    fn on_message(&self, input_id: &str, message: &[u8]) {
        self.dispatch(input_id, message);
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}
