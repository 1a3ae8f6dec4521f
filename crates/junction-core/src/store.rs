//! Ordered route list.
//!
//! Readers (MIDI callbacks) load a snapshot lock-free; writers clone the
//! list, modify it and swap it in. Identity is positional: removing a route
//! shifts every later index down by one.

use crate::error::{Error, Result};
use crate::route::Route;
use arc_swap::{ArcSwap, Guard};
use parking_lot::Mutex;
use std::sync::Arc;

pub struct RouteStore {
    routes: ArcSwap<Vec<Route>>,
    /// Serializes writers so concurrent edits cannot drop each other.
    write_lock: Mutex<()>,
}

impl RouteStore {
    pub fn new() -> Self {
        Self::from_routes(Vec::new())
    }

    pub fn from_routes(routes: Vec<Route>) -> Self {
        Self {
            routes: ArcSwap::from_pointee(routes),
            write_lock: Mutex::new(()),
        }
    }

    /// Lock-free snapshot of the current list.
    pub fn snapshot(&self) -> Guard<Arc<Vec<Route>>> {
        self.routes.load()
    }

    pub fn list(&self) -> Vec<Route> {
        (**self.routes.load()).clone()
    }

    pub fn len(&self) -> usize {
        self.routes.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.load().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Route> {
        self.routes.load().get(index).cloned()
    }

    /// Append a route, returning its index.
    pub fn push(&self, route: Route) -> usize {
        self.update(|routes| {
            routes.push(route);
            routes.len() - 1
        })
    }

    pub fn replace(&self, index: usize, route: Route) -> Result<()> {
        self.update(|routes| match routes.get_mut(index) {
            Some(slot) => {
                *slot = route;
                Ok(())
            }
            None => Err(Error::RouteNotFound(index)),
        })
    }

    /// Remove exactly one route.
    pub fn remove(&self, index: usize) -> Result<Route> {
        self.update(|routes| {
            if index < routes.len() {
                Ok(routes.remove(index))
            } else {
                Err(Error::RouteNotFound(index))
            }
        })
    }

    pub fn replace_all(&self, routes: Vec<Route>) {
        let _guard = self.write_lock.lock();
        self.routes.store(Arc::new(routes));
    }

    fn update<T>(&self, f: impl FnOnce(&mut Vec<Route>) -> T) -> T {
        let _guard = self.write_lock.lock();
        let mut routes = (**self.routes.load()).clone();
        let result = f(&mut routes);
        self.routes.store(Arc::new(routes));
        result
    }
}

impl Default for RouteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RouteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteStore")
            .field("num_routes", &self.len())
            .finish()
    }
}
