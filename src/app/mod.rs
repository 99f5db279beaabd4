//! Application instances.
//!
//! An [`ApplicationInstance`] is the isolated unit of rendering: it owns its
//! router history, query cache and head manager, and is dropped once its
//! request is answered. The [`ApplicationFactory`] is the only thing shared
//! between requests, and it holds nothing mutable.

pub mod api;
pub mod component;
pub mod head;
pub mod query;
pub mod view;

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::router::{InstanceRouter, RouteTable, ViewStatus};
use api::DataApi;
use head::Head;
use query::{HydrationState, QueryClient};
use view::Markup;

/// One fully isolated application, built for a single request.
#[derive(Debug)]
pub struct ApplicationInstance {
    pub id: Uuid,
    pub router: InstanceRouter,
    pub query: QueryClient,
    pub head: Head,
    pub api: Arc<dyn DataApi>,
    /// Rendered root view once a route has been resolved.
    pub tree: Option<Markup>,
    /// Client modules whose views took part in the render, in build order.
    pub modules: Vec<String>,
    pub status: ViewStatus,
}

impl ApplicationInstance {
    pub(crate) fn record_module(&mut self, module: &str) {
        if !self.modules.iter().any(|m| m == module) {
            self.modules.push(module.to_string());
        }
    }
}

/// Builds fresh application instances over the shared route table.
#[derive(Debug, Clone)]
pub struct ApplicationFactory {
    routes: Arc<RouteTable>,
    api: Arc<dyn DataApi>,
}

impl ApplicationFactory {
    pub fn new(routes: Arc<RouteTable>, api: Arc<dyn DataApi>) -> Self {
        Self { routes, api }
    }

    /// A new instance, optionally seeded with a previous query snapshot.
    pub fn build(&self, initial_state: Option<HydrationState>) -> ApplicationInstance {
        let id = Uuid::new_v4();
        let mut query = QueryClient::new();
        if let Some(state) = initial_state {
            query.hydrate(state);
        }
        debug!(instance = %id, seeded = query.len(), "Application instance created");
        ApplicationInstance {
            id,
            router: InstanceRouter::new(Arc::clone(&self.routes)),
            query,
            head: Head::new(),
            api: Arc::clone(&self.api),
            tree: None,
            modules: Vec::new(),
            status: ViewStatus::Found,
        }
    }
}
