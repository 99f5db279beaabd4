//! Server-side rendering front door for the Tamriel Library site.
//!
//! Each request gets its own application instance: a router with in-memory
//! history, a query cache and a head manager. The instance resolves the URL,
//! fetches what its views need from the Data API, renders to markup, and the
//! result is spliced into the HTML shell together with the head tags, asset
//! preload links and a hydration snapshot of the query cache.
//!
//! # Modules
//!
//! - [`server`]: HTTP front door, render cache policy, static assets, API proxy
//! - [`ssr`]: the build → resolve → render → compose pipeline
//! - [`app`]: application instances, query cache, head manager, view tree
//! - [`router`]: route patterns, the route table and resolution
//! - [`pages`]: the routed views
//! - [`cache`]: bounded, expiring cache of composed pages

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod app;
pub mod cache;
pub mod compose;
pub mod config;
pub mod error;
pub mod manifest;
pub mod pages;
pub mod render;
pub mod router;
pub mod server;
pub mod ssr;
pub mod telemetry;
pub mod template;

use std::sync::Arc;

use tracing::info;

use crate::app::ApplicationFactory;
use crate::app::api::{DataApi, HttpDataApi};
use crate::cache::{CachePolicy, RenderCache};
use crate::config::AppConfig;
use crate::error::StartupError;
use crate::manifest::AssetManifest;
use crate::ssr::SsrPipeline;
use crate::template::Template;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Template, manifest and application factory.
    pub pipeline: Arc<SsrPipeline>,
    /// Composed pages shared between requests.
    pub cache: Arc<RenderCache>,
    pub policy: Arc<CachePolicy>,
    /// Data API client, also used by the proxy.
    pub api: Arc<dyn DataApi>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Load the template (and the asset manifest in production) and build
    /// the Data API client. Any failure is fatal.
    pub async fn from_config(config: Arc<AppConfig>) -> Result<Self, StartupError> {
        let template = Template::load(&config.template_path()).await?;
        let manifest = if config.app.mode.is_production() {
            Some(AssetManifest::load(&config.paths.manifest).await?)
        } else {
            None
        };
        let api: Arc<dyn DataApi> = Arc::new(HttpDataApi::new(&config.data_api)?);
        Self::with_api(config, template, manifest, api)
    }

    /// Assemble state around an already loaded template and a given API.
    pub fn with_api(
        config: Arc<AppConfig>,
        template: Template,
        manifest: Option<AssetManifest>,
        api: Arc<dyn DataApi>,
    ) -> Result<Self, StartupError> {
        let routes = Arc::new(router::routes::route_table()?);
        info!(
            name: "routes.compiled",
            routes = routes.len(),
            mode = ?config.app.mode,
            preload = manifest.is_some(),
            "Route table compiled"
        );
        let factory = ApplicationFactory::new(routes, Arc::clone(&api));
        let pipeline = SsrPipeline::new(Arc::new(template), manifest.map(Arc::new), factory);

        Ok(Self {
            pipeline: Arc::new(pipeline),
            cache: Arc::new(RenderCache::from_config(&config.cache)),
            policy: Arc::new(CachePolicy::from_config(&config.cache)),
            api,
            config,
        })
    }
}
