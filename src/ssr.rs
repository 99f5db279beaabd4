//! The render pipeline: build, resolve, render, compose.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument};

use crate::app::ApplicationFactory;
use crate::app::query::HydrationState;
use crate::compose::compose;
use crate::error::RenderError;
use crate::manifest::AssetManifest;
use crate::render::render;
use crate::router::{self, ViewStatus};
use crate::template::Template;

/// A fully composed document.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    pub status: ViewStatus,
    pub route: &'static str,
}

/// Process-scoped render state: the template, the optional asset manifest
/// and the factory producing per-request application instances.
#[derive(Debug, Clone)]
pub struct SsrPipeline {
    template: Arc<Template>,
    manifest: Option<Arc<AssetManifest>>,
    factory: ApplicationFactory,
}

impl SsrPipeline {
    pub fn new(
        template: Arc<Template>,
        manifest: Option<Arc<AssetManifest>>,
        factory: ApplicationFactory,
    ) -> Self {
        Self {
            template,
            manifest,
            factory,
        }
    }

    /// Render `url` (path plus query) in a fresh application instance.
    #[instrument(
        name = "ssr.render",
        level = "debug",
        skip(self, initial_state),
        fields(
            instance = tracing::field::Empty,
            route = tracing::field::Empty,
            elapsed_ms = tracing::field::Empty
        )
    )]
    pub async fn render_url(
        &self,
        url: &str,
        initial_state: Option<HydrationState>,
    ) -> Result<RenderedPage, RenderError> {
        let started = Instant::now();
        let mut instance = self.factory.build(initial_state);
        let span = tracing::Span::current();
        span.record("instance", tracing::field::display(instance.id));

        let resolution = router::resolve(&mut instance, url).await?;
        span.record("route", resolution.route);

        let fetches = instance.query.fetch_count();
        let output = render(instance)?;
        let preload = self
            .manifest
            .as_ref()
            .map(|m| m.preload_links(output.modules.as_slice()));
        let html = compose(
            &self.template,
            &output.markup,
            &output.head,
            &output.hydration,
            preload.as_deref(),
        )?;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        span.record("elapsed_ms", elapsed_ms);
        debug!(
            status = ?output.status,
            fetches,
            queries = output.hydration.queries.len(),
            bytes = html.len(),
            "Page rendered"
        );

        Ok(RenderedPage {
            html,
            status: output.status,
            route: resolution.route,
        })
    }

    pub fn factory(&self) -> &ApplicationFactory {
        &self.factory
    }
}
