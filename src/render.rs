//! Serializes a resolved application instance.
//!
//! The view tree was rendered to markup while resolving, once each page had
//! its data. Here the instance's head and query cache are serialized
//! alongside it, so nothing awaits.

use crate::app::ApplicationInstance;
use crate::app::head::HeadPayload;
use crate::app::query::HydrationState;
use crate::error::RenderError;
use crate::router::ViewStatus;

/// Everything the compositor needs from one render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub markup: String,
    pub head: HeadPayload,
    pub hydration: HydrationState,
    /// Client modules that took part, for preload-link lookup.
    pub modules: Vec<String>,
    pub status: ViewStatus,
}

/// Render `instance` and consume it.
pub fn render(instance: ApplicationInstance) -> Result<RenderOutput, RenderError> {
    let tree = instance.tree.ok_or(RenderError::NotResolved)?;
    Ok(RenderOutput {
        markup: tree.into_string(),
        head: instance.head.render(),
        hydration: instance.query.dehydrate(),
        modules: instance.modules,
        status: instance.status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ApplicationFactory;
    use crate::app::api::{DataApi, RawResponse};
    use crate::error::FetchError;
    use crate::router::{self, routes};
    use crate::template::Marker;
    use async_trait::async_trait;
    use std::sync::Arc;

    #[derive(Debug)]
    struct NoApi;

    #[async_trait]
    impl DataApi for NoApi {
        async fn get_raw(&self, path: &str) -> Result<RawResponse, FetchError> {
            Err(FetchError::Status {
                url: path.to_string(),
                status: 503,
            })
        }
    }

    fn factory() -> ApplicationFactory {
        ApplicationFactory::new(Arc::new(routes::route_table().unwrap()), Arc::new(NoApi))
    }

    #[test]
    fn test_unresolved_instance_is_an_error() {
        let instance = factory().build(None);
        assert!(matches!(render(instance), Err(RenderError::NotResolved)));
    }

    #[tokio::test]
    async fn test_render_collects_markup_head_and_modules() {
        let mut instance = factory().build(None);
        router::resolve(&mut instance, "/glossary-tes").await.unwrap();
        let output = render(instance).unwrap();

        assert!(output.markup.starts_with(r#"<div id="layout">"#));
        assert!(output.markup.contains("Глоссарий TES"));
        assert_eq!(
            output.head.get(Marker::Title),
            Some("<title>Глоссарий TES | Tamriel Library</title>")
        );
        assert_eq!(
            output.modules,
            ["src/views/GlossaryTESView.vue", "src/App.vue"]
        );
        assert!(output.hydration.is_empty());
        assert_eq!(output.status, ViewStatus::Found);
    }

    #[tokio::test]
    async fn test_unmatched_path_renders_not_found_view() {
        let mut instance = factory().build(None);
        let resolution = router::resolve(&mut instance, "/category/abc").await.unwrap();
        assert_eq!(resolution.status, ViewStatus::NotFound);

        let output = render(instance).unwrap();
        assert!(output.markup.contains("404"));
        assert_eq!(output.status, ViewStatus::NotFound);
    }
}
