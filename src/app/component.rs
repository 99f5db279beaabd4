//! Page components and the context they build in.

use async_trait::async_trait;
use leptos::prelude::IntoView;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::api::DataApi;
use super::head::Head;
use super::query::{QueryClient, QueryKey, StaleTime};
use super::view::Markup;
use crate::error::{FetchError, RenderError};
use crate::router::RouteMatch;

/// What a page produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageView {
    Ready(Markup),
    /// The page's data does not exist; render the not-found view instead.
    NotFound,
}

impl PageView {
    /// Render `view` as this page's markup.
    pub fn ready(view: impl IntoView) -> Self {
        Self::Ready(Markup::render(view))
    }
}

/// A data query: its key, freshness and the Data API path that serves it.
#[derive(Debug, Clone)]
pub struct Query {
    pub key: QueryKey,
    pub stale_time: StaleTime,
    pub path: String,
}

/// Everything a page may touch while building. All of it belongs to one
/// application instance.
#[derive(Debug)]
pub struct ViewContext<'a> {
    pub route: &'a RouteMatch,
    pub query: &'a mut QueryClient,
    pub head: &'a mut Head,
    pub api: &'a dyn DataApi,
}

impl ViewContext<'_> {
    /// Fetch through the instance's query cache.
    pub async fn fetch(&mut self, query: &Query) -> Result<Value, FetchError> {
        let api = self.api;
        let path = query.path.as_str();
        self.query
            .fetch_query(&query.key, query.stale_time, || async move {
                api.get_json(path).await
            })
            .await
    }

    /// Like [`fetch`](Self::fetch), deserialized into `T`.
    pub async fn fetch_as<T: DeserializeOwned>(&mut self, query: &Query) -> Result<T, RenderError> {
        let value = self.fetch(query).await?;
        serde_json::from_value(value).map_err(|source| RenderError::Payload {
            query: query.key.hash().to_string(),
            source,
        })
    }
}

/// A routed page.
///
/// Data is fetched through the [`ViewContext`] first; the markup is built
/// once everything is in hand, so no view is held across an await.
#[async_trait]
pub trait Page: Send + Sync {
    /// Identifier of the client module backing this page, used to look up
    /// its assets in the manifest.
    fn module_id(&self) -> &'static str;

    /// Build the page. `outlet` holds the rendered child route, if any.
    async fn view(
        &self,
        cx: &mut ViewContext<'_>,
        outlet: Option<Markup>,
    ) -> Result<PageView, RenderError>;
}
