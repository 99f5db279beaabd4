use async_trait::async_trait;
use leptos::prelude::*;

use crate::app::component::{Page, PageView, ViewContext};
use crate::app::view::Markup;
use crate::error::RenderError;

#[derive(Debug, Default)]
pub struct NotFoundPage;

#[async_trait]
impl Page for NotFoundPage {
    fn module_id(&self) -> &'static str {
        "src/views/NotFoundView.vue"
    }

    async fn view(
        &self,
        cx: &mut ViewContext<'_>,
        _outlet: Option<Markup>,
    ) -> Result<PageView, RenderError> {
        cx.head.title("Страница не найдена");
        cx.head.meta("robots", "noindex");

        Ok(PageView::ready(view! {
            <section class="not-found">
                <h1>"404"</h1>
                <p>"Такой страницы нет."</p>
                <a href="/">"На главную"</a>
            </section>
        }))
    }
}
