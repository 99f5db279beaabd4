use async_trait::async_trait;
use leptos::prelude::*;

use super::queries;
use crate::app::component::{Page, PageView, ViewContext};
use crate::app::view::Markup;
use crate::error::RenderError;

/// Export form listing every category. Its output depends on the caller's
/// selection, so the path is excluded from the render cache.
#[derive(Debug, Default)]
pub struct BooksExportPage;

#[async_trait]
impl Page for BooksExportPage {
    fn module_id(&self) -> &'static str {
        "src/views/BooksExportView.vue"
    }

    async fn view(
        &self,
        cx: &mut ViewContext<'_>,
        _outlet: Option<Markup>,
    ) -> Result<PageView, RenderError> {
        cx.head.title("Экспорт книг");
        cx.head.meta("robots", "noindex");

        let categories: Vec<queries::Category> = cx.fetch_as(&queries::categories()).await?;
        let options = categories
            .iter()
            .map(|c| {
                let id = c.id.to_string();
                let title = c.display_title().to_string();
                view! {
                    <label>
                        <input type="checkbox" name="category" value=id/>
                        {title}
                    </label>
                }
            })
            .collect_view();

        Ok(PageView::ready(view! {
            <form class="books-export">
                <h1>"Экспорт книг"</h1>
                <fieldset>{options}</fieldset>
            </form>
        }))
    }
}
