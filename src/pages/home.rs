use async_trait::async_trait;
use leptos::prelude::*;

use crate::app::component::{Page, PageView, ViewContext};
use crate::app::view::Markup;
use crate::error::RenderError;

#[derive(Debug, Default)]
pub struct HomePage;

#[async_trait]
impl Page for HomePage {
    fn module_id(&self) -> &'static str {
        "src/views/HomeView.vue"
    }

    async fn view(
        &self,
        cx: &mut ViewContext<'_>,
        _outlet: Option<Markup>,
    ) -> Result<PageView, RenderError> {
        cx.head.title("Главная");
        cx.head.meta(
            "description",
            "Переводы книг, глоссарии и атомная лавка по вселенным The Elder Scrolls и Fallout",
        );
        cx.head.link("canonical", "/");

        Ok(PageView::ready(view! {
            <section class="home">
                <h1>"Tamriel Library"</h1>
                <p>"Книги Тамриэля, глоссарии и каталог атомной лавки."</p>
            </section>
        }))
    }
}
