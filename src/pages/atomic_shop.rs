//! Fallout 76 Atomic Shop catalogue.
//!
//! The catalogue is filtered and paged on the client; the server renders the
//! frame with the selected category or item id so the client picks up from
//! there.

use async_trait::async_trait;
use leptos::prelude::*;

use crate::app::component::{Page, PageView, ViewContext};
use crate::app::view::{Markup, outlet_html};
use crate::error::RenderError;

#[derive(Debug, Default)]
pub struct AtomicShopPage;

#[async_trait]
impl Page for AtomicShopPage {
    fn module_id(&self) -> &'static str {
        "src/views/F76AtomicShopView.vue"
    }

    async fn view(
        &self,
        cx: &mut ViewContext<'_>,
        outlet: Option<Markup>,
    ) -> Result<PageView, RenderError> {
        cx.head.title("Атомная лавка Fallout 76");
        cx.head.link("canonical", "/f76-atomic-shop");

        let category = cx.route.param("categoryFormId").map(str::to_string);
        let subcategory = cx.route.param("subcategoryFormId").map(str::to_string);

        Ok(PageView::ready(view! {
            <section class="atomic-shop" data-category=category data-subcategory=subcategory>
                <h1>"Атомная лавка"</h1>
                <div class="atomic-shop-items" inner_html=outlet_html(outlet)></div>
            </section>
        }))
    }
}

/// Category and subcategory filters render inside the shop frame.
#[derive(Debug, Default)]
pub struct AtomicShopFilter;

#[async_trait]
impl Page for AtomicShopFilter {
    fn module_id(&self) -> &'static str {
        "src/views/F76AtomicShopView.vue"
    }

    async fn view(
        &self,
        _cx: &mut ViewContext<'_>,
        _outlet: Option<Markup>,
    ) -> Result<PageView, RenderError> {
        Ok(PageView::Ready(Markup::default()))
    }
}

#[derive(Debug, Default)]
pub struct AtomicShopItemPage;

#[async_trait]
impl Page for AtomicShopItemPage {
    fn module_id(&self) -> &'static str {
        "src/views/F76AtomicShopItemView.vue"
    }

    async fn view(
        &self,
        cx: &mut ViewContext<'_>,
        _outlet: Option<Markup>,
    ) -> Result<PageView, RenderError> {
        let form_id = cx.route.param("itemFormId").unwrap_or_default().to_lowercase();
        cx.head.title(format!("Предмет {form_id}"));
        cx.head.link("canonical", &format!("/f76-atomic-shop/{form_id}"));

        Ok(PageView::ready(view! {
            <article class="atomic-shop-item" data-form-id=form_id></article>
        }))
    }
}
