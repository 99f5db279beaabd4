use async_trait::async_trait;
use leptos::prelude::*;

use crate::app::component::{Page, PageView, ViewContext};
use crate::app::view::{Markup, outlet_html};
use crate::error::RenderError;

const NAV: &[(&str, &str)] = &[
    ("/library/eso", "Библиотека ESO"),
    ("/glossary-tes", "Глоссарий TES"),
    ("/glossary-fallout", "Глоссарий Fallout"),
    ("/f76-atomic-shop", "Атомная лавка F76"),
];

/// Application shell wrapping every routed view.
#[derive(Debug, Default)]
pub struct Shell;

#[async_trait]
impl Page for Shell {
    fn module_id(&self) -> &'static str {
        "src/App.vue"
    }

    async fn view(
        &self,
        cx: &mut ViewContext<'_>,
        outlet: Option<Markup>,
    ) -> Result<PageView, RenderError> {
        cx.head.html_attr("lang", "ru");
        cx.head.meta("viewport", "width=device-width, initial-scale=1");

        Ok(PageView::ready(view! {
            <div id="layout">
                <SiteHeader/>
                <main inner_html=outlet_html(outlet)></main>
            </div>
        }))
    }
}

/// Logo and top navigation.
#[component]
fn SiteHeader() -> impl IntoView {
    view! {
        <header class="site-header">
            <a href="/" class="logo">"Tamriel Library"</a>
            <nav class="site-nav">
                {NAV
                    .iter()
                    .map(|&(href, label)| view! { <a href=href>{label}</a> })
                    .collect_view()}
            </nav>
        </header>
    }
}
