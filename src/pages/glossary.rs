use async_trait::async_trait;
use leptos::prelude::*;

use crate::app::component::{Page, PageView, ViewContext};
use crate::app::view::Markup;
use crate::error::RenderError;

/// Which glossary a page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glossary {
    ElderScrolls,
    Fallout,
}

/// Search page over a game glossary. Results are fetched by the client as
/// the user types, so the server renders the empty search form.
#[derive(Debug)]
pub struct GlossaryPage {
    glossary: Glossary,
}

impl GlossaryPage {
    pub fn new(glossary: Glossary) -> Self {
        Self { glossary }
    }
}

#[async_trait]
impl Page for GlossaryPage {
    fn module_id(&self) -> &'static str {
        match self.glossary {
            Glossary::ElderScrolls => "src/views/GlossaryTESView.vue",
            Glossary::Fallout => "src/views/GlossaryFalloutView.vue",
        }
    }

    async fn view(
        &self,
        cx: &mut ViewContext<'_>,
        _outlet: Option<Markup>,
    ) -> Result<PageView, RenderError> {
        let (title, canonical, game) = match self.glossary {
            Glossary::ElderScrolls => ("Глоссарий TES", "/glossary-tes", "tes"),
            Glossary::Fallout => ("Глоссарий Fallout", "/glossary-fallout", "fallout"),
        };
        cx.head.title(title);
        cx.head.link("canonical", canonical);

        let search = cx.route.query("search").unwrap_or_default().to_string();
        Ok(PageView::ready(view! {
            <section class="glossary" data-game=game>
                <h1>{title}</h1>
                <form role="search">
                    <input type="search" name="search" value=search/>
                </form>
                <div class="glossary-results"></div>
            </section>
        }))
    }
}
