//! Server-rendered output of page components.
//!
//! Pages build their markup with leptos `view!` and hand it over as
//! [`Markup`]; a parent page embeds its child's markup as the outlet.

use leptos::prelude::IntoView;
use leptos::tachys::view::RenderHtml;

/// HTML rendered from one component tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
    /// Render a view to its HTML string.
    pub fn render(view: impl IntoView) -> Self {
        Self(view.to_html())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// The child route's markup for embedding with `inner_html`.
pub fn outlet_html(outlet: Option<Markup>) -> String {
    outlet.map(Markup::into_string).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use leptos::prelude::*;

    #[test]
    fn test_renders_nested_elements() {
        let html = Markup::render(view! {
            <div class="book">
                <h1>"Title"</h1>
            </div>
        });
        assert!(html.as_str().starts_with(r#"<div class="book">"#));
        assert!(html.as_str().contains("<h1>Title</h1>"));
    }

    #[test]
    fn test_escapes_text_and_attributes() {
        let text = "<script>".to_string();
        let href = "/x?a=1&b=\"2\"".to_string();
        let html = Markup::render(view! { <a href=href>{text}</a> });
        assert!(html.as_str().contains("&lt;script&gt;"));
        assert!(html.as_str().contains("&amp;b=&quot;2&quot;"));
        assert!(!html.as_str().contains("<script>"));
    }

    #[test]
    fn test_outlet_is_embedded_verbatim() {
        let child = Markup::render(view! { <b>"x"</b> });
        let html = Markup::render(view! { <main inner_html=outlet_html(Some(child))></main> });
        assert!(html.as_str().contains("<main><b>x</b></main>"));
        assert_eq!(outlet_html(None), "");
    }
}
