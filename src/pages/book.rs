use async_trait::async_trait;
use leptos::prelude::*;

use super::queries::{self, Book, icon_url};
use crate::app::component::{Page, PageView, ViewContext};
use crate::app::view::Markup;
use crate::error::RenderError;

const DESCRIPTION_CHARS: usize = 160;

/// A single book with its translation.
#[derive(Debug, Default)]
pub struct BookPage;

#[async_trait]
impl Page for BookPage {
    fn module_id(&self) -> &'static str {
        "src/views/BookView.vue"
    }

    async fn view(
        &self,
        cx: &mut ViewContext<'_>,
        _outlet: Option<Markup>,
    ) -> Result<PageView, RenderError> {
        let Some(id) = cx.route.param("bookId").and_then(|id| id.parse::<u64>().ok()) else {
            return Ok(PageView::NotFound);
        };

        // A missing book is a not-found page; any other upstream failure is an error.
        let book: Book = match cx.fetch_as(&queries::book(id)).await {
            Ok(book) => book,
            Err(RenderError::Fetch(err)) if err.is_not_found() => return Ok(PageView::NotFound),
            Err(err) => return Err(err),
        };

        let text = if book.text_ru.is_empty() {
            &book.text_en
        } else {
            &book.text_ru
        };
        cx.head.title(book.display_title());
        cx.head.meta("description", &excerpt(text));
        cx.head.meta_property("og:title", book.display_title());
        cx.head.meta_property("og:type", "article");
        cx.head.link("canonical", &book.href());

        Ok(PageView::ready(view! { <BookArticle book=book/> }))
    }
}

#[component]
fn BookArticle(book: Book) -> impl IntoView {
    let text = if book.text_ru.is_empty() {
        book.text_en.clone()
    } else {
        book.text_ru.clone()
    };
    let icon = (!book.icon.is_empty()).then(|| {
        let src = icon_url(&book.icon);
        view! { <img class="book-icon" src=src alt=""/> }
    });
    let original_title = (!book.title_ru.is_empty() && book.title_en != book.title_ru).then(|| {
        let title = book.title_en.clone();
        view! { <p class="book-original-title">{title}</p> }
    });
    let category = book.category.as_deref().map(|category| {
        let href = category.href();
        let title = category.display_title().to_string();
        view! { <a class="book-category" href=href>{title}</a> }
    });
    let patch = book.created.as_ref().map(|patch| {
        let added = format!("Добавлена в {} ({})", patch.name_ru, patch.version);
        view! { <footer class="book-patch">{added}</footer> }
    });

    let id = book.id.to_string();
    let title = book.display_title().to_string();

    view! {
        <article class="book" data-book-id=id>
            {icon}
            <h1>{title}</h1>
            {original_title}
            {category}
            <div class="book-text">{paragraphs(&text)}</div>
            {patch}
        </article>
    }
}

fn paragraphs(text: &str) -> impl IntoView + use<> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let line = line.to_string();
            view! { <p>{line}</p> }
        })
        .collect_view()
}

fn excerpt(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(DESCRIPTION_CHARS) {
        Some((cut, _)) => format!("{}…", flat[..cut].trim_end()),
        None => flat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let long = "Ж".repeat(200);
        let out = excerpt(&long);
        assert_eq!(out.chars().count(), DESCRIPTION_CHARS + 1);
        assert!(out.ends_with('…'));
        assert_eq!(excerpt("short\n text"), "short text");
    }

    #[test]
    fn test_paragraphs_skip_blank_lines() {
        let html = Markup::render(paragraphs("one\n\n two \n"));
        assert!(html.as_str().contains("<p>one</p><p>two</p>"));
        assert_eq!(html.as_str().matches("<p>").count(), 2);
    }

    #[test]
    fn test_article_renders_translation_and_category() {
        let book: Book = serde_json::from_value(serde_json::json!({
            "id": 42,
            "titleEn": "The Lusty Argonian Maid",
            "titleRu": "Похотливая аргонианская дева",
            "textEn": "Crantius Colto",
            "textRu": "Кранциус Колто\n\nЛифис",
            "category": {"id": 3, "titleEn": "Fiction", "titleRu": "Художественные"}
        }))
        .unwrap();
        let html = Markup::render(view! { <BookArticle book=book/> }).into_string();

        assert!(html.starts_with("<article"));
        assert!(html.contains(r#"data-book-id="42""#));
        assert!(html.contains("<h1>Похотливая аргонианская дева</h1>"));
        assert!(html.contains("The Lusty Argonian Maid"));
        assert!(html.contains("<p>Кранциус Колто</p><p>Лифис</p>"));
        assert!(html.contains(r#"class="book-category""#));
        assert!(!html.contains("book-icon"));
    }
}
