//! Book listing with category and patch filters.
//!
//! `/library/eso` lists every book; the `category` and `patch` child routes
//! narrow the listing and render their heading into the library's outlet.

use async_trait::async_trait;
use leptos::prelude::*;

use super::queries::{self, ALL_CATEGORIES, Book, Category, icon_url};
use crate::app::component::{Page, PageView, ViewContext};
use crate::app::view::{Markup, outlet_html};
use crate::error::RenderError;

pub const PAGE_SIZE: u32 = 50;

const MODULE: &str = "src/views/LibraryView.vue";

#[derive(Debug, Default)]
pub struct LibraryPage;

#[async_trait]
impl Page for LibraryPage {
    fn module_id(&self) -> &'static str {
        MODULE
    }

    async fn view(
        &self,
        cx: &mut ViewContext<'_>,
        outlet: Option<Markup>,
    ) -> Result<PageView, RenderError> {
        let category_id = cx
            .route
            .param("categoryId")
            .and_then(|id| id.parse::<i64>().ok())
            .unwrap_or(ALL_CATEGORIES);
        let page = current_page(cx.route.query("page"));

        let categories: Vec<Category> = cx.fetch_as(&queries::categories()).await?;
        let listing: Category = match cx
            .fetch_as(&queries::books(category_id, page, PAGE_SIZE))
            .await
        {
            Ok(listing) => listing,
            Err(RenderError::Fetch(err)) if err.is_not_found() => return Ok(PageView::NotFound),
            Err(err) => return Err(err),
        };

        match categories.iter().find(|c| c.id == category_id) {
            Some(category) => {
                cx.head.title(category.display_title());
                cx.head.link("canonical", &category.href());
            }
            None => {
                cx.head.title("Библиотека ESO");
                cx.head.link("canonical", "/library/eso");
            }
        }
        cx.head.meta("description", "Переводы книг The Elder Scrolls Online");

        let path = cx.route.location.path.clone();
        let sidebar = categories
            .iter()
            .map(|c| {
                let href = c.href();
                let title = c.display_title().to_string();
                let class = if c.id == category_id { "active" } else { "" };
                view! { <li><a href=href class=class>{title}</a></li> }
            })
            .collect_view();
        let books = listing.books.iter().map(book_item).collect_view();

        Ok(PageView::ready(view! {
            <div class="library">
                <aside class="library-categories">
                    <ul>{sidebar}</ul>
                </aside>
                <section>
                    <div class="library-filter-outlet" inner_html=outlet_html(outlet)></div>
                    <ul class="library-books">{books}</ul>
                    {pagination(&path, &listing, page)}
                </section>
            </div>
        }))
    }
}

/// Heading for `category/:categoryId`. An id absent from the category list
/// is a not-found page.
#[derive(Debug, Default)]
pub struct CategoryFilter;

#[async_trait]
impl Page for CategoryFilter {
    fn module_id(&self) -> &'static str {
        MODULE
    }

    async fn view(
        &self,
        cx: &mut ViewContext<'_>,
        _outlet: Option<Markup>,
    ) -> Result<PageView, RenderError> {
        let Some(id) = cx.route.param("categoryId").and_then(|id| id.parse::<i64>().ok()) else {
            return Ok(PageView::NotFound);
        };
        let categories: Vec<Category> = cx.fetch_as(&queries::categories()).await?;
        let Some(category) = categories.into_iter().find(|c| c.id == id) else {
            return Ok(PageView::NotFound);
        };

        Ok(PageView::ready(view! { <CategoryHeading category=category/> }))
    }
}

#[component]
fn CategoryHeading(category: Category) -> impl IntoView {
    let icon = (!category.icon.is_empty()).then(|| {
        let src = icon_url(&category.icon);
        view! { <img src=src alt=""/> }
    });
    let title = category.display_title().to_string();
    let description = if category.desc_ru.is_empty() {
        category.desc_en
    } else {
        category.desc_ru
    };
    let description = (!description.is_empty()).then(|| view! { <p>{description}</p> });

    view! {
        <header class="library-filter">
            {icon}
            <h1>{title}</h1>
            {description}
        </header>
    }
}

/// Heading for `patch/:patchVersion`.
#[derive(Debug, Default)]
pub struct PatchFilter;

#[async_trait]
impl Page for PatchFilter {
    fn module_id(&self) -> &'static str {
        MODULE
    }

    async fn view(
        &self,
        cx: &mut ViewContext<'_>,
        _outlet: Option<Markup>,
    ) -> Result<PageView, RenderError> {
        let heading = format!(
            "Книги патча {}",
            cx.route.param("patchVersion").unwrap_or_default()
        );
        Ok(PageView::ready(view! {
            <header class="library-filter">
                <h1>{heading}</h1>
            </header>
        }))
    }
}

fn current_page(raw: Option<&str>) -> u32 {
    raw.and_then(|p| p.parse::<u32>().ok())
        .filter(|&p| p > 0)
        .unwrap_or(1)
}

fn book_item(book: &Book) -> impl IntoView + use<> {
    let href = book.href();
    let title = book.display_title().to_string();
    view! { <li><a href=href>{title}</a></li> }
}

/// Previous/next links around `page / total`; nothing for a single page.
fn pagination(path: &str, listing: &Category, page: u32) -> Option<impl IntoView + use<>> {
    let total = listing.pagination.as_ref().map_or(1, |p| p.total_pages.max(1));
    if total <= 1 {
        return None;
    }
    let link = |n: u32, label: &'static str| {
        let href = format!("{path}?page={n}");
        view! { <a href=href>{label}</a> }
    };
    let prev = (page > 1).then(|| link(page - 1, "←"));
    let next = (page < total).then(|| link(page + 1, "→"));
    let position = format!("{page} / {total}");

    Some(view! {
        <nav class="pagination">
            {prev}
            <span>{position}</span>
            {next}
        </nav>
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::queries::Pagination;

    #[test]
    fn test_current_page_defaults_to_first() {
        assert_eq!(current_page(None), 1);
        assert_eq!(current_page(Some("0")), 1);
        assert_eq!(current_page(Some("x")), 1);
        assert_eq!(current_page(Some("4")), 4);
    }

    #[test]
    fn test_pagination_links() {
        let listing = Category {
            pagination: Some(Pagination {
                page: 2,
                page_size: PAGE_SIZE,
                total_books: 120,
                total_pages: 3,
            }),
            ..Category::default()
        };
        let html = Markup::render(pagination("/library/eso", &listing, 2)).into_string();
        assert!(html.contains(r#"href="/library/eso?page=1""#));
        assert!(html.contains(r#"href="/library/eso?page=3""#));
        assert!(html.contains("2 / 3"));

        let last = Markup::render(pagination("/library/eso", &listing, 3)).into_string();
        assert!(!last.contains("page=4"));

        let single = Category::default();
        assert!(pagination("/library/eso", &single, 1).is_none());
    }
}
