//! Library data queries and the records they return.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::app::component::Query;
use crate::app::query::{QueryKey, StaleTime};

/// Category id meaning "every category".
pub const ALL_CATEGORIES: i64 = -1;

pub fn book(id: u64) -> Query {
    Query {
        key: QueryKey::new(json!(["book", id])),
        stale_time: StaleTime::minutes(5),
        path: format!("/api/library/books/{id}"),
    }
}

pub fn books(category_id: i64, page: u32, page_size: u32) -> Query {
    let path = if category_id == ALL_CATEGORIES {
        format!("/api/library/books?page={page}&page_size={page_size}")
    } else {
        format!("/api/library/categories/{category_id}?page={page}&page_size={page_size}")
    };
    Query {
        key: QueryKey::new(json!([
            "books",
            category_id,
            {"currentPage": page, "pageSize": page_size}
        ])),
        stale_time: StaleTime::minutes(5),
        path,
    }
}

pub fn categories() -> Query {
    Query {
        key: QueryKey::new(json!(["categories"])),
        stale_time: StaleTime::Never,
        path: "/api/library/categories".to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Patch {
    pub id: i64,
    pub version: String,
    pub name_en: String,
    pub name_ru: String,
    pub image: String,
    pub date: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Book {
    pub id: u64,
    pub title_en: String,
    pub title_ru: String,
    pub text_en: String,
    pub text_ru: String,
    pub icon: String,
    pub cat_id: i64,
    pub slug: String,
    pub created: Option<Patch>,
    pub updated: Option<Patch>,
    pub category: Option<Box<Category>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default, rename = "pageSize")]
    pub page_size: u32,
    #[serde(default)]
    pub total_books: u64,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    pub id: i64,
    pub title_en: String,
    pub title_ru: String,
    pub desc_en: String,
    pub desc_ru: String,
    pub icon: String,
    pub slug: String,
    pub books: Vec<Book>,
    pub pagination: Option<Pagination>,
}

impl Book {
    /// Russian title when present, English otherwise.
    pub fn display_title(&self) -> &str {
        if self.title_ru.is_empty() {
            &self.title_en
        } else {
            &self.title_ru
        }
    }

    /// Canonical path of the book page.
    pub fn href(&self) -> String {
        if self.slug.is_empty() {
            format!("/library/eso/{}", self.id)
        } else {
            format!("/library/eso/{}-{}", self.id, self.slug)
        }
    }
}

impl Category {
    pub fn display_title(&self) -> &str {
        if self.title_ru.is_empty() {
            &self.title_en
        } else {
            &self.title_ru
        }
    }

    pub fn href(&self) -> String {
        if self.slug.is_empty() {
            format!("/library/eso/category/{}", self.id)
        } else {
            format!("/library/eso/category/{}-{}", self.id, self.slug)
        }
    }
}

/// Game icon paths (`esoui/art/icons/x.dds`) mapped to the converted PNGs.
pub fn icon_url(icon: &str) -> String {
    if icon.is_empty() {
        return String::new();
    }
    let lower = icon.to_lowercase();
    let trimmed = lower.trim_start_matches('/');
    match trimmed
        .strip_prefix("esoui/")
        .and_then(|rest| rest.strip_suffix(".dds"))
    {
        Some(stem) => format!("/public/img/eso/esoui/{stem}.png"),
        None => lower,
    }
}
