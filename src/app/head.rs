//! Per-instance document head manager.
//!
//! Views push title, meta and link directives while they build; the renderer
//! then collects them into one string per head slot.

use std::collections::BTreeMap;

use leptos::prelude::*;

use super::view::Markup;
use crate::template::Marker;

const SITE_NAME: &str = "Tamriel Library";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Tag {
    /// Two tags with the same key replace each other.
    key: Option<String>,
    html: Markup,
}

/// Head directives gathered while rendering one instance.
#[derive(Debug, Default)]
pub struct Head {
    title: Option<String>,
    tags: Vec<Tag>,
    html_attrs: BTreeMap<String, String>,
}

impl Head {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page title; the site name is appended.
    pub fn title(&mut self, title: impl AsRef<str>) {
        self.title = Some(format!("{} | {SITE_NAME}", title.as_ref()));
    }

    pub fn meta(&mut self, name: &str, content: &str) {
        let (name, content) = (name.to_string(), content.to_string());
        self.push(
            Some(format!("meta:name:{name}")),
            Markup::render(view! { <meta name=name content=content/> }),
        );
    }

    pub fn meta_property(&mut self, property: &str, content: &str) {
        let (property, content) = (property.to_string(), content.to_string());
        self.push(
            Some(format!("meta:property:{property}")),
            Markup::render(view! { <meta {leptos::tachys::html::attribute::custom::custom_attribute("property", property)} content=content/> }),
        );
    }

    /// A `<link>`; only `canonical` is unique.
    pub fn link(&mut self, rel: &str, href: &str) {
        let key = (rel == "canonical").then(|| "link:canonical".to_string());
        let (rel, href) = (rel.to_string(), href.to_string());
        self.push(key, Markup::render(view! { <link rel=rel href=href/> }));
    }

    pub fn html_attr(&mut self, name: &str, value: &str) {
        self.html_attrs.insert(name.to_string(), value.to_string());
    }

    fn push(&mut self, key: Option<String>, html: Markup) {
        if key.is_some() {
            self.tags.retain(|t| t.key != key);
        }
        self.tags.push(Tag { key, html });
    }

    /// Render every slot, including empty ones, so each head marker in the
    /// template is consumed.
    pub fn render(&self) -> HeadPayload {
        let title = self.title.clone().unwrap_or_else(|| SITE_NAME.to_string());
        let head_tags = self
            .tags
            .iter()
            .map(|t| t.html.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let mut slots = BTreeMap::new();
        slots.insert(
            Marker::Title,
            Markup::render(view! { <title>{title}</title> }).into_string(),
        );
        slots.insert(Marker::HeadTags, head_tags);
        slots.insert(Marker::HtmlAttrs, render_attrs(&self.html_attrs));
        slots.insert(Marker::BodyAttrs, String::new());
        slots.insert(Marker::BodyTagsOpen, String::new());
        slots.insert(Marker::BodyTags, String::new());
        HeadPayload { slots }
    }
}

fn render_attrs(attrs: &BTreeMap<String, String>) -> String {
    attrs
        .iter()
        .map(|(k, v)| {
            format!(
                r#" {}="{}""#,
                html_escape::encode_double_quoted_attribute(k),
                html_escape::encode_double_quoted_attribute(v)
            )
        })
        .collect()
}

/// Head slot contents keyed by marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadPayload {
    slots: BTreeMap<Marker, String>,
}

impl HeadPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slot. Only head markers are accepted; the body, preload and
    /// hydration markers are filled by the compositor itself.
    pub fn insert(&mut self, marker: Marker, html: impl Into<String>) -> bool {
        if matches!(
            marker,
            Marker::AppHtml | Marker::PreloadLinks | Marker::QueryState
        ) {
            return false;
        }
        self.slots.insert(marker, html.into());
        true
    }

    pub fn get(&self, marker: Marker) -> Option<&str> {
        self.slots.get(&marker).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Marker, &str)> {
        self.slots.iter().map(|(m, s)| (*m, s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_and_meta_render_into_slots() {
        let mut head = Head::new();
        head.title("The Lusty Argonian Maid");
        head.meta("description", "Volume 1");
        head.html_attr("lang", "ru");

        let payload = head.render();
        assert_eq!(
            payload.get(Marker::Title),
            Some("<title>The Lusty Argonian Maid | Tamriel Library</title>")
        );
        let tags = payload.get(Marker::HeadTags).unwrap();
        assert!(tags.starts_with("<meta"));
        assert!(tags.contains(r#"name="description""#));
        assert!(tags.contains(r#"content="Volume 1""#));
        assert_eq!(payload.get(Marker::HtmlAttrs), Some(r#" lang="ru""#));
        assert_eq!(payload.get(Marker::BodyTags), Some(""));
        assert_eq!(payload.get(Marker::BodyAttrs), Some(""));
    }

    #[test]
    fn test_later_meta_replaces_earlier() {
        let mut head = Head::new();
        head.meta("description", "first");
        head.meta("description", "second");
        head.link("canonical", "/a");
        head.link("canonical", "/b");
        let tags = head.render();
        let tags = tags.get(Marker::HeadTags).unwrap();
        assert!(!tags.contains("first"));
        assert!(tags.contains("second"));
        assert!(!tags.contains("\"/a\""));
        assert!(tags.contains("\"/b\""));
    }

    #[test]
    fn test_title_and_attrs_are_escaped() {
        let mut head = Head::new();
        head.title("<b>");
        head.html_attr("data-x", "\"q\"");
        let payload = head.render();
        assert!(payload.get(Marker::Title).unwrap().contains("&lt;b&gt; | Tamriel Library"));
        assert_eq!(payload.get(Marker::HtmlAttrs), Some(r#" data-x="&quot;q&quot;""#));
    }

    #[test]
    fn test_payload_rejects_non_head_markers() {
        let mut payload = HeadPayload::new();
        assert!(!payload.insert(Marker::AppHtml, "x"));
        assert!(payload.insert(Marker::Title, "<title>T</title>"));
    }
}
