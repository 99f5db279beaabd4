//! HTML shell loaded once at startup.
//!
//! The shell carries literal `<!--name-->` markers. The set of names the
//! compositor knows how to fill is closed: see [`Marker`].

use std::path::Path;

use tracing::debug;

use crate::error::StartupError;

/// Every placeholder the compositor can substitute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Marker {
    /// Rendered application markup.
    AppHtml,
    /// `<link>` tags for the assets the render touched.
    PreloadLinks,
    /// Inline script carrying the serialized query cache.
    QueryState,
    /// `<title>` element.
    Title,
    /// Remaining `<head>` children: meta, link, script.
    HeadTags,
    /// Attributes for the `<html>` element.
    HtmlAttrs,
    /// Attributes for the `<body>` element.
    BodyAttrs,
    /// Tags placed right after `<body>`.
    BodyTagsOpen,
    /// Tags placed right before `</body>`.
    BodyTags,
}

impl Marker {
    pub const ALL: [Self; 9] = [
        Self::AppHtml,
        Self::PreloadLinks,
        Self::QueryState,
        Self::Title,
        Self::HeadTags,
        Self::HtmlAttrs,
        Self::BodyAttrs,
        Self::BodyTagsOpen,
        Self::BodyTags,
    ];

    /// Name as used by the head manager and in the marker text.
    pub const fn name(self) -> &'static str {
        match self {
            Self::AppHtml => "app-html",
            Self::PreloadLinks => "preload-links",
            Self::QueryState => "vue-query-state",
            Self::Title => "title",
            Self::HeadTags => "headTags",
            Self::HtmlAttrs => "htmlAttrs",
            Self::BodyAttrs => "bodyAttrs",
            Self::BodyTagsOpen => "bodyTagsOpen",
            Self::BodyTags => "bodyTags",
        }
    }

    /// Literal text searched for in the template.
    pub const fn token(self) -> &'static str {
        match self {
            Self::AppHtml => "<!--app-html-->",
            Self::PreloadLinks => "<!--preload-links-->",
            Self::QueryState => "<!--vue-query-state-->",
            Self::Title => "<!--title-->",
            Self::HeadTags => "<!--headTags-->",
            Self::HtmlAttrs => "<!--htmlAttrs-->",
            Self::BodyAttrs => "<!--bodyAttrs-->",
            Self::BodyTagsOpen => "<!--bodyTagsOpen-->",
            Self::BodyTags => "<!--bodyTags-->",
        }
    }
}

/// Immutable HTML shell.
#[derive(Debug, Clone)]
pub struct Template {
    html: String,
}

impl Template {
    /// Read the shell from disk. Failing here stops the process.
    pub async fn load(path: &Path) -> Result<Self, StartupError> {
        let html = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| StartupError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let template = Self::parse(html)?;
        debug!(path = %path.display(), bytes = template.html.len(), "Template loaded");
        Ok(template)
    }

    /// Validate an in-memory shell.
    ///
    /// The app markup marker must occur exactly once. Any other marker may be
    /// absent; one that occurs more than once is rejected, since only its
    /// first occurrence would ever be filled.
    pub fn parse(html: impl Into<String>) -> Result<Self, StartupError> {
        let html = html.into();
        for marker in Marker::ALL {
            match html.matches(marker.token()).count() {
                0 if marker == Marker::AppHtml => {
                    return Err(StartupError::Template(format!(
                        "missing required marker {}",
                        marker.token()
                    )));
                }
                0 => debug!(marker = marker.name(), "Template has no marker"),
                1 => {}
                n => {
                    return Err(StartupError::Template(format!(
                        "marker {} appears {n} times",
                        marker.token()
                    )));
                }
            }
        }
        Ok(Self { html })
    }

    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn contains(&self, marker: Marker) -> bool {
        self.html.contains(marker.token())
    }
}
