//! Template composition.
//!
//! Every marker is located in the original template before anything is
//! inserted, and all substitutions are spliced in one pass. Inserted content
//! is never searched for markers, so markup that happens to contain a marker
//! token cannot capture another slot's value.

use crate::app::head::HeadPayload;
use crate::app::query::HydrationState;
use crate::template::{Marker, Template};

/// Merge one render into the template.
///
/// Head markers without a value in `head` are left in place. `preload_links`
/// is `None` when no asset manifest is in use, which empties the marker.
pub fn compose(
    template: &Template,
    markup: &str,
    head: &HeadPayload,
    hydration: &HydrationState,
    preload_links: Option<&str>,
) -> Result<String, serde_json::Error> {
    let html = template.as_str();
    let state_script = if template.contains(Marker::QueryState) {
        hydration_script(hydration)?
    } else {
        String::new()
    };

    let fixed = [
        (Marker::PreloadLinks, preload_links.unwrap_or_default()),
        (Marker::QueryState, state_script.as_str()),
        (Marker::AppHtml, markup),
    ];
    let mut slots: Vec<(usize, Marker, &str)> = head
        .iter()
        .chain(fixed)
        .filter_map(|(marker, value)| html.find(marker.token()).map(|at| (at, marker, value)))
        .collect();
    slots.sort_by_key(|(at, _, _)| *at);

    let extra: usize = slots.iter().map(|(_, _, v)| v.len()).sum();
    let mut out = String::with_capacity(html.len() + extra);
    let mut cursor = 0;
    for (at, marker, value) in slots {
        out.push_str(&html[cursor..at]);
        out.push_str(value);
        cursor = at + marker.token().len();
    }
    out.push_str(&html[cursor..]);
    Ok(out)
}

/// Inline script handing the query snapshot to the client.
///
/// The snapshot is encoded as JSON and then again as a JSON string literal,
/// with characters that could end the script element or break the literal
/// written as `\uXXXX` escapes.
pub fn hydration_script(state: &HydrationState) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(state)?;
    let literal = serde_json::to_string(&json)?;
    Ok(format!(
        "<script>window.__VUE_QUERY_STATE__ = {}</script>",
        escape_inline(&literal)
    ))
}

fn escape_inline(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for ch in literal.chars() {
        match ch {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::query::{QueryClient, QueryKey};
    use serde_json::json;

    fn template(html: &str) -> Template {
        Template::parse(html).unwrap()
    }

    #[test]
    fn test_replaces_markers_and_nothing_else() {
        let t = template("<html><head><!--title--></head><body><!--app-html--></body></html>");
        let mut head = HeadPayload::new();
        head.insert(Marker::Title, "<title>T</title>");

        let html = compose(&t, "<div>X</div>", &head, &HydrationState::default(), None).unwrap();
        assert_eq!(
            html,
            "<html><head><title>T</title></head><body><div>X</div></body></html>"
        );
    }

    #[test]
    fn test_missing_payload_leaves_marker() {
        let t = template("<!--headTags--><!--app-html-->");
        let html = compose(&t, "x", &HeadPayload::new(), &HydrationState::default(), None).unwrap();
        assert_eq!(html, "<!--headTags-->x");
    }

    #[test]
    fn test_markup_containing_marker_text_is_inert() {
        let t = template("<!--title-->|<!--app-html-->");
        let mut head = HeadPayload::new();
        head.insert(Marker::Title, "<!--app-html-->");
        let html = compose(&t, "<!--title-->", &head, &HydrationState::default(), None).unwrap();
        assert_eq!(html, "<!--app-html-->|<!--title-->");
    }

    #[test]
    fn test_preload_links_only_when_given() {
        let t = template("<head><!--preload-links--></head><!--app-html-->");
        let head = HeadPayload::new();
        let state = HydrationState::default();

        let dev = compose(&t, "", &head, &state, None).unwrap();
        assert_eq!(dev, "<head></head>");

        let link = r#"<link rel="stylesheet" href="/assets/a.css">"#;
        let prod = compose(&t, "", &head, &state, Some(link)).unwrap();
        assert_eq!(prod, format!("<head>{link}</head>"));
    }

    #[test]
    fn test_hydration_script_is_double_encoded_and_escaped() {
        let mut client = QueryClient::new();
        client.set_query_data(
            &QueryKey::new(json!(["book", 1])),
            json!({"textRu": "</script><b>&\u{2028}"}),
        );
        let script = hydration_script(&client.dehydrate()).unwrap();

        let literal = script
            .strip_prefix("<script>window.__VUE_QUERY_STATE__ = ")
            .and_then(|s| s.strip_suffix("</script>"))
            .unwrap();
        assert!(!literal.contains('<'));
        assert!(!literal.contains('>'));
        assert!(!literal.contains('&'));
        assert!(!literal.contains('\u{2028}'));

        // `\uXXXX` is valid inside a JSON string, so both layers still decode.
        let inner: String = serde_json::from_str(literal).unwrap();
        let state: HydrationState = serde_json::from_str(&inner).unwrap();
        assert_eq!(state.queries[0].state.data["textRu"], "</script><b>&\u{2028}");
    }

    #[test]
    fn test_query_state_marker() {
        let t = template("<!--app-html--><!--vue-query-state-->");
        let html = compose(&t, "", &HeadPayload::new(), &HydrationState::default(), None).unwrap();
        assert_eq!(
            html,
            r#"<script>window.__VUE_QUERY_STATE__ = "{\"queries\":[],\"mutations\":[]}"</script>"#
        );
    }

    #[test]
    fn test_vue_query_state_marker_receives_cached_queries() {
        let t = template(r#"<div id="app"><!--app-html--></div><!--vue-query-state-->"#);
        let mut client = QueryClient::new();
        client.set_query_data(&QueryKey::new(json!(["categories"])), json!([{"id": 3}]));

        let html = compose(&t, "<p>x</p>", &HeadPayload::new(), &client.dehydrate(), None).unwrap();
        assert!(html.starts_with(r#"<div id="app"><p>x</p></div><script>window.__VUE_QUERY_STATE__ = ""#));
        assert!(html.contains(r#"\"queryHash\":\"[\\\"categories\\\"]\""#));
        assert!(!html.contains("<!--vue-query-state-->"));
    }
}
