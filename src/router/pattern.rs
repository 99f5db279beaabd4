//! Path patterns with typed parameters.
//!
//! Syntax: static text, `:name` (one segment), `:name(regex)` (constrained)
//! and a trailing `?` making a parameter optional. Several parameters may
//! share one segment, so `:bookId(\d+):slug?` matches `42` as well as
//! `42-the-real-barenziah`. Matching is case-insensitive and tolerates a
//! trailing slash.

use std::collections::HashMap;

use regex::Regex;

use crate::error::ResolveError;

const DEFAULT_PARAM: &str = "[^/]+";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Static(String),
    Param {
        name: String,
        constraint: Option<String>,
        optional: bool,
    },
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
    params: Vec<String>,
}

impl PathPattern {
    pub fn compile(name: &str, pattern: &str) -> Result<Self, ResolveError> {
        let tokens = tokenize(pattern)?;
        let mut body = String::new();
        let mut params = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            match token {
                Token::Static(text) => {
                    // A slash directly before an optional parameter belongs to it.
                    let text = match tokens.get(i + 1) {
                        Some(Token::Param { optional: true, .. }) => {
                            text.strip_suffix('/').map_or(text.as_str(), |t| t)
                        }
                        _ => text.as_str(),
                    };
                    body.push_str(&regex::escape(text));
                }
                Token::Param {
                    name: param,
                    constraint,
                    optional,
                } => {
                    let constraint = constraint.as_deref().unwrap_or(DEFAULT_PARAM);
                    let group = format!("(?P<{param}>{constraint})");
                    if *optional {
                        let slash = match i.checked_sub(1).and_then(|p| tokens.get(p)) {
                            Some(Token::Static(text)) if text.ends_with('/') => "/",
                            _ => "",
                        };
                        body.push_str(&format!("(?:{slash}{group})?"));
                    } else {
                        body.push_str(&group);
                    }
                    params.push(param.clone());
                }
            }
        }

        let anchored = if body.ends_with('/') {
            format!("(?i)^{body}$")
        } else {
            format!("(?i)^{body}/?$")
        };
        let regex = Regex::new(&anchored).map_err(|source| ResolveError::Pattern {
            name: name.to_string(),
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
            params,
        })
    }

    /// Parameters captured from `path`, or `None` when it does not match.
    /// Optional parameters that did not participate are absent.
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let caps = self.regex.captures(path)?;
        Some(
            self.params
                .iter()
                .filter_map(|name| {
                    caps.name(name)
                        .map(|m| (name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

fn tokenize(pattern: &str) -> Result<Vec<Token>, ResolveError> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != ':' {
            text.push(ch);
            continue;
        }
        if !text.is_empty() {
            tokens.push(Token::Static(std::mem::take(&mut text)));
        }

        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(ResolveError::Unbalanced(pattern.to_string()));
        }

        let mut constraint = None;
        if chars.peek() == Some(&'(') {
            chars.next();
            let mut depth = 1usize;
            let mut re = String::new();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        re.push(c);
                        if let Some(escaped) = chars.next() {
                            re.push(escaped);
                        }
                        continue;
                    }
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                re.push(c);
            }
            if depth != 0 {
                return Err(ResolveError::Unbalanced(pattern.to_string()));
            }
            constraint = Some(re);
        }

        let optional = chars.peek() == Some(&'?');
        if optional {
            chars.next();
        }
        tokens.push(Token::Param {
            name,
            constraint,
            optional,
        });
    }

    if !text.is_empty() {
        tokens.push(Token::Static(text));
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(pattern: &str) -> PathPattern {
        PathPattern::compile("test", pattern).unwrap()
    }

    #[test]
    fn test_static_route() {
        let p = compile("/glossary-tes");
        assert!(p.captures("/glossary-tes").is_some());
        assert!(p.captures("/glossary-tes/").is_some());
        assert!(p.captures("/Glossary-TES").is_some());
        assert!(p.captures("/glossary-tes/x").is_none());
    }

    #[test]
    fn test_root_route() {
        let p = compile("/");
        assert!(p.captures("/").is_some());
        assert!(p.captures("/library").is_none());
    }

    #[test]
    fn test_numeric_id_with_slug() {
        let p = compile(r"/library/eso/:bookId(\d+):slug?");
        let caps = p.captures("/library/eso/42").unwrap();
        assert_eq!(caps["bookId"], "42");
        assert!(!caps.contains_key("slug"));

        let caps = p.captures("/library/eso/42-the-lusty-argonian-maid").unwrap();
        assert_eq!(caps["bookId"], "42");
        assert_eq!(caps["slug"], "-the-lusty-argonian-maid");

        assert!(p.captures("/library/eso/abc").is_none());
        assert!(p.captures("/library/eso/42/extra").is_none());
    }

    #[test]
    fn test_hex_and_version_constraints() {
        let hex = compile("/f76-atomic-shop/category/:categoryFormId([a-f0-9]{8}):slug?");
        assert!(hex.captures("/f76-atomic-shop/category/0a1b2c3d").is_some());
        assert!(hex.captures("/f76-atomic-shop/category/0a1b2c3").is_none());
        assert!(hex.captures("/f76-atomic-shop/category/zzzzzzzz").is_none());

        let version = compile(r"/library/eso/patch/:patchVersion(\d{1,2}\.\d{1,2}):slug?");
        let caps = version.captures("/library/eso/patch/10.3-gold-road").unwrap();
        assert_eq!(caps["patchVersion"], "10.3");
        assert!(version.captures("/library/eso/patch/103").is_none());
    }

    #[test]
    fn test_catch_all() {
        let p = compile("/:catchAll(.*)");
        assert_eq!(p.captures("/a/b/c").unwrap()["catchAll"], "a/b/c");
        assert_eq!(p.captures("/").unwrap()["catchAll"], "");
    }

    #[test]
    fn test_optional_segment_takes_its_slash() {
        let p = compile("/users/:id?");
        assert!(p.captures("/users").is_some());
        assert_eq!(p.captures("/users/7").unwrap()["id"], "7");
    }

    #[test]
    fn test_unbalanced_constraint() {
        assert!(matches!(
            PathPattern::compile("bad", r"/x/:id(\d+"),
            Err(ResolveError::Unbalanced(_))
        ));
    }
}
