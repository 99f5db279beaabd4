//! Route table and resolution.
//!
//! The table is compiled once at startup and shared read-only. Each
//! application instance owns an [`InstanceRouter`] with its own in-memory
//! history, so resolving one request never touches another's state.
//!
//! Matching is first-match-wins over the declaration order, with child routes
//! listed right after their parent. A route may carry guards (its own and its
//! ancestors') that redirect to another path; redirects are followed up to
//! [`MAX_REDIRECTS`] times.

pub mod pattern;
pub mod routes;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::app::ApplicationInstance;
use crate::app::component::{Page, PageView, ViewContext};
use crate::app::view::Markup;
use crate::error::{RenderError, ResolveError};
use pattern::PathPattern;

/// Name of the catch-all route.
pub const NOT_FOUND: &str = "not-found";

/// Canonical path of the not-found view.
pub const NOT_FOUND_PATH: &str = "/404";

const MAX_REDIRECTS: usize = 5;

/// Decision taken by a route guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Continue,
    Redirect(String),
}

pub type Guard = Arc<dyn Fn(&RouteMatch) -> GuardOutcome + Send + Sync>;

/// Guard sending the route to the not-found view unless `param` parses as an
/// unsigned integer.
pub fn numeric_param_guard(param: &'static str) -> Guard {
    Arc::new(move |route: &RouteMatch| match route.param(param) {
        Some(value) if value.parse::<u64>().is_ok() => GuardOutcome::Continue,
        _ => GuardOutcome::Redirect(NOT_FOUND_PATH.to_string()),
    })
}

/// Declarative route as written in the route table.
pub struct RouteDef {
    path: &'static str,
    name: &'static str,
    page: Arc<dyn Page>,
    guard: Option<Guard>,
    aliases: Vec<&'static str>,
    children: Vec<RouteDef>,
}

impl fmt::Debug for RouteDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDef")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("guard", &self.guard.is_some())
            .field("aliases", &self.aliases)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

impl RouteDef {
    pub fn new(path: &'static str, name: &'static str, page: Arc<dyn Page>) -> Self {
        Self {
            path,
            name,
            page,
            guard: None,
            aliases: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    #[must_use]
    pub fn alias(mut self, alias: &'static str) -> Self {
        self.aliases.push(alias);
        self
    }

    /// Child paths are relative to this route's path.
    #[must_use]
    pub fn children(mut self, children: Vec<RouteDef>) -> Self {
        self.children = children;
        self
    }
}

struct CompiledRoute {
    name: &'static str,
    patterns: Vec<PathPattern>,
    /// Pages from the outermost ancestor down to this route.
    chain: Vec<Arc<dyn Page>>,
    guards: Vec<Guard>,
}

/// Static, ordered set of compiled routes.
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
    shell: Arc<dyn Page>,
    not_found: usize,
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|r| (r.name, r.patterns[0].source())))
            .finish()
    }
}

impl RouteTable {
    /// Compile `defs`, wrapping every view in `shell`. A route named
    /// [`NOT_FOUND`] is required.
    pub fn new(shell: Arc<dyn Page>, defs: Vec<RouteDef>) -> Result<Self, ResolveError> {
        let mut routes = Vec::new();
        for def in defs {
            flatten(def, "", &[], &[], &mut routes)?;
        }
        let not_found = routes
            .iter()
            .position(|r| r.name == NOT_FOUND)
            .ok_or_else(|| ResolveError::Unmatched(NOT_FOUND_PATH.to_string()))?;
        Ok(Self {
            routes,
            shell,
            not_found,
        })
    }

    /// First route matching `path`, with its parameters.
    pub fn match_path(&self, path: &str) -> Option<(usize, HashMap<String, String>)> {
        self.routes.iter().enumerate().find_map(|(index, route)| {
            route
                .patterns
                .iter()
                .find_map(|p| p.captures(path))
                .map(|params| (index, params))
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Route names in match order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.routes.iter().map(|r| r.name)
    }

    fn not_found_page(&self) -> Arc<dyn Page> {
        let chain = &self.routes[self.not_found].chain;
        Arc::clone(&chain[chain.len() - 1])
    }
}

fn flatten(
    def: RouteDef,
    parent_path: &str,
    parent_chain: &[Arc<dyn Page>],
    parent_guards: &[Guard],
    out: &mut Vec<CompiledRoute>,
) -> Result<(), ResolveError> {
    let path = join_path(parent_path, def.path);
    let mut patterns = vec![PathPattern::compile(def.name, &path)?];
    for alias in &def.aliases {
        patterns.push(PathPattern::compile(
            def.name,
            &join_path(parent_path, alias),
        )?);
    }

    let mut chain = parent_chain.to_vec();
    chain.push(def.page);
    let mut guards = parent_guards.to_vec();
    guards.extend(def.guard);

    out.push(CompiledRoute {
        name: def.name,
        patterns,
        chain: chain.clone(),
        guards: guards.clone(),
    });
    for child in def.children {
        flatten(child, &path, &chain, &guards, out)?;
    }
    Ok(())
}

fn join_path(parent: &str, child: &str) -> String {
    if child.starts_with('/') || parent.is_empty() {
        child.to_string()
    } else {
        format!("{}/{child}", parent.trim_end_matches('/'))
    }
}

/// A request URL split into path and decoded query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: BTreeMap<String, String>,
}

impl Location {
    pub fn parse(url: &str) -> Self {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let path = if path.is_empty() { "/" } else { path };
        let query = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Self {
            path: path.to_string(),
            query,
        }
    }
}

/// A resolved route: which record matched and with what parameters.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub name: &'static str,
    pub location: Location,
    pub params: HashMap<String, String>,
    index: usize,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.location.query.get(name).map(String::as_str)
    }

    pub fn is_not_found(&self) -> bool {
        self.name == NOT_FOUND
    }
}

/// Router bound to one application instance and an in-memory history.
#[derive(Debug)]
pub struct InstanceRouter {
    table: Arc<RouteTable>,
    history: Vec<String>,
}

impl InstanceRouter {
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self {
            table,
            history: Vec::new(),
        }
    }

    /// Navigate to `url`, running guards and following their redirects.
    pub fn push(&mut self, url: &str) -> Result<RouteMatch, ResolveError> {
        let mut target = url.to_string();
        for _ in 0..=MAX_REDIRECTS {
            let location = Location::parse(&target);
            let (index, params) = self
                .table
                .match_path(&location.path)
                .ok_or_else(|| ResolveError::Unmatched(location.path.clone()))?;
            let route = &self.table.routes[index];
            let matched = RouteMatch {
                name: route.name,
                location,
                params,
                index,
            };
            trace!(route = matched.name, path = %matched.location.path, "Route matched");

            let redirect = route.guards.iter().find_map(|guard| match guard(&matched) {
                GuardOutcome::Continue => None,
                GuardOutcome::Redirect(to) => Some(to),
            });
            match redirect {
                Some(to) => {
                    debug!(from = %target, to = %to, "Route guard redirected");
                    target = to;
                }
                None => {
                    self.history.push(target);
                    return Ok(matched);
                }
            }
        }
        Err(ResolveError::RedirectLoop(url.to_string()))
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }
}

/// Whether the resolved view is real content or the not-found page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    Found,
    NotFound,
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
    pub route: &'static str,
    pub status: ViewStatus,
}

/// Navigate the instance to `url` and build its view tree.
///
/// Views are built innermost first; each parent receives its child's output
/// as an outlet and the application shell wraps the result. A view may
/// report its data as missing, in which case the not-found view is built
/// in its place.
pub async fn resolve(
    instance: &mut ApplicationInstance,
    url: &str,
) -> Result<Resolution, RenderError> {
    let matched = instance.router.push(url)?;
    let table = Arc::clone(instance.router.table());
    let chain = table.routes[matched.index].chain.clone();
    let mut status = if matched.is_not_found() {
        ViewStatus::NotFound
    } else {
        ViewStatus::Found
    };

    let mut outlet = None;
    for page in chain.iter().rev() {
        match build_page(instance, page.as_ref(), &matched, outlet.take()).await? {
            PageView::Ready(view) => outlet = Some(view),
            PageView::NotFound => {
                debug!(route = matched.name, "View reported missing data");
                status = ViewStatus::NotFound;
                let page = table.not_found_page();
                outlet = match build_page(instance, page.as_ref(), &matched, None).await? {
                    PageView::Ready(view) => Some(view),
                    PageView::NotFound => None,
                };
                break;
            }
        }
    }

    let root = match build_page(instance, table.shell.as_ref(), &matched, outlet).await? {
        PageView::Ready(view) => view,
        PageView::NotFound => Markup::default(),
    };
    instance.tree = Some(root);
    instance.status = status;

    Ok(Resolution {
        route: matched.name,
        status,
    })
}

async fn build_page(
    instance: &mut ApplicationInstance,
    page: &dyn Page,
    matched: &RouteMatch,
    outlet: Option<Markup>,
) -> Result<PageView, RenderError> {
    let mut cx = ViewContext {
        route: matched,
        query: &mut instance.query,
        head: &mut instance.head,
        api: instance.api.as_ref(),
    };
    let view = page.view(&mut cx, outlet).await?;
    if matches!(view, PageView::Ready(_)) {
        instance.record_module(page.module_id());
    }
    Ok(view)
}
