use crate::http;
use crate::http::handler::HandlerFunc;
use crate::http::method::Method;
use crate::http::middleware::{Middleware, Next};
use crate::http::request::{Request, RequestContext};
use crate::http::response::Response;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::io::BufRead;
use tracing::debug;

static PATTERN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(?P<var>[a-z][a-z0-9]*)>").expect("placeholder pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    Any,
    Only(Method),
}

impl MethodFilter {
    pub fn accepts(&self, method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Only(m) => m == method,
        }
    }
}

pub struct Route {
    filter: MethodFilter,
    regex: Regex,
    f: HandlerFunc,
    middlewares: Vec<Box<dyn Middleware>>,
}

impl Route {
    pub fn with_middleware(&mut self, m: Box<dyn Middleware>) -> &mut Route {
        self.middlewares.push(m);
        self
    }

    fn get_url_vars(&self, capt: &Captures) -> HashMap<String, String> {
        self.regex
            .capture_names()
            .flatten()
            .filter_map(|name| capt.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
            .collect()
    }
}

/// Ordered route table; the first route whose method filter and pattern
/// both match handles the request. Built once, then shared read-only.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Router {
        Router { routes: Vec::new() }
    }

    /// Registers a route. The pattern must match the whole target; each
    /// `<name>` placeholder captures the rest of the target verbatim (it may
    /// be empty and may contain `/`).
    pub fn add_handler(
        &mut self,
        filter: MethodFilter,
        pattern: &str,
        f: HandlerFunc,
    ) -> Result<&mut Route, regex::Error> {
        self.routes.push(Route {
            filter,
            regex: compile_pattern(pattern)?,
            f,
            middlewares: Vec::new(),
        });
        let idx = self.routes.len() - 1;
        Ok(&mut self.routes[idx])
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Runs the matching route and turns its outcome into a response.
    /// `body_source` is the stream positioned right after the headers.
    pub fn dispatch(&self, req: &mut Request, body_source: &mut dyn BufRead) -> Response {
        let matched = self.routes.iter().find_map(|route| {
            if !route.filter.accepts(req.method()) {
                return None;
            }
            route
                .regex
                .captures(req.target())
                .map(|capt| (route, route.get_url_vars(&capt)))
        });

        let Some((route, vars)) = matched else {
            debug!(path = req.target(), "no route");
            return http::not_found();
        };

        let mut ctx = RequestContext::new(req, body_source, vars);
        let next = Next {
            middlewares: &route.middlewares,
            handler: &route.f,
        };

        next.run(&mut ctx).unwrap_or_else(|e| e.into_response())
    }
}

/// Anchored regex for a route pattern. Text outside placeholders matches
/// literally.
fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let mut re = String::from("^");
    let mut literal_start = 0;

    for capt in PATTERN_RE.captures_iter(pattern) {
        let Some(placeholder) = capt.get(0) else {
            continue;
        };
        re.push_str(&regex::escape(&pattern[literal_start..placeholder.start()]));
        re.push_str(&format!(r"(?<{}>.*)", &capt["var"]));
        literal_start = placeholder.end();
    }
    re.push_str(&regex::escape(&pattern[literal_start..]));
    re.push('$');

    Regex::new(&re)
}
