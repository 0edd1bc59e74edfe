//! Route table implementing [`Application`].

use std::sync::Arc;

use super::matcher::{ExactPathMatcher, Matcher, PathPrefixMatcher};
use crate::connection::{Application, Handler};
use crate::http::Request;

struct Route {
    matcher: Box<dyn Matcher>,
    handler: Arc<dyn Handler>,
}

/// Ordered route table; the first matching route wins.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route with an arbitrary matcher.
    pub fn route(mut self, matcher: impl Matcher + 'static, handler: impl Handler) -> Self {
        self.routes.push(Route {
            matcher: Box::new(matcher),
            handler: Arc::new(handler),
        });
        self
    }

    /// Route one exact path.
    pub fn exact(self, path: impl Into<String>, handler: impl Handler) -> Self {
        self.route(ExactPathMatcher::new(path), handler)
    }

    /// Route every path under `prefix`.
    pub fn prefix(self, prefix: impl Into<String>, handler: impl Handler) -> Self {
        self.route(PathPrefixMatcher::new(prefix), handler)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Application for Router {
    fn route_message(&self, request: &Request) -> Option<Arc<dyn Handler>> {
        let found = self
            .routes
            .iter()
            .find(|route| route.matcher.matches(request))
            .map(|route| Arc::clone(&route.handler));
        if found.is_none() {
            tracing::debug!(method = %request.method, path = %request.path, "No route matched");
        }
        found
    }
}
