//! Exact-match routing from (method, path) to handler.

use std::collections::HashMap;
use std::sync::Arc;

use crate::parser::Method;
use crate::server::handler::Handler;
use crate::server::Error;

/// Maps a method, then an exact path, to a handler.
///
/// The table is built before the server starts and is only read while
/// serving; [`HttpServer`](crate::server::HttpServer) takes ownership of it
/// when listening begins, so no registration can race with dispatch.
#[derive(Clone, Default)]
pub struct RouteTable {
    routes: HashMap<Method, HashMap<String, Arc<dyn Handler>>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for requests whose method is `method` and whose
    /// path is exactly `path`. A later registration for the same pair
    /// replaces the earlier one.
    pub fn add_handler<H: Handler>(
        &mut self,
        method: Method,
        path: impl Into<String>,
        handler: H,
    ) -> &mut Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path.into(), Arc::new(handler));
        self
    }

    /// Find the handler for `method` and `path`.
    pub fn lookup(&self, method: Method, path: &str) -> Result<&Arc<dyn Handler>, Error> {
        let by_path = self
            .routes
            .get(&method)
            .ok_or(Error::NoRouteForMethod(method))?;
        by_path
            .get(path)
            .ok_or_else(|| Error::NoRouteForPath(method, path.to_string()))
    }

    /// All registered (method, path) pairs, sorted for display.
    pub fn routes(&self) -> Vec<(Method, &str)> {
        let mut routes: Vec<(Method, &str)> = self
            .routes
            .iter()
            .flat_map(|(method, by_path)| by_path.keys().map(move |path| (*method, path.as_str())))
            .collect();
        routes.sort_by(|a, b| (a.0.as_str(), a.1).cmp(&(b.0.as_str(), b.1)));
        routes
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
