//! Build routes known to the host and the diagnostic route printout

use serde::{Deserialize, Serialize};
use std::io::Write;

/// A logical page produced by the host build system
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRoute {
    /// Source template identity
    #[serde(default)]
    pub component: String,
    /// Logical URL path
    #[serde(default)]
    pub route: String,
    /// Host-assigned dynamic route pattern
    #[serde(default)]
    pub pattern: String,
}

impl BuildRoute {
    pub fn new(component: impl Into<String>, route: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            route: route.into(),
            pattern: pattern.into(),
        }
    }
}

/// Routes whose component contains `base_path`.
///
/// Only reported in diagnostics; image generation works from the files on
/// disk, not from this list.
pub fn filter_by_component<'a>(routes: &'a [BuildRoute], base_path: &str) -> Vec<&'a BuildRoute> {
    routes.iter().filter(|r| r.component.contains(base_path)).collect()
}

/// Receives the diagnostic printout of every known route
pub trait RouteSink {
    /// Called once before the first route
    fn begin(&mut self) {}

    fn route(&mut self, route: &BuildRoute);
}

/// Print every route to `sink`, regardless of selection.
pub fn print_routes(sink: &mut dyn RouteSink, routes: &[BuildRoute]) {
    sink.begin();
    for route in routes {
        sink.route(route);
    }
}

/// Sink that emits through the `log` facade at info level
#[derive(Debug, Default)]
pub struct LogSink;

impl RouteSink for LogSink {
    fn begin(&mut self) {
        log::info!("Route patterns known to the build:");
    }

    fn route(&mut self, route: &BuildRoute) {
        log::info!("template/page: {} pattern: {}", route.route, route.pattern);
    }
}

/// Sink that writes a plain text block per route to any writer
pub struct WriterSink<W: Write> {
    out: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl WriterSink<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write> RouteSink for WriterSink<W> {
    fn begin(&mut self) {
        // Diagnostics never fail the build
        let _ = writeln!(self.out, "From ogshot: ======================");
        let _ = writeln!(self.out, "Route patterns: ======================");
    }

    fn route(&mut self, route: &BuildRoute) {
        let _ = writeln!(self.out, "template/page: {}", route.route);
        let _ = writeln!(self.out, "pattern: {}", route.pattern);
        let _ = writeln!(self.out);
    }
}

/// Sink that keeps the routes it saw, mostly useful in tests
#[derive(Debug, Default)]
pub struct CollectSink {
    pub routes: Vec<BuildRoute>,
}

impl RouteSink for CollectSink {
    fn route(&mut self, route: &BuildRoute) {
        self.routes.push(route.clone());
    }
}
