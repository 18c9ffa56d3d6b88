use crate::Result;
use crate::tpl::ast::Node;
use crate::tpl::parser;
use crate::tpl::render::Renderer;
use crate::tpl::render_context::Context;
use log::debug;
use std::time::Instant;

/// A parsed template. Immutable once built, so one instance can be shared
/// between threads and rendered against many contexts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    nodes: Vec<Node>,
}

/// Parses `source` into a [`Template`].
///
/// ```
/// let tpl = uliquid::parse("Hello {{ name }}!").unwrap();
/// let mut ctx = uliquid::Context::new();
/// ctx.set_variable("name", "World");
/// assert_eq!(tpl.render(&mut ctx).unwrap(), "Hello World!");
/// ```
pub fn parse(source: &str) -> Result<Template> {
    let start = Instant::now();
    let result = parser::parse_template(source);
    let elapsed = start.elapsed().as_micros();

    match &result {
        Ok(nodes) => debug!(
            "Parse: len={}, nodes={}, elapsed={}us",
            source.len(),
            nodes.len(),
            elapsed
        ),
        Err(e) => debug!(
            "Parse: len={}, elapsed={}us, error={:?}",
            source.len(),
            elapsed,
            e
        ),
    }

    result.map(Template::from_nodes)
}

impl Template {
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Renders against `ctx`. Variables written by `assign` and `for` remain
    /// in the context afterwards.
    pub fn render(&self, ctx: &mut Context) -> Result<String> {
        let start = Instant::now();
        ctx.clear_flags();
        let result = Renderer::new(ctx).render(&self.nodes);
        ctx.clear_flags();
        let elapsed = start.elapsed().as_micros();

        match &result {
            Ok(out) => debug!(
                "Render: nodes={}, output={}, elapsed={}us",
                self.nodes.len(),
                out.len(),
                elapsed
            ),
            Err(e) => debug!(
                "Render: nodes={}, elapsed={}us, error={:?}",
                self.nodes.len(),
                elapsed,
                e
            ),
        }

        result
    }
}
