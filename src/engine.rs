use std::sync::Arc;

use dashmap::DashMap;
use log::debug;
use serde::Deserialize;

use crate::Result;
use crate::tpl::builtins;
use crate::tpl::engine::{Template, parse};
use crate::tpl::render_context::Context;

/// Engine-wide settings. Every field has a default, so a partial (or empty)
/// document deserializes fine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub standard_filters: bool,       // register the builtin filters in new contexts
    pub standard_stringifiers: bool,  // register bool/double/list output
    pub cache_templates: bool,        // keep parsed templates by name
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            standard_filters: false,
            standard_stringifiers: true,
            cache_templates: true,
        }
    }
}

/// A registry of parsed templates keyed by name.
///
/// `Engine` is safe to share between threads. Each render still needs its own
/// [`Context`]; [`Engine::new_context`] creates one with the configured builtins.
pub struct Engine {
    options: EngineOptions,
    /// Parsed templates by name.
    templates: DashMap<String, Arc<Template>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            templates: DashMap::new(),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Returns the template cached under `name`, parsing `source` on a miss.
    ///
    /// The cache is keyed by name only; a changed `source` under a known name
    /// is ignored until [`Engine::remove`] drops the old entry.
    ///
    /// # Errors
    /// Returns the tokenizer or parser error for `source`. Nothing is cached then.
    pub fn get_or_parse(&self, name: &str, source: &str) -> Result<Arc<Template>> {
        if let Some(tpl) = self.templates.get(name) {
            return Ok(tpl.value().clone());
        }

        let tpl = Arc::new(parse(source)?);
        if self.options.cache_templates {
            debug!("Template cached: name={}, nodes={}", name, tpl.nodes().len());
            self.templates.insert(name.to_string(), tpl.clone());
        }
        Ok(tpl)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Template>> {
        self.templates.get(name).map(|v| v.value().clone())
    }

    /// Stores an already parsed template under `name`, replacing any previous one.
    pub fn insert(&self, name: impl Into<String>, template: Template) -> Arc<Template> {
        let tpl = Arc::new(template);
        self.templates.insert(name.into(), tpl.clone());
        tpl
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Template>> {
        self.templates.remove(name).map(|(_, v)| v)
    }

    pub fn clear(&self) {
        self.templates.clear();
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Parses (or reuses) the named template and renders it against `ctx`.
    pub fn render(&self, name: &str, source: &str, ctx: &mut Context) -> Result<String> {
        let tpl = self.get_or_parse(name, source)?;
        debug!("Render template: name={}", name);
        tpl.render(ctx)
    }

    /// A fresh context carrying the filters and stringifiers the options enable.
    pub fn new_context(&self) -> Context {
        let mut ctx = Context::new();
        if self.options.standard_filters {
            builtins::register_standard_filters(&mut ctx);
        }
        if self.options.standard_stringifiers {
            builtins::register_standard_stringifiers(&mut ctx);
        }
        ctx
    }
}
