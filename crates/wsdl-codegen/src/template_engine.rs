//! Handlebars wrapper for the TypeScript emitter.
//!
//! Templates are compiled into the binary with `include_str!` and
//! registered once at construction. Strict mode is on: a context missing
//! a variable fails the render instead of silently emitting nothing.

use handlebars::Handlebars;
use serde::Serialize;
use wsdl2rest_core::{Error, Result};

/// Template engine with the TypeScript client templates pre-registered.
///
/// # Examples
///
/// ```
/// use wsdl2rest_codegen::template_engine::TemplateEngine;
///
/// let engine = TemplateEngine::new().unwrap();
/// ```
#[derive(Debug)]
pub struct TemplateEngine<'a> {
    handlebars: Handlebars<'a>,
}

impl TemplateEngine<'_> {
    /// Creates an engine with all built-in templates registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if a built-in template fails to
    /// compile, which only happens when a template file is broken.
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);

        let builtins = [
            (
                "typescript/types",
                include_str!("../templates/typescript/types.ts.hbs"),
            ),
            (
                "typescript/client",
                include_str!("../templates/typescript/client.ts.hbs"),
            ),
            (
                "typescript/index",
                include_str!("../templates/typescript/index.ts.hbs"),
            ),
        ];
        for (name, template) in builtins {
            handlebars
                .register_template_string(name, template)
                .map_err(|e| Error::Template {
                    message: format!("failed to register template '{name}': {e}"),
                })?;
        }

        Ok(Self { handlebars })
    }

    /// Renders a registered template with the given context.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] for unknown template names and for
    /// renders that reference variables missing from the context.
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        self.handlebars
            .render(template_name, context)
            .map_err(|e| Error::Template {
                message: format!("rendering '{template_name}' failed: {e}"),
            })
    }

    /// Registers an additional template at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] when the template string is invalid.
    pub fn register_template_string(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, template)
            .map_err(|e| Error::Template {
                message: format!("failed to register template '{name}': {e}"),
            })
    }
}
