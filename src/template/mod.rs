//! Script templates.
//!
//! Templates are rendered with minijinja using square-bracket delimiters so
//! that the rule engine's own `{{ }}` expressions pass through untouched:
//!
//! - `[[ name ]]` substitutes a field of the render context
//! - `[% if name %] ... [% else %] ... [% endif %]` emits a block when the
//!   field is non-empty
//! - `[% for item in name %] ... [[ item ]] ... [% endfor %]` repeats a block
//!   for each element of a list field
//!
//! A line holding nothing but a block tag is removed entirely from the
//! output. Referencing a field the context does not carry is an error.
//!
//! Templates are parsed once when the kind registry is built; a parse failure
//! is a deployment fault.

pub mod scripts;

#[cfg(test)]
mod tests;

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, UndefinedBehavior};
use serde_json::Value;
use thiserror::Error;

const SCRIPT: &str = "script";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("template render error: {0}")]
    Render(String),
}

/// A parsed template, ready to render.
#[derive(Debug, Clone)]
pub struct Template {
    env: Environment<'static>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let syntax = SyntaxConfig::builder()
            .block_delimiters("[%", "%]")
            .variable_delimiters("[[", "]]")
            .comment_delimiters("[#", "#]")
            .build()
            .map_err(|e| parse_error(&e))?;

        let mut env = Environment::new();
        env.set_syntax(syntax);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.add_template_owned(SCRIPT, source.to_string())
            .map_err(|e| parse_error(&e))?;

        Ok(Self { env })
    }

    /// Render against a JSON object.
    pub fn render(&self, context: &Value) -> Result<String, TemplateError> {
        self.env
            .get_template(SCRIPT)
            .and_then(|template| template.render(context))
            .map_err(|e| TemplateError::Render(e.to_string()))
    }
}

fn parse_error(err: &minijinja::Error) -> TemplateError {
    TemplateError::Parse {
        line: err.line().unwrap_or_default(),
        message: err.detail().unwrap_or("invalid syntax").to_string(),
    }
}
