mod engine;

pub use engine::*;

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::ast::Document;
use crate::error::{Chainable, Result};
use crate::exec::Invocable;
use crate::value::{Dict, Format, Sink, Source, Toml};

/// A compiled template: parsed and, unless disabled, escaped.
///
/// ```rust
/// use quill::templating::Template;
///
/// let template = Template::compile("greeting", "<p>Hi, {{.Name}}!</p>").unwrap();
/// let data = quill::dict!["Name" => "Tom & Jerry"];
/// assert_eq!(template.render(&data).unwrap(), "<p>Hi, Tom &amp; Jerry!</p>");
/// ```
#[derive(Debug, Clone)]
pub struct Template {
    document: Arc<Document>,
}

impl Template {
    /// Parses and escapes `text`.
    pub fn compile(name: &str, text: &str) -> Result<Template> {
        Template::compile_with(name, text, true)
    }

    /// Parses `text`, escaping it only if `autoescape` is set.
    pub fn compile_with(name: &str, text: &str, autoescape: bool) -> Result<Template> {
        let document = crate::parse(name, text)?;
        let document = match autoescape {
            true => crate::escape(document)?,
            false => document,
        };

        Ok(Template { document: Arc::new(document) })
    }

    /// Reads the template text from `source` and compiles it.
    pub fn read<S: Source>(name: &str, source: S, autoescape: bool) -> Result<Template> {
        let text = source.read_str().chain_with(|| error!("failed to read template", "template" => name))?;
        Template::compile_with(name, &text, autoescape)
    }

    pub fn name(&self) -> &str {
        &self.document.name
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn render(&self, data: &dyn Invocable) -> Result<String> {
        let mut output = String::new();
        self.render_to(&mut output, data)?;
        Ok(output)
    }

    pub fn render_to<S: Sink>(&self, sink: S, data: &dyn Invocable) -> Result<()> {
        crate::execute(&self.document, self.name(), sink, data)
    }
}

/// Template settings, typically read from a TOML file.
///
/// Keys other than `extensions` and `autoescape` are global data, visible to
/// every template as fields.
///
/// ```rust
/// use quill::templating::Settings;
/// use quill::value::{Format, Toml, Value};
///
/// let settings: Settings = Toml::read(r#"
///     extensions = ["html"]
///     title = "My Site"
/// "#).unwrap();
///
/// assert_eq!(settings.extensions, ["html"]);
/// assert!(settings.autoescape);
/// assert_eq!(settings.data["title"], Value::from("My Site"));
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "Settings::default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "Settings::default_autoescape")]
    pub autoescape: bool,
    #[serde(flatten)]
    pub data: Dict,
}

impl Settings {
    fn default_extensions() -> Vec<String> {
        vec!["html".into(), "htm".into(), "xml".into()]
    }

    fn default_autoescape() -> bool {
        true
    }

    /// Reads settings from the TOML file at `path`.
    pub fn read(path: &Path) -> Result<Settings> {
        Toml::read(path)
    }

    /// Returns `true` if `path` has one of the configured extensions.
    pub fn is_template_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            extensions: Settings::default_extensions(),
            autoescape: Settings::default_autoescape(),
            data: Dict::new(),
        }
    }
}
