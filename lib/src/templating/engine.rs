use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{Chainable, Error, Result};
use crate::exec::Invocable;
use crate::templating::{Settings, Template};
use crate::util::{is_template, Deferred};
use crate::value::{Sink, Source};

/// What a template file compiles to.
#[derive(Debug, Clone)]
pub enum Compiled {
    Template(Template),
    /// A file with no actions, written out as is.
    Verbatim(Arc<str>),
}

/// Every template below a root directory, compiled on demand.
///
/// Templates are named by their path relative to the root, with `/` as the
/// separator: `root/blog/post.html` is `blog/post.html`.
#[derive(Debug)]
pub struct Engine {
    root: PathBuf,
    settings: Arc<Settings>,
    templates: FxHashMap<Arc<str>, Deferred<Compiled>>,
}

/// Returns the `/`-separated name of `path` relative to `root`.
fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let components: Vec<_> = relative.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();

    Some(components.join("/"))
}

impl Engine {
    /// Finds every file below `root` with a template extension.
    pub fn discover<P: AsRef<Path>>(root: P, settings: Settings) -> Result<Engine> {
        let root = root.as_ref();
        if !root.is_dir() {
            return err! {
                Io: "template root is not a directory",
                "root" => root.display(),
            };
        }

        let settings = Arc::new(settings);
        let mut templates = FxHashMap::default();
        let walker = jwalk::WalkDir::new(root).follow_links(true).sort(true);
        for entry in walker {
            let entry = entry.map_err(Error::from_std).chain_with(|| error! {
                Io: "failed to walk template directory",
                "root" => root.display(),
            })?;

            let path = entry.path();
            if !entry.file_type().is_file() || !settings.is_template_path(&path) {
                continue;
            }

            let Some(name) = relative_name(root, &path) else {
                continue;
            };

            let name: Arc<str> = name.into();
            let autoescape = settings.autoescape;
            let template_name = name.clone();
            let deferred = Deferred::new(move || {
                let text = path.as_path().read_str()?;
                if !is_template(&text) {
                    return Ok(Compiled::Verbatim(text));
                }

                Template::compile_with(&template_name, &text, autoescape).map(Compiled::Template)
            });

            templates.insert(name, deferred);
        }

        tracing::debug!(root = %root.display(), templates = templates.len(), "discovered templates");
        Ok(Engine { root: root.to_path_buf(), settings, templates })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The names of all discovered templates, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(|name| &**name).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Starts compiling every template on the rayon pool.
    pub fn compile_in_background(&self) {
        self.templates.values().for_each(Deferred::spawn);
    }

    /// Returns the compiled template `name`, compiling it if needed.
    pub fn get(&self, name: &str) -> Result<&Compiled> {
        let deferred = self.templates.get(name).ok_or_else(|| error! {
            NotFound: "no such template",
            "template" => name,
            "root" => self.root.display(),
        })?;

        deferred.force()
    }

    /// Renders the template `name` to `sink`. Fields resolve against `data`
    /// first and the settings' global data second.
    pub fn render<S: Sink>(&self, name: &str, mut sink: S, data: &dyn Invocable) -> Result<()> {
        match self.get(name)? {
            Compiled::Verbatim(text) => sink.begin().and_then(|_| sink.write_str(text)),
            Compiled::Template(template) => template.render_to(sink, &(data, &self.settings.data)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::error::ErrorKind;
    use crate::exec::Methods;
    use crate::value::{Dict, Value};

    struct TempDir(PathBuf);

    impl TempDir {
        fn new(label: &str) -> Self {
            let dir = std::env::temp_dir()
                .join(format!("quill-engine-{label}-{}", std::process::id()));

            let _ = fs::remove_dir_all(&dir);
            fs::create_dir_all(&dir).unwrap();
            TempDir(dir)
        }

        fn file(&self, name: &str, contents: &str) -> &Self {
            let path = self.0.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
            self
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.data.insert("Site".into(), Value::from("Quill"));
        settings
    }

    #[test]
    fn discovers_and_renders_by_relative_name() {
        let dir = TempDir::new("render");
        dir.file("index.html", "<h1>{{.Site}}</h1>{{.Title}}")
            .file("blog/post.html", "{{.Title | Upper}}")
            .file("static.html", "<p>it's static</p>")
            .file("style.css", "body { }");

        let engine = Engine::discover(&dir.0, settings()).unwrap();
        assert_eq!(engine.names(), ["blog/post.html", "index.html", "static.html"]);
        engine.compile_in_background();

        let data = Methods::new()
            .with("Title", || "<Home>")
            .with("Upper", |s: String| s.to_uppercase());

        let mut output = String::new();
        engine.render("index.html", &mut output, &data).unwrap();
        assert_eq!(output, "<h1>Quill</h1>&lt;Home&gt;");

        let mut output = String::new();
        engine.render("blog/post.html", &mut output, &data).unwrap();
        assert_eq!(output, "&lt;HOME&gt;");

        let mut output = String::new();
        engine.render("static.html", &mut output, &Dict::new()).unwrap();
        assert_eq!(output, "<p>it's static</p>");
    }

    #[test]
    fn unknown_templates_are_not_found() {
        let dir = TempDir::new("missing");
        dir.file("a.html", "a");

        let engine = Engine::discover(&dir.0, Settings::default()).unwrap();
        let error = engine.render("b.html", String::new(), &Dict::new()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert!(engine.get("style.css").is_err());
    }

    #[test]
    fn compile_errors_are_cached() {
        let dir = TempDir::new("errors");
        dir.file("bad.html", "{{ .Oops");

        let engine = Engine::discover(&dir.0, Settings::default()).unwrap();
        assert_eq!(engine.get("bad.html").unwrap_err().kind(), ErrorKind::Lex);
        fs::write(dir.0.join("bad.html"), "fixed").unwrap();
        assert_eq!(engine.get("bad.html").unwrap_err().kind(), ErrorKind::Lex);
    }

    #[test]
    fn root_must_be_a_directory() {
        let error = Engine::discover("/definitely/not/here", Settings::default()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Io);
    }
}
