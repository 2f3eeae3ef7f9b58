use std::io::Write;
use std::path::Path;

use quill::error::{Chainable, Result};
use quill::rayon::prelude::*;
use quill::templating::Engine;
use quill::value::{Dict, IntoFileSink};

/// Renders every template in `engine` in parallel, writing each to its name
/// relative to `output`. Returns the number of templates rendered.
pub fn render_all(engine: &Engine, output: &Path, data: &Dict) -> Result<usize> {
    let names = engine.names();
    names.par_iter().try_for_each(|name| -> Result<()> {
        let path = output.join(name);
        let mut sink = path.create()?;
        engine.render(name, &mut sink, data)
            .and_then(|_| Ok(sink.flush()?))
            .chain_with(|| quill::error! {
                "failed to render template",
                "template" => name,
                "output" => path.display(),
            })?;

        tracing::debug!(template = name, "rendered");
        Ok(())
    })?;

    Ok(names.len())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use quill::templating::Settings;

    #[test]
    fn renders_the_tree_into_output() {
        let root = std::env::temp_dir().join(format!("scribe-render-{}", std::process::id()));
        let (input, output) = (root.join("in"), root.join("out"));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(input.join("nested")).unwrap();
        fs::write(input.join("index.html"), "<b>{{.Name}}</b>").unwrap();
        fs::write(input.join("nested/page.html"), "plain").unwrap();

        let engine = Engine::discover(&input, Settings::default()).unwrap();
        let data = quill::dict!["Name" => "a<b"];
        assert_eq!(render_all(&engine, &output, &data).unwrap(), 2);

        assert_eq!(fs::read_to_string(output.join("index.html")).unwrap(), "<b>a&lt;b</b>");
        assert_eq!(fs::read_to_string(output.join("nested/page.html")).unwrap(), "plain");
        let _ = fs::remove_dir_all(&root);
    }
}
