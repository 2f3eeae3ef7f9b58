use std::path::Path;

use quill::err;
use quill::error::{Chainable, Result};
use quill::templating::Settings;
use quill::value::{Dict, Format, Json, Toml};

/// Name of the settings file looked for in the input directory.
pub const CONFIG_FILE: &str = "scribe.toml";

/// Everything `scribe` renders with: the template settings, whose data is
/// global, and the data passed on the command line, which shadows it.
#[derive(Debug, Default)]
pub struct Config {
    pub settings: Settings,
    pub data: Dict,
}

impl Config {
    /// Reads `scribe.toml` from `input`, if there is one, and the data file
    /// at `data`, if given.
    pub fn load(input: &Path, data: Option<&Path>) -> Result<Self> {
        let settings_path = input.join(CONFIG_FILE);
        let settings = match settings_path.is_file() {
            true => Settings::read(&settings_path)?,
            false => Settings::default(),
        };

        let data = match data {
            Some(path) => read_data(path).chain_with(|| quill::error! {
                "failed to load template data",
                "path" => path.display(),
            })?,
            None => Dict::new(),
        };

        tracing::debug!(?settings, keys = data.len(), "loaded configuration");
        Ok(Config { settings, data })
    }
}

fn read_data(path: &Path) -> Result<Dict> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Toml::read(path),
        Some("json") => Json::read(path),
        _ => err! {
            "unsupported data file format",
            "expected" => "a .toml or .json file",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_files_need_a_known_extension() {
        let error = Config::load(Path::new("."), Some(Path::new("data.yaml"))).unwrap_err();
        let report = error.to_string();
        assert!(report.contains("unsupported data file format"), "{report}");
        assert!(report.contains("data.yaml"), "{report}");
    }

    #[test]
    fn settings_are_read_from_the_input_directory() {
        let input = std::env::temp_dir().join(format!("scribe-config-{}", std::process::id()));
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(input.join(CONFIG_FILE), "autoescape = false\nSite = \"x\"\n").unwrap();

        let config = Config::load(&input, None).unwrap();
        assert!(!config.settings.autoescape);
        assert!(config.settings.data.contains_key("Site"));
        let _ = std::fs::remove_dir_all(&input);
    }

    #[test]
    fn missing_settings_are_defaulted() {
        let config = Config::load(Path::new("/definitely/not/here"), None).unwrap();
        assert!(config.settings.autoescape);
        assert!(config.data.is_empty());
    }
}
