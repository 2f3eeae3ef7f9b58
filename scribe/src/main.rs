use std::process::ExitCode;
use std::time::Instant;

use quill::error::Result;
use quill::templating::Engine;
use quill::time;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

mod config;
mod render;

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Renders every template in a directory into another directory.
        cmd scribe {
            /// Directory of templates and an optional `scribe.toml`.
            required input: PathBuf
            /// Directory to write rendered files to.
            required output: PathBuf
            /// A TOML or JSON file of data to render templates with.
            optional -d, --data data: PathBuf
            /// Log at debug level.
            optional -v, --verbose
        }
    }
}

fn init_logging(verbose: bool) {
    let default = match verbose {
        true => "scribe=debug,quill=debug",
        false => "scribe=info,quill=info",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(flags: &flags::Scribe) -> Result<()> {
    let start = Instant::now();
    let config = time!("config" => Config::load(&flags.input, flags.data.as_deref())?);
    let engine = time!("discovery" => Engine::discover(&flags.input, config.settings)?);
    tracing::info!(input = %flags.input.display(), templates = engine.len(), "discovered templates");

    engine.compile_in_background();
    let rendered = time!("render" => render::render_all(&engine, &flags.output, &config.data)?);
    tracing::info!(output = %flags.output.display(), rendered, "rendered templates");
    println!("total time: {}ms", start.elapsed().as_millis());
    Ok(())
}

pub fn main() -> ExitCode {
    let flags = flags::Scribe::from_env_or_exit();
    init_logging(flags.verbose);

    match run(&flags) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
