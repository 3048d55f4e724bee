mod app;
mod config;
mod error;
mod input;
mod layout;
mod model;
mod predicates;
mod render;
mod rope;
mod sim;

use anyhow::{Context, Result};
use clap::Parser;
use config::Args;
use std::fs::File;

fn init_logging(args: &Args) -> Result<()> {
    // the terminal UI owns stdout/stderr, so stay quiet there unless told otherwise
    let fallback = match (&args.log_level, args.headless || args.log_file.is_some()) {
        (Some(level), _) => level.as_str(),
        (None, true) => "info",
        (None, false) => "off",
    };
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(fallback));
    if let Some(path) = &args.log_file {
        let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.format_timestamp_millis().init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;
    app::run(args)
}
