//! taskcard: renders programming-task cards from a TOML config.
//!
//! Usage: taskcard [CONFIG] [--watch]
//!
//! Without CONFIG the config is looked up via $TASKCARD_CONFIG, then ./taskcard.toml.
//! With --watch the batch is re-run whenever the config file changes.

use std::path::{Path, PathBuf};
use std::process;

use log::{error, info, warn};

use taskcard::batch::run_batch;
use taskcard::config::RunConfig;
use taskcard::watcher::watch_config;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut watch = false;
    let mut explicit = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--watch" | "-w" => watch = true,
            flag if flag.starts_with('-') => warn!("Ignoring unknown flag {flag}"),
            path => explicit = Some(PathBuf::from(path)),
        }
    }

    let Some(config_path) = RunConfig::find(explicit) else {
        error!("No config found; pass a path or set TASKCARD_CONFIG");
        process::exit(2);
    };

    let ok = run_once(&config_path);
    if !watch {
        process::exit(if ok { 0 } else { 1 });
    }

    if let Err(e) = watch_config(&config_path, || {
        run_once(&config_path);
        true
    }) {
        error!("{e}");
        process::exit(1);
    }
}

/// Load the config and render every task. Returns false if anything failed.
fn run_once(config_path: &Path) -> bool {
    let config = match RunConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return false;
        }
    };
    match run_batch(&config) {
        Ok(report) => {
            info!("Output in {}", config.output_dir.display());
            report.is_clean()
        }
        Err(e) => {
            error!("{e}");
            false
        }
    }
}
