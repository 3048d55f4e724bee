use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub(crate) const MIN_TICK_RATE: u32 = 1;
pub(crate) const MAX_TICK_RATE: u32 = 240;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) tick_rate: u32,
    pub(crate) enable_color: bool,
    pub(crate) rule_a: String,
    pub(crate) rule_b: String,
    pub(crate) ball_count: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_rate: 30,
            enable_color: true,
            rule_a: "1".to_string(),
            rule_b: "101".to_string(),
            ball_count: 180,
        }
    }
}

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "cyclic-tag")]
#[command(about = "Ball-and-seesaw cyclic tag machine in the terminal", long_about = None)]
pub(crate) struct Args {
    /// ticks per second (best effort)
    #[arg(long)]
    pub(crate) tick_rate: Option<u32>,

    /// production rule A as bits, e.g. 1
    #[arg(long)]
    pub(crate) rule_a: Option<String>,

    /// production rule B as bits, e.g. 101
    #[arg(long)]
    pub(crate) rule_b: Option<String>,

    /// number of tape balls (spacers included)
    #[arg(long)]
    pub(crate) balls: Option<usize>,

    /// monochrome output
    #[arg(long, default_value_t = false)]
    pub(crate) no_color: bool,

    /// run without a terminal UI and print a final report
    #[arg(long, default_value_t = false)]
    pub(crate) headless: bool,

    /// stop after N ticks (headless default: 600)
    #[arg(long)]
    pub(crate) ticks: Option<u64>,

    /// print the headless report as JSON
    #[arg(long, default_value_t = false)]
    pub(crate) json: bool,

    /// write logs to this file
    #[arg(long)]
    pub(crate) log_file: Option<PathBuf>,

    /// default log level when RUST_LOG is unset
    #[arg(long)]
    pub(crate) log_level: Option<String>,

    /// store the effective settings as the new defaults
    #[arg(long, default_value_t = false)]
    pub(crate) save_settings: bool,
}

impl Settings {
    /// Command-line values win over the settings file.
    pub(crate) fn merged_with(mut self, args: &Args) -> Self {
        if let Some(rate) = args.tick_rate {
            self.tick_rate = rate;
        }
        if let Some(a) = &args.rule_a {
            self.rule_a = a.clone();
        }
        if let Some(b) = &args.rule_b {
            self.rule_b = b.clone();
        }
        if let Some(n) = args.balls {
            self.ball_count = n;
        }
        if args.no_color {
            self.enable_color = false;
        }
        self.tick_rate = self.tick_rate.clamp(MIN_TICK_RATE, MAX_TICK_RATE);
        self
    }
}

pub(crate) struct Paths {
    pub(crate) settings_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "cyclic-tag", "CyclicTag")
        .context("could not resolve project directories")?;
    let dir = proj.config_dir().to_path_buf();
    fs::create_dir_all(&dir).ok();
    Ok(Paths {
        settings_path: dir.join("settings.json"),
    })
}

pub(crate) fn load_settings(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        match serde_json::from_str::<Settings>(&s) {
            Ok(v) => return v,
            Err(e) => log::warn!("ignoring unreadable settings {}: {}", path.display(), e),
        }
    }
    Settings::default()
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

pub(crate) fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename-over-existing is not atomic on Windows; remove first
    if to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)?;
    Ok(())
}
