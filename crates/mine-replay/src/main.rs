//! Demo replay utility: loads a level file, plays every recorded demo back
//! against the engine and reports the resulting statistics as JSON.
//!
//! Usage:
//!   mine-replay <level-file> [--config replay.json] [--demo <title>] [--repair]

mod telemetry;

use anyhow::{bail, Context, Result};
use clap::Parser;
use mine_core::{prototype, ReplayConfig, StatsSummary};
use mine_level::{alphabet, check, DemoCheck};
use mine_world::Level;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "mine-replay")]
#[command(about = "Replay and verify the demos stored in a level file")]
struct Args {
    /// Level file whose demos are replayed
    level: PathBuf,

    /// JSON file with replay options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only replay the demo with this title
    #[arg(long)]
    demo: Option<String>,

    /// Repair a truncated level file (keeps the original as .bak)
    #[arg(long)]
    repair: bool,

    /// Print one JSON line per demo instead of a single report
    #[arg(long)]
    json_lines: bool,

    /// Write logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[derive(Serialize)]
struct LevelReport<'a> {
    level: &'a str,
    demos: Vec<DemoCheck>,
    summary: StatsSummary,
}

fn load_config(args: &Args) -> Result<ReplayConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => ReplayConfig::default(),
    };
    config.repair_truncated |= args.repair;
    config.json_lines |= args.json_lines;
    Ok(config)
}

fn load_level(path: &Path, repair: bool) -> Result<Level> {
    match mine_level::load(path) {
        Ok(level) => Ok(level),
        Err(err) if repair && err.is_malformed() => {
            warn!(event = "level_damaged", path = %path.display(), error = %err);
            let backup = mine_level::repair_file(path)
                .with_context(|| format!("repairing {}", path.display()))?;
            info!(backup = %backup.display(), "Original level kept");
            mine_level::load(path).with_context(|| format!("loading repaired {}", path.display()))
        }
        Err(err) => Err(err).with_context(|| format!("loading {}", path.display())),
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    telemetry::init_telemetry(args.log_json)?;

    prototype::verify().context("object prototype table")?;
    alphabet::verify().context("identifier alphabet")?;

    let config = load_config(&args)?;
    let level = load_level(&args.level, config.repair_truncated)?;
    level.validate_layout().context("level is not playable")?;

    let demos: Vec<_> = level
        .demos()
        .iter()
        .filter(|d| args.demo.as_deref().map_or(true, |title| d.title == title))
        .collect();
    if demos.is_empty() {
        bail!("{} holds no matching demo", args.level.display());
    }
    info!(title = %level.meta.title, demos = demos.len(), "Replaying demos");

    let mut summary = StatsSummary::new();
    let mut results = Vec::with_capacity(demos.len());
    let mut inconsistent = 0;

    for demo in demos {
        let result = check(&level, demo, &config);
        if !result.verdict.is_consistent() {
            inconsistent += 1;
        }
        if let Some(report) = &result.report {
            summary.update(&report.stats);
        }

        if config.json_lines {
            println!("{}", serde_json::to_string(&result)?);
        } else {
            results.push(result);
        }
    }

    if !config.json_lines {
        let report = LevelReport {
            level: &level.meta.title,
            demos: results,
            summary,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if inconsistent > 0 {
        warn!(inconsistent, "Some demos no longer match their recorded result");
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}
