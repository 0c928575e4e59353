use anyhow::Context;
use clap::Parser;
use log::info;
use rulemine::config::MiningConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;

fn init_parallelism(threads: Option<usize>) {
    static START: Once = Once::new();
    START.call_once(|| {
        let n = threads.unwrap_or_else(num_cpus::get).max(1);
        let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
    });
}

#[derive(Parser, Debug)]
#[command(name = "rulemine", version, about = "Mine automation rules from device usage logs")]
struct Cli {
    /// Device log files (JSON documents with `device`, `capability`, `neighbors`, `history`).
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Directory receiving one `<log>_<command>_rule.json` file per rule
    #[arg(long = "output-dir", short = 'o', default_value = "output")]
    output_dir: PathBuf,

    /// JSON file with `min_sup`, `time_err`, `num_err` (missing fields use defaults)
    #[arg(long = "config")]
    config: Option<PathBuf>,

    #[arg(long = "min-sup")] min_sup: Option<usize>,
    /// Time chaining tolerance in angle units (1 unit = 4 minutes)
    #[arg(long = "time-err")] time_err: Option<f64>,
    #[arg(long = "num-err")] num_err: Option<f64>,

    /// Print rules to stdout instead of writing files
    #[arg(long = "stdout", default_value_t = false)] stdout: bool,
    /// Print the full mining report (regions skipped, failures, conflicts) as JSON
    #[arg(long = "report", default_value_t = false)] report: bool,

    /// Worker threads for mining command groups (defaults to the CPU count)
    #[arg(long = "threads")] threads: Option<usize>,
}

fn load_config(cli: &Cli) -> anyhow::Result<MiningConfig> {
    let base = match &cli.config {
        Some(p) => {
            let text = fs::read_to_string(p).with_context(|| format!("reading config {}", p.display()))?;
            MiningConfig::from_json_str(&text).with_context(|| format!("parsing config {}", p.display()))?
        }
        None => MiningConfig::default(),
    };
    Ok(base.with_overrides(cli.min_sup, cli.time_err, cli.num_err)?)
}

fn file_stem(p: &Path) -> String {
    p.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "log".to_string())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    init_parallelism(cli.threads);
    let config = load_config(&cli)?;
    info!(
        "min_sup={} time_err={} num_err={}",
        config.min_sup(),
        config.time_err(),
        config.num_err()
    );

    for path in &cli.input {
        let doc = rulemine::store::read_log_file(path)?;
        let report = rulemine::engine::mine_document(&doc, &config);

        if cli.report {
            println!("{}", serde_json::to_string_pretty(&report)?);
            continue;
        }
        if cli.stdout {
            let rules: Vec<_> = report.rules().collect();
            println!("{}", serde_json::to_string_pretty(&rules)?);
            continue;
        }
        let written = rulemine::store::write_rules(&cli.output_dir, &file_stem(path), &report)?;
        if written.is_empty() {
            info!("{}: no rule detected", path.display());
        }
        for name in written {
            println!("{}", cli.output_dir.join(name).display());
        }
    }
    Ok(())
}
