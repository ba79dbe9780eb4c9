//! tripclean CLI: clean a directory of trip-history CSVs into one parquet file.

mod config_file;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;
use tripclean_core::config::CleanConfig;
use tripclean_exec::Engine;

use crate::config_file::ConfigFile;

#[derive(Debug, Parser)]
#[command(name = "tripclean")]
#[command(
    about = "Clean bike-share trip-history CSV files into a single verified parquet file",
    long_about = None
)]
struct Cli {
    /// Directory holding the raw CSV files [env: RAW_DIR, default: data/raw]
    #[arg(long)]
    raw_dir: Option<String>,

    /// Directory the parquet file is written to [env: CLEAN_DIR, default: data/clean]
    #[arg(long)]
    clean_dir: Option<String>,

    /// Glob pattern matched inside the raw directory [default: *.csv]
    #[arg(long)]
    pattern: Option<String>,

    /// Output file name [default: trips_clean.parquet]
    #[arg(long)]
    out: Option<String>,

    /// Scan every row for type inference instead of a sample
    #[arg(long)]
    infer_all: bool,

    /// YAML config file applied after environment variables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rows per block streamed through the pipeline
    #[arg(long)]
    batch_rows: Option<usize>,

    /// Rows per file sampled for type inference
    #[arg(long)]
    sample_rows: Option<usize>,

    /// Print the cleaning plan and exit without writing
    #[arg(long)]
    explain: bool,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Filter used when `RUST_LOG` is unset: progress lines from the pipeline
/// crates at info, everything else at warn. `-v`/`-vv` raise it globally.
fn default_directives(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn,tripclean=info,tripclean_exec=info,tripclean_io=info,tripclean_planner=info",
        1 => "debug",
        _ => "trace",
    }
}

fn init_tracing(verbose: u8) {
    let directives = default_directives(verbose);
    let filter = if verbose == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
    } else {
        EnvFilter::new(directives)
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CleanConfig::from_env();
    if let Some(path) = &cli.config {
        ConfigFile::load(path)?.apply(&mut config);
    }
    apply_cli_overrides(&mut config, cli);
    config.raw_dir = absolutize(&config.raw_dir)?;
    config.clean_dir = absolutize(&config.clean_dir)?;
    tracing::debug!(?config, "effective configuration");

    let mut engine = Engine::new(config)?;

    if cli.explain {
        let prepared = engine.prepare()?;
        println!("Cleaning plan ({} input file(s))", prepared.files.len());
        println!("{}", prepared.logical.explain());
        return Ok(());
    }

    fs::create_dir_all(&engine.config().clean_dir)?;
    let report = engine.execute()?;

    println!(
        "Wrote {} cleaned rows to {}",
        report.verified_rows,
        report.output.display()
    );
    Ok(())
}

fn apply_cli_overrides(cfg: &mut CleanConfig, cli: &Cli) {
    if let Some(v) = &cli.raw_dir {
        cfg.raw_dir = v.clone();
    }
    if let Some(v) = &cli.clean_dir {
        cfg.clean_dir = v.clone();
    }
    if let Some(v) = &cli.pattern {
        cfg.pattern = v.clone();
    }
    if let Some(v) = &cli.out {
        cfg.out = v.clone();
    }
    if cli.infer_all {
        cfg.infer_all = true;
    }
    if let Some(v) = cli.batch_rows {
        cfg.batch_rows = v;
    }
    if let Some(v) = cli.sample_rows {
        cfg.sample_rows = v;
    }
}

/// Expand a leading `~` and anchor relative paths at the working directory.
fn absolutize(raw: &str) -> std::io::Result<String> {
    let expanded = expand_home(raw, std::env::var_os("HOME").map(PathBuf::from));
    let abs = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()?.join(expanded)
    };
    Ok(abs.to_string_lossy().into_owned())
}

fn expand_home(raw: &str, home: Option<PathBuf>) -> PathBuf {
    match (raw.strip_prefix('~'), home) {
        (Some(""), Some(h)) => h,
        (Some(rest), Some(h)) if rest.starts_with('/') => h.join(&rest[1..]),
        _ => Path::new(raw).to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("tripclean").chain(args.iter().copied()))
    }

    #[test]
    fn flags_override_config_file() {
        let mut config = CleanConfig::default();
        ConfigFile::parse("raw_dir: /from/yaml\npattern: \"2023-*.csv\"\n")
            .unwrap()
            .apply(&mut config);
        apply_cli_overrides(&mut config, &parse(&["--raw-dir", "/from/cli", "--infer-all"]));
        assert_eq!(config.raw_dir, "/from/cli");
        assert_eq!(config.pattern, "2023-*.csv");
        assert!(config.infer_all);
    }

    #[test]
    fn absent_flags_keep_existing_values() {
        let mut config = CleanConfig {
            batch_rows: 64,
            ..CleanConfig::default()
        };
        apply_cli_overrides(&mut config, &parse(&[]));
        assert_eq!(config.batch_rows, 64);
        assert!(!config.infer_all);
    }

    #[test]
    fn verbose_counts() {
        assert_eq!(parse(&["-vv"]).verbose, 2);
        assert!(parse(&["--explain"]).explain);
    }

    #[test]
    fn home_expansion() {
        let home = Some(PathBuf::from("/home/rider"));
        assert_eq!(expand_home("~", home.clone()), PathBuf::from("/home/rider"));
        assert_eq!(
            expand_home("~/data/raw", home.clone()),
            PathBuf::from("/home/rider/data/raw")
        );
        assert_eq!(expand_home("~other/x", home), PathBuf::from("~other/x"));
        assert_eq!(expand_home("~/x", None), PathBuf::from("~/x"));
    }

    #[test]
    fn relative_paths_become_absolute() {
        let abs = absolutize("data/raw").unwrap();
        assert!(Path::new(&abs).is_absolute());
        assert!(abs.ends_with("data/raw"));
    }

    #[test]
    fn quiet_default_still_shows_pipeline_progress() {
        let directives = default_directives(0);
        assert!(directives.starts_with("warn"));
        assert!(directives.contains("tripclean_exec=info"));
        assert!(directives.contains("tripclean_io=info"));
        assert!(EnvFilter::try_new(directives).is_ok());
        assert_eq!(default_directives(1), "debug");
        assert_eq!(default_directives(5), "trace");
    }
}
