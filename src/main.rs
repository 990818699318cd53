use anyhow::Result;
use etc_tracker::config::AppConfig;
use etc_tracker::transform::TransformOptions;
use etc_tracker::upload;
use std::env;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn usage() -> ! {
    eprintln!(
        "usage: etc-tracker <engagement-list.csv> \
         [--start-row N] [--service-line NAME] [--config FILE]"
    );
    std::process::exit(2);
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env_filter).init();

    // ─── 2) parse arguments ──────────────────────────────────────────
    let mut input: Option<PathBuf> = None;
    let mut opts = TransformOptions::default();
    let mut config_path: Option<PathBuf> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--start-row" => match args.next().and_then(|v| v.parse().ok()) {
                Some(n) => opts.start_row = n,
                None => usage(),
            },
            "--service-line" => match args.next() {
                Some(v) => opts.service_line = v,
                None => usage(),
            },
            "--config" => match args.next() {
                Some(v) => config_path = Some(PathBuf::from(v)),
                None => usage(),
            },
            "--help" | "-h" => usage(),
            other if input.is_none() && !other.starts_with('-') => {
                input = Some(PathBuf::from(other));
            }
            _ => usage(),
        }
    }
    let input = match input {
        Some(p) => p,
        None => usage(),
    };

    // ─── 3) load config & run the upload ─────────────────────────────
    let config = match config_path {
        Some(ref p) => AppConfig::from_yaml_file(p)?,
        None => {
            let default_path = Path::new("config.yaml");
            if default_path.exists() {
                AppConfig::from_yaml_file(default_path)?
            } else {
                AppConfig::default()
            }
        }
    };
    let user = env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    info!(input = %input.display(), service_line = %opts.service_line, user = %user, "starting upload");

    let summary = upload::run_upload(&config, &input, &opts, &user)?;

    if summary.rows_processed == 0 {
        println!(
            "no rows matched service line `{}` with status Released",
            opts.service_line
        );
    }
    println!(
        "processed {} row(s), wrote {} new row(s) to `{}`; artifact: {}",
        summary.rows_processed,
        summary.rows_written,
        config.engagement_table,
        summary.artifact_path.display()
    );
    Ok(())
}
