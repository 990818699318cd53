use crate::config::AppConfig;
use crate::error::Result;
use crate::export;
use crate::load::{self, UploadStamp};
use crate::transform::{self, TransformOptions};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::info;

/// Outcome of one upload action.
#[derive(Debug, Clone)]
pub struct UploadSummary {
    pub rows_processed: usize,
    pub rows_written: usize,
    pub artifact_path: PathBuf,
}

/// One user-triggered upload, start to finish: transform the source, write the
/// downloadable artifact, persist to the store. The upload timestamp is taken
/// once here and stamps both the artifact name and the persisted provenance.
pub fn run_upload(
    config: &AppConfig,
    input: &Path,
    opts: &TransformOptions,
    user: &str,
) -> Result<UploadSummary> {
    let upload_time = Utc::now().naive_utc();

    let cleaned = transform::process_engagement_data(input, opts)?;
    let rows_processed = cleaned.rows.len();

    config.ensure_dirs()?;
    let artifact_path = config.data_dir.join(format!(
        "processed_data_{}.csv",
        upload_time.format("%Y%m%d_%H%M%S")
    ));
    export::write_cleaned_csv(&cleaned, &artifact_path)?;

    let stamp = UploadStamp {
        timestamp: upload_time,
        user: user.to_string(),
    };
    let rows_written = load::load_data_to_db(
        &config.db_path,
        &cleaned,
        &config.engagement_table,
        &stamp,
    )?;

    info!(
        rows_processed,
        rows_written,
        artifact = %artifact_path.display(),
        "upload complete"
    );
    Ok(UploadSummary {
        rows_processed,
        rows_written,
        artifact_path,
    })
}
