use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::RunReport;

/// Write the run payload to a timestamped JSON file and return its path.
pub fn write(report: &RunReport, reports_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(reports_dir)
        .with_context(|| format!("Failed to create reports dir {}", reports_dir.display()))?;

    let timestamp = report.finished.format("%Y%m%dT%H%M%SZ");
    let path = reports_dir.join(format!("run-{}.json", timestamp));

    let file = fs::File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}
