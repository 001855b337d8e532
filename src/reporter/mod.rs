pub mod json;
pub mod markdown;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Finding, Snapshot};

/// Full payload of one diagnostic run, persisted as JSON and rendered as
/// Markdown. A later run may reload the JSON to rebuild metric history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub results: Vec<Snapshot>,
    pub findings: Vec<Finding>,
}
