//! Durable report artifact writing.

use std::fs;
use std::path::Path;

use async_trait::async_trait;

use gauntlet_core::domain::{BatchReport, Result};
use gauntlet_core::traits::ReportSink;

/// Writes batch reports as pretty-printed JSON files.
///
/// Creates intermediate directories as needed and overwrites any existing
/// content at the destination.
#[derive(Debug, Default)]
pub struct JsonReportSink;

impl JsonReportSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReportSink for JsonReportSink {
    async fn write(&self, report: &BatchReport, destination: &Path) -> Result<()> {
        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(report)?;
        fs::write(destination, content)?;
        Ok(())
    }
}
