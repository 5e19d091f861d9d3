//! Report export.
//!
//! Export runs after the interview has terminated and is best-effort: a
//! failure is reported to the caller but never takes the summary away.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use insight_types::InterviewReport;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write report to {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Reference to a saved report document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedArtifact {
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait ReportExporter: Send + Sync {
    async fn export(&self, report: &InterviewReport) -> Result<ExportedArtifact, ExportError>;
}

/// Writes each report as a Markdown file in `output_dir`.
#[derive(Debug, Clone)]
pub struct FileExporter {
    output_dir: PathBuf,
}

impl FileExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `{theme}_interview_results_{YYYYMMDD_HHMMSS}.md`
    pub fn file_name(report: &InterviewReport) -> String {
        format!(
            "{}_interview_results_{}.md",
            sanitize(&report.theme),
            report.generated_at.format("%Y%m%d_%H%M%S")
        )
    }
}

#[async_trait]
impl ReportExporter for FileExporter {
    async fn export(&self, report: &InterviewReport) -> Result<ExportedArtifact, ExportError> {
        let path = self.output_dir.join(Self::file_name(report));
        let io_err = |source| ExportError::Io {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(io_err)?;
        tokio::fs::write(&path, render_document(report))
            .await
            .map_err(io_err)?;

        tracing::info!(session_id = %report.session_id, path = %path.display(), "exported interview report");

        Ok(ExportedArtifact {
            path,
            created_at: report.generated_at,
        })
    }
}

/// The document body: title, numbered summary items, then the transcript.
pub fn render_document(report: &InterviewReport) -> String {
    let mut doc = format!("# {} interview results\n\n", report.theme);
    for (index, item) in report.summary_items().enumerate() {
        doc.push_str(&format!("{}. {}\n", index + 1, item));
    }
    doc.push_str("\n## Transcript\n\n");
    for turn in &report.source_transcript {
        doc.push_str(&format!(
            "- **{}:** {}\n",
            turn.speaker.context_prefix(),
            turn.text
        ));
    }
    doc
}

/// Keeps letters (any script), digits, `-` and `_`; everything else becomes
/// `_`.
fn sanitize(theme: &str) -> String {
    let cleaned: String = theme
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('_').is_empty() {
        "interview".to_string()
    } else {
        cleaned
    }
}
