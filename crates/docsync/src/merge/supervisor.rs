use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use super::error::{MergeError, RunError};
use super::protocol::parse_success_marker;
use super::runner::{Invocation, ProcessRunner};
use crate::config::MergeConfig;
use crate::models::AnalysisKind;

/// Hard bound on one merge run. Not configurable.
pub const MERGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives the external merge program that turns a document's per-page
/// artifacts into one downloadable file.
#[derive(Clone)]
pub struct MergeSupervisor {
    config: MergeConfig,
    runner: Arc<dyn ProcessRunner>,
}

impl std::fmt::Debug for MergeSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeSupervisor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MergeSupervisor {
    pub fn new(config: MergeConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Relative paths are taken from the configured working directory when
    /// one is set, otherwise from the current one.
    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.config.working_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn invocation(&self, document_id: &str, kind: AnalysisKind) -> Result<Invocation, MergeError> {
        let program = self.resolve(&self.config.program);
        if !program.exists() {
            return Err(MergeError::NotConfigured {
                what: "program",
                path: program,
            });
        }
        let runtime = self.resolve(&self.config.runtime);
        if !runtime.exists() {
            return Err(MergeError::NotConfigured {
                what: "runtime",
                path: runtime,
            });
        }

        Ok(Invocation {
            program: runtime,
            args: vec![
                program.display().to_string(),
                document_id.to_string(),
                "--analysis-type".to_string(),
                kind.to_string(),
                "--base-dir".to_string(),
                self.config.output_base_dir.display().to_string(),
            ],
            working_dir: self.config.working_dir.clone(),
        })
    }

    /// Runs the merge program for one (document, kind) pair and returns the
    /// bytes of the file it produced.
    pub async fn merge(&self, document_id: &str, kind: AnalysisKind) -> Result<Vec<u8>, MergeError> {
        let invocation = self.invocation(document_id, kind)?;
        info!(
            "Merging {} results for document {}: {}",
            kind,
            document_id,
            invocation.display()
        );

        let output = self
            .runner
            .run(&invocation, MERGE_TIMEOUT)
            .await
            .map_err(|e| match e {
                RunError::TimedOut(_) => {
                    error!("Merge program timed out after {} seconds", MERGE_TIMEOUT.as_secs());
                    MergeError::TimedOut {
                        secs: MERGE_TIMEOUT.as_secs(),
                    }
                }
                other => {
                    error!("Error executing merge program: {}", other);
                    MergeError::Failed(other.to_string())
                }
            })?;

        if !output.success() {
            error!(
                "Merge program failed with exit code {:?}: {}",
                output.exit_code,
                output.combined_output.trim()
            );
            return Err(MergeError::Failed(match output.exit_code {
                Some(code) => format!("merge program exited with code {}", code),
                None => "merge program was terminated by a signal".to_string(),
            }));
        }

        let Some(path) = parse_success_marker(&output.combined_output) else {
            error!(
                "Merge program exited cleanly without a success marker: {}",
                output.combined_output.trim()
            );
            return Err(MergeError::Protocol(
                "no success marker in merge output".to_string(),
            ));
        };

        let path = self.resolve(&path);
        info!("Merged document created at {}", path.display());
        tokio::fs::read(&path)
            .await
            .map_err(|source| MergeError::ReadOutput { path, source })
    }

    /// Whether the per-document, per-kind artifact directory holds anything.
    pub fn has_results(&self, document_id: &str, kind: AnalysisKind) -> bool {
        let dir = self
            .resolve(&self.config.output_base_dir)
            .join(document_id)
            .join(kind.as_str());

        match std::fs::read_dir(&dir) {
            Ok(mut entries) => entries.next().is_some(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!("Error checking analysis results in {}: {}", dir.display(), e);
                false
            }
        }
    }
}
