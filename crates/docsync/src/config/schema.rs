use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// Falls back to `db::default_database_path()` when absent.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub merge: MergeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            database_path: None,
            worker: WorkerConfig::default(),
            merge: MergeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Locations of the external merge program. The execution timeout is fixed
/// and deliberately not part of the configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Interpreter used to run `program`.
    #[serde(default = "default_runtime")]
    pub runtime: PathBuf,
    #[serde(default = "default_program")]
    pub program: PathBuf,
    /// Root of the per-document/per-kind artifact directories.
    #[serde(default = "default_output_base_dir")]
    pub output_base_dir: PathBuf,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

fn default_runtime() -> PathBuf {
    PathBuf::from("../python-analysis-service/myenv/bin/python")
}

fn default_program() -> PathBuf {
    PathBuf::from("../python-analysis-service/docling_to_pdf.py")
}

fn default_output_base_dir() -> PathBuf {
    PathBuf::from("uploads/analysis")
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            runtime: default_runtime(),
            program: default_program(),
            output_base_dir: default_output_base_dir(),
            working_dir: None,
        }
    }
}
