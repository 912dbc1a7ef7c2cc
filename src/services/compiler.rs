//! Compile-and-run for submitted source text.
//!
//! Each request owns a scratch temporary directory, so concurrent requests
//! never share compiler inputs or outputs, and the directory is removed on
//! every exit path when it drops. Compiler failures and nonzero program
//! exits are reported inline in the response body rather than as HTTP
//! errors. No timeouts or resource limits are imposed on either subprocess.

use crate::error::ApiError;
use serde::Serialize;
use std::path::PathBuf;
use tokio::process::Command;

/// Wire shape of a compile request's result.
#[derive(Debug, Clone, Serialize)]
pub struct CompileResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompileResponse {
    fn ok(output: String) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error),
        }
    }
}

pub struct CompileTools {
    compiler: String,
    scratch_dir: Option<PathBuf>,
}

impl CompileTools {
    pub fn new(compiler: String, scratch_dir: Option<PathBuf>) -> Self {
        Self {
            compiler,
            scratch_dir,
        }
    }

    /// Compile `code` and, when it builds, run the produced binary and
    /// capture its output.
    pub async fn compile_and_run(&self, code: &str) -> Result<CompileResponse, ApiError> {
        // Scratch space owned by this request; removed when dropped.
        let scratch = match &self.scratch_dir {
            Some(dir) => tempfile::Builder::new().prefix("compile_").tempdir_in(dir),
            None => tempfile::Builder::new().prefix("compile_").tempdir(),
        }?;

        let source = scratch
            .path()
            .join(format!("code_{}.cpp", chrono::Utc::now().timestamp_millis()));
        let binary = scratch.path().join("a.out");
        tokio::fs::write(&source, code).await?;

        let compile = match Command::new(&self.compiler)
            .arg(&source)
            .arg("-o")
            .arg(&binary)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                return Ok(CompileResponse::failed(format!(
                    "Failed to run {}: {}",
                    self.compiler, e
                )))
            }
        };

        if !compile.status.success() {
            let stderr = String::from_utf8_lossy(&compile.stderr).trim().to_string();
            let diagnostic = if stderr.is_empty() {
                format!("{} failed ({})", self.compiler, compile.status)
            } else {
                stderr
            };
            return Ok(CompileResponse::failed(diagnostic));
        }

        let run = match Command::new(&binary)
            .current_dir(scratch.path())
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                return Ok(CompileResponse::failed(format!(
                    "Failed to execute program: {}",
                    e
                )))
            }
        };

        if run.status.success() {
            Ok(CompileResponse::ok(
                String::from_utf8_lossy(&run.stdout).into_owned(),
            ))
        } else {
            Ok(CompileResponse::failed(format!(
                "Program failed ({})\n{}",
                run.status,
                String::from_utf8_lossy(&run.stderr)
            )))
        }
    }
}
