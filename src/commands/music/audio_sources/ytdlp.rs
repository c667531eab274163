//! Thin async wrapper around the `yt-dlp` command-line tool.

use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

use super::SourceError;
use super::track_metadata::YtDlpInfo;

#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: String,
    cookies_file: Option<PathBuf>,
}

impl YtDlp {
    pub fn new(binary: impl Into<String>, cookies_file: Option<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            cookies_file,
        }
    }

    /// Run `yt-dlp -j` against `target` and return its stdout.
    ///
    /// `target` always comes after `--`, so user-supplied references can never
    /// be parsed as options.
    pub async fn dump_json(
        &self,
        target: &str,
        extra_args: &[&str],
    ) -> Result<String, SourceError> {
        let mut command = Command::new(&self.binary);
        command.args(["-j", "--no-warnings"]).args(extra_args);
        if let Some(cookies) = &self.cookies_file {
            command.arg("--cookies").arg(cookies);
        }
        command.arg("--").arg(target).kill_on_drop(true);

        debug!("Running {} for {}", self.binary, target);
        let output = command
            .output()
            .await
            .map_err(|source| SourceError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .map(|line| line.trim().to_string())
                .unwrap_or_else(|| format!("{} exited with {}", self.binary, output.status));
            return Err(SourceError::ToolFailed(reason));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Metadata for a single video (or the first item of a result set).
    pub async fn info(&self, target: &str, extra_args: &[&str]) -> Result<YtDlpInfo, SourceError> {
        let mut args = vec!["--no-playlist"];
        args.extend_from_slice(extra_args);
        let output = self.dump_json(target, &args).await?;
        YtDlpInfo::parse(&output)
    }
}
