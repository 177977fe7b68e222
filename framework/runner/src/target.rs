use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};

/// The captured output of a finished run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// A secure connection bundle to upload to the execution target before the run.
#[derive(Debug, Clone)]
pub struct ConnectionBundle {
    pub local: PathBuf,
    pub remote: String,
}

/// Something that can execute a benchmark command: a remote host, a container, a pod.
///
/// The target enforces the timeout itself and captures combined output to the named log file
/// while the command runs. A failed run surfaces as an error carrying a human-readable
/// message; the supervisor only ever inspects that message for known signature substrings.
pub trait ExecutionTarget: Send + Sync {
    /// A stable identity for the node or instance backing this target.
    fn node_name(&self) -> String;

    fn send_file(&self, local: &Path, remote: &str) -> anyhow::Result<()>;

    fn run(&self, cmd: &str, timeout: Duration, log_file: &Path) -> anyhow::Result<RunOutput>;
}

/// Runs commands through a local shell.
///
/// Output is teed into the log file line by line as the process produces it, so a
/// [crate::monitor::LiveLogMonitor] following the file sees fault lines while the run is still
/// in flight.
pub struct LocalTarget {
    runtime: tokio::runtime::Runtime,
    name: String,
}

impl LocalTarget {
    pub fn new(name: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            runtime: tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?,
            name: name.into(),
        })
    }
}

impl ExecutionTarget for LocalTarget {
    fn node_name(&self) -> String {
        self.name.clone()
    }

    fn send_file(&self, local: &Path, remote: &str) -> anyhow::Result<()> {
        std::fs::copy(local, remote).with_context(|| {
            format!("Failed to copy {} to {remote}", local.display())
        })?;
        Ok(())
    }

    fn run(&self, cmd: &str, timeout: Duration, log_file: &Path) -> anyhow::Result<RunOutput> {
        let log_file = log_file.to_path_buf();
        self.runtime.block_on(async move {
            let mut child = tokio::process::Command::new("sh")
                .arg("-c")
                .arg(cmd)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .with_context(|| format!("Failed to spawn command `{cmd}`"))?;

            let stdout = child
                .stdout
                .take()
                .context("Child process has no stdout pipe")?;
            let stderr = child
                .stderr
                .take()
                .context("Child process has no stderr pipe")?;
            let stdout_task = tokio::spawn(tee(stdout, log_file.clone()));
            let stderr_task = tokio::spawn(tee(stderr, log_file.clone()));

            let status = match tokio::time::timeout(timeout, child.wait()).await {
                Ok(status) => status.context("Failed to wait for child process")?,
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        log::warn!("Failed to kill timed out child process: {e}");
                    }
                    bail!("command `{cmd}` timed out after {}s", timeout.as_secs());
                }
            };

            let stdout = stdout_task
                .await
                .context("Stdout capture task failed")?
                .context("Failed to capture stdout")?;
            let stderr = stderr_task
                .await
                .context("Stderr capture task failed")?
                .context("Failed to capture stderr")?;

            if !status.success() {
                bail!("command `{cmd}` failed with {status}: {stderr}");
            }

            Ok(RunOutput { stdout, stderr })
        })
    }
}

/// Append every line of `stream` to `log_file` as it arrives, and collect the whole text.
async fn tee(
    stream: impl AsyncRead + Unpin + Send,
    log_file: PathBuf,
) -> std::io::Result<String> {
    let mut out = tokio::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(&log_file)
        .await?;

    let mut collected = String::new();
    let mut lines = BufReader::new(stream).lines();
    while let Some(line) = lines.next_line().await? {
        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
        collected.push_str(&line);
        collected.push('\n');
    }

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_output_and_tees_it_to_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let log_file = dir.path().join("run.log");
        let target = LocalTarget::new("local").unwrap();

        let output = target
            .run(
                "echo first; echo second >&2; echo third",
                Duration::from_secs(10),
                &log_file,
            )
            .unwrap();

        assert_eq!(output.stdout, "first\nthird\n");
        assert_eq!(output.stderr, "second\n");

        let logged = std::fs::read_to_string(&log_file).unwrap();
        assert!(logged.contains("first"));
        assert!(logged.contains("second"));
        assert!(logged.contains("third"));
    }

    #[test]
    fn failed_command_reports_its_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let target = LocalTarget::new("local").unwrap();

        let err = target
            .run(
                "echo boom >&2; exit 3",
                Duration::from_secs(10),
                &dir.path().join("run.log"),
            )
            .unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("boom"));
    }

    #[test]
    fn timeout_kills_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let target = LocalTarget::new("local").unwrap();

        let err = target
            .run(
                "sleep 30",
                Duration::from_millis(200),
                &dir.path().join("run.log"),
            )
            .unwrap_err();

        assert!(format!("{err:#}").contains("timed out"));
    }
}
