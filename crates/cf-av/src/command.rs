//! Builder for executing the media engine and its companion tools.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use cf_core::Error;
use tokio::process::Command;

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// No timeout is applied unless one is set: media transforms may run for as
/// long as the input requires.
///
/// # Example
///
/// ```no_run
/// use cf_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> cf_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffmpeg"))
///     .arg("-version")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Kill the process if it runs longer than `d`.
    pub fn timeout(&mut self, d: Option<Duration>) -> &mut Self {
        self.timeout = d;
        self
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - [`Error::Spawn`] if the process cannot be started.
    /// - [`Error::Invocation`] if it exits unsuccessfully or times out. Both
    ///   captured streams are attached.
    pub async fn execute(&self) -> cf_core::Result<ToolOutput> {
        let program_name = self.program_name();
        tracing::debug!(tool = %program_name, args = ?self.args, "executing");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| Error::spawn(program_name.clone(), e.to_string()))?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    // The future owning the child is dropped here, which kills it.
                    return Err(Error::invocation(
                        program_name,
                        format!("timed out after {limit:?}"),
                        "",
                        "",
                    ));
                }
            },
            None => child.wait_with_output().await,
        }
        .map_err(|e| {
            Error::invocation(
                program_name.clone(),
                format!("I/O error waiting for process: {e}"),
                "",
                "",
            )
        })?;

        let tool_output = ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !output.status.success() {
            return Err(Error::invocation(
                program_name,
                format!("exited with {}", output.status),
                tool_output.stderr,
                tool_output.stdout,
            ));
        }

        Ok(tool_output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::ErrorKind;

    #[tokio::test]
    async fn execute_echo() {
        let output = ToolCommand::new(PathBuf::from("echo"))
            .arg("hello")
            .execute()
            .await;

        match output {
            Ok(out) => {
                assert!(out.status.success());
                assert!(out.stdout.trim().contains("hello"));
            }
            Err(_) => {
                // On some minimal environments echo may not exist; skip.
            }
        }
    }

    #[tokio::test]
    async fn execute_nonexistent_tool_is_spawn_error() {
        let err = ToolCommand::new(PathBuf::from("nonexistent_tool_xyz_12345"))
            .execute()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }), "{err}");
        assert_eq!(err.kind(), ErrorKind::InvocationError);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failure_captures_stderr() {
        let err = ToolCommand::new(PathBuf::from("sh"))
            .args(["-c", "echo partial; echo broken >&2; exit 3"])
            .execute()
            .await
            .unwrap_err();
        match err {
            Error::Invocation { stderr, stdout, .. } => {
                assert_eq!(stderr.trim(), "broken");
                assert_eq!(stdout.trim(), "partial");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_fires() {
        let err = ToolCommand::new(PathBuf::from("sleep"))
            .arg("10")
            .timeout(Some(Duration::from_millis(100)))
            .execute()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"), "unexpected error: {err}");
    }
}
