use std::io::ErrorKind;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;

use super::*;
use crate::error::RunError;
use crate::normalize::normalize;

/// Line separating captured stdout from captured stderr
pub const STDERR_MARKER: &str = "[stderr]";

impl Toolchain {
    /// Runs the compiled submission on `stdin_text` and captures its output
    ///
    /// Stdin is written by its own task while two more tasks drain stdout and
    /// stderr, so a program that fills an output pipe before consuming all of
    /// its input cannot deadlock the run. A non-zero exit code is reported in
    /// [`Execution::exit_code`] and is not an error.
    pub async fn run(
        &self,
        submission: &Submission,
        stdin_text: &str,
    ) -> Result<Execution, RunError> {
        let command = apply_template(&self.config.run, &self.mapping(submission));
        let Some((program, args)) = command.split_first() else {
            return Err(RunError::EmptyCommand);
        };

        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .current_dir(self.output_dir(submission))
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunError::Spawn {
                program: program.clone(),
                source,
            })?;

        let input = stdin_text.as_bytes().to_vec();
        let stdin = child.stdin.take();
        let writer = tokio::spawn(async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(&input).await {
                // The program exited without reading all of its input
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                Err(e) => Err(e),
                Ok(()) => stdin.shutdown().await.or_else(ignore_broken_pipe),
            }
        });
        let stdout_reader = tokio::spawn(drain(child.stdout.take()));
        let stderr_reader = tokio::spawn(drain(child.stderr.take()));

        let status = match self.timeout {
            Some(limit) => match timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    let _ = child.kill().await;
                    return Err(RunError::TimedOut(limit));
                }
            },
            None => child.wait().await?,
        };

        let (written, stdout, stderr) = tokio::join!(writer, stdout_reader, stderr_reader);
        written??;
        let stdout = stdout??;
        let stderr = stderr??;

        if !status.success() {
            log::debug!(
                "{} exited with code {:?}",
                submission.name,
                status.code()
            );
        }

        Ok(Execution {
            output: combine_streams(&stdout, &stderr),
            exit_code: status.code(),
        })
    }
}

/// Reads a pipe to its end
async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buffer).await?;
    }
    Ok(buffer)
}

fn ignore_broken_pipe(e: std::io::Error) -> std::io::Result<()> {
    if e.kind() == ErrorKind::BrokenPipe {
        Ok(())
    } else {
        Err(e)
    }
}

/// Appends non-empty stderr under [`STDERR_MARKER`] and normalizes the result
fn combine_streams(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);
    if stderr.trim().is_empty() {
        normalize(&stdout)
    } else {
        normalize(&format!("{stdout}\n{STDERR_MARKER}\n{stderr}"))
    }
}
