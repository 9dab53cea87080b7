use std::fs;
use std::path::Path;
use std::process::Stdio;

use anyhow::{Result, bail};
use tokio::time::timeout;

use super::*;

const COMPILE_OUTPUT_NAME: &str = "compile_output.txt";

impl Toolchain {
    /// Compiles the submission and records the verdict on it
    ///
    /// Launch failures are reported as an unsuccessful build with the error
    /// text appended to the diagnostics; they are never returned as errors.
    pub async fn build(&self, submission: &mut Submission) -> CompilationResult {
        let output_dir = self.output_dir(submission);
        let output_path = output_dir.join(COMPILE_OUTPUT_NAME);
        let command = self.generate_compile_command(submission);
        log::debug!("Compiling {}: {}", submission.name, command.join(" "));

        let status = match fs::create_dir_all(&output_dir) {
            Ok(()) => self.execute_compile_command(&command, &output_path, &output_dir).await,
            Err(e) => Err(e.into()),
        };

        let mut diagnostics = fs::read_to_string(&output_path).unwrap_or_default();
        let success = match status {
            Ok(exit_status) => exit_status.success(),
            Err(e) => {
                if !diagnostics.is_empty() && !diagnostics.ends_with('\n') {
                    diagnostics.push('\n');
                }
                diagnostics.push_str(&format!("Compilation process error: {e:#}"));
                false
            }
        };

        submission.compiled = success;
        if success {
            log::info!("Compiled {}", submission.name);
        } else {
            log::warn!("Compilation of {} failed", submission.name);
        }

        CompilationResult {
            success,
            diagnostics,
        }
    }

    /// Generates the compile command, adding the source path arguments in multi-file mode
    fn generate_compile_command(&self, submission: &Submission) -> Vec<String> {
        let mapping = self.mapping(submission);
        let mut command = apply_template(&self.config.compile, &mapping);
        if self.config.multi_file && !command.is_empty() {
            let extra = apply_template(&self.config.source_path_args, &mapping);
            command.splice(1..1, extra);
        }
        command
    }

    /// Runs the compiler with stdout and stderr sharing one output file
    async fn execute_compile_command(
        &self,
        command: &[String],
        output_path: &Path,
        work_dir: &Path,
    ) -> Result<std::process::ExitStatus> {
        if command.is_empty() {
            bail!("Empty compile command");
        }

        let output_file = fs::File::create(output_path)?;

        let mut cmd = tokio::process::Command::new(&command[0]);
        cmd.args(&command[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::from(output_file.try_clone()?))
            .stderr(Stdio::from(output_file))
            .current_dir(work_dir)
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;
        let status = match self.timeout {
            Some(limit) => match timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    let _ = child.kill().await;
                    bail!("Compilation timeout after {} ms", limit.as_millis());
                }
            },
            None => child.wait().await?,
        };

        Ok(status)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn shell_toolchain(compile: &[&str], build_root: &Path) -> Toolchain {
        let config = ToolchainConfig {
            source_extension: "sh".to_string(),
            entry_marker: "#!".to_string(),
            compile: compile.iter().map(|s| s.to_string()).collect(),
            multi_file: false,
            source_path_args: vec!["%PROJECT%".to_string()],
            run: vec!["sh".to_string(), "%OUTDIR%/%ENTRY%.sh".to_string()],
        };
        Toolchain::new(config, build_root.to_path_buf(), None)
    }

    fn submission(dir: &Path) -> Submission {
        let project = dir.join("alice");
        fs::create_dir_all(&project).unwrap();
        let entry = project.join("main.sh");
        fs::write(&entry, "echo hi\n").unwrap();
        Submission::new("alice", entry, project)
    }

    #[tokio::test]
    async fn test_successful_build_marks_submission() {
        let dir = tempfile::tempdir().unwrap();
        let mut sub = submission(dir.path());
        let toolchain = shell_toolchain(&["cp", "%INPUT%", "%OUTDIR%"], &dir.path().join("build"));

        let result = toolchain.build(&mut sub).await;

        assert!(result.success, "{}", result.diagnostics);
        assert!(sub.compiled);
        assert!(toolchain.output_dir(&sub).join("main.sh").exists());
    }

    #[tokio::test]
    async fn test_diagnostics_merge_both_streams() {
        let dir = tempfile::tempdir().unwrap();
        let mut sub = submission(dir.path());
        let toolchain = shell_toolchain(
            &["sh", "-c", "echo first; echo second >&2; exit 3"],
            &dir.path().join("build"),
        );

        let result = toolchain.build(&mut sub).await;

        assert!(!result.success);
        assert!(!sub.compiled);
        assert_eq!(result.diagnostics, "first\nsecond\n");
    }

    #[tokio::test]
    async fn test_missing_compiler_is_a_failed_build() {
        let dir = tempfile::tempdir().unwrap();
        let mut sub = submission(dir.path());
        let toolchain = shell_toolchain(
            &["definitely-not-a-compiler-4711", "%INPUT%"],
            &dir.path().join("build"),
        );

        let result = toolchain.build(&mut sub).await;

        assert!(!result.success);
        assert!(result.diagnostics.contains("Compilation process error"));
    }

    #[tokio::test]
    async fn test_build_timeout_is_a_failed_build() {
        let dir = tempfile::tempdir().unwrap();
        let mut sub = submission(dir.path());
        let mut toolchain = shell_toolchain(&["sleep", "5"], &dir.path().join("build"));
        toolchain.timeout = Some(Duration::from_millis(200));

        let result = toolchain.build(&mut sub).await;

        assert!(!result.success);
        assert!(!sub.compiled);
        assert!(
            result.diagnostics.contains("Compilation timeout after 200 ms"),
            "{}",
            result.diagnostics
        );
    }

    #[test]
    fn test_multi_file_inserts_source_path() {
        let mut toolchain = Toolchain::new(
            ToolchainConfig::default(),
            PathBuf::from("/tmp/build"),
            None,
        );
        toolchain.config.multi_file = true;
        let sub = Submission::new(
            "bob",
            PathBuf::from("/subs/bob/src/Main.java"),
            PathBuf::from("/subs/bob"),
        );

        assert_eq!(
            toolchain.generate_compile_command(&sub),
            vec![
                "javac",
                "-sourcepath",
                "/subs/bob",
                "-d",
                "/tmp/build/bob",
                "/subs/bob/src/Main.java"
            ]
        );
    }
}
