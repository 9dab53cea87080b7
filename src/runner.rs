mod compile;
mod execute;

pub use execute::STDERR_MARKER;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;

use crate::config::ToolchainConfig;
use crate::discovery::Submission;

/// Result of compilation process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationResult {
    pub success: bool,
    /// Compiler stdout and stderr, interleaved in the order they were written
    pub diagnostics: String,
}

/// Captured output of one execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Normalized stdout, followed by stderr under [`STDERR_MARKER`] when non-empty
    pub output: String,
    /// Exit code, when the process exited normally
    pub exit_code: Option<i32>,
}

/// Compiles and launches submissions with the configured command templates
///
/// Every submission gets its own output folder below `build_root`; the
/// compiled program is launched with that folder as working directory.
#[derive(Debug, Clone)]
pub struct Toolchain {
    config: ToolchainConfig,
    build_root: PathBuf,
    timeout: Option<Duration>,
}

impl Toolchain {
    pub fn new(config: ToolchainConfig, build_root: PathBuf, timeout: Option<Duration>) -> Self {
        let build_root = std::path::absolute(&build_root).unwrap_or(build_root);
        Self {
            config,
            build_root,
            timeout,
        }
    }

    /// Creates a toolchain whose build root is a fresh timestamped folder under `cache_dir`
    ///
    /// The folder itself is created by the first build.
    pub fn with_timestamped_build_root(
        config: ToolchainConfig,
        cache_dir: &Path,
        timeout: Option<Duration>,
    ) -> Self {
        let build_root = cache_dir.join(Local::now().format("%y%m%d-%H-%M-%S").to_string());
        Self::new(config, build_root, timeout)
    }

    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    /// Folder receiving the compiled output of `submission`
    pub fn output_dir(&self, submission: &Submission) -> PathBuf {
        self.build_root.join(&submission.name)
    }

    /// Placeholder values for one submission
    fn mapping(&self, submission: &Submission) -> HashMap<&'static str, String> {
        let mut mapping = HashMap::new();
        mapping.insert("%INPUT%", submission.entry_point.to_string_lossy().into_owned());
        mapping.insert(
            "%OUTDIR%",
            self.output_dir(submission).to_string_lossy().into_owned(),
        );
        mapping.insert(
            "%PROJECT%",
            submission.project_dir.to_string_lossy().into_owned(),
        );
        mapping.insert("%ENTRY%", submission.entry_name());
        mapping
    }
}

/// Applies template substitutions to every argument of a command template
fn apply_template(
    cmd_template: &[String],
    mapping: &HashMap<&'static str, String>,
) -> Vec<String> {
    cmd_template
        .iter()
        .map(|s| {
            let mut t = s.clone();
            for (k, v) in mapping.iter() {
                t = t.replace(k, v);
            }
            t
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_are_substituted() {
        let toolchain = Toolchain::new(
            ToolchainConfig::default(),
            PathBuf::from("/tmp/build"),
            None,
        );
        let submission = Submission::new(
            "alice",
            PathBuf::from("/subs/alice/Main.java"),
            PathBuf::from("/subs/alice"),
        );

        let mapping = toolchain.mapping(&submission);
        assert_eq!(
            apply_template(&toolchain.config.compile, &mapping),
            vec!["javac", "-d", "/tmp/build/alice", "/subs/alice/Main.java"]
        );
        assert_eq!(
            apply_template(&toolchain.config.run, &mapping),
            vec!["java", "-cp", "/tmp/build/alice", "Main"]
        );
        assert_eq!(
            apply_template(&toolchain.config.source_path_args, &mapping),
            vec!["-sourcepath", "/subs/alice"]
        );
    }
}
