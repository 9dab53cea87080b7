use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "checker", version = "1.0", about, long_about = None)]
pub struct CliArgs {
    /// Path to the configuration file
    #[arg(long = "config", short = 'c', global = true)]
    pub config_path: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a suite definition file against every submission under a root folder
    Run {
        /// Suite definition file (`input ==> expected` per line)
        #[arg(long, short = 's')]
        suite: PathBuf,
        /// Folder holding one subfolder per submission
        #[arg(long, short = 'r')]
        root: PathBuf,
        /// Optional description printed in the report header
        #[arg(long, short = 'd')]
        description: Option<String>,
    },
    /// Run a single input/expected-output pair against every submission
    Check {
        #[arg(long, short = 'i')]
        input: PathBuf,
        #[arg(long, short = 'e')]
        expected: PathBuf,
        #[arg(long, short = 'r')]
        root: PathBuf,
    },
    /// Print a persisted report
    Show { report: PathBuf },
    /// Compare the pass rates of two persisted reports
    Compare { first: PathBuf, second: PathBuf },
}

impl CliArgs {
    /// Load the configuration from the specified file, or the defaults when none is given
    pub fn to_config(&self) -> std::io::Result<Config> {
        match &self.config_path {
            Some(path) => Config::from_file(path),
            None => Ok(Config::default()),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub toolchain: ToolchainConfig,
    pub discovery: DiscoveryMode,
    pub results_dir: Option<PathBuf>,
    pub build_dir: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
}

impl Config {
    pub fn from_file(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| e.into())
    }

    /// Directory where reports are written
    pub fn results_dir(&self) -> PathBuf {
        use directories::ProjectDirs;

        self.results_dir.clone().unwrap_or_else(|| {
            ProjectDirs::from("", "", "checker")
                .map(|dirs| dirs.data_local_dir().join(RESULTS_DIR_NAME))
                .unwrap_or_else(|| PathBuf::from(RESULTS_DIR_NAME))
        })
    }

    /// Directory under which each run creates its timestamped build folder
    pub fn build_dir(&self) -> PathBuf {
        use directories::ProjectDirs;

        self.build_dir.clone().unwrap_or_else(|| {
            ProjectDirs::from("", "", "checker")
                .map(|dirs| dirs.cache_dir().join("build"))
                .unwrap_or_else(|| std::env::temp_dir().join("checker-build"))
        })
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.timeout_ms.map(std::time::Duration::from_millis)
    }
}

const RESULTS_DIR_NAME: &str = "test_results";

/// Compiler and launcher command templates
///
/// Templates are argv vectors; `%INPUT%`, `%OUTDIR%`, `%PROJECT%` and `%ENTRY%`
/// are substituted per submission before the command is spawned.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ToolchainConfig {
    pub source_extension: String,
    pub entry_marker: String,
    pub compile: Vec<String>,
    pub multi_file: bool,
    pub source_path_args: Vec<String>,
    pub run: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        let owned =
            |args: &[&str]| -> Vec<String> { args.iter().map(|s| s.to_string()).collect() };
        Self {
            source_extension: "java".to_string(),
            entry_marker: "public static void main".to_string(),
            compile: owned(&["javac", "-d", "%OUTDIR%", "%INPUT%"]),
            multi_file: false,
            source_path_args: owned(&["-sourcepath", "%PROJECT%"]),
            run: owned(&["java", "-cp", "%OUTDIR%", "%ENTRY%"]),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    Extension,
    Marker,
    #[default]
    Auto,
}
