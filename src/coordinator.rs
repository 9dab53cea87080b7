use std::fs;
use std::path::Path;

use anyhow::Result;
use parking_lot::RwLock;

use crate::aggregator::run_suite;
use crate::compare;
use crate::config::Config;
use crate::discovery::create_finder;
use crate::registry::{DEFAULT_SUITE_NAME, SuiteRegistry};
use crate::report;
use crate::runner::Toolchain;
use crate::suite::{TestCase, TestSuite};
use crate::transcript::Transcript;

/// Log of one coordinator run and whether it got as far as executing anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub executed: bool,
    pub log: String,
}

/// Entry point for front ends: suite editing, runs and report handling
///
/// Every operation is synchronous and answers with text or a flag; nothing
/// here returns an error to the caller. A run works on a snapshot of the
/// suite, so the registry lock is never held while programs execute.
///
/// The coordinator drives its own tokio runtime. Runs requested from inside
/// another async runtime are refused, and the coordinator must be dropped
/// outside of one; async front ends should call it from a blocking task.
pub struct Coordinator {
    config: Config,
    registry: RwLock<SuiteRegistry>,
    selected: RwLock<String>,
    runtime: tokio::runtime::Runtime,
}

impl Coordinator {
    pub fn new(config: Config) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            config,
            registry: RwLock::new(SuiteRegistry::new()),
            selected: RwLock::new(DEFAULT_SUITE_NAME.to_string()),
            runtime,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Creates an empty suite, replacing any suite of the same name
    pub fn create_suite(&self, name: &str) -> bool {
        self.insert_suite(TestSuite::new(name))
    }

    /// Marks the suite targeted by case edits that name no suite
    pub fn select_suite(&self, name: &str) -> bool {
        if self.registry.read().get(name).is_none() {
            log::warn!("Cannot select unknown suite {name}");
            return false;
        }
        *self.selected.write() = name.to_string();
        true
    }

    pub fn selected_suite(&self) -> String {
        self.selected.read().clone()
    }

    pub fn delete_suite(&self, name: &str) -> bool {
        let removed = self.registry.write().remove(name).is_some();
        if removed {
            log::info!("Deleted suite {name}");
            let mut selected = self.selected.write();
            if *selected == name {
                *selected = DEFAULT_SUITE_NAME.to_string();
            }
        }
        removed
    }

    pub fn list_suites(&self) -> Vec<String> {
        self.registry.read().names()
    }

    pub fn set_description(&self, suite: &str, description: &str) -> bool {
        self.with_suite(suite, |s| s.description = description.to_string())
            .is_some()
    }

    /// Appends a case to `suite`, or to the selected suite when `None`
    ///
    /// The target suite is created if it does not exist yet.
    pub fn add_test_case(&self, suite: Option<&str>, input: &str, expected_output: &str) -> bool {
        let name = suite.map_or_else(|| self.selected_suite(), str::to_string);
        if name.is_empty() {
            return false;
        }
        self.registry
            .write()
            .get_or_create(&name)
            .add_case(TestCase::new(input, expected_output));
        true
    }

    /// Replaces the case at `index` with a fresh one
    pub fn edit_test_case(
        &self,
        suite: &str,
        index: usize,
        input: &str,
        expected_output: &str,
    ) -> bool {
        self.with_suite(suite, |s| {
            s.replace_case(index, TestCase::new(input, expected_output))
        })
        .unwrap_or(false)
    }

    pub fn remove_test_case(&self, suite: &str, index: usize) -> bool {
        self.with_suite(suite, |s| s.remove_case(index).is_some())
            .unwrap_or(false)
    }

    /// Removes the first case of `suite` with exactly this payload
    pub fn remove_matching_case(&self, suite: &str, input: &str, expected_output: &str) -> bool {
        self.with_suite(suite, |s| s.remove_matching(input, expected_output))
            .unwrap_or(false)
    }

    /// Imports suite definition text as suite `name`; returns the number of cases
    pub fn import_suite_text(&self, name: &str, text: &str) -> usize {
        let suite = TestSuite::from_definition(name, text);
        let count = suite.total_count();
        self.insert_suite(suite);
        count
    }

    /// Imports a suite definition file as a suite named after the file
    pub fn import_suite_file(&self, path: &Path) -> String {
        let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            return format!("Invalid suite file path: {}", path.display());
        };
        match fs::read_to_string(path) {
            Ok(text) => {
                let count = self.import_suite_text(&name, &text);
                format!("Imported suite {name} with {count} test case(s)")
            }
            Err(e) => {
                log::warn!("Cannot read suite file {}: {e}", path.display());
                format!("Cannot read suite file {}: {e}", path.display())
            }
        }
    }

    /// Suite cases as definition text
    pub fn export_suite(&self, name: &str) -> Option<String> {
        self.registry.read().get(name).map(TestSuite::to_definition)
    }

    pub fn suite_details(&self, name: &str) -> String {
        self.registry
            .read()
            .get(name)
            .map(TestSuite::to_detailed_string)
            .unwrap_or_else(|| format!("Suite not found: {name}"))
    }

    /// Read access to a suite, for front ends that render it themselves
    pub fn suite(&self, name: &str) -> Option<TestSuite> {
        self.registry.read().get(name).cloned()
    }

    /// Runs the named suite against every submission under `root` and saves the report
    ///
    /// Returns the full run log.
    pub fn run_suite(&self, name: &str, root: &Path) -> String {
        self.run_suite_outcome(name, root).log
    }

    /// Like [`Coordinator::run_suite`], also telling whether the run executed
    pub fn run_suite_outcome(&self, name: &str, root: &Path) -> RunOutcome {
        let refused = |message: String| {
            let mut log = Transcript::new();
            log.warn(message);
            RunOutcome {
                executed: false,
                log: log.render(),
            }
        };

        if tokio::runtime::Handle::try_current().is_ok() {
            return refused(format!("Cannot run suite {name} from inside an async runtime"));
        }
        let snapshot = self.registry.read().get(name).cloned();
        let Some(mut suite) = snapshot else {
            return refused(format!("Suite not found: {name}"));
        };

        let toolchain = Toolchain::with_timestamped_build_root(
            self.config.toolchain.clone(),
            &self.config.build_dir(),
            self.config.timeout(),
        );
        let finder = create_finder(self.config.discovery, &self.config.toolchain);

        let mut summary = self
            .runtime
            .block_on(run_suite(&mut suite, root, finder.as_ref(), &toolchain));
        if !summary.executed {
            return RunOutcome {
                executed: false,
                log: summary.log.render(),
            };
        }

        let results_dir = self.config.results_dir();
        match report::report_path(&suite, &results_dir) {
            Some(path) if report::persist(&suite, &results_dir) => {
                summary
                    .log
                    .info(format!("Results saved to {}", path.display()));
            }
            _ => summary.log.warn("Results could not be saved"),
        }

        self.registry.write().upsert(suite);
        RunOutcome {
            executed: true,
            log: summary.log.render(),
        }
    }

    /// Runs one input/expected pair against every submission under `root`
    ///
    /// The pair replaces the contents of the default suite.
    pub fn check_input_expected(
        &self,
        root: &Path,
        input: &str,
        expected_output: &str,
    ) -> String {
        self.check_input_expected_outcome(root, input, expected_output)
            .log
    }

    pub fn check_input_expected_outcome(
        &self,
        root: &Path,
        input: &str,
        expected_output: &str,
    ) -> RunOutcome {
        self.insert_suite(TestSuite::with_cases(
            DEFAULT_SUITE_NAME,
            vec![TestCase::new(input, expected_output)],
        ));
        self.run_suite_outcome(DEFAULT_SUITE_NAME, root)
    }

    /// Writes the report of the suite's last run again
    pub fn save_results(&self, name: &str) -> bool {
        self.registry
            .read()
            .get(name)
            .is_some_and(|suite| report::persist(suite, &self.config.results_dir()))
    }

    pub fn load_report(&self, path: &Path) -> String {
        fs::read_to_string(path).unwrap_or_else(|e| {
            log::warn!("Cannot read report {}: {e}", path.display());
            format!("Cannot read report {}: {e}", path.display())
        })
    }

    pub fn compare_reports(&self, first: &Path, second: &Path) -> String {
        compare::compare(first, second)
    }

    fn insert_suite(&self, suite: TestSuite) -> bool {
        if suite.name().is_empty() {
            log::warn!("Refusing to store a suite without a name");
            return false;
        }
        let name = suite.name().to_string();
        if self.registry.write().upsert(suite).is_some() {
            log::info!("Replaced suite {name}");
        } else {
            log::info!("Created suite {name}");
        }
        true
    }

    fn with_suite<T>(&self, name: &str, f: impl FnOnce(&mut TestSuite) -> T) -> Option<T> {
        let mut registry = self.registry.write();
        let Some(suite) = registry.get_mut(name) else {
            log::warn!("Suite not found: {name}");
            return None;
        };
        Some(f(suite))
    }
}
