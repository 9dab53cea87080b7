use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::{DiscoveryMode, ToolchainConfig};
use crate::transcript::Transcript;

/// One submission folder and its detected entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Folder name, used as the submission's identity
    pub name: String,
    pub entry_point: PathBuf,
    pub project_dir: PathBuf,
    pub compiled: bool,
    pub passed: usize,
    pub failed: usize,
}

impl Submission {
    pub fn new(name: impl Into<String>, entry_point: PathBuf, project_dir: PathBuf) -> Self {
        Self {
            name: name.into(),
            entry_point,
            project_dir,
            compiled: false,
            passed: 0,
            failed: 0,
        }
    }

    /// Name the program is launched by: the entry-point file name without extension
    pub fn entry_name(&self) -> String {
        self.entry_point
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Strategy for locating the entry-point source file inside a submission folder
pub trait EntryPointFinder: Send + Sync {
    fn find_entry_point(&self, dir: &Path) -> Option<PathBuf>;
}

/// Picks the first file (by name) with the source extension directly inside the folder
pub struct ByExtension {
    pub extension: String,
}

impl EntryPointFinder for ByExtension {
    fn find_entry_point(&self, dir: &Path) -> Option<PathBuf> {
        let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
            .ok()?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_extension(path, &self.extension))
            .collect();
        candidates.sort();
        candidates.into_iter().next()
    }
}

/// Walks the folder recursively and picks the first source file containing the marker
pub struct ByMarker {
    pub marker: String,
    pub extension: String,
}

impl EntryPointFinder for ByMarker {
    fn find_entry_point(&self, dir: &Path) -> Option<PathBuf> {
        WalkDir::new(dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    log::debug!("Error reading directory entry: {e}");
                    None
                }
            })
            .filter(|entry| {
                entry.file_type().is_file() && has_extension(entry.path(), &self.extension)
            })
            .find(|entry| {
                fs::read_to_string(entry.path())
                    .map(|content| content.contains(&self.marker))
                    .unwrap_or(false)
            })
            .map(|entry| entry.into_path())
    }
}

/// Tries each strategy in order and returns the first hit
pub struct FirstMatch(pub Vec<Box<dyn EntryPointFinder>>);

impl EntryPointFinder for FirstMatch {
    fn find_entry_point(&self, dir: &Path) -> Option<PathBuf> {
        self.0.iter().find_map(|finder| finder.find_entry_point(dir))
    }
}

/// Builds the finder selected by the configuration
pub fn create_finder(
    mode: DiscoveryMode,
    toolchain: &ToolchainConfig,
) -> Box<dyn EntryPointFinder> {
    let by_extension = || ByExtension {
        extension: toolchain.source_extension.clone(),
    };
    let by_marker = || ByMarker {
        marker: toolchain.entry_marker.clone(),
        extension: toolchain.source_extension.clone(),
    };

    match mode {
        DiscoveryMode::Extension => Box::new(by_extension()),
        DiscoveryMode::Marker => Box::new(by_marker()),
        DiscoveryMode::Auto => Box::new(FirstMatch(vec![
            Box::new(by_extension()),
            Box::new(by_marker()),
        ])),
    }
}

/// Submissions found under a root folder, in folder-name order
#[derive(Debug, Default)]
pub struct Discovery {
    pub submissions: Vec<Submission>,
    pub log: Transcript,
}

/// Scans the immediate subfolders of `root` for submissions
///
/// Never fails: an unreadable root yields no submissions and a log line, and
/// folders without an entry point are skipped with a warning. Submission paths
/// are absolute, since builds run inside their own output folder.
pub fn discover(root: &Path, finder: &dyn EntryPointFinder) -> Discovery {
    let mut discovery = Discovery::default();

    let root = match std::path::absolute(root) {
        Ok(root) => root,
        Err(e) => {
            discovery
                .log
                .warn(format!("Cannot resolve root folder {}: {e}", root.display()));
            return discovery;
        }
    };

    let entries = match fs::read_dir(&root) {
        Ok(entries) => entries,
        Err(e) => {
            discovery
                .log
                .warn(format!("Cannot read root folder {}: {e}", root.display()));
            return discovery;
        }
    };

    let mut folders: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    folders.sort();

    for folder in folders {
        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match finder.find_entry_point(&folder) {
            Some(entry_point) => {
                discovery.log.info(format!(
                    "Found submission {name}: {}",
                    entry_point.display()
                ));
                discovery
                    .submissions
                    .push(Submission::new(name, entry_point, folder));
            }
            None => {
                discovery
                    .log
                    .warn(format!("No entry point found in {name}, skipped"));
            }
        }
    }

    discovery
        .log
        .info(format!("Discovered {} submission(s)", discovery.submissions.len()));
    discovery
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn java() -> ToolchainConfig {
        ToolchainConfig::default()
    }

    #[test]
    fn test_empty_folder_is_skipped_with_warning() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("empty")).unwrap();
        write(&root.path().join("alice/Main.java"), "class Main {}");

        let finder = create_finder(DiscoveryMode::Extension, &java());
        let discovery = discover(root.path(), finder.as_ref());

        assert_eq!(discovery.submissions.len(), 1);
        assert_eq!(discovery.submissions[0].name, "alice");
        assert_eq!(discovery.submissions[0].entry_name(), "Main");
        assert_eq!(discovery.log.warnings(), 1);
        let warnings: Vec<_> = discovery
            .log
            .lines()
            .iter()
            .filter(|l| l.starts_with("WARNING"))
            .collect();
        assert!(warnings[0].contains("empty"));
    }

    #[test]
    fn test_marker_search_is_recursive() {
        let root = tempfile::tempdir().unwrap();
        let bob = root.path().join("bob");
        write(&bob.join("src/app/Helper.java"), "class Helper {}");
        write(
            &bob.join("src/app/Runner.java"),
            "class Runner { public static void main(String[] a) {} }",
        );

        let finder = create_finder(DiscoveryMode::Marker, &java());
        assert_eq!(
            finder.find_entry_point(&bob),
            Some(bob.join("src/app/Runner.java"))
        );

        let by_extension = create_finder(DiscoveryMode::Extension, &java());
        assert_eq!(by_extension.find_entry_point(&bob), None);

        let auto = create_finder(DiscoveryMode::Auto, &java());
        assert_eq!(
            auto.find_entry_point(&bob),
            Some(bob.join("src/app/Runner.java"))
        );
    }

    #[test]
    fn test_first_file_by_name_wins() {
        let root = tempfile::tempdir().unwrap();
        let carol = root.path().join("carol");
        write(&carol.join("Zeta.java"), "");
        write(&carol.join("Alpha.java"), "");
        write(&carol.join("notes.txt"), "");

        let finder = ByExtension {
            extension: "java".to_string(),
        };
        assert_eq!(finder.find_entry_point(&carol), Some(carol.join("Alpha.java")));
    }

    #[test]
    fn test_missing_root_fails_softly() {
        let root = tempfile::tempdir().unwrap();
        let finder = create_finder(DiscoveryMode::Auto, &java());
        let discovery = discover(&root.path().join("missing"), finder.as_ref());

        assert!(discovery.submissions.is_empty());
        assert!(discovery.log.render().contains("Cannot read root folder"));
    }

    #[test]
    fn test_relative_root_yields_absolute_paths() {
        let root = tempfile::tempdir_in(".").unwrap();
        write(&root.path().join("erin/Main.java"), "");
        // Created directly in the working directory, so its name is a relative path to it
        let relative = PathBuf::from(root.path().file_name().unwrap());

        let finder = create_finder(DiscoveryMode::Extension, &java());
        let discovery = discover(&relative, finder.as_ref());

        let erin = &discovery.submissions[0];
        assert!(erin.project_dir.is_absolute());
        assert!(erin.entry_point.is_absolute());
        assert!(erin.entry_point.ends_with("erin/Main.java"));
    }

    #[test]
    fn test_plain_files_in_root_are_ignored() {
        let root = tempfile::tempdir().unwrap();
        write(&root.path().join("Stray.java"), "");
        write(&root.path().join("dave/Main.java"), "");

        let finder = create_finder(DiscoveryMode::Extension, &java());
        let discovery = discover(root.path(), finder.as_ref());
        assert_eq!(discovery.submissions.len(), 1);
        assert_eq!(discovery.log.warnings(), 0);
    }
}
