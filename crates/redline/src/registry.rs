//! Test case registry.
//!
//! Holds the loaded suites in display order. Suites come from the shipped
//! fixtures compiled into the binary or from `*.spec.yaml` files on disk.

use crate::case::{Suite, TestCase};
use crate::result::{RedlineError, RedlineResult};
use regex::Regex;
use std::path::Path;

/// Fixture file naming convention
pub const FIXTURE_PATTERNS: [&str; 2] = ["**/*.spec.yaml", "**/*.spec.yml"];

const BUILTIN: [(&str, &str); 6] = [
    (
        "fixtures/demo.spec.yaml",
        include_str!("../fixtures/demo.spec.yaml"),
    ),
    (
        "fixtures/login.spec.yaml",
        include_str!("../fixtures/login.spec.yaml"),
    ),
    (
        "fixtures/navigation.spec.yaml",
        include_str!("../fixtures/navigation.spec.yaml"),
    ),
    (
        "fixtures/profile.spec.yaml",
        include_str!("../fixtures/profile.spec.yaml"),
    ),
    (
        "fixtures/search.spec.yaml",
        include_str!("../fixtures/search.spec.yaml"),
    ),
    (
        "fixtures/checkout.spec.yaml",
        include_str!("../fixtures/checkout.spec.yaml"),
    ),
];

/// Loaded suites
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    suites: Vec<Suite>,
}

impl Registry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The six shipped suites
    ///
    /// # Errors
    ///
    /// Returns an error only if a shipped fixture is malformed.
    pub fn builtin() -> RedlineResult<Self> {
        BUILTIN
            .iter()
            .try_fold(Self::new(), |registry, (file, yaml)| {
                Ok(registry.with_suite(Suite::from_yaml(yaml, file)?))
            })
    }

    /// Load one suite file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid suite.
    pub fn load_file(path: &Path) -> RedlineResult<Suite> {
        let yaml = std::fs::read_to_string(path)?;
        Suite::from_yaml(&yaml, &path.display().to_string())
    }

    /// Load every fixture file under `dir`, sorted by path
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be walked or any file fails
    /// to load.
    pub fn discover(dir: &Path) -> RedlineResult<Self> {
        let mut files = Vec::new();
        // The directory itself is literal; only the suffix is a pattern
        let root = glob::Pattern::escape(&dir.to_string_lossy());
        for pattern in FIXTURE_PATTERNS {
            let full = Path::new(&root).join(pattern);
            let paths =
                glob::glob(&full.to_string_lossy()).map_err(|e| RedlineError::FixtureInvalid {
                    source_name: dir.display().to_string(),
                    message: e.to_string(),
                })?;
            for entry in paths {
                files.push(entry.map_err(std::io::Error::from)?);
            }
        }
        files.sort();
        files.dedup();

        tracing::debug!(dir = %dir.display(), files = files.len(), "discovered fixtures");

        files.iter().try_fold(Self::new(), |registry, file| {
            Ok(registry.with_suite(Self::load_file(file)?))
        })
    }

    /// Load a mix of fixture files and directories
    ///
    /// # Errors
    ///
    /// Returns the first load error.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> RedlineResult<Self> {
        let mut registry = Self::new();
        for path in paths {
            let path = path.as_ref();
            if path.is_dir() {
                registry.suites.extend(Self::discover(path)?.suites);
            } else {
                registry.suites.push(Self::load_file(path)?);
            }
        }
        Ok(registry)
    }

    /// Add a suite
    #[must_use]
    pub fn with_suite(mut self, suite: Suite) -> Self {
        self.suites.push(suite);
        self
    }

    /// Keep cases whose "Suite › case" title matches `grep`
    ///
    /// Suites left without cases are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RedlineError::Filter`] if `grep` is not a valid regex.
    pub fn filter(&self, grep: &str) -> RedlineResult<Self> {
        let re = Regex::new(grep)?;
        let suites = self
            .suites
            .iter()
            .filter_map(|suite| {
                let cases: Vec<TestCase> = suite
                    .cases
                    .iter()
                    .filter(|case| re.is_match(&suite.title_path(case)))
                    .cloned()
                    .collect();
                (!cases.is_empty()).then(|| Suite {
                    cases,
                    ..suite.clone()
                })
            })
            .collect();
        Ok(Self { suites })
    }

    /// Suites in display order
    #[must_use]
    pub fn suites(&self) -> &[Suite] {
        &self.suites
    }

    /// Every `(suite, case)` pair in display order
    pub fn cases(&self) -> impl Iterator<Item = (&Suite, &TestCase)> {
        self.suites
            .iter()
            .flat_map(|suite| suite.cases.iter().map(move |case| (suite, case)))
    }

    /// Total number of cases
    #[must_use]
    pub fn len(&self) -> usize {
        self.suites.iter().map(Suite::test_count).sum()
    }

    /// Whether no cases are loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::expect::AssertionKind;
    use std::fs;
    use tempfile::TempDir;

    const TINY: &str = r"
suite: Tiny
cases:
  - name: should fail - heading
    goto: https://example.com
    expect:
      assert: to_have_text
      locator: h1
      expected: Nope
";

    mod builtin_tests {
        use super::*;

        #[test]
        fn test_builtin_shape() {
            let registry = Registry::builtin().unwrap();
            let names: Vec<&str> = registry.suites().iter().map(|s| s.name.as_str()).collect();
            assert_eq!(
                names,
                [
                    "Demo Failure Tests",
                    "Login",
                    "Navigation",
                    "Profile",
                    "Search",
                    "Checkout"
                ]
            );
            assert_eq!(registry.len(), 15);
            assert_eq!(registry.suites()[0].test_count(), 5);
        }

        #[test]
        fn test_builtin_only_one_interaction() {
            let registry = Registry::builtin().unwrap();
            let with_click: Vec<&str> = registry
                .cases()
                .filter(|(_, case)| case.interact.is_some())
                .map(|(_, case)| case.name.as_str())
                .collect();
            assert_eq!(with_click, ["should fail - incorrect URL navigation"]);
        }

        #[test]
        fn test_builtin_covers_all_kinds() {
            let registry = Registry::builtin().unwrap();
            let count_of = |kind| registry.cases().filter(|(_, c)| c.kind() == kind).count();
            assert_eq!(count_of(AssertionKind::TitleEquals), 3);
            assert_eq!(count_of(AssertionKind::Visible), 4);
            assert_eq!(count_of(AssertionKind::CountEquals), 3);
            assert_eq!(count_of(AssertionKind::UrlEquals), 2);
            assert_eq!(count_of(AssertionKind::TextEquals), 2);
            assert_eq!(count_of(AssertionKind::Enabled), 1);
        }
    }

    mod filter_tests {
        use super::*;

        #[test]
        fn test_filter_by_suite_and_case() {
            let registry = Registry::builtin().unwrap();
            let login = registry.filter("^Login ›").unwrap();
            assert_eq!(login.suites().len(), 1);
            assert_eq!(login.len(), 2);

            let titles = registry.filter("page title").unwrap();
            assert_eq!(titles.len(), 3);
        }

        #[test]
        fn test_filter_no_match_is_empty() {
            let registry = Registry::builtin().unwrap();
            assert!(registry.filter("no such case").unwrap().is_empty());
        }

        #[test]
        fn test_invalid_regex() {
            let registry = Registry::builtin().unwrap();
            assert!(matches!(
                registry.filter("(unclosed"),
                Err(RedlineError::Filter(_))
            ));
        }
    }

    mod discover_tests {
        use super::*;

        #[test]
        fn test_discover_recursive_sorted() {
            let dir = TempDir::new().unwrap();
            fs::create_dir(dir.path().join("nested")).unwrap();
            fs::write(dir.path().join("b.spec.yaml"), TINY.replace("Tiny", "B")).unwrap();
            fs::write(dir.path().join("nested/a.spec.yml"), TINY.replace("Tiny", "A")).unwrap();
            fs::write(dir.path().join("notes.yaml"), "not: a fixture").unwrap();

            let registry = Registry::discover(dir.path()).unwrap();
            let names: Vec<&str> = registry.suites().iter().map(|s| s.name.as_str()).collect();
            assert_eq!(names, ["B", "A"]);
        }

        #[test]
        fn test_discover_dir_with_glob_characters() {
            let dir = TempDir::new().unwrap();
            let suites = dir.path().join("suites [v2]");
            fs::create_dir(&suites).unwrap();
            fs::write(suites.join("a.spec.yaml"), TINY).unwrap();

            let registry = Registry::discover(&suites).unwrap();
            assert_eq!(registry.len(), 1);
            assert_eq!(registry.suites()[0].name, "Tiny");
        }

        #[test]
        fn test_discover_reports_bad_file() {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join("bad.spec.yaml"), "suite: [").unwrap();
            let err = Registry::discover(dir.path()).unwrap_err();
            match err {
                RedlineError::FixtureParse { source_name, .. } => {
                    assert!(source_name.ends_with("bad.spec.yaml"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_from_paths_mixes_files_and_dirs() {
            let dir = TempDir::new().unwrap();
            let file = dir.path().join("tiny.spec.yaml");
            fs::write(&file, TINY).unwrap();
            let registry = Registry::from_paths(&[file.as_path(), dir.path()]).unwrap();
            assert_eq!(registry.suites().len(), 2);
        }

        #[test]
        fn test_missing_file_is_io_error() {
            let err = Registry::load_file(Path::new("/nonexistent/x.spec.yaml")).unwrap_err();
            assert!(matches!(err, RedlineError::Io(_)));
        }
    }
}
