use std::collections::HashMap;

use crate::suite::TestSuite;

/// Suite used when a case is added without naming a suite
pub const DEFAULT_SUITE_NAME: &str = "DefaultSuite";

/// Catalog of suites keyed by their case-sensitive name
#[derive(Debug, Default)]
pub struct SuiteRegistry {
    suites: HashMap<String, TestSuite>,
}

impl SuiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the suite, replacing any suite with the same name
    ///
    /// Returns the replaced suite, if there was one.
    pub fn upsert(&mut self, suite: TestSuite) -> Option<TestSuite> {
        self.suites.insert(suite.name().to_string(), suite)
    }

    pub fn get(&self, name: &str) -> Option<&TestSuite> {
        self.suites.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut TestSuite> {
        self.suites.get_mut(name)
    }

    /// Returns the named suite, creating an empty one first if needed
    pub fn get_or_create(&mut self, name: &str) -> &mut TestSuite {
        self.suites
            .entry(name.to_string())
            .or_insert_with(|| TestSuite::new(name))
    }

    pub fn remove(&mut self, name: &str) -> Option<TestSuite> {
        self.suites.remove(name)
    }

    /// Suite names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.suites.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }
}
