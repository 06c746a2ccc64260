use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Repo-relative paths touched by a pull request or a ref range.
///
/// Paths keep the order the provider reported them in; a path reported more
/// than once is kept at its first position only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet {
    paths: Vec<String>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.paths.iter().any(|p| *p == path) {
            return false;
        }
        self.paths.push(path);
        true
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn into_paths(self) -> Vec<String> {
        self.paths
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.paths.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let paths = iter
            .into_iter()
            .map(Into::into)
            .filter(|path: &String| seen.insert(path.clone()))
            .collect();
        Self { paths }
    }
}

impl<S: Into<String>> Extend<S> for ChangeSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        let mut seen: HashSet<String> = self.paths.iter().cloned().collect();
        for path in iter {
            let path = path.into();
            if seen.insert(path.clone()) {
                self.paths.push(path);
            }
        }
    }
}

impl IntoIterator for ChangeSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

impl From<ChangeSet> for Vec<String> {
    fn from(value: ChangeSet) -> Self {
        value.paths
    }
}
