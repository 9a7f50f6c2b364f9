use std::collections::HashSet;

use crate::ValidationError;

/// Validated set of top-level fields whose lists are concatenated across pages.
///
/// Iteration order is the order the caller supplied. The first path is the
/// designated one: its item count decides whether another page is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProceedPaths {
    paths: Vec<String>,
}

impl ProceedPaths {
    pub fn resolve<I, S>(paths: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();
        for (index, path) in paths.into_iter().enumerate() {
            let path = path.into().trim().to_string();
            if path.is_empty() {
                return Err(ValidationError::BlankProceedPath { index });
            }
            if !seen.insert(path.clone()) {
                return Err(ValidationError::DuplicateProceedPath(path));
            }
            resolved.push(path);
        }
        if resolved.is_empty() {
            return Err(ValidationError::NoProceedPaths);
        }
        Ok(Self { paths: resolved })
    }

    pub fn contains(&self, field: &str) -> bool {
        self.paths.iter().any(|path| path == field)
    }

    pub fn designated(&self) -> &str {
        // resolve() guarantees at least one entry
        &self.paths[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}
