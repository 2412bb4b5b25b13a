use crate::core::models::condition::Condition;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const BYSTANDER_DIR: &str = "bystander";

/// Per-condition artifact directories of one stage.
///
/// Every condition maps to its own directory under the root, keyed by
/// [`Condition::namespace_key`], so concurrent evaluations never share a path.
#[derive(Debug, Clone)]
pub struct ConditionWorkspace {
    root: PathBuf,
}

impl ConditionWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn namespace(&self, condition: &Condition) -> PathBuf {
        self.root.join(condition.namespace_key())
    }

    /// Creates the namespace of `condition` and returns it.
    pub fn prepare(&self, condition: &Condition) -> io::Result<PathBuf> {
        let path = self.namespace(condition);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Creates the directory for the bystander evaluation nested in `namespace`.
    pub fn prepare_bystander(&self, namespace: &Path) -> io::Result<PathBuf> {
        let path = namespace.join(BYSTANDER_DIR);
        fs::create_dir_all(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::condition::DuplexType;

    #[test]
    fn distinct_temperatures_get_distinct_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = ConditionWorkspace::new(dir.path().join("H1"));
        let base = Condition {
            temperature: 37.0,
            formamide: 25.0,
            sodium: 0.3,
            magnesium: 0.0,
            duplex_type: DuplexType::DnaDna,
            concentration: 1e-6,
        };

        let a = workspace.prepare(&base).unwrap();
        let b = workspace.prepare(&base.at_temperature(37.5)).unwrap();
        assert_ne!(a, b);
        assert!(a.is_dir() && b.is_dir());
        assert!(a.starts_with(workspace.root()));

        let nested = workspace.prepare_bystander(&a).unwrap();
        assert!(nested.is_dir());
        assert_eq!(nested.parent(), Some(a.as_path()));
    }
}
