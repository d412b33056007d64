//! Engine configuration

use std::path::{Path, PathBuf};

/// Settings shared by all operations
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base directory for relative workbook paths
    pub workdir: Option<PathBuf>,

    /// Whether `$`-anchored reference axes move when rows/columns are
    /// inserted or deleted. On by default: a structural shift physically
    /// relocates the cell an absolute reference names, so the reference
    /// must follow it to stay meaningful. Anchoring only pins references
    /// against copy translation.
    pub shift_absolute_refs: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workdir: None,
            shift_absolute_refs: true,
        }
    }
}

impl EngineConfig {
    /// Resolve a workbook path against the configured workdir. Absolute
    /// paths pass through untouched.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match &self.workdir {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.workdir.is_none());
        assert!(config.shift_absolute_refs);
    }

    #[test]
    fn test_resolve_against_workdir() {
        let config = EngineConfig {
            workdir: Some(PathBuf::from("/data/books")),
            ..Default::default()
        };
        assert_eq!(
            config.resolve(Path::new("q3.json")),
            PathBuf::from("/data/books/q3.json")
        );
        assert_eq!(
            config.resolve(Path::new("/tmp/other.json")),
            PathBuf::from("/tmp/other.json")
        );
    }
}
