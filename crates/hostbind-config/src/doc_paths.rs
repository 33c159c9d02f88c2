//! Path conventions for the host's documentation tree
//!
//! The host ships its help as a directory of markup pages:
//! - `<docs-root>/CommandsPython/<command>.html` for each command
//! - `<docs-root>/Nodes/index_hierarchy.html` for the entity-type tree
//!
//! A missing documentation tree is recoverable; callers fall back to
//! baseline metadata, so every lookup here reports absence as an error value
//! rather than panicking.

use crate::Config;
use std::path::{Path, PathBuf};

pub const COMMANDS_DIR: &str = "CommandsPython";
pub const NODES_DIR: &str = "Nodes";
pub const HIERARCHY_PAGE: &str = "index_hierarchy.html";

/// Error type for documentation path resolution
#[derive(Debug, Clone)]
pub enum DocsPathError {
    /// The documentation root does not exist or is not a directory
    RootNotFound(PathBuf),
    /// The root exists but the requested page does not
    PageNotFound(PathBuf),
    /// No documentation root was configured
    NotConfigured,
}

impl std::fmt::Display for DocsPathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocsPathError::RootNotFound(path) => {
                write!(f, "Documentation root not found: {}", path.display())
            }
            DocsPathError::PageNotFound(path) => {
                write!(f, "Documentation page not found: {}", path.display())
            }
            DocsPathError::NotConfigured => write!(f, "No documentation root configured"),
        }
    }
}

impl std::error::Error for DocsPathError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsLayout {
    root: PathBuf,
}

impl DocsLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout for the configured `docs-root`, if one is set
    pub fn from_config(config: &Config) -> Result<Self, DocsPathError> {
        config
            .docs_root
            .as_deref()
            .map(Self::new)
            .ok_or(DocsPathError::NotConfigured)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_available(&self) -> bool {
        self.root.is_dir()
    }

    pub fn command_doc_page(&self, command: &str) -> PathBuf {
        self.root.join(COMMANDS_DIR).join(format!("{}.html", command))
    }

    pub fn hierarchy_page(&self) -> PathBuf {
        self.root.join(NODES_DIR).join(HIERARCHY_PAGE)
    }

    /// Resolve a command page, checking that both the root and the page exist
    pub fn resolve_command_page(&self, command: &str) -> Result<PathBuf, DocsPathError> {
        self.existing(self.command_doc_page(command))
    }

    pub fn resolve_hierarchy_page(&self) -> Result<PathBuf, DocsPathError> {
        self.existing(self.hierarchy_page())
    }

    fn existing(&self, page: PathBuf) -> Result<PathBuf, DocsPathError> {
        if !self.is_available() {
            return Err(DocsPathError::RootNotFound(self.root.clone()));
        }
        if !page.is_file() {
            return Err(DocsPathError::PageNotFound(page));
        }
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_page_conventions() {
        let layout = DocsLayout::new("/opt/host/docs");
        assert_eq!(
            layout.command_doc_page("polySphere"),
            PathBuf::from("/opt/host/docs/CommandsPython/polySphere.html")
        );
        assert_eq!(
            layout.hierarchy_page(),
            PathBuf::from("/opt/host/docs/Nodes/index_hierarchy.html")
        );
    }

    #[test]
    fn test_missing_root() {
        let layout = DocsLayout::new("/nonexistent/hostbind/docs");
        assert!(!layout.is_available());
        assert!(matches!(
            layout.resolve_command_page("sphere"),
            Err(DocsPathError::RootNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_existing_and_missing_page() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let commands = temp_dir.path().join(COMMANDS_DIR);
        assert!(fs::create_dir_all(&commands).is_ok());
        assert!(fs::write(commands.join("sphere.html"), "<html></html>").is_ok());

        let layout = DocsLayout::new(temp_dir.path());
        assert!(layout.resolve_command_page("sphere").is_ok());
        assert!(matches!(
            layout.resolve_command_page("cone"),
            Err(DocsPathError::PageNotFound(_))
        ));
        assert!(matches!(
            layout.resolve_hierarchy_page(),
            Err(DocsPathError::PageNotFound(_))
        ));
    }

    #[test]
    fn test_from_config() {
        assert!(matches!(
            DocsLayout::from_config(&Config::default()),
            Err(DocsPathError::NotConfigured)
        ));
        let config = Config {
            docs_root: Some("/docs".to_string()),
            ..Default::default()
        };
        assert!(DocsLayout::from_config(&config).is_ok_and(|l| l.root() == Path::new("/docs")));
    }
}
