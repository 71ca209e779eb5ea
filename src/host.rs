//! The editing host the annotator runs inside.
//!
//! The core never touches files or buffers directly. It asks a [`Host`] for
//! candidate files and their text, hands back ordered line edits, and reads
//! the `baseUrl` setting and project files for port detection through it.
//! [`FsHost`] implements the interface over the local filesystem.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::EndpointConfig;
use crate::document::Document;
use crate::plan::{is_application_ordered, render_edited, EditOperation};

/// Markers of build roots used to locate a project from a nested path.
const PROJECT_MARKERS: &[&str] = &[
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "src/main/resources",
];

/// Failures reported by a host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk {}: {source}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("edits rejected for {}: {reason}", .path.display())]
    Rejected { path: PathBuf, reason: String },
}

/// Capabilities the annotator needs from its environment.
pub trait Host {
    /// Candidate source files of the workspace.
    fn find_files(&self) -> Result<Vec<PathBuf>, HostError>;

    /// Current text of a document.
    fn read_document(&self, path: &Path) -> Result<Document, HostError>;

    /// Apply `operations`, given in application order and numbered against
    /// `doc`, as one batch and persist the result.
    fn apply_edits(&self, doc: &Document, operations: &[EditOperation]) -> Result<(), HostError>;

    /// A configuration value, e.g. `baseUrl`.
    fn config_value(&self, key: &str) -> Option<String>;

    /// Text of a file relative to the project root, if readable.
    fn read_project_file(&self, relative: &str) -> Option<String>;

    /// Whether applied edits are persisted. Dry-run hosts validate only.
    fn persists_edits(&self) -> bool {
        true
    }
}

/// Walk `root` for files with a configured extension, skipping excluded
/// directories. A file root is returned as is. Sorted for stable output.
pub fn walk_sources(root: &Path, config: &EndpointConfig) -> Result<Vec<PathBuf>, HostError> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        entry.depth() == 0
            || !entry.file_type().is_dir()
            || !config.is_excluded(&entry.file_name().to_string_lossy())
    });

    for entry in walker {
        let entry = entry.map_err(|source| HostError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        let accepted = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| config.accepts_extension(&ext.to_string_lossy()));
        if accepted {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Nearest directory at or above `start` that looks like a Java project
/// root. Falls back to `start` (or its parent for a file).
pub fn find_project_root(start: &Path) -> PathBuf {
    let start_dir = if start.is_file() {
        start.parent().unwrap_or(start).to_path_buf()
    } else {
        start.to_path_buf()
    };

    let mut dir = start_dir.clone();
    loop {
        if PROJECT_MARKERS.iter().any(|marker| dir.join(marker).exists()) {
            return dir;
        }
        if !dir.pop() {
            return start_dir;
        }
    }
}

/// Filesystem host: walks a directory, reads files from disk and writes the
/// edited text back.
#[derive(Debug, Clone)]
pub struct FsHost {
    target: PathBuf,
    project_root: PathBuf,
    config: EndpointConfig,
    write: bool,
}

impl FsHost {
    pub fn new(target: impl Into<PathBuf>, config: EndpointConfig) -> Self {
        let target = target.into();
        Self {
            project_root: find_project_root(&target),
            target,
            config,
            write: true,
        }
    }

    /// Compute and validate edits without writing anything.
    pub fn dry_run(mut self) -> Self {
        self.write = false;
        self
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

impl Host for FsHost {
    fn find_files(&self) -> Result<Vec<PathBuf>, HostError> {
        walk_sources(&self.target, &self.config)
    }

    fn read_document(&self, path: &Path) -> Result<Document, HostError> {
        let text = std::fs::read_to_string(path).map_err(|source| HostError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Document::new(path, text))
    }

    fn apply_edits(&self, doc: &Document, operations: &[EditOperation]) -> Result<(), HostError> {
        if !is_application_ordered(operations) {
            return Err(HostError::Rejected {
                path: doc.path().to_path_buf(),
                reason: "operations are not ordered bottom-to-top".to_string(),
            });
        }

        let rendered = render_edited(doc, operations);

        if !self.write {
            debug!(path = %doc.path().display(), "dry run, not writing");
            return Ok(());
        }

        std::fs::write(doc.path(), rendered).map_err(|source| HostError::Write {
            path: doc.path().to_path_buf(),
            source,
        })
    }

    fn config_value(&self, key: &str) -> Option<String> {
        self.config.value(key)
    }

    fn read_project_file(&self, relative: &str) -> Option<String> {
        std::fs::read_to_string(self.project_root.join(relative)).ok()
    }

    fn persists_edits(&self) -> bool {
        self.write
    }
}
