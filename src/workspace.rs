//! The "regenerate endpoint comments" action.
//!
//! One invocation discovers candidate files through the host, then runs an
//! independent read, plan and apply cycle per controller document. A host
//! failure on one document is recorded and the others still proceed.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::host::{Host, HostError};
use crate::plan::EndpointBlock;
use crate::port::{default_base_url, resolve_port};
use crate::Annotator;

/// Substrings that mark a file as a controller worth annotating.
pub const CONTROLLER_MARKERS: [&str; 2] = ["@Controller", "@RestController"];

/// Whether a source text declares a controller.
pub fn is_controller_source(text: &str) -> bool {
    CONTROLLER_MARKERS.iter().any(|marker| text.contains(marker))
}

/// The base URL for this invocation: the host's `baseUrl` setting, else
/// `https://localhost:<port>` with the port read from project config.
pub fn resolve_base_url<H: Host + ?Sized>(host: &H) -> String {
    host.config_value("baseUrl").unwrap_or_else(|| {
        let port = resolve_port(|file| host.read_project_file(file));
        default_base_url(&port)
    })
}

/// What happened to one document.
#[derive(Debug, Serialize)]
pub struct DocumentReport {
    pub path: PathBuf,

    /// Annotation blocks found, with their resolved endpoints.
    pub blocks: Vec<EndpointBlock>,

    /// Whether applying the plan changes the text.
    pub changed: bool,

    /// Host failure, if the document could not be read or written.
    pub error: Option<String>,
}

impl DocumentReport {
    pub fn endpoint_count(&self) -> usize {
        self.blocks.iter().map(|b| b.endpoints.len()).sum()
    }

    fn failed(path: &Path, err: &HostError) -> Self {
        Self {
            path: path.to_path_buf(),
            blocks: Vec::new(),
            changed: false,
            error: Some(err.to_string()),
        }
    }
}

/// Outcome of one invocation.
#[derive(Debug, Serialize)]
pub struct RegenerateSummary {
    pub base_url: String,

    /// Edits were validated but not persisted; `changed` means "would change".
    pub dry_run: bool,

    /// Controller documents, in discovery order.
    pub documents: Vec<DocumentReport>,
}

impl RegenerateSummary {
    pub fn endpoint_count(&self) -> usize {
        self.documents.iter().map(DocumentReport::endpoint_count).sum()
    }

    pub fn documents_changed(&self) -> usize {
        self.documents.iter().filter(|d| d.changed).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter(|d| d.error.is_some())
    }

    /// The single user-facing notification for this invocation.
    pub fn message(&self) -> String {
        if self.endpoint_count() == 0 {
            return "No endpoints found".to_string();
        }
        let changed = self.documents_changed();
        format!(
            "{} endpoint comments in {} document{}",
            if self.dry_run { "Would update" } else { "Updated" },
            changed,
            if changed == 1 { "" } else { "s" }
        )
    }
}

/// Process one candidate file. `None` when it is not a controller.
pub fn process_document<H: Host + ?Sized>(
    host: &H,
    path: &Path,
    annotator: &Annotator,
) -> Option<DocumentReport> {
    let doc = match host.read_document(path) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not read document");
            return Some(DocumentReport::failed(path, &err));
        }
    };
    if !is_controller_source(doc.text()) {
        return None;
    }

    let plan = annotator.plan(&doc);
    let changed = plan.apply(&doc) != doc.text();
    debug!(
        path = %path.display(),
        blocks = plan.blocks.len(),
        changed,
        "planned document"
    );

    let mut error = None;
    if changed {
        if let Err(err) = host.apply_edits(&doc, &plan.ordered_operations()) {
            warn!(path = %path.display(), error = %err, "could not apply edits");
            error = Some(err.to_string());
        }
    }

    Some(DocumentReport {
        path: path.to_path_buf(),
        blocks: plan.blocks,
        changed: changed && error.is_none(),
        error,
    })
}

/// Regenerate the endpoint comments of every controller in the workspace.
///
/// Fails only when file discovery fails; per-document failures are part of
/// the summary.
pub fn regenerate<H: Host + Sync + ?Sized>(host: &H) -> Result<RegenerateSummary, HostError> {
    let files = host.find_files()?;
    let base_url = resolve_base_url(host);
    let annotator = Annotator::new(&base_url);
    info!(files = files.len(), base_url = %base_url, "regenerating endpoint comments");

    let documents: Vec<DocumentReport> = files
        .par_iter()
        .filter_map(|path| process_document(host, path, &annotator))
        .collect();

    let summary = RegenerateSummary {
        base_url,
        dry_run: !host.persists_edits(),
        documents,
    };
    info!(
        documents = summary.documents.len(),
        changed = summary.documents_changed(),
        endpoints = summary.endpoint_count(),
        "regeneration finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::document::Document;
    use crate::plan::{render_edited, EditOperation};

    /// In-memory host keyed by path.
    #[derive(Default)]
    struct MemoryHost {
        files: Mutex<HashMap<PathBuf, String>>,
        project: HashMap<String, String>,
        base_url: Option<String>,
        unreadable: Vec<PathBuf>,
        reject_writes: bool,
    }

    impl MemoryHost {
        fn with_files(files: &[(&str, &str)]) -> Self {
            Self {
                files: Mutex::new(
                    files
                        .iter()
                        .map(|(p, t)| (PathBuf::from(p), t.to_string()))
                        .collect(),
                ),
                ..Default::default()
            }
        }

        fn text(&self, path: &str) -> String {
            self.files.lock().unwrap()[Path::new(path)].clone()
        }
    }

    impl Host for MemoryHost {
        fn find_files(&self) -> Result<Vec<PathBuf>, HostError> {
            let mut files: Vec<PathBuf> = self.files.lock().unwrap().keys().cloned().collect();
            files.extend(self.unreadable.iter().cloned());
            files.sort();
            Ok(files)
        }

        fn read_document(&self, path: &Path) -> Result<Document, HostError> {
            if self.unreadable.iter().any(|p| p == path) {
                return Err(HostError::Read {
                    path: path.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                });
            }
            let text = self.files.lock().unwrap()[path].clone();
            Ok(Document::new(path, text))
        }

        fn apply_edits(
            &self,
            doc: &Document,
            operations: &[EditOperation],
        ) -> Result<(), HostError> {
            if self.reject_writes {
                return Err(HostError::Rejected {
                    path: doc.path().to_path_buf(),
                    reason: "read-only".into(),
                });
            }
            self.files
                .lock()
                .unwrap()
                .insert(doc.path().to_path_buf(), render_edited(doc, operations));
            Ok(())
        }

        fn config_value(&self, key: &str) -> Option<String> {
            (key == "baseUrl").then(|| self.base_url.clone()).flatten()
        }

        fn read_project_file(&self, relative: &str) -> Option<String> {
            self.project.get(relative).cloned()
        }
    }

    const FILM_CONTROLLER: &str = r#"@RestController
@RequestMapping("/films")
public class FilmController {
    @GetMapping("/{id}")
    public Film get(@PathVariable Long id) { return null; }
}
"#;

    #[test]
    fn test_controller_filter() {
        assert!(is_controller_source("@RestController\nclass A {}"));
        assert!(is_controller_source("@Controller class A {}"));
        assert!(!is_controller_source("@Service class A { @GetMapping void x() {} }"));
    }

    #[test]
    fn test_regenerate_updates_controllers_only() {
        let host = MemoryHost::with_files(&[
            ("FilmController.java", FILM_CONTROLLER),
            ("Film.java", "public class Film {}\n"),
        ]);

        let summary = regenerate(&host).unwrap();
        assert_eq!(summary.documents.len(), 1);
        assert_eq!(summary.documents_changed(), 1);
        assert_eq!(summary.endpoint_count(), 1);
        assert_eq!(summary.message(), "Updated endpoint comments in 1 document");
        assert!(host
            .text("FilmController.java")
            .contains("    // GET https://localhost:8080/films/{id:int}\n    @GetMapping"));
        assert_eq!(host.text("Film.java"), "public class Film {}\n");
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let host = MemoryHost::with_files(&[("FilmController.java", FILM_CONTROLLER)]);
        regenerate(&host).unwrap();
        let first = host.text("FilmController.java");

        let summary = regenerate(&host).unwrap();
        assert_eq!(summary.documents_changed(), 0);
        assert_eq!(summary.message(), "Updated endpoint comments in 0 documents");
        assert_eq!(host.text("FilmController.java"), first);
    }

    #[test]
    fn test_base_url_from_config_then_port() {
        let mut host = MemoryHost::with_files(&[("FilmController.java", FILM_CONTROLLER)]);
        host.project.insert(
            crate::port::PROPERTIES_FILE.to_string(),
            "server.port=9443".to_string(),
        );
        assert_eq!(resolve_base_url(&host), "https://localhost:9443");

        host.base_url = Some("http://films.internal/".to_string());
        assert_eq!(resolve_base_url(&host), "http://films.internal/");

        regenerate(&host).unwrap();
        assert!(host
            .text("FilmController.java")
            .contains("// GET http://films.internal/films/{id:int}"));
    }

    #[test]
    fn test_no_endpoints_message() {
        let host = MemoryHost::with_files(&[(
            "HomeController.java",
            "@Controller\npublic class HomeController {}\n",
        )]);
        let summary = regenerate(&host).unwrap();
        assert_eq!(summary.message(), "No endpoints found");
        assert_eq!(summary.documents_changed(), 0);
    }

    #[test]
    fn test_failures_do_not_stop_other_documents() {
        let mut host = MemoryHost::with_files(&[("B.java", FILM_CONTROLLER)]);
        host.unreadable.push(PathBuf::from("A.java"));

        let summary = regenerate(&host).unwrap();
        assert_eq!(summary.documents.len(), 2);
        assert_eq!(summary.failures().count(), 1);
        assert_eq!(summary.documents_changed(), 1);
        assert!(host.text("B.java").contains("// GET "));
    }

    #[test]
    fn test_rejected_edits_leave_document_untouched() {
        let mut host = MemoryHost::with_files(&[("A.java", FILM_CONTROLLER)]);
        host.reject_writes = true;

        let summary = regenerate(&host).unwrap();
        assert_eq!(summary.documents_changed(), 0);
        let failure = summary.failures().next().unwrap();
        assert!(failure.error.as_deref().unwrap().contains("read-only"));
        assert_eq!(host.text("A.java"), FILM_CONTROLLER);
    }

    #[test]
    fn test_dry_run_message_says_would_update() {
        let host = MemoryHost::with_files(&[("FilmController.java", FILM_CONTROLLER)]);
        let mut summary = regenerate(&host).unwrap();
        assert!(!summary.dry_run);

        summary.dry_run = true;
        assert_eq!(summary.message(), "Would update endpoint comments in 1 document");
    }

    #[test]
    fn test_mixed_endings_up_to_date_is_unchanged() {
        let text = "// header\r\n@RestController\npublic class A {\n    // GET https://localhost:8080/x\n    @GetMapping(\"/x\")\n    public void x() {}\n}\n";
        let host = MemoryHost::with_files(&[("A.java", text)]);

        let annotator = Annotator::new("https://localhost:8080");
        let report = process_document(&host, Path::new("A.java"), &annotator).unwrap();
        assert!(!report.changed);
        assert_eq!(regenerate(&host).unwrap().documents_changed(), 0);
        assert_eq!(host.text("A.java"), text);
    }
}
