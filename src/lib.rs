//! Endpoint Comments - generated URL comments for Spring route declarations.
//!
//! Scans Java controllers for `@GetMapping`, `@PostMapping`, `@PutMapping`,
//! `@DeleteMapping` and `@RequestMapping` annotations and writes a comment
//! above each one with the effective verb and URL, including the class base
//! path, typed path variables and the query string:
//!
//! ```java
//! // GET https://localhost:8080/api/films/{id:int}?lang:string
//! @GetMapping("/films/{id}")
//! public Film get(@PathVariable Long id, @RequestParam String lang) { ... }
//! ```
//!
//! Re-running replaces the previously generated comments, so the output is
//! stable across runs.
//!
//! # Usage
//!
//! ```rust,no_run
//! use endpoint_comments::{Annotator, Document};
//!
//! let annotator = Annotator::new("https://localhost:8080");
//! let doc = Document::new("FilmController.java", std::fs::read_to_string("FilmController.java").unwrap());
//! let updated = annotator.annotate(&doc);
//! ```

pub mod annotation;
pub mod backend;
pub mod capabilities;
pub mod config;
pub mod document;
pub mod handlers;
pub mod host;
pub mod output;
pub mod params;
pub mod plan;
pub mod port;
pub mod type_map;
pub mod url;
pub mod workspace;

pub use annotation::{AnnotationKind, AnnotationOccurrence, AnnotationScanner};
pub use config::EndpointConfig;
pub use document::Document;
pub use host::{FsHost, Host, HostError};
pub use plan::{EditOperation, EditPlan, EndpointBlock, ListedEndpoint, ResolvedEndpoint};
pub use type_map::FriendlyType;
pub use workspace::{regenerate, RegenerateSummary};

/// Plans endpoint comments for documents against one base URL.
#[derive(Debug, Clone)]
pub struct Annotator {
    base_url: String,
}

impl Annotator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim().to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Compute the edit plan for a document.
    pub fn plan(&self, doc: &Document) -> EditPlan {
        plan::plan_document(doc, &self.base_url)
    }

    /// Every endpoint of a document with its annotation line.
    pub fn endpoints(&self, doc: &Document) -> Vec<ListedEndpoint> {
        self.plan(doc).endpoints()
    }

    /// The document text with regenerated endpoint comments.
    pub fn annotate(&self, doc: &Document) -> String {
        self.plan(doc).apply(doc)
    }

    /// Annotate a string of source text.
    pub fn annotate_str(&self, text: &str, filename: &str) -> String {
        self.annotate(&Document::new(filename, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotate_str_round_trip() {
        let annotator = Annotator::new(" https://localhost:8080 ");
        assert_eq!(annotator.base_url(), "https://localhost:8080");

        let source = "@Controller\npublic class A {\n    @PostMapping(\"/submit\")\n    public String post(FormInfo info) {\n        return \"redirect:/\";\n    }\n}\n";
        let once = annotator.annotate_str(source, "A.java");
        assert_eq!(
            once,
            "@Controller\npublic class A {\n    // POST https://localhost:8080/submit\n    @PostMapping(\"/submit\")\n    public String post(FormInfo info) {\n        return \"redirect:/\";\n    }\n}\n"
        );
        assert_eq!(annotator.annotate_str(&once, "A.java"), once);
    }

    #[test]
    fn test_endpoints_carry_annotation_line() {
        let annotator = Annotator::new("http://api");
        let doc = Document::new(
            "A.java",
            "@RestController
@RequestMapping(\"/v1\")
class A {
  @RequestMapping(value = \"/x\", method = {RequestMethod.GET, RequestMethod.POST})
  void x() {}
}
",
        );
        let endpoints = annotator.endpoints(&doc);
        assert_eq!(endpoints.len(), 2);
        assert!(endpoints.iter().all(|e| e.line == 3));
        assert_eq!(endpoints[0].endpoint.http_verb, "GET");
        assert_eq!(endpoints[1].endpoint.http_verb, "POST");
        assert_eq!(endpoints[1].endpoint.full_url, "http://api/v1/x");
    }
}
