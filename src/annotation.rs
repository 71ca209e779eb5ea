//! Route annotation scanning.
//!
//! Finds `@GetMapping`, `@PostMapping`, `@PutMapping`, `@DeleteMapping` and
//! `@RequestMapping` occurrences in Java source text and interprets their
//! argument lists: literal paths, HTTP verbs and the class-level base path.
//!
//! Extraction is pattern based. An argument list is captured up to the first
//! `)`, so a literal containing a closing parenthesis truncates it.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Verb emitted for a `@RequestMapping` without any `RequestMethod` reference.
pub const REQUEST_VERB: &str = "REQUEST";

fn annotation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"@(GetMapping|PostMapping|PutMapping|DeleteMapping|RequestMapping)\b(?:\s*\(([^)]*)\))?")
            .expect("annotation pattern is valid")
    })
}

fn type_declaration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^[ \t]*(?:@\w+(?:\s*\([^)]*\))?\s+)*(?:(?:public|protected|private|abstract|final|static|sealed)\s+)*(class|interface|record)\s+\w+",
        )
        .expect("type declaration pattern is valid")
    })
}

fn keyed_list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:path|value)\s*=\s*\{").expect("keyed list pattern is valid")
    })
}

fn leading_list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\{").expect("list pattern is valid"))
}

fn keyed_literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\b(?:path|value)\s*=\s*"([^"]*)""#).expect("keyed literal pattern is valid")
    })
}

fn literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]*)""#).expect("literal pattern is valid"))
}

fn method_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"RequestMethod\s*\.\s*(GET|POST|PUT|DELETE)\b")
            .expect("method reference pattern is valid")
    })
}

/// The route annotation vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    Get,
    Post,
    Put,
    Delete,
    /// `@RequestMapping`, usable on classes and methods.
    Generic,
}

impl AnnotationKind {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "GetMapping" => Some(AnnotationKind::Get),
            "PostMapping" => Some(AnnotationKind::Post),
            "PutMapping" => Some(AnnotationKind::Put),
            "DeleteMapping" => Some(AnnotationKind::Delete),
            "RequestMapping" => Some(AnnotationKind::Generic),
            _ => None,
        }
    }

    /// The annotation name without the leading `@`.
    pub fn keyword(&self) -> &'static str {
        match self {
            AnnotationKind::Get => "GetMapping",
            AnnotationKind::Post => "PostMapping",
            AnnotationKind::Put => "PutMapping",
            AnnotationKind::Delete => "DeleteMapping",
            AnnotationKind::Generic => "RequestMapping",
        }
    }
}

/// One route annotation found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationOccurrence {
    pub kind: AnnotationKind,

    /// Argument text between the parentheses, verbatim. Empty when the
    /// annotation has no argument list.
    pub raw_args: String,

    /// Byte offset of the `@` in the document.
    pub source_offset: usize,
}

impl AnnotationOccurrence {
    /// Literal paths declared by this annotation.
    pub fn paths(&self) -> Vec<String> {
        extract_paths(&self.raw_args)
    }

    /// HTTP verbs this annotation maps to.
    pub fn verbs(&self) -> Vec<String> {
        resolve_verbs(self.kind, &self.raw_args)
    }
}

fn occurrence_from(caps: &regex::Captures<'_>) -> Option<AnnotationOccurrence> {
    let whole = caps.get(0)?;
    let kind = AnnotationKind::from_keyword(caps.get(1)?.as_str())?;
    Some(AnnotationOccurrence {
        kind,
        raw_args: caps
            .get(2)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        source_offset: whole.start(),
    })
}

/// Byte offset of the first type-declaration keyword, if any.
pub fn type_declaration_offset(text: &str) -> Option<usize> {
    type_declaration_re()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.start())
}

/// Lazy iterator over the method-level route annotations of a document, in
/// ascending offset order.
///
/// `@RequestMapping` occurrences before the type declaration are class-level
/// and skipped; [`class_base_path`] interprets them. A clone resumes from the
/// same position; [`AnnotationScanner::new`] starts a fresh pass.
#[derive(Debug, Clone)]
pub struct AnnotationScanner<'t> {
    text: &'t str,
    cursor: usize,
    type_decl: Option<usize>,
}

impl<'t> AnnotationScanner<'t> {
    pub fn new(text: &'t str) -> Self {
        Self {
            text,
            cursor: 0,
            type_decl: type_declaration_offset(text),
        }
    }

    fn is_class_level(&self, occurrence: &AnnotationOccurrence) -> bool {
        occurrence.kind == AnnotationKind::Generic
            && self
                .type_decl
                .is_some_and(|decl| occurrence.source_offset < decl)
    }
}

impl Iterator for AnnotationScanner<'_> {
    type Item = AnnotationOccurrence;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.cursor > self.text.len() {
                return None;
            }
            let caps = annotation_re().captures_at(self.text, self.cursor)?;
            self.cursor = caps.get(0)?.end();

            let Some(occurrence) = occurrence_from(&caps) else {
                continue;
            };
            if self.is_class_level(&occurrence) {
                continue;
            }
            return Some(occurrence);
        }
    }
}

/// Resolve the class-level base path: the last `@RequestMapping` before the
/// type declaration wins. Empty when there is none.
pub fn class_base_path(text: &str) -> String {
    let Some(decl) = type_declaration_offset(text) else {
        return String::new();
    };

    let mut base = String::new();
    for caps in annotation_re().captures_iter(text) {
        let Some(occurrence) = occurrence_from(&caps) else {
            continue;
        };
        if occurrence.source_offset >= decl {
            break;
        }
        if occurrence.kind == AnnotationKind::Generic {
            base = occurrence.paths().into_iter().next().unwrap_or_default();
        }
    }
    base
}

/// Parse annotation arguments into literal paths, in declaration order.
///
/// A `{...}` array (bare or behind `path=`/`value=`) yields one path per
/// element; otherwise the `path=`/`value=` literal or the first string
/// literal; otherwise a single empty path.
pub fn extract_paths(raw_args: &str) -> Vec<String> {
    let list_start = keyed_list_re()
        .find(raw_args)
        .or_else(|| leading_list_re().find(raw_args))
        .map(|m| m.end());

    if let Some(start) = list_start {
        let paths: Vec<String> = split_list(&raw_args[start..])
            .into_iter()
            .map(str::trim)
            .filter(|element| !element.is_empty())
            .map(|element| element.trim_matches('"').trim().to_string())
            .collect();
        if !paths.is_empty() {
            return paths;
        }
    }

    let literal = keyed_literal_re()
        .captures(raw_args)
        .or_else(|| literal_re().captures(raw_args))
        .and_then(|caps| caps.get(1));

    vec![literal.map(|m| m.as_str().to_string()).unwrap_or_default()]
}

/// Split the body of a `{...}` list (text after the opening brace) on
/// top-level commas, up to the closing brace. Braces and commas inside
/// string literals, such as `{id}` placeholders, do not count.
fn split_list(body: &str) -> Vec<&str> {
    let mut elements = Vec::new();
    let mut in_string = false;
    let mut element_start = 0;

    for (i, c) in body.char_indices() {
        match c {
            '"' => in_string = !in_string,
            ',' if !in_string => {
                elements.push(&body[element_start..i]);
                element_start = i + 1;
            }
            '}' if !in_string => {
                elements.push(&body[element_start..i]);
                return elements;
            }
            _ => {}
        }
    }
    elements.push(&body[element_start..]);
    elements
}

/// Resolve the HTTP verbs of an annotation.
///
/// Dedicated annotations map to their own verb. `@RequestMapping` yields each
/// `RequestMethod.X` reference in order of appearance (duplicates kept), or
/// [`REQUEST_VERB`] when it names none.
pub fn resolve_verbs(kind: AnnotationKind, raw_args: &str) -> Vec<String> {
    if kind != AnnotationKind::Generic {
        let verb = kind.keyword().trim_end_matches("Mapping").to_uppercase();
        return vec![verb];
    }

    let verbs: Vec<String> = method_ref_re()
        .captures_iter(raw_args)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect();

    if verbs.is_empty() {
        vec![REQUEST_VERB.to_string()]
    } else {
        verbs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTROLLER: &str = r#"
@RestController
@RequestMapping("/api")
public class FilmController {

    @GetMapping("/films/{id}")
    public Film get(@PathVariable Long id) { return null; }

    @RequestMapping(method = RequestMethod.POST)
    public void create() {}

    @DeleteMapping
    public void purge() {}
}
"#;

    #[test]
    fn test_scanner_skips_class_level_request_mapping() {
        let found: Vec<_> = AnnotationScanner::new(CONTROLLER).collect();
        let kinds: Vec<_> = found.iter().map(|o| o.kind).collect();
        assert_eq!(
            kinds,
            [
                AnnotationKind::Get,
                AnnotationKind::Generic,
                AnnotationKind::Delete
            ]
        );
        assert_eq!(found[0].raw_args, r#""/films/{id}""#);
        assert_eq!(found[1].raw_args, "method = RequestMethod.POST");
        assert_eq!(found[2].raw_args, "");
    }

    #[test]
    fn test_scanner_offsets_ascending_and_restartable() {
        let first: Vec<_> = AnnotationScanner::new(CONTROLLER).collect();
        let second: Vec<_> = AnnotationScanner::new(CONTROLLER).collect();
        assert_eq!(first, second);
        assert!(first
            .windows(2)
            .all(|w| w[0].source_offset < w[1].source_offset));
        assert_eq!(&CONTROLLER[first[0].source_offset..][..12], "@GetMapping(");
    }

    #[test]
    fn test_scanner_ignores_longer_identifiers() {
        let text = "class A {\n  @GetMappingFoo(\"/x\")\n  @GetMapping(\"/y\")\n}";
        let found: Vec<_> = AnnotationScanner::new(text).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].paths(), ["/y"]);
    }

    #[test]
    fn test_scanner_without_type_declaration_keeps_generic() {
        let text = "@RequestMapping(\"/loose\")\nvoid handler() {}";
        let found: Vec<_> = AnnotationScanner::new(text).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, AnnotationKind::Generic);
    }

    #[test]
    fn test_type_declaration_ignores_prose() {
        let text = "/** This class serves films. */\n@RequestMapping(\"/x\")\npublic final class A {}";
        let offset = type_declaration_offset(text).unwrap();
        assert_eq!(&text[offset..offset + 5], "class");
        assert!(offset > text.find("@RequestMapping").unwrap());
    }

    #[test]
    fn test_type_declaration_after_annotation_on_same_line() {
        let text = "@RequestMapping(\"/inline\") public class A {}";
        assert_eq!(class_base_path(text), "/inline");
        assert_eq!(AnnotationScanner::new(text).count(), 0);
    }

    #[test]
    fn test_class_base_path_last_wins() {
        let text = r#"
// @RequestMapping("/old")
@RequestMapping(value = "/new")
public class A {
    @RequestMapping("/method")
    public void m() {}
}
"#;
        assert_eq!(class_base_path(text), "/new");
        assert_eq!(class_base_path(CONTROLLER), "/api");
        assert_eq!(class_base_path("public class A {}"), "");
    }

    #[test]
    fn test_extract_paths_single_literal() {
        assert_eq!(extract_paths(r#""/users/{id}""#), ["/users/{id}"]);
        assert_eq!(extract_paths(r#"value = "/x", method = RequestMethod.GET"#), ["/x"]);
        assert_eq!(extract_paths(r#"produces = "text/plain", path = "/p""#), ["/p"]);
    }

    #[test]
    fn test_extract_paths_lists() {
        assert_eq!(extract_paths(r#"value={"/a","/b"}"#), ["/a", "/b"]);
        assert_eq!(extract_paths(r#"{ "/home", "/" }"#), ["/home", "/"]);
        assert_eq!(extract_paths(r#"path = { "/z" , "/y" }"#), ["/z", "/y"]);
        assert_eq!(
            extract_paths(r#"{ "/films/{id}", "/a,b/{x}" }"#),
            ["/films/{id}", "/a,b/{x}"]
        );
    }

    #[test]
    fn test_extract_paths_fallback_empty() {
        assert_eq!(extract_paths(""), [""]);
        assert_eq!(extract_paths("method = RequestMethod.GET"), [""]);
        assert_eq!(extract_paths("{}"), [""]);
    }

    #[test]
    fn test_resolve_verbs_dedicated() {
        assert_eq!(resolve_verbs(AnnotationKind::Get, ""), ["GET"]);
        assert_eq!(resolve_verbs(AnnotationKind::Post, "\"/x\""), ["POST"]);
        assert_eq!(resolve_verbs(AnnotationKind::Put, ""), ["PUT"]);
        assert_eq!(resolve_verbs(AnnotationKind::Delete, ""), ["DELETE"]);
    }

    #[test]
    fn test_resolve_verbs_generic() {
        assert_eq!(resolve_verbs(AnnotationKind::Generic, "\"/x\""), [REQUEST_VERB]);
        assert_eq!(
            resolve_verbs(
                AnnotationKind::Generic,
                "method = {RequestMethod.PUT, RequestMethod.GET, RequestMethod.PUT}"
            ),
            ["PUT", "GET", "PUT"]
        );
    }
}
