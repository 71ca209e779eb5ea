//! Comment synthesis and edit planning.
//!
//! For every method-level route annotation the planner builds one comment
//! line per (verb, path) pair and schedules the run of previously generated
//! comments directly above the annotation for deletion. All line numbers in
//! a plan refer to the document as it was read.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::annotation::{class_base_path, AnnotationOccurrence, AnnotationScanner};
use crate::document::{insertion_ending, render_lines, Document, Line};
use crate::params::{extract_parameters, signature_span, MethodParameters};
use crate::url::compose_url;

/// Line prefixes (after trimming) that mark a generated comment.
pub const GENERATED_PREFIXES: [&str; 5] =
    ["// GET ", "// POST ", "// PUT ", "// DELETE ", "// REQUEST "];

/// One (verb, URL) pair derived from an annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEndpoint {
    pub http_verb: String,
    pub full_url: String,
}

impl ResolvedEndpoint {
    /// The generated comment for this endpoint, indented like the annotation.
    pub fn comment(&self, indent: &str) -> String {
        let line = format!("{indent}// {} {}", self.http_verb, self.full_url);
        line.trim_end().to_string()
    }
}

/// A resolved endpoint together with the 0-based line of its annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedEndpoint {
    pub line: usize,
    #[serde(flatten)]
    pub endpoint: ResolvedEndpoint,
}

/// A line-level edit against the original document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EditOperation {
    /// Remove the half-open range of lines.
    Delete { lines: Range<usize> },
    /// Insert `text` (one or more `\n`-separated lines) before `line`.
    Insert { line: usize, text: String },
}

impl EditOperation {
    /// Highest original line this operation touches.
    fn anchor(&self) -> usize {
        match self {
            EditOperation::Delete { lines } => lines.end.saturating_sub(1),
            EditOperation::Insert { line, .. } => *line,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            EditOperation::Delete { .. } => 0,
            EditOperation::Insert { .. } => 1,
        }
    }
}

/// Everything planned for one annotation occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointBlock {
    pub occurrence: AnnotationOccurrence,

    /// 0-based line of the annotation.
    pub line: usize,

    /// Leading whitespace of the annotation line.
    pub indent: String,

    /// Verb-major, then path order.
    pub endpoints: Vec<ResolvedEndpoint>,

    /// Previously generated comment lines directly above the annotation.
    pub stale: Range<usize>,
}

impl EndpointBlock {
    pub fn comment_lines(&self) -> Vec<String> {
        self.endpoints
            .iter()
            .map(|endpoint| endpoint.comment(&self.indent))
            .collect()
    }
}

/// The edit plan of one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditPlan {
    pub blocks: Vec<EndpointBlock>,
}

impl EditPlan {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn endpoint_count(&self) -> usize {
        self.blocks.iter().map(|b| b.endpoints.len()).sum()
    }

    /// Every resolved endpoint, in document order.
    pub fn endpoints(&self) -> Vec<ListedEndpoint> {
        self.blocks
            .iter()
            .flat_map(|block| {
                block.endpoints.iter().map(|endpoint| ListedEndpoint {
                    line: block.line,
                    endpoint: endpoint.clone(),
                })
            })
            .collect()
    }

    /// Scheduled deletions and insertions, in no particular order.
    ///
    /// Overlapping stale runs are merged and blocks anchored on the same line
    /// share one insertion, so no line is deleted or targeted twice.
    pub fn operations(&self) -> Vec<EditOperation> {
        let stale: BTreeSet<usize> = self.blocks.iter().flat_map(|b| b.stale.clone()).collect();

        let mut inserts: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for block in &self.blocks {
            let lines = block.comment_lines();
            if !lines.is_empty() {
                inserts.entry(block.line).or_default().extend(lines);
            }
        }

        let mut operations: Vec<EditOperation> = contiguous_ranges(&stale)
            .into_iter()
            .map(|lines| EditOperation::Delete { lines })
            .collect();
        operations.extend(inserts.into_iter().map(|(line, lines)| EditOperation::Insert {
            line,
            text: lines.join("\n"),
        }));
        operations
    }

    /// [`EditPlan::operations`] in application order: highest line first,
    /// and a deletion before an insertion at the same line. Applied one at a
    /// time in this order, every line number stays valid.
    pub fn ordered_operations(&self) -> Vec<EditOperation> {
        let mut operations = self.operations();
        operations.sort_by_key(|op| (Reverse(op.anchor()), op.rank()));
        operations
    }

    /// Render the document with this plan applied.
    pub fn apply(&self, doc: &Document) -> String {
        render_edited(doc, &self.ordered_operations())
    }
}

fn contiguous_ranges(lines: &BTreeSet<usize>) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    for &line in lines {
        match ranges.last_mut() {
            Some(range) if range.end == line => range.end += 1,
            _ => ranges.push(line..line + 1),
        }
    }
    ranges
}

/// Whether `operations` follow the bottom-to-top application order of
/// [`EditPlan::ordered_operations`].
pub fn is_application_ordered(operations: &[EditOperation]) -> bool {
    operations.windows(2).all(|pair| {
        let (prev, next) = (&pair[0], &pair[1]);
        prev.anchor() > next.anchor()
            || (prev.anchor() == next.anchor() && prev.rank() <= next.rank())
    })
}

/// Apply operations in the given order to a line buffer. Positions past the
/// end of the buffer are clamped. Inserted lines take the ending of the line
/// they land before.
pub fn apply_operations(lines: &mut Vec<Line>, operations: &[EditOperation]) {
    for operation in operations {
        match operation {
            EditOperation::Delete { lines: range } => {
                let end = range.end.min(lines.len());
                let start = range.start.min(end);
                lines.drain(start..end);
            }
            EditOperation::Insert { line, text } => {
                let at = (*line).min(lines.len());
                let ending = insertion_ending(
                    lines.get(at).map(|l| l.ending),
                    at.checked_sub(1).map(|p| lines[p].ending),
                );
                let mut inserted: Vec<Line> =
                    text.split('\n').map(|t| Line::new(t, ending)).collect();
                if at == lines.len() {
                    if let Some(last) = lines.last_mut() {
                        last.ending = ending;
                    }
                    if let Some(tail) = inserted.last_mut() {
                        tail.ending = "";
                    }
                }
                lines.splice(at..at, inserted);
            }
        }
    }
}

/// Render `doc` with `operations` applied in the given order.
pub fn render_edited(doc: &Document, operations: &[EditOperation]) -> String {
    let mut lines = doc.source_lines();
    apply_operations(&mut lines, operations);
    render_lines(&lines)
}

/// Whether a line is a comment this tool generated.
pub fn is_generated_comment(line: &str) -> bool {
    let trimmed = line.trim();
    GENERATED_PREFIXES
        .iter()
        .any(|prefix| trimmed.starts_with(prefix) || trimmed == prefix.trim_end())
}

/// The unbroken run of generated comment lines directly above `line`.
pub fn stale_run_above<S: AsRef<str>>(lines: &[S], line: usize) -> Range<usize> {
    let line = line.min(lines.len());
    let mut start = line;
    while start > 0 && is_generated_comment(lines[start - 1].as_ref()) {
        start -= 1;
    }
    start..line
}

/// Endpoints of one occurrence: verbs outer, paths inner.
pub fn resolve_endpoints(
    occurrence: &AnnotationOccurrence,
    base_url: &str,
    base_path: &str,
    params: &MethodParameters,
) -> Vec<ResolvedEndpoint> {
    let paths = occurrence.paths();
    occurrence
        .verbs()
        .into_iter()
        .flat_map(|verb| {
            paths.iter().map(move |path| ResolvedEndpoint {
                http_verb: verb.clone(),
                full_url: compose_url(base_url, base_path, path, params),
            })
        })
        .collect()
}

/// Plan the comment rewrite of a document from a single snapshot.
pub fn plan_document(doc: &Document, base_url: &str) -> EditPlan {
    let base_path = class_base_path(doc.text());

    let blocks = AnnotationScanner::new(doc.text())
        .map(|occurrence| {
            let line = doc.offset_to_line(occurrence.source_offset);
            let indent: String = doc
                .line_text(line)
                .unwrap_or_default()
                .chars()
                .take_while(|c| c.is_whitespace())
                .collect();
            let params = extract_parameters(&signature_span(doc.lines(), line));
            let endpoints = resolve_endpoints(&occurrence, base_url, &base_path, &params);

            EndpointBlock {
                stale: stale_run_above(doc.lines(), line),
                occurrence,
                line,
                indent,
                endpoints,
            }
        })
        .collect();

    EditPlan { blocks }
}
