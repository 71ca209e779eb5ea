//! Code action provider for regenerating a document's endpoint comments.

use std::collections::{BTreeMap, HashMap};

use tower_lsp::lsp_types::*;

use crate::capabilities::source_action_kind;
use crate::document::Document;
use crate::plan::EditOperation;
use crate::workspace::is_controller_source;
use crate::Annotator;

/// Convert planned operations into LSP text edits against the same snapshot.
///
/// A deletion that ends where an insertion lands becomes one replacement, so
/// each regenerated block is a single edit. Edits are returned in document
/// order and never overlap.
pub fn text_edits(doc: &Document, operations: &[EditOperation]) -> Vec<TextEdit> {
    let mut deletes: BTreeMap<usize, usize> = BTreeMap::new();
    let mut inserts: BTreeMap<usize, String> = BTreeMap::new();

    for operation in operations {
        match operation {
            EditOperation::Delete { lines } if !lines.is_empty() => {
                deletes.insert(lines.end, lines.start);
            }
            EditOperation::Delete { .. } => {}
            EditOperation::Insert { line, text } => {
                let eol = doc.ending_before(*line);
                let block = inserts.entry(*line).or_default();
                for comment in text.split('\n') {
                    block.push_str(comment);
                    block.push_str(eol);
                }
            }
        }
    }

    let mut edits: Vec<TextEdit> = Vec::new();
    for (line, new_text) in inserts {
        let start = deletes.remove(&line).unwrap_or(line);
        edits.push(TextEdit {
            range: line_range(start, line),
            new_text,
        });
    }
    edits.extend(deletes.into_iter().map(|(end, start)| TextEdit {
        range: line_range(start, end),
        new_text: String::new(),
    }));

    edits.sort_by_key(|edit| (edit.range.start.line, edit.range.end.line));
    edits
}

/// Whole lines `start..end` as an LSP range.
fn line_range(start: usize, end: usize) -> Range {
    Range {
        start: Position {
            line: start as u32,
            character: 0,
        },
        end: Position {
            line: end as u32,
            character: 0,
        },
    }
}

/// Handler for code action requests.
#[derive(Debug, Default)]
pub struct CodeActionHandler;

impl CodeActionHandler {
    pub fn new() -> Self {
        Self
    }

    /// The "Regenerate endpoint comments" action for one document, offered
    /// when the document is a controller whose comments are out of date.
    pub fn actions(
        &self,
        doc: &Document,
        uri: &Url,
        annotator: &Annotator,
        only: Option<&[CodeActionKind]>,
    ) -> CodeActionResponse {
        let kind = source_action_kind();
        let wanted = only.map_or(true, |kinds| {
            kinds
                .iter()
                .any(|k| kind.as_str().starts_with(k.as_str()))
        });
        if !wanted || !is_controller_source(doc.text()) {
            return Vec::new();
        }

        let plan = annotator.plan(doc);
        if plan.apply(doc) == doc.text() {
            return Vec::new();
        }

        let edits = text_edits(doc, &plan.ordered_operations());
        let changes: HashMap<Url, Vec<TextEdit>> = [(uri.clone(), edits)].into_iter().collect();

        vec![CodeActionOrCommand::CodeAction(CodeAction {
            title: "Regenerate endpoint comments".to_string(),
            kind: Some(kind),
            edit: Some(WorkspaceEdit {
                changes: Some(changes),
                ..Default::default()
            }),
            ..Default::default()
        })]
    }
}
