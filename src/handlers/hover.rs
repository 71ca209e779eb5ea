//! Hover provider showing the endpoints of a route annotation.

use tower_lsp::lsp_types::*;

use crate::document::Document;
use crate::Annotator;

/// Handler for hover requests.
#[derive(Debug, Default)]
pub struct HoverHandler;

impl HoverHandler {
    pub fn new() -> Self {
        Self
    }

    /// Resolved endpoints when `position` is on a route annotation line.
    pub fn hover(&self, doc: &Document, annotator: &Annotator, position: Position) -> Option<Hover> {
        let line = position.line as usize;
        let endpoints: Vec<String> = annotator
            .endpoints(doc)
            .into_iter()
            .filter(|listed| listed.line == line)
            .map(|listed| format!("{} {}", listed.endpoint.http_verb, listed.endpoint.full_url))
            .collect();

        if endpoints.is_empty() {
            return None;
        }

        // LSP positions count UTF-16 code units
        let width = doc.line_text(line).map_or(0, |text| text.encode_utf16().count()) as u32;
        Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: format!("**Endpoints**\n\n```http\n{}\n```", endpoints.join("\n")),
            }),
            range: Some(Range {
                start: Position {
                    line: position.line,
                    character: 0,
                },
                end: Position {
                    line: position.line,
                    character: width,
                },
            }),
        })
    }
}
