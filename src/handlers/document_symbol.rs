//! Document symbol provider listing a controller's endpoints.

use tower_lsp::lsp_types::*;

use crate::document::Document;
use crate::workspace::is_controller_source;
use crate::Annotator;

/// Handler for document symbol requests.
#[derive(Debug, Default)]
pub struct DocumentSymbolHandler;

impl DocumentSymbolHandler {
    pub fn new() -> Self {
        Self
    }

    /// One symbol per resolved endpoint, named `VERB url`, located on its
    /// annotation line and grouped under the file's type name.
    pub fn symbols(&self, doc: &Document, uri: &Url, annotator: &Annotator) -> Vec<SymbolInformation> {
        if !is_controller_source(doc.text()) {
            return Vec::new();
        }

        let container = doc
            .path()
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());

        annotator
            .endpoints(doc)
            .into_iter()
            .map(|listed| {
                let width = doc
                    .line_text(listed.line)
                    .map_or(0, |text| text.encode_utf16().count())
                    .max(1) as u32;

                #[allow(deprecated)]
                SymbolInformation {
                    name: format!("{} {}", listed.endpoint.http_verb, listed.endpoint.full_url),
                    kind: SymbolKind::METHOD,
                    tags: None,
                    deprecated: None,
                    location: Location {
                        uri: uri.clone(),
                        range: Range {
                            start: Position {
                                line: listed.line as u32,
                                character: 0,
                            },
                            end: Position {
                                line: listed.line as u32,
                                character: width,
                            },
                        },
                    },
                    container_name: container.clone(),
                }
            })
            .collect()
    }
}
