//! LSP Server capabilities configuration.

use tower_lsp::lsp_types::*;

/// Command that regenerates endpoint comments across the workspace.
pub const REGENERATE_COMMAND: &str = "endpointComments.regenerate";

/// Code action kind of the per-document regeneration.
pub fn source_action_kind() -> CodeActionKind {
    CodeActionKind::new("source.endpointComments")
}

/// Returns the server capabilities for the endpoint comments LSP.
pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        // Full text document sync; open buffers win over disk
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                will_save: Some(false),
                will_save_wait_until: Some(false),
                save: None,
            },
        )),

        // Resolved endpoints of the hovered annotation
        hover_provider: Some(HoverProviderCapability::Simple(true)),

        code_action_provider: Some(CodeActionProviderCapability::Options(CodeActionOptions {
            code_action_kinds: Some(vec![CodeActionKind::SOURCE, source_action_kind()]),
            work_done_progress_options: WorkDoneProgressOptions::default(),
            resolve_provider: Some(false),
        })),

        execute_command_provider: Some(ExecuteCommandOptions {
            commands: vec![REGENERATE_COMMAND.to_string()],
            work_done_progress_options: WorkDoneProgressOptions::default(),
        }),

        // One symbol per endpoint
        document_symbol_provider: Some(OneOf::Left(true)),

        ..Default::default()
    }
}
