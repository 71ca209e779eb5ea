//! LSP request handlers.

mod code_action;
mod document_symbol;
mod hover;

pub use code_action::{text_edits, CodeActionHandler};
pub use document_symbol::DocumentSymbolHandler;
pub use hover::HoverHandler;
