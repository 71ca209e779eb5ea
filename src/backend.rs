//! LSP Backend implementation for the endpoint comments language server.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use dashmap::DashMap;
use serde::Deserialize;
use serde_json::Value;
use tower_lsp::jsonrpc;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, error, info, warn};

use crate::capabilities::{server_capabilities, REGENERATE_COMMAND};
use crate::config::{discover_config, EndpointConfig};
use crate::document::Document;
use crate::handlers::{text_edits, CodeActionHandler, DocumentSymbolHandler, HoverHandler};
use crate::host::{find_project_root, walk_sources, Host, HostError};
use crate::plan::{is_application_ordered, EditOperation};
use crate::workspace::{regenerate, resolve_base_url};
use crate::Annotator;

/// Settings section read from `initializationOptions` and
/// `workspace/didChangeConfiguration`.
pub const SETTINGS_SECTION: &str = "endpointComments";

/// Editor settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub base_url: Option<String>,
}

impl Settings {
    /// Parse settings given either bare or nested under [`SETTINGS_SECTION`].
    pub fn from_value(value: &Value) -> Option<Self> {
        let section = value.get(SETTINGS_SECTION).unwrap_or(value);
        serde_json::from_value(section.clone()).ok()
    }
}

/// Host over a snapshot of the editor: open buffers are read instead of the
/// disk, and edits are collected for a single `workspace/applyEdit`.
#[derive(Debug)]
pub struct LspHost {
    scope: Option<PathBuf>,
    project_root: Option<PathBuf>,
    config: EndpointConfig,
    open: HashMap<PathBuf, String>,
    edits: Mutex<HashMap<Url, Vec<TextEdit>>>,
}

impl LspHost {
    /// `scope` is the workspace root or a single file. Without one only the
    /// open buffers are candidates.
    pub fn new(
        scope: Option<PathBuf>,
        base_url: Option<String>,
        open: HashMap<PathBuf, String>,
    ) -> Self {
        let config = match scope.as_deref() {
            Some(path) => discover_config(path).unwrap_or_else(|err| {
                warn!("ignoring configuration: {err:#}");
                EndpointConfig::default()
            }),
            None => EndpointConfig::default(),
        }
        .with_base_url(base_url);

        Self {
            project_root: scope.as_deref().map(find_project_root),
            scope,
            config,
            open,
            edits: Mutex::new(HashMap::new()),
        }
    }

    /// Edits collected so far, keyed by document.
    pub fn into_edits(self) -> HashMap<Url, Vec<TextEdit>> {
        self.edits.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Host for LspHost {
    fn find_files(&self) -> Result<Vec<PathBuf>, HostError> {
        if let Some(scope) = &self.scope {
            return walk_sources(scope, &self.config);
        }

        let mut files: Vec<PathBuf> = self
            .open
            .keys()
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| self.config.accepts_extension(&ext.to_string_lossy()))
            })
            .cloned()
            .collect();
        files.sort();
        Ok(files)
    }

    fn read_document(&self, path: &Path) -> Result<Document, HostError> {
        if let Some(text) = self.open.get(path) {
            return Ok(Document::new(path, text.clone()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| HostError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Document::new(path, text))
    }

    fn apply_edits(&self, doc: &Document, operations: &[EditOperation]) -> Result<(), HostError> {
        let rejected = |reason: &str| HostError::Rejected {
            path: doc.path().to_path_buf(),
            reason: reason.to_string(),
        };

        if !is_application_ordered(operations) {
            return Err(rejected("operations are not ordered bottom-to-top"));
        }
        let uri = Url::from_file_path(doc.path()).map_err(|()| rejected("not an absolute path"))?;

        self.edits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(uri, text_edits(doc, operations));
        Ok(())
    }

    fn config_value(&self, key: &str) -> Option<String> {
        self.config.value(key)
    }

    fn read_project_file(&self, relative: &str) -> Option<String> {
        let root = self.project_root.as_ref()?;
        std::fs::read_to_string(root.join(relative)).ok()
    }
}

/// Document state stored for each open file.
#[derive(Debug)]
pub struct DocumentState {
    pub content: String,
    pub version: i32,
}

/// Build the workspace edit for collected `changes`.
///
/// With `versions`, edits are sent as versioned document changes so the
/// client rejects them when an open buffer moved on since the snapshot.
/// Files not open in the editor carry no version.
pub fn workspace_edit(
    changes: HashMap<Url, Vec<TextEdit>>,
    versions: Option<&HashMap<Url, i32>>,
) -> WorkspaceEdit {
    let Some(versions) = versions else {
        return WorkspaceEdit {
            changes: Some(changes),
            ..Default::default()
        };
    };

    let mut edits: Vec<TextDocumentEdit> = changes
        .into_iter()
        .map(|(uri, edits)| TextDocumentEdit {
            text_document: OptionalVersionedTextDocumentIdentifier {
                version: versions.get(&uri).copied(),
                uri,
            },
            edits: edits.into_iter().map(OneOf::Left).collect(),
        })
        .collect();
    edits.sort_by(|a, b| a.text_document.uri.as_str().cmp(b.text_document.uri.as_str()));

    WorkspaceEdit {
        document_changes: Some(DocumentChanges::Edits(edits)),
        ..Default::default()
    }
}

/// The language server.
pub struct Backend {
    /// LSP client for sending notifications/requests back to the editor.
    client: Client,

    /// Open documents tracked by the server.
    documents: DashMap<Url, DocumentState>,

    settings: RwLock<Settings>,

    /// Workspace root from `initialize`.
    root: RwLock<Option<PathBuf>>,

    /// Client accepts versioned `documentChanges` in workspace edits.
    versioned_edits: AtomicBool,

    code_action_handler: CodeActionHandler,
    hover_handler: HoverHandler,
    document_symbol_handler: DocumentSymbolHandler,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: DashMap::new(),
            settings: RwLock::new(Settings::default()),
            root: RwLock::new(None),
            versioned_edits: AtomicBool::new(false),
            code_action_handler: CodeActionHandler::new(),
            hover_handler: HoverHandler::new(),
            document_symbol_handler: DocumentSymbolHandler::new(),
        }
    }

    fn base_url_setting(&self) -> Option<String> {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .base_url
            .clone()
    }

    fn set_settings(&self, settings: Settings) {
        debug!(?settings, "settings updated");
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    /// Text and version of every open `file:` document, taken in one pass.
    fn open_buffers(&self) -> (HashMap<PathBuf, String>, HashMap<Url, i32>) {
        let mut buffers = HashMap::new();
        let mut versions = HashMap::new();
        for entry in self.documents.iter() {
            let Ok(path) = entry.key().to_file_path() else {
                continue;
            };
            let uri = Url::from_file_path(&path).unwrap_or_else(|()| entry.key().clone());
            versions.insert(uri, entry.value().version);
            buffers.insert(path, entry.value().content.clone());
        }
        (buffers, versions)
    }

    /// An open document with the annotator resolved for its project.
    fn open_document(&self, uri: &Url) -> Option<(Document, Annotator)> {
        let content = self.documents.get(uri)?.content.clone();
        let path = uri.to_file_path().ok();

        let host = LspHost::new(path.clone(), self.base_url_setting(), HashMap::new());
        let annotator = Annotator::new(resolve_base_url(&host));
        let path = path.unwrap_or_else(|| PathBuf::from(uri.path()));

        Some((Document::new(path, content), annotator))
    }

    /// Run "regenerate endpoint comments" over the workspace and apply the
    /// result as one workspace edit.
    async fn regenerate_workspace(&self) -> jsonrpc::Result<Option<Value>> {
        let root = self.root.read().unwrap_or_else(PoisonError::into_inner).clone();
        let (buffers, versions) = self.open_buffers();
        let host = LspHost::new(root, self.base_url_setting(), buffers);

        let outcome = tokio::task::spawn_blocking(move || {
            let summary = regenerate(&host);
            (summary, host.into_edits())
        })
        .await;

        let (summary, changes) = match outcome {
            Ok((Ok(summary), changes)) => (summary, changes),
            Ok((Err(err), _)) => {
                warn!(error = %err, "workspace scan failed");
                self.client
                    .show_message(MessageType::ERROR, format!("Endpoint comments: {err}"))
                    .await;
                return Ok(None);
            }
            Err(err) => {
                error!(error = %err, "regeneration task failed");
                return Err(jsonrpc::Error::internal_error());
            }
        };

        for failure in summary.failures() {
            if let Some(reason) = &failure.error {
                self.client
                    .log_message(MessageType::WARNING, format!("Endpoint comments: {reason}"))
                    .await;
            }
        }

        if !changes.is_empty() {
            let versioned = self.versioned_edits.load(Ordering::Relaxed);
            let edit = workspace_edit(changes, versioned.then_some(&versions));
            let not_applied = match self.client.apply_edit(edit).await {
                Ok(response) if response.applied => None,
                Ok(response) => Some(
                    response
                        .failure_reason
                        .unwrap_or_else(|| "rejected by the editor".to_string()),
                ),
                Err(err) => Some(err.to_string()),
            };
            if let Some(reason) = not_applied {
                warn!(%reason, "workspace edit not applied");
                self.client
                    .show_message(
                        MessageType::WARNING,
                        format!("Endpoint comments were not applied: {reason}"),
                    )
                    .await;
                return Ok(None);
            }
        }

        let message_type = if summary.failures().next().is_some() {
            MessageType::WARNING
        } else {
            MessageType::INFO
        };
        self.client.show_message(message_type, summary.message()).await;

        Ok(serde_json::to_value(&summary).ok())
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        info!("Endpoint comments LSP server initializing");

        #[allow(deprecated)]
        let legacy_root = params.root_uri.clone();
        let root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .map(|folder| folder.uri.clone())
            .or(legacy_root)
            .and_then(|uri| uri.to_file_path().ok());
        debug!(root = ?root, "workspace root");
        *self.root.write().unwrap_or_else(PoisonError::into_inner) = root;

        let versioned = params
            .capabilities
            .workspace
            .as_ref()
            .and_then(|workspace| workspace.workspace_edit.as_ref())
            .and_then(|edit| edit.document_changes)
            .unwrap_or(false);
        self.versioned_edits.store(versioned, Ordering::Relaxed);

        if let Some(settings) = params.initialization_options.as_ref().and_then(Settings::from_value) {
            self.set_settings(settings);
        }

        Ok(InitializeResult {
            capabilities: server_capabilities(),
            server_info: Some(ServerInfo {
                name: "endpoint-comments-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        info!("Endpoint comments LSP server initialized");

        self.client
            .log_message(MessageType::INFO, "Endpoint comments server ready")
            .await;
    }

    async fn shutdown(&self) -> jsonrpc::Result<()> {
        info!("Endpoint comments LSP server shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        debug!("Document opened: {}", params.text_document.uri);

        self.documents.insert(
            params.text_document.uri,
            DocumentState {
                content: params.text_document.text,
                version: params.text_document.version,
            },
        );
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        debug!("Document changed: {}", params.text_document.uri);

        if let Some(mut doc) = self.documents.get_mut(&params.text_document.uri) {
            // Full sync: the last change carries the whole text
            if let Some(change) = params.content_changes.into_iter().last() {
                doc.content = change.text;
                doc.version = params.text_document.version;
            }
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        debug!("Document closed: {}", params.text_document.uri);

        self.documents.remove(&params.text_document.uri);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        match Settings::from_value(&params.settings) {
            Some(settings) => self.set_settings(settings),
            None => warn!("ignoring malformed endpointComments settings"),
        }
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> jsonrpc::Result<Option<Value>> {
        if params.command != REGENERATE_COMMAND {
            return Err(jsonrpc::Error::invalid_params(format!(
                "unknown command: {}",
                params.command
            )));
        }
        info!("Regenerating endpoint comments");
        self.regenerate_workspace().await
    }

    async fn hover(&self, params: HoverParams) -> jsonrpc::Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        Ok(self
            .open_document(uri)
            .and_then(|(doc, annotator)| self.hover_handler.hover(&doc, &annotator, position)))
    }

    async fn code_action(
        &self,
        params: CodeActionParams,
    ) -> jsonrpc::Result<Option<CodeActionResponse>> {
        let uri = &params.text_document.uri;

        if let Some((doc, annotator)) = self.open_document(uri) {
            let actions = self.code_action_handler.actions(
                &doc,
                uri,
                &annotator,
                params.context.only.as_deref(),
            );
            if !actions.is_empty() {
                return Ok(Some(actions));
            }
        }

        Ok(None)
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> jsonrpc::Result<Option<DocumentSymbolResponse>> {
        let uri = &params.text_document.uri;

        if let Some((doc, annotator)) = self.open_document(uri) {
            let symbols = self.document_symbol_handler.symbols(&doc, uri, &annotator);
            if !symbols.is_empty() {
                return Ok(Some(DocumentSymbolResponse::Flat(symbols)));
            }
        }

        Ok(None)
    }
}
