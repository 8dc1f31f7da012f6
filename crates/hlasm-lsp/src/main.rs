//! `hlasm-lsp` - Language Server Protocol implementation for High Level
//! Assembler.
//!
//! The core (`spec.md` §5) is single-threaded cooperative: one driver owns
//! the orchestrator's `Rc`/`RefCell` state. `tower_lsp::LanguageServer`
//! methods must return `Send` futures, so each method only sends a message
//! (with a `tokio::sync::oneshot` reply channel, which is `Send`) to the
//! orchestrator task running on a dedicated `tokio::task::LocalSet`; the
//! orchestrator task is the only place that actually touches [`Orchestrator`].

mod channel;
mod config;
mod convert;
mod error;
mod queue;
mod request_id;
mod telemetry;

use hlasm_core::location::ResourceLocation;
use hlasm_core::{Library, LibraryOptions};
use hlasm_ide::{complete, document_symbols, find_references, goto_definition, hover, semantic_tokens};
use tokio::sync::{mpsc, oneshot};
use tower_lsp::jsonrpc::Result as RpcResult;
use tower_lsp::lsp_types as lsp;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::info;

use crate::config::WorkspaceSettings;
use crate::convert::{from_lsp_position, location_from_uri, uri_from_location};
use crate::queue::Orchestrator;

/// A unit of work handed from an async `LanguageServer` method to the
/// orchestrator task.
enum Msg {
    OpenWorkspace { root: String },
    RemoveWorkspace { root: String },
    DidOpen { loc: ResourceLocation, version: i32, text: String },
    DidChange { loc: ResourceLocation, version: i32, text: String },
    DidClose { loc: ResourceLocation },
    DidChangeWatchedFiles,
    Definition { loc: ResourceLocation, position: lsp::Position, reply: oneshot::Sender<Option<lsp::GotoDefinitionResponse>> },
    References { loc: ResourceLocation, position: lsp::Position, include_declaration: bool, reply: oneshot::Sender<Vec<lsp::Location>> },
    Hover { loc: ResourceLocation, position: lsp::Position, reply: oneshot::Sender<Option<lsp::Hover>> },
    Completion { loc: ResourceLocation, position: lsp::Position, reply: oneshot::Sender<Vec<lsp::CompletionItem>> },
    DocumentSymbol { loc: ResourceLocation, reply: oneshot::Sender<Vec<lsp::SymbolInformation>> },
    SemanticTokens { loc: ResourceLocation, reply: oneshot::Sender<Vec<lsp::SemanticToken>> },
}

/// The `Send + Sync` half of the server: holds only a channel into the
/// single-threaded orchestrator task.
struct HlasmLanguageServer {
    client: Client,
    tx: mpsc::UnboundedSender<Msg>,
}

impl HlasmLanguageServer {
    fn send(&self, msg: Msg) {
        let _ = self.tx.send(msg);
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for HlasmLanguageServer {
    async fn initialize(&self, params: lsp::InitializeParams) -> RpcResult<lsp::InitializeResult> {
        info!("hlasm-lsp initializing");
        for folder in params.workspace_folders.into_iter().flatten() {
            self.send(Msg::OpenWorkspace { root: folder.uri.to_string() });
        }
        if let Some(root_uri) = params.root_uri {
            self.send(Msg::OpenWorkspace { root: root_uri.to_string() });
        }

        Ok(lsp::InitializeResult {
            capabilities: lsp::ServerCapabilities {
                text_document_sync: Some(lsp::TextDocumentSyncCapability::Kind(lsp::TextDocumentSyncKind::FULL)),
                definition_provider: Some(lsp::OneOf::Left(true)),
                references_provider: Some(lsp::OneOf::Left(true)),
                hover_provider: Some(lsp::HoverProviderCapability::Simple(true)),
                completion_provider: Some(lsp::CompletionOptions::default()),
                document_symbol_provider: Some(lsp::OneOf::Left(true)),
                semantic_tokens_provider: Some(lsp::SemanticTokensServerCapabilities::SemanticTokensOptions(
                    lsp::SemanticTokensOptions {
                        legend: convert::semantic_token_legend(),
                        full: Some(lsp::SemanticTokensFullOptions::Bool(true)),
                        ..Default::default()
                    },
                )),
                workspace: Some(lsp::WorkspaceServerCapabilities {
                    workspace_folders: Some(lsp::WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: Some(lsp::OneOf::Left(true)),
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(lsp::ServerInfo {
                name: "hlasm-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: lsp::InitializedParams) {
        self.client.log_message(lsp::MessageType::INFO, "hlasm-lsp ready").await;
    }

    async fn shutdown(&self) -> RpcResult<()> {
        Ok(())
    }

    async fn did_change_workspace_folders(&self, params: lsp::DidChangeWorkspaceFoldersParams) {
        for added in params.event.added {
            self.send(Msg::OpenWorkspace { root: added.uri.to_string() });
        }
        for removed in params.event.removed {
            self.send(Msg::RemoveWorkspace { root: removed.uri.to_string() });
        }
    }

    async fn did_change_configuration(&self, _: lsp::DidChangeConfigurationParams) {
        self.send(Msg::DidChangeWatchedFiles);
    }

    async fn did_change_watched_files(&self, _: lsp::DidChangeWatchedFilesParams) {
        self.send(Msg::DidChangeWatchedFiles);
    }

    async fn did_open(&self, params: lsp::DidOpenTextDocumentParams) {
        let loc = location_from_uri(&params.text_document.uri);
        self.send(Msg::DidOpen {
            loc,
            version: params.text_document.version,
            text: params.text_document.text,
        });
    }

    async fn did_change(&self, params: lsp::DidChangeTextDocumentParams) {
        let loc = location_from_uri(&params.text_document.uri);
        let Some(change) = params.content_changes.into_iter().next_back() else {
            return;
        };
        self.send(Msg::DidChange {
            loc,
            version: params.text_document.version,
            text: change.text,
        });
    }

    async fn did_close(&self, params: lsp::DidCloseTextDocumentParams) {
        let loc = location_from_uri(&params.text_document.uri);
        self.send(Msg::DidClose { loc });
    }

    async fn goto_definition(&self, params: lsp::GotoDefinitionParams) -> RpcResult<Option<lsp::GotoDefinitionResponse>> {
        let loc = location_from_uri(&params.text_document_position_params.text_document.uri);
        let position = params.text_document_position_params.position;
        let (reply, rx) = oneshot::channel();
        self.send(Msg::Definition { loc, position, reply });
        Ok(rx.await.ok().flatten())
    }

    async fn references(&self, params: lsp::ReferenceParams) -> RpcResult<Option<Vec<lsp::Location>>> {
        let loc = location_from_uri(&params.text_document_position.text_document.uri);
        let position = params.text_document_position.position;
        let include_declaration = params.context.include_declaration;
        let (reply, rx) = oneshot::channel();
        self.send(Msg::References { loc, position, include_declaration, reply });
        Ok(Some(rx.await.unwrap_or_default()))
    }

    async fn hover(&self, params: lsp::HoverParams) -> RpcResult<Option<lsp::Hover>> {
        let loc = location_from_uri(&params.text_document_position_params.text_document.uri);
        let position = params.text_document_position_params.position;
        let (reply, rx) = oneshot::channel();
        self.send(Msg::Hover { loc, position, reply });
        Ok(rx.await.ok().flatten())
    }

    async fn completion(&self, params: lsp::CompletionParams) -> RpcResult<Option<lsp::CompletionResponse>> {
        let loc = location_from_uri(&params.text_document_position.text_document.uri);
        let position = params.text_document_position.position;
        let (reply, rx) = oneshot::channel();
        self.send(Msg::Completion { loc, position, reply });
        let items = rx.await.unwrap_or_default();
        Ok(Some(lsp::CompletionResponse::Array(items)))
    }

    async fn document_symbol(&self, params: lsp::DocumentSymbolParams) -> RpcResult<Option<lsp::DocumentSymbolResponse>> {
        let loc = location_from_uri(&params.text_document.uri);
        let (reply, rx) = oneshot::channel();
        self.send(Msg::DocumentSymbol { loc, reply });
        let symbols = rx.await.unwrap_or_default();
        Ok(Some(lsp::DocumentSymbolResponse::Flat(symbols)))
    }

    async fn semantic_tokens_full(&self, params: lsp::SemanticTokensParams) -> RpcResult<Option<lsp::SemanticTokensResult>> {
        let loc = location_from_uri(&params.text_document.uri);
        let (reply, rx) = oneshot::channel();
        self.send(Msg::SemanticTokens { loc, reply });
        let data = rx.await.unwrap_or_default();
        Ok(Some(lsp::SemanticTokensResult::Tokens(lsp::SemanticTokens { result_id: None, data })))
    }
}

/// `hlasm-ide`'s completion takes an already-extracted prefix rather than a
/// cursor position; this derives the partial name token immediately before
/// the cursor, the same way `textDocument/completion` without an explicit
/// trigger character is conventionally resolved.
fn completion_prefix(workspace: &hlasm_ide::Workspace, loc: &ResourceLocation, position: hlasm_syntax::Position) -> String {
    let is_name_char = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '#' || c == '$' || c == '@' || c == '&';
    let Some(file) = workspace.files().get_file(loc) else {
        return String::new();
    };
    let Some(line) = file.text().lines().nth(position.line as usize) else {
        return String::new();
    };
    let chars: Vec<char> = line.chars().collect();
    let col = (position.column as usize).min(chars.len());
    let mut start = col;
    while start > 0 && is_name_char(chars[start - 1]) {
        start -= 1;
    }
    chars[start..col].iter().collect()
}

/// Runs the orchestrator: the only task that ever touches [`Orchestrator`]
/// directly, satisfying `spec.md` §5's single-driver-thread model.
async fn run_orchestrator(client: Client, mut rx: mpsc::UnboundedReceiver<Msg>) {
    let mut orchestrator = Orchestrator::new();

    while let Some(msg) = rx.recv().await {
        match msg {
            Msg::OpenWorkspace { root } => {
                let id = orchestrator.open_workspace(root.clone(), root.clone());
                let settings = match client.configuration(vec![lsp::ConfigurationItem { scope_uri: lsp::Url::parse(&root).ok(), section: Some("hlasm".to_string()) }]).await {
                    Ok(mut values) if !values.is_empty() => WorkspaceSettings::from_response(values.remove(0)),
                    _ => WorkspaceSettings::empty(),
                };
                apply_settings(&mut orchestrator, id, &settings);
                orchestrator.drain();
            }
            Msg::RemoveWorkspace { root } => {
                for id in orchestrator.real_workspace_ids() {
                    if orchestrator.workspace_root(id) == Some(root.as_str()) {
                        orchestrator.remove_workspace(id);
                    }
                }
            }
            Msg::DidOpen { loc, version, text } => {
                orchestrator.enqueue_file_change(loc, version, Some(text));
                report_diagnostics(&client, orchestrator.drain()).await;
            }
            Msg::DidChange { loc, version, text } => {
                orchestrator.enqueue_file_change(loc, version, Some(text));
                report_diagnostics(&client, orchestrator.drain()).await;
            }
            Msg::DidClose { loc } => {
                orchestrator.enqueue_file_change(loc, 0, None);
                orchestrator.drain();
            }
            Msg::DidChangeWatchedFiles => {
                for id in orchestrator.real_workspace_ids() {
                    orchestrator.refresh_libraries(id);
                }
            }
            Msg::Definition { loc, position, reply } => {
                let ws_id = orchestrator.resolve_workspace(&loc);
                let result = goto_definition(orchestrator.workspace(ws_id), &loc, from_lsp_position(position))
                    .map(convert::goto_definition_response);
                let _ = reply.send(result);
            }
            Msg::References { loc, position, include_declaration, reply } => {
                let ws_id = orchestrator.resolve_workspace(&loc);
                let refs = find_references(orchestrator.workspace(ws_id), &loc, from_lsp_position(position), include_declaration);
                let _ = reply.send(convert::reference_locations(refs));
            }
            Msg::Hover { loc, position, reply } => {
                let ws_id = orchestrator.resolve_workspace(&loc);
                let result = hover(orchestrator.workspace(ws_id), &loc, from_lsp_position(position)).map(|h| convert::hover(h.contents, None));
                let _ = reply.send(result);
            }
            Msg::Completion { loc, position, reply } => {
                let ws_id = orchestrator.resolve_workspace(&loc);
                let prefix = completion_prefix(orchestrator.workspace(ws_id), &loc, from_lsp_position(position));
                let items = complete(orchestrator.workspace(ws_id), &loc, &prefix);
                let _ = reply.send(convert::completion_items(items));
            }
            Msg::DocumentSymbol { loc, reply } => {
                let ws_id = orchestrator.resolve_workspace(&loc);
                let symbols = document_symbols(orchestrator.workspace(ws_id), &loc);
                let _ = reply.send(convert::document_symbols(&loc, symbols));
            }
            Msg::SemanticTokens { loc, reply } => {
                let ws_id = orchestrator.resolve_workspace(&loc);
                let tokens = semantic_tokens(orchestrator.workspace(ws_id), &loc);
                let _ = reply.send(convert::semantic_tokens_data(tokens));
            }
        }
    }
}

fn apply_settings(orchestrator: &mut Orchestrator, id: queue::WorkspaceId, settings: &WorkspaceSettings) {
    match settings.proc_grps() {
        Ok(Some(proc_grps)) => {
            for group in proc_grps.pgroups {
                for lib in group.libs {
                    orchestrator
                        .workspace_mut(id)
                        .add_library(Library::new(lib.path, LibraryOptions { extensions: vec!["hlasm".to_string(), "asm".to_string(), "cpy".to_string()], optional: lib.optional }));
                }
            }
        }
        Ok(None) => {}
        Err(err) => tracing::warn!(%err, "rejecting malformed proc_grps configuration; keeping prior setting"),
    }
}

async fn report_diagnostics(client: &Client, diagnostics: Vec<hlasm_core::Diagnostic>) {
    use rustc_hash::FxHashMap;
    let mut by_file: FxHashMap<ResourceLocation, Vec<lsp::Diagnostic>> = FxHashMap::default();
    for diag in diagnostics {
        by_file.entry(diag.resource.clone()).or_default().push(lsp::Diagnostic {
            range: convert::range(diag.range),
            severity: Some(severity(diag.severity)),
            code: Some(lsp::NumberOrString::String(diag.code.to_string())),
            message: diag.message,
            ..Default::default()
        });
    }
    for (loc, items) in by_file {
        client.publish_diagnostics(uri_from_location(&loc), items, None).await;
    }
}

fn severity(sev: hlasm_core::diagnostics::Severity) -> lsp::DiagnosticSeverity {
    use hlasm_core::diagnostics::Severity;
    match sev {
        Severity::Error => lsp::DiagnosticSeverity::ERROR,
        Severity::Warning => lsp::DiagnosticSeverity::WARNING,
        Severity::Info => lsp::DiagnosticSeverity::INFORMATION,
    }
}

fn main() -> anyhow::Result<()> {
    use anyhow::Context;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build the single-threaded tokio runtime")?;
    let local = tokio::task::LocalSet::new();

    local.block_on(&runtime, async {
        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();
        let (tx, rx) = mpsc::unbounded_channel();

        let (service, socket) = LspService::new(move |client| {
            tokio::task::spawn_local(run_orchestrator(client.clone(), rx));
            HlasmLanguageServer { client, tx }
        });
        info!("hlasm-lsp listening on stdio");
        Server::new(stdin, stdout, socket).serve(service).await;
    });
    Ok(())
}
