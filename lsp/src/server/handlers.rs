use ropey::Rope;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::LanguageServer;
use tracing::info;

use mls_core::providers::{CompletionKind, QueryResult};

use super::state::{DocumentBuffer, MumpsLanguageServer};
use super::text::{
    apply_incremental_change_rope, core_diagnostic_to_lsp, core_span_to_range, lsp_to_core_position,
};

#[tower_lsp::async_trait]
impl LanguageServer for MumpsLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("MUMPS language server initializing for {:?}", params.root_uri);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::INCREMENTAL)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(vec![
                        "$".to_string(),
                        "^".to_string(),
                        ".".to_string(),
                    ]),
                    work_done_progress_options: Default::default(),
                    all_commit_characters: None,
                    completion_item: None,
                }),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "MUMPS Language Server".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("MUMPS language server initialized");
        let _ = self
            .client
            .log_message(MessageType::INFO, "MUMPS language server started")
            .await;
        self.load_config().await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("MUMPS language server shutting down");
        Ok(())
    }

    async fn did_change_configuration(&self, _params: DidChangeConfigurationParams) {
        self.load_config().await;
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        let text = params.text_document.text;

        self.buffers.insert(
            uri.clone(),
            DocumentBuffer {
                content: Rope::from_str(&text),
                version,
            },
        );
        self.reanalyze(&uri, &text, version).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        let text = {
            let mut entry = self.buffers.entry(uri.clone()).or_default();
            entry.version = version;
            if params.content_changes.len() == 1 && params.content_changes[0].range.is_none() {
                let change = params.content_changes.into_iter().next().unwrap();
                entry.content = Rope::from_str(&change.text);
            } else {
                for change in params.content_changes {
                    apply_incremental_change_rope(&mut entry.content, &change);
                }
            }
            entry.content.to_string()
        };

        self.supersede_queries(&uri);
        self.reanalyze(&uri, &text, version).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.supersede_queries(&uri);
        self.buffers.remove(&uri);
        self.engine.close(uri.as_str());
        let _ = self
            .client
            .publish_diagnostics(uri, Vec::new(), None)
            .await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let Some((line, column)) = self.core_position(uri, position) else {
            return Ok(None);
        };

        let items: Vec<CompletionItem> = self
            .engine
            .complete(uri.as_str(), line, column)
            .into_iter()
            .map(|item| CompletionItem {
                label: item.label,
                kind: Some(match item.kind {
                    CompletionKind::Command => CompletionItemKind::KEYWORD,
                    CompletionKind::Function => CompletionItemKind::FUNCTION,
                    CompletionKind::Label => CompletionItemKind::FUNCTION,
                    CompletionKind::Variable | CompletionKind::Global => CompletionItemKind::VARIABLE,
                }),
                detail: item.detail,
                documentation: item.documentation.map(Documentation::String),
                insert_text: item.insert_text,
                ..Default::default()
            })
            .collect();

        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::Array(items)))
        }
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some((line, column)) = self.core_position(uri, position) else {
            return Ok(None);
        };

        Ok(self.engine.hover(uri.as_str(), line, column).map(|h| Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: h.markdown,
            }),
            range: h.span.as_ref().map(core_span_to_range),
        }))
    }

    async fn goto_definition(&self, params: GotoDefinitionParams) -> Result<Option<GotoDefinitionResponse>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some((line, column)) = self.core_position(uri, position) else {
            return Ok(None);
        };

        Ok(self
            .engine
            .definition(uri.as_str(), line, column)
            .map(|span| GotoDefinitionResponse::Scalar(Location::new(uri.clone(), core_span_to_range(&span)))))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let Some((line, column)) = self.core_position(uri, position) else {
            return Ok(None);
        };

        let cancel = self.query_token(uri);
        match self.engine.references(uri.as_str(), line, column, &cancel) {
            QueryResult::Complete(spans) => Ok(Some(
                spans
                    .iter()
                    .map(|s| Location::new(uri.clone(), core_span_to_range(s)))
                    .collect(),
            )),
            QueryResult::Cancelled => Ok(None),
        }
    }

    async fn document_symbol(&self, params: DocumentSymbolParams) -> Result<Option<DocumentSymbolResponse>> {
        let uri = &params.text_document.uri;
        let entries = self.engine.outline(uri.as_str());
        if entries.is_empty() {
            return Ok(None);
        }

        #[allow(deprecated)]
        let symbols: Vec<DocumentSymbol> = entries
            .into_iter()
            .map(|e| DocumentSymbol {
                name: e.name,
                detail: e.detail,
                kind: SymbolKind::FUNCTION,
                tags: None,
                deprecated: None,
                range: core_span_to_range(&e.span),
                selection_range: core_span_to_range(&e.selection_span),
                children: None,
            })
            .collect();
        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }
}

impl MumpsLanguageServer {
    async fn reanalyze(&self, uri: &Url, text: &str, version: i32) {
        let diagnostics = self.engine.analyze(uri.as_str(), text, version);
        let lsp_diags: Vec<Diagnostic> = diagnostics.iter().map(core_diagnostic_to_lsp).collect();
        let _ = self
            .client
            .publish_diagnostics(uri.clone(), lsp_diags, Some(version))
            .await;
    }

    fn core_position(&self, uri: &Url, position: Position) -> Option<(u32, u32)> {
        let buffer = self.buffers.get(uri)?;
        Some(lsp_to_core_position(&buffer.content, position))
    }
}
