use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use url::Url;

use mls_core::diag::{Diagnostic, DiagnosticKind, Severity};
use mls_core::providers::QueryResult;
use mls_core::{Analyzer, AnalyzerConfig};

/// Minimal stand-in for the LSP transport: tracks open buffers and feeds
/// full text into the analysis engine the way didOpen/didChange do.
struct TestLanguageServer {
    engine: Analyzer,
    documents: Arc<RwLock<HashMap<Url, i32>>>,
}

impl TestLanguageServer {
    fn new() -> Self {
        Self {
            engine: Analyzer::new(),
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn with_config(config: AnalyzerConfig) -> Self {
        Self {
            engine: Analyzer::with_config(config),
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn open_document(&self, uri: &Url, content: &str) -> Vec<Diagnostic> {
        self.documents.write().await.insert(uri.clone(), 1);
        self.engine.analyze(uri.as_str(), content, 1)
    }

    async fn update_document(&self, uri: &Url, content: &str) -> Vec<Diagnostic> {
        let mut docs = self.documents.write().await;
        let version = docs.entry(uri.clone()).or_insert(0);
        *version += 1;
        self.engine.analyze(uri.as_str(), content, *version)
    }

    async fn close_document(&self, uri: &Url) {
        self.documents.write().await.remove(uri);
        self.engine.close(uri.as_str());
    }
}

const PATIENT_ROUTINE: &str = "\
PATIENT ;patient record handling
 S ^PATIENT(1,\"NAME\")=\"Smith\"
 S ^(\"DOB\")=56789
 D SAVE(1,X)
 Q
SAVE(ID,DATA) ;store one field
 S ^TMP(ID)=DATA
 Q
";

#[tokio::test]
async fn clean_routine_produces_no_diagnostics() {
    let server = TestLanguageServer::new();
    let uri = Url::parse("file:///PATIENT.m").unwrap();

    let diagnostics = server.open_document(&uri, PATIENT_ROUTINE).await;
    assert!(
        diagnostics.is_empty(),
        "expected clean analysis, got {diagnostics:?}"
    );
}

#[tokio::test]
async fn unterminated_string_is_recovered_with_a_diagnostic() {
    let server = TestLanguageServer::new();
    let uri = Url::parse("file:///bad.m").unwrap();

    let diagnostics = server.open_document(&uri, " S X=\"oops\n S Y=1\n").await;
    assert!(diagnostics.iter().any(|d| d.kind == DiagnosticKind::LexError));
    // The second line still analyzed: Y is indexed.
    let snap = server.engine.snapshot(uri.as_str()).unwrap();
    assert!(
        snap.index
            .lookup(mls_core::index::SymbolKind::LocalVariable, "Y")
            .is_some()
    );
}

#[tokio::test]
async fn abbreviated_and_full_commands_analyze_identically() {
    let server = TestLanguageServer::new();
    let short = Url::parse("file:///short.m").unwrap();
    let long = Url::parse("file:///long.m").unwrap();

    server.open_document(&short, "EN S X=1 Q\n").await;
    server.open_document(&long, "EN SET X=1 QUIT\n").await;

    let a = server.engine.snapshot(short.as_str()).unwrap();
    let b = server.engine.snapshot(long.as_str()).unwrap();
    let ca: Vec<&str> = a.document.statements[0]
        .commands
        .iter()
        .map(|c| c.canonical.as_str())
        .collect();
    let cb: Vec<&str> = b.document.statements[0]
        .commands
        .iter()
        .map(|c| c.canonical.as_str())
        .collect();
    assert_eq!(ca, cb);
    assert_eq!(
        a.document.statements[0].commands[0].args[0].text,
        b.document.statements[0].commands[0].args[0].text
    );
}

#[tokio::test]
async fn naked_reference_hover_reports_resolved_target() {
    let server = TestLanguageServer::new();
    let uri = Url::parse("file:///PATIENT.m").unwrap();
    server.open_document(&uri, PATIENT_ROUTINE).await;

    let hover = server.engine.hover(uri.as_str(), 3, 4).expect("hover on naked ref");
    assert!(hover.markdown.contains("^PATIENT(1,\"DOB\")"), "got {}", hover.markdown);
}

#[tokio::test]
async fn naked_scope_does_not_cross_routine_boundaries() {
    let server = TestLanguageServer::new();
    let uri = Url::parse("file:///reset.m").unwrap();

    let diagnostics = server
        .open_document(&uri, "FIRST S ^X(1)=1\n Q\nSECOND S ^(2)=2\n Q\n")
        .await;
    assert!(
        diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::UnresolvedNakedReference)
    );
}

#[tokio::test]
async fn nesting_level_jump_is_reported() {
    let server = TestLanguageServer::new();
    let uri = Url::parse("file:///nest.m").unwrap();

    let diagnostics = server.open_document(&uri, "EN S X=1\n . . W X\n").await;
    assert!(
        diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::SyntaxError && d.severity == Severity::Error)
    );
}

#[tokio::test]
async fn arity_mismatch_is_a_warning_not_a_resolution_failure() {
    let server = TestLanguageServer::new();
    let uri = Url::parse("file:///arity.m").unwrap();

    let diagnostics = server
        .open_document(&uri, "EN D SAVE(1) Q\nSAVE(ID,DATA) Q\n")
        .await;
    assert!(
        diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::ArityMismatch && d.severity == Severity::Warning)
    );
    // Definition still resolves to the SAVE declaration.
    let span = server.engine.definition(uri.as_str(), 1, 6).unwrap();
    assert_eq!(span.start.line, 2);
}

#[tokio::test]
async fn outline_preserves_source_order() {
    let server = TestLanguageServer::new();
    let uri = Url::parse("file:///outline.m").unwrap();
    server
        .open_document(&uri, "PATIENT ;\nSEARCH ;\nGET ;\nSAVE ;\nDELETE ;\nLIST ;\n")
        .await;

    let names: Vec<String> = server
        .engine
        .outline(uri.as_str())
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["PATIENT", "SEARCH", "GET", "SAVE", "DELETE", "LIST"]);
}

#[tokio::test]
async fn configured_depth_limits_subscript_retention() {
    let server = TestLanguageServer::with_config(AnalyzerConfig { max_global_depth: 2 });
    let uri = Url::parse("file:///deep.m").unwrap();

    let diagnostics = server.open_document(&uri, " S ^A(1,2,3,4)=5\n").await;
    assert!(diagnostics.iter().all(|d| d.kind != DiagnosticKind::SyntaxError));

    let snap = server.engine.snapshot(uri.as_str()).unwrap();
    let gref = &snap.index.global_refs[0];
    assert_eq!(gref.subscripts, vec!["1", "2"]);
    assert_eq!(gref.subscript_count, 4);
}

#[tokio::test]
async fn reanalysis_at_new_version_is_structurally_identical() {
    let server = TestLanguageServer::new();
    let uri = Url::parse("file:///idem.m").unwrap();

    server.open_document(&uri, PATIENT_ROUTINE).await;
    let first = server.engine.snapshot(uri.as_str()).unwrap();
    server.update_document(&uri, PATIENT_ROUTINE).await;
    let second = server.engine.snapshot(uri.as_str()).unwrap();

    assert_eq!(second.version, first.version + 1);
    assert_eq!(first.index.symbols.len(), second.index.symbols.len());
    for (a, b) in first.index.symbols.iter().zip(second.index.symbols.iter()) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.references, b.references);
        assert_eq!(a.declaration, b.declaration);
    }
}

#[tokio::test]
async fn references_cover_naked_spans_and_respect_cancellation() {
    let server = TestLanguageServer::new();
    let uri = Url::parse("file:///refs.m").unwrap();
    server.open_document(&uri, PATIENT_ROUTINE).await;

    let cancel = CancellationToken::new();
    let refs = server
        .engine
        .references(uri.as_str(), 2, 5, &cancel)
        .into_option()
        .unwrap();
    assert_eq!(refs.len(), 2);

    cancel.cancel();
    assert_eq!(
        server.engine.references(uri.as_str(), 2, 5, &cancel),
        QueryResult::Cancelled
    );
}

#[tokio::test]
async fn update_supersedes_previous_snapshot_for_queries() {
    let server = TestLanguageServer::new();
    let uri = Url::parse("file:///upd.m").unwrap();

    server.open_document(&uri, "EN S OLD=1 Q\n").await;
    server.update_document(&uri, "EN S FRESH=1 Q\n").await;

    let snap = server.engine.snapshot(uri.as_str()).unwrap();
    use mls_core::index::SymbolKind;
    assert!(snap.index.lookup(SymbolKind::LocalVariable, "OLD").is_none());
    assert!(snap.index.lookup(SymbolKind::LocalVariable, "FRESH").is_some());
}

#[tokio::test]
async fn closed_document_answers_queries_empty() {
    let server = TestLanguageServer::new();
    let uri = Url::parse("file:///closed.m").unwrap();

    server.open_document(&uri, PATIENT_ROUTINE).await;
    server.close_document(&uri).await;

    assert!(server.engine.snapshot(uri.as_str()).is_none());
    assert!(server.engine.outline(uri.as_str()).is_empty());
    assert!(server.engine.complete(uri.as_str(), 1, 1).is_empty());
}

#[tokio::test]
async fn independent_documents_analyze_independently() {
    let server = TestLanguageServer::new();
    let a = Url::parse("file:///a.m").unwrap();
    let b = Url::parse("file:///b.m").unwrap();

    let (da, db) = tokio::join!(
        server.open_document(&a, "A S ^G(1)=1\n"),
        server.open_document(&b, " S ^(9)=1\n"),
    );
    assert!(da.is_empty());
    assert!(db.iter().any(|d| d.kind == DiagnosticKind::UnresolvedNakedReference));
}
