pub mod builder;
pub mod naked;


pub use builder::{IndexOutcome, build};

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::token::Span;

pub type SymbolId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolKind {
    Label,
    LocalVariable,
    GlobalVariable,
    IntrinsicFunction,
    SpecialVariable,
    StructuredSystemVariable,
}

/// One named entity of the document. `name` carries the sigil for
/// globals (`^X`), intrinsics (`$PIECE`), special variables (`$TEST`)
/// and structured system variables (`^$GLOBAL`); labels and locals are
/// bare.
#[derive(Debug, Clone, Serialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    /// Every reference span, in insertion (source) order.
    pub references: Vec<Span>,
    /// Label declaration, first assignment for locals, first
    /// fully-qualified reference for globals.
    pub declaration: Option<Span>,
    /// Declared parameter list; labels only.
    pub params: Option<Vec<String>>,
    /// Deepest observed subscript count; globals only.
    pub max_subscript_depth: u8,
    /// Whether any reference to this global was naked.
    pub has_naked_ref: bool,
}

/// A global reference with its name resolved (naked references carry the
/// name inherited from the last explicit reference, never the literal
/// omitted one).
#[derive(Debug, Clone, Serialize)]
pub struct GlobalReference {
    pub name: String,
    /// Retained subscript expressions, truncated at the configured
    /// maximum depth. Dynamic expressions stay opaque text.
    pub subscripts: Vec<String>,
    /// Actual parsed subscript count, before truncation.
    pub subscript_count: u8,
    pub was_naked: bool,
    pub span: Span,
}

/// A DO/GOTO/`$$` target in another routine. Cross-file resolution needs a
/// workspace index this crate does not own; only the names are recorded.
#[derive(Debug, Clone, Serialize)]
pub struct ExternalRef {
    pub label: Option<String>,
    pub routine: String,
    pub span: Span,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    pub symbols: Vec<Symbol>,
    by_name: FxHashMap<(SymbolKind, String), SymbolId>,
    pub global_refs: Vec<GlobalReference>,
    /// Label symbols in declaration order.
    pub labels: Vec<SymbolId>,
    pub external_refs: Vec<ExternalRef>,
    /// Name of the first level-0 label, used to recognize
    /// document-local `LABEL^SELF` targets.
    pub routine_name: Option<String>,
}

impl SymbolIndex {
    pub fn lookup(&self, kind: SymbolKind, name: &str) -> Option<&Symbol> {
        self.by_name
            .get(&(kind, name.to_string()))
            .map(|&id| &self.symbols[id])
    }

    pub fn lookup_id(&self, kind: SymbolKind, name: &str) -> Option<SymbolId> {
        self.by_name.get(&(kind, name.to_string())).copied()
    }

    /// Get-or-create a symbol slot.
    pub(crate) fn intern(&mut self, kind: SymbolKind, name: &str) -> SymbolId {
        if let Some(&id) = self.by_name.get(&(kind, name.to_string())) {
            return id;
        }
        let id = self.symbols.len();
        self.symbols.push(Symbol {
            kind,
            name: name.to_string(),
            references: Vec::new(),
            declaration: None,
            params: None,
            max_subscript_depth: 0,
            has_naked_ref: false,
        });
        self.by_name.insert((kind, name.to_string()), id);
        id
    }

    /// Symbol whose reference set covers the cursor. When several kinds
    /// overlap on one token the more specific reference wins by virtue of
    /// spans being recorded per token.
    pub fn symbol_at(&self, line: u32, column: u32) -> Option<&Symbol> {
        self.symbols
            .iter()
            .find(|s| s.references.iter().any(|r| r.contains(line, column)))
    }

    /// Resolved global reference covering the cursor, if any.
    pub fn global_ref_at(&self, line: u32, column: u32) -> Option<&GlobalReference> {
        self.global_refs.iter().find(|g| g.span.contains(line, column))
    }
}
