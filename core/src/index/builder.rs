use rustc_hash::FxHashSet;
use tracing::debug;

use crate::diag::{Diagnostic, DiagnosticKind};
use crate::index::naked::{self, RawGlobalRef};
use crate::index::{ExternalRef, SymbolIndex, SymbolKind};
use crate::lang;
use crate::stmt::{ArgExpr, Document};
use crate::token::{Span, TokenKind, slice_chars};

#[derive(Debug, Default)]
pub struct IndexOutcome {
    pub index: SymbolIndex,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build the symbol index for a fully parsed document. Two passes: labels
/// first (call targets may precede their declaration), then a
/// source-ordered walk of every command's arguments, followed by the
/// naked-reference fold.
pub fn build(document: &Document, text: &str, max_global_depth: usize) -> IndexOutcome {
    let mut b = Builder {
        doc: document,
        text,
        index: SymbolIndex::default(),
        diags: Vec::new(),
        raw_globals: Vec::new(),
        routine_starts: Vec::new(),
        consumed: FxHashSet::default(),
        line: 0,
    };
    b.collect_labels();
    b.walk_statements();

    let resolved = naked::resolve(&b.raw_globals, &b.routine_starts, max_global_depth);
    for gref in &resolved.refs {
        let display = format!("^{}", gref.name);
        let id = b.index.intern(SymbolKind::GlobalVariable, &display);
        let sym = &mut b.index.symbols[id];
        sym.references.push(gref.span.clone());
        if !gref.was_naked && sym.declaration.is_none() {
            sym.declaration = Some(gref.span.clone());
        }
        sym.max_subscript_depth = sym.max_subscript_depth.max(gref.subscript_count);
        sym.has_naked_ref |= gref.was_naked;
    }
    b.index.global_refs = resolved.refs;
    b.diags.extend(resolved.diagnostics);

    debug!(
        symbols = b.index.symbols.len(),
        globals = b.index.global_refs.len(),
        "built symbol index"
    );
    IndexOutcome {
        index: b.index,
        diagnostics: b.diags,
    }
}

struct Builder<'a> {
    doc: &'a Document,
    text: &'a str,
    index: SymbolIndex,
    diags: Vec<Diagnostic>,
    raw_globals: Vec<RawGlobalRef>,
    /// 0-based lines holding level-0 labels, ascending.
    routine_starts: Vec<u32>,
    /// Token indices claimed by entryref parsing; the generic walker
    /// skips them so `^ROUT` in `DO FOO^ROUT` is not indexed as a global.
    consumed: FxHashSet<usize>,
    line: u32,
}

impl<'a> Builder<'a> {
    fn collect_labels(&mut self) {
        for stmt in &self.doc.statements {
            let Some(label) = &stmt.label else { continue };
            if stmt.level == 0 {
                self.routine_starts.push(stmt.line);
            }
            let id = self.index.intern(SymbolKind::Label, &label.name);
            let sym = &mut self.index.symbols[id];
            if sym.declaration.is_some() {
                // MUMPS tolerates redeclaration at runtime; the index
                // keeps the first and flags the ambiguity.
                sym.references.push(label.span.clone());
                self.diags.push(Diagnostic::warning(
                    DiagnosticKind::AmbiguousLabel,
                    format!("label {} declared more than once", label.name),
                    label.span.clone(),
                ));
            } else {
                sym.declaration = Some(label.span.clone());
                sym.params = Some(label.params.clone());
                sym.references.push(label.span.clone());
                self.index.labels.push(id);
            }
        }
        self.index.routine_name = self
            .index
            .labels
            .first()
            .map(|&id| self.index.symbols[id].name.clone());
    }

    fn walk_statements(&mut self) {
        for si in 0..self.doc.statements.len() {
            let stmt = &self.doc.statements[si];
            self.line = stmt.line;
            if stmt.label.is_some() {
                self.declare_label_params(stmt.line);
            }
            let commands: Vec<_> = stmt
                .commands
                .iter()
                .map(|c| (c.canonical.clone(), c.postcondition.clone(), c.args.clone()))
                .collect();
            for (canonical, postcondition, args) in commands {
                if let Some(post) = &postcondition {
                    self.scan_tokens(post.tokens, false);
                }
                match canonical.as_str() {
                    "SET" | "MERGE" | "FOR" => {
                        for arg in &args {
                            self.scan_assignment(arg);
                        }
                    }
                    "NEW" | "KILL" | "READ" => {
                        for arg in &args {
                            self.scan_target_list(arg);
                        }
                    }
                    "DO" | "GOTO" | "JOB" => {
                        for arg in &args {
                            self.scan_entryref(arg);
                        }
                    }
                    _ => {
                        for arg in &args {
                            self.scan_tokens(arg.tokens, false);
                        }
                    }
                }
            }
        }
    }

    /// Formal parameters behave like NEW'd locals scoped to the label.
    fn declare_label_params(&mut self, line: u32) {
        let (lo, hi) = self.doc.lines[line as usize].tokens;
        let mut i = lo;
        if i >= hi || self.doc.tokens[i].kind != TokenKind::Ident {
            return;
        }
        i += 1;
        if i >= hi || self.doc.tokens[i].kind != TokenKind::LParen {
            return;
        }
        i += 1;
        while i < hi && self.doc.tokens[i].kind != TokenKind::RParen {
            if self.doc.tokens[i].kind == TokenKind::Ident {
                let name = self.doc.tokens[i].text.clone();
                let span = self.doc.tokens[i].span.clone();
                self.record_local(&name, span, true);
            }
            i += 1;
        }
    }

    /// `target=expr` argument of SET/MERGE/FOR: idents left of the `=`
    /// are assignment positions, the right side is an expression.
    fn scan_assignment(&mut self, arg: &ArgExpr) {
        let (lo, hi) = arg.tokens;
        let mut depth = 0i32;
        let mut eq = None;
        for i in lo..hi {
            match self.doc.tokens[i].kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth -= 1,
                TokenKind::Operator if depth == 0 && self.doc.tokens[i].text == "=" => {
                    eq = Some(i);
                    break;
                }
                _ => {}
            }
        }
        match eq {
            Some(eq) => {
                // `(A,B)=expr` multi-set: targets live one paren deep.
                let lhs = (lo, eq);
                if self.doc.tokens[lo].kind == TokenKind::LParen
                    && eq > lo + 1
                    && self.doc.tokens[eq - 1].kind == TokenKind::RParen
                {
                    self.scan_tokens((lo + 1, eq - 1), true);
                } else {
                    self.scan_tokens(lhs, true);
                }
                self.scan_tokens((eq + 1, hi), false);
            }
            None => self.scan_tokens((lo, hi), false),
        }
    }

    /// NEW/KILL/READ argument: bare names are assignment positions;
    /// `(A,B)` exclusive forms unwrap one paren level.
    fn scan_target_list(&mut self, arg: &ArgExpr) {
        let (lo, hi) = arg.tokens;
        if lo < hi
            && self.doc.tokens[lo].kind == TokenKind::LParen
            && self.doc.tokens[hi - 1].kind == TokenKind::RParen
        {
            self.scan_tokens((lo + 1, hi - 1), true);
        } else {
            self.scan_tokens((lo, hi), true);
        }
    }

    /// DO/GOTO/JOB argument: `LABEL`, `LABEL^ROUTINE`, `^ROUTINE`, with
    /// optional offset, actual-parameter list, and postconditional.
    fn scan_entryref(&mut self, arg: &ArgExpr) {
        let (lo, hi) = arg.tokens;
        let mut i = lo;
        if i >= hi {
            return;
        }
        if self.doc.tokens[i].kind == TokenKind::Indirection {
            // `DO @VAR` — the target is dynamic, only the variable read
            // is indexable.
            self.scan_tokens((lo, hi), false);
            return;
        }

        let mut label_tok = None;
        if self.doc.tokens[i].kind == TokenKind::Ident {
            label_tok = Some(i);
            self.consumed.insert(i);
            i += 1;
            // Line offset `LABEL+n`: the offset itself carries no symbol.
            while i < hi
                && (self.doc.tokens[i].kind == TokenKind::Number
                    || (self.doc.tokens[i].kind == TokenKind::Operator && self.doc.tokens[i].text == "+"))
            {
                i += 1;
            }
        }
        let mut routine_tok = None;
        if i + 1 < hi
            && self.doc.tokens[i].kind == TokenKind::GlobalSigil
            && self.doc.tokens[i + 1].kind == TokenKind::Ident
        {
            routine_tok = Some(i + 1);
            self.consumed.insert(i);
            self.consumed.insert(i + 1);
            i += 2;
        }

        let mut call_argc = None;
        if i < hi && self.doc.tokens[i].kind == TokenKind::LParen {
            call_argc = Some(self.count_call_args(i, hi));
        }

        self.resolve_label_call(label_tok, routine_tok, call_argc, &arg.span);
        // Actual parameters and any argument postconditional are plain
        // expressions.
        self.scan_tokens((i, hi), false);
    }

    fn count_call_args(&self, lparen: usize, hi: usize) -> usize {
        let mut depth = 0i32;
        let mut commas = 0usize;
        let mut any = false;
        for i in lparen..hi {
            match self.doc.tokens[i].kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                TokenKind::Comma if depth == 1 => commas += 1,
                _ => any = true,
            }
        }
        if !any && commas == 0 { 0 } else { commas + 1 }
    }

    fn resolve_label_call(
        &mut self,
        label_tok: Option<usize>,
        routine_tok: Option<usize>,
        call_argc: Option<usize>,
        arg_span: &Span,
    ) {
        let label = label_tok.map(|i| self.doc.tokens[i].text.clone());
        let routine = routine_tok.map(|i| self.doc.tokens[i].text.clone());

        let is_local = match &routine {
            None => true,
            Some(r) => Some(r) == self.index.routine_name.as_ref(),
        };

        match (label, is_local) {
            (Some(name), true) => {
                let span = self.doc.tokens[label_tok.unwrap()].span.clone();
                match self.index.lookup_id(SymbolKind::Label, &name) {
                    Some(id) => {
                        self.index.symbols[id].references.push(span);
                        if let (Some(argc), Some(params)) = (call_argc, &self.index.symbols[id].params) {
                            if argc != params.len() {
                                self.diags.push(Diagnostic::warning(
                                    DiagnosticKind::ArityMismatch,
                                    format!(
                                        "{} declares {} parameter(s), called with {}",
                                        name,
                                        params.len(),
                                        argc
                                    ),
                                    arg_span.clone(),
                                ));
                            }
                        }
                    }
                    None => self.diags.push(Diagnostic::warning(
                        DiagnosticKind::UnknownSymbol,
                        format!("label {name} not found in this routine"),
                        span,
                    )),
                }
            }
            (label, false) => {
                self.index.external_refs.push(ExternalRef {
                    label,
                    routine: routine.unwrap_or_default(),
                    span: arg_span.clone(),
                });
            }
            (None, true) => {}
        }
    }

    /// The generic expression walker: records globals, structured system
    /// variables, intrinsic/special usages, extrinsic label calls, and
    /// local variables. `target` marks depth-0 idents as assignment
    /// positions.
    fn scan_tokens(&mut self, range: (usize, usize), target: bool) {
        let (lo, hi) = range;
        let mut depth = 0i32;
        let mut i = lo;
        while i < hi {
            if self.consumed.contains(&i) {
                i += 1;
                continue;
            }
            let kind = self.doc.tokens[i].kind;
            match kind {
                TokenKind::LParen => {
                    depth += 1;
                    i += 1;
                }
                TokenKind::RParen => {
                    depth -= 1;
                    i += 1;
                }
                TokenKind::GlobalSigil => i = self.scan_global(i, hi),
                TokenKind::SsvnSigil => i = self.scan_ssvn(i, hi),
                TokenKind::Intrinsic => {
                    let text = self.doc.tokens[i].text.clone();
                    let span = self.doc.tokens[i].span.clone();
                    match lang::lookup_function(&text) {
                        Some(entry) => {
                            let id = self.index.intern(SymbolKind::IntrinsicFunction, entry.name);
                            self.index.symbols[id].references.push(span);
                        }
                        None => self.diags.push(Diagnostic::warning(
                            DiagnosticKind::UnknownSymbol,
                            format!("unknown intrinsic function {text}"),
                            span,
                        )),
                    }
                    i += 1;
                }
                TokenKind::SpecialVar => {
                    let text = self.doc.tokens[i].text.clone();
                    let span = self.doc.tokens[i].span.clone();
                    match lang::lookup_special_var(&text) {
                        Some(entry) => {
                            let id = self.index.intern(SymbolKind::SpecialVariable, entry.name);
                            self.index.symbols[id].references.push(span);
                        }
                        None => self.diags.push(Diagnostic::warning(
                            DiagnosticKind::UnknownSymbol,
                            format!("unknown special variable {text}"),
                            span,
                        )),
                    }
                    i += 1;
                }
                TokenKind::Operator if self.doc.tokens[i].text == "$$" => {
                    i = self.scan_extrinsic(i, hi);
                }
                TokenKind::Ident => {
                    let name = self.doc.tokens[i].text.clone();
                    let span = self.doc.tokens[i].span.clone();
                    // `@NAME` reads the variable holding the indirected
                    // name; it is never itself the assignment target.
                    let after_at = i > lo && self.doc.tokens[i - 1].kind == TokenKind::Indirection;
                    self.record_local(&name, span, target && depth == 0 && !after_at);
                    i += 1;
                }
                _ => i += 1,
            }
        }
    }

    /// `^NAME(...)` fully qualified, or `^(...)` naked. Subscript tokens
    /// are not consumed: the walker keeps scanning inside them so locals
    /// used as subscripts are indexed too.
    fn scan_global(&mut self, caret: usize, hi: usize) -> usize {
        let sigil_span = self.doc.tokens[caret].span.clone();
        if caret + 1 < hi && self.doc.tokens[caret + 1].kind == TokenKind::Ident {
            let name = self.doc.tokens[caret + 1].text.clone();
            let span = Span::new(sigil_span.start, self.doc.tokens[caret + 1].span.end.clone());
            let mut subscripts = Vec::new();
            if caret + 2 < hi && self.doc.tokens[caret + 2].kind == TokenKind::LParen {
                subscripts = self.collect_subscripts(caret + 2, hi);
            }
            self.raw_globals.push(RawGlobalRef {
                name: Some(name),
                subscripts,
                line: self.line,
                span,
            });
            caret + 2
        } else if caret + 1 < hi && self.doc.tokens[caret + 1].kind == TokenKind::LParen {
            let subscripts = self.collect_subscripts(caret + 1, hi);
            let end = self.matching_rparen(caret + 1, hi);
            let span = Span::new(
                sigil_span.start,
                self.doc.tokens[end.min(hi - 1)].span.end.clone(),
            );
            self.raw_globals.push(RawGlobalRef {
                name: None,
                subscripts,
                line: self.line,
                span,
            });
            caret + 1
        } else {
            caret + 1
        }
    }

    fn scan_ssvn(&mut self, sigil: usize, hi: usize) -> usize {
        if sigil + 1 < hi && self.doc.tokens[sigil + 1].kind == TokenKind::Ident {
            let text = format!("^${}", self.doc.tokens[sigil + 1].text);
            let span = Span::new(
                self.doc.tokens[sigil].span.start.clone(),
                self.doc.tokens[sigil + 1].span.end.clone(),
            );
            match lang::lookup_ssvn(&text) {
                Some(entry) => {
                    let id = self.index.intern(SymbolKind::StructuredSystemVariable, entry.name);
                    self.index.symbols[id].references.push(span);
                }
                None => self.diags.push(Diagnostic::warning(
                    DiagnosticKind::UnknownSymbol,
                    format!("unknown structured system variable {text}"),
                    span,
                )),
            }
            sigil + 2
        } else {
            sigil + 1
        }
    }

    /// `$$LABEL` / `$$LABEL^ROUTINE` extrinsic function call.
    fn scan_extrinsic(&mut self, dollars: usize, hi: usize) -> usize {
        let mut i = dollars + 1;
        if i >= hi || self.doc.tokens[i].kind != TokenKind::Ident {
            return i;
        }
        let label_tok = i;
        self.consumed.insert(i);
        i += 1;
        let mut routine_tok = None;
        if i + 1 < hi
            && self.doc.tokens[i].kind == TokenKind::GlobalSigil
            && self.doc.tokens[i + 1].kind == TokenKind::Ident
        {
            routine_tok = Some(i + 1);
            self.consumed.insert(i);
            self.consumed.insert(i + 1);
            i += 2;
        }
        let call_argc = if i < hi && self.doc.tokens[i].kind == TokenKind::LParen {
            Some(self.count_call_args(i, hi))
        } else {
            None
        };
        let span = Span::new(
            self.doc.tokens[dollars].span.start.clone(),
            self.doc.tokens[i - 1].span.end.clone(),
        );
        self.resolve_label_call(Some(label_tok), routine_tok, call_argc, &span);
        i
    }

    fn collect_subscripts(&self, lparen: usize, hi: usize) -> Vec<String> {
        let end = self.matching_rparen(lparen, hi);
        let mut subs = Vec::new();
        let mut depth = 0i32;
        let mut seg_start = lparen + 1;
        for i in lparen..=end.min(hi - 1) {
            match self.doc.tokens[i].kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        if i > seg_start {
                            subs.push(self.slice_tokens(seg_start, i));
                        }
                        break;
                    }
                }
                TokenKind::Comma if depth == 1 => {
                    if i > seg_start {
                        subs.push(self.slice_tokens(seg_start, i));
                    }
                    seg_start = i + 1;
                }
                _ => {}
            }
        }
        if end >= hi && seg_start < hi {
            // Unclosed subscript list: keep what was parsed.
            subs.push(self.slice_tokens(seg_start, hi));
        }
        subs
    }

    fn matching_rparen(&self, lparen: usize, hi: usize) -> usize {
        let mut depth = 0i32;
        for i in lparen..hi {
            match self.doc.tokens[i].kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return i;
                    }
                }
                _ => {}
            }
        }
        hi
    }

    fn slice_tokens(&self, start: usize, end: usize) -> String {
        slice_chars(
            self.text,
            self.doc.tokens[start].span.start.offset,
            self.doc.tokens[end - 1].span.end.offset,
        )
    }

    fn record_local(&mut self, name: &str, span: Span, assignment: bool) {
        let id = self.index.intern(SymbolKind::LocalVariable, name);
        let sym = &mut self.index.symbols[id];
        if assignment && sym.declaration.is_none() {
            sym.declaration = Some(span.clone());
        }
        sym.references.push(span);
    }
}
