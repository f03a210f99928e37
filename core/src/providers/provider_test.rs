#[cfg(test)]
mod tests {
    use tokio_util::sync::CancellationToken;

    use crate::providers::{CompletionKind, QueryResult, completion, definition, hover, outline, references};
    use crate::store::{Snapshot, analyze_text};

    fn snap(source: &str) -> Snapshot {
        analyze_text("file:///test.m", source, 1, 10)
    }

    const ROUTINE: &str = "\
PATIENT ;patient record handling
 S ^PATIENT(1,\"NAME\")=\"Smith\"
 S ^(\"DOB\")=56789
 D SAVE(1,X)
 Q
SAVE(ID,DATA) ;store one field
 S ^TMP(ID)=DATA
 Q
";

    #[test]
    fn completion_after_dollar_offers_functions_and_special_vars() {
        let s = snap(" S X=$\n");
        let items = completion::complete(&s, 1, 7);
        assert!(items.iter().any(|i| i.label == "$PIECE"));
        assert!(items.iter().any(|i| i.label == "$HOROLOG"));
        assert!(items.iter().all(|i| i.kind != CompletionKind::Command));
        let piece = items.iter().find(|i| i.label == "$PIECE").unwrap();
        assert_eq!(piece.insert_text.as_deref(), Some("PIECE"));
    }

    #[test]
    fn completion_after_caret_offers_ssvns_and_document_globals() {
        let s = snap(" S ^PATIENT(1)=2 W ^\n");
        let items = completion::complete(&s, 1, 21);
        assert!(items.iter().any(|i| i.label == "^$GLOBAL"));
        assert!(
            items
                .iter()
                .any(|i| i.label == "^PATIENT" && i.kind == CompletionKind::Global)
        );
    }

    #[test]
    fn completion_default_offers_commands_and_labels() {
        let s = snap(ROUTINE);
        let items = completion::complete(&s, 5, 2);
        assert!(items.iter().any(|i| i.label == "SET" && i.kind == CompletionKind::Command));
        assert!(items.iter().any(|i| i.label == "S" && i.kind == CompletionKind::Command));
        assert!(items.iter().any(|i| i.label == "SAVE" && i.kind == CompletionKind::Label));
    }

    #[test]
    fn completion_after_do_offers_labels_with_arity() {
        // Cursor after ` D ` on a fresh line 9.
        let s = snap(&format!("{ROUTINE} D \n"));
        let items = completion::complete(&s, 9, 4);
        assert!(items.iter().all(|i| i.kind == CompletionKind::Label));
        let save = items.iter().find(|i| i.label == "SAVE").unwrap();
        assert!(save.detail.as_deref().unwrap().contains("(ID,DATA)"));
    }

    #[test]
    fn hover_command_shows_canonical_form() {
        let s = snap(" S X=1\n");
        let h = hover::hover(&s, 1, 2).unwrap();
        assert!(h.markdown.contains("**S** (SET)"));
        assert!(h.markdown.contains("Assign values"));
    }

    #[test]
    fn hover_full_command_shows_abbreviation() {
        let s = snap(" SET X=1\n");
        let h = hover::hover(&s, 1, 3).unwrap();
        assert!(h.markdown.contains("**SET** (abbrev: S)"));
    }

    #[test]
    fn hover_postconditional_is_surfaced() {
        let s = snap(" Q:X>10\n");
        let h = hover::hover(&s, 1, 2).unwrap();
        assert!(h.markdown.contains("Postcondition: `X>10`"));
    }

    #[test]
    fn hover_intrinsic_expands_abbreviation() {
        let s = snap(" S X=$P(Y,\",\")\n");
        let h = hover::hover(&s, 1, 7).unwrap();
        assert!(h.markdown.contains("**$P** ($PIECE)"));
        assert!(h.markdown.contains("Intrinsic function"));
    }

    #[test]
    fn hover_label_shows_parameters() {
        let s = snap(ROUTINE);
        let h = hover::hover(&s, 6, 1).unwrap();
        assert!(h.markdown.contains("**SAVE**"));
        assert!(h.markdown.contains("Parameters: ID, DATA"));
    }

    #[test]
    fn hover_naked_reference_shows_resolved_target() {
        let s = snap(ROUTINE);
        // Line 3 column 4 sits on `^(` of the naked reference.
        let h = hover::hover(&s, 3, 4).unwrap();
        assert!(h.markdown.contains("**^PATIENT**"));
        assert!(
            h.markdown.contains("Naked reference resolving to ^PATIENT(1,\"DOB\")"),
            "got: {}",
            h.markdown
        );
    }

    #[test]
    fn definition_of_label_reference_is_its_declaration() {
        let s = snap(ROUTINE);
        // `SAVE` on the DO line.
        let span = definition::definition(&s, 4, 4).unwrap();
        assert_eq!(span.start.line, 6);
        assert_eq!(span.start.column, 1);
    }

    #[test]
    fn definition_of_global_is_first_qualified_reference() {
        let s = snap(ROUTINE);
        // Cursor on the naked reference resolves to ^PATIENT, whose
        // definition is its first fully-qualified reference on line 2.
        let span = definition::definition(&s, 3, 4).unwrap();
        assert_eq!(span.start.line, 2);
    }

    #[test]
    fn references_include_naked_spans() {
        let s = snap(ROUTINE);
        let cancel = CancellationToken::new();
        // Cursor on `^PATIENT` on line 2.
        let refs = match references::references(&s, 2, 5, &cancel) {
            QueryResult::Complete(r) => r,
            QueryResult::Cancelled => panic!("not cancelled"),
        };
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].start.line, 2);
        assert_eq!(refs[1].start.line, 3);
    }

    #[test]
    fn cancelled_reference_query_returns_promptly() {
        let s = snap(ROUTINE);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(references::references(&s, 2, 5, &cancel), QueryResult::Cancelled);
    }

    #[test]
    fn outline_lists_labels_in_source_order() {
        let s = snap("PATIENT ;\nSEARCH ;\nGET ;\nSAVE ;\nDELETE ;\nLIST ;\n");
        let outline = outline::outline(&s);
        let names: Vec<&str> = outline.iter().map(|e| e.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["PATIENT", "SEARCH", "GET", "SAVE", "DELETE", "LIST"]);
    }

    #[test]
    fn outline_entry_spans_run_to_next_label() {
        let s = snap(ROUTINE);
        let entries = outline::outline(&s);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "PATIENT");
        assert_eq!(entries[0].span.start.line, 1);
        assert_eq!(entries[0].span.end.line, 5);
        assert_eq!(entries[1].name, "SAVE");
        assert!(entries[1].detail.as_deref().unwrap().contains("ID,DATA"));
    }
}
