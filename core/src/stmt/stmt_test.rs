#[cfg(test)]
mod tests {
    use crate::diag::DiagnosticKind;
    use crate::stmt::{Statement, parse};

    fn statements(source: &str) -> Vec<Statement> {
        parse(source).document.statements
    }

    #[test]
    fn abbreviation_and_full_form_parse_identically() {
        let short = statements(" S X=1");
        let long = statements(" SET X=1");
        let a = short[0].principal().unwrap();
        let b = long[0].principal().unwrap();
        assert_eq!(a.canonical, "SET");
        assert_eq!(b.canonical, "SET");
        assert_eq!(a.args.len(), b.args.len());
        assert_eq!(a.args[0].text, b.args[0].text);
    }

    #[test]
    fn label_with_parameters() {
        let stmts = statements("SAVE(ID,DATA) S ^TMP(ID)=DATA Q");
        let label = stmts[0].label.as_ref().unwrap();
        assert_eq!(label.name, "SAVE");
        assert_eq!(label.params, vec!["ID", "DATA"]);
        assert_eq!(stmts[0].level, 0);
    }

    #[test]
    fn command_chain_on_one_line() {
        let stmts = statements(" S X=1 K Y Q");
        let cmds: Vec<&str> = stmts[0].commands.iter().map(|c| c.canonical.as_str()).collect();
        assert_eq!(cmds, vec!["SET", "KILL", "QUIT"]);
        assert_eq!(stmts[0].principal().unwrap().canonical, "SET");
    }

    #[test]
    fn postconditional_recorded_not_evaluated() {
        let stmts = statements(" Q:X>10  W X");
        let q = &stmts[0].commands[0];
        assert_eq!(q.canonical, "QUIT");
        assert_eq!(q.postcondition.as_ref().unwrap().text, "X>10");
        assert!(q.args.is_empty());
    }

    #[test]
    fn commas_inside_subscripts_do_not_split_arguments() {
        let stmts = statements(" S ^PAT(1,\"NM\")=\"A\",X=2");
        let set = stmts[0].principal().unwrap();
        assert_eq!(set.args.len(), 2);
        assert_eq!(set.args[0].text, "^PAT(1,\"NM\")=\"A\"");
        assert_eq!(set.args[1].text, "X=2");
    }

    #[test]
    fn argumentless_command_yields_zero_arguments() {
        let stmts = statements(" Q");
        let q = stmts[0].principal().unwrap();
        assert_eq!(q.canonical, "QUIT");
        assert!(q.args.is_empty());
    }

    #[test]
    fn halt_and_hang_disambiguated_by_arguments() {
        assert_eq!(statements(" H")[0].principal().unwrap().canonical, "HALT");
        assert_eq!(statements(" H 5")[0].principal().unwrap().canonical, "HANG");
    }

    #[test]
    fn dot_levels_counted() {
        let src = "EN ;\n I X D\n . S Y=1\n . . W Y\n";
        let out = parse(src);
        let levels: Vec<u8> = out.document.statements.iter().map(|s| s.level).collect();
        assert_eq!(levels, vec![0, 0, 1, 2]);
        assert!(
            out.diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::SyntaxError),
            "level 2 after a non-opening level 1 statement must be flagged"
        );
    }

    #[test]
    fn nested_blocks_with_openers_are_accepted() {
        let src = "EN ;\n I X D\n . I Y D\n . . S Z=1\n . S W=2\n";
        let out = parse(src);
        assert!(
            out.diagnostics
                .iter()
                .all(|d| d.kind != DiagnosticKind::SyntaxError),
            "unexpected syntax errors: {:?}",
            out.diagnostics
        );
    }

    #[test]
    fn level_jump_without_opener_is_a_syntax_error() {
        let out = parse(" S X=1\n . . W X\n");
        assert!(
            out.diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::SyntaxError)
        );
        // The statement is still produced for downstream providers.
        assert_eq!(out.document.statements.len(), 2);
    }

    #[test]
    fn dots_only_line_is_a_block_continuation_no_op() {
        let out = parse(" I X D\n . S Y=1\n . \n . S Z=2\n");
        let stmts = &out.document.statements;
        assert_eq!(stmts.len(), 4);
        assert_eq!(stmts[2].level, 1);
        assert!(stmts[2].commands.is_empty());
        assert!(
            out.diagnostics
                .iter()
                .all(|d| d.kind != DiagnosticKind::SyntaxError)
        );
    }

    #[test]
    fn unknown_command_reported_but_statement_survives() {
        let out = parse(" FROBNICATE X=1");
        assert!(
            out.diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::UnknownSymbol)
        );
        let stmt = &out.document.statements[0];
        assert_eq!(stmt.principal().unwrap().canonical, "FROBNICATE");
        assert!(!stmt.principal().unwrap().known);
    }

    #[test]
    fn blank_and_comment_lines_have_no_statement() {
        let out = parse("\n ;only a comment\nEN S X=1\n");
        assert_eq!(out.document.statements.len(), 1);
        assert!(out.document.lines[0].statement.is_none());
        assert!(out.document.lines[1].statement.is_none());
        assert!(out.document.lines[2].statement.is_some());
    }

    #[test]
    fn unterminated_string_degrades_to_lex_error() {
        let out = parse(" S X=\"abc\n S Y=1\n");
        assert!(
            out.diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::LexError)
        );
        assert_eq!(out.document.statements.len(), 2);
    }

    #[test]
    fn statement_at_line_lookup() {
        let out = parse("EN ;\n S X=1\n");
        assert!(out.document.statement_at_line(1).is_some());
        assert_eq!(
            out.document.statement_at_line(1).unwrap().principal().unwrap().canonical,
            "SET"
        );
    }
}
