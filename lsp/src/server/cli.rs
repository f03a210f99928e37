use anyhow::Context;
use std::path::{Component, Path};

use mls_core::Analyzer;
use mls_core::diag::Severity;

/// One-shot `--analyze [--errors-only] <file>` mode for offline checks.
pub(crate) fn try_cli_analyze() -> anyhow::Result<Option<String>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() <= 1 {
        return Ok(None);
    }

    if let Some(i) = args.iter().position(|a| a == "--analyze") {
        let mut path_index = i + 1;
        while path_index < args.len() && args[path_index].starts_with("--") {
            path_index += 1;
        }

        let path = args.get(path_index).cloned().ok_or_else(|| {
            anyhow::anyhow!(
                "Usage: mls-lsp --analyze [--errors-only] <relative-file-path>\n  --analyze <file>     : Full analysis with JSON output\n  --errors-only        : Show only errors in simple format"
            )
        })?;

        let errors_only = args.iter().any(|a| a == "--errors-only");
        let content = read_file_content(&path)?;

        let engine = Analyzer::new();
        let uri = format!("file://{path}");
        let diagnostics = engine.analyze(&uri, &content, 1);

        if errors_only {
            let errors: Vec<String> = diagnostics
                .iter()
                .filter(|d| d.severity == Severity::Error)
                .map(|d| {
                    format!(
                        "Line {}:{}: {}",
                        d.span.start.line, d.span.start.column, d.message
                    )
                })
                .collect();

            if errors.is_empty() {
                return Ok(Some("No errors found".to_string()));
            }
            return Ok(Some(errors.join("\n")));
        }

        let outline = engine.outline(&uri);
        let snapshot = engine.snapshot(&uri);
        let globals: Vec<_> = snapshot
            .map(|s| s.index.global_refs.clone())
            .unwrap_or_default();

        let output = serde_json::json!({
            "diagnostics": diagnostics,
            "outline": outline,
            "globals": globals,
        });
        return Ok(Some(serde_json::to_string_pretty(&output)?));
    }

    Ok(None)
}

pub(crate) fn is_safe_path(path: &str) -> bool {
    let path = Path::new(path);

    if path.as_os_str().is_empty() {
        return false;
    }
    if path.is_absolute() {
        return false;
    }
    if path.components().any(|c| c == Component::ParentDir) {
        return false;
    }

    let s = path.to_string_lossy();
    let suspicious = ['\0', '\n', '\r', '\t'];
    if s.chars().any(|c| suspicious.contains(&c)) {
        return false;
    }
    if s.len() >= 2 {
        let bytes = s.as_bytes();
        if bytes[1] == b':' {
            return false;
        }
    }
    true
}

pub(crate) fn read_file_content(path: &str) -> anyhow::Result<String> {
    if !is_safe_path(path) {
        return Err(anyhow::anyhow!("Unsafe file path: {}", path));
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file '{}'", path))
}

#[cfg(test)]
mod tests {
    use super::is_safe_path;

    #[test]
    fn rejects_absolute_and_traversal_paths() {
        assert!(!is_safe_path("/etc/passwd"));
        assert!(!is_safe_path("../outside.m"));
        assert!(!is_safe_path(""));
        assert!(is_safe_path("routines/PATIENT.m"));
    }
}
