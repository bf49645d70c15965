//! kilnc-drv - Compiler Driver
//!
//! Orchestrates the front-end pipeline over one source file:
//!
//! ```text
//! Source (.kn)
//!      │
//!      ▼
//!  [Lexer]  ──▶ tokens + interners     (kilnc-lex)
//!      │
//!      ▼
//!  [Parser] ──▶ AST node arena         (kilnc-par)
//!      │
//!      ▼
//!  [Checker] ──▶ typed AST + casts     (kilnc-sem)
//! ```
//!
//! The driver owns the source buffer for the whole compilation, renders
//! diagnostics as `file:line:col`, a one-line message, and a source
//! excerpt with an underline when the span stays on one line, and maps
//! the result to a process exit code.

use std::path::Path;

use anyhow::{bail, Context, Result};

use kilnc_lex::Lexer;
use kilnc_par::Parser;
use kilnc_sem::{Checker, TypeStore};
use kilnc_util::{Arena, Span, DEFAULT_CAPACITY};

/// Outcome of compiling one file.
#[derive(Debug)]
pub struct CompileReport {
    pub filename: String,
    /// Tokens produced, including the trailing EOF.
    pub token_count: usize,
    /// AST nodes allocated, including analyser-synthesised ones.
    pub node_count: usize,
    /// Distinct semantic types interned.
    pub type_count: usize,
    /// Rendered diagnostics, in detection order.
    pub diagnostics: Vec<String>,
}

impl CompileReport {
    pub fn success(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Compile a source buffer. Never fails: problems end up in the report's
/// diagnostics.
pub fn compile_source(source: &str, filename: &str) -> CompileReport {
    let mut report = CompileReport {
        filename: filename.to_string(),
        token_count: 0,
        node_count: 0,
        type_count: 0,
        diagnostics: Vec::new(),
    };

    let arena = Arena::new(DEFAULT_CAPACITY);
    let mut lexer = match Lexer::new(source, &arena) {
        Ok(lexer) => lexer,
        Err(err) => {
            report.diagnostics.push(format!("{filename}: error: {err}"));
            return report;
        }
    };
    if let Err(err) = lexer.lex_all() {
        report.diagnostics.push(format!("{filename}: error: {err}"));
        return report;
    }
    let lexed = lexer.into_output();
    report.token_count = lexed.tokens.len();

    // Parse errors are fatal-first: one diagnostic, then stop.
    let (mut ast, root) = match Parser::new(lexed.tokens.as_slice()).parse_program() {
        Ok(parsed) => parsed,
        Err(err) => {
            report
                .diagnostics
                .push(render(filename, source, err.span, &err.message));
            return report;
        }
    };

    let mut idents = lexed.idents;
    let mut store = match TypeStore::new(&mut idents) {
        Ok(store) => store,
        Err(err) => {
            report.diagnostics.push(format!("{filename}: error: {err}"));
            return report;
        }
    };
    let type_errors = Checker::new(&mut ast, &mut store, &idents).check_program(root);

    report.node_count = ast.nodes.len();
    report.type_count = store.len();
    for err in type_errors {
        report
            .diagnostics
            .push(render(filename, source, err.span, &err.kind.to_string()));
    }
    report
}

/// Read and compile a file.
pub fn compile_file(path: &Path) -> Result<CompileReport> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let filename = path.display().to_string();
    Ok(compile_source(&source, &filename))
}

/// CLI entry point; returns the process exit code.
pub fn run() -> Result<i32> {
    let mut args = std::env::args().skip(1);
    let Some(input) = args.next() else {
        bail!("usage: kilnc <file.kn>");
    };
    if args.next().is_some() {
        bail!("usage: kilnc <file.kn> (exactly one input)");
    }

    let report = compile_file(Path::new(&input))?;
    for diagnostic in &report.diagnostics {
        eprintln!("{diagnostic}");
    }
    if report.success() {
        println!(
            "{}: ok ({} tokens, {} nodes, {} types)",
            report.filename, report.token_count, report.node_count, report.type_count
        );
        Ok(0)
    } else {
        Ok(1)
    }
}

/// Render one diagnostic with a source excerpt. The caret line is only
/// drawn for spans that stay on a single line.
fn render(filename: &str, source: &str, span: Span, message: &str) -> String {
    let mut out = format!(
        "{filename}:{}:{}: error: {message}",
        span.start_line, span.start_col
    );
    if span.start_line == 0 {
        return out;
    }
    if let Some(line) = source.lines().nth(span.start_line as usize - 1) {
        out.push_str(&format!("\n  {line}"));
        if span.is_single_line() {
            let pad = " ".repeat(span.start_col.saturating_sub(1) as usize);
            let width = span.end_col.saturating_sub(span.start_col).max(1) as usize;
            out.push_str(&format!("\n  {pad}{}", "^".repeat(width)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_underlines_single_line_span() {
        let source = "x: i32 = \"string\";";
        let rendered = render("demo.kn", source, Span::new(1, 10, 1, 18), "type mismatch");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "demo.kn:1:10: error: type mismatch");
        assert_eq!(lines[1], "  x: i32 = \"string\";");
        assert_eq!(lines[2], "  _________^^^^^^^^".replace('_', " "));
    }

    #[test]
    fn test_render_point_span_gets_one_caret() {
        let source = "fn f() { x: i32 = 1 }";
        let rendered = render("demo.kn", source, Span::point(1, 20), "expected `;`");
        assert!(rendered.ends_with("^"));
        assert!(!rendered.ends_with("^^"));
    }

    #[test]
    fn test_render_dummy_span_has_no_excerpt() {
        let rendered = render("demo.kn", "src", Span::DUMMY, "boom");
        assert_eq!(rendered, "demo.kn:0:0: error: boom");
    }
}
