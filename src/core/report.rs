// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Diagnostic rendering with source context and an underline row.

use crate::core::error::SourceError;
use crate::core::tokenizer::Span;

/// Context lines shown on each side of the offending line.
const CONTEXT_LINES: usize = 2;

/// Render `err` with a window of source context.
///
/// The layout is a header line, a gutter-prefixed window of source lines
/// around the offending one, an underline row (`^~~~`) under the offending
/// span, and a trailing `ERROR:` line:
///
/// ```text
/// demo.s:3: ERROR
///     1 |         mov     1, %l0
///     2 |         cmp     %l0, %l1
///     3 |         bgX     label2
///       |         ^~~
///     4 |         nop
/// ERROR: unknown opcode: `bgX`
/// ```
pub fn format_with_context(err: &SourceError, lines: &[String], use_color: bool) -> String {
    let file = err.file().unwrap_or("<string>");
    let mut out = String::new();

    let Some(span) = err.span() else {
        out.push_str(&format!("{file}: ERROR\nERROR: {err}"));
        return out;
    };

    out.push_str(&format!("{file}:{}: ERROR\n", span.line));

    let line_idx = span.line.saturating_sub(1) as usize;
    let first = line_idx.saturating_sub(CONTEXT_LINES);
    let last = (line_idx + CONTEXT_LINES).min(lines.len().saturating_sub(1));
    for idx in first..=last {
        let Some(text) = lines.get(idx) else {
            continue;
        };
        out.push_str(&format!("{:>5} | {}\n", idx + 1, text));
        if idx == line_idx {
            out.push_str(&format!("      | {}\n", underline(span, use_color)));
        }
    }
    if lines.is_empty() {
        out.push_str(&format!("{:>5} | <source unavailable>\n", span.line));
    }

    out.push_str(&format!("ERROR: {err}"));
    out
}

fn underline(span: Span, use_color: bool) -> String {
    let mut row = " ".repeat(span.col);
    row.push('^');
    for _ in 1..span.len.max(1) {
        row.push('~');
    }
    if use_color {
        format!("{}\x1b[31m{}\x1b[0m", &row[..span.col], &row[span.col..])
    } else {
        row
    }
}

/// Color policy shared by the driver: honored unless `NO_COLOR` is set.
pub fn use_color() -> bool {
    std::env::var("NO_COLOR").is_err()
}
